//! You can export modules to the Graphviz dot format using [`Module::to_dot`].
//!
//! ```rust
//! use netinv::{CellLibrary, Module};
//! use netinv::dot::GraphvizStyle;
//! use netinv::netlist::celltypes::{NOT, PORT_A, PORT_Y};
//!
//! let mut m = Module::new("top");
//! let a = m.add_input("a", 1).unwrap();
//! let y = m.add_output("y", 1).unwrap();
//! let inv = m.add_cell("inv", NOT).unwrap();
//! m.set_port(inv, PORT_A, m.sig(a).unwrap()).unwrap();
//! m.set_port(inv, PORT_Y, m.sig(y).unwrap()).unwrap();
//!
//! println!("{}", m.to_dot(&CellLibrary::new(), GraphvizStyle::default()));
//! ```
//!
//! You can then render the graphs using the DOT engine.

use std::{collections::HashMap, fmt::Display, ops::Add};

use crate::{
    index::{NetIndex, Pin},
    netlist::{CellLibrary, Module, SigBit, State, WireId, celltypes::PORT_S},
};

// Definining default global style.
const DEFAULT_RANKDIR: &str = "LR";

// Defining default style for nodes.
const DEFAULT_INPUT_NODE_FORMAT: &str = "[shape=box]";
const DEFAULT_OUTPUT_NODE_FORMAT: &str = "[shape=box, style=rounded]";
const DEFAULT_NOT_NODE_FORMAT: &str = "[shape=invtriangle]";
const DEFAULT_MUX_NODE_FORMAT: &str = "[shape=trapezium, orientation=270]";
const DEFAULT_CELL_NODE_FORMAT: &str = "[shape=box3d]";

// Defining default style for edges.
const DEFAULT_EDGE_ALL_FORMAT: &str = "[arrowsize=0.5]";
const DEFAULT_EDGE_SELECT_FORMAT: &str = "[style=\"dashed\"]";
const DEFAULT_EDGE_INVERTED_FORMAT: &str = "[headlabel=\"●\", labelangle=.0, labeldistance=1.5]";
const DEFAULT_EDGE_OUTPUT_FORMAT: &str = "[arrowhead=none]";

/// String containing the graphviz node style (you must manually include square brackets).
///
/// See [`GraphvizStyle`] for what kind of nodes can be described.
#[derive(Debug, Clone)]
pub struct GraphvizNodeStyle(String);

impl GraphvizNodeStyle {
    pub fn new(style: &str) -> Self {
        GraphvizNodeStyle(style.to_string())
    }
}

impl Display for GraphvizNodeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String containing the graphviz edge style (you must manually include square brackets).
///
/// See [`GraphvizStyle`] for what kind of edges can be described.
#[derive(Debug, Clone, Default)]
pub struct GraphvizEdgeStyle(String);

impl GraphvizEdgeStyle {
    pub fn new(style: &str) -> Self {
        GraphvizEdgeStyle(style.to_string())
    }
}

impl Display for GraphvizEdgeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for GraphvizEdgeStyle {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        GraphvizEdgeStyle(format!("{}{}", self.0, rhs.0))
    }
}

/// Parameters for Graphviz rendering.
///
/// ### Global parameters
/// - `rankdir`
///
/// ### Nodes
/// The following nodes can be rendered using [`GraphvizNodeStyle`]:
/// - input ports
/// - output ports
/// - inverter cells
/// - selector cells
/// - any other cell.
///
/// ### Edges
/// Edge styles are additive. All edges implement the `edge_all` style. To that can be added:
/// - `edge_select` if the edge is pointing at the select input of a selector
/// - `edge_inverted` if the edge is pointing at an invertible port bit whose inversion is set
/// - `edge_output` if the edge is directed to an output port.
#[derive(Debug, Clone)]
pub struct GraphvizStyle {
    // Global
    pub rankdir: String,

    // Nodes
    pub input: GraphvizNodeStyle,
    pub output: GraphvizNodeStyle,
    pub not: GraphvizNodeStyle,
    pub mux: GraphvizNodeStyle,
    pub cell: GraphvizNodeStyle,

    // Edges
    pub edge_all: GraphvizEdgeStyle,
    pub edge_select: GraphvizEdgeStyle,
    pub edge_inverted: GraphvizEdgeStyle,
    pub edge_output: GraphvizEdgeStyle,
}

impl Default for GraphvizStyle {
    fn default() -> Self {
        GraphvizStyle {
            rankdir: DEFAULT_RANKDIR.to_string(),

            input: GraphvizNodeStyle::new(DEFAULT_INPUT_NODE_FORMAT),
            output: GraphvizNodeStyle::new(DEFAULT_OUTPUT_NODE_FORMAT),
            not: GraphvizNodeStyle::new(DEFAULT_NOT_NODE_FORMAT),
            mux: GraphvizNodeStyle::new(DEFAULT_MUX_NODE_FORMAT),
            cell: GraphvizNodeStyle::new(DEFAULT_CELL_NODE_FORMAT),

            edge_all: GraphvizEdgeStyle::new(DEFAULT_EDGE_ALL_FORMAT),
            edge_select: GraphvizEdgeStyle::new(DEFAULT_EDGE_SELECT_FORMAT),
            edge_inverted: GraphvizEdgeStyle::new(DEFAULT_EDGE_INVERTED_FORMAT),
            edge_output: GraphvizEdgeStyle::new(DEFAULT_EDGE_OUTPUT_FORMAT),
        }
    }
}

/// Graphviz id of the node feeding a canonical bit: its driver cell, or the input port.
fn source_id(
    module: &Module,
    index: &mut NetIndex,
    inputs: &HashMap<SigBit, WireId>,
    bit: SigBit,
) -> Option<String> {
    if let Some(driver) = index.find_driver(module, bit) {
        return Some(driver.cell.to_string());
    }
    let canonical = index.sigmap().bit(bit);
    inputs.get(&canonical).map(|wire| wire.to_string())
}

/// True if the parameter governing this (invertible) pin has its bit set.
fn is_inverted(module: &Module, library: &CellLibrary, pin: &Pin) -> bool {
    let Some(cell) = module.cell(pin.cell) else {
        return false;
    };
    library
        .invertible_pin(cell.get_type(), &pin.port)
        .and_then(|param| cell.param(param))
        .and_then(|value| value.get(pin.bit))
        == Some(State::S1)
}

impl Module {
    /// Returns a DOT representation of the module.
    pub fn to_dot(&self, library: &CellLibrary, graphviz_style: GraphvizStyle) -> String {
        let mut index = NetIndex::new(self, library);
        let mut decl_edges = String::new();

        // Creating different subgraphs for node declarations
        let mut decl_inputs = format!("subgraph inputs {{\n node {}\n", graphviz_style.input);
        let mut decl_outputs = format!("subgraph outputs {{\n node {}\n", graphviz_style.output);
        let mut decl_nots = format!("subgraph nots {{\n node {}\n", graphviz_style.not);
        let mut decl_muxes = format!("subgraph muxes {{\n node {}\n", graphviz_style.mux);
        let mut decl_cells = format!("subgraph cells {{\n node {}\n", graphviz_style.cell);

        // Port wires, an inout port is only drawn as an input
        let mut inputs = HashMap::new();
        let mut outputs = Vec::new();
        for (id, wire) in self.wires() {
            let decl = format!("{} [label=\"{}\"]\n", id, wire.get_name());
            if wire.port_input {
                decl_inputs.push_str(&decl);
                for offset in 0..wire.get_width() {
                    inputs.insert(index.sigmap().bit(SigBit::wire(id, offset)), id);
                }
            } else if wire.port_output {
                decl_outputs.push_str(&decl);
                outputs.push((id, wire.get_width()));
            }
        }

        for (id, cell) in self.cells() {
            let decl = format!("{} [label=\"{}\"]\n", id, cell.get_name());
            if cell.is_not() {
                decl_nots.push_str(&decl);
            } else if cell.is_mux() {
                decl_muxes.push_str(&decl);
            } else {
                decl_cells.push_str(&decl);
            }

            for (port, sig) in cell.connections() {
                if !library.is_input(cell.get_type(), port) {
                    continue;
                }
                for (i, bit) in sig.bits().iter().enumerate() {
                    let Some(from) = source_id(self, &mut index, &inputs, *bit) else {
                        continue;
                    };
                    let pin = Pin::new(id, port, i);
                    let mut style = GraphvizEdgeStyle::default();
                    if cell.is_mux() && port == PORT_S {
                        style = style + graphviz_style.edge_select.clone();
                    }
                    if is_inverted(self, library, &pin) {
                        style = style + graphviz_style.edge_inverted.clone();
                    }
                    decl_edges.push_str(&format!("{} -> {} {}\n", from, id, style));
                }
            }
        }

        for (id, width) in outputs {
            for offset in 0..width {
                if let Some(from) = source_id(self, &mut index, &inputs, SigBit::wire(id, offset)) {
                    decl_edges.push_str(&format!(
                        "{} -> {} {}\n",
                        from, id, graphviz_style.edge_output
                    ));
                }
            }
        }

        // Concatenating everything together
        format!(
            "
strict digraph {{
    rankdir=\"{}\"
    edge {}
    {}
    }}
    {}
    }}
    {}
    }}
    {}
    }}
    {}
    }}
    {}
}}",
            graphviz_style.rankdir,
            graphviz_style.edge_all,
            decl_inputs,
            decl_nots,
            decl_muxes,
            decl_cells,
            decl_outputs,
            decl_edges
        )
    }
}
