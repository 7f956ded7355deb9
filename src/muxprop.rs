//! Propagation of inverters through selector trees.
//!
//! An inverter sitting alone on the output of a [`MUX`] cell can be moved to its
//! two data inputs instead: `!(S ? B : A) == S ? !B : !A`. Doing so upstream,
//! level after level, pushes inverters toward the primary inputs of selector
//! trees.
//!
//! The pass works in three steps:
//! - start points discovery: selectors whose (possibly inverted) output leaves
//!   the selector tree, either through a fan-out, a select input or any other
//!   cell type, are queued at depth 0;
//! - processing: inverters on the output of a queued selector are pushed to its
//!   data inputs, until its output is no longer a lone inverter;
//! - frontier update: the selectors driving the data inputs (through inverters)
//!   of the processed selector are queued with an incremented depth. Once the
//!   depth reaches [`MuxPropConfig::max_depth`], the selector found is not queued;
//!   the walk continues upstream of it with the depth reset instead.
//!
//! [`MUX`]: crate::netlist::celltypes::MUX

use std::collections::{HashSet, VecDeque};

use log::{debug, info};

use crate::{
    index::{NetIndex, Pin},
    netlist::{
        CellId, CellLibrary, Design, Module, NetlistError, Result, Selection,
        celltypes::{NOT, PORT_A, PORT_B, PORT_S, PORT_Y},
    },
    pass::Pass,
};

/// Default maximum number of selector levels an inversion is pushed through
/// before the depth counter is reset.
pub const DEFAULT_MAX_DEPTH: usize = 3;

const DATA_PORTS: [&str; 2] = [PORT_A, PORT_B];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxPropConfig {
    pub max_depth: usize,
}

impl Default for MuxPropConfig {
    fn default() -> Self {
        MuxPropConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What happened in one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Selectors identified as start points before processing.
    pub start_points: usize,
    /// Selectors processed.
    pub processed: usize,
    /// Inverters pushed through a selector.
    pub inverters_pushed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StartPoint {
    cell: CellId,
    depth: usize,
}

/// The `muxprop` pass.
#[derive(Debug, Clone, Default)]
pub struct MuxProp {
    config: MuxPropConfig,
}

impl MuxProp {
    pub fn new() -> Self {
        MuxProp::default()
    }

    pub fn with_config(config: MuxPropConfig) -> Self {
        MuxProp { config }
    }
}

impl Pass for MuxProp {
    fn name(&self) -> &'static str {
        "muxprop"
    }

    fn help(&self) -> &'static str {
        "muxprop [selection]\n\n\
        Pushes inverters ($_NOT_ cells) found on the output of selectors ($_MUX_ cells)\n\
        through them, onto their data inputs, and repeats upstream."
    }

    fn execute(&self, design: &mut Design, selection: &Selection) -> Result<()> {
        info!("Executing MUXPROP pass (propagating inverters through selectors).");
        for name in design.selected_modules(selection) {
            info!("Processing module '{}'", name);
            let (module, library) = design.module_with_library(&name)?;
            let stats = propagate_module(module, library, selection, self.config)?;
            info!(
                "{} start point(s), {} selector(s) processed, {} inverter(s) pushed.",
                stats.start_points, stats.processed, stats.inverters_pushed
            );
        }
        Ok(())
    }
}

/// Runs the propagation on the selected selectors of one module.
pub fn propagate_module(
    module: &mut Module,
    library: &CellLibrary,
    selection: &Selection,
    config: MuxPropConfig,
) -> Result<PropagationStats> {
    let mut propagator = Propagator {
        index: NetIndex::new(module, library),
        selection,
        config,
        processed: HashSet::new(),
        queue: VecDeque::new(),
        stats: PropagationStats::default(),
    };

    debug!("Identifying start points...");
    propagator.identify_start_points(module);
    propagator.stats.start_points = propagator.queue.len();

    debug!("Processing...");
    while let Some(start) = propagator.queue.pop_front() {
        if propagator.processed.contains(&start.cell) {
            debug!("Skipping {}, already processed", start.cell);
            continue;
        }
        propagator.process_mux(module, start.cell)?;
        propagator.processed.insert(start.cell);
        propagator.stats.processed += 1;
        propagator.update_start_points(module, start.cell, start.depth);
    }

    Ok(propagator.stats)
}

/// State of the propagation in one module.
struct Propagator<'a, 's> {
    index: NetIndex<'a>,
    selection: &'s Selection,
    config: MuxPropConfig,
    processed: HashSet<CellId>,
    queue: VecDeque<StartPoint>,
    stats: PropagationStats,
}

impl Propagator<'_, '_> {
    fn is_selected(&self, module: &Module, cell: CellId) -> bool {
        module
            .cell(cell)
            .is_some_and(|c| self.selection.selects_cell(module.get_name(), c.get_name()))
    }

    fn push(&mut self, module: &Module, cell: CellId, depth: usize) {
        debug!(
            "Start point: {} (depth {})",
            module.cell(cell).map_or("?", |c| c.get_name()),
            depth
        );
        self.queue.push_back(StartPoint { cell, depth });
    }

    /// Walks downstream of every selected selector, through inverters, to decide
    /// whether its output leaves the selector tree.
    fn identify_start_points(&mut self, module: &Module) {
        for cell in module.selected_cells(self.selection) {
            if !module.cell(cell).is_some_and(|c| c.is_mux()) {
                continue;
            }

            let mut driver = Pin::new(cell, PORT_Y, 0);
            let mut visited = HashSet::new();
            loop {
                // Unconnected output, skip the cell
                let sinks = self.index.sinks_of(module, &driver);
                if sinks.is_empty() {
                    break;
                }

                if sinks.len() > 1 {
                    self.push(module, cell, 0);
                    break;
                }

                let sink = &sinks[0];
                let Some(other) = module.cell(sink.cell) else {
                    break;
                };

                if other.is_mux() {
                    // Only the select input leaves the selector tree
                    if sink.port == PORT_S {
                        self.push(module, cell, 0);
                    }
                    break;
                } else if other.is_not() {
                    if !visited.insert(sink.cell) {
                        break;
                    }
                    driver = Pin::new(sink.cell, PORT_Y, 0);
                } else {
                    self.push(module, cell, 0);
                    break;
                }
            }
        }
    }

    /// Pushes inverters through the selector until its output is no longer a lone inverter.
    fn process_mux(&mut self, module: &mut Module, cell: CellId) -> Result<()> {
        let output = Pin::new(cell, PORT_Y, 0);
        loop {
            let sinks = self.index.sinks_of(module, &output);
            if sinks.len() != 1 {
                break;
            }

            let inverter = sinks[0].cell;
            let Some(inv) = module.cell(inverter) else {
                break;
            };
            if !inv.is_not() {
                break;
            }

            // The output port, or a reader of unknown direction, would see the non-inverted value
            let Some(bit) = output.sig_bit(module) else {
                break;
            };
            if self.index.is_observed(module, bit) {
                break;
            }

            let inverted = inv.port(PORT_Y).cloned().ok_or_else(|| {
                NetlistError::InvalidState(format!("inverter {} has no output", inv.get_name()))
            })?;

            // Both data inputs are needed before touching anything
            let Some(selector) = module.cell(cell) else {
                break;
            };
            let (Some(data_a), Some(data_b)) =
                (selector.port(PORT_A).cloned(), selector.port(PORT_B).cloned())
            else {
                debug!("Skipping {}, a data input is unconnected", selector.get_name());
                break;
            };

            info!(
                "  Propagating inverter '{}' through '{}'",
                inv.get_name(),
                selector.get_name()
            );

            module.set_port(cell, PORT_Y, inverted)?;
            module.remove_cell(inverter)?;

            // Add new inverters on the data inputs
            for (port, data) in [(PORT_A, data_a), (PORT_B, data_b)] {
                let new_inverter = module.new_cell(NOT);
                let wire = module.new_wire(1);
                let sig = module.sig(wire)?;
                module.set_port(new_inverter, PORT_A, data)?;
                module.set_port(new_inverter, PORT_Y, sig.clone())?;
                module.set_port(cell, port, sig)?;
            }

            self.stats.inverters_pushed += 1;
        }
        Ok(())
    }

    /// Walks upstream of the data inputs of a processed selector, through inverters,
    /// and queues the selectors found.
    ///
    /// Selectors found beyond the maximum depth are walked through in turn, at depth 0.
    /// The walk uses an explicit stack, visiting them in the same order as a recursive
    /// walk would.
    fn update_start_points(&mut self, module: &Module, cell: CellId, depth: usize) {
        let mut stack = vec![(cell, depth, 0)];
        let mut walked = HashSet::from([cell]);

        while let Some((mux, depth, port_index)) = stack.pop() {
            let Some(port) = DATA_PORTS.get(port_index) else {
                continue;
            };
            stack.push((mux, depth, port_index + 1));

            let mut sink = Pin::new(mux, port, 0);
            let mut visited = HashSet::new();
            while let Some(driver) = self.index.driver_of(module, &sink) {
                let Some(other) = module.cell(driver.cell) else {
                    break;
                };

                if other.is_mux() {
                    let next_depth = depth + 1;
                    if next_depth >= self.config.max_depth {
                        // Maximum propagation depth reached, continue upstream
                        if walked.insert(driver.cell) {
                            stack.push((driver.cell, 0, 0));
                        }
                    } else if !self.processed.contains(&driver.cell)
                        && self.is_selected(module, driver.cell)
                    {
                        self.push(module, driver.cell, next_depth);
                    }
                    break;
                } else if other.is_not() {
                    if !visited.insert(driver.cell) {
                        break;
                    }
                    sink = Pin::new(driver.cell, PORT_A, 0);
                } else {
                    break;
                }
            }
        }
    }
}
