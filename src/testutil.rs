//! Netlist builders and a small evaluator shared by the unit tests.

use std::collections::HashMap;

use crate::{
    index::NetIndex,
    netlist::{
        CellId, CellLibrary, CellType, Module, PortDecl, SigBit, SigSpec, State, WireId,
        celltypes::{MUX, NOT, PORT_A, PORT_B, PORT_S, PORT_Y},
    },
};

/// Single-bit buffer whose input can be inverted through `INVERT_I`: `O = I ^ INVERT_I`.
pub const IBUF: &str = "IBUF";

pub fn ibuf_type() -> CellType {
    CellType::new(IBUF)
        .with_port("I", PortDecl::input(Some(1)).invertible("INVERT_I"))
        .with_port("O", PortDecl::output(Some(1)))
}

pub fn test_library() -> CellLibrary {
    let mut lib = CellLibrary::new();
    lib.add(ibuf_type()).unwrap();
    lib
}

pub fn add_not(m: &mut Module, name: &str, a: WireId, y: WireId) -> CellId {
    let cell = m.add_cell(name, NOT).unwrap();
    m.set_port(cell, PORT_A, m.sig(a).unwrap()).unwrap();
    m.set_port(cell, PORT_Y, m.sig(y).unwrap()).unwrap();
    cell
}

pub fn add_mux(m: &mut Module, name: &str, a: WireId, b: WireId, s: WireId, y: WireId) -> CellId {
    let cell = m.add_cell(name, MUX).unwrap();
    m.set_port(cell, PORT_A, m.sig(a).unwrap()).unwrap();
    m.set_port(cell, PORT_B, m.sig(b).unwrap()).unwrap();
    m.set_port(cell, PORT_S, m.sig(s).unwrap()).unwrap();
    m.set_port(cell, PORT_Y, m.sig(y).unwrap()).unwrap();
    cell
}

pub fn add_ibuf(m: &mut Module, name: &str, i: WireId, o: WireId) -> CellId {
    let cell = m.add_cell(name, IBUF).unwrap();
    m.set_port(cell, "I", m.sig(i).unwrap()).unwrap();
    m.set_port(cell, "O", m.sig(o).unwrap()).unwrap();
    cell
}

/// Number of live cells of the given type.
pub fn count_type(m: &Module, cell_type: &str) -> usize {
    m.cells().filter(|(_, c)| c.get_type() == cell_type).count()
}

/// Evaluates every output port bit of a module built from NOT, MUX and IBUF cells,
/// with primary input bits assigned by position in `inputs` (LSB of the first
/// input port first).
pub fn eval_outputs(m: &Module, lib: &CellLibrary, inputs: u64) -> Vec<bool> {
    let mut index = NetIndex::new(m, lib);
    let mut values: HashMap<SigBit, bool> = HashMap::new();
    let mut position = 0;
    for (id, wire) in m.wires() {
        if wire.port_input {
            for offset in 0..wire.get_width() {
                let bit = index.sigmap().bit(SigBit::wire(id, offset));
                values.insert(bit, (inputs >> position) & 1 == 1);
                position += 1;
            }
        }
    }

    let mut outputs = Vec::new();
    for (id, wire) in m.wires() {
        if wire.port_output {
            for bit in SigSpec::from_wire(id, wire.get_width()).bits() {
                outputs.push(eval_bit(m, &mut index, &mut values, *bit));
            }
        }
    }
    outputs
}

fn eval_port(
    m: &Module,
    index: &mut NetIndex,
    values: &mut HashMap<SigBit, bool>,
    cell: CellId,
    port: &str,
) -> bool {
    let bit = m.cell(cell).unwrap().port(port).unwrap()[0];
    eval_bit(m, index, values, bit)
}

fn eval_bit(
    m: &Module,
    index: &mut NetIndex,
    values: &mut HashMap<SigBit, bool>,
    bit: SigBit,
) -> bool {
    let canonical = index.sigmap().bit(bit);
    match canonical {
        SigBit::Const(State::S1) => return true,
        SigBit::Const(_) => return false,
        SigBit::Wire { .. } => (),
    }
    if let Some(&value) = values.get(&canonical) {
        return value;
    }
    let driver = index
        .find_driver(m, bit)
        .unwrap_or_else(|| panic!("undriven bit {}", bit));
    let cell = m.cell(driver.cell).unwrap();
    let value = match cell.get_type() {
        NOT => !eval_port(m, index, values, driver.cell, PORT_A),
        MUX => {
            if eval_port(m, index, values, driver.cell, PORT_S) {
                eval_port(m, index, values, driver.cell, PORT_B)
            } else {
                eval_port(m, index, values, driver.cell, PORT_A)
            }
        }
        IBUF => {
            let inverted = cell
                .param("INVERT_I")
                .and_then(|p| p.get(0))
                .unwrap_or(State::S0)
                == State::S1;
            eval_port(m, index, values, driver.cell, "I") ^ inverted
        }
        other => panic!("cannot evaluate cell type {}", other),
    };
    values.insert(canonical, value);
    value
}

/// Truth table of all outputs over every assignment of the `n_inputs` input bits.
pub fn truth_table(m: &Module, lib: &CellLibrary, n_inputs: u32) -> Vec<Vec<bool>> {
    (0..1u64 << n_inputs)
        .map(|inputs| eval_outputs(m, lib, inputs))
        .collect()
}
