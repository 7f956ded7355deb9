//! Integration of inverters into invertible cell ports.
//!
//! A cell type can declare that some of its input ports embed an inverter,
//! controlled by a parameter: bit `i` of the parameter set means bit `i` of
//! the port is inverted. This pass looks for [`NOT`] cells directly driving
//! such ports, bypasses them and toggles the matching parameter bit instead.
//!
//! ```rust
//! use netinv::{CellType, Const, Design, Module, PortDecl, Selection, integrate::IntegrateInv, Pass};
//! use netinv::netlist::celltypes::{NOT, PORT_A, PORT_Y};
//!
//! let mut design = Design::new();
//! design
//!     .add_cell_type(
//!         CellType::new("FF")
//!             .with_port("D", PortDecl::input(Some(1)).invertible("INV_D"))
//!             .with_port("Q", PortDecl::output(Some(1))),
//!     )
//!     .unwrap();
//!
//! let mut m = Module::new("top");
//! let d = m.add_input("d", 1).unwrap();
//! let nd = m.add_wire("nd", 1).unwrap();
//! let q = m.add_output("q", 1).unwrap();
//! let inv = m.add_cell("inv", NOT).unwrap();
//! m.set_port(inv, PORT_A, m.sig(d).unwrap()).unwrap();
//! m.set_port(inv, PORT_Y, m.sig(nd).unwrap()).unwrap();
//! let ff = m.add_cell("ff", "FF").unwrap();
//! m.set_port(ff, "D", m.sig(nd).unwrap()).unwrap();
//! m.set_port(ff, "Q", m.sig(q).unwrap()).unwrap();
//! design.add_module(m).unwrap();
//!
//! IntegrateInv.execute(&mut design, &Selection::all()).unwrap();
//!
//! let m = design.module("top").unwrap();
//! assert!(m.cell(inv).is_none());
//! assert_eq!(m.cell(ff).unwrap().port("D"), Some(&m.sig(d).unwrap()));
//! assert_eq!(m.cell(ff).unwrap().param("INV_D"), Some(&Const::from_u64(1, 1)));
//! ```
//!
//! [`NOT`]: crate::netlist::celltypes::NOT

use std::collections::HashMap;

use log::{debug, info};

use crate::{
    index::NetIndex,
    netlist::{
        CellId, CellLibrary, Const, Design, Module, NetlistError, Result, Selection, SigBit, State,
        celltypes::{PORT_A, PORT_Y},
    },
    pass::Pass,
};

/// The `integrateinv` pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrateInv;

impl Pass for IntegrateInv {
    fn name(&self) -> &'static str {
        "integrateinv"
    }

    fn help(&self) -> &'static str {
        "integrateinv [selection]\n\n\
        Integrates inverters ($_NOT_ cells) into cell ports declaring an invertible pin.\n\
        The declaration names the parameter controlling the inversion. Whenever an\n\
        inverter drives such a port, it is bypassed and the corresponding parameter\n\
        bit is toggled. The inverter is removed once nothing else consumes its output."
    }

    fn execute(&self, design: &mut Design, selection: &Selection) -> Result<()> {
        info!("Executing INTEGRATEINV pass (integrating pin inverters).");
        for name in design.selected_modules(selection) {
            let (module, library) = design.module_with_library(&name)?;
            let count = integrate_module(module, library, selection)?;
            info!("Integrated {} inverter(s) in module {}.", count, name);
        }
        Ok(())
    }
}

/// Runs the integration on the selected cells of one module.
/// Returns the number of port bits an inverter was integrated into.
pub fn integrate_module(
    module: &mut Module,
    library: &CellLibrary,
    selection: &Selection,
) -> Result<usize> {
    let mut index = NetIndex::new(module, library);
    let mut inverters = build_inverter_map(module, &index)?;

    let mut count = 0;
    for cell in module.selected_cells(selection) {
        count += process_cell(module, &mut index, &mut inverters, cell)?;
    }
    Ok(count)
}

/// Maps the canonical output bit of every inverter of the module to the inverter.
fn build_inverter_map(module: &Module, index: &NetIndex) -> Result<HashMap<SigBit, CellId>> {
    let mut inverters = HashMap::new();
    for (id, cell) in module.cells() {
        if !cell.is_not() {
            continue;
        }
        let Some(output) = cell.port(PORT_Y).and_then(|sig| sig.bit(0)) else {
            continue;
        };
        if !output.is_wire() {
            continue;
        }
        let canonical = index.sigmap().bit(output);
        if let Some(other) = inverters.insert(canonical, id) {
            return Err(NetlistError::InvalidState(format!(
                "inverters {} and {} both drive {}",
                module.cell(other).map_or("?", |c| c.get_name()),
                cell.get_name(),
                canonical
            )));
        }
    }
    Ok(inverters)
}

fn process_cell(
    module: &mut Module,
    index: &mut NetIndex,
    inverters: &mut HashMap<SigBit, CellId>,
    id: CellId,
) -> Result<usize> {
    // Inverters integrated into an earlier cell are gone already.
    let Some(cell) = module.cell(id) else {
        return Ok(0);
    };
    let library = index.library();
    let cell_name = cell.get_name().to_string();
    let cell_type = cell.get_type().to_string();
    let ports: Vec<(String, String, Option<Const>, usize)> = cell
        .connections()
        .filter(|(port, _)| library.is_input(&cell_type, port))
        .filter_map(|(port, sig)| {
            let param = library.invertible_pin(&cell_type, port)?;
            Some((
                port.to_string(),
                param.to_string(),
                cell.param(param).cloned(),
                sig.len(),
            ))
        })
        .collect();

    let mut count = 0;
    for (port, param, value, width) in ports {
        let mut mask = value.unwrap_or_else(|| Const::zeros(width));
        if mask.len() != width {
            return Err(NetlistError::WidthMismatch {
                module: module.get_name().to_string(),
                cell: cell_name,
                cell_type,
                port,
                param,
                param_width: mask.len(),
                port_width: width,
            });
        }

        for bit in 0..width {
            let Some(sigbit) = module.cell(id).and_then(|c| c.port(&port)).and_then(|s| s.bit(bit))
            else {
                continue;
            };
            if !sigbit.is_wire() {
                continue;
            }
            let canonical = index.sigmap().bit(sigbit);
            let Some(&inverter) = inverters.get(&canonical) else {
                continue;
            };

            let (inverter_name, input, output) = {
                let inv = module.cell(inverter).ok_or_else(|| {
                    NetlistError::InvalidState(format!(
                        "inverter {} driving {} was removed",
                        inverter, canonical
                    ))
                })?;
                let input = inv.port(PORT_A).and_then(|sig| sig.bit(0)).ok_or_else(|| {
                    NetlistError::InvalidState(format!(
                        "inverter {} has no input",
                        inv.get_name()
                    ))
                })?;
                let output = inv.port(PORT_Y).and_then(|sig| sig.bit(0)).unwrap_or(sigbit);
                (inv.get_name().to_string(), input, output)
            };

            // Only the bits actually toggled need to be binary.
            let state = mask.get(bit).unwrap_or(State::Sx);
            let toggled = state
                .toggled()
                .ok_or_else(|| NetlistError::NonBinaryParameter {
                    cell: cell_name.clone(),
                    param: param.clone(),
                    bit,
                    value: state,
                })?;

            info!(
                "Integrating inverter {} into {}.{}",
                inverter_name, cell_name, port
            );

            let mut sig = module
                .cell(id)
                .and_then(|c| c.port(&port))
                .cloned()
                .unwrap_or_default();
            sig.set_bit(bit, input);
            module.set_port(id, &port, sig)?;
            mask.set(bit, toggled);
            count += 1;

            // Other consumers, opaque ones included, keep the inverter alive.
            if index.find_sinks(module, output).is_empty() && !index.is_observed(module, output) {
                debug!("Removing inverter {}", inverter_name);
                module.remove_cell(inverter)?;
                inverters.remove(&canonical);
            }
        }

        debug!(
            "Updating inversion parameter {}.{} to {}",
            cell_name, param, mask
        );
        module.set_param(id, &param, mask)?;
    }

    Ok(count)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::netlist::{CellType, PortDecl, celltypes::NOT};
    use crate::testutil::{IBUF, add_ibuf, add_not, count_type, test_library, truth_table};

    /// A 4-input black box with invertible pins on inputs 1 and 3.
    fn black_box_type() -> CellType {
        CellType::new("BB4")
            .with_port("I0", PortDecl::input(Some(1)))
            .with_port("I1", PortDecl::input(Some(1)).invertible("INV_I1"))
            .with_port("I2", PortDecl::input(Some(1)))
            .with_port("I3", PortDecl::input(Some(1)).invertible("INV_I3"))
            .with_port("O", PortDecl::output(Some(1)))
    }

    /// A 4-bit wide black box with a 4-bit invertible bus.
    fn bus_type() -> CellType {
        CellType::new("BUS")
            .with_port("D", PortDecl::input(Some(4)).invertible("INV_D"))
            .with_port("Q", PortDecl::output(Some(4)))
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn integrate_into_separate_ports() {
        init_logger();
        let mut design = Design::new();
        design.add_cell_type(black_box_type()).unwrap();

        let mut m = Module::new("top");
        let mut inputs = Vec::new();
        let mut inverted = Vec::new();
        let mut inverters = Vec::new();
        for i in 0..4 {
            let a = m.add_input(&format!("a{}", i), 1).unwrap();
            let n = m.add_wire(&format!("n{}", i), 1).unwrap();
            inverters.push(add_not(&mut m, &format!("inv{}", i), a, n));
            inputs.push(a);
            inverted.push(n);
        }
        let o = m.add_output("o", 1).unwrap();
        let bb = m.add_cell("bb", "BB4").unwrap();
        for i in 0..4 {
            m.set_port(bb, &format!("I{}", i), m.sig(inverted[i]).unwrap())
                .unwrap();
        }
        m.set_port(bb, "O", m.sig(o).unwrap()).unwrap();
        design.add_module(m).unwrap();

        IntegrateInv.execute(&mut design, &Selection::all()).unwrap();

        let m = design.module("top").unwrap();
        m.check_integrity(design.library()).unwrap();
        assert_eq!(m.cell_count(), 3); // dropped by two
        assert!(m.contains_cell(inverters[0]));
        assert!(!m.contains_cell(inverters[1]));
        assert!(m.contains_cell(inverters[2]));
        assert!(!m.contains_cell(inverters[3]));

        let cell = m.cell(bb).unwrap();
        assert_eq!(cell.port("I0"), Some(&m.sig(inverted[0]).unwrap()));
        assert_eq!(cell.port("I1"), Some(&m.sig(inputs[1]).unwrap()));
        assert_eq!(cell.port("I2"), Some(&m.sig(inverted[2]).unwrap()));
        assert_eq!(cell.port("I3"), Some(&m.sig(inputs[3]).unwrap()));
        assert_eq!(cell.param("INV_I1"), Some(&Const::from_u64(1, 1)));
        assert_eq!(cell.param("INV_I3"), Some(&Const::from_u64(1, 1)));
        // Only the invertible ports got a parameter
        let params: Vec<&str> = cell.params().map(|(name, _)| name).collect();
        assert_eq!(params, vec!["INV_I1", "INV_I3"]);
    }

    #[test]
    fn integrate_into_bus() {
        let mut design = Design::new();
        design.add_cell_type(bus_type()).unwrap();

        let mut m = Module::new("top");
        let a = m.add_input("a", 4).unwrap();
        let d = m.add_wire("d", 4).unwrap();
        let q = m.add_output("q", 4).unwrap();
        // Invert bits 0 and 2, pass 1 and 3 through
        for i in [0, 2] {
            let inv = m.add_cell(&format!("inv{}", i), NOT).unwrap();
            m.set_port(inv, PORT_A, m.sig_bit(a, i).unwrap().into()).unwrap();
            m.set_port(inv, PORT_Y, m.sig_bit(d, i).unwrap().into()).unwrap();
        }
        for i in [1, 3] {
            m.connect(
                m.sig_bit(d, i).unwrap().into(),
                m.sig_bit(a, i).unwrap().into(),
            )
            .unwrap();
        }
        let bus = m.add_cell("bus", "BUS").unwrap();
        m.set_port(bus, "D", m.sig(d).unwrap()).unwrap();
        m.set_port(bus, "Q", m.sig(q).unwrap()).unwrap();
        m.set_param(bus, "INV_D", Const::from_bin_str("1001").unwrap())
            .unwrap();
        design.add_module(m).unwrap();

        IntegrateInv.execute(&mut design, &Selection::all()).unwrap();

        let m = design.module("top").unwrap();
        assert_eq!(count_type(m, NOT), 0);
        let cell = m.cell(bus).unwrap();
        // Bit 0 toggled 1 -> 0, bit 2 toggled 0 -> 1
        assert_eq!(cell.param("INV_D"), Some(&Const::from_bin_str("1100").unwrap()));
        let port = cell.port("D").unwrap();
        assert_eq!(port.bit(0), Some(SigBit::wire(a, 0)));
        assert_eq!(port.bit(1), Some(SigBit::wire(d, 1)));
        assert_eq!(port.bit(2), Some(SigBit::wire(a, 2)));
        assert_eq!(port.bit(3), Some(SigBit::wire(d, 3)));
    }

    #[test]
    fn integrate_through_alias() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n = m.add_wire("n", 1).unwrap();
        let alias = m.add_wire("alias", 1).unwrap();
        let o = m.add_output("o", 1).unwrap();
        m.connect(m.sig(alias).unwrap(), m.sig(n).unwrap()).unwrap();
        let inv = add_not(&mut m, "inv", a, n);
        let buf = add_ibuf(&mut m, "buf", alias, o);

        let before = truth_table(&m, &lib, 1);
        assert_eq!(integrate_module(&mut m, &lib, &Selection::all()).unwrap(), 1);
        assert!(!m.contains_cell(inv));
        assert_eq!(m.cell(buf).unwrap().port("I"), Some(&m.sig(a).unwrap()));
        assert_eq!(truth_table(&m, &lib, 1), before);
    }

    #[test]
    fn shared_inverter_is_kept_while_used() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n = m.add_wire("n", 1).unwrap();
        let o1 = m.add_output("o1", 1).unwrap();
        let o2 = m.add_output("o2", 1).unwrap();
        let o3 = m.add_output("o3", 1).unwrap();
        let inv = add_not(&mut m, "inv", a, n);
        add_ibuf(&mut m, "buf1", n, o1);
        add_not(&mut m, "other", n, o2);
        add_ibuf(&mut m, "buf2", n, o3);

        let before = truth_table(&m, &lib, 1);
        assert_eq!(integrate_module(&mut m, &lib, &Selection::all()).unwrap(), 2);
        // Still feeding "other"
        assert!(m.contains_cell(inv));
        assert_eq!(count_type(&m, IBUF), 2);
        assert_eq!(truth_table(&m, &lib, 1), before);
        m.check_integrity(&lib).unwrap();
    }

    #[test]
    fn inverter_read_by_opaque_cell_is_kept() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n = m.add_wire("n", 1).unwrap();
        let o = m.add_output("o", 1).unwrap();
        let inv = add_not(&mut m, "inv", a, n);
        let buf = add_ibuf(&mut m, "buf", n, o);
        // No schema for OPAQUE, its ports have no known direction
        let bb = m.add_cell("bb", "OPAQUE").unwrap();
        m.set_port(bb, "I", m.sig(n).unwrap()).unwrap();

        assert_eq!(integrate_module(&mut m, &lib, &Selection::all()).unwrap(), 1);
        assert!(m.contains_cell(inv));
        assert_eq!(m.cell(buf).unwrap().port("I"), Some(&m.sig(a).unwrap()));
        assert_eq!(m.cell(bb).unwrap().port("I"), Some(&m.sig(n).unwrap()));
    }

    #[test]
    fn inverter_driving_two_invertible_pins_is_removed() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n = m.add_wire("n", 1).unwrap();
        let o1 = m.add_output("o1", 1).unwrap();
        let o2 = m.add_output("o2", 1).unwrap();
        let inv = add_not(&mut m, "inv", a, n);
        add_ibuf(&mut m, "buf1", n, o1);
        add_ibuf(&mut m, "buf2", n, o2);

        let before = truth_table(&m, &lib, 1);
        assert_eq!(integrate_module(&mut m, &lib, &Selection::all()).unwrap(), 2);
        assert!(!m.contains_cell(inv));
        assert_eq!(truth_table(&m, &lib, 1), before);
    }

    #[test]
    fn inverter_on_output_port_is_kept() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n = m.add_output("n", 1).unwrap();
        let o = m.add_output("o", 1).unwrap();
        let inv = add_not(&mut m, "inv", a, n);
        add_ibuf(&mut m, "buf", n, o);

        let before = truth_table(&m, &lib, 1);
        assert_eq!(integrate_module(&mut m, &lib, &Selection::all()).unwrap(), 1);
        assert!(m.contains_cell(inv));
        assert_eq!(truth_table(&m, &lib, 1), before);
    }

    #[test]
    fn chain_of_inverters() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n1 = m.add_wire("n1", 1).unwrap();
        let n2 = m.add_wire("n2", 1).unwrap();
        let o = m.add_output("o", 1).unwrap();
        let inv1 = add_not(&mut m, "inv1", a, n1);
        let inv2 = add_not(&mut m, "inv2", n1, n2);
        let buf = add_ibuf(&mut m, "buf", n2, o);

        let before = truth_table(&m, &lib, 1);
        integrate_module(&mut m, &lib, &Selection::all()).unwrap();
        // Only the inverter directly on the pin is integrated
        assert!(m.contains_cell(inv1));
        assert!(!m.contains_cell(inv2));
        assert_eq!(m.cell(buf).unwrap().port("I"), Some(&m.sig(n1).unwrap()));
        assert_eq!(truth_table(&m, &lib, 1), before);
    }

    #[test]
    fn idempotent() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n = m.add_wire("n", 1).unwrap();
        let o = m.add_output("o", 1).unwrap();
        add_not(&mut m, "inv", a, n);
        let buf = add_ibuf(&mut m, "buf", n, o);

        assert_eq!(integrate_module(&mut m, &lib, &Selection::all()).unwrap(), 1);
        let generation = m.generation();
        let param = m.cell(buf).unwrap().param("INVERT_I").cloned();
        assert_eq!(integrate_module(&mut m, &lib, &Selection::all()).unwrap(), 0);
        assert_eq!(m.generation(), generation);
        assert_eq!(m.cell(buf).unwrap().param("INVERT_I").cloned(), param);
    }

    #[test]
    fn missing_param_is_written_as_zeros() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let o = m.add_output("o", 1).unwrap();
        let buf = add_ibuf(&mut m, "buf", a, o);
        integrate_module(&mut m, &lib, &Selection::all()).unwrap();
        assert_eq!(m.cell(buf).unwrap().param("INVERT_I"), Some(&Const::zeros(1)));
    }

    #[test]
    fn unselected_cells_are_left_alone() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n = m.add_wire("n", 1).unwrap();
        let o1 = m.add_output("o1", 1).unwrap();
        let o2 = m.add_output("o2", 1).unwrap();
        let inv = add_not(&mut m, "inv", a, n);
        let buf1 = add_ibuf(&mut m, "buf1", n, o1);
        let buf2 = add_ibuf(&mut m, "buf2", n, o2);

        let sel = Selection::none().with_cells("top", ["buf2"]);
        assert_eq!(integrate_module(&mut m, &lib, &sel).unwrap(), 1);
        assert!(m.contains_cell(inv));
        assert_eq!(m.cell(buf1).unwrap().port("I"), Some(&m.sig(n).unwrap()));
        assert_eq!(m.cell(buf2).unwrap().port("I"), Some(&m.sig(a).unwrap()));
        assert!(m.cell(buf1).unwrap().param("INVERT_I").is_none());
    }

    #[test]
    fn width_mismatch_is_fatal() {
        let mut design = Design::new();
        design.add_cell_type(bus_type()).unwrap();
        let mut m = Module::new("top");
        let d = m.add_input("d", 4).unwrap();
        let bus = m.add_cell("bus", "BUS").unwrap();
        m.set_port(bus, "D", m.sig(d).unwrap()).unwrap();
        m.set_param(bus, "INV_D", Const::zeros(3)).unwrap();
        design.add_module(m).unwrap();

        let err = IntegrateInv
            .execute(&mut design, &Selection::all())
            .unwrap_err();
        assert!(matches!(
            err,
            NetlistError::WidthMismatch {
                param_width: 3,
                port_width: 4,
                ..
            }
        ));
        let msg = err.to_string();
        assert!(msg.contains("bus") && msg.contains("INV_D") && msg.contains("BUS"));
    }

    #[test]
    fn non_binary_param_is_fatal_only_when_toggled() {
        let mut design = Design::new();
        design.add_cell_type(bus_type()).unwrap();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let d = m.add_wire("d", 4).unwrap();
        let inv = m.add_cell("inv", NOT).unwrap();
        m.set_port(inv, PORT_A, m.sig(a).unwrap()).unwrap();
        m.set_port(inv, PORT_Y, m.sig_bit(d, 0).unwrap().into()).unwrap();
        let bus = m.add_cell("bus", "BUS").unwrap();
        m.set_port(bus, "D", m.sig(d).unwrap()).unwrap();
        // x on an untouched bit is fine
        m.set_param(bus, "INV_D", Const::from_bin_str("x000").unwrap())
            .unwrap();
        design.add_module(m.clone()).unwrap();
        IntegrateInv.execute(&mut design, &Selection::all()).unwrap();
        let param = design
            .module("top")
            .unwrap()
            .cell(bus)
            .unwrap()
            .param("INV_D")
            .cloned();
        assert_eq!(param, Const::from_bin_str("x001"));

        // x on the toggled bit is not
        let mut design = Design::new();
        design.add_cell_type(bus_type()).unwrap();
        m.set_param(bus, "INV_D", Const::from_bin_str("000x").unwrap())
            .unwrap();
        design.add_module(m).unwrap();
        let err = IntegrateInv
            .execute(&mut design, &Selection::all())
            .unwrap_err();
        assert!(matches!(
            err,
            NetlistError::NonBinaryParameter {
                bit: 0,
                value: State::Sx,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_inverters_are_an_invalid_state() {
        let lib = test_library();
        let mut m = Module::new("top");
        let a = m.add_input("a", 1).unwrap();
        let n = m.add_wire("n", 1).unwrap();
        add_not(&mut m, "inv1", a, n);
        add_not(&mut m, "inv2", a, n);
        assert!(matches!(
            integrate_module(&mut m, &lib, &Selection::all()),
            Err(NetlistError::InvalidState(_))
        ));
    }
}
