use std::collections::HashMap;

use crate::sigmap::SigMap;

use super::{
    CellLibrary, Module, NetlistError, PortDirection, Result, SigBit, SigSpec,
    celltypes::{MUX, NOT},
};

impl Module {
    /// Checking if the module structure is correct.
    /// This function was written for debug purposes, as the passes are supposed to maintain
    /// integrity of the module at any moment. It checks that:
    /// - all wire bits referenced by cells and connections exist
    /// - ports of the built-in cells are single-bit
    /// - ports with a declared width are connected with that width
    /// - no signal is driven twice (primary inputs count as drivers).
    pub fn check_integrity(&self, library: &CellLibrary) -> Result<()> {
        for (lhs, rhs) in self.connections() {
            self.check_sig_integrity(lhs)?;
            self.check_sig_integrity(rhs)?;
        }

        for (_, cell) in self.cells() {
            for (port, sig) in cell.connections() {
                self.check_sig_integrity(sig)?;

                let builtin = cell.get_type() == NOT || cell.get_type() == MUX;
                if builtin && sig.len() != 1 {
                    return Err(NetlistError::InvalidState(format!(
                        "port {} of {} cell {} is {} bits wide",
                        port,
                        cell.get_type(),
                        cell.get_name(),
                        sig.len()
                    )));
                }

                let declared = library
                    .cell_type(cell.get_type())
                    .and_then(|t| t.port(port))
                    .and_then(|decl| decl.width);
                if let Some(width) = declared {
                    if width != sig.len() {
                        return Err(NetlistError::InvalidState(format!(
                            "port {} of cell {} is declared with {} bits but connected to {}",
                            port,
                            cell.get_name(),
                            width,
                            sig.len()
                        )));
                    }
                }
            }
        }

        self.check_single_drivers(library)
    }

    fn check_sig_integrity(&self, sig: &SigSpec) -> Result<()> {
        for bit in sig.bits() {
            if let SigBit::Wire { wire, offset } = bit {
                self.sig_bit(*wire, *offset)?;
            }
        }
        Ok(())
    }

    fn check_single_drivers(&self, library: &CellLibrary) -> Result<()> {
        let sigmap = SigMap::new(self);
        let mut drivers: HashMap<SigBit, String> = HashMap::new();
        let mut claim = |bit: SigBit, driver: String| -> Result<()> {
            if !bit.is_wire() {
                return Ok(());
            }
            let canonical = sigmap.bit(bit);
            if let Some(previous) = drivers.insert(canonical, driver.clone()) {
                return Err(NetlistError::InvalidState(format!(
                    "{} is driven by both {} and {}",
                    canonical, previous, driver
                )));
            }
            Ok(())
        };

        for (id, wire) in self.wires() {
            if wire.port_input {
                for offset in 0..wire.get_width() {
                    claim(SigBit::wire(id, offset), format!("input port {}", wire.get_name()))?;
                }
            }
        }

        for (_, cell) in self.cells() {
            for (port, sig) in cell.connections() {
                if library.port_direction(cell.get_type(), port) != Some(PortDirection::Output) {
                    continue;
                }
                for (i, bit) in sig.bits().iter().enumerate() {
                    claim(*bit, format!("{}.{}[{}]", cell.get_name(), port, i))?;
                }
            }
        }

        Ok(())
    }
}
