//! Module defining the [`Design`] and [`Module`] containers, as well as [`Cell`], [`SigSpec`]
//! and the other structs the passes operate on.
//!
//! To start rewriting, check [`crate::integrate`] and [`crate::muxprop`] docs.

pub mod cell;
pub mod celltypes;
pub mod error;
mod integrity;
pub mod selection;
pub mod sig;

use std::collections::HashMap;

use indexmap::IndexMap;

pub use cell::{Cell, CellId};
pub use celltypes::{CellLibrary, CellType, PortDecl, PortDirection};
pub use error::{NetlistError, Result};
pub use selection::Selection;
pub use sig::{Const, SigBit, SigSpec, State, WireId};

/// Prefix of engine-generated wire and cell names.
const AUTO_NAME_PREFIX: &str = "$auto$netinv$";

/// A named, fixed-width wire. Module ports are wires carrying a port flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    name: String,
    width: usize,
    pub port_input: bool,
    pub port_output: bool,
}

impl Wire {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_width(&self) -> usize {
        self.width
    }
}

/// A module: an arena of cells, a list of wires, and the direct wire-to-wire
/// connections aliasing them.
///
/// Cells are addressed through [`CellId`] handles. Removing a cell frees its slot,
/// and the handle is never handed out again.
///
/// Every structural mutation (adding or removing a cell, rewriting a port,
/// adding a connection) bumps the module [`generation`]. Caches built over the
/// connectivity of the module, like [`crate::index::NetIndex`], compare it
/// with the generation they were built at to know when they are stale.
///
/// [`generation`]: Module::generation
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    wires: Vec<Wire>,
    wire_names: HashMap<String, WireId>,
    cells: Vec<Option<Cell>>,
    cell_names: HashMap<String, CellId>,
    connections: Vec<(SigSpec, SigSpec)>,
    generation: u64,
    next_auto_id: u64,
}

impl Module {
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            wires: Vec::new(),
            wire_names: HashMap::new(),
            cells: Vec::new(),
            cell_names: HashMap::new(),
            connections: Vec::new(),
            generation: 0,
            next_auto_id: 0,
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    fn auto_name(&mut self) -> String {
        loop {
            let name = format!("{}{}", AUTO_NAME_PREFIX, self.next_auto_id);
            self.next_auto_id += 1;
            if !self.wire_names.contains_key(&name) && !self.cell_names.contains_key(&name) {
                return name;
            }
        }
    }

    // Wires

    pub fn add_wire(&mut self, name: &str, width: usize) -> Result<WireId> {
        if self.wire_names.contains_key(name) {
            return Err(NetlistError::DuplicateWireName(name.to_string()));
        }
        let id = WireId(self.wires.len() as u32);
        self.wires.push(Wire {
            name: name.to_string(),
            width,
            port_input: false,
            port_output: false,
        });
        self.wire_names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Adds a wire flagged as a module input port.
    pub fn add_input(&mut self, name: &str, width: usize) -> Result<WireId> {
        let id = self.add_wire(name, width)?;
        self.wires[id.index()].port_input = true;
        Ok(id)
    }

    /// Adds a wire flagged as a module output port.
    pub fn add_output(&mut self, name: &str, width: usize) -> Result<WireId> {
        let id = self.add_wire(name, width)?;
        self.wires[id.index()].port_output = true;
        Ok(id)
    }

    /// Adds a wire with an engine-generated unique name.
    pub fn new_wire(&mut self, width: usize) -> WireId {
        let name = self.auto_name();
        let id = WireId(self.wires.len() as u32);
        self.wires.push(Wire {
            name: name.clone(),
            width,
            port_input: false,
            port_output: false,
        });
        self.wire_names.insert(name, id);
        id
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id.index())
    }

    pub fn wire_by_name(&self, name: &str) -> Option<WireId> {
        self.wire_names.get(name).copied()
    }

    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires
            .iter()
            .enumerate()
            .map(|(i, wire)| (WireId(i as u32), wire))
    }

    /// All bits of a wire.
    pub fn sig(&self, id: WireId) -> Result<SigSpec> {
        let wire = self.wire(id).ok_or(NetlistError::WireDoesNotExist(id))?;
        Ok(SigSpec::from_wire(id, wire.width))
    }

    /// One bit of a wire.
    pub fn sig_bit(&self, id: WireId, offset: usize) -> Result<SigBit> {
        let wire = self.wire(id).ok_or(NetlistError::WireDoesNotExist(id))?;
        if offset >= wire.width {
            return Err(NetlistError::InvalidState(format!(
                "bit {} out of range for wire {} of width {}",
                offset, wire.name, wire.width
            )));
        }
        Ok(SigBit::wire(id, offset))
    }

    // Aliasing connections

    /// Connects two signals directly, making them electrically the same.
    pub fn connect(&mut self, lhs: SigSpec, rhs: SigSpec) -> Result<()> {
        if lhs.len() != rhs.len() {
            return Err(NetlistError::ConnectionWidthMismatch(lhs.len(), rhs.len()));
        }
        self.connections.push((lhs, rhs));
        self.touch();
        Ok(())
    }

    pub fn connections(&self) -> &[(SigSpec, SigSpec)] {
        &self.connections
    }

    // Cells

    /// Create a new cell with the given name and type, without any connection.
    pub fn add_cell(&mut self, name: &str, cell_type: &str) -> Result<CellId> {
        if self.cell_names.contains_key(name) {
            return Err(NetlistError::DuplicateCellName(name.to_string()));
        }
        Ok(self.insert_cell(name.to_string(), cell_type))
    }

    /// Create a new cell with an engine-generated unique name.
    pub fn new_cell(&mut self, cell_type: &str) -> CellId {
        let name = self.auto_name();
        self.insert_cell(name, cell_type)
    }

    fn insert_cell(&mut self, name: String, cell_type: &str) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cell_names.insert(name.clone(), id);
        self.cells.push(Some(Cell::new(name, cell_type)));
        self.touch();
        id
    }

    /// Removes a cell from the module and returns it.
    pub fn remove_cell(&mut self, id: CellId) -> Result<Cell> {
        let cell = self
            .cells
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(NetlistError::CellDoesNotExist(id))?;
        self.cell_names.remove(&cell.name);
        self.touch();
        Ok(cell)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())?.as_ref()
    }

    fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell> {
        self.cells
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(NetlistError::CellDoesNotExist(id))
    }

    pub fn contains_cell(&self, id: CellId) -> bool {
        self.cell(id).is_some()
    }

    pub fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.cell_names.get(name).copied()
    }

    /// Live cells, in creation order.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|cell| (CellId(i as u32), cell)))
    }

    pub fn cell_count(&self) -> usize {
        self.cell_names.len()
    }

    /// Snapshot of the live cell handles, safe to iterate while mutating the module.
    pub fn cell_ids(&self) -> Vec<CellId> {
        self.cells().map(|(id, _)| id).collect()
    }

    /// Snapshot of the handles of the live cells selected by `selection`.
    pub fn selected_cells(&self, selection: &Selection) -> Vec<CellId> {
        self.cells()
            .filter(|(_, cell)| selection.selects_cell(&self.name, &cell.name))
            .map(|(id, _)| id)
            .collect()
    }

    /// Connects (or reconnects) a port of a cell.
    pub fn set_port(&mut self, id: CellId, port: &str, sig: SigSpec) -> Result<()> {
        self.cell_mut(id)?.connections.insert(port.to_string(), sig);
        self.touch();
        Ok(())
    }

    pub fn set_param(&mut self, id: CellId, name: &str, value: Const) -> Result<()> {
        self.cell_mut(id)?.params.insert(name.to_string(), value);
        Ok(())
    }
}

/// A whole design: modules, plus the library of cell types they instantiate.
#[derive(Debug, Clone, Default)]
pub struct Design {
    modules: IndexMap<String, Module>,
    library: CellLibrary,
}

impl Design {
    /// Create an empty design whose library holds the built-in cell types.
    pub fn new() -> Self {
        Design {
            modules: IndexMap::new(),
            library: CellLibrary::new(),
        }
    }

    pub fn add_module(&mut self, module: Module) -> Result<()> {
        if self.modules.contains_key(module.get_name()) {
            return Err(NetlistError::DuplicateModuleName(
                module.get_name().to_string(),
            ));
        }
        self.modules.insert(module.get_name().to_string(), module);
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.get_mut(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Names of the selected modules, in insertion order.
    pub fn selected_modules(&self, selection: &Selection) -> Vec<String> {
        self.modules
            .keys()
            .filter(|name| selection.selects_module(name))
            .cloned()
            .collect()
    }

    pub fn add_cell_type(&mut self, cell_type: CellType) -> Result<()> {
        self.library.add(cell_type)
    }

    pub fn library(&self) -> &CellLibrary {
        &self.library
    }

    /// Mutable access to a module alongside the (shared) library, as passes need both.
    pub fn module_with_library(&mut self, name: &str) -> Result<(&mut Module, &CellLibrary)> {
        let module = self
            .modules
            .get_mut(name)
            .ok_or_else(|| NetlistError::ModuleDoesNotExist(name.to_string()))?;
        Ok((module, &self.library))
    }
}
