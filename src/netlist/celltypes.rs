//! Cell type schemas and the library holding them.
//!
//! Port directions are a property of the cell type, not of the instance:
//! a port of a cell whose type is not in the library is neither an input nor
//! an output.

use indexmap::IndexMap;

use super::{NetlistError, Result};

/// Single-bit inverter, `Y = !A`.
pub const NOT: &str = "$_NOT_";
/// Single-bit 2-to-1 selector, `Y = S ? B : A`.
pub const MUX: &str = "$_MUX_";

pub const PORT_A: &str = "A";
pub const PORT_B: &str = "B";
pub const PORT_S: &str = "S";
pub const PORT_Y: &str = "Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

/// Declaration of one port of a cell type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDecl {
    pub direction: PortDirection,
    /// Declared width, `None` when instances may connect any width.
    pub width: Option<usize>,
    /// Name of the parameter recording which bits of this port are inverted.
    pub invertible_pin: Option<String>,
}

impl PortDecl {
    pub fn input(width: Option<usize>) -> Self {
        PortDecl {
            direction: PortDirection::Input,
            width,
            invertible_pin: None,
        }
    }

    pub fn output(width: Option<usize>) -> Self {
        PortDecl {
            direction: PortDirection::Output,
            width,
            invertible_pin: None,
        }
    }

    /// Marks the port as invertible through parameter `param`.
    pub fn invertible(mut self, param: &str) -> Self {
        self.invertible_pin = Some(param.to_string());
        self
    }
}

/// Schema of a cell type: its name and its ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellType {
    name: String,
    ports: IndexMap<String, PortDecl>,
}

impl CellType {
    pub fn new(name: &str) -> Self {
        CellType {
            name: name.to_string(),
            ports: IndexMap::new(),
        }
    }

    pub fn with_port(mut self, port: &str, decl: PortDecl) -> Self {
        self.ports.insert(port.to_string(), decl);
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn port(&self, port: &str) -> Option<&PortDecl> {
        self.ports.get(port)
    }

    pub fn ports(&self) -> impl Iterator<Item = (&str, &PortDecl)> {
        self.ports.iter().map(|(name, decl)| (name.as_str(), decl))
    }
}

/// All cell types known to a design.
#[derive(Debug, Clone)]
pub struct CellLibrary {
    types: IndexMap<String, CellType>,
}

impl Default for CellLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl CellLibrary {
    /// A library holding the built-in [`NOT`] and [`MUX`] types.
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        types.insert(
            NOT.to_string(),
            CellType::new(NOT)
                .with_port(PORT_A, PortDecl::input(Some(1)))
                .with_port(PORT_Y, PortDecl::output(Some(1))),
        );
        types.insert(
            MUX.to_string(),
            CellType::new(MUX)
                .with_port(PORT_A, PortDecl::input(Some(1)))
                .with_port(PORT_B, PortDecl::input(Some(1)))
                .with_port(PORT_S, PortDecl::input(Some(1)))
                .with_port(PORT_Y, PortDecl::output(Some(1))),
        );
        CellLibrary { types }
    }

    pub fn add(&mut self, cell_type: CellType) -> Result<()> {
        if self.types.contains_key(cell_type.get_name()) {
            return Err(NetlistError::DuplicateCellType(
                cell_type.get_name().to_string(),
            ));
        }
        self.types.insert(cell_type.get_name().to_string(), cell_type);
        Ok(())
    }

    pub fn cell_type(&self, name: &str) -> Option<&CellType> {
        self.types.get(name)
    }

    pub fn port_direction(&self, cell_type: &str, port: &str) -> Option<PortDirection> {
        Some(self.cell_type(cell_type)?.port(port)?.direction)
    }

    pub fn is_input(&self, cell_type: &str, port: &str) -> bool {
        self.port_direction(cell_type, port) == Some(PortDirection::Input)
    }

    pub fn is_output(&self, cell_type: &str, port: &str) -> bool {
        self.port_direction(cell_type, port) == Some(PortDirection::Output)
    }

    /// The inversion parameter declared for a port, if any.
    pub fn invertible_pin(&self, cell_type: &str, port: &str) -> Option<&str> {
        self.cell_type(cell_type)?
            .port(port)?
            .invertible_pin
            .as_deref()
    }
}
