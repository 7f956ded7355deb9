use thiserror::Error;

use super::{CellId, State, WireId};

/// The result of a netlist operation.
pub type Result<T> = std::result::Result<T, NetlistError>;

/// Error returned when a netlist operation or a pass failed.
#[derive(Debug, Error)]
pub enum NetlistError {
    /// The cell handle does not refer to a live cell of the module.
    #[error("cell {0} does not exist")]
    CellDoesNotExist(CellId),

    /// The wire handle does not refer to a wire of the module.
    #[error("wire {0} does not exist")]
    WireDoesNotExist(WireId),

    /// A different cell with the given name already exists in the module.
    #[error("a cell named {0} already exists")]
    DuplicateCellName(String),

    /// A different wire with the given name already exists in the module.
    #[error("a wire named {0} already exists")]
    DuplicateWireName(String),

    /// Both sides of an aliasing connection must have the same width.
    #[error("cannot connect signals of different widths ({0} vs {1} bits)")]
    ConnectionWidthMismatch(usize, usize),

    /// A different module with the given name already exists in the design.
    #[error("a module named {0} already exists")]
    DuplicateModuleName(String),

    /// No module with the given name exists in the design.
    #[error("module {0} does not exist")]
    ModuleDoesNotExist(String),

    /// A cell type with the given name is already registered in the library.
    #[error("cell type {0} is already registered")]
    DuplicateCellType(String),

    /// No pass is registered under the given name.
    #[error("no pass named {0}")]
    UnknownPass(String),

    /// An inversion parameter does not have the width of the port it controls.
    #[error(
        "the inversion parameter needs to be the same width as the port \
        ({module}.{cell_type} cell {cell} port {port} parameter {param}: {param_width} vs {port_width} bits)"
    )]
    WidthMismatch {
        module: String,
        cell: String,
        cell_type: String,
        port: String,
        param: String,
        param_width: usize,
        port_width: usize,
    },

    /// An inversion parameter bit that had to be toggled was neither 0 nor 1.
    #[error("the inversion parameter must contain only 0s and 1s ({cell} parameter {param} bit {bit} is {value})")]
    NonBinaryParameter {
        cell: String,
        param: String,
        bit: usize,
        value: State,
    },

    /// The netlist has reached an invalid state, for example two inverters
    /// claiming the same output bit.
    #[error("the netlist has reached an invalid state: {0}")]
    InvalidState(String),
}
