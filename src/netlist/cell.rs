use std::fmt::Display;

use indexmap::IndexMap;

use super::{
    Const, SigSpec,
    celltypes::{MUX, NOT},
};

/// Handle of a cell, local to its module.
///
/// Handles are never reused: once a cell is removed, its handle stays dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A cell instance: a typed node with port connections and parameters.
///
/// Port connections and parameters keep their insertion order, which makes
/// every scan over them deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub(super) name: String,
    pub(super) cell_type: String,
    pub(super) connections: IndexMap<String, SigSpec>,
    pub(super) params: IndexMap<String, Const>,
}

impl Cell {
    pub(super) fn new(name: String, cell_type: &str) -> Self {
        Cell {
            name,
            cell_type: cell_type.to_string(),
            connections: IndexMap::new(),
            params: IndexMap::new(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_type(&self) -> &str {
        &self.cell_type
    }

    pub fn is_not(&self) -> bool {
        self.cell_type == NOT
    }

    pub fn is_mux(&self) -> bool {
        self.cell_type == MUX
    }

    pub fn port(&self, port: &str) -> Option<&SigSpec> {
        self.connections.get(port)
    }

    pub fn connections(&self) -> impl Iterator<Item = (&str, &SigSpec)> {
        self.connections
            .iter()
            .map(|(port, sig)| (port.as_str(), sig))
    }

    pub fn param(&self, name: &str) -> Option<&Const> {
        self.params.get(name)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &Const)> {
        self.params.iter().map(|(name, value)| (name.as_str(), value))
    }
}
