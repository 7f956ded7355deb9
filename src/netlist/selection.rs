//! Object selections, narrowing which modules and cells a pass acts on.

use std::collections::{HashMap, HashSet};

/// A set of selected modules and cells.
///
/// A module is either selected whole, or partially through a set of cell names.
///
/// ```rust
/// use netinv::Selection;
/// let sel = Selection::module("top").with_cells("alu", ["u1", "u2"]);
/// assert!(sel.selects_cell("top", "anything"));
/// assert!(sel.selects_cell("alu", "u1"));
/// assert!(!sel.selects_cell("alu", "u3"));
/// assert!(!sel.selects_module("other"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    full: bool,
    modules: HashMap<String, Option<HashSet<String>>>,
}

impl Selection {
    /// Everything in the design.
    pub fn all() -> Self {
        Selection {
            full: true,
            modules: HashMap::new(),
        }
    }

    /// Nothing.
    pub fn none() -> Self {
        Selection::default()
    }

    /// A single whole module.
    pub fn module(name: &str) -> Self {
        Selection::none().with_module(name)
    }

    pub fn with_module(mut self, name: &str) -> Self {
        self.modules.insert(name.to_string(), None);
        self
    }

    /// Adds cells of a module. Has no effect if the module is already selected whole.
    pub fn with_cells<I, S>(mut self, module: &str, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self
            .modules
            .entry(module.to_string())
            .or_insert_with(|| Some(HashSet::new()));
        if let Some(set) = entry {
            set.extend(cells.into_iter().map(|c| c.as_ref().to_string()));
        }
        self
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// True if the module is selected, whole or partially.
    pub fn selects_module(&self, module: &str) -> bool {
        self.full || self.modules.contains_key(module)
    }

    pub fn selects_whole_module(&self, module: &str) -> bool {
        self.full || matches!(self.modules.get(module), Some(None))
    }

    pub fn selects_cell(&self, module: &str, cell: &str) -> bool {
        if self.full {
            return true;
        }
        match self.modules.get(module) {
            Some(None) => true,
            Some(Some(cells)) => cells.contains(cell),
            None => false,
        }
    }
}
