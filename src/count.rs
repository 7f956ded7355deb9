//! Counting of selected objects.

use std::fmt::Display;

use log::info;

use crate::{
    netlist::{Design, Result, Selection},
    pass::Pass,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCount {
    pub modules: usize,
    pub cells: usize,
}

impl Display for ObjectCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} module(s), {} cell(s)", self.modules, self.cells)
    }
}

/// Counts the selected modules, and the selected cells in them.
pub fn count(design: &Design, selection: &Selection) -> ObjectCount {
    let mut count = ObjectCount::default();
    for module in design.modules() {
        if !selection.selects_module(module.get_name()) {
            continue;
        }
        count.modules += 1;
        count.cells += module.selected_cells(selection).len();
    }
    count
}

/// The `count` pass, logging the number of selected cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl Pass for Count {
    fn name(&self) -> &'static str {
        "count"
    }

    fn help(&self) -> &'static str {
        "count [selection]\n\n\
        Reports the number of selected cells (and modules)."
    }

    fn execute(&self, design: &mut Design, selection: &Selection) -> Result<()> {
        let count = count(design, selection);
        info!("{}", count.cells);
        info!("({})", count);
        Ok(())
    }
}
