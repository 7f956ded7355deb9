//! Pass interface and registry.

use log::debug;

use crate::{
    count::Count,
    integrate::IntegrateInv,
    muxprop::MuxProp,
    netlist::{Design, NetlistError, Result, Selection},
};

/// A transformation (or query) applied to the selected part of a design.
pub trait Pass {
    /// Name the pass is registered under.
    fn name(&self) -> &'static str;

    /// Usage text.
    fn help(&self) -> &'static str;

    fn execute(&self, design: &mut Design, selection: &Selection) -> Result<()>;
}

/// All registered passes, with their default configuration.
pub fn passes() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(IntegrateInv),
        Box::new(MuxProp::new()),
        Box::new(Count),
    ]
}

/// Runs the pass registered under `name`.
pub fn run_pass(name: &str, design: &mut Design, selection: &Selection) -> Result<()> {
    let pass = passes()
        .into_iter()
        .find(|pass| pass.name() == name)
        .ok_or_else(|| NetlistError::UnknownPass(name.to_string()))?;
    debug!("Running pass {}", name);
    pass.execute(design, selection)
}
