//! Inverter rewriting passes for gate-level netlists.
//!
//! A [`Design`] holds [`Module`]s made of cells connected by wires. Two passes
//! rewrite the inverters ([`NOT`] cells) they contain:
//! - [`integrate`]: folds inverters into the invertible ports of the cells they drive;
//! - [`muxprop`]: pushes inverters through selectors ([`MUX`] cells), toward their inputs.
//!
//! Both rely on the [`SigMap`] to compare signals through direct connections, and on the
//! [`NetIndex`] to find drivers and sinks.
//!
//! [`NOT`]: netlist::celltypes::NOT
//! [`MUX`]: netlist::celltypes::MUX

pub mod count;
pub mod dot;
pub mod index;
pub mod integrate;
pub mod muxprop;
pub mod netlist;
pub mod pass;
pub mod sigmap;

#[cfg(test)]
mod testutil;

// Re-exporting symbols and modules.
pub use count::{Count, ObjectCount, count};
pub use index::{NetIndex, Pin};
pub use integrate::IntegrateInv;
pub use muxprop::{MuxProp, MuxPropConfig};
pub use netlist::{
    Cell, CellId, CellLibrary, CellType, Const, Design, Module, NetlistError, PortDecl,
    PortDirection, Result, Selection, SigBit, SigSpec, State, WireId,
};
pub use pass::{Pass, passes, run_pass};
pub use sigmap::SigMap;
