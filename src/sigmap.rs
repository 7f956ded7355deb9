//! Canonical signal identity.
//!
//! Wire bits joined by direct connections ([`Module::connect`]) are electrically
//! the same node. A [`SigMap`] groups them into equivalence classes and maps
//! every bit to the representative of its class, so that two differently named
//! bits can be compared for identity.
//!
//! The map is a snapshot: it does not follow later mutations of the module.
//! Wires created after it was built canonicalize to themselves.

use std::collections::HashMap;

use crate::netlist::{Module, SigBit, SigSpec};

/// Union-find over signal bits.
///
/// When a class contains a constant, the constant is its representative.
/// Otherwise the representative only depends on the order of the connections.
#[derive(Debug, Clone, Default)]
pub struct SigMap {
    parent: HashMap<SigBit, SigBit>,
}

impl SigMap {
    /// Builds the map from all aliasing connections of the module.
    pub fn new(module: &Module) -> Self {
        let mut sigmap = SigMap::default();
        for (lhs, rhs) in module.connections() {
            sigmap.add(lhs, rhs);
        }
        sigmap.compress();
        sigmap
    }

    /// Merges the classes of the bits of `lhs` and `rhs`, bit by bit.
    pub fn add(&mut self, lhs: &SigSpec, rhs: &SigSpec) {
        for (a, b) in lhs.bits().iter().zip(rhs.bits()) {
            self.union(*a, *b);
        }
    }

    fn find_mut(&mut self, bit: SigBit) -> SigBit {
        let root = self.bit(bit);
        // Path compression
        let mut cur = bit;
        while let Some(&next) = self.parent.get(&cur) {
            if next == root {
                break;
            }
            self.parent.insert(cur, root);
            cur = next;
        }
        root
    }

    fn union(&mut self, a: SigBit, b: SigBit) {
        let ra = self.find_mut(a);
        let rb = self.find_mut(b);
        if ra == rb {
            return;
        }
        match (ra, rb) {
            // Keep the constant as representative. Two different constants
            // should never be aliased; if they are, the first one wins.
            (SigBit::Const(_), _) => {
                self.parent.insert(rb, ra);
            }
            (_, SigBit::Const(_)) => {
                self.parent.insert(ra, rb);
            }
            _ => {
                self.parent.insert(rb, ra);
            }
        }
    }

    fn compress(&mut self) {
        let keys: Vec<SigBit> = self.parent.keys().copied().collect();
        for key in keys {
            let root = self.bit(key);
            self.parent.insert(key, root);
        }
    }

    /// Canonical representative of a bit. Unknown bits map to themselves.
    pub fn bit(&self, bit: SigBit) -> SigBit {
        let mut cur = bit;
        while let Some(&next) = self.parent.get(&cur) {
            cur = next;
        }
        cur
    }

    /// Canonicalizes every bit of a signal.
    pub fn spec(&self, sig: &SigSpec) -> SigSpec {
        sig.bits().iter().map(|bit| self.bit(*bit)).collect()
    }

    /// True if both bits canonicalize to the same representative.
    pub fn same(&self, a: SigBit, b: SigBit) -> bool {
        self.bit(a) == self.bit(b)
    }
}
