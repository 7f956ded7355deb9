//! Signal values: a [`SigBit`] is one bit of a wire or a constant [`State`],
//! a [`SigSpec`] is an ordered vector of them (LSB first), and a [`Const`]
//! is a fixed-width vector of states as stored in cell parameters.

use std::{fmt::Display, ops::Index};

/// Handle of a wire, local to its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub(crate) u32);

impl WireId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Logic state of a constant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    S0,
    S1,
    /// Unknown / don't care.
    Sx,
    /// Undriven.
    Sz,
}

impl State {
    /// Returns the negated state if it is binary.
    pub fn toggled(self) -> Option<State> {
        match self {
            State::S0 => Some(State::S1),
            State::S1 => Some(State::S0),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            State::S0 => '0',
            State::S1 => '1',
            State::Sx => 'x',
            State::Sz => 'z',
        }
    }

    fn from_char(ch: char) -> Option<State> {
        match ch {
            '0' => Some(State::S0),
            '1' => Some(State::S1),
            'x' | 'X' => Some(State::Sx),
            'z' | 'Z' => Some(State::Sz),
            _ => None,
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        if value { State::S1 } else { State::S0 }
    }
}

/// A single signal bit: either a constant or one bit of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SigBit {
    Const(State),
    Wire { wire: WireId, offset: usize },
}

impl SigBit {
    pub fn wire(wire: WireId, offset: usize) -> Self {
        SigBit::Wire { wire, offset }
    }

    pub fn is_wire(&self) -> bool {
        matches!(self, SigBit::Wire { .. })
    }

    pub fn get_wire(&self) -> Option<WireId> {
        match self {
            SigBit::Wire { wire, .. } => Some(*wire),
            SigBit::Const(_) => None,
        }
    }
}

impl From<State> for SigBit {
    fn from(value: State) -> Self {
        SigBit::Const(value)
    }
}

impl Display for SigBit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigBit::Const(state) => write!(f, "1'{}", state),
            SigBit::Wire { wire, offset } => write!(f, "{}[{}]", wire, offset),
        }
    }
}

/// An ordered vector of signal bits, LSB first. This is what a cell port or
/// an aliasing connection is connected to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SigSpec(Vec<SigBit>);

impl SigSpec {
    pub fn new() -> Self {
        SigSpec(Vec::new())
    }

    /// All bits of a wire of the given width.
    pub fn from_wire(wire: WireId, width: usize) -> Self {
        SigSpec((0..width).map(|offset| SigBit::wire(wire, offset)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[SigBit] {
        &self.0
    }

    pub fn bit(&self, index: usize) -> Option<SigBit> {
        self.0.get(index).copied()
    }

    /// Overwrites one bit. Out of range indices are ignored and reported as `false`.
    pub fn set_bit(&mut self, index: usize, bit: SigBit) -> bool {
        match self.0.get_mut(index) {
            Some(slot) => {
                *slot = bit;
                true
            }
            None => false,
        }
    }

    pub fn append(&mut self, other: &SigSpec) {
        self.0.extend_from_slice(&other.0);
    }
}

impl From<SigBit> for SigSpec {
    fn from(value: SigBit) -> Self {
        SigSpec(vec![value])
    }
}

impl From<Vec<SigBit>> for SigSpec {
    fn from(value: Vec<SigBit>) -> Self {
        SigSpec(value)
    }
}

impl FromIterator<SigBit> for SigSpec {
    fn from_iter<T: IntoIterator<Item = SigBit>>(iter: T) -> Self {
        SigSpec(iter.into_iter().collect())
    }
}

impl Index<usize> for SigSpec {
    type Output = SigBit;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Display for SigSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, bit) in self.0.iter().rev().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", bit)?;
        }
        write!(f, "}}")
    }
}

/// A fixed-width constant, LSB first. Used for cell parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Const(Vec<State>);

impl Const {
    pub fn zeros(width: usize) -> Self {
        Const(vec![State::S0; width])
    }

    /// The `width` low bits of `value`.
    pub fn from_u64(value: u64, width: usize) -> Self {
        Const(
            (0..width)
                .map(|i| State::from(i < 64 && (value >> i) & 1 == 1))
                .collect(),
        )
    }

    /// Parses a string written MSB first, like `"01x0"`.
    pub fn from_bin_str(s: &str) -> Option<Self> {
        s.chars()
            .rev()
            .map(State::from_char)
            .collect::<Option<Vec<State>>>()
            .map(Const)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<State> {
        self.0.get(index).copied()
    }

    pub fn set(&mut self, index: usize, state: State) {
        self.0[index] = state;
    }

    pub fn states(&self) -> &[State] {
        &self.0
    }

    /// Integer value, if every bit is binary and the constant fits.
    pub fn as_u64(&self) -> Option<u64> {
        if self.0.len() > 64 {
            return None;
        }
        self.0.iter().enumerate().try_fold(0u64, |acc, (i, state)| match state {
            State::S0 => Some(acc),
            State::S1 => Some(acc | (1 << i)),
            _ => None,
        })
    }
}

impl Display for Const {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'", self.0.len())?;
        for state in self.0.iter().rev() {
            write!(f, "{}", state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn const_from_bin_str() {
        let c = Const::from_bin_str("01x0").unwrap();
        assert_eq!(c.len(), 4);
        assert_eq!(c.get(0), Some(State::S0));
        assert_eq!(c.get(1), Some(State::Sx));
        assert_eq!(c.get(2), Some(State::S1));
        assert_eq!(c.get(3), Some(State::S0));
        assert_eq!(c.as_u64(), None);
        assert_eq!(c.states(), &[State::S0, State::Sx, State::S1, State::S0]);
        assert_eq!(c.to_string(), "4'01x0");
        assert!(Const::from_bin_str("012").is_none());
    }

    #[test]
    fn const_u64() {
        let c = Const::from_u64(0b1010, 4);
        assert_eq!(c.as_u64(), Some(0b1010));
        assert_eq!(Const::zeros(3).as_u64(), Some(0));
        assert_eq!(Const::from_u64(u64::MAX, 70).len(), 70);
    }

    #[test]
    fn state_toggle() {
        assert_eq!(State::S0.toggled(), Some(State::S1));
        assert_eq!(State::S1.toggled(), Some(State::S0));
        assert_eq!(State::Sx.toggled(), None);
        assert_eq!(State::Sz.toggled(), None);
    }

    #[test]
    fn sigspec_bits() {
        let w = WireId(3);
        let mut s = SigSpec::from_wire(w, 2);
        assert_eq!(s.bit(1), Some(SigBit::wire(w, 1)));
        assert!(s.set_bit(0, State::S1.into()));
        assert!(!s.set_bit(2, State::S1.into()));
        assert_eq!(s.to_string(), "{w3[1] 1'1}");
    }
}
