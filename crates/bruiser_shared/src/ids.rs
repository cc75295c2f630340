//! Id newtypes for host objects.
//!
//! The host hands out plain 32-bit ids. Wrapping them keeps a form id from
//! being passed where a reference id is expected.

use std::fmt;

/// A placed object reference in the world (actors included).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefId(pub u32);

/// A base form: weapon, spell, armor...
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormId(pub u32);

/// A resolved keyword form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeywordId(pub u32);

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::Display for KeywordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Equip slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    /// Left hand.
    Left,
    /// Right hand.
    Right,
}

impl Hand {
    /// Both hands, right first.
    pub const BOTH: [Self; 2] = [Self::Right, Self::Left];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_format_as_hex() {
        assert_eq!(FormId(0x1f4).to_string(), "0x000001f4");
        assert_eq!(RefId(0x14).to_string(), "0x00000014");
    }
}
