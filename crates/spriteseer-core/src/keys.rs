//! Snapshot of the keys the simulation cares about.

use bitflags::bitflags;

bitflags! {
    /// Held-key snapshot, rebuilt from keyboard events every frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Keys: u8 {
        const W = 1 << 0;
        const A = 1 << 1;
        const S = 1 << 2;
        const D = 1 << 3;
        const SPACE = 1 << 4;
        const SHIFT = 1 << 5;
        const CTRL = 1 << 6;
    }
}

impl Keys {
    /// Horizontal input axis: -1 for left only, 1 for right only, 0 otherwise.
    #[inline]
    pub const fn horizontal(self) -> i8 {
        match (self.contains(Self::A), self.contains(Self::D)) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }

    /// Vertical input axis in screen space (down is positive).
    #[inline]
    pub const fn vertical(self) -> i8 {
        match (self.contains(Self::W), self.contains(Self::S)) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel() {
        assert_eq!((Keys::A | Keys::D).horizontal(), 0);
        assert_eq!((Keys::W | Keys::S).vertical(), 0);
        assert_eq!(Keys::empty().horizontal(), 0);
    }

    #[test]
    fn single_keys_map_to_axis() {
        assert_eq!(Keys::D.horizontal(), 1);
        assert_eq!(Keys::A.horizontal(), -1);
        assert_eq!((Keys::W | Keys::SHIFT).vertical(), -1);
        assert_eq!(Keys::S.vertical(), 1);
    }
}
