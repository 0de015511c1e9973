//! Per-column style modifiers applied to a [`crate::Line`].

use bitflags::bitflags;

bitflags! {
    /// The set of style modifiers active at one column of a line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifier: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const UNDERLINE     = 1 << 2;
        const REVERSE       = 1 << 3;
        const ITALIC        = 1 << 4;
        /// Marks a warning-severity status-line segment (§7).
        const WARNING       = 1 << 5;
        /// Marks an error-severity status-line segment (§7).
        const ERROR         = 1 << 6;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_bits() {
        assert!(Modifier::empty().is_empty());
    }

    #[test]
    fn union_combines_bits() {
        let m = Modifier::BOLD | Modifier::UNDERLINE;
        assert!(m.contains(Modifier::BOLD));
        assert!(m.contains(Modifier::UNDERLINE));
        assert!(!m.contains(Modifier::REVERSE));
    }
}
