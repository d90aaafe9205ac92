//! Iteration options (spec §4.3.5): `lowerbound`, `upperbound`, `reverse`.
//!
//! Each combinator on [`River`](crate::river::River) returns a new handle
//! carrying modified options; stacking the same option twice is rejected
//! rather than silently overwritten, since a caller composing bounds and
//! direction is almost always a mistake if they do it twice.

use crate::error::{RiverError, RiverResult};

/// Per-handle iteration option state (spec §3.4, §4.3.5).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterOptions {
    lower: Option<i64>,
    upper: Option<i64>,
    reverse: bool,
    lower_set: bool,
    upper_set: bool,
    reverse_set: bool,
}

impl IterOptions {
    pub fn lower(&self) -> Option<i64> {
        self.lower
    }

    pub fn upper(&self) -> Option<i64> {
        self.upper
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// `lowerbound(key)`: the effective sort-key bound is inclusive. `key`
    /// here is already the resolved sort-key — running a caller's raw key
    /// through the river's `KeyTransform` (unless `key_transformed` was
    /// set) happens one layer up, in
    /// [`River::lowerbound`](crate::river::River::lowerbound), which is
    /// where the transform lives. Clamping against the river's own `FIN`
    /// happens later, at iteration time (spec §9 open question: clamp, not
    /// reject).
    pub fn with_lowerbound(&self, key: i64) -> RiverResult<IterOptions> {
        if self.lower_set {
            return Err(RiverError::IterationOptionsException("lowerbound"));
        }
        let mut next = self.clone();
        next.lower = Some(key);
        next.lower_set = true;
        Ok(next)
    }

    /// `upperbound(key)`, inclusive.
    pub fn with_upperbound(&self, key: i64) -> RiverResult<IterOptions> {
        if self.upper_set {
            return Err(RiverError::IterationOptionsException("upperbound"));
        }
        let mut next = self.clone();
        next.upper = Some(key);
        next.upper_set = true;
        Ok(next)
    }

    /// `reverse`: flips traversal direction. Survives combination with
    /// bounds (spec §4.3.5); composing with a second `reverse` fails.
    pub fn with_reverse(&self) -> RiverResult<IterOptions> {
        if self.reverse_set {
            return Err(RiverError::IterationOptionsException("reverse"));
        }
        let mut next = self.clone();
        next.reverse = true;
        next.reverse_set = true;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacking_lowerbound_twice_fails() {
        let opts = IterOptions::default().with_lowerbound(1).unwrap();
        assert!(matches!(
            opts.with_lowerbound(2),
            Err(RiverError::IterationOptionsException("lowerbound"))
        ));
    }

    #[test]
    fn stacking_reverse_twice_fails() {
        let opts = IterOptions::default().with_reverse().unwrap();
        assert!(matches!(
            opts.with_reverse(),
            Err(RiverError::IterationOptionsException("reverse"))
        ));
    }

    #[test]
    fn bounds_survive_combination_with_reverse() {
        let opts = IterOptions::default()
            .with_lowerbound(2)
            .unwrap()
            .with_reverse()
            .unwrap();
        assert_eq!(opts.lower(), Some(2));
        assert!(opts.is_reverse());
    }

    #[test]
    fn distinct_bounds_both_apply() {
        let opts = IterOptions::default()
            .with_lowerbound(2)
            .unwrap()
            .with_upperbound(9)
            .unwrap();
        assert_eq!(opts.lower(), Some(2));
        assert_eq!(opts.upper(), Some(9));
    }
}
