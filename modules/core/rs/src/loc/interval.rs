use std::fmt::{Debug, Display};
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;

use crate::num::{PrimInt, PrimUInt};
#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::Dissolve;
use eyre::{eyre, Report, Result};
use impl_tools::autoimpl;

/// Interval is a half-open genomic region [start, end).
/// Empty intervals (start == end) and intervals with negative length (start > end) are prohibited.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Dissolve)]
pub struct Interval<Idx: PrimInt> {
    start: Idx,
    end: Idx,
}

/// Trait for types that can be generally viewed as half-open genomic intervals [start, end).
#[autoimpl(for <T: trait + ?Sized> &T, Box<T>, Rc<T>, Arc<T>)]
#[allow(clippy::len_without_is_empty)]
pub trait IntervalOp {
    type Idx: PrimInt;

    /// Start position of the interval-like object.
    fn start(&self) -> Self::Idx;

    /// End position of the interval-like object.
    fn end(&self) -> Self::Idx;

    /// Length of the interval-like object.
    fn len(&self) -> Self::Idx {
        self.end() - self.start()
    }

    /// Check if the interval-like object contains a given position.
    fn contains(&self, pos: Self::Idx) -> bool {
        self.start() <= pos && pos < self.end()
    }

    /// Check if the interval-like object intersects with another interval-like object.
    /// Touching intervals don't intersect.
    fn intersects(&self, other: &Self) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}

impl<T: PrimInt> IntervalOp for Interval<T> {
    type Idx = T;

    #[inline(always)]
    fn start(&self) -> Self::Idx {
        self.start
    }
    #[inline(always)]
    fn end(&self) -> Self::Idx {
        self.end
    }
}

impl<Idx: PrimInt> Interval<Idx> {
    pub fn new(start: Idx, end: Idx) -> Result<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(eyre!("Invalid interval: start >= end ({:?} >= {:?})", start, end))
        }
    }

    /// Interval of the given length starting at `start`.
    pub fn with_len(start: Idx, len: Idx) -> Result<Self> {
        let end = start
            .checked_add(&len)
            .ok_or_else(|| eyre!("Interval end overflows: {:?} + {:?}", start, len))?;
        Self::new(start, end)
    }

    /// A copy of the interval with `left` positions added before the start and `right` positions
    /// added after the end. Fails if the new boundaries don't fit into the coordinate type.
    pub fn extended<T: PrimUInt>(&self, left: T, right: T) -> Result<Self> {
        let left: Idx =
            num::cast(left).ok_or_else(|| eyre!("Left extension doesn't fit: {:?}", left))?;
        let right: Idx =
            num::cast(right).ok_or_else(|| eyre!("Right extension doesn't fit: {:?}", right))?;

        let start = self.start.checked_sub(&left).ok_or_else(|| {
            eyre!(
                "Extending {:?} to the left by {:?} underflows the coordinate type",
                self,
                left
            )
        })?;
        let end = self.end.checked_add(&right).ok_or_else(|| {
            eyre!(
                "Extending {:?} to the right by {:?} overflows the coordinate type",
                self,
                right
            )
        })?;
        Ok(Self { start, end })
    }
}

impl<Idx: PrimInt> Default for Interval<Idx> {
    fn default() -> Self {
        Self {
            start: Idx::zero(),
            end: Idx::one(),
        }
    }
}

impl<Idx: PrimInt + Display> Display for Interval<Idx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl<Idx: PrimInt> TryFrom<(Idx, Idx)> for Interval<Idx> {
    type Error = Report;

    fn try_from(value: (Idx, Idx)) -> Result<Self, Self::Error> {
        Self::new(value.0, value.1)
    }
}

impl<Idx: PrimInt> From<Interval<Idx>> for (Idx, Idx) {
    fn from(interval: Interval<Idx>) -> Self {
        (interval.start, interval.end)
    }
}

impl<Idx: PrimInt> TryFrom<Range<Idx>> for Interval<Idx> {
    type Error = Report;

    fn try_from(value: Range<Idx>) -> Result<Self, Self::Error> {
        Self::new(value.start, value.end)
    }
}

impl<Idx: PrimInt> From<Interval<Idx>> for Range<Idx> {
    fn from(interval: Interval<Idx>) -> Self {
        interval.start..interval.end
    }
}

impl<Idx: PrimInt> PartialEq<(Idx, Idx)> for Interval<Idx> {
    fn eq(&self, other: &(Idx, Idx)) -> bool {
        self.start == other.0 && self.end == other.1
    }
}

impl<Idx: PrimInt> PartialEq<Range<Idx>> for Interval<Idx> {
    fn eq(&self, other: &Range<Idx>) -> bool {
        self.start == other.start && self.end == other.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct() {
        assert_eq!(Interval::new(0, 10).unwrap(), (0, 10));
        assert!(Interval::new(1, 0).is_err());
        assert!(Interval::new(0, 0).is_err());

        assert_eq!(Interval::with_len(5u64, 3).unwrap(), 5..8);
        assert!(Interval::with_len(5u64, 0).is_err());
        assert!(Interval::with_len(u64::MAX, 1).is_err());
    }

    #[test]
    fn test_len() {
        assert_eq!(Interval::new(0, 10).unwrap().len(), 10);
        assert_eq!(Interval::new(0, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_contains() {
        let interval = Interval::new(1, 10).unwrap();
        assert!(!interval.contains(0));
        assert!(interval.contains(1));
        assert!(interval.contains(9));
        assert!(!interval.contains(10));
    }

    #[test]
    fn test_intersects() {
        let interval = Interval::new(1, 10).unwrap();
        assert!(!interval.intersects(&Interval::new(0, 1).unwrap()));
        assert!(interval.intersects(&Interval::new(0, 2).unwrap()));
        assert!(interval.intersects(&Interval::new(5, 9).unwrap()));
        assert!(interval.intersects(&Interval::new(9, 10).unwrap()));
        assert!(!interval.intersects(&Interval::new(10, 11).unwrap()));
    }

    #[test]
    fn test_extended() {
        let interval = Interval::new(100u64, 200).unwrap();
        assert_eq!(interval.extended(10u64, 20u64).unwrap(), (90, 220));
        assert_eq!(interval.extended(0u8, 0u8).unwrap(), interval);
        assert_eq!(interval.extended(100u64, 0u64).unwrap(), (0, 200));
        assert!(interval.extended(101u64, 0u64).is_err());
        assert!(interval.extended(0u64, u64::MAX).is_err());

        let signed = Interval::new(1i64, 10).unwrap();
        assert_eq!(signed.extended(2u32, 0u32).unwrap(), (-1, 10));
    }
}
