//! Implementation of an interval tree using the BITS algorithm.
//! Reference: https://doi.org/10.1093/bioinformatics/bts652

use super::tree::{Builder, ITree};
use derive_getters::Dissolve;
use derive_more::From;
use itertools::Itertools;
use splicekit_core_rs::{
    loc::{Interval, IntervalOp},
    num::PrimInt,
};

#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};

/// A builder for constructing [`Bits`] interval trees.
#[derive(Debug, Clone, From, Dissolve)]
pub struct BitsBuilder<Idx: PrimInt, Data> {
    records: Vec<(Interval<Idx>, Data)>,
}

impl<Idx: PrimInt, Data> Default for BitsBuilder<Idx, Data> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<Idx: PrimInt, Data> Builder for BitsBuilder<Idx, Data> {
    type Target = Bits<Idx, Data>;

    fn add(mut self, interval: Interval<Idx>, data: Data) -> Self {
        self.records.push((interval, data));
        self
    }

    fn extend(mut self, records: impl IntoIterator<Item = (Interval<Idx>, Data)>) -> Self {
        self.records.extend(records);
        self
    }

    fn build(self) -> Self::Target {
        Bits::new(self.records)
    }
}

/// An immutable interval tree implementation using the BITS algorithm.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Dissolve)]
pub struct Bits<Idx: PrimInt, Data> {
    // Associated data elements, corresponding to intervals at the same index.
    data: Vec<Data>,
    // Interval start coordinates, sorted.
    starts: Vec<Idx>,
    // Interval end coordinates, corresponding to `starts`.
    ends: Vec<Idx>,
    // The maximum length of any interval in the tree. Used for query optimization.
    max_len: Idx,
}

impl<Idx: PrimInt, Data> Bits<Idx, Data> {
    /// Creates a new `Bits` interval tree from an iterator of `(Interval, Data)` pairs.
    /// Intervals are sorted internally by their start coordinates. The sort is stable, so
    /// entries with equal starts keep their insertion order.
    pub fn new(iter: impl IntoIterator<Item = (Interval<Idx>, Data)>) -> Self {
        let iter = iter.into_iter();

        let explen = iter.size_hint().0;
        let mut starts = Vec::with_capacity(explen);
        let mut ends = Vec::with_capacity(explen);
        let mut data = Vec::with_capacity(explen);
        let mut max_len = Idx::zero();

        for (interval, idata) in iter.sorted_by_key(|(it, _)| it.start()) {
            starts.push(interval.start());
            ends.push(interval.end());
            data.push(idata);
            max_len = max_len.max(interval.len());
        }

        Self {
            data,
            starts,
            ends,
            max_len,
        }
    }

    #[inline]
    fn lower_bound(&self, start: Idx) -> usize {
        // The first element that might overlap the query starts no earlier than
        // query start - max length.
        let boundary = start.saturating_sub(self.max_len);
        self.starts.partition_point(|x| *x < boundary)
    }

    /// Creates an iterator over entries overlapping the given interval, ordered by start.
    #[inline]
    pub fn query(&self, interval: Interval<Idx>) -> Iter<'_, Idx, Data> {
        Iter {
            query: interval,
            cursor: self.lower_bound(interval.start()),
            bits: self,
        }
    }

    /// Returns the number of intervals stored in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Returns `true` if the tree contains no intervals.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Returns a builder for constructing a new `Bits` interval tree.
    pub fn builder() -> BitsBuilder<Idx, Data> {
        BitsBuilder::default()
    }
}

/// An iterator over overlapping intervals and data references produced by `Bits::query`.
pub struct Iter<'tree, Idx: PrimInt, Data> {
    query: Interval<Idx>,
    // Might be behind the next overlapping entry, but never ahead of it.
    cursor: usize,
    bits: &'tree Bits<Idx, Data>,
}

impl<'tree, Idx: PrimInt, Data> Iterator for Iter<'tree, Idx, Data> {
    type Item = (Interval<Idx>, &'tree Data);

    fn next(&mut self) -> Option<Self::Item> {
        let bits = self.bits;
        loop {
            if self.cursor >= bits.len() || bits.starts[self.cursor] >= self.query.end() {
                return None;
            }
            let cursor = self.cursor;
            self.cursor += 1;

            if bits.ends[cursor] > self.query.start() {
                let segment = Interval::new(bits.starts[cursor], bits.ends[cursor]).ok()?;
                debug_assert!(segment.intersects(&self.query));
                return Some((segment, &bits.data[cursor]));
            }
        }
    }
}

impl<Idx: PrimInt, Data> ITree for Bits<Idx, Data> {
    type Idx = Idx;
    type Data = Data;

    fn data(&self) -> impl Iterator<Item = &Self::Data> {
        self.data.iter()
    }

    fn intervals(&self) -> impl Iterator<Item = Interval<Self::Idx>> {
        self.starts
            .iter()
            .zip(self.ends.iter())
            .filter_map(|(x, y)| Interval::new(*x, *y).ok())
    }

    fn records(&self) -> impl Iterator<Item = (Interval<Self::Idx>, &Self::Data)> {
        self.intervals().zip(self.data.iter())
    }

    fn intersect_interval<'tree>(
        &'tree self,
        interval: &Interval<Self::Idx>,
        buffer: &mut Vec<(Interval<Self::Idx>, &'tree Self::Data)>,
    ) {
        buffer.clear();
        buffer.extend(self.query(*interval));
    }
}
