use ahash::AHashMap;
use derive_getters::Dissolve;
use splicekit_core_rs::loc::Interval;
use splicekit_core_rs::num::PrimInt;

use crate::interval_tree::{Bits, BitsBuilder, Builder};

/// Per-contig collection of BITS interval trees. Strand is ignored: any interval on the contig
/// that intersects the query is reported.
#[derive(Clone, PartialEq, Eq, Debug, Dissolve)]
pub struct GenomicIndex<Idx: PrimInt, Data> {
    itrees: AHashMap<String, Bits<Idx, Data>>,
}

impl<Idx: PrimInt, Data> Default for GenomicIndex<Idx, Data> {
    fn default() -> Self {
        Self {
            itrees: AHashMap::new(),
        }
    }
}

impl<Idx: PrimInt, Data> GenomicIndex<Idx, Data> {
    pub fn new<Ctg: AsRef<str>>(
        records: impl IntoIterator<Item = (Ctg, Interval<Idx>, Data)>,
    ) -> Self {
        let mut builders: AHashMap<String, BitsBuilder<Idx, Data>> = AHashMap::new();
        for (contig, interval, data) in records {
            let builder = builders.entry(contig.as_ref().to_owned()).or_default();
            *builder = std::mem::take(builder).add(interval, data);
        }

        let itrees = builders
            .into_iter()
            .map(|(contig, builder)| (contig, builder.build()))
            .collect();
        Self { itrees }
    }

    pub fn contigs(&self) -> impl Iterator<Item = &str> {
        self.itrees.keys().map(|x| x.as_str())
    }

    /// Total number of indexed intervals.
    pub fn len(&self) -> usize {
        self.itrees.values().map(|x| x.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.itrees.values().all(|x| x.is_empty())
    }

    /// Entries intersecting the interval on the given contig, ordered by their start.
    /// Unknown contigs produce no hits.
    pub fn overlap<'a>(
        &'a self,
        contig: &str,
        interval: Interval<Idx>,
    ) -> impl Iterator<Item = (Interval<Idx>, &'a Data)> + 'a {
        self.itrees
            .get(contig)
            .into_iter()
            .flat_map(move |tree| tree.query(interval))
    }
}
