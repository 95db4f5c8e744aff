use std::collections::VecDeque;
use std::sync::Arc;

use derive_getters::{Dissolve, Getters};
use eyre::Result;
use itertools::Itertools;

use crate::exons::{ExonInterval, ExonTable};
use crate::variant::{Allele, Variant};

/// One alternate allele of a variant that hits the window of an exon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct Overlap {
    /// Index of the exon in the exon table
    exon: usize,
    variant: Arc<Variant>,
    /// Index of the alternate allele in the variant
    alt: usize,
}

impl Overlap {
    pub fn allele(&self) -> Allele<'_> {
        Allele::new(&self.variant, self.alt)
    }

    pub fn exon_in<'a>(&self, table: &'a ExonTable) -> Option<&'a ExonInterval> {
        table.exons().get(self.exon)
    }
}

/// Join a batch of variants with the exon table.
///
/// Every plain-sequence alternate of a variant produces one overlap per exon whose window
/// intersects the reference allele. The output is ordered by exon, then by the variant position in
/// the batch, then by the alternate index.
pub fn resolve_batch(table: &ExonTable, batch: Vec<Variant>) -> Result<Vec<Overlap>> {
    let total = batch.len();
    let mut unmatched = 0;
    let mut malformed = 0;

    let mut overlaps = Vec::new();
    for (ind, variant) in batch.into_iter().enumerate() {
        let exons = table
            .overlapping(variant.contig(), variant.span()?)
            .collect_vec();
        if exons.is_empty() {
            unmatched += 1;
            continue;
        }

        let variant = Arc::new(variant);
        for allele in variant.alleles() {
            if !allele.is_sequence() {
                log::debug!("Skipping malformed alternate allele: {}", allele);
                malformed += 1;
                continue;
            }
            for exon in &exons {
                let overlap = Overlap {
                    exon: *exon,
                    variant: Arc::clone(&variant),
                    alt: allele.index(),
                };
                overlaps.push((ind, overlap));
            }
        }
    }
    overlaps.sort_by_key(|(ind, x)| (x.exon, *ind, x.alt));

    log::debug!(
        "Resolved batch of {} variants: {} overlaps, {} variants outside exons, {} malformed alleles",
        total,
        overlaps.len(),
        unmatched,
        malformed
    );
    Ok(overlaps.into_iter().map(|(_, x)| x).collect())
}

/// Streams overlaps for a sequence of variant batches. Batches are resolved one at a time,
/// the stream stops after the first error.
pub struct Overlaps<I> {
    table: Arc<ExonTable>,
    batches: I,
    pending: VecDeque<Overlap>,
    finished: bool,
}

impl<I> Overlaps<I>
where
    I: Iterator<Item = Result<Vec<Variant>>>,
{
    pub fn new(table: Arc<ExonTable>, batches: I) -> Self {
        Self {
            table,
            batches,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    pub fn table(&self) -> &Arc<ExonTable> {
        &self.table
    }
}

impl<I> Iterator for Overlaps<I>
where
    I: Iterator<Item = Result<Vec<Variant>>>,
{
    type Item = Result<Overlap>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(overlap) = self.pending.pop_front() {
                return Some(Ok(overlap));
            }
            if self.finished {
                return None;
            }

            let resolved = match self.batches.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(batch) => batch.and_then(|batch| resolve_batch(&self.table, batch)),
            };
            match resolved {
                Ok(overlaps) => self.pending.extend(overlaps),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
