use std::fmt::{self, Display, Formatter};

use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result, WrapErr};
use itertools::Itertools;
use splicekit_core_rs::loc::Interval;
use splicekit_core_rs::seq;
use splicekit_io_rs::{vcf, ReadRecord};

/// A VCF site: 1-based position, reference allele and one or more alternates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct Variant {
    contig: String,
    position: u64,
    id: Option<String>,
    reference: String,
    alternates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Snv,
    /// Substitution of several bases, REF and ALT have the same length
    Mnv,
    Insertion,
    Deletion,
}

impl VariantKind {
    pub fn classify(reference: &str, alternate: &str) -> Self {
        match (reference.len(), alternate.len()) {
            (1, 1) => VariantKind::Snv,
            (r, a) if r == a => VariantKind::Mnv,
            (r, a) if r < a => VariantKind::Insertion,
            _ => VariantKind::Deletion,
        }
    }
}

impl Variant {
    pub fn new(
        contig: impl Into<String>,
        position: u64,
        id: Option<String>,
        reference: impl Into<String>,
        alternates: Vec<String>,
    ) -> Result<Self> {
        let contig = contig.into();
        let reference = reference.into();
        ensure!(!contig.is_empty(), "Variant contig must not be empty");
        ensure!(position >= 1, "Variant positions are 1-based, got {position}");
        ensure!(
            !reference.is_empty(),
            "Reference allele must not be empty: {contig}:{position}"
        );
        Ok(Self {
            contig,
            position,
            id,
            reference,
            alternates,
        })
    }

    /// 0-based half-open genomic span of the reference allele.
    pub fn span(&self) -> Result<Interval<u64>> {
        Interval::with_len(self.position - 1, self.reference.len() as u64)
    }

    pub fn allele(&self, alt: usize) -> Option<Allele<'_>> {
        (alt < self.alternates.len()).then_some(Allele { variant: self, alt })
    }

    /// All alternates with their indices, including malformed ones.
    pub fn alleles(&self) -> impl Iterator<Item = Allele<'_>> {
        (0..self.alternates.len()).map(|alt| Allele { variant: self, alt })
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.contig,
            self.position,
            self.reference,
            self.alternates.join(",")
        )
    }
}

impl TryFrom<vcf::Record> for Variant {
    type Error = eyre::Report;

    fn try_from(record: vcf::Record) -> Result<Self> {
        let (contig, position, id, reference, alternates) = record.dissolve();
        Variant::new(contig, position, id, reference, alternates)
    }
}

/// One alternate allele of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allele<'a> {
    variant: &'a Variant,
    alt: usize,
}

impl<'a> Allele<'a> {
    pub(crate) fn new(variant: &'a Variant, alt: usize) -> Self {
        debug_assert!(alt < variant.alternates.len());
        Self { variant, alt }
    }

    pub fn variant(&self) -> &'a Variant {
        self.variant
    }

    /// Index of the alternate in the variant.
    pub fn index(&self) -> usize {
        self.alt
    }

    pub fn reference(&self) -> &'a str {
        &self.variant.reference
    }

    pub fn alternate(&self) -> &'a str {
        &self.variant.alternates[self.alt]
    }

    pub fn kind(&self) -> VariantKind {
        VariantKind::classify(self.reference(), self.alternate())
    }

    /// Plain nucleotide alternates only. Symbolic alleles (`<DEL>`), `*` and `.` are rejected.
    pub fn is_sequence(&self) -> bool {
        let alt = self.alternate();
        !alt.is_empty() && alt.bytes().all(seq::is_nucleotide)
    }
}

impl Display for Allele<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.variant.contig,
            self.variant.position,
            self.reference(),
            self.alternate()
        )
    }
}

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Groups variants from a VCF reader into fixed-size batches. The last batch may be shorter.
/// Reading stops after the first error.
pub struct VariantBatches<R> {
    reader: R,
    batch_size: usize,
    record: vcf::Record,
    finished: bool,
}

impl<R: ReadRecord<Record = vcf::Record>> VariantBatches<R> {
    pub fn new(reader: R, batch_size: usize) -> Result<Self> {
        ensure!(batch_size > 0, "Batch size must be positive");
        Ok(Self {
            reader,
            batch_size,
            record: vcf::Record::default(),
            finished: false,
        })
    }

    fn next_batch(&mut self) -> Result<Vec<Variant>> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            if !self.reader.read_record(&mut self.record)? {
                self.finished = true;
                break;
            }
            let record = std::mem::take(&mut self.record);
            batch.push(Variant::try_from(record).wrap_err("Invalid VCF record")?);
        }
        Ok(batch)
    }
}

impl<R: ReadRecord<Record = vcf::Record>> Iterator for VariantBatches<R> {
    type Item = Result<Vec<Variant>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_batch() {
            Ok(batch) if batch.is_empty() => None,
            Ok(batch) => Some(Ok(batch)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Split an in-memory list of variants into batches, e.g. for tests or prefiltered inputs.
pub fn batched(
    variants: impl IntoIterator<Item = Variant>,
    batch_size: usize,
) -> Result<impl Iterator<Item = Result<Vec<Variant>>>> {
    ensure!(batch_size > 0, "Batch size must be positive");
    let batches = variants
        .into_iter()
        .chunks(batch_size)
        .into_iter()
        .map(|chunk| Ok(chunk.collect_vec()))
        .collect_vec();
    Ok(batches.into_iter())
}
