use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ahash::{AHashMap, AHashSet};
use bitcode::{Decode, Encode};
use derive_getters::{Dissolve, Getters};
use eyre::{bail, ensure, eyre, Result, WrapErr};
use itertools::Itertools;
use splicekit_collections_rs::genomic_index::GenomicIndex;
use splicekit_core_rs::loc::{Interval, IntervalOp, Strand};
use splicekit_io_rs::{gtf, ReadRecord};

use crate::error::AnnotationError;
use crate::window::oriented_overhang;

/// Contigs every prebuilt genome table must cover.
pub const PREBUILT_CONTIGS: [&str; 25] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genome {
    GRCh37,
    GRCh38,
}

impl Genome {
    pub fn name(&self) -> &'static str {
        match self {
            Genome::GRCh37 => "grch37",
            Genome::GRCh38 => "grch38",
        }
    }

    /// Location of the prebuilt exon table for the genome inside `dir`.
    pub fn prebuilt_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("{}.exons.bitcode", self.name()))
    }
}

impl Display for Genome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Genome {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "grch37" => Ok(Genome::GRCh37),
            "grch38" => Ok(Genome::GRCh38),
            _ => Err(eyre!("Unknown genome: {s}")),
        }
    }
}

/// Where the exon annotation comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Annotation {
    Gtf(PathBuf),
    Prebuilt { genome: Genome, dir: PathBuf },
}

impl Annotation {
    /// A genome name selects the prebuilt table stored in `dir`, anything else is a GTF path.
    pub fn parse(text: &str, dir: impl AsRef<Path>) -> Self {
        match text.parse::<Genome>() {
            Ok(genome) => Annotation::Prebuilt {
                genome,
                dir: dir.as_ref().to_owned(),
            },
            Err(_) => Annotation::Gtf(PathBuf::from(text)),
        }
    }
}

/// An annotated exon before overhangs are applied. `first` and `last` are positions in the
/// transcript, i.e. in the transcription direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Encode, Decode, Getters, Dissolve)]
pub struct AnnotatedExon {
    contig: String,
    interval: Interval<u64>,
    strand: Strand,
    exon_id: String,
    gene_id: String,
    gene_name: String,
    transcript_id: String,
    first: bool,
    last: bool,
}

/// An exon with the genomic (strand-independent) left and right overhangs of its window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct ExonInterval {
    contig: String,
    interval: Interval<u64>,
    strand: Strand,
    exon_id: String,
    gene_id: String,
    gene_name: String,
    transcript_id: String,
    left_overhang: u64,
    right_overhang: u64,
}

impl ExonInterval {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contig: String,
        interval: Interval<u64>,
        strand: Strand,
        exon_id: String,
        gene_id: String,
        gene_name: String,
        transcript_id: String,
        left_overhang: u64,
        right_overhang: u64,
    ) -> Result<Self> {
        ensure!(!contig.is_empty(), "Exon contig must not be empty");
        ensure!(!exon_id.is_empty(), "Exon ID must not be empty");
        Ok(Self {
            contig,
            interval,
            strand,
            exon_id,
            gene_id,
            gene_name,
            transcript_id,
            left_overhang,
            right_overhang,
        })
    }

    /// Apply the requested (left, right) overhangs. The outer side of the first and the last exon
    /// of a transcript gets no overhang. The left overhang is clipped at the contig start.
    pub fn from_annotated(exon: AnnotatedExon, overhang: (u64, u64)) -> Self {
        let (mut upstream, mut downstream) = oriented_overhang(exon.strand, overhang.0, overhang.1);
        if exon.first {
            upstream = 0;
        }
        if exon.last {
            downstream = 0;
        }
        let (mut left, right) = exon.strand.oriented(upstream, downstream);

        if left > exon.interval.start() {
            log::debug!(
                "Left overhang of exon {} is clipped at the contig start: {} -> {}",
                exon.exon_id,
                left,
                exon.interval.start()
            );
            left = exon.interval.start();
        }

        Self {
            contig: exon.contig,
            interval: exon.interval,
            strand: exon.strand,
            exon_id: exon.exon_id,
            gene_id: exon.gene_id,
            gene_name: exon.gene_name,
            transcript_id: exon.transcript_id,
            left_overhang: left,
            right_overhang: right,
        }
    }

    /// Genomic window `[start - left_overhang, end + right_overhang)`.
    pub fn window(&self) -> Result<Interval<u64>> {
        self.interval
            .extended(self.left_overhang, self.right_overhang)
            .wrap_err_with(|| format!("Invalid window for exon {}", self.exon_id))
    }
}

/// Extract exons from GTF records. Exons of each transcript are ranked in the transcription
/// direction to find the first and the last one. The output follows the order of the records.
pub fn annotate(records: impl IntoIterator<Item = gtf::Record>) -> Result<Vec<AnnotatedExon>> {
    let mut exons = Vec::new();
    let mut skipped = 0;
    for record in records {
        if record.feature() != "exon" {
            continue;
        }
        let Some(strand) = *record.strand() else {
            log::warn!(
                "Skipping exon without strand at {}:{}",
                record.seqid(),
                record.interval()
            );
            skipped += 1;
            continue;
        };

        let attribute = |key: &str| {
            record.attribute(key).map(|x| x.to_owned()).ok_or_else(|| {
                eyre!(
                    "Exon at {}:{} has no {key} attribute",
                    record.seqid(),
                    record.interval()
                )
            })
        };
        let exon_id = attribute("exon_id")?;
        let gene_id = attribute("gene_id")?;
        let transcript_id = attribute("transcript_id")?;
        let gene_name = attribute("gene_name").unwrap_or_else(|_| gene_id.clone());

        exons.push(AnnotatedExon {
            contig: record.seqid().to_owned(),
            interval: *record.interval(),
            strand,
            exon_id,
            gene_id,
            gene_name,
            transcript_id,
            first: false,
            last: false,
        });
    }
    if skipped > 0 {
        log::warn!("Skipped {skipped} exons with unknown strand");
    }

    // Mark transcript ends
    let mut transcripts: AHashMap<&str, Vec<usize>> = AHashMap::new();
    for (ind, exon) in exons.iter().enumerate() {
        transcripts
            .entry(exon.transcript_id.as_str())
            .or_default()
            .push(ind);
    }

    let mut ends = Vec::with_capacity(transcripts.len());
    for (transcript, indices) in transcripts {
        let head = &exons[indices[0]];
        for ind in &indices[1..] {
            let exon = &exons[*ind];
            ensure!(
                exon.contig == head.contig && exon.strand == head.strand,
                "Exons of transcript {} are located on different contigs or strands",
                transcript
            );
        }

        let (leftmost, rightmost) = indices
            .iter()
            .copied()
            .minmax_by_key(|x| exons[*x].interval.start())
            .into_option()
            .ok_or_else(|| eyre!("Transcript {} has no exons", transcript))?;
        let (first, last) = head.strand.oriented(leftmost, rightmost);
        ends.push((first, last));
    }
    for (first, last) in ends {
        exons[first].first = true;
        exons[last].last = true;
    }

    Ok(exons)
}

/// Read all exons from a GTF file.
pub fn read_gtf(path: impl AsRef<Path>) -> Result<Vec<AnnotatedExon>> {
    let path = path.as_ref();
    let mut reader = gtf::Reader::from_path(path)?;
    let mut records = Vec::new();
    reader
        .read_to_end(&mut records)
        .wrap_err_with(|| format!("Failed to read GTF file: {}", path.display()))?;
    annotate(records)
}

/// Exons with overhangs and an overlap index over their windows. Immutable after construction.
#[derive(Debug, Clone, Getters, Dissolve)]
pub struct ExonTable {
    exons: Vec<ExonInterval>,
    index: GenomicIndex<u64, usize>,
}

impl ExonTable {
    /// Build the table, failing with [`AnnotationError`] if any of the `expected` contigs has no
    /// exons.
    pub fn new(
        exons: Vec<AnnotatedExon>,
        overhang: (u64, u64),
        expected: &[impl AsRef<str>],
    ) -> Result<Self> {
        let present: AHashSet<&str> = exons.iter().map(|x| x.contig.as_str()).collect();
        let missing = expected
            .iter()
            .map(|x| x.as_ref())
            .filter(|x| !present.contains(x))
            .map(|x| x.to_owned())
            .collect_vec();
        if !missing.is_empty() {
            return Err(AnnotationError::new(missing).into());
        }

        let exons = exons
            .into_iter()
            .map(|x| ExonInterval::from_annotated(x, overhang))
            .collect_vec();
        let windows = exons
            .iter()
            .enumerate()
            .map(|(ind, exon)| Ok((exon.contig.as_str(), exon.window()?, ind)))
            .collect::<Result<Vec<_>>>()?;
        let index = GenomicIndex::new(windows);

        log::info!(
            "Exon table: {} exons on {} contigs, overhang {:?}",
            exons.len(),
            index.contigs().count(),
            overhang
        );
        Ok(Self { exons, index })
    }

    pub fn from_gtf(
        path: impl AsRef<Path>,
        overhang: (u64, u64),
        expected: &[impl AsRef<str>],
    ) -> Result<Self> {
        Self::new(read_gtf(path)?, overhang, expected)
    }

    pub fn from_prebuilt(genome: Genome, dir: impl AsRef<Path>, overhang: (u64, u64)) -> Result<Self> {
        let path = genome.prebuilt_path(dir);
        let exons = load_prebuilt(&path)?;
        Self::new(exons, overhang, &PREBUILT_CONTIGS)
            .wrap_err_with(|| format!("Invalid prebuilt table for {genome}: {}", path.display()))
    }

    /// Build the table from either source. GTF annotations are checked against `expected`,
    /// prebuilt genomes against [`PREBUILT_CONTIGS`].
    pub fn from_annotation(
        annotation: &Annotation,
        overhang: (u64, u64),
        expected: &[impl AsRef<str>],
    ) -> Result<Self> {
        match annotation {
            Annotation::Gtf(path) => Self::from_gtf(path, overhang, expected),
            Annotation::Prebuilt { genome, dir } => Self::from_prebuilt(*genome, dir, overhang),
        }
    }

    pub fn len(&self) -> usize {
        self.exons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exons.is_empty()
    }

    /// Indices of exons whose windows intersect the interval, ordered by window start.
    pub fn overlapping<'a>(
        &'a self,
        contig: &str,
        interval: Interval<u64>,
    ) -> impl Iterator<Item = usize> + 'a {
        self.index.overlap(contig, interval).map(|(_, ind)| *ind)
    }
}

/// Store annotated exons as a prebuilt table.
#[allow(clippy::ptr_arg)]
pub fn save_prebuilt(exons: &Vec<AnnotatedExon>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = bitcode::encode(exons);
    std::fs::write(path, bytes)
        .wrap_err_with(|| format!("Failed to write prebuilt exon table: {}", path.display()))?;
    log::info!("Saved {} exons to {}", exons.len(), path.display());
    Ok(())
}

pub fn load_prebuilt(path: impl AsRef<Path>) -> Result<Vec<AnnotatedExon>> {
    let path = path.as_ref();
    if !path.exists() {
        bail!("Prebuilt exon table does not exist: {}", path.display());
    }
    let bytes = std::fs::read(path)
        .wrap_err_with(|| format!("Failed to read prebuilt exon table: {}", path.display()))?;
    let exons: Vec<AnnotatedExon> = bitcode::decode(&bytes)
        .wrap_err_with(|| format!("Corrupted prebuilt exon table: {}", path.display()))?;
    Ok(exons)
}
