use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use eyre::{eyre, Result, WrapErr};
use splicekit_core_rs::loc::{Interval, IntervalOp};
use splicekit_io_rs::compression::decode;
use splicekit_io_rs::fasta::{IndexedReader, IndexedReaderMutOp};
use splicekit_io_rs::vcf;

use crate::config::Config;
use crate::error::OutOfWindowError;
use crate::exons::{Annotation, ExonInterval, ExonTable};
use crate::overlap::{Overlap, Overlaps};
use crate::record::{ExonMeta, Inputs, Metadata, Record, TissueInputs, VariantMeta};
use crate::tissue::{SeqSplitter, TissueSeq};
use crate::variant::{Allele, Variant, VariantBatches};
use crate::window::{self, WindowPair};

/// Variant batches read from a VCF file.
pub type VcfBatches = VariantBatches<vcf::Reader<BufReader<Box<dyn Read + Send + Sync + 'static>>>>;

/// Pull-based producer of model records: one record per (exon, variant allele) overlap.
///
/// The exon table is built once and shared, variants are read and resolved one batch at a time.
/// The loader stops after the first error.
pub struct Loader<S, I> {
    config: Config,
    table: Arc<ExonTable>,
    sequences: S,
    overlaps: Overlaps<I>,
    buffer: Vec<u8>,
    finished: bool,
}

impl Loader<Box<dyn IndexedReaderMutOp + Send + Sync + 'static>, VcfBatches> {
    /// Open all inputs from disk. Compression is inferred from the file extensions, gzipped FASTA
    /// files are expected to be BGZF-compressed.
    pub fn from_paths(
        config: Config,
        annotation: &Annotation,
        fasta: impl AsRef<Path>,
        vcf: impl AsRef<Path>,
    ) -> Result<Self> {
        config.validate()?;
        let table = ExonTable::from_annotation(
            annotation,
            *config.overhang(),
            config.expected_contigs().as_slice(),
        )?;

        let fasta = fasta.as_ref();
        let compression = match decode::Config::infer_from_path(fasta) {
            decode::Config::Gzip => decode::Config::Bgzf,
            compression => compression,
        };
        let sequences = IndexedReader::from_path(fasta, &compression)?;

        let batches = VariantBatches::new(vcf::Reader::from_path(vcf)?, *config.batch_size())?;
        Self::new(config, table, sequences, batches)
    }
}

impl<S, I> Loader<S, I>
where
    S: IndexedReaderMutOp,
    I: Iterator<Item = Result<Vec<Variant>>>,
{
    pub fn new(config: Config, table: ExonTable, sequences: S, batches: I) -> Result<Self> {
        config.validate()?;
        let table = Arc::new(table);
        let overlaps = Overlaps::new(Arc::clone(&table), batches);
        Ok(Self {
            config,
            table,
            sequences,
            overlaps,
            buffer: Vec::new(),
            finished: false,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &ExonTable {
        &self.table
    }

    fn record(&mut self, overlap: &Overlap) -> Result<Record> {
        let table = Arc::clone(&self.table);
        let exon = overlap
            .exon_in(&table)
            .ok_or_else(|| eyre!("Exon index is out of bounds: {}", overlap.exon()))?;
        let allele = overlap.allele();

        let flanks = self.clip_flanks(exon, (*exon.left_overhang(), *exon.right_overhang()));
        let window = exon.interval().extended(flanks.0, flanks.1)?;
        let pair = window::extract_pair(
            &mut self.sequences,
            exon,
            window,
            allele,
            &mut self.buffer,
        )?;

        let split = if *self.config.split_seq() && !*self.config.tissue_specific() {
            let splitter = self.config.splitter();
            Some(split_pair(splitter, &pair, exon, window, flanks, allele)?)
        } else {
            None
        };
        let tissue = if *self.config.tissue_specific() {
            Some(self.tissue_inputs(exon, allele)?)
        } else {
            None
        };

        let (seq, mut_seq) = pair.dissolve();
        let mut inputs = Inputs::new(seq, mut_seq, split, tissue);
        if *self.config.encode() {
            inputs.attach_encoded();
        }

        let metadata = Metadata::new(ExonMeta::new(exon, flanks), VariantMeta::from(allele));
        Ok(Record::new(inputs, metadata))
    }

    /// Clip genomic (left, right) flanks of the exon at the contig ends. Unknown contigs are left
    /// as is, fetching them fails later.
    fn clip_flanks(&self, exon: &ExonInterval, flanks: (u64, u64)) -> (u64, u64) {
        let interval = exon.interval();
        let (left, mut right) = flanks;
        if let Some(length) = self.sequences.seqlen(exon.contig()) {
            let available = length.saturating_sub(interval.end());
            if right > available {
                log::debug!(
                    "Right flank of exon {} is clipped at the contig end: {} -> {}",
                    exon.exon_id(),
                    right,
                    available
                );
                right = available;
            }
        }
        (left.min(interval.start()), right)
    }

    /// Sequences around the exon with the splitter's intron lengths as flanks. The window is
    /// clipped at the contig ends. A variant outside of it leaves the mutated sequence unchanged.
    fn tissue_inputs(&mut self, exon: &ExonInterval, allele: Allele<'_>) -> Result<TissueInputs> {
        let splitter = *self.config.splitter();
        let flanks = self.clip_flanks(exon, splitter.tissue_flanks(exon));
        let window = exon.interval().extended(flanks.0, flanks.1)?;

        let pair = match window::extract_pair(
            &mut self.sequences,
            exon,
            window,
            allele,
            &mut self.buffer,
        ) {
            Ok(pair) => pair,
            Err(err) if err.downcast_ref::<OutOfWindowError>().is_some() => {
                log::debug!("{err}, using the reference tissue sequence");
                let seq =
                    window::fetch_window(&mut self.sequences, exon, window, &mut self.buffer)?;
                WindowPair::new(seq.clone(), seq)
            }
            Err(err) => return Err(err),
        };

        if *self.config.split_seq() {
            split_pair(&splitter, &pair, exon, window, flanks, allele)
        } else {
            let (seq, mut_seq) = pair.dissolve();
            Ok(TissueInputs::new(
                TissueSeq::Window(seq),
                TissueSeq::Window(mut_seq),
            ))
        }
    }
}

/// Split both sequences of the pair around the exon. `flanks` are the genomic (left, right)
/// intronic lengths of the reference window, the mutated ones are shifted by the indel length.
fn split_pair(
    splitter: &SeqSplitter,
    pair: &WindowPair,
    exon: &ExonInterval,
    window: Interval<u64>,
    flanks: (u64, u64),
    allele: Allele<'_>,
) -> Result<TissueInputs> {
    let strand = *exon.strand();
    let flanks = (flanks.0 as usize, flanks.1 as usize);
    let offset = window::variant_offset(&window, *allele.variant().position())?;
    let mut_flanks = window::shift_flanks(
        window.len() as usize,
        flanks,
        offset,
        allele.reference().len(),
        allele.alternate().len(),
    )
    .unwrap_or(flanks);

    let seq = splitter.split_tissue_seq(pair.seq(), strand.oriented(flanks.0, flanks.1))?;
    let mut_seq =
        splitter.split_tissue_seq(pair.mut_seq(), strand.oriented(mut_flanks.0, mut_flanks.1))?;
    Ok(TissueInputs::new(TissueSeq::Split(seq), TissueSeq::Split(mut_seq)))
}

impl<S, I> Iterator for Loader<S, I>
where
    S: IndexedReaderMutOp,
    I: Iterator<Item = Result<Vec<Variant>>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = match self.overlaps.next()? {
            Ok(overlap) => self.record(&overlap).wrap_err_with(|| {
                format!("Failed to build the record for {}", overlap.allele())
            }),
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exons;
    use crate::variant::batched;
    use std::io::Cursor;

    // 20 bases per contig, contig 1 holds exons E1, E2, E3; contig 2 holds E4, E5.
    // E6 is on contig 3, which is missing from the FASTA.
    const FASTA: &str = ">1\nACGTACGTACGGTTAACCGG\n>2\nTTTTGGGGCCCCAAAAACGT\n";
    const FAI: &str = "1\t20\t3\t20\t21\n2\t20\t27\t20\t21\n";

    fn reader() -> Result<IndexedReader<Cursor<&'static str>>> {
        IndexedReader::new(Cursor::new(FASTA), Cursor::new(FAI))
    }

    fn annotated() -> Result<Vec<exons::AnnotatedExon>> {
        let gtf = "\
1\tt\texon\t6\t8\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\"; exon_id \"E1\";
1\tt\texon\t11\t13\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\"; exon_id \"E2\";
1\tt\texon\t16\t17\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\"; exon_id \"E3\";
2\tt\texon\t11\t12\t.\t-\t.\tgene_id \"G2\"; transcript_id \"T2\"; exon_id \"E4\";
2\tt\texon\t5\t6\t.\t-\t.\tgene_id \"G2\"; transcript_id \"T2\"; exon_id \"E5\";
3\tt\texon\t1\t5\t.\t+\t.\tgene_id \"G3\"; transcript_id \"T3\"; exon_id \"E6\";
";
        let mut records = Vec::new();
        splicekit_io_rs::ReadRecord::read_to_end(
            &mut splicekit_io_rs::gtf::Reader::new(Cursor::new(gtf)),
            &mut records,
        )?;
        exons::annotate(records)
    }

    fn loader(
        config: Config,
        variants: Vec<Variant>,
    ) -> Result<Loader<IndexedReader<Cursor<&'static str>>, impl Iterator<Item = Result<Vec<Variant>>>>>
    {
        let table = ExonTable::new(annotated()?, *config.overhang(), &[] as &[&str])?;
        let batches = batched(variants, *config.batch_size())?;
        Loader::new(config, table, reader()?, batches)
    }

    fn snv(contig: &str, position: u64, reference: &str, alternate: &str) -> Result<Variant> {
        Variant::new(contig, position, None, reference, vec![alternate.to_owned()])
    }

    #[test]
    fn test_plain_records() -> Result<()> {
        let mut config = Config::default();
        config.set_overhang(2, 2);

        // E2 window: [8, 15) = ACGGTTA
        let variants = vec![snv("1", 12, "G", "T")?, snv("1", 20, "G", "A")?];
        let records = loader(config, variants)?.collect::<Result<Vec<_>>>()?;
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.inputs().seq(), "ACGGTTA");
        assert_eq!(record.inputs().mut_seq(), "ACGTTTA");
        assert!(record.inputs().split().is_none());
        assert!(record.inputs().tissue().is_none());
        assert!(record.inputs().encoded().is_none());
        assert_eq!(record.metadata().exon().exon_id(), "E2");
        assert_eq!(record.metadata().variant().annotation(), "1:12:G:T");
        Ok(())
    }

    #[test]
    fn test_reverse_strand_record() -> Result<()> {
        let mut config = Config::default();
        config.set_overhang(2, 2).set_encode(true);

        // E4 is the first exon of T2: no upstream (right) overhang. Window [8, 12) = CCCC
        let records = loader(config, vec![snv("2", 10, "C", "T")?])?.collect::<Result<Vec<_>>>()?;
        assert_eq!(records.len(), 1);

        let inputs = records[0].inputs();
        assert_eq!(inputs.seq(), "GGGG");
        assert_eq!(inputs.mut_seq(), "GGAG");
        let encoded = inputs.encoded().as_ref().unwrap();
        assert_eq!(encoded.keys().collect::<Vec<_>>(), ["mut_seq", "seq"]);
        assert_eq!(encoded["seq"].shape(), &[4, 4]);
        Ok(())
    }

    #[test]
    fn test_split_records() -> Result<()> {
        let mut config = Config::default();
        config
            .set_overhang(2, 2)
            .set_split_seq(true)
            .set_splitter(SeqSplitter::new(2, 1, 1, 2)?);

        let records = loader(config, vec![snv("1", 12, "G", "T")?])?.collect::<Result<Vec<_>>>()?;
        let split = records[0].inputs().split().as_ref().unwrap();
        let expected = |acceptor: &str, donor: &str| {
            TissueSeq::Split(crate::tissue::TissueSplit::new(acceptor.to_owned(), donor.to_owned()))
        };
        // ACGGTTA: AC | GGT | TA
        assert_eq!(split.seq(), &expected("ACG", "TTA"));
        assert_eq!(split.mut_seq(), &expected("ACG", "TTA"));
        Ok(())
    }

    #[test]
    fn test_tissue_records() -> Result<()> {
        let mut config = Config::default();
        config
            .set_overhang(1, 1)
            .set_tissue_specific(true)
            .set_splitter(SeqSplitter::new(3, 1, 1, 3)?);

        // E2 [10, 13) with 3 intronic bases on each side: [7, 16) = TACGGTTAA
        let records = loader(config.clone(), vec![snv("1", 12, "G", "T")?])?
            .collect::<Result<Vec<_>>>()?;
        let tissue = records[0].inputs().tissue().as_ref().unwrap();
        assert_eq!(tissue.seq(), &TissueSeq::Window("TACGGTTAA".to_owned()));
        assert_eq!(tissue.mut_seq(), &TissueSeq::Window("TACGTTTAA".to_owned()));
        assert_eq!(records[0].inputs().seq(), "CGGTT");

        config.set_split_seq(true);
        let records = loader(config, vec![snv("1", 12, "G", "T")?])?
            .collect::<Result<Vec<_>>>()?;
        let tissue = records[0].inputs().tissue().as_ref().unwrap();
        let TissueSeq::Split(split) = tissue.mut_seq() else {
            panic!("Expected a split tissue sequence");
        };
        assert_eq!(split.acceptor(), "TACG");
        assert_eq!(split.donor(), "TTAA");
        assert!(records[0].inputs().split().is_none());
        Ok(())
    }

    #[test]
    fn test_tissue_window_clipped() -> Result<()> {
        let mut config = Config::default();
        config
            .set_overhang(1, 1)
            .set_tissue_specific(true)
            .set_splitter(SeqSplitter::new(20, 1, 1, 20)?);

        // E3 [15, 17) is the last exon of T1: no downstream flank, the upstream one is clipped
        let records = loader(config, vec![snv("1", 17, "C", "A")?])?
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(records.len(), 1);
        let tissue = records[0].inputs().tissue().as_ref().unwrap();
        assert_eq!(
            tissue.seq(),
            &TissueSeq::Window("ACGTACGTACGGTTAAC".to_owned())
        );
        assert_eq!(
            tissue.mut_seq(),
            &TissueSeq::Window("ACGTACGTACGGTTAAA".to_owned())
        );
        Ok(())
    }

    fn split(acceptor: &str, donor: &str) -> TissueSeq {
        TissueSeq::Split(crate::tissue::TissueSplit::new(
            acceptor.to_owned(),
            donor.to_owned(),
        ))
    }

    fn split_config() -> Result<Config> {
        let mut config = Config::default();
        config
            .set_overhang(3, 3)
            .set_split_seq(true)
            .set_splitter(SeqSplitter::new(3, 3, 3, 3)?);
        Ok(config)
    }

    #[test]
    fn test_split_deletion() -> Result<()> {
        // Deletes the A at 8 (0-based), the last intronic base before E2
        let variant = Variant::new("1", 8, None, "TA", vec!["T".to_owned()])?;
        let records = loader(split_config()?, vec![variant])?.collect::<Result<Vec<_>>>()?;
        let exons = records
            .iter()
            .map(|x| x.metadata().exon().exon_id().as_str())
            .collect::<Vec<_>>();
        assert_eq!(exons, ["E1", "E2"]);

        // E1 window CGT|ACG -> CGT|CG
        let e1 = records[0].inputs().split().as_ref().unwrap();
        assert_eq!(e1.seq(), &split("NNNCGT", "CGTACG"));
        assert_eq!(e1.mut_seq(), &split("NNNCGT", "CGTCGN"));

        // E2 window TAC|GGT|TAA -> TC|GGT|TAA, the exon stays in place
        let e2 = records[1].inputs().split().as_ref().unwrap();
        assert_eq!(e2.seq(), &split("TACGGT", "GGTTAA"));
        assert_eq!(e2.mut_seq(), &split("NTCGGT", "GGTTAA"));
        assert_eq!(records[1].inputs().mut_seq(), "TCGGTTAA");
        Ok(())
    }

    #[test]
    fn test_split_reverse_insertion() -> Result<()> {
        // GAA instead of the G at 7 (0-based): E4 left flank, E5 right flank
        let variant = Variant::new("2", 8, None, "G", vec!["GAA".to_owned()])?;
        let records = loader(split_config()?, vec![variant])?.collect::<Result<Vec<_>>>()?;
        assert_eq!(records.len(), 2);

        let e4 = &records[0];
        assert_eq!(e4.metadata().exon().exon_id(), "E4");
        assert_eq!(e4.inputs().mut_seq(), "GGGGTTC");
        let e4 = e4.inputs().split().as_ref().unwrap();
        assert_eq!(e4.seq(), &split("NNNGGN", "NGGGGC"));
        assert_eq!(e4.mut_seq(), &split("NNNGGN", "NGGGGT"));

        let e5 = &records[1];
        assert_eq!(e5.metadata().exon().exon_id(), "E5");
        assert_eq!(e5.inputs().mut_seq(), "GTTCCCC");
        let e5 = e5.inputs().split().as_ref().unwrap();
        assert_eq!(e5.seq(), &split("GCCCCN", "NCCNNN"));
        assert_eq!(e5.mut_seq(), &split("TCCCCN", "NCCNNN"));
        Ok(())
    }

    #[test]
    fn test_windows_clipped_at_contig_end() -> Result<()> {
        let mut config = Config::default();
        config.set_overhang(10, 10).set_batch_size(1)?;

        let variants = vec![snv("1", 12, "G", "T")?, snv("2", 10, "C", "T")?];
        let records = loader(config, variants)?.collect::<Result<Vec<_>>>()?;
        let exons = records
            .iter()
            .map(|x| x.metadata().exon().exon_id().as_str())
            .collect::<Vec<_>>();
        assert_eq!(exons, ["E1", "E2", "E3", "E4", "E5"]);

        // E2 [10, 13) only has 7 bases to the right
        let e2 = &records[1];
        assert_eq!(e2.inputs().seq(), "ACGTACGTACGGTTAACCGG");
        assert_eq!(e2.inputs().mut_seq(), "ACGTACGTACGTTTAACCGG");
        assert_eq!(*e2.metadata().exon().left_overhang(), 10);
        assert_eq!(*e2.metadata().exon().right_overhang(), 7);
        assert_eq!(*records[0].metadata().exon().right_overhang(), 10);
        Ok(())
    }

    #[test]
    fn test_stops_after_error() -> Result<()> {
        let mut config = Config::default();
        config.set_batch_size(1)?;
        let variants = vec![snv("3", 2, "A", "G")?, snv("1", 12, "G", "T")?];
        let mut loader = loader(config, variants)?;
        assert!(loader.next().unwrap().is_err());
        assert!(loader.next().is_none());
        Ok(())
    }
}
