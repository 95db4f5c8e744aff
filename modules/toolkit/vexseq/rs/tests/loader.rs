use std::path::{Path, PathBuf};

use eyre::{ensure, Result};
use itertools::Itertools;

use splicekit_vexseq_rs::exons::{self, PREBUILT_CONTIGS};
use splicekit_vexseq_rs::{
    AnnotationError, Annotation, Config, ExonTable, Genome, Loader, Record, TissueSeq,
};

const VARIANTS: usize = 7;

const RS1_SEQ: &str = "ATGCCTCGCGTGTCCAAGTGTGGGAGGTCGTATACCCCCTGCCTTTTACACCCAAACCGTTTTTCGCGTCTCCGCACTGTGCAAAAATTACTTCTATTATAGTAGGGCACGCGACGTAGCCGTATGTCTTTTAGCGAAGCCTCGTGACCGCCGACTCAATTCCGAGGCTAAAGACTCTACCGAAGTCGTATAGTCAACAG";
const RS1_MUT: &str = "ATGCCTCGCGTGTCCAAGTGTGGGAGGTCGTATACCCCCTGCCTTTTACGCCCAAACCGTTTTTCGCGTCTCCGCACTGTGCAAAAATTACTTCTATTATAGTAGGGCACGCGACGTAGCCGTATGTCTTTTAGCGAAGCCTCGTGACCGCCGACTCAATTCCGAGGCTAAAGACTCTACCGAAGTCGTATAGTCAACAG";
const RS5_SEQ: &str = "ACGCCGGATAAAGGATCATAGGCCAGACCACCGAGTACACGAACTTAATCTTTAACGCCTCCACCACGTGAAATTCGTTAGCGCCGCGTTTTGTGCTGCTAAGATATTAGAAAGTGATATAAGGAACCCTGGCGAAATTTCTACTAGCCGGTACGGACGAATTAGGTCAAGTACTATGGATATTGCCGTGGCCCCACGTA";
const RS5_MUT: &str = "ACGCCGGATAAAGGATCATAGGCCAGACCACCGAGTACACGAACTTAATCCTTAACGCCTCCACCACGTGAAATTCGTTAGCGCCGCGTTTTGTGCTGCTAAGATATTAGAAAGTGATATAAGGAACCCTGGCGAAATTTCTACTAGCCGGTACGGACGAATTAGGTCAAGTACTATGGATATTGCCGTGGCCCCACGTA";
const RS6_SEQ: &str = "TCATAATTATACATTTACCTTTAGCCGAGTGACGGACATCAGTCCAGGTGGATTCCTACCATGATGTCTCCCAGTCACACGTGTCTGTGCGGGCAGTTAGTGATCGCCACCTTATACGCCAACACACGACCAATCAAGTCTAAGGCCTCCTGGGCCCCACAAACGAGATATGGCCTACCTTTAAACACATACCTGCCATTGGTGGGAGAGCCCTCGAGAGACTCCTTACGATATTCCACACCCCGGACGG";
const RS6_MUT: &str = "TCATAATTATACATTTACCTTTAGCCGAGTGACGGACATCAGTCCAGGTGGATTCCTACCATGATGTCTCCCAGTCACACGTGTCTGTGCGGGCAGTTAGTGATCGCCACCTTATACGCCAACACACGACCAATCAAGTCTAAGGCCTCCTGGGCCCCACAAACGAGATATGGCCTACCTTTAAACACATACCTGCCATTGGTGGGAGAGCCCTCGAGAGACTCCTTACATATTCCACACCCCGGACGG";

fn get_resource_path(resource: impl AsRef<Path>) -> Result<PathBuf> {
    let path = PathBuf::from(env!("SPLICEKIT_RESOURCES")).join(resource);
    ensure!(
        path.exists(),
        "Requested resource does not exist: {}",
        path.display()
    );
    Ok(path)
}

fn load(config: Config, vcf: &str) -> Result<Vec<Record>> {
    let annotation = Annotation::Gtf(get_resource_path("gtf/annotation.gtf")?);
    let fasta = get_resource_path("fasta/genome.fa")?;
    let vcf = get_resource_path(vcf)?;
    Loader::from_paths(config, &annotation, fasta, vcf)?.collect()
}

fn ids(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|x| x.metadata().variant().id().as_deref().unwrap_or("."))
        .collect()
}

#[test]
fn test_loads_all_overlapping_variants() -> Result<()> {
    let records = load(Config::default(), "vcf/variants.vcf")?;

    // rs4 is the only variant outside of all exon windows
    assert_eq!(records.len(), VARIANTS - 1);
    assert_eq!(ids(&records), ["rs1", "rs2", "rs3", "rs5", "rs6", "rs7"]);

    let exons = records
        .iter()
        .map(|x| x.metadata().exon().exon_id().as_str())
        .collect_vec();
    assert_eq!(exons, ["E1.1", "E1.2", "E1.2", "E2.1", "E2.2", "E3.1"]);
    Ok(())
}

#[test]
fn test_sequences() -> Result<()> {
    let records = load(Config::default(), "vcf/variants.vcf")?;

    // SNV on the forward strand
    assert_eq!(records[0].inputs().seq(), RS1_SEQ);
    assert_eq!(records[0].inputs().mut_seq(), RS1_MUT);

    // Deletion and insertion change the length by len(ALT) - len(REF)
    for (record, delta) in [(&records[1], -2), (&records[2], 3)] {
        let seq = record.inputs().seq().len() as i64;
        let mut_seq = record.inputs().mut_seq().len() as i64;
        assert_eq!(seq, 350);
        assert_eq!(mut_seq - seq, delta);
    }

    // Reverse strand: SNV and deletion
    assert_eq!(records[3].inputs().seq(), RS5_SEQ);
    assert_eq!(records[3].inputs().mut_seq(), RS5_MUT);
    assert_eq!(records[4].inputs().seq(), RS6_SEQ);
    assert_eq!(records[4].inputs().mut_seq(), RS6_MUT);

    // Single-exon transcript: no overhangs at all
    assert_eq!(records[5].inputs().seq().len(), 100);
    Ok(())
}

#[test]
fn test_metadata() -> Result<()> {
    let records = load(Config::default(), "vcf/variants.vcf")?;

    let exon = records[4].metadata().exon();
    assert_eq!(exon.contig(), "17");
    assert_eq!((*exon.start(), *exon.end()), (300, 450));
    assert_eq!((*exon.left_overhang(), *exon.right_overhang()), (0, 100));
    assert_eq!(exon.gene_name(), "GENE2");
    assert_eq!(exon.transcript_id(), "T2");

    let variant = records[4].metadata().variant();
    assert_eq!(*variant.position(), 320);
    assert_eq!(variant.reference(), "TC");
    assert_eq!(variant.alternate(), "T");
    assert_eq!(variant.annotation(), "17:320:TC:T");

    // No gene name in the annotation
    assert_eq!(records[5].metadata().exon().gene_name(), "G3");
    Ok(())
}

#[test]
fn test_chunking_invariance() -> Result<()> {
    let mut results = Vec::new();
    for batch_size in [1, 2, 3, 10] {
        let mut config = Config::default();
        config.set_batch_size(batch_size)?;

        let records = load(config, "vcf/variants.vcf")?;
        assert_eq!(records.len(), VARIANTS - 1);
        results.push(ids(&records).into_iter().map(|x| x.to_owned()).sorted().collect_vec());
    }
    assert!(results.iter().all_equal());
    Ok(())
}

#[test]
fn test_compressed_vcf() -> Result<()> {
    let plain = load(Config::default(), "vcf/variants.vcf")?;
    let compressed = load(Config::default(), "vcf/variants.vcf.gz")?;
    assert_eq!(plain, compressed);
    Ok(())
}

#[test]
fn test_encoded_and_split() -> Result<()> {
    let mut config = Config::default();
    config.set_encode(true).set_split_seq(true);
    let records = load(config, "vcf/variants.vcf")?;

    let inputs = records[0].inputs();
    let split = inputs.split().as_ref().unwrap();
    let TissueSeq::Split(split) = split.seq() else {
        panic!("Expected a split sequence");
    };
    // First exon of T1: the acceptor side has no intron
    assert_eq!(split.acceptor().len(), 400);
    assert_eq!(split.donor().len(), 400);
    assert!(split.acceptor().starts_with(&"N".repeat(300)));
    assert_eq!(&split.donor()[..100], &RS1_SEQ[..100]);

    let encoded = inputs.encoded().as_ref().unwrap();
    assert_eq!(encoded["seq"].shape(), &[200, 4]);
    assert_eq!(encoded["mut_seq_acceptor"].shape(), &[400, 4]);
    Ok(())
}

#[test]
fn test_tissue_specific() -> Result<()> {
    let mut config = Config::default();
    config.set_tissue_specific(true);
    let records = load(config.clone(), "vcf/variants.vcf")?;

    // E1.1 is the first exon of T1: only the donor intron is attached
    let tissue = records[0].inputs().tissue().as_ref().unwrap();
    let TissueSeq::Window(window) = tissue.seq() else {
        panic!("Expected a tissue window");
    };
    assert_eq!(window.len(), 400);
    assert_eq!(&window[..200], RS1_SEQ);

    config.set_split_seq(true);
    let records = load(config, "vcf/variants.vcf")?;

    // E2.2 is the last exon of T2: no downstream intron
    let tissue = records[4].inputs().tissue().as_ref().unwrap();
    let TissueSeq::Split(split) = tissue.mut_seq() else {
        panic!("Expected a split tissue sequence");
    };
    assert_eq!(split.acceptor().len(), 400);
    assert_eq!(split.donor().len(), 400);
    assert!(split.donor().ends_with(&"N".repeat(300)));
    assert!(records[4].inputs().split().is_none());
    Ok(())
}

#[test]
fn test_missing_contigs() -> Result<()> {
    let mut config = Config::default();
    config.set_expected_contigs(["13", "17", "X"]);

    let err = load(config, "vcf/variants.vcf").unwrap_err();
    let err = err.downcast_ref::<AnnotationError>().unwrap();
    assert_eq!(err.missing(), &["X"]);
    Ok(())
}

#[test]
fn test_prebuilt_tables() -> Result<()> {
    let gtf = get_resource_path("gtf/annotation.gtf")?;
    let annotated = exons::read_gtf(&gtf)?;

    let dir = std::env::temp_dir().join(format!("splicekit-prebuilt-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = Genome::GRCh37.prebuilt_path(&dir);
    exons::save_prebuilt(&annotated, &path)?;

    // A prebuilt table is the parsed GTF with the overhangs applied at load time
    let loaded = ExonTable::new(exons::load_prebuilt(&path)?, (100, 100), &[] as &[&str])?;
    let parsed = ExonTable::from_gtf(&gtf, (100, 100), &[] as &[&str])?;
    assert_eq!(loaded.exons(), parsed.exons());

    // Prebuilt genomes must cover all chromosomes
    let annotation = Annotation::parse("GRCh37", &dir);
    let err = ExonTable::from_annotation(&annotation, (100, 100), &[] as &[&str]).unwrap_err();
    let err = err.downcast_ref::<AnnotationError>().unwrap();
    assert_eq!(err.missing().len(), PREBUILT_CONTIGS.len() - 2);

    // No table for the other genome
    let annotation = Annotation::parse("grch38", &dir);
    assert!(ExonTable::from_annotation(&annotation, (100, 100), &[] as &[&str]).is_err());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
