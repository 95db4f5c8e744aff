use std::collections::BTreeMap;

use derive_getters::{Dissolve, Getters};
use ndarray::Array2;
use splicekit_core_rs::loc::{IntervalOp, Strand};

use crate::encode;
use crate::exons::ExonInterval;
use crate::tissue::TissueSeq;
use crate::variant::Allele;

/// Model inputs and metadata for one (exon, variant allele) pair.
#[derive(Debug, Clone, PartialEq, Getters, Dissolve)]
pub struct Record {
    inputs: Inputs,
    metadata: Metadata,
}

impl Record {
    pub fn new(inputs: Inputs, metadata: Metadata) -> Self {
        Self { inputs, metadata }
    }
}

#[derive(Debug, Clone, PartialEq, Getters, Dissolve)]
pub struct Inputs {
    seq: String,
    mut_seq: String,
    /// Acceptor and donor parts of `seq` and `mut_seq`
    split: Option<TissueInputs>,
    tissue: Option<TissueInputs>,
    /// One-hot encoded sequences keyed by their names, e.g. `seq` or `mut_tissue_acceptor`
    encoded: Option<BTreeMap<String, Array2<f32>>>,
}

impl Inputs {
    pub fn new(
        seq: String,
        mut_seq: String,
        split: Option<TissueInputs>,
        tissue: Option<TissueInputs>,
    ) -> Self {
        Self {
            seq,
            mut_seq,
            split,
            tissue,
            encoded: None,
        }
    }

    /// One-hot encode every sequence returned by [`Inputs::named_seqs`].
    pub fn attach_encoded(&mut self) -> &mut Self {
        self.encoded = Some(encode::encode_named(self.named_seqs()));
        self
    }

    /// Every sequence of the inputs with its name, in a stable order.
    pub fn named_seqs(&self) -> Vec<(String, &str)> {
        let mut named = vec![
            ("seq".to_owned(), self.seq.as_str()),
            ("mut_seq".to_owned(), self.mut_seq.as_str()),
        ];
        let groups = [
            (&self.split, "seq", "mut_seq"),
            (&self.tissue, "tissue", "mut_tissue"),
        ];
        for (inputs, seq_name, mut_name) in groups {
            let Some(inputs) = inputs else { continue };
            for (prefix, seq) in [(seq_name, &inputs.seq), (mut_name, &inputs.mut_seq)] {
                match seq {
                    TissueSeq::Window(window) => named.push((prefix.to_owned(), window.as_str())),
                    TissueSeq::Split(split) => {
                        named.push((format!("{prefix}_acceptor"), split.acceptor().as_str()));
                        named.push((format!("{prefix}_donor"), split.donor().as_str()));
                    }
                }
            }
        }
        named
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct TissueInputs {
    seq: TissueSeq,
    mut_seq: TissueSeq,
}

impl TissueInputs {
    pub fn new(seq: TissueSeq, mut_seq: TissueSeq) -> Self {
        Self { seq, mut_seq }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct Metadata {
    exon: ExonMeta,
    variant: VariantMeta,
}

impl Metadata {
    pub fn new(exon: ExonMeta, variant: VariantMeta) -> Self {
        Self { exon, variant }
    }
}

/// Exon coordinates are 0-based, half-open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct ExonMeta {
    contig: String,
    start: u64,
    end: u64,
    strand: Strand,
    exon_id: String,
    gene_id: String,
    gene_name: String,
    transcript_id: String,
    left_overhang: u64,
    right_overhang: u64,
}

impl ExonMeta {
    /// `overhang` is the genomic (left, right) overhang of the window actually used.
    pub fn new(exon: &ExonInterval, overhang: (u64, u64)) -> Self {
        Self {
            contig: exon.contig().clone(),
            start: exon.interval().start(),
            end: exon.interval().end(),
            strand: *exon.strand(),
            exon_id: exon.exon_id().clone(),
            gene_id: exon.gene_id().clone(),
            gene_name: exon.gene_name().clone(),
            transcript_id: exon.transcript_id().clone(),
            left_overhang: overhang.0,
            right_overhang: overhang.1,
        }
    }
}

/// The variant with a single alternate allele. The position is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct VariantMeta {
    contig: String,
    position: u64,
    id: Option<String>,
    reference: String,
    alternate: String,
    /// `contig:position:REF:ALT`
    annotation: String,
}

impl From<Allele<'_>> for VariantMeta {
    fn from(allele: Allele<'_>) -> Self {
        let variant = allele.variant();
        Self {
            contig: variant.contig().clone(),
            position: *variant.position(),
            id: variant.id().clone(),
            reference: allele.reference().to_owned(),
            alternate: allele.alternate().to_owned(),
            annotation: allele.to_string(),
        }
    }
}
