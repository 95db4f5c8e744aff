use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result};
use splicekit_core_rs::loc::Strand;

use crate::exons::ExonInterval;
use crate::window::oriented_overhang;

pub const PADDING: char = 'N';

/// Lengths of the fixed-size acceptor and donor subsequences cut around an exon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct SeqSplitter {
    acceptor_intron: usize,
    acceptor_exon: usize,
    donor_exon: usize,
    donor_intron: usize,
}

impl Default for SeqSplitter {
    fn default() -> Self {
        Self {
            acceptor_intron: 300,
            acceptor_exon: 100,
            donor_exon: 100,
            donor_intron: 300,
        }
    }
}

/// Acceptor and donor sides of an exon-centered sequence, both in the transcription direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct TissueSplit {
    acceptor: String,
    donor: String,
}

impl TissueSplit {
    pub fn new(acceptor: String, donor: String) -> Self {
        Self { acceptor, donor }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TissueSeq {
    /// The whole tissue window
    Window(String),
    /// The window split into acceptor and donor subsequences
    Split(TissueSplit),
}

impl SeqSplitter {
    pub fn new(
        acceptor_intron: usize,
        acceptor_exon: usize,
        donor_exon: usize,
        donor_intron: usize,
    ) -> Result<Self> {
        ensure!(
            acceptor_intron + acceptor_exon > 0,
            "Acceptor subsequence must not be empty"
        );
        ensure!(
            donor_exon + donor_intron > 0,
            "Donor subsequence must not be empty"
        );
        Ok(Self {
            acceptor_intron,
            acceptor_exon,
            donor_exon,
            donor_intron,
        })
    }

    pub fn acceptor_len(&self) -> usize {
        self.acceptor_intron + self.acceptor_exon
    }

    pub fn donor_len(&self) -> usize {
        self.donor_exon + self.donor_intron
    }

    /// Split an oriented exon-centered sequence into acceptor and donor parts.
    ///
    /// `flanks` are the (upstream, downstream) intronic lengths in `seq`; the rest is the exon
    /// body. Acceptor is the end of the upstream flank followed by the start of the body, donor is
    /// the end of the body followed by the start of the downstream flank. Missing bases are
    /// padded with `N` on the outer side of each piece, so the output lengths never depend on
    /// the input.
    pub fn split_tissue_seq(&self, seq: &str, flanks: (usize, usize)) -> Result<TissueSplit> {
        let (upstream, downstream) = flanks;
        ensure!(
            upstream + downstream <= seq.len(),
            "Flanks ({}, {}) exceed the sequence length {}",
            upstream,
            downstream,
            seq.len()
        );
        ensure!(seq.is_ascii(), "Sequence must be ASCII: {}", seq);

        let body = &seq[upstream..seq.len() - downstream];
        let intron_up = &seq[..upstream];
        let intron_down = &seq[seq.len() - downstream..];

        let mut acceptor = String::with_capacity(self.acceptor_len());
        acceptor.push_str(&left_pad(tail(intron_up, self.acceptor_intron), self.acceptor_intron));
        acceptor.push_str(&right_pad(head(body, self.acceptor_exon), self.acceptor_exon));

        let mut donor = String::with_capacity(self.donor_len());
        donor.push_str(&left_pad(tail(body, self.donor_exon), self.donor_exon));
        donor.push_str(&right_pad(head(intron_down, self.donor_intron), self.donor_intron));

        Ok(TissueSplit { acceptor, donor })
    }

    /// Genomic (left, right) flanks of the tissue window around the exon. The acceptor intron is
    /// upstream and the donor intron is downstream of the exon. A side without an overhang,
    /// i.e. the outer end of a transcript, gets no flank.
    pub fn tissue_flanks(&self, exon: &ExonInterval) -> (u64, u64) {
        let strand = *exon.strand();
        let (up, down) = oriented_overhang(strand, *exon.left_overhang(), *exon.right_overhang());

        let up = if up == 0 { 0 } else { self.acceptor_intron as u64 };
        let down = if down == 0 { 0 } else { self.donor_intron as u64 };
        genomic_overhang(strand, up, down)
    }
}

/// Inverse of `oriented_overhang`: (upstream, downstream) -> genomic (left, right).
pub fn genomic_overhang(strand: Strand, upstream: u64, downstream: u64) -> (u64, u64) {
    strand.oriented(upstream, downstream)
}

fn head(seq: &str, len: usize) -> &str {
    &seq[..len.min(seq.len())]
}

fn tail(seq: &str, len: usize) -> &str {
    &seq[seq.len() - len.min(seq.len())..]
}

fn left_pad(seq: &str, len: usize) -> String {
    let mut padded = String::with_capacity(len);
    padded.extend(std::iter::repeat_n(PADDING, len.saturating_sub(seq.len())));
    padded.push_str(seq);
    padded
}

fn right_pad(seq: &str, len: usize) -> String {
    let mut padded = String::with_capacity(len);
    padded.push_str(seq);
    padded.extend(std::iter::repeat_n(PADDING, len.saturating_sub(seq.len())));
    padded
}
