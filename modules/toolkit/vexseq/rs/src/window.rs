use derive_getters::{Dissolve, Getters};
use eyre::{eyre, Result, WrapErr};
use splicekit_core_rs::loc::{Interval, IntervalOp, Strand};
use splicekit_core_rs::num::signed_distance;
use splicekit_core_rs::seq;
use splicekit_io_rs::fasta::IndexedReaderMutOp;

use crate::error::OutOfWindowError;
use crate::exons::ExonInterval;
use crate::variant::Allele;

/// Genomic (left, right) overhangs -> (upstream, downstream) in the transcription direction.
pub fn oriented_overhang(strand: Strand, left: u64, right: u64) -> (u64, u64) {
    strand.oriented(left, right)
}

/// 0-based offset of a 1-based variant position inside the window. Negative if the variant
/// starts before the window.
pub fn variant_offset(window: &Interval<u64>, position: u64) -> Result<i64> {
    position
        .checked_sub(1)
        .and_then(|start| signed_distance(start, window.start()))
        .ok_or_else(|| eyre!("Variant position {position} can't be placed in the window {window}"))
}

/// Replace `reference` at `offset` with `alternate`.
///
/// A reference allele sticking out on the left is trimmed together with the same number of
/// leading alternate bases, so the result always starts at the window start. A reference allele
/// sticking out on the right is clipped at the window end. Returns `None` if the reference allele
/// doesn't touch the window at all.
pub fn apply_variant(
    window: &[u8],
    offset: i64,
    reference: &[u8],
    alternate: &[u8],
) -> Option<Vec<u8>> {
    if offset >= window.len() as i64 || offset + reference.len() as i64 <= 0 {
        return None;
    }

    let (offset, reference, alternate) = if offset < 0 {
        let skip = offset.unsigned_abs() as usize;
        (0, &reference[skip..], &alternate[skip.min(alternate.len())..])
    } else {
        (offset as usize, reference, alternate)
    };
    let end = (offset + reference.len()).min(window.len());

    let mut mutated = Vec::with_capacity(window.len() + alternate.len());
    mutated.extend_from_slice(&window[..offset]);
    mutated.extend_from_slice(alternate);
    mutated.extend_from_slice(&window[end..]);
    Some(mutated)
}

/// Genomic (left, right) flank lengths of the window after `apply_variant`.
///
/// Reference bases replaced inside a flank are removed from it. Alternate bases are matched to the
/// replaced reference bases position by position, and extra inserted bases go with the last
/// replaced base. Returns `None` if the reference allele doesn't touch the window, the flanks are
/// unchanged in that case.
pub fn shift_flanks(
    window_len: usize,
    flanks: (usize, usize),
    offset: i64,
    reference: usize,
    alternate: usize,
) -> Option<(usize, usize)> {
    let (left, right) = flanks;
    debug_assert!(left + right <= window_len);

    let end = offset + reference as i64;
    if offset >= window_len as i64 || end <= 0 {
        return None;
    }
    let skip = if offset < 0 { offset.unsigned_abs() as usize } else { 0 };
    let alternate = alternate - skip.min(alternate);
    let start = offset.max(0) as usize;
    let end = (end as usize).min(window_len);
    let span = end - start;

    let body_end = window_len - right;
    let left_ref = left.min(end).saturating_sub(start);
    let right_ref = end.saturating_sub(body_end.max(start));

    let mut left_alt = alternate.min(left_ref);
    let mut right_alt = alternate.min(span).saturating_sub(span - right_ref);
    if alternate > span {
        let extra = alternate - span;
        if right_ref > 0 {
            right_alt += extra;
        } else if end <= left {
            left_alt += extra;
        }
    }
    Some((left - left_ref + left_alt, right - right_ref + right_alt))
}

/// Case-insensitive comparison of the reference allele with the part of the window it covers.
pub fn reference_matches(window: &[u8], offset: i64, reference: &[u8]) -> bool {
    let (start, skip) = if offset < 0 {
        (0, offset.unsigned_abs() as usize)
    } else {
        (offset as usize, 0)
    };
    let window = window.get(start..).unwrap_or_default();
    let reference = reference.get(skip..).unwrap_or_default();
    window
        .iter()
        .zip(reference)
        .all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// Reference and mutated sequences of one window, both in the transcription direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Dissolve)]
pub struct WindowPair {
    seq: String,
    mut_seq: String,
}

impl WindowPair {
    pub fn new(seq: String, mut_seq: String) -> Self {
        Self { seq, mut_seq }
    }
}

/// Fetch the window on the exon's contig and orient it by the exon strand.
pub fn fetch_window<S: IndexedReaderMutOp + ?Sized>(
    sequences: &mut S,
    exon: &ExonInterval,
    window: Interval<u64>,
    buffer: &mut Vec<u8>,
) -> Result<String> {
    sequences
        .fetch_stranded(exon.contig(), window, *exon.strand(), buffer)
        .wrap_err_with(|| {
            format!(
                "Failed to fetch window {}:{} of exon {}",
                exon.contig(),
                window,
                exon.exon_id()
            )
        })?;
    String::from_utf8(buffer.clone()).wrap_err("Sequence is not valid UTF-8")
}

/// Extract the reference window and apply the allele to it. The variant is applied on the forward
/// strand, both sequences are reverse complemented afterwards for exons on the reverse strand.
///
/// Fails with [`OutOfWindowError`] if the reference allele doesn't intersect the window.
pub fn extract_pair<S: IndexedReaderMutOp + ?Sized>(
    sequences: &mut S,
    exon: &ExonInterval,
    window: Interval<u64>,
    allele: Allele<'_>,
    buffer: &mut Vec<u8>,
) -> Result<WindowPair> {
    sequences
        .fetch(exon.contig(), window, buffer)
        .wrap_err_with(|| {
            format!(
                "Failed to fetch window {}:{} of exon {}",
                exon.contig(),
                window,
                exon.exon_id()
            )
        })?;

    let offset = variant_offset(&window, *allele.variant().position())?;
    let reference = allele.reference().as_bytes();
    let Some(mut mutated) = apply_variant(buffer, offset, reference, allele.alternate().as_bytes())
    else {
        return Err(OutOfWindowError::new(
            exon.exon_id().clone(),
            allele.to_string(),
            offset,
            buffer.len(),
        )
        .into());
    };
    if !reference_matches(buffer, offset, reference) {
        log::warn!(
            "Reference allele of {} doesn't match the genome sequence, applying anyway",
            allele
        );
    }

    let mut reference = buffer.clone();
    if *exon.strand() == Strand::Reverse {
        seq::reverse_complement_inplace(&mut reference);
        seq::reverse_complement_inplace(&mut mutated);
    }

    Ok(WindowPair {
        seq: String::from_utf8(reference).wrap_err("Sequence is not valid UTF-8")?,
        mut_seq: String::from_utf8(mutated).wrap_err("Mutated sequence is not valid UTF-8")?,
    })
}
