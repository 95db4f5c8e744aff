//! One-hot encoding of nucleotide sequences. Columns follow the `A, C, G, T` order, any other
//! symbol (including `N`) is encoded as an all-zero row.

use std::collections::BTreeMap;

use eyre::{ensure, Result, WrapErr};
use ndarray::{Array2, Array3};

pub const ALPHABET: [u8; 4] = *b"ACGT";

#[inline]
fn column(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Encode a sequence as a `(length, 4)` matrix.
pub fn encode_seq(seq: &str) -> Array2<f32> {
    let mut encoded = Array2::zeros((seq.len(), ALPHABET.len()));
    for (row, base) in seq.bytes().enumerate() {
        if let Some(col) = column(base) {
            encoded[[row, col]] = 1.0;
        }
    }
    encoded
}

/// Encode every sequence in a name -> sequence mapping.
pub fn encode_named<K, V>(seqs: impl IntoIterator<Item = (K, V)>) -> BTreeMap<String, Array2<f32>>
where
    K: Into<String>,
    V: AsRef<str>,
{
    seqs.into_iter()
        .map(|(name, seq)| (name.into(), encode_seq(seq.as_ref())))
        .collect()
}

/// Stack sequences of the same length into a `(batch, length, 4)` tensor.
pub fn encode_batch<S: AsRef<str>>(seqs: &[S]) -> Result<Array3<f32>> {
    let length = seqs.first().map(|x| x.as_ref().len()).unwrap_or(0);
    ensure!(
        seqs.iter().all(|x| x.as_ref().len() == length),
        "All sequences in a batch must have the same length"
    );

    let mut batch = Array3::zeros((seqs.len(), length, ALPHABET.len()));
    for (mut slot, seq) in batch.outer_iter_mut().zip(seqs) {
        slot.assign(&encode_seq(seq.as_ref()));
    }
    Ok(batch)
}

/// Batch-encode every named group of sequences.
pub fn encode_named_batch<K, S>(
    batches: impl IntoIterator<Item = (K, Vec<S>)>,
) -> Result<BTreeMap<String, Array3<f32>>>
where
    K: Into<String>,
    S: AsRef<str>,
{
    batches
        .into_iter()
        .map(|(name, seqs)| {
            let name = name.into();
            let encoded = encode_batch(&seqs)
                .wrap_err_with(|| format!("Failed to encode sequences for {name}"))?;
            Ok((name, encoded))
        })
        .collect()
}

/// Map each row back to the nucleotide of its largest column. All-zero rows become `N`.
pub fn decode_seq(encoded: &Array2<f32>) -> Result<String> {
    ensure!(
        encoded.ncols() == ALPHABET.len(),
        "Expected {} columns in a one-hot encoded sequence, got {}",
        ALPHABET.len(),
        encoded.ncols()
    );
    let seq = encoded
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, x)| **x > 0.0)
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map_or('N', |(col, _)| ALPHABET[col] as char)
        })
        .collect();
    Ok(seq)
}
