//! Nucleotide sequence helpers shared by the readers and the toolkits.

/// Complement of a single nucleotide. The case is preserved, unknown symbols are returned as is.
#[inline]
pub fn complement_base(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'a' => b't',
        b't' => b'a',
        b'g' => b'c',
        b'c' => b'g',
        _ => base,
    }
}

/// Reverse complement the sequence in place.
pub fn reverse_complement_inplace(seq: &mut [u8]) {
    seq.reverse();
    for base in seq.iter_mut() {
        *base = complement_base(*base);
    }
}

/// True for the nucleotide symbols A, C, G, T and N in any case.
pub fn is_nucleotide(base: u8) -> bool {
    matches!(
        base,
        b'A' | b'C' | b'G' | b'T' | b'N' | b'a' | b'c' | b'g' | b't' | b'n'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement_inplace() {
        let mut seq = b"AACGTn".to_vec();
        reverse_complement_inplace(&mut seq);
        assert_eq!(seq, b"nACGTT");

        reverse_complement_inplace(&mut seq);
        assert_eq!(seq, b"AACGTn");
    }

    #[test]
    fn test_is_nucleotide() {
        assert!(b"ACGTNacgtn".iter().all(|x| is_nucleotide(*x)));
        assert!(!is_nucleotide(b'*'));
        assert!(!is_nucleotide(b'<'));
    }
}
