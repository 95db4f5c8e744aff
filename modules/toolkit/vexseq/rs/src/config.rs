use derive_getters::Getters;
use eyre::{ensure, Result};

use crate::tissue::SeqSplitter;
use crate::variant::DEFAULT_BATCH_SIZE;

/// Loader options. Overhangs are genomic (left, right) lengths around each exon.
#[derive(Clone, PartialEq, Eq, Debug, Getters)]
pub struct Config {
    split_seq: bool,
    encode: bool,
    tissue_specific: bool,
    overhang: (u64, u64),
    splitter: SeqSplitter,
    batch_size: usize,
    expected_contigs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            split_seq: false,
            encode: false,
            tissue_specific: false,
            overhang: (100, 100),
            splitter: SeqSplitter::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            expected_contigs: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split tissue (or plain) windows into acceptor and donor subsequences.
    pub fn set_split_seq(&mut self, split_seq: bool) -> &mut Self {
        self.split_seq = split_seq;
        self
    }

    /// Attach one-hot encoded copies of all sequences.
    pub fn set_encode(&mut self, encode: bool) -> &mut Self {
        self.encode = encode;
        self
    }

    pub fn set_tissue_specific(&mut self, tissue_specific: bool) -> &mut Self {
        self.tissue_specific = tissue_specific;
        self
    }

    pub fn set_overhang(&mut self, left: u64, right: u64) -> &mut Self {
        self.overhang = (left, right);
        self
    }

    pub fn set_splitter(&mut self, splitter: SeqSplitter) -> &mut Self {
        self.splitter = splitter;
        self
    }

    pub fn set_batch_size(&mut self, batch_size: usize) -> Result<&mut Self> {
        ensure!(batch_size > 0, "Batch size must be greater than 0");
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Contigs that a GTF annotation must cover. Empty disables the check.
    pub fn set_expected_contigs(
        &mut self,
        contigs: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.expected_contigs = contigs.into_iter().map(|x| x.into()).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "Batch size must be greater than 0");
        ensure!(
            self.expected_contigs.iter().all(|x| !x.is_empty()),
            "Expected contigs must not be empty strings"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() -> Result<()> {
        let config = Config::default();
        assert!(!config.split_seq() && !config.encode() && !config.tissue_specific());
        assert_eq!(*config.overhang(), (100, 100));
        assert_eq!(*config.batch_size(), 10_000);
        assert_eq!(config.splitter().acceptor_len(), 400);
        assert!(config.expected_contigs().is_empty());
        config.validate()
    }

    #[test]
    fn test_setters() -> Result<()> {
        let mut config = Config::new();
        config
            .set_split_seq(true)
            .set_tissue_specific(true)
            .set_overhang(10, 20)
            .set_expected_contigs(["1", "X"])
            .set_batch_size(5)?;
        assert!(*config.split_seq() && *config.tissue_specific());
        assert_eq!(*config.overhang(), (10, 20));
        assert_eq!(config.expected_contigs(), &["1", "X"]);
        assert_eq!(*config.batch_size(), 5);

        assert!(config.set_batch_size(0).is_err());
        assert!(config.set_expected_contigs([""]).validate().is_err());
        Ok(())
    }
}
