use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result};

/// Site-level part of a VCF data line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Getters, Dissolve)]
pub struct Record {
    contig: String,
    position: u64,
    id: Option<String>,
    reference: String,
    alternates: Vec<String>,
}

impl Record {
    pub fn new(
        contig: String,
        position: u64,
        id: Option<String>,
        reference: String,
        alternates: Vec<String>,
    ) -> Result<Self> {
        ensure!(!contig.is_empty(), "VCF contig must not be empty");
        ensure!(position >= 1, "VCF positions are 1-based, got {position}");
        ensure!(!reference.is_empty(), "VCF REF must not be empty");
        Ok(Self {
            contig,
            position,
            id,
            reference,
            alternates,
        })
    }
}
