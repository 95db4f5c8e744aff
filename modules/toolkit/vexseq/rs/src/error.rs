use derive_getters::Getters;
use derive_more::{Constructor, Display, Error};

/// The exon annotation doesn't cover all expected contigs.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, Constructor, Getters)]
#[display("Annotation is missing expected contigs: {}", missing.join(", "))]
pub struct AnnotationError {
    missing: Vec<String>,
}

/// The variant's reference allele doesn't intersect the extracted sequence window.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, Constructor, Getters)]
#[display(
    "Variant {variant} is outside the window of exon {exon_id} (offset {offset}, window length {window_len})"
)]
pub struct OutOfWindowError {
    exon_id: String,
    variant: String,
    offset: i64,
    window_len: usize,
}
