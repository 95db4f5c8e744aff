// Format specification: https://samtools.github.io/hts-specs/VCFv4.3.pdf
//
// Only the fixed site fields are parsed: CHROM, POS (1-based), ID, REF and ALT.
// QUAL, FILTER and INFO must be present but are skipped, sample columns are ignored.

mod reader;
mod record;

pub use reader::{parse, Reader};
pub use record::Record;
