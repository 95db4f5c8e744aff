pub mod compression;
pub mod fasta;
pub mod gtf;
pub mod vcf;
mod traits;

pub use traits::ReadRecord;
