pub use index::GenomicIndex;

mod index;
