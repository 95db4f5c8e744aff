pub use config::Config;
pub use error::{AnnotationError, OutOfWindowError};
pub use exons::{AnnotatedExon, Annotation, ExonInterval, ExonTable, Genome};
pub use loader::{Loader, VcfBatches};
pub use overlap::{Overlap, Overlaps};
pub use record::{ExonMeta, Inputs, Metadata, Record, TissueInputs, VariantMeta};
pub use tissue::{SeqSplitter, TissueSeq, TissueSplit};
pub use variant::{Allele, Variant, VariantBatches, VariantKind};
pub use window::WindowPair;

pub mod encode;
pub mod exons;
pub mod overlap;
pub mod tissue;
pub mod variant;
pub mod window;

mod config;
mod error;
mod loader;
mod record;
