// Format specification: https://www.ensembl.org/info/website/upload/gff.html
//
// Tab-separated fields:
// 1. seqname
// 2. source
// 3. feature
// 4. start: u64, 1-based
// 5. end: u64, 1-based, inclusive
// 6. score: f64 | .
// 7. strand: [+|-|.]
// 8. frame: [0|1|2] | .
// 9. attribute: `key "value";` pairs
//
// Lines starting with '#' are comments.

mod reader;
mod record;

pub use reader::{parse, Reader};
pub use record::Record;
