use std::path::Path;

/// Decompression applied to a byte stream before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Config {
    /// Uncompressed bytes as-is
    #[default]
    Raw,
    /// GZIP container, possibly with multiple members
    Gzip,
    /// BGZF container, decoded on the calling thread
    Bgzf,
}

impl Config {
    /// Pick the decompression from the file extension: `gz`/`gzip` -> Gzip, `bgz`/`bgzf` -> Bgzf,
    /// anything else is treated as uncompressed.
    pub fn infer_from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext {
                "gz" | "gzip" => Config::Gzip,
                "bgz" | "bgzf" => Config::Bgzf,
                _ => Config::Raw,
            })
            .unwrap_or(Config::Raw)
    }
}
