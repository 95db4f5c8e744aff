use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result};
use splicekit_core_rs::loc::{Interval, Strand};

/// A single GTF line. The interval is converted to 0-based half-open coordinates.
#[derive(Debug, Clone, PartialEq, Default, Getters, Dissolve)]
pub struct Record {
    seqid: String,
    source: String,
    feature: String,
    interval: Interval<u64>,
    score: Option<f64>,
    strand: Option<Strand>,
    frame: Option<u8>,
    attributes: Vec<(String, String)>,
}

impl Record {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seqid: String,
        source: String,
        feature: String,
        interval: Interval<u64>,
        score: Option<f64>,
        strand: Option<Strand>,
        frame: Option<u8>,
        attributes: Vec<(String, String)>,
    ) -> Result<Self> {
        ensure!(!seqid.is_empty(), "GTF seqid must not be empty");
        ensure!(!feature.is_empty(), "GTF feature must not be empty");
        if let Some(frame) = frame {
            ensure!(frame <= 2, "GTF frame must be 0, 1 or 2, got {frame}");
        }
        Ok(Self {
            seqid,
            source,
            feature,
            interval,
            score,
            strand,
            frame,
            attributes,
        })
    }

    /// Value of the first attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
