use super::record::Record;
use crate::compression::decode;
use crate::traits::ReadRecord;
use eyre::OptionExt;
use eyre::{bail, ensure, Context, Result};
use splicekit_core_rs::loc::{Interval, Strand};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub mod parse {
    use super::*;

    pub fn seqid<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<String> {
        let seqid = parts.next().ok_or_eyre("Missing GTF seqname")?;
        Ok(seqid.to_owned())
    }

    pub fn source<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<String> {
        let source = parts.next().ok_or_eyre("Missing GTF source")?;
        Ok(source.to_owned())
    }

    pub fn feature<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<String> {
        let feature = parts.next().ok_or_eyre("Missing GTF feature")?;
        Ok(feature.to_owned())
    }

    /// 1-based closed [start, end] -> 0-based half-open [start - 1, end)
    pub fn interval<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Interval<u64>> {
        let start = parts.next().ok_or_eyre("Missing GTF start")?;
        let end = parts.next().ok_or_eyre("Missing GTF end")?;

        let (start, end) = match (start.parse::<u64>(), end.parse::<u64>()) {
            (Ok(start), Ok(end)) => (start, end),
            _ => bail!("Invalid GTF interval: {start}-{end}"),
        };
        ensure!(start >= 1, "GTF coordinates are 1-based, got start = {start}");
        Interval::new(start - 1, end).wrap_err("Invalid GTF interval")
    }

    pub fn score<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Option<f64>> {
        let score = parts.next().ok_or_eyre("Missing GTF score")?;
        if score == "." {
            return Ok(None);
        }
        let score = score.parse::<f64>().wrap_err("Invalid GTF score")?;
        Ok(Some(score))
    }

    pub fn strand<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Option<Strand>> {
        let strand = parts.next().ok_or_eyre("Missing GTF strand")?;
        let strand = match strand {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            "." | "?" => None,
            _ => bail!("Invalid GTF strand: {strand}"),
        };
        Ok(strand)
    }

    pub fn frame<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Option<u8>> {
        let frame = parts.next().ok_or_eyre("Missing GTF frame")?;
        if frame == "." {
            return Ok(None);
        }
        let frame = frame.parse::<u8>().wrap_err("Invalid GTF frame")?;
        Ok(Some(frame))
    }

    pub fn attributes<'a>(
        parts: &mut impl Iterator<Item = &'a str>,
    ) -> Result<Vec<(String, String)>> {
        let attributes = parts.next().ok_or_eyre("Missing GTF attributes")?;

        let mut result = Vec::new();
        for attribute in attributes.split(';') {
            let attribute = attribute.trim();
            if attribute.is_empty() {
                continue;
            }
            let (key, value) = attribute
                .split_once(char::is_whitespace)
                .ok_or_else(|| eyre::eyre!("Invalid GTF attribute: {attribute}"))?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|x| x.strip_suffix('"'))
                .unwrap_or(value);
            result.push((key.to_owned(), value.to_owned()));
        }
        Ok(result)
    }

    pub fn record<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Record> {
        Record::new(
            seqid(parts)?,
            source(parts)?,
            feature(parts)?,
            interval(parts)?,
            score(parts)?,
            strand(parts)?,
            frame(parts)?,
            attributes(parts)?,
        )
    }
}

pub struct Reader<R> {
    reader: R,
    buffer: String,
    line: usize,
}

impl<R: BufRead> Reader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line: 0,
        }
    }
}

impl Reader<BufReader<Box<dyn Read + Send + Sync + 'static>>> {
    /// Create a new GTF reader from the given file path. The compression is inferred from the
    /// file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let stream = decode::Stream::from_path(path)?;
        Ok(Self::new(BufReader::new(stream.boxed())))
    }
}

impl<R: BufRead> ReadRecord for Reader<R> {
    type Record = Record;

    fn read_record(&mut self, into: &mut Record) -> Result<bool> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(false);
            }
            self.line += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split('\t');
            *into = parse::record(&mut parts)
                .wrap_err_with(|| format!("Failed to parse GTF line {}: {}", self.line, line))?;
            ensure!(
                parts.next().is_none(),
                "GTF line {} has too many fields: {}",
                self.line,
                line
            );
            return Ok(true);
        }
    }
}
