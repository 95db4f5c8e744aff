use super::record::Record;
use crate::compression::decode;
use crate::traits::ReadRecord;
use eyre::OptionExt;
use eyre::{ensure, Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub mod parse {
    use super::*;

    pub fn contig<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<String> {
        let contig = parts.next().ok_or_eyre("Missing VCF CHROM")?;
        Ok(contig.to_owned())
    }

    pub fn position<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<u64> {
        let position = parts.next().ok_or_eyre("Missing VCF POS")?;
        position.parse::<u64>().wrap_err("Invalid VCF POS")
    }

    pub fn id<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Option<String>> {
        let id = parts.next().ok_or_eyre("Missing VCF ID")?;
        match id {
            "." => Ok(None),
            _ => Ok(Some(id.to_owned())),
        }
    }

    pub fn reference<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<String> {
        let reference = parts.next().ok_or_eyre("Missing VCF REF")?;
        Ok(reference.to_owned())
    }

    /// `.` means no alternate alleles.
    pub fn alternates<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Vec<String>> {
        let alternates = parts.next().ok_or_eyre("Missing VCF ALT")?;
        if alternates == "." {
            return Ok(Vec::new());
        }
        Ok(alternates.split(',').map(|x| x.to_owned()).collect())
    }

    pub fn record<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Record> {
        let record = Record::new(
            contig(parts)?,
            position(parts)?,
            id(parts)?,
            reference(parts)?,
            alternates(parts)?,
        )?;
        for field in ["QUAL", "FILTER", "INFO"] {
            parts
                .next()
                .ok_or_else(|| eyre::eyre!("Missing VCF {field}"))?;
        }
        Ok(record)
    }
}

pub struct Reader<R> {
    reader: R,
    buffer: String,
    line: usize,
    // Meta-information and header lines, without the trailing newline
    header: Vec<String>,
}

impl<R: BufRead> Reader<R> {
    /// Create a VCF reader, consuming all meta-information lines and the `#CHROM` header.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut header = Vec::new();
        let mut line = 0;
        loop {
            let peek = reader.fill_buf()?;
            if peek.first() != Some(&b'#') {
                break;
            }

            let mut buffer = String::new();
            reader.read_line(&mut buffer)?;
            line += 1;
            let buffer = buffer.trim_end_matches(['\n', '\r']).to_owned();
            let is_column_header = buffer.starts_with("#CHROM");
            header.push(buffer);
            if is_column_header {
                break;
            }
        }

        Ok(Self {
            reader,
            buffer: String::new(),
            line,
            header,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl Reader<BufReader<Box<dyn Read + Send + Sync + 'static>>> {
    /// Create a new VCF reader from the given file path. Plain, gzip and bgzip files are
    /// recognized by their extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = decode::Stream::from_path(path)?;
        Self::new(BufReader::new(stream.boxed()))
            .wrap_err_with(|| format!("Failed to read VCF header: {}", path.display()))
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
            if line.is_empty() {
                continue;
            }
            ensure!(
                !line.starts_with('#'),
                "Unexpected VCF header line {} after the data lines: {}",
                self.line,
                line
            );

            *into = parse::record(&mut line.split('\t'))
                .wrap_err_with(|| format!("Failed to parse VCF line {}: {}", self.line, line))?;
            return Ok(true);
        }
    }
}
