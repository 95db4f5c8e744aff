use crate::compression::decode;
use ahash::AHashMap;
use derive_getters::{Dissolve, Getters};
use eyre::{ensure, eyre, Context, Result};
use impl_tools::autoimpl;
use splicekit_core_rs::loc::{Interval, IntervalOp, Strand};
use splicekit_core_rs::num::PrimInt;
use splicekit_core_rs::seq;
use std::fs::File;
use std::io::{BufRead, Read, Seek};
use std::path::Path;

/// An indexed FASTA reader that can fetch sequences by reference sequence ID and interval.
#[autoimpl(for<T: trait + ?Sized> &mut T, Box<T>)]
pub trait IndexedReaderMutOp {
    /// Fetch the forward-strand sequence for the given reference sequence ID and interval.
    fn fetch(&mut self, seqid: &str, interval: Interval<u64>, buffer: &mut Vec<u8>) -> Result<()>;

    /// Fetch the full reference sequence with the given ID.
    fn fetch_full_seq(&mut self, seqid: &str, buffer: &mut Vec<u8>) -> Result<()>;

    /// Length of the reference sequence, if it's present in the index.
    fn seqlen(&self, seqid: &str) -> Option<u64>;

    /// Fetch the sequence and reverse complement it for the reverse strand.
    fn fetch_stranded(
        &mut self,
        seqid: &str,
        interval: Interval<u64>,
        strand: Strand,
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        self.fetch(seqid, interval, buffer)?;
        if strand == Strand::Reverse {
            seq::reverse_complement_inplace(buffer);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Dissolve, Getters)]
pub struct IndexedReader<R> {
    reader: R,

    ids: Vec<String>, // IDs of the reference sequences as they appear in the FASTA file
    lengths: Vec<u64>, // Total length of each reference sequence, in bases
    offsets: Vec<u64>, // Offset in the FASTA file of the first base of each reference sequence
    bases_per_line: Vec<u64>, // Number of bases per line for each reference sequence
    bytes_per_line: Vec<u64>, // Number of bytes per line (including line ending character[s])

    index: AHashMap<String, usize>, // Reference sequence ID -> its index in the vectors above
}

impl IndexedReader<()> {
    /// Open a FASTA file with its `.fai` index located next to it. BGZF-compressed files also
    /// require a `.gzi` index.
    pub fn from_path(
        fasta: impl AsRef<Path>,
        compression: &decode::Config,
    ) -> Result<Box<dyn IndexedReaderMutOp + Send + Sync + 'static>> {
        let mut path = fasta.as_ref().to_owned();
        let fname = path
            .file_name()
            .and_then(|x| x.to_str())
            .unwrap_or_default()
            .to_string();
        let file = File::open(&path)
            .wrap_err_with(|| format!("Failed to open FASTA file: {}", path.display()))?;
        let file = decode::Stream::new(file, compression)?;

        path.set_file_name(format!("{fname}.fai"));
        ensure!(path.exists(), "fai index does not exist: {:?}", path);
        let fai = std::io::BufReader::new(File::open(&path)?);

        let boxed: Box<dyn IndexedReaderMutOp + Send + Sync + 'static> = match file {
            decode::Stream::Raw(fasta) => Box::new(IndexedReader::new(fasta, fai)?),
            decode::Stream::Bgzf(fasta) => {
                path.set_file_name(format!("{fname}.gzi"));
                ensure!(path.exists(), "gzi index does not exist: {:?}", path);
                let gzi = noodles::bgzf::gzi::fs::read(&path)?;

                let reader =
                    noodles::bgzf::io::indexed_reader::IndexedReader::new(fasta.into_inner(), gzi);
                Box::new(IndexedReader::new(reader, fai)?)
            }
            decode::Stream::Gzip(_) => {
                return Err(eyre!(
                    "Unsupported compression {:?} for an Indexed FASTA file: {}",
                    compression,
                    fasta.as_ref().display()
                ));
            }
        };

        log::info!("Opened indexed FASTA file: {}", fasta.as_ref().display());
        Ok(boxed)
    }
}

impl<R: Read + Seek> IndexedReader<R> {
    pub fn new<I: BufRead>(reader: R, mut index: I) -> Result<IndexedReader<R>> {
        let mut ids = Vec::new();
        let mut lengths = Vec::new();
        let mut offsets = Vec::new();
        let mut bases_per_line = Vec::new();
        let mut bytes_per_line = Vec::new();

        let mut buffer = String::new();
        while index.read_line(&mut buffer)? > 0 {
            let err = || eyre!("Invalid FASTA index line: {}", buffer);
            let mut parts = buffer.trim_end_matches(['\r', '\n']).split('\t');

            let id = parts.next().ok_or_else(err)?;
            ensure!(!id.is_empty(), "Empty reference sequence ID, line: {}", buffer);
            ids.push(id.to_string());

            let mut field = |name: &str| -> Result<u64> {
                let value = parts
                    .next()
                    .ok_or_else(|| eyre!("Missing {name}"))?
                    .parse::<u64>()
                    .wrap_err_with(|| format!("Invalid {name}"))?;
                ensure!(value > 0, "{name} must be greater than zero");
                Ok(value)
            };
            let length = field("sequence length").wrap_err_with(err)?;
            let offset = field("sequence offset").wrap_err_with(err)?;
            let _bases_per_line = field("bases per line").wrap_err_with(err)?;
            let _bytes_per_line = field("bytes per line").wrap_err_with(err)?;

            ensure!(
                _bytes_per_line > _bases_per_line,
                "Bytes per line must be greater than bases per line, line: {}",
                buffer
            );
            ensure!(
                parts.next().is_none(),
                "Extra fields in the FASTA index, line: {}",
                buffer
            );

            lengths.push(length);
            offsets.push(offset);
            bases_per_line.push(_bases_per_line);
            bytes_per_line.push(_bytes_per_line);

            buffer.clear();
        }

        let mut index = AHashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            ensure!(
                index.insert(id.clone(), i).is_none(),
                "Duplicated reference sequence ID in the FASTA index: {}",
                id
            );
        }

        Ok(Self {
            reader,
            ids,
            lengths,
            offsets,
            bases_per_line,
            bytes_per_line,
            index,
        })
    }

    #[inline(always)]
    fn sanitize<Iv, Idx>(&self, seqid: &str, interval: &Iv) -> Result<(usize, u64, u64)>
    where
        Iv: IntervalOp<Idx = Idx>,
        Idx: PrimInt,
    {
        let index = self
            .index
            .get(seqid)
            .ok_or_else(|| eyre!("Reference sequence ID not found in the index: {}", seqid))?;

        // Get required coordinates in sequence space
        let start = interval
            .start()
            .to_u64()
            .ok_or_else(|| eyre!("Invalid start coordinate: {:?}", interval.start()))?;
        let end = interval
            .end()
            .to_u64()
            .ok_or_else(|| eyre!("Invalid end coordinate: {:?}", interval.end()))?;

        let length = self.lengths[*index];
        ensure!(
            start < length,
            "Start coordinate for {} is out of bounds: {} >= {}",
            seqid,
            start,
            length
        );
        ensure!(
            end <= length,
            "End coordinate for {} is out of bounds: {} > {}",
            seqid,
            end,
            length
        );

        Ok((*index, start, end))
    }

    #[inline(always)]
    fn _fetch(&mut self, index: usize, start: u64, end: u64, buffer: &mut Vec<u8>) -> Result<()> {
        let offset = self.offsets[index];
        let bases_per_line = self.bases_per_line[index];
        let bytes_per_line = self.bytes_per_line[index];
        let endline_bytes = bytes_per_line - bases_per_line;

        // Calculate start and end lines in the FASTA file
        let start_line = start / bases_per_line;
        let end_line = end / bases_per_line;

        buffer.clear();
        let length = (end - start) as usize;
        buffer.try_reserve(length)?;

        // Seek to the start of the sequence
        let start_byte = offset + start_line * bytes_per_line + start % bases_per_line;
        self.reader.seek(std::io::SeekFrom::Start(start_byte))?;

        // The sequence is contained in a single line
        if start_line == end_line {
            self.reader
                .by_ref()
                .take(length as u64)
                .read_to_end(buffer)?;
            return Ok(());
        }

        // Read the first line, which might be incomplete
        let mut sink = std::io::sink();
        {
            let to_read = bases_per_line * (start_line + 1) - start;
            self.reader.by_ref().take(to_read).read_to_end(buffer)?;
            std::io::copy(&mut self.reader.by_ref().take(endline_bytes), &mut sink)?;
        }

        // Read the middle lines
        for _ in start_line + 1..end_line {
            self.reader
                .by_ref()
                .take(bases_per_line)
                .read_to_end(buffer)?;
            std::io::copy(&mut self.reader.by_ref().take(endline_bytes), &mut sink)?;
        }

        // Read the last line, which might be incomplete
        self.reader
            .by_ref()
            .take(end - end_line * bases_per_line)
            .read_to_end(buffer)?;

        ensure!(
            buffer.len() == length,
            "Truncated FASTA file: expected {} bases, got {}",
            length,
            buffer.len()
        );
        Ok(())
    }

    /// Fetch the sequence for the given reference sequence ID and interval.
    pub fn fetch_interval<Iv, Idx>(
        &mut self,
        seqid: &str,
        interval: &Iv,
        buffer: &mut Vec<u8>,
    ) -> Result<()>
    where
        Iv: IntervalOp<Idx = Idx>,
        Idx: PrimInt,
    {
        let (index, start, end) = self.sanitize(seqid, interval)?;
        self._fetch(index, start, end, buffer)
            .wrap_err_with(|| format!("Failed to fetch {}:{}-{}", seqid, start, end))
    }

    /// Fetch the full sequence for the given reference sequence ID.
    pub fn fetch_full_seq(&mut self, seqid: &str, buffer: &mut Vec<u8>) -> Result<()> {
        let index = self
            .index
            .get(seqid)
            .ok_or_else(|| eyre!("Reference sequence ID not found in the index: {}", seqid))?;

        let interval = Interval::new(0, self.lengths[*index])?;
        self.fetch_interval(seqid, &interval, buffer)
    }
}

impl<R: Read + Seek> IndexedReaderMutOp for IndexedReader<R> {
    fn fetch(&mut self, seqid: &str, interval: Interval<u64>, buffer: &mut Vec<u8>) -> Result<()> {
        Self::fetch_interval(self, seqid, &interval, buffer)
    }

    fn fetch_full_seq(&mut self, seqid: &str, buffer: &mut Vec<u8>) -> Result<()> {
        Self::fetch_full_seq(self, seqid, buffer)
    }

    fn seqlen(&self, seqid: &str) -> Option<u64> {
        self.index.get(seqid).map(|x| self.lengths[*x])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn genome() -> PathBuf {
        PathBuf::from(env!("SPLICEKIT_RESOURCES"))
            .join("fasta")
            .join("genome.fa")
    }

    #[test]
    fn test_indexed_fa() -> Result<()> {
        let path = genome();
        let mut reader = IndexedReader::from_path(&path, &decode::Config::infer_from_path(&path))?;
        assert_eq!(reader.seqlen("13"), Some(2000));
        assert_eq!(reader.seqlen("17"), Some(2000));
        assert_eq!(reader.seqlen("chr13"), None);

        let buffer = &mut Vec::new();
        for (seqid, interval, expected) in [
            ("13", 0..30, "TCTTATAAGAACCTCTGAAGTGTTGCTAGA"),
            // Crosses the line boundary
            ("13", 55..70, "GCAGGAATGACTACG"),
            ("17", 0..10, "TAACGTCTTC"),
            ("17", 1500..1505, "TAACA"),
            // The last bases of the file
            ("17", 1990..2000, "GAGAGCAGCT"),
        ] {
            reader.fetch(seqid, Interval::try_from(interval.clone())?, buffer)?;
            let fetched = String::from_utf8(buffer.clone())?;
            assert_eq!(fetched, expected, "ID: {}, Interval: {:?}", seqid, interval);
        }

        reader.fetch_full_seq("13", buffer)?;
        assert_eq!(buffer.len(), 2000);
        assert!(buffer.starts_with(b"TCTTATAAGAACCTCTGAAGTGTTGCTAGA"));

        // Invalid queries
        for (seqid, interval) in [("13", 0..2001), ("17", 2000..2010), ("1", 0..10)] {
            let interval = Interval::try_from(interval)?;
            let result = reader.fetch(seqid, interval, buffer);
            assert!(result.is_err(), "ID: {}, Interval: {:?}", seqid, interval);
        }
        Ok(())
    }

    #[test]
    fn test_fetch_stranded() -> Result<()> {
        let path = genome();
        let mut reader = IndexedReader::from_path(&path, &decode::Config::Raw)?;

        let buffer = &mut Vec::new();
        let interval = Interval::new(55, 70)?;
        reader.fetch_stranded("13", interval, Strand::Forward, buffer)?;
        assert_eq!(buffer, b"GCAGGAATGACTACG");

        reader.fetch_stranded("13", interval, Strand::Reverse, buffer)?;
        assert_eq!(buffer, b"CGTAGTCATTCCTGC");
        Ok(())
    }

    #[test]
    fn test_in_memory_index() -> Result<()> {
        let fasta = ">a\nACGT\nAC\n>b desc\nGGGG\n";
        let fai = "a\t6\t3\t4\t5\nb\t4\t19\t4\t5\n";
        let mut reader = IndexedReader::new(Cursor::new(fasta), Cursor::new(fai))?;
        assert_eq!(reader.ids(), &["a", "b"]);

        let buffer = &mut Vec::new();
        reader.fetch_full_seq("a", buffer)?;
        assert_eq!(buffer, b"ACGTAC");
        reader.fetch_interval("b", &Interval::new(1, 3)?, buffer)?;
        assert_eq!(buffer, b"GG");

        // Broken index lines
        for fai in ["a\t6\t3\t4\n", "a\t6\t3\t4\t4\n", "a\tx\t3\t4\t5\n", "a\t6\t3\t4\t5\t1\n"] {
            assert!(IndexedReader::new(Cursor::new(fasta), Cursor::new(fai)).is_err());
        }
        Ok(())
    }
}
