use super::config::Config;
use eyre::{Result, WrapErr};
use noodles::bgzf;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub enum Stream<R: Read + Send + Sync + 'static> {
    Raw(R),
    Gzip(flate2::read::MultiGzDecoder<R>),
    Bgzf(bgzf::io::Reader<R>),
}

impl<R: Read + Send + Sync + 'static> Stream<R> {
    pub fn new(inner: R, config: &Config) -> Result<Self> {
        match config {
            Config::Raw => Ok(Stream::Raw(inner)),
            Config::Gzip => Ok(Stream::Gzip(flate2::read::MultiGzDecoder::new(inner))),
            Config::Bgzf => Ok(Stream::Bgzf(bgzf::io::Reader::new(inner))),
        }
    }

    pub fn boxed(self) -> Box<dyn Read + Send + Sync + 'static> {
        match self {
            Stream::Raw(r) => Box::new(r),
            Stream::Gzip(r) => Box::new(r),
            Stream::Bgzf(r) => Box::new(r),
        }
    }
}

impl Stream<File> {
    /// Open the file and wrap it into a decoder inferred from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).wrap_err_with(|| format!("Failed to open {}", path.display()))?;
        Self::new(file, &Config::infer_from_path(path))
    }
}

impl<R: Read + Send + Sync + 'static> Read for Stream<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Raw(r) => r.read(buf),
            Stream::Gzip(r) => r.read(buf),
            Stream::Bgzf(r) => r.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_gzip_stream() -> Result<()> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"##fileformat=VCFv4.2\n")?;
        let bytes = encoder.finish()?;

        let mut decoded = String::new();
        Stream::new(std::io::Cursor::new(bytes), &Config::Gzip)?
            .boxed()
            .read_to_string(&mut decoded)?;
        assert_eq!(decoded, "##fileformat=VCFv4.2\n");
        Ok(())
    }

    #[test]
    fn test_bgzf_stream() -> Result<()> {
        let mut writer = bgzf::io::Writer::new(Vec::new());
        writer.write_all(b">1\nACGT\n")?;
        let bytes = writer.finish()?;

        let mut decoded = String::new();
        Stream::new(std::io::Cursor::new(bytes), &Config::Bgzf)?.read_to_string(&mut decoded)?;
        assert_eq!(decoded, ">1\nACGT\n");
        Ok(())
    }
}
