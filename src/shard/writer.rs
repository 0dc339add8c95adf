use flate2::write::ZlibEncoder;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::{masked_crc, Compression, ImageEntity};

/// Writes TFRecord-framed records to an underlying stream
pub struct RecordWriter<W: Write> {
    inner: W,
    records: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let len = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&len)?;
        self.inner.write_all(&masked_crc(&len).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&masked_crc(data).to_le_bytes())?;
        self.records += 1;
        Ok(())
    }

    pub fn write_image(&mut self, image: &ImageEntity) -> io::Result<()> {
        self.write_record(&image.encode())
    }

    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Flush and return the underlying stream
    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Write `images` as a complete shard file at `path`
pub fn write_shard(path: &Path, images: &[ImageEntity], compression: Compression) -> io::Result<()> {
    let file = BufWriter::new(File::create(path)?);

    match compression {
        Compression::Zlib => {
            let mut writer = RecordWriter::new(ZlibEncoder::new(file, flate2::Compression::default()));
            for image in images {
                writer.write_image(image)?;
            }
            writer.into_inner()?.finish()?.flush()
        }
        Compression::None => {
            let mut writer = RecordWriter::new(file);
            for image in images {
                writer.write_image(image)?;
            }
            writer.into_inner()?.flush()
        }
    }
}
