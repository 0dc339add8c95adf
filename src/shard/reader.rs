use flate2::read::ZlibDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

use super::{masked_crc, Compression, ImageEntity, ShardError, CRC_BYTES, LENGTH_BYTES};

/// Records larger than this are read incrementally instead of preallocated
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Iterates the raw record payloads of a TFRecord stream
pub struct RecordReader<R> {
    inner: R,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    /// Read the next record payload, or `None` at a clean end of stream
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>, ShardError> {
        if self.done {
            return Ok(None);
        }

        let mut header = [0u8; LENGTH_BYTES];
        let got = read_full(&mut self.inner, &mut header)?;
        if got == 0 {
            self.done = true;
            return Ok(None);
        }
        if got < LENGTH_BYTES {
            return Err(ShardError::Truncated {
                expected: LENGTH_BYTES,
                actual: got,
            });
        }

        self.verify_crc("length", &header)?;

        let stored_len = u64::from_le_bytes(header);
        let len = usize::try_from(stored_len).map_err(|_| ShardError::RecordTooLarge(stored_len))?;
        let mut data = Vec::with_capacity(len.min(MAX_PREALLOC));
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut data)?;
        if got < len {
            return Err(ShardError::Truncated {
                expected: len,
                actual: got,
            });
        }

        self.verify_crc("data", &data)?;

        Ok(Some(data))
    }

    fn verify_crc(&mut self, section: &'static str, bytes: &[u8]) -> Result<(), ShardError> {
        let mut stored = [0u8; CRC_BYTES];
        let got = read_full(&mut self.inner, &mut stored)?;
        if got < CRC_BYTES {
            return Err(ShardError::Truncated {
                expected: CRC_BYTES,
                actual: got,
            });
        }

        let stored = u32::from_le_bytes(stored);
        let computed = masked_crc(bytes);
        if stored != computed {
            return Err(ShardError::Checksum {
                section,
                stored,
                computed,
            });
        }
        Ok(())
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>, ShardError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                // A framing error leaves the stream position undefined
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Lazily decodes the image entities of one shard
pub struct ShardReader<R> {
    records: RecordReader<R>,
}

impl<R: Read> ShardReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            records: RecordReader::new(inner),
        }
    }
}

impl<R: Read> Iterator for ShardReader<R> {
    type Item = Result<ImageEntity, ShardError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.and_then(|bytes| ImageEntity::decode(&bytes)))
    }
}

/// Open a shard file for reading, through a zlib layer when requested
///
/// With zlib enabled the stream header is checked up front, so a shard that is
/// not zlib data fails here instead of on the first record.
pub fn open_shard(
    path: &Path,
    compression: Compression,
) -> io::Result<ShardReader<Box<dyn Read + Send>>> {
    let mut file = BufReader::new(File::open(path)?);

    let inner: Box<dyn Read + Send> = match compression {
        Compression::Zlib => {
            check_zlib_header(&mut file)?;
            Box::new(ZlibDecoder::new(file))
        }
        Compression::None => Box::new(file),
    };

    Ok(ShardReader::new(inner))
}

/// Peek at the 2-byte zlib header (RFC 1950) without consuming it
fn check_zlib_header<R: BufRead>(reader: &mut R) -> io::Result<()> {
    let head = reader.fill_buf()?;
    if head.len() < 2 {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            "zlib: missing stream header",
        ));
    }

    let (cmf, flg) = (head[0], head[1]);
    let deflate = cmf & 0x0f == 8 && cmf >> 4 <= 7;
    let checksum_ok = (u16::from(cmf) * 256 + u16::from(flg)) % 31 == 0;

    if !deflate || !checksum_ok {
        return Err(io::Error::new(ErrorKind::InvalidData, "zlib: invalid header"));
    }
    if flg & 0x20 != 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "zlib: preset dictionaries are not supported",
        ));
    }
    Ok(())
}

/// Fill `buf` as far as the stream allows, returning the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
