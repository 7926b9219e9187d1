//! Random-access binary reading over a BMD file.
//!
//! BMD files are dense fixed-layout binaries, so the reader is a buffered
//! cursor over the file with typed fixed-width reads. Multi-byte fields are
//! decoded according to the configured [`ByteOrder`]; WASP writes
//! little-endian output on every platform seen in the wild, but big-endian
//! files are accepted as a reader configuration.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::BmdResult;

/// Byte order used to interpret multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Least-significant byte first. BMD default.
    #[default]
    LittleEndian,
    /// Most-significant byte first.
    BigEndian,
}

/// A seekable, buffered cursor over a BMD file.
///
/// All reads advance the cursor. The cursor is not synchronized; callers
/// running concurrent queries over one reader must serialize access
/// themselves.
#[derive(Debug)]
pub struct SeekableReader {
    path: PathBuf,
    byte_order: ByteOrder,
    inner: BufReader<File>,
}

impl SeekableReader {
    /// Open the file at `path` with the cursor at offset 0.
    pub fn open<P: AsRef<Path>>(path: P, byte_order: ByteOrder) -> BmdResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            byte_order,
            inner: BufReader::new(file),
        })
    }

    /// The byte order this reader was opened with.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// The path of the underlying file.
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    fn read_array<const N: usize>(&mut self) -> BmdResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read `count` bytes, widening each byte 1:1 into a `char`.
    ///
    /// BMD string fields are single-octet characters, not UTF-8; bytes in
    /// 0x80..=0xFF map to the corresponding U+0080..=U+00FF code points.
    pub fn read_chars_as_ascii(&mut self, count: usize) -> BmdResult<String> {
        let mut buf = vec![0u8; count];
        self.inner.read_exact(&mut buf)?;
        Ok(buf.iter().map(|&b| b as char).collect())
    }

    /// Read `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> BmdResult<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a signed 16-bit integer.
    pub fn read_i16(&mut self) -> BmdResult<i16> {
        let b = self.read_array::<2>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => i16::from_le_bytes(b),
            ByteOrder::BigEndian => i16::from_be_bytes(b),
        })
    }

    /// Read a signed 32-bit integer.
    pub fn read_i32(&mut self) -> BmdResult<i32> {
        let b = self.read_array::<4>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => i32::from_le_bytes(b),
            ByteOrder::BigEndian => i32::from_be_bytes(b),
        })
    }

    /// Read a signed 64-bit integer.
    pub fn read_i64(&mut self) -> BmdResult<i64> {
        let b = self.read_array::<8>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => i64::from_le_bytes(b),
            ByteOrder::BigEndian => i64::from_be_bytes(b),
        })
    }

    /// Read an unsigned 32-bit integer.
    ///
    /// Returned as `u32` so values past `i32::MAX` (seen in real seed-time
    /// fields) cannot sign-wrap.
    pub fn read_u32(&mut self) -> BmdResult<u32> {
        let b = self.read_array::<4>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => u32::from_le_bytes(b),
            ByteOrder::BigEndian => u32::from_be_bytes(b),
        })
    }

    /// Read a 32-bit IEEE float.
    pub fn read_f32(&mut self) -> BmdResult<f32> {
        let b = self.read_array::<4>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => f32::from_le_bytes(b),
            ByteOrder::BigEndian => f32::from_be_bytes(b),
        })
    }

    /// Read a 64-bit IEEE float.
    pub fn read_f64(&mut self) -> BmdResult<f64> {
        let b = self.read_array::<8>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => f64::from_le_bytes(b),
            ByteOrder::BigEndian => f64::from_be_bytes(b),
        })
    }

    /// Reposition the cursor to an absolute byte offset.
    ///
    /// Backward seeks are allowed. Returns the offset reached.
    pub fn seek(&mut self, position: u64) -> BmdResult<u64> {
        Ok(self.inner.seek(SeekFrom::Start(position))?)
    }

    /// Skip forward `count` bytes, retrying partial skips until either the
    /// full count is consumed or no further progress can be made.
    ///
    /// Returns the number of bytes actually skipped; a short skip (for
    /// example at end of file) is not an error.
    pub fn skip_aggressively(&mut self, count: u64) -> BmdResult<u64> {
        let mut skipped = 0u64;
        while skipped < count {
            let n = std::io::copy(
                &mut (&mut self.inner).take(count - skipped),
                &mut std::io::sink(),
            )?;
            if n == 0 {
                break;
            }
            skipped += n;
        }
        Ok(skipped)
    }

    /// Release the underlying file handle. The reader is unusable afterwards.
    pub fn close(self) {}
}
