//! The fixed 78-byte BMD header.
//!
//! Header layout (offsets in bytes, multi-byte fields in the file's byte
//! order):
//!
//! | Field            | Offset | Size |
//! |------------------|--------|------|
//! | signature        | 0      | 3    |
//! | source type      | 3      | 1    |
//! | producer         | 4      | 1    |
//! | version (f32)    | 5      | 4    |
//! | old seed time    | 9      | 4    |
//! | seed second      | 13     | 4    |
//! | seed julian day  | 17     | 4    |
//! | reserved spaces  | 21     | 29   |
//! | num segments     | 50     | 4    |
//! | num times        | 54     | 4    |
//! | num vars         | 58     | 4    |
//! | start time (f64) | 62     | 8    |
//! | end time (f64)   | 70     | 8    |

use std::fmt;

use crate::error::{BmdError, BmdResult};
use crate::io::SeekableReader;

/// Total size of the fixed header; the variable dictionary starts here.
pub const HEADER_SIZE: u64 = 78;

/// Size of the reserved padding field.
pub const SPACES_SIZE: usize = 29;

/// The decoded BMD header.
///
/// Instances are only obtainable through [`BmdHeader::builder`], which
/// validates every field atomically; no partially-valid header is
/// observable.
#[derive(Debug, Clone, PartialEq)]
pub struct BmdHeader {
    signature: String,
    source_type: String,
    producer: String,
    version: f32,
    old_seed_time: u32,
    seed_second: i32,
    seed_julian_day: i32,
    spaces: String,
    num_segments: i32,
    num_times: i32,
    num_vars: i32,
    start_time: f64,
    end_time: f64,
}

impl BmdHeader {
    /// Create a new, empty builder.
    pub fn builder() -> BmdHeaderBuilder {
        BmdHeaderBuilder::default()
    }

    /// Decode the header from a reader positioned at offset 0.
    ///
    /// Field order mirrors the on-disk layout and must not be reordered.
    pub(crate) fn read(dis: &mut SeekableReader) -> BmdResult<Self> {
        let signature = dis.read_chars_as_ascii(3)?;
        let source_type = dis.read_chars_as_ascii(1)?;
        let producer = dis.read_chars_as_ascii(1)?;
        let version = dis.read_f32()?;
        let old_seed_time = dis.read_u32()?;
        let seed_second = dis.read_i32()?;
        let seed_julian_day = dis.read_i32()?;
        let spaces = dis.read_chars_as_ascii(SPACES_SIZE)?;
        let num_segments = dis.read_i32()?;
        let num_times = dis.read_i32()?;
        let num_vars = dis.read_i32()?;
        let start_time = dis.read_f64()?;
        let end_time = dis.read_f64()?;

        Self::builder()
            .with_signature(signature)
            .with_source_type(source_type)
            .with_producer(producer)
            .with_version(version)
            .with_old_seed_time(old_seed_time)
            .with_seed_second(seed_second)
            .with_seed_julian_day(seed_julian_day)
            .with_spaces(spaces)
            .with_num_segments(num_segments)
            .with_num_times(num_times)
            .with_num_vars(num_vars)
            .with_start_time(start_time)
            .with_end_time(end_time)
            .build()
            .map_err(|e| {
                let reason = match e {
                    BmdError::InvalidFormat(reason) => reason,
                    other => other.to_string(),
                };
                BmdError::InvalidFormat(format!(
                    "unable to read header from {}: {reason}",
                    dis.file_path().display()
                ))
            })
    }

    /// The signature field, 3 characters.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The source type field, 1 character.
    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    /// The producer field, 1 character.
    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// The format version field.
    pub fn version(&self) -> f32 {
        self.version
    }

    /// Seconds since 1901-01-01T00:00:00 UTC in older files; 0 if unused.
    pub fn old_seed_time(&self) -> u32 {
        self.old_seed_time
    }

    /// Second-of-day component of the julian-day seed encoding.
    pub fn seed_second(&self) -> i32 {
        self.seed_second
    }

    /// Julian day component of the newer seed encoding; 0 if unused.
    pub fn seed_julian_day(&self) -> i32 {
        self.seed_julian_day
    }

    /// The reserved padding field.
    pub fn spaces(&self) -> &str {
        &self.spaces
    }

    /// Number of segments in the file.
    pub fn num_segments(&self) -> usize {
        self.num_segments as usize
    }

    /// Number of time steps in the file.
    pub fn num_times(&self) -> usize {
        self.num_times as usize
    }

    /// Number of variables in the file.
    pub fn num_vars(&self) -> usize {
        self.num_vars as usize
    }

    /// Start time in days since the seed date.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// End time in days since the seed date.
    pub fn end_time(&self) -> f64 {
        self.end_time
    }
}

impl fmt::Display for BmdHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "signature: {}", self.signature)?;
        writeln!(f, "source type: {}", self.source_type)?;
        writeln!(f, "producer: {}", self.producer)?;
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "old seed time: {}", self.old_seed_time)?;
        writeln!(f, "seed second: {}", self.seed_second)?;
        writeln!(f, "seed julian day: {}", self.seed_julian_day)?;
        writeln!(f, "num segments: {}", self.num_segments)?;
        writeln!(f, "num times: {}", self.num_times)?;
        writeln!(f, "num vars: {}", self.num_vars)?;
        writeln!(f, "start time: {}", self.start_time)?;
        write!(f, "end time: {}", self.end_time)
    }
}

/// Builds and validates [`BmdHeader`] instances.
#[derive(Debug, Default)]
pub struct BmdHeaderBuilder {
    signature: String,
    source_type: String,
    producer: String,
    version: f32,
    old_seed_time: u32,
    seed_second: i32,
    seed_julian_day: i32,
    spaces: String,
    num_segments: i32,
    num_times: i32,
    num_vars: i32,
    start_time: f64,
    end_time: f64,
}

impl BmdHeaderBuilder {
    /// Set the signature, a 3-character string.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Set the source type, a 1-character string.
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = source_type.into();
        self
    }

    /// Set the producer, a 1-character string.
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    /// Set the format version.
    pub fn with_version(mut self, version: f32) -> Self {
        self.version = version;
        self
    }

    /// Set the old seed time (seconds since 1901-01-01 UTC, 0 if unused).
    pub fn with_old_seed_time(mut self, old_seed_time: u32) -> Self {
        self.old_seed_time = old_seed_time;
        self
    }

    /// Set the seed second-of-day.
    pub fn with_seed_second(mut self, seed_second: i32) -> Self {
        self.seed_second = seed_second;
        self
    }

    /// Set the seed julian day (0 if unused).
    pub fn with_seed_julian_day(mut self, seed_julian_day: i32) -> Self {
        self.seed_julian_day = seed_julian_day;
        self
    }

    /// Set the reserved padding field.
    pub fn with_spaces(mut self, spaces: impl Into<String>) -> Self {
        self.spaces = spaces.into();
        self
    }

    /// Set the number of segments.
    pub fn with_num_segments(mut self, num_segments: i32) -> Self {
        self.num_segments = num_segments;
        self
    }

    /// Set the number of time steps.
    pub fn with_num_times(mut self, num_times: i32) -> Self {
        self.num_times = num_times;
        self
    }

    /// Set the number of variables.
    pub fn with_num_vars(mut self, num_vars: i32) -> Self {
        self.num_vars = num_vars;
        self
    }

    /// Set the start time (days since the seed date).
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the end time (days since the seed date).
    pub fn with_end_time(mut self, end_time: f64) -> Self {
        self.end_time = end_time;
        self
    }

    /// Validate every field and produce the header, or the first violation.
    pub fn build(self) -> BmdResult<BmdHeader> {
        if self.signature.chars().count() != 3 {
            return Err(BmdError::InvalidFormat(
                "signature field must be 3 characters".to_string(),
            ));
        }
        if self.source_type.chars().count() != 1 {
            return Err(BmdError::InvalidFormat(
                "source type field must be 1 character".to_string(),
            ));
        }
        if self.producer.chars().count() != 1 {
            return Err(BmdError::InvalidFormat(
                "producer field must be 1 character".to_string(),
            ));
        }
        if self.seed_second < 0 {
            return Err(BmdError::InvalidFormat(
                "seed second field must be at least 0".to_string(),
            ));
        }
        if self.seed_julian_day < 0 {
            return Err(BmdError::InvalidFormat(
                "seed julian day field must be at least 0".to_string(),
            ));
        }
        if self.spaces.chars().count() != SPACES_SIZE {
            return Err(BmdError::InvalidFormat(format!(
                "spaces field must be {SPACES_SIZE} characters"
            )));
        }
        if self.num_segments < 0 {
            return Err(BmdError::InvalidFormat(
                "number of segments field must be at least 0".to_string(),
            ));
        }
        if self.num_times < 0 {
            return Err(BmdError::InvalidFormat(
                "number of times field must be at least 0".to_string(),
            ));
        }
        if self.num_vars < 0 {
            return Err(BmdError::InvalidFormat(
                "number of variables field must be at least 0".to_string(),
            ));
        }
        if !(self.start_time >= 0.0) {
            return Err(BmdError::InvalidFormat(
                "start time field must be at least 0".to_string(),
            ));
        }
        if !(self.end_time >= self.start_time) {
            return Err(BmdError::InvalidFormat(
                "end time field must be greater than or equal to start time".to_string(),
            ));
        }

        Ok(BmdHeader {
            signature: self.signature,
            source_type: self.source_type,
            producer: self.producer,
            version: self.version,
            old_seed_time: self.old_seed_time,
            seed_second: self.seed_second,
            seed_julian_day: self.seed_julian_day,
            spaces: self.spaces,
            num_segments: self.num_segments,
            num_times: self.num_times,
            num_vars: self.num_vars,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_builder() -> BmdHeaderBuilder {
        BmdHeader::builder()
            .with_signature("BMD")
            .with_source_type("W")
            .with_producer("7")
            .with_version(2.0)
            .with_spaces(" ".repeat(SPACES_SIZE))
            .with_num_segments(4)
            .with_num_times(10)
            .with_num_vars(2)
            .with_start_time(169.0)
            .with_end_time(171.71)
    }

    #[test]
    fn builds_valid_header() {
        let header = valid_builder().build().unwrap();
        assert_eq!(header.signature(), "BMD");
        assert_eq!(header.num_segments(), 4);
        assert_eq!(header.num_times(), 10);
        assert_eq!(header.num_vars(), 2);
        assert!(header.end_time() >= header.start_time());
        assert!(header.start_time() >= 0.0);
    }

    #[test]
    fn rejects_wrong_signature_length() {
        let err = valid_builder().with_signature("BM").build().unwrap_err();
        assert!(err.to_string().contains("signature field must be 3 characters"));
    }

    #[test]
    fn rejects_wrong_producer_length() {
        let err = valid_builder().with_producer("ab").build().unwrap_err();
        assert!(err.to_string().contains("producer field must be 1 character"));
    }

    #[test]
    fn rejects_wrong_source_type_length() {
        let err = valid_builder().with_source_type("").build().unwrap_err();
        assert!(err.to_string().contains("source type field must be 1 character"));
    }

    #[test]
    fn rejects_wrong_spaces_length() {
        let err = valid_builder().with_spaces("   ").build().unwrap_err();
        assert!(err.to_string().contains("spaces field"));
    }

    #[test]
    fn rejects_negative_counts() {
        assert!(valid_builder().with_num_segments(-1).build().is_err());
        assert!(valid_builder().with_num_times(-1).build().is_err());
        assert!(valid_builder().with_num_vars(-5).build().is_err());
    }

    #[test]
    fn rejects_negative_seed_fields() {
        assert!(valid_builder().with_seed_second(-1).build().is_err());
        assert!(valid_builder().with_seed_julian_day(-1).build().is_err());
    }

    #[test]
    fn rejects_negative_start_time() {
        assert!(valid_builder().with_start_time(-0.5).build().is_err());
    }

    #[test]
    fn rejects_end_time_before_start_time() {
        let err = valid_builder()
            .with_start_time(10.0)
            .with_end_time(9.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("end time"));
    }

    #[test]
    fn accepts_zero_count_file() {
        let header = valid_builder()
            .with_num_segments(0)
            .with_num_times(0)
            .with_num_vars(0)
            .with_start_time(0.0)
            .with_end_time(0.0)
            .build()
            .unwrap();
        assert_eq!(header.num_segments(), 0);
    }

    #[test]
    fn counts_chars_not_bytes_in_fixed_fields() {
        // Single-octet chars past 0x7F widen to multi-byte UTF-8 in memory
        // but still count as one header character each.
        let header = valid_builder().with_producer("\u{c9}").build().unwrap();
        assert_eq!(header.producer(), "\u{c9}");
    }
}
