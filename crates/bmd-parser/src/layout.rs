//! Byte offsets of the blocks that follow the fixed header.
//!
//! Block order is fixed by the format: variable dictionary, concentrations,
//! times, per-variable min/max, per-variable-per-segment min/max, segment
//! names. Every offset is a running sum in 64-bit arithmetic so large files
//! cannot overflow the calculation.

use crate::header::{BmdHeader, HEADER_SIZE};

/// Bytes per variable name (single-octet chars).
pub const VARIABLE_NAME_SIZE: u64 = 18;

/// Bytes per variable units field (single-octet chars).
pub const VARIABLE_UNIT_SIZE: u64 = 12;

/// Bytes per segment name (single-octet chars).
pub const SEGMENT_NAME_SIZE: u64 = 15;

/// Bytes per concentration value (f32).
pub const CONCENTRATION_SIZE: u64 = 4;

/// Bytes per raw time value (f64).
pub const TIMESTAMP_SIZE: u64 = 8;

/// Absolute byte offsets of each block in a BMD file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// Variable dictionary (name + units records).
    pub variables: u64,
    /// Dense concentrations array, f32 per (time, segment, variable).
    pub concentrations: u64,
    /// Raw time values, f64 days since the seed date.
    pub times: u64,
    /// Per-variable (min, max) f32 pairs.
    pub variable_min_max: u64,
    /// Per-variable-per-segment (min, max) f32 pairs.
    pub variable_segment_min_max: u64,
    /// Segment names.
    pub segment_names: u64,
}

impl BlockLayout {
    /// Compute every block offset from the header's counts.
    pub fn from_header(header: &BmdHeader) -> Self {
        let num_vars = header.num_vars() as u64;
        let num_segments = header.num_segments() as u64;
        let num_times = header.num_times() as u64;

        let variables = HEADER_SIZE;
        let concentrations = variables + num_vars * (VARIABLE_NAME_SIZE + VARIABLE_UNIT_SIZE);
        let times = concentrations + num_vars * num_segments * num_times * CONCENTRATION_SIZE;
        let variable_min_max = times + num_times * TIMESTAMP_SIZE;
        let variable_segment_min_max = variable_min_max + num_vars * CONCENTRATION_SIZE * 2;
        let segment_names =
            variable_segment_min_max + num_vars * num_segments * CONCENTRATION_SIZE * 2;

        Self {
            variables,
            concentrations,
            times,
            variable_min_max,
            variable_segment_min_max,
            segment_names,
        }
    }
}
