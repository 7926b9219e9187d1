//! Common test utilities for bmd-parser tests.
//!
//! Provides a builder that assembles minimal synthetic BMD files with valid
//! structure, plus helpers for writing them to disk.

use std::collections::HashMap;
use std::io::Write;

use bmd_parser::ByteOrder;
use tempfile::NamedTempFile;

/// Deterministic fill value for a cell, unique per (variable, segment,
/// time) so tests can assert exact positions were read.
#[allow(dead_code)]
pub fn cell_value(variable: usize, segment: usize, time: usize) -> f32 {
    (time * 10_000 + segment * 100 + variable) as f32
}

/// Build a minimal BMD byte image with the specified catalog and values.
pub struct BmdFileBuilder {
    byte_order: ByteOrder,
    signature: String,
    source_type: String,
    producer: String,
    version: f32,
    old_seed_time: u32,
    seed_second: i32,
    seed_julian_day: i32,
    spaces: String,
    time_range: Option<(f64, f64)>,
    raw_num_segments: Option<i32>,
    variables: Vec<(String, String)>,
    segment_names: Vec<String>,
    write_segment_names: bool,
    times: Vec<f64>,
    value_overrides: HashMap<(usize, usize, usize), f32>,
}

#[allow(dead_code)]
impl BmdFileBuilder {
    /// A builder with defaults resembling a small WASP 8 run.
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrder::LittleEndian,
            signature: "BMD".to_string(),
            source_type: "W".to_string(),
            producer: "7".to_string(),
            version: 2.0,
            old_seed_time: 0,
            seed_second: 0,
            seed_julian_day: 0,
            spaces: " ".repeat(29),
            time_range: None,
            raw_num_segments: None,
            variables: Vec::new(),
            segment_names: Vec::new(),
            write_segment_names: true,
            times: Vec::new(),
            value_overrides: HashMap::new(),
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_old_seed_time(mut self, old_seed_time: u32) -> Self {
        self.old_seed_time = old_seed_time;
        self
    }

    pub fn with_seed_julian_day(mut self, seed_julian_day: i32) -> Self {
        self.seed_julian_day = seed_julian_day;
        self
    }

    pub fn with_seed_second(mut self, seed_second: i32) -> Self {
        self.seed_second = seed_second;
        self
    }

    pub fn with_variable(mut self, name: &str, units: &str) -> Self {
        assert!(name.len() <= 18, "variable name wider than its field");
        assert!(units.len() <= 12, "variable units wider than their field");
        self.variables.push((name.to_string(), units.to_string()));
        self
    }

    pub fn with_segment(mut self, name: &str) -> Self {
        assert!(name.len() <= 15, "segment name wider than its field");
        self.segment_names.push(name.to_string());
        self
    }

    pub fn with_segments(mut self, count: usize) -> Self {
        for display_num in 1..=count {
            self = self.with_segment(&format!("Seg {display_num}"));
        }
        self
    }

    /// Leave the segment-names block out of the file entirely, simulating a
    /// truncated file.
    pub fn without_segment_names_block(mut self) -> Self {
        self.write_segment_names = false;
        self
    }

    pub fn with_times(mut self, times: &[f64]) -> Self {
        self.times = times.to_vec();
        self
    }

    /// Override the header's start/end time fields (defaults derive from the
    /// time values).
    pub fn with_time_range(mut self, start: f64, end: f64) -> Self {
        self.time_range = Some((start, end));
        self
    }

    /// Write a corrupt segment count into the header while still sizing the
    /// blocks from the real catalog.
    pub fn with_raw_num_segments(mut self, raw: i32) -> Self {
        self.raw_num_segments = Some(raw);
        self
    }

    /// Plant a specific value at one (variable, segment, time) cell.
    pub fn with_value(mut self, variable: usize, segment: usize, time: usize, value: f32) -> Self {
        self.value_overrides.insert((variable, segment, time), value);
        self
    }

    fn value_at(&self, variable: usize, segment: usize, time: usize) -> f32 {
        self.value_overrides
            .get(&(variable, segment, time))
            .copied()
            .unwrap_or_else(|| cell_value(variable, segment, time))
    }

    fn put_i32(&self, buf: &mut Vec<u8>, v: i32) {
        match self.byte_order {
            ByteOrder::LittleEndian => buf.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::BigEndian => buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put_u32(&self, buf: &mut Vec<u8>, v: u32) {
        match self.byte_order {
            ByteOrder::LittleEndian => buf.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::BigEndian => buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put_f32(&self, buf: &mut Vec<u8>, v: f32) {
        match self.byte_order {
            ByteOrder::LittleEndian => buf.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::BigEndian => buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put_f64(&self, buf: &mut Vec<u8>, v: f64) {
        match self.byte_order {
            ByteOrder::LittleEndian => buf.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::BigEndian => buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put_fixed_chars(&self, buf: &mut Vec<u8>, text: &str, size: usize) {
        let bytes = text.as_bytes();
        assert!(bytes.len() <= size, "'{text}' wider than its {size}-byte field");
        buf.extend_from_slice(bytes);
        buf.resize(buf.len() + (size - bytes.len()), b' ');
    }

    /// Assemble the complete byte image.
    pub fn build(&self) -> Vec<u8> {
        let num_vars = self.variables.len();
        let num_segments = self.segment_names.len();
        let num_times = self.times.len();
        let (start_time, end_time) = self.time_range.unwrap_or_else(|| {
            (
                self.times.first().copied().unwrap_or(0.0),
                self.times.last().copied().unwrap_or(0.0),
            )
        });

        let mut buf = Vec::new();

        // Header, 78 bytes.
        self.put_fixed_chars(&mut buf, &self.signature, 3);
        self.put_fixed_chars(&mut buf, &self.source_type, 1);
        self.put_fixed_chars(&mut buf, &self.producer, 1);
        self.put_f32(&mut buf, self.version);
        self.put_u32(&mut buf, self.old_seed_time);
        self.put_i32(&mut buf, self.seed_second);
        self.put_i32(&mut buf, self.seed_julian_day);
        self.put_fixed_chars(&mut buf, &self.spaces, 29);
        self.put_i32(&mut buf, self.raw_num_segments.unwrap_or(num_segments as i32));
        self.put_i32(&mut buf, num_times as i32);
        self.put_i32(&mut buf, num_vars as i32);
        self.put_f64(&mut buf, start_time);
        self.put_f64(&mut buf, end_time);
        assert_eq!(buf.len(), 78);

        // Variable dictionary.
        for (name, units) in &self.variables {
            self.put_fixed_chars(&mut buf, name, 18);
            self.put_fixed_chars(&mut buf, units, 12);
        }

        // Concentrations, nested time -> segment -> variable.
        for time in 0..num_times {
            for segment in 0..num_segments {
                for variable in 0..num_vars {
                    self.put_f32(&mut buf, self.value_at(variable, segment, time));
                }
            }
        }

        // Raw times.
        for raw in &self.times {
            self.put_f64(&mut buf, *raw);
        }

        // Min/max per variable, over every cell of that variable.
        for variable in 0..num_vars {
            let (min, max) = self.min_max(variable, None, num_segments, num_times);
            self.put_f32(&mut buf, min);
            self.put_f32(&mut buf, max);
        }

        // Min/max per variable and segment.
        for variable in 0..num_vars {
            for segment in 0..num_segments {
                let (min, max) = self.min_max(variable, Some(segment), num_segments, num_times);
                self.put_f32(&mut buf, min);
                self.put_f32(&mut buf, max);
            }
        }

        // Segment names, possibly withheld to simulate truncation.
        if self.write_segment_names {
            for name in &self.segment_names {
                self.put_fixed_chars(&mut buf, name, 15);
            }
        }

        buf
    }

    fn min_max(
        &self,
        variable: usize,
        segment: Option<usize>,
        num_segments: usize,
        num_times: usize,
    ) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for time in 0..num_times {
            for seg in 0..num_segments {
                if segment.is_some_and(|only| only != seg) {
                    continue;
                }
                let value = self.value_at(variable, seg, time);
                min = min.min(value);
                max = max.max(value);
            }
        }
        if min > max {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }

    /// Write the image to a temp file with a `.bmd` suffix.
    pub fn write(&self) -> NamedTempFile {
        self.write_with_suffix(".bmd")
    }

    /// Write the image to a temp file with an arbitrary suffix.
    pub fn write_with_suffix(&self, suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("create temp file");
        file.write_all(&self.build()).expect("write BMD image");
        file.flush().expect("flush BMD image");
        file
    }
}

/// A small reference catalog shared by several suites: three variables,
/// three segments, four time steps, old-style 1997 seed time.
#[allow(dead_code)]
pub fn reference_builder() -> BmdFileBuilder {
    BmdFileBuilder::new()
        .with_old_seed_time(3_060_997_200)
        .with_variable("ALGAE", "mg/L")
        .with_variable("Distance (mi)", "mi")
        .with_variable("Hydraulic Depth", "ft")
        .with_segments(3)
        .with_times(&[169.0, 169.5, 170.0, 171.71])
}
