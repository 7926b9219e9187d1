//! Reading WASP BMD output files.
//!
//! A BMD file is laid out as:
//!
//! - header (78 bytes),
//! - variables (18 single-octet chars for name followed by 12 single-octet
//!   chars for units),
//! - concentrations (f32 values nested by time, segment, then variable),
//! - times (f64 days since the seed date),
//! - min/max per variable (f32 pairs),
//! - min/max per variable and segment (f32 pairs),
//! - segment names (15 single-octet chars each).
//!
//! Opening a file decodes everything except the concentrations block, which
//! is only touched by [`ConcentrationsQuery`] execution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{BmdError, BmdResult};
use crate::header::BmdHeader;
use crate::io::{ByteOrder, SeekableReader};
use crate::layout::{BlockLayout, SEGMENT_NAME_SIZE, VARIABLE_NAME_SIZE, VARIABLE_UNIT_SIZE};
use crate::model::{trim_field, BmdSegment, BmdTimeStep, BmdVariable};
use crate::query::ConcentrationsQuery;
use crate::time;

/// Reads WASP BMD output files.
///
/// Construct with [`BmdReader::open`]; a failed open never leaves a
/// half-initialized reader behind. The reader owns the decoded catalog
/// (variables, segments, time steps) for the lifetime of the open file and
/// hands out shared [`Arc`] references to it.
#[derive(Debug)]
pub struct BmdReader {
    dis: SeekableReader,
    file_path: PathBuf,
    header: BmdHeader,
    layout: BlockLayout,
    seed_date: DateTime<Utc>,
    variables: Vec<Arc<BmdVariable>>,
    segments: Vec<Arc<BmdSegment>>,
    time_steps: Vec<Arc<BmdTimeStep>>,
    min_over_vars: HashMap<String, f32>,
    max_over_vars: HashMap<String, f32>,
    min_over_var_segs: HashMap<(String, String), f32>,
    max_over_var_segs: HashMap<(String, String), f32>,
}

impl BmdReader {
    /// Open the BMD file at the provided path and decode its catalog.
    ///
    /// BMD files are little-endian unless produced on unusual hardware; use
    /// [`BmdReader::open_with_byte_order`] for the exceptions.
    pub fn open<P: AsRef<Path>>(path: P) -> BmdResult<Self> {
        Self::open_with_byte_order(path, ByteOrder::LittleEndian)
    }

    /// Open the BMD file at the provided path with an explicit byte order.
    pub fn open_with_byte_order<P: AsRef<Path>>(
        path: P,
        byte_order: ByteOrder,
    ) -> BmdResult<Self> {
        let path = path.as_ref();
        let is_bmd = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("bmd"))
            .unwrap_or(false);
        if !is_bmd {
            return Err(BmdError::InvalidFormat(format!(
                "BMD file required, but got {} instead",
                path.display()
            )));
        }

        debug!("opening {}", path.display());
        let mut dis = SeekableReader::open(path, byte_order)?;

        let header = BmdHeader::read(&mut dis)?;
        debug!("decoded header:\n{header}");

        let seed_date = time::seed_date(&header)?;
        debug!("seed date: {}", seed_date.format("%Y-%m-%d %H:%M:%S"));

        // Variable names and units.
        let mut variables = Vec::with_capacity(header.num_vars());
        for variable_num in 0..header.num_vars() {
            let name = dis.read_chars_as_ascii(VARIABLE_NAME_SIZE as usize)?;
            let units = dis.read_chars_as_ascii(VARIABLE_UNIT_SIZE as usize)?;
            let variable = BmdVariable::new(
                variable_num,
                trim_field(&name).to_string(),
                trim_field(&units).to_string(),
            );
            debug!(
                "variable #{}: '{}'; pcode: '{}'; units: '{}'",
                variable_num + 1,
                variable.name(),
                variable.pcode(),
                variable.units()
            );
            variables.push(Arc::new(variable));
        }

        // Once the dimensions are known, every remaining block offset is
        // derivable.
        let layout = BlockLayout::from_header(&header);
        debug!(
            "block offsets: concentrations={} times={} min/max vars={} min/max var-segs={} segment names={}",
            layout.concentrations,
            layout.times,
            layout.variable_min_max,
            layout.variable_segment_min_max,
            layout.segment_names
        );

        // Skip past concentrations and times; the summary tables and
        // segment names sit at the bottom of the file.
        dis.seek(layout.variable_min_max)?;

        let mut min_over_vars = HashMap::new();
        let mut max_over_vars = HashMap::new();
        for variable in &variables {
            let min = dis.read_f32()?;
            let max = dis.read_f32()?;
            min_over_vars.insert(variable.name().to_string(), min);
            max_over_vars.insert(variable.name().to_string(), max);
        }

        // Min/max per segment, read before segment names are known.
        let mut min_per_var_by_segment = Vec::with_capacity(header.num_vars());
        let mut max_per_var_by_segment = Vec::with_capacity(header.num_vars());
        for _ in 0..header.num_vars() {
            let mut mins = Vec::with_capacity(header.num_segments());
            let mut maxs = Vec::with_capacity(header.num_segments());
            for _ in 0..header.num_segments() {
                mins.push(dis.read_f32()?);
                maxs.push(dis.read_f32()?);
            }
            min_per_var_by_segment.push(mins);
            max_per_var_by_segment.push(maxs);
        }

        // Segment names might be absent or truncated; that is survivable.
        let segment_names = match read_segment_names(&mut dis, header.num_segments()) {
            Ok(names) => names,
            Err(error) => {
                warn!("unable to read segment names, synthesizing defaults: {error}");
                (1..=header.num_segments())
                    .map(|display_num| format!("Segment {display_num}"))
                    .collect()
            }
        };
        let segment_names = renumber_wasp7_segments(segment_names);
        let segments: Vec<Arc<BmdSegment>> = segment_names
            .into_iter()
            .enumerate()
            .map(|(segment_num, name)| {
                debug!("segment #{}: '{}'", segment_num + 1, name);
                Arc::new(BmdSegment::new(segment_num, name))
            })
            .collect();

        // Re-key the per-segment min/max now that names are final.
        let mut min_over_var_segs = HashMap::new();
        let mut max_over_var_segs = HashMap::new();
        for (variable_num, variable) in variables.iter().enumerate() {
            for (segment_num, segment) in segments.iter().enumerate() {
                let key = (variable.name().to_string(), segment.name().to_string());
                min_over_var_segs.insert(key.clone(), min_per_var_by_segment[variable_num][segment_num]);
                max_over_var_segs.insert(key, max_per_var_by_segment[variable_num][segment_num]);
            }
        }

        // Times.
        dis.seek(layout.times)?;
        let mut time_steps = Vec::with_capacity(header.num_times());
        for time_num in 0..header.num_times() {
            let raw = dis.read_f64()?;
            let instant = time::time_step_instant(seed_date, raw)?;
            time_steps.push(Arc::new(BmdTimeStep::new(time_num, instant, raw)));
        }
        if let (Some(first), Some(last)) = (time_steps.first(), time_steps.last()) {
            debug!("time steps: {} to {}", first, last);
        }

        Ok(Self {
            dis,
            file_path: path.to_path_buf(),
            header,
            layout,
            seed_date,
            variables,
            segments,
            time_steps,
            min_over_vars,
            max_over_vars,
            min_over_var_segs,
            max_over_var_segs,
        })
    }

    /// The opened file path.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The decoded file header.
    pub fn header(&self) -> &BmdHeader {
        &self.header
    }

    /// The seed date every time value in the file is relative to.
    pub fn seed_date(&self) -> DateTime<Utc> {
        self.seed_date
    }

    /// The decoded variables, in file order.
    pub fn variables(&self) -> &[Arc<BmdVariable>] {
        &self.variables
    }

    /// The decoded segments, in file order.
    pub fn segments(&self) -> &[Arc<BmdSegment>] {
        &self.segments
    }

    /// The decoded time steps, in file order.
    pub fn time_steps(&self) -> &[Arc<BmdTimeStep>] {
        &self.time_steps
    }

    /// Minimum recorded value for the named variable.
    ///
    /// The summary tables are keyed by variable name; when a file carries
    /// duplicate variable names the later entry wins in these lookups.
    pub fn variable_min(&self, variable_name: &str) -> BmdResult<f32> {
        self.min_over_vars
            .get(variable_name)
            .copied()
            .ok_or_else(|| {
                BmdError::NotFound(format!("no minimum recorded for variable '{variable_name}'"))
            })
    }

    /// Maximum recorded value for the named variable.
    pub fn variable_max(&self, variable_name: &str) -> BmdResult<f32> {
        self.max_over_vars
            .get(variable_name)
            .copied()
            .ok_or_else(|| {
                BmdError::NotFound(format!("no maximum recorded for variable '{variable_name}'"))
            })
    }

    /// Minimum recorded value for the named variable within the named
    /// segment.
    pub fn variable_segment_min(
        &self,
        variable_name: &str,
        segment_name: &str,
    ) -> BmdResult<f32> {
        self.min_over_var_segs
            .get(&(variable_name.to_string(), segment_name.to_string()))
            .copied()
            .ok_or_else(|| {
                BmdError::NotFound(format!(
                    "no minimum recorded for variable '{variable_name}' in segment '{segment_name}'"
                ))
            })
    }

    /// Maximum recorded value for the named variable within the named
    /// segment.
    pub fn variable_segment_max(
        &self,
        variable_name: &str,
        segment_name: &str,
    ) -> BmdResult<f32> {
        self.max_over_var_segs
            .get(&(variable_name.to_string(), segment_name.to_string()))
            .copied()
            .ok_or_else(|| {
                BmdError::NotFound(format!(
                    "no maximum recorded for variable '{variable_name}' in segment '{segment_name}'"
                ))
            })
    }

    /// Construct a new, empty query for concentrations.
    pub fn new_query(&mut self) -> ConcentrationsQuery<'_> {
        ConcentrationsQuery::new(self)
    }

    /// Close the reader, releasing the underlying file handle.
    pub fn close(self) {
        self.dis.close();
    }

    pub(crate) fn stream_mut(&mut self) -> &mut SeekableReader {
        &mut self.dis
    }

    pub(crate) fn layout(&self) -> BlockLayout {
        self.layout
    }
}

fn read_segment_names(dis: &mut SeekableReader, count: usize) -> BmdResult<Vec<String>> {
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = dis.read_chars_as_ascii(SEGMENT_NAME_SIZE as usize)?;
        names.push(trim_field(&raw).to_string());
    }
    Ok(names)
}

/// WASP 7.x wrote segment names without their K layer, so 3-D grids carry
/// duplicate `I=iii J=jjj` names. WASP writes the top layer first (highest
/// K) and works down to K=1, so a J value that fails to increase marks the
/// start of the next layer down. Candidates are rewritten into the WASP 8
/// form `I=iiiJ=jjjK=kkk`; anything else is left alone.
fn renumber_wasp7_segments(names: Vec<String>) -> Vec<String> {
    let first_is_candidate = names
        .first()
        .map(|name| parse_ij_name(name).is_some())
        .unwrap_or(false);
    if !first_is_candidate {
        return names;
    }

    // First pass counts the layer starts to learn the highest K.
    let mut k_max = 0u32;
    let mut last_j: Option<u32> = None;
    for name in &names {
        let Some((_, j)) = parse_ij_name(name) else {
            continue;
        };
        if last_j.map_or(true, |last| j <= last) {
            k_max += 1;
        }
        last_j = Some(j);
    }

    // Second pass assigns K, decrementing at each layer start.
    let mut k = k_max + 1;
    let mut last_j: Option<u32> = None;
    names
        .into_iter()
        .map(|name| match parse_ij_name(&name) {
            None => name,
            Some((i, j)) => {
                if last_j.map_or(true, |last| j <= last) {
                    k -= 1;
                }
                last_j = Some(j);
                format!("I={i:03}J={j:03}K={k:03}")
            }
        })
        .collect()
}

/// Parse a WASP 7 layer-less segment name into its (I, J) values.
///
/// Accepts both the spaced `"I=001 J=002"` and compact `"I=001J=002"` forms
/// (2 to 3 `=`-separated fields with numeric I and J values); WASP 8 names
/// carrying a K field split into 4 and are not candidates.
fn parse_ij_name(name: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = name.split('=').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let i = leading_number(parts.get(1)?)?;
    let j = leading_number(parts.get(2)?)?;
    Some((i, j))
}

fn leading_number(s: &str) -> Option<u32> {
    let digits: &str = s
        .trim_start()
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("");
    digits.parse().ok()
}
