//! Selection and execution of concentration queries.
//!
//! The concentrations block is a dense 3-D array nested time → segment →
//! variable (fixed by the format). A query scans it once, forward only,
//! reading the selected cells and folding every contiguous run of
//! unselected cells into a single aggregated skip, so sparse selections
//! touch the file far fewer times than once per cell.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::concentrations::{CellGroup, Concentrations};
use crate::error::{BmdError, BmdResult};
use crate::layout::CONCENTRATION_SIZE;
use crate::model::{BmdSegment, BmdTimeStep, BmdVariable};
use crate::reader::BmdReader;

/// Progress callback: invoked once per scanned time step with
/// `(time steps scanned, total time steps)`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize);

/// A mutable builder selecting which (variable, segment, time step) cells to
/// read.
///
/// Selections accumulate; the `with_all_*` helpers replace the
/// corresponding selection with the full catalog range. The query borrows
/// the reader exclusively because execution moves its file cursor.
pub struct ConcentrationsQuery<'r> {
    reader: &'r mut BmdReader,
    variables: BTreeSet<usize>,
    segments: BTreeSet<usize>,
    time_steps: BTreeSet<usize>,
}

impl<'r> ConcentrationsQuery<'r> {
    pub(crate) fn new(reader: &'r mut BmdReader) -> Self {
        Self {
            reader,
            variables: BTreeSet::new(),
            segments: BTreeSet::new(),
            time_steps: BTreeSet::new(),
        }
    }

    /// Add the given variables to the selection.
    pub fn with_variables<'a>(
        mut self,
        variables: impl IntoIterator<Item = &'a BmdVariable>,
    ) -> Self {
        self.variables
            .extend(variables.into_iter().map(BmdVariable::index));
        self
    }

    /// Add the given variable indices to the selection.
    pub fn with_variable_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.variables.extend(indices);
        self
    }

    /// Select every variable in the file.
    pub fn with_all_variables(mut self) -> Self {
        self.variables = (0..self.reader.variables().len()).collect();
        self
    }

    /// Add the given segments to the selection.
    pub fn with_segments<'a>(
        mut self,
        segments: impl IntoIterator<Item = &'a BmdSegment>,
    ) -> Self {
        self.segments
            .extend(segments.into_iter().map(BmdSegment::index));
        self
    }

    /// Add the given segment indices to the selection.
    pub fn with_segment_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.segments.extend(indices);
        self
    }

    /// Select every segment in the file.
    pub fn with_all_segments(mut self) -> Self {
        self.segments = (0..self.reader.segments().len()).collect();
        self
    }

    /// Add the given time steps to the selection.
    pub fn with_time_steps<'a>(
        mut self,
        time_steps: impl IntoIterator<Item = &'a BmdTimeStep>,
    ) -> Self {
        self.time_steps
            .extend(time_steps.into_iter().map(BmdTimeStep::index));
        self
    }

    /// Add the given time-step indices to the selection.
    pub fn with_time_step_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.time_steps.extend(indices);
        self
    }

    /// Select every time step in the file.
    pub fn with_all_time_steps(mut self) -> Self {
        self.time_steps = (0..self.reader.time_steps().len()).collect();
        self
    }

    /// Check that every selection is non-empty and within the catalog range.
    pub fn validate(&self) -> BmdResult<()> {
        Self::validate_selection(&self.variables, self.reader.variables().len(), "variable")?;
        Self::validate_selection(&self.segments, self.reader.segments().len(), "segment")?;
        Self::validate_selection(&self.time_steps, self.reader.time_steps().len(), "time step")
    }

    fn validate_selection(selection: &BTreeSet<usize>, size: usize, what: &str) -> BmdResult<()> {
        if selection.is_empty() {
            return Err(BmdError::InvalidQuery(format!("no {what}s specified")));
        }
        if let Some(&max) = selection.iter().next_back() {
            if max >= size {
                return Err(BmdError::InvalidQuery(format!(
                    "{what} index {max} is out of range (file has {size})"
                )));
            }
        }
        Ok(())
    }

    /// Execute the query without progress reporting or cancellation.
    pub fn execute(self) -> BmdResult<Concentrations> {
        self.execute_monitored(None, None)
    }

    /// Execute the query.
    ///
    /// `progress` is invoked once per scanned time step. `cancel` is polled
    /// once per scanned time step; when it reads true the scan stops early
    /// and whatever was collected so far is returned as a partial result.
    pub fn execute_monitored(
        self,
        mut progress: Option<ProgressFn<'_>>,
        cancel: Option<&AtomicBool>,
    ) -> BmdResult<Concentrations> {
        self.validate()?;

        let num_times = self.reader.time_steps().len();
        let num_segments = self.reader.segments().len();
        let num_vars = self.reader.variables().len();
        debug!(
            "querying {} of {} variables, {} of {} segments, {} of {} time steps",
            self.variables.len(),
            num_vars,
            self.segments.len(),
            num_segments,
            self.time_steps.len(),
            num_times,
        );

        // Snapshot the catalog handles before taking the cursor; these are
        // Arc clones, not copies of the entities.
        let variables = self.reader.variables().to_vec();
        let segments = self.reader.segments().to_vec();
        let time_steps = self.reader.time_steps().to_vec();

        let concentrations_location = self.reader.layout().concentrations;
        let dis = self.reader.stream_mut();
        dis.seek(concentrations_location)?;

        let mut cells: BTreeMap<(usize, usize), CellGroup> = BTreeMap::new();
        let mut matched_times: BTreeSet<usize> = BTreeSet::new();
        let mut skip_bytes = 0u64;

        'scan: for time_num in 0..num_times {
            for segment_num in 0..num_segments {
                for variable_num in 0..num_vars {
                    let selected = self.variables.contains(&variable_num)
                        && self.segments.contains(&segment_num)
                        && self.time_steps.contains(&time_num);
                    if !selected {
                        // Equivalent of reading one float.
                        skip_bytes += CONCENTRATION_SIZE;
                        continue;
                    }

                    if skip_bytes > 0 {
                        let skipped = dis.skip_aggressively(skip_bytes)?;
                        if skipped != skip_bytes {
                            return Err(BmdError::InvalidFormat(format!(
                                "unable to continue reading from the file \
                                 (tried to skip {skip_bytes} bytes, but could only skip {skipped})"
                            )));
                        }
                        skip_bytes = 0;
                    }

                    let value = dis.read_f32()?;
                    let variable = &variables[variable_num];
                    let segment = &segments[segment_num];
                    let time_step = &time_steps[time_num];
                    cells
                        .entry((variable_num, segment_num))
                        .or_insert_with(|| CellGroup::new(variable.clone(), segment.clone()))
                        .insert(time_step.clone(), value);
                    matched_times.insert(time_num);
                }
            }

            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    debug!("query cancelled after {} of {} time steps", time_num + 1, num_times);
                    break 'scan;
                }
            }
            if let Some(report) = progress.as_mut() {
                report(time_num + 1, num_times);
            }
        }

        let matched_variables: BTreeSet<usize> = cells.keys().map(|&(v, _)| v).collect();
        let matched_segments: BTreeSet<usize> = cells.keys().map(|&(_, s)| s).collect();
        let result_variables: Vec<Arc<BmdVariable>> = variables
            .iter()
            .filter(|v| matched_variables.contains(&v.index()))
            .cloned()
            .collect();
        let result_segments: Vec<Arc<BmdSegment>> = segments
            .iter()
            .filter(|s| matched_segments.contains(&s.index()))
            .cloned()
            .collect();
        let result_time_steps: Vec<Arc<BmdTimeStep>> = time_steps
            .iter()
            .filter(|t| matched_times.contains(&t.index()))
            .cloned()
            .collect();

        Ok(Concentrations::new(
            result_variables,
            result_segments,
            result_time_steps,
            cells,
        ))
    }
}
