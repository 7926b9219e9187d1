//! Query results: an immutable snapshot of matched concentration cells.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{BmdError, BmdResult};
use crate::model::{BmdSegment, BmdTimeStep, BmdVariable, Concentration};

/// Matched cells for one (variable, segment) pair, keyed by time-step index.
#[derive(Debug)]
pub(crate) struct CellGroup {
    variable: Arc<BmdVariable>,
    segment: Arc<BmdSegment>,
    values: BTreeMap<usize, (Arc<BmdTimeStep>, f32)>,
}

impl CellGroup {
    pub(crate) fn new(variable: Arc<BmdVariable>, segment: Arc<BmdSegment>) -> Self {
        Self {
            variable,
            segment,
            values: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, time_step: Arc<BmdTimeStep>, value: f32) {
        self.values.insert(time_step.index(), (time_step, value));
    }
}

/// The immutable result of a concentrations query.
///
/// Contains exactly the variables, segments, and time steps that had at
/// least one matched cell, shares the reader's catalog entities rather than
/// copying them, and iterates deterministically: (variable, segment) groups
/// in ascending index order, time steps ascending within each group.
#[derive(Debug)]
pub struct Concentrations {
    variables: Vec<Arc<BmdVariable>>,
    segments: Vec<Arc<BmdSegment>>,
    time_steps: Vec<Arc<BmdTimeStep>>,
    cells: BTreeMap<(usize, usize), CellGroup>,
    len: usize,
}

impl Concentrations {
    pub(crate) fn new(
        variables: Vec<Arc<BmdVariable>>,
        segments: Vec<Arc<BmdSegment>>,
        time_steps: Vec<Arc<BmdTimeStep>>,
        cells: BTreeMap<(usize, usize), CellGroup>,
    ) -> Self {
        let len = cells.values().map(|group| group.values.len()).sum();
        Self {
            variables,
            segments,
            time_steps,
            cells,
            len,
        }
    }

    /// Variables that matched at least one cell, in file order.
    pub fn variables(&self) -> &[Arc<BmdVariable>] {
        &self.variables
    }

    /// Segments that matched at least one cell, in file order.
    pub fn segments(&self) -> &[Arc<BmdSegment>] {
        &self.segments
    }

    /// Time steps that matched at least one cell, in file order.
    pub fn time_steps(&self) -> &[Arc<BmdTimeStep>] {
        &self.time_steps
    }

    /// Number of matched cells.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no cells matched (only possible after cancellation).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Look up the concentration for an exact (variable, segment, time step)
    /// combination.
    pub fn get(
        &self,
        variable: &BmdVariable,
        segment: &BmdSegment,
        time_step: &BmdTimeStep,
    ) -> BmdResult<Concentration> {
        let group = self
            .cells
            .get(&(variable.index(), segment.index()))
            .ok_or_else(|| {
                BmdError::NotFound(format!(
                    "no concentrations for variable '{}' and segment '{}'",
                    variable.name(),
                    segment.name()
                ))
            })?;
        let (step, value) = group.values.get(&time_step.index()).ok_or_else(|| {
            BmdError::NotFound(format!(
                "no concentration at time step {} for variable '{}' and segment '{}'",
                time_step.index(),
                variable.name(),
                segment.name()
            ))
        })?;
        Ok(Concentration::new(
            group.variable.clone(),
            group.segment.clone(),
            step.clone(),
            *value,
        ))
    }

    /// Iterate over every matched concentration.
    pub fn iter(&self) -> ConcentrationsIter<'_> {
        ConcentrationsIter {
            groups: self.cells.values(),
            current: None,
        }
    }
}

impl<'a> IntoIterator for &'a Concentrations {
    type Item = Concentration;
    type IntoIter = ConcentrationsIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy, single-pass iterator over the grouped result cells.
#[derive(Debug)]
pub struct ConcentrationsIter<'a> {
    groups: btree_map::Values<'a, (usize, usize), CellGroup>,
    current: Option<(
        &'a CellGroup,
        btree_map::Values<'a, usize, (Arc<BmdTimeStep>, f32)>,
    )>,
}

impl Iterator for ConcentrationsIter<'_> {
    type Item = Concentration;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((group, inner)) = self.current.as_mut() {
                if let Some((step, value)) = inner.next() {
                    return Some(Concentration::new(
                        group.variable.clone(),
                        group.segment.clone(),
                        step.clone(),
                        *value,
                    ));
                }
            }
            let group = self.groups.next()?;
            self.current = Some((group, group.values.values()));
        }
    }
}
