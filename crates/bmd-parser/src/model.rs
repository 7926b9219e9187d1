//! Domain entities decoded from a BMD file.
//!
//! Variables, segments, and time steps are identified by their 0-based
//! position in the file. Equality, ordering, and hashing use the index
//! alone; names are display payload and may legally repeat across distinct
//! indices in real files.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Longest pcode an alias can carry.
const PCODE_MAX_LEN: usize = 10;

/// Trim the space and control-character padding BMD fixed-width fields carry.
pub(crate) fn trim_field(s: &str) -> &str {
    s.trim_matches(|c: char| c <= ' ')
}

/// Derive a variable's program code: the name with any trailing
/// parenthetical stripped, trimmed, uppercased, and truncated to 10
/// characters. `"Distance (mi)"` becomes `"DISTANCE"`.
fn derive_pcode(name: &str) -> String {
    let stem = match name.find('(') {
        Some(pos) => &name[..pos],
        None => name,
    };
    let code: String = trim_field(stem).to_uppercase().chars().take(PCODE_MAX_LEN).collect();
    trim_field(&code).to_string()
}

/// A simulated water-quality constituent or derived quantity.
#[derive(Debug, Clone)]
pub struct BmdVariable {
    index: usize,
    name: String,
    units: String,
    pcode: String,
}

impl BmdVariable {
    pub(crate) fn new(index: usize, name: String, units: String) -> Self {
        let pcode = derive_pcode(&name);
        Self {
            index,
            name,
            units,
            pcode,
        }
    }

    /// 0-based position in the file; defines identity and ordering.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The variable name, trimmed of field padding.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variable units, trimmed of field padding.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// The derived uppercase alias for this variable.
    pub fn pcode(&self) -> &str {
        &self.pcode
    }
}

impl PartialEq for BmdVariable {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for BmdVariable {}

impl Ord for BmdVariable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl PartialOrd for BmdVariable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for BmdVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Display for BmdVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A spatial model compartment, such as a river reach.
#[derive(Debug, Clone)]
pub struct BmdSegment {
    index: usize,
    name: String,
}

impl BmdSegment {
    pub(crate) fn new(index: usize, name: String) -> Self {
        Self { index, name }
    }

    /// 0-based position in the file; defines identity and ordering.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The segment name, trimmed or synthesized.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for BmdSegment {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for BmdSegment {}

impl Ord for BmdSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl PartialOrd for BmdSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for BmdSegment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Display for BmdSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One simulation output instant.
#[derive(Debug, Clone)]
pub struct BmdTimeStep {
    index: usize,
    time: DateTime<Utc>,
    value: f64,
}

impl BmdTimeStep {
    pub(crate) fn new(index: usize, time: DateTime<Utc>, value: f64) -> Self {
        Self { index, time, value }
    }

    /// 0-based position in the file; defines identity and ordering.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The derived absolute timestamp (seed date plus the raw offset).
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// The raw on-disk value: days since the seed date.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl PartialEq for BmdTimeStep {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for BmdTimeStep {}

impl Ord for BmdTimeStep {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl PartialOrd for BmdTimeStep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for BmdTimeStep {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Display for BmdTimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// One sampled value: a (variable, segment, time step) cell and its f32
/// concentration.
///
/// Identity and ordering use the three key components only; the value is
/// payload.
#[derive(Debug, Clone)]
pub struct Concentration {
    variable: Arc<BmdVariable>,
    segment: Arc<BmdSegment>,
    time_step: Arc<BmdTimeStep>,
    value: f32,
}

impl Concentration {
    pub(crate) fn new(
        variable: Arc<BmdVariable>,
        segment: Arc<BmdSegment>,
        time_step: Arc<BmdTimeStep>,
        value: f32,
    ) -> Self {
        Self {
            variable,
            segment,
            time_step,
            value,
        }
    }

    /// The variable this sample belongs to.
    pub fn variable(&self) -> &BmdVariable {
        &self.variable
    }

    /// The segment this sample belongs to.
    pub fn segment(&self) -> &BmdSegment {
        &self.segment
    }

    /// The time step this sample belongs to.
    pub fn time_step(&self) -> &BmdTimeStep {
        &self.time_step
    }

    /// The sampled concentration value.
    pub fn value(&self) -> f32 {
        self.value
    }
}

impl PartialEq for Concentration {
    fn eq(&self, other: &Self) -> bool {
        self.variable == other.variable
            && self.segment == other.segment
            && self.time_step == other.time_step
    }
}

impl Eq for Concentration {}

impl Ord for Concentration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.variable
            .cmp(&other.variable)
            .then_with(|| self.segment.cmp(&other.segment))
            .then_with(|| self.time_step.cmp(&other.time_step))
    }
}

impl PartialOrd for Concentration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Concentration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variable.hash(state);
        self.segment.hash(state);
        self.time_step.hash(state);
    }
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
