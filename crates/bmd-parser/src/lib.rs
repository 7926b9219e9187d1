//! Decoder for WASP BMD binary model-output files.
//!
//! BMD is the fixed-layout binary format the WASP water-quality model writes
//! its simulation output to: a 78-byte header, a variable dictionary, a
//! dense 3-D array of f32 concentration samples (variable × segment × time),
//! per-variable and per-variable-segment min/max summaries, and segment
//! names. This crate decodes the catalog up front and serves random-access
//! queries over the concentrations block without ever loading it whole.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use bmd_parser::{BmdReader, BmdResult};
//!
//! fn example() -> BmdResult<()> {
//!     let mut reader = BmdReader::open("output.bmd")?;
//!     for variable in reader.variables() {
//!         println!("{} [{}]", variable.name(), variable.units());
//!     }
//!
//!     let concentrations = reader
//!         .new_query()
//!         .with_variable_indices([0])
//!         .with_segment_indices([0])
//!         .with_all_time_steps()
//!         .execute()?;
//!     for concentration in &concentrations {
//!         println!("{}: {}", concentration.time_step(), concentration.value());
//!     }
//!     Ok(())
//! }
//! ```

pub mod concentrations;
pub mod error;
pub mod header;
pub mod io;
pub mod layout;
pub mod model;
pub mod query;
pub mod reader;
pub mod time;

pub use concentrations::{Concentrations, ConcentrationsIter};
pub use error::{BmdError, BmdResult};
pub use header::{BmdHeader, BmdHeaderBuilder};
pub use io::{ByteOrder, SeekableReader};
pub use layout::BlockLayout;
pub use model::{BmdSegment, BmdTimeStep, BmdVariable, Concentration};
pub use query::{ConcentrationsQuery, ProgressFn};
pub use reader::BmdReader;
