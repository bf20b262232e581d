//! Case aggregation over a parameter sweep.
//!
//! A sweep is a directory of cases named by a sweep parameter (`Re100`,
//! `Re400`, ...). One mesh is parsed per sweep and shared read-only with
//! every case that has none of its own; each case's field files are bound to
//! that mesh and exported as `.meta`/`.data` pairs. A failing case is
//! recorded and the sweep moves on.

pub mod case;
pub mod config;
pub mod error;
mod summary;
mod sweep;

pub use case::{CaseFailure, CaseId, CaseOutcome, CaseState, Stage};
pub use config::{FieldConfig, GroupConfig, SweepConfig};
pub use error::SweepError;
pub use summary::SweepSummary;
pub use sweep::Sweep;
