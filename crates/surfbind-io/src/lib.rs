//! Export and verification of bound surface datasets.
//!
//! This crate provides:
//! - **Paired export**: one `{case}_{surface}.data` little-endian payload and
//!   one `{case}_{surface}.meta` JSON descriptor per dataset
//! - **Verification** of existing pairs, singly or for a whole directory tree
//! - **Sweep reports** in text and JSON form

pub mod descriptor;
pub mod error;
mod exporter;
mod reader;
mod report;

pub use descriptor::{ArrayDescriptor, Descriptor, SOURCE_COLUMN, SourceEntry, pair_file_names};
pub use error::{IoError, Result};
pub use exporter::{ExportedPair, export_case, export_dataset, is_exported};
pub use reader::{PairSummary, read_pair, verify_dir, verify_pair};
pub use report::{
    CaseReport, CaseStatus, REPORT_JSON, REPORT_TEXT, ReportFiles, SweepReport, load_sweep_report,
    write_sweep_report,
};
