use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const REPORT_TEXT: &str = "sweep_report.txt";
pub const REPORT_JSON: &str = "sweep_report.json";

/// Terminal status of one case in a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Exported,
    Skipped,
    Failed,
    /// Never started, e.g. after cancellation.
    NotProcessed,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Exported => "EXPORTED",
            CaseStatus::Skipped => "SKIPPED",
            CaseStatus::Failed => "FAILED",
            CaseStatus::NotProcessed => "NOT PROCESSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    pub case: String,
    pub status: CaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Rows per exported surface, by surface name.
    #[serde(default)]
    pub rows: BTreeMap<String, usize>,
}

impl CaseReport {
    pub fn new(case: impl Into<String>, status: CaseStatus) -> Self {
        Self {
            case: case.into(),
            status,
            stage: None,
            error_kind: None,
            message: None,
            rows: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub root: String,
    pub started_at: String,
    pub finished_at: String,
    pub cases: Vec<CaseReport>,
}

impl SweepReport {
    /// A report whose clock starts now.
    pub fn start(root: impl Into<String>) -> Self {
        let now = chrono::Local::now().to_rfc3339();
        Self {
            root: root.into(),
            started_at: now.clone(),
            finished_at: now,
            cases: Vec::new(),
        }
    }

    pub fn finish(&mut self, cases: Vec<CaseReport>) {
        self.cases = cases;
        self.finished_at = chrono::Local::now().to_rfc3339();
    }

    pub fn count(&self, status: CaseStatus) -> usize {
        self.cases.iter().filter(|c| c.status == status).count()
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "*SURFBIND SWEEP REPORT");
        let _ = writeln!(out, "ROOT: {}", self.root);
        let _ = writeln!(out, "STARTED: {}", self.started_at);
        let _ = writeln!(out, "FINISHED: {}", self.finished_at);
        let _ = writeln!(out, "CASES: {}", self.cases.len());
        for status in [
            CaseStatus::Exported,
            CaseStatus::Skipped,
            CaseStatus::Failed,
            CaseStatus::NotProcessed,
        ] {
            let _ = writeln!(out, "{}: {}", status.as_str(), self.count(status));
        }
        let _ = writeln!(out);

        for case in &self.cases {
            let _ = write!(out, "{:<16} {}", case.case, case.status.as_str());
            if let Some(stage) = &case.stage {
                let _ = write!(out, " stage={stage}");
            }
            if let Some(kind) = &case.error_kind {
                let _ = write!(out, " kind={kind}");
            }
            if !case.rows.is_empty() {
                let rows: Vec<_> = case.rows.iter().map(|(s, n)| format!("{s}={n}")).collect();
                let _ = write!(out, " rows[{}]", rows.join(" "));
            }
            if let Some(message) = &case.message {
                let _ = write!(out, " # {message}");
            }
            let _ = writeln!(out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub text_path: PathBuf,
    pub json_path: PathBuf,
}

pub fn write_sweep_report(dir: impl AsRef<Path>, report: &SweepReport) -> io::Result<ReportFiles> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let text_path = dir.join(REPORT_TEXT);
    let json_path = dir.join(REPORT_JSON);

    fs::write(&text_path, report.to_text())?;
    let bytes = serde_json::to_vec_pretty(report)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(&json_path, bytes)?;

    Ok(ReportFiles {
        text_path,
        json_path,
    })
}

pub fn load_sweep_report(path: impl AsRef<Path>) -> io::Result<SweepReport> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
