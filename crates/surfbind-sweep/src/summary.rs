use std::io;
use std::path::Path;

use surfbind_io::{ReportFiles, SweepReport, write_sweep_report};

use crate::case::{CaseOutcome, CaseState};

/// Result of one sweep: every case's outcome, in case order.
#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub outcomes: Vec<CaseOutcome>,
    pub report: SweepReport,
}

impl SweepSummary {
    pub(crate) fn new(mut report: SweepReport, outcomes: Vec<CaseOutcome>) -> Self {
        report.finish(outcomes.iter().map(CaseOutcome::to_report).collect());
        Self { outcomes, report }
    }

    fn count(&self, pred: impl Fn(&CaseState) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.state)).count()
    }

    pub fn exported(&self) -> usize {
        self.count(|s| matches!(s, CaseState::Exported))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, CaseState::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, CaseState::Failed(_)))
    }

    pub fn not_processed(&self) -> usize {
        self.count(|s| !s.is_terminal())
    }

    /// No case failed and none was left unprocessed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.not_processed() == 0
    }

    pub fn outcome(&self, label: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|o| o.case.label == label)
    }

    pub fn format(&self) -> String {
        self.report.to_text()
    }

    pub fn write_report(&self, dir: impl AsRef<Path>) -> io::Result<ReportFiles> {
        write_sweep_report(dir, &self.report)
    }
}
