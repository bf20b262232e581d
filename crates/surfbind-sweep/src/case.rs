//! Case identifiers and the per-case state machine.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use surfbind_io::{CaseReport, CaseStatus, ExportedPair};
use surfbind_model::{ErrorKind, ModelError};

/// A case label and the sweep parameter parsed from it, e.g. `Re1000` -> 1000.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseId {
    pub label: String,
    pub parameter: Option<f64>,
}

impl CaseId {
    /// The parameter is the number right after `prefix`; trailing text such
    /// as `-2` or `_fine` is ignored.
    pub fn parse(label: impl Into<String>, prefix: &str) -> Self {
        let label = label.into();
        let parameter = label.strip_prefix(prefix).and_then(|rest| {
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            rest[..end].parse::<f64>().ok()
        });
        Self { label, parameter }
    }
}

impl Eq for CaseId {}

impl Ord for CaseId {
    /// Numeric parameter first, unparsable labels last, label as tie-breaker.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_parameter = match (self.parameter, other.parameter) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_parameter.then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for CaseId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Discover,
    Mesh,
    Fields,
    Bind,
    Export,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Discover => "discover",
            Stage::Mesh => "mesh",
            Stage::Fields => "fields",
            Stage::Bind => "bind",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFailure {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl CaseFailure {
    pub fn new(stage: Stage, err: &ModelError) -> Self {
        Self {
            stage,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at stage {}: {}", self.kind.as_str(), self.stage, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseState {
    Discovered,
    /// Mesh resolved and field files parsed.
    Parsed,
    /// Every field bound to its surface group.
    Bound,
    Exported,
    /// All artifacts were already present.
    Skipped,
    Failed(CaseFailure),
}

impl CaseState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaseState::Exported | CaseState::Skipped | CaseState::Failed(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            CaseState::Discovered => "Discovered",
            CaseState::Parsed => "Parsed",
            CaseState::Bound => "Bound",
            CaseState::Exported => "Exported",
            CaseState::Skipped => "Skipped",
            CaseState::Failed(_) => "Failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    pub case: CaseId,
    pub state: CaseState,
    pub exported: Vec<ExportedPair>,
}

impl CaseOutcome {
    pub fn new(case: CaseId) -> Self {
        Self {
            case,
            state: CaseState::Discovered,
            exported: Vec::new(),
        }
    }

    pub(crate) fn advance(&mut self, state: CaseState) {
        log::debug!("{}: {} -> {}", self.case, self.state.name(), state.name());
        self.state = state;
    }

    pub(crate) fn fail(mut self, failure: CaseFailure) -> Self {
        log::error!("{}: {failure}", self.case);
        self.advance(CaseState::Failed(failure));
        self
    }

    pub fn failure(&self) -> Option<&CaseFailure> {
        match &self.state {
            CaseState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn to_report(&self) -> CaseReport {
        let status = match &self.state {
            CaseState::Exported => CaseStatus::Exported,
            CaseState::Skipped => CaseStatus::Skipped,
            CaseState::Failed(_) => CaseStatus::Failed,
            CaseState::Discovered | CaseState::Parsed | CaseState::Bound => {
                CaseStatus::NotProcessed
            }
        };
        let mut report = CaseReport::new(self.case.label.clone(), status);
        if let Some(failure) = self.failure() {
            report.stage = Some(failure.stage.as_str().to_string());
            report.error_kind = Some(failure.kind.as_str().to_string());
            report.message = Some(failure.message.clone());
        }
        report.rows = self
            .exported
            .iter()
            .map(|pair| (pair.surface.clone(), pair.rows))
            .collect::<BTreeMap<_, _>>();
        report
    }
}
