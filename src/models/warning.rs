//! Non-fatal run notices.
//!
//! Warnings never abort a run. They tell the caller what was dropped,
//! altered or degraded so that manual follow-up can be planned.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Teacher levels do not include the class level; assignment skipped.
    LevelMismatch,
    /// A second assignment for the same (class, subject); ignored.
    DuplicateDemand,
    /// Distribution blocks do not sum to the weekly hours; pattern dropped.
    MalformedDistribution,
    /// Teacher is not certified for the subject; demand kept at low priority.
    UncertifiedTeacher,
    /// An assignment references an unknown teacher or subject.
    UnknownReference,
    /// Nothing to schedule.
    NoDemand,
    /// Elective or windowed subject without a configured window for its level.
    MissingWindow,
    /// Elective demand exceeds its window; excess left unplaced.
    ElectiveExcessHours,
    /// A placement reached the engine that breaks level eligibility.
    AlgorithmViolation,
    /// An elective window was occupied; block not placed.
    ElectiveWindowBlocked,
    /// The iteration ceiling stopped the run.
    IterationLimit,
    /// The deadline stopped the run.
    DeadlineExceeded,
    /// Some demand could not be placed.
    ResidualDemand,
    /// A cell of an external draft was rejected.
    DraftCellRejected,
    /// The external drafting service failed; pure engine run used.
    UpstreamServiceFailure,
}

/// A non-fatal notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Kind of warning.
    pub kind: WarningKind,
    /// Related entity (class, teacher, subject or demand key).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

impl Warning {
    /// Creates a warning.
    pub fn new(kind: WarningKind, entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.kind, self.entity_id, self.message)
    }
}
