//! Run output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{WeekGrid, Warning};
use crate::validation::ValidationError;

/// Hours of one demand left unplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualDemand {
    /// Class.
    pub class_id: String,
    /// Subject.
    pub subject_id: String,
    /// Teacher.
    pub teacher_id: String,
    /// Unplaced weekly hours.
    pub missing_hours: u32,
}

/// Hour accounting of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Sum of weekly hours over all demands.
    pub total_demanded_hours: u32,
    /// Hours present in the grids (draft and engine).
    pub placed_hours: u32,
    /// Per-demand shortfall, in demand order.
    pub residual: Vec<ResidualDemand>,
}

impl Statistics {
    /// Sum of missing hours.
    pub fn missing_hours(&self) -> u32 {
        self.residual.iter().map(|r| r.missing_hours).sum()
    }

    /// Fraction of demanded hours placed (1.0 when nothing was demanded).
    pub fn placement_rate(&self) -> f64 {
        if self.total_demanded_hours == 0 {
            1.0
        } else {
            self.placed_hours as f64 / self.total_demanded_hours as f64
        }
    }
}

/// Immutable bundle returned by a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleResult {
    /// Grid per teacher, keyed by teacher ID.
    pub teacher_grids: BTreeMap<String, WeekGrid>,
    /// Grid per class, keyed by class ID.
    pub class_grids: BTreeMap<String, WeekGrid>,
    /// Hour accounting.
    pub statistics: Statistics,
    /// Non-fatal notices.
    pub warnings: Vec<Warning>,
    /// Input errors.
    pub errors: Vec<ValidationError>,
}

impl ScheduleResult {
    /// Whether every demanded hour was placed.
    pub fn is_complete(&self) -> bool {
        self.statistics.residual.is_empty()
    }

    /// Teacher grid.
    pub fn teacher_grid(&self, teacher_id: &str) -> Option<&WeekGrid> {
        self.teacher_grids.get(teacher_id)
    }

    /// Class grid.
    pub fn class_grid(&self, class_id: &str) -> Option<&WeekGrid> {
        self.class_grids.get(class_id)
    }

    /// Lessons placed in class grids.
    pub fn lesson_count(&self) -> usize {
        self.class_grids.values().map(WeekGrid::lesson_count).sum()
    }

    /// Serializes the result to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
