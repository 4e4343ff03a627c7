//! Weekly demand records.
//!
//! A demand record is the normalized form of "teacher X gives subject Y to
//! class Z for N hours a week". It is unique per `(class, subject)` and is
//! created once by the demand compiler; afterwards only its satisfied-hours
//! accounting changes.

use serde::{Deserialize, Serialize};

use super::{Level, SubjectKind};

/// Scheduling priority tier. `High` is placed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    /// Home-room teacher at a home-room level, or a core subject.
    High,
    /// Ordinary demand.
    Medium,
    /// Demand the teacher is not certified for.
    Low,
}

/// One `(class, subject)` weekly requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandRecord {
    /// Class receiving the lessons.
    pub class_id: String,
    /// Subject taught.
    pub subject_id: String,
    /// Teacher giving the lessons.
    pub teacher_id: String,
    /// Level of the class.
    pub level: Level,
    /// Required weekly hours.
    pub weekly_hours: u32,
    /// Block lengths, present only when they sum to `weekly_hours`.
    pub distribution: Option<Vec<u32>>,
    /// Priority tier.
    pub priority: PriorityTier,
    /// Whether the teacher is the class's home-room teacher at a home-room level.
    pub home_room: bool,
    /// Placement category of the subject.
    pub subject_kind: SubjectKind,
    /// Whether the subject is core.
    pub core: bool,
    /// Hours already satisfied (by a draft or a previous pass).
    pub satisfied_hours: u32,
}

impl DemandRecord {
    /// Creates a medium-priority regular demand.
    pub fn new(
        class_id: impl Into<String>,
        subject_id: impl Into<String>,
        teacher_id: impl Into<String>,
        level: Level,
        weekly_hours: u32,
    ) -> Self {
        Self {
            class_id: class_id.into(),
            subject_id: subject_id.into(),
            teacher_id: teacher_id.into(),
            level,
            weekly_hours,
            distribution: None,
            priority: PriorityTier::Medium,
            home_room: false,
            subject_kind: SubjectKind::Regular,
            core: false,
            satisfied_hours: 0,
        }
    }

    /// Sets the distribution.
    pub fn with_distribution(mut self, blocks: Vec<u32>) -> Self {
        self.distribution = Some(blocks);
        self
    }

    /// Sets the priority tier.
    pub fn with_priority(mut self, priority: PriorityTier) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the demand as a home-room relationship.
    pub fn with_home_room(mut self) -> Self {
        self.home_room = true;
        self
    }

    /// Sets the subject kind.
    pub fn with_subject_kind(mut self, kind: SubjectKind) -> Self {
        self.subject_kind = kind;
        self
    }

    /// Marks the subject as core.
    pub fn with_core(mut self) -> Self {
        self.core = true;
        self
    }

    /// `(class, subject)` identity.
    pub fn key(&self) -> (&str, &str) {
        (&self.class_id, &self.subject_id)
    }

    /// Hours still to be placed.
    #[inline]
    pub fn remaining_hours(&self) -> u32 {
        self.weekly_hours.saturating_sub(self.satisfied_hours)
    }

    /// Whether every weekly hour is satisfied.
    #[inline]
    pub fn is_satisfied(&self) -> bool {
        self.remaining_hours() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_builder() {
        let d = DemandRecord::new("3A", "TR", "T1", Level::Primary, 5)
            .with_distribution(vec![2, 2, 1])
            .with_priority(PriorityTier::High)
            .with_home_room()
            .with_core();

        assert_eq!(d.key(), ("3A", "TR"));
        assert_eq!(d.distribution, Some(vec![2, 2, 1]));
        assert!(d.home_room && d.core);
        assert_eq!(d.remaining_hours(), 5);
    }

    #[test]
    fn test_remaining_hours_saturates() {
        let mut d = DemandRecord::new("3A", "TR", "T1", Level::Primary, 3);
        d.satisfied_hours = 2;
        assert_eq!(d.remaining_hours(), 1);
        assert!(!d.is_satisfied());
        d.satisfied_hours = 5;
        assert_eq!(d.remaining_hours(), 0);
        assert!(d.is_satisfied());
    }

    #[test]
    fn test_priority_order() {
        assert!(PriorityTier::High < PriorityTier::Medium);
        assert!(PriorityTier::Medium < PriorityTier::Low);
    }
}
