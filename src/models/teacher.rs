//! Teacher model.
//!
//! Teachers are the human resources of a timetable: each one is eligible
//! for a set of levels, belongs to one or more subject branches, holds
//! certifications for specific subjects, and may cap their weekly load.

use serde::{Deserialize, Serialize};

use super::{Level, Subject};

/// A teacher that can be assigned to class/subject demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Levels this teacher may teach (at least one).
    pub levels: Vec<Level>,
    /// Subject branches (e.g., "Mathematics", "Classroom").
    pub branches: Vec<String>,
    /// Subject IDs the teacher is certified for.
    pub subject_ids: Vec<String>,
    /// Maximum weekly teaching hours. `None` = no cap.
    pub max_weekly_hours: Option<u32>,
}

impl Teacher {
    /// Creates a teacher eligible for a single level.
    pub fn new(id: impl Into<String>, level: Level) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            levels: vec![level],
            branches: Vec::new(),
            subject_ids: Vec::new(),
            max_weekly_hours: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds an eligible level.
    pub fn with_level(mut self, level: Level) -> Self {
        if !self.levels.contains(&level) {
            self.levels.push(level);
        }
        self
    }

    /// Adds a branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branches.push(branch.into());
        self
    }

    /// Adds a certified subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_ids.push(subject_id.into());
        self
    }

    /// Sets the weekly hour cap.
    pub fn with_max_weekly_hours(mut self, hours: u32) -> Self {
        self.max_weekly_hours = Some(hours);
        self
    }

    /// Whether the teacher may teach at `level`.
    #[inline]
    pub fn teaches_level(&self, level: Level) -> bool {
        self.levels.contains(&level)
    }

    /// Whether the teacher is certified for a subject, either directly or
    /// through a matching branch.
    pub fn is_certified_for(&self, subject: &Subject) -> bool {
        self.subject_ids.iter().any(|id| *id == subject.id)
            || (!subject.branch.is_empty() && self.branches.iter().any(|b| *b == subject.branch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_builder() {
        let t = Teacher::new("T1", Level::Primary)
            .with_name("Ayşe")
            .with_level(Level::Middle)
            .with_level(Level::Middle)
            .with_branch("Mathematics")
            .with_subject("MATH-5")
            .with_max_weekly_hours(22);

        assert_eq!(t.id, "T1");
        assert_eq!(t.name, "Ayşe");
        assert_eq!(t.levels, vec![Level::Primary, Level::Middle]);
        assert!(t.teaches_level(Level::Middle));
        assert!(!t.teaches_level(Level::Preschool));
        assert_eq!(t.max_weekly_hours, Some(22));
    }

    #[test]
    fn test_certification_by_id_or_branch() {
        let t = Teacher::new("T1", Level::Middle)
            .with_branch("Mathematics")
            .with_subject("SCI");

        let math = Subject::new("MATH", 4).with_branch("Mathematics");
        let sci = Subject::new("SCI", 3).with_branch("Science");
        let art = Subject::new("ART", 1).with_branch("Art");
        let unbranched = Subject::new("X", 1);

        assert!(t.is_certified_for(&math));
        assert!(t.is_certified_for(&sci));
        assert!(!t.is_certified_for(&art));
        assert!(!t.is_certified_for(&unbranched));
    }
}
