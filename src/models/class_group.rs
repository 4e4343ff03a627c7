//! Class (student group) model.
//!
//! A class sits at exactly one level, may have a home-room teacher, and
//! carries the externally declared teacher/subject assignments that the
//! demand compiler turns into weekly demand.

use serde::{Deserialize, Serialize};

use super::Level;

/// A teacher bound to a set of subjects for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAssignment {
    /// Assigned teacher.
    pub teacher_id: String,
    /// Subjects that teacher gives to the class.
    pub subject_ids: Vec<String>,
}

impl ClassAssignment {
    /// Creates an assignment.
    pub fn new<S: Into<String>>(
        teacher_id: impl Into<String>,
        subject_ids: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            subject_ids: subject_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// A student group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassGroup {
    /// Unique class identifier.
    pub id: String,
    /// Display name (e.g., "3-A").
    pub name: String,
    /// School stage.
    pub level: Level,
    /// Home-room teacher, if any.
    pub home_room_teacher_id: Option<String>,
    /// Declared teacher/subject assignments, in priority order.
    pub assignments: Vec<ClassAssignment>,
}

impl ClassGroup {
    /// Creates a class without assignments.
    pub fn new(id: impl Into<String>, level: Level) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            level,
            home_room_teacher_id: None,
            assignments: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the home-room teacher.
    pub fn with_home_room_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.home_room_teacher_id = Some(teacher_id.into());
        self
    }

    /// Adds an assignment.
    pub fn with_assignment(mut self, assignment: ClassAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Whether `teacher_id` is this class's home-room teacher.
    #[inline]
    pub fn is_home_room_teacher(&self, teacher_id: &str) -> bool {
        self.home_room_teacher_id.as_deref() == Some(teacher_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_builder() {
        let c = ClassGroup::new("3A", Level::Primary)
            .with_name("3-A")
            .with_home_room_teacher("T1")
            .with_assignment(ClassAssignment::new("T1", ["TR", "MATH"]))
            .with_assignment(ClassAssignment::new("T2", ["ENG"]));

        assert_eq!(c.level, Level::Primary);
        assert!(c.is_home_room_teacher("T1"));
        assert!(!c.is_home_room_teacher("T2"));
        assert_eq!(c.assignments.len(), 2);
        assert_eq!(c.assignments[0].subject_ids, vec!["TR", "MATH"]);
    }

    #[test]
    fn test_class_without_home_room() {
        let c = ClassGroup::new("7B", Level::Middle);
        assert!(!c.is_home_room_teacher("T1"));
        assert!(c.assignments.is_empty());
    }
}
