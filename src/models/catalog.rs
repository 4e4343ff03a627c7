//! Entity catalogs and run selection.
//!
//! The catalog holds every teacher, class and subject known to the
//! institution; the selection narrows a run to a subset of them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ClassGroup, Subject, Teacher};

/// All entities available to a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Teachers.
    pub teachers: Vec<Teacher>,
    /// Classes.
    pub classes: Vec<ClassGroup>,
    /// Subjects.
    pub subjects: Vec<Subject>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Adds a class.
    pub fn with_class(mut self, class: ClassGroup) -> Self {
        self.classes.push(class);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Builds ID lookups. The first entity with a given ID wins.
    pub fn index(&self) -> CatalogIndex<'_> {
        let mut teachers = HashMap::new();
        for t in &self.teachers {
            teachers.entry(t.id.as_str()).or_insert(t);
        }
        let mut classes = HashMap::new();
        for c in &self.classes {
            classes.entry(c.id.as_str()).or_insert(c);
        }
        let mut subjects = HashMap::new();
        for s in &self.subjects {
            subjects.entry(s.id.as_str()).or_insert(s);
        }
        CatalogIndex {
            teachers,
            classes,
            subjects,
        }
    }
}

/// Borrowed ID lookups over a [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogIndex<'a> {
    teachers: HashMap<&'a str, &'a Teacher>,
    classes: HashMap<&'a str, &'a ClassGroup>,
    subjects: HashMap<&'a str, &'a Subject>,
}

impl<'a> CatalogIndex<'a> {
    /// Finds a teacher.
    pub fn teacher(&self, id: &str) -> Option<&'a Teacher> {
        self.teachers.get(id).copied()
    }

    /// Finds a class.
    pub fn class(&self, id: &str) -> Option<&'a ClassGroup> {
        self.classes.get(id).copied()
    }

    /// Finds a subject.
    pub fn subject(&self, id: &str) -> Option<&'a Subject> {
        self.subjects.get(id).copied()
    }
}

/// The entities in scope for one run. An empty list means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    /// Selected class IDs.
    pub class_ids: Vec<String>,
    /// Selected teacher IDs.
    pub teacher_ids: Vec<String>,
    /// Selected subject IDs.
    pub subject_ids: Vec<String>,
}

impl Selection {
    /// Selects everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to the given classes.
    pub fn with_classes<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.class_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given teachers.
    pub fn with_teachers<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.teacher_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given subjects.
    pub fn with_subjects<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.subject_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a class is in scope.
    pub fn has_class(&self, id: &str) -> bool {
        self.class_ids.is_empty() || self.class_ids.iter().any(|c| c == id)
    }

    /// Whether a teacher is in scope.
    pub fn has_teacher(&self, id: &str) -> bool {
        self.teacher_ids.is_empty() || self.teacher_ids.iter().any(|t| t == id)
    }

    /// Whether a subject is in scope.
    pub fn has_subject(&self, id: &str) -> bool {
        self.subject_ids.is_empty() || self.subject_ids.iter().any(|s| s == id)
    }

    /// Whether nothing was explicitly selected.
    pub fn is_all(&self) -> bool {
        self.class_ids.is_empty() && self.teacher_ids.is_empty() && self.subject_ids.is_empty()
    }
}
