//! Time constraints on the weekly grid.
//!
//! A constraint marks one `(day, period)` cell for one teacher, class or
//! subject as either **preferred** (an ordering hint) or **unavailable**
//! (absolute). Constraints sharing the same key collapse last-write-wins.
//!
//! # Key
//! `(entity kind, entity id, day name, period number)`
//!
//! Keys are kept in a `BTreeMap`, so iteration order is stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a constraint is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A teacher.
    Teacher,
    /// A class.
    Class,
    /// A subject.
    Subject,
}

/// Constraint strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Slot is favoured; never forces a placement.
    Preferred,
    /// Slot must not be used.
    Unavailable,
}

/// A single time constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Kind of entity constrained.
    pub entity_kind: EntityKind,
    /// Entity identifier.
    pub entity_id: String,
    /// Day name (must exist in the calendar).
    pub day: String,
    /// Period number (must exist in the calendar).
    pub period: u32,
    /// Preferred or unavailable.
    pub kind: ConstraintKind,
    /// Free-form reason, shown to users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Constraint {
    /// Creates a constraint.
    pub fn new(
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        day: impl Into<String>,
        period: u32,
        kind: ConstraintKind,
    ) -> Self {
        Self {
            entity_kind,
            entity_id: entity_id.into(),
            day: day.into(),
            period,
            kind,
            reason: None,
        }
    }

    /// Marks a teacher unavailable at a slot.
    pub fn teacher_unavailable(id: impl Into<String>, day: impl Into<String>, period: u32) -> Self {
        Self::new(EntityKind::Teacher, id, day, period, ConstraintKind::Unavailable)
    }

    /// Marks a class unavailable at a slot.
    pub fn class_unavailable(id: impl Into<String>, day: impl Into<String>, period: u32) -> Self {
        Self::new(EntityKind::Class, id, day, period, ConstraintKind::Unavailable)
    }

    /// Marks a subject unavailable at a slot.
    pub fn subject_unavailable(id: impl Into<String>, day: impl Into<String>, period: u32) -> Self {
        Self::new(EntityKind::Subject, id, day, period, ConstraintKind::Unavailable)
    }

    /// Marks a subject preferred at a slot.
    pub fn subject_preferred(id: impl Into<String>, day: impl Into<String>, period: u32) -> Self {
        Self::new(EntityKind::Subject, id, day, period, ConstraintKind::Preferred)
    }

    /// Attaches a reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The key this constraint collapses on.
    pub fn key(&self) -> ConstraintKey {
        ConstraintKey {
            entity_kind: self.entity_kind,
            entity_id: self.entity_id.clone(),
            day: self.day.clone(),
            period: self.period,
        }
    }
}

/// Identity of a constraint cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintKey {
    /// Kind of entity.
    pub entity_kind: EntityKind,
    /// Entity identifier.
    pub entity_id: String,
    /// Day name.
    pub day: String,
    /// Period number.
    pub period: u32,
}

/// Value stored under a [`ConstraintKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintEntry {
    /// Preferred or unavailable.
    pub kind: ConstraintKind,
    /// Reason, if any.
    pub reason: Option<String>,
}

/// A keyed, last-write-wins collection of constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Constraint>", into = "Vec<Constraint>")]
pub struct ConstraintSet {
    entries: BTreeMap<ConstraintKey, ConstraintEntry>,
}

impl ConstraintSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a constraint, replacing any entry with the same key.
    ///
    /// Returns the replaced entry.
    pub fn insert(&mut self, constraint: Constraint) -> Option<ConstraintEntry> {
        let key = constraint.key();
        self.entries.insert(
            key,
            ConstraintEntry {
                kind: constraint.kind,
                reason: constraint.reason,
            },
        )
    }

    /// Builder: inserts a constraint and returns self.
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.insert(constraint);
        self
    }

    /// Looks up the entry for a key.
    pub fn get(&self, key: &ConstraintKey) -> Option<&ConstraintEntry> {
        self.entries.get(key)
    }

    /// Looks up the constraint kind at a cell.
    pub fn kind_at(
        &self,
        entity_kind: EntityKind,
        entity_id: &str,
        day: &str,
        period: u32,
    ) -> Option<ConstraintKind> {
        let key = ConstraintKey {
            entity_kind,
            entity_id: entity_id.to_string(),
            day: day.to_string(),
            period,
        };
        self.entries.get(&key).map(|e| e.kind)
    }

    /// Whether the cell is marked unavailable.
    pub fn is_unavailable(&self, entity_kind: EntityKind, entity_id: &str, day: &str, period: u32) -> bool {
        self.kind_at(entity_kind, entity_id, day, period) == Some(ConstraintKind::Unavailable)
    }

    /// Whether any constraint targets the entity.
    pub fn has_entity(&self, entity_kind: EntityKind, entity_id: &str) -> bool {
        self.entries
            .keys()
            .any(|k| k.entity_kind == entity_kind && k.entity_id == entity_id)
    }

    /// Iterates `(key, entry)` pairs in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&ConstraintKey, &ConstraintEntry)> {
        self.entries.iter()
    }

    /// Iterates constraints in key order.
    pub fn iter(&self) -> impl Iterator<Item = Constraint> + '_ {
        self.entries.iter().map(|(k, e)| Constraint {
            entity_kind: k.entity_kind,
            entity_id: k.entity_id.clone(),
            day: k.day.clone(),
            period: k.period,
            kind: e.kind,
            reason: e.reason.clone(),
        })
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut set = Self::new();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl From<Vec<Constraint>> for ConstraintSet {
    fn from(constraints: Vec<Constraint>) -> Self {
        constraints.into_iter().collect()
    }
}

impl From<ConstraintSet> for Vec<Constraint> {
    fn from(set: ConstraintSet) -> Self {
        set.iter().collect()
    }
}
