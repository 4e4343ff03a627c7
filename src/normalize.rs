//! Constraint normalization.
//!
//! Turns the policy's fixed windows and non-teaching periods into ordinary
//! [`Constraint`] entries and merges them over the user's constraint set.
//!
//! # Derived entries
//!
//! | Source | Entity | Result |
//! |--------|--------|--------|
//! | Elective window of a level | elective subject | window → Preferred, every other slot → Unavailable |
//! | Special window of a category | windowed subject | same treatment with the window's periods |
//! | Non-teaching period of a level | every applicable subject, every class at the level | that period on every day → Unavailable |
//!
//! Derived entries win over user entries at the same key. A user entry whose
//! kind is flipped is reported as a [`ConstraintOverride`]; this is never an
//! error. Derived entries are merged among themselves first (non-teaching
//! periods last), so re-normalizing an already normalized set changes
//! nothing and reports no override.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    ClassGroup, Constraint, ConstraintEntry, ConstraintKey, ConstraintKind, ConstraintSet,
    EntityKind, Policy, Slot, Subject, SubjectKind, Warning, WarningKind,
};

const ELECTIVE_REASON: &str = "elective window";
const OUTSIDE_ELECTIVE_REASON: &str = "outside elective window";
const SPECIAL_REASON: &str = "special window";
const OUTSIDE_SPECIAL_REASON: &str = "outside special window";
const NON_TEACHING_REASON: &str = "non-teaching period";

/// A user constraint replaced by a derived one of a different kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintOverride {
    /// Cell that was overwritten.
    pub key: ConstraintKey,
    /// Kind the user had set.
    pub previous: ConstraintKind,
    /// Kind the derivation imposed.
    pub derived: ConstraintKind,
}

/// Output of [`ConstraintNormalizer::normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Merged constraint set.
    pub constraints: ConstraintSet,
    /// User entries whose kind was flipped.
    pub overrides: Vec<ConstraintOverride>,
    /// Missing-window notices.
    pub warnings: Vec<Warning>,
}

/// Derives window and non-teaching constraints from a policy.
#[derive(Debug, Clone)]
pub struct ConstraintNormalizer<'a> {
    policy: &'a Policy,
}

impl<'a> ConstraintNormalizer<'a> {
    /// Creates a normalizer bound to a policy.
    pub fn new(policy: &'a Policy) -> Self {
        Self { policy }
    }

    /// Merges derived entries over `constraints`.
    pub fn normalize(
        &self,
        subjects: &[Subject],
        classes: &[ClassGroup],
        constraints: &ConstraintSet,
    ) -> Normalized {
        let mut warnings = Vec::new();
        let derived = self.derive(subjects, classes, &mut warnings);

        let mut merged = constraints.clone();
        let mut overrides = Vec::new();
        for (key, entry) in derived {
            let constraint = Constraint {
                entity_kind: key.entity_kind,
                entity_id: key.entity_id.clone(),
                day: key.day.clone(),
                period: key.period,
                kind: entry.kind,
                reason: entry.reason,
            };
            if let Some(previous) = merged.insert(constraint) {
                if previous.kind != entry.kind {
                    debug!(
                        entity = %key.entity_id,
                        day = %key.day,
                        period = key.period,
                        previous = ?previous.kind,
                        derived = ?entry.kind,
                        "constraint overridden"
                    );
                    overrides.push(ConstraintOverride {
                        key,
                        previous: previous.kind,
                        derived: entry.kind,
                    });
                }
            }
        }

        debug!(
            user = constraints.len(),
            merged = merged.len(),
            overrides = overrides.len(),
            "constraints normalized"
        );

        Normalized {
            constraints: merged,
            overrides,
            warnings,
        }
    }

    /// Derived entries, already merged among themselves.
    fn derive(
        &self,
        subjects: &[Subject],
        classes: &[ClassGroup],
        warnings: &mut Vec<Warning>,
    ) -> BTreeMap<ConstraintKey, ConstraintEntry> {
        let calendar = &self.policy.calendar;
        let mut derived = BTreeMap::new();

        for subject in subjects {
            let window = match &subject.kind {
                SubjectKind::Regular => continue,
                SubjectKind::Elective => self.elective_slots(subject),
                SubjectKind::Windowed(category) => self
                    .policy
                    .special_window(category)
                    .and_then(|w| w.resolve(calendar))
                    .map(|slots| slots.into_iter().collect::<BTreeSet<_>>()),
            };
            let Some(window) = window.filter(|w| !w.is_empty()) else {
                warnings.push(Warning::new(
                    WarningKind::MissingWindow,
                    &subject.id,
                    format!("no usable window configured for {:?} subject", subject.kind),
                ));
                continue;
            };

            let (inside, outside) = match subject.kind {
                SubjectKind::Elective => (ELECTIVE_REASON, OUTSIDE_ELECTIVE_REASON),
                _ => (SPECIAL_REASON, OUTSIDE_SPECIAL_REASON),
            };
            for slot in calendar.slots() {
                let (kind, reason) = if window.contains(&slot) {
                    (ConstraintKind::Preferred, inside)
                } else {
                    (ConstraintKind::Unavailable, outside)
                };
                put(&mut derived, EntityKind::Subject, &subject.id, slot, kind, reason, self.policy);
            }
        }

        // Non-teaching periods go last and win over window entries.
        for subject in subjects {
            for level in subject.applicable_levels() {
                if let Some(p) = self.policy.non_teaching_period(level) {
                    self.block_period(&mut derived, EntityKind::Subject, &subject.id, p);
                }
            }
        }
        for class in classes {
            if let Some(p) = self.policy.non_teaching_period(class.level) {
                self.block_period(&mut derived, EntityKind::Class, &class.id, p);
            }
        }

        derived
    }

    fn elective_slots(&self, subject: &Subject) -> Option<BTreeSet<Slot>> {
        let calendar = &self.policy.calendar;
        let slots: BTreeSet<Slot> = subject
            .applicable_levels()
            .into_iter()
            .filter_map(|level| self.policy.elective_window(level))
            .filter_map(|w| w.resolve(calendar))
            .flatten()
            .collect();
        (!slots.is_empty()).then_some(slots)
    }

    fn block_period(
        &self,
        derived: &mut BTreeMap<ConstraintKey, ConstraintEntry>,
        entity_kind: EntityKind,
        entity_id: &str,
        period: u32,
    ) {
        let calendar = &self.policy.calendar;
        let Some(p) = calendar.period_index(period) else {
            return;
        };
        for d in 0..calendar.day_count() {
            put(
                derived,
                entity_kind,
                entity_id,
                Slot::new(d, p),
                ConstraintKind::Unavailable,
                NON_TEACHING_REASON,
                self.policy,
            );
        }
    }
}

fn put(
    derived: &mut BTreeMap<ConstraintKey, ConstraintEntry>,
    entity_kind: EntityKind,
    entity_id: &str,
    slot: Slot,
    kind: ConstraintKind,
    reason: &str,
    policy: &Policy,
) {
    let calendar = &policy.calendar;
    derived.insert(
        ConstraintKey {
            entity_kind,
            entity_id: entity_id.to_string(),
            day: calendar.day_name(slot).to_string(),
            period: calendar.period_number(slot),
        },
        ConstraintEntry {
            kind,
            reason: Some(reason.to_string()),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayPeriods, Level, PeriodWindow};

    fn club() -> Subject {
        Subject::new("CLUB", 2).with_level(Level::Middle).elective()
    }

    #[test]
    fn test_elective_window_derivation() {
        let policy = Policy::default();
        let out = ConstraintNormalizer::new(&policy).normalize(&[club()], &[], &ConstraintSet::new());
        let set = &out.constraints;

        assert_eq!(
            set.kind_at(EntityKind::Subject, "CLUB", "Thursday", 7),
            Some(ConstraintKind::Preferred)
        );
        assert_eq!(
            set.kind_at(EntityKind::Subject, "CLUB", "Thursday", 8),
            Some(ConstraintKind::Preferred)
        );
        assert!(set.is_unavailable(EntityKind::Subject, "CLUB", "Thursday", 9));
        assert!(set.is_unavailable(EntityKind::Subject, "CLUB", "Monday", 7));
        // 50 calendar slots for one subject
        assert_eq!(set.len(), 50);
        assert!(out.overrides.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_elective_union_across_levels() {
        let policy = Policy::default().with_non_teaching_period(Level::Primary, None);
        let subject = Subject::new("CLUB", 2)
            .with_level(Level::Primary)
            .with_level(Level::Middle)
            .elective();
        let out = ConstraintNormalizer::new(&policy).normalize(&[subject], &[], &ConstraintSet::new());
        let set = &out.constraints;
        for p in [7, 8, 9, 10] {
            assert_eq!(
                set.kind_at(EntityKind::Subject, "CLUB", "Thursday", p),
                Some(ConstraintKind::Preferred),
                "period {p}"
            );
        }
        // Middle lunch still blocks period 6
        assert!(set.is_unavailable(EntityKind::Subject, "CLUB", "Thursday", 6));
    }

    #[test]
    fn test_non_teaching_period_for_subjects_and_classes() {
        let policy = Policy::default();
        let subject = Subject::new("MATH", 4).with_level(Level::Primary);
        let class = ClassGroup::new("7A", Level::Middle);
        let out = ConstraintNormalizer::new(&policy).normalize(&[subject], &[class], &ConstraintSet::new());
        let set = &out.constraints;

        for day in &policy.calendar.days {
            assert!(set.is_unavailable(EntityKind::Subject, "MATH", day, 5));
            assert!(set.is_unavailable(EntityKind::Class, "7A", day, 6));
        }
        assert!(!set.is_unavailable(EntityKind::Subject, "MATH", "Monday", 6));
        assert_eq!(set.len(), 10);
    }

    #[test]
    fn test_override_recorded_only_on_kind_change() {
        let policy = Policy::default();
        let user = ConstraintSet::new()
            .with(Constraint::subject_preferred("MATH", "Monday", 5))
            .with(Constraint::subject_unavailable("MATH", "Tuesday", 5).with_reason("user"))
            .with(Constraint::subject_preferred("MATH", "Monday", 1));
        let subject = Subject::new("MATH", 4).with_level(Level::Primary);

        let out = ConstraintNormalizer::new(&policy).normalize(&[subject], &[], &user);
        assert_eq!(out.overrides.len(), 1);
        let o = &out.overrides[0];
        assert_eq!(o.key.day, "Monday");
        assert_eq!(o.previous, ConstraintKind::Preferred);
        assert_eq!(o.derived, ConstraintKind::Unavailable);
        // Untouched user entry survives
        assert_eq!(
            out.constraints.kind_at(EntityKind::Subject, "MATH", "Monday", 1),
            Some(ConstraintKind::Preferred)
        );
    }

    #[test]
    fn test_idempotent() {
        let policy = Policy::default()
            .with_elective_window(Level::Primary, Some(PeriodWindow::new("Thursday", 4, 2)))
            .with_special_window("ade", DayPeriods::new("Tuesday", vec![4, 5, 7]));
        let subjects = vec![
            Subject::new("CLUB", 2).with_level(Level::Primary).elective(),
            Subject::new("ADE", 2).windowed("ade"),
            Subject::new("TR", 5).with_level(Level::Primary),
        ];
        let classes = vec![ClassGroup::new("3A", Level::Primary)];
        let user = ConstraintSet::new().with(Constraint::teacher_unavailable("T1", "Friday", 1));

        let normalizer = ConstraintNormalizer::new(&policy);
        let first = normalizer.normalize(&subjects, &classes, &user);
        let second = normalizer.normalize(&subjects, &classes, &first.constraints);

        assert_eq!(first.constraints, second.constraints);
        assert!(second.overrides.is_empty());
        // Lunch (period 5) wins over the elective window on Thursday
        assert!(first
            .constraints
            .is_unavailable(EntityKind::Subject, "CLUB", "Thursday", 5));
        assert_eq!(
            first.constraints.kind_at(EntityKind::Subject, "ADE", "Tuesday", 7),
            Some(ConstraintKind::Preferred)
        );
    }

    #[test]
    fn test_missing_window_warning() {
        let policy = Policy::default();
        let subjects = vec![
            Subject::new("PLAY", 2).with_level(Level::Preschool).elective(),
            Subject::new("ADE", 2).windowed("ade"),
        ];
        let out = ConstraintNormalizer::new(&policy).normalize(&subjects, &[], &ConstraintSet::new());
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings.iter().all(|w| w.kind == WarningKind::MissingWindow));
        // Only the non-teaching periods are derived
        assert_eq!(out.constraints.kind_at(EntityKind::Subject, "ADE", "Monday", 1), None);
        assert!(out.constraints.is_unavailable(EntityKind::Subject, "ADE", "Monday", 5));
    }
}
