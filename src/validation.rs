//! Input validation for timetable runs.
//!
//! Checks structural integrity of the catalog, the user constraints and the
//! policy before anything is compiled. Detects:
//! - Duplicate IDs
//! - References to unknown teachers, classes or subjects
//! - Constraints and windows that fall outside the calendar
//! - An empty calendar or an unusable policy value
//! - Teachers without levels
//! - Distribution patterns on zero-hour subjects
//!
//! Validation never aborts a run. The pipeline reports every error and the
//! affected items are skipped further down (unknown IDs resolve to nothing,
//! out-of-calendar cells never match a slot).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Catalog, ConstraintSet, EntityKind, Policy};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Two entities of the same kind share an ID.
    DuplicateId,
    /// A reference points to an entity that doesn't exist.
    UnknownReference,
    /// A constraint names a day or period the calendar doesn't have.
    ConstraintOutsideCalendar,
    /// The calendar has no day or no period.
    EmptyCalendar,
    /// A configured window doesn't resolve to calendar slots.
    WindowOutsideCalendar,
    /// A teacher has no eligible level.
    EmptyLevels,
    /// A subject with zero weekly hours declares a distribution.
    ZeroHoursWithPattern,
    /// A policy value is out of range.
    InvalidPolicy,
    /// A subject needs more weekly hours than the calendar has slots.
    HoursExceedCalendar,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input of a timetable run.
///
/// Checks:
/// 1. No duplicate teacher, class or subject IDs
/// 2. Every teacher has at least one level
/// 3. Home-room and assignment references point to known entities
/// 4. Subjects with zero hours carry no distribution and no subject needs
///    more hours than the calendar has slots
/// 5. The calendar is non-empty and the policy is usable
/// 6. Elective and special windows resolve inside the calendar
/// 7. Every constraint names a calendar cell and a known entity
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    catalog: &Catalog,
    constraints: &ConstraintSet,
    policy: &Policy,
) -> ValidationResult {
    let mut errors = Vec::new();

    let teacher_ids = collect_ids(
        catalog.teachers.iter().map(|t| t.id.as_str()),
        "teacher",
        &mut errors,
    );
    let class_ids = collect_ids(
        catalog.classes.iter().map(|c| c.id.as_str()),
        "class",
        &mut errors,
    );
    let subject_ids = collect_ids(
        catalog.subjects.iter().map(|s| s.id.as_str()),
        "subject",
        &mut errors,
    );

    for teacher in &catalog.teachers {
        if teacher.levels.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyLevels,
                format!("Teacher '{}' has no eligible level", teacher.id),
            ));
        }
    }

    for class in &catalog.classes {
        if let Some(hr) = &class.home_room_teacher_id {
            if !teacher_ids.contains(hr.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!(
                        "Class '{}' references unknown home-room teacher '{}'",
                        class.id, hr
                    ),
                ));
            }
        }
        for assignment in &class.assignments {
            if !teacher_ids.contains(assignment.teacher_id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!(
                        "Class '{}' references unknown teacher '{}'",
                        class.id, assignment.teacher_id
                    ),
                ));
            }
            for sid in &assignment.subject_ids {
                if !subject_ids.contains(sid.as_str()) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownReference,
                        format!("Class '{}' references unknown subject '{}'", class.id, sid),
                    ));
                }
            }
        }
    }

    let capacity = policy.calendar.slot_count();
    for subject in &catalog.subjects {
        if capacity > 0 && subject.weekly_hours as usize > capacity {
            errors.push(ValidationError::new(
                ValidationErrorKind::HoursExceedCalendar,
                format!(
                    "Subject '{}' needs {} weekly hours but the calendar has {} slots",
                    subject.id, subject.weekly_hours, capacity
                ),
            ));
        }
        if subject.weekly_hours == 0 && subject.distribution.is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroHoursWithPattern,
                format!(
                    "Subject '{}' has zero weekly hours but declares a distribution",
                    subject.id
                ),
            ));
        }
    }

    let calendar = &policy.calendar;
    if calendar.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyCalendar,
            format!(
                "Calendar has {} day(s) and {} period(s)",
                calendar.day_count(),
                calendar.period_count()
            ),
        ));
    } else if policy.max_consecutive_hours == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidPolicy,
            "max_consecutive_hours must be at least 1",
        ));
    }

    if !calendar.is_empty() {
        for (level, window) in &policy.elective_windows {
            if window.resolve(calendar).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::WindowOutsideCalendar,
                    format!(
                        "Elective window for {} ({} {}+{}) is outside the calendar",
                        level, window.day, window.start_period, window.length
                    ),
                ));
            }
        }
        for (category, window) in &policy.special_windows {
            if window.resolve(calendar).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::WindowOutsideCalendar,
                    format!(
                        "Special window '{}' ({} {:?}) is outside the calendar",
                        category, window.day, window.periods
                    ),
                ));
            }
        }

        for c in constraints.iter() {
            if calendar.slot(&c.day, c.period).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ConstraintOutsideCalendar,
                    format!(
                        "Constraint on {:?} '{}' at {} {} is outside the calendar",
                        c.entity_kind, c.entity_id, c.day, c.period
                    ),
                ));
            }
        }
    }

    for c in constraints.iter() {
        let known = match c.entity_kind {
            EntityKind::Teacher => teacher_ids.contains(c.entity_id.as_str()),
            EntityKind::Class => class_ids.contains(c.entity_id.as_str()),
            EntityKind::Subject => subject_ids.contains(c.entity_id.as_str()),
        };
        if !known {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!(
                    "Constraint references unknown {:?} '{}'",
                    c.entity_kind, c.entity_id
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    what: &str,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {what} ID: {id}"),
            ));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClassAssignment, ClassGroup, Constraint, DayPeriods, Level, PeriodWindow, Subject,
        Teacher, WeekCalendar,
    };

    fn sample_catalog() -> Catalog {
        Catalog::new()
            .with_teacher(Teacher::new("T1", Level::Primary).with_name("Ayşe"))
            .with_teacher(Teacher::new("T2", Level::Middle).with_subject("MATH"))
            .with_subject(Subject::new("TR", 5))
            .with_subject(Subject::new("MATH", 4).with_distribution(vec![2, 2]))
            .with_class(
                ClassGroup::new("3A", Level::Primary)
                    .with_home_room_teacher("T1")
                    .with_assignment(ClassAssignment::new("T1", ["TR"])),
            )
            .with_class(
                ClassGroup::new("7A", Level::Middle)
                    .with_assignment(ClassAssignment::new("T2", ["MATH"])),
            )
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_input() {
        let constraints =
            ConstraintSet::new().with(Constraint::teacher_unavailable("T1", "Monday", 1));
        assert!(validate_input(&sample_catalog(), &constraints, &Policy::default()).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let catalog = sample_catalog()
            .with_teacher(Teacher::new("T1", Level::Middle))
            .with_subject(Subject::new("TR", 2));

        let errors =
            validate_input(&catalog, &ConstraintSet::new(), &Policy::default()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("teacher")));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("subject")));
    }

    #[test]
    fn test_unknown_references() {
        let catalog = sample_catalog().with_class(
            ClassGroup::new("3B", Level::Primary)
                .with_home_room_teacher("GHOST")
                .with_assignment(ClassAssignment::new("T1", ["NOPE"])),
        );
        let constraints =
            ConstraintSet::new().with(Constraint::class_unavailable("9Z", "Monday", 1));

        let errors = validate_input(&catalog, &constraints, &Policy::default()).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::UnknownReference; 3]
        );
    }

    #[test]
    fn test_constraint_outside_calendar() {
        let constraints = ConstraintSet::new()
            .with(Constraint::teacher_unavailable("T1", "Sunday", 1))
            .with(Constraint::teacher_unavailable("T1", "Monday", 11));

        let errors =
            validate_input(&sample_catalog(), &constraints, &Policy::default()).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::ConstraintOutsideCalendar; 2]
        );
    }

    #[test]
    fn test_empty_calendar() {
        let policy = Policy::default().with_calendar(WeekCalendar::new(["Monday"], vec![]));
        let errors =
            validate_input(&sample_catalog(), &ConstraintSet::new(), &policy).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::EmptyCalendar]);
    }

    #[test]
    fn test_window_outside_calendar() {
        let policy = Policy::default()
            .with_elective_window(Level::Middle, Some(PeriodWindow::new("Thursday", 10, 2)))
            .with_special_window("ade", DayPeriods::new("Saturday", vec![1]));
        let errors =
            validate_input(&sample_catalog(), &ConstraintSet::new(), &policy).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::WindowOutsideCalendar; 2]
        );
    }

    #[test]
    fn test_oversized_sizes_reported() {
        let policy = Policy::from_json_str(
            r#"{"elective_windows": {"middle": {"day": "Thursday", "start_period": 7, "length": 4294967295}}}"#,
        )
        .unwrap();
        let catalog = sample_catalog().with_subject(Subject::new("BIG", u32::MAX));

        let errors = validate_input(&catalog, &ConstraintSet::new(), &policy).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ValidationErrorKind::HoursExceedCalendar,
                ValidationErrorKind::WindowOutsideCalendar
            ]
        );
        assert!(errors[0].message.contains("50 slots"));
    }

    #[test]
    fn test_empty_levels_and_zero_hours_pattern() {
        let mut teacher = Teacher::new("T9", Level::Middle);
        teacher.levels.clear();
        let catalog = sample_catalog()
            .with_teacher(teacher)
            .with_subject(Subject::new("ART", 0).with_distribution(vec![1]));

        let errors =
            validate_input(&catalog, &ConstraintSet::new(), &Policy::default()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptyLevels));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::ZeroHoursWithPattern));
    }

    #[test]
    fn test_invalid_policy_value() {
        let policy = Policy::default().with_max_consecutive_hours(0);
        let errors =
            validate_input(&sample_catalog(), &ConstraintSet::new(), &policy).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidPolicy]);
        assert_eq!(
            errors[0].to_string(),
            "max_consecutive_hours must be at least 1"
        );
    }
}
