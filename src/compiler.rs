//! Demand compilation.
//!
//! Turns the per-class teacher/subject assignments declared in the catalog
//! into a normalized, deduplicated, priority-tagged list of
//! [`DemandRecord`]s.
//!
//! # Rules
//!
//! 1. Classes are visited in catalog order, assignments in declared order.
//! 2. An assignment whose teacher does not teach the class level is skipped
//!    with a warning, never silently.
//! 3. `(class, subject)` is unique: the first occurrence wins.
//! 4. Priority is `High` for the home-room teacher at a home-room level and
//!    for core subjects, `Low` when the teacher is not certified for the
//!    subject, `Medium` otherwise.
//! 5. A distribution whose blocks do not sum to the weekly hours is
//!    dropped with a warning; the demand falls back to 1-hour blocks.
//! 6. Home-room demands come first in the output, then all others.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::models::{
    Catalog, ClassGroup, DemandRecord, Policy, PriorityTier, Selection, Warning, WarningKind,
};

/// Output of [`DemandCompiler::compile`].
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    /// Ordered demand list.
    pub demands: Vec<DemandRecord>,
    /// Compilation warnings.
    pub warnings: Vec<Warning>,
}

impl Compilation {
    /// Total weekly hours demanded.
    pub fn total_hours(&self) -> u32 {
        self.demands.iter().map(|d| d.weekly_hours).sum()
    }
}

/// Compiles class assignments into demand records.
///
/// # Example
///
/// ```
/// use u_timetable::compiler::DemandCompiler;
/// use u_timetable::models::{
///     Catalog, ClassAssignment, ClassGroup, Level, Policy, Selection, Subject, Teacher,
/// };
///
/// let catalog = Catalog::new()
///     .with_teacher(Teacher::new("T1", Level::Middle).with_subject("MATH"))
///     .with_subject(Subject::new("MATH", 4))
///     .with_class(
///         ClassGroup::new("7A", Level::Middle)
///             .with_assignment(ClassAssignment::new("T1", ["MATH"])),
///     );
///
/// let policy = Policy::default();
/// let out = DemandCompiler::new(&policy).compile(&catalog, &Selection::all());
/// assert_eq!(out.demands.len(), 1);
/// assert!(out.warnings.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct DemandCompiler<'a> {
    policy: &'a Policy,
}

impl<'a> DemandCompiler<'a> {
    /// Creates a compiler bound to a policy.
    pub fn new(policy: &'a Policy) -> Self {
        Self { policy }
    }

    /// Compiles the selected part of the catalog.
    pub fn compile(&self, catalog: &Catalog, selection: &Selection) -> Compilation {
        let index = catalog.index();
        let capacity = self.policy.calendar.slot_count();
        let mut warnings = Vec::new();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut seen_classes: HashSet<&str> = HashSet::new();
        let mut home_room_demands = Vec::new();
        let mut other_demands = Vec::new();

        for class in &catalog.classes {
            if !selection.has_class(&class.id) || !seen_classes.insert(class.id.as_str()) {
                continue;
            }

            for assignment in &class.assignments {
                let teacher_id = assignment.teacher_id.as_str();
                if !selection.has_teacher(teacher_id) {
                    continue;
                }
                let Some(teacher) = index.teacher(teacher_id) else {
                    warnings.push(Warning::new(
                        WarningKind::UnknownReference,
                        &class.id,
                        format!("assignment references unknown teacher '{teacher_id}'"),
                    ));
                    continue;
                };

                if !teacher.teaches_level(class.level) {
                    warnings.push(Warning::new(
                        WarningKind::LevelMismatch,
                        &class.id,
                        format!(
                            "teacher '{}' ({}) cannot teach class '{}' ({}); assignment skipped",
                            teacher.id,
                            join_levels(&teacher.levels),
                            class.id,
                            class.level
                        ),
                    ));
                    continue;
                }

                let home_room = is_home_room(class, teacher_id, self.policy);

                for subject_id in &assignment.subject_ids {
                    if !selection.has_subject(subject_id) {
                        continue;
                    }
                    let Some(subject) = index.subject(subject_id) else {
                        warnings.push(Warning::new(
                            WarningKind::UnknownReference,
                            &class.id,
                            format!("assignment references unknown subject '{subject_id}'"),
                        ));
                        continue;
                    };

                    if !subject.applies_to(class.level) {
                        warnings.push(Warning::new(
                            WarningKind::LevelMismatch,
                            &class.id,
                            format!(
                                "subject '{}' does not apply to level {}; skipped",
                                subject.id, class.level
                            ),
                        ));
                        continue;
                    }

                    if !seen.insert((class.id.as_str(), subject.id.as_str())) {
                        warnings.push(Warning::new(
                            WarningKind::DuplicateDemand,
                            format!("{}/{}", class.id, subject.id),
                            format!(
                                "subject '{}' already assigned to class '{}'; teacher '{}' ignored",
                                subject.id, class.id, teacher_id
                            ),
                        ));
                        continue;
                    }

                    if subject.weekly_hours == 0 {
                        debug!(class = %class.id, subject = %subject.id, "zero weekly hours, skipped");
                        continue;
                    }
                    if subject.weekly_hours as usize > capacity {
                        warn!(
                            class = %class.id,
                            subject = %subject.id,
                            hours = subject.weekly_hours,
                            "weekly hours exceed the calendar, skipped"
                        );
                        continue;
                    }

                    let distribution = match &subject.distribution {
                        Some(blocks) if !subject.distribution_matches() => {
                            warnings.push(Warning::new(
                                WarningKind::MalformedDistribution,
                                format!("{}/{}", class.id, subject.id),
                                format!(
                                    "distribution {:?} does not sum to {} weekly hours; using 1-hour blocks",
                                    blocks, subject.weekly_hours
                                ),
                            ));
                            None
                        }
                        other => other.clone(),
                    };

                    let uncertified = !home_room && !teacher.is_certified_for(subject);
                    if uncertified {
                        warnings.push(Warning::new(
                            WarningKind::UncertifiedTeacher,
                            format!("{}/{}", class.id, subject.id),
                            format!(
                                "teacher '{}' is not certified for '{}'; scheduled at low priority",
                                teacher_id, subject.id
                            ),
                        ));
                    }

                    let priority = if home_room || subject.core {
                        PriorityTier::High
                    } else if uncertified {
                        PriorityTier::Low
                    } else {
                        PriorityTier::Medium
                    };

                    let mut demand = DemandRecord::new(
                        &class.id,
                        &subject.id,
                        teacher_id,
                        class.level,
                        subject.weekly_hours,
                    )
                    .with_priority(priority)
                    .with_subject_kind(subject.kind.clone());
                    demand.distribution = distribution;
                    demand.home_room = home_room;
                    demand.core = subject.core;

                    if home_room {
                        home_room_demands.push(demand);
                    } else {
                        other_demands.push(demand);
                    }
                }
            }
        }

        let mut demands = home_room_demands;
        demands.extend(other_demands);

        if demands.is_empty() {
            warnings.push(Warning::new(
                WarningKind::NoDemand,
                "",
                "no valid teacher/subject assignment found for the selected classes",
            ));
        }

        for w in &warnings {
            warn!(kind = ?w.kind, entity = %w.entity_id, "{}", w.message);
        }
        debug!(
            demands = demands.len(),
            warnings = warnings.len(),
            "demand compilation finished"
        );

        Compilation { demands, warnings }
    }
}

fn is_home_room(class: &ClassGroup, teacher_id: &str, policy: &Policy) -> bool {
    class.is_home_room_teacher(teacher_id) && policy.is_home_room_level(class.level)
}

fn join_levels(levels: &[crate::models::Level]) -> String {
    levels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
