//! Timetabling domain models.
//!
//! Provides the catalogs a run reads (teachers, classes, subjects), the
//! grid vocabulary (calendar, slots, windows), the derived run data
//! (constraints, demand) and the solution types (grids, warnings).
//!
//! # Domain Mappings
//!
//! | u-timetable | Generic scheduling |
//! |-------------|--------------------|
//! | Teacher | Resource (human) |
//! | ClassGroup | Resource (group) |
//! | DemandRecord | Task |
//! | Lesson | Assignment |
//! | WeekGrid | Schedule (per resource) |

mod calendar;
mod catalog;
mod class_group;
mod constraint;
mod demand;
mod grid;
mod level;
mod policy;
mod subject;
mod teacher;
mod warning;

pub use calendar::{DayPeriods, PeriodWindow, Slot, WeekCalendar};
pub use catalog::{Catalog, CatalogIndex, Selection};
pub use class_group::{ClassAssignment, ClassGroup};
pub use constraint::{
    Constraint, ConstraintEntry, ConstraintKey, ConstraintKind, ConstraintSet, EntityKind,
};
pub use demand::{DemandRecord, PriorityTier};
pub use grid::{GridSlot, Lesson, WeekGrid};
pub use level::Level;
pub use policy::{Policy, PolicyError};
pub use subject::{parse_distribution, DistributionParseError, Subject, SubjectKind};
pub use teacher::Teacher;
pub use warning::{Warning, WarningKind};
