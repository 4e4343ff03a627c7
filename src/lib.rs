//! Weekly school timetable synthesis.
//!
//! Given teachers, classes, subjects with weekly hour counts and a set of
//! per-entity time constraints, produces a conflict-free teacher and class
//! grid for one week.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Teacher`, `ClassGroup`, `Subject`,
//!   `WeekCalendar`, `Constraint`, `DemandRecord`, `WeekGrid`, `Policy`
//! - **`validation`**: Input integrity checks (duplicate IDs, unknown
//!   references, calendar bounds)
//! - **`compiler`**: Class assignments → prioritized demand records
//! - **`normalize`**: Elective windows, special windows and non-teaching
//!   periods → derived constraints
//! - **`scheduler`**: Multi-phase greedy placement engine and KPIs
//! - **`hybrid`**: External draft validation and engine completion
//! - **`pipeline`**: One-call orchestration of the stages above
//!
//! # Example
//!
//! ```
//! use u_timetable::models::{Catalog, ClassAssignment, ClassGroup, Level, Policy, Subject, Teacher};
//! use u_timetable::pipeline::{generate, RunInput};
//! use u_timetable::scheduler::{EngineConfig, TimetableKpi};
//!
//! let catalog = Catalog::new()
//!     .with_teacher(Teacher::new("T1", Level::Primary).with_branch("Classroom"))
//!     .with_subject(Subject::new("TR", 6).with_branch("Classroom").core())
//!     .with_class(
//!         ClassGroup::new("3A", Level::Primary)
//!             .with_home_room_teacher("T1")
//!             .with_assignment(ClassAssignment::new("T1", ["TR"])),
//!     );
//!
//! let result = generate(&RunInput::new(catalog, Policy::default()), &EngineConfig::default());
//! assert!(result.is_complete());
//! assert!(TimetableKpi::calculate(&result).placement_rate > 0.99);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

pub mod compiler;
pub mod hybrid;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scheduler;
pub mod validation;
