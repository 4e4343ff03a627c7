//! Placement engine and KPI evaluation.
//!
//! Turns compiled demand and normalized constraints into teacher and class
//! grids.
//!
//! # Algorithm
//!
//! `PlacementEngine` is a multi-phase greedy heuristic (elective window →
//! specially-windowed → home-room/core → normal) over a single
//! [`RunContext`] that owns every grid and counter. Failed blocks are split
//! and requeued; hours never placed are reported as residual demand. It is
//! not optimal, but it is fast and deterministic under a fixed seed.
//!
//! # KPI
//!
//! `TimetableKpi` computes placement rate, teacher idle periods, teacher
//! load and class daily spread.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

mod context;
mod engine;
mod kpi;
mod result;
mod task;

pub use context::{Rejection, RunContext};
pub use engine::{EngineConfig, PlacementEngine};
pub use kpi::TimetableKpi;
pub use result::{ResidualDemand, ScheduleResult, Statistics};
pub use task::{block_lengths, phase_for, Phase, PlacementTask, TaskQueue, TaskState};
