//! One-call orchestration.
//!
//! Chains the run stages in their fixed order:
//!
//! 1. [`validate_input`]: structural errors go to `ScheduleResult::errors`.
//!    An empty calendar or an unusable policy stops the run; anything else is
//!    skipped by the later stages and the run continues.
//! 2. [`DemandCompiler`]: assignments to demand records.
//! 3. [`ConstraintNormalizer`]: derived windows and non-teaching periods.
//! 4. [`PlacementEngine`] (or [`HybridCoordinator`] when a draft source is
//!    given).
//!
//! Compilation and normalization warnings come first in the result,
//! followed by placement warnings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::compiler::DemandCompiler;
use crate::hybrid::{HybridCoordinator, SharedDraftSource};
use crate::models::{Catalog, ConstraintSet, DemandRecord, Policy, Selection, Warning};
use crate::normalize::ConstraintNormalizer;
use crate::scheduler::{EngineConfig, PlacementEngine, ScheduleResult};
use crate::validation::{validate_input, ValidationError, ValidationErrorKind};

/// Everything a run reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunInput {
    /// Teachers, classes and subjects.
    pub catalog: Catalog,
    /// Entities in scope.
    pub selection: Selection,
    /// User constraints.
    pub constraints: ConstraintSet,
    /// Rule configuration.
    pub policy: Policy,
}

impl RunInput {
    /// Creates an input selecting the whole catalog.
    pub fn new(catalog: Catalog, policy: Policy) -> Self {
        Self {
            catalog,
            policy,
            ..Default::default()
        }
    }

    /// Sets the selection.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the user constraints.
    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    /// Parses an input from JSON. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Derived run data.
struct Prepared {
    demands: Vec<DemandRecord>,
    constraints: ConstraintSet,
    warnings: Vec<Warning>,
    errors: Vec<ValidationError>,
}

fn stops_run(error: &ValidationError) -> bool {
    matches!(
        error.kind,
        ValidationErrorKind::EmptyCalendar | ValidationErrorKind::InvalidPolicy
    )
}

fn prepare(input: &RunInput) -> Result<Prepared, Vec<ValidationError>> {
    let errors = validate_input(&input.catalog, &input.constraints, &input.policy)
        .err()
        .unwrap_or_default();
    if errors.iter().any(stops_run) {
        warn!(errors = errors.len(), "input rejected");
        return Err(errors);
    }
    if !errors.is_empty() {
        warn!(errors = errors.len(), "input has errors, affected items skipped");
    }

    let compiled = DemandCompiler::new(&input.policy).compile(&input.catalog, &input.selection);
    let normalized = ConstraintNormalizer::new(&input.policy).normalize(
        &input.catalog.subjects,
        &input.catalog.classes,
        &input.constraints,
    );
    info!(
        demands = compiled.demands.len(),
        hours = compiled.total_hours(),
        constraints = normalized.constraints.len(),
        overrides = normalized.overrides.len(),
        "run prepared"
    );

    let mut warnings = compiled.warnings;
    warnings.extend(normalized.warnings);
    Ok(Prepared {
        demands: compiled.demands,
        constraints: normalized.constraints,
        warnings,
        errors,
    })
}

fn finish(mut result: ScheduleResult, prepared: Prepared) -> ScheduleResult {
    let mut warnings = prepared.warnings;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    result.errors = prepared.errors;
    info!(
        placed = result.statistics.placed_hours,
        demanded = result.statistics.total_demanded_hours,
        warnings = result.warnings.len(),
        "run finished"
    );
    result
}

fn rejected(errors: Vec<ValidationError>) -> ScheduleResult {
    ScheduleResult {
        errors,
        ..Default::default()
    }
}

/// Generates a timetable with the placement engine alone.
///
/// # Example
///
/// ```
/// use u_timetable::models::{Catalog, ClassAssignment, ClassGroup, Level, Policy, Subject, Teacher};
/// use u_timetable::pipeline::{generate, RunInput};
/// use u_timetable::scheduler::EngineConfig;
///
/// let catalog = Catalog::new()
///     .with_teacher(Teacher::new("T1", Level::Middle).with_branch("Mathematics"))
///     .with_subject(Subject::new("MATH", 4).with_branch("Mathematics"))
///     .with_class(
///         ClassGroup::new("7A", Level::Middle)
///             .with_assignment(ClassAssignment::new("T1", ["MATH"])),
///     );
/// let result = generate(&RunInput::new(catalog, Policy::default()), &EngineConfig::default());
/// assert!(result.is_complete());
/// assert_eq!(result.statistics.placed_hours, 4);
/// ```
pub fn generate(input: &RunInput, config: &EngineConfig) -> ScheduleResult {
    let prepared = match prepare(input) {
        Ok(p) => p,
        Err(errors) => return rejected(errors),
    };
    let result = PlacementEngine::new(&input.policy, config.clone()).run(
        &input.catalog,
        &prepared.constraints,
        &prepared.demands,
    );
    finish(result, prepared)
}

/// Generates a timetable from an external draft completed by the engine.
pub fn generate_hybrid(
    input: &RunInput,
    config: &EngineConfig,
    source: SharedDraftSource,
    budget: Duration,
) -> ScheduleResult {
    let prepared = match prepare(input) {
        Ok(p) => p,
        Err(errors) => return rejected(errors),
    };
    let result = HybridCoordinator::new(&input.policy, config.clone(), source)
        .with_budget(budget)
        .run(&input.catalog, &prepared.constraints, &prepared.demands);
    finish(result, prepared)
}
