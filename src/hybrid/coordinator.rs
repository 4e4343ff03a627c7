//! Draft-then-complete coordination.
//!
//! # Algorithm
//!
//! 1. Ask the [`DraftSource`] for a candidate on a worker thread and wait
//!    at most the budget. No answer by then is a timeout; the worker is left
//!    to finish on its own and its answer is dropped.
//! 2. Validate every draft cell against the same rules the engine uses:
//!    known slot, matching demand with hours left, then
//!    [`RunContext::try_place`] on the single slot. Accepted cells count
//!    toward the demand's satisfied hours; rejected cells become warnings.
//! 3. Hand the context to [`PlacementEngine::complete`], which places only
//!    the shortfall into free slots. Draft cells are never moved.
//!
//! Any service failure falls back to a pure engine run with one
//! `UpstreamServiceFailure` warning.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::draft::{CandidateDraft, DraftCell, DraftError, DraftRequest, SharedDraftSource};
use crate::models::{Catalog, ConstraintSet, DemandRecord, Policy, Warning, WarningKind};
use crate::scheduler::{EngineConfig, PlacementEngine, RunContext, ScheduleResult};

/// Default wall-clock budget for the drafting service.
pub const DEFAULT_DRAFT_BUDGET: Duration = Duration::from_secs(30);

/// Combines an external draft with engine completion.
pub struct HybridCoordinator<'a> {
    policy: &'a Policy,
    config: EngineConfig,
    source: SharedDraftSource,
    budget: Duration,
}

impl<'a> HybridCoordinator<'a> {
    /// Creates a coordinator with [`DEFAULT_DRAFT_BUDGET`].
    pub fn new(policy: &'a Policy, config: EngineConfig, source: SharedDraftSource) -> Self {
        Self {
            policy,
            config,
            source,
            budget: DEFAULT_DRAFT_BUDGET,
        }
    }

    /// Sets the drafting budget.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Drafts, validates and completes a timetable.
    pub fn run(
        &self,
        catalog: &Catalog,
        constraints: &ConstraintSet,
        demands: &[DemandRecord],
    ) -> ScheduleResult {
        let engine = PlacementEngine::new(self.policy, self.config.clone());
        match self.request_draft(constraints, demands) {
            Ok(draft) => {
                let mut ctx = RunContext::new(self.policy, constraints, catalog, demands);
                let mut demands = demands.to_vec();
                let mut warnings = apply_draft(&mut ctx, &mut demands, &draft);
                let mut result = engine.complete(ctx, &demands);
                warnings.append(&mut result.warnings);
                result.warnings = warnings;
                result
            }
            Err(e) => {
                warn!(error = %e, "drafting service failed, using engine only");
                let mut result = engine.run(catalog, constraints, demands);
                result.warnings.insert(
                    0,
                    Warning::new(WarningKind::UpstreamServiceFailure, "", e.to_string()),
                );
                result
            }
        }
    }

    fn request_draft(
        &self,
        constraints: &ConstraintSet,
        demands: &[DemandRecord],
    ) -> Result<CandidateDraft, DraftError> {
        let request = DraftRequest::new(&self.policy.calendar, demands, constraints);
        let source = Arc::clone(&self.source);
        let budget = self.budget;
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("draft-source".into())
            .spawn(move || {
                let answer = source.draft(&request, budget);
                if tx.send(answer).is_err() {
                    debug!("draft answer arrived after the budget, dropped");
                }
            })
            .map_err(|e| DraftError::Transport(format!("cannot start drafting worker: {e}")))?;

        let draft = match rx.recv_timeout(budget) {
            Ok(answer) => answer?,
            Err(RecvTimeoutError::Timeout) => return Err(DraftError::Timeout(budget)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(DraftError::Transport("drafting worker stopped without an answer".into()))
            }
        };
        if draft.is_empty() {
            return Err(DraftError::Empty);
        }
        Ok(draft)
    }
}

/// Places every valid draft cell; returns one warning per rejected cell.
fn apply_draft(
    ctx: &mut RunContext<'_>,
    demands: &mut [DemandRecord],
    draft: &CandidateDraft,
) -> Vec<Warning> {
    let mut rejected = Vec::new();
    let mut accepted = 0usize;

    for (teacher_id, day, period, cell) in draft.cells() {
        match apply_cell(ctx, demands, teacher_id, day, period, cell) {
            Ok(()) => accepted += 1,
            Err(reason) => rejected.push(Warning::new(
                WarningKind::DraftCellRejected,
                teacher_id,
                format!(
                    "{day} {period}: {}/{} rejected: {reason}",
                    cell.class_id, cell.subject_id
                ),
            )),
        }
    }

    info!(accepted, rejected = rejected.len(), "draft applied");
    rejected
}

fn apply_cell(
    ctx: &mut RunContext<'_>,
    demands: &mut [DemandRecord],
    teacher_id: &str,
    day: &str,
    period: &str,
    cell: &DraftCell,
) -> Result<(), String> {
    let number: u32 = period
        .trim()
        .parse()
        .map_err(|_| format!("unknown period '{period}'"))?;
    let slot = ctx
        .calendar()
        .slot(day, number)
        .ok_or_else(|| "slot outside the calendar".to_string())?;

    let demand = demands
        .iter_mut()
        .find(|d| {
            d.teacher_id == teacher_id && d.class_id == cell.class_id && d.subject_id == cell.subject_id
        })
        .ok_or_else(|| "no matching demand".to_string())?;
    if demand.remaining_hours() == 0 {
        return Err("demand already satisfied".into());
    }

    ctx.try_place(demand, &[slot]).map_err(|r| r.to_string())?;
    demand.satisfied_hours += 1;
    Ok(())
}
