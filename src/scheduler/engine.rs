//! Multi-phase greedy placement engine.
//!
//! # Algorithm
//!
//! 1. Carve every demand's remaining hours into blocks and sort the blocks
//!    into four phases.
//! 2. Drain the phases strictly in order, each from its own max-heap
//!    (longest block, then priority tier, then creation order):
//!    - **Elective**: the level's elective window as one atomic block.
//!    - **Windowed**: 1-hour blocks, the subject's preferred slots first.
//!    - **Core**: home-room and core demands; days by ascending
//!      teacher-class load after a seeded shuffle; core subjects try the
//!      core periods first.
//!    - **Normal**: seeded shuffled day order, every start period.
//! 3. A block that fits nowhere is split into `ceil(n/2)` and `floor(n/2)`
//!    and both halves are requeued; a 1-hour block is abandoned.
//! 4. The iteration ceiling and the deadline are checked between attempts;
//!    once hit, every pending block is abandoned.
//!
//! There is no backtracking across phases. Hours never placed are reported
//! as residual demand.
//!
//! # Complexity
//! O(b · d · p) slot checks, where b = blocks (after splits), d = days,
//! p = periods per day.
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", Sec. 3: direct heuristics

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::context::RunContext;
use super::result::{ResidualDemand, ScheduleResult, Statistics};
use super::task::{block_lengths, phase_for, Phase, PlacementTask, TaskQueue, TaskState};
use crate::models::{
    Catalog, ConstraintSet, DemandRecord, Policy, Slot, Warning, WarningKind,
};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for day-order shuffling.
    pub seed: u64,
    /// Maximum number of block attempts.
    pub max_iterations: usize,
    /// Wall-clock budget, measured from the start of placement.
    pub time_limit: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_iterations: 5000,
            time_limit: None,
        }
    }
}

impl EngineConfig {
    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the iteration ceiling.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

/// Greedy placement engine.
///
/// # Example
///
/// ```
/// use u_timetable::models::{Catalog, ClassGroup, ConstraintSet, DemandRecord, Level, Policy, Teacher};
/// use u_timetable::scheduler::{EngineConfig, PlacementEngine};
///
/// let catalog = Catalog::new()
///     .with_teacher(Teacher::new("T1", Level::Middle))
///     .with_class(ClassGroup::new("7A", Level::Middle));
/// let demands = vec![
///     DemandRecord::new("7A", "MATH", "T1", Level::Middle, 4).with_distribution(vec![2, 2]),
/// ];
///
/// let policy = Policy::default();
/// let engine = PlacementEngine::new(&policy, EngineConfig::default());
/// let result = engine.run(&catalog, &ConstraintSet::new(), &demands);
/// assert_eq!(result.statistics.placed_hours, 4);
/// assert!(result.is_complete());
/// ```
#[derive(Debug, Clone)]
pub struct PlacementEngine<'a> {
    policy: &'a Policy,
    config: EngineConfig,
}

impl<'a> PlacementEngine<'a> {
    /// Creates an engine.
    pub fn new(policy: &'a Policy, config: EngineConfig) -> Self {
        Self { policy, config }
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Places `demands` on empty grids.
    pub fn run(
        &self,
        catalog: &Catalog,
        constraints: &ConstraintSet,
        demands: &[DemandRecord],
    ) -> ScheduleResult {
        let ctx = RunContext::new(self.policy, constraints, catalog, demands);
        self.complete(ctx, demands)
    }

    /// Places the remaining hours of `demands` into an existing context.
    ///
    /// `satisfied_hours` of each demand must equal the hours already present
    /// in `ctx`; only the shortfall is placed, and only into free slots.
    pub fn complete(&self, ctx: RunContext<'_>, demands: &[DemandRecord]) -> ScheduleResult {
        let mut run = Run::new(ctx, demands, &self.config);
        info!(
            demands = demands.len(),
            hours = demands.iter().map(|d| d.remaining_hours()).sum::<u32>(),
            seed = self.config.seed,
            "placement started"
        );

        run.generate();
        for phase in Phase::ALL {
            run.drain(phase);
        }
        run.finish()
    }
}

/// State of one engine invocation.
struct Run<'c, 'd> {
    ctx: RunContext<'c>,
    demands: &'d [DemandRecord],
    queues: [TaskQueue; 4],
    placed: Vec<u32>,
    warnings: Vec<Warning>,
    rng: StdRng,
    seq: usize,
    iterations: usize,
    max_iterations: usize,
    deadline: Option<Instant>,
    stopped: bool,
}

impl<'c, 'd> Run<'c, 'd> {
    fn new(ctx: RunContext<'c>, demands: &'d [DemandRecord], config: &EngineConfig) -> Self {
        Self {
            ctx,
            demands,
            queues: Default::default(),
            placed: vec![0; demands.len()],
            warnings: Vec::new(),
            rng: StdRng::seed_from_u64(config.seed),
            seq: 0,
            iterations: 0,
            max_iterations: config.max_iterations,
            deadline: config.time_limit.map(|limit| Instant::now() + limit),
            stopped: false,
        }
    }

    fn new_task(&mut self, demand: usize, length: u32, phase: Phase) -> PlacementTask {
        let task = PlacementTask::new(self.seq, demand, length, phase, self.demands[demand].priority);
        self.seq += 1;
        task
    }

    fn generate(&mut self) {
        let policy = self.ctx.policy();
        let demands = self.demands;

        for (i, demand) in demands.iter().enumerate() {
            let remaining = demand.remaining_hours();
            if remaining == 0 {
                continue;
            }
            let phase = phase_for(demand, policy);
            let lengths = match phase {
                Phase::Elective => {
                    let Some(window) = self.elective_window(demand) else {
                        self.warnings.push(Warning::new(
                            WarningKind::MissingWindow,
                            format!("{}/{}", demand.class_id, demand.subject_id),
                            format!("no elective window configured for level {}", demand.level),
                        ));
                        continue;
                    };
                    let length = remaining.min(window.len() as u32);
                    if remaining > length {
                        self.warnings.push(Warning::new(
                            WarningKind::ElectiveExcessHours,
                            format!("{}/{}", demand.class_id, demand.subject_id),
                            format!(
                                "{} hour(s) requested but the window holds {}",
                                remaining, length
                            ),
                        ));
                    }
                    vec![length]
                }
                Phase::Windowed => {
                    let capacity = policy.calendar.slot_count() as u32;
                    vec![1; remaining.min(capacity) as usize]
                }
                Phase::Core | Phase::Normal => block_lengths(demand, policy),
            };
            for length in lengths {
                let task = self.new_task(i, length, phase);
                self.queues[phase as usize].push(task);
            }
        }
    }

    fn drain(&mut self, phase: Phase) {
        let mut queue = std::mem::take(&mut self.queues[phase as usize]);
        debug!(?phase, tasks = queue.len(), "phase started");
        let demands = self.demands;
        let mut abandoned = 0usize;

        while let Some(mut task) = queue.pop() {
            if self.budget_exhausted() {
                task.state = TaskState::Abandoned;
                abandoned += 1 + queue.drain().count();
                break;
            }
            self.iterations += 1;

            let demand = &demands[task.demand];
            if !self.ctx.is_eligible(demand) {
                error!(
                    teacher = %demand.teacher_id,
                    class = %demand.class_id,
                    level = %demand.level,
                    "placement would break level eligibility; task dropped"
                );
                self.warnings.push(Warning::new(
                    WarningKind::AlgorithmViolation,
                    format!("{}/{}", demand.class_id, demand.subject_id),
                    format!(
                        "teacher '{}' is not eligible for level {}; {} hour(s) dropped",
                        demand.teacher_id, demand.level, task.length
                    ),
                ));
                task.state = TaskState::Abandoned;
                abandoned += 1;
                continue;
            }

            let ok = match phase {
                Phase::Elective => self.place_elective(demand, task.length),
                Phase::Windowed => self.place_windowed(demand),
                Phase::Core | Phase::Normal => self.place_block(demand, task.length, phase),
            };

            if ok {
                task.state = TaskState::Placed;
                self.placed[task.demand] += task.length;
                continue;
            }

            if phase == Phase::Elective {
                self.warnings.push(Warning::new(
                    WarningKind::ElectiveWindowBlocked,
                    format!("{}/{}", demand.class_id, demand.subject_id),
                    "elective window is not free for this class and teacher",
                ));
                task.state = TaskState::Abandoned;
                abandoned += 1;
                continue;
            }

            match task.split_lengths() {
                Some((a, b)) => {
                    debug!(
                        class = %demand.class_id,
                        subject = %demand.subject_id,
                        length = task.length,
                        "block split into {a} + {b}"
                    );
                    let first = self.new_task(task.demand, a, phase);
                    let second = self.new_task(task.demand, b, phase);
                    queue.push(first);
                    queue.push(second);
                }
                None => {
                    task.state = TaskState::Abandoned;
                    abandoned += 1;
                }
            }
        }

        debug!(?phase, abandoned, iterations = self.iterations, "phase finished");
    }

    /// Checks the iteration ceiling and deadline, warning once when either hits.
    fn budget_exhausted(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        let kind = if self.iterations >= self.max_iterations {
            WarningKind::IterationLimit
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            WarningKind::DeadlineExceeded
        } else {
            return false;
        };

        warn!(?kind, iterations = self.iterations, "placement stopped early");
        self.warnings.push(Warning::new(
            kind,
            "",
            format!(
                "placement stopped after {} attempt(s); pending blocks abandoned",
                self.iterations
            ),
        ));
        self.stopped = true;
        true
    }

    fn elective_window(&self, demand: &DemandRecord) -> Option<Vec<Slot>> {
        let policy = self.ctx.policy();
        policy
            .elective_window(demand.level)
            .and_then(|w| w.resolve(&policy.calendar))
    }

    /// Places the window block, counting window slots that already hold
    /// this demand's lesson (from a draft) as part of the block.
    fn place_elective(&mut self, demand: &DemandRecord, length: u32) -> bool {
        let Some(window) = self.elective_window(demand) else {
            return false;
        };
        let holds_own = |slot: Slot| {
            self.ctx
                .class_grid(&demand.class_id)
                .and_then(|g| g.get(slot).lesson())
                .is_some_and(|l| l.teacher_id == demand.teacher_id && l.subject_id == demand.subject_id)
        };
        let own = window.iter().filter(|&&s| holds_own(s)).count();
        let span = (own + length as usize).min(window.len());
        let slots: Vec<Slot> = window[..span].iter().copied().filter(|&s| !holds_own(s)).collect();
        if slots.len() != length as usize {
            return false;
        }
        self.ctx.try_place(demand, &slots).is_ok()
    }

    fn place_windowed(&mut self, demand: &DemandRecord) -> bool {
        let mut candidates = self.ctx.preferred_slots(&demand.subject_id);
        if candidates.is_empty() {
            candidates = self.ctx.calendar().slots().collect();
        }
        candidates
            .into_iter()
            .any(|slot| self.ctx.try_place(demand, &[slot]).is_ok())
    }

    fn place_block(&mut self, demand: &DemandRecord, length: u32, phase: Phase) -> bool {
        let calendar = self.ctx.calendar();
        let policy = self.ctx.policy();

        let mut days: Vec<usize> = (0..calendar.day_count()).collect();
        days.shuffle(&mut self.rng);
        if phase == Phase::Core {
            days.sort_by_key(|&d| {
                self.ctx
                    .pair_day_hours(&demand.teacher_id, &demand.class_id, d)
            });
        }

        let mut starts: Vec<usize> = (0..calendar.period_count()).collect();
        if phase == Phase::Core && demand.core {
            starts.sort_by_key(|&p| !policy.core_periods.contains(&calendar.periods[p]));
        }

        for day in days {
            for &start in &starts {
                let Some(slots) = self.ctx.block_slots(Slot::new(day, start), length) else {
                    continue;
                };
                if self.ctx.try_place(demand, &slots).is_ok() {
                    return true;
                }
            }
        }
        false
    }

    fn finish(self) -> ScheduleResult {
        let mut statistics = Statistics::default();
        for (demand, &placed) in self.demands.iter().zip(&self.placed) {
            let have = demand.satisfied_hours.saturating_add(placed).min(demand.weekly_hours);
            statistics.total_demanded_hours =
                statistics.total_demanded_hours.saturating_add(demand.weekly_hours);
            statistics.placed_hours += have;
            if have < demand.weekly_hours {
                statistics.residual.push(ResidualDemand {
                    class_id: demand.class_id.clone(),
                    subject_id: demand.subject_id.clone(),
                    teacher_id: demand.teacher_id.clone(),
                    missing_hours: demand.weekly_hours - have,
                });
            }
        }

        let mut warnings = self.warnings;
        if !statistics.residual.is_empty() {
            warnings.push(Warning::new(
                WarningKind::ResidualDemand,
                "",
                format!(
                    "{} hour(s) across {} demand(s) could not be placed",
                    statistics.missing_hours(),
                    statistics.residual.len()
                ),
            ));
        }

        info!(
            placed = statistics.placed_hours,
            total = statistics.total_demanded_hours,
            residual = statistics.residual.len(),
            iterations = self.iterations,
            "placement finished"
        );

        let (teacher_grids, class_grids) = self.ctx.into_grids();
        ScheduleResult {
            teacher_grids,
            class_grids,
            statistics,
            warnings,
            errors: Vec::new(),
        }
    }
}
