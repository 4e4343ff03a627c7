//! Placement tasks and the work queue.
//!
//! A placement task is one block of consecutive periods carved from a
//! demand. Tasks live in a per-phase binary heap; a block that cannot be
//! placed is split and both halves go back on the heap, so degradation is
//! an explicit loop rather than recursion.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::models::{DemandRecord, Policy, PriorityTier, SubjectKind};

/// Placement phase. Phases run strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Elective window, placed as one atomic block.
    Elective,
    /// Specially-windowed subjects, one hour at a time.
    Windowed,
    /// Home-room and core demands.
    Core,
    /// Everything else.
    Normal,
}

impl Phase {
    /// All phases in run order.
    pub const ALL: [Phase; 4] = [Phase::Elective, Phase::Windowed, Phase::Core, Phase::Normal];
}

/// Lifecycle of a task. There is no transition back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting in the queue.
    Pending,
    /// Written into the grids.
    Placed,
    /// Given up; its hours are residual.
    Abandoned,
}

/// A block awaiting placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementTask {
    /// Creation sequence, unique per run.
    pub seq: usize,
    /// Index of the owning demand.
    pub demand: usize,
    /// Block length in periods (≥ 1).
    pub length: u32,
    /// Phase the task belongs to.
    pub phase: Phase,
    /// Priority tier inherited from the demand.
    pub priority: PriorityTier,
    /// Current state.
    pub state: TaskState,
}

impl PlacementTask {
    /// Creates a pending task.
    pub fn new(seq: usize, demand: usize, length: u32, phase: Phase, priority: PriorityTier) -> Self {
        Self {
            seq,
            demand,
            length,
            phase,
            priority,
            state: TaskState::Pending,
        }
    }

    /// Halves of a failed block: `ceil(n/2)` and `floor(n/2)`.
    ///
    /// Returns `None` for a 1-period block, which cannot be split.
    pub fn split_lengths(&self) -> Option<(u32, u32)> {
        (self.length > 1).then(|| (self.length.div_ceil(2), self.length / 2))
    }
}

/// Heap order: longer blocks first, then higher priority, then older tasks.
impl Ord for PlacementTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.length
            .cmp(&other.length)
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PlacementTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of pending tasks for one phase.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<PlacementTask>,
}

impl TaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task.
    pub fn push(&mut self, task: PlacementTask) {
        self.heap.push(task);
    }

    /// Takes the next task.
    pub fn pop(&mut self) -> Option<PlacementTask> {
        self.heap.pop()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes every queued task, leaving the queue empty.
    pub fn drain(&mut self) -> impl Iterator<Item = PlacementTask> + '_ {
        self.heap.drain()
    }
}

/// Block lengths for a demand's remaining hours.
///
/// The declared distribution is used only when patterns are enabled and the
/// demand is still completely unsatisfied; otherwise uniform 1-hour blocks.
/// Any block longer than `max_consecutive_hours` is cut into chunks of at
/// most that size. Hours beyond the calendar's slot count are never carved;
/// they end up as residual demand.
pub fn block_lengths(demand: &DemandRecord, policy: &Policy) -> Vec<u32> {
    let capacity = policy.calendar.slot_count() as u64;
    let remaining = u64::from(demand.remaining_hours()).min(capacity);
    let base = match &demand.distribution {
        Some(blocks)
            if policy.use_distribution_patterns
                && demand.satisfied_hours == 0
                && blocks.iter().map(|&b| u64::from(b)).sum::<u64>() <= capacity =>
        {
            blocks.clone()
        }
        _ => vec![1; remaining as usize],
    };

    let max = policy.max_consecutive_hours.max(1);
    let mut out = Vec::with_capacity(base.len());
    for mut block in base.into_iter().filter(|&b| b > 0) {
        while block > max {
            out.push(max);
            block -= max;
        }
        out.push(block);
    }
    out
}

/// Phase a demand's tasks belong to.
///
/// Windowed subjects without a usable policy window fall through to the
/// ordinary phases.
pub fn phase_for(demand: &DemandRecord, policy: &Policy) -> Phase {
    match &demand.subject_kind {
        SubjectKind::Elective => Phase::Elective,
        SubjectKind::Windowed(category)
            if policy
                .special_window(category)
                .and_then(|w| w.resolve(&policy.calendar))
                .is_some() =>
        {
            Phase::Windowed
        }
        _ if demand.priority == PriorityTier::High => Phase::Core,
        _ => Phase::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayPeriods, Level};

    fn demand(hours: u32) -> DemandRecord {
        DemandRecord::new("7A", "MATH", "T1", Level::Middle, hours)
    }

    #[test]
    fn test_heap_order() {
        let mut q = TaskQueue::new();
        q.push(PlacementTask::new(0, 0, 1, Phase::Normal, PriorityTier::High));
        q.push(PlacementTask::new(1, 0, 2, Phase::Normal, PriorityTier::Low));
        q.push(PlacementTask::new(2, 0, 2, Phase::Normal, PriorityTier::Medium));
        q.push(PlacementTask::new(3, 0, 2, Phase::Normal, PriorityTier::Medium));

        let order: Vec<usize> = std::iter::from_fn(|| q.pop()).map(|t| t.seq).collect();
        assert_eq!(order, vec![2, 3, 1, 0]);
    }

    #[test]
    fn test_split_lengths() {
        let t = PlacementTask::new(0, 0, 5, Phase::Core, PriorityTier::High);
        assert_eq!(t.split_lengths(), Some((3, 2)));
        let t = PlacementTask::new(0, 0, 2, Phase::Core, PriorityTier::High);
        assert_eq!(t.split_lengths(), Some((1, 1)));
        let t = PlacementTask::new(0, 0, 1, Phase::Core, PriorityTier::High);
        assert_eq!(t.split_lengths(), None);
    }

    #[test]
    fn test_block_lengths_distribution() {
        let policy = Policy::default();
        let d = demand(4).with_distribution(vec![2, 2]);
        assert_eq!(block_lengths(&d, &policy), vec![2, 2]);

        // Pattern ignored once partially satisfied
        let mut partial = d.clone();
        partial.satisfied_hours = 1;
        assert_eq!(block_lengths(&partial, &policy), vec![1, 1, 1]);

        let off = policy.clone().with_distribution_patterns(false);
        assert_eq!(block_lengths(&d, &off), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_block_lengths_capped_by_calendar() {
        let policy = Policy::default();
        assert_eq!(block_lengths(&demand(u32::MAX), &policy).len(), 50);

        let patterned = demand(u32::MAX).with_distribution(vec![u32::MAX]);
        let lengths = block_lengths(&patterned, &policy);
        assert_eq!(lengths, vec![1; 50]);
    }

    #[test]
    fn test_block_lengths_pre_split() {
        let policy = Policy::default().with_max_consecutive_hours(2);
        let d = demand(6).with_distribution(vec![5, 1]);
        assert_eq!(block_lengths(&d, &policy), vec![2, 2, 1, 1]);
    }

    #[test]
    fn test_phase_for() {
        let policy = Policy::default().with_special_window("ade", DayPeriods::new("Tuesday", vec![4, 5]));
        assert_eq!(
            phase_for(&demand(2).with_subject_kind(SubjectKind::Elective), &policy),
            Phase::Elective
        );
        assert_eq!(
            phase_for(&demand(2).with_subject_kind(SubjectKind::Windowed("ade".into())), &policy),
            Phase::Windowed
        );
        assert_eq!(
            phase_for(&demand(2).with_subject_kind(SubjectKind::Windowed("none".into())), &policy),
            Phase::Normal
        );
        assert_eq!(
            phase_for(&demand(2).with_priority(PriorityTier::High), &policy),
            Phase::Core
        );
        assert_eq!(phase_for(&demand(2), &policy), Phase::Normal);
    }
}
