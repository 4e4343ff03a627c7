//! Timetable quality metrics (KPIs).
//!
//! Computes quality indicators from a finished [`ScheduleResult`].
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Placement Rate | placed hours / demanded hours |
//! | Teacher Gaps | Free periods between a teacher's first and last lesson of a day |
//! | Daily Spread | Per class, busiest day minus lightest day (lesson count) |
//! | Avg Teacher Load | Mean lessons per teacher per week |
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", Sec. 2: soft constraints

use std::collections::BTreeMap;

use super::ScheduleResult;
use crate::models::{Slot, WeekGrid};

/// Timetable quality indicators.
#[derive(Debug, Clone)]
pub struct TimetableKpi {
    /// Fraction of demanded hours placed (0.0..1.0).
    pub placement_rate: f64,
    /// Unplaced hours.
    pub missing_hours: u32,
    /// Sum of idle periods inside teachers' working days.
    pub total_teacher_gaps: usize,
    /// Idle periods per teacher.
    pub gaps_by_teacher: BTreeMap<String, usize>,
    /// Lessons per teacher.
    pub load_by_teacher: BTreeMap<String, usize>,
    /// Mean lessons per teacher.
    pub avg_teacher_load: f64,
    /// Busiest minus lightest day per class.
    pub spread_by_class: BTreeMap<String, usize>,
    /// Mean daily spread over classes.
    pub avg_daily_spread: f64,
}

impl TimetableKpi {
    /// Computes KPIs from a result.
    pub fn calculate(result: &ScheduleResult) -> Self {
        let mut gaps_by_teacher = BTreeMap::new();
        let mut load_by_teacher = BTreeMap::new();
        for (id, grid) in &result.teacher_grids {
            gaps_by_teacher.insert(id.clone(), idle_periods(grid));
            load_by_teacher.insert(id.clone(), grid.lesson_count());
        }

        let mut spread_by_class = BTreeMap::new();
        for (id, grid) in &result.class_grids {
            let days = grid.calendar().day_count();
            let loads = (0..days).map(|d| grid.day_load(d));
            let max = loads.clone().max().unwrap_or(0);
            let min = loads.min().unwrap_or(0);
            spread_by_class.insert(id.clone(), max - min);
        }

        let total_teacher_gaps = gaps_by_teacher.values().sum();
        let avg_teacher_load = mean(load_by_teacher.values().copied());
        let avg_daily_spread = mean(spread_by_class.values().copied());

        Self {
            placement_rate: result.statistics.placement_rate(),
            missing_hours: result.statistics.missing_hours(),
            total_teacher_gaps,
            gaps_by_teacher,
            load_by_teacher,
            avg_teacher_load,
            spread_by_class,
            avg_daily_spread,
        }
    }

    /// Whether the timetable meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_placement_rate: f64, max_teacher_gaps: usize) -> bool {
        self.placement_rate >= min_placement_rate && self.total_teacher_gaps <= max_teacher_gaps
    }
}

/// Free periods between the first and last lesson of each day.
///
/// Fixed slots (e.g., lunch) are not counted as idle.
fn idle_periods(grid: &WeekGrid) -> usize {
    let cal = grid.calendar();
    let mut idle = 0;
    for d in 0..cal.day_count() {
        let busy: Vec<usize> = grid
            .lessons()
            .filter(|(s, _)| s.day == d)
            .map(|(s, _)| s.period)
            .collect();
        let (Some(&first), Some(&last)) = (busy.first(), busy.last()) else {
            continue;
        };
        idle += (first..=last)
            .filter(|&p| grid.is_free(Slot::new(d, p)))
            .count();
    }
    idle
}

fn mean(values: impl Iterator<Item = usize>) -> f64 {
    let (sum, n) = values.fold((0usize, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}
