//! Week calendar and period windows.
//!
//! The calendar is the configured vocabulary of weekday names and period
//! numbers that every grid and constraint is addressed through. Nothing in
//! the engine hardcodes a day name or a period count.
//!
//! # Addressing
//! Externally a slot is `(day name, period number)`, e.g. `("Thursday", 9)`.
//! Internally it is a [`Slot`] holding indices into the calendar, which keeps
//! grid lookups at O(1).

use serde::{Deserialize, Serialize};

/// A (day, period) cell addressed by calendar indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Day index into [`WeekCalendar::days`].
    pub day: usize,
    /// Period index into [`WeekCalendar::periods`].
    pub period: usize,
}

impl Slot {
    /// Creates a slot from indices.
    #[inline]
    pub fn new(day: usize, period: usize) -> Self {
        Self { day, period }
    }
}

/// The weekly grid vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCalendar {
    /// Ordered weekday names.
    pub days: Vec<String>,
    /// Ordered period numbers (usually `1..=n`).
    pub periods: Vec<u32>,
}

impl WeekCalendar {
    /// Creates a calendar from day names and period numbers.
    pub fn new<D, S>(days: D, periods: Vec<u32>) -> Self
    where
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            days: days.into_iter().map(Into::into).collect(),
            periods,
        }
    }

    /// Monday to Friday, periods 1 through 10.
    pub fn standard() -> Self {
        Self::new(
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
            (1..=10).collect(),
        )
    }

    /// Number of days.
    #[inline]
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Number of periods per day.
    #[inline]
    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    /// Total number of slots in the week.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.day_count() * self.period_count()
    }

    /// Whether the calendar has no usable slot.
    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0
    }

    /// Index of a day name.
    pub fn day_index(&self, day: &str) -> Option<usize> {
        self.days.iter().position(|d| d == day)
    }

    /// Index of a period number.
    pub fn period_index(&self, period: u32) -> Option<usize> {
        self.periods.iter().position(|&p| p == period)
    }

    /// Resolves `(day name, period number)` to a slot.
    pub fn slot(&self, day: &str, period: u32) -> Option<Slot> {
        Some(Slot::new(self.day_index(day)?, self.period_index(period)?))
    }

    /// Day name of a slot.
    pub fn day_name(&self, slot: Slot) -> &str {
        &self.days[slot.day]
    }

    /// Period number of a slot.
    pub fn period_number(&self, slot: Slot) -> u32 {
        self.periods[slot.period]
    }

    /// All slots, day-major.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.day_count())
            .flat_map(move |d| (0..self.period_count()).map(move |p| Slot::new(d, p)))
    }
}

impl Default for WeekCalendar {
    fn default() -> Self {
        Self::standard()
    }
}

/// A contiguous run of periods on one day.
///
/// Used for elective windows, which are placed as an atomic block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// Day name.
    pub day: String,
    /// First period number.
    pub start_period: u32,
    /// Number of consecutive periods.
    pub length: u32,
}

impl PeriodWindow {
    /// Creates a window.
    pub fn new(day: impl Into<String>, start_period: u32, length: u32) -> Self {
        Self {
            day: day.into(),
            start_period,
            length,
        }
    }

    /// Whether `(day, period)` falls inside this window.
    pub fn contains(&self, day: &str, period: u32) -> bool {
        self.day == day && period >= self.start_period && period - self.start_period < self.length
    }

    /// Resolves the window to calendar slots.
    ///
    /// Returns `None` if the day is unknown, the window is empty or longer
    /// than a calendar day, or any of its periods is missing or non-adjacent
    /// in the calendar.
    pub fn resolve(&self, calendar: &WeekCalendar) -> Option<Vec<Slot>> {
        if self.length == 0 || self.length as usize > calendar.period_count() {
            return None;
        }
        let first = calendar.slot(&self.day, self.start_period)?;
        let slots: Vec<Slot> = (0..self.length as usize)
            .map(|offset| Slot::new(first.day, first.period + offset))
            .collect();
        let contiguous = slots.iter().enumerate().all(|(i, s)| {
            s.period < calendar.period_count()
                && calendar.periods[s.period] == self.start_period + i as u32
        });
        contiguous.then_some(slots)
    }
}

/// A set of (possibly non-adjacent) periods on one day.
///
/// Used for specially-windowed subject categories, whose hours are placed
/// one period at a time inside the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPeriods {
    /// Day name.
    pub day: String,
    /// Period numbers on that day.
    pub periods: Vec<u32>,
}

impl DayPeriods {
    /// Creates a day/period set.
    pub fn new(day: impl Into<String>, periods: Vec<u32>) -> Self {
        Self {
            day: day.into(),
            periods,
        }
    }

    /// Whether `(day, period)` is in the set.
    pub fn contains(&self, day: &str, period: u32) -> bool {
        self.day == day && self.periods.contains(&period)
    }

    /// Resolves to calendar slots, or `None` if any period is outside the calendar.
    pub fn resolve(&self, calendar: &WeekCalendar) -> Option<Vec<Slot>> {
        if self.periods.is_empty() {
            return None;
        }
        self.periods
            .iter()
            .map(|&p| calendar.slot(&self.day, p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_calendar() {
        let cal = WeekCalendar::standard();
        assert_eq!(cal.day_count(), 5);
        assert_eq!(cal.period_count(), 10);
        assert_eq!(cal.slot_count(), 50);
        assert_eq!(cal.slots().count(), 50);
        assert!(!cal.is_empty());
    }

    #[test]
    fn test_slot_lookup() {
        let cal = WeekCalendar::standard();
        let s = cal.slot("Thursday", 9).unwrap();
        assert_eq!(s, Slot::new(3, 8));
        assert_eq!(cal.day_name(s), "Thursday");
        assert_eq!(cal.period_number(s), 9);
        assert!(cal.slot("Sunday", 1).is_none());
        assert!(cal.slot("Monday", 11).is_none());
    }

    #[test]
    fn test_custom_vocabulary() {
        let cal = WeekCalendar::new(["Pazartesi", "Salı"], vec![1, 2, 3]);
        assert_eq!(cal.slot("Salı", 3), Some(Slot::new(1, 2)));
        assert_eq!(cal.slot_count(), 6);
    }

    #[test]
    fn test_period_window_resolve() {
        let cal = WeekCalendar::standard();
        let w = PeriodWindow::new("Thursday", 9, 2);
        assert_eq!(
            w.resolve(&cal),
            Some(vec![Slot::new(3, 8), Slot::new(3, 9)])
        );
        assert!(w.contains("Thursday", 10));
        assert!(!w.contains("Thursday", 8));
        assert!(!w.contains("Friday", 9));

        // Runs off the end of the day
        assert!(PeriodWindow::new("Thursday", 10, 2).resolve(&cal).is_none());
        assert!(PeriodWindow::new("Thursday", 1, 0).resolve(&cal).is_none());
    }

    #[test]
    fn test_period_window_oversized() {
        let cal = WeekCalendar::standard();
        let huge = PeriodWindow::new("Thursday", 7, u32::MAX);
        assert_eq!(huge.resolve(&cal), None);
        assert_eq!(PeriodWindow::new("Thursday", 1, 11).resolve(&cal), None);
        assert!(huge.contains("Thursday", 10));
        assert!(huge.contains("Thursday", u32::MAX));
        assert!(!huge.contains("Thursday", 6));
        assert!(!PeriodWindow::new("Thursday", u32::MAX, 1).contains("Thursday", 1));
    }

    #[test]
    fn test_period_window_gap_in_calendar() {
        let cal = WeekCalendar::new(["Mon"], vec![1, 2, 4]);
        assert!(PeriodWindow::new("Mon", 2, 2).resolve(&cal).is_none());
        assert!(PeriodWindow::new("Mon", 1, 2).resolve(&cal).is_some());
    }

    #[test]
    fn test_day_periods_resolve() {
        let cal = WeekCalendar::standard();
        let dp = DayPeriods::new("Tuesday", vec![4, 5, 7, 8]);
        let slots = dp.resolve(&cal).unwrap();
        assert_eq!(slots.len(), 4);
        assert!(dp.contains("Tuesday", 7));
        assert!(!dp.contains("Tuesday", 6));
        assert!(DayPeriods::new("Tuesday", vec![11]).resolve(&cal).is_none());
    }
}
