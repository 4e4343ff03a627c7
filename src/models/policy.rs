//! Run policy (configuration).
//!
//! Every tunable of a timetable run lives here: the calendar vocabulary,
//! daily caps, fixed windows, non-teaching periods and per-entity targets.
//! Policies deserialize from JSON; missing fields take their defaults.
//!
//! # Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | Calendar | Monday–Friday, periods 1–10 |
//! | Non-teaching period | 5 (preschool, primary), 6 (middle) |
//! | Elective window | Thursday 9–10 (primary), Thursday 7–8 (middle) |
//! | Home-room daily cap | 6 |
//! | Teacher–class daily cap | 4 |
//! | Subject daily cap | 2 |
//! | Max consecutive hours | 2 |
//! | Core periods | 1–4 |
//! | Home-room levels | preschool, primary |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::{DayPeriods, Level, PeriodWindow, Teacher, WeekCalendar};

/// Error loading a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The JSON could not be parsed.
    #[error("invalid policy JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid policy: {0}")]
    Invalid(String),
}

/// Policy values for one timetable run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Day and period vocabulary.
    pub calendar: WeekCalendar,
    /// Max hours per day between a class and its home-room teacher.
    pub home_room_daily_cap: u32,
    /// Max hours per day between any other teacher and a class.
    pub teacher_class_daily_cap: u32,
    /// Max hours per day of one subject for one class.
    pub subject_daily_cap: u32,
    /// Longest block placed in one piece; longer blocks are pre-split.
    pub max_consecutive_hours: u32,
    /// Whether declared distribution patterns shape the blocks.
    pub use_distribution_patterns: bool,
    /// Weekly hour target per class ID. Absent = unlimited.
    pub class_weekly_targets: BTreeMap<String, u32>,
    /// Fixed non-teaching period number per level.
    pub non_teaching_periods: BTreeMap<Level, u32>,
    /// Label written into non-teaching slots.
    pub non_teaching_label: String,
    /// Elective (club) window per level.
    pub elective_windows: BTreeMap<Level, PeriodWindow>,
    /// Special window per windowed-subject category.
    pub special_windows: BTreeMap<String, DayPeriods>,
    /// Weekly hour cap per teacher ID, overriding the teacher's own cap.
    pub teacher_max_hours: BTreeMap<String, u32>,
    /// Period numbers preferred for core subjects.
    pub core_periods: Vec<u32>,
    /// Levels at which the home-room relationship gets priority and the higher cap.
    pub home_room_levels: Vec<Level>,
}

impl Default for Policy {
    fn default() -> Self {
        let mut non_teaching_periods = BTreeMap::new();
        non_teaching_periods.insert(Level::Preschool, 5);
        non_teaching_periods.insert(Level::Primary, 5);
        non_teaching_periods.insert(Level::Middle, 6);

        let mut elective_windows = BTreeMap::new();
        elective_windows.insert(Level::Primary, PeriodWindow::new("Thursday", 9, 2));
        elective_windows.insert(Level::Middle, PeriodWindow::new("Thursday", 7, 2));

        Self {
            calendar: WeekCalendar::standard(),
            home_room_daily_cap: 6,
            teacher_class_daily_cap: 4,
            subject_daily_cap: 2,
            max_consecutive_hours: 2,
            use_distribution_patterns: true,
            class_weekly_targets: BTreeMap::new(),
            non_teaching_periods,
            non_teaching_label: "lunch".to_string(),
            elective_windows,
            special_windows: BTreeMap::new(),
            teacher_max_hours: BTreeMap::new(),
            core_periods: vec![1, 2, 3, 4],
            home_room_levels: vec![Level::Preschool, Level::Primary],
        }
    }
}

impl Policy {
    /// Creates the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a policy from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(json)?;
        policy.check()?;
        Ok(policy)
    }

    /// Rejects values the engine cannot work with.
    pub fn check(&self) -> Result<(), PolicyError> {
        if self.max_consecutive_hours == 0 {
            return Err(PolicyError::Invalid(
                "max_consecutive_hours must be at least 1".into(),
            ));
        }
        if self.calendar.is_empty() {
            return Err(PolicyError::Invalid("calendar has no slots".into()));
        }
        Ok(())
    }

    /// Sets the calendar.
    pub fn with_calendar(mut self, calendar: WeekCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Sets the three daily caps.
    pub fn with_daily_caps(mut self, home_room: u32, teacher_class: u32, subject: u32) -> Self {
        self.home_room_daily_cap = home_room;
        self.teacher_class_daily_cap = teacher_class;
        self.subject_daily_cap = subject;
        self
    }

    /// Sets the maximum block length.
    pub fn with_max_consecutive_hours(mut self, hours: u32) -> Self {
        self.max_consecutive_hours = hours;
        self
    }

    /// Enables or disables distribution patterns.
    pub fn with_distribution_patterns(mut self, enabled: bool) -> Self {
        self.use_distribution_patterns = enabled;
        self
    }

    /// Sets a class weekly target.
    pub fn with_class_target(mut self, class_id: impl Into<String>, hours: u32) -> Self {
        self.class_weekly_targets.insert(class_id.into(), hours);
        self
    }

    /// Sets (or clears, with `None`) the non-teaching period of a level.
    pub fn with_non_teaching_period(mut self, level: Level, period: Option<u32>) -> Self {
        match period {
            Some(p) => self.non_teaching_periods.insert(level, p),
            None => self.non_teaching_periods.remove(&level),
        };
        self
    }

    /// Sets (or clears) the elective window of a level.
    pub fn with_elective_window(mut self, level: Level, window: Option<PeriodWindow>) -> Self {
        match window {
            Some(w) => self.elective_windows.insert(level, w),
            None => self.elective_windows.remove(&level),
        };
        self
    }

    /// Sets the special window of a category.
    pub fn with_special_window(mut self, category: impl Into<String>, window: DayPeriods) -> Self {
        self.special_windows.insert(category.into(), window);
        self
    }

    /// Sets a teacher weekly cap override.
    pub fn with_teacher_max_hours(mut self, teacher_id: impl Into<String>, hours: u32) -> Self {
        self.teacher_max_hours.insert(teacher_id.into(), hours);
        self
    }

    /// Sets the core periods.
    pub fn with_core_periods(mut self, periods: Vec<u32>) -> Self {
        self.core_periods = periods;
        self
    }

    /// Sets the home-room levels.
    pub fn with_home_room_levels(mut self, levels: Vec<Level>) -> Self {
        self.home_room_levels = levels;
        self
    }

    /// Effective weekly cap of a teacher: policy override, then declared cap.
    pub fn teacher_cap(&self, teacher: &Teacher) -> Option<u32> {
        self.teacher_max_hours
            .get(&teacher.id)
            .copied()
            .or(teacher.max_weekly_hours)
    }

    /// Weekly target of a class.
    pub fn class_target(&self, class_id: &str) -> Option<u32> {
        self.class_weekly_targets.get(class_id).copied()
    }

    /// Non-teaching period of a level.
    pub fn non_teaching_period(&self, level: Level) -> Option<u32> {
        self.non_teaching_periods.get(&level).copied()
    }

    /// Elective window of a level.
    pub fn elective_window(&self, level: Level) -> Option<&PeriodWindow> {
        self.elective_windows.get(&level)
    }

    /// Special window of a category.
    pub fn special_window(&self, category: &str) -> Option<&DayPeriods> {
        self.special_windows.get(category)
    }

    /// Whether the home-room relationship counts at `level`.
    pub fn is_home_room_level(&self, level: Level) -> bool {
        self.home_room_levels.contains(&level)
    }

    /// Daily teacher–class cap for a relationship.
    pub fn relationship_cap(&self, home_room: bool) -> u32 {
        if home_room {
            self.home_room_daily_cap
        } else {
            self.teacher_class_daily_cap
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let p = Policy::default();
        assert_eq!(p.non_teaching_period(Level::Primary), Some(5));
        assert_eq!(p.non_teaching_period(Level::Middle), Some(6));
        assert_eq!(
            p.elective_window(Level::Middle),
            Some(&PeriodWindow::new("Thursday", 7, 2))
        );
        assert!(p.elective_window(Level::Preschool).is_none());
        assert!(p.is_home_room_level(Level::Primary));
        assert!(!p.is_home_room_level(Level::Middle));
        assert_eq!(p.relationship_cap(true), 6);
        assert_eq!(p.relationship_cap(false), 4);
        assert!(p.check().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let p = Policy::from_json_str(
            r#"{
                "subject_daily_cap": 3,
                "class_weekly_targets": {"3A": 30},
                "non_teaching_periods": {"middle": 5}
            }"#,
        )
        .unwrap();

        assert_eq!(p.subject_daily_cap, 3);
        assert_eq!(p.class_target("3A"), Some(30));
        assert_eq!(p.non_teaching_period(Level::Middle), Some(5));
        // Replaced map: primary no longer has a lunch period
        assert_eq!(p.non_teaching_period(Level::Primary), None);
        assert_eq!(p.home_room_daily_cap, 6);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            Policy::from_json_str("{not json"),
            Err(PolicyError::Json(_))
        ));
        assert!(matches!(
            Policy::from_json_str(r#"{"max_consecutive_hours": 0}"#),
            Err(PolicyError::Invalid(_))
        ));
    }

    #[test]
    fn test_teacher_cap_override() {
        let t = Teacher::new("T1", Level::Middle).with_max_weekly_hours(20);
        let p = Policy::default();
        assert_eq!(p.teacher_cap(&t), Some(20));
        let p = p.with_teacher_max_hours("T1", 12);
        assert_eq!(p.teacher_cap(&t), Some(12));
        assert_eq!(p.teacher_cap(&Teacher::new("T2", Level::Middle)), None);
    }

    #[test]
    fn test_builders_clear_entries() {
        let p = Policy::default()
            .with_non_teaching_period(Level::Primary, None)
            .with_elective_window(Level::Middle, None)
            .with_special_window("ade", DayPeriods::new("Tuesday", vec![4, 5]));
        assert_eq!(p.non_teaching_period(Level::Primary), None);
        assert!(p.elective_window(Level::Middle).is_none());
        assert!(p.special_window("ade").is_some());
    }
}
