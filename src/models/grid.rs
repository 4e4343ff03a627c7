//! Weekly grid (solution) model.
//!
//! A grid is a day × period matrix of [`GridSlot`]s for one teacher or one
//! class. The engine keeps one grid per class and per teacher; a lesson is
//! always written to both.
//!
//! # Serialization
//! Grids serialize as `day name → period number → slot`, in calendar order,
//! with empty slots as `null`.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::{Slot, WeekCalendar};

/// A `(teacher, class, subject)` lesson occupying one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lesson {
    /// Teaching teacher.
    pub teacher_id: String,
    /// Taught class.
    pub class_id: String,
    /// Taught subject.
    pub subject_id: String,
}

impl Lesson {
    /// Creates a lesson.
    pub fn new(
        teacher_id: impl Into<String>,
        class_id: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            class_id: class_id.into(),
            subject_id: subject_id.into(),
        }
    }
}

/// Content of one grid cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridSlot {
    /// Free.
    #[default]
    Empty,
    /// Fixed non-teaching occupant (e.g., lunch).
    Fixed {
        /// Marker label.
        label: String,
    },
    /// A placed lesson.
    Lesson(Lesson),
}

impl GridSlot {
    /// Creates a fixed marker.
    pub fn fixed(label: impl Into<String>) -> Self {
        Self::Fixed {
            label: label.into(),
        }
    }

    /// Whether the slot is free.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether the slot holds a fixed marker.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed { .. })
    }

    /// The lesson in this slot, if any.
    pub fn lesson(&self) -> Option<&Lesson> {
        match self {
            Self::Lesson(l) => Some(l),
            _ => None,
        }
    }
}

/// A weekly grid owned by one teacher or class.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekGrid {
    /// Teacher or class identifier.
    pub owner_id: String,
    calendar: WeekCalendar,
    cells: Vec<Vec<GridSlot>>,
}

impl WeekGrid {
    /// Creates an all-empty grid shaped by the calendar.
    pub fn new(owner_id: impl Into<String>, calendar: &WeekCalendar) -> Self {
        Self {
            owner_id: owner_id.into(),
            calendar: calendar.clone(),
            cells: vec![vec![GridSlot::Empty; calendar.period_count()]; calendar.day_count()],
        }
    }

    /// Calendar this grid is addressed by.
    pub fn calendar(&self) -> &WeekCalendar {
        &self.calendar
    }

    /// Slot content.
    #[inline]
    pub fn get(&self, slot: Slot) -> &GridSlot {
        &self.cells[slot.day][slot.period]
    }

    /// Slot content by `(day name, period number)`.
    pub fn at(&self, day: &str, period: u32) -> Option<&GridSlot> {
        self.calendar.slot(day, period).map(|s| self.get(s))
    }

    /// Overwrites a slot.
    #[inline]
    pub fn set(&mut self, slot: Slot, content: GridSlot) {
        self.cells[slot.day][slot.period] = content;
    }

    /// Whether a slot is free.
    #[inline]
    pub fn is_free(&self, slot: Slot) -> bool {
        self.get(slot).is_empty()
    }

    /// All lessons with their slots, day-major.
    pub fn lessons(&self) -> impl Iterator<Item = (Slot, &Lesson)> {
        self.cells.iter().enumerate().flat_map(|(d, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(p, cell)| cell.lesson().map(|l| (Slot::new(d, p), l)))
        })
    }

    /// Number of lesson slots.
    pub fn lesson_count(&self) -> usize {
        self.lessons().count()
    }

    /// Number of lessons on a day.
    pub fn day_load(&self, day: usize) -> usize {
        self.cells[day].iter().filter(|c| c.lesson().is_some()).count()
    }

    /// Number of fixed markers.
    pub fn fixed_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_fixed()).count()
    }
}

impl Serialize for WeekGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Day<'a> {
            periods: &'a [u32],
            row: &'a [GridSlot],
        }

        impl Serialize for Day<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.row.len()))?;
                for (period, cell) in self.periods.iter().zip(self.row) {
                    let value = if cell.is_empty() { None } else { Some(cell) };
                    map.serialize_entry(&period.to_string(), &value)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (day, row) in self.calendar.days.iter().zip(&self.cells) {
            map.serialize_entry(
                day,
                &Day {
                    periods: &self.calendar.periods,
                    row,
                },
            )?;
        }
        map.end()
    }
}
