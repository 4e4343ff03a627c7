//! School stages.
//!
//! Levels gate which teachers may teach which classes, decide the fixed
//! non-teaching period of a class, and select the elective window.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A school stage.
///
/// Ordered from youngest to oldest, so `Level::Preschool < Level::Middle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Kindergarten / preschool.
    Preschool,
    /// Primary school.
    Primary,
    /// Middle school.
    Middle,
}

impl Level {
    /// All levels, youngest first.
    pub const ALL: [Level; 3] = [Level::Preschool, Level::Primary, Level::Middle];

    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preschool => "preschool",
            Self::Primary => "primary",
            Self::Middle => "middle",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
