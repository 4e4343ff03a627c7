//! Subject model and distribution patterns.
//!
//! A subject declares how many hours per week it needs and, optionally,
//! how those hours should be grouped into contiguous blocks
//! (e.g. `[2, 2, 1]` for five weekly hours).
//!
//! # Kinds
//! - **Regular**: placed freely by the engine.
//! - **Elective**: club-style subjects placed as one atomic block inside a
//!   per-level fixed window.
//! - **Windowed**: subjects of a named category restricted to a designated
//!   set of periods on one weekday.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Level;

/// Placement category of a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Ordinary subject.
    #[default]
    Regular,
    /// Club/elective subject with a fixed per-level window.
    Elective,
    /// Subject restricted to the special window of the named category.
    Windowed(String),
}

/// A subject taught to classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Subject branch, matched against teacher branches.
    pub branch: String,
    /// Levels this subject applies to. Empty = every level.
    pub levels: Vec<Level>,
    /// Required weekly hours.
    pub weekly_hours: u32,
    /// Ordered block lengths. Should sum to `weekly_hours`.
    pub distribution: Option<Vec<u32>>,
    /// Placement category.
    pub kind: SubjectKind,
    /// Core subject (prioritized, preferably placed in core periods).
    pub core: bool,
}

/// Error parsing a textual distribution pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistributionParseError {
    /// The pattern contained no blocks.
    #[error("distribution pattern is empty")]
    Empty,
    /// A block was not a positive integer.
    #[error("invalid distribution block '{0}'")]
    InvalidBlock(String),
}

/// Parses a distribution pattern such as `"2+2+1"`.
///
/// Blocks may be separated by `+`, `,` or whitespace. Every block must be a
/// positive integer.
///
/// # Examples
/// ```
/// use u_timetable::models::parse_distribution;
///
/// assert_eq!(parse_distribution("2+2+1").unwrap(), vec![2, 2, 1]);
/// assert!(parse_distribution("2+0").is_err());
/// ```
pub fn parse_distribution(pattern: &str) -> Result<Vec<u32>, DistributionParseError> {
    let blocks = pattern
        .split(|c: char| c == '+' || c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(DistributionParseError::InvalidBlock(part.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if blocks.is_empty() {
        return Err(DistributionParseError::Empty);
    }
    Ok(blocks)
}

impl Subject {
    /// Creates a regular subject with the given weekly hours.
    pub fn new(id: impl Into<String>, weekly_hours: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            branch: String::new(),
            levels: Vec::new(),
            weekly_hours,
            distribution: None,
            kind: SubjectKind::Regular,
            core: false,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Adds an applicable level.
    pub fn with_level(mut self, level: Level) -> Self {
        if !self.levels.contains(&level) {
            self.levels.push(level);
        }
        self
    }

    /// Sets the distribution pattern.
    pub fn with_distribution(mut self, blocks: Vec<u32>) -> Self {
        self.distribution = Some(blocks);
        self
    }

    /// Parses and sets a textual distribution pattern (`"2+2+1"`).
    pub fn with_distribution_pattern(
        mut self,
        pattern: &str,
    ) -> Result<Self, DistributionParseError> {
        self.distribution = Some(parse_distribution(pattern)?);
        Ok(self)
    }

    /// Marks the subject as a club/elective.
    pub fn elective(mut self) -> Self {
        self.kind = SubjectKind::Elective;
        self
    }

    /// Restricts the subject to a special window category.
    pub fn windowed(mut self, category: impl Into<String>) -> Self {
        self.kind = SubjectKind::Windowed(category.into());
        self
    }

    /// Marks the subject as core.
    pub fn core(mut self) -> Self {
        self.core = true;
        self
    }

    /// Whether the subject applies to `level`.
    pub fn applies_to(&self, level: Level) -> bool {
        self.levels.is_empty() || self.levels.contains(&level)
    }

    /// Levels the subject applies to, expanding "every level".
    pub fn applicable_levels(&self) -> Vec<Level> {
        if self.levels.is_empty() {
            Level::ALL.to_vec()
        } else {
            self.levels.clone()
        }
    }

    /// Whether the declared distribution sums to the weekly hours.
    ///
    /// Returns `true` when no distribution is declared.
    pub fn distribution_matches(&self) -> bool {
        self.distribution
            .as_ref()
            .map_or(true, |d| d.iter().sum::<u32>() == self.weekly_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_distribution_separators() {
        assert_eq!(parse_distribution("2+2+1").unwrap(), vec![2, 2, 1]);
        assert_eq!(parse_distribution("3, 2").unwrap(), vec![3, 2]);
        assert_eq!(parse_distribution(" 1 1 1 ").unwrap(), vec![1, 1, 1]);
    }

    #[test]
    fn test_parse_distribution_errors() {
        assert_eq!(parse_distribution(""), Err(DistributionParseError::Empty));
        assert_eq!(parse_distribution(" + "), Err(DistributionParseError::Empty));
        assert_eq!(
            parse_distribution("2+x"),
            Err(DistributionParseError::InvalidBlock("x".into()))
        );
        assert_eq!(
            parse_distribution("2+0"),
            Err(DistributionParseError::InvalidBlock("0".into()))
        );
    }

    #[test]
    fn test_subject_builder() {
        let s = Subject::new("MATH", 5)
            .with_name("Mathematics")
            .with_branch("Mathematics")
            .with_level(Level::Middle)
            .with_distribution_pattern("2+2+1")
            .unwrap()
            .core();

        assert_eq!(s.distribution, Some(vec![2, 2, 1]));
        assert!(s.distribution_matches());
        assert!(s.core);
        assert_eq!(s.kind, SubjectKind::Regular);
        assert!(s.applies_to(Level::Middle));
        assert!(!s.applies_to(Level::Primary));
    }

    #[test]
    fn test_distribution_mismatch() {
        let s = Subject::new("PE", 3).with_distribution(vec![2, 2]);
        assert!(!s.distribution_matches());
        assert!(Subject::new("PE", 3).distribution_matches());
    }

    #[test]
    fn test_kinds_and_levels() {
        let club = Subject::new("CLUB", 2).elective();
        assert_eq!(club.kind, SubjectKind::Elective);
        assert_eq!(club.applicable_levels(), Level::ALL.to_vec());

        let ade = Subject::new("ADE", 2).windowed("ade").with_level(Level::Middle);
        assert_eq!(ade.kind, SubjectKind::Windowed("ade".into()));
        assert_eq!(ade.applicable_levels(), vec![Level::Middle]);
    }
}
