//! External draft boundary.
//!
//! A drafting service (typically a text-generating model behind HTTP)
//! proposes a candidate timetable. This module defines what the service is
//! asked ([`DraftRequest`]), what it must answer ([`CandidateDraft`]), the
//! trait a transport implements ([`DraftSource`]) and the parser for
//! free-text answers ([`parse_draft_response`]).
//!
//! # Answer shape
//!
//! One teacher object or an array of them, optionally inside a fenced
//! ```` ```json ```` block:
//!
//! ```json
//! {
//!   "teacherId": "T1",
//!   "schedule": {
//!     "Monday": { "1": {"classId": "7A", "subjectId": "MATH"}, "2": null }
//!   }
//! }
//! ```
//!
//! Extra fields (names, statistics) are ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Constraint, ConstraintKind, ConstraintSet, DemandRecord, WeekCalendar};

/// Failure of the drafting service.
#[derive(Debug, Error)]
pub enum DraftError {
    /// No answer within the budget.
    #[error("drafting service timed out after {0:?}")]
    Timeout(Duration),
    /// Network or service failure.
    #[error("drafting service failed: {0}")]
    Transport(String),
    /// The answer could not be parsed.
    #[error("malformed draft: {0}")]
    Malformed(String),
    /// The answer held no schedule.
    #[error("drafting service returned no schedule")]
    Empty,
}

impl From<serde_json::Error> for DraftError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// One proposed lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftCell {
    /// Class.
    pub class_id: String,
    /// Subject.
    pub subject_id: String,
}

/// A proposed weekly grid for one teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherDraft {
    /// Teacher.
    pub teacher_id: String,
    /// Day name → period key → cell (or null).
    #[serde(default)]
    pub schedule: BTreeMap<String, BTreeMap<String, Option<DraftCell>>>,
}

/// A candidate timetable from a drafting service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDraft {
    /// Per-teacher grids.
    pub teachers: Vec<TeacherDraft>,
}

impl CandidateDraft {
    /// Creates a draft from teacher grids.
    pub fn new(teachers: Vec<TeacherDraft>) -> Self {
        Self { teachers }
    }

    /// Non-null cells as `(teacher, day, period key, cell)`, in teacher
    /// order then day and period key order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &str, &DraftCell)> + '_ {
        self.teachers.iter().flat_map(|t| {
            t.schedule.iter().flat_map(move |(day, periods)| {
                periods.iter().filter_map(move |(period, cell)| {
                    cell.as_ref()
                        .map(|c| (t.teacher_id.as_str(), day.as_str(), period.as_str(), c))
                })
            })
        })
    }

    /// Number of non-null cells.
    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }

    /// Whether the draft proposes nothing.
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }
}

impl TeacherDraft {
    /// Creates an empty teacher grid.
    pub fn new(teacher_id: impl Into<String>) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            schedule: BTreeMap::new(),
        }
    }

    /// Adds a proposed lesson.
    pub fn with_cell(
        mut self,
        day: impl Into<String>,
        period: u32,
        class_id: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        self.schedule.entry(day.into()).or_default().insert(
            period.to_string(),
            Some(DraftCell {
                class_id: class_id.into(),
                subject_id: subject_id.into(),
            }),
        );
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Many(Vec<TeacherDraft>),
    One(TeacherDraft),
}

/// Parses a drafting service's free-text answer.
///
/// Looks for a fenced ```` ```json ```` block first, then any fenced block,
/// then the outermost JSON object or array in the text.
///
/// # Errors
/// [`DraftError::Malformed`] if no JSON is found or it has the wrong shape;
/// [`DraftError::Empty`] if it proposes no lesson.
///
/// # Example
///
/// ```
/// use u_timetable::hybrid::parse_draft_response;
///
/// let text = "Here you go:\n```json\n{\"teacherId\": \"T1\", \"schedule\": \
///             {\"Monday\": {\"1\": {\"classId\": \"7A\", \"subjectId\": \"MATH\"}}}}\n```";
/// let draft = parse_draft_response(text).unwrap();
/// assert_eq!(draft.cell_count(), 1);
/// ```
pub fn parse_draft_response(text: &str) -> Result<CandidateDraft, DraftError> {
    let json = extract_json(text)
        .ok_or_else(|| DraftError::Malformed("no JSON found in response".into()))?;
    let teachers = match serde_json::from_str::<Payload>(json)? {
        Payload::Many(v) => v,
        Payload::One(t) => vec![t],
    };
    let draft = CandidateDraft::new(teachers);
    if draft.is_empty() {
        return Err(DraftError::Empty);
    }
    Ok(draft)
}

fn extract_json(text: &str) -> Option<&str> {
    if let Some(block) = fenced(text, "```json").or_else(|| fenced(text, "```")) {
        return Some(block);
    }
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn fenced<'t>(text: &'t str, fence: &str) -> Option<&'t str> {
    let open = text.find(fence)?;
    let rest = &text[open + fence.len()..];
    // Skip the rest of the fence line (language tag)
    let body_start = rest.find('\n').map_or(0, |i| i + 1);
    let body = &rest[body_start..];
    let close = body.find("```")?;
    let block = body[..close].trim();
    (!block.is_empty()).then_some(block)
}

/// What the drafting service is asked to schedule.
#[derive(Debug, Clone, Serialize)]
pub struct DraftRequest {
    /// Day and period vocabulary.
    pub calendar: WeekCalendar,
    /// Demands to cover.
    pub demands: Vec<DemandRecord>,
    /// Constraints to respect.
    pub constraints: Vec<Constraint>,
}

impl DraftRequest {
    /// Builds a request.
    pub fn new(calendar: &WeekCalendar, demands: &[DemandRecord], constraints: &ConstraintSet) -> Self {
        Self {
            calendar: calendar.clone(),
            demands: demands.to_vec(),
            constraints: constraints.iter().collect(),
        }
    }

    /// Renders the request as a plain-text brief for text-generating services.
    pub fn render_prompt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DraftRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Build a weekly school timetable.")?;
        writeln!(f)?;
        writeln!(f, "Days: {}", self.calendar.days.join(", "))?;
        let periods: Vec<String> = self.calendar.periods.iter().map(u32::to_string).collect();
        writeln!(f, "Periods: {}", periods.join(", "))?;

        writeln!(f)?;
        writeln!(f, "Lessons (teacher, class, subject, weekly hours):")?;
        for d in &self.demands {
            write!(
                f,
                "- {} teaches {} {}: {} h",
                d.teacher_id, d.class_id, d.subject_id, d.weekly_hours
            )?;
            if let Some(blocks) = &d.distribution {
                let blocks: Vec<String> = blocks.iter().map(u32::to_string).collect();
                write!(f, " in blocks {}", blocks.join("+"))?;
            }
            writeln!(f)?;
        }

        let mut unavailable = self
            .constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Unavailable)
            .peekable();
        if unavailable.peek().is_some() {
            writeln!(f)?;
            writeln!(f, "Never use these slots:")?;
            for c in unavailable {
                writeln!(f, "- {:?} {}: {} {}", c.entity_kind, c.entity_id, c.day, c.period)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Rules: no teacher or class in two places at once; every weekly hour placed.")?;
        writeln!(f, "Answer with a JSON array, one object per teacher:")?;
        writeln!(f, "```json")?;
        writeln!(
            f,
            r#"[{{"teacherId": "T1", "schedule": {{"{}": {{"{}": {{"classId": "C1", "subjectId": "S1"}}}}}}}}]"#,
            self.calendar.days.first().map_or("Day", String::as_str),
            self.calendar.periods.first().copied().unwrap_or(1)
        )?;
        writeln!(f, "```")
    }
}

/// A drafting service.
///
/// The coordinator calls it on a worker thread and stops waiting once
/// `budget` has elapsed; a call still running then is left to finish in the
/// background and its answer is dropped. Implementations should pass the
/// budget on to their transport so abandoned calls end promptly.
pub trait DraftSource: Send + Sync {
    /// Requests a candidate timetable.
    fn draft(&self, request: &DraftRequest, budget: Duration) -> Result<CandidateDraft, DraftError>;
}

/// A drafting service shared with the coordinator's worker thread.
pub type SharedDraftSource = Arc<dyn DraftSource>;

/// Adapts a text-in, text-out service call into a [`DraftSource`].
///
/// The closure receives the rendered prompt and the budget and returns the
/// raw answer, which is parsed with [`parse_draft_response`].
pub struct TextDraftSource<F> {
    call: F,
}

impl<F> TextDraftSource<F>
where
    F: Fn(&str, Duration) -> Result<String, DraftError> + Send + Sync,
{
    /// Wraps a service call.
    pub fn new(call: F) -> Self {
        Self { call }
    }
}

impl<F> DraftSource for TextDraftSource<F>
where
    F: Fn(&str, Duration) -> Result<String, DraftError> + Send + Sync,
{
    fn draft(&self, request: &DraftRequest, budget: Duration) -> Result<CandidateDraft, DraftError> {
        let answer = (self.call)(&request.render_prompt(), budget)?;
        parse_draft_response(&answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Level;

    const ONE: &str = r#"{"teacherId": "T1", "teacherName": "Ayşe",
        "schedule": {"Monday": {"1": {"classId": "7A", "className": "7-A", "subjectId": "MATH"}, "2": null}},
        "statistics": {"totalHours": 1}}"#;

    #[test]
    fn test_parse_fenced_single() {
        let text = format!("Sure! Here is the plan.\n```json\n{ONE}\n```\nGood luck.");
        let draft = parse_draft_response(&text).unwrap();
        assert_eq!(draft.teachers.len(), 1);
        let cells: Vec<_> = draft.cells().collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].0, "T1");
        assert_eq!(cells[0].1, "Monday");
        assert_eq!(cells[0].2, "1");
        assert_eq!(cells[0].3.class_id, "7A");
    }

    #[test]
    fn test_parse_bare_array_and_embedded() {
        let bare = format!("[{ONE}, {{\"teacherId\": \"T2\", \"schedule\": {{}}}}]");
        let draft = parse_draft_response(&bare).unwrap();
        assert_eq!(draft.teachers.len(), 2);
        assert_eq!(draft.cell_count(), 1);

        let embedded = format!("The schedule is {ONE} as requested.");
        assert_eq!(parse_draft_response(&embedded).unwrap().cell_count(), 1);
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            parse_draft_response("I cannot help with that."),
            Err(DraftError::Malformed(_))
        ));
        assert!(matches!(
            parse_draft_response("```json\n{\"teacherId\": 3}\n```"),
            Err(DraftError::Malformed(_))
        ));
        assert!(matches!(parse_draft_response("[]"), Err(DraftError::Empty)));
        assert!(matches!(
            parse_draft_response(r#"{"teacherId": "T1", "schedule": {"Monday": {"1": null}}}"#),
            Err(DraftError::Empty)
        ));
    }

    #[test]
    fn test_render_prompt() {
        let cal = WeekCalendar::new(["Mon", "Tue"], vec![1, 2, 3]);
        let demands = vec![
            DemandRecord::new("7A", "MATH", "T1", Level::Middle, 4).with_distribution(vec![2, 2]),
        ];
        let constraints = ConstraintSet::new()
            .with(Constraint::teacher_unavailable("T1", "Mon", 1))
            .with(Constraint::subject_preferred("MATH", "Tue", 2));
        let prompt = DraftRequest::new(&cal, &demands, &constraints).render_prompt();

        assert!(prompt.contains("Days: Mon, Tue"));
        assert!(prompt.contains("Periods: 1, 2, 3"));
        assert!(prompt.contains("- T1 teaches 7A MATH: 4 h in blocks 2+2"));
        assert!(prompt.contains("- Teacher T1: Mon 1"));
        assert!(!prompt.contains("Tue 2"));
        assert!(prompt.contains(r#""Mon": {"1""#));
    }

    #[test]
    fn test_text_source_parses() {
        let source = TextDraftSource::new(|prompt: &str, _| {
            assert!(prompt.contains("Lessons"));
            Ok(format!("```json\n[{ONE}]\n```"))
        });
        let request = DraftRequest::new(&WeekCalendar::standard(), &[], &ConstraintSet::new());
        let draft = source.draft(&request, Duration::from_secs(1)).unwrap();
        assert_eq!(draft.cell_count(), 1);
    }

    #[test]
    fn test_builder_cells() {
        let draft = CandidateDraft::new(vec![TeacherDraft::new("T1")
            .with_cell("Monday", 1, "7A", "MATH")
            .with_cell("Monday", 2, "7A", "MATH")]);
        assert_eq!(draft.cell_count(), 2);
        assert!(!draft.is_empty());
        assert!(CandidateDraft::default().is_empty());
    }
}
