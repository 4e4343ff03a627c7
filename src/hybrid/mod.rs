//! Hybrid drafting.
//!
//! An external service proposes a candidate timetable; every proposed cell
//! is checked against the hard constraints, valid cells are kept and the
//! placement engine fills the rest. When the service fails, times out or
//! answers with something unusable, the run falls back to the engine alone.

mod coordinator;
mod draft;

pub use coordinator::{HybridCoordinator, DEFAULT_DRAFT_BUDGET};
pub use draft::{
    parse_draft_response, CandidateDraft, DraftCell, DraftError, DraftRequest, DraftSource,
    SharedDraftSource, TeacherDraft, TextDraftSource,
};
