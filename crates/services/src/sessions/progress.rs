use super::state::SessionState;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub state: SessionState,
    pub total_questions: usize,
    pub attempted: usize,
    pub remaining_secs: i64,
}
