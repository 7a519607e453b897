use std::fmt;

/// Lifecycle of one attempt. There is no way back from `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// Quiz fetch in flight.
    Loading,
    /// Clock running, answers accepted.
    Active,
    /// Clock stopped, scoring in progress.
    Ending,
    /// Summary available, answers frozen.
    Completed,
}

impl SessionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Active => "active",
            Self::Ending => "ending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
