mod driver;
mod observer;
mod progress;
mod service;
mod state;
mod view;

// Public API of the session subsystem.
pub use crate::error::{SessionError, SessionErrorKind};
pub use driver::{SessionCommand, SessionDriver};
pub use observer::{NoopObserver, ObserverEvent, RecordingObserver, SessionObserver};
pub use progress::SessionProgress;
pub use service::{DEFAULT_TIME_LIMIT_MINUTES, QuizSession};
pub use state::SessionState;
pub use view::{ResultHistoryService, ResultListItem};
