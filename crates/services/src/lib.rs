#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod error;
pub mod sessions;
pub mod telemetry;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use auth::{AuthService, AuthSnapshot, IdentityProvider, LocalIdentity};
pub use error::{AppServicesError, AuthError, HistoryError, SessionError, SessionErrorKind};

pub use sessions::{
    NoopObserver, ObserverEvent, QuizSession, RecordingObserver, ResultHistoryService,
    ResultListItem, SessionCommand, SessionDriver, SessionObserver, SessionProgress,
    SessionState,
};
