use std::sync::Arc;

use storage::repository::{InMemoryRepository, Storage};
use storage::sqlite::SqliteRepository;

use crate::Clock;
use crate::auth::{AuthService, IdentityProvider};
use crate::error::AppServicesError;
use crate::sessions::{QuizSession, ResultHistoryService, SessionObserver};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    identity: Arc<dyn IdentityProvider>,
    auth: Arc<AuthService>,
    history: Arc<ResultHistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AppServicesError> {
        let repo = SqliteRepository::connect(db_url).await?.with_clock(clock);
        repo.migrate().await?;
        Ok(Self::from_storage(Storage::from_sqlite(repo), identity))
    }

    /// Build services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, identity: Arc<dyn IdentityProvider>) -> Self {
        let repo = InMemoryRepository::new().with_clock(clock);
        Self::from_storage(Storage::from_in_memory(repo), identity)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, identity: Arc<dyn IdentityProvider>) -> Self {
        let auth = Arc::new(AuthService::new(
            Arc::clone(&identity),
            Arc::clone(&storage.users),
        ));
        let history = Arc::new(ResultHistoryService::new(Arc::clone(&storage.results)));
        Self {
            storage,
            identity,
            auth,
            history,
        }
    }

    /// A fresh idle session wired to this backend.
    #[must_use]
    pub fn new_session(&self, observer: Arc<dyn SessionObserver>) -> QuizSession {
        QuizSession::new(
            Arc::clone(&self.storage.quizzes),
            Arc::clone(&self.storage.results),
            Arc::clone(&self.identity),
        )
        .with_observer(observer)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn history(&self) -> Arc<ResultHistoryService> {
        Arc::clone(&self.history)
    }
}
