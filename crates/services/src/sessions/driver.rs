use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

use quiz_core::model::{AnswerValue, QuestionKey, QuizId};

use super::service::QuizSession;
use super::state::SessionState;
use crate::error::SessionError;

/// User input fed to a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Answer { key: QuestionKey, value: AnswerValue },
    Clear { key: QuestionKey },
    End,
    Restart {
        quiz_id: QuizId,
        time_limit_minutes: u32,
    },
}

/// Runs one [`QuizSession`] on the current task.
///
/// Clock ticks and commands are multiplexed with `select!`, so each step runs
/// to completion before the next one starts. Commands already queued win over
/// a tick that became due at the same time.
pub struct SessionDriver {
    session: QuizSession,
    commands: mpsc::Receiver<SessionCommand>,
}

/// One countdown second.
const TICK_PERIOD: Duration = Duration::from_secs(1);

impl SessionDriver {
    #[must_use]
    pub fn new(session: QuizSession, commands: mpsc::Receiver<SessionCommand>) -> Self {
        Self { session, commands }
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn into_session(self) -> QuizSession {
        self.session
    }

    /// Drive the session until it leaves `Active`.
    ///
    /// Returns immediately when the session is not active. If every command
    /// sender is dropped the attempt is abandoned.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by a command or by finalization. A
    /// failed restart leaves the session in `Idle`.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        let mut ticker = Self::ticker();
        while self.session.state() == SessionState::Active {
            tokio::select! {
                biased;
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("command channel closed; abandoning session");
                        self.session.abandon();
                        break;
                    };
                    if self.apply(command).await? {
                        // Exactly one interval per countdown.
                        ticker = Self::ticker();
                    }
                }
                _ = ticker.tick() => {
                    self.session.tick().await?;
                }
            }
        }
        Ok(())
    }

    /// Returns `true` when the countdown was re-armed.
    async fn apply(&mut self, command: SessionCommand) -> Result<bool, SessionError> {
        match command {
            SessionCommand::Answer { key, value } => {
                self.session.record_answer(key, value)?;
                Ok(false)
            }
            SessionCommand::Clear { key } => {
                self.session.clear_answer(key)?;
                Ok(false)
            }
            SessionCommand::End => {
                self.session.end().await?;
                Ok(false)
            }
            SessionCommand::Restart {
                quiz_id,
                time_limit_minutes,
            } => {
                self.session.start(&quiz_id, time_limit_minutes).await?;
                Ok(true)
            }
        }
    }

    fn ticker() -> Interval {
        let mut ticker = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LocalIdentity;
    use crate::sessions::RecordingObserver;
    use quiz_core::model::{AuthUser, Question, Quiz, QuizType, UserId};
    use std::sync::Arc;
    use storage::repository::{InMemoryRepository, QuizRepository};

    async fn driver(
        observer: Arc<RecordingObserver>,
    ) -> (SessionDriver, mpsc::Sender<SessionCommand>) {
        let repo = InMemoryRepository::new();
        let quiz = Quiz::new(
            QuizId::new("timed"),
            "Timed",
            QuizType::Calculation,
            Some(1),
            vec![
                Question::new(Some("a".into()), None, 12_i64),
                Question::new(Some("b".into()), None, "x"),
            ],
        )
        .unwrap();
        repo.upsert_quiz(&quiz).await.unwrap();

        let identity = Arc::new(LocalIdentity::signed_in(AuthUser::new(UserId::new("u"))));
        let mut session = QuizSession::new(Arc::new(repo.clone()), Arc::new(repo), identity)
            .with_observer(observer);
        session.start(&QuizId::new("timed"), 1).await.unwrap();

        let (tx, rx) = mpsc::channel(16);
        (SessionDriver::new(session, rx), tx)
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_the_full_limit() {
        let observer = Arc::new(RecordingObserver::new());
        let (mut driver, _tx) = driver(Arc::clone(&observer)).await;
        let started = Instant::now();

        driver.run().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(60));
        let session = driver.into_session();
        assert_eq!(session.state(), SessionState::Completed);
        let ticks = observer.ticks();
        assert_eq!(ticks.len(), 60);
        assert_eq!(ticks.first(), Some(&59));
        assert_eq!(ticks.last(), Some(&0));
        assert_eq!(observer.expire_count(), 1);
        assert_eq!(session.summary().unwrap().time_spent_secs(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_commands_run_before_ticks() {
        let observer = Arc::new(RecordingObserver::new());
        let (mut driver, tx) = driver(Arc::clone(&observer)).await;

        tx.send(SessionCommand::Answer {
            key: QuestionKey::new("a"),
            value: "12".into(),
        })
        .await
        .unwrap();
        tx.send(SessionCommand::Answer {
            key: QuestionKey::new("b"),
            value: "y".into(),
        })
        .await
        .unwrap();
        tx.send(SessionCommand::End).await.unwrap();

        driver.run().await.unwrap();
        let session = driver.into_session();
        let summary = session.summary().copied().unwrap();
        assert_eq!(summary.score().correct, 1);
        assert_eq!(summary.score().wrong, 1);
        assert_eq!(summary.score().score, 3.0);
        assert_eq!(summary.time_spent_secs(), 0);
        assert!(observer.ticks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_rearms_a_single_countdown() {
        let observer = Arc::new(RecordingObserver::new());
        let (mut driver, tx) = driver(Arc::clone(&observer)).await;

        let handle = tokio::spawn(async move {
            let outcome = driver.run().await;
            (driver, outcome)
        });

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        tx.send(SessionCommand::Restart {
            quiz_id: QuizId::new("timed"),
            time_limit_minutes: 1,
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        tx.send(SessionCommand::End).await.unwrap();

        let (driver, outcome) = handle.await.unwrap();
        outcome.unwrap();
        assert_eq!(observer.ticks(), vec![59, 58, 57, 59]);
        assert_eq!(
            driver.session().summary().unwrap().time_spent_secs(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn closed_channel_abandons_the_attempt() {
        let observer = Arc::new(RecordingObserver::new());
        let (mut driver, tx) = driver(Arc::clone(&observer)).await;
        drop(tx);

        driver.run().await.unwrap();
        assert_eq!(driver.session().state(), SessionState::Idle);
        assert!(driver.session().summary().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_restart_surfaces_the_error() {
        let observer = Arc::new(RecordingObserver::new());
        let (mut driver, tx) = driver(Arc::clone(&observer)).await;
        tx.send(SessionCommand::Restart {
            quiz_id: QuizId::new("missing"),
            time_limit_minutes: 5,
        })
        .await
        .unwrap();

        let err = driver.run().await.unwrap_err();
        assert!(matches!(err, SessionError::QuizNotFound { .. }));
        assert_eq!(driver.session().state(), SessionState::Idle);
    }
}
