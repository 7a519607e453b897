use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use quiz_core::countdown::{ClockStart, ClockTick, SessionClock};
use quiz_core::model::{
    AnswerSheet, AnswerValue, DetailedAnalysis, QuestionKey, Quiz, QuizId, QuizType, ResultId,
    ResultSummary, ScoreResult,
};
use storage::repository::{QuizRepository, QuizResultRecord, QuizResultRepository};

use super::observer::{NoopObserver, SessionObserver};
use super::progress::SessionProgress;
use super::state::SessionState;
use crate::auth::IdentityProvider;
use crate::error::SessionError;

pub use quiz_core::model::DEFAULT_TIME_LIMIT_MINUTES;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed attempt at a quiz.
///
/// The session owns its countdown and answer sheet. It never schedules
/// anything itself: a caller (usually [`SessionDriver`](super::SessionDriver))
/// decides when a second has passed and feeds commands in one at a time.
pub struct QuizSession {
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn QuizResultRepository>,
    identity: Arc<dyn IdentityProvider>,
    observer: Arc<dyn SessionObserver>,

    state: SessionState,
    quiz: Option<Quiz>,
    answers: AnswerSheet,
    clock: SessionClock,
    time_limit_secs: u32,
    summary: Option<ResultSummary>,
    result_id: Option<ResultId>,
    pending_save: Option<JoinHandle<Result<ResultId, SessionError>>>,
}

impl QuizSession {
    #[must_use]
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn QuizResultRepository>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            quizzes,
            results,
            identity,
            observer: Arc::new(NoopObserver),
            state: SessionState::Idle,
            quiz: None,
            answers: AnswerSheet::new(),
            clock: SessionClock::new(),
            time_limit_secs: 0,
            summary: None,
            result_id: None,
            pending_save: None,
        }
    }

    /// Route UI callbacks to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Fetch `quiz_id` and start a countdown of `time_limit_minutes`.
    ///
    /// Calling this while `Active` restarts: the running clock is stopped and
    /// answers are discarded before the new fetch. A limit of zero finalizes
    /// the attempt immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizNotFound` / `SessionError::QuizLoad` when the
    /// fetch fails (the session is back in `Idle`), and
    /// `SessionError::InvalidState` when called from `Loading`, `Ending` or
    /// `Completed`.
    pub async fn start(
        &mut self,
        quiz_id: &QuizId,
        time_limit_minutes: u32,
    ) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Idle | SessionState::Active) {
            return Err(self.invalid("start"));
        }
        if self.state == SessionState::Active {
            info!(quiz_id = %quiz_id, "restarting quiz session");
        }

        self.clock.stop();
        self.answers.reset();
        self.quiz = None;
        self.summary = None;
        self.result_id = None;
        self.state = SessionState::Loading;

        let quiz = match self.quizzes.get_quiz(quiz_id).await {
            Ok(quiz) => quiz,
            Err(err) => {
                let err = SessionError::from_load(quiz_id.clone(), err);
                warn!(quiz_id = %quiz_id, error = %err, "quiz load failed");
                self.clock.stop();
                self.state = SessionState::Idle;
                self.observer.on_error(err.kind(), &err.to_string());
                return Err(err);
            }
        };

        self.time_limit_secs = time_limit_minutes.saturating_mul(60);
        info!(
            quiz_id = %quiz_id,
            questions = quiz.total_questions(),
            time_limit_secs = self.time_limit_secs,
            "quiz session started"
        );
        self.quiz = Some(quiz);
        self.state = SessionState::Active;

        match self.clock.start(i64::from(self.time_limit_secs)) {
            ClockStart::Started | ClockStart::AlreadyRunning => Ok(()),
            ClockStart::Expired => {
                info!(quiz_id = %quiz_id, "time limit is zero; finalizing immediately");
                self.observer.on_expire();
                self.end().await.map(|_| ())
            }
        }
    }

    /// Store `value` as the answer for `key`, overwriting any earlier answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is `Active`.
    pub fn record_answer(
        &mut self,
        key: QuestionKey,
        value: AnswerValue,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(self.invalid("record an answer"));
        }
        self.answers.record(key, value);
        Ok(())
    }

    /// Mark `key` as not attempted again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is `Active`.
    pub fn clear_answer(&mut self, key: QuestionKey) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(self.invalid("clear an answer"));
        }
        self.answers.clear(key);
        Ok(())
    }

    /// Score the current answers. Zero when no quiz is loaded.
    #[must_use]
    pub fn compute_score(&self) -> ScoreResult {
        self.quiz
            .as_ref()
            .map(|quiz| ScoreResult::compute(quiz, &self.answers))
            .unwrap_or_default()
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `None` when the clock is not running. On the tick that reaches
    /// zero the attempt is finalized before returning.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`end`](Self::end).
    pub async fn tick(&mut self) -> Result<Option<ClockTick>, SessionError> {
        if self.state != SessionState::Active {
            return Ok(None);
        }
        let Some(tick) = self.clock.tick() else {
            return Ok(None);
        };
        self.observer.on_tick(tick.remaining);
        if tick.expired {
            info!("quiz time expired");
            self.observer.on_expire();
            self.end().await?;
        }
        Ok(Some(tick))
    }

    /// Stop the clock, score the answers as they are now and request persistence.
    ///
    /// Returns as soon as the session is `Completed`. The save runs on its own
    /// task; a failure there is logged and reported through `on_error` only.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is `Active`.
    pub async fn end(&mut self) -> Result<ResultSummary, SessionError> {
        if self.state != SessionState::Active {
            return Err(self.invalid("end"));
        }
        let Some(quiz) = self.quiz.as_ref() else {
            return Err(self.invalid("end"));
        };

        self.state = SessionState::Ending;
        self.clock.stop();
        let summary = ResultSummary::from_answers(
            quiz,
            &self.answers,
            self.time_limit_secs,
            self.clock.remaining(),
        );
        self.summary = Some(summary);
        self.state = SessionState::Completed;
        info!(
            score = summary.score().score,
            correct = summary.score().correct,
            wrong = summary.score().wrong,
            time_spent_secs = summary.time_spent_secs(),
            "quiz session completed"
        );
        self.observer.on_scored(&summary);
        self.spawn_save();
        Ok(summary)
    }

    fn spawn_save(&mut self) {
        let Some(record) = self.result_record() else {
            return;
        };
        let results = Arc::clone(&self.results);
        let observer = Arc::clone(&self.observer);
        self.pending_save = Some(tokio::spawn(async move {
            match results.add_result(&record).await {
                Ok(id) => {
                    debug!(result_id = %id, "quiz result saved");
                    Ok(id)
                }
                Err(err) => {
                    let err = SessionError::Persistence(err);
                    warn!(error = %err, "quiz result was not saved");
                    observer.on_error(err.kind(), &err.to_string());
                    Err(err)
                }
            }
        }));
    }

    /// Wait for the save requested by [`end`](Self::end) and record its id.
    ///
    /// Returns the stored id, or `None` when nothing was saved (nobody signed
    /// in, or a failure already reported). A failed save is returned once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Persistence` when the store rejected the write
    /// and `SessionError::SaveInterrupted` when the save task was cancelled.
    pub async fn wait_for_save(&mut self) -> Result<Option<ResultId>, SessionError> {
        if let Some(handle) = self.pending_save.take() {
            let id = handle
                .await
                .map_err(|err| SessionError::SaveInterrupted(err.to_string()))??;
            self.result_id = Some(id);
        }
        Ok(self.result_id)
    }

    /// Try again to save a completed attempt whose first save failed.
    ///
    /// Waits for a save still in flight first. Returns the stored id, or
    /// `None` when nobody is signed in. Once stored, further calls return the
    /// same id without writing again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` before completion and
    /// `SessionError::Persistence` when the store rejects the write.
    pub async fn retry_persist(&mut self) -> Result<Option<ResultId>, SessionError> {
        if self.state != SessionState::Completed {
            return Err(self.invalid("save results"));
        }
        if let Ok(Some(id)) = self.wait_for_save().await {
            return Ok(Some(id));
        }
        let Some(record) = self.result_record() else {
            return Ok(None);
        };
        let id = self
            .results
            .add_result(&record)
            .await
            .map_err(SessionError::Persistence)?;
        debug!(result_id = %id, "quiz result saved on retry");
        self.result_id = Some(id);
        Ok(Some(id))
    }

    /// The record to store for a completed attempt, if a user is signed in.
    fn result_record(&self) -> Option<QuizResultRecord> {
        let (Some(quiz), Some(summary)) = (self.quiz.as_ref(), self.summary.as_ref()) else {
            return None;
        };
        let Some(user) = self.identity.current_user() else {
            debug!(quiz_id = %quiz.id(), "no signed-in user; skipping result save");
            return None;
        };
        Some(QuizResultRecord::from_summary(&user, quiz, summary))
    }

    /// Question-wise breakdown of a completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is `Completed`.
    pub fn detailed_analysis(&self) -> Result<DetailedAnalysis, SessionError> {
        match (self.state, self.quiz.as_ref(), self.summary.as_ref()) {
            (SessionState::Completed, Some(quiz), Some(summary)) => {
                Ok(DetailedAnalysis::build(quiz, &self.answers, summary))
            }
            _ => Err(self.invalid("build the analysis")),
        }
    }

    /// Drop an unfinished attempt. Completed attempts are left as they are.
    pub fn abandon(&mut self) {
        self.clock.stop();
        if matches!(self.state, SessionState::Loading | SessionState::Active) {
            debug!("quiz session abandoned");
            self.state = SessionState::Idle;
        }
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            state: self.state,
        }
    }

    // ─── Accessors ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    /// Rendering variant of the loaded quiz.
    #[must_use]
    pub fn quiz_type(&self) -> Option<QuizType> {
        self.quiz.as_ref().map(Quiz::quiz_type)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn remaining_secs(&self) -> i64 {
        self.clock.remaining()
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn result_id(&self) -> Option<ResultId> {
        self.result_id
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let (total_questions, attempted) = self.quiz.as_ref().map_or((0, 0), |quiz| {
            let attempted = quiz
                .keyed_questions()
                .filter(|(key, _)| self.answers.attempted(key).is_some())
                .count();
            (quiz.total_questions(), attempted)
        });
        SessionProgress {
            state: self.state,
            total_questions,
            attempted,
            remaining_secs: self.clock.remaining(),
        }
    }
}
