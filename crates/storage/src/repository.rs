use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::Clock;
use quiz_core::model::{
    AnswerValue, AuthUser, Question, Quiz, QuizError, QuizId, QuizType, ResultId, ResultSummary,
    UserId, UserRole,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<QuizError> for StorageError {
    fn from(err: QuizError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

//
// ─── QUIZ DOCUMENT ────────────────────────────────────────────────────────────
//

/// Stored shape of a quiz in the `quizzes` collection.
///
/// Field names follow the documents already in the store (`correctAnswer`,
/// `negativePoints`, `timeLimit`), so this stays separate from the domain `Quiz`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDocument {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub quiz_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<f64>,
    #[serde(default)]
    pub questions: Vec<QuestionDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDocument {
    /// Authors have used both strings and numbers here.
    #[serde(default, skip_serializing_if = "AnswerValue::is_null")]
    pub id: AnswerValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub correct_answer: AnswerValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_points: Option<f64>,
}

impl QuestionDocument {
    /// Falsy ids (`null`, `false`, `0`, `""`) fall back to the positional key.
    fn id_text(&self) -> Option<String> {
        match &self.id {
            AnswerValue::Null | AnswerValue::Bool(false) => None,
            AnswerValue::Number(n) if *n == 0.0 || n.is_nan() => None,
            AnswerValue::Text(s) if s.is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    fn into_question(self) -> Question {
        Question::new(self.id_text(), self.text, self.correct_answer)
            .with_points(self.points)
            .with_negative_points(self.negative_points)
    }

    fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().map_or(AnswerValue::Null, AnswerValue::from),
            text: question.text().map(ToOwned::to_owned),
            correct_answer: question.correct_answer().clone(),
            points: Some(question.points()),
            negative_points: Some(question.negative_points()),
        }
    }
}

impl QuizDocument {
    /// Parses a JSON quiz document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Serializes the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    #[must_use]
    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            title: quiz.title().to_owned(),
            quiz_type: Some(quiz.quiz_type().as_str().to_owned()),
            time_limit: Some(f64::from(quiz.time_limit_minutes())),
            questions: quiz
                .questions()
                .iter()
                .map(QuestionDocument::from_question)
                .collect(),
        }
    }

    /// Convert the document into a domain `Quiz` stored under `id`.
    ///
    /// `timeLimit` is rounded to whole minutes; any positive limit keeps at
    /// least one minute. Missing, zero or non-finite limits fall back to the
    /// default.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if question keys collide.
    pub fn into_quiz(self, id: QuizId) -> Result<Quiz, QuizError> {
        let time_limit = self
            .time_limit
            .filter(|m| m.is_finite() && *m > 0.0)
            .map(|m| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let minutes = m.round().clamp(1.0, f64::from(u32::MAX)) as u32;
                minutes
            });
        Quiz::new(
            id,
            self.title,
            QuizType::from_tag(self.quiz_type.as_deref()),
            time_limit,
            self.questions
                .into_iter()
                .map(QuestionDocument::into_question)
                .collect(),
        )
    }
}

//
// ─── QUIZ RESULT RECORD ───────────────────────────────────────────────────────
//

/// Document written to `quiz_results` after an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResultRecord {
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub quiz_type: QuizType,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub total_questions: u32,
    pub score: f64,
    pub accuracy: f64,
    pub time_spent_secs: u32,
}

impl QuizResultRecord {
    #[must_use]
    pub fn from_summary(user: &AuthUser, quiz: &Quiz, summary: &ResultSummary) -> Self {
        let score = summary.score();
        Self {
            user_id: user.uid.clone(),
            user_name: user.display_label().map(ToOwned::to_owned),
            quiz_id: quiz.id().clone(),
            quiz_title: quiz.title().to_owned(),
            quiz_type: quiz.quiz_type(),
            correct_answers: score.correct,
            wrong_answers: score.wrong,
            total_questions: summary.total_questions(),
            score: score.score,
            accuracy: summary.accuracy(),
            time_spent_secs: summary.time_spent_secs(),
        }
    }
}

/// A result as read back from the store, with its server-assigned fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuizResult {
    pub id: ResultId,
    pub recorded_at: DateTime<Utc>,
    pub record: QuizResultRecord,
}

//
// ─── REPOSITORY CONTRACTS ─────────────────────────────────────────────────────
//

/// Read/write access to the `quizzes` collection.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, `StorageError::Serialization`
    /// if the stored document cannot be read, or other storage errors.
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError>;

    /// Persist or replace a quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;
}

/// Append-only access to the `quiz_results` collection.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Store a result; the store assigns the id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn add_result(&self, record: &QuizResultRecord) -> Result<ResultId, StorageError>;

    /// Fetch a stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: ResultId) -> Result<StoredQuizResult, StorageError>;

    /// Most recent results for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StoredQuizResult>, StorageError>;
}

/// Role lookups against the `users` collection.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Role on the user's profile, `None` when there is no profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_role(&self, uid: &UserId) -> Result<Option<UserRole>, StorageError>;

    /// Create or update the user's role.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn set_role(&self, uid: &UserId, role: UserRole) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    clock: Clock,
    quizzes: Arc<Mutex<HashMap<QuizId, Quiz>>>,
    results: Arc<Mutex<Vec<StoredQuizResult>>>,
    roles: Arc<Mutex<HashMap<UserId, UserRole>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `clock` for the timestamps assigned to stored results.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        guard.insert(quiz.id().clone(), quiz.clone());
        Ok(())
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn add_result(&self, record: &QuizResultRecord) -> Result<ResultId, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        let id = ResultId::generate();
        guard.push(StoredQuizResult {
            id,
            recorded_at: self.clock.now(),
            record: record.clone(),
        });
        Ok(id)
    }

    async fn get_result(&self, id: ResultId) -> Result<StoredQuizResult, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        guard
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StoredQuizResult>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        // Insertion order breaks timestamp ties, newest first.
        let mut found: Vec<_> = guard
            .iter()
            .enumerate()
            .filter(|(_, r)| &r.record.user_id == user_id)
            .collect();
        found.sort_by(|(ia, a), (ib, b)| b.recorded_at.cmp(&a.recorded_at).then(ib.cmp(ia)));
        Ok(found
            .into_iter()
            .take(limit)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_role(&self, uid: &UserId) -> Result<Option<UserRole>, StorageError> {
        let guard = self.roles.lock().map_err(poisoned)?;
        Ok(guard.get(uid).copied())
    }

    async fn set_role(&self, uid: &UserId, role: UserRole) -> Result<(), StorageError> {
        let mut guard = self.roles.lock().map_err(poisoned)?;
        guard.insert(uid.clone(), role);
        Ok(())
    }
}

/// Aggregates the document-store collections behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub results: Arc<dyn QuizResultRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let results: Arc<dyn QuizResultRepository> = Arc::new(repo.clone());
        let users: Arc<dyn UserRepository> = Arc::new(repo);
        Self {
            quizzes,
            results,
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerSheet, DEFAULT_TIME_LIMIT_MINUTES, QuestionKey};
    use quiz_core::time::fixed_clock;

    const DOC: &str = r#"{
        "title": "Arithmetic",
        "type": "calculation",
        "timeLimit": 15,
        "questions": [
            { "id": "q1", "text": "2 + 3", "correctAnswer": 5 },
            { "text": "10 / 4", "correctAnswer": "2.5", "points": 2, "negativePoints": 0.5 },
            { "id": 0, "correctAnswer": "B", "points": 0 }
        ]
    }"#;

    #[test]
    fn short_time_limits_keep_one_minute() {
        let limit = |time_limit: f64| {
            QuizDocument {
                title: "Short".into(),
                time_limit: Some(time_limit),
                ..QuizDocument::default()
            }
            .into_quiz(QuizId::new("short"))
            .unwrap()
            .time_limit_minutes()
        };
        assert_eq!(limit(0.5), 1);
        assert_eq!(limit(0.01), 1);
        assert_eq!(limit(2.6), 3);
        assert_eq!(limit(0.0), DEFAULT_TIME_LIMIT_MINUTES);
        assert_eq!(limit(-3.0), DEFAULT_TIME_LIMIT_MINUTES);
    }

    #[test]
    fn parses_stored_document() {
        let quiz = QuizDocument::from_json(DOC)
            .unwrap()
            .into_quiz(QuizId::new("arith"))
            .unwrap();

        assert_eq!(quiz.title(), "Arithmetic");
        assert_eq!(quiz.quiz_type(), QuizType::Calculation);
        assert_eq!(quiz.time_limit_minutes(), 15);
        let keys: Vec<_> = quiz.keyed_questions().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                QuestionKey::new("q1"),
                QuestionKey::new("1"),
                QuestionKey::new("2")
            ]
        );
        assert_eq!(quiz.questions()[1].points(), 2.0);
        assert_eq!(quiz.questions()[2].points(), 4.0);
    }

    #[test]
    fn malformed_document_is_a_serialization_error() {
        let err = QuizDocument::from_json(r#"{"questions": "nope"}"#).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn document_survives_domain_roundtrip() {
        let quiz = QuizDocument::from_json(DOC)
            .unwrap()
            .into_quiz(QuizId::new("arith"))
            .unwrap();
        let again = QuizDocument::from_quiz(&quiz)
            .into_quiz(QuizId::new("arith"))
            .unwrap();
        assert_eq!(quiz, again);
    }

    #[tokio::test]
    async fn results_list_newest_first_per_user() {
        let repo = InMemoryRepository::new().with_clock(fixed_clock());
        let quiz = QuizDocument::from_json(DOC)
            .unwrap()
            .into_quiz(QuizId::new("arith"))
            .unwrap();
        let summary = ResultSummary::from_answers(&quiz, &AnswerSheet::new(), 900, 900);
        let asha = AuthUser::new(UserId::new("asha")).with_email("asha@example.com");
        let ravi = AuthUser::new(UserId::new("ravi"));

        let first = repo
            .add_result(&QuizResultRecord::from_summary(&asha, &quiz, &summary))
            .await
            .unwrap();
        repo.add_result(&QuizResultRecord::from_summary(&ravi, &quiz, &summary))
            .await
            .unwrap();
        let second = repo
            .add_result(&QuizResultRecord::from_summary(&asha, &quiz, &summary))
            .await
            .unwrap();

        let listed = repo
            .list_results_for_user(&UserId::new("asha"), 10)
            .await
            .unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(
            listed[0].record.user_name.as_deref(),
            Some("asha@example.com")
        );

        let fetched = repo.get_result(first).await.unwrap();
        assert_eq!(fetched.recorded_at, quiz_core::time::fixed_now());
    }

    #[tokio::test]
    async fn missing_quiz_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.get_quiz(&QuizId::new("nope")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn roles_default_to_absent() {
        let repo = InMemoryRepository::new();
        let uid = UserId::new("u1");
        assert_eq!(repo.get_role(&uid).await.unwrap(), None);
        repo.set_role(&uid, UserRole::Admin).await.unwrap();
        assert_eq!(repo.get_role(&uid).await.unwrap(), Some(UserRole::Admin));
    }
}
