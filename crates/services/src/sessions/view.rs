use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{QuizId, QuizType, ResultId, UserId};
use storage::repository::{QuizResultRepository, StoredQuizResult};

use crate::error::HistoryError;

/// Presentation-agnostic list item for a stored quiz result.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no rounding of accuracy
///
/// The UI may format timestamps and percentages as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultListItem {
    pub id: ResultId,
    pub recorded_at: DateTime<Utc>,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub quiz_type: QuizType,

    pub score: f64,
    pub correct: u32,
    pub wrong: u32,
    pub total_questions: u32,
    pub accuracy: f64,
    pub time_spent_secs: u32,
}

impl ResultListItem {
    #[must_use]
    pub fn from_stored(stored: &StoredQuizResult) -> Self {
        let record = &stored.record;
        Self {
            id: stored.id,
            recorded_at: stored.recorded_at,
            quiz_id: record.quiz_id.clone(),
            quiz_title: record.quiz_title.clone(),
            quiz_type: record.quiz_type,
            score: record.score,
            correct: record.correct_answers,
            wrong: record.wrong_answers,
            total_questions: record.total_questions,
            accuracy: record.accuracy,
            time_spent_secs: record.time_spent_secs,
        }
    }
}

/// Read side of saved attempts: what a user has taken before.
#[derive(Clone)]
pub struct ResultHistoryService {
    results: Arc<dyn QuizResultRepository>,
}

impl ResultHistoryService {
    #[must_use]
    pub fn new(results: Arc<dyn QuizResultRepository>) -> Self {
        Self { results }
    }

    /// Most recent results for `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ResultListItem>, HistoryError> {
        let stored = self.results.list_results_for_user(user_id, limit).await?;
        Ok(stored.iter().map(ResultListItem::from_stored).collect())
    }

    /// Full stored record for one result.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` (including `NotFound`) on repository failures.
    pub async fn get(&self, id: ResultId) -> Result<StoredQuizResult, HistoryError> {
        Ok(self.results.get_result(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{AnswerSheet, AuthUser, Question, Quiz, QuestionKey, ResultSummary};
    use quiz_core::time::{Clock, fixed_now};
    use storage::repository::{InMemoryRepository, QuizResultRecord, StorageError};

    fn record(uid: &str, score_correct: bool) -> QuizResultRecord {
        let quiz = Quiz::new(
            QuizId::new("mock-1"),
            "Mock 1",
            QuizType::MockTest,
            Some(10),
            vec![Question::new(Some("only".into()), None, "yes")],
        )
        .unwrap();
        let mut answers = AnswerSheet::new();
        let answer = if score_correct { "yes" } else { "no" };
        answers.record(QuestionKey::new("only"), answer.into());
        let summary = ResultSummary::from_answers(&quiz, &answers, 600, 420);
        QuizResultRecord::from_summary(&AuthUser::new(UserId::new(uid)), &quiz, &summary)
    }

    #[tokio::test]
    async fn lists_newest_first_and_projects_fields() {
        let older = InMemoryRepository::new().with_clock(Clock::fixed(fixed_now()));
        older.add_result(&record("u-1", false)).await.unwrap();
        let repo = older.with_clock(Clock::fixed(fixed_now() + Duration::minutes(5)));
        let newest = repo.add_result(&record("u-1", true)).await.unwrap();
        repo.add_result(&record("u-2", true)).await.unwrap();

        let history = ResultHistoryService::new(Arc::new(repo));
        let items = history
            .recent_for_user(&UserId::new("u-1"), 10)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, newest);
        assert_eq!(items[0].score, 4.0);
        assert_eq!(items[0].accuracy, 100.0);
        assert_eq!(items[0].time_spent_secs, 180);
        assert_eq!(items[0].quiz_type, QuizType::MockTest);
        assert_eq!(items[1].score, -1.0);
        assert!(items[0].recorded_at > items[1].recorded_at);

        let limited = history
            .recent_for_user(&UserId::new("u-1"), 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn get_reports_missing_results() {
        let history = ResultHistoryService::new(Arc::new(InMemoryRepository::new()));
        let err = history.get(ResultId::generate()).await.unwrap_err();
        assert!(matches!(err, HistoryError::Storage(StorageError::NotFound)));
    }
}
