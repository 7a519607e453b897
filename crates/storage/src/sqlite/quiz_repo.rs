use quiz_core::model::{Quiz, QuizId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{QuizDocument, QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        let row = sqlx::query("SELECT document FROM quizzes WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        let raw: String = row.try_get("document").map_err(ser)?;
        Ok(QuizDocument::from_json(&raw)?.into_quiz(id.clone())?)
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let document = QuizDocument::from_quiz(quiz).to_json()?;

        sqlx::query(
            r"
            INSERT INTO quizzes (id, title, quiz_type, document, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                quiz_type = excluded.quiz_type,
                document = excluded.document,
                updated_at = excluded.updated_at
            ",
        )
        .bind(quiz.id().as_str())
        .bind(quiz.title())
        .bind(quiz.quiz_type().as_str())
        .bind(document)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}

impl SqliteRepository {
    /// Store a raw JSON document as-is, the way an admin import would.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the document does not parse
    /// into a quiz, or `StorageError::Connection` if the write fails.
    pub async fn import_quiz_json(&self, id: &QuizId, raw: &str) -> Result<Quiz, StorageError> {
        let quiz = QuizDocument::from_json(raw)?.into_quiz(id.clone())?;
        self.upsert_quiz(&quiz).await?;
        Ok(quiz)
    }
}
