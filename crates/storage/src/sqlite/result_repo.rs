use quiz_core::model::{ResultId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_result_row, result_id_to_text};
use crate::repository::{QuizResultRecord, QuizResultRepository, StorageError, StoredQuizResult};

const RESULT_COLUMNS: &str = r"
    id, user_id, user_name, quiz_id, quiz_title, quiz_type,
    correct_answers, wrong_answers, total_questions,
    score, accuracy, time_spent, recorded_at
";

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn add_result(&self, record: &QuizResultRecord) -> Result<ResultId, StorageError> {
        let id = ResultId::generate();

        sqlx::query(
            r"
                INSERT INTO quiz_results (
                    id, user_id, user_name, quiz_id, quiz_title, quiz_type,
                    correct_answers, wrong_answers, total_questions,
                    score, accuracy, time_spent, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
        )
        .bind(result_id_to_text(id))
        .bind(record.user_id.as_str())
        .bind(record.user_name.as_deref())
        .bind(record.quiz_id.as_str())
        .bind(&record.quiz_title)
        .bind(record.quiz_type.as_str())
        .bind(i64::from(record.correct_answers))
        .bind(i64::from(record.wrong_answers))
        .bind(i64::from(record.total_questions))
        .bind(record.score)
        .bind(record.accuracy)
        .bind(i64::from(record.time_spent_secs))
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(id)
    }

    async fn get_result(&self, id: ResultId) -> Result<StoredQuizResult, StorageError> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM quiz_results WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(result_id_to_text(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StoredQuizResult>, StorageError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM quiz_results WHERE user_id = ?1 \
             ORDER BY recorded_at DESC, rowid DESC LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}
