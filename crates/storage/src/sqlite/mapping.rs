use quiz_core::model::{QuizId, QuizType, ResultId, UserId};
use sqlx::Row;

use crate::repository::{QuizResultRecord, StorageError, StoredQuizResult};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn result_id_to_text(id: ResultId) -> String {
    id.to_string()
}

pub(crate) fn result_id_from_text(raw: &str) -> Result<ResultId, StorageError> {
    raw.parse::<ResultId>().map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredQuizResult, StorageError> {
    let id = result_id_from_text(&row.try_get::<String, _>("id").map_err(ser)?)?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;
    let quiz_type: String = row.try_get("quiz_type").map_err(ser)?;

    let record = QuizResultRecord {
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        user_name: row.try_get("user_name").map_err(ser)?,
        quiz_id: QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?),
        quiz_title: row.try_get("quiz_title").map_err(ser)?,
        quiz_type: QuizType::from_tag(Some(&quiz_type)),
        correct_answers: u32_from_i64(
            "correct_answers",
            row.try_get::<i64, _>("correct_answers").map_err(ser)?,
        )?,
        wrong_answers: u32_from_i64(
            "wrong_answers",
            row.try_get::<i64, _>("wrong_answers").map_err(ser)?,
        )?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        score: row.try_get("score").map_err(ser)?,
        accuracy: row.try_get("accuracy").map_err(ser)?,
        time_spent_secs: u32_from_i64(
            "time_spent",
            row.try_get::<i64, _>("time_spent").map_err(ser)?,
        )?,
    };

    Ok(StoredQuizResult {
        id,
        recorded_at,
        record,
    })
}
