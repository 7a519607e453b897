use quiz_core::model::{UserId, UserRole};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn get_role(&self, uid: &UserId) -> Result<Option<UserRole>, StorageError> {
        let row = sqlx::query("SELECT role FROM users WHERE uid = ?1")
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|row| {
            row.try_get::<String, _>("role")
                .map(|tag| UserRole::from_tag(&tag))
                .map_err(ser)
        })
        .transpose()
    }

    async fn set_role(&self, uid: &UserId, role: UserRole) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO users (uid, role) VALUES (?1, ?2)
            ON CONFLICT(uid) DO UPDATE SET role = excluded.role
            ",
        )
        .bind(uid.as_str())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
