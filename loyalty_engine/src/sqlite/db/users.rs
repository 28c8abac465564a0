use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{NewUser, User};

/// Inserts a new user. Returns `None` if the login is already taken.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO users (login, password_hash, salt, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (login) DO NOTHING
            RETURNING id, login, password_hash, salt, created_at;
        "#,
    )
    .bind(user.login)
    .bind(user.password_hash)
    .bind(user.salt)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
}

pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT id, login, password_hash, salt, created_at FROM users WHERE login = $1")
        .bind(login)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT id, login, password_hash, salt, created_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}
