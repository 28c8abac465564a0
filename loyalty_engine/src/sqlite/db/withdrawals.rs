use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Balance, NewWithdrawal, Withdrawal};

/// Derives the user's balance from their processed orders and withdrawals.
pub async fn fetch_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Balance, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT
                (SELECT COALESCE(SUM(accrual), 0) FROM orders WHERE user_id = $1 AND status = 'PROCESSED')
                - (SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE user_id = $1) AS current,
                (SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE user_id = $1) AS withdrawn;
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await
}

/// Inserts the withdrawal only if the user's current balance is at least `amount`.
///
/// The balance check is part of the `INSERT` statement. SQLite takes the write lock before evaluating it, so no other
/// withdrawal can slip in between the check and the insert. Returns `None` if the balance is insufficient.
pub async fn insert_if_covered(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Option<Withdrawal>, sqlx::Error> {
    let result = sqlx::query_as::<_, Withdrawal>(
        r#"
            INSERT INTO withdrawals (user_id, order_reference, amount, processed_at)
            SELECT $1, $2, $3, $4
            WHERE (
                (SELECT COALESCE(SUM(accrual), 0) FROM orders WHERE user_id = $1 AND status = 'PROCESSED')
                - (SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE user_id = $1)
            ) >= $3
            RETURNING id, user_id, order_reference, amount, processed_at;
        "#,
    )
    .bind(withdrawal.user_id)
    .bind(&withdrawal.order_reference)
    .bind(withdrawal.amount)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    if result.is_none() {
        trace!("🗃️ Withdrawal of {} for user #{} is not covered by the balance", withdrawal.amount, withdrawal.user_id);
    }
    Ok(result)
}

pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT id, user_id, order_reference, amount, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at ASC, id ASC;
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}
