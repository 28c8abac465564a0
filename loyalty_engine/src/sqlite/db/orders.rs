use chrono::Utc;
use log::{debug, trace};
use lps_common::Points;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType},
    traits::{ApplyVerdictResult, InsertOrderResult},
};

/// Inserts a new order for `user_id` in status `NEW`.
///
/// The `UNIQUE` constraint on `number` decides the race between two concurrent submissions of the same number. The
/// loser writes nothing and gets the winner's order back as [`InsertOrderResult::AlreadyExists`].
pub async fn idempotent_insert(
    user_id: i64,
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, sqlx::Error> {
    let now = Utc::now();
    let inserted = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (number, user_id, status, submitted_at, updated_at)
            VALUES ($1, $2, 'NEW', $3, $3)
            ON CONFLICT (number) DO NOTHING
            RETURNING id, number, user_id, status, accrual, submitted_at, updated_at;
        "#,
    )
    .bind(number)
    .bind(user_id)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = inserted {
        debug!("🗃️ Order {number} has been saved in the DB with id {}", order.id);
        return Ok(InsertOrderResult::Inserted(order));
    }
    trace!("🗃️ Order {number} already exists");
    let existing = fetch_order_by_number(number, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
    Ok(InsertOrderResult::AlreadyExists(existing))
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT id, number, user_id, status, accrual, submitted_at, updated_at
            FROM orders
            WHERE number = $1;
        "#,
    )
    .bind(number)
    .fetch_optional(conn)
    .await
}

/// Orders for the given user, ordered by `submitted_at` in ascending order
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT id, number, user_id, status, accrual, submitted_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY submitted_at ASC, id ASC;
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}

/// The numbers of orders still waiting on a verdict (`NEW` or `PROCESSING`), oldest first.
pub async fn fetch_pending_numbers(limit: u32, conn: &mut SqliteConnection) -> Result<Vec<OrderNumber>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
            SELECT number
            FROM orders
            WHERE status IN ('NEW', 'PROCESSING')
            ORDER BY submitted_at ASC, id ASC
            LIMIT $1;
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(conn)
    .await
}

/// Moves a non-terminal order to `status` in a single statement. Terminal orders are not matched by the `WHERE`
/// clause, so they can never be revisited, no matter how many stale verdicts arrive for them.
pub async fn apply_verdict(
    number: &OrderNumber,
    status: OrderStatusType,
    accrual: Option<Points>,
    conn: &mut SqliteConnection,
) -> Result<ApplyVerdictResult, sqlx::Error> {
    let updated = sqlx::query_as::<_, Order>(
        r#"
            UPDATE orders
            SET status = $1, accrual = $2, updated_at = $3
            WHERE number = $4 AND status IN ('NEW', 'PROCESSING')
            RETURNING id, number, user_id, status, accrual, submitted_at, updated_at;
        "#,
    )
    .bind(status)
    .bind(accrual)
    .bind(Utc::now())
    .bind(number)
    .fetch_optional(conn)
    .await?;
    match updated {
        Some(order) => {
            trace!("🗃️ Order {number} is now {status}");
            Ok(ApplyVerdictResult::Applied(order))
        },
        None => Ok(ApplyVerdictResult::NotFound),
    }
}
