/// Membership history log
use crate::error::GymResult;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqliteExecutor};

/// State of a recorded membership period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Active,
    Expired,
    Cancelled,
}

/// One activated membership period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub member_id: i64,
    pub membership_plan_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_id: Option<i64>,
    pub status: HistoryStatus,
    pub created_at: DateTime<Utc>,
}

/// History entry to be written
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub member_id: i64,
    pub membership_plan_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_id: Option<i64>,
    pub status: HistoryStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert a history entry on an open connection or transaction
pub async fn insert_entry(conn: &mut SqliteConnection, new: NewHistoryEntry) -> GymResult<HistoryEntry> {
    let result = sqlx::query(
        r#"
        INSERT INTO membership_history (member_id, membership_plan_id, start_date, end_date, payment_id, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(new.member_id)
    .bind(new.membership_plan_id)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.payment_id)
    .bind(new.status)
    .bind(new.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(HistoryEntry {
        id: result.last_insert_rowid(),
        member_id: new.member_id,
        membership_plan_id: new.membership_plan_id,
        start_date: new.start_date,
        end_date: new.end_date,
        payment_id: new.payment_id,
        status: new.status,
        created_at: new.created_at,
    })
}

/// History for a member, newest period first
pub async fn list_for_member<'e, E>(executor: E, member_id: i64) -> GymResult<Vec<HistoryEntry>>
where
    E: SqliteExecutor<'e>,
{
    let entries = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT id, member_id, membership_plan_id, start_date, end_date, payment_id, status, created_at
        FROM membership_history
        WHERE member_id = ?1
        ORDER BY start_date DESC, id DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(executor)
    .await?;

    Ok(entries)
}

/// Flip active periods that ended before `today` to expired
pub async fn expire_entries<'e, E>(executor: E, today: NaiveDate) -> GymResult<u64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE membership_history SET status = 'expired' WHERE status = 'active' AND end_date < ?1",
    )
    .bind(today)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
