/// Admin activity audit log
use crate::error::GymResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteExecutor, SqlitePool};

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub admin_id: Option<i64>,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append an entry using any executor, so it can join an open transaction
pub async fn record<'e, E>(
    executor: E,
    admin_id: i64,
    action: &str,
    details: &str,
    at: DateTime<Utc>,
) -> GymResult<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO activity_log (admin_id, action, details, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(admin_id)
    .bind(action)
    .bind(details)
    .bind(at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Read access to the audit trail
#[derive(Clone)]
pub struct ActivityLog {
    db: SqlitePool,
}

impl ActivityLog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append an entry outside of any transaction
    pub async fn record(&self, admin_id: i64, action: &str, details: &str) -> GymResult<()> {
        record(&self.db, admin_id, action, details, Utc::now()).await
    }

    /// Most recent entries first
    pub async fn recent(&self, limit: i64) -> GymResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, admin_id, action, details, created_at
            FROM activity_log
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    #[tokio::test]
    async fn test_recent_orders_newest_first() {
        let db = create_memory_pool().await.unwrap();
        let log = ActivityLog::new(db.clone());

        let earlier = Utc::now() - chrono::Duration::minutes(5);
        record(&db, 1, "member.create", "Created member GYM20240001", earlier)
            .await
            .unwrap_err(); // no admin 1 yet, foreign key rejects it

        sqlx::query(
            "INSERT INTO admins (id, username, password_hash, email, full_name, created_at)
             VALUES (1, 'admin', 'x', 'admin@example.com', 'Admin', '2024-01-01T00:00:00Z')",
        )
        .execute(&db)
        .await
        .unwrap();

        record(&db, 1, "member.create", "Created member GYM20240001", earlier)
            .await
            .unwrap();
        log.record(1, "login", "Admin logged in").await.unwrap();

        let entries = log.recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "login");
        assert_eq!(entries[1].action, "member.create");
        assert_eq!(entries[1].admin_id, Some(1));
    }
}
