/// Front desk dashboard figures
use crate::{error::GymResult, payments::PaymentLedger};
use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_members: i64,
    pub active_members: i64,
    pub pending_members: i64,
    /// Active memberships ending within the look-ahead window
    pub expiring_soon: i64,
    pub expiring_soon_days: i64,
    pub revenue_this_month: Decimal,
    pub as_of: NaiveDate,
}

pub struct Dashboard {
    db: SqlitePool,
    payments: PaymentLedger,
    expiring_soon_days: i64,
}

impl Dashboard {
    pub fn new(db: SqlitePool, expiring_soon_days: i64) -> Self {
        Self {
            payments: PaymentLedger::new(db.clone()),
            db,
            expiring_soon_days: expiring_soon_days.max(0),
        }
    }

    /// Figures as of `today`
    pub async fn stats(&self, today: NaiveDate) -> GymResult<DashboardStats> {
        let (total_members, active_members, pending_members): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0)
            FROM members
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let horizon = today
            .checked_add_days(Days::new(self.expiring_soon_days.unsigned_abs()))
            .unwrap_or(NaiveDate::MAX);

        let expiring_soon: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM members
            WHERE status = 'active'
              AND membership_end_date IS NOT NULL
              AND membership_end_date >= ?1
              AND membership_end_date <= ?2
            "#,
        )
        .bind(today)
        .bind(horizon)
        .fetch_one(&self.db)
        .await?;

        let (month_start, next_month) = month_bounds(today);
        let revenue_this_month = self.payments.revenue_between(month_start, next_month).await?;

        Ok(DashboardStats {
            total_members,
            active_members,
            pending_members,
            expiring_soon,
            expiring_soon_days: self.expiring_soon_days,
            revenue_this_month,
            as_of: today,
        })
    }
}

/// First day of `day`'s month and of the month after
fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day.with_day(1).unwrap_or(day);
    let next = start.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
    (start, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(d(2024, 2, 29)), (d(2024, 2, 1), d(2024, 3, 1)));
        assert_eq!(month_bounds(d(2024, 12, 15)), (d(2024, 12, 1), d(2025, 1, 1)));
    }

    #[tokio::test]
    async fn test_stats() {
        let db = create_memory_pool().await.unwrap();

        for (id, status, end) in [
            (1, "active", Some("2024-03-05")),
            (2, "active", Some("2024-04-30")),
            (3, "pending", None),
            (4, "inactive", Some("2024-03-02")),
        ] {
            sqlx::query(
                "INSERT INTO members (id, member_code, first_name, last_name, email, phone, status, membership_end_date, created_at, updated_at)
                 VALUES (?1, ?2, 'M', 'N', ?3, '555', ?4, ?5, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            )
            .bind(id)
            .bind(format!("GYM2024{:04}", id))
            .bind(format!("m{}@example.com", id))
            .bind(status)
            .bind(end)
            .execute(&db)
            .await
            .unwrap();
        }

        for (receipt, date, amount) in [
            ("R20240301090000", "2024-03-01", "49.99"),
            ("R20240302090000", "2024-03-02", "129.99"),
            ("R20240229090000", "2024-02-29", "10.00"),
        ] {
            sqlx::query(
                "INSERT INTO payments (member_id, amount, payment_date, payment_method, description, receipt_number, created_at)
                 VALUES (1, ?1, ?2, 'cash', 'Fee', ?3, '2024-03-01T09:00:00Z')",
            )
            .bind(amount)
            .bind(date)
            .bind(receipt)
            .execute(&db)
            .await
            .unwrap();
        }

        let stats = Dashboard::new(db, 7).stats(d(2024, 3, 1)).await.unwrap();

        assert_eq!(stats.total_members, 4);
        assert_eq!(stats.active_members, 2);
        assert_eq!(stats.pending_members, 1);
        assert_eq!(stats.expiring_soon, 1);
        assert_eq!(stats.revenue_this_month, Decimal::new(17998, 2));
    }
}
