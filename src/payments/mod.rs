/// Payment ledger
///
/// Payments are append-only. New rows are only written from inside the
/// membership update transaction, so the insert helpers here take a bare
/// connection rather than the pool.

mod receipt_number;

pub use receipt_number::{MonotonicReceiptNumbers, ReceiptNumber, ReceiptNumberGenerator};

use crate::{
    error::{GymError, GymResult},
    plans::parse_amount,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

/// Accepted payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    BankTransfer,
    MobilePayment,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::MobilePayment => "mobile_payment",
            PaymentMethod::Other => "other",
        }
    }
}

/// Recorded payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub member_id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub description: String,
    pub receipt_number: ReceiptNumber,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    fn from_row(row: &SqliteRow) -> GymResult<Self> {
        let receipt: String = row.try_get("receipt_number")?;

        Ok(Self {
            id: row.try_get("id")?,
            member_id: row.try_get("member_id")?,
            amount: parse_amount(&row.try_get::<String, _>("amount")?)?,
            payment_date: row.try_get("payment_date")?,
            payment_method: row.try_get("payment_method")?,
            description: row.try_get("description")?,
            receipt_number: ReceiptNumber::parse(&receipt)
                .map_err(|_| GymError::Internal(format!("Stored receipt number is malformed: {}", receipt)))?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Payment to be written
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub member_id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub description: String,
    pub receipt_number: ReceiptNumber,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Joined read model used to render a receipt
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptView {
    pub payment_id: i64,
    pub receipt_number: String,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub description: String,
    pub member_code: String,
    pub member_name: String,
    pub member_email: String,
    pub member_phone: String,
    pub plan_name: Option<String>,
    pub plan_duration_days: Option<i64>,
    pub issued_by: Option<String>,
}

const PAYMENT_COLUMNS: &str = "id, member_id, amount, payment_date, payment_method, description, receipt_number, created_by, created_at";

/// Insert a payment on an open connection or transaction
pub async fn insert_payment(conn: &mut SqliteConnection, new: NewPayment) -> GymResult<Payment> {
    let amount = new.amount.round_dp(2);

    let result = sqlx::query(
        r#"
        INSERT INTO payments (member_id, amount, payment_date, payment_method, description, receipt_number, created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(new.member_id)
    .bind(amount.to_string())
    .bind(new.payment_date)
    .bind(new.payment_method)
    .bind(&new.description)
    .bind(new.receipt_number.as_str())
    .bind(new.created_by)
    .bind(new.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| GymError::conflict_on_unique(e, "Receipt number already issued"))?;

    Ok(Payment {
        id: result.last_insert_rowid(),
        member_id: new.member_id,
        amount,
        payment_date: new.payment_date,
        payment_method: new.payment_method,
        description: new.description,
        receipt_number: new.receipt_number,
        created_by: Some(new.created_by),
        created_at: new.created_at,
    })
}

/// Whether a receipt number is already in the ledger
pub async fn receipt_number_taken(conn: &mut SqliteConnection, receipt: &ReceiptNumber) -> GymResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE receipt_number = ?1")
        .bind(receipt.as_str())
        .fetch_one(&mut *conn)
        .await?;

    Ok(count > 0)
}

/// Read side of the payment ledger
#[derive(Clone)]
pub struct PaymentLedger {
    db: SqlitePool,
}

impl PaymentLedger {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get payment by id
    pub async fn get_payment(&self, id: i64) -> GymResult<Payment> {
        let row = sqlx::query(&format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| GymError::NotFound(format!("Payment {} not found", id)))?;

        Payment::from_row(&row)
    }

    /// All payments for a member, newest first
    pub async fn list_for_member(&self, member_id: i64) -> GymResult<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM payments WHERE member_id = ?1 ORDER BY payment_date DESC, id DESC",
            PAYMENT_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(Payment::from_row).collect()
    }

    /// Latest payments across all members
    pub async fn recent(&self, limit: i64) -> GymResult<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM payments ORDER BY created_at DESC, id DESC LIMIT ?1",
            PAYMENT_COLUMNS
        ))
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(Payment::from_row).collect()
    }

    /// Sum of payments dated within `[from, until)`
    pub async fn revenue_between(&self, from: NaiveDate, until: NaiveDate) -> GymResult<Decimal> {
        let amounts: Vec<String> = sqlx::query_scalar(
            "SELECT amount FROM payments WHERE payment_date >= ?1 AND payment_date < ?2",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        amounts
            .iter()
            .try_fold(Decimal::ZERO, |total, raw| -> GymResult<Decimal> {
                Ok(total + parse_amount(raw)?)
            })
    }

    /// Payment joined with member, plan and issuing admin
    ///
    /// The plan is resolved through the history entry the payment funded.
    pub async fn receipt_view(&self, payment_id: i64) -> GymResult<ReceiptView> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.receipt_number, p.payment_date, p.amount, p.payment_method, p.description,
                   m.member_code, m.first_name, m.last_name, m.email, m.phone,
                   mp.name AS plan_name, mp.duration_days AS plan_duration_days,
                   a.full_name AS issued_by
            FROM payments p
            JOIN members m ON m.id = p.member_id
            LEFT JOIN membership_history h ON h.payment_id = p.id
            LEFT JOIN membership_plans mp ON mp.id = h.membership_plan_id
            LEFT JOIN admins a ON a.id = p.created_by
            WHERE p.id = ?1
            LIMIT 1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| GymError::NotFound(format!("Payment {} not found", payment_id)))?;

        let first_name: String = row.try_get("first_name")?;
        let last_name: String = row.try_get("last_name")?;

        Ok(ReceiptView {
            payment_id: row.try_get("id")?,
            receipt_number: row.try_get("receipt_number")?,
            payment_date: row.try_get("payment_date")?,
            amount: parse_amount(&row.try_get::<String, _>("amount")?)?,
            payment_method: row.try_get("payment_method")?,
            description: row.try_get("description")?,
            member_code: row.try_get("member_code")?,
            member_name: format!("{} {}", first_name, last_name),
            member_email: row.try_get("email")?,
            member_phone: row.try_get("phone")?,
            plan_name: row.try_get("plan_name")?,
            plan_duration_days: row.try_get("plan_duration_days")?,
            issued_by: row.try_get("issued_by")?,
        })
    }
}
