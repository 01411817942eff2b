/// Membership plan catalog
use crate::error::{GymError, GymResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteExecutor, SqlitePool};
use std::str::FromStr;
use validator::Validate;

/// A purchasable membership plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipPlan {
    pub id: i64,
    pub name: String,
    pub duration_days: i64,
    pub price: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
}

impl MembershipPlan {
    fn from_row(row: &SqliteRow) -> GymResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            duration_days: row.try_get("duration_days")?,
            price: parse_amount(&row.try_get::<String, _>("price")?)?,
            description: row.try_get("description")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

/// Parse a stored decimal amount
pub(crate) fn parse_amount(raw: &str) -> GymResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| GymError::Internal(format!("Invalid stored amount '{}': {}", raw, e)))
}

/// New plan request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 100, message = "Plan name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 1, max = 3650, message = "Duration must be between 1 and 3650 days"))]
    pub duration_days: i64,
    pub price: Decimal,
    pub description: Option<String>,
}

/// Look up a plan using any executor
pub async fn fetch_plan<'e, E>(executor: E, id: i64) -> GymResult<Option<MembershipPlan>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, name, duration_days, price, description, is_active FROM membership_plans WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(MembershipPlan::from_row).transpose()
}

/// Plan catalog service
#[derive(Clone)]
pub struct PlanCatalog {
    db: SqlitePool,
}

impl PlanCatalog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List plans ordered by duration
    pub async fn list_plans(&self, include_inactive: bool) -> GymResult<Vec<MembershipPlan>> {
        let query = if include_inactive {
            "SELECT id, name, duration_days, price, description, is_active FROM membership_plans ORDER BY duration_days, name"
        } else {
            "SELECT id, name, duration_days, price, description, is_active FROM membership_plans WHERE is_active = 1 ORDER BY duration_days, name"
        };

        let rows = sqlx::query(query).fetch_all(&self.db).await?;
        rows.iter().map(MembershipPlan::from_row).collect()
    }

    /// Get a plan by id
    pub async fn get_plan(&self, id: i64) -> GymResult<MembershipPlan> {
        fetch_plan(&self.db, id)
            .await?
            .ok_or_else(|| GymError::NotFound(format!("Membership plan {} not found", id)))
    }

    /// Create a plan
    pub async fn create_plan(&self, req: CreatePlanRequest) -> GymResult<MembershipPlan> {
        req.validate()?;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(GymError::Validation("Plan name cannot be empty".to_string()));
        }
        if req.price < Decimal::ZERO {
            return Err(GymError::Validation("Plan price cannot be negative".to_string()));
        }
        let price = req.price.round_dp(2);

        let result = sqlx::query(
            r#"
            INSERT INTO membership_plans (name, duration_days, price, description, is_active)
            VALUES (?1, ?2, ?3, ?4, 1)
            "#,
        )
        .bind(&name)
        .bind(req.duration_days)
        .bind(price.to_string())
        .bind(&req.description)
        .execute(&self.db)
        .await
        .map_err(|e| GymError::conflict_on_unique(e, "A plan with this name already exists"))?;

        Ok(MembershipPlan {
            id: result.last_insert_rowid(),
            name,
            duration_days: req.duration_days,
            price,
            description: req.description,
            is_active: true,
        })
    }

    /// Enable or retire a plan
    pub async fn set_plan_active(&self, id: i64, active: bool) -> GymResult<MembershipPlan> {
        let result = sqlx::query("UPDATE membership_plans SET is_active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GymError::NotFound(format!("Membership plan {} not found", id)));
        }

        self.get_plan(id).await
    }
}
