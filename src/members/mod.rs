/// Member management
///
/// Member profiles, plan assignment and the membership update transaction
/// that ties members to payments and history entries.

pub mod history;
mod manager;
mod update;

pub use history::{HistoryEntry, HistoryStatus};
pub use manager::MemberManager;
pub use update::{membership_end_date, validate_profile};

use crate::{
    error::{GymError, GymResult},
    payments::{PaymentMethod, ReceiptNumber},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Member account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
    #[default]
    Pending,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
            MemberStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Member record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub member_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub membership_plan_id: Option<i64>,
    pub membership_start_date: Option<NaiveDate>,
    pub membership_end_date: Option<NaiveDate>,
    pub status: MemberStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Editable profile fields
///
/// Missing text fields deserialize as empty so the required-field check
/// reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

/// Request to record a payment alongside a membership update
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Plan label shown on the receipt; defaults to the plan's name
    pub membership_name: Option<String>,
}

/// Input to the membership update transaction
#[derive(Debug, Clone, PartialEq)]
pub struct MemberUpdate {
    pub profile: MemberProfile,
    pub membership_plan_id: Option<i64>,
    pub membership_start_date: Option<NaiveDate>,
    /// `None` keeps the member's current status
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
    pub payment: Option<PaymentIntent>,
}

/// Result of the membership update transaction
#[derive(Debug, Clone, Serialize)]
pub struct MemberUpdateOutcome {
    pub member: Member,
    pub payment_id: Option<i64>,
    pub receipt_number: Option<ReceiptNumber>,
}

/// Input for registering a member
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub profile: MemberProfile,
    pub membership_plan_id: Option<i64>,
    pub membership_start_date: Option<NaiveDate>,
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
}

/// Member listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberQuery {
    pub search: Option<String>,
    pub status: Option<MemberStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Wire format of the member edit form
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(flatten)]
    pub profile: MemberProfile,
    pub membership_id: Option<i64>,
    pub membership_start_date: Option<NaiveDate>,
    /// Omitted on forms without a status picker; the stored status is kept
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
    #[serde(default)]
    pub record_payment: bool,
    pub payment_amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub membership_name: Option<String>,
}

impl UpdateMemberRequest {
    /// Resolve the form flags into a typed update
    pub fn into_update(self) -> GymResult<MemberUpdate> {
        let payment = if self.record_payment {
            let amount = self
                .payment_amount
                .ok_or_else(|| GymError::Validation("Payment amount is required".to_string()))?;
            let method = self
                .payment_method
                .ok_or_else(|| GymError::Validation("Payment method is required".to_string()))?;
            Some(PaymentIntent {
                amount,
                method,
                membership_name: self.membership_name,
            })
        } else {
            None
        };

        Ok(MemberUpdate {
            profile: self.profile,
            membership_plan_id: self.membership_id,
            membership_start_date: self.membership_start_date,
            status: self.status,
            notes: self.notes,
            payment,
        })
    }
}

/// Wire format of the add-member form
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMemberRequest {
    #[serde(flatten)]
    pub profile: MemberProfile,
    pub membership_id: Option<i64>,
    pub membership_start_date: Option<NaiveDate>,
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
}

impl From<CreateMemberRequest> for NewMember {
    fn from(req: CreateMemberRequest) -> Self {
        Self {
            profile: req.profile,
            membership_plan_id: req.membership_id,
            membership_start_date: req.membership_start_date,
            status: req.status,
            notes: req.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_with_payment() {
        let req: UpdateMemberRequest = serde_json::from_value(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "phone": "555-0100",
            "membership_id": 1,
            "membership_start_date": "2024-01-01",
            "status": "active",
            "record_payment": true,
            "payment_amount": "49.99",
            "payment_method": "cash"
        }))
        .unwrap();

        let update = req.into_update().unwrap();
        assert_eq!(update.status, Some(MemberStatus::Active));
        assert_eq!(update.membership_plan_id, Some(1));
        let payment = update.payment.unwrap();
        assert_eq!(payment.amount, Decimal::new(4999, 2));
        assert_eq!(payment.method, PaymentMethod::Cash);
    }

    #[test]
    fn test_update_request_without_payment_flag_ignores_amount() {
        let req: UpdateMemberRequest = serde_json::from_value(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "phone": "555-0100",
            "payment_amount": "49.99"
        }))
        .unwrap();

        let update = req.into_update().unwrap();
        assert!(update.payment.is_none());
        assert_eq!(update.status, None);
    }

    #[test]
    fn test_payment_flag_requires_amount_and_method() {
        let base = json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "phone": "555-0100",
            "record_payment": true
        });

        let req: UpdateMemberRequest = serde_json::from_value(base.clone()).unwrap();
        assert!(matches!(req.into_update(), Err(GymError::Validation(_))));

        let mut with_amount = base;
        with_amount["payment_amount"] = json!("10.00");
        let req: UpdateMemberRequest = serde_json::from_value(with_amount).unwrap();
        assert!(matches!(req.into_update(), Err(GymError::Validation(_))));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let parsed = serde_json::from_value::<UpdateMemberRequest>(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "phone": "555-0100",
            "status": "frozen"
        }));
        assert!(parsed.is_err());
    }
}
