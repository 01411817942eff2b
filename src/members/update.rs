/// Membership update transaction
///
/// Validation runs before the transaction opens. Everything from the email
/// uniqueness check to the activity entries commits or rolls back together,
/// so a failed payment insert never leaves a plan assignment behind.
use super::{
    history::{self, HistoryStatus, NewHistoryEntry},
    MemberManager, MemberProfile, MemberUpdate, MemberUpdateOutcome, PaymentIntent,
};
use crate::{
    activity,
    context::RequestContext,
    db,
    error::{GymError, GymResult},
    metrics,
    payments::{self, NewPayment, Payment, ReceiptNumber},
    plans::{self, MembershipPlan},
};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use validator::ValidateEmail;

const MAX_RECEIPT_ATTEMPTS: usize = 120;

/// End of a membership period: `start + duration_days` calendar days
pub fn membership_end_date(start: NaiveDate, duration_days: i64) -> GymResult<NaiveDate> {
    let days = u64::try_from(duration_days)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| GymError::Validation("Plan duration must be positive".to_string()))?;

    start
        .checked_add_days(Days::new(days))
        .ok_or_else(|| GymError::Validation("Membership end date is out of range".to_string()))
}

/// Trim and check the profile fields every member must have
pub fn validate_profile(profile: MemberProfile) -> GymResult<MemberProfile> {
    let profile = MemberProfile {
        first_name: profile.first_name.trim().to_string(),
        last_name: profile.last_name.trim().to_string(),
        email: profile.email.trim().to_lowercase(),
        phone: profile.phone.trim().to_string(),
        gender: profile.gender,
        date_of_birth: profile.date_of_birth,
        address: non_blank(profile.address),
        emergency_contact_name: non_blank(profile.emergency_contact_name),
        emergency_contact_phone: non_blank(profile.emergency_contact_phone),
    };

    let missing: Vec<&str> = [
        ("first name", &profile.first_name),
        ("last name", &profile.last_name),
        ("email", &profile.email),
        ("phone", &profile.phone),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(GymError::Validation(format!(
            "Required fields are missing: {}",
            missing.join(", ")
        )));
    }

    if !profile.email.validate_email() {
        return Err(GymError::Validation("Invalid email format".to_string()));
    }

    Ok(profile)
}

pub(super) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_payment(intent: &PaymentIntent, update: &MemberUpdate) -> GymResult<()> {
    if intent.amount <= Decimal::ZERO {
        return Err(GymError::Validation(
            "Payment amount must be greater than zero".to_string(),
        ));
    }

    if update.membership_plan_id.is_some() && update.membership_start_date.is_none() {
        return Err(GymError::Validation(
            "A membership start date is required to record a payment".to_string(),
        ));
    }

    Ok(())
}

/// Whether another member already uses this email
pub(super) async fn email_taken(
    conn: &mut SqliteConnection,
    email: &str,
    except_member: Option<i64>,
) -> GymResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM members WHERE email = ?1 COLLATE NOCASE AND id != ?2",
    )
    .bind(email)
    .bind(except_member.unwrap_or(-1))
    .fetch_one(&mut *conn)
    .await?;

    Ok(count > 0)
}

/// Look up the selected plan; an unknown id is a user error
pub(super) async fn resolve_plan(
    conn: &mut SqliteConnection,
    plan_id: Option<i64>,
) -> GymResult<Option<MembershipPlan>> {
    let Some(id) = plan_id else {
        return Ok(None);
    };

    plans::fetch_plan(&mut *conn, id)
        .await?
        .map(Some)
        .ok_or_else(|| GymError::Validation(format!("Membership plan {} does not exist", id)))
}

impl MemberManager {
    /// Apply an admin's edit to a member, optionally recording a payment
    pub async fn update_member(
        &self,
        member_id: i64,
        update: MemberUpdate,
        ctx: &RequestContext,
    ) -> GymResult<MemberUpdateOutcome> {
        let result = self.apply_update(member_id, update, ctx).await;

        match &result {
            Ok(outcome) => {
                metrics::record_member_update("success");
                tracing::info!(
                    member_id,
                    admin_id = ctx.admin_id,
                    payment_id = ?outcome.payment_id,
                    "Member updated"
                );
            }
            Err(e) => {
                metrics::record_member_update(metrics::error_label(e));
                tracing::warn!(member_id, admin_id = ctx.admin_id, error = %e, "Member update rejected");
            }
        }

        result
    }

    async fn apply_update(
        &self,
        member_id: i64,
        update: MemberUpdate,
        ctx: &RequestContext,
    ) -> GymResult<MemberUpdateOutcome> {
        let profile = validate_profile(update.profile.clone())?;
        if let Some(intent) = &update.payment {
            validate_payment(intent, &update)?;
        }

        let mut tx = db::begin_write(&self.db).await?;

        let member_code: String = sqlx::query_scalar("SELECT member_code FROM members WHERE id = ?1")
            .bind(member_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| GymError::NotFound(format!("Member {} not found", member_id)))?;

        if email_taken(&mut tx, &profile.email, Some(member_id)).await? {
            return Err(GymError::Conflict(
                "Email is already registered to another member".to_string(),
            ));
        }

        let plan = resolve_plan(&mut tx, update.membership_plan_id).await?;
        let period = match (&plan, update.membership_start_date) {
            (Some(plan), Some(start)) => Some((start, membership_end_date(start, plan.duration_days)?)),
            _ => None,
        };

        sqlx::query(
            r#"
            UPDATE members
            SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, gender = ?5,
                date_of_birth = ?6, address = ?7, emergency_contact_name = ?8,
                emergency_contact_phone = ?9, membership_plan_id = ?10,
                membership_start_date = ?11, membership_end_date = ?12, status = COALESCE(?13, status),
                notes = ?14, updated_at = ?15
            WHERE id = ?16
            "#,
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(profile.gender)
        .bind(profile.date_of_birth)
        .bind(&profile.address)
        .bind(&profile.emergency_contact_name)
        .bind(&profile.emergency_contact_phone)
        .bind(update.membership_plan_id)
        .bind(update.membership_start_date)
        .bind(period.map(|(_, end)| end))
        .bind(update.status)
        .bind(non_blank(update.notes.clone()))
        .bind(ctx.now)
        .bind(member_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| GymError::conflict_on_unique(e, "Email is already registered to another member"))?;

        let full_name = format!("{} {}", profile.first_name, profile.last_name);

        let payment = match (&update.payment, &plan, period) {
            (Some(intent), Some(plan), Some((start, end))) => {
                let payment = self
                    .record_payment(&mut tx, member_id, intent, plan, start, end, ctx)
                    .await?;
                Some(payment)
            }
            (Some(_), None, _) => {
                tracing::warn!(member_id, "Payment requested without a membership plan; not recorded");
                None
            }
            _ => None,
        };

        activity::record(
            &mut *tx,
            ctx.admin_id,
            "member.update",
            &format!("Updated member {} ({})", full_name, member_code),
            ctx.now,
        )
        .await?;

        if let Some(payment) = &payment {
            activity::record(
                &mut *tx,
                ctx.admin_id,
                "payment.record",
                &format!(
                    "Recorded {} payment of {} for {} (receipt {})",
                    payment.payment_method.as_str(),
                    payment.amount,
                    full_name,
                    payment.receipt_number
                ),
                ctx.now,
            )
            .await?;
        }

        tx.commit().await?;

        if let Some(payment) = &payment {
            metrics::record_payment(payment.payment_method.as_str());
        }

        let member = self.get_member(member_id).await?;

        Ok(MemberUpdateOutcome {
            member,
            payment_id: payment.as_ref().map(|p| p.id),
            receipt_number: payment.map(|p| p.receipt_number),
        })
    }

    /// Write the payment and the history entry it funds
    #[allow(clippy::too_many_arguments)]
    async fn record_payment(
        &self,
        conn: &mut SqliteConnection,
        member_id: i64,
        intent: &PaymentIntent,
        plan: &MembershipPlan,
        start: NaiveDate,
        end: NaiveDate,
        ctx: &RequestContext,
    ) -> GymResult<Payment> {
        let receipt_number = self.next_receipt_number(conn, ctx).await?;

        let label = intent
            .membership_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&plan.name);

        let payment = payments::insert_payment(
            conn,
            NewPayment {
                member_id,
                amount: intent.amount,
                payment_date: ctx.today(),
                payment_method: intent.method,
                description: format!("Membership fee - {}", label),
                receipt_number,
                created_by: ctx.admin_id,
                created_at: ctx.now,
            },
        )
        .await?;

        history::insert_entry(
            conn,
            NewHistoryEntry {
                member_id,
                membership_plan_id: plan.id,
                start_date: start,
                end_date: end,
                payment_id: Some(payment.id),
                status: HistoryStatus::Active,
                created_at: ctx.now,
            },
        )
        .await?;

        Ok(payment)
    }

    /// Next receipt number not yet present in the ledger
    async fn next_receipt_number(
        &self,
        conn: &mut SqliteConnection,
        ctx: &RequestContext,
    ) -> GymResult<ReceiptNumber> {
        for _ in 0..MAX_RECEIPT_ATTEMPTS {
            let candidate = self.receipts.next(ctx.now);
            if !payments::receipt_number_taken(conn, &candidate).await? {
                return Ok(candidate);
            }
        }

        Err(GymError::Internal(
            "Could not allocate a unique receipt number".to_string(),
        ))
    }
}
