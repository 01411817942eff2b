/// Member registry operations
use super::{
    history::{self, HistoryEntry},
    update::{email_taken, membership_end_date, non_blank, resolve_plan, validate_profile},
    Member, MemberQuery, MemberStatus, NewMember,
};
use crate::{
    activity,
    context::RequestContext,
    db,
    error::{GymError, GymResult},
    payments::ReceiptNumberGenerator,
};
use chrono::{Datelike, DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;

const MEMBER_COLUMNS: &str = r#"
    id, member_code, first_name, last_name, email, phone, gender, date_of_birth, address,
    emergency_contact_name, emergency_contact_phone, membership_plan_id,
    membership_start_date, membership_end_date, status, notes, created_at, updated_at
"#;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

/// Member manager
pub struct MemberManager {
    pub(super) db: SqlitePool,
    pub(super) receipts: Arc<dyn ReceiptNumberGenerator>,
}

impl MemberManager {
    pub fn new(db: SqlitePool, receipts: Arc<dyn ReceiptNumberGenerator>) -> Self {
        Self { db, receipts }
    }

    /// Get a member by id
    pub async fn get_member(&self, id: i64) -> GymResult<Member> {
        sqlx::query_as::<_, Member>(&format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| GymError::NotFound(format!("Member {} not found", id)))
    }

    /// List members, newest first
    ///
    /// `search` matches name, email, phone and member code without regard to case.
    pub async fn list_members(&self, query: MemberQuery) -> GymResult<Vec<Member>> {
        let pattern = non_blank(query.search).map(|s| format!("%{}%", s));
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0).max(0);

        let sql = format!(
            r#"
            SELECT {}
            FROM members
            WHERE (?1 IS NULL
                   OR first_name LIKE ?1 OR last_name LIKE ?1
                   OR (first_name || ' ' || last_name) LIKE ?1
                   OR email LIKE ?1 OR phone LIKE ?1 OR member_code LIKE ?1)
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
            MEMBER_COLUMNS
        );

        let members = sqlx::query_as::<_, Member>(&sql)
            .bind(pattern)
            .bind(query.status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        Ok(members)
    }

    /// Register a new member
    pub async fn create_member(&self, new: NewMember, ctx: &RequestContext) -> GymResult<Member> {
        let profile = validate_profile(new.profile)?;

        let mut tx = db::begin_write(&self.db).await?;

        if email_taken(&mut tx, &profile.email, None).await? {
            return Err(GymError::Conflict(
                "Email is already registered to another member".to_string(),
            ));
        }

        let plan = resolve_plan(&mut tx, new.membership_plan_id).await?;
        let end_date = match (&plan, new.membership_start_date) {
            (Some(plan), Some(start)) => Some(membership_end_date(start, plan.duration_days)?),
            _ => None,
        };
        let status = new.status.unwrap_or(if plan.is_some() {
            MemberStatus::Active
        } else {
            MemberStatus::Pending
        });

        let member_code = next_member_code(&mut tx, ctx.now).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO members (
                member_code, first_name, last_name, email, phone, gender, date_of_birth,
                address, emergency_contact_name, emergency_contact_phone, membership_plan_id,
                membership_start_date, membership_end_date, status, notes, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)
            "#,
        )
        .bind(&member_code)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(profile.gender)
        .bind(profile.date_of_birth)
        .bind(&profile.address)
        .bind(&profile.emergency_contact_name)
        .bind(&profile.emergency_contact_phone)
        .bind(new.membership_plan_id)
        .bind(new.membership_start_date)
        .bind(end_date)
        .bind(status)
        .bind(non_blank(new.notes))
        .bind(ctx.now)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_conflict(e, &member_code))?;

        activity::record(
            &mut *tx,
            ctx.admin_id,
            "member.create",
            &format!(
                "Added member {} {} ({})",
                profile.first_name, profile.last_name, member_code
            ),
            ctx.now,
        )
        .await?;

        tx.commit().await?;

        let id = result.last_insert_rowid();
        tracing::info!(member_id = id, member_code = %member_code, "Member created");

        self.get_member(id).await
    }

    /// Delete a member together with their payments and history
    pub async fn delete_member(&self, id: i64, ctx: &RequestContext) -> GymResult<()> {
        let mut tx = db::begin_write(&self.db).await?;

        let member = sqlx::query_as::<_, Member>(&format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| GymError::NotFound(format!("Member {} not found", id)))?;

        sqlx::query("DELETE FROM members WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut *tx,
            ctx.admin_id,
            "member.delete",
            &format!("Deleted member {} ({})", member.full_name(), member.member_code),
            ctx.now,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(member_id = id, "Member deleted");
        Ok(())
    }

    /// Membership periods for a member, newest first
    pub async fn membership_history(&self, member_id: i64) -> GymResult<Vec<HistoryEntry>> {
        history::list_for_member(&self.db, member_id).await
    }

    /// Deactivate members whose membership ended before `today`
    ///
    /// Returns the number of members deactivated.
    pub async fn expire_memberships(&self, today: NaiveDate, now: DateTime<Utc>) -> GymResult<u64> {
        let mut tx = db::begin_write(&self.db).await?;

        let members = sqlx::query(
            r#"
            UPDATE members
            SET status = 'inactive', updated_at = ?2
            WHERE status = 'active'
              AND membership_end_date IS NOT NULL
              AND membership_end_date < ?1
            "#,
        )
        .bind(today)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let periods = history::expire_entries(&mut *tx, today).await?;

        tx.commit().await?;

        if members > 0 || periods > 0 {
            tracing::info!(members, periods, "Expired memberships");
        }

        Ok(members)
    }
}

/// Next `GYM<year><seq>` code for the year of `now`
async fn next_member_code(conn: &mut SqliteConnection, now: DateTime<Utc>) -> GymResult<String> {
    let prefix = format!("GYM{}", now.year());

    let last: Option<String> = sqlx::query_scalar(
        r#"
        SELECT member_code FROM members
        WHERE member_code LIKE ?1
        ORDER BY length(member_code) DESC, member_code DESC
        LIMIT 1
        "#,
    )
    .bind(format!("{}%", prefix))
    .fetch_optional(&mut *conn)
    .await?;

    let sequence = last
        .as_deref()
        .and_then(|code| code.strip_prefix(prefix.as_str()))
        .and_then(|digits| digits.parse::<u32>().ok())
        .unwrap_or(0)
        + 1;

    Ok(format!("{}{:04}", prefix, sequence))
}

/// Name the colliding column when a member insert hits a unique index
fn insert_conflict(err: sqlx::Error, member_code: &str) -> GymError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.message().contains("members.member_code") => {
            GymError::Conflict(format!("Member code {} is already in use", member_code))
        }
        _ => GymError::conflict_on_unique(err, "Email is already registered to another member"),
    }
}
