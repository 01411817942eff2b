/// Admin account manager
use super::{
    password::{
        generate_token, hash_password, validate_new_password, verify_decoy, verify_password,
    },
    Admin, AdminSession, IssuedResetToken, LoginResponse, NewAdmin,
};
use crate::{
    activity,
    config::GymConfig,
    db,
    error::{GymError, GymResult},
    metrics,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use validator::Validate;

const ADMIN_COLUMNS: &str =
    "id, username, password_hash, email, full_name, created_at, last_login_at";

/// Admin account service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<GymConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<GymConfig>) -> Self {
        Self { db, config }
    }

    /// Create an admin account
    pub async fn create_admin(&self, new: NewAdmin) -> GymResult<Admin> {
        new.validate()?;

        let password_hash = hash_password(&new.password)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO admins (username, password_hash, email, full_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(new.username.trim())
        .bind(&password_hash)
        .bind(new.email.trim().to_lowercase())
        .bind(new.full_name.trim())
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| GymError::conflict_on_unique(e, "Username or email already in use"))?;

        tracing::info!(username = %new.username, "Admin account created");

        self.get_admin(result.last_insert_rowid()).await
    }

    /// Get an admin by id
    pub async fn get_admin(&self, id: i64) -> GymResult<Admin> {
        sqlx::query_as::<_, Admin>(&format!("SELECT {} FROM admins WHERE id = ?1", ADMIN_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| GymError::NotFound(format!("Admin {} not found", id)))
    }

    /// Authenticate an admin and open a session
    pub async fn login(&self, username: &str, password: &str) -> GymResult<LoginResponse> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {} FROM admins WHERE username = ?1",
            ADMIN_COLUMNS
        ))
        .bind(username.trim())
        .fetch_optional(&self.db)
        .await?;

        let verified = match admin {
            Some(admin) => verify_password(password, &admin.password_hash).then_some(admin),
            None => {
                verify_decoy(password);
                None
            }
        };

        let admin = match verified {
            Some(admin) => admin,
            None => {
                metrics::record_login("failure");
                tracing::warn!(username, "Failed login attempt");
                return Err(GymError::Authentication(
                    "Invalid username or password".to_string(),
                ));
            }
        };

        let now = Utc::now();
        let session = self.create_session(admin.id, now).await?;

        sqlx::query("UPDATE admins SET last_login_at = ?1 WHERE id = ?2")
            .bind(now)
            .bind(admin.id)
            .execute(&self.db)
            .await?;

        activity::record(&self.db, admin.id, "auth.login", "Logged in", now).await?;
        metrics::record_login("success");
        tracing::info!(admin_id = admin.id, "Admin logged in");

        Ok(LoginResponse {
            token: session.token,
            expires_at: session.expires_at,
            admin: Admin {
                last_login_at: Some(now),
                ..admin
            },
        })
    }

    async fn create_session(&self, admin_id: i64, now: DateTime<Utc>) -> GymResult<AdminSession> {
        let session = AdminSession {
            token: generate_token(),
            admin_id,
            created_at: now,
            expires_at: now + Duration::hours(self.config.authentication.session_ttl_hours),
        };

        sqlx::query(
            "INSERT INTO admin_sessions (token, admin_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&session.token)
        .bind(session.admin_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.db)
        .await?;

        Ok(session)
    }

    /// Resolve a bearer token to its admin
    pub async fn validate_session(&self, token: &str) -> GymResult<Admin> {
        let invalid = || GymError::Authentication("Invalid or expired session".to_string());

        let session = sqlx::query_as::<_, AdminSession>(
            "SELECT token, admin_id, created_at, expires_at FROM admin_sessions WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(invalid)?;

        if session.expires_at <= Utc::now() {
            return Err(invalid());
        }

        self.get_admin(session.admin_id).await.map_err(|e| match e {
            GymError::NotFound(_) => invalid(),
            other => other,
        })
    }

    /// End a session
    pub async fn logout(&self, token: &str) -> GymResult<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE token = ?1")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Start a password reset
    ///
    /// Returns `None` when no admin has this email; callers must answer the
    /// same way in both cases.
    pub async fn request_reset(&self, email: &str) -> GymResult<Option<IssuedResetToken>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {} FROM admins WHERE email = ?1 COLLATE NOCASE",
            ADMIN_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.db)
        .await?;

        let Some(admin) = admin else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let now = Utc::now();
        let issued = IssuedResetToken {
            token: generate_token(),
            email: admin.email,
            full_name: admin.full_name,
            expires_at: now + Duration::minutes(self.config.authentication.reset_token_ttl_minutes),
        };

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (admin_id, token, expiry, used, created_at)
            VALUES (?1, ?2, ?3, 0, ?4)
            "#,
        )
        .bind(admin.id)
        .bind(&issued.token)
        .bind(issued.expires_at)
        .bind(now)
        .execute(&self.db)
        .await?;

        tracing::info!(admin_id = admin.id, "Password reset token issued");

        Ok(Some(issued))
    }

    /// Check a reset token without consuming it; returns the admin id
    pub async fn validate_reset_token(&self, token: &str) -> GymResult<i64> {
        let row = sqlx::query("SELECT admin_id, expiry, used FROM password_reset_tokens WHERE token = ?1")
            .bind(token)
            .fetch_optional(&self.db)
            .await?;

        usable_token(row, Utc::now())
    }

    /// Set a new password with a reset token
    ///
    /// Marks the token used and ends every session of the admin.
    pub async fn consume_reset(
        &self,
        token: &str,
        new_password: &str,
        confirmation: &str,
    ) -> GymResult<()> {
        let now = Utc::now();
        let mut tx = db::begin_write(&self.db).await?;

        let row = sqlx::query("SELECT admin_id, expiry, used FROM password_reset_tokens WHERE token = ?1")
            .bind(token)
            .fetch_optional(&mut *tx)
            .await?;
        let admin_id = usable_token(row, now)?;

        validate_new_password(new_password, confirmation)?;
        let password_hash = hash_password(new_password)?;

        sqlx::query("UPDATE admins SET password_hash = ?1 WHERE id = ?2")
            .bind(&password_hash)
            .bind(admin_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE token = ?1")
            .bind(token)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM admin_sessions WHERE admin_id = ?1")
            .bind(admin_id)
            .execute(&mut *tx)
            .await?;

        activity::record(&mut *tx, admin_id, "auth.password_reset", "Password reset", now).await?;

        tx.commit().await?;

        tracing::info!(admin_id, "Password reset completed");
        Ok(())
    }

    /// Create the configured first admin when no admin exists yet
    pub async fn ensure_bootstrap_admin(&self) -> GymResult<Option<Admin>> {
        let Some(bootstrap) = self.config.authentication.bootstrap_admin.clone() else {
            return Ok(None);
        };

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.db)
            .await?;
        if count > 0 {
            return Ok(None);
        }

        let admin = self
            .create_admin(NewAdmin {
                username: bootstrap.username,
                password: bootstrap.password,
                email: bootstrap.email,
                full_name: bootstrap.full_name,
            })
            .await?;

        tracing::info!(username = %admin.username, "Bootstrap admin created");
        Ok(Some(admin))
    }

    /// Delete expired sessions and spent reset tokens
    ///
    /// Returns (sessions_deleted, reset_tokens_deleted)
    pub async fn cleanup_expired(&self) -> GymResult<(u64, u64)> {
        let now = Utc::now();

        let sessions_deleted = sqlx::query("DELETE FROM admin_sessions WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.db)
            .await?
            .rows_affected();

        let reset_tokens_deleted =
            sqlx::query("DELETE FROM password_reset_tokens WHERE used = 1 OR expiry < ?1")
                .bind(now)
                .execute(&self.db)
                .await?
                .rows_affected();

        if sessions_deleted > 0 || reset_tokens_deleted > 0 {
            tracing::info!(sessions_deleted, reset_tokens_deleted, "Cleaned up expired tokens");
        } else {
            tracing::debug!("Session cleanup: nothing expired");
        }

        Ok((sessions_deleted, reset_tokens_deleted))
    }
}

/// Admin id of an unused, unexpired reset token row
fn usable_token(row: Option<sqlx::sqlite::SqliteRow>, now: DateTime<Utc>) -> GymResult<i64> {
    let invalid = || GymError::NotFound("Invalid or expired reset token".to_string());

    let row = row.ok_or_else(invalid)?;
    let expiry: DateTime<Utc> = row.try_get("expiry")?;
    let used: bool = row.try_get("used")?;

    if used || expiry <= now {
        return Err(invalid());
    }

    Ok(row.try_get("admin_id")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BootstrapAdmin, db::create_memory_pool};

    async fn setup() -> (SqlitePool, AccountManager) {
        let db = create_memory_pool().await.unwrap();
        let manager = AccountManager::new(db.clone(), Arc::new(GymConfig::default()));
        (db, manager)
    }

    async fn create_desk(manager: &AccountManager) -> Admin {
        manager
            .create_admin(NewAdmin {
                username: "desk".to_string(),
                password: "initial-pass".to_string(),
                email: "desk@example.com".to_string(),
                full_name: "Front Desk".to_string(),
            })
            .await
            .unwrap()
    }

    async fn password_hash(db: &SqlitePool, id: i64) -> String {
        sqlx::query_scalar("SELECT password_hash FROM admins WHERE id = ?1")
            .bind(id)
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_and_session() {
        let (_db, manager) = setup().await;
        let admin = create_desk(&manager).await;

        let login = manager.login("desk", "initial-pass").await.unwrap();
        assert_eq!(login.admin.id, admin.id);
        assert!(login.admin.last_login_at.is_some());
        assert_eq!(login.token.len(), 64);

        let resolved = manager.validate_session(&login.token).await.unwrap();
        assert_eq!(resolved.username, "desk");

        manager.logout(&login.token).await.unwrap();
        assert!(matches!(
            manager.validate_session(&login.token).await,
            Err(GymError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_credentials_look_the_same() {
        let (_db, manager) = setup().await;
        create_desk(&manager).await;

        let wrong_password = manager.login("desk", "nope-nope").await.unwrap_err();
        let unknown_user = manager.login("ghost", "initial-pass").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let (db, manager) = setup().await;
        let admin = create_desk(&manager).await;

        sqlx::query(
            "INSERT INTO admin_sessions (token, admin_id, created_at, expires_at) VALUES ('stale', ?1, ?2, ?3)",
        )
        .bind(admin.id)
        .bind(Utc::now() - Duration::hours(13))
        .bind(Utc::now() - Duration::hours(1))
        .execute(&db)
        .await
        .unwrap();

        assert!(manager.validate_session("stale").await.is_err());
        let (sessions, _) = manager.cleanup_expired().await.unwrap();
        assert_eq!(sessions, 1);
    }

    #[tokio::test]
    async fn test_duplicate_admin_is_conflict() {
        let (_db, manager) = setup().await;
        create_desk(&manager).await;

        let result = manager
            .create_admin(NewAdmin {
                username: "desk".to_string(),
                password: "another-pass".to_string(),
                email: "other@example.com".to_string(),
                full_name: "Other".to_string(),
            })
            .await;
        assert!(matches!(result, Err(GymError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_reset_flow_changes_password_and_drops_sessions() {
        let (db, manager) = setup().await;
        let admin = create_desk(&manager).await;
        let login = manager.login("desk", "initial-pass").await.unwrap();

        assert!(manager.request_reset("nobody@example.com").await.unwrap().is_none());

        let issued = manager.request_reset("DESK@example.com").await.unwrap().unwrap();
        assert_eq!(issued.email, "desk@example.com");
        assert_eq!(manager.validate_reset_token(&issued.token).await.unwrap(), admin.id);

        assert!(matches!(
            manager.consume_reset(&issued.token, "brand-new-pass", "mismatch-pass").await,
            Err(GymError::Validation(_))
        ));

        manager
            .consume_reset(&issued.token, "brand-new-pass", "brand-new-pass")
            .await
            .unwrap();

        assert!(manager.login("desk", "initial-pass").await.is_err());
        assert!(manager.login("desk", "brand-new-pass").await.is_ok());
        assert!(manager.validate_session(&login.token).await.is_err());

        let hash = password_hash(&db, admin.id).await;
        assert!(matches!(
            manager.consume_reset(&issued.token, "third-pass-1", "third-pass-1").await,
            Err(GymError::NotFound(_))
        ));
        assert_eq!(password_hash(&db, admin.id).await, hash);
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_not_found() {
        let (db, manager) = setup().await;
        let admin = create_desk(&manager).await;
        let before = password_hash(&db, admin.id).await;

        sqlx::query(
            "INSERT INTO password_reset_tokens (admin_id, token, expiry, used, created_at) VALUES (?1, 'old', ?2, 0, ?3)",
        )
        .bind(admin.id)
        .bind(Utc::now() - Duration::minutes(1))
        .bind(Utc::now() - Duration::minutes(61))
        .execute(&db)
        .await
        .unwrap();

        assert!(matches!(
            manager.validate_reset_token("old").await,
            Err(GymError::NotFound(_))
        ));
        assert!(matches!(
            manager.consume_reset("old", "brand-new-pass", "brand-new-pass").await,
            Err(GymError::NotFound(_))
        ));
        assert!(matches!(
            manager.consume_reset("never-issued", "brand-new-pass", "brand-new-pass").await,
            Err(GymError::NotFound(_))
        ));
        assert_eq!(password_hash(&db, admin.id).await, before);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_when_empty() {
        let db = create_memory_pool().await.unwrap();
        let mut config = GymConfig::default();
        config.authentication.bootstrap_admin = Some(BootstrapAdmin {
            username: "owner".to_string(),
            password: "owner-pass-1".to_string(),
            email: "owner@example.com".to_string(),
            full_name: "Gym Owner".to_string(),
        });
        let manager = AccountManager::new(db, Arc::new(config));

        let created = manager.ensure_bootstrap_admin().await.unwrap();
        assert_eq!(created.map(|a| a.username), Some("owner".to_string()));
        assert!(manager.ensure_bootstrap_admin().await.unwrap().is_none());
        assert!(manager.login("owner", "owner-pass-1").await.is_ok());
    }
}
