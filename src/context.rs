/// Application context and dependency injection
use crate::{
    account::AccountManager,
    activity::ActivityLog,
    config::GymConfig,
    dashboard::Dashboard,
    db,
    error::GymResult,
    mailer::Mailer,
    members::MemberManager,
    payments::{MonotonicReceiptNumbers, PaymentLedger},
    plans::PlanCatalog,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<GymConfig>,
    pub db: SqlitePool,
    pub accounts: Arc<AccountManager>,
    pub members: Arc<MemberManager>,
    pub plans: Arc<PlanCatalog>,
    pub payments: Arc<PaymentLedger>,
    pub activity: Arc<ActivityLog>,
    pub dashboard: Arc<Dashboard>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: GymConfig) -> GymResult<Self> {
        config.validate()?;

        let options = db::DatabaseOptions {
            max_connections: config.storage.max_connections,
            ..Default::default()
        };
        let pool = db::create_pool(&config.storage.database_path, options).await?;

        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        Self::with_pool(config, pool).await
    }

    /// Build the services on an existing, migrated pool
    pub async fn with_pool(config: GymConfig, db: SqlitePool) -> GymResult<Self> {
        let config = Arc::new(config);

        let accounts = Arc::new(AccountManager::new(db.clone(), config.clone()));
        accounts.ensure_bootstrap_admin().await?;

        let members = Arc::new(MemberManager::new(
            db.clone(),
            Arc::new(MonotonicReceiptNumbers::new()),
        ));
        let plans = Arc::new(PlanCatalog::new(db.clone()));
        let payments = Arc::new(PaymentLedger::new(db.clone()));
        let activity = Arc::new(ActivityLog::new(db.clone()));
        let dashboard = Arc::new(Dashboard::new(db.clone(), config.dashboard.expiring_soon_days));
        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        Ok(Self {
            config,
            db,
            accounts,
            members,
            plans,
            payments,
            activity,
            dashboard,
            mailer,
        })
    }

    /// Public base URL used in emailed links
    pub fn base_url(&self) -> String {
        self.config.base_url()
    }
}

/// Who is acting and when, passed explicitly into every write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub admin_id: i64,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(admin_id: i64, now: DateTime<Utc>) -> Self {
        Self { admin_id, now }
    }

    /// Context for an admin acting right now
    pub fn for_admin(admin_id: i64) -> Self {
        Self::new(admin_id, Utc::now())
    }

    /// Calendar date of `now`, in UTC
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}
