/// Configuration management for Gym Desk
use crate::error::{GymError, GymResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub email: Option<EmailConfig>,
    pub branding: BrandingConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL used in password reset links
    pub public_url: Option<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub session_ttl_hours: i64,
    pub reset_token_ttl_minutes: i64,
    /// Admin created on first start when the admin table is empty
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Initial administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub email: String,
    pub full_name: String,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Gym details printed on receipts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    pub gym_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub currency_symbol: String,
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub expiring_soon_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for GymConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 8080,
                public_url: None,
            },
            storage: StorageConfig {
                database_path: PathBuf::from("./data/gym.sqlite"),
                max_connections: 10,
            },
            authentication: AuthConfig {
                session_ttl_hours: 12,
                reset_token_ttl_minutes: 60,
                bootstrap_admin: None,
            },
            email: None,
            branding: BrandingConfig {
                gym_name: "Gym Desk".to_string(),
                address: None,
                phone: None,
                currency_symbol: "$".to_string(),
            },
            dashboard: DashboardConfig {
                expiring_soon_days: 7,
            },
            logging: LoggingConfig {
                level: "gym_desk=debug,tower_http=debug".to_string(),
                json: false,
            },
        }
    }
}

impl GymConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> GymResult<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let hostname = env::var("GYM_HOSTNAME").unwrap_or(defaults.service.hostname);
        let port = env::var("GYM_PORT")
            .unwrap_or_else(|_| defaults.service.port.to_string())
            .parse()
            .map_err(|_| GymError::Validation("Invalid port number".to_string()))?;
        let public_url = env::var("GYM_PUBLIC_URL").ok();

        let database_path = env::var("GYM_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.database_path);
        let max_connections = env::var("GYM_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.storage.max_connections);

        let session_ttl_hours = env::var("GYM_SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.authentication.session_ttl_hours);
        let reset_token_ttl_minutes = env::var("GYM_RESET_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.authentication.reset_token_ttl_minutes);

        let bootstrap_admin = match env::var("GYM_BOOTSTRAP_ADMIN_PASSWORD") {
            Ok(password) => {
                let username = env::var("GYM_BOOTSTRAP_ADMIN_USERNAME")
                    .unwrap_or_else(|_| "admin".to_string());
                Some(BootstrapAdmin {
                    email: env::var("GYM_BOOTSTRAP_ADMIN_EMAIL")
                        .unwrap_or_else(|_| format!("{}@localhost", username)),
                    full_name: env::var("GYM_BOOTSTRAP_ADMIN_FULL_NAME")
                        .unwrap_or_else(|_| "Administrator".to_string()),
                    username,
                    password,
                })
            }
            Err(_) => None,
        };

        let email = if let Ok(smtp_url) = env::var("GYM_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("GYM_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let branding = BrandingConfig {
            gym_name: env::var("GYM_NAME").unwrap_or(defaults.branding.gym_name),
            address: env::var("GYM_ADDRESS").ok(),
            phone: env::var("GYM_PHONE").ok(),
            currency_symbol: env::var("GYM_CURRENCY_SYMBOL")
                .unwrap_or(defaults.branding.currency_symbol),
        };

        let expiring_soon_days = env::var("GYM_EXPIRING_SOON_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.dashboard.expiring_soon_days);

        let log_level = env::var("RUST_LOG").unwrap_or(defaults.logging.level);
        let log_json = env::var("GYM_LOG_JSON")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.logging.json);

        Ok(GymConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
            },
            storage: StorageConfig {
                database_path,
                max_connections,
            },
            authentication: AuthConfig {
                session_ttl_hours,
                reset_token_ttl_minutes,
                bootstrap_admin,
            },
            email,
            branding,
            dashboard: DashboardConfig { expiring_soon_days },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> GymResult<()> {
        if self.service.hostname.is_empty() {
            return Err(GymError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.storage.max_connections == 0 {
            return Err(GymError::Validation(
                "Database pool needs at least one connection".to_string(),
            ));
        }

        if self.authentication.session_ttl_hours <= 0
            || self.authentication.reset_token_ttl_minutes <= 0
        {
            return Err(GymError::Validation(
                "Session and reset token lifetimes must be positive".to_string(),
            ));
        }

        if let Some(admin) = &self.authentication.bootstrap_admin {
            if admin.password.len() < 8 {
                return Err(GymError::Validation(
                    "Bootstrap admin password must be at least 8 characters".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Base URL for links sent out of band
    pub fn base_url(&self) -> String {
        self.service
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.service.hostname, self.service.port))
    }
}
