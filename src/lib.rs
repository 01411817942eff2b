/// Gym Desk - membership and payment administration backend
///
/// Front desk staff log in, manage member profiles, assign membership plans,
/// record payments and print receipts. Every write is attributed to the admin
/// who made it in the activity log.

pub mod account;
pub mod activity;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod jobs;
pub mod mailer;
pub mod members;
pub mod metrics;
pub mod payments;
pub mod plans;
pub mod receipt;
pub mod server;

pub use config::GymConfig;
pub use context::{AppContext, RequestContext};
pub use error::{GymError, GymResult};
