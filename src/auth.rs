/// Authentication extractors
use crate::{
    account::Admin,
    api::middleware::extract_bearer_token,
    context::{AppContext, RequestContext},
    error::GymError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated admin - extracts and validates the bearer session
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub admin: Admin,
    pub token: String,
}

impl AdminAuth {
    /// Actor and clock for a write made by this admin
    pub fn request_context(&self) -> RequestContext {
        RequestContext::for_admin(self.admin.id)
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuth {
    type Rejection = GymError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| GymError::Authentication("Missing authorization header".to_string()))?;

        let admin = state.accounts.validate_session(&token).await?;

        tracing::debug!(admin_id = admin.id, "Authenticated admin request");

        Ok(AdminAuth { admin, token })
    }
}
