//! Account management handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use adcast_core::{CreditAccount, SubscriptionTier};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// User ID.
    pub user_id: String,
    /// Current balance in credits.
    pub balance: i64,
    /// Lifetime purchased credits.
    pub lifetime_purchased: i64,
    /// Lifetime granted credits (bonuses and refunds).
    pub lifetime_granted: i64,
    /// Lifetime used credits.
    pub lifetime_used: i64,
    /// Subscription tier.
    pub tier: SubscriptionTier,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&CreditAccount> for AccountResponse {
    fn from(account: &CreditAccount) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            balance: account.balance,
            lifetime_purchased: account.lifetime_purchased,
            lifetime_granted: account.lifetime_granted,
            lifetime_used: account.lifetime_used,
            tier: account.tier,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Create account request.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAccountRequest {
    /// Subscription tier (default: free).
    #[serde(default)]
    pub tier: SubscriptionTier,
}

/// Open a credit account for the caller, granting signup and tier bonuses.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.ledger.open_account(auth.user_id, body.tier)?;

    tracing::info!(user_id = %auth.user_id, tier = %body.tier, "Account created");

    Ok(Json(AccountResponse::from(&account)))
}

/// Get the current user's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.ledger.account(&auth.user_id)?;
    Ok(Json(AccountResponse::from(&account)))
}
