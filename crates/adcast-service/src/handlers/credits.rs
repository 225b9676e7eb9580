//! Credit balance, history, purchase, and bonus handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use adcast_core::{
    BalanceCheck, CreditPolicy, SubscriptionTier, TopUp, TransactionId, TransactionRecord,
    UsageRecord, UserId,
};

use super::PageQuery;
use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Balance
// ============================================================================

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Balance in credits.
    pub balance: i64,
    /// Subscription tier.
    pub tier: SubscriptionTier,
    /// Whether the balance is at or below the low-balance threshold.
    pub is_low_balance: bool,
    /// Human-readable balance summary.
    pub message: String,
    /// Suggested credit package for this balance.
    pub recommended_top_up: TopUp,
}

/// Get current credit balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state.ledger.account(&auth.user_id)?;
    let check = state.ledger.policy().check_balance(account.balance, 0);

    Ok(Json(BalanceResponse {
        balance: account.balance,
        tier: account.tier,
        is_low_balance: check.is_low_balance,
        message: check.message,
        recommended_top_up: CreditPolicy::recommended_top_up(account.balance),
    }))
}

/// Balance check request.
///
/// Either an explicit `required` amount, or the campaign shape to price.
#[derive(Debug, Deserialize)]
pub struct CheckBalanceRequest {
    /// Explicit amount to check.
    #[serde(default)]
    pub required: Option<i64>,
    /// Number of providers of the campaign to price (default: 1).
    #[serde(default)]
    pub provider_count: Option<usize>,
    /// Whether the campaign uses advanced targeting.
    #[serde(default)]
    pub advanced_targeting: bool,
}

/// Check whether the balance covers an amount. Never changes the balance.
pub async fn check_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CheckBalanceRequest>,
) -> Result<Json<BalanceCheck>, ApiError> {
    let required = body.required.unwrap_or_else(|| {
        state
            .ledger
            .policy()
            .campaign_cost(body.provider_count.unwrap_or(1), body.advanced_targeting)
    });
    if required < 0 {
        return Err(ApiError::BadRequest("required must not be negative".into()));
    }

    Ok(Json(state.ledger.check_balance(&auth.user_id, required)?))
}

// ============================================================================
// History
// ============================================================================

/// Usage list response.
#[derive(Debug, Serialize)]
pub struct ListUsageResponse {
    /// Usage rows (newest first).
    pub usage: Vec<UsageRecord>,
    /// Whether there are more rows.
    pub has_more: bool,
}

/// List credit usage history.
pub async fn list_usage(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListUsageResponse>, ApiError> {
    state.ledger.account(&auth.user_id)?;

    // Fetch one more than requested to determine has_more
    let limit = query.capped_limit();
    let mut usage = state
        .ledger
        .usage_history(&auth.user_id, limit + 1, query.offset)?;
    let has_more = usage.len() > limit;
    usage.truncate(limit);

    Ok(Json(ListUsageResponse { usage, has_more }))
}

/// Transaction list response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionRecord>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    state.ledger.account(&auth.user_id)?;

    let limit = query.capped_limit();
    let mut transactions =
        state
            .ledger
            .transaction_history(&auth.user_id, limit + 1, query.offset)?;
    let has_more = transactions.len() > limit;
    transactions.truncate(limit);

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

// ============================================================================
// Purchases
// ============================================================================

/// Purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Credits to buy.
    pub credits: i64,
    /// List price in minor currency units, before the tier discount.
    pub amount_minor: i64,
    /// ISO currency code (default: usd).
    #[serde(default)]
    pub currency: Option<String>,
    /// Payment processor reference.
    #[serde(default)]
    pub payment_ref: Option<String>,
}

/// Apply a tier's purchase discount to a list price.
#[must_use]
pub fn discounted_price(amount_minor: i64, tier: SubscriptionTier) -> i64 {
    let keep = 100 - i64::from(tier.purchase_discount_percent());
    amount_minor * keep / 100
}

/// Start a purchase. Credits are applied when it completes.
pub async fn create_purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> Result<Json<TransactionRecord>, ApiError> {
    if body.amount_minor < 0 {
        return Err(ApiError::BadRequest("amount_minor must not be negative".into()));
    }

    let account = state.ledger.account(&auth.user_id)?;
    let price = discounted_price(body.amount_minor, account.tier);
    let currency = body.currency.as_deref().unwrap_or("usd");

    let transaction = state.ledger.begin_purchase(
        &auth.user_id,
        price,
        currency,
        body.credits,
        body.payment_ref,
    )?;
    Ok(Json(transaction))
}

fn parse_transaction_id(id: &str) -> Result<TransactionId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid transaction id: {id}")))
}

/// Complete a pending purchase (admin only).
pub async fn complete_purchase(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let transaction_id = parse_transaction_id(&id)?;
    let transaction = state.ledger.complete_purchase(&transaction_id)?;
    tracing::info!(admin_id = %admin.admin_id, transaction_id = %transaction_id, "Purchase completed by admin");
    Ok(Json(transaction))
}

/// Fail request.
#[derive(Debug, Default, Deserialize)]
pub struct FailPurchaseRequest {
    /// Why the payment failed.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Mark a pending purchase as failed (admin only).
pub async fn fail_purchase(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(id): Path<String>,
    Json(body): Json<FailPurchaseRequest>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let transaction_id = parse_transaction_id(&id)?;
    let reason = body.reason.as_deref().unwrap_or("payment failed");
    let transaction = state.ledger.fail_purchase(&transaction_id, reason)?;
    tracing::info!(admin_id = %admin.admin_id, transaction_id = %transaction_id, "Purchase failed by admin");
    Ok(Json(transaction))
}

/// Refund request. The body is optional.
#[derive(Debug, Default, Deserialize)]
pub struct RefundPurchaseRequest {
    /// Why the purchase is reversed.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Reverse a completed purchase (admin only).
///
/// Returns the purchase, now `refunded`; the debit is a separate `reversal` row in the
/// transaction history.
pub async fn refund_purchase(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(id): Path<String>,
    body: Option<Json<RefundPurchaseRequest>>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let transaction_id = parse_transaction_id(&id)?;
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let reason = body.reason.as_deref().unwrap_or("Purchase refunded");
    let transaction = state.ledger.mark_refunded(&transaction_id, reason)?;
    tracing::info!(admin_id = %admin.admin_id, transaction_id = %transaction_id, "Purchase refunded by admin");
    Ok(Json(transaction))
}

// ============================================================================
// Bonus
// ============================================================================

/// Bonus request.
#[derive(Debug, Deserialize)]
pub struct BonusRequest {
    /// Recipient.
    pub user_id: UserId,
    /// Credits to grant.
    pub amount: i64,
    /// Audit reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Grant bonus credits (admin only).
pub async fn add_bonus(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<BonusRequest>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let reason = body.reason.as_deref().unwrap_or("Admin bonus");
    let transaction = state.ledger.add_bonus(&body.user_id, body.amount, reason)?;

    tracing::info!(
        admin_id = %admin.admin_id,
        user_id = %body.user_id,
        amount = body.amount,
        "Admin granted bonus credits"
    );
    Ok(Json(transaction))
}
