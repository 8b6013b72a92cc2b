use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::payment::{summarize, LoanSummary, Payment, PaymentInput, PaymentPatch};
use crate::models::status::{classify, month_totals, MonthTotal, PaymentStatus};
use crate::models::user::Identity;
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct StatusParams {
    pub goal: f64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub goal: f64,
    pub statuses: BTreeMap<i64, PaymentStatus>,
    pub months: Vec<MonthTotal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub loan_total: f64,
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidInput("invalid payment id format".into()))
}

fn non_negative(name: &str, value: f64) -> Result<f64, AppError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AppError::InvalidInput(format!(
            "{} must be a non-negative number",
            name
        )))
    }
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/payments - caller's payments, newest first
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let payments = state.payments.find_all(identity.user_id).await?;
    Ok(Json(payments))
}

/// POST /api/payments
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<PaymentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let Json(input) = payload?;
    let patch = PaymentPatch::try_from(input)?;
    let payment = state.payments.create(&identity, &patch).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// PUT /api/payments/:id - owner only, replaces date and amount
pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<PaymentInput>, JsonRejection>,
) -> Result<Json<Payment>, AppError> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    let patch = PaymentPatch::try_from(input)?;
    let payment = state.guard.update(id, &identity, &patch).await?;
    Ok(Json(payment))
}

/// DELETE /api/payments/:id - owner only
pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.guard.delete(id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/payments/status?goal= - met/missed/pending per payment
pub async fn payment_statuses(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    params: Result<Query<StatusParams>, QueryRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let Query(params) = params?;
    let goal = non_negative("goal", params.goal)?;
    let payments = state.payments.find_all(identity.user_id).await?;

    let statuses = classify(&payments, goal).into_iter().collect();
    let months = month_totals(&payments)
        .into_iter()
        .map(|(month, total)| MonthTotal {
            month: month.to_string(),
            total,
        })
        .collect();

    Ok(Json(StatusResponse {
        goal,
        statuses,
        months,
    }))
}

/// GET /api/payments/summary?loanTotal= - paid so far and remaining balance
pub async fn loan_summary(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<Json<LoanSummary>, AppError> {
    let Query(params) = params?;
    let loan_total = non_negative("loanTotal", params.loan_total)?;
    let payments = state.payments.find_all(identity.user_id).await?;
    Ok(Json(summarize(&payments, loan_total)))
}
