//! # REST Handlers
//!
//! Request handlers for the kernel's REST endpoints.
//!
//! # Endpoints
//!
//! ## Trades
//! - `POST /api/v1/trades` - Create a trade in its initial stage
//! - `GET /api/v1/trades/{id}/state` - Full state snapshot
//! - `POST /api/v1/trades/{id}/transitions` - Request a stage transition
//! - `GET /api/v1/trades/{id}/events` - Audit tail
//!
//! ## Escrow
//! - `POST /api/v1/trades/{id}/escrow/hold` - Place the escrow hold
//! - `GET /api/v1/trades/{id}/escrow` - Escrow progress view
//!
//! Transition rejections are not errors: they come back as a
//! `success: false` body with the reason code and remediation hints,
//! exactly as the kernel reports them.

use crate::application::error::{ApplicationError, CollaboratorError};
use crate::application::use_cases::create_trade::{CreateTrade, CreateTradeRequest};
use crate::application::use_cases::get_trade_state::{GetTradeState, TradeStateView};
use crate::application::use_cases::transition_trade::{
    TransitionEngine, TransitionMetadata, TransitionOutcome,
};
use crate::application::services::escrow_ledger::EscrowLedger;
use crate::domain::entities::escrow::EscrowView;
use crate::domain::entities::trade::Trade;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::ids::{PartyId, QuoteId, TradeId};
use crate::domain::value_objects::money::{Currency, Money};
use crate::domain::value_objects::reason::ReasonCode;
use crate::domain::value_objects::stage::TradeStage;
use crate::infrastructure::persistence::traits::RecordedEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for REST handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Trade creation use case.
    pub create_trade: CreateTrade,
    /// The transition engine.
    pub engine: TransitionEngine,
    /// State read use case.
    pub reader: GetTradeState,
    /// Escrow funding service.
    pub escrow: EscrowLedger,
}

// ============================================================================
// Error Response
// ============================================================================

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

fn error_response(err: &ApplicationError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match err {
        ApplicationError::TradeNotFound(_) | ApplicationError::EscrowNotFound(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        }
        ApplicationError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ApplicationError::ConcurrencyConflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        ApplicationError::Domain(domain) => match domain {
            DomainError::DoubleHold(_)
            | DomainError::MilestoneAlreadyReleased(_)
            | DomainError::ReleaseExceedsHeld { .. }
            | DomainError::OperationNotAllowed(_)
            | DomainError::InvalidStageTransition { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            _ => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        },
        ApplicationError::Collaborator(CollaboratorError::Timeout(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "COLLABORATOR_TIMEOUT")
        }
        ApplicationError::Collaborator(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "COLLABORATOR_UNAVAILABLE")
        }
        ApplicationError::Store(_) | ApplicationError::Internal(_) => {
            error!(error = %err, "internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };
    (status, Json(ErrorResponse::new(code, err.to_string())))
}

// ============================================================================
// Requests / Responses
// ============================================================================

/// Body of `POST /api/v1/trades/{id}/transitions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    /// The requested target stage.
    pub target_state: TradeStage,
    /// The party requesting the transition.
    pub actor: String,
    /// The quote backing a move to `contracted`, for RFQ trades.
    #[serde(default)]
    pub quote_id: Option<QuoteId>,
}

/// Body of the transition response, success or rejection.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionResponse {
    /// True if the transition committed.
    pub success: bool,
    /// The updated trade, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade: Option<Trade>,
    /// The blocking cause, on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<ReasonCode>,
    /// Remediation hints, on rejection.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required_actions: Vec<String>,
}

/// Body of `POST /api/v1/trades/{id}/escrow/hold`.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldRequest {
    /// The amount to hold.
    pub amount: Decimal,
    /// Currency code of the amount.
    pub currency: String,
}

/// Query parameters for the audit tail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TailParams {
    /// Maximum number of entries to return.
    #[serde(default = "default_tail_limit")]
    pub limit: usize,
}

fn default_tail_limit() -> usize {
    50
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /api/v1/health`
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /api/v1/trades`
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTradeRequest>,
) -> Result<(StatusCode, Json<Trade>), (StatusCode, Json<ErrorResponse>)> {
    match state.create_trade.execute(request).await {
        Ok(trade) => Ok((StatusCode::CREATED, Json(trade))),
        Err(err) => Err(error_response(&err)),
    }
}

/// `GET /api/v1/trades/{id}/state`
pub async fn get_trade_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TradeStateView>, (StatusCode, Json<ErrorResponse>)> {
    match state.reader.read(TradeId::new(id)).await {
        Ok(view) => Ok(Json(view)),
        Err(err) => Err(error_response(&err)),
    }
}

/// `POST /api/v1/trades/{id}/transitions`
pub async fn transition_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<(StatusCode, Json<TransitionResponse>), (StatusCode, Json<ErrorResponse>)> {
    if request.actor.trim().is_empty() {
        let err = ApplicationError::validation("actor must not be empty");
        return Err(error_response(&err));
    }

    let mut metadata = TransitionMetadata::new(PartyId::new(request.actor));
    if let Some(quote_id) = request.quote_id {
        metadata = metadata.with_quote(quote_id);
    }

    match state
        .engine
        .transition(TradeId::new(id), request.target_state, metadata)
        .await
    {
        Ok(TransitionOutcome::Completed { trade }) => Ok((
            StatusCode::OK,
            Json(TransitionResponse {
                success: true,
                trade: Some(trade),
                reason_code: None,
                required_actions: Vec::new(),
            }),
        )),
        Ok(TransitionOutcome::Rejected(rejection)) => {
            let status = match rejection.reason_code {
                ReasonCode::InvalidTransition | ReasonCode::ConcurrencyConflict => {
                    StatusCode::CONFLICT
                }
                ReasonCode::ExternalTimeout => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            Ok((
                status,
                Json(TransitionResponse {
                    success: false,
                    trade: None,
                    reason_code: Some(rejection.reason_code),
                    required_actions: rejection.required_actions,
                }),
            ))
        }
        Err(err) => Err(error_response(&err)),
    }
}

/// `POST /api/v1/trades/{id}/escrow/hold`
pub async fn hold_escrow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<HoldRequest>,
) -> Result<Json<EscrowView>, (StatusCode, Json<ErrorResponse>)> {
    let amount = Currency::new(request.currency)
        .and_then(|currency| Money::new(request.amount, currency))
        .map_err(|err| error_response(&ApplicationError::Domain(err)))?;

    match state.escrow.hold(TradeId::new(id), amount).await {
        Ok(view) => Ok(Json(view)),
        Err(err) => Err(error_response(&err)),
    }
}

/// `GET /api/v1/trades/{id}/escrow`
pub async fn get_escrow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EscrowView>, (StatusCode, Json<ErrorResponse>)> {
    match state.escrow.view(TradeId::new(id)).await {
        Ok(view) => Ok(Json(view)),
        Err(err) => Err(error_response(&err)),
    }
}

/// `GET /api/v1/trades/{id}/events`
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<TailParams>,
) -> Result<Json<Vec<RecordedEvent>>, (StatusCode, Json<ErrorResponse>)> {
    match state.reader.tail(TradeId::new(id), params.limit).await {
        Ok(tail) => Ok(Json(tail)),
        Err(err) => Err(error_response(&err)),
    }
}
