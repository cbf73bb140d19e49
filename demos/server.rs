//! Simple REST API server example for the recharge engine.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /users` - Register a user
//! - `GET /users/:id` - Wallet summary for a user
//! - `POST /users/:id/recharges` - Submit a recharge claim (user-facing)
//! - `GET /users/:id/recharges` - Own recharge history (user-facing)
//! - `GET /recharges/pending` - All pending claims (admin-facing)
//! - `POST /users/:id/recharges/:rid/approve` - Approve a claim (admin-facing)
//! - `POST /users/:id/recharges/:rid/reject` - Reject a claim (admin-facing)
//! - `GET /notifications` - Drain the in-process notification feed
//!
//! Authorization is deliberately absent: the engine trusts that approve and
//! reject are only reached by an authorized caller.
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST http://localhost:3000/users \
//!   -H "Content-Type: application/json" \
//!   -d '{"user_id": 1, "name": "Asha", "email": "asha@example.com"}'
//!
//! curl -X POST http://localhost:3000/users/1/recharges \
//!   -H "Content-Type: application/json" \
//!   -d '{"amount": "1000", "utr_id": "UTR123"}'
//!
//! curl http://localhost:3000/recharges/pending
//!
//! curl -X POST http://localhost:3000/users/1/recharges/1/approve
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use recharge_engine_rs::{
    Engine, Notification, PendingRecharge, QueueNotifier, RechargeError, RechargeRequest,
    RequestId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

/// Request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_id: u32,
    pub name: String,
    pub email: String,
}

/// Request body for submitting a recharge claim.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub amount: Decimal,
    pub utr_id: String,
}

/// Response body for a successful approval.
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub points_added: Decimal,
    pub bonus_points: Decimal,
    pub new_balance: Decimal,
}

/// Response body for wallet summaries.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub user: u32,
    pub name: String,
    pub email: String,
    pub balance: Decimal,
    pub first_bonus_granted: bool,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the recharge engine and the
/// notification feed it writes to.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub notifications: Arc<QueueNotifier>,
}

// === Error Handling ===

/// Wrapper for converting `RechargeError` into HTTP responses.
pub struct AppError(RechargeError);

impl From<RechargeError> for AppError {
    fn from(err: RechargeError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            RechargeError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            RechargeError::EmptyReference => (StatusCode::BAD_REQUEST, "EMPTY_REFERENCE"),
            RechargeError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            RechargeError::DuplicateUser => (StatusCode::CONFLICT, "DUPLICATE_USER"),
            RechargeError::RequestNotFound => (StatusCode::NOT_FOUND, "REQUEST_NOT_FOUND"),
            RechargeError::AlreadyProcessed => (StatusCode::CONFLICT, "ALREADY_PROCESSED"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /users - Register a new user.
async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<StatusCode, AppError> {
    state
        .engine
        .register_user(UserId(request.user_id), &request.name, &request.email)?;
    Ok(StatusCode::CREATED)
}

/// GET /users/:id - Wallet summary.
async fn get_wallet(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<WalletResponse>, AppError> {
    let user_id = UserId(id);

    state
        .engine
        .get_wallet(&user_id)
        .map(|wallet| {
            Json(WalletResponse {
                user: user_id.0,
                name: wallet.name(),
                email: wallet.email(),
                balance: wallet.balance(),
                first_bonus_granted: wallet.first_bonus_granted(),
            })
        })
        .ok_or(AppError(RechargeError::UserNotFound))
}

/// POST /users/:id/recharges - Submit a recharge claim.
async fn submit_recharge(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<RechargeRequest>), AppError> {
    let created = state
        .engine
        .submit_request(UserId(id), request.amount, &request.utr_id)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /users/:id/recharges - Own recharge history.
async fn list_history(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Vec<RechargeRequest>>, AppError> {
    Ok(Json(state.engine.history(UserId(id))?))
}

/// GET /recharges/pending - All pending claims with owner annotations.
async fn list_pending(State(state): State<AppState>) -> Json<Vec<PendingRecharge>> {
    Json(state.engine.list_pending())
}

/// POST /users/:id/recharges/:rid/approve - Approve a pending claim.
async fn approve_recharge(
    State(state): State<AppState>,
    Path((id, rid)): Path<(u32, u64)>,
) -> Result<Json<ApprovalResponse>, AppError> {
    let approval = state.engine.approve(UserId(id), RequestId(rid))?;
    Ok(Json(ApprovalResponse {
        points_added: approval.points_added,
        bonus_points: approval.bonus_points,
        new_balance: approval.new_balance,
    }))
}

/// POST /users/:id/recharges/:rid/reject - Reject a pending claim.
async fn reject_recharge(
    State(state): State<AppState>,
    Path((id, rid)): Path<(u32, u64)>,
) -> Result<StatusCode, AppError> {
    state.engine.reject(UserId(id), RequestId(rid))?;
    Ok(StatusCode::OK)
}

/// GET /notifications - Drain the in-process notification feed.
async fn drain_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifications.drain())
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/{id}", get(get_wallet))
        .route("/users/{id}/recharges", post(submit_recharge).get(list_history))
        .route("/recharges/pending", get(list_pending))
        .route("/users/{id}/recharges/{rid}/approve", post(approve_recharge))
        .route("/users/{id}/recharges/{rid}/reject", post(reject_recharge))
        .route("/notifications", get(drain_notifications))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let notifications = Arc::new(QueueNotifier::new());
    let state = AppState {
        engine: Arc::new(Engine::with_notifier(notifications.clone())),
        notifications,
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Recharge API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /users                              - Register a user");
    println!("  GET  /users/:id                          - Wallet summary");
    println!("  POST /users/:id/recharges                - Submit a recharge claim");
    println!("  GET  /users/:id/recharges                - Own recharge history");
    println!("  GET  /recharges/pending                  - Pending claims (admin)");
    println!("  POST /users/:id/recharges/:rid/approve   - Approve a claim (admin)");
    println!("  POST /users/:id/recharges/:rid/reject    - Reject a claim (admin)");
    println!("  GET  /notifications                      - Drain notification feed");

    axum::serve(listener, app).await.unwrap();
}
