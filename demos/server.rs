//! Simple REST API server example for the job ledger engine.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /jobs` - Create a job (staff entry, admin only)
//! - `POST /register` - Public customer intake
//! - `GET /jobs` - List all jobs, newest first
//! - `GET /jobs/:id` - Get a job by receipt ID
//! - `PUT /jobs/:id` - Edit a job's details
//! - `POST /jobs/:id/ready` - Mark a pending job ready for collection
//! - `POST /jobs/:id/complete` - Close a job and settle its balance
//! - `DELETE /jobs/:id` - Remove a job (admin only)
//! - `GET /stats` - Income and outstanding-balance aggregates
//!
//! The caller's role comes from the `x-role` header (`admin` or `staff`);
//! the intake endpoint needs none.
//!
//! ## Example Usage
//!
//! ```bash
//! # Create a job
//! curl -X POST http://localhost:3000/jobs \
//!   -H "Content-Type: application/json" -H "x-role: admin" \
//!   -d '{"customer_name": "Asha Rao", "total_cost": "2000", "advance": "500", "pay_method": "Cash"}'
//!
//! # Mark it ready
//! curl -X POST http://localhost:3000/jobs/SC-0001/ready -H "x-role: staff"
//!
//! # Settle the balance by card
//! curl -X POST http://localhost:3000/jobs/SC-0001/complete \
//!   -H "Content-Type: application/json" -H "x-role: admin" \
//!   -d '{"balance_pay_method": "Card"}'
//!
//! # Aggregates
//! curl http://localhost:3000/stats
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studio_ledger_rs::{
    Actor, IntakeForm, Job, JobDraft, JobError, JobId, JobLedger, MemoryStore, Notified,
    NullNotifier, PayMethod, Role, Stats, TextReceipt,
};
use tokio::net::TcpListener;

type Ledger = JobLedger<MemoryStore, NullNotifier, TextReceipt>;

// === Request/Response DTOs ===

/// Request body for completing a job.
#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    pub balance_pay_method: Option<PayMethod>,
}

/// Response body for a committed lifecycle operation.
#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub job: Job,
    /// `sent`, `skipped`, or `failed: <reason>`.
    pub notification: String,
}

impl SavedResponse {
    fn new(job: Job, notification: Notified) -> Self {
        let notification = match notification {
            Notified::Sent(kind) => format!("sent: {kind}"),
            Notified::Skipped => "skipped".to_string(),
            Notified::Failed(failure) => format!("failed: {failure}"),
        };
        SavedResponse { job, notification }
    }
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the job ledger.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

// === Error Handling ===

/// Wrapper for converting `JobError` into HTTP responses.
pub struct AppError(JobError);

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            JobError::MissingCustomerName => (StatusCode::BAD_REQUEST, "MISSING_CUSTOMER_NAME"),
            JobError::NegativeAmount => (StatusCode::BAD_REQUEST, "NEGATIVE_AMOUNT"),
            JobError::JobNotFound => (StatusCode::NOT_FOUND, "JOB_NOT_FOUND"),
            JobError::ProductNotFound => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
            JobError::AlreadyCompleted => (StatusCode::CONFLICT, "ALREADY_COMPLETED"),
            JobError::NotPending => (StatusCode::CONFLICT, "NOT_PENDING"),
            JobError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            JobError::MissingProductField => (StatusCode::BAD_REQUEST, "MISSING_PRODUCT_FIELD"),
            JobError::DuplicateProductCode => (StatusCode::CONFLICT, "DUPLICATE_PRODUCT_CODE"),
            JobError::AllocationConflict => (StatusCode::SERVICE_UNAVAILABLE, "ALLOCATION_CONFLICT"),
            JobError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE"),
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

/// Reads the caller's role from the `x-role` header. Unknown or missing
/// values fall back to staff, the least privileged role.
fn actor_from(headers: &HeaderMap) -> Actor {
    let role = headers
        .get("x-role")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| match v.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            _ => None,
        })
        .unwrap_or(Role::Staff);
    Actor {
        user_id: "api".to_string(),
        role,
    }
}

// === Handlers ===

/// POST /jobs - Create a new job from staff-entered details.
async fn create_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<JobDraft>,
) -> Result<(StatusCode, Json<SavedResponse>), AppError> {
    let actor = actor_from(&headers);
    let saved = state.ledger.create(&actor, &draft, true)?;
    Ok((
        StatusCode::CREATED,
        Json(SavedResponse::new(saved.job, saved.notification)),
    ))
}

/// POST /register - Public customer intake.
async fn register_job(
    State(state): State<AppState>,
    Json(intake): Json<IntakeForm>,
) -> Result<(StatusCode, Json<SavedResponse>), AppError> {
    let saved = state.ledger.register(&intake)?;
    Ok((
        StatusCode::CREATED,
        Json(SavedResponse::new(saved.job, saved.notification)),
    ))
}

/// GET /jobs/:id - Get a job by receipt ID.
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let job = state.ledger.job(&JobId(id))?;
    Ok(Json(job))
}

/// GET /jobs - List all jobs, newest first.
async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(state.ledger.jobs()?))
}

/// PUT /jobs/:id - Edit a job's details.
async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(draft): Json<JobDraft>,
) -> Result<Json<SavedResponse>, AppError> {
    let actor = actor_from(&headers);
    let saved = state.ledger.update(&actor, &JobId(id), &draft, true)?;
    Ok(Json(SavedResponse::new(saved.job, saved.notification)))
}

/// POST /jobs/:id/ready - Mark a pending job ready for collection.
async fn ready_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SavedResponse>, AppError> {
    let actor = actor_from(&headers);
    let saved = state.ledger.mark_ready(&actor, &JobId(id))?;
    Ok(Json(SavedResponse::new(saved.job, saved.notification)))
}

/// POST /jobs/:id/complete - Close a job and settle its balance.
async fn complete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<CompleteRequest>>,
) -> Result<Json<SavedResponse>, AppError> {
    let actor = actor_from(&headers);
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let saved = state
        .ledger
        .complete(&actor, &JobId(id), request.balance_pay_method)?;
    Ok(Json(SavedResponse::new(saved.job, saved.notification)))
}

/// DELETE /jobs/:id - Remove a job.
async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let actor = actor_from(&headers);
    state.ledger.delete(&actor, &JobId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /stats - Income and outstanding-balance aggregates.
async fn get_stats(State(state): State<AppState>) -> Result<Json<Stats>, AppError> {
    Ok(Json(state.ledger.stats()?))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(create_job).get(list_jobs))
        .route("/register", post(register_job))
        .route("/jobs/{id}", get(get_job).put(update_job).delete(delete_job))
        .route("/jobs/{id}/ready", post(ready_job))
        .route("/jobs/{id}/complete", post(complete_job))
        .route("/stats", get(get_stats))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let state = AppState {
        ledger: Arc::new(JobLedger::new(
            MemoryStore::new(),
            NullNotifier,
            TextReceipt::default(),
        )),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Studio Ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST   /jobs               - Create a job");
    println!("  POST   /register           - Public customer intake");
    println!("  GET    /jobs               - List all jobs");
    println!("  GET    /jobs/:id           - Get job by receipt ID");
    println!("  PUT    /jobs/:id           - Edit a job");
    println!("  POST   /jobs/:id/ready     - Mark job ready");
    println!("  POST   /jobs/:id/complete  - Complete a job");
    println!("  DELETE /jobs/:id           - Delete a job");
    println!("  GET    /stats              - Aggregates");

    axum::serve(listener, app).await.unwrap();
}
