//! HTTP surface
//!
//! Four fixed routes:
//! - `GET /health`   liveness, no cloud calls
//! - `GET /`         service descriptor with the configured bucket
//! - `GET /identity` ambient caller identity
//! - `GET /s3-test`  assume the cross-account role and read the test object

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::broker::CredentialBroker;
use crate::error::BrokerError;
use crate::identity;
use crate::sts::SecurityTokenService;
use crate::types::{IdentityDescriptor, ObjectLocation, RoleIdentifier};

pub const SERVICE_NAME: &str = "IRSA Cross-Account S3 Test";

#[derive(Clone)]
pub struct AppState {
    pub sts: Arc<dyn SecurityTokenService>,
    pub broker: Arc<CredentialBroker>,
    pub role: RoleIdentifier,
    pub location: ObjectLocation,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct RootResponse {
    service: &'static str,
    bucket: String,
}

#[derive(Debug, Serialize)]
struct S3TestResponse {
    status: &'static str,
    cross_account_role: String,
    file_content: String,
    bucket: String,
    file_key: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/identity", get(get_identity))
        .route("/s3-test", get(s3_test))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        service: SERVICE_NAME,
        bucket: state.location.bucket.clone(),
    })
}

async fn get_identity(
    State(state): State<AppState>,
) -> Result<Json<IdentityDescriptor>, BrokerError> {
    let identity = identity::resolve_caller_identity(state.sts.as_ref()).await?;
    Ok(Json(identity))
}

async fn s3_test(State(state): State<AppState>) -> Result<Json<S3TestResponse>, BrokerError> {
    info!("Testing cross-account read of {} via {}", state.location, state.role);

    let read = state
        .broker
        .read_object_via_assumed_role(&state.role, &state.location)
        .await?;

    Ok(Json(S3TestResponse {
        status: "success",
        cross_account_role: read.assumed_role_arn,
        file_content: read.content,
        bucket: state.location.bucket.clone(),
        file_key: state.location.key.clone(),
    }))
}
