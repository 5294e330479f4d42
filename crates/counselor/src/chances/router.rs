use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::Mode;
use super::repository::{ProfileRepository, SchoolRepository, UsageLedger};
use super::school::SchoolId;
use super::service::{ChancesService, ChancesServiceError};
use super::snapshot::ProfileId;

/// Header carrying the authenticated profile id, set by the auth layer in front of the router.
pub const PROFILE_HEADER: &str = "x-profile-id";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChancesRequest {
    pub school_id: SchoolId,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchChancesRequest {
    pub school_ids: Vec<SchoolId>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub persist: bool,
}

/// Router builder exposing the chances endpoints.
pub fn chances_router<P, S, U>(service: Arc<ChancesService<P, S, U>>) -> Router
where
    P: ProfileRepository + 'static,
    S: SchoolRepository + 'static,
    U: UsageLedger + 'static,
{
    Router::new()
        .route("/api/chances", post(assess_handler::<P, S, U>))
        .route("/api/chances/estimate", post(estimate_handler::<P, S, U>))
        .route("/api/chances/batch", post(batch_handler::<P, S, U>))
        .with_state(service)
}

fn profile_id(headers: &HeaderMap) -> Option<ProfileId> {
    headers
        .get(PROFILE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| ProfileId(value.to_string()))
}

fn unauthorized() -> Response {
    let payload = json!({
        "error": format!("missing {PROFILE_HEADER} header"),
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn error_response(error: ChancesServiceError) -> Response {
    let status = match &error {
        ChancesServiceError::ProfileNotFound(_) | ChancesServiceError::SchoolNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ChancesServiceError::UsageLimit(_) => StatusCode::PAYMENT_REQUIRED,
        ChancesServiceError::Assessment(_) => StatusCode::BAD_GATEWAY,
        ChancesServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
        "retryable": error.is_retryable(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn assess_handler<P, S, U>(
    State(service): State<Arc<ChancesService<P, S, U>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ChancesRequest>,
) -> Response
where
    P: ProfileRepository + 'static,
    S: SchoolRepository + 'static,
    U: UsageLedger + 'static,
{
    let Some(profile_id) = profile_id(&headers) else {
        return unauthorized();
    };
    match service
        .assess(&profile_id, &request.school_id, request.mode, request.persist)
        .await
    {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn estimate_handler<P, S, U>(
    State(service): State<Arc<ChancesService<P, S, U>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ChancesRequest>,
) -> Response
where
    P: ProfileRepository + 'static,
    S: SchoolRepository + 'static,
    U: UsageLedger + 'static,
{
    let Some(profile_id) = profile_id(&headers) else {
        return unauthorized();
    };
    match service
        .estimate(&profile_id, &request.school_id, request.mode, request.persist)
        .await
    {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn batch_handler<P, S, U>(
    State(service): State<Arc<ChancesService<P, S, U>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<BatchChancesRequest>,
) -> Response
where
    P: ProfileRepository + 'static,
    S: SchoolRepository + 'static,
    U: UsageLedger + 'static,
{
    let Some(profile_id) = profile_id(&headers) else {
        return unauthorized();
    };
    match service
        .assess_many(&profile_id, &request.school_ids, request.mode, request.persist)
        .await
    {
        Ok(results) => (StatusCode::OK, axum::Json(results)).into_response(),
        Err(error) => error_response(error),
    }
}
