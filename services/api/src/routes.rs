use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use counselor::chances::{
    chances_router, ChancesService, ProfileRepository, SchoolRepository, UsageLedger,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_chances_routes<P, S, U>(service: Arc<ChancesService<P, S, U>>) -> axum::Router
where
    P: ProfileRepository + 'static,
    S: SchoolRepository + 'static,
    U: UsageLedger + 'static,
{
    chances_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{demo_profile, demo_schools};
    use crate::infra::{InMemoryProfiles, InMemorySchools, InMemoryUsageLedger};
    use axum::body::Body;
    use axum::http::Request;
    use counselor::chances::{HttpCompletionClient, UsageLimits};
    use counselor::config::LlmConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let llm = LlmConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            fast_model: LlmConfig::DEFAULT_FAST_MODEL.to_string(),
            deep_model: LlmConfig::DEFAULT_DEEP_MODEL.to_string(),
            timeout: Duration::from_secs(1),
        };
        let client = Arc::new(HttpCompletionClient::from_config(&llm).expect("client builds"));
        let service = Arc::new(ChancesService::new(
            Arc::new(InMemoryProfiles::with([demo_profile().expect("demo profile")])),
            Arc::new(InMemorySchools::with(demo_schools().expect("demo schools"))),
            Arc::new(InMemoryUsageLedger::default()),
            client,
            UsageLimits::default(),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_chances_routes(service).layer(Extension(state))
    }

    async fn status_of(app: axum::Router, uri: &str) -> StatusCode {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds");
        app.oneshot(request).await.expect("router responds").status()
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        assert_eq!(status_of(app(false), "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        assert_eq!(
            status_of(app(false), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(app(true), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_render_as_plain_text() {
        let response = app(true)
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn chances_requests_without_a_profile_header_are_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/chances")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"schoolId":"state-u"}"#))
            .expect("request builds");
        let response = app(true).oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
