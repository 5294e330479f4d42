use crate::cli::ServeArgs;
use crate::demo::{demo_profile, demo_schools};
use crate::infra::{AppState, InMemoryProfiles, InMemorySchools, InMemoryUsageLedger};
use crate::routes::with_chances_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use counselor::chances::{ChancesService, HttpCompletionClient};
use counselor::config::AppConfig;
use counselor::error::AppError;
use counselor::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let student = demo_profile()?;
    let demo_tier = args.demo_tier.take().unwrap_or_else(|| "premium".to_string());
    let usage = InMemoryUsageLedger::default().with_tier(student.id.clone(), &demo_tier);
    let profiles = InMemoryProfiles::with([student]);
    let schools = InMemorySchools::with(demo_schools()?);

    if config.llm.api_key.is_none() {
        info!("no completion api key configured; holistic requests will fail upstream");
    }
    let client = Arc::new(HttpCompletionClient::from_config(&config.llm)?);
    let chances_service = Arc::new(ChancesService::new(
        Arc::new(profiles),
        Arc::new(schools),
        Arc::new(usage),
        client,
        config.usage,
    ));

    let app = with_chances_routes(chances_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        deep_model = %config.llm.deep_model,
        fast_model = %config.llm.fast_model,
        "admission chances service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
