use crate::cli::ServeArgs;
use crate::infra::{build_app, skill_catalog, AppState, LocalBlobStore};
use crate::routes::with_hiring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hiretop::config::AppConfig;
use hiretop::error::AppError;
use hiretop::telemetry;
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

    let catalog = skill_catalog(args.skills.as_deref())?;
    let skills = catalog.len();
    let blobs = Arc::new(LocalBlobStore::new(&config.documents));
    let hiring = build_app(&config, blobs.clone(), catalog);

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        blobs,
    };

    let app = with_hiring_routes(hiring)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        skills,
        document_root = %config.documents.root.display(),
        "hiretop api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
