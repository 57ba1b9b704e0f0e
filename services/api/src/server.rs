use crate::cli::ServeArgs;
use crate::infra::{AppState, FileTrackerRepository};
use crate::routes::with_tracker_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use listing_tracker::catalog::RouteCatalog;
use listing_tracker::config::AppConfig;
use listing_tracker::error::AppError;
use listing_tracker::telemetry;
use listing_tracker::tracker::{
    InMemoryTrackerRepository, RepositoryError, TrackerRepository, TrackerService,
    TrackerServiceError,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(tracker) = args.tracker.take() {
        config.tracker.path = tracker;
    }

    telemetry::init(&config.telemetry)?;

    let app = if args.in_memory {
        let mut document = RouteCatalog::standard().seed_document(&config.tracker.title);
        document.updated_on = Some(Local::now().date_naive());
        info!(rows = document.row_count(), "serving seeded in-memory tracker");
        build_app(Arc::new(InMemoryTrackerRepository::new(document)))
    } else {
        let repository = FileTrackerRepository::new(&config.tracker.path);
        match repository.load() {
            Ok(document) => {
                info!(path = %repository.path().display(), rows = document.row_count(), "tracker loaded")
            }
            Err(RepositoryError::NotFound) => warn!(
                path = %repository.path().display(),
                "tracker file missing; run `init` to create it"
            ),
            Err(err) => return Err(TrackerServiceError::from(err).into()),
        }
        build_app(Arc::new(repository))
    };

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    app.readiness.store(true, Ordering::Release);

    info!(?config.environment, %addr, "listing tracker ready");

    axum::serve(listener, app.router).await?;
    Ok(())
}

struct App {
    router: axum::Router,
    readiness: Arc<std::sync::atomic::AtomicBool>,
}

fn build_app<R>(repository: Arc<R>) -> App
where
    R: TrackerRepository + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(TrackerService::new(repository));
    let router = with_tracker_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    App { router, readiness }
}
