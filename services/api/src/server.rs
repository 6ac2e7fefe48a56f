use crate::cli::ServeArgs;
use crate::infra::{system_actor, AppState, Services};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use clinic_desk::clock::SystemClock;
use clinic_desk::config::AppConfig;
use clinic_desk::error::AppError;
use clinic_desk::telemetry;
use clinic_desk::workflows::enquiry::ReminderPoller;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Services::build(&config.reminders, Arc::new(SystemClock))?;
    if let Some(seed) = args.seed.take() {
        services.seed_from(&seed)?;
    }
    services.enquiries.prune_markers();

    let poller = ReminderPoller::new(services.enquiries.clone(), system_actor())
        .unattended()
        .spawn(config.reminders.poll_interval);

    let app = with_service_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        poll_secs = config.reminders.poll_interval.as_secs(),
        "clinic desk service ready"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    readiness_flag.store(false, Ordering::Release);
    poller.shutdown().await;
    info!("reminder poller stopped");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
