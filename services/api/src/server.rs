use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_attendance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fitbuddy_attendance::config::AppConfig;
use fitbuddy_attendance::error::AppError;
use fitbuddy_attendance::telemetry;
use fitbuddy_attendance::workflows::attendance::GeofenceDefaults;
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

    let defaults = GeofenceDefaults {
        radius_meters: config.attendance.radius_meters,
    };
    let app = with_attendance_routes(defaults)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        radius_meters = config.attendance.radius_meters,
        "attendance geofence service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
