use crate::cli::ServeArgs;
use crate::infra::{build_engine, load_rules, AppState, OutboxGateway, ServiceEngine};
use crate::routes::{with_service_routes, ServiceDispatcher};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sarvam_setu::config::AppConfig;
use sarvam_setu::error::AppError;
use sarvam_setu::telemetry;
use sarvam_setu::workflows::questionnaire::DEFAULT_MAILBOX_IDLE;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
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

    let rules = load_rules(config.eligibility.rules_path.as_deref())?;
    info!(rules = rules.len(), "rule catalog loaded");

    let outbox = Arc::new(OutboxGateway::default());
    let engine = build_engine(rules, config.eligibility.matcher(), outbox.clone());
    spawn_session_sweeper(engine.clone(), outbox.clone(), config.sessions.idle_ttl);
    let dispatcher = Arc::new(ServiceDispatcher::new(engine, DEFAULT_MAILBOX_IDLE));

    let app = with_service_routes(dispatcher)
        .layer(Extension(app_state))
        .layer(Extension(outbox))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "eligibility questionnaire service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_session_sweeper(engine: Arc<ServiceEngine>, outbox: Arc<OutboxGateway>, idle_ttl: Duration) {
    let period = (idle_ttl / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(err) = engine.evict_idle(idle_ttl) {
                warn!(error = %err, "session sweep failed");
            }
            match outbox.evict_idle(idle_ttl) {
                Ok(0) => {}
                Ok(count) => info!(count, "evicted idle outboxes"),
                Err(err) => warn!(error = %err, "outbox sweep failed"),
            }
        }
    });
}
