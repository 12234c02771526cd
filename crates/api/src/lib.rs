//! Drowsiness Monitor API Server
//!
//! REST and Server-Sent Events server for the driver dashboard, plus the
//! wiring that starts the detection worker next to it.

use alerting::{Broadcaster, EventStore, Snapshot};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use camera_capture::PacedSource;
use dms::{DetectionWorker, DmsModule, LandmarkReplay};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

mod error;
pub mod logging;
pub mod rate_limit;
mod routes;
pub mod settings;

pub use error::ApiError;
pub use logging::init_logging;
pub use rate_limit::{create_governor_config, RateLimitConfig};
pub use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    /// Counters and event log written by the detection worker
    pub store: Arc<EventStore>,
    /// Throttled snapshot pushes
    pub snapshots: broadcast::Sender<Snapshot>,
    /// Event labels per snapshot, also the default event query size
    pub recent_events: usize,
    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<EventStore>,
        snapshots: broadcast::Sender<Snapshot>,
        recent_events: usize,
    ) -> Self {
        Self {
            store,
            snapshots,
            recent_events,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub metrics: SystemMetrics,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub event_store: ComponentHealth,
    pub stream: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub detail: Option<String>,
}

/// System metrics
#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub events_logged: usize,
    pub alerts_total: u64,
    pub stream_subscribers: usize,
}

/// Create the application router.
///
/// `rate_limit` guards the REST routes; the SSE stream is a single
/// long-lived request and is left out.
pub fn create_router(
    state: Arc<AppState>,
    rate_limit: Option<&RateLimitConfig>,
) -> Result<Router, ApiError> {
    let mut rest = Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .route("/api/v1/events", get(routes::events::get_events))
        .route("/metrics", get(metrics_handler));

    if let Some(config) = rate_limit {
        rest = rest.layer(GovernorLayer {
            config: create_governor_config(config)?,
        });
    }

    Ok(Router::new()
        .merge(rest)
        .route("/api/v1/stream", get(routes::stream::stream_snapshots))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state))
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let stats = state.store.stats();
    let subscribers = state.snapshots.receiver_count();

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            event_store: ComponentHealth {
                status: "ok".to_string(),
                detail: Some(format!(
                    "{}/{} events",
                    state.store.len(),
                    state.store.capacity()
                )),
            },
            stream: ComponentHealth {
                status: "ok".to_string(),
                detail: None,
            },
        },
        metrics: SystemMetrics {
            events_logged: state.store.len(),
            alerts_total: stats.alerts_total,
            stream_subscribers: subscribers,
        },
    };

    Json(response)
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder not installed: {}", e);
            None
        }
    }
}

/// Start the detection worker and serve the dashboard until Ctrl-C
pub async fn run(settings: Settings) -> Result<(), ApiError> {
    settings.validate()?;
    let recording = settings.camera.recording.as_ref().ok_or_else(|| {
        ApiError::InvalidSettings("camera.recording is required as the landmark source".into())
    })?;

    let store = Arc::new(EventStore::new(settings.broadcast.event_log_capacity)?);
    let broadcaster = Broadcaster::new(
        settings.broadcast.emit_interval_secs,
        settings.broadcast.recent_events,
        settings.broadcast.channel_capacity,
    )?;

    let mut state = AppState::new(
        Arc::clone(&store),
        broadcaster.sender(),
        settings.broadcast.recent_events,
    );
    if let Some(handle) = install_metrics() {
        state = state.with_metrics(handle);
    }

    let app = create_router(Arc::new(state), Some(&settings.server.rate_limit))?;
    let addr = settings.server.addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let replay = LandmarkReplay::open(recording, settings.engine.max_faces)?;
    let source = PacedSource::new(settings.camera.capture_config(Some(replay.len() as u64)));
    let module = DmsModule::new(settings.engine.clone(), store)?;

    let worker = DetectionWorker::new(module, source, replay, broadcaster)
        .with_capture_backoff(Duration::from_millis(settings.camera.capture_backoff_ms))
        .spawn()?;

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    worker.stop();
    match tokio::task::spawn_blocking(move || worker.join()).await {
        Ok(Ok(summary)) => info!("Detection worker summary: {:?}", summary),
        Ok(Err(e)) => error!("{}", e),
        Err(e) => error!("Failed to join detection worker: {}", e),
    }

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlertKind;
    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode},
    };
    use futures::StreamExt;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        let store = Arc::new(EventStore::new(50).unwrap());
        let (tx, _) = broadcast::channel(16);
        Arc::new(AppState::new(store, tx, 20))
    }

    async fn get_json(app: Router, uri: &str) -> serde_json::Value {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(state(), None).unwrap();
        let json = get_json(app, "/api/v1/health").await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["metrics"]["events_logged"], 0);
    }

    #[tokio::test]
    async fn test_stats_reflect_store() {
        let state = state();
        state.store.record(AlertKind::EyeClosure, "Prolonged eye closure", 1.0);
        state.store.record(AlertKind::Yawn, "Yawn confirmed", 2.0);

        let json = get_json(create_router(state, None).unwrap(), "/api/v1/stats").await;
        assert_eq!(json["yawns_total"], 1);
        assert_eq!(json["eye_closures_total"], 1);
        assert_eq!(json["alerts_total"], 1);
    }

    #[tokio::test]
    async fn test_events_limit_and_cap() {
        let state = state();
        for i in 0..60 {
            state.store.record(AlertKind::Yawn, format!("yawn {}", i), i as f64);
        }

        let json = get_json(create_router(Arc::clone(&state), None).unwrap(), "/api/v1/events").await;
        assert_eq!(json["count"], 20);
        assert_eq!(json["data"][19]["label"], "yawn 59");

        let json = get_json(create_router(Arc::clone(&state), None).unwrap(), "/api/v1/events?limit=3").await;
        assert_eq!(json["count"], 3);
        assert_eq!(json["data"][0]["label"], "yawn 57");

        let json = get_json(create_router(state, None).unwrap(), "/api/v1/events?limit=500").await;
        assert_eq!(json["count"], 50);
        assert_eq!(json["data"][0]["label"], "yawn 10");
    }

    #[tokio::test]
    async fn test_stream_sends_current_snapshot() {
        let state = state();
        state.store.record(AlertKind::Yawn, "Yawn confirmed", 1.0);
        let app = create_router(state, None).unwrap();

        let response = app
            .oneshot(Request::builder().uri("/api/v1/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");

        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        let text = String::from_utf8_lossy(&first);
        assert!(text.contains("event: stats"));
        assert!(text.contains("\"yawns_total\":1"));
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let app = create_router(state(), None).unwrap();
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_render() {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let store = Arc::new(EventStore::new(50).unwrap());
        let (tx, _) = broadcast::channel(16);
        let state = Arc::new(AppState::new(store, tx, 20).with_metrics(handle));

        let response = create_router(state, None)
            .unwrap()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_burst() {
        let config = RateLimitConfig {
            per_second: 60,
            burst_size: 2,
        };
        let app = create_router(state(), Some(&config)).unwrap();
        let peer = SocketAddr::from(([127, 0, 0, 1], 40000));

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let mut request = Request::builder()
                .uri("/api/v1/stats")
                .body(Body::empty())
                .unwrap();
            request.extensions_mut().insert(ConnectInfo(peer));
            let response = app.clone().oneshot(request).await.unwrap();
            statuses.push(response.status());
        }

        assert_eq!(statuses[0], StatusCode::OK);
        assert_eq!(statuses[1], StatusCode::OK);
        assert_eq!(statuses[2], StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_default_rate_limit_allows_burst_of_twenty() {
        let app = create_router(state(), Some(&RateLimitConfig::default())).unwrap();
        let peer = SocketAddr::from(([10, 0, 0, 7], 51000));

        let mut rejected = 0;
        for _ in 0..25 {
            let mut request = Request::builder()
                .uri("/api/v1/stats")
                .body(Body::empty())
                .unwrap();
            request.extensions_mut().insert(ConnectInfo(peer));
            let response = app.clone().oneshot(request).await.unwrap();
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                rejected += 1;
            }
        }

        assert_eq!(rejected, 5);
    }

    #[tokio::test]
    async fn test_run_requires_recording() {
        let err = run(Settings::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidSettings(_)));
    }
}
