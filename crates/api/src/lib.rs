//! YouCare API Server
//!
//! HTTP surface for the home-automation bridge and the caregiver app:
//! event intake, event history, alert dispatch and battery readings.

use alerting::{spawn_sweeper, AlertDispatcher, AlertPolicy, CooldownStore, NotificationTransport};
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono_tz::Tz;
use event_intake::EventIntake;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use storage::{BatteryRegistry, EventStore, Repository, SqliteRepository};
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod auth;
mod error;
mod rate_limit;
mod routes;
mod settings;

pub use auth::{Claims, JwtVerifier};
pub use error::ApiError;
pub use rate_limit::{create_governor_config, RateLimitConfig};
pub use settings::{AuthSettings, LogSettings, ServerSettings, Settings, StorageSettings};

/// Application state shared across handlers
pub struct AppState {
    /// Loaded settings
    pub settings: Settings,
    /// Bridge event validation
    pub intake: EventIntake,
    /// Event history
    pub store: Arc<dyn EventStore>,
    /// Latest battery levels
    pub batteries: BatteryRegistry,
    /// Alert gate and fan-out
    pub dispatcher: AlertDispatcher,
    /// Bearer token verification
    pub verifier: JwtVerifier,
    /// Zone for times returned to the app
    pub tz: Tz,
    /// Prometheus handle when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Assemble state from settings and injected collaborators
    pub fn new(
        settings: Settings,
        store: Arc<dyn EventStore>,
        cooldowns: Arc<CooldownStore>,
        transport: Arc<dyn NotificationTransport>,
    ) -> anyhow::Result<Self> {
        let secret = settings
            .auth
            .secret
            .clone()
            .filter(|s| !s.is_empty())
            .context("auth.secret (or SECRET_KEY) must be set")?;

        let tz = settings.alerts.tz()?;
        let policy = AlertPolicy::new(settings.alerts.clone(), cooldowns)?;

        Ok(Self {
            intake: EventIntake::new(),
            store,
            batteries: BatteryRegistry::new(),
            dispatcher: AlertDispatcher::new(policy, transport),
            verifier: JwtVerifier::new(&secret),
            tz,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            settings,
        })
    }

    /// Serve `/metrics` from this recorder handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub database: ComponentHealth,
    pub transport: ComponentHealth,
    pub cooldowns: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let rate_limit = &state.settings.rate_limit;
    let governor = if rate_limit.enabled {
        let config = create_governor_config(rate_limit);
        if config.is_none() {
            warn!("Rate limit settings are invalid, limiter disabled");
        }
        config
    } else {
        None
    };

    let api = Router::new()
        .route(
            "/events",
            get(routes::events::get_events).post(routes::events::add_event),
        )
        .route("/alert", axum::routing::post(routes::alerts::send_alert))
        .route(
            "/battery",
            get(routes::battery::get_battery).post(routes::battery::battery_update),
        );

    let api = match governor {
        Some(config) => api.layer(GovernorLayer { config }),
        None => api,
    };

    Router::new()
        .route("/", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.store.count().await {
        Ok(count) => ComponentHealth {
            status: "ok".to_string(),
            entries: Some(count),
        },
        Err(e) => ComponentHealth {
            status: format!("error: {}", e),
            entries: None,
        },
    };

    Json(HealthResponse {
        message: "YouCare backend running".to_string(),
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            database,
            transport: ComponentHealth {
                status: "ok".to_string(),
                entries: None,
            },
            cooldowns: ComponentHealth {
                status: "ok".to_string(),
                entries: Some(state.dispatcher.policy().store().len()),
            },
        },
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<()> {
    let level = settings.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("Failed to set tracing subscriber")
}

/// Open the configured event store
async fn open_store(settings: &StorageSettings) -> anyhow::Result<Arc<dyn EventStore>> {
    match &settings.database_url {
        Some(url) => {
            let repo = SqliteRepository::connect(url, settings.max_connections)
                .await
                .with_context(|| format!("Failed to open event store at {}", url))?;
            Ok(Arc::new(repo))
        }
        None => {
            warn!("No database_url configured, events are kept in memory only");
            Ok(Arc::new(Repository::with_capacity(settings.max_events)))
        }
    }
}

/// Run the server
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let store = open_store(&settings.storage).await?;
    let transport = notify::from_config(&settings.email)?;
    let cooldowns = Arc::new(CooldownStore::new());
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let sweeper = spawn_sweeper(
        Arc::clone(&cooldowns),
        settings.alerts.sweep_interval(),
        settings.alerts.max_cooldown(),
    );

    let addr = settings.server.addr.clone();
    let state = Arc::new(AppState::new(settings, store, cooldowns, transport)?.with_metrics(metrics));
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await;

    sweeper.abort();
    served.context("Server error")
}
