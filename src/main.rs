//! Dance studio lead service.
//!
//! Serves the site's lead form and campaign tracking:
//! - Lead validation and fallback delivery to the CRM webhook
//! - On-disk caching of leads that could not be delivered
//! - In-memory tracking log with UTM analytics

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState, TrackingConfig};
use delivery::{LeadDispatcher, PendingCache, PendingConfig, WebhookConfig, PENDING_SUBMISSION};
use studio_core::TrackingStore;
use telemetry::{health, init_tracing_from_env};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    webhook: WebhookConfig,

    #[serde(default)]
    pending: PendingConfig,

    #[serde(default)]
    tracking: TrackingConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook: WebhookConfig::default(),
            pending: PendingConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing_from_env() {
        eprintln!("Logging already initialized: {}", e);
    }

    info!("Starting studio lead service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;

    info!(
        webhook_url = %config.webhook.url,
        attempt_timeout_secs = config.webhook.attempt_timeout_secs,
        bom_prefix = config.webhook.bom_prefix,
        pending_dir = %config.pending.dir.display(),
        allow_clear = config.tracking.allow_clear,
        "Loaded configuration"
    );

    let pending = PendingCache::open(&config.pending.dir)
        .await
        .context("Failed to open pending cache")?;

    check_health(&pending).await;

    let dispatcher = Arc::new(
        LeadDispatcher::from_config(&config.webhook, pending)
            .context("Failed to create lead dispatcher")?,
    );
    info!(strategies = ?dispatcher.strategy_names(), "Lead dispatcher ready");

    // Create application state
    let store = Arc::new(TrackingStore::new());
    let state = AppState::new(store, dispatcher).with_tracking(config.tracking.clone());

    // Create router
    let app = router(state);

    // Start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("STUDIO")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested config
    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(url) = std::env::var("STUDIO_WEBHOOK_URL") {
        config.webhook.url = url;
    }
    if let Ok(secs) = std::env::var("STUDIO_WEBHOOK_TIMEOUT_SECS") {
        config.webhook.attempt_timeout_secs = secs
            .parse()
            .context("STUDIO_WEBHOOK_TIMEOUT_SECS must be a whole number of seconds")?;
    }
    if let Ok(flag) = std::env::var("STUDIO_WEBHOOK_BOM_PREFIX") {
        config.webhook.bom_prefix = parse_flag(&flag);
    }
    if let Ok(dir) = std::env::var("STUDIO_PENDING_DIR") {
        config.pending.dir = dir.into();
    }
    if let Ok(flag) = std::env::var("STUDIO_TRACKING_ALLOW_CLEAR") {
        config.tracking.allow_clear = parse_flag(&flag);
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Check component health on startup.
async fn check_health(pending: &PendingCache) {
    if pending.is_writable().await {
        health().pending_cache.set_healthy();
        info!("Pending cache: writable");
    } else {
        health().pending_cache.set_unhealthy("Directory is not writable");
        error!(dir = %pending.dir().display(), "Pending cache: not writable");
    }

    match pending.keys(PENDING_SUBMISSION).await {
        Ok(keys) if !keys.is_empty() => warn!(
            count = keys.len(),
            "Undelivered leads waiting in pending cache, POST /leads/retry to resend"
        ),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Could not read pending cache"),
    }

    // No request is sent up front; the first failed delivery flips this
    health().webhook.set_healthy();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
