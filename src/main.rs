//! NPS sync daemon
//!
//! Keeps the local NPS working set in step with the survey backend:
//! - restores the persisted working set on startup
//! - refreshes it on a fixed interval with the last requested filter
//! - logs the recomputed dashboard metrics whenever the data changes

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::{error, info, warn};

use nps_core::{
    detect_benchmark_drops, evaluate_alerts, worst_categories, AggregateMetrics,
    AggregationConfig, AlertSeverity, AlertThresholds, DEFAULT_WORST_CATEGORIES,
};
use record_store::{FileStorage, RecordStore};
use refresh::{
    validate_config, HttpDataSource, SourceConfig, SyncConfig, SyncCoordinator, SyncEvent,
};
use telemetry::{health, init_tracing_from_env, metrics};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AppConfig {
    #[serde(default)]
    source: SourceConfig,
    #[serde(default)]
    sync: SyncConfig,
    #[serde(default)]
    storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageConfig {
    /// Directory holding the persisted working set and filters
    #[serde(default = "default_storage_dir")]
    dir: PathBuf,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting NPS sync daemon v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        base_url = %config.source.base_url,
        interval_secs = config.sync.interval_secs,
        debounce_ms = config.sync.debounce_ms,
        storage_dir = %config.storage.dir.display(),
        "Loaded configuration"
    );

    let storage = FileStorage::open(&config.storage.dir).context("Failed to open storage")?;
    let store = Arc::new(RecordStore::new(Arc::new(storage)));

    let aggregation = AggregationConfig {
        window_days: config.sync.window_days,
        top_stores: config.sync.top_stores,
        ..AggregationConfig::default()
    };

    // Recompute the dashboard on every change of the working set
    let weak_store: Weak<RecordStore> = Arc::downgrade(&store);
    let dashboard = aggregation.clone();
    let _data_sub = store.subscribe(move |event| {
        if let Some(store) = weak_store.upgrade() {
            info!(record_count = event.record_count, "Working set changed");
            log_dashboard(&store, &dashboard);
        }
    });

    let restored = store.restore();
    if restored == 0 {
        info!("No persisted records, waiting for first sync");
    }

    let source = HttpDataSource::new(&config.source).context("Failed to create data source")?;
    let coordinator = Arc::new(SyncCoordinator::with_debounce(
        Arc::new(source),
        store.clone(),
        config.sync.debounce(),
    ));
    info!(filter = ?coordinator.active_filter(), "Active filter");

    let _sync_sub = coordinator.subscribe(|event| match event {
        SyncEvent::Failed {
            code,
            message,
            transient,
            ..
        } => {
            let report = health().report();
            warn!(
                code,
                transient,
                health = ?report.status,
                "Sync failed: {}",
                message
            );
        }
        SyncEvent::Completed {
            has_data: false, ..
        } => {
            info!("Survey backend has no data yet");
        }
        _ => {}
    });

    coordinator.start(config.sync.interval());

    shutdown_signal().await;

    info!("Shutting down...");
    coordinator.stop();

    let snapshot = metrics().snapshot();
    info!(
        syncs_completed = snapshot.syncs_completed,
        syncs_failed = snapshot.syncs_failed,
        syncs_skipped = snapshot.syncs_skipped,
        records_loaded = snapshot.records_loaded,
        fetch_latency_mean_ms = snapshot.fetch_latency_mean_ms,
        "Shutdown complete"
    );
    Ok(())
}

/// Load configuration from defaults, an optional file and the environment.
fn load_config() -> Result<AppConfig> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&AppConfig::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables, e.g. NPS__SYNC__INTERVAL_SECS
        .add_source(
            config::Environment::with_prefix("NPS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    validate_config(&config.source).context("Invalid [source] configuration")?;
    validate_config(&config.sync).context("Invalid [sync] configuration")?;

    Ok(config)
}

fn log_dashboard(store: &RecordStore, aggregation: &AggregationConfig) {
    let records = store.current();
    let dashboard = AggregateMetrics::compute(&records, aggregation);

    let latest = dashboard.trend.last();
    let leader = dashboard.top_stores.first();
    info!(
        nps = dashboard.nps.score,
        responses = dashboard.nps.total,
        promoters = dashboard.nps.promoters,
        passives = dashboard.nps.passives,
        detractors = dashboard.nps.detractors,
        average_score = dashboard.nps.average_score,
        latest_day = ?latest.map(|p| p.date),
        latest_day_nps = latest.map(|p| p.nps),
        top_store = leader.map(|s| s.store_id.as_str()),
        top_store_nps = leader.map(|s| s.nps),
        "Dashboard recomputed"
    );

    for driver in &dashboard.drivers {
        if let Some(average) = driver.average {
            info!(driver = %driver.label, average, count = driver.count, "Driver average");
        }
    }

    let now = Utc::now();
    for alert in evaluate_alerts(&records, now, &AlertThresholds::default()) {
        match alert.severity {
            AlertSeverity::Critical | AlertSeverity::Warning => {
                warn!(kind = ?alert.kind, severity = ?alert.severity, "{}", alert.message)
            }
            AlertSeverity::Info => info!(kind = ?alert.kind, "{}", alert.message),
        }
    }

    for decline in detect_benchmark_drops(&records, now) {
        warn!(
            dimension = ?decline.dimension,
            key = %decline.key,
            current_nps = decline.current_nps,
            previous_nps = decline.previous_nps,
            delta = decline.delta,
            "NPS dropped against the previous 30 days"
        );
    }

    for category in worst_categories(&records, DEFAULT_WORST_CATEGORIES) {
        info!(
            category = %category.category,
            nps = category.summary.score,
            responses = category.summary.total,
            "Weak category"
        );
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
