// Framework bootstrap: logging, config, adapter wiring and the engine lifecycle.

use crate::frameworks::config::TrackConfig;
use crate::domain::ports::CacheStore;
use crate::interface_adapters::{
    FileCacheStore, HeadlessCanvas, HttpBackend, InMemoryCacheStore, SystemClock,
};
use crate::use_cases::{EngineEvent, EnginePorts, TrackEngine};

use std::future::Future;
use std::io::Result;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Wires the HTTP backend, cache, system clock and a headless canvas.
pub fn build_engine(config: &TrackConfig) -> Result<TrackEngine> {
    let backend = HttpBackend::new(
        config.api.base_url.clone(),
        config.request_timeout(),
        config.api.requestor_faction_id,
    )
    .map_err(|e| std::io::Error::other(format!("failed to initialize backend client: {e}")))?;
    tracing::debug!(
        base_url = %backend.base_url(),
        request_timeout_ms = config.api.request_timeout_ms,
        "backend client configured"
    );

    let cache: Arc<dyn CacheStore> = if config.cache.persist {
        tracing::debug!(cache_dir = %config.cache.dir.display(), "using file cache");
        Arc::new(FileCacheStore::new(config.cache.dir.clone()))
    } else {
        tracing::debug!("using in-memory cache");
        Arc::new(InMemoryCacheStore::new())
    };

    let settings = config.engine_settings();
    let canvas = HeadlessCanvas::new(settings.initial_view);
    let ports = EnginePorts {
        connectivity: Arc::new(backend.reachability()),
        backend: Arc::new(backend),
        cache,
        clock: Arc::new(SystemClock),
    };
    Ok(TrackEngine::new(settings, ports, Box::new(canvas)))
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::ViewChanged(view) => tracing::debug!(
            latitude = view.latitude,
            longitude = view.longitude,
            zoom = view.zoom,
            "view changed"
        ),
        EngineEvent::StatsChanged {
            unit_count,
            projectile_count,
        } => tracing::debug!(unit_count, projectile_count, "snapshot applied"),
        EngineEvent::Notice(notice) => tracing::info!(notice = notice.key(), "notice"),
    }
}

/// Runs the engine until `shutdown` resolves, logging events and overlay changes.
pub async fn run(config: TrackConfig, shutdown: impl Future<Output = ()>) -> Result<()> {
    let mut engine = build_engine(&config)?;
    let mut events = engine.core().events();
    let mut overlay = engine.core().overlay();

    engine.start().await;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event log lagging");
                }
                Err(RecvError::Closed) => break,
            },
            changed = overlay.changed() => {
                if changed.is_err() {
                    break;
                }
                match *overlay.borrow_and_update() {
                    Some(message) => tracing::warn!(overlay = message.key(), "live data unavailable"),
                    None => tracing::info!("live data available"),
                }
            }
        }
    }

    let removed = engine.shutdown().await;
    tracing::info!(removed, "shutdown complete");
    Ok(())
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = TrackConfig::load().inspect_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
    });
    let config = config.map_err(std::io::Error::other)?;
    tracing::info!(base_url = %config.api.base_url, "starting live track engine");

    run(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    })
    .await
}
