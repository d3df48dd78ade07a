mod support;

use live_track::TrackConfig;
use live_track::domain::MapView;
use live_track::domain::ports::MarkerKind;
use live_track::interface_adapters::{FileCacheStore, HeadlessCanvas, HttpBackend, SystemClock};
use live_track::use_cases::{
    EngineEvent, EnginePorts, EngineSettings, Notice, SelectionPhase, TrackEngine,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use support::{MockBackend, eventually, snapshot_json, temp_cache_dir};

fn settings() -> EngineSettings {
    EngineSettings {
        poll_interval: Duration::from_millis(50),
        frame_interval: Duration::from_millis(10),
        ..EngineSettings::default()
    }
}

fn engine(base_url: &str, cache_dir: &Path) -> (TrackEngine, HeadlessCanvas) {
    let backend =
        HttpBackend::new(base_url, Duration::from_millis(500), Some(1)).expect("backend client");
    let canvas = HeadlessCanvas::new(MapView {
        latitude: 0.0,
        longitude: 0.0,
        zoom: 3.0,
    });
    let ports = EnginePorts {
        connectivity: Arc::new(backend.reachability()),
        backend: Arc::new(backend),
        cache: Arc::new(FileCacheStore::new(cache_dir)),
        clock: Arc::new(SystemClock),
    };
    let engine = TrackEngine::new(settings(), ports, Box::new(canvas.clone()));
    (engine, canvas)
}

#[tokio::test]
async fn live_snapshots_become_markers_and_follow_updates() {
    let mock = MockBackend::start().await;
    let cache_dir = temp_cache_dir();
    let (mut engine, canvas) = engine(&mock.base_url, &cache_dir);
    let mut events = engine.core().events();

    engine.start().await;
    assert!(eventually(|| canvas.markers_of(MarkerKind::Unit).len() == 2).await);
    assert_eq!(canvas.markers_of(MarkerKind::Projectile).len(), 1);

    mock.set_snapshot(snapshot_json(2, &["bravo", "charlie", "delta"]));
    assert!(eventually(|| canvas.marker_for(MarkerKind::Unit, "delta").is_some()).await);
    assert!(canvas.marker_for(MarkerKind::Unit, "alpha").is_none());

    // Factions arrive asynchronously and recolour markers.
    assert!(
        eventually(|| {
            canvas
                .marker_for(MarkerKind::Unit, "bravo")
                .and_then(|m| m.style.border_color)
                .is_some_and(|color| color == "#0000FF")
        })
        .await
    );

    let mut saw_view = false;
    let mut saw_factions = false;
    while let Ok(event) = events.try_recv() {
        saw_view |= matches!(event, EngineEvent::ViewChanged(_));
        saw_factions |= event == EngineEvent::Notice(Notice::FactionsLoaded);
    }
    assert!(saw_view);
    assert!(saw_factions);

    let removed = engine.shutdown().await;
    assert_eq!(removed, 4);
    assert_eq!(canvas.marker_count(), 0);
    let _ = std::fs::remove_dir_all(&cache_dir);
}

#[tokio::test]
async fn cached_snapshot_keeps_the_map_populated_across_restarts() {
    let mock = MockBackend::start().await;
    let cache_dir = temp_cache_dir();

    let (mut first, canvas) = engine(&mock.base_url, &cache_dir);
    first.start().await;
    assert!(eventually(|| canvas.markers_of(MarkerKind::Unit).len() == 2).await);
    first.shutdown().await;

    mock.fail_with(500);
    let (mut second, canvas) = engine(&mock.base_url, &cache_dir);
    let overlay = second.core().overlay();
    second.start().await;

    assert!(eventually(|| canvas.markers_of(MarkerKind::Unit).len() == 2).await);
    assert!(mock.snapshot_requests() >= 2);
    assert_eq!(*overlay.borrow(), None);

    second.shutdown().await;
    let _ = std::fs::remove_dir_all(&cache_dir);
}

#[tokio::test]
async fn failing_backend_without_cache_raises_overlay() {
    let mock = MockBackend::start().await;
    mock.fail_with(500);
    let cache_dir = temp_cache_dir();
    let (mut engine, canvas) = engine(&mock.base_url, &cache_dir);
    let mut overlay = engine.core().overlay();

    engine.start().await;
    tokio::time::timeout(Duration::from_secs(2), overlay.wait_for(|m| m.is_some()))
        .await
        .expect("overlay raised in time")
        .expect("overlay channel open");

    assert_eq!(
        engine.core().overlay_message().map(|m| m.key()),
        Some("ERROR_LOADING")
    );
    assert_eq!(canvas.marker_count(), 0);
    engine.shutdown().await;
}

#[tokio::test]
async fn clicking_a_marker_loads_its_details() {
    let mock = MockBackend::start().await;
    let cache_dir = temp_cache_dir();
    let (mut engine, canvas) = engine(&mock.base_url, &cache_dir);
    engine.start().await;
    assert!(eventually(|| canvas.marker_for(MarkerKind::Unit, "alpha").is_some()).await);

    let mut selection = engine.core().selection();
    engine.core().marker_clicked("alpha").await.expect("detail request");
    tokio::time::timeout(
        Duration::from_secs(2),
        selection.wait_for(|view| view.phase == SelectionPhase::Loaded),
    )
    .await
    .expect("details loaded in time")
    .expect("selection channel open");

    let view = engine.core().selection_view();
    assert_eq!(view.details.map(|d| d.base_location), Some("Kutaisi".to_string()));
    let class = canvas
        .marker_for(MarkerKind::Unit, "alpha")
        .map(|m| m.style.class_name())
        .expect("alpha marker");
    assert!(class.contains("map-unit--selected"));
    assert!(
        mock.detail_queries()
            .iter()
            .all(|(_, query)| query.get("requestorFactionId").map(String::as_str) == Some("1"))
    );

    engine.shutdown().await;
    let _ = std::fs::remove_dir_all(&cache_dir);
}

#[tokio::test]
async fn run_stops_when_shutdown_resolves() {
    let mock = MockBackend::start().await;
    let cache_dir = temp_cache_dir();
    let mut config = TrackConfig::default();
    config.apply_overrides(|key| match key {
        "LIVE_TRACK_API_URL" => Some(mock.base_url.clone()),
        "LIVE_TRACK_POLL_INTERVAL_MS" => Some("50".to_string()),
        "LIVE_TRACK_CACHE_DIR" => Some(cache_dir.display().to_string()),
        _ => None,
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        live_track::run(config, tokio::time::sleep(Duration::from_millis(200))),
    )
    .await
    .expect("run returned in time");

    assert!(result.is_ok());
    assert!(mock.snapshot_requests() >= 1);
    let _ = std::fs::remove_dir_all(&cache_dir);
}

#[tokio::test]
async fn in_memory_cache_leaves_no_files_behind() {
    let mock = MockBackend::start().await;
    let cache_dir = temp_cache_dir();
    let mut config = TrackConfig::default();
    config.apply_overrides(|key| match key {
        "LIVE_TRACK_API_URL" => Some(mock.base_url.clone()),
        "LIVE_TRACK_POLL_INTERVAL_MS" => Some("50".to_string()),
        "LIVE_TRACK_CACHE_DIR" => Some(cache_dir.display().to_string()),
        "LIVE_TRACK_CACHE_PERSIST" => Some("false".to_string()),
        _ => None,
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        live_track::run(config, tokio::time::sleep(Duration::from_millis(200))),
    )
    .await
    .expect("run returned in time");

    assert!(result.is_ok());
    assert!(mock.snapshot_requests() >= 1);
    assert!(!cache_dir.exists());
}
