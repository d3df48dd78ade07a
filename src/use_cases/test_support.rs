use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::entities::{
    AmmoStatus, DetailFaction, DetailHealth, DetailPosition, DetailVision,
};
use crate::domain::ports::{
    CacheStore, Clock, Connectivity, MapCanvas, MarkerHandle, MarkerKind, TrackBackend,
};
use crate::domain::style::MarkerStyle;
use crate::domain::taxonomy::{MainCategory, UnitClass};
use crate::domain::{
    Faction, GeoBounds, LatLon, MapView, ProjectileKinematics, Snapshot, TrackError, UnitDetails,
    UnitKinematics,
};

pub(crate) fn unit(id: &str) -> UnitKinematics {
    UnitKinematics {
        id: id.to_string(),
        name: format!("unit {id}"),
        latitude: 42.5,
        longitude: 42.0,
        altitude: Some(1_000.0),
        heading: 90.0,
        speed_mps: 0.0,
        status: Some("Patrolling".to_string()),
        faction_id: Some(1),
        class: UnitClass {
            main: MainCategory::Airplane,
            subcategory: None,
            legacy_subcategory: None,
        },
        health: 100.0,
        ammo_percentage: 100.0,
        vision_range: 5_000.0,
        direction: (1.0, 0.0),
    }
}

pub(crate) fn projectile(id: &str, owner: &str) -> ProjectileKinematics {
    ProjectileKinematics {
        id: id.to_string(),
        latitude: 42.5,
        longitude: 42.0,
        heading: 45.0,
        speed_mps: 300.0,
        projectile_type: Some("Missile".to_string()),
        owner_unit_id: Some(owner.to_string()),
    }
}

pub(crate) fn snapshot_with_units(tick: u64, ids: &[&str]) -> Snapshot {
    Snapshot {
        tick,
        timestamp: format!("2024-01-01T00:00:{:02}Z", tick % 60),
        units: ids.iter().map(|id| unit(id)).collect(),
        projectiles: Vec::new(),
    }
}

pub(crate) fn faction(id: i64, color: &str) -> Faction {
    Faction {
        id,
        name: format!("faction {id}"),
        color: color.to_string(),
        allies: Vec::new(),
    }
}

pub(crate) fn details(id: &str) -> UnitDetails {
    UnitDetails {
        id: id.to_string(),
        name: format!("unit {id}"),
        category: "AIRPLANE".to_string(),
        subcategory: "FIGHTER".to_string(),
        status: "Patrolling".to_string(),
        position: DetailPosition {
            latitude: 42.5,
            longitude: 42.0,
            altitude: Some(1_000.0),
            heading: 90.0,
        },
        speed_mps: 0.0,
        health: DetailHealth {
            current: 100.0,
            maximum: 100.0,
            percentage: 100.0,
            armor: 10.0,
            is_destroyed: false,
            is_damaged: false,
        },
        faction: DetailFaction {
            id: 1,
            name: "faction 1".to_string(),
            color: "#ff0000".to_string(),
            is_ally: true,
            is_enemy: false,
        },
        vision: DetailVision {
            range_meters: 5_000.0,
            detection_range_meters: 8_000.0,
            visible_enemies: Vec::new(),
            visible_allies: Vec::new(),
            radar_range_meters: None,
        },
        weapons: Vec::new(),
        ammo: AmmoStatus {
            total_ammo_percentage: 100.0,
            total_rounds_remaining: 0,
            is_low_ammo: false,
            is_out_of_ammo: false,
        },
        ai_state: None,
        base_location: "Base".to_string(),
    }
}

#[derive(Default)]
struct Script {
    snapshots: VecDeque<Result<Snapshot, TrackError>>,
    default_snapshot: Option<Snapshot>,
    factions: VecDeque<Result<Vec<Faction>, TrackError>>,
    details: VecDeque<Result<UnitDetails, TrackError>>,
}

// Backend fake that replays queued results in order.
#[derive(Clone)]
pub(crate) struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
    details_gate: Arc<watch::Sender<bool>>,
    detail_calls: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            details_gate: Arc::new(gate),
            detail_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn push_snapshot(&self, result: Result<Snapshot, TrackError>) {
        let mut guard = self.script.lock().expect("script mutex poisoned");
        guard.snapshots.push_back(result);
    }

    // Served once the queue runs dry instead of a transport failure.
    pub(crate) fn set_default_snapshot(&self, snapshot: Snapshot) {
        let mut guard = self.script.lock().expect("script mutex poisoned");
        guard.default_snapshot = Some(snapshot);
    }

    pub(crate) fn push_factions(&self, result: Result<Vec<Faction>, TrackError>) {
        let mut guard = self.script.lock().expect("script mutex poisoned");
        guard.factions.push_back(result);
    }

    pub(crate) fn push_details(&self, result: Result<UnitDetails, TrackError>) {
        let mut guard = self.script.lock().expect("script mutex poisoned");
        guard.details.push_back(result);
    }

    // Detail fetches block until `release_details`.
    pub(crate) fn hold_details(&self) {
        self.details_gate.send_replace(true);
    }

    pub(crate) fn release_details(&self) {
        self.details_gate.send_replace(false);
    }

    pub(crate) fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

fn unreachable_backend() -> TrackError {
    TrackError::TransportUnavailable("script exhausted".to_string())
}

#[async_trait]
impl TrackBackend for ScriptedBackend {
    async fn fetch_snapshot(&self) -> Result<Snapshot, TrackError> {
        let mut guard = self.script.lock().expect("script mutex poisoned");
        match guard.snapshots.pop_front() {
            Some(result) => result,
            None => guard
                .default_snapshot
                .clone()
                .ok_or_else(unreachable_backend),
        }
    }

    async fn fetch_factions(&self) -> Result<Vec<Faction>, TrackError> {
        let mut guard = self.script.lock().expect("script mutex poisoned");
        guard
            .factions
            .pop_front()
            .unwrap_or_else(|| Err(unreachable_backend()))
    }

    async fn fetch_unit_details(&self, unit_id: &str) -> Result<UnitDetails, TrackError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.details_gate.subscribe();
        gate.wait_for(|held| !*held)
            .await
            .expect("details gate open");

        let mut guard = self.script.lock().expect("script mutex poisoned");
        guard
            .details
            .pop_front()
            .unwrap_or_else(|| Ok(details(unit_id)))
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct CacheFailures {
    pub get: bool,
    pub set: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
    failures: CacheFailures,
}

impl RecordingCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            failures: CacheFailures::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: CacheFailures) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn raw(&self, key: &str) -> Option<String> {
        let guard = self.entries.lock().expect("cache mutex poisoned");
        guard.get(key).cloned()
    }

    pub(crate) fn insert_raw(&self, key: &str, value: &str) {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, TrackError> {
        if self.failures.get {
            return Err(TrackError::Cache("get failed".to_string()));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), TrackError> {
        if self.failures.set {
            return Err(TrackError::Cache("set failed".to_string()));
        }
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.insert(key.to_string(), value);
        Ok(())
    }
}

// Clock that only moves when a test says so.
#[derive(Clone)]
pub(crate) struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub(crate) fn new(now_ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now_ms)))
    }

    pub(crate) fn advance(&self, delta_ms: u64) {
        self.0.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub(crate) struct SwitchConnectivity(Arc<AtomicBool>);

impl SwitchConnectivity {
    pub(crate) fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for SwitchConnectivity {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct RecordedMarker {
    kind: MarkerKind,
    entity_id: String,
    position: LatLon,
    style: MarkerStyle,
}

#[derive(Default)]
struct CanvasState {
    next_handle: u64,
    live: HashMap<MarkerHandle, RecordedMarker>,
    removed: Vec<MarkerHandle>,
    adds: HashMap<String, usize>,
    view: Option<MapView>,
}

impl CanvasState {
    // Unit markers win over projectiles sharing the same id.
    fn find(&self, entity_id: &str) -> Option<(MarkerHandle, &RecordedMarker)> {
        let mut matches = self
            .live
            .iter()
            .filter(|(_, marker)| marker.entity_id == entity_id);
        let first = matches.next()?;
        let unit = std::iter::once(first)
            .chain(matches)
            .find(|(_, marker)| marker.kind == MarkerKind::Unit);
        let (handle, marker) = unit.unwrap_or(first);
        Some((*handle, marker))
    }
}

// Canvas fake recording every call; clones share state.
#[derive(Clone)]
pub(crate) struct RecordingCanvas {
    state: Arc<Mutex<CanvasState>>,
}

impl RecordingCanvas {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CanvasState::default())),
        }
    }

    pub(crate) fn handle_of(&self, entity_id: &str) -> Option<MarkerHandle> {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard.find(entity_id).map(|(handle, _)| handle)
    }

    pub(crate) fn adds_for(&self, entity_id: &str) -> usize {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard.adds.get(entity_id).copied().unwrap_or(0)
    }

    pub(crate) fn was_removed(&self, handle: MarkerHandle) -> bool {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard.removed.contains(&handle)
    }

    pub(crate) fn live_markers(&self) -> usize {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard.live.len()
    }

    pub(crate) fn position_of(&self, entity_id: &str) -> Option<LatLon> {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard.find(entity_id).map(|(_, marker)| marker.position)
    }

    pub(crate) fn class_of(&self, entity_id: &str) -> Option<String> {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard
            .find(entity_id)
            .map(|(_, marker)| marker.style.class_name())
    }

    pub(crate) fn border_of(&self, entity_id: &str) -> Option<String> {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard
            .find(entity_id)
            .and_then(|(_, marker)| marker.style.border_color.clone())
    }

    pub(crate) fn view(&self) -> Option<MapView> {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard.view
    }
}

impl MapCanvas for RecordingCanvas {
    fn add_marker(
        &mut self,
        kind: MarkerKind,
        entity_id: &str,
        position: LatLon,
        style: &MarkerStyle,
    ) -> MarkerHandle {
        let mut guard = self.state.lock().expect("canvas mutex poisoned");
        guard.next_handle += 1;
        let handle = MarkerHandle(guard.next_handle);
        guard.live.insert(
            handle,
            RecordedMarker {
                kind,
                entity_id: entity_id.to_string(),
                position,
                style: style.clone(),
            },
        );
        *guard.adds.entry(entity_id.to_string()).or_insert(0) += 1;
        handle
    }

    fn move_marker(&mut self, handle: MarkerHandle, position: LatLon) {
        let mut guard = self.state.lock().expect("canvas mutex poisoned");
        if let Some(marker) = guard.live.get_mut(&handle) {
            marker.position = position;
        }
    }

    fn restyle_marker(&mut self, handle: MarkerHandle, style: &MarkerStyle) {
        let mut guard = self.state.lock().expect("canvas mutex poisoned");
        if let Some(marker) = guard.live.get_mut(&handle) {
            marker.style = style.clone();
        }
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        let mut guard = self.state.lock().expect("canvas mutex poisoned");
        if guard.live.remove(&handle).is_some() {
            guard.removed.push(handle);
        }
    }

    fn set_view(&mut self, view: MapView) {
        let mut guard = self.state.lock().expect("canvas mutex poisoned");
        guard.view = Some(view);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        let mut guard = self.state.lock().expect("canvas mutex poisoned");
        let center = bounds.center();
        let zoom = guard.view.map_or(0.0, |view| view.zoom);
        guard.view = Some(MapView {
            latitude: center.latitude,
            longitude: center.longitude,
            zoom,
        });
    }

    fn current_view(&self) -> MapView {
        let guard = self.state.lock().expect("canvas mutex poisoned");
        guard.view.unwrap_or(MapView {
            latitude: 0.0,
            longitude: 0.0,
            zoom: 0.0,
        })
    }
}
