// Engine wiring: store, sources, reconciler and selection behind one shared core,
// driven by the poll and render tasks.

use crate::domain::ports::{CacheStore, Clock, Connectivity, MapCanvas, TrackBackend};
use crate::domain::{FactionTable, MapView, Snapshot, TrackError};
use crate::use_cases::poll::{PollOutcome, overlay_for, poll_task};
use crate::use_cases::reconciler::{MarkerReconciler, ReconcileContext, ReconcileReport};
use crate::use_cases::render::{render_elapsed, render_task};
use crate::use_cases::selection::{Completion, DetailRequest, SelectionSession, SelectionView};
use crate::use_cases::source::{DetailSource, FactionSource, SnapshotSource};
use crate::use_cases::store::EntityStore;
use crate::use_cases::types::{EngineEvent, EngineSettings, Notice, OverlayMessage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// External collaborators the engine depends on.
#[derive(Clone)]
pub struct EnginePorts {
    pub backend: Arc<dyn TrackBackend>,
    pub cache: Arc<dyn CacheStore>,
    pub connectivity: Arc<dyn Connectivity>,
    pub clock: Arc<dyn Clock>,
}

/// Shared engine state.
///
/// Lock discipline: at most one of `factions`, `reconciler`, `selection` is
/// held at a time, and never across a network await.
pub struct EngineCore {
    settings: EngineSettings,
    connectivity: Arc<dyn Connectivity>,
    clock: Arc<dyn Clock>,
    snapshots: SnapshotSource,
    faction_source: FactionSource,
    detail_source: DetailSource,
    store: EntityStore,
    factions: RwLock<Arc<FactionTable>>,
    reconciler: Mutex<MarkerReconciler>,
    selection: Mutex<SelectionSession>,
    was_online: AtomicBool,
    events_tx: broadcast::Sender<EngineEvent>,
    overlay_tx: watch::Sender<Option<OverlayMessage>>,
    selection_tx: watch::Sender<SelectionView>,
}

impl EngineCore {
    pub fn new(settings: EngineSettings, ports: EnginePorts, canvas: Box<dyn MapCanvas>) -> Self {
        let (events_tx, _events_rx) = broadcast::channel(settings.event_capacity.max(1));
        let (overlay_tx, _overlay_rx) = watch::channel(None);
        let (selection_tx, _selection_rx) = watch::channel(SelectionView::idle());
        let suppression_ms = settings.click_suppression.as_millis() as u64;

        Self {
            snapshots: SnapshotSource::new(ports.backend.clone(), ports.cache.clone()),
            faction_source: FactionSource::new(ports.backend.clone(), ports.cache.clone()),
            detail_source: DetailSource::new(ports.backend, ports.cache),
            store: EntityStore::new(ports.clock.now_millis()),
            factions: RwLock::new(Arc::new(FactionTable::default())),
            reconciler: Mutex::new(MarkerReconciler::new(canvas)),
            selection: Mutex::new(SelectionSession::new(suppression_ms)),
            was_online: AtomicBool::new(true),
            connectivity: ports.connectivity,
            clock: ports.clock,
            settings,
            events_tx,
            overlay_tx,
            selection_tx,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events_tx.subscribe()
    }

    pub fn overlay(&self) -> watch::Receiver<Option<OverlayMessage>> {
        self.overlay_tx.subscribe()
    }

    pub fn selection(&self) -> watch::Receiver<SelectionView> {
        self.selection_tx.subscribe()
    }

    pub fn selection_view(&self) -> SelectionView {
        self.selection_tx.borrow().clone()
    }

    pub fn overlay_message(&self) -> Option<OverlayMessage> {
        *self.overlay_tx.borrow()
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine; events are informational.
        let _ = self.events_tx.send(event);
    }

    fn publish_selection(&self, session: &SelectionSession) {
        self.selection_tx.send_replace(session.view());
    }

    /// Positions the canvas at the configured view/bounds and reports it.
    pub async fn init_view(&self) -> MapView {
        let view = {
            let mut reconciler = self.reconciler.lock().await;
            let canvas = reconciler.canvas_mut();
            canvas.set_view(self.settings.initial_view);
            canvas.fit_bounds(self.settings.initial_bounds);
            canvas.current_view()
        };
        self.emit(EngineEvent::ViewChanged(view));
        view
    }

    /// Canvas reported a settled viewport after pan/zoom.
    pub fn view_settled(&self, view: MapView) {
        self.emit(EngineEvent::ViewChanged(view));
    }

    pub async fn load_factions(&self) -> Result<usize, TrackError> {
        match self.faction_source.fetch_factions().await {
            Ok(fetched) => {
                let cached = fetched.is_cached();
                let table = FactionTable::new(fetched.value);
                let count = table.len();
                *self.factions.write().await = Arc::new(table);
                info!(count, cached, "factions loaded");
                self.emit(EngineEvent::Notice(if cached {
                    Notice::CachedFactions
                } else {
                    Notice::FactionsLoaded
                }));
                // Markers drawn before factions arrived need their border colour.
                self.restyle_markers().await;
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "failed to load factions");
                self.emit(EngineEvent::Notice(Notice::FailedFactions));
                Err(e)
            }
        }
    }

    fn track_connectivity(&self, online: bool) {
        let was_online = self.was_online.swap(online, Ordering::SeqCst);
        if was_online != online {
            info!(online, "connectivity changed");
            self.emit(EngineEvent::Notice(if online {
                Notice::BackOnline
            } else {
                Notice::Offline
            }));
        }
    }

    /// One poll: fetch (with cache fallback), update the overlay, apply.
    pub async fn poll_once(self: &Arc<Self>) -> PollOutcome {
        let result = self.snapshots.fetch_snapshot().await;
        let online = self.connectivity.is_online();
        self.track_connectivity(online);

        let overlay = overlay_for(&result, online);
        self.overlay_tx.send_replace(overlay);

        match result {
            Ok(fetched) => {
                let cached = fetched.is_cached();
                let unit_count = fetched.value.units.len();
                debug!(tick = fetched.value.tick, unit_count, cached, "snapshot received");
                self.apply_snapshot(fetched.value).await;
                if overlay == Some(OverlayMessage::OfflineNoCache) {
                    PollOutcome::Degraded
                } else if cached {
                    PollOutcome::Cached { unit_count }
                } else {
                    PollOutcome::Live { unit_count }
                }
            }
            Err(err) => {
                warn!(error = %err, offline = err.is_offline(), "snapshot poll failed");
                PollOutcome::Failed(err)
            }
        }
    }

    /// Replaces the store, reconciles selection, and renders at elapsed 0.
    pub async fn apply_snapshot(self: &Arc<Self>, snapshot: Snapshot) -> ReconcileReport {
        let frame = self.store.apply_snapshot(snapshot, self.clock.now_millis());
        self.emit(EngineEvent::StatsChanged {
            unit_count: frame.unit_count(),
            projectile_count: frame.projectile_count(),
        });

        let refresh = {
            let mut selection = self.selection.lock().await;
            let still_present = selection.selected_id().map(|id| frame.contains_unit(id));
            match still_present {
                Some(false) => {
                    debug!("selected unit left the snapshot; clearing selection");
                    selection.deselect();
                    self.publish_selection(&selection);
                    None
                }
                // Marker is still on screen: refresh without a loading flicker.
                Some(true) => selection.refresh_quietly(),
                None => None,
            }
        };
        if let Some(request) = refresh {
            self.spawn_detail_fetch(request);
        }

        self.render_latest(Some(0.0)).await
    }

    /// Elapsed seconds the next frame would extrapolate by.
    pub fn current_elapsed(&self) -> f64 {
        render_elapsed(
            self.clock.now_millis(),
            self.store.current().received_at_ms,
            self.settings.interpolation_cap_secs(),
        )
    }

    /// One animation frame.
    pub async fn render_frame(&self) -> ReconcileReport {
        self.render_latest(None).await
    }

    /// Reconciles the newest frame. The frame is read under the reconciler
    /// lock so passes never go backwards in time; `fixed_elapsed` overrides
    /// the extrapolation (0 right after a snapshot lands).
    async fn render_latest(&self, fixed_elapsed: Option<f64>) -> ReconcileReport {
        let selected = self
            .selection
            .lock()
            .await
            .selected_id()
            .map(str::to_string);
        let factions = self.factions.read().await.clone();

        let (report, tick) = {
            let mut reconciler = self.reconciler.lock().await;
            let frame = self.store.current();
            let elapsed = fixed_elapsed.unwrap_or_else(|| {
                render_elapsed(
                    self.clock.now_millis(),
                    frame.received_at_ms,
                    self.settings.interpolation_cap_secs(),
                )
            });
            let report = reconciler.reconcile(
                &frame,
                elapsed,
                ReconcileContext {
                    selected_id: selected.as_deref(),
                    factions: &factions,
                    icons: &self.settings.icons,
                },
            );
            (report, frame.tick)
        };

        if report.created > 0 || report.removed > 0 {
            debug!(
                created = report.created,
                removed = report.removed,
                tick,
                "markers reconciled"
            );
        }

        if report.selected_removed {
            let mut selection = self.selection.lock().await;
            // Only clear if nobody re-selected in between.
            if selection.selected_id() == selected.as_deref() {
                selection.deselect();
                self.publish_selection(&selection);
            }
        }
        report
    }

    async fn restyle_markers(&self) -> usize {
        let selected = self
            .selection
            .lock()
            .await
            .selected_id()
            .map(str::to_string);
        let factions = self.factions.read().await.clone();

        let mut reconciler = self.reconciler.lock().await;
        let frame = self.store.current();
        reconciler.restyle_units(
            &frame,
            ReconcileContext {
                selected_id: selected.as_deref(),
                factions: &factions,
                icons: &self.settings.icons,
            },
        )
    }

    /// Marker click on a unit. Returns the detail request if one was issued.
    pub async fn marker_clicked(self: &Arc<Self>, unit_id: &str) -> Option<DetailRequest> {
        let now = self.clock.now_millis();
        let request = {
            let mut selection = self.selection.lock().await;
            let request = selection.select(unit_id, now);
            self.publish_selection(&selection);
            request
        };
        debug!(unit_id, selected = request.is_some(), "unit marker clicked");

        self.restyle_markers().await;
        if let Some(request) = &request {
            self.spawn_detail_fetch(request.clone());
        }
        request
    }

    /// Click on the map background. Returns true if it cleared a selection.
    pub async fn background_clicked(&self) -> bool {
        let now = self.clock.now_millis();
        let cleared = {
            let mut selection = self.selection.lock().await;
            let cleared = selection.background_click(now);
            if cleared {
                self.publish_selection(&selection);
            }
            cleared
        };
        if cleared {
            self.restyle_markers().await;
        }
        cleared
    }

    pub async fn deselect(&self) {
        {
            let mut selection = self.selection.lock().await;
            selection.deselect();
            self.publish_selection(&selection);
        }
        self.restyle_markers().await;
    }

    fn spawn_detail_fetch(self: &Arc<Self>, request: DetailRequest) {
        let core = Arc::clone(self);
        tokio::spawn(async move {
            core.run_detail_request(request).await;
        });
    }

    /// Fetches details for `request` and applies them if still current.
    pub async fn run_detail_request(&self, request: DetailRequest) -> Completion {
        let result = self
            .detail_source
            .fetch_unit_details(&request.unit_id)
            .await
            .map(|fetched| fetched.value);
        if let Err(e) = &result {
            warn!(error = %e, "unit details fetch failed");
        }

        let mut selection = self.selection.lock().await;
        let completion = selection.complete(&request, result);
        if completion == Completion::Applied {
            self.publish_selection(&selection);
        }
        completion
    }

    pub async fn clear_markers(&self) -> usize {
        self.reconciler.lock().await.clear()
    }
}

/// Running engine: the shared core plus its poll/render tasks.
pub struct TrackEngine {
    core: Arc<EngineCore>,
    shutdown_tx: watch::Sender<bool>,
    loops: Vec<JoinHandle<()>>,
    faction_load: Option<JoinHandle<()>>,
}

impl TrackEngine {
    pub fn new(settings: EngineSettings, ports: EnginePorts, canvas: Box<dyn MapCanvas>) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            core: Arc::new(EngineCore::new(settings, ports, canvas)),
            shutdown_tx,
            loops: Vec::new(),
            faction_load: None,
        }
    }

    pub fn core(&self) -> &Arc<EngineCore> {
        &self.core
    }

    pub fn is_running(&self) -> bool {
        !self.loops.is_empty()
    }

    /// Positions the map, loads factions and spawns the poll and render loops.
    pub async fn start(&mut self) {
        if self.is_running() {
            warn!("engine already started");
            return;
        }

        self.core.init_view().await;

        let core = self.core.clone();
        self.faction_load = Some(tokio::spawn(async move {
            // Failure is already logged and surfaced as a notice.
            let _ = core.load_factions().await;
        }));

        let settings = self.core.settings();
        self.loops.push(tokio::spawn(poll_task(
            self.core.clone(),
            settings.poll_interval,
            self.shutdown_tx.subscribe(),
        )));
        self.loops.push(tokio::spawn(render_task(
            self.core.clone(),
            settings.frame_interval,
            self.shutdown_tx.subscribe(),
        )));

        info!(
            poll_interval_ms = settings.poll_interval.as_millis() as u64,
            frame_interval_ms = settings.frame_interval.as_millis() as u64,
            "engine started"
        );
    }

    /// Stops both loops, waits for them, then removes every marker.
    pub async fn shutdown(mut self) -> usize {
        self.shutdown_tx.send_replace(true);

        if let Some(faction_load) = self.faction_load.take() {
            faction_load.abort();
        }
        for task in self.loops.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "engine task ended abnormally");
            }
        }

        let removed = self.core.clear_markers().await;
        info!(removed, "engine stopped");
        removed
    }
}
