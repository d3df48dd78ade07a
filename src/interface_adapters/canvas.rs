// Headless map canvas: keeps marker state in memory and traces every call.
// Used by the binary and integration tests where no real map is attached.

use crate::domain::ports::{MapCanvas, MarkerHandle, MarkerKind};
use crate::domain::style::MarkerStyle;
use crate::domain::{GeoBounds, LatLon, MapView};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub kind: MarkerKind,
    pub entity_id: String,
    pub position: LatLon,
    pub style: MarkerStyle,
}

#[derive(Debug)]
struct CanvasState {
    next_handle: u64,
    markers: HashMap<MarkerHandle, HeadlessMarker>,
    view: MapView,
}

/// In-memory canvas; clones share the same marker table.
#[derive(Debug, Clone)]
pub struct HeadlessCanvas {
    state: Arc<Mutex<CanvasState>>,
}

impl HeadlessCanvas {
    pub fn new(view: MapView) -> Self {
        Self {
            state: Arc::new(Mutex::new(CanvasState {
                next_handle: 0,
                markers: HashMap::new(),
                view,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CanvasState> {
        // Marker bookkeeping stays consistent across a panicked holder.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn marker_count(&self) -> usize {
        self.lock().markers.len()
    }

    pub fn markers_of(&self, kind: MarkerKind) -> Vec<HeadlessMarker> {
        self.lock()
            .markers
            .values()
            .filter(|marker| marker.kind == kind)
            .cloned()
            .collect()
    }

    pub fn marker_for(&self, kind: MarkerKind, entity_id: &str) -> Option<HeadlessMarker> {
        self.lock()
            .markers
            .values()
            .find(|marker| marker.kind == kind && marker.entity_id == entity_id)
            .cloned()
    }
}

impl MapCanvas for HeadlessCanvas {
    fn add_marker(
        &mut self,
        kind: MarkerKind,
        entity_id: &str,
        position: LatLon,
        style: &MarkerStyle,
    ) -> MarkerHandle {
        let mut state = self.lock();
        state.next_handle += 1;
        let handle = MarkerHandle(state.next_handle);
        state.markers.insert(
            handle,
            HeadlessMarker {
                kind,
                entity_id: entity_id.to_string(),
                position,
                style: style.clone(),
            },
        );
        trace!(?kind, entity_id, class = %style.class_name(), "marker added");
        handle
    }

    fn move_marker(&mut self, handle: MarkerHandle, position: LatLon) {
        if let Some(marker) = self.lock().markers.get_mut(&handle) {
            marker.position = position;
        }
    }

    fn restyle_marker(&mut self, handle: MarkerHandle, style: &MarkerStyle) {
        if let Some(marker) = self.lock().markers.get_mut(&handle) {
            trace!(entity_id = %marker.entity_id, class = %style.class_name(), "marker restyled");
            marker.style = style.clone();
        }
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if let Some(marker) = self.lock().markers.remove(&handle) {
            trace!(entity_id = %marker.entity_id, "marker removed");
        }
    }

    fn set_view(&mut self, view: MapView) {
        debug!(latitude = view.latitude, longitude = view.longitude, zoom = view.zoom, "view set");
        self.lock().view = view;
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        let center = bounds.center();
        let mut state = self.lock();
        state.view.latitude = center.latitude;
        state.view.longitude = center.longitude;
        debug!(
            latitude = center.latitude,
            longitude = center.longitude,
            "view fitted to bounds"
        );
    }

    fn current_view(&self) -> MapView {
        self.lock().view
    }
}
