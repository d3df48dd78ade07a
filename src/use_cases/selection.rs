// Selection session: at most one selected unit plus sequence-stamped detail
// requests. A response applies only while its sequence is still current.

use crate::domain::{TrackError, UnitDetails};
use tracing::debug;

pub const UNIT_DETAILS_ERROR: &str = "UNIT_DETAILS_ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Detail fetch stamped with the sequence current when it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub unit_id: String,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    // Superseded by a later selection, deselection or refresh.
    Discarded,
}

/// UI-facing copy of the session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionView {
    pub phase: SelectionPhase,
    pub selected_id: Option<String>,
    pub loading: bool,
    pub details: Option<UnitDetails>,
    pub error_key: Option<&'static str>,
}

impl SelectionView {
    pub fn idle() -> Self {
        Self {
            phase: SelectionPhase::Idle,
            selected_id: None,
            loading: false,
            details: None,
            error_key: None,
        }
    }
}

#[derive(Debug)]
pub struct SelectionSession {
    suppression_window_ms: u64,
    suppress_background_until_ms: u64,
    selected_id: Option<String>,
    sequence: u64,
    phase: SelectionPhase,
    loading: bool,
    details: Option<UnitDetails>,
    error_key: Option<&'static str>,
}

impl SelectionSession {
    pub fn new(suppression_window_ms: u64) -> Self {
        Self {
            suppression_window_ms,
            suppress_background_until_ms: 0,
            selected_id: None,
            sequence: 0,
            phase: SelectionPhase::Idle,
            loading: false,
            details: None,
            error_key: None,
        }
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn view(&self) -> SelectionView {
        SelectionView {
            phase: self.phase,
            selected_id: self.selected_id.clone(),
            loading: self.loading,
            details: self.details.clone(),
            error_key: self.error_key,
        }
    }

    /// Marker click. Selecting the current unit again deselects it.
    pub fn select(&mut self, unit_id: &str, now_ms: u64) -> Option<DetailRequest> {
        // The same click bubbles to the map background; ignore that echo.
        self.suppress_background_until_ms = now_ms.saturating_add(self.suppression_window_ms);

        if self.selected_id.as_deref() == Some(unit_id) {
            self.deselect();
            return None;
        }

        self.selected_id = Some(unit_id.to_string());
        self.details = None;
        self.error_key = None;
        self.loading = true;
        self.phase = SelectionPhase::Loading;
        Some(self.next_request(unit_id.to_string()))
    }

    /// Refresh after a new snapshot without showing a loading state.
    ///
    /// Errored sessions are left alone: failed lookups are not retried.
    pub fn refresh_quietly(&mut self) -> Option<DetailRequest> {
        if self.phase == SelectionPhase::Errored {
            return None;
        }
        let unit_id = self.selected_id.clone()?;
        Some(self.next_request(unit_id))
    }

    pub fn deselect(&mut self) {
        self.sequence += 1;
        self.selected_id = None;
        self.details = None;
        self.loading = false;
        self.error_key = None;
        self.phase = SelectionPhase::Idle;
    }

    /// Map background click. Returns true if it deselected.
    pub fn background_click(&mut self, now_ms: u64) -> bool {
        if now_ms < self.suppress_background_until_ms {
            return false;
        }
        if self.selected_id.is_none() {
            return false;
        }
        self.deselect();
        true
    }

    pub fn complete(
        &mut self,
        request: &DetailRequest,
        result: Result<UnitDetails, TrackError>,
    ) -> Completion {
        if request.sequence != self.sequence
            || self.selected_id.as_deref() != Some(request.unit_id.as_str())
        {
            debug!(
                unit_id = %request.unit_id,
                request_sequence = request.sequence,
                current_sequence = self.sequence,
                "discarding stale unit details"
            );
            return Completion::Discarded;
        }

        self.loading = false;
        match result {
            Ok(details) => {
                self.details = Some(details);
                self.error_key = None;
                self.phase = SelectionPhase::Loaded;
            }
            Err(_) => {
                self.error_key = Some(UNIT_DETAILS_ERROR);
                self.phase = SelectionPhase::Errored;
            }
        }
        Completion::Applied
    }

    fn next_request(&mut self, unit_id: String) -> DetailRequest {
        self.sequence += 1;
        DetailRequest {
            unit_id,
            sequence: self.sequence,
        }
    }
}
