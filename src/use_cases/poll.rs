// Poll loop: fetches a snapshot on a fixed interval and feeds the store.

use crate::domain::{Snapshot, TrackError};
use crate::use_cases::engine::EngineCore;
use crate::use_cases::source::Fetched;
use crate::use_cases::types::OverlayMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// What one poll produced, as observed by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Live { unit_count: usize },
    // Transport failed, last good snapshot applied.
    Cached { unit_count: usize },
    // Nothing to show while offline; not a hard error.
    Degraded,
    Failed(TrackError),
}

/// Overlay message for a poll result, given current connectivity.
pub fn overlay_for(
    result: &Result<Fetched<Snapshot>, TrackError>,
    online: bool,
) -> Option<OverlayMessage> {
    match result {
        Ok(fetched) if fetched.value.units.is_empty() && !online => {
            Some(OverlayMessage::OfflineNoCache)
        }
        Ok(_) => None,
        Err(err) if !online || err.is_offline() => Some(OverlayMessage::OfflineFailed),
        Err(_) => Some(OverlayMessage::ErrorLoading),
    }
}

pub async fn poll_task(
    core: Arc<EngineCore>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // First tick fires immediately: fetch once, then every interval.
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !*shutdown.borrow() {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = interval.tick() => {
                core.poll_once().await;
            }
        }
    }
    debug!("poll loop stopped");
}
