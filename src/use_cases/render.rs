// Render loop: one reconciliation pass per animation frame.

use crate::use_cases::engine::EngineCore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Seconds since the last snapshot, clamped to `[0, cap_secs]`.
///
/// The cap bounds drift when snapshots stop arriving; motion continues up to
/// the cap instead of freezing.
pub fn render_elapsed(now_ms: u64, last_snapshot_ms: u64, cap_secs: f64) -> f64 {
    let raw = now_ms.saturating_sub(last_snapshot_ms) as f64 / 1000.0;
    raw.min(cap_secs.max(0.0))
}

pub async fn render_task(
    core: Arc<EngineCore>,
    frame_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(frame_interval);
    // A late frame is simply dropped; the next one extrapolates from scratch.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !*shutdown.borrow() {
        tokio::select! {
            changed = shutdown.changed() => {
                // Sender dropped means the engine is gone.
                if changed.is_err() {
                    break;
                }
            }
            _ = interval.tick() => {
                core.render_frame().await;
            }
        }
    }
    debug!("render loop stopped");
}
