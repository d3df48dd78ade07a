// Use cases layer: polling, caching, reconciliation and selection workflows.

pub mod engine;
pub mod poll;
pub mod reconciler;
pub mod render;
pub mod selection;
pub mod source;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{EngineCore, EnginePorts, TrackEngine};
pub use poll::PollOutcome;
pub use selection::{SelectionPhase, SelectionView};
pub use store::{EntityFrame, EntityStore};
pub use types::{EngineEvent, EngineSettings, Notice, OverlayMessage};
