use std::fmt;

// Domain-level errors for fetching, caching and configuring the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    // Backend could not be reached (connect failure, timeout).
    TransportUnavailable(String),
    // Backend reachable but answered with a non-success status.
    ServerError {
        status: u16,
        message: Option<String>,
    },
    // Response body did not match the expected payload.
    Decode(String),
    // Snapshot fetch failed and no cached snapshot exists.
    SnapshotUnavailable(Box<TrackError>),
    // Faction fetch failed and no cached faction list exists.
    FactionsUnavailable(Box<TrackError>),
    // Selected-unit detail lookup failed.
    DetailFetch {
        unit_id: String,
        cause: Box<TrackError>,
    },
    Cache(String),
    Config(String),
}

impl TrackError {
    /// Innermost cause, unwrapping fallback wrappers.
    pub fn root_cause(&self) -> &TrackError {
        match self {
            TrackError::SnapshotUnavailable(cause) | TrackError::FactionsUnavailable(cause) => {
                cause.root_cause()
            }
            TrackError::DetailFetch { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// True when the failure means the backend was unreachable.
    pub fn is_offline(&self) -> bool {
        matches!(self.root_cause(), TrackError::TransportUnavailable(_))
    }
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::TransportUnavailable(msg) => write!(f, "backend unreachable: {msg}"),
            TrackError::ServerError { status, message } => {
                if let Some(message) = message {
                    write!(f, "backend error {status}: {message}")
                } else {
                    write!(f, "backend error {status}")
                }
            }
            TrackError::Decode(msg) => write!(f, "payload decode error: {msg}"),
            TrackError::SnapshotUnavailable(cause) => {
                write!(f, "snapshot unavailable and no cached copy: {cause}")
            }
            TrackError::FactionsUnavailable(cause) => {
                write!(f, "factions unavailable and no cached copy: {cause}")
            }
            TrackError::DetailFetch { unit_id, cause } => {
                write!(f, "details for unit {unit_id} unavailable: {cause}")
            }
            TrackError::Cache(msg) => write!(f, "cache error: {msg}"),
            TrackError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for TrackError {}
