// Cache-backed fetch adapters: live payloads are persisted, failures fall back
// to the last good payload of the same kind.

use crate::domain::ports::{CacheStore, TrackBackend};
use crate::domain::{Faction, Snapshot, TrackError, UnitDetails};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

pub const SNAPSHOT_CACHE_KEY: &str = "movement-snapshot-cache";
pub const FACTIONS_CACHE_KEY: &str = "factions-cache";
const UNIT_DETAILS_CACHE_PREFIX: &str = "unit-details-cache";

/// Cache key for one unit's last-good detail payload.
pub fn unit_details_cache_key(unit_id: &str) -> String {
    format!("{UNIT_DETAILS_CACHE_PREFIX}:{unit_id}")
}

/// Where a fetched payload came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    Live,
    // Transport failed; the cached copy was served instead.
    Cached { cause: TrackError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Fetched<T> {
    pub fn is_cached(&self) -> bool {
        matches!(self.origin, Origin::Cached { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Snapshot,
    Factions,
    UnitDetails,
}

impl DataKind {
    fn unavailable(self, cause: TrackError) -> TrackError {
        match self {
            DataKind::Snapshot => TrackError::SnapshotUnavailable(Box::new(cause)),
            DataKind::Factions => TrackError::FactionsUnavailable(Box::new(cause)),
            // Wrapped with the unit id by `DetailSource`.
            DataKind::UnitDetails => cause,
        }
    }
}

/// Last-good cache for one data kind. Kinds never invalidate each other.
#[derive(Clone)]
pub struct CachedSource {
    cache: Arc<dyn CacheStore>,
    key: String,
    kind: DataKind,
}

impl CachedSource {
    pub fn new(cache: Arc<dyn CacheStore>, key: impl Into<String>, kind: DataKind) -> Self {
        Self {
            cache,
            key: key.into(),
            kind,
        }
    }

    /// Resolves a transport outcome against the cache.
    pub async fn resolve<T>(&self, outcome: Result<T, TrackError>) -> Result<Fetched<T>, TrackError>
    where
        T: Serialize + DeserializeOwned,
    {
        match outcome {
            Ok(value) => {
                self.store(&value).await;
                Ok(Fetched {
                    value,
                    origin: Origin::Live,
                })
            }
            Err(cause) => match self.load::<T>().await {
                Some(value) => {
                    debug!(key = %self.key, error = %cause, "serving cached payload");
                    Ok(Fetched {
                        value,
                        origin: Origin::Cached { cause },
                    })
                }
                None => Err(self.kind.unavailable(cause)),
            },
        }
    }

    async fn store<T: Serialize>(&self, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to encode payload for cache");
                return;
            }
        };
        // A failed write only costs us the fallback copy.
        if let Err(e) = self.cache.set(&self.key, encoded).await {
            warn!(key = %self.key, error = %e, "failed to persist payload");
        }
    }

    async fn load<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = match self.cache.get(&self.key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read cache");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(key = %self.key, error = %e, "discarding corrupt cache entry"))
            .ok()
    }
}

/// Snapshot fetch with last-good fallback.
#[derive(Clone)]
pub struct SnapshotSource {
    backend: Arc<dyn TrackBackend>,
    cache: CachedSource,
}

impl SnapshotSource {
    pub fn new(backend: Arc<dyn TrackBackend>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            backend,
            cache: CachedSource::new(cache, SNAPSHOT_CACHE_KEY, DataKind::Snapshot),
        }
    }

    pub async fn fetch_snapshot(&self) -> Result<Fetched<Snapshot>, TrackError> {
        let outcome = self.backend.fetch_snapshot().await;
        self.cache.resolve(outcome).await
    }
}

/// Faction list fetch with last-good fallback.
#[derive(Clone)]
pub struct FactionSource {
    backend: Arc<dyn TrackBackend>,
    cache: CachedSource,
}

impl FactionSource {
    pub fn new(backend: Arc<dyn TrackBackend>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            backend,
            cache: CachedSource::new(cache, FACTIONS_CACHE_KEY, DataKind::Factions),
        }
    }

    pub async fn fetch_factions(&self) -> Result<Fetched<Vec<Faction>>, TrackError> {
        let outcome = self.backend.fetch_factions().await;
        self.cache.resolve(outcome).await
    }
}

/// Per-unit detail fetch with last-good fallback, one cache entry per unit.
#[derive(Clone)]
pub struct DetailSource {
    backend: Arc<dyn TrackBackend>,
    cache: Arc<dyn CacheStore>,
}

impl DetailSource {
    pub fn new(backend: Arc<dyn TrackBackend>, cache: Arc<dyn CacheStore>) -> Self {
        Self { backend, cache }
    }

    pub async fn fetch_unit_details(
        &self,
        unit_id: &str,
    ) -> Result<Fetched<UnitDetails>, TrackError> {
        let outcome = self.backend.fetch_unit_details(unit_id).await;
        CachedSource::new(
            self.cache.clone(),
            unit_details_cache_key(unit_id),
            DataKind::UnitDetails,
        )
        .resolve(outcome)
        .await
        .map_err(|cause| TrackError::DetailFetch {
            unit_id: unit_id.to_string(),
            cause: Box::new(cause),
        })
    }
}
