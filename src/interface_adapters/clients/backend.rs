use crate::domain::ports::{Connectivity, TrackBackend};
use crate::domain::{Faction, Snapshot, TrackError, UnitDetails};
use crate::interface_adapters::protocol::{
    DetailedUnitDto, FactionDto, MovementSnapshotDto, build_api_url,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct BackendErrorResponse {
    message: String,
}

#[derive(Debug)]
pub enum BackendClientError {
    Transport(reqwest::Error),
    Upstream {
        status: StatusCode,
        message: Option<String>,
    },
    Decode(reqwest::Error),
    InvalidUrl(url::ParseError),
}

impl fmt::Display for BackendClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendClientError::Transport(err) => write!(f, "backend transport error: {err}"),
            BackendClientError::Upstream { status, message } => {
                if let Some(message) = message {
                    write!(f, "backend upstream error {status}: {message}")
                } else {
                    write!(f, "backend upstream error {status}")
                }
            }
            BackendClientError::Decode(err) => write!(f, "backend response decode error: {err}"),
            BackendClientError::InvalidUrl(err) => write!(f, "invalid backend url: {err}"),
        }
    }
}

impl std::error::Error for BackendClientError {}

impl From<BackendClientError> for TrackError {
    fn from(err: BackendClientError) -> Self {
        match err {
            BackendClientError::Transport(err) => TrackError::TransportUnavailable(err.to_string()),
            BackendClientError::Upstream { status, message } => TrackError::ServerError {
                status: status.as_u16(),
                message,
            },
            // A body that stalls past the timeout is still a transport problem.
            BackendClientError::Decode(err) if err.is_timeout() => {
                TrackError::TransportUnavailable(err.to_string())
            }
            BackendClientError::Decode(err) => TrackError::Decode(err.to_string()),
            BackendClientError::InvalidUrl(err) => TrackError::Config(err.to_string()),
        }
    }
}

/// Reachability as last observed by [`HttpBackend`].
///
/// Flips to offline on transport failures and back online on any HTTP
/// response, including error statuses.
#[derive(Clone)]
pub struct BackendReachability(Arc<AtomicBool>);

impl Connectivity for BackendReachability {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// Thin reqwest client for the tracking backend.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
    requestor_faction_id: Option<i64>,
    online: Arc<AtomicBool>,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        requestor_faction_id: Option<i64>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            requestor_faction_id,
            online: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn reachability(&self) -> BackendReachability {
        BackendReachability(self.online.clone())
    }

    fn unit_details_url(&self, unit_id: &str) -> Result<Url, BackendClientError> {
        let mut url = Url::parse(&build_api_url(&self.base_url, "unitdetails"))
            .map_err(BackendClientError::InvalidUrl)?;
        // Push as a segment so ids with reserved characters stay intact.
        url.path_segments_mut()
            .map_err(|_| {
                BackendClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?
            .push(unit_id);
        if let Some(faction_id) = self.requestor_faction_id {
            url.query_pairs_mut()
                .append_pair("requestorFactionId", &faction_id.to_string());
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendClientError> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .inspect_err(|_| self.online.store(false, Ordering::SeqCst))
            .map_err(BackendClientError::Transport)?;
        self.online.store(true, Ordering::SeqCst);
        let status = res.status();

        // Keep upstream status/message so callers can tell 4xx from 5xx.
        if !status.is_success() {
            let message = res
                .json::<BackendErrorResponse>()
                .await
                .ok()
                .map(|payload| payload.message);
            debug!(%url, %status, "backend returned error status");
            return Err(BackendClientError::Upstream { status, message });
        }

        res.json::<T>().await.map_err(BackendClientError::Decode)
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendClientError> {
        Url::parse(&build_api_url(&self.base_url, path)).map_err(BackendClientError::InvalidUrl)
    }
}

#[async_trait]
impl TrackBackend for HttpBackend {
    async fn fetch_snapshot(&self) -> Result<Snapshot, TrackError> {
        let url = self.endpoint("movement/snapshot")?;
        let dto = self.get_json::<MovementSnapshotDto>(url).await?;
        Ok(dto.into_snapshot())
    }

    async fn fetch_factions(&self) -> Result<Vec<Faction>, TrackError> {
        let url = self.endpoint("factions")?;
        let dtos = self.get_json::<Vec<FactionDto>>(url).await?;
        Ok(dtos.into_iter().map(Faction::from).collect())
    }

    async fn fetch_unit_details(&self, unit_id: &str) -> Result<UnitDetails, TrackError> {
        let url = self.unit_details_url(unit_id)?;
        let dto = self.get_json::<DetailedUnitDto>(url).await?;
        Ok(dto.into())
    }
}
