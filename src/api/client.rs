/// HTTP client for the track service
///
/// Three read-only endpoints, one request per call. No retries, no timeout,
/// no caching: a failed call is surfaced and the user decides what to do.

use std::fmt;

use reqwest::Url;
use serde::de::DeserializeOwned;

use super::error::FetchError;
use crate::state::data::{Identifier, RunSummary, Track, TrackList};

/// Frame-skip factor applied by the service when sampling a track.
/// Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleStride(u32);

impl SampleStride {
    pub const EVERY_FRAME: SampleStride = SampleStride(1);

    pub fn clamped(value: u32) -> Self {
        SampleStride(value.max(1))
    }

    /// Interpret free-form input from the stride field.
    ///
    /// Empty, non-numeric, zero and negative input all mean "every frame";
    /// fractional strides are truncated.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 1.0 => {
                SampleStride::clamped(value.min(u32::MAX as f64) as u32)
            }
            _ => SampleStride::EVERY_FRAME,
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for SampleStride {
    fn default() -> Self {
        SampleStride::EVERY_FRAME
    }
}

impl fmt::Display for SampleStride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle on the track service. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: Url) -> Self {
        Self::with_client(base, reqwest::Client::new())
    }

    pub fn with_client(base: Url, client: reqwest::Client) -> Self {
        Self { base, client }
    }

    /// `GET /runs`
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>, FetchError> {
        self.get_json(self.endpoint(&["runs"])).await
    }

    /// `GET /runs/{run}/tracks`
    pub async fn list_tracks(&self, run_id: &Identifier) -> Result<TrackList, FetchError> {
        self.get_json(self.endpoint(&["runs", run_id.as_str(), "tracks"]))
            .await
    }

    /// `GET /runs/{run}/tracks/{track}?sample={n}`
    pub async fn fetch_track(
        &self,
        run_id: &Identifier,
        track_id: &Identifier,
        sample: SampleStride,
    ) -> Result<Track, FetchError> {
        let mut url = self.endpoint(&["runs", run_id.as_str(), "tracks", track_id.as_str()]);
        url.query_pairs_mut()
            .append_pair("sample", &sample.to_string());

        self.get_json(url).await
    }

    /// Append path segments to the base URL, percent-encoding each one.
    /// Any path prefix on the base is kept.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::debug!(%url, "GET");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%url, %status, "request rejected");
            return Err(FetchError::from_status(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
