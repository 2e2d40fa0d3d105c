//! C3 ArchiveClient (spec §4.6): a rate-gated, retrying wrapper around the
//! archive's CDX index, snapshot host, and save endpoint. Retry/backoff
//! idiom and constants are adapted from the Chrome fetcher's retry loop.

use std::time::Duration;

use rand::Rng;
use tracing::warn;
use wayreel_rategate::{RateGate, ServiceKind};

use crate::cdx::{parse_cdx_rows, CdxCapture};
use crate::error::{ArchiveError, Result};
use crate::last_modified::parse_last_modified;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub snapshot_host: String,
    pub cdx_host: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            snapshot_host: "https://web.archive.org".to_string(),
            cdx_host: "https://web.archive.org/cdx/search/cdx".to_string(),
        }
    }
}

pub struct ArchiveClient {
    http: reqwest::Client,
    gate: RateGate,
    config: ArchiveConfig,
}

#[derive(Debug, Clone)]
pub struct BestCapture {
    pub capture: CdxCapture,
    pub is_media: bool,
    pub media_extension: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SavedUrl {
    pub wayback_url: String,
    pub was_already_saved: bool,
}

impl ArchiveClient {
    pub fn new(http: reqwest::Client, gate: RateGate, config: ArchiveConfig) -> Self {
        Self { http, gate, config }
    }

    /// First nearest capture with HTTP 200 near `timestamp`; then oldest
    /// capture sharing that capture's digest.
    pub async fn find_best(&self, timestamp: &str, url: &str) -> Result<BestCapture> {
        let mut rows = self
            .query_cdx(&[
                ("url", url),
                ("filter", "statuscode:200"),
                ("closest", timestamp),
                ("sort", "closest"),
                ("limit", "1"),
            ])
            .await?;
        let nearest = rows.pop().ok_or_else(|| ArchiveError::NotFound(url.to_string()))?;

        let mut digest_rows = self
            .query_cdx(&[
                ("url", url),
                ("filter", "statuscode:200"),
                ("filter", &format!("digest:{}", nearest.digest)),
                ("sort", "ascending"),
                ("limit", "1"),
            ])
            .await?;
        let oldest = digest_rows.pop().unwrap_or(nearest);

        let is_media = oldest.is_media();
        let media_extension = oldest.media_extension();
        Ok(BestCapture { capture: oldest, is_media, media_extension })
    }

    /// HEAD the snapshot and parse `x-archive-orig-last-modified`.
    pub async fn enrich(&self, snapshot_url: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        self.gate.wait(ServiceKind::Archive).await;
        let response = self.retrying(|| self.http.head(snapshot_url).send()).await?;
        let header = response
            .headers()
            .get("x-archive-orig-last-modified")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(header.and_then(|h| parse_last_modified(&h)))
    }

    /// Checks whether `url` is still reachable, without writing to the Save
    /// API. Used to vet a backfill candidate before spending a Save request
    /// on it (spec §7: minimize Save API traffic).
    pub async fn is_url_available(&self, url: &str) -> bool {
        self.gate.wait(ServiceKind::Archive).await;
        matches!(self.http.head(url).send().await, Ok(resp) if resp.status().is_success())
    }

    /// Trigger archival of `url`. A 429 is rate-limited; other failures are
    /// non-fatal and returned as errors for the caller to log and skip.
    pub async fn save(&self, url: &str) -> Result<SavedUrl> {
        self.gate.wait(ServiceKind::Save).await;
        let save_url = format!("{}/save/{}", self.config.snapshot_host, url);
        let response = self
            .http
            .post(&save_url)
            .send()
            .await
            .map_err(ArchiveError::from)?;
        if response.status().as_u16() == 429 {
            return Err(ArchiveError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ArchiveError::Request(format!(
                "save request for {url} returned {}",
                response.status()
            )));
        }
        let was_already_saved = response
            .headers()
            .get("x-page-cache")
            .map(|v| v == "1")
            .unwrap_or(false);
        let wayback_url = response.url().to_string();
        Ok(SavedUrl { wayback_url, was_already_saved })
    }

    /// True only if both the snapshot host and the CDX host respond 200.
    pub async fn services_up(&self) -> bool {
        let snapshot_ok = self.head_ok(&self.config.snapshot_host).await;
        let cdx_ok = self
            .head_ok(&format!("{}?url=archive.org&limit=1", self.config.cdx_host))
            .await;
        snapshot_ok && cdx_ok
    }

    async fn head_ok(&self, url: &str) -> bool {
        self.gate.wait(ServiceKind::Archive).await;
        matches!(self.http.get(url).send().await, Ok(resp) if resp.status().is_success())
    }

    async fn query_cdx(&self, params: &[(&str, &str)]) -> Result<Vec<CdxCapture>> {
        self.gate.wait(ServiceKind::Cdx).await;
        let mut query = vec![("output", "json")];
        query.extend_from_slice(params);
        let response = self
            .retrying(|| self.http.get(&self.config.cdx_host).query(&query).send())
            .await?;
        let body = response.text().await.map_err(ArchiveError::from)?;
        Ok(parse_cdx_rows(&body))
    }

    /// Exponential backoff with jitter on 502/503/504, capped at
    /// `MAX_ATTEMPTS`.
    async fn retrying<F, Fut>(&self, request: F) -> Result<reqwest::Response>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<reqwest::Response, reqwest::Error>>,
    {
        for attempt in 0..MAX_ATTEMPTS {
            match request().await {
                Ok(response) if is_transient_status(response.status()) => {
                    if attempt + 1 == MAX_ATTEMPTS {
                        return Err(ArchiveError::Request(format!(
                            "archive returned {} after {MAX_ATTEMPTS} attempts",
                            response.status()
                        )));
                    }
                    warn!(attempt = attempt + 1, status = %response.status(), "archive request transient failure, retrying");
                    backoff(attempt).await;
                }
                Ok(response) => return Ok(response),
                Err(e) if attempt + 1 == MAX_ATTEMPTS => return Err(e.into()),
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "archive request failed, retrying");
                    backoff(attempt).await;
                }
            }
        }
        unreachable!("loop always returns before exhausting attempts")
    }
}

fn is_transient_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 502 | 503 | 504)
}

async fn backoff(attempt: u32) {
    let base = RETRY_BASE * 2u32.pow(attempt);
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..500));
    tokio::time::sleep(base + jitter).await;
}
