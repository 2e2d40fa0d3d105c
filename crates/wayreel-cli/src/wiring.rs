//! Construct the Store, ArchiveClient, and the `NotConfigured` collaborator
//! stand-ins from a loaded `Config` (spec §6's "ambient stack" wiring, in
//! the shape of `rootsignal-scout/src/main.rs`'s sequential client setup).
//!
//! Every browser-automation, transcoding, speech, and social-posting
//! collaborator is wired as `NotConfigured` here: actually driving a
//! browser, encoding video, synthesizing speech, or calling a social API is
//! out of scope (spec's Non-goals) — a real deployment swaps these for
//! concrete trait implementations without touching the workers above them.

use std::sync::Arc;

use wayreel_archive::{ArchiveClient, ArchiveConfig};
use wayreel_common::Config;
use wayreel_rategate::{RateGate, RateGateConfig};
use wayreel_store::{connect, Store};

pub async fn open_store(config: &Config) -> anyhow::Result<Arc<Store>> {
    let pool = connect(&config.database_path).await?;
    Ok(Arc::new(Store::new(pool)))
}

pub fn open_archive(archive_host: &str) -> Arc<ArchiveClient> {
    let http = reqwest::Client::new();
    let gate = RateGate::new(RateGateConfig::default());
    let config = ArchiveConfig {
        snapshot_host: format!("https://{archive_host}"),
        cdx_host: format!("https://{archive_host}/cdx/search/cdx"),
    };
    Arc::new(ArchiveClient::new(http, gate, config))
}
