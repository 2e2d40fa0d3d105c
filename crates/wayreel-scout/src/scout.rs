//! C7 Scout (spec §4.8): one iteration picks a QUEUED snapshot, navigates
//! to it, harvests links and text, and either scouts it or marks it
//! invalid.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use wayreel_archive::ArchiveClient;
use wayreel_store::selector::{RankTuning, ScoutPickParams};
use wayreel_store::snapshot_ops::NewChildSnapshot;
use wayreel_store::Store;
use wayreel_types::url_key::{url_key, Modifier, WaybackUrl};
use wayreel_types::Word;

use crate::language::LanguageCollaborator;
use crate::rendering::{FrameContent, NavigationOutcome, RenderingCollaborator};
use crate::text::{is_archive_domain, tokenize_japanese_aware, urls_in_query_string};

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("store error: {0}")]
    Store(#[from] wayreel_store::StoreError),
    #[error("archive error: {0}")]
    Archive(#[from] wayreel_archive::ArchiveError),
    #[error("rendering session failed: {0}")]
    SessionFailed(String),
}

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Debug)]
pub enum IterationOutcome {
    NoWork,
    Scouted { snapshot_id: i64, children_found: usize },
    FlippedToMedia { snapshot_id: i64 },
    Invalidated { snapshot_id: i64, redirect_enqueued: bool },
}

pub struct Scout {
    store: Arc<Store>,
    archive: Arc<ArchiveClient>,
    rendering: Arc<dyn RenderingCollaborator>,
    language: Arc<dyn LanguageCollaborator>,
    archive_host: String,
    pick_params: ScoutPickParams,
    rank_tuning: RankTuning,
    tokenize_japanese: bool,
}

impl Scout {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<Store>,
        archive: Arc<ArchiveClient>,
        rendering: Arc<dyn RenderingCollaborator>,
        language: Arc<dyn LanguageCollaborator>,
        archive_host: impl Into<String>,
        pick_params: ScoutPickParams,
        rank_tuning: RankTuning,
        tokenize_japanese: bool,
    ) -> Self {
        Self {
            store,
            archive,
            rendering,
            language,
            archive_host: archive_host.into(),
            pick_params,
            rank_tuning,
            tokenize_japanese,
        }
    }

    /// Step 1: idempotent vocabulary refresh from configuration.
    pub async fn refresh_vocabulary(&self, words: &[Word]) -> Result<()> {
        Ok(self.store.sync_vocabulary(words).await?)
    }

    pub async fn run_iteration(&self) -> Result<IterationOutcome> {
        // Step 2.
        let Some(snapshot_id) = self.store.scout_pick(self.pick_params, self.rank_tuning).await? else {
            return Ok(IterationOutcome::NoWork);
        };
        let Some(snapshot) = self.store.get_snapshot(snapshot_id).await? else {
            return Ok(IterationOutcome::NoWork);
        };

        // Step 3.
        let iframe_url = WaybackUrl::new(&snapshot.timestamp, Some(Modifier::Iframe), &snapshot.url).compose();
        let navigation = self
            .rendering
            .navigate(&iframe_url)
            .await
            .map_err(|e| ScoutError::SessionFailed(e.to_string()))?;

        match navigation {
            NavigationOutcome::Redirected { target_url } => {
                self.store.mark_invalid(snapshot_id).await?;
                let enqueued =
                    self.enqueue_discovered_url(snapshot_id, snapshot.depth as i64, &target_url).await?;
                return Ok(IterationOutcome::Invalidated { snapshot_id, redirect_enqueued: enqueued });
            }
            NavigationOutcome::Blank => {
                // Step 4.
                self.store.flip_to_media_scouted(snapshot_id).await?;
                return Ok(IterationOutcome::FlippedToMedia { snapshot_id });
            }
            NavigationOutcome::Landed => {}
        }

        // Steps 5-6.
        let frames = self
            .rendering
            .frames()
            .await
            .map_err(|e| ScoutError::SessionFailed(e.to_string()))?;

        let mut hrefs = Vec::new();
        let mut all_text = String::new();
        let mut uses_plugins = false;
        for frame in &frames {
            collect_frame_links(frame, &self.archive_host, &mut hrefs);
            all_text.push(' ');
            all_text.push_str(&frame.text);
            uses_plugins = uses_plugins || frame.uses_plugins;
        }

        // Step 7.
        let tokens = tokenize_japanese_aware(&all_text, self.tokenize_japanese);
        let word_counts = count_tokens(&tokens);

        // Step 8.
        let page_language = match self.language.detect(&all_text).await {
            Ok(language) => language,
            Err(e) => {
                warn!(snapshot_id, error = %e, "page language detection failed, continuing without it");
                None
            }
        };

        // Step 9.
        let mut children_found = 0;
        for href in hrefs {
            match self.archive.find_best(&snapshot.timestamp, &href).await {
                Ok(best) => {
                    let enriched = self.archive.enrich(&best.capture.original).await.unwrap_or(None);
                    let child = NewChildSnapshot {
                        parent_id: snapshot_id,
                        depth: snapshot.depth as i64 + 1,
                        url: href.clone(),
                        timestamp: best.capture.timestamp.clone(),
                        url_key: url_key(&href),
                        digest: Some(best.capture.digest.clone()),
                        is_media: best.is_media,
                        last_modified_time: enriched,
                    };
                    self.store.insert_child_snapshot(child).await?;
                    children_found += 1;
                }
                Err(e) => {
                    warn!(href, error = %e, "find_best failed for discovered link, skipping");
                }
            }
        }

        // Step 10.
        let page_title = self.rendering.page_title().await.unwrap_or(None);
        self.store
            .finish_scout(
                snapshot_id,
                &word_counts.into_iter().map(|(w, c)| (w, false, c)).collect::<Vec<_>>(),
                page_title.as_deref(),
                page_language.as_deref(),
                uses_plugins,
            )
            .await?;

        info!(snapshot_id, children_found, "scouted snapshot");
        Ok(IterationOutcome::Scouted { snapshot_id, children_found })
    }

    async fn enqueue_discovered_url(&self, parent_id: i64, depth: i64, url: &str) -> Result<bool> {
        match self.archive.find_best("", url).await {
            Ok(best) => {
                let child = NewChildSnapshot {
                    parent_id,
                    depth,
                    url: url.to_string(),
                    timestamp: best.capture.timestamp.clone(),
                    url_key: url_key(url),
                    digest: Some(best.capture.digest.clone()),
                    is_media: best.is_media,
                    last_modified_time: None,
                };
                self.store.insert_child_snapshot(child).await?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}

fn collect_frame_links(frame: &FrameContent, archive_host: &str, out: &mut Vec<String>) {
    for href in &frame.hrefs {
        if !is_archive_domain(href, archive_host) {
            out.push(href.clone());
        }
    }
    for href in &frame.hrefs {
        for nested in urls_in_query_string(href) {
            if !is_archive_domain(&nested, archive_host) {
                out.push(nested);
            }
        }
    }
}

fn count_tokens(tokens: &[String]) -> Vec<(String, i64)> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_hrefs_and_query_string_urls_skipping_archive_domain() {
        let frame = FrameContent {
            hrefs: vec![
                "http://a.example/page".to_string(),
                "https://web.archive.org/web/123/http://x.example".to_string(),
                "http://redirector.example/go?target=http://b.example/landing".to_string(),
            ],
            query_string_urls: vec![],
            text: String::new(),
            uses_plugins: false,
        };
        let mut out = Vec::new();
        collect_frame_links(&frame, "web.archive.org", &mut out);
        assert!(out.contains(&"http://a.example/page".to_string()));
        assert!(out.contains(&"http://b.example/landing".to_string()));
        assert!(!out.iter().any(|h| h.contains("web.archive.org")));
    }

    #[test]
    fn counts_token_frequency() {
        let tokens = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let counts = count_tokens(&tokens);
        let a_count = counts.iter().find(|(w, _)| w == "a").unwrap().1;
        assert_eq!(a_count, 2);
    }
}
