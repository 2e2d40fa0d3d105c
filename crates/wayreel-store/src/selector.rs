//! C5 Selector (spec §4.5): one parameterized pick per worker, each
//! evaluated against a bounded candidate window and resolved with
//! `wayreel_store::ranker` standing in for the registered
//! `rank_snapshot_by_points` SQL scalar function (spec §9 fallback).

use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::FromRow;
use wayreel_types::{SnapshotState, Word};

use crate::error::Result;
use crate::ranker::{rank_and_take, score_snapshot, Points, WordMatch};
use crate::store::Store;

/// Tuning shared by every pick: how wide a priority-ordered window to pull
/// before ranking, and the `offset` fed to `rank()`.
#[derive(Debug, Clone, Copy)]
pub struct RankTuning {
    pub rank_window: i64,
    pub offset: Option<f64>,
    pub media_points: f64,
}

impl Default for RankTuning {
    fn default() -> Self {
        Self { rank_window: 200, offset: Some(0.0), media_points: 1.0 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoutPickParams {
    pub max_depth: i64,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub max_required_depth: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordPickParams {
    pub min_publish_days_for_same_url: i64,
    pub min_recordings_for_same_host: i64,
    pub allowed_media_extensions: Option<&'static [&'static str]>,
}

#[derive(Debug, Clone, Copy)]
pub struct PublishPickParams {
    pub require_approval: bool,
}

#[derive(FromRow)]
struct ScoutCandidate {
    id: i64,
    priority: i64,
    depth: i64,
    parent_id: Option<i64>,
}

#[derive(FromRow)]
struct RecordCandidate {
    id: i64,
    priority: i64,
}

#[derive(FromRow)]
struct PublishCandidate {
    id: i64,
    priority: i64,
    recording_id: i64,
    creation_time: String,
}

impl Store {
    /// Points for a snapshot per spec §4.4, `None` while it's still QUEUED.
    pub async fn snapshot_points(&self, snapshot_id: i64, media_points: f64) -> Result<Points> {
        let (state, is_media): (i64, i64) =
            sqlx::query_as("SELECT state, is_media FROM snapshot WHERE id = ?")
                .bind(snapshot_id)
                .fetch_one(&self.pool)
                .await?;
        if state == SnapshotState::Queued.as_i64() {
            return Ok(None);
        }
        let rows: Vec<(i64, f64, i64)> = sqlx::query_as(
            "SELECT sw.count, w.points, w.is_tag FROM snapshot_word sw \
             JOIN word w ON w.id = sw.word_id WHERE sw.snapshot_id = ?",
        )
        .bind(snapshot_id)
        .fetch_all(&self.pool)
        .await?;
        let matches: Vec<WordMatch> = rows
            .into_iter()
            .map(|(count, points, is_tag)| WordMatch { count, points, is_tag: is_tag != 0 })
            .collect();
        Ok(Some(score_snapshot(is_media != 0, media_points, &matches)))
    }

    /// Vocabulary refresh step (spec §4.8.1): idempotent upsert of
    /// configured words, then delete orphans with no matches and no
    /// non-default attributes.
    pub async fn sync_vocabulary(&self, words: &[Word]) -> Result<()> {
        self.tx(|txn| {
            let words = words.to_vec();
            Box::pin(async move {
                for w in &words {
                    sqlx::query(
                        "INSERT INTO word (word, is_tag, points, is_sensitive) VALUES (?, ?, ?, ?) \
                         ON CONFLICT (word, is_tag) DO UPDATE SET points = excluded.points, \
                         is_sensitive = excluded.is_sensitive",
                    )
                    .bind(&w.word)
                    .bind(w.is_tag as i64)
                    .bind(w.points)
                    .bind(w.is_sensitive as i64)
                    .execute(&mut **txn)
                    .await?;
                }
                sqlx::query(
                    "DELETE FROM word WHERE id NOT IN (SELECT word_id FROM snapshot_word) \
                     AND points = 0 AND is_sensitive = 0",
                )
                .execute(&mut **txn)
                .await?;
                Ok(())
            })
        })
        .await
    }

    /// Scout pick (spec §4.5): QUEUED, not media, not excluded, host
    /// allowed, depth within bounds, year within bounds when configured.
    /// Ordered by priority, a depth step function, then parent points.
    pub async fn scout_pick(
        &self,
        params: ScoutPickParams,
        tuning: RankTuning,
    ) -> Result<Option<i64>> {
        let year_filter = params.min_year.is_some() || params.max_year.is_some();
        let rows: Vec<ScoutCandidate> = sqlx::query_as(
            "SELECT id, priority, depth, parent_id FROM snapshot \
             WHERE state = ? AND is_media = 0 AND is_excluded = 0 AND depth <= ? \
             AND (? = 0 OR (CAST(substr(timestamp, 1, 4) AS INTEGER) >= COALESCE(?, 0) \
                  AND CAST(substr(timestamp, 1, 4) AS INTEGER) <= COALESCE(?, 9999))) \
             ORDER BY priority DESC LIMIT ?",
        )
        .bind(SnapshotState::Queued.as_i64())
        .bind(params.max_depth)
        .bind(year_filter as i64)
        .bind(params.min_year)
        .bind(params.max_year)
        .bind(tuning.rank_window)
        .fetch_all(&self.pool)
        .await?;

        let mut filtered = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(parent_id) = row.parent_id {
                let host_ok = self.host_allowed_for_snapshot(parent_id).await?;
                if !host_ok {
                    continue;
                }
            }
            filtered.push(row);
        }

        let mut candidates = Vec::with_capacity(filtered.len());
        for row in filtered {
            let parent_points = match row.parent_id {
                Some(parent_id) => self.snapshot_points(parent_id, tuning.media_points).await?,
                None => None,
            };
            let depth_step = depth_step_key(row.depth, params.max_required_depth);
            candidates.push((row.id, row.priority, depth_step, parent_points));
        }

        let mut rng = StdRng::from_entropy();
        let picked = rank_and_take(
            candidates,
            |c| c.1 * 1_000_000 - c.2,
            |c| c.3,
            tuning.offset,
            1,
            &mut rng,
        );
        Ok(picked.into_iter().next().map(|c| c.0))
    }

    async fn host_allowed_for_snapshot(&self, snapshot_id: i64) -> Result<bool> {
        let (url,): (String,) = sqlx::query_as("SELECT url FROM snapshot WHERE id = ?")
            .bind(snapshot_id)
            .fetch_one(&self.pool)
            .await?;
        let key = wayreel_types::url_key::url_key(&url);
        let host = wayreel_types::url_key::url_host(&key);
        self.is_host_allowed(host).await
    }

    /// Record pick (spec §4.5): SCOUTED, or PUBLISHED and old enough to
    /// re-record. High-priority rows bypass age/host-recency/sensitivity
    /// filters. "Old enough" is measured from the most recent Recording's
    /// `publish_time` across every snapshot sharing this URL key, matching
    /// `DaysSinceLastPublished` grouped by `UrlKey` rather than this row's
    /// own (unwritten) `scout_time`.
    pub async fn record_pick(
        &self,
        params: RecordPickParams,
        tuning: RankTuning,
        high_priority_threshold: i64,
    ) -> Result<Option<i64>> {
        let rows: Vec<RecordCandidate> = sqlx::query_as(
            "SELECT id, priority FROM snapshot s \
             WHERE (s.state = ? \
                    OR (s.state = ? AND CAST(julianday('now') - julianday( \
                         (SELECT MAX(r.publish_time) FROM recording r \
                          JOIN snapshot s2 ON s2.id = r.snapshot_id \
                          WHERE s2.url_key = s.url_key) \
                       ) AS INTEGER) >= ?)) \
             ORDER BY priority DESC LIMIT ?",
        )
        .bind(SnapshotState::Scouted.as_i64())
        .bind(SnapshotState::Published.as_i64())
        .bind(params.min_publish_days_for_same_url)
        .bind(tuning.rank_window)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            if row.priority < high_priority_threshold {
                let recent_same_host = self.recordings_for_host_recent(row.id).await?;
                if let Some(recent_same_host) = recent_same_host {
                    if recent_same_host < params.min_recordings_for_same_host {
                        continue;
                    }
                }
                if let Some(allow_list) = params.allowed_media_extensions {
                    if !self.media_extension_allowed(row.id, allow_list).await? {
                        continue;
                    }
                }
            }
            let points = self.snapshot_points(row.id, tuning.media_points).await?;
            candidates.push((row.id, row.priority, points));
        }

        let mut rng = StdRng::from_entropy();
        let picked =
            rank_and_take(candidates, |c| c.1, |c| c.2, tuning.offset, 1, &mut rng);
        Ok(picked.into_iter().next().map(|c| c.0))
    }

    /// How many Recordings have been made (across every host) since this
    /// snapshot's host was last recorded, i.e. `total recordings - this
    /// host's most recent row number` when every Recording is numbered in
    /// creation order. `None` when the host has never been recorded (spec:
    /// an unrecorded host never blocks a pick on host-spacing grounds).
    /// `url_host` isn't a stored column, so the grouping happens here
    /// instead of in SQL, the same app-side-fallback shape as `ranker`.
    async fn recordings_for_host_recent(&self, snapshot_id: i64) -> Result<Option<i64>> {
        let (target_url_key,): (String,) =
            sqlx::query_as("SELECT url_key FROM snapshot WHERE id = ?")
                .bind(snapshot_id)
                .fetch_one(&self.pool)
                .await?;
        let target_host = wayreel_types::url_key::url_host(&target_url_key);

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT s.url_key FROM recording r JOIN snapshot s ON s.id = r.snapshot_id \
             ORDER BY r.creation_time ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let total = rows.len() as i64;
        let mut last_row_num_for_host: Option<i64> = None;
        for (row_num, (url_key,)) in rows.into_iter().enumerate() {
            if wayreel_types::url_key::url_host(&url_key) == target_host {
                last_row_num_for_host = Some(row_num as i64 + 1);
            }
        }
        Ok(last_row_num_for_host.map(|last| total - last))
    }

    async fn media_extension_allowed(&self, snapshot_id: i64, allow_list: &[&str]) -> Result<bool> {
        let (ext,): (Option<String>,) =
            sqlx::query_as("SELECT media_extension FROM snapshot WHERE id = ?")
                .bind(snapshot_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(match ext {
            None => true,
            Some(ext) => allow_list.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
        })
    }

    /// Publish pick (spec §4.5): APPROVED, or RECORDED when approval is
    /// disabled. Joins the latest unprocessed Recording per snapshot.
    pub async fn publish_pick(&self, params: PublishPickParams) -> Result<Option<(i64, i64)>> {
        let states: Vec<i64> = if params.require_approval {
            vec![SnapshotState::Approved.as_i64()]
        } else {
            vec![SnapshotState::Approved.as_i64(), SnapshotState::Recorded.as_i64()]
        };
        let mut best: Option<PublishCandidate> = None;
        for state in states {
            let rows: Vec<PublishCandidate> = sqlx::query_as(
                "SELECT s.id, s.priority, r.id AS recording_id, r.creation_time FROM snapshot s \
                 JOIN recording r ON r.snapshot_id = s.id \
                 WHERE s.state = ? AND r.is_processed = 0 \
                 AND r.id = (SELECT id FROM recording WHERE snapshot_id = s.id \
                             AND is_processed = 0 ORDER BY creation_time DESC LIMIT 1) \
                 ORDER BY s.priority DESC, r.creation_time ASC LIMIT 1",
            )
            .bind(state)
            .fetch_all(&self.pool)
            .await?;
            if let Some(row) = rows.into_iter().next() {
                let replace = match &best {
                    None => true,
                    Some(b) => {
                        row.priority > b.priority
                            || (row.priority == b.priority && row.creation_time < b.creation_time)
                    }
                };
                if replace {
                    best = Some(row);
                }
            }
        }
        Ok(best.map(|b| (b.id, b.recording_id)))
    }

    /// Approve pick (spec §4.5): RECORDED with an unprocessed Recording.
    pub async fn approve_pick(&self) -> Result<Option<(i64, i64)>> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT s.id, r.id FROM snapshot s \
             JOIN recording r ON r.snapshot_id = s.id \
             WHERE s.state = ? AND r.is_processed = 0 \
             ORDER BY s.priority DESC, r.creation_time ASC LIMIT 1",
        )
        .bind(SnapshotState::Recorded.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

/// Monotonically decreasing as depth grows towards `max_required_depth`,
/// flat beyond it, used as the secondary priority-ordering key in
/// `scout_pick` ("a step function of depth that prefers shallow links up
/// to `max_required_depth`").
fn depth_step_key(depth: i64, max_required_depth: i64) -> i64 {
    depth.min(max_required_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;

    async fn test_store() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let pool = connect(&path).await.unwrap();
        std::mem::forget(dir);
        Store::new(pool)
    }

    async fn insert_snapshot(store: &Store, state: SnapshotState, priority: i64, url: &str) -> i64 {
        sqlx::query(
            "INSERT INTO snapshot (state, priority, url, timestamp, url_key) \
             VALUES (?, ?, ?, '20200101000000', ?)",
        )
        .bind(state.as_i64())
        .bind(priority)
        .bind(url)
        .bind(url)
        .execute(store.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn scout_pick_prefers_highest_priority() {
        let store = test_store().await;
        insert_snapshot(&store, SnapshotState::Queued, 1000, "http://a.example").await;
        let high = insert_snapshot(&store, SnapshotState::Queued, 3000, "http://b.example").await;
        let picked = store
            .scout_pick(
                ScoutPickParams {
                    max_depth: 10,
                    min_year: None,
                    max_year: None,
                    max_required_depth: 2,
                },
                RankTuning::default(),
            )
            .await
            .unwrap();
        assert_eq!(picked, Some(high));
    }

    #[tokio::test]
    async fn approve_pick_requires_unprocessed_recording() {
        let store = test_store().await;
        let snap = insert_snapshot(&store, SnapshotState::Recorded, 1000, "http://c.example").await;
        assert_eq!(store.approve_pick().await.unwrap(), None);
        sqlx::query(
            "INSERT INTO recording (snapshot_id, upload_filename, creation_time) \
             VALUES (?, 'x.mp4', '2020-01-01T00:00:00Z')",
        )
        .bind(snap)
        .execute(store.pool())
        .await
        .unwrap();
        let (picked_snap, _) = store.approve_pick().await.unwrap().unwrap();
        assert_eq!(picked_snap, snap);
    }

    #[tokio::test]
    async fn publish_pick_prefers_approved_over_recorded_when_approval_required() {
        let store = test_store().await;
        let approved = insert_snapshot(&store, SnapshotState::Approved, 1000, "http://d.example").await;
        sqlx::query(
            "INSERT INTO recording (snapshot_id, upload_filename, creation_time) \
             VALUES (?, 'a.mp4', '2020-01-01T00:00:00Z')",
        )
        .bind(approved)
        .execute(store.pool())
        .await
        .unwrap();
        let picked = store
            .publish_pick(PublishPickParams { require_approval: true })
            .await
            .unwrap();
        assert_eq!(picked.map(|(s, _)| s), Some(approved));
    }
}
