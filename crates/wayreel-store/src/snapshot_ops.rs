//! Snapshot read/write operations shared by the Scout and Recorder
//! iterations, layered over `Store::tx`/`get`/`query`.

use wayreel_types::{Snapshot, SnapshotState};

use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct NewChildSnapshot {
    pub parent_id: i64,
    pub depth: i64,
    pub url: String,
    pub timestamp: String,
    pub url_key: String,
    pub digest: Option<String>,
    pub is_media: bool,
    pub last_modified_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// A seed Snapshot inserted directly by the `enqueue` operator (spec §4.1
/// "Lifecycle"), bypassing the Scout's discovery path entirely.
#[derive(Debug, Clone)]
pub struct NewSeedSnapshot {
    pub url: String,
    pub timestamp: String,
    pub url_key: String,
    pub digest: Option<String>,
    pub is_media: bool,
    pub priority: i64,
}

impl Store {
    pub async fn get_snapshot(&self, id: i64) -> Result<Option<Snapshot>> {
        self.get(sqlx::query_as("SELECT * FROM snapshot WHERE id = ?").bind(id)).await
    }

    /// Insert a Scout-discovered child, subject to `ON CONFLICT DO
    /// NOTHING` on either uniqueness constraint (spec §4.8 step 9), and
    /// record the observed link-graph edge (spec §9 "Cyclic graph": Topology
    /// is the ground truth, independent of the first-discovery `parent_id`
    /// breadcrumb).
    pub async fn insert_child_snapshot(&self, child: NewChildSnapshot) -> Result<()> {
        let state = if child.is_media { SnapshotState::Scouted } else { SnapshotState::Queued };
        self.tx(|txn| {
            Box::pin(async move {
                let inserted = sqlx::query(
                    "INSERT INTO snapshot \
                     (parent_id, depth, state, url, timestamp, url_key, digest, is_media, last_modified_time) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
                     ON CONFLICT (url, timestamp) DO NOTHING",
                )
                .bind(child.parent_id)
                .bind(child.depth)
                .bind(state.as_i64())
                .bind(&child.url)
                .bind(&child.timestamp)
                .bind(&child.url_key)
                .bind(&child.digest)
                .bind(child.is_media as i64)
                .bind(child.last_modified_time)
                .execute(&mut **txn)
                .await?;

                let child_id: Option<(i64,)> = if inserted.rows_affected() > 0 {
                    sqlx::query_as("SELECT id FROM snapshot WHERE url = ? AND timestamp = ?")
                        .bind(&child.url)
                        .bind(&child.timestamp)
                        .fetch_optional(&mut **txn)
                        .await?
                } else {
                    None
                };
                if let Some((child_id,)) = child_id {
                    sqlx::query(
                        "INSERT INTO topology (parent_id, child_id) VALUES (?, ?) \
                         ON CONFLICT (parent_id, child_id) DO NOTHING",
                    )
                    .bind(child.parent_id)
                    .bind(child_id)
                    .execute(&mut **txn)
                    .await?;
                }
                Ok(())
            })
        })
        .await
    }

    /// `enqueue` operator (spec §6, scenario 1): insert a seed Snapshot at
    /// the priority bucket matching the requested stage. No `parent_id`, no
    /// Topology edge — this is the root of a new lineage.
    pub async fn insert_seed_snapshot(&self, seed: NewSeedSnapshot) -> Result<i64> {
        self.tx(|txn| {
            Box::pin(async move {
                let id: (i64,) = sqlx::query_as(
                    "INSERT INTO snapshot \
                     (parent_id, depth, state, priority, is_initial, url, timestamp, url_key, digest, is_media) \
                     VALUES (NULL, 0, ?, ?, 1, ?, ?, ?, ?, ?) \
                     RETURNING id",
                )
                .bind(SnapshotState::Queued.as_i64())
                .bind(seed.priority)
                .bind(&seed.url)
                .bind(&seed.timestamp)
                .bind(&seed.url_key)
                .bind(&seed.digest)
                .bind(seed.is_media as i64)
                .fetch_one(&mut **txn)
                .await?;
                Ok(id.0)
            })
        })
        .await
    }

    pub async fn mark_invalid(&self, snapshot_id: i64) -> Result<()> {
        self.set_state(snapshot_id, SnapshotState::Invalid).await
    }

    /// Step 4: the browser stayed on a blank page, so the snapshot is
    /// actually media, not a page.
    pub async fn flip_to_media_scouted(&self, snapshot_id: i64) -> Result<()> {
        self.tx(|txn| {
            Box::pin(async move {
                sqlx::query("UPDATE snapshot SET is_media = 1, state = ? WHERE id = ?")
                    .bind(SnapshotState::Scouted.as_i64())
                    .bind(snapshot_id)
                    .execute(&mut **txn)
                    .await?;
                Ok(())
            })
        })
        .await
    }

    async fn set_state(&self, snapshot_id: i64, state: SnapshotState) -> Result<()> {
        self.tx(|txn| {
            Box::pin(async move {
                sqlx::query("UPDATE snapshot SET state = ? WHERE id = ?")
                    .bind(state.as_i64())
                    .bind(snapshot_id)
                    .execute(&mut **txn)
                    .await?;
                Ok(())
            })
        })
        .await
    }

    /// Step 10: finalize a scouted snapshot — word counts, title,
    /// language, plugin flag, clear SCOUT priority, flip state.
    pub async fn finish_scout(
        &self,
        snapshot_id: i64,
        word_counts: &[(String, bool, i64)],
        page_title: Option<&str>,
        page_language: Option<&str>,
        page_uses_plugins: bool,
    ) -> Result<()> {
        let word_counts = word_counts.to_vec();
        let page_title = page_title.map(str::to_string);
        let page_language = page_language.map(str::to_string);
        self.tx(|txn| {
            Box::pin(async move {
                sqlx::query("DELETE FROM snapshot_word WHERE snapshot_id = ?")
                    .bind(snapshot_id)
                    .execute(&mut **txn)
                    .await?;
                for (word, is_tag, count) in &word_counts {
                    let word_id: (i64,) =
                        sqlx::query_as("SELECT id FROM word WHERE word = ? AND is_tag = ?")
                            .bind(word)
                            .bind(*is_tag as i64)
                            .fetch_one(&mut **txn)
                            .await?;
                    sqlx::query(
                        "INSERT INTO snapshot_word (snapshot_id, word_id, count) VALUES (?, ?, ?) \
                         ON CONFLICT (snapshot_id, word_id) DO UPDATE SET count = excluded.count",
                    )
                    .bind(snapshot_id)
                    .bind(word_id.0)
                    .bind(*count)
                    .execute(&mut **txn)
                    .await?;
                }
                sqlx::query(
                    "UPDATE snapshot SET state = ?, page_title = ?, page_language = ?, \
                     page_uses_plugins = ?, priority = CASE WHEN priority / 1000 = ? THEN 0 ELSE priority END \
                     WHERE id = ?",
                )
                .bind(SnapshotState::Scouted.as_i64())
                .bind(page_title)
                .bind(page_language)
                .bind(page_uses_plugins as i64)
                .bind(wayreel_types::priority::bucket(wayreel_types::priority::SCOUT) / 1000)
                .bind(snapshot_id)
                .execute(&mut **txn)
                .await?;
                Ok(())
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;

    async fn test_store() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let store = Store::new(connect(&path).await.unwrap());
        std::mem::forget(dir);
        store
    }

    #[tokio::test]
    async fn insert_seed_snapshot_queues_at_requested_priority() {
        let store = test_store().await;
        let id = store
            .insert_seed_snapshot(NewSeedSnapshot {
                url: "https://example.com/".to_string(),
                timestamp: "20020120142510".to_string(),
                url_key: "com,example)/".to_string(),
                digest: Some("DIGESTA".to_string()),
                is_media: false,
                priority: wayreel_types::priority::RECORD,
            })
            .await
            .unwrap();

        let snapshot = store.get_snapshot(id).await.unwrap().unwrap();
        assert_eq!(snapshot.state(), SnapshotState::Queued);
        assert_eq!(snapshot.priority, wayreel_types::priority::RECORD);
        assert!(snapshot.parent_id.is_none());
        assert_eq!(snapshot.depth, 0);
    }

    #[tokio::test]
    async fn insert_child_snapshot_records_a_topology_edge() {
        let store = test_store().await;
        let parent_id = store
            .insert_seed_snapshot(NewSeedSnapshot {
                url: "https://example.com/".to_string(),
                timestamp: "20020120142510".to_string(),
                url_key: "com,example)/".to_string(),
                digest: None,
                is_media: false,
                priority: wayreel_types::priority::SCOUT,
            })
            .await
            .unwrap();

        store
            .insert_child_snapshot(NewChildSnapshot {
                parent_id,
                depth: 1,
                url: "https://example.com/child".to_string(),
                timestamp: "20020121000000".to_string(),
                url_key: "com,example)/child".to_string(),
                digest: None,
                is_media: false,
                last_modified_time: None,
            })
            .await
            .unwrap();

        let (child_id,): (i64,) =
            sqlx::query_as("SELECT id FROM snapshot WHERE url = ? AND timestamp = ?")
                .bind("https://example.com/child")
                .bind("20020121000000")
                .fetch_one(store.pool())
                .await
                .unwrap();
        let parents = store.topology_parents(child_id).await.unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].parent_id, parent_id);
        assert_eq!(parents[0].child_id, child_id);
    }

    #[tokio::test]
    async fn insert_child_snapshot_is_idempotent_on_conflict() {
        let store = test_store().await;
        let parent_id = store
            .insert_seed_snapshot(NewSeedSnapshot {
                url: "https://example.com/".to_string(),
                timestamp: "20020120142510".to_string(),
                url_key: "com,example)/".to_string(),
                digest: None,
                is_media: false,
                priority: wayreel_types::priority::SCOUT,
            })
            .await
            .unwrap();
        let child = NewChildSnapshot {
            parent_id,
            depth: 1,
            url: "https://example.com/child".to_string(),
            timestamp: "20020121000000".to_string(),
            url_key: "com,example)/child".to_string(),
            digest: None,
            is_media: false,
            last_modified_time: None,
        };
        store.insert_child_snapshot(child.clone()).await.unwrap();
        store.insert_child_snapshot(child).await.unwrap();

        let (child_id,): (i64,) =
            sqlx::query_as("SELECT id FROM snapshot WHERE url = ? AND timestamp = ?")
                .bind("https://example.com/child")
                .bind("20020121000000")
                .fetch_one(store.pool())
                .await
                .unwrap();
        let parents = store.topology_parents(child_id).await.unwrap();
        assert_eq!(parents.len(), 1);
    }
}
