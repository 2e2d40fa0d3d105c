//! Publisher read-write operations (spec §4.11): mark a Recording's
//! per-backend post id, then finalize the whole snapshot.

use wayreel_types::SnapshotState;

use crate::error::Result;
use crate::store::Store;

/// Which backend column a successful post writes its external id into.
/// The source's placeholder Tumblr/Bluesky columns exist but have no
/// publishing branch yet (open question, resolved in DESIGN.md): both are
/// represented here so a future backend only needs a `SocialBackend` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Twitter,
    Mastodon,
    Tumblr,
    Bluesky,
}

impl Backend {
    fn column(self) -> &'static str {
        match self {
            Backend::Twitter => "twitter_id",
            Backend::Mastodon => "mastodon_id",
            Backend::Tumblr => "tumblr_id",
            Backend::Bluesky => "bluesky_id",
        }
    }
}

impl Store {
    pub async fn record_publish_result(&self, recording_id: i64, backend: Backend, external_id: &str) -> Result<()> {
        let sql = format!("UPDATE recording SET {} = ? WHERE id = ?", backend.column());
        let external_id = external_id.to_string();
        self.tx(|txn| {
            Box::pin(async move {
                sqlx::query(&sql).bind(external_id).bind(recording_id).execute(&mut **txn).await?;
                Ok(())
            })
        })
        .await
    }

    /// After at least one backend succeeded: stamp `publish_time`, mark
    /// this Recording and every sibling Recording of the same snapshot
    /// `is_processed = true` (the Selector's "latest unprocessed per
    /// snapshot" join must never offer this snapshot again), clear PUBLISH
    /// priority, and flip `S.state = PUBLISHED`.
    pub async fn finish_publish(&self, snapshot_id: i64, recording_id: i64) -> Result<()> {
        self.tx(|txn| {
            Box::pin(async move {
                sqlx::query("UPDATE recording SET publish_time = ? WHERE id = ? AND publish_time IS NULL")
                    .bind(chrono::Utc::now())
                    .bind(recording_id)
                    .execute(&mut **txn)
                    .await?;
                sqlx::query("UPDATE recording SET is_processed = 1 WHERE snapshot_id = ?")
                    .bind(snapshot_id)
                    .execute(&mut **txn)
                    .await?;
                sqlx::query(
                    "UPDATE snapshot SET state = ?, \
                     priority = CASE WHEN priority / 1000 = 3 THEN 0 ELSE priority END \
                     WHERE id = ?",
                )
                .bind(SnapshotState::Published.as_i64())
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
    use wayreel_types::SnapshotState;

    async fn test_store() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let store = Store::new(connect(&path).await.unwrap());
        std::mem::forget(dir);
        store
    }

    async fn insert_snapshot_with_two_recordings(store: &Store) -> (i64, i64, i64) {
        let snapshot_id: (i64,) = sqlx::query_as(
            "INSERT INTO snapshot (url, timestamp, url_key, state, priority, depth) \
             VALUES ('http://a.example/', '20020101000000', 'com,example)/', ?, 3500, 0) RETURNING id",
        )
        .bind(SnapshotState::Recorded.as_i64())
        .fetch_one(store.pool())
        .await
        .unwrap();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let recording_id: (i64,) = sqlx::query_as(
                "INSERT INTO recording (snapshot_id, upload_filename, creation_time) VALUES (?, 'f.mp4', ?) RETURNING id",
            )
            .bind(snapshot_id.0)
            .bind(chrono::Utc::now())
            .fetch_one(store.pool())
            .await
            .unwrap();
            ids.push(recording_id.0);
        }
        (snapshot_id.0, ids[0], ids[1])
    }

    #[tokio::test]
    async fn finish_publish_marks_all_siblings_processed() {
        let store = test_store().await;
        let (snapshot_id, latest, older) = insert_snapshot_with_two_recordings(&store).await;
        store.record_publish_result(latest, Backend::Twitter, "12345").await.unwrap();
        store.finish_publish(snapshot_id, latest).await.unwrap();

        let latest_row = store.find_recording(latest).await.unwrap().unwrap();
        let older_row = store.find_recording(older).await.unwrap().unwrap();
        assert!(latest_row.is_processed);
        assert!(older_row.is_processed);
        assert_eq!(latest_row.twitter_id.as_deref(), Some("12345"));

        let snapshot = store.get_snapshot(snapshot_id).await.unwrap().unwrap();
        assert_eq!(snapshot.state(), SnapshotState::Published);
        assert_eq!(snapshot.priority, 0);
    }
}
