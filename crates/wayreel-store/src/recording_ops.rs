//! Recording/SavedUrl read-write operations for the Recorder iteration
//! (spec §4.9 step 13).

use wayreel_types::{Recording, SnapshotState, Word};

use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct NewRecording {
    pub snapshot_id: i64,
    pub has_audio: bool,
    pub upload_filename: String,
    pub archive_filename: Option<String>,
    pub text_to_speech_filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSavedUrl {
    pub url: String,
    pub timestamp: Option<String>,
    pub failed: bool,
}

impl Store {
    /// Aborted outcome: `S.state = ABORTED`, no Recording written. Callers
    /// handle deleting the partial capture file themselves.
    pub async fn finish_record_aborted(&self, snapshot_id: i64) -> Result<()> {
        self.tx(|txn| {
            Box::pin(async move {
                sqlx::query(
                    "UPDATE snapshot SET state = ?, \
                     priority = CASE WHEN priority / 1000 = 2 THEN 0 ELSE priority END \
                     WHERE id = ?",
                )
                .bind(SnapshotState::Aborted.as_i64())
                .bind(snapshot_id)
                .execute(&mut **txn)
                .await?;
                Ok(())
            })
        })
        .await
    }

    /// Recorded outcome: insert the Recording, write any SavedUrl backfill
    /// rows, flip `S.state = RECORDED`, clear RECORD priority — all inside
    /// one transaction (spec §5 "state transitions happen atomically").
    pub async fn finish_record_success(
        &self,
        snapshot_id: i64,
        recording: NewRecording,
        saved_urls: Vec<NewSavedUrl>,
    ) -> Result<i64> {
        self.tx(|txn| {
            Box::pin(async move {
                let recording_id: (i64,) = sqlx::query_as(
                    "INSERT INTO recording \
                     (snapshot_id, is_processed, has_audio, upload_filename, archive_filename, \
                      text_to_speech_filename, creation_time) \
                     VALUES (?, 0, ?, ?, ?, ?, ?) RETURNING id",
                )
                .bind(recording.snapshot_id)
                .bind(recording.has_audio as i64)
                .bind(&recording.upload_filename)
                .bind(&recording.archive_filename)
                .bind(&recording.text_to_speech_filename)
                .bind(chrono::Utc::now())
                .fetch_one(&mut **txn)
                .await?;

                for saved in &saved_urls {
                    sqlx::query(
                        "INSERT INTO saved_url (snapshot_id, recording_id, url, timestamp, failed) \
                         VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(snapshot_id)
                    .bind(recording_id.0)
                    .bind(&saved.url)
                    .bind(&saved.timestamp)
                    .bind(saved.failed as i64)
                    .execute(&mut **txn)
                    .await?;
                }

                sqlx::query(
                    "UPDATE snapshot SET state = ?, \
                     priority = CASE WHEN priority / 1000 = 2 THEN 0 ELSE priority END \
                     WHERE id = ?",
                )
                .bind(SnapshotState::Recorded.as_i64())
                .bind(snapshot_id)
                .execute(&mut **txn)
                .await?;

                Ok(recording_id.0)
            })
        })
        .await
    }

    pub async fn find_recording(&self, id: i64) -> Result<Option<Recording>> {
        self.get(sqlx::query_as("SELECT * FROM recording WHERE id = ?").bind(id)).await
    }

    /// Vocabulary lookup the Recorder needs to decide `page_language`'s
    /// narration voice (spec §4.9 step 10) without re-reading the whole
    /// word table.
    pub async fn find_word(&self, word: &str, is_tag: bool) -> Result<Option<Word>> {
        self.get(
            sqlx::query_as("SELECT * FROM word WHERE word = ? AND is_tag = ?")
                .bind(word)
                .bind(is_tag as i64),
        )
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

    async fn insert_snapshot(store: &Store, url: &str, priority: i64) -> i64 {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO snapshot (url, timestamp, url_key, state, priority, depth) \
             VALUES (?, '20020101000000', ?, ?, ?, 0) RETURNING id",
        )
        .bind(url)
        .bind(format!("com,example)/{url}"))
        .bind(SnapshotState::Scouted.as_i64())
        .bind(priority)
        .fetch_one(store.pool())
        .await
        .unwrap();
        row.0
    }

    #[tokio::test]
    async fn finish_record_success_inserts_recording_and_saved_urls() {
        let store = test_store().await;
        let snapshot_id = insert_snapshot(&store, "http://a.example/", 2500).await;

        let recording_id = store
            .finish_record_success(
                snapshot_id,
                NewRecording {
                    snapshot_id,
                    has_audio: true,
                    upload_filename: "1_2_a_2020_01_01_upload.mp4".to_string(),
                    archive_filename: None,
                    text_to_speech_filename: None,
                },
                vec![NewSavedUrl { url: "http://a.example/level2.dat".to_string(), timestamp: None, failed: false }],
            )
            .await
            .unwrap();
        assert!(recording_id > 0);

        let snapshot = store.get_snapshot(snapshot_id).await.unwrap().unwrap();
        assert_eq!(snapshot.state(), SnapshotState::Recorded);
        assert_eq!(snapshot.priority, 0);
    }

    #[tokio::test]
    async fn finish_record_aborted_clears_record_priority_only() {
        let store = test_store().await;
        let snapshot_id = insert_snapshot(&store, "http://a.example/", 2777).await;
        store.finish_record_aborted(snapshot_id).await.unwrap();
        let snapshot = store.get_snapshot(snapshot_id).await.unwrap().unwrap();
        assert_eq!(snapshot.state(), SnapshotState::Aborted);
        assert_eq!(snapshot.priority, 0);
    }
}
