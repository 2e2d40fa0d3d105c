//! Operational queries behind the `stats` and `delete` CLI commands (spec
//! §6). Filesystem cleanup stays in the caller — this module only answers
//! "what" to delete and mutates the rows that track it.

use sqlx::FromRow;
use wayreel_types::{Recording, SnapshotState};

use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone, Copy, FromRow)]
pub struct StateCount {
    pub state: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    pub snapshot_total: i64,
    pub recording_total: i64,
    pub compilation_total: i64,
}

impl Store {
    /// Snapshot counts grouped by state, for the `stats` command.
    pub async fn snapshot_counts_by_state(&self) -> Result<Vec<StateCount>> {
        self.query(sqlx::query_as(
            "SELECT state, COUNT(*) AS count FROM snapshot GROUP BY state ORDER BY state",
        ))
        .await
    }

    pub async fn pipeline_stats(&self) -> Result<PipelineStats> {
        let (snapshot_total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM snapshot").fetch_one(&self.pool).await?;
        let (recording_total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM recording").fetch_one(&self.pool).await?;
        let (compilation_total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM compilation").fetch_one(&self.pool).await?;
        Ok(PipelineStats { snapshot_total, recording_total, compilation_total })
    }

    /// Recordings belonging to a REJECTED snapshot: pure audit waste, never
    /// eligible for compilation (spec §4.1's state machine has no REJECTED
    /// -> APPROVED/PUBLISHED edge), so deleting them cannot violate "a
    /// Recording referenced by a published row is never deleted while its
    /// membership exists" (spec §3 invariant 5).
    pub async fn rejected_recordings(&self) -> Result<Vec<Recording>> {
        self.query(sqlx::query_as(
            "SELECT r.* FROM recording r JOIN snapshot s ON s.id = r.snapshot_id \
             WHERE s.state = ? AND NOT EXISTS \
             (SELECT 1 FROM recording_compilation rc WHERE rc.recording_id = r.id)",
        ).bind(SnapshotState::Rejected.as_i64()))
        .await
    }

    /// Recordings that already belong to a compilation. Their on-disk files
    /// may be reclaimed since the compiled output retains the content; the
    /// row and membership stay (spec §3 invariant 5).
    pub async fn compiled_recordings(&self) -> Result<Vec<Recording>> {
        self.query(sqlx::query_as(
            "SELECT DISTINCT r.* FROM recording r \
             JOIN recording_compilation rc ON rc.recording_id = r.id",
        ))
        .await
    }

    /// Delete a Recording row and its SavedUrl rows. Refuses to delete one
    /// with an existing compilation membership (spec §3 invariant 5).
    pub async fn delete_recording_row(&self, recording_id: i64) -> Result<bool> {
        self.tx(|txn| {
            Box::pin(async move {
                let (membership_count,): (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM recording_compilation WHERE recording_id = ?",
                )
                .bind(recording_id)
                .fetch_one(&mut **txn)
                .await?;
                if membership_count > 0 {
                    return Ok(false);
                }
                sqlx::query("DELETE FROM saved_url WHERE recording_id = ?")
                    .bind(recording_id)
                    .execute(&mut **txn)
                    .await?;
                sqlx::query("DELETE FROM recording WHERE id = ?")
                    .bind(recording_id)
                    .execute(&mut **txn)
                    .await?;
                Ok(true)
            })
        })
        .await
    }

    /// All recording filenames currently tracked by the database, for the
    /// `--temporary` filesystem sweep (files in `recordings_path` with no
    /// matching row are orphaned partial captures).
    pub async fn known_recording_filenames(&self) -> Result<Vec<String>> {
        let rows: Vec<(String, Option<String>, Option<String>)> = self
            .query(sqlx::query_as(
                "SELECT upload_filename, archive_filename, text_to_speech_filename FROM recording",
            ))
            .await?;
        let mut names = Vec::new();
        for (upload, archive, tts) in rows {
            names.push(upload);
            names.extend(archive);
            names.extend(tts);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;
    use crate::recording_ops::NewRecording;

    async fn test_store() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let store = Store::new(connect(&path).await.unwrap());
        std::mem::forget(dir);
        store
    }

    async fn insert_snapshot(store: &Store, url: &str, state: SnapshotState) -> i64 {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO snapshot (url, timestamp, url_key, state, priority, depth) \
             VALUES (?, '20020101000000', ?, ?, 0, 0) RETURNING id",
        )
        .bind(url)
        .bind(format!("com,example)/{url}"))
        .bind(state.as_i64())
        .fetch_one(store.pool())
        .await
        .unwrap();
        row.0
    }

    #[tokio::test]
    async fn rejected_recordings_excludes_compiled_ones() {
        let store = test_store().await;
        let snapshot_id = insert_snapshot(&store, "http://a.example/", SnapshotState::Rejected).await;
        let recording_id = store
            .finish_record_success(
                snapshot_id,
                NewRecording {
                    snapshot_id,
                    has_audio: false,
                    upload_filename: "a.mp4".to_string(),
                    archive_filename: None,
                    text_to_speech_filename: None,
                },
                vec![],
            )
            .await
            .unwrap();

        let rejected = store.rejected_recordings().await.unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, recording_id);

        sqlx::query("INSERT INTO compilation (upload_filename, creation_time) VALUES ('c.mp4', ?)")
            .bind(chrono::Utc::now())
            .execute(store.pool())
            .await
            .unwrap();
        let (compilation_id,): (i64,) =
            sqlx::query_as("SELECT id FROM compilation").fetch_one(store.pool()).await.unwrap();
        sqlx::query("INSERT INTO recording_compilation (recording_id, compilation_id, position) VALUES (?, ?, 0)")
            .bind(recording_id)
            .bind(compilation_id)
            .execute(store.pool())
            .await
            .unwrap();

        assert!(store.rejected_recordings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_recording_row_refuses_when_compiled() {
        let store = test_store().await;
        let snapshot_id = insert_snapshot(&store, "http://a.example/", SnapshotState::Published).await;
        let recording_id = store
            .finish_record_success(
                snapshot_id,
                NewRecording {
                    snapshot_id,
                    has_audio: false,
                    upload_filename: "a.mp4".to_string(),
                    archive_filename: None,
                    text_to_speech_filename: None,
                },
                vec![],
            )
            .await
            .unwrap();
        sqlx::query("INSERT INTO compilation (upload_filename, creation_time) VALUES ('c.mp4', ?)")
            .bind(chrono::Utc::now())
            .execute(store.pool())
            .await
            .unwrap();
        let (compilation_id,): (i64,) =
            sqlx::query_as("SELECT id FROM compilation").fetch_one(store.pool()).await.unwrap();
        sqlx::query("INSERT INTO recording_compilation (recording_id, compilation_id, position) VALUES (?, ?, 0)")
            .bind(recording_id)
            .bind(compilation_id)
            .execute(store.pool())
            .await
            .unwrap();

        let deleted = store.delete_recording_row(recording_id).await.unwrap();
        assert!(!deleted);
        assert!(store.find_recording(recording_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_recording_row_deletes_when_unreferenced() {
        let store = test_store().await;
        let snapshot_id = insert_snapshot(&store, "http://a.example/", SnapshotState::Rejected).await;
        let recording_id = store
            .finish_record_success(
                snapshot_id,
                NewRecording {
                    snapshot_id,
                    has_audio: false,
                    upload_filename: "a.mp4".to_string(),
                    archive_filename: None,
                    text_to_speech_filename: None,
                },
                vec![],
            )
            .await
            .unwrap();

        let deleted = store.delete_recording_row(recording_id).await.unwrap();
        assert!(deleted);
        assert!(store.find_recording(recording_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pipeline_stats_counts_each_table() {
        let store = test_store().await;
        insert_snapshot(&store, "http://a.example/", SnapshotState::Queued).await;
        insert_snapshot(&store, "http://b.example/", SnapshotState::Queued).await;
        let stats = store.pipeline_stats().await.unwrap();
        assert_eq!(stats.snapshot_total, 2);
        assert_eq!(stats.recording_total, 0);
        assert_eq!(stats.compilation_total, 0);
    }
}
