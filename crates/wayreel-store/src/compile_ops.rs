//! Compiler read operations (spec §4.12): selecting recordings either by
//! `publish_time` window or by an explicit ID list.

use chrono::{DateTime, Utc};
use wayreel_types::Recording;

use crate::error::Result;
use crate::store::Store;

impl Store {
    pub async fn recordings_published_between(&self, begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Recording>> {
        let rows: Vec<Recording> = sqlx::query_as(
            "SELECT * FROM recording WHERE publish_time IS NOT NULL AND publish_time BETWEEN ? AND ? \
             ORDER BY publish_time ASC",
        )
        .bind(begin)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The most recently created Recording for a snapshot — "for
    /// snapshot-ids, keep only the latest recording per snapshot".
    pub async fn latest_recording_for_snapshot(&self, snapshot_id: i64) -> Result<Option<Recording>> {
        self.get(
            sqlx::query_as("SELECT * FROM recording WHERE snapshot_id = ? ORDER BY creation_time DESC LIMIT 1")
                .bind(snapshot_id),
        )
        .await
    }

    /// Records a finished compilation and the Recordings it's made of, in
    /// their final segment order (spec: "the Compiler ... inserts
    /// Compilation + RecordingCompilation").
    pub async fn insert_compilation(&self, upload_filename: &str, recording_ids: &[i64]) -> Result<i64> {
        let upload_filename = upload_filename.to_string();
        let recording_ids = recording_ids.to_vec();
        self.tx(|txn| {
            Box::pin(async move {
                let compilation_id: (i64,) = sqlx::query_as(
                    "INSERT INTO compilation (upload_filename, creation_time) VALUES (?, ?) RETURNING id",
                )
                .bind(&upload_filename)
                .bind(chrono::Utc::now())
                .fetch_one(&mut **txn)
                .await?;

                for (position, recording_id) in recording_ids.iter().enumerate() {
                    sqlx::query(
                        "INSERT INTO recording_compilation (compilation_id, recording_id, position) \
                         VALUES (?, ?, ?)",
                    )
                    .bind(compilation_id.0)
                    .bind(recording_id)
                    .bind(position as i64)
                    .execute(&mut **txn)
                    .await?;
                }

                Ok(compilation_id.0)
            })
        })
        .await
    }
}
