//! Approver read-write operations (spec §4.10): RECORDED -> APPROVED /
//! REJECTED / SCOUTED, plus the optional sensitivity override.

use wayreel_types::{priority, SnapshotState};

use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Reject,
    RecordAgain,
}

impl Verdict {
    fn target_state(self) -> SnapshotState {
        match self {
            Verdict::Approve => SnapshotState::Approved,
            Verdict::Reject => SnapshotState::Rejected,
            Verdict::RecordAgain => SnapshotState::Scouted,
        }
    }
}

impl Store {
    /// Apply a human verdict to a RECORDED snapshot+recording pair: flip
    /// `S.state`, mark the Recording `is_processed = true` so the Approver
    /// never re-offers it, and on "record again" bump priority into the
    /// RECORD bucket so the Selector picks it up again promptly.
    pub async fn apply_verdict(
        &self,
        snapshot_id: i64,
        recording_id: i64,
        verdict: Verdict,
        is_sensitive_override: Option<bool>,
    ) -> Result<()> {
        let target_state = verdict.target_state();
        let record_again = verdict == Verdict::RecordAgain;
        self.tx(|txn| {
            Box::pin(async move {
                sqlx::query("UPDATE recording SET is_processed = 1 WHERE id = ?")
                    .bind(recording_id)
                    .execute(&mut **txn)
                    .await?;

                if record_again {
                    sqlx::query(
                        "UPDATE snapshot SET state = ?, is_sensitive_override = ?, \
                         priority = ? + (priority % 1000) WHERE id = ?",
                    )
                    .bind(target_state.as_i64())
                    .bind(is_sensitive_override.map(|b| b as i64))
                    .bind(priority::RECORD)
                    .bind(snapshot_id)
                    .execute(&mut **txn)
                    .await?;
                } else {
                    sqlx::query("UPDATE snapshot SET state = ?, is_sensitive_override = ? WHERE id = ?")
                        .bind(target_state.as_i64())
                        .bind(is_sensitive_override.map(|b| b as i64))
                        .bind(snapshot_id)
                        .execute(&mut **txn)
                        .await?;
                }
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

    async fn insert_recorded_pair(store: &Store) -> (i64, i64) {
        let snapshot_id: (i64,) = sqlx::query_as(
            "INSERT INTO snapshot (url, timestamp, url_key, state, priority, depth) \
             VALUES ('http://a.example/', '20020101000000', 'com,example)/', ?, 0, 0) RETURNING id",
        )
        .bind(SnapshotState::Recorded.as_i64())
        .fetch_one(store.pool())
        .await
        .unwrap();
        let recording_id: (i64,) = sqlx::query_as(
            "INSERT INTO recording (snapshot_id, upload_filename, creation_time) VALUES (?, 'f.mp4', ?) RETURNING id",
        )
        .bind(snapshot_id.0)
        .bind(chrono::Utc::now())
        .fetch_one(store.pool())
        .await
        .unwrap();
        (snapshot_id.0, recording_id.0)
    }

    #[tokio::test]
    async fn record_again_bumps_priority_into_record_bucket() {
        let store = test_store().await;
        let (snapshot_id, recording_id) = insert_recorded_pair(&store).await;
        store.apply_verdict(snapshot_id, recording_id, Verdict::RecordAgain, None).await.unwrap();
        let snapshot = store.get_snapshot(snapshot_id).await.unwrap().unwrap();
        assert_eq!(snapshot.state(), SnapshotState::Scouted);
        assert!(snapshot.priority >= priority::RECORD);
    }

    #[tokio::test]
    async fn approve_marks_recording_processed() {
        let store = test_store().await;
        let (snapshot_id, recording_id) = insert_recorded_pair(&store).await;
        store.apply_verdict(snapshot_id, recording_id, Verdict::Approve, Some(true)).await.unwrap();
        let snapshot = store.get_snapshot(snapshot_id).await.unwrap().unwrap();
        assert_eq!(snapshot.state(), SnapshotState::Approved);
        assert_eq!(snapshot.is_sensitive_override, Some(true));
    }
}
