//! Queries behind the `graph` CLI command (spec §6): `-trace ID` walks the
//! observed link graph back to its roots, `-next N` previews upcoming work
//! without picking it.

use sqlx::FromRow;
use wayreel_types::{Snapshot, SnapshotState};

use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone, Copy, FromRow)]
pub struct TopologyEdge {
    pub parent_id: i64,
    pub child_id: i64,
}

impl Store {
    /// Every Topology edge that discovered `snapshot_id` as a child (spec
    /// §9 "Cyclic graph": a capture can have more than one discoverer, so
    /// this is a set, not a chain).
    pub async fn topology_parents(&self, snapshot_id: i64) -> Result<Vec<TopologyEdge>> {
        self.query(
            sqlx::query_as("SELECT parent_id, child_id FROM topology WHERE child_id = ?")
                .bind(snapshot_id),
        )
        .await
    }

    /// Direct children discovered from `snapshot_id`.
    pub async fn topology_children(&self, snapshot_id: i64) -> Result<Vec<TopologyEdge>> {
        self.query(
            sqlx::query_as("SELECT parent_id, child_id FROM topology WHERE parent_id = ?")
                .bind(snapshot_id),
        )
        .await
    }

    /// A preview of the next `limit` QUEUED snapshots by raw priority
    /// order, ahead of the Selector's weighted-random ranking. This is a
    /// display aid, not a prediction of the exact order `scout_pick` would
    /// hand out — the rank-and-take step injects randomness every call.
    pub async fn upcoming_scout_candidates(&self, limit: i64) -> Result<Vec<Snapshot>> {
        self.query(
            sqlx::query_as(
                "SELECT * FROM snapshot WHERE state = ? AND is_media = 0 AND is_excluded = 0 \
                 ORDER BY priority DESC LIMIT ?",
            )
            .bind(SnapshotState::Queued.as_i64())
            .bind(limit),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;
    use crate::snapshot_ops::NewSeedSnapshot;

    async fn test_store() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let store = Store::new(connect(&path).await.unwrap());
        std::mem::forget(dir);
        store
    }

    #[tokio::test]
    async fn upcoming_scout_candidates_orders_by_priority() {
        let store = test_store().await;
        store
            .insert_seed_snapshot(NewSeedSnapshot {
                url: "https://low.example/".to_string(),
                timestamp: "20020101000000".to_string(),
                url_key: "example,low)/".to_string(),
                digest: None,
                is_media: false,
                priority: 10,
            })
            .await
            .unwrap();
        store
            .insert_seed_snapshot(NewSeedSnapshot {
                url: "https://high.example/".to_string(),
                timestamp: "20020101000000".to_string(),
                url_key: "example,high)/".to_string(),
                digest: None,
                is_media: false,
                priority: 999,
            })
            .await
            .unwrap();

        let candidates = store.upcoming_scout_candidates(5).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].url, "https://high.example/");
        assert_eq!(candidates[1].url, "https://low.example/");
    }

    #[tokio::test]
    async fn topology_children_empty_for_leaf_snapshot() {
        let store = test_store().await;
        let id = store
            .insert_seed_snapshot(NewSeedSnapshot {
                url: "https://example.com/".to_string(),
                timestamp: "20020101000000".to_string(),
                url_key: "com,example)/".to_string(),
                digest: None,
                is_media: false,
                priority: 0,
            })
            .await
            .unwrap();
        assert!(store.topology_children(id).await.unwrap().is_empty());
    }
}
