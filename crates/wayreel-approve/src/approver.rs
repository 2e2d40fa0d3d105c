//! C9 Approver (spec §4.10): sequential interactive loop over eligible
//! RECORDED snapshot+recording pairs.

use std::sync::Arc;

use tracing::info;
use wayreel_store::{Store, Verdict};

use crate::error::Result;
use crate::review::{capture_file_present, ReviewCollaborator};

#[derive(Debug)]
pub enum IterationOutcome {
    NoWork,
    Reviewed { snapshot_id: i64, verdict: Verdict },
    RecordAgainMissingFile { snapshot_id: i64 },
}

pub struct Approver {
    store: Arc<Store>,
    review: Arc<dyn ReviewCollaborator>,
}

impl Approver {
    pub fn new(store: Arc<Store>, review: Arc<dyn ReviewCollaborator>) -> Self {
        Self { store, review }
    }

    pub async fn run_iteration(&self) -> Result<IterationOutcome> {
        let Some((snapshot_id, recording_id)) = self.store.approve_pick().await? else {
            return Ok(IterationOutcome::NoWork);
        };
        let Some(snapshot) = self.store.get_snapshot(snapshot_id).await? else {
            return Ok(IterationOutcome::NoWork);
        };
        let recording = self.store.find_recording(recording_id).await?;
        let Some(recording) = recording else {
            return Ok(IterationOutcome::NoWork);
        };

        if !capture_file_present(&recording) {
            self.store.apply_verdict(snapshot_id, recording_id, Verdict::RecordAgain, None).await?;
            info!(snapshot_id, "capture file missing, converted to record-again");
            return Ok(IterationOutcome::RecordAgainMissingFile { snapshot_id });
        }

        self.review.present(&snapshot, &recording).await.map_err(|e| crate::error::ApproveError::Review(e.to_string()))?;
        let (verdict, sensitivity) = self
            .review
            .read_verdict()
            .await
            .map_err(|e| crate::error::ApproveError::Review(e.to_string()))?;

        self.store.apply_verdict(snapshot_id, recording_id, verdict, sensitivity.as_override()).await?;
        info!(snapshot_id, ?verdict, "applied approver verdict");
        Ok(IterationOutcome::Reviewed { snapshot_id, verdict })
    }
}
