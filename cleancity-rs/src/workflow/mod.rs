//! Validation Workflow
//!
//! The only entry point for record state transitions. It parses the admin's
//! action, hands the decision to the Record Store, and exposes the pending
//! review queue. It keeps no state of its own.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Decision, ObservationRecord, SortOrder, ValidationState};
use crate::store::RecordStore;

/// One admin decision as received from the boundary
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    pub record_id: Uuid,
    /// `approve` or `reject`
    pub action: String,
    pub decider: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct ValidationWorkflow {
    store: RecordStore,
}

impl ValidationWorkflow {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Apply one decision
    ///
    /// Fails with `InvalidAction` before touching the store if the action is
    /// not recognised, then with `NotFound` / `AlreadyDecided` from the store.
    pub async fn submit_decision(&self, request: DecisionRequest) -> Result<ObservationRecord> {
        let decision: Decision = request.action.parse()?;

        let record = self
            .store
            .decide(request.record_id, decision, &request.decider, request.note)
            .await?;

        info!(
            record_id = %record.id,
            contributor = %record.contributor_id,
            state = %record.state,
            "Validation decision applied"
        );

        Ok(record)
    }

    /// Pending records awaiting review
    pub async fn review_queue(
        &self,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<ObservationRecord>> {
        self.store
            .list_by_state(ValidationState::Pending, order, limit)
            .await
    }

    pub async fn pending_count(&self) -> Result<u64> {
        self.store.count_by_state(ValidationState::Pending).await
    }
}
