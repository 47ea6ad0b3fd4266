//! Admin endpoints: review queue, decisions, export

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{parse_query, parse_record_id, RecordView};
use crate::aggregation::resolve_limit;
use crate::error::{Error, Result};
use crate::models::SortOrder;
use crate::services::export::EXPORT_FILE_NAME;
use crate::workflow::DecisionRequest;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    pub limit: Option<usize>,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    /// Total pending, independent of `limit`
    pub pending: u64,
    pub records: Vec<RecordView>,
}

/// GET /api/admin/pending
pub async fn review_queue(
    State(state): State<AppState>,
    query: std::result::Result<Query<QueueQuery>, QueryRejection>,
) -> Result<Json<QueueResponse>> {
    let query = parse_query(query)?;
    let settings = state.aggregation.settings();
    let limit = resolve_limit(query.limit, settings.recent_limit, settings.max_query_limit)?;

    let records = state.workflow.review_queue(query.order, limit).await?;
    let pending = state.workflow.pending_count().await?;

    Ok(Json(QueueResponse {
        pending,
        records: records.into_iter().map(RecordView::from).collect(),
    }))
}

/// GET /api/admin/records/:id
///
/// Any state, unlike the public lookup.
pub async fn get_any_record(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<RecordView>> {
    let id = parse_record_id(&raw_id)?;
    Ok(Json(state.store.get(id).await?.into()))
}

#[derive(Debug, Deserialize)]
pub struct ValidateBody {
    pub action: Option<String>,
    pub decider: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// POST /api/admin/validate/:id
pub async fn validate_record(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: std::result::Result<Json<ValidateBody>, JsonRejection>,
) -> Result<Json<RecordView>> {
    let Json(body) = body.map_err(|e| Error::InvalidInput(e.body_text()))?;
    let record_id = parse_record_id(&raw_id)?;

    let request = DecisionRequest {
        record_id,
        action: body.action.unwrap_or_default(),
        decider: body.decider.unwrap_or_default(),
        note: body.note,
    };

    let record = state.workflow.submit_decision(request).await?;
    Ok(Json(record.into()))
}

/// GET /api/admin/export
///
/// CSV attachment of every approved record; 404 while there are none.
pub async fn export_records(State(state): State<AppState>) -> Result<Response> {
    let csv = state.export.approved_csv().await?;
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
