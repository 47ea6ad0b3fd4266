//! Public read endpoints over approved records

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{parse_query, parse_record_id, RecordView};
use crate::aggregation::resolve_limit;
use crate::error::{Error, Result};
use crate::models::{HotspotBin, LeaderboardEntry, SortOrder, ValidationState};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HotspotQuery {
    pub limit: Option<usize>,
    pub precision: Option<u32>,
}

/// GET /api/records
///
/// Most recently created approved records first.
pub async fn recent_records(
    State(state): State<AppState>,
    query: std::result::Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<RecordView>>> {
    let query = parse_query(query)?;
    let settings = state.aggregation.settings();
    let limit = resolve_limit(query.limit, settings.recent_limit, settings.max_query_limit)?;

    let records = state
        .store
        .list_by_state(ValidationState::Approved, SortOrder::Desc, limit)
        .await?;

    Ok(Json(records.into_iter().map(RecordView::from).collect()))
}

/// GET /api/records/:id
///
/// Records that are not approved are reported as not found here.
pub async fn get_record(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<RecordView>> {
    let id = parse_record_id(&raw_id)?;
    let record = state.store.get(id).await?;
    if record.state != ValidationState::Approved {
        return Err(Error::NotFound(raw_id));
    }
    Ok(Json(record.into()))
}

/// GET /api/leaderboard
pub async fn leaderboard(
    State(state): State<AppState>,
    query: std::result::Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let query = parse_query(query)?;
    Ok(Json(state.aggregation.leaderboard(query.limit).await?))
}

/// GET /api/hotspots
pub async fn hotspots(
    State(state): State<AppState>,
    query: std::result::Result<Query<HotspotQuery>, QueryRejection>,
) -> Result<Json<Vec<HotspotBin>>> {
    let query = parse_query(query)?;
    Ok(Json(
        state
            .aggregation
            .hotspots(query.precision, query.limit)
            .await?,
    ))
}
