// Status report endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use tracing::{error, info};

use super::common::{error_response, ApiResponse, ApiResult, CheckQuery, StatusReport};
use crate::web::AppState;

/// Check every node of the owner now
pub async fn check_now(
    Path(owner): Path<i64>,
    Query(query): Query<CheckQuery>,
    State(state): State<AppState>,
) -> ApiResult<StatusReport> {
    info!("Manual check requested for owner {}", owner);
    match state
        .health_monitor
        .check_nodes_now(owner, query.send_changes)
        .await
    {
        Ok(report) => Ok(Json(ApiResponse::success(StatusReport {
            owner_id: owner,
            report,
        }))),
        Err(e) => {
            error!("Manual check for owner {} failed: {}", owner, e);
            Err(error_response(e))
        }
    }
}

/// Last stored status, no node is contacted
pub async fn cached_status(
    Path(owner): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<StatusReport> {
    match state.health_monitor.check_nodes_cached(owner).await {
        Ok(report) => Ok(Json(ApiResponse::success(StatusReport {
            owner_id: owner,
            report,
        }))),
        Err(e) => {
            error!("Cached status for owner {} failed: {}", owner, e);
            Err(error_response(e))
        }
    }
}
