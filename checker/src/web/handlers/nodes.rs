// Node administration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use super::common::{error_response, ApiResponse, ApiResult};
use crate::services::{AddNodeRequest, NodeView};
use crate::web::AppState;

/// List an owner's nodes, newest first, credentials masked
pub async fn list_nodes(
    Path(owner): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<Vec<NodeView>> {
    match state.node_service.list_nodes(owner).await {
        Ok(nodes) => Ok(Json(ApiResponse::success(nodes))),
        Err(e) => {
            error!("Failed to list nodes of owner {}: {}", owner, e);
            Err(error_response(e))
        }
    }
}

pub async fn add_node(
    Path(owner): Path<i64>,
    State(state): State<AppState>,
    Json(request): Json<AddNodeRequest>,
) -> ApiResult<NodeView> {
    match state.node_service.add_node(owner, request).await {
        Ok(node) => {
            let message = format!("Done. {}", node.summary());
            Ok(Json(ApiResponse::success_with_message(node, message)))
        }
        Err(e) => {
            info!("Add node rejected for owner {}: {}", owner, e);
            Err(error_response(e))
        }
    }
}

pub async fn delete_node(
    Path((owner, ordinal)): Path<(i64, usize)>,
    State(state): State<AppState>,
) -> ApiResult<NodeView> {
    match state.node_service.delete_node(owner, ordinal).await {
        Ok(Some(node)) => {
            let message = format!("Done. {}", node.summary());
            Ok(Json(ApiResponse::success_with_message(node, message)))
        }
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No node deleted".to_string())),
        )),
        Err(e) => {
            error!("Failed to delete node {} of owner {}: {}", ordinal, owner, e);
            Err(error_response(e))
        }
    }
}
