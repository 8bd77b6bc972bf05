//! Message inspection handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use wavesend_storage::models::{Message, MessageStatus};

use super::{bad_request, default_limit, default_offset, internal_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub campaign_id: Option<Uuid>,
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_offset")]
    pub offset: i64,
}

/// GET /api/v1/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let status = match &query.status {
        Some(s) => Some(
            s.parse::<MessageStatus>()
                .map_err(|_| bad_request(format!("Unknown message status: {s}")))?,
        ),
        None => None,
    };

    let messages = state
        .messages
        .list(query.campaign_id, status, query.limit, query.offset)
        .await
        .map_err(internal_error)?;

    Ok(Json(messages))
}
