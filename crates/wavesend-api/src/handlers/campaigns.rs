//! Campaign handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wavesend_storage::models::{Campaign, CampaignStatus, CreateCampaign};

use super::{
    bad_request, campaign_error, conflict, default_limit, default_offset, internal_error,
    not_found, ApiError,
};
use crate::state::AppState;

/// Query parameters for listing campaigns
#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_offset")]
    pub offset: i64,
}

/// Campaign response
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub name: String,
    pub message_template: String,
    pub contact_list_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub spread_days: i32,
    pub interval_seconds: i32,
    pub status: String,
    pub total_messages: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub progress_percentage: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(c: Campaign) -> Self {
        let progress = c.progress_percentage();
        Self {
            id: c.id,
            name: c.name,
            message_template: c.message_template,
            contact_list_id: c.contact_list_id,
            start_at: c.start_at,
            spread_days: c.spread_days,
            interval_seconds: c.interval_seconds,
            status: c.status,
            total_messages: c.total_messages,
            sent_count: c.sent_count,
            failed_count: c.failed_count,
            progress_percentage: progress,
            started_at: c.started_at,
            completed_at: c.completed_at,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Request body for creating a campaign
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub message_template: String,
    pub contact_list_id: Option<Uuid>,
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default = "default_spread_days")]
    pub spread_days: i32,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: i32,
}

fn default_spread_days() -> i32 {
    1
}

fn default_interval_seconds() -> i32 {
    300
}

/// List campaigns
///
/// GET /api/v1/campaigns
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<Vec<CampaignResponse>>, ApiError> {
    let status = match &query.status {
        Some(s) => Some(
            s.parse::<CampaignStatus>()
                .map_err(|_| bad_request(format!("Unknown campaign status: {s}")))?,
        ),
        None => None,
    };

    let campaigns = state
        .campaigns
        .list(status, query.limit, query.offset)
        .await
        .map_err(internal_error)?;

    Ok(Json(
        campaigns.into_iter().map(CampaignResponse::from).collect(),
    ))
}

/// Create a new draft campaign
///
/// POST /api/v1/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(input): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    if input.name.trim().is_empty() {
        return Err(bad_request("Campaign name is required"));
    }
    if input.message_template.trim().is_empty() {
        return Err(bad_request("Message template is required"));
    }
    if input.spread_days < 1 {
        return Err(bad_request("spread_days must be at least 1"));
    }
    if input.interval_seconds < 60 {
        return Err(bad_request("interval_seconds must be at least 60"));
    }

    let campaign = state
        .campaigns
        .create(CreateCampaign {
            name: input.name,
            message_template: input.message_template,
            contact_list_id: input.contact_list_id,
            start_at: input.start_at.unwrap_or_else(Utc::now),
            spread_days: input.spread_days,
            interval_seconds: input.interval_seconds,
        })
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(campaign.into())))
}

/// Get a campaign
///
/// GET /api/v1/campaigns/:id
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let campaign = state
        .campaigns
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Campaign not found"))?;

    Ok(Json(campaign.into()))
}

/// Delete a draft campaign
///
/// DELETE /api/v1/campaigns/:id
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .campaigns
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Campaign not found"))?;

    let deleted = state
        .campaigns
        .delete_draft(id)
        .await
        .map_err(internal_error)?;

    if !deleted {
        return Err(conflict("Only draft campaigns can be deleted"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Activate (or resume) a campaign
///
/// POST /api/v1/campaigns/:id/start
pub async fn start_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let campaign = state.manager.activate(id).await.map_err(campaign_error)?;
    Ok(Json(campaign.into()))
}

/// Pause a campaign
///
/// POST /api/v1/campaigns/:id/pause
pub async fn pause_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let campaign = state.manager.pause(id).await.map_err(campaign_error)?;
    Ok(Json(campaign.into()))
}

/// Cancel a campaign
///
/// POST /api/v1/campaigns/:id/cancel
pub async fn cancel_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let campaign = state.manager.cancel(id).await.map_err(campaign_error)?;
    Ok(Json(campaign.into()))
}
