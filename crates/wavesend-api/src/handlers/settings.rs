//! Settings handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wavesend_storage::models::{Settings, UpdateSettings};

use super::{bad_request, internal_error, ApiError};
use crate::state::AppState;

/// Settings with the API key masked down to its last four characters
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub api_key: Option<String>,
    pub api_key_configured: bool,
    pub default_interval_seconds: i32,
    pub max_messages_per_day: i32,
    pub updated_at: DateTime<Utc>,
}

fn mask_api_key(key: &str) -> String {
    let last4: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("••••{last4}")
}

impl From<Settings> for SettingsResponse {
    fn from(s: Settings) -> Self {
        Self {
            api_key_configured: s.api_key.is_some(),
            api_key: s.api_key.as_deref().map(mask_api_key),
            default_interval_seconds: s.default_interval_seconds,
            max_messages_per_day: s.max_messages_per_day,
            updated_at: s.updated_at,
        }
    }
}

/// GET /api/v1/settings
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state
        .settings
        .get_or_default()
        .await
        .map_err(internal_error)?;

    Ok(Json(settings.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub api_key: Option<String>,
    pub default_interval_seconds: Option<i32>,
    pub max_messages_per_day: Option<i32>,
}

/// PUT /api/v1/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if let Some(interval) = input.default_interval_seconds {
        if interval < 1 {
            return Err(bad_request("default_interval_seconds must be positive"));
        }
    }
    if let Some(max) = input.max_messages_per_day {
        if max < 1 {
            return Err(bad_request("max_messages_per_day must be positive"));
        }
    }
    if let Some(key) = &input.api_key {
        if key.trim().is_empty() {
            return Err(bad_request("api_key must not be blank"));
        }
    }

    let settings = state
        .settings
        .update(UpdateSettings {
            api_key: input.api_key,
            default_interval_seconds: input.default_interval_seconds,
            max_messages_per_day: input.max_messages_per_day,
        })
        .await
        .map_err(internal_error)?;

    Ok(Json(settings.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mask_keeps_only_last_four() {
        assert_eq!(mask_api_key("sk-abcdef123456"), "••••3456");
        assert_eq!(mask_api_key("ab"), "••••ab");
    }
}
