//! Contact handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use wavesend_common::types::PhoneNumber;
use wavesend_storage::models::{Contact, CreateContact, UpdateContact};

use super::{bad_request, default_limit, default_offset, internal_error, not_found, ApiError};
use crate::state::AppState;

/// Query parameters for listing contacts
#[derive(Debug, Deserialize)]
pub struct ListContactsQuery {
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_offset")]
    pub offset: i64,
}

/// Request body for creating a contact
#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub phone: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    pub tags: Option<String>,
}

/// GET /api/v1/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListContactsQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state
        .contacts
        .list(query.search.as_deref(), query.limit, query.offset)
        .await
        .map_err(internal_error)?;

    Ok(Json(contacts))
}

/// POST /api/v1/contacts
pub async fn create_contact(
    State(state): State<AppState>,
    Json(input): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    if input.name.trim().is_empty() {
        return Err(bad_request("Contact name is required"));
    }
    let phone: PhoneNumber = input
        .phone
        .parse()
        .map_err(|e: wavesend_common::Error| bad_request(e.to_string()))?;

    let contact = state
        .contacts
        .create(CreateContact {
            name: input.name,
            phone: phone.into_inner(),
            notes: input.notes,
            is_group: input.is_group,
            tags: input.tags,
        })
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /api/v1/contacts/:id
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state
        .contacts
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Contact not found"))?;

    Ok(Json(contact))
}

/// Request body for updating a contact
#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub is_group: Option<bool>,
    pub tags: Option<String>,
}

/// PUT /api/v1/contacts/:id
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateContactRequest>,
) -> Result<Json<Contact>, ApiError> {
    let phone = match &input.phone {
        Some(p) => {
            let parsed: PhoneNumber = p
                .parse()
                .map_err(|e: wavesend_common::Error| bad_request(e.to_string()))?;
            Some(parsed.into_inner())
        }
        None => None,
    };

    let contact = state
        .contacts
        .update(
            id,
            UpdateContact {
                name: input.name,
                phone,
                notes: input.notes,
                is_group: input.is_group,
                tags: input.tags,
            },
        )
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Contact not found"))?;

    Ok(Json(contact))
}

/// DELETE /api/v1/contacts/:id
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.contacts.delete(id).await.map_err(internal_error)?;
    if !deleted {
        return Err(not_found("Contact not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
