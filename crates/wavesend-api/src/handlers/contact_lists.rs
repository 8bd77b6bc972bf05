//! Contact list handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wavesend_common::types::PhoneNumber;
use wavesend_storage::models::{Contact, ContactList, CreateContact, CreateContactList};

use super::{bad_request, default_limit, default_offset, internal_error, not_found, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_offset")]
    pub offset: i64,
}

/// Contact list with its member count
#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    #[serde(flatten)]
    pub list: ContactList,
    pub member_count: i64,
}

/// GET /api/v1/contact-lists
pub async fn list_contact_lists(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ContactListResponse>>, ApiError> {
    let lists = state
        .contact_lists
        .list(query.limit, query.offset)
        .await
        .map_err(internal_error)?;

    let mut response = Vec::with_capacity(lists.len());
    for list in lists {
        let member_count = state
            .contact_lists
            .member_count(list.id)
            .await
            .map_err(internal_error)?;
        response.push(ContactListResponse { list, member_count });
    }

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct CreateContactListRequest {
    pub name: String,
    pub description: Option<String>,
}

/// POST /api/v1/contact-lists
pub async fn create_contact_list(
    State(state): State<AppState>,
    Json(input): Json<CreateContactListRequest>,
) -> Result<(StatusCode, Json<ContactList>), ApiError> {
    if input.name.trim().is_empty() {
        return Err(bad_request("List name is required"));
    }

    let list = state
        .contact_lists
        .create(CreateContactList {
            name: input.name,
            description: input.description,
        })
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(list)))
}

/// GET /api/v1/contact-lists/:id
pub async fn get_contact_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactListResponse>, ApiError> {
    let list = state
        .contact_lists
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Contact list not found"))?;

    let member_count = state
        .contact_lists
        .member_count(id)
        .await
        .map_err(internal_error)?;

    Ok(Json(ContactListResponse { list, member_count }))
}

/// DELETE /api/v1/contact-lists/:id
pub async fn delete_contact_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .contact_lists
        .delete(id)
        .await
        .map_err(internal_error)?;
    if !deleted {
        return Err(not_found("Contact list not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/contact-lists/:id/contacts
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    state
        .contact_lists
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Contact list not found"))?;

    let contacts = state
        .contacts
        .list_by_list(id)
        .await
        .map_err(internal_error)?;

    Ok(Json(contacts))
}

/// POST /api/v1/contact-lists/:id/contacts/:contact_id
pub async fn add_member(
    State(state): State<AppState>,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .contact_lists
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Contact list not found"))?;
    state
        .contacts
        .get(contact_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Contact not found"))?;

    let added = state
        .contact_lists
        .add_member(id, contact_id)
        .await
        .map_err(internal_error)?;

    Ok(if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    })
}

/// DELETE /api/v1/contact-lists/:id/contacts/:contact_id
pub async fn remove_member(
    State(state): State<AppState>,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .contact_lists
        .remove_member(id, contact_id)
        .await
        .map_err(internal_error)?;
    if !removed {
        return Err(not_found("Membership not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// One row of a bulk import
#[derive(Debug, Deserialize)]
pub struct ImportRow {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<ImportRow>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub skipped: usize,
}

/// Bulk-import contacts into a list. Rows with an invalid phone number,
/// or whose phone already belongs to a member of the list, are skipped
/// rather than failing the whole import.
///
/// POST /api/v1/contact-lists/:id/import
pub async fn import_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    state
        .contact_lists
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Contact list not found"))?;

    let mut imported = 0usize;
    let mut skipped = 0usize;

    for row in input.rows {
        let Some(phone) = PhoneNumber::parse(&row.phone) else {
            skipped += 1;
            continue;
        };
        if row.name.trim().is_empty() {
            skipped += 1;
            continue;
        }

        // Reuse an existing contact with the same phone if there is one
        let existing = state
            .contacts
            .list(Some(phone.as_str()), 1, 0)
            .await
            .map_err(internal_error)?;

        let contact_id = match existing.into_iter().find(|c| c.phone == phone.as_str()) {
            Some(contact) => contact.id,
            None => {
                state
                    .contacts
                    .create(CreateContact {
                        name: row.name,
                        phone: phone.into_inner(),
                        notes: None,
                        is_group: false,
                        tags: None,
                    })
                    .await
                    .map_err(internal_error)?
                    .id
            }
        };

        if state
            .contact_lists
            .add_member(id, contact_id)
            .await
            .map_err(internal_error)?
        {
            imported += 1;
        } else {
            skipped += 1;
        }
    }

    Ok(Json(ImportResponse { imported, skipped }))
}
