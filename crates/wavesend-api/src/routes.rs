//! API routes

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    campaigns, contact_lists, contacts, health, messages, quick_send, settings,
};
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness));

    let campaign_routes = Router::new()
        .route("/", get(campaigns::list_campaigns))
        .route("/", post(campaigns::create_campaign))
        .route("/:id", get(campaigns::get_campaign))
        .route("/:id", delete(campaigns::delete_campaign))
        .route("/:id/start", post(campaigns::start_campaign))
        .route("/:id/pause", post(campaigns::pause_campaign))
        .route("/:id/cancel", post(campaigns::cancel_campaign));

    let contact_routes = Router::new()
        .route("/", get(contacts::list_contacts))
        .route("/", post(contacts::create_contact))
        .route("/:id", get(contacts::get_contact))
        .route("/:id", put(contacts::update_contact))
        .route("/:id", delete(contacts::delete_contact));

    let contact_list_routes = Router::new()
        .route("/", get(contact_lists::list_contact_lists))
        .route("/", post(contact_lists::create_contact_list))
        .route("/:id", get(contact_lists::get_contact_list))
        .route("/:id", delete(contact_lists::delete_contact_list))
        .route("/:id/contacts", get(contact_lists::list_members))
        .route("/:id/contacts/:contact_id", post(contact_lists::add_member))
        .route(
            "/:id/contacts/:contact_id",
            delete(contact_lists::remove_member),
        )
        .route("/:id/import", post(contact_lists::import_members));

    let message_routes = Router::new().route("/", get(messages::list_messages));

    let settings_routes = Router::new()
        .route("/", get(settings::get_settings))
        .route("/", put(settings::update_settings));

    Router::new()
        .nest("/health", health_routes)
        .nest("/api/v1/campaigns", campaign_routes)
        .nest("/api/v1/contacts", contact_routes)
        .nest("/api/v1/contact-lists", contact_list_routes)
        .nest("/api/v1/messages", message_routes)
        .nest("/api/v1/settings", settings_routes)
        .route("/api/v1/quick-send", post(quick_send::quick_send))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        create_router(AppState::in_memory())
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&router(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        // No pool configured: readiness still reports ok
        let (status, _) = send(&router(), "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_campaign_crud_and_lifecycle() {
        let app = router();

        // A list with one contact to activate against
        let (status, list) = send(
            &app,
            "POST",
            "/api/v1/contact-lists",
            Some(json!({"name": "customers"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let list_id = list["id"].as_str().unwrap().to_string();

        let (status, contact) = send(
            &app,
            "POST",
            "/api/v1/contacts",
            Some(json!({"name": "Amina", "phone": "+31612345678"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let contact_id = contact["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/contact-lists/{list_id}/contacts/{contact_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Create a draft
        let (status, campaign) = send(
            &app,
            "POST",
            "/api/v1/campaigns",
            Some(json!({
                "name": "spring",
                "message_template": "Hi {{name}}",
                "contact_list_id": list_id,
                "spread_days": 1,
                "interval_seconds": 60
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(campaign["status"], "draft");
        let id = campaign["id"].as_str().unwrap().to_string();

        // Start it
        let (status, started) =
            send(&app, "POST", &format!("/api/v1/campaigns/{id}/start"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["status"], "scheduled");
        assert_eq!(started["total_messages"], 1);

        // Messages were materialized
        let (status, messages) = send(
            &app,
            "GET",
            &format!("/api/v1/messages?campaign_id={id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(messages.as_array().unwrap().len(), 1);
        assert_eq!(messages[0]["text"], "Hi Amina");

        // Pause, then cancel
        let (status, paused) =
            send(&app, "POST", &format!("/api/v1/campaigns/{id}/pause"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paused["status"], "paused");

        let (status, cancelled) = send(
            &app,
            "POST",
            &format!("/api/v1/campaigns/{id}/cancel"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "cancelled");

        // Cancelling again is a state conflict
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/campaigns/{id}/cancel"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "invalid_state");
    }

    #[tokio::test]
    async fn test_create_campaign_validation() {
        let app = router();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/campaigns",
            Some(json!({"name": "", "message_template": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/campaigns",
            Some(json!({
                "name": "x",
                "message_template": "hi",
                "interval_seconds": 10
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_contact_phone_validation() {
        let app = router();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/contacts",
            Some(json!({"name": "Bad", "phone": "06123"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_import_skips_invalid_rows() {
        let app = router();

        let (_, list) = send(
            &app,
            "POST",
            "/api/v1/contact-lists",
            Some(json!({"name": "imported"})),
        )
        .await;
        let list_id = list["id"].as_str().unwrap();

        let (status, result) = send(
            &app,
            "POST",
            &format!("/api/v1/contact-lists/{list_id}/import"),
            Some(json!({"rows": [
                {"name": "Ok One", "phone": "+31612345601"},
                {"name": "Bad Phone", "phone": "0612345602"},
                {"name": "Ok Two", "phone": "+31612345603"},
                {"name": "Dup", "phone": "+31612345601"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["imported"], 2);
        assert_eq!(result["skipped"], 2);

        let (_, members) = send(
            &app,
            "GET",
            &format!("/api/v1/contact-lists/{list_id}/contacts"),
            None,
        )
        .await;
        assert_eq!(members.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_settings_masking() {
        let app = router();

        let (status, settings) = send(&app, "GET", "/api/v1/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["api_key_configured"], false);
        assert_eq!(settings["default_interval_seconds"], 300);

        let (status, updated) = send(
            &app,
            "PUT",
            "/api/v1/settings",
            Some(json!({"api_key": "sk-secret-9876"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["api_key_configured"], true);
        assert_eq!(updated["api_key"], "••••9876");
    }

    #[tokio::test]
    async fn test_quick_send_creates_scheduled_campaign() {
        let app = router();

        let (_, contact) = send(
            &app,
            "POST",
            "/api/v1/contacts",
            Some(json!({"name": "Bo", "phone": "+14155550123"})),
        )
        .await;
        let contact_id = contact["id"].as_str().unwrap();

        let (status, campaign) = send(
            &app,
            "POST",
            "/api/v1/quick-send",
            Some(json!({"text": "Flash sale", "contact_ids": [contact_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(campaign["status"], "scheduled");
        assert_eq!(campaign["total_messages"], 1);
        assert_eq!(campaign["spread_days"], 1);

        // No recipients is rejected up front
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/quick-send",
            Some(json!({"text": "nobody"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_404() {
        let app = router();
        let id = uuid::Uuid::new_v4();
        let (status, body) = send(&app, "GET", &format!("/api/v1/campaigns/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
