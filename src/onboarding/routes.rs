//! REST endpoints for running wizards.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::model::WizardKind;
use super::registry::{SharedWizard, WizardRegistry};
use super::wizard::WizardView;
use crate::error::{OtpError, SubmitError, WizardError};
use crate::validation::FieldInput;

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardRouteState {
    pub registry: Arc<WizardRegistry>,
}

/// Build the wizard REST routes.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/wizards", post(create_wizard))
        .route("/api/wizards/{id}", get(get_wizard).delete(delete_wizard))
        .route("/api/wizards/{id}/fields/{name}", put(set_field))
        .route("/api/wizards/{id}/advance", post(advance))
        .route("/api/wizards/{id}/retreat", post(retreat))
        .route("/api/wizards/{id}/otp/resend", post(resend_code))
        .route("/api/wizards/{id}/submit", post(submit))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "safetrade-onboarding"
    }))
}

#[derive(Deserialize)]
struct CreateRequest {
    kind: WizardKind,
}

/// POST /api/wizards
async fn create_wizard(
    State(state): State<WizardRouteState>,
    Json(body): Json<CreateRequest>,
) -> impl IntoResponse {
    let (_, wizard) = state.registry.create(body.kind).await;
    let view = wizard.lock().await.view();
    (StatusCode::CREATED, Json(serde_json::json!(view)))
}

/// GET /api/wizards/{id}
async fn get_wizard(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let wizard = match lookup(&state, &id).await {
        Ok(wizard) => wizard,
        Err(response) => return response,
    };
    let view = wizard.lock().await.view();
    (StatusCode::OK, Json(serde_json::json!(view))).into_response()
}

/// PUT /api/wizards/{id}/fields/{name}
///
/// Body is a `FieldInput`, e.g. `{"text": "Abebe"}`, `{"flag": true}`,
/// `{"file": {"name": "id.png", "size_bytes": 1024}}` or `"clear"`.
async fn set_field(
    State(state): State<WizardRouteState>,
    Path((id, name)): Path<(String, String)>,
    Json(input): Json<FieldInput>,
) -> Response {
    let wizard = match lookup(&state, &id).await {
        Ok(wizard) => wizard,
        Err(response) => return response,
    };
    let mut wizard = wizard.lock().await;
    match wizard.set_field(&name, input) {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!(wizard.view()))).into_response(),
        Err(e) => error_response(&e, Some(&wizard.view())),
    }
}

/// POST /api/wizards/{id}/advance
async fn advance(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let wizard = match lookup(&state, &id).await {
        Ok(wizard) => wizard,
        Err(response) => return response,
    };
    let mut wizard = wizard.lock().await;
    match wizard.advance().await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({"advance": outcome, "wizard": wizard.view()})),
        )
            .into_response(),
        Err(e) => error_response(&e, Some(&wizard.view())),
    }
}

/// POST /api/wizards/{id}/retreat
async fn retreat(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let wizard = match lookup(&state, &id).await {
        Ok(wizard) => wizard,
        Err(response) => return response,
    };
    let mut wizard = wizard.lock().await;
    wizard.retreat();
    (StatusCode::OK, Json(serde_json::json!(wizard.view()))).into_response()
}

/// POST /api/wizards/{id}/otp/resend
async fn resend_code(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let wizard = match lookup(&state, &id).await {
        Ok(wizard) => wizard,
        Err(response) => return response,
    };
    let mut wizard = wizard.lock().await;
    match wizard.resend_code().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!(wizard.view()))).into_response(),
        Err(e) => error_response(&e, Some(&wizard.view())),
    }
}

/// POST /api/wizards/{id}/submit
///
/// A completed wizard is dropped from the registry; the response carries its
/// final view.
async fn submit(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let shared = match lookup(&state, &id).await {
        Ok(wizard) => wizard,
        Err(response) => return response,
    };
    let mut wizard = shared.lock().await;
    let body = match wizard.submit_final().await {
        Ok(completion) => {
            serde_json::json!({"completion": completion, "wizard": wizard.view()})
        }
        Err(e) => return error_response(&e, Some(&wizard.view())),
    };
    let wizard_id = wizard.id();
    drop(wizard);
    state.registry.remove(wizard_id).await;
    (StatusCode::OK, Json(body)).into_response()
}

/// DELETE /api/wizards/{id}
async fn delete_wizard(
    State(state): State<WizardRouteState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(wizard_id) = Uuid::parse_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid wizard ID"})),
        );
    };
    if state.registry.remove(wizard_id).await {
        (
            StatusCode::OK,
            Json(serde_json::json!({"status": "removed"})),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Wizard not found"})),
        )
    }
}

async fn lookup(state: &WizardRouteState, id: &str) -> Result<SharedWizard, Response> {
    let wizard_id = match Uuid::parse_str(id) {
        Ok(id) => id,
        Err(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid wizard ID"})),
            )
                .into_response());
        }
    };
    state.registry.get(wizard_id).await.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Wizard not found"})),
        )
            .into_response()
    })
}

fn status_for(err: &WizardError) -> StatusCode {
    match err {
        WizardError::StepInvalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::UnknownField { .. } => StatusCode::NOT_FOUND,
        WizardError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
        WizardError::NotAtFinalStep { .. }
        | WizardError::AlreadyComplete
        | WizardError::Busy => StatusCode::CONFLICT,
        WizardError::Otp(otp) => match otp {
            OtpError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
            OtpError::InvalidFormat { .. } | OtpError::CodeMismatch => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            OtpError::NotSent | OtpError::AlreadyVerified => StatusCode::CONFLICT,
            OtpError::Dispatch { .. } => StatusCode::BAD_GATEWAY,
            OtpError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        },
        WizardError::Submit(submit) => match submit {
            SubmitError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SubmitError::Unavailable { .. } => StatusCode::BAD_GATEWAY,
            SubmitError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        },
    }
}

fn error_response(err: &WizardError, view: Option<&WizardView>) -> Response {
    let status = status_for(err);
    debug!(status = %status, error = %err, "Wizard request failed");

    let mut body = serde_json::json!({ "error": err.to_string() });
    if let WizardError::StepInvalid { errors, .. } = err {
        body["details"] = serde_json::json!(errors);
    }
    if let WizardError::Otp(OtpError::CooldownActive { remaining }) = err {
        body["retry_after_secs"] = serde_json::json!(remaining);
    }
    if let Some(view) = view {
        body["wizard"] = serde_json::json!(view);
    }
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::WizardConfig;
    use crate::onboarding::wizard::WizardDeps;

    fn app() -> Router {
        let config = WizardConfig {
            simulated_delay: Duration::ZERO,
            ..WizardConfig::default()
        };
        let registry = WizardRegistry::new(WizardDeps::simulated(&config));
        wizard_routes(WizardRouteState { registry })
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(json) => request.body(Body::from(json.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn create(app: &Router, kind: &str) -> String {
        let (status, json) = call(
            app,
            "POST",
            "/api/wizards",
            Some(serde_json::json!({"kind": kind})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, json) = call(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn create_returns_first_step() {
        let app = app();
        let id = create(&app, "kyc").await;
        let (status, json) = call(&app, "GET", &format!("/api/wizards/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["current_step"], 1);
        assert_eq!(json["total_steps"], 4);
        assert_eq!(json["progress_percent"], 0.0);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let app = app();
        let missing = Uuid::new_v4();
        let (status, _) = call(&app, "GET", &format!("/api/wizards/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "POST", "/api/wizards/not-a-uuid/advance", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_step_is_unprocessable_with_inline_errors() {
        let app = app();
        let id = create(&app, "sign_up").await;
        let (status, json) =
            call(&app, "POST", &format!("/api/wizards/{id}/advance"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["wizard"]["current_step"], 1);
        assert_eq!(
            json["wizard"]["errors"]["fullName"],
            "Full name is required"
        );
        assert_eq!(json["details"][0]["kind"], "missing_field");
    }

    #[tokio::test]
    async fn password_is_never_echoed() {
        let app = app();
        let id = create(&app, "sign_up").await;
        let (status, json) = call(
            &app,
            "PUT",
            &format!("/api/wizards/{id}/fields/password"),
            Some(serde_json::json!({"text": "Secure#123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!json.to_string().contains("Secure#123"));
        assert_eq!(json["password_strength"]["met"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unknown_field_is_not_found() {
        let app = app();
        let id = create(&app, "sign_up").await;
        let (status, _) = call(
            &app,
            "PUT",
            &format!("/api/wizards/{id}/fields/selfieFile"),
            Some(serde_json::json!("clear")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_wizard() {
        let app = app();
        let id = create(&app, "kyc").await;
        let (status, _) = call(&app, "DELETE", &format!("/api/wizards/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "DELETE", &format!("/api/wizards/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn completed_wizard_leaves_the_registry() {
        let config = WizardConfig {
            simulated_delay: Duration::ZERO,
            ..WizardConfig::default()
        };
        let registry = WizardRegistry::new(WizardDeps::simulated(&config));
        let app = wizard_routes(WizardRouteState {
            registry: Arc::clone(&registry),
        });
        let id = create(&app, "sign_up").await;

        for (name, input) in [
            ("fullName", serde_json::json!({"text": "Abebe Kebede"})),
            ("email", serde_json::json!({"text": "abebe@example.com"})),
            ("password", serde_json::json!({"text": "Secure#123"})),
            ("confirmPassword", serde_json::json!({"text": "Secure#123"})),
            ("terms", serde_json::json!({"flag": true})),
        ] {
            let uri = format!("/api/wizards/{id}/fields/{name}");
            assert_eq!(call(&app, "PUT", &uri, Some(input)).await.0, StatusCode::OK);
        }
        call(&app, "POST", &format!("/api/wizards/{id}/advance"), None).await;
        call(
            &app,
            "PUT",
            &format!("/api/wizards/{id}/fields/phoneNumber"),
            Some(serde_json::json!({"text": "0911234567"})),
        )
        .await;
        call(&app, "POST", &format!("/api/wizards/{id}/advance"), None).await;
        call(
            &app,
            "PUT",
            &format!("/api/wizards/{id}/fields/otp"),
            Some(serde_json::json!({"text": "123456"})),
        )
        .await;

        let (_, json) = call(&app, "POST", &format!("/api/wizards/{id}/advance"), None).await;
        assert_eq!(json["advance"]["outcome"], "at_final_step");
        assert_eq!(registry.len().await, 1);

        let (status, json) = call(&app, "POST", &format!("/api/wizards/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["wizard"]["status"], "complete");
        assert_eq!(registry.len().await, 0);

        let (status, _) = call(&app, "GET", &format!("/api/wizards/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejected_submit_keeps_the_wizard() {
        let config = WizardConfig {
            simulated_delay: Duration::ZERO,
            ..WizardConfig::default()
        };
        let registry = WizardRegistry::new(WizardDeps::simulated(&config));
        let app = wizard_routes(WizardRouteState {
            registry: Arc::clone(&registry),
        });
        let id = create(&app, "kyc").await;

        let (status, _) = call(&app, "POST", &format!("/api/wizards/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(registry.len().await, 1);
    }

    #[test]
    fn cooldown_maps_to_too_many_requests() {
        let err = WizardError::Otp(OtpError::CooldownActive { remaining: 45 });
        assert_eq!(status_for(&err), StatusCode::TOO_MANY_REQUESTS);
        let response = error_response(&err, None);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
