//! API request handlers for the registration service

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dispenser_common::{PersistedRecord, RegistrationPayload, UserId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{notifier::DeviceNotification, AppState};

/// API Error type
///
/// Serialized as `{"status": "error", "kind": ..., "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": "error",
            "kind": self.kind,
            "message": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<dispenser_common::Error> for ApiError {
    fn from(err: dispenser_common::Error) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match &rejection {
            // Well-formed JSON of the wrong shape, or no JSON content type at
            // all, fails the registration like any other bad payload
            JsonRejection::JsonDataError(_) | JsonRejection::MissingJsonContentType(_) => {
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    kind: "validation",
                    message: rejection.body_text(),
                }
            }
            // Unparseable or oversized bodies keep the extractor's status
            _ => ApiError {
                status: rejection.status(),
                kind: "malformed",
                message: rejection.body_text(),
            },
        }
    }
}

/// Response from a successful registration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub status: &'static str,
    pub saved_to: String,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "registration-service"
    }))
}

/// Save a registration to `<data_dir>/<identifier>.json`
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegistrationPayload>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        error!("Error saving registration: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    info!(
        "Received registration data for: {}",
        payload.name.as_deref().unwrap_or("<missing>")
    );

    let (user_id, saved_to, record) = persist(&state, payload).await.map_err(|e| {
        error!("Error saving registration: {}", e);
        ApiError::from(e)
    })?;

    info!("Data saved locally to {}", saved_to);

    // Delivered after the response, detached from the request
    let notification = DeviceNotification {
        user_id,
        saved_to: saved_to.clone(),
        record,
    };
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&notification).await {
            warn!(
                "Failed to notify dispenser for {}: {:#}",
                notification.user_id, e
            );
        }
    });

    Ok(Json(RegisterResponse {
        status: "success",
        saved_to,
    }))
}

async fn persist(
    state: &AppState,
    payload: RegistrationPayload,
) -> dispenser_common::Result<(UserId, String, PersistedRecord)> {
    let record = PersistedRecord::from_payload(payload)?;
    info!(
        "Schedule contains {} medication times",
        record.schedules.len()
    );

    let user_id = record.user_id()?;
    let path = state.store.save(&user_id, &record).await?;

    Ok((user_id, path.display().to_string(), record))
}

/// Fetch a stored record by identifier
pub async fn get_record_handler(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<PersistedRecord>, ApiError> {
    let user_id = UserId::parse(&identifier).map_err(|e| ApiError {
        status: StatusCode::BAD_REQUEST,
        kind: e.kind(),
        message: e.to_string(),
    })?;

    match state.store.load(&user_id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: format!("No registration stored for: {}", user_id),
        }),
    }
}
