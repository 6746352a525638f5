//! HTTP request handlers for the session lifecycle surface

use super::connection::handle_socket;
use super::AppState;
use crate::error::RelayError;
use crate::registry::{SessionId, StreamInfo};
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body of a create request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateSessionRequest {
    #[serde(alias = "stream_name")]
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Body of stop and authorize requests
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionCredentials {
    #[serde(alias = "stream_id")]
    pub session_id: Option<SessionId>,
    pub password: Option<String>,
}

impl SessionCredentials {
    /// A missing session id is unknown, a missing password never matches
    fn parts(&self) -> Result<(&SessionId, &str), RelayError> {
        let session_id = self.session_id.as_ref().ok_or(RelayError::NotFound)?;
        Ok((session_id, self.password.as_deref().unwrap_or_default()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopSessionResponse {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub authorized: bool,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, RelayError> {
    let session_id = state.relay.create(request.name, request.password)?;
    Ok(Json(CreateSessionResponse {
        session_id,
        message: "Stream started successfully".to_string(),
    }))
}

/// POST /api/sessions/stop
pub async fn stop_session(
    State(state): State<AppState>,
    Json(request): Json<SessionCredentials>,
) -> Result<Json<StopSessionResponse>, RelayError> {
    let (session_id, password) = request.parts()?;
    state.relay.stop(session_id, password)?;
    Ok(Json(StopSessionResponse {
        ok: true,
        message: "Stream stopped successfully".to_string(),
    }))
}

/// GET /api/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<StreamInfo>> {
    Json(state.relay.list())
}

/// POST /api/sessions/authorize
pub async fn authorize_viewer(
    State(state): State<AppState>,
    Json(request): Json<SessionCredentials>,
) -> Result<Json<AuthorizeResponse>, RelayError> {
    let (session_id, password) = request.parts()?;
    state.relay.verify(session_id, password)?;
    Ok(Json(AuthorizeResponse { authorized: true }))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.relay.registry().len(),
        "connections": state.relay.transport().connection_count(),
    }))
}

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
