//! Chat routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, warn};

use chatrelay_chat::{ChatReply, ChatRequest};

use crate::error::AppError;
use crate::session::SessionHandle;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/reset", post(reset))
}

/// POST /chat: one conversational turn for the caller's session.
async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let message = match body {
        Ok(Json(req)) => req.message().map(str::to_string),
        Err(rejection) => {
            warn!("Rejected chat body: {}", rejection);
            None
        }
    };
    let Some(message) = message else {
        return AppError::MissingMessage.into_response();
    };

    let session = state.sessions.resolve(&headers);
    let result = {
        let mut entry = session.lock().await;
        state.responder.reply(&mut entry.conversation, &message).await
    };

    let response = match result {
        Ok(reply) => {
            info!("Replied in session {} ({} chars)", session.id, reply.len());
            (StatusCode::OK, Json(ChatReply { reply })).into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    };
    with_session_cookie(&state, &session, response)
}

/// POST /chat/reset: forget the caller's history.
async fn reset(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = state.sessions.resolve(&headers);
    session.lock().await.conversation.reset();
    let response = Json(serde_json::json!({ "reset": true })).into_response();
    with_session_cookie(&state, &session, response)
}

fn with_session_cookie(state: &AppState, session: &SessionHandle, mut response: Response) -> Response {
    if session.is_new {
        if let Ok(value) = HeaderValue::from_str(&state.sessions.set_cookie_header(&session.id)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}
