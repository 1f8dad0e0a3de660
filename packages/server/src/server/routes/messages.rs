//! Conversation history and message moderation.
//!
//! GET  /api/conversations/:id/messages - history fetch; how an offline
//!      recipient catches up on messages the hub never delivered.
//! POST /api/messages/:id/report - at most one report per user per message.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{ConversationId, MessageId};
use crate::domains::auth::Claims;
use crate::domains::messaging::models::{Message, MessageReport};
use crate::server::app::AppState;
use crate::server::routes::{extract_bearer_token, status_for};

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Claims, StatusCode> {
    let token = extract_bearer_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    state
        .jwt_service
        .verify_token(&token)
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

pub async fn conversation_messages_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<Message>>, StatusCode> {
    let claims = authenticate(&state, &headers)?;

    state
        .coordinator
        .conversation_messages(ConversationId::from_uuid(id), claims.user_id())
        .await
        .map(Json)
        .map_err(|e| status_for(&e))
}

#[derive(Deserialize)]
pub struct ReportBody {
    reason: String,
}

pub async fn report_message_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ReportBody>,
) -> Result<(StatusCode, Json<MessageReport>), StatusCode> {
    let claims = authenticate(&state, &headers)?;

    state
        .coordinator
        .report_message(MessageId::from_uuid(id), claims.user_id(), body.reason)
        .await
        .map(|report| (StatusCode::CREATED, Json(report)))
        .map_err(|e| status_for(&e))
}
