use axum::{
    Extension, Json, Router,
    extract::{Path, State, ws::WebSocketUpgrade},
    response::{IntoResponse, Json as ResponseJson},
    routing::{delete, get},
};
use db::{
    models::{
        board::Board,
        message::{CreateMessage, Message},
    },
    validation::validate_not_blank,
};
use services::services::friendly_errors::Feature;
use utils::{feed_msg::FeedChannel, response::ApiResponse};
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::board_for_user,
    routes::activities::handle_feed_ws,
};

/// GET /api/boards/{board_id}/messages - board chat, oldest first
pub async fn list_messages(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = Message::find_by_board(state.pool(), board.id)
        .await
        .feature_failed_to(Feature::Messages, "load messages")?;
    Ok(ResponseJson(ApiResponse::success(messages)))
}

/// POST /api/boards/{board_id}/messages
pub async fn create_message(
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<CreateMessage>,
) -> Result<ResponseJson<ApiResponse<Message>>, ApiError> {
    validate_not_blank("Message", &payload.content)?;
    let message = Message::create(state.pool(), board.id, &user.id, &payload)
        .await
        .feature_failed_to(Feature::Messages, "send the message")?;

    state
        .feed
        .publish_insert(FeedChannel::Messages, board.id, &message);
    Ok(ResponseJson(ApiResponse::success(message)))
}

/// GET /api/boards/{board_id}/messages/ws - live chat inserts
pub async fn stream_messages_ws(
    ws: WebSocketUpgrade,
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_feed_ws(socket, state, FeedChannel::Messages, board.id).await {
            tracing::warn!("messages WS closed: {}", e);
        }
    })
}

/// DELETE /api/messages/{message_id} - authors only
pub async fn delete_message(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = state.pool();
    let message = Message::find_by_id(pool, message_id)
        .await
        .feature_failed_to(Feature::Messages, "load the message")?
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;
    board_for_user(pool, message.board_id, &user).await?;
    if message.user_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the author can delete a message".to_string(),
        ));
    }

    Message::delete(pool, message.id)
        .await
        .feature_failed_to(Feature::Messages, "delete the message")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn board_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages).post(create_message))
        .route("/messages/ws", get(stream_messages_ws))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/messages/{message_id}", delete(delete_message))
}
