use axum::{
    Extension, Json, Router,
    extract::{
        Query, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Json as ResponseJson},
    routing::get,
};
use db::models::{
    activity::{Activity, CreateActivity},
    board::Board,
};
use serde::Deserialize;
use services::services::friendly_errors::Feature;
use ts_rs::TS;
use utils::{feed_msg::FeedChannel, response::ApiResponse};
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    ws_util::{WsKeepAlive, feed_frames, run_ws_stream},
};

#[derive(Debug, Deserialize, TS)]
pub struct ActivityQuery {
    pub limit: Option<u32>,
}

/// Write an activity row and push it to the board's activity feed.
///
/// The activity log is a side channel: failures are logged and swallowed so they never
/// fail the mutation being recorded.
pub async fn record_activity(
    state: &AppState,
    board_id: Uuid,
    user_id: &str,
    activity: CreateActivity,
) -> Option<Activity> {
    match Activity::create(state.pool(), board_id, user_id, &activity).await {
        Ok(created) => {
            state
                .feed
                .publish_insert(FeedChannel::Activities, board_id, &created);
            Some(created)
        }
        Err(e) => {
            tracing::warn!(
                %board_id,
                action = %activity.action,
                entity_type = %activity.entity_type,
                "Failed to record activity: {}",
                e
            );
            None
        }
    }
}

/// GET /api/boards/{board_id}/activities - newest first
pub async fn list_activities(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Activity>>>, ApiError> {
    let limit = state.config().activity_limit(query.limit);
    let activities = Activity::find_by_board(state.pool(), board.id, i64::from(limit))
        .await
        .feature_failed_to(Feature::Activities, "load activities")?;
    Ok(ResponseJson(ApiResponse::success(activities)))
}

/// POST /api/boards/{board_id}/activities - log a client-side event
pub async fn create_activity(
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<CreateActivity>,
) -> Result<ResponseJson<ApiResponse<Activity>>, ApiError> {
    let activity = Activity::create(state.pool(), board.id, &user.id, &payload)
        .await
        .feature_failed_to(Feature::Activities, "record the activity")?;
    state
        .feed
        .publish_insert(FeedChannel::Activities, board.id, &activity);
    Ok(ResponseJson(ApiResponse::success(activity)))
}

/// GET /api/boards/{board_id}/activities/ws - live activity inserts
pub async fn stream_activities_ws(
    ws: WebSocketUpgrade,
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_feed_ws(socket, state, FeedChannel::Activities, board.id).await {
            tracing::warn!("activities WS closed: {}", e);
        }
    })
}

pub(crate) async fn handle_feed_ws(
    socket: WebSocket,
    state: AppState,
    channel: FeedChannel,
    board_id: Uuid,
) -> anyhow::Result<()> {
    tracing::debug!(topic = %channel.topic(board_id), "Feed subscription opened");
    let stream = feed_frames(state.feed.subscribe(channel, board_id));
    let result = run_ws_stream(socket, stream, WsKeepAlive::default()).await;
    tracing::debug!(topic = %channel.topic(board_id), "Feed subscription closed");
    result
}

pub fn board_routes() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route("/activities/ws", get(stream_activities_ws))
}
