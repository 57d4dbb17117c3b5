use axum::{
    Router,
    http::{Request, header::HeaderName},
    middleware::from_fn_with_state,
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, field};
use utils::assets::ATTACHMENTS_BUCKET;

use crate::{AppState, auth::require_user};

pub mod activities;
pub mod attachments;
pub mod boards;
pub mod checklists;
pub mod columns;
pub mod comments;
pub mod config;
pub mod custom_fields;
pub mod demo;
pub mod health;
pub mod messages;
pub mod milestones;
pub mod recurring_tasks;
pub mod tags;
pub mod task_relations;
pub mod tasks;
pub mod time_entries;

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok());
            let span = tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = field::Empty
            );
            if let Some(request_id) = request_id {
                span.record("request_id", field::display(request_id));
            }
            span
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR));

    let public = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .merge(config::router());

    let protected = Router::<AppState>::new()
        .merge(boards::router(&state))
        .merge(columns::router(&state))
        .merge(tasks::router(&state))
        .merge(messages::router())
        .merge(tags::router())
        .merge(checklists::router())
        .merge(comments::router())
        .merge(time_entries::router())
        .merge(custom_fields::router())
        .merge(milestones::router())
        .merge(task_relations::router())
        .merge(demo::router())
        .route_layer(from_fn_with_state(state.clone(), require_user));

    let storage = ServeDir::new(state.attachments.bucket_dir());

    Router::<AppState>::new()
        .nest("/api", public)
        .nest("/api", protected)
        .nest_service(&format!("/storage/{ATTACHMENTS_BUCKET}"), storage)
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            MakeRequestUuid {},
        ))
        .with_state(state)
}
