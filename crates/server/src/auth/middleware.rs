use axum::{
    body::Body,
    extract::{Query, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde::Deserialize;
use tracing::warn;

use crate::{AppState, auth::AuthError, error::ApiError};

/// The signed-in user, inserted into request extensions by [`require_user`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Browsers cannot set headers on a WebSocket handshake, so the token may also come as
/// `?access_token=`.
fn bearer_token(req: &Request<Body>) -> Option<String> {
    if let Some(Authorization(bearer)) = req.headers().typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_owned());
    }
    Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.access_token)
}

pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req).ok_or(AuthError::MissingToken)?;

    let identity = match state.jwt.verify(&token) {
        Ok(identity) => identity,
        Err(error) => {
            warn!(?error, "failed to verify access token");
            return Err(error.into());
        }
    };

    req.extensions_mut().insert(CurrentUser {
        id: identity.user_id,
        name: identity.name,
    });

    Ok(next.run(req).await)
}
