use api_types::auth::{Login, LoginResponse};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Utc;

use crate::{ServerError, server::ServerState};

pub async fn home() -> &'static str {
    "API index page"
}

pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<Login>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServerError> {
    let Ok(Json(payload)) = payload else {
        return Err(ServerError::Generic("Missing JSON in request".to_string()));
    };

    match state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await?
    {
        Some(user) => {
            let access_token = state.tokens.issue(user.id, Utc::now())?;
            tracing::info!(user = %user.id, "login");
            Ok(Json(LoginResponse { access_token }))
        }
        None => {
            tracing::warn!("bad login");
            Err(ServerError::Unauthorized("Bad login".to_string()))
        }
    }
}
