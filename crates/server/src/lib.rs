use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::{EngineError, LabelKind, ObjectId};

use serde::Serialize;
pub use auth::TokenSigner;
pub use notifications::{DeliveryError, LogNotifier, Notification, NotificationSettings, Notifier};
pub use server::{ServerState, router, run_with_listener};

mod auth;
mod expenses;
mod labels;
mod notifications;
mod reports;
mod server;
mod views;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    Unauthorized(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

const UNIQUE_NAME: &str = "Name value must be unique";

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_)
        | EngineError::InvalidId(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidPayments(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidField(_)
        | EngineError::InvalidReference(_) => StatusCode::BAD_REQUEST,
        EngineError::CounterUnderflow(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::ExistingKey(_) => UNIQUE_NAME.to_string(),
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::CounterUnderflow(msg) => {
            tracing::error!("integrity error: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

/// Id taken from the URL. Anything that does not parse can't exist, so it is
/// reported as not found.
fn path_id(value: &str, what: &str) -> Result<ObjectId, ServerError> {
    value
        .parse()
        .map_err(|_| ServerError::Engine(EngineError::KeyNotFound(format!("{what} not exists"))))
}

fn label_path_id(value: &str, kind: LabelKind) -> Result<ObjectId, ServerError> {
    path_id(value, kind.as_str())
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn existing_key_maps_to_400_with_fixed_message() {
        let res = ServerError::from(EngineError::ExistingKey("Visa".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], UNIQUE_NAME);
    }

    #[test]
    fn engine_validation_maps_to_400() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InvalidPayments("x".to_string()),
            EngineError::InvalidReference("x".to_string()),
            EngineError::InvalidId("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn underflow_is_internal_and_hidden() {
        let res = ServerError::from(EngineError::CounterUnderflow("Visa -1".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "internal server error");
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized("nope".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_path_id_is_not_found() {
        let res = path_id("not-an-id", "expense").err().unwrap().into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
