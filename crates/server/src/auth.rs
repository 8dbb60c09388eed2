//! Bearer tokens and the middleware guarding private routes.
//!
//! A token is `base64url(claims).base64url(hmac_sha256(secret, claims))`
//! where `claims` is the JSON `{"sub": "<user id>", "exp": <unix secs>}`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use engine::{EngineError, ObjectId};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::Instrument;

use crate::{ServerError, server::ServerState};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issues and checks signed access tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

fn invalid_token() -> ServerError {
    ServerError::Unauthorized("invalid token".to_string())
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    fn mac(&self) -> Result<HmacSha256, ServerError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|err| {
            tracing::error!("invalid token secret: {err}");
            ServerError::Generic("token signing failed".to_string())
        })
    }

    pub fn issue(&self, user_id: ObjectId, now: DateTime<Utc>) -> Result<String, ServerError> {
        let expires = now.checked_add_signed(self.ttl).ok_or_else(|| {
            tracing::error!(ttl = %self.ttl, "token expiry out of range");
            ServerError::Generic("token signing failed".to_string())
        })?;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires.timestamp(),
        };
        let payload = serde_json::to_vec(&claims)
            .map_err(|err| ServerError::Generic(format!("token encoding failed: {err}")))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<ObjectId, ServerError> {
        let (payload, signature) = token.split_once('.').ok_or_else(invalid_token)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| invalid_token())?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid_token())?;

        let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid_token())?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| invalid_token())?;
        if claims.exp <= now.timestamp() {
            return Err(ServerError::Unauthorized("token expired".to_string()));
        }

        claims.sub.parse().map_err(|_| invalid_token())
    }
}

pub(crate) async fn auth(
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let bearer = match bearer {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) if rejection.is_missing() => {
            return Err(ServerError::Unauthorized(
                "missing authorization header".to_string(),
            ));
        }
        Err(rejection) => {
            tracing::debug!("rejected authorization header: {rejection}");
            return Err(ServerError::Unauthorized(
                "malformed authorization header".to_string(),
            ));
        }
    };

    let user_id = state.tokens.verify(bearer.token(), Utc::now())?;
    let user = match state.engine.user(user_id).await {
        Ok(user) => user,
        Err(EngineError::KeyNotFound(_)) => {
            tracing::warn!(%user_id, "token for unknown user");
            return Err(invalid_token());
        }
        Err(err) => return Err(err.into()),
    };

    let span = tracing::debug_span!("request", user = %user.email);
    Ok(next.run(request).instrument(span).await)
}
