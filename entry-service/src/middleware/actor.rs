use crate::models::SYSTEM_ACTOR;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

pub const USER_ID_HEADER: &str = "X-User-ID";

/// Audit label for writes. Taken from the `X-User-ID` header the gateway
/// forwards; requests without it are attributed to `system`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(SYSTEM_ACTOR);

        tracing::Span::current().record("user_id", actor);

        Ok(Actor(actor.to_string()))
    }
}
