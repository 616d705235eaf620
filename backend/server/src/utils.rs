use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use directory::Actor;

/// Set by the authenticating proxy in front of the server.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller, if the proxy identified one.
pub struct CurrentActor(pub Option<Actor>);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentActor(actor_from_headers(&parts.headers)))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let uid = header(headers, USER_ID_HEADER)?;
    let role = header(headers, USER_ROLE_HEADER).unwrap_or_default();

    Some(Actor::new(uid, role))
}
