use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use crate::http::AppState;
use crate::identity::Identity;
use crate::EcommerceError;

pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// The request's identity, if the gateway forwarded one.
#[derive(Clone, Debug)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    pub fn identity(&self) -> Option<&Identity> { self.0.as_ref() }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Identity::from_headers(&parts.headers)))
    }
}

/// Proof that the request carried the shared internal key.
#[derive(Clone, Copy, Debug)]
pub struct InternalCaller;

#[axum::async_trait]
impl FromRequestParts<AppState> for InternalCaller {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.internal_api_key.as_deref() else {
            tracing::warn!("internal call rejected; INTERNAL_API_KEY is not configured");
            return Err(EcommerceError::Forbidden);
        };
        let presented = parts.headers.get(INTERNAL_KEY_HEADER).and_then(|v| v.to_str().ok());
        match presented {
            None => Err(EcommerceError::Unauthorized),
            Some(key) if key == expected => Ok(Self),
            Some(_) => Err(EcommerceError::Forbidden),
        }
    }
}
