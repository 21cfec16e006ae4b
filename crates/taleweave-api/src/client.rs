//! Client address extractor.
//!
//! The address is used raw for rate limiting and hashed for attribution. It is
//! never persisted, logged, or echoed back.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{HeaderName, request::Parts},
};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Recorded when neither a forwarding header nor a peer address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The requesting client's network address.
///
/// Priority:
/// 1. First entry of `X-Forwarded-For` (set by a reverse proxy)
/// 2. The transport peer address, when the server was started with
///    `into_make_service_with_connect_info`
/// 3. [`UNKNOWN_CLIENT`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub String);

impl ClientAddress {
  fn from_parts(parts: &Parts) -> Self {
    let forwarded = parts
      .headers
      .get(X_FORWARDED_FOR)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| s.split(',').next())
      .map(str::trim)
      .filter(|s| !s.is_empty());

    if let Some(addr) = forwarded {
      return Self(addr.to_owned());
    }

    match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
      Some(ConnectInfo(peer)) => Self(peer.ip().to_string()),
      None => Self(UNKNOWN_CLIENT.to_owned()),
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl<S> FromRequestParts<S> for ClientAddress
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self::from_parts(parts))
  }
}
