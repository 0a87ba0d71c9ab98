/// Rate Limiting System
///
/// Public requests get a much smaller, per-address budget than authenticated
/// ones, which slows down secret guessing against emergency links. Link
/// redemption always draws from the public budget, whatever headers it carries.
use crate::{
    api::middleware::extract_bearer_token,
    auth::verify_jwt_token,
    config::RateLimitConfig,
    context::AppContext,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter as GovernorLimiter};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

/// Budget a request is charged against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitKey {
    /// Anonymous callers and link redemptions, keyed by peer address
    Public(IpAddr),
    /// Requests with a verified bearer token, keyed by owner id
    Authenticated(String),
}

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    public: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    authenticated: Arc<DefaultKeyedRateLimiter<String>>,
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let public_quota = Quota::per_second(non_zero(config.public_rps))
            .allow_burst(non_zero(config.burst_size / 5));

        let authenticated_quota = Quota::per_second(non_zero(config.authenticated_rps))
            .allow_burst(non_zero(config.burst_size));

        Self {
            enabled: config.enabled,
            public: Arc::new(GovernorLimiter::keyed(public_quota)),
            authenticated: Arc::new(GovernorLimiter::keyed(authenticated_quota)),
        }
    }

    /// Check rate limit for an unauthenticated caller
    pub fn check_public(&self, peer: IpAddr) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.public.check_key(&peer).map_err(|_| Self::exceeded())
    }

    /// Check rate limit for an authenticated owner
    pub fn check_authenticated(&self, owner_id: &str) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.authenticated
            .check_key(&owner_id.to_string())
            .map_err(|_| Self::exceeded())
    }

    pub fn check(&self, key: &RateLimitKey) -> ApiResult<()> {
        match key {
            RateLimitKey::Public(peer) => self.check_public(*peer),
            RateLimitKey::Authenticated(owner_id) => self.check_authenticated(owner_id),
        }
    }

    /// Drop per-key state that has fully replenished
    pub fn retain_recent(&self) {
        self.public.retain_recent();
        self.authenticated.retain_recent();
    }

    fn exceeded() -> ApiError {
        ApiError::RateLimitExceeded {
            retry_after: Duration::from_secs(1),
        }
    }
}

/// Whether the request redeems an emergency access link
fn is_link_redemption(method: &Method, path: &str) -> bool {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    *method == Method::GET && matches!(segments.as_slice(), ["family", _, "emergency-access", _])
}

/// Decide which budget a request draws from
///
/// Only a bearer token that verifies against `jwt_secret` earns the
/// authenticated budget. Without a peer address (in-process callers) all
/// anonymous requests share one bucket.
pub fn classify(request: &Request, jwt_secret: &str) -> RateLimitKey {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if is_link_redemption(request.method(), request.uri().path()) {
        return RateLimitKey::Public(peer);
    }

    extract_bearer_token(request.headers())
        .and_then(|token| verify_jwt_token(&token, jwt_secret).ok())
        .and_then(|claims| claims.owner_id().map(str::to_string))
        .map(RateLimitKey::Authenticated)
        .unwrap_or(RateLimitKey::Public(peer))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = classify(&request, &ctx.config.authentication.jwt_secret);

    if let Err(e) = ctx.rate_limiter.check(&key) {
        tracing::warn!(
            path = %request.uri().path(),
            key = ?key,
            "Rate limit exceeded"
        );
        return Err(e);
    }

    Ok(next.run(request).await)
}
