/// Background task implementations
use crate::{context::AppContext, error::ApiResult};

/// Delete emergency access tokens past their expiry
pub async fn cleanup_expired_tokens(ctx: &AppContext) -> ApiResult<u64> {
    ctx.emergency_manager.cleanup_expired().await
}

/// Forget rate limit state for clients that have gone quiet
pub fn prune_rate_limiters(ctx: &AppContext) {
    ctx.rate_limiter.retain_recent();
}

/// Health check - verify the database is reachable
pub async fn health_check(ctx: &AppContext) -> ApiResult<()> {
    crate::db::test_connection(&ctx.db).await
}
