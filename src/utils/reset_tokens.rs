use std::time::Duration;

use moka::future::Cache;
use once_cell::sync::Lazy;
use uuid::Uuid;

/// Reset tokens live 15 minutes. The cache is the only place they exist; an
/// expired or consumed token is simply absent.
const RESET_TOKEN_TTL_SECS: u64 = 900;

static RESET_TOKENS: Lazy<Cache<String, u64>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(RESET_TOKEN_TTL_SECS))
        .build()
});

/// Issue a fresh single-use token for the given user.
pub async fn issue(user_id: u64) -> String {
    let token = Uuid::new_v4().to_string();
    RESET_TOKENS.insert(token.clone(), user_id).await;
    token
}

/// Redeem a token for its user id. Consuming invalidates it, so a token can
/// only ever reset one password.
pub async fn consume(token: &str) -> Option<u64> {
    let user_id = RESET_TOKENS.get(token).await?;
    RESET_TOKENS.invalidate(token).await;
    Some(user_id)
}
