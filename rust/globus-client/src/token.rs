//! Transparent token refresh for operations against the Globus services.

use std::future::Future;

use crate::{ClientConfig, GlobusClientError, authenticator};

/// Run `operation`, refreshing the bearer token and retrying once if the
/// service reports an expired credential.
///
/// The refreshed token is stored back into `config`, so every holder of the
/// shared configuration picks it up. Only
/// [`GlobusClientError::Unauthorized`] triggers a refresh; any other
/// failure, and any failure of the retried attempt, propagates unchanged.
/// Concurrent callers may each trigger their own refresh; the extra
/// exchange is wasteful but harmless since the token is replaced whole.
pub async fn with_token_refresh<T, F, Fut>(
    config: &ClientConfig,
    operation: F,
) -> Result<T, GlobusClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, GlobusClientError>>,
{
    match operation().await {
        Err(GlobusClientError::Unauthorized { .. }) => {
            let token = authenticator::fetch_token(
                &config.client_id,
                &config.client_secret,
                &config.auth_url,
            )
            .await?;
            config.set_token(token);
            operation().await
        }
        result => result,
    }
}
