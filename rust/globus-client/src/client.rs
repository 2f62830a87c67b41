//! Top-level client bundling configuration, authentication, and endpoint
//! operations.

use crate::{
    ClientConfig, Endpoint, GlobusClientError, Identity, authenticator, with_token_refresh,
};

/// High-level client for provisioning deposit directories on a Globus
/// transfer endpoint.
///
/// Every operation runs through [`with_token_refresh`], so an expired
/// bearer token is replaced and the operation retried once without the
/// caller noticing.
pub struct GlobusClient {
    config: ClientConfig,
}

impl GlobusClient {
    /// Create a client and fetch an initial bearer token for it
    pub async fn new(config: ClientConfig) -> Result<Self, GlobusClientError> {
        let token = authenticator::fetch_token(
            &config.client_id,
            &config.client_secret,
            &config.auth_url,
        )
        .await?;
        config.set_token(token);
        Ok(Self { config })
    }

    /// The shared configuration, including the current bearer token
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create the full directory chain for a deposit; safe to repeat
    pub async fn mkdir(
        &self,
        user_id: &str,
        work_id: &str,
        work_version: &str,
    ) -> Result<(), GlobusClientError> {
        let endpoint = self.endpoint(user_id, work_id, work_version);
        with_token_refresh(&self.config, || endpoint.mkdir()).await
    }

    /// Grant the user read/write access to a deposit directory
    pub async fn allow_writes(
        &self,
        user_id: &str,
        work_id: &str,
        work_version: &str,
    ) -> Result<(), GlobusClientError> {
        let endpoint = self.endpoint(user_id, work_id, work_version);
        with_token_refresh(&self.config, || endpoint.allow_writes()).await
    }

    /// Restrict the user to read-only access to a deposit directory
    pub async fn disallow_writes(
        &self,
        user_id: &str,
        work_id: &str,
        work_version: &str,
    ) -> Result<(), GlobusClientError> {
        let endpoint = self.endpoint(user_id, work_id, work_version);
        with_token_refresh(&self.config, || endpoint.disallow_writes()).await
    }

    /// Number of objects in a deposit directory
    pub async fn file_count(
        &self,
        user_id: &str,
        work_id: &str,
        work_version: &str,
    ) -> Result<u64, GlobusClientError> {
        let endpoint = self.endpoint(user_id, work_id, work_version);
        with_token_refresh(&self.config, || endpoint.file_count()).await
    }

    /// Combined size in bytes of the files in a deposit directory
    pub async fn total_size(
        &self,
        user_id: &str,
        work_id: &str,
        work_version: &str,
    ) -> Result<u64, GlobusClientError> {
        let endpoint = self.endpoint(user_id, work_id, work_version);
        with_token_refresh(&self.config, || endpoint.total_size()).await
    }

    /// Whether the user has an active Globus identity
    pub async fn user_valid(&self, user_id: &str) -> Result<bool, GlobusClientError> {
        let identity = Identity::new(self.config.clone());
        with_token_refresh(&self.config, || identity.valid(user_id)).await
    }

    fn endpoint(&self, user_id: &str, work_id: &str, work_version: &str) -> Endpoint {
        Endpoint::new(self.config.clone(), user_id, work_id, work_version)
    }
}
