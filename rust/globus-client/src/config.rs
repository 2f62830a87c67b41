use std::sync::Arc;

use parking_lot::RwLock;

/// Configuration shared by every component of the client.
///
/// Cloning a `ClientConfig` is cheap and every clone shares the same token
/// cell, so a token refresh performed anywhere in the client is visible to
/// all subsequent calls.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    token: Arc<RwLock<String>>,

    /// OAuth2 client id used for the client-credentials grant
    pub client_id: String,

    /// OAuth2 client secret used for the client-credentials grant
    pub client_secret: String,

    /// Root directory on the endpoint under which deposit directories are created
    pub uploads_directory: String,

    /// Identifier of the managed transfer endpoint
    pub transfer_endpoint_id: String,

    /// Base URL of the Globus transfer service
    pub transfer_url: String,

    /// Base URL of the Globus auth service
    pub auth_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: Arc::new(RwLock::new(String::new())),
            client_id: String::new(),
            client_secret: String::new(),
            uploads_directory: "/uploads".to_string(),
            transfer_endpoint_id: String::new(),
            transfer_url: "https://transfer.api.globusonline.org".to_string(),
            auth_url: "https://auth.globus.org".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given credentials and endpoint
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        uploads_directory: impl Into<String>,
        transfer_endpoint_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            uploads_directory: uploads_directory.into(),
            transfer_endpoint_id: transfer_endpoint_id.into(),
            ..Default::default()
        }
    }

    /// Override the transfer service base URL
    pub fn with_transfer_url(mut self, url: impl Into<String>) -> Self {
        self.transfer_url = url.into();
        self
    }

    /// Override the auth service base URL
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Get a copy of the current bearer token
    pub fn token(&self) -> String {
        self.token.read().clone()
    }

    /// Replace the current bearer token for every holder of this configuration
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = token.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_token_cell() {
        let config = ClientConfig::new("id", "secret", "/uploads", "endpoint");
        let clone = config.clone();

        config.set_token("token-a");
        assert_eq!(clone.token(), "token-a");

        clone.set_token("token-b");
        assert_eq!(config.token(), "token-b");
    }

    #[test]
    fn defaults_point_at_the_public_globus_services() {
        let config = ClientConfig::new("id", "secret", "/uploads", "endpoint");

        assert_eq!(config.transfer_url, "https://transfer.api.globusonline.org");
        assert_eq!(config.auth_url, "https://auth.globus.org");
        assert!(config.token().is_empty());
    }

    #[test]
    fn builder_overrides_service_urls() {
        let config = ClientConfig::new("id", "secret", "/uploads", "endpoint")
            .with_transfer_url("http://localhost:8080")
            .with_auth_url("http://localhost:8081");

        assert_eq!(config.transfer_url, "http://localhost:8080");
        assert_eq!(config.auth_url, "http://localhost:8081");
    }
}
