//! Resolution of usernames to Globus identity ids.

use reqwest::Client;
use serde::Deserialize;

use crate::{ClientConfig, GlobusClientError};

/// Institutional domain appended to bare usernames for identity lookup and
/// access-rule notifications.
pub(crate) const INSTITUTION_DOMAIN: &str = "stanford.edu";

#[derive(Debug, Deserialize)]
struct IdentityList {
    identities: Vec<IdentityRecord>,
}

#[derive(Debug, Deserialize)]
struct IdentityRecord {
    id: String,
    status: String,
}

/// Looks up Globus identities by username against the auth service.
#[derive(Clone)]
pub struct Identity {
    config: ClientConfig,
    client: Client,
}

impl Identity {
    /// Create an identity resolver for the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Resolve a username to the id of their active Globus identity.
    ///
    /// Returns [`GlobusClientError::IdentityNotFound`] when the user has no
    /// identity with status `used`.
    pub async fn get_identity_id(&self, user_id: &str) -> Result<String, GlobusClientError> {
        let username = qualified_username(user_id);
        self.lookup(&username)
            .await?
            .ok_or(GlobusClientError::IdentityNotFound { username })
    }

    /// Whether the user has an active Globus identity.
    pub async fn valid(&self, user_id: &str) -> Result<bool, GlobusClientError> {
        let username = qualified_username(user_id);
        Ok(self.lookup(&username).await?.is_some())
    }

    async fn lookup(&self, username: &str) -> Result<Option<String>, GlobusClientError> {
        let response = self
            .client
            .get(format!("{}/v2/api/identities", self.config.auth_url))
            .query(&[("usernames", username)])
            .bearer_auth(self.config.token())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GlobusClientError::classify(response).await);
        }

        let list: IdentityList = response.json().await?;
        Ok(list
            .identities
            .into_iter()
            .find(|identity| identity.status == "used")
            .map(|identity| identity.id))
    }
}

/// Qualify a bare username with the institutional domain
pub(crate) fn qualified_username(user_id: &str) -> String {
    format!("{user_id}@{INSTITUTION_DOMAIN}")
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use mockito::{Matcher, Server, ServerGuard};

    use super::*;

    fn resolver_against(server: &ServerGuard) -> Identity {
        let config = ClientConfig::new("id", "secret", "/uploads", "endpoint")
            .with_auth_url(server.url());
        config.set_token("a-token");
        Identity::new(config)
    }

    fn identity_body(status: &str) -> String {
        format!(
            r#"{{"identities": [{{
                "name": "Jane Tester",
                "email": "example@stanford.edu",
                "id": "12345abc",
                "username": "example@stanford.edu",
                "status": "{status}"
            }}]}}"#
        )
    }

    #[tokio::test]
    async fn resolves_an_active_identity() -> Result<()> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/api/identities")
            .match_query(Matcher::UrlEncoded(
                "usernames".into(),
                "example@stanford.edu".into(),
            ))
            .match_header("authorization", "Bearer a-token")
            .with_status(200)
            .with_body(identity_body("used"))
            .create_async()
            .await;

        let identity = resolver_against(&server);
        let id = identity.get_identity_id("example").await?;

        mock.assert_async().await;
        assert_eq!(id, "12345abc");

        Ok(())
    }

    #[tokio::test]
    async fn rejects_an_identity_not_active_in_globus() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/api/identities")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(identity_body("unused"))
            .create_async()
            .await;

        let identity = resolver_against(&server);
        let result = identity.get_identity_id("example").await;

        match result {
            Err(GlobusClientError::IdentityNotFound { username }) => {
                assert_eq!(username, "example@stanford.edu");
            }
            other => panic!("expected IdentityNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn classifies_a_forbidden_lookup() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/api/identities")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(
                r#"{"code": "AccessForbidden.NeedsOwner",
                    "message": "The operation you have requested requires \"Owner\" rights"}"#,
            )
            .create_async()
            .await;

        let identity = resolver_against(&server);
        let result = identity.get_identity_id("example").await;

        assert!(matches!(result, Err(GlobusClientError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn reports_validity_without_erroring() -> Result<()> {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/api/identities")
            .match_query(Matcher::UrlEncoded(
                "usernames".into(),
                "active@stanford.edu".into(),
            ))
            .with_status(200)
            .with_body(identity_body("used"))
            .create_async()
            .await;
        server
            .mock("GET", "/v2/api/identities")
            .match_query(Matcher::UrlEncoded(
                "usernames".into(),
                "inactive@stanford.edu".into(),
            ))
            .with_status(200)
            .with_body(identity_body("unused"))
            .create_async()
            .await;

        let identity = resolver_against(&server);

        assert!(identity.valid("active").await?);
        assert!(!identity.valid("inactive").await?);

        Ok(())
    }
}
