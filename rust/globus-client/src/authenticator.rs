//! Client-credentials token exchange against the Globus auth service.

use serde::Deserialize;

use crate::GlobusClientError;

/// OAuth2 scope required for the transfer API
const TRANSFER_SCOPE: &str = "urn:globus:auth:scope:transfer.api.globus.org:all";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange client credentials for a fresh bearer token.
pub async fn fetch_token(
    client_id: &str,
    client_secret: &str,
    auth_url: &str,
) -> Result<String, GlobusClientError> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{auth_url}/v2/oauth2/token"))
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
            ("scope", TRANSFER_SCOPE),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(GlobusClientError::classify(response).await);
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}
