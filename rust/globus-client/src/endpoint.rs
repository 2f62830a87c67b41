//! Directory and access-rule operations against a Globus transfer endpoint.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::identity::{Identity, qualified_username};
use crate::{ClientConfig, GlobusClientError, error::error_code};

/// Upstream error code signalling that a directory already exists
const MKDIR_EXISTS_CODE: &str = "ExternalError.MkdirFailed.Exists";

/// Permission level recorded on an access rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Permissions {
    /// Read and write access (`"rw"`)
    #[serde(rename = "rw")]
    ReadWrite,
    /// Read-only access (`"r"`)
    #[serde(rename = "r")]
    ReadOnly,
}

#[derive(Serialize)]
struct MkdirRequest<'a> {
    #[serde(rename = "DATA_TYPE")]
    data_type: &'a str,
    path: &'a str,
}

#[derive(Serialize)]
struct AccessCreateRequest<'a> {
    #[serde(rename = "DATA_TYPE")]
    data_type: &'a str,
    principal_type: &'a str,
    principal: &'a str,
    path: &'a str,
    permissions: Permissions,
    notify_email: &'a str,
}

#[derive(Serialize)]
struct AccessUpdateRequest<'a> {
    #[serde(rename = "DATA_TYPE")]
    data_type: &'a str,
    permissions: Permissions,
}

/// A stored permission grant on the endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AccessRule {
    /// Identifier of the rule, used for updates
    pub id: String,
    /// Directory path the rule applies to; absent for endpoint-wide rules
    #[serde(default)]
    pub path: Option<String>,
    /// Permission string recorded on the rule (`"r"` or `"rw"`)
    #[serde(default)]
    pub permissions: String,
}

#[derive(Debug, Deserialize)]
struct AccessList {
    #[serde(rename = "DATA")]
    data: Vec<AccessRule>,
}

#[derive(Debug, Deserialize)]
struct DirectoryListing {
    total: u64,
    #[serde(rename = "DATA")]
    data: Vec<DirectoryEntry>,
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    #[serde(rename = "DATA_TYPE")]
    data_type: String,
    #[serde(default)]
    size: Option<u64>,
}

/// Operations on the deposit directory for one (user, work, version) triple.
///
/// The deposit directory lives at
/// `{uploads_directory}/{user_id}/work{work_id}/version{work_version}/`.
pub struct Endpoint {
    config: ClientConfig,
    client: Client,
    user_id: String,
    work_id: String,
    work_version: String,
}

impl Endpoint {
    /// Create an endpoint handle for one deposit
    pub fn new(
        config: ClientConfig,
        user_id: impl Into<String>,
        work_id: impl Into<String>,
        work_version: impl Into<String>,
    ) -> Self {
        Self {
            config,
            client: Client::new(),
            user_id: user_id.into(),
            work_id: work_id.into(),
            work_version: work_version.into(),
        }
    }

    /// Create the directory chain for this deposit.
    ///
    /// The transfer API has no recursive directory creation, so each level
    /// is created individually, shallowest first. A 502 carrying the
    /// `ExternalError.MkdirFailed.Exists` code means that level is already
    /// present and is skipped; any other failure aborts the chain without
    /// attempting the deeper levels. Repeated invocations converge on the
    /// same remote state.
    pub async fn mkdir(&self) -> Result<(), GlobusClientError> {
        for path in self.paths() {
            let response = self
                .client
                .post(format!(
                    "{}{}/mkdir",
                    self.config.transfer_url,
                    self.transfer_path()
                ))
                .bearer_auth(self.config.token())
                .json(&MkdirRequest {
                    data_type: "mkdir",
                    path: &path,
                })
                .send()
                .await?;

            if response.status().is_success() {
                continue;
            }

            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status == StatusCode::BAD_GATEWAY
                && error_code(&body).as_deref() == Some(MKDIR_EXISTS_CODE)
            {
                continue;
            }

            return Err(GlobusClientError::from_response(status, &body));
        }

        Ok(())
    }

    /// Grant the user read/write access to the deposit directory
    pub async fn allow_writes(&self) -> Result<(), GlobusClientError> {
        self.access_request(Permissions::ReadWrite).await
    }

    /// Restrict the user to read-only access to the deposit directory
    pub async fn disallow_writes(&self) -> Result<(), GlobusClientError> {
        self.access_request(Permissions::ReadOnly).await
    }

    /// Number of objects in the deposit directory
    pub async fn file_count(&self) -> Result<u64, GlobusClientError> {
        Ok(self.objects().await?.total)
    }

    /// Combined size in bytes of the files in the deposit directory
    pub async fn total_size(&self) -> Result<u64, GlobusClientError> {
        Ok(self
            .objects()
            .await?
            .data
            .iter()
            .filter(|entry| entry.data_type == "file")
            .map(|entry| entry.size.unwrap_or(0))
            .sum())
    }

    /// Build the ordered chain of directory paths for this deposit.
    ///
    /// For user `mjgiarlo`, work `123`, version `1` under `/uploads` this
    /// yields:
    ///
    /// ```text
    /// ["/uploads/mjgiarlo/", "/uploads/mjgiarlo/work123/", "/uploads/mjgiarlo/work123/version1/"]
    /// ```
    fn paths(&self) -> Vec<String> {
        build_paths(&self.config.uploads_directory, &self.path_segments())
    }

    /// The deepest entry of the path chain, where access rules are set
    fn full_path(&self) -> String {
        let mut paths = self.paths();
        paths
            .pop()
            .unwrap_or_else(|| self.config.uploads_directory.clone())
    }

    fn path_segments(&self) -> [String; 3] {
        [
            self.user_id.clone(),
            format!("work{}", self.work_id),
            format!("version{}", self.work_version),
        ]
    }

    /// Upsert the access rule for the deposit directory.
    ///
    /// When a rule already exists for the directory it is updated in place;
    /// otherwise a new rule is created for the user's Globus identity. The
    /// two cases are exclusive within one invocation, so repeated calls
    /// converge on the most recently requested permission level.
    async fn access_request(&self, permissions: Permissions) -> Result<(), GlobusClientError> {
        let full_path = self.full_path();

        let response = match self.access_rule_id(&full_path).await? {
            Some(rule_id) => {
                self.client
                    .put(format!(
                        "{}{}/{}",
                        self.config.transfer_url,
                        self.access_path(),
                        rule_id
                    ))
                    .bearer_auth(self.config.token())
                    .json(&AccessUpdateRequest {
                        data_type: "access",
                        permissions,
                    })
                    .send()
                    .await?
            }
            None => {
                let principal = Identity::new(self.config.clone())
                    .get_identity_id(&self.user_id)
                    .await?;

                self.client
                    .post(format!(
                        "{}{}",
                        self.config.transfer_url,
                        self.access_path()
                    ))
                    .bearer_auth(self.config.token())
                    .json(&AccessCreateRequest {
                        data_type: "access",
                        principal_type: "identity",
                        principal: &principal,
                        path: &full_path,
                        permissions,
                        notify_email: &qualified_username(&self.user_id),
                    })
                    .send()
                    .await?
            }
        };

        if response.status().is_success() {
            Ok(())
        } else {
            Err(GlobusClientError::classify(response).await)
        }
    }

    /// Find the id of the access rule recorded for `path`, if any.
    ///
    /// Rules are matched by path alone; if several principals hold rules on
    /// the same path, the first one returned by the service wins.
    async fn access_rule_id(&self, path: &str) -> Result<Option<String>, GlobusClientError> {
        let response = self
            .client
            .get(format!(
                "{}{}_list",
                self.config.transfer_url,
                self.access_path()
            ))
            .bearer_auth(self.config.token())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GlobusClientError::classify(response).await);
        }

        let list: AccessList = response.json().await?;
        Ok(list
            .data
            .into_iter()
            .find(|rule| rule.path.as_deref() == Some(path))
            .map(|rule| rule.id))
    }

    /// Fetch the directory listing for the deposit directory
    async fn objects(&self) -> Result<DirectoryListing, GlobusClientError> {
        let response = self
            .client
            .get(format!(
                "{}{}/ls",
                self.config.transfer_url,
                self.transfer_path()
            ))
            .query(&[("path", self.full_path())])
            .bearer_auth(self.config.token())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GlobusClientError::classify(response).await);
        }

        Ok(response.json().await?)
    }

    fn transfer_path(&self) -> String {
        format!(
            "/v0.10/operation/endpoint/{}",
            self.config.transfer_endpoint_id
        )
    }

    fn access_path(&self) -> String {
        format!("/v0.10/endpoint/{}/access", self.config.transfer_endpoint_id)
    }
}

/// Build the ordered chain of directory paths for a list of path segments.
///
/// Each entry extends the previous by one segment and ends with a trailing
/// separator. Segment content is joined as-is, without normalization.
fn build_paths(root: &str, segments: &[String]) -> Vec<String> {
    segments
        .iter()
        .enumerate()
        .map(|(index, _)| {
            let mut path = root.trim_end_matches('/').to_string();
            for segment in &segments[..=index] {
                path.push('/');
                path.push_str(segment);
            }
            path.push('/');
            path
        })
        .collect()
}
