#![warn(missing_docs)]

//! Client for provisioning per-deposit storage directories on a Globus
//! transfer endpoint and managing who may read and write them.
//!
//! Each deposit is identified by a (user, work, work version) triple and
//! lives at a nested directory path on the endpoint, e.g.
//! `/uploads/mjgiarlo/work123/version1/`. The transfer API has no recursive
//! directory creation, so [`GlobusClient::mkdir`] creates each level of the
//! chain individually and tolerates levels that already exist, making the
//! whole operation idempotent. [`GlobusClient::allow_writes`] and
//! [`GlobusClient::disallow_writes`] upsert an access rule for the deposit
//! directory, creating one when none exists and updating the existing rule
//! in place otherwise.
//!
//! Every remote call carries the bearer token held by [`ClientConfig`].
//! When the Globus service reports an expired credential, the client
//! exchanges its OAuth2 client credentials for a fresh token, stores it
//! back into the shared configuration, and retries the failed operation
//! exactly once.
//!
//! ```no_run
//! use globus_client::{ClientConfig, GlobusClient};
//!
//! # async fn example() -> Result<(), globus_client::GlobusClientError> {
//! let config = ClientConfig::new(
//!     "client-id",
//!     "client-secret",
//!     "/uploads",
//!     "transfer-endpoint-uuid",
//! );
//!
//! let client = GlobusClient::new(config).await?;
//!
//! // Provision the deposit directory and let the user write into it.
//! client.mkdir("mjgiarlo", "123", "1").await?;
//! client.allow_writes("mjgiarlo", "123", "1").await?;
//!
//! // Once the deposit is complete, make it read-only.
//! client.disallow_writes("mjgiarlo", "123", "1").await?;
//! # Ok(())
//! # }
//! ```

mod authenticator;
pub use authenticator::*;

mod client;
pub use client::*;

mod config;
pub use config::*;

mod endpoint;
pub use endpoint::*;

mod error;
pub use error::*;

mod identity;
pub use identity::*;

mod token;
pub use token::*;
