//! Fetch boundary for per-release publication artifacts.
//!
//! Each verifiably-built release is published under its own branch of the
//! artifact host, addressed as `<host>/<prefix>-<slug>/<file>`. Three
//! well-known JSON files describe a release:
//!
//! ```text
//! addresses.json        <- program name -> deployed address
//! checksums.json        <- checksum -> file path within the release
//! idl/<program>.json    <- one program's interface description
//! ```
//!
//! The soft/hard error split lives here, in the return contract: a 404 maps
//! to [`FetchError::NotFound`] (the release or program simply has not been
//! verifiably built yet, callers skip it), while every other transport or
//! parse failure is hard and aborts the run. Call sites never inspect status
//! codes themselves.

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::manifest::ReleaseSlug;

/// Base URL of the artifact publication host.
const ARTIFACT_HOST: &str =
    "https://raw.githubusercontent.com/veridex/verified-program-artifacts";

/// Branch prefix under which one release's artifact bundle is published.
const BRANCH_PREFIX: &str = "verify";

/// Network timeout for artifact metadata fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Program name -> deployed address listing (`addresses.json`).
pub const ADDRESSES_FILE: &str = "addresses.json";

/// Checksum -> release file path listing (`checksums.json`).
pub const CHECKSUMS_FILE: &str = "checksums.json";

/// Path of one program's interface description within a release.
pub fn idl_file(program: &str) -> String {
    format!("idl/{program}.json")
}

/// Construct the URL of one file within a release's publication branch.
///
/// The same template addresses both the JSON metadata fetched during
/// indexing and the binary download locations recorded in the artifact
/// table.
pub fn release_url(slug: &ReleaseSlug, file: &str) -> String {
    format!("{ARTIFACT_HOST}/{BRANCH_PREFIX}-{slug}/{file}")
}

/// Error type for artifact fetches.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The remote has no such resource (HTTP 404). Recoverable: callers
    /// skip the affected release or program.
    #[error("Artifact not found: {url}")]
    NotFound { url: String },

    /// Transport failure or a non-2xx status other than 404.
    #[error("Fetch failed for {url}: {reason}")]
    Http { url: String, reason: String },

    /// The resource exists but its body is not the expected JSON shape.
    #[error("Malformed document at {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl FetchError {
    /// Whether this is the soft resource-absent case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Retrieves per-release documents from the publication host.
///
/// The trait is the seam between resolution logic and the network: the
/// resolver and aggregator only see typed documents, and tests substitute
/// an in-memory fake.
#[async_trait]
pub trait ArtifactFetcher {
    /// Fetch the program name -> deployed address mapping of one release.
    async fn addresses(&self, slug: &ReleaseSlug) -> Result<IndexMap<String, String>, FetchError>;

    /// Fetch the checksum -> file path mapping of one release.
    async fn checksums(&self, slug: &ReleaseSlug) -> Result<IndexMap<String, String>, FetchError>;

    /// Fetch one program's interface description, kept opaque.
    async fn idl(&self, slug: &ReleaseSlug, program: &str) -> Result<serde_json::Value, FetchError>;
}

/// HTTP fetcher over the publication host.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    async fn get_json<T>(&self, url: String) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.clone(),
                reason: format!("request failed: {e}"),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url });
        }

        let response = response.error_for_status().map_err(|e| FetchError::Http {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let body = response.bytes().await.map_err(|e| FetchError::Http {
            url: url.clone(),
            reason: format!("failed to read body: {e}"),
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed {
            url,
            reason: e.to_string(),
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn addresses(
        &self,
        slug: &ReleaseSlug,
    ) -> Result<IndexMap<String, String>, FetchError> {
        self.get_json(release_url(slug, ADDRESSES_FILE)).await
    }

    async fn checksums(
        &self,
        slug: &ReleaseSlug,
    ) -> Result<IndexMap<String, String>, FetchError> {
        self.get_json(release_url(slug, CHECKSUMS_FILE)).await
    }

    async fn idl(
        &self,
        slug: &ReleaseSlug,
        program: &str,
    ) -> Result<serde_json::Value, FetchError> {
        self.get_json(release_url(slug, &idl_file(program))).await
    }
}
