//! Program manifest: the declarative repository -> release tags mapping
//! that drives both index passes.
//!
//! The manifest is a YAML document mapping `owner/name` repository
//! identifiers to an ordered list of release tags, oldest first:
//!
//! ```yaml
//! acme/vault:
//!   - v1.0.0
//!   - v1.1.0
//! ```
//!
//! The last tag of each list is that repository's latest release. Document
//! order is significant: repositories and tags are processed in the order
//! they appear, and the flat program catalog preserves it.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Error type for manifest loading.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse manifest {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("No tags listed for repository '{0}'")]
    NoTags(String),

    #[error("Invalid repository identifier '{0}': expected 'owner/name'")]
    InvalidRepo(String),
}

/// Ordered mapping from repository identifier to its published release tags.
#[derive(Debug, Clone)]
pub struct Manifest {
    repos: IndexMap<String, Vec<String>>,
}

impl Manifest {
    /// Load and validate a manifest from a YAML file.
    ///
    /// Fails if the file is absent or malformed, if any repository lists no
    /// tags, or if a repository identifier is not of the `owner/name` form.
    /// All of these are configuration defects, diagnosed before any network
    /// activity.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let repos: IndexMap<String, Vec<String>> =
            serde_yaml::from_str(&raw).map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Self::from_entries(repos)
    }

    /// Build a manifest from an already-parsed mapping, enforcing the same
    /// invariants as [`Manifest::load`].
    pub fn from_entries(repos: IndexMap<String, Vec<String>>) -> Result<Self, ManifestError> {
        for (repo, tags) in &repos {
            if tags.is_empty() {
                return Err(ManifestError::NoTags(repo.clone()));
            }
            match repo.split_once('/') {
                Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {}
                _ => return Err(ManifestError::InvalidRepo(repo.clone())),
            }
        }
        Ok(Self { repos })
    }

    /// Number of repositories in the manifest.
    pub fn len(&self) -> usize {
        self.repos.len()
    }

    /// Whether the manifest lists no repositories at all.
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// The latest (last listed) tag of every repository, in manifest order.
    pub fn latest_tags(&self) -> impl Iterator<Item = (&str, &str)> {
        // Validation guarantees every tag list is non-empty.
        self.repos
            .iter()
            .filter_map(|(repo, tags)| tags.last().map(|tag| (repo.as_str(), tag.as_str())))
    }

    /// Every (repository, tag) pair in manifest order, oldest tag first.
    pub fn all_tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.repos.iter().flat_map(|(repo, tags)| {
            tags.iter().map(move |tag| (repo.as_str(), tag.as_str()))
        })
    }
}

/// Deterministic identifier for one (repository, tag) pair, usable as a URL
/// path segment.
///
/// The `/` in the repository identifier is replaced by `__` rather than the
/// `-` already used to join repository and tag, so the owner/name boundary
/// stays distinguishable from separators occurring inside tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseSlug(String);

impl ReleaseSlug {
    pub fn new(repo: &str, tag: &str) -> Self {
        Self(format!("{}-{}", repo.replace('/', "__"), tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
