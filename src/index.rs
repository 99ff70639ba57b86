//! Index aggregation: runs both resolution passes over the manifest and
//! persists the lookup tables.
//!
//! The on-disk index is a pure function of the manifest plus the remote
//! publication state at call time. Every run regenerates it from scratch;
//! each output file is independently overwritten, there is no atomic swap.
//!
//! ```text
//! <out>/
//! ├── idls/<address>.json        <- interface description per program address
//! ├── artifacts/<checksum>.json  <- { "url": ... } per verifiable binary
//! └── programs.json              <- flat catalog of resolved programs
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::fetch::ArtifactFetcher;
use crate::manifest::Manifest;
use crate::resolve::{self, AddressIndex, ResolveError};

/// Errors raised while building or persisting the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Counts of entries produced by one full rebuild.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    /// Records in the flat program catalog.
    pub programs: usize,
    /// Interface description files written.
    pub idls: usize,
    /// Artifact download entries written.
    pub artifacts: usize,
}

/// Retrieval descriptor stored per binary checksum.
#[derive(Serialize)]
struct ArtifactEntry<'a> {
    url: &'a str,
}

/// Rebuild the full on-disk index.
///
/// Runs the address-table pass over each repository's latest tag, persists
/// its outputs, then runs the artifact pass over every tag of every
/// repository and persists that table. Releases are processed strictly
/// sequentially in manifest order, so the flat catalog ordering is
/// deterministic. Unpublished releases are skipped; any other failure
/// aborts the rebuild with whatever files were already written left in
/// place.
pub async fn build_index<F>(
    fetcher: &F,
    manifest: &Manifest,
    out_dir: &Path,
) -> Result<IndexSummary, IndexError>
where
    F: ArtifactFetcher + ?Sized,
{
    let idls_dir = out_dir.join("idls");
    let artifacts_dir = out_dir.join("artifacts");
    create_dir(&idls_dir).await?;
    create_dir(&artifacts_dir).await?;

    tracing::info!("Address pass over {} repositories", manifest.len());
    let mut index = AddressIndex::default();
    for (repo, tag) in manifest.latest_tags() {
        resolve::resolve_release(fetcher, repo, tag, &mut index).await?;
    }

    for (address, idl) in &index.idls {
        write_json(&idls_dir.join(format!("{address}.json")), idl).await?;
    }
    write_json(&out_dir.join("programs.json"), &index.programs).await?;

    tracing::info!("Artifact pass over all tags");
    let mut artifacts: IndexMap<String, String> = IndexMap::new();
    for (repo, tag) in manifest.all_tags() {
        resolve::collect_artifacts(fetcher, repo, tag, &mut artifacts).await?;
    }

    for (checksum, url) in &artifacts {
        let entry = ArtifactEntry { url };
        write_json(&artifacts_dir.join(format!("{checksum}.json")), &entry).await?;
    }

    Ok(IndexSummary {
        programs: index.programs.len(),
        idls: index.idls.len(),
        artifacts: artifacts.len(),
    })
}

async fn create_dir(path: &Path) -> Result<(), IndexError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| IndexError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Serialize a value as compact JSON and write it, overwriting any previous
/// file. Compact output keeps repeated runs over identical remote state
/// byte-identical.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IndexError> {
    let body = serde_json::to_vec(value).map_err(|e| IndexError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| IndexError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use indexmap::indexmap;

    use crate::fetch::FetchError;
    use crate::manifest::ReleaseSlug;

    /// Fetcher for a host that has published nothing.
    struct AbsentFetcher;

    #[async_trait]
    impl ArtifactFetcher for AbsentFetcher {
        async fn addresses(
            &self,
            slug: &ReleaseSlug,
        ) -> Result<IndexMap<String, String>, FetchError> {
            Err(FetchError::NotFound {
                url: slug.to_string(),
            })
        }

        async fn checksums(
            &self,
            slug: &ReleaseSlug,
        ) -> Result<IndexMap<String, String>, FetchError> {
            Err(FetchError::NotFound {
                url: slug.to_string(),
            })
        }

        async fn idl(
            &self,
            slug: &ReleaseSlug,
            _program: &str,
        ) -> Result<serde_json::Value, FetchError> {
            Err(FetchError::NotFound {
                url: slug.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_absent_releases_produce_empty_index() {
        let manifest = Manifest::from_entries(indexmap! {
            "acme/vault".to_string() => vec!["v1.0.0".to_string()],
        })
        .unwrap();
        let tmp = tempfile::tempdir().unwrap();

        let summary = build_index(&AbsentFetcher, &manifest, tmp.path())
            .await
            .unwrap();

        assert_eq!(summary, IndexSummary::default());
        assert!(tmp.path().join("idls").is_dir());
        assert!(tmp.path().join("artifacts").is_dir());
        let catalog = std::fs::read(tmp.path().join("programs.json")).unwrap();
        assert_eq!(catalog, b"[]");
    }
}
