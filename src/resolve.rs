//! Per-release resolution: raw published documents -> normalized records.
//!
//! Two passes read from the same publication layout. The address pass runs
//! over each repository's latest tag only and cross-references three
//! documents per release (addresses, checksums, per-program IDLs). The
//! artifact pass runs over every tag of every repository, because
//! historical binaries remain independently verifiable.
//!
//! Both passes tolerate releases that have not been verifiably built yet:
//! a resource-absent fetch skips the remainder of the affected release
//! with a warning. Any other failure propagates and aborts the run.

use heck::ToTitleCase;
use indexmap::IndexMap;
use serde::Serialize;

use crate::fetch::{ArtifactFetcher, FetchError, release_url};
use crate::manifest::ReleaseSlug;

/// File extension of compiled program binaries within a release.
const BINARY_EXT: &str = ".so";

/// Errors raised while resolving releases into index entries.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Hard fetch failure. The soft resource-absent case never escapes the
    /// per-release scope.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A published address has no checksum recorded for its verifiable
    /// binary: the artifact set is internally inconsistent.
    #[error("No verifiable binary checksum for program '{program}' in {repo} {tag}")]
    MissingChecksum {
        repo: String,
        tag: String,
        program: String,
    },
}

/// One successfully resolved program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramRecord {
    pub label: String,
    pub name: String,
    pub repo: String,
    pub tag: String,
    pub address: String,
    pub shasum: String,
}

/// Accumulated output of the address-table pass.
#[derive(Debug, Default)]
pub struct AddressIndex {
    /// Deployed address -> interface description document.
    pub idls: IndexMap<String, serde_json::Value>,
    /// Flat catalog of resolved programs, in manifest order.
    pub programs: Vec<ProgramRecord>,
}

/// Resolve one repository's latest release into address-table entries.
///
/// A missing `addresses.json`, `checksums.json`, or per-program IDL skips
/// the remainder of the release with a warning; programs of the same
/// release resolved before the miss are kept. Any other fetch failure
/// propagates unchanged.
pub async fn resolve_release<F>(
    fetcher: &F,
    repo: &str,
    tag: &str,
    index: &mut AddressIndex,
) -> Result<(), ResolveError>
where
    F: ArtifactFetcher + ?Sized,
{
    match resolve_release_inner(fetcher, repo, tag, index).await {
        Err(ResolveError::Fetch(err)) if err.is_not_found() => {
            tracing::warn!("Skipping {repo} {tag}: {err}");
            Ok(())
        }
        other => other,
    }
}

async fn resolve_release_inner<F>(
    fetcher: &F,
    repo: &str,
    tag: &str,
    index: &mut AddressIndex,
) -> Result<(), ResolveError>
where
    F: ArtifactFetcher + ?Sized,
{
    let slug = ReleaseSlug::new(repo, tag);
    let addresses = fetcher.addresses(&slug).await?;
    let checksums = fetcher.checksums(&slug).await?;

    for (program, address) in &addresses {
        tracing::debug!("Resolving {repo} {tag} program '{program}'");
        let idl = fetcher.idl(&slug, program).await?;

        let binary_path = format!("artifacts/verifiable/{program}{BINARY_EXT}");
        let shasum = checksums
            .iter()
            .find(|(_, path)| *path == &binary_path)
            .map(|(checksum, _)| checksum.clone())
            .ok_or_else(|| ResolveError::MissingChecksum {
                repo: repo.to_string(),
                tag: tag.to_string(),
                program: program.clone(),
            })?;

        index.idls.insert(address.clone(), idl);
        index.programs.push(ProgramRecord {
            label: display_label(repo, program),
            name: program.clone(),
            repo: repo.to_string(),
            tag: tag.to_string(),
            address: address.clone(),
            shasum,
        });
    }

    Ok(())
}

/// Collect artifact download URLs from one release's checksum listing.
///
/// Every checksum whose recorded path ends in the compiled-binary extension
/// maps to a retrieval URL built from the same template used for fetching.
/// An absent `checksums.json` skips the release with a warning.
pub async fn collect_artifacts<F>(
    fetcher: &F,
    repo: &str,
    tag: &str,
    artifacts: &mut IndexMap<String, String>,
) -> Result<(), ResolveError>
where
    F: ArtifactFetcher + ?Sized,
{
    let slug = ReleaseSlug::new(repo, tag);
    let checksums = match fetcher.checksums(&slug).await {
        Ok(checksums) => checksums,
        Err(err) if err.is_not_found() => {
            tracing::warn!("Skipping checksums for {repo} {tag}: {err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    for (checksum, path) in &checksums {
        if path.ends_with(BINARY_EXT) {
            artifacts.insert(checksum.clone(), release_url(&slug, path));
        }
    }

    Ok(())
}

/// Derive the display label from the repository owner and program name,
/// e.g. `acme/vault` + `vault_reader` -> `Acme - Vault Reader`.
fn display_label(repo: &str, program: &str) -> String {
    let owner = match repo.split_once('/') {
        Some((owner, _)) => owner,
        None => repo,
    };
    format!("{} - {}", owner.to_title_case(), program.to_title_case())
}
