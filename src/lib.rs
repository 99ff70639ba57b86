//! Builds a searchable index of verifiably-built on-chain program artifacts.
//!
//! Given a manifest mapping repositories to their published release tags,
//! veridex crawls each release's publication branch on the artifact host,
//! cross-references the published address, checksum, and interface
//! description documents, and regenerates two flat lookup tables plus a
//! program catalog:
//!
//! ```text
//! index/
//! ├── idls/<address>.json        <- interface description per program address
//! ├── artifacts/<checksum>.json  <- { "url": ... } per verifiable binary
//! └── programs.json              <- flat catalog of resolved programs
//! ```
//!
//! The address table is built from each repository's latest tag only; the
//! artifact table spans every tag, since historical binaries remain
//! independently verifiable. Releases that have not been verifiably built
//! yet are skipped with a warning; every other failure aborts the run.

pub mod fetch;
pub mod index;
pub mod manifest;
pub mod resolve;

pub use fetch::{ArtifactFetcher, FetchError, HttpFetcher};
pub use index::{IndexError, IndexSummary, build_index};
pub use manifest::{Manifest, ManifestError, ReleaseSlug};
pub use resolve::{AddressIndex, ProgramRecord, ResolveError};
