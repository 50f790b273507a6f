//! rnef-lib: native build caching for React Native projects.
//!
//! A native build is identified by a fingerprint of every input that can
//! affect its output. The fingerprint is folded into an artifact name
//! (`rnef-{platform}-{mode}-{hash}`), which is looked up first in the local
//! artifact store and then, optionally, in a remote provider such as GitHub
//! Actions artifacts.
//!
//! - [`fingerprint`]: deterministic input hashing
//! - [`store`]: on-disk artifact store with atomic commits
//! - [`remote`]: remote provider trait and the GitHub Actions backend
//! - [`cache`]: the orchestrator tying it together

pub mod artifact;
pub mod cache;
pub mod config;
pub mod consts;
pub mod fingerprint;
pub mod platform;
pub mod remote;
pub mod store;
pub mod util;

pub use artifact::{ArtifactName, LocalArtifact, ModeError, RemoteArtifact, format_artifact_name, validate_mode};
pub use cache::{BuildCache, BuildRequest, CacheError, Outcome, Resolution, resolve_build_artifact};
pub use fingerprint::{Fingerprint, FingerprintError, FingerprintOptions, compute_fingerprint};
pub use platform::Platform;
