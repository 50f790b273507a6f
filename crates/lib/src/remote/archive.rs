//! Unpacking downloaded artifact archives into the local store.

use std::fs::File;
use std::path::Path;

use crate::artifact::{ArtifactName, LocalArtifact};
use crate::store::LocalArtifactStore;

use super::RemoteCacheError;

/// Extract a zip archive into a staging directory and commit it as `name`.
pub(crate) fn unpack_zip(
  store: &LocalArtifactStore,
  name: &ArtifactName,
  archive: &Path,
) -> Result<LocalArtifact, RemoteCacheError> {
  let file = File::open(archive)?;
  let mut zip = zip::ZipArchive::new(file).map_err(|e| RemoteCacheError::Archive(e.to_string()))?;

  let staging = store.stage(name)?;
  zip
    .extract(staging.path())
    .map_err(|e| RemoteCacheError::Archive(e.to_string()))?;

  Ok(store.commit(staging, name)?)
}
