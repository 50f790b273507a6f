//! Explains why two fingerprints differ.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{Fingerprint, SourceEntry, SourceType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum SourceChange {
  Added(SourceEntry),
  Removed(SourceEntry),
  Changed { before: SourceEntry, after: SourceEntry },
}

impl SourceChange {
  pub fn id(&self) -> &str {
    match self {
      Self::Added(entry) | Self::Removed(entry) => &entry.id,
      Self::Changed { after, .. } => &after.id,
    }
  }
}

/// Compare two manifests source by source, in canonical order.
///
/// Returns an empty list when the fingerprints are identical.
pub fn diff_fingerprints(old: &Fingerprint, new: &Fingerprint) -> Vec<SourceChange> {
  let index = |fp: &Fingerprint| -> BTreeMap<(SourceType, String), SourceEntry> {
    fp.sources
      .iter()
      .map(|s| ((s.kind, s.id.clone()), s.clone()))
      .collect()
  };

  let mut before = index(old);
  let after = index(new);
  let mut changes = Vec::new();

  for (key, entry) in after {
    match before.remove(&key) {
      None => changes.push(SourceChange::Added(entry)),
      Some(prev) if prev.hash != entry.hash => changes.push(SourceChange::Changed {
        before: prev,
        after: entry,
      }),
      Some(_) => {}
    }
  }
  changes.extend(before.into_values().map(SourceChange::Removed));

  changes.sort_by(|a, b| a.id().cmp(b.id()));
  changes
}
