//! Sidecar identifier cache
//!
//! A previously computed identity set is stored as JSON next to its
//! archive (`<path minus extension>.ids.json`). A readable cache entry is
//! authoritative; anything else falls back to a full scan.

use std::path::Path;

use timelens_domain::IdentitySet;
use tracing::{debug, warn};

/// Load a cached identity set. Unreadable or corrupt entries read as a
/// miss, never as an error.
pub fn load(path: &Path) -> Option<IdentitySet> {
    let bytes = std::fs::read(path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(identifiers) => {
            debug!(cache = %path.display(), "identifier cache hit");
            Some(identifiers)
        }
        Err(err) => {
            warn!(cache = %path.display(), error = %err, "discarding corrupt identifier cache");
            None
        }
    }
}

/// Write a cache entry. Failures degrade to a warning so caching never
/// blocks the pipeline.
pub fn write(path: &Path, identifiers: &IdentitySet) {
    let payload = match serde_json::to_vec(identifiers) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(cache = %path.display(), error = %err, "failed to serialize identifier cache");
            return;
        }
    };
    if let Err(err) = std::fs::write(path, payload) {
        warn!(cache = %path.display(), error = %err, "failed to write identifier cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_identity_sets() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("a.ids.json");
        let identifiers: IdentitySet =
            ["sid:s1", "pid:p1"].into_iter().map(String::from).collect();

        write(&path, &identifiers);
        assert_eq!(load(&path), Some(identifiers));
    }

    #[test]
    fn missing_and_corrupt_entries_are_misses() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("a.ids.json");
        assert_eq!(load(&path), None);

        std::fs::write(&path, "not json").expect("write");
        assert_eq!(load(&path), None);
    }
}
