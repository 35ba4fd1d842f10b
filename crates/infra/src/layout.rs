//! Three-area filesystem layout for the pipeline
//!
//! Archives are addressed by a relative path that is stable across the
//! raw input area, the merged working area and the final out area.

use std::path::{Path, PathBuf};

use timelens_domain::constants::{ARCHIVE_EXTENSION, ID_CACHE_SUFFIX};
use timelens_domain::{PipelineConfig, Result, TimelensError};

/// Root directories of the pipeline areas.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    raw: PathBuf,
    merged: PathBuf,
    out: PathBuf,
}

impl ArchiveLayout {
    pub fn new(raw: impl Into<PathBuf>, merged: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        Self { raw: raw.into(), merged: merged.into(), out: out.into() }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.raw_dir, &config.merged_dir, &config.out_dir)
    }

    pub fn raw_path(&self, rel: &str) -> PathBuf {
        self.raw.join(rel)
    }

    pub fn merged_path(&self, rel: &str) -> PathBuf {
        self.merged.join(rel)
    }

    pub fn out_path(&self, rel: &str) -> PathBuf {
        self.out.join(rel)
    }

    /// Identifier cache sidecar of a raw archive: the archive path minus
    /// its extension, plus `.ids.json`.
    pub fn id_cache_path(&self, rel: &str) -> PathBuf {
        self.raw_path(rel).with_extension(ID_CACHE_SUFFIX)
    }

    /// Relative paths of all archives in the raw area, in stable
    /// discovery order (lexicographic over the relative path).
    pub fn discover_raw(&self) -> Result<Vec<String>> {
        let mut archives = Vec::new();
        if !self.raw.exists() {
            return Err(TimelensError::NotFound(format!(
                "raw archive directory {}",
                self.raw.display()
            )));
        }
        collect_archives(&self.raw, &self.raw, &mut archives)?;
        archives.sort();
        Ok(archives)
    }
}

fn collect_archives(root: &Path, dir: &Path, archives: &mut Vec<String>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| TimelensError::Io(format!("read dir {}: {e}", dir.display())))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| TimelensError::Io(format!("read dir {}: {e}", dir.display())))?;
        let path = entry.path();
        if path.is_dir() {
            collect_archives(root, &path, archives)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some(ARCHIVE_EXTENSION) {
            let rel = path
                .strip_prefix(root)
                .map_err(|e| TimelensError::Internal(format!("relativize {}: {e}", path.display())))?;
            archives.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

/// Create the parent directories of a target path as needed.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| TimelensError::Io(format!("create dir {}: {e}", parent.display())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_is_recursive_sorted_and_extension_filtered() {
        let dir = tempfile::tempdir().expect("temp dir");
        let raw = dir.path().join("raw");
        std::fs::create_dir_all(raw.join("sub")).expect("mkdir");
        std::fs::write(raw.join("b.evlog"), "").expect("write");
        std::fs::write(raw.join("a.evlog"), "").expect("write");
        std::fs::write(raw.join("sub/c.evlog"), "").expect("write");
        std::fs::write(raw.join("a.ids.json"), "").expect("write");
        std::fs::write(raw.join("notes.txt"), "").expect("write");

        let layout = ArchiveLayout::new(&raw, dir.path().join("merged"), dir.path().join("out"));
        let archives = layout.discover_raw().expect("discover");
        assert_eq!(archives, vec!["a.evlog", "b.evlog", "sub/c.evlog"]);
    }

    #[test]
    fn missing_raw_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = ArchiveLayout::new(
            dir.path().join("nope"),
            dir.path().join("merged"),
            dir.path().join("out"),
        );
        assert!(matches!(layout.discover_raw(), Err(TimelensError::NotFound(_))));
    }

    #[test]
    fn cache_path_replaces_the_archive_extension() {
        let layout = ArchiveLayout::new("raw", "merged", "out");
        assert_eq!(layout.id_cache_path("sub/a.evlog"), PathBuf::from("raw/sub/a.ids.json"));
    }
}
