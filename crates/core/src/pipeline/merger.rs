//! Concatenating a user group's archives into one merged archive

use std::sync::Arc;

use tracing::debug;

use timelens_domain::{Result, TimelensError, UserGroup};

use crate::ports::{ArchiveStore, EventSink as _, EventSource as _};

/// Concatenates all archives of one user group, in the group's file
/// order, into a single archive in the merged working area.
pub struct ArchiveMerger {
    store: Arc<dyn ArchiveStore>,
}

impl ArchiveMerger {
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self { store }
    }

    /// Merge the group and return the representative relative path the
    /// merged archive was written to.
    pub fn merge(&self, group: &UserGroup) -> Result<String> {
        let representative = group
            .representative()
            .ok_or_else(|| TimelensError::InvalidInput("cannot merge an empty user group".into()))?
            .to_string();

        debug!(
            representative = representative.as_str(),
            files = group.files.len(),
            "merging user group"
        );

        let mut sink = self.store.create_merged(&representative)?;
        let mut total = 0usize;
        for rel in &group.files {
            let mut source = self.store.open_raw(rel)?;
            while let Some(event) = source.next_event()? {
                sink.append(&event)?;
                total += 1;
            }
        }
        sink.finish()?;

        debug!(representative = representative.as_str(), events = total, "merged user group");
        Ok(representative)
    }
}
