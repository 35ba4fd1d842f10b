//! Port interfaces to the archive storage collaborators
//!
//! The core only relies on the sequential read/append contract of event
//! archives; the byte format and directory layout live behind these traits
//! in the infra layer.

use async_trait::async_trait;
use timelens_domain::{IdeEvent, IdentitySet, Result};

/// Streaming read access to one archive.
///
/// Events are yielded lazily in storage order; `Ok(None)` marks the end of
/// the archive.
pub trait EventSource: Send {
    fn next_event(&mut self) -> Result<Option<IdeEvent>>;
}

/// Append access to one archive.
///
/// Writers always create a fresh target; inputs are never mutated in
/// place. Nothing is committed until [`EventSink::finish`] succeeds.
pub trait EventSink: Send {
    fn append(&mut self, event: &IdeEvent) -> Result<()>;

    /// Flush and close the archive.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Access to the three pipeline areas (raw input, merged working area,
/// final out area), addressing archives by a relative path that is stable
/// across stages.
pub trait ArchiveStore: Send + Sync {
    /// Relative paths of all archives in the raw area, in stable
    /// discovery order.
    fn discover(&self) -> Result<Vec<String>>;

    fn open_raw(&self, rel: &str) -> Result<Box<dyn EventSource>>;

    fn open_merged(&self, rel: &str) -> Result<Box<dyn EventSource>>;

    fn open_out(&self, rel: &str) -> Result<Box<dyn EventSource>>;

    /// Create (truncating) an archive in the merged working area,
    /// creating parent directories as needed.
    fn create_merged(&self, rel: &str) -> Result<Box<dyn EventSink>>;

    /// Create (truncating) an archive in the out area, creating parent
    /// directories as needed.
    fn create_out(&self, rel: &str) -> Result<Box<dyn EventSink>>;
}

/// Extracts the identity token set of one raw archive.
///
/// Implementations may consult a side-channel cache; a cached entry is
/// authoritative when readable.
#[async_trait]
pub trait IdentityScanner: Send + Sync {
    async fn scan(&self, rel: &str) -> Result<IdentitySet>;
}
