//! Filesystem-backed archive store

use timelens_core::ports::{ArchiveStore, EventSink, EventSource};
use timelens_domain::Result;

use crate::archive::{JsonlEventSink, JsonlEventSource};
use crate::layout::ArchiveLayout;

/// [`ArchiveStore`] over the three-area directory layout with the
/// JSON-lines codec.
pub struct FsArchiveStore {
    layout: ArchiveLayout,
}

impl FsArchiveStore {
    pub fn new(layout: ArchiveLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }
}

impl ArchiveStore for FsArchiveStore {
    fn discover(&self) -> Result<Vec<String>> {
        self.layout.discover_raw()
    }

    fn open_raw(&self, rel: &str) -> Result<Box<dyn EventSource>> {
        Ok(Box::new(JsonlEventSource::open(&self.layout.raw_path(rel))?))
    }

    fn open_merged(&self, rel: &str) -> Result<Box<dyn EventSource>> {
        Ok(Box::new(JsonlEventSource::open(&self.layout.merged_path(rel))?))
    }

    fn open_out(&self, rel: &str) -> Result<Box<dyn EventSource>> {
        Ok(Box::new(JsonlEventSource::open(&self.layout.out_path(rel))?))
    }

    fn create_merged(&self, rel: &str) -> Result<Box<dyn EventSink>> {
        Ok(Box::new(JsonlEventSink::create(&self.layout.merged_path(rel))?))
    }

    fn create_out(&self, rel: &str) -> Result<Box<dyn EventSink>> {
        Ok(Box::new(JsonlEventSink::create(&self.layout.out_path(rel))?))
    }
}
