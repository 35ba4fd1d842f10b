//! Cached identifier scanner

use async_trait::async_trait;

use timelens_core::identity::scan::collect_identifiers;
use timelens_core::ports::IdentityScanner;
use timelens_domain::{IdentitySet, Result, TimelensError};

use crate::archive::JsonlEventSource;
use crate::identity::cache;
use crate::layout::ArchiveLayout;

/// Scans one raw archive for identity tokens, consulting the sidecar
/// cache first. A readable cache entry is authoritative; a miss triggers
/// a full scan followed by a cache write.
#[derive(Clone)]
pub struct CachedIdentityScanner {
    layout: ArchiveLayout,
}

impl CachedIdentityScanner {
    pub fn new(layout: ArchiveLayout) -> Self {
        Self { layout }
    }

    fn scan_blocking(&self, rel: &str) -> Result<IdentitySet> {
        let cache_path = self.layout.id_cache_path(rel);
        if let Some(identifiers) = cache::load(&cache_path) {
            return Ok(identifiers);
        }

        let mut source = JsonlEventSource::open(&self.layout.raw_path(rel))?;
        let identifiers = collect_identifiers(&mut source)?;
        cache::write(&cache_path, &identifiers);
        Ok(identifiers)
    }
}

#[async_trait]
impl IdentityScanner for CachedIdentityScanner {
    async fn scan(&self, rel: &str) -> Result<IdentitySet> {
        let scanner = self.clone();
        let rel = rel.to_string();
        tokio::task::spawn_blocking(move || scanner.scan_blocking(&rel))
            .await
            .map_err(|e| TimelensError::Internal(format!("scan worker aborted: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use timelens_core::ports::EventSink;
    use timelens_domain::{EventPayload, IdeEvent};

    use crate::archive::JsonlEventSink;

    use super::*;

    fn event(session_id: &str, profile_id: Option<&str>) -> IdeEvent {
        IdeEvent {
            session_id: session_id.into(),
            profile_id: profile_id.map(Into::into),
            tool_version: None,
            triggered_at: Utc.timestamp_opt(1_700_000_000, 0).single(),
            terminated_at: None,
            duration: None,
            payload: EventPayload::Info { message: "m".into() },
        }
    }

    fn write_archive(layout: &ArchiveLayout, rel: &str, events: &[IdeEvent]) {
        let mut sink: Box<dyn EventSink> =
            Box::new(JsonlEventSink::create(&layout.raw_path(rel)).expect("create"));
        for event in events {
            sink.append(event).expect("append");
        }
        sink.finish().expect("finish");
    }

    fn layout() -> (tempfile::TempDir, ArchiveLayout) {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = ArchiveLayout::new(
            dir.path().join("raw"),
            dir.path().join("merged"),
            dir.path().join("out"),
        );
        (dir, layout)
    }

    #[tokio::test]
    async fn scan_misses_write_the_cache() {
        let (_dir, layout) = layout();
        write_archive(&layout, "a.evlog", &[event("s1", Some("p1"))]);

        let scanner = CachedIdentityScanner::new(layout.clone());
        let identifiers = scanner.scan("a.evlog").await.expect("scan");

        let expected: IdentitySet = ["sid:s1", "pid:p1"].into_iter().map(String::from).collect();
        assert_eq!(identifiers, expected);
        assert_eq!(cache::load(&layout.id_cache_path("a.evlog")), Some(expected));
    }

    #[tokio::test]
    async fn readable_cache_entries_are_authoritative() {
        let (_dir, layout) = layout();
        write_archive(&layout, "a.evlog", &[event("s1", None)]);

        let cached: IdentitySet = ["sid:from-cache".to_string()].into_iter().collect();
        cache::write(&layout.id_cache_path("a.evlog"), &cached);

        let scanner = CachedIdentityScanner::new(layout);
        assert_eq!(scanner.scan("a.evlog").await.expect("scan"), cached);
    }

    #[tokio::test]
    async fn corrupt_cache_entries_trigger_a_rescan() {
        let (_dir, layout) = layout();
        write_archive(&layout, "a.evlog", &[event("s1", None)]);
        std::fs::write(layout.id_cache_path("a.evlog"), "garbage").expect("write");

        let scanner = CachedIdentityScanner::new(layout.clone());
        let identifiers = scanner.scan("a.evlog").await.expect("scan");

        let expected: IdentitySet = ["sid:s1".to_string()].into_iter().collect();
        assert_eq!(identifiers, expected);
        assert_eq!(cache::load(&layout.id_cache_path("a.evlog")), Some(expected));
    }

    #[tokio::test]
    async fn missing_archives_fail_the_scan() {
        let (_dir, layout) = layout();
        std::fs::create_dir_all(layout.raw_path("")).expect("mkdir");

        let scanner = CachedIdentityScanner::new(layout);
        assert!(scanner.scan("missing.evlog").await.is_err());
    }
}
