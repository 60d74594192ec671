//! Per-path settling of rapid event bursts.
//!
//! A large write produces a flurry of native notifications for the same
//! path; only one logical event should reach consumers, and only once
//! the writes have settled.

use crate::events::{ChangeEvent, EventKind};
use dashmap::DashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::trace;

struct PendingEvent {
    event: ChangeEvent,
    last_update: Instant,
    count: usize,
}

/// Aggregates rapid events to the same path and releases a single event
/// per path once the configured quiet period has elapsed.
pub struct Debouncer {
    delay: Duration,
    pending: DashMap<PathBuf, PendingEvent>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: DashMap::new() }
    }

    /// Record an event, superseding any pending event for the same path.
    ///
    /// A creation followed by a burst of writes is one logical write:
    /// the settled event keeps the `add`/`addDir` kind (with the latest
    /// details) so the creation is still announced.
    pub fn record(&self, event: ChangeEvent) {
        let path = PathBuf::from(&event.path);
        self.pending
            .entry(path.clone())
            .and_modify(|p| {
                let kind = match (p.event.event_kind, event.event_kind) {
                    (EventKind::Add, EventKind::Change) => EventKind::Add,
                    (EventKind::AddDir, EventKind::Change) => EventKind::AddDir,
                    (_, incoming) => incoming,
                };
                p.event = event.clone();
                p.event.event_kind = kind;
                p.last_update = Instant::now();
                p.count += 1;
                trace!(path = %path.display(), count = p.count, "superseded pending event");
            })
            .or_insert_with(|| PendingEvent {
                event,
                last_update: Instant::now(),
                count: 1,
            });
    }

    /// Remove and return every event whose quiet period has elapsed.
    pub fn drain_settled(&self) -> Vec<ChangeEvent> {
        let now = Instant::now();
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|entry| now.duration_since(entry.last_update) >= self.delay)
            .map(|entry| entry.key().clone())
            .collect();

        let mut settled = Vec::with_capacity(ready.len());
        for path in ready {
            if let Some((_, p)) = self.pending.remove(&path) {
                trace!(path = %path.display(), aggregated = p.count, "emitting settled event");
                settled.push(p.event);
            }
        }
        settled
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{translate, EventKind, RawDetail};
    use std::path::Path;
    use tokio::time::sleep;

    fn change(path: &str) -> ChangeEvent {
        translate(EventKind::Change, Path::new(path), RawDetail::NoDetail)
    }

    #[tokio::test]
    async fn aggregates_rapid_events_for_one_path() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        for _ in 0..5 {
            debouncer.record(change("/tmp/burst.bin"));
        }
        assert_eq!(debouncer.pending_count(), 1);

        // Nothing settles before the quiet period.
        assert!(debouncer.drain_settled().is_empty());

        sleep(Duration::from_millis(80)).await;
        let settled = debouncer.drain_settled();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].path, "/tmp/burst.bin");
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test]
    async fn separate_paths_settle_independently() {
        let debouncer = Debouncer::new(Duration::from_millis(30));
        debouncer.record(change("/tmp/one"));
        debouncer.record(change("/tmp/two"));

        sleep(Duration::from_millis(60)).await;
        assert_eq!(debouncer.drain_settled().len(), 2);
    }

    #[tokio::test]
    async fn creation_burst_settles_as_add() {
        let debouncer = Debouncer::new(Duration::from_millis(30));
        debouncer.record(translate(EventKind::Add, Path::new("/tmp/new"), RawDetail::NoDetail));
        debouncer.record(change("/tmp/new"));
        debouncer.record(change("/tmp/new"));

        debouncer.record(translate(EventKind::AddDir, Path::new("/tmp/newdir"), RawDetail::NoDetail));
        debouncer.record(translate(EventKind::Change, Path::new("/tmp/newdir"), RawDetail::NoDetail));

        sleep(Duration::from_millis(60)).await;
        let settled = debouncer.drain_settled();
        assert_eq!(settled.len(), 2);
        let file = settled.iter().find(|e| e.path == "/tmp/new").unwrap();
        assert_eq!(file.event_kind, EventKind::Add);
        let dir = settled.iter().find(|e| e.path == "/tmp/newdir").unwrap();
        assert_eq!(dir.event_kind, EventKind::AddDir);
    }

    #[tokio::test]
    async fn later_event_supersedes_earlier_kind() {
        let debouncer = Debouncer::new(Duration::from_millis(30));
        debouncer.record(translate(EventKind::Add, Path::new("/tmp/f"), RawDetail::NoDetail));
        debouncer.record(translate(EventKind::Unlink, Path::new("/tmp/f"), RawDetail::NoDetail));

        sleep(Duration::from_millis(60)).await;
        let settled = debouncer.drain_settled();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].event_kind, EventKind::Unlink);
    }
}
