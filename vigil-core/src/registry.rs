//! Per-requester watch sessions.
//!
//! The registry owns the only piece of mutable shared state in the
//! subsystem: the mapping from requester identity to its live watch
//! session. The map is mutated exclusively through [`WatcherRegistry::start`],
//! [`WatcherRegistry::add`] and [`WatcherRegistry::stop`]; `start`'s
//! replace-before-create ordering is the concurrency discipline that
//! keeps one identity from ever running two overlapping sessions.

use crate::debounce::Debouncer;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::events::{self, EventKind};
use crate::paths;
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Fixed per-session policy.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Quiet period before a write burst is reported once.
    pub debounce_ms: u64,
    /// Levels below a watched root that are reported. Deeper changes
    /// are dropped to bound event volume.
    pub max_depth: usize,
    /// Log file name that never produces events.
    pub ignored_log_name: String,
    /// Additional glob patterns to ignore.
    pub ignore_patterns: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            max_depth: 1,
            ignored_log_name: "vigil.log".to_string(),
            ignore_patterns: vec![],
        }
    }
}

/// One path or an ordered set of paths to watch.
///
/// A trailing `*` segment means "everything immediately inside this
/// directory": the wildcard's parent becomes the watched root.
#[derive(Debug, Clone)]
pub enum WatchTarget {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl From<&str> for WatchTarget {
    fn from(p: &str) -> Self {
        WatchTarget::One(PathBuf::from(p))
    }
}

impl From<PathBuf> for WatchTarget {
    fn from(p: PathBuf) -> Self {
        WatchTarget::One(p)
    }
}

impl From<&Path> for WatchTarget {
    fn from(p: &Path) -> Self {
        WatchTarget::One(p.to_path_buf())
    }
}

impl From<Vec<PathBuf>> for WatchTarget {
    fn from(p: Vec<PathBuf>) -> Self {
        WatchTarget::Many(p)
    }
}

/// Resolve a target into watch roots: home placeholders expanded,
/// trailing wildcard segments stripped to their parent directory,
/// duplicates removed in order.
fn resolve_roots(target: WatchTarget) -> Vec<PathBuf> {
    let raw = match target {
        WatchTarget::One(p) => vec![p],
        WatchTarget::Many(ps) => ps,
    };

    let mut roots: Vec<PathBuf> = Vec::with_capacity(raw.len());
    for path in raw {
        let resolved = paths::resolve_home(&path);
        let root = if resolved.file_name().is_some_and(|n| n == "*") {
            resolved.parent().map(Path::to_path_buf).unwrap_or(resolved)
        } else {
            resolved
        };
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

struct WatchSession {
    watcher: RecommendedWatcher,
    roots: Arc<RwLock<Vec<PathBuf>>>,
    forward: JoinHandle<()>,
}

/// Registry of active watch sessions, keyed by requester identity.
///
/// Sessions for different identities run and emit independently; the
/// `&mut self` surface serializes lifecycle calls for any one identity.
/// At shutdown callers must invoke [`WatcherRegistry::stop_all`] so
/// every native handle is released.
pub struct WatcherRegistry {
    sessions: HashMap<String, WatchSession>,
    dispatcher: Dispatcher,
    config: WatchConfig,
}

impl WatcherRegistry {
    pub fn new(dispatcher: Dispatcher, config: WatchConfig) -> Self {
        Self { sessions: HashMap::new(), dispatcher, config }
    }

    /// Start a watch session for `requester_id` over `target`.
    ///
    /// Any existing session for the same identity is fully stopped
    /// first: the native handle is released and its forwarding task
    /// finishes before the replacement exists, so no event from the
    /// stale session can be observed after this returns. This ordering
    /// is an invariant, not an optimization.
    pub async fn start(&mut self, requester_id: &str, target: impl Into<WatchTarget>) -> Result<()> {
        self.stop(requester_id).await;

        let roots = resolve_roots(target.into());
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                // Runs on the native watch thread; the unbounded send
                // never blocks it.
                let _ = raw_tx.send(res);
            },
            notify::Config::default().with_follow_symlinks(false),
        )?;

        for root in &roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            debug!(requester = requester_id, root = %root.display(), "watching root");
        }

        let roots = Arc::new(RwLock::new(roots));
        let forward = tokio::spawn(forward_events(
            raw_rx,
            Arc::clone(&roots),
            self.dispatcher.clone(),
            self.config.clone(),
            requester_id.to_string(),
        ));

        self.sessions.insert(
            requester_id.to_string(),
            WatchSession { watcher, roots, forward },
        );
        info!(requester = requester_id, "watch session started");
        Ok(())
    }

    /// Extend an existing session's watch set without tearing it down.
    ///
    /// A no-op when no session exists for `requester_id`; callers must
    /// `start` first.
    pub async fn add(&mut self, requester_id: &str, target: impl Into<WatchTarget>) -> Result<()> {
        let Some(session) = self.sessions.get_mut(requester_id) else {
            warn!(requester = requester_id, "add ignored: no active watch session");
            return Ok(());
        };

        for root in resolve_roots(target.into()) {
            let mut roots = session.roots.write().await;
            if roots.contains(&root) {
                continue;
            }
            session.watcher.watch(&root, RecursiveMode::Recursive)?;
            debug!(requester = requester_id, root = %root.display(), "added watch root");
            roots.push(root);
        }
        Ok(())
    }

    /// Stop and remove the session for `requester_id`, if any.
    ///
    /// The native handle is released and the forwarding task has
    /// finished by the time this returns; a subsequent `start` for the
    /// same identity cannot race with in-flight events.
    pub async fn stop(&mut self, requester_id: &str) {
        if let Some(WatchSession { watcher, forward, .. }) = self.sessions.remove(requester_id) {
            // Dropping the watcher releases the native handle and closes
            // the raw channel, which ends the forwarding task.
            drop(watcher);
            if forward.await.is_err() {
                error!(requester = requester_id, "watch forwarding task panicked");
            }
            info!(requester = requester_id, "watch session stopped");
        }
    }

    /// Stop every active session.
    pub async fn stop_all(&mut self) {
        let ids: Vec<String> = self.sessions.keys().cloned().collect();
        for id in ids {
            self.stop(&id).await;
        }
    }

    pub fn is_watching(&self, requester_id: &str) -> bool {
        self.sessions.contains_key(requester_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn build_ignore_set(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!(pattern = %pattern, error = %e, "skipping invalid ignore pattern"),
        }
    }
    builder.build().ok()
}

/// Decide whether an event path is reportable for this session.
fn passes_filters(
    path: &Path,
    roots: &[PathBuf],
    ignore: Option<&GlobSet>,
    config: &WatchConfig,
) -> bool {
    let Some(rel) = roots.iter().find_map(|r| path.strip_prefix(r).ok()) else {
        return false;
    };

    // Depth boundary relative to the watched root.
    if rel.components().count() > config.max_depth {
        return false;
    }

    for component in rel.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.starts_with('.') {
            return false;
        }
        if name == config.ignored_log_name.as_str() {
            return false;
        }
    }

    if let Some(set) = ignore {
        if set.is_match(rel) {
            return false;
        }
    }
    true
}

/// Session pump: raw native callbacks in, dispatched change events out.
///
/// Lives until the raw channel closes (the watcher was dropped). Errors
/// from the native layer become `error`-kind events and never stop the
/// session; only the registry stops sessions.
async fn forward_events(
    mut raw_rx: mpsc::UnboundedReceiver<std::result::Result<notify::Event, notify::Error>>,
    roots: Arc<RwLock<Vec<PathBuf>>>,
    dispatcher: Dispatcher,
    config: WatchConfig,
    requester: String,
) {
    let ignore = build_ignore_set(&config.ignore_patterns);
    let debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms));
    let mut tick = tokio::time::interval(Duration::from_millis(50));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // The pre-existing tree produces no notifications; a single ready
    // event marks the point after which changes are reported.
    let first_root = roots.read().await.first().cloned().unwrap_or_default();
    let ready = events::translate(EventKind::Ready, &first_root, events::RawDetail::NoDetail);
    if let Err(e) = dispatcher.dispatch(&ready).await {
        error!(requester = %requester, error = %e, "failed to dispatch ready event");
    }

    loop {
        tokio::select! {
            received = raw_rx.recv() => match received {
                None => break,
                Some(Ok(event)) => {
                    let roots = roots.read().await;
                    for path in &event.paths {
                        if !passes_filters(path, &roots, ignore.as_ref(), &config) {
                            continue;
                        }
                        let Some(kind) = events::map_native_kind(&event.kind, path).await else {
                            continue;
                        };
                        let raw = events::classify_detail(kind, path).await;
                        debouncer.record(events::translate(kind, path, raw));
                    }
                }
                Some(Err(e)) => {
                    warn!(requester = %requester, error = %e, "native watch error");
                    let path = e.paths.first().cloned().unwrap_or_else(|| first_root.clone());
                    let ev = events::translate(EventKind::Error, &path, events::RawDetail::NoDetail);
                    if let Err(e) = dispatcher.dispatch(&ev).await {
                        error!(requester = %requester, error = %e, "failed to dispatch error event");
                    }
                }
            },
            _ = tick.tick() => {
                for ev in debouncer.drain_settled() {
                    if let Err(e) = dispatcher.dispatch(&ev).await {
                        error!(requester = %requester, error = %e, "failed to dispatch change event");
                    }
                }
            }
        }
    }
    debug!(requester = %requester, "watch session pump ended");
}
