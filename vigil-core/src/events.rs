//! Normalization of native watch callbacks into uniform change events.
//!
//! The native layer hands back loosely-typed payloads; everything that
//! crosses the transport boundary goes through [`translate`] so the one
//! wire shape is produced in one place.

use crate::stat::StatSnapshot;
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::Path;
use tracing::debug;

/// Wire-level `type` tag carried by every change event.
pub const EVENT_TYPE: &str = "FILE_SYSTEM_CHANGED";

/// Kind of filesystem change, using the wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Add,
    Change,
    Unlink,
    AddDir,
    UnlinkDir,
    Error,
    Ready,
}

/// Uniform notification emitted for a watched subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub event_kind: EventKind,
    pub path: String,
    /// Present only when the raw callback carried stat-like detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<StatSnapshot>,
}

/// Classification of the raw payload accompanying a native callback.
///
/// Replaces ad-hoc property probing with a single explicit predicate:
/// a payload either is a usable stat result or it is nothing.
#[derive(Debug)]
pub enum RawDetail {
    NoDetail,
    WithDetail(Metadata),
}

/// Classify whatever detail the native layer can offer for `path`.
///
/// Removal events can never carry detail (the entry is gone); for the
/// rest a no-follow stat probe decides.
pub async fn classify_detail(kind: EventKind, path: &Path) -> RawDetail {
    match kind {
        EventKind::Unlink | EventKind::UnlinkDir | EventKind::Error | EventKind::Ready => {
            RawDetail::NoDetail
        }
        _ => match tokio::fs::symlink_metadata(path).await {
            Ok(meta) => RawDetail::WithDetail(meta),
            Err(_) => RawDetail::NoDetail,
        },
    }
}

async fn probe_is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn probe_exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

/// Translate one raw watch callback into a [`ChangeEvent`].
///
/// `details` is attached iff the raw payload classified as stat-like;
/// otherwise the event goes out bare and a diagnostic is recorded (a
/// data-quality signal, not a failure).
pub fn translate(kind: EventKind, path: &Path, raw: RawDetail) -> ChangeEvent {
    let details = match raw {
        RawDetail::WithDetail(meta) => Some(StatSnapshot::from_metadata(path, &meta)),
        RawDetail::NoDetail => {
            if !matches!(kind, EventKind::Unlink | EventKind::UnlinkDir | EventKind::Ready) {
                debug!(?kind, path = %path.display(), "no stat detail available for event");
            }
            None
        }
    };
    ChangeEvent {
        event_type: EVENT_TYPE.to_string(),
        event_kind: kind,
        path: path.to_string_lossy().into_owned(),
        details,
    }
}

/// Map a native event kind onto the wire vocabulary.
///
/// Returns `None` for kinds that carry no user-visible change (access
/// notifications, catch-all noise). Ambiguous kinds are refined with a
/// directory probe on the live path.
pub async fn map_native_kind(kind: &notify::EventKind, path: &Path) -> Option<EventKind> {
    match kind {
        notify::EventKind::Create(CreateKind::Folder) => Some(EventKind::AddDir),
        notify::EventKind::Create(CreateKind::File) => Some(EventKind::Add),
        notify::EventKind::Create(_) => Some(if probe_is_dir(path).await {
            EventKind::AddDir
        } else {
            EventKind::Add
        }),
        notify::EventKind::Remove(RemoveKind::Folder) => Some(EventKind::UnlinkDir),
        notify::EventKind::Remove(_) => Some(EventKind::Unlink),
        // A rename leg looks like a create or a remove depending on
        // whether the reported path still exists.
        notify::EventKind::Modify(ModifyKind::Name(_)) => Some(if probe_is_dir(path).await {
            EventKind::AddDir
        } else if probe_exists(path).await {
            EventKind::Add
        } else {
            EventKind::Unlink
        }),
        notify::EventKind::Modify(_) => Some(EventKind::Change),
        notify::EventKind::Access(_) | notify::EventKind::Any | notify::EventKind::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn kinds_serialize_to_wire_strings() {
        assert_eq!(serde_json::to_string(&EventKind::Add).unwrap(), "\"add\"");
        assert_eq!(serde_json::to_string(&EventKind::AddDir).unwrap(), "\"addDir\"");
        assert_eq!(serde_json::to_string(&EventKind::UnlinkDir).unwrap(), "\"unlinkDir\"");
        assert_eq!(serde_json::to_string(&EventKind::Ready).unwrap(), "\"ready\"");
    }

    #[tokio::test]
    async fn details_present_iff_payload_is_stat_like() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();

        let with = translate(
            EventKind::Add,
            &file,
            classify_detail(EventKind::Add, &file).await,
        );
        assert!(with.details.is_some());
        let snap = with.details.unwrap();
        assert!(snap.is_file);
        assert!(!snap.is_directory);

        let gone = dir.path().join("gone.txt");
        let without = translate(
            EventKind::Unlink,
            &gone,
            classify_detail(EventKind::Unlink, &gone).await,
        );
        assert!(without.details.is_none());
    }

    #[test]
    fn wire_shape_matches_contract() {
        let ev = translate(EventKind::Unlink, &PathBuf::from("/tmp/x"), RawDetail::NoDetail);
        let value = serde_json::to_value(&ev).unwrap();
        assert_eq!(value["type"], "FILE_SYSTEM_CHANGED");
        assert_eq!(value["eventKind"], "unlink");
        assert_eq!(value["path"], "/tmp/x");
        assert!(value.get("details").is_none());
    }

    #[tokio::test]
    async fn maps_native_kinds() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();

        assert_eq!(
            map_native_kind(&notify::EventKind::Create(CreateKind::Any), &sub).await,
            Some(EventKind::AddDir)
        );
        assert_eq!(
            map_native_kind(
                &notify::EventKind::Modify(ModifyKind::Data(
                    notify::event::DataChange::Content
                )),
                &sub
            )
            .await,
            Some(EventKind::Change)
        );
        assert_eq!(
            map_native_kind(&notify::EventKind::Remove(RemoveKind::File), &sub).await,
            Some(EventKind::Unlink)
        );
        assert_eq!(map_native_kind(&notify::EventKind::Other, &sub).await, None);
    }
}
