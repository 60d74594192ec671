//! Filesystem observation core.
//!
//! Lets a consumer fetch directory listings with resolved metadata and
//! watch a subtree for normalized change notifications. Multiple
//! independent requesters each own a replaceable watch session; native
//! callbacks are translated into one uniform event shape and dispatched
//! to an external transport channel.

pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod fsops;
pub mod listing;
pub mod paths;
pub mod registry;
pub mod settings;
pub mod stat;

pub use debounce::Debouncer;
pub use dispatch::{ChannelTransport, Dispatcher, Transport, CHANNEL};
pub use error::{FsError, Result};
pub use events::{translate, ChangeEvent, EventKind, RawDetail, EVENT_TYPE};
pub use listing::{list, list_with_min_delay, DirectoryListing};
pub use registry::{WatchConfig, WatchTarget, WatcherRegistry};
pub use stat::{snapshot, StatSnapshot};
