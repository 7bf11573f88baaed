//! Draft/publish pipeline for the marketing site's editable content.
//!
//! A [`ContentSession`] loads the published JSON document from object
//! storage, layers the locally saved draft on top, and lets an editor read
//! and write fields by dotted path (`hero.heading`). Edits are saved to the
//! local draft after a short debounce and go live with
//! [`ContentSession::publish`].

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{FileKvStore, MemoryKvStore, StorageClient};
pub use config::StudioConfig;
pub use core::session::{ContentSession, SessionOptions, DRAFT_KEY};
pub use domain::model::{ContentMap, LoadReport, PublishReceipt, RemoteStatus, SessionStatus};
pub use utils::error::{ContentError, Result};
