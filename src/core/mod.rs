pub mod assets;
pub mod debounce;
pub mod session;

pub use crate::domain::model::{ContentMap, LoadReport, PublishReceipt, RemoteStatus, SessionStatus};
pub use crate::domain::ports::{Confirm, ConfigProvider, ContentBackend, KvStore};
pub use crate::utils::error::Result;
pub use session::{ContentSession, SessionOptions, DRAFT_KEY};
