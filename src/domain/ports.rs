use crate::domain::model::RemoteFetch;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Persistent local key-value store holding serialized JSON values.
/// A `null` value and a missing key both mean "nothing stored".
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<Value>>> + Send;
    fn set(&self, key: &str, value: Value)
        -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The hosted object store that serves the published content document and
/// uploaded assets.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Unauthenticated read of the published document.
    async fn fetch_content(&self) -> Result<RemoteFetch>;

    /// Overwrites the published document with `body` (JSON bytes).
    async fn publish_content(&self, body: Vec<u8>) -> Result<()>;

    /// Uploads a new object and returns its public URL.
    async fn upload_object(&self, path: &str, data: Vec<u8>, content_type: &str)
        -> Result<String>;
}

/// Asks the operator to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> Option<&str>;
    fn bucket(&self) -> &str;
    fn content_path(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn access_token(&self) -> Option<&str>;
    fn draft_dir(&self) -> &str;
    fn debounce_ms(&self) -> u64;
}
