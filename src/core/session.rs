//! Editing session over the site content.
//!
//! A [`ContentSession`] loads the published document, layers the local draft
//! on top of it, hands out dotted-path accessors, and publishes the result.
//! Edits only touch memory; a debounced background write keeps the local
//! draft in sync with the latest state.

use crate::core::assets;
use crate::core::debounce::Debouncer;
use crate::domain::model::{
    ContentMap, LoadReport, PublishReceipt, RemoteFetch, RemoteStatus, SessionStatus,
    UploadedAsset,
};
use crate::domain::ports::{Confirm, ContentBackend, KvStore};
use crate::utils::error::{ContentError, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

/// Key of the single draft blob in the local store.
pub const DRAFT_KEY: &str = "content_draft";

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

pub const DISCARD_PROMPT: &str =
    "Discard your unsaved changes? This reverts to the live website version.";

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub debounce: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[derive(Debug)]
struct SessionState {
    content: ContentMap,
    loading: bool,
    dirty: bool,
    revision: u64,
    last_saved: Option<DateTime<Utc>>,
}

struct Inner<B, K> {
    backend: B,
    store: K,
    state: RwLock<SessionState>,
    // 所有對本地草稿的寫入都要先拿這把鎖
    write_gate: tokio::sync::Mutex<()>,
    alive: AtomicBool,
    debouncer: Debouncer,
}

impl<B: ContentBackend, K: KvStore> Inner<B, K> {
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dirty_snapshot(&self) -> Option<ContentMap> {
        let state = self.read();
        state.dirty.then(|| state.content.clone())
    }

    fn mark_saved(&self) -> DateTime<Utc> {
        let now = Utc::now();
        self.write().last_saved = Some(now);
        now
    }

    /// Debounced persist: writes the latest content if it is still dirty.
    async fn persist_draft(&self) -> Result<bool> {
        let _gate = self.write_gate.lock().await;
        let Some(snapshot) = self.dirty_snapshot() else {
            tracing::debug!("Draft persist skipped: no unsaved changes");
            return Ok(false);
        };

        self.store.set(DRAFT_KEY, snapshot.into_value()).await?;
        self.mark_saved();
        tracing::debug!("💾 Local draft saved");
        Ok(true)
    }

    async fn clear_draft(&self) -> Result<()> {
        self.store.set(DRAFT_KEY, Value::Null).await
    }
}

/// Cloneable handle to one editing session. All clones share state.
pub struct ContentSession<B, K> {
    inner: Arc<Inner<B, K>>,
}

impl<B, K> Clone for ContentSession<B, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B, K> ContentSession<B, K>
where
    B: ContentBackend + 'static,
    K: KvStore + 'static,
{
    /// Creates a session in the loading state. Must be called inside a tokio
    /// runtime, since the debounce worker is spawned here.
    pub fn new(backend: B, store: K, options: SessionOptions) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner<B, K>>| {
            let weak = weak.clone();
            let debouncer = Debouncer::spawn(options.debounce, move || {
                let weak = weak.clone();
                async move {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    if let Err(e) = inner.persist_draft().await {
                        tracing::error!("❌ Failed to save local draft: {}", e);
                        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                    }
                }
            });

            Inner {
                backend,
                store,
                state: RwLock::new(SessionState {
                    content: ContentMap::new(),
                    loading: true,
                    dirty: false,
                    revision: 0,
                    last_saved: None,
                }),
                write_gate: tokio::sync::Mutex::new(()),
                alive: AtomicBool::new(true),
                debouncer,
            }
        });

        Self { inner }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.inner.read();
        SessionStatus {
            loading: state.loading,
            has_unsaved_changes: state.dirty,
            last_saved: state.last_saved,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().loading
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.read().dirty
    }

    pub fn snapshot(&self) -> ContentMap {
        self.inner.read().content.clone()
    }

    pub fn is_closed(&self) -> bool {
        !self.inner.alive.load(Ordering::SeqCst)
    }

    /// Loads the published document and merges the local draft over it.
    ///
    /// Remote failures never fail the load: the session starts from empty
    /// content and the reason is reported in [`LoadReport::remote`]. Errors
    /// from the local store are returned.
    pub async fn load(&self) -> Result<LoadReport> {
        self.inner.write().loading = true;
        let result = self.load_and_merge().await;
        if !self.is_closed() {
            self.inner.write().loading = false;
        }
        result
    }

    async fn fetch_remote(&self) -> (RemoteStatus, ContentMap) {
        match self.inner.backend.fetch_content().await {
            Ok(RemoteFetch::Found(content)) => {
                tracing::info!("Live content loaded: {} keys", content.len());
                (
                    RemoteStatus::Published {
                        keys: content.len(),
                    },
                    content,
                )
            }
            Ok(RemoteFetch::NotFound) => {
                tracing::info!("No published content yet; starting empty");
                (RemoteStatus::NotPublished, ContentMap::new())
            }
            Ok(RemoteFetch::Disabled) => {
                tracing::warn!("Storage base URL not configured; content fetching disabled");
                (RemoteStatus::Disabled, ContentMap::new())
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to fetch live content, starting empty: {}", e);
                (
                    RemoteStatus::Unavailable {
                        reason: e.to_string(),
                    },
                    ContentMap::new(),
                )
            }
        }
    }

    async fn read_draft(&self) -> Result<Option<ContentMap>> {
        match self.inner.store.get(DRAFT_KEY).await? {
            None => Ok(None),
            Some(value) => ContentMap::try_from(value).map(Some).map_err(|other| {
                ContentError::DraftStoreError {
                    message: format!("stored draft is not a JSON object: {}", other),
                }
            }),
        }
    }

    async fn load_and_merge(&self) -> Result<LoadReport> {
        let (remote, live) = self.fetch_remote().await;
        let draft = self.read_draft().await?;

        if self.is_closed() {
            tracing::debug!("Session closed during load; result ignored");
            return Ok(LoadReport {
                remote,
                draft_restored: false,
                keys: 0,
                applied: false,
            });
        }

        let draft_restored = draft.is_some();
        let content = match draft {
            Some(local) => {
                tracing::info!("Local draft found; layering it over live content");
                live.merged_with(local)
            }
            None => live,
        };
        let keys = content.len();

        {
            let mut state = self.inner.write();
            state.content = content;
            state.dirty = draft_restored;
            state.revision += 1;
        }

        Ok(LoadReport {
            remote,
            draft_restored,
            keys,
            applied: true,
        })
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.inner.read().content.get(path).cloned()
    }

    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get(path).unwrap_or_else(|| default.into())
    }

    /// String view of a field; non-string leaves are rendered as JSON.
    pub fn get_str(&self, path: &str, default: &str) -> String {
        match self.get(path) {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => default.to_string(),
        }
    }

    /// Writes `value` at `path` in memory and schedules a draft save.
    ///
    /// Returns `false` when the path cannot address an array it walks
    /// through; nothing changes and no save is scheduled.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> bool {
        {
            let mut state = self.inner.write();
            if !state.content.set(path, value.into()) {
                tracing::warn!("⚠️ Ignoring edit to '{}': path does not fit an existing list", path);
                return false;
            }
            state.dirty = true;
            state.revision += 1;
        }
        self.inner.debouncer.arm();
        true
    }

    /// Writes the current content to the local draft right away.
    pub async fn save_draft(&self) -> Result<DateTime<Utc>> {
        self.inner.debouncer.cancel();
        let _gate = self.inner.write_gate.lock().await;
        let snapshot = self.snapshot();
        self.inner.store.set(DRAFT_KEY, snapshot.into_value()).await?;
        let saved_at = self.inner.mark_saved();
        tracing::info!("💾 Draft saved manually");
        Ok(saved_at)
    }

    /// Replaces the published document with the current content.
    ///
    /// On failure the draft and the unsaved-changes flag stay as they were.
    pub async fn publish(&self) -> Result<PublishReceipt> {
        let (snapshot, revision) = {
            let state = self.inner.read();
            (state.content.clone(), state.revision)
        };
        let body = serde_json::to_vec_pretty(&snapshot)?;
        let bytes = body.len();

        tracing::info!("🚀 Publishing {} keys ({} bytes)", snapshot.len(), bytes);
        if let Err(e) = self.inner.backend.publish_content(body).await {
            tracing::error!("❌ Failed to publish: {}", e);
            return Err(e);
        }

        let gate = self.inner.write_gate.lock().await;
        let edited_meanwhile = self.inner.read().revision != revision;
        if !edited_meanwhile {
            self.inner.clear_draft().await?;
        }

        let published_at = Utc::now();
        let superseded = {
            let mut state = self.inner.write();
            state.last_saved = Some(published_at);
            if state.revision == revision {
                state.dirty = false;
                false
            } else {
                true
            }
        };
        drop(gate);

        if superseded {
            tracing::warn!("Content changed while publishing; keeping the draft");
            self.inner.debouncer.arm();
        } else {
            self.inner.debouncer.cancel();
        }

        tracing::info!("✅ Published successfully");
        Ok(PublishReceipt {
            published_at,
            keys: snapshot.len(),
            bytes,
            superseded,
        })
    }

    /// Throws away the local draft and all in-memory edits, then reloads the
    /// published document. Returns `None` if the operator declined.
    pub async fn discard<C: Confirm + ?Sized>(&self, confirm: &C) -> Result<Option<LoadReport>> {
        if !confirm.confirm(DISCARD_PROMPT) {
            tracing::info!("Discard cancelled");
            return Ok(None);
        }

        self.inner.debouncer.cancel();
        {
            let _gate = self.inner.write_gate.lock().await;
            self.inner.clear_draft().await?;
            let mut state = self.inner.write();
            state.content = ContentMap::new();
            state.dirty = false;
            state.revision += 1;
        }
        tracing::info!("🗑️ Local draft discarded; reloading live content");

        self.load().await.map(Some)
    }

    /// Uploads an asset and returns its public URL. The content is untouched;
    /// callers usually follow up with [`ContentSession::set`].
    pub async fn upload_asset(
        &self,
        prefix: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<UploadedAsset> {
        assets::upload_asset(&self.inner.backend, prefix, file_name, data).await
    }

    /// Tears the session down. In-flight loads are ignored from here on;
    /// with `flush` a pending draft save is written before the worker stops.
    pub async fn close(&self, flush: bool) -> bool {
        self.inner.alive.store(false, Ordering::SeqCst);
        let flushed = self.inner.debouncer.shutdown(flush).await;
        if flushed {
            tracing::debug!("Pending draft flushed on close");
        }
        flushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryKvStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use tokio::time::sleep;

    /// Remote store kept in memory. Publishing can be switched to fail, and
    /// fetches can be held until released.
    #[derive(Default)]
    struct MockBackend {
        published: Mutex<Option<ContentMap>>,
        fetch_error: Mutex<Option<u16>>,
        publish_error: Mutex<bool>,
        publishes: Mutex<Vec<Vec<u8>>>,
        fetch_gate: Option<Arc<Notify>>,
    }

    impl MockBackend {
        fn with_remote(value: Value) -> Self {
            let backend = Self::default();
            *backend.published.lock().unwrap() = Some(ContentMap::try_from(value).unwrap());
            backend
        }

        fn publish_bodies(&self) -> Vec<Vec<u8>> {
            self.publishes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentBackend for MockBackend {
        async fn fetch_content(&self) -> Result<RemoteFetch> {
            if let Some(gate) = &self.fetch_gate {
                gate.notified().await;
            }
            if let Some(status) = *self.fetch_error.lock().unwrap() {
                return Err(ContentError::RemoteError {
                    operation: "fetch content".to_string(),
                    status,
                    message: "mock failure".to_string(),
                });
            }
            Ok(match self.published.lock().unwrap().clone() {
                Some(content) => RemoteFetch::Found(content),
                None => RemoteFetch::NotFound,
            })
        }

        async fn publish_content(&self, body: Vec<u8>) -> Result<()> {
            if *self.publish_error.lock().unwrap() {
                return Err(ContentError::RemoteError {
                    operation: "publish".to_string(),
                    status: 403,
                    message: "new row violates row-level security policy".to_string(),
                });
            }
            let value: Value = serde_json::from_slice(&body)?;
            *self.published.lock().unwrap() = Some(ContentMap::try_from(value).unwrap());
            self.publishes.lock().unwrap().push(body);
            Ok(())
        }

        async fn upload_object(
            &self,
            path: &str,
            _data: Vec<u8>,
            _content_type: &str,
        ) -> Result<String> {
            Ok(format!("https://cdn.test/{}", path))
        }
    }

    fn options(ms: u64) -> SessionOptions {
        SessionOptions {
            debounce: Duration::from_millis(ms),
        }
    }

    #[tokio::test]
    async fn test_new_session_starts_loading() {
        let session = ContentSession::new(MockBackend::default(), MemoryKvStore::new(), options(50));
        assert!(session.is_loading());

        session.load().await.unwrap();
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_merge_law_draft_overrides_remote() {
        let store = MemoryKvStore::new();
        store.set(DRAFT_KEY, json!({"b": 3, "c": 4})).await.unwrap();
        let session = ContentSession::new(
            MockBackend::with_remote(json!({"a": 1, "b": 2})),
            store,
            options(50),
        );

        let report = session.load().await.unwrap();

        assert!(report.draft_restored);
        assert_eq!(report.remote, RemoteStatus::Published { keys: 2 });
        assert_eq!(session.snapshot().into_value(), json!({"a": 1, "b": 3, "c": 4}));
        assert!(session.has_unsaved_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_edit_is_persisted_after_debounce() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(MockBackend::default(), store.clone(), options(1000));

        let report = session.load().await.unwrap();
        assert_eq!(report.remote, RemoteStatus::NotPublished);
        assert!(session.snapshot().is_empty());

        session.set("hero.heading", "Hello");
        assert_eq!(session.get("hero.heading"), Some(json!("Hello")));
        assert!(session.has_unsaved_changes());

        sleep(Duration::from_millis(999)).await;
        assert_eq!(store.writes(), 0);
        assert!(session.status().last_saved.is_none());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(store.writes(), 1);
        assert_eq!(
            store.get(DRAFT_KEY).await.unwrap(),
            Some(json!({"hero": {"heading": "Hello"}}))
        );
        assert!(session.status().last_saved.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_within_window_write_once_with_latest_state() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(MockBackend::default(), store.clone(), options(1000));
        session.load().await.unwrap();

        session.set("hero.heading", "One");
        sleep(Duration::from_millis(400)).await;
        session.set("hero.heading", "Two");
        sleep(Duration::from_millis(400)).await;
        session.set("hero.heading", "Three");

        // 最後一次編輯後 1000ms 才寫入
        sleep(Duration::from_millis(999)).await;
        assert_eq!(store.writes(), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(store.writes(), 1);
        assert_eq!(
            store.get(DRAFT_KEY).await.unwrap(),
            Some(json!({"hero": {"heading": "Three"}}))
        );
    }

    #[tokio::test]
    async fn test_get_defaults() {
        let session = ContentSession::new(
            MockBackend::with_remote(json!({"hero": {"heading": "Live", "cta": null}})),
            MemoryKvStore::new(),
            options(50),
        );
        session.load().await.unwrap();

        assert_eq!(session.get_str("hero.heading", "fallback"), "Live");
        assert_eq!(session.get_str("hero.cta", "Talk to us"), "Talk to us");
        assert_eq!(session.get_or("hero.heading.deeper", 7), json!(7));
    }

    #[tokio::test]
    async fn test_set_overwrites_non_object_intermediate() {
        let session = ContentSession::new(
            MockBackend::with_remote(json!({"hero": "flat"})),
            MemoryKvStore::new(),
            options(50),
        );
        session.load().await.unwrap();

        session.set("hero.heading", "Nested");
        assert_eq!(session.get("hero.heading"), Some(json!("Nested")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_items_are_edited_in_place() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(
            MockBackend::with_remote(json!({"services": ["Design", "Build"]})),
            store.clone(),
            options(1000),
        );
        session.load().await.unwrap();

        assert_eq!(session.get_str("services.0", "fallback"), "Design");
        assert!(session.set("services.0", "Strategy"));
        sleep(Duration::from_millis(1001)).await;

        assert_eq!(
            store.get(DRAFT_KEY).await.unwrap(),
            Some(json!({"services": ["Strategy", "Build"]}))
        );
        session.publish().await.unwrap();
        assert_eq!(
            session.backend().published.lock().unwrap().clone().map(ContentMap::into_value),
            Some(json!({"services": ["Strategy", "Build"]}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_list_edit_changes_nothing() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(
            MockBackend::with_remote(json!({"services": ["Design", "Build"]})),
            store.clone(),
            options(1000),
        );
        session.load().await.unwrap();

        assert!(!session.set("services.7", "Gap"));
        assert!(!session.has_unsaved_changes());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.writes(), 0);
        assert_eq!(session.snapshot().into_value(), json!({"services": ["Design", "Build"]}));
    }

    #[tokio::test]
    async fn test_remote_failure_starts_empty_without_error() {
        let backend = MockBackend::with_remote(json!({"a": 1}));
        *backend.fetch_error.lock().unwrap() = Some(503);
        let session = ContentSession::new(backend, MemoryKvStore::new(), options(50));

        let report = session.load().await.unwrap();

        assert!(matches!(report.remote, RemoteStatus::Unavailable { .. }));
        assert!(session.snapshot().is_empty());
        assert!(!session.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_corrupt_draft_fails_load() {
        let store = MemoryKvStore::new();
        store.set(DRAFT_KEY, json!("not a map")).await.unwrap();
        let session = ContentSession::new(MockBackend::default(), store, options(50));

        let result = session.load().await;
        assert!(matches!(result, Err(ContentError::DraftStoreError { .. })));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_publish_clears_draft_and_flag() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(MockBackend::default(), store.clone(), options(50));
        session.load().await.unwrap();
        session.set("hero.heading", "Hello");
        session.save_draft().await.unwrap();

        let receipt = session.publish().await.unwrap();

        assert!(!receipt.superseded);
        assert_eq!(receipt.keys, 1);
        assert!(!session.has_unsaved_changes());
        assert_eq!(store.get(DRAFT_KEY).await.unwrap(), None);
        assert_eq!(
            session.backend().published.lock().unwrap().clone().map(ContentMap::into_value),
            Some(json!({"hero": {"heading": "Hello"}}))
        );
    }

    #[tokio::test]
    async fn test_publish_twice_is_idempotent() {
        let session = ContentSession::new(MockBackend::default(), MemoryKvStore::new(), options(50));
        session.load().await.unwrap();
        session.set("footer.text", "© Cloudly");

        session.publish().await.unwrap();
        assert!(!session.has_unsaved_changes());
        session.publish().await.unwrap();
        assert!(!session.has_unsaved_changes());

        let bodies = session.backend().publish_bodies();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0], bodies[1]);
    }

    #[tokio::test]
    async fn test_publish_is_pretty_printed() {
        let session = ContentSession::new(MockBackend::default(), MemoryKvStore::new(), options(50));
        session.load().await.unwrap();
        session.set("a", 1);
        session.publish().await.unwrap();

        let body = String::from_utf8(session.backend().publish_bodies().remove(0)).unwrap();
        assert_eq!(body, "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn test_failed_publish_keeps_draft_and_flag() {
        let store = MemoryKvStore::new();
        let backend = MockBackend::default();
        *backend.publish_error.lock().unwrap() = true;
        let session = ContentSession::new(backend, store.clone(), options(50));
        session.load().await.unwrap();
        session.set("hero.heading", "Unsaved");
        session.save_draft().await.unwrap();

        let result = session.publish().await;

        assert!(matches!(result, Err(ContentError::RemoteError { status: 403, .. })));
        assert!(session.has_unsaved_changes());
        assert_eq!(
            store.get(DRAFT_KEY).await.unwrap(),
            Some(json!({"hero": {"heading": "Unsaved"}}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_persist_does_not_resurrect_published_draft() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(MockBackend::default(), store.clone(), options(1000));
        session.load().await.unwrap();

        session.set("hero.heading", "Hello");
        session.publish().await.unwrap();
        assert_eq!(store.writes(), 1);

        sleep(Duration::from_secs(5)).await;
        // 只有發佈時清掉草稿的那一次
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get(DRAFT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_draft_round_trips_through_fresh_load() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(
            MockBackend::with_remote(json!({"hero": {"heading": "Live"}, "footer": "x"})),
            store.clone(),
            options(50),
        );
        session.load().await.unwrap();
        session.set("hero.heading", "Draft");
        session.save_draft().await.unwrap();
        let expected = session.snapshot();
        session.close(false).await;

        let reopened = ContentSession::new(
            MockBackend::with_remote(json!({"hero": {"heading": "Live"}, "footer": "x"})),
            store,
            options(50),
        );
        let report = reopened.load().await.unwrap();

        assert!(report.draft_restored);
        assert_eq!(reopened.snapshot(), expected);
        assert!(reopened.has_unsaved_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_reverts_to_remote() {
        let store = MemoryKvStore::new();
        store.set(DRAFT_KEY, json!({"b": 3})).await.unwrap();
        let session = ContentSession::new(
            MockBackend::with_remote(json!({"a": 1, "b": 2})),
            store.clone(),
            options(50),
        );
        session.load().await.unwrap();
        session.set("c", 9);

        let report = session.discard(&true).await.unwrap().unwrap();

        assert!(!report.draft_restored);
        assert_eq!(store.get(DRAFT_KEY).await.unwrap(), None);
        assert_eq!(session.snapshot().into_value(), json!({"a": 1, "b": 2}));
        assert!(!session.has_unsaved_changes());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.get(DRAFT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_discard_needs_confirmation() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(MockBackend::default(), store.clone(), options(50));
        session.load().await.unwrap();
        session.set("hero.heading", "Keep me");

        assert_eq!(session.discard(&false).await.unwrap(), None);
        assert_eq!(session.get("hero.heading"), Some(json!("Keep me")));
        assert!(session.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_close_flushes_pending_draft() {
        let store = MemoryKvStore::new();
        let session = ContentSession::new(MockBackend::default(), store.clone(), options(60_000));
        session.load().await.unwrap();
        session.set("hero.heading", "Bye");

        assert!(session.close(true).await);
        assert_eq!(
            store.get(DRAFT_KEY).await.unwrap(),
            Some(json!({"hero": {"heading": "Bye"}}))
        );
    }

    #[tokio::test]
    async fn test_load_after_close_is_ignored() {
        let gate = Arc::new(Notify::new());
        let backend = MockBackend {
            fetch_gate: Some(gate.clone()),
            ..MockBackend::with_remote(json!({"a": 1}))
        };
        let session = ContentSession::new(backend, MemoryKvStore::new(), options(50));

        let loader = session.clone();
        let pending = tokio::spawn(async move { loader.load().await });
        tokio::task::yield_now().await;

        session.close(false).await;
        gate.notify_one();

        let report = pending.await.unwrap().unwrap();
        assert!(!report.applied);
        assert!(session.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_upload_asset_uses_backend_url() {
        let session = ContentSession::new(MockBackend::default(), MemoryKvStore::new(), options(50));

        let asset = session
            .upload_asset("marketing", "hero.png", vec![1, 2, 3])
            .await
            .unwrap();

        assert!(asset.public_url.starts_with("https://cdn.test/marketing/"));
        assert_eq!(asset.content_type, "image/png");
        assert_eq!(asset.size, 3);
    }
}
