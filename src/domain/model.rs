use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The editable site content: a JSON object addressed with dotted paths
/// such as `hero.heading`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentMap(Map<String, Value>);

impl ContentMap {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Resolves a dotted path. Numeric segments index into arrays. A missing
    /// segment, a scalar in the middle of the path, or a `null` leaf all
    /// resolve to `None`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    /// Writes `value` at a dotted path, creating intermediate objects.
    ///
    /// Arrays are walked by index and updated in place; an index equal to the
    /// length appends. Scalars and `null` in the middle of the path are
    /// replaced by an empty object. Returns `false`, leaving the content
    /// untouched, when a segment addresses an array with something other than
    /// an existing or next index.
    pub fn set(&mut self, path: &str, value: Value) -> bool {
        let mut segments = path.split('.');
        // split 至少會回傳一個元素
        let first = segments.next().unwrap_or_default();
        let mut slot = self.0.entry(first.to_string()).or_insert(Value::Null);

        for segment in segments {
            if !slot.is_object() && !slot.is_array() {
                *slot = Value::Object(Map::new());
            }
            slot = match child_slot(slot, segment) {
                Some(child) => child,
                None => return false,
            };
        }

        *slot = value;
        true
    }

    /// Shallow merge: every top-level key of `overlay` replaces the same key
    /// in `self`. Nested objects are not merged.
    pub fn merged_with(mut self, overlay: ContentMap) -> ContentMap {
        for (key, value) in overlay.0 {
            self.0.insert(key, value);
        }
        self
    }
}

fn child_slot<'a>(container: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match container {
        Value::Object(map) => Some(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = segment.parse::<usize>().ok()?;
            if index == items.len() {
                items.push(Value::Null);
            }
            items.get_mut(index)
        }
        _ => None,
    }
}

impl From<Map<String, Value>> for ContentMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ContentMap {
    type Error = Value;

    /// Only JSON objects are content maps; anything else is handed back.
    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Outcome of fetching the published document.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteFetch {
    Found(ContentMap),
    NotFound,
    Disabled,
}

/// What `load()` learned about the published document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RemoteStatus {
    Published { keys: usize },
    /// Nothing has been published yet (first run).
    NotPublished,
    /// The fetch failed for another reason; the session starts from empty content.
    Unavailable { reason: String },
    /// No storage base URL is configured.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub remote: RemoteStatus,
    pub draft_restored: bool,
    pub keys: usize,
    /// False when the session was closed before the load finished.
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub published_at: DateTime<Utc>,
    pub keys: usize,
    pub bytes: usize,
    /// An edit landed while the upload was in flight, so the session stays dirty.
    pub superseded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub loading: bool,
    pub has_unsaved_changes: bool,
    pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedAsset {
    pub object_path: String,
    pub public_url: String,
    pub content_type: String,
    pub size: usize,
}
