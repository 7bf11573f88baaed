use crate::domain::model::{ContentMap, RemoteFetch};
use crate::domain::ports::{ConfigProvider, ContentBackend};
use crate::utils::error::{ContentError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use url::Url;

/// Client for a Supabase-style storage REST API.
///
/// Public objects are read from `{base}/storage/v1/object/public/{bucket}/{path}`
/// without credentials; writes go to `{base}/storage/v1/object/{bucket}/{path}`
/// and need a bearer token.
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: Option<String>,
    bucket: String,
    content_path: String,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl StorageClient {
    pub fn new(base_url: Option<&str>, bucket: &str, content_path: &str) -> Result<Self> {
        let base_url = match base_url.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                Url::parse(raw).map_err(|e| ContentError::InvalidConfigValueError {
                    field: "storage.base_url".to_string(),
                    value: raw.to_string(),
                    reason: format!("Invalid URL format: {}", e),
                })?;
                Some(raw.trim_end_matches('/').to_string())
            }
            None => None,
        };

        Ok(Self {
            client: Client::new(),
            base_url,
            bucket: bucket.to_string(),
            content_path: content_path.to_string(),
            api_key: None,
            access_token: None,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut client = Self::new(config.base_url(), config.bucket(), config.content_path())?;
        client.api_key = config.api_key().map(str::to_string);
        client.access_token = config.access_token().map(str::to_string);
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    pub fn public_url(&self, path: &str) -> Option<String> {
        self.base_url.as_ref().map(|base| {
            format!(
                "{}/storage/v1/object/public/{}/{}",
                base, self.bucket, path
            )
        })
    }

    pub fn content_url(&self) -> Option<String> {
        self.public_url(&self.content_path)
    }

    fn object_url(&self, path: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}/storage/v1/object/{}/{}", base, self.bucket, path))
    }

    async fn write_object(
        &self,
        operation: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<()> {
        let url = self
            .object_url(path)
            .ok_or_else(|| ContentError::MissingConfigError {
                field: "storage.base_url".to_string(),
            })?;
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| ContentError::Unauthenticated {
                operation: operation.to_string(),
            })?;

        tracing::debug!("{}: POST {} ({} bytes, upsert={})", operation, url, data.len(), upsert);

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(data);
        if let Some(api_key) = &self.api_key {
            request = request.header("apikey", api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("{} response status: {}", operation, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::RemoteError {
                operation: operation.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(())
    }
}

/// Pulls `message` (or `error`) out of a storage error body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.get("message")
            .or_else(|| v.get("error"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "no response body".to_string(),
        None => body.chars().take(200).collect(),
    }
}

/// The storage API answers 400 with an "Object not found" body for some
/// missing public objects, so both codes count as "not published". A missing
/// bucket comes back the same way and is a configuration problem, not a
/// first run.
fn is_missing_object(status: StatusCode, body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    if lowered.contains("bucket not found") {
        return false;
    }

    match status {
        StatusCode::NOT_FOUND => true,
        StatusCode::BAD_REQUEST => {
            let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
            let code = parsed
                .as_ref()
                .and_then(|v| v.get("error"))
                .and_then(|e| e.as_str());
            code == Some("not_found") || lowered.contains("object not found")
        }
        _ => false,
    }
}

#[async_trait]
impl ContentBackend for StorageClient {
    async fn fetch_content(&self) -> Result<RemoteFetch> {
        let Some(url) = self.content_url() else {
            return Ok(RemoteFetch::Disabled);
        };

        tracing::debug!("Fetching published content from {}", url);
        let cache_bust = chrono::Utc::now().timestamp_millis();
        let response = self
            .client
            .get(&url)
            .query(&[("t", cache_bust)])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Content fetch status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_missing_object(status, &body) {
                return Ok(RemoteFetch::NotFound);
            }
            return Err(ContentError::RemoteError {
                operation: "fetch content".to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let json_data: serde_json::Value = response.json().await?;
        match ContentMap::try_from(json_data) {
            Ok(content) => Ok(RemoteFetch::Found(content)),
            Err(_) => Err(ContentError::RemoteError {
                operation: "fetch content".to_string(),
                status: status.as_u16(),
                message: "published content is not a JSON object".to_string(),
            }),
        }
    }

    async fn publish_content(&self, body: Vec<u8>) -> Result<()> {
        self.write_object("publish", &self.content_path, body, "application/json", true)
            .await
    }

    async fn upload_object(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        self.write_object("upload", path, data, content_type, false)
            .await?;
        self.public_url(path)
            .ok_or_else(|| ContentError::MissingConfigError {
                field: "storage.base_url".to_string(),
            })
    }
}
