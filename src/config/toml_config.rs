use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ContentError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BUCKET: &str = "assets";
pub const DEFAULT_CONTENT_PATH: &str = "config/content.json";
pub const DEFAULT_DRAFT_DIR: &str = "./.studio";
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
/// Accepted draft auto-save window, in milliseconds.
pub const MIN_DEBOUNCE_MS: u64 = 500;
pub const MAX_DEBOUNCE_MS: u64 = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub drafts: DraftsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_content_path")]
    pub content_path: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftsConfig {
    #[serde(default = "default_draft_dir")]
    pub directory: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_content_path() -> String {
    DEFAULT_CONTENT_PATH.to_string()
}

fn default_draft_dir() -> String {
    DEFAULT_DRAFT_DIR.to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            bucket: default_bucket(),
            content_path: default_content_path(),
            api_key: None,
            access_token: None,
        }
    }
}

impl Default for DraftsConfig {
    fn default() -> Self {
        Self {
            directory: default_draft_dir(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// 空字串視為未設定
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl StudioConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ContentError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let config: Self =
            toml::from_str(&processed_content).map_err(|e| ContentError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        Ok(config.normalized())
    }

    /// 只用環境變數建立配置
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// `STUDIO_*` 環境變數覆蓋檔案內的設定
    pub fn with_env_overrides(mut self) -> Result<Self> {
        self.apply_env_overrides()?;
        Ok(self.normalized())
    }

    /// 替換環境變數 (例如 ${STUDIO_ACCESS_TOKEN})；未設定的變數換成空字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            ContentError::ConfigError {
                message: format!("invalid substitution pattern: {}", e),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                tracing::debug!("Environment variable {} is not set", var_name);
                String::new()
            })
        });

        Ok(result.to_string())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        let var = |name: &str| std::env::var(name).ok();

        if let Some(base_url) = var("STUDIO_BASE_URL") {
            self.storage.base_url = Some(base_url);
        }
        if let Some(bucket) = var("STUDIO_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(path) = var("STUDIO_CONTENT_PATH") {
            self.storage.content_path = path;
        }
        if let Some(key) = var("STUDIO_API_KEY") {
            self.storage.api_key = Some(key);
        }
        if let Some(token) = var("STUDIO_ACCESS_TOKEN") {
            self.storage.access_token = Some(token);
        }
        if let Some(dir) = var("STUDIO_DRAFT_DIR") {
            self.drafts.directory = dir;
        }
        if let Some(raw) = var("STUDIO_DEBOUNCE_MS") {
            self.drafts.debounce_ms =
                raw.parse()
                    .map_err(|_| ContentError::InvalidConfigValueError {
                        field: "STUDIO_DEBOUNCE_MS".to_string(),
                        value: raw.clone(),
                        reason: "must be a whole number of milliseconds".to_string(),
                    })?;
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.storage.base_url = non_empty(self.storage.base_url.take());
        self.storage.api_key = non_empty(self.storage.api_key.take());
        self.storage.access_token = non_empty(self.storage.access_token.take());
        self
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.drafts.debounce_ms)
    }
}

impl Validate for StudioConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        // base_url 可以不設定 (停用遠端內容)
        if let Some(base_url) = &self.storage.base_url {
            validate_url("storage.base_url", base_url)?;
        }
        validate_non_empty_string("storage.bucket", &self.storage.bucket)?;
        validate_object_path("storage.bucket", &self.storage.bucket)?;
        validate_object_path("storage.content_path", &self.storage.content_path)?;
        validate_path("drafts.directory", &self.drafts.directory)?;
        validate_range(
            "drafts.debounce_ms",
            self.drafts.debounce_ms,
            MIN_DEBOUNCE_MS,
            MAX_DEBOUNCE_MS,
        )?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

impl ConfigProvider for StudioConfig {
    fn base_url(&self) -> Option<&str> {
        self.storage.base_url.as_deref()
    }

    fn bucket(&self) -> &str {
        &self.storage.bucket
    }

    fn content_path(&self) -> &str {
        &self.storage.content_path
    }

    fn api_key(&self) -> Option<&str> {
        self.storage.api_key.as_deref()
    }

    fn access_token(&self) -> Option<&str> {
        self.storage.access_token.as_deref()
    }

    fn draft_dir(&self) -> &str {
        &self.drafts.directory
    }

    fn debounce_ms(&self) -> u64 {
        self.drafts.debounce_ms
    }
}
