use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Remote storage returned {status} for {operation}: {message}")]
    RemoteError {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("{operation} requires an authenticated session")]
    Unauthenticated { operation: String },

    #[error("Draft store error: {message}")]
    DraftStoreError { message: String },

    #[error("Upload failed: {message}")]
    UploadError { message: String },

    #[error("Content path '{path}' does not address an existing list item")]
    InvalidContentPath { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Configuration,
    Authentication,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ContentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ContentError::HttpError(_) | ContentError::RemoteError { .. } => ErrorCategory::Network,
            ContentError::IoError(_)
            | ContentError::DraftStoreError { .. }
            | ContentError::UploadError { .. } => ErrorCategory::Storage,
            ContentError::ConfigError { .. }
            | ContentError::ConfigValidationError { .. }
            | ContentError::InvalidConfigValueError { .. }
            | ContentError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ContentError::Unauthenticated { .. } => ErrorCategory::Authentication,
            ContentError::SerializationError(_) | ContentError::InvalidContentPath { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路問題通常重試即可
            ContentError::HttpError(_) => ErrorSeverity::Medium,
            ContentError::RemoteError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            ContentError::RemoteError { .. } | ContentError::UploadError { .. } => {
                ErrorSeverity::High
            }
            ContentError::Unauthenticated { .. } => ErrorSeverity::High,
            ContentError::SerializationError(_) => ErrorSeverity::High,
            ContentError::InvalidContentPath { .. } => ErrorSeverity::Medium,
            ContentError::ConfigError { .. }
            | ContentError::ConfigValidationError { .. }
            | ContentError::InvalidConfigValueError { .. }
            | ContentError::MissingConfigError { .. } => ErrorSeverity::High,
            ContentError::IoError(_) | ContentError::DraftStoreError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 給使用者看的訊息 (不含內部細節)
    pub fn user_friendly_message(&self) -> String {
        match self {
            ContentError::HttpError(_) => {
                "Could not reach the content storage service.".to_string()
            }
            ContentError::RemoteError {
                operation, status, ..
            } => format!("The storage service rejected the {} request (HTTP {}).", operation, status),
            ContentError::Unauthenticated { operation } => {
                format!("You must be signed in to {}.", operation)
            }
            ContentError::DraftStoreError { .. } | ContentError::IoError(_) => {
                "The local draft could not be read or written.".to_string()
            }
            ContentError::UploadError { message } => format!("Upload failed: {}", message),
            ContentError::SerializationError(_) => {
                "The content could not be converted to JSON.".to_string()
            }
            ContentError::InvalidContentPath { path } => {
                format!("'{}' points into a list at an index that does not exist.", path)
            }
            ContentError::ConfigError { .. }
            | ContentError::ConfigValidationError { .. }
            | ContentError::InvalidConfigValueError { .. }
            | ContentError::MissingConfigError { .. } => format!("Configuration problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check your connection and the storage base URL, then try again.",
            ErrorCategory::Authentication => "Set STUDIO_ACCESS_TOKEN (or storage.access_token) to a valid session token.",
            ErrorCategory::Storage => "Check the draft directory permissions; `discard --yes` resets a corrupt draft.",
            ErrorCategory::Configuration => "Review the config file and STUDIO_* environment variables.",
            ErrorCategory::Data => "Make sure every content value is valid JSON and list indexes exist (use `show` to inspect).",
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
