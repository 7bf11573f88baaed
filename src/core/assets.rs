use crate::domain::model::UploadedAsset;
use crate::domain::ports::ContentBackend;
use crate::utils::error::{ContentError, Result};

pub const DEFAULT_ASSET_PREFIX: &str = "marketing";

const TOKEN_LEN: usize = 11;

/// Restricts a folder prefix to `[A-Za-z0-9_-]` segments, falling back to
/// [`DEFAULT_ASSET_PREFIX`] when nothing usable is left.
pub fn sanitize_prefix(prefix: &str) -> String {
    let segments: Vec<String> = prefix
        .split('/')
        .map(|segment| {
            segment
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .collect::<String>()
        })
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        DEFAULT_ASSET_PREFIX.to_string()
    } else {
        segments.join("/")
    }
}

/// Lowercased extension limited to `[a-z0-9]`, if the name has one.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

pub fn content_type_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn random_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..TOKEN_LEN].to_string()
}

/// Builds `{prefix}/{token}_{millis}.{ext}` for a freshly uploaded file.
pub fn asset_object_path(prefix: &str, file_name: &str) -> String {
    build_object_path(
        prefix,
        file_name,
        &random_token(),
        chrono::Utc::now().timestamp_millis(),
    )
}

fn build_object_path(prefix: &str, file_name: &str, token: &str, millis: i64) -> String {
    let mut name = format!("{}_{}", token, millis);
    if let Some(ext) = file_extension(file_name) {
        name.push('.');
        name.push_str(&ext);
    }
    format!("{}/{}", sanitize_prefix(prefix), name)
}

/// Uploads a file under `prefix` with a collision-resistant name and returns
/// where it landed. No retries.
pub async fn upload_asset<B: ContentBackend + ?Sized>(
    backend: &B,
    prefix: &str,
    file_name: &str,
    data: Vec<u8>,
) -> Result<UploadedAsset> {
    if data.is_empty() {
        return Err(ContentError::UploadError {
            message: format!("{} is empty", file_name),
        });
    }

    let object_path = asset_object_path(prefix, file_name);
    let content_type = content_type_for(file_extension(file_name).as_deref());
    let size = data.len();

    tracing::info!("📤 Uploading {} ({} bytes) to {}", file_name, size, object_path);
    let public_url = backend
        .upload_object(&object_path, data, content_type)
        .await
        .map_err(|e| {
            tracing::error!("❌ Upload of {} failed: {}", file_name, e);
            e
        })?;

    Ok(UploadedAsset {
        object_path,
        public_url,
        content_type: content_type.to_string(),
        size,
    })
}
