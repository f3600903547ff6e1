//! Saving generated images to disk.

use crate::error::{JobPostError, Result};
use crate::image::{ImageFormat, ImagePayload};
use crate::pipeline::{GeneratedImage, JobTitle};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Replaces every character outside `[A-Za-z0-9]` with `_` and lower-cases.
pub fn sanitize_job_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// `job_post_<sanitized title>_<unix ms>.<ext>`
pub fn export_filename(title: &str, timestamp_ms: i64, format: ImageFormat) -> String {
    format!(
        "job_post_{}_{}.{}",
        sanitize_job_title(title),
        timestamp_ms,
        format.extension()
    )
}

/// Splits a `data:<mime>;base64,<payload>` URI into its payload.
pub fn parse_data_url(src: &str) -> Result<ImagePayload> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| JobPostError::Decode("not a data URI".into()))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| JobPostError::Decode("data URI has no payload".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| JobPostError::Decode("data URI is not base64-encoded".into()))?;
    let format = ImageFormat::from_mime_type(mime)
        .ok_or_else(|| JobPostError::Decode(format!("unsupported image type: {mime}")))?;
    Ok(ImagePayload::new(data, format))
}

/// Writes `image` into `dir` and returns the path written.
///
/// The file is named from `job_title` and the current time. If a file with
/// that name already exists (two exports in the same millisecond) the
/// timestamp is bumped until the name is free; existing files are never
/// overwritten.
pub async fn export_image(image: &GeneratedImage, job_title: &JobTitle, dir: &Path) -> Result<PathBuf> {
    let payload = parse_data_url(&image.src)?;
    let bytes = payload.decode()?;

    tokio::fs::create_dir_all(dir).await?;

    let mut timestamp = chrono::Utc::now().timestamp_millis();
    loop {
        let path = dir.join(export_filename(job_title.as_str(), timestamp, payload.format));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(&bytes).await?;
                file.flush().await?;
                tracing::info!(path = %path.display(), bytes = bytes.len(), "exported image");
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => timestamp += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
