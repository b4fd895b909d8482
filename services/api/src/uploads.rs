//! Attachment storage and multipart form reading
//!
//! Uploaded files land under one directory per posting surface; records
//! store only the generated filename, which the static `/uploads` route
//! serves back.

use anyhow::{Context, Result};
use axum::extract::Multipart;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::ApiError;

/// Stores uploaded attachment files on local disk
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create a new upload store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write the bytes under the category directory and return the stored
    /// filename
    pub async fn save(&self, category: &str, original_name: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.root.join(category);
        fs::create_dir_all(&dir)
            .await
            .context("creating upload directory")?;

        let filename = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize(original_name)
        );
        fs::write(dir.join(&filename), bytes)
            .await
            .context("writing upload")?;

        Ok(format!("{category}/{filename}"))
    }

    /// Root directory served by the static uploads route
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Replace whitespace and path separators so the stored name is a single
/// safe path segment
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            c if c.is_whitespace() => '-',
            '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus at most one file part, read out of a multipart body
#[derive(Debug, Default)]
pub struct SubmittedForm {
    fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl SubmittedForm {
    /// Drain the multipart stream, treating `file_field` as the file part
    /// and everything else as text
    pub async fn read(multipart: &mut Multipart, file_field: &str) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::Validation("Malformed form data".to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == file_field {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::Validation("Malformed form data".to_string()))?;
                form.file = Some(UploadedFile {
                    name: file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::Validation("Malformed form data".to_string()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed field value, if present and non-empty
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Trimmed field value, defaulting to the empty string
    pub fn text_or_default(&self, key: &str) -> String {
        self.text(key).unwrap_or_default().to_string()
    }

    /// Required field value; missing or empty is a validation failure
    pub fn require(&self, key: &str) -> Result<String, ApiError> {
        self.text(key)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation(format!("{key} is required")))
    }

    /// Required numeric field value
    pub fn require_number(&self, key: &str) -> Result<f64, ApiError> {
        self.require(key)?
            .parse()
            .map_err(|_| ApiError::Validation(format!("{key} must be a number")))
    }

    /// Optional numeric field value
    pub fn number(&self, key: &str) -> Option<f64> {
        self.text(key).and_then(|value| value.parse().ok())
    }
}
