//! Buffered multipart form reader shared by the upload endpoints.

use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::StatusCode,
};
use std::collections::HashMap;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::shared::constants::ALLOWED_IMAGE_TYPES;

/// A file part read fully into memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl UploadedFile {
    /// Lowercased extension of the client-supplied file name
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_lowercase())
    }

    pub fn ensure_max_size(&self, field: &str, max_bytes: usize) -> Result<()> {
        if self.bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "{}: may not be greater than {} kilobytes",
                field,
                max_bytes / 1024
            )));
        }
        Ok(())
    }

    pub fn ensure_image(&self, field: &str, max_bytes: usize) -> Result<()> {
        if !ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "{}: must be an image ({})",
                field,
                ALLOWED_IMAGE_TYPES.join(", ")
            )));
        }
        self.ensure_max_size(field, max_bytes)
    }
}

/// Text fields and files of one multipart request.
///
/// Repeated fields keep every value; `name[]` and `name` are the same field.
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field
                .name()
                .unwrap_or("")
                .trim_end_matches("[]")
                .to_string();

            if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty part when no file was picked
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                form.files.insert(
                    name,
                    UploadedFile {
                        bytes: bytes.to_vec(),
                        file_name,
                        content_type,
                    },
                );
            } else {
                let text = field.text().await.map_err(multipart_error)?;
                form.texts.entry(name).or_default().push(text);
            }
        }

        Ok(form)
    }

    /// First value of a text field, `None` when absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.texts.get(name).and_then(|v| v.first()).cloned()
    }

    /// First value, with empty strings treated as absent
    pub fn non_empty_text(&self, name: &str) -> Option<String> {
        self.text(name).filter(|s| !s.trim().is_empty())
    }

    /// Every non-empty value of a repeated field
    pub fn texts(&self, name: &str) -> Vec<String> {
        self.texts
            .get(name)
            .map(|values| {
                values
                    .iter()
                    .filter(|v| !v.trim().is_empty())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.texts.contains_key(name)
    }

    /// Checkbox-style boolean: "1", "true" and "on" are true
    pub fn flag(&self, name: &str) -> bool {
        self.text(name)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "on" | "yes"))
            .unwrap_or(false)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// File part no larger than `max_bytes`, if one was sent
    pub fn take_sized_file(&mut self, name: &str, max_bytes: usize) -> Result<Option<UploadedFile>> {
        let file = self.take_file(name);
        if let Some(f) = &file {
            f.ensure_max_size(name, max_bytes)?;
        }
        Ok(file)
    }

    /// Image part of an allowed type and size, if one was sent
    pub fn take_image(&mut self, name: &str, max_bytes: usize) -> Result<Option<UploadedFile>> {
        let file = self.take_file(name);
        if let Some(f) = &file {
            f.ensure_image(name, max_bytes)?;
        }
        Ok(file)
    }

    #[cfg(test)]
    pub fn from_parts(texts: &[(&str, &str)], files: Vec<(&str, UploadedFile)>) -> Self {
        let mut form = Self::default();
        for (k, v) in texts {
            form.texts
                .entry(k.to_string())
                .or_default()
                .push(v.to_string());
        }
        for (k, f) in files {
            form.files.insert(k.to_string(), f);
        }
        form
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload exceeds the maximum request size".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
    }
}

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Self::read(multipart).await
    }
}

/// Parse a list of UUID strings, reporting the offending value
pub fn parse_uuid_list(field: &str, values: &[String]) -> Result<Vec<uuid::Uuid>> {
    values
        .iter()
        .map(|v| {
            uuid::Uuid::parse_str(v.trim())
                .map_err(|_| AppError::Validation(format!("{}: '{}' is not a valid id", field, v)))
        })
        .collect()
}
