//! Local object storage for task attachments.
//!
//! Objects live under `{storage_dir}/{bucket}/{key}` where the key is
//! `{task_id}/{unix_millis}-{file_name}`. There is no metadata table: listing a task's
//! attachments reads its directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use utils::assets::ATTACHMENTS_BUCKET;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid object key")]
    InvalidKey,
    #[error("Object not found")]
    NotFound,
}

/// An uploaded file as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct Attachment {
    /// Same as `key`; stable across listings
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    bucket_dir: PathBuf,
    public_base_url: String,
}

/// Reduce a client-supplied file name to its final path component.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('.');
    if last.is_empty() {
        "file".to_string()
    } else {
        last.to_string()
    }
}

/// Human-readable size, e.g. `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    while exponent < UNITS.len() - 1 && bytes >= 1024u64.pow(exponent as u32 + 1) {
        exponent += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[exponent])
}

fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Split `{task_id}/{millis}-{name}` and reject anything else.
fn parse_key(key: &str) -> Result<(Uuid, &str), StorageError> {
    if key.contains("..") || key.contains('\\') {
        return Err(StorageError::InvalidKey);
    }
    let (task_part, object) = key.split_once('/').ok_or(StorageError::InvalidKey)?;
    let task_id = Uuid::parse_str(task_part).map_err(|_| StorageError::InvalidKey)?;
    if object.is_empty() || object.contains('/') {
        return Err(StorageError::InvalidKey);
    }
    Ok((task_id, object))
}

/// File name without the upload timestamp prefix.
fn display_name(object: &str) -> &str {
    match object.split_once('-') {
        Some((millis, rest)) if millis.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => object,
    }
}

impl AttachmentStore {
    pub fn new(storage_dir: &Path, public_base_url: &str) -> Self {
        Self {
            bucket_dir: storage_dir.join(ATTACHMENTS_BUCKET),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn bucket_dir(&self) -> &Path {
        &self.bucket_dir
    }

    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/{}/{}",
            self.public_base_url, ATTACHMENTS_BUCKET, key
        )
    }

    fn attachment(&self, key: String, name: &str, content_type: String, size: u64) -> Attachment {
        Attachment {
            id: key.clone(),
            name: name.to_string(),
            url: self.public_url(&key),
            content_type,
            size,
            key,
        }
    }

    pub async fn upload(
        &self,
        task_id: Uuid,
        file_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<Attachment, StorageError> {
        let name = sanitize_file_name(file_name);
        let key = format!("{}/{}-{}", task_id, Utc::now().timestamp_millis(), name);

        let task_dir = self.bucket_dir.join(task_id.to_string());
        tokio::fs::create_dir_all(&task_dir).await?;
        tokio::fs::write(self.bucket_dir.join(&key), data).await?;

        let content_type = content_type
            .filter(|ct| !ct.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for(&name));

        info!(key = %key, size = data.len(), "Attachment uploaded");
        Ok(self.attachment(key, &name, content_type, data.len() as u64))
    }

    /// Attachments of a task, oldest upload first.
    pub async fn list(&self, task_id: Uuid) -> Result<Vec<Attachment>, StorageError> {
        let task_dir = self.bucket_dir.join(task_id.to_string());
        let mut entries = match tokio::fs::read_dir(&task_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut attachments = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let object = entry.file_name().to_string_lossy().into_owned();
            let name = display_name(&object).to_string();
            let key = format!("{task_id}/{object}");
            attachments.push(self.attachment(key, &name, content_type_for(&name), metadata.len()));
        }
        attachments.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(attachments)
    }

    /// Path on disk of the object, after validating the key.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        parse_key(key)?;
        Ok(self.bucket_dir.join(key))
    }

    /// Remove every object of a task. A task without attachments is not an error.
    pub async fn delete_task_objects(&self, task_id: Uuid) -> Result<(), StorageError> {
        let task_dir = self.bucket_dir.join(task_id.to_string());
        match tokio::fs::remove_dir_all(&task_dir).await {
            Ok(()) => {
                info!(%task_id, "Task attachments removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(key = %key, "Attachment deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
