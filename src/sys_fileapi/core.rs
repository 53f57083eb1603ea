//! Core file‑API logic: no Hyper types here.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use multer::Field;
use serde::Serialize;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};

/// Failures surfaced to callers as structured JSON; handlers map the
/// variants to 400 / 404 / 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("File not found")]
    NotFound,
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),
}

/// One accepted part of an upload request.
#[derive(Serialize)]
pub struct UploadedFile {
    #[serde(rename = "originalName")]
    pub original_name: String,
    /// Stored name the file lives under from now on.
    pub filename: String,
    pub size: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// One row of the directory listing.
#[derive(Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Per-item result of a bulk delete.
#[derive(Serialize)]
pub struct DeleteOutcome {
    pub file: String,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lower-cased extension without the dot, if the name has one.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Sizes are reported the way the client displays them.
pub fn format_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

/// MIME type inferred from the extension, `"unknown"` when unrecognized.
pub fn mime_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .map(String::from)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Resolve `name` as a direct child of `dir`. Separators, `..` and every
/// other non-plain component are rejected before the filesystem is touched,
/// so a crafted name can never address anything outside the upload dir.
pub fn safe_child_path(dir: &Path, name: &str) -> Result<PathBuf, ApiError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(ApiError::Validation("Invalid filename".to_string()));
    }
    match Path::new(name).components().next() {
        Some(Component::Normal(_)) => Ok(dir.join(name)),
        _ => Err(ApiError::Validation("Invalid filename".to_string())),
    }
}

/// Create the on-disk file for `original` under a collision-resistant stored
/// name (`base_{millis}.ext`). `create_new` means two concurrent uploads of
/// the same original name always end up as two distinct entries.
async fn create_stored(dir: &Path, original: &str) -> Result<(String, fs::File), ApiError> {
    let clean = sanitize_filename::sanitize(original);
    let stem = Path::new(&clean)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_string();
    let ext = extension_of(&clean).unwrap_or_default();
    let ts = Utc::now().timestamp_millis();

    let mut attempt = 0u32;
    loop {
        let name = match (attempt, ext.is_empty()) {
            (0, false) => format!("{stem}_{ts}.{ext}"),
            (0, true) => format!("{stem}_{ts}"),
            (n, false) => format!("{stem}_{ts}_{n}.{ext}"),
            (n, true) => format!("{stem}_{ts}_{n}"),
        };
        let path = dir.join(&name);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((name, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(ApiError::Storage(e)),
        }
    }
}

/// Validate and persist one multipart file part.
///
/// The extension filter runs before the stored file is created, so a
/// disallowed type never reaches the upload directory. A write that dies
/// mid-stream can leave a partial stored file behind; clearing those out is
/// left to the operator.
pub async fn api_upload_field(
    mut field: Field<'_>,
    dir: &Path,
    allowed: impl Fn(&str) -> bool,
) -> Result<UploadedFile, ApiError> {
    let original = field
        .file_name()
        .ok_or_else(|| ApiError::Validation("File part has no filename".to_string()))?
        .to_string();

    let ext = extension_of(&original)
        .ok_or_else(|| ApiError::Validation(format!("File type not allowed: {original}")))?;
    if !allowed(&ext) {
        return Err(ApiError::Validation(format!("File type not allowed: .{ext}")));
    }

    let (filename, mut file) = create_stored(dir, &original).await?;
    let mut written = 0u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid form data: {e}")))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(UploadedFile {
        mime_type: mime_for(&original),
        original_name: original,
        filename,
        size: format_kb(written),
    })
}

/// List every regular file in the upload directory with derived metadata.
/// The directory IS the index: each call re-reads and re-stats everything.
/// Enumeration order is whatever the OS hands back.
pub async fn api_list_files(dir: &Path) -> Result<Vec<FileInfo>, ApiError> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push(FileInfo {
            size: format_kb(meta.len()),
            mime_type: mime_for(&name),
            name,
        });
    }
    Ok(files)
}

/// Delete a file by name. A concurrent delete racing us just sees
/// `NotFound`, same as a name that never existed.
pub async fn api_remove_file(dir: &Path, name: &str) -> Result<(), ApiError> {
    let path = safe_child_path(dir, name)?;
    match fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ApiError::NotFound),
        Err(e) => Err(ApiError::Storage(e)),
    }
}

/// Delete a batch of files, each independently; one failure never aborts
/// the rest.
pub async fn api_remove_many(dir: &Path, names: &[String]) -> Vec<DeleteOutcome> {
    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let outcome = match api_remove_file(dir, name).await {
            Ok(()) => DeleteOutcome {
                file: name.clone(),
                deleted: true,
                error: None,
            },
            Err(e) => DeleteOutcome {
                file: name.clone(),
                deleted: false,
                error: Some(e.to_string()),
            },
        };
        results.push(outcome);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extension_is_lowercased_and_optional() {
        assert_eq!(extension_of("Photo.PNG"), Some("png".to_string()));
        assert_eq!(extension_of("a.b.TXT"), Some("txt".to_string()));
        assert_eq!(extension_of("noext"), None);
    }

    #[test]
    fn sizes_render_with_two_decimals() {
        assert_eq!(format_kb(0), "0.00 KB");
        assert_eq!(format_kb(1024), "1.00 KB");
        assert_eq!(format_kb(1536), "1.50 KB");
    }

    #[test]
    fn mime_falls_back_to_unknown() {
        assert_eq!(mime_for("cat.png"), "image/png");
        assert_eq!(mime_for("doc.pdf"), "application/pdf");
        assert_eq!(mime_for("mystery.zzz9"), "unknown");
    }

    #[test]
    fn traversal_names_are_rejected() {
        let dir = Path::new("/srv/uploads");
        assert!(safe_child_path(dir, "ok.txt").is_ok());
        assert!(safe_child_path(dir, "../etc/passwd").is_err());
        assert!(safe_child_path(dir, "..").is_err());
        assert!(safe_child_path(dir, "a/b.txt").is_err());
        assert!(safe_child_path(dir, "a\\b.txt").is_err());
        assert!(safe_child_path(dir, "").is_err());
    }

    #[tokio::test]
    async fn empty_directory_lists_as_empty() {
        let dir = tempdir().unwrap();
        let files = api_list_files(dir.path()).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn listing_reports_name_size_and_type() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pic.png"), vec![0u8; 2048])
            .await
            .unwrap();
        let files = api_list_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "pic.png");
        assert_eq!(files[0].size, "2.00 KB");
        assert_eq!(files[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn subdirectories_are_skipped_in_listing() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).await.unwrap();
        fs::write(dir.path().join("a.txt"), b"hi").await.unwrap();
        let files = api_list_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.txt");
    }

    #[tokio::test]
    async fn removing_a_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = api_remove_file(dir.path(), "ghost.txt").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn bulk_remove_isolates_failures() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"x").await.unwrap();
        let names = vec!["a.png".to_string(), "missing.png".to_string()];
        let results = api_remove_many(dir.path(), &names).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].deleted);
        assert!(results[0].error.is_none());
        assert!(!results[1].deleted);
        assert_eq!(results[1].error.as_deref(), Some("File not found"));
        assert!(!dir.path().join("a.png").exists());
    }

    #[tokio::test]
    async fn stored_names_never_collide() {
        let dir = tempdir().unwrap();
        let (first, _f1) = create_stored(dir.path(), "cat.png").await.unwrap();
        let (second, _f2) = create_stored(dir.path(), "cat.png").await.unwrap();
        assert_ne!(first, second);
        assert!(dir.path().join(&first).exists());
        assert!(dir.path().join(&second).exists());
        assert!(first.starts_with("cat_"));
        assert!(first.ends_with(".png"));
    }

    #[tokio::test]
    async fn stored_name_sanitizes_the_original() {
        let dir = tempdir().unwrap();
        let (name, _f) = create_stored(dir.path(), "../../evil.txt").await.unwrap();
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
        assert!(safe_child_path(dir.path(), &name).is_ok());
        assert!(dir.path().join(&name).exists());
    }
}
