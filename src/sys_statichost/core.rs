//! Pure path‑mapping logic: client assets under the public dir, plus `.html` fallback.

use std::path::{Component, Path, PathBuf};

/// Given a request path, return the matching file under `public_dir`,
/// or `None` if nothing matches.
pub fn map_static_path(public_dir: &Path, uri: &str) -> Option<PathBuf> {
    // Normalize: strip leading slash
    let rel = uri.strip_prefix('/').unwrap_or(uri);

    // Root → index.html
    if rel.is_empty() {
        return Some(public_dir.join("index.html"));
    }

    // Only plain components; anything else could climb out of public_dir.
    if !Path::new(rel)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    // Exact file, then with ".html" appended
    let candidate = public_dir.join(rel);
    if candidate.is_file() {
        return Some(candidate);
    }

    let html_candidate = public_dir.join(format!("{rel}.html"));
    if html_candidate.is_file() {
        return Some(html_candidate);
    }

    None
}
