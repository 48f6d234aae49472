//! File tools: read_file, write_file, list_dir
//!
//! Paths are resolved against the toolbox's working directory. Write
//! containment is enforced by the safety policy before dispatch; these
//! functions only do the I/O.

use conclave_domain::Observation;
use std::path::{Path, PathBuf};

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum directory entries listed
const MAX_ENTRIES: usize = 500;

pub fn resolve(working_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path.trim());
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

pub async fn read_file(working_dir: &Path, path: &str, max_output: usize) -> Observation {
    let full = resolve(working_dir, path);

    let metadata = match tokio::fs::metadata(&full).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Observation::error(format!("file not found: {}", path));
        }
        Err(e) => return Observation::error(format!("cannot stat {}: {}", path, e)),
    };
    if !metadata.is_file() {
        return Observation::error(format!("'{}' is not a file", path));
    }
    if metadata.len() > MAX_READ_SIZE {
        return Observation::error(format!(
            "file too large ({} bytes, limit {})",
            metadata.len(),
            MAX_READ_SIZE
        ));
    }

    match tokio::fs::read_to_string(&full).await {
        Ok(content) if content.is_empty() => Observation::ok("(empty file)"),
        Ok(content) => Observation::ok(super::truncate_output(content, max_output)),
        Err(e) => Observation::error(format!("failed to read {}: {}", path, e)),
    }
}

pub async fn write_file(working_dir: &Path, path: &str, content: &str) -> Observation {
    let full = resolve(working_dir, path);
    if let Some(parent) = full.parent()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        return Observation::error(format!("cannot create {}: {}", parent.display(), e));
    }
    match tokio::fs::write(&full, content).await {
        Ok(()) => Observation::ok(format!("wrote {} bytes to {}", content.len(), path)),
        Err(e) => Observation::error(format!("failed to write {}: {}", path, e)),
    }
}

pub async fn list_dir(working_dir: &Path, path: &str) -> Observation {
    let full = resolve(working_dir, path);
    let mut reader = match tokio::fs::read_dir(&full).await {
        Ok(r) => r,
        Err(e) => return Observation::error(format!("cannot list {}: {}", path, e)),
    };

    let mut names = Vec::new();
    loop {
        match reader.next_entry().await {
            Ok(Some(entry)) => {
                let mut name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    name.push('/');
                }
                names.push(name);
            }
            Ok(None) => break,
            Err(e) => return Observation::error(format!("cannot list {}: {}", path, e)),
        }
    }

    if names.is_empty() {
        return Observation::ok("(empty directory)");
    }
    names.sort();
    let total = names.len();
    names.truncate(MAX_ENTRIES);
    let mut out = names.join("\n");
    if total > MAX_ENTRIES {
        out.push_str(&format!("\n... ({} more entries)", total - MAX_ENTRIES));
    }
    Observation::ok(out)
}
