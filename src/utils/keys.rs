use std::path::Path;
use uuid::Uuid;

const DEFAULT_EXTENSION: &str = "jar";

/// Builds a fresh object key of the form `<subdir>/handler-<uuid>.<ext>`.
///
/// The extension follows the artifact on disk so a zip-packaged handler keeps
/// its suffix; a v4 UUID makes every run land on a new key.
pub fn generate_upload_key(subdir: &str, artifact: &Path) -> String {
    let extension = artifact
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EXTENSION);

    let name = format!("handler-{}.{}", Uuid::new_v4(), extension);
    let subdir = subdir.trim_matches('/');
    if subdir.is_empty() {
        name
    } else {
        format!("{}/{}", subdir, name)
    }
}
