use std::path::{Component, Path, PathBuf};

/// Maps site-absolute asset references ("/screens/a.png") onto a local
/// directory. `..` never climbs above the root.
#[derive(Debug, Clone)]
pub struct AssetPathPolicy {
    root: PathBuf,
}

impl AssetPathPolicy {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, reference: &str) -> PathBuf {
        let relative = Path::new(reference.trim_start_matches('/'));
        let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

        for comp in relative.components() {
            match comp {
                Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop();
                }
                Component::Normal(c) => parts.push(c),
                _ => {}
            }
        }

        let mut normalized = self.root.clone();
        for part in parts {
            normalized.push(part);
        }
        normalized
    }
}

/// Image mime type inferred from the file extension, png when unknown
pub fn image_mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}
