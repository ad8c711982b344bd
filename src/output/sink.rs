//! Record sink
//!
//! Every detail page ends up as one small text file:
//!
//! ```text
//! <storage-root>/<category>/<title>_url.txt
//! ```
//!
//! containing the title, the source URL and the local time it was found.
//! Directory creation falls back once to a directory under the working
//! directory; if that fails too the single write is abandoned and the caller
//! carries on.

use crate::url::sanitize_name;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;

/// Suffix appended to every record file name
pub const RECORD_SUFFIX: &str = "_url.txt";

const UNTITLED: &str = "untitled";

/// Writes record files below a storage root
#[derive(Debug)]
pub struct Sink {
    root: PathBuf,
    fallback_base: Option<PathBuf>,
    fallback_name: String,
    fallback_root: OnceLock<PathBuf>,
}

impl Sink {
    /// Creates a sink whose fallback lives under the current working directory
    ///
    /// # Arguments
    ///
    /// * `root` - Storage root; one subdirectory per category is created below it
    /// * `fallback_name` - Directory name used under the working directory when
    ///   a target directory cannot be created
    pub fn new(root: impl Into<PathBuf>, fallback_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            fallback_base: None,
            fallback_name: fallback_name.into(),
            fallback_root: OnceLock::new(),
        }
    }

    /// Creates a sink whose fallback lives under `base` instead of the working directory
    pub fn with_fallback_base(
        root: impl Into<PathBuf>,
        base: impl Into<PathBuf>,
        fallback_name: impl Into<String>,
    ) -> Self {
        Self {
            fallback_base: Some(base.into()),
            ..Self::new(root, fallback_name)
        }
    }

    /// The configured storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fallback root, resolved on first use and fixed afterwards
    pub fn fallback_root(&self) -> &Path {
        self.fallback_root.get_or_init(|| {
            let base = self.fallback_base.clone().unwrap_or_else(|| {
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            });
            base.join(&self.fallback_name)
        })
    }

    /// Makes sure the directory for a category exists
    ///
    /// Returns the directory actually in use, which is below the fallback
    /// root if the storage root was unusable, or `None` if neither worked.
    pub async fn ensure_category(&self, category: &str) -> Option<PathBuf> {
        self.ensure_dir(&self.root.join(category)).await
    }

    /// Creates `dir` and its parents, falling back once on failure
    pub async fn ensure_dir(&self, dir: &Path) -> Option<PathBuf> {
        let err = match fs::create_dir_all(dir).await {
            Ok(()) => return Some(dir.to_path_buf()),
            Err(e) => e,
        };

        let alternative = self.fallback_for(dir);
        tracing::warn!(
            "Failed to create {}: {}. Falling back to {}",
            dir.display(),
            err,
            alternative.display()
        );

        match fs::create_dir_all(&alternative).await {
            Ok(()) => Some(alternative),
            Err(e) => {
                tracing::error!(
                    "Failed to create fallback directory {}: {}",
                    alternative.display(),
                    e
                );
                None
            }
        }
    }

    /// Maps a target directory to its counterpart below the fallback root
    fn fallback_for(&self, dir: &Path) -> PathBuf {
        let fallback_root = self.fallback_root();
        if dir == self.root || dir.starts_with(fallback_root) {
            return fallback_root.to_path_buf();
        }

        match dir.file_name() {
            Some(name) => fallback_root.join(name),
            None => fallback_root.to_path_buf(),
        }
    }

    /// Writes one record for a detail page
    ///
    /// # Arguments
    ///
    /// * `dir` - Category directory the record belongs in
    /// * `title` - Display name of the item; also the base of the file name
    /// * `url` - Absolute URL of the detail page
    ///
    /// # Returns
    ///
    /// `true` if the record was written. Failures are logged, never raised.
    pub async fn write_record(&self, dir: &Path, title: &str, url: &str) -> bool {
        let Some(dir) = self.ensure_dir(dir).await else {
            tracing::error!("Abandoning record for {}: no usable directory", url);
            return false;
        };

        let path = dir.join(record_file_name(title, url));
        let content = format_record(title, url, Local::now());

        match fs::write(&path, content).await {
            Ok(()) => {
                tracing::info!("Saved {} to {}", url, path.display());
                true
            }
            Err(e) => {
                tracing::error!("Failed to write {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Writes an arbitrary text file, used for the raw index page snapshot
    pub async fn write_snapshot(&self, path: &Path, content: &str) -> bool {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent).await {
                tracing::warn!("Failed to create {}: {}", parent.display(), e);
                return false;
            }
        }

        match fs::write(path, content).await {
            Ok(()) => {
                tracing::info!("Saved index page snapshot to {}", path.display());
                true
            }
            Err(e) => {
                tracing::warn!("Failed to save snapshot {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// File name for a record: sanitized title, else the URL's last path segment
pub fn record_file_name(title: &str, url: &str) -> String {
    let base = sanitize_name(title)
        .or_else(|| {
            let segment = url.trim_end_matches('/').rsplit('/').next()?;
            let stem = segment.split('.').next().unwrap_or(segment);
            sanitize_name(stem)
        })
        .unwrap_or_else(|| UNTITLED.to_string());

    format!("{}{}", base, RECORD_SUFFIX)
}

/// Renders the body of a record file
pub fn format_record(title: &str, url: &str, discovered: DateTime<Local>) -> String {
    format!(
        "Title: {}\nURL: {}\nDiscovered: {}\n",
        title,
        url,
        discovered.format("%Y-%m-%d %H:%M:%S")
    )
}
