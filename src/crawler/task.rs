use std::fmt;
use std::path::PathBuf;

/// The role a page plays in the catalog hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRole {
    /// Site entry page listing the categories
    Index,
    /// Category listing, possibly one of several paginated pages
    List,
    /// Leaf page for a single item; never fetched
    Detail,
}

/// A unit of work handed to the pool
///
/// Owned by the pool from submission until it has run; nothing keeps a task
/// around after execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub role: PageRole,

    /// Absolute URL of the page
    pub url: String,

    /// Directory records discovered through this task are written to
    pub dir: PathBuf,

    /// Display name, only meaningful for detail tasks
    pub name: Option<String>,
}

impl CrawlTask {
    pub fn index(url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            role: PageRole::Index,
            url: url.into(),
            dir: dir.into(),
            name: None,
        }
    }

    pub fn list(url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            role: PageRole::List,
            url: url.into(),
            dir: dir.into(),
            name: None,
        }
    }

    pub fn detail(url: impl Into<String>, dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            role: PageRole::Detail,
            url: url.into(),
            dir: dir.into(),
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for CrawlTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.role, self.url)
    }
}
