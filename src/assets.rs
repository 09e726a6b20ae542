//! Asset URL resolution. The engine only positions boxes; renderers fetch
//! the bytes from whatever URL these resolvers produce.

use std::path::PathBuf;

use crate::models::MediaItem;

/// Maps an item to a fetchable URL.
pub trait AssetUrlResolver: Send + Sync {
    fn resolve(&self, item: &MediaItem) -> String;
}

/// jsDelivr URLs for files stored in a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnResolver {
    pub owner: String,
    pub repo: String,
    /// Directory inside the repository that identifiers are relative to.
    pub prefix: Option<String>,
}

impl CdnResolver {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_matches('/');
        self.prefix = (!prefix.is_empty()).then(|| prefix.to_string());
        self
    }

    /// Parses `owner/repo` or `owner/repo/some/prefix`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim_matches('/').splitn(3, '/');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let repo = parts.next().filter(|s| !s.is_empty())?;
        let resolver = Self::new(owner, repo);
        Some(match parts.next() {
            Some(prefix) => resolver.with_prefix(prefix),
            None => resolver,
        })
    }
}

impl AssetUrlResolver for CdnResolver {
    fn resolve(&self, item: &MediaItem) -> String {
        let path = item.identifier.trim_start_matches('/');
        match &self.prefix {
            Some(prefix) => format!(
                "https://cdn.jsdelivr.net/gh/{}/{}/{}/{}",
                self.owner, self.repo, prefix, path
            ),
            None => format!("https://cdn.jsdelivr.net/gh/{}/{}/{}", self.owner, self.repo, path),
        }
    }
}

/// `file://` URLs below a local root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUrlResolver {
    pub root: PathBuf,
}

impl FileUrlResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetUrlResolver for FileUrlResolver {
    fn resolve(&self, item: &MediaItem) -> String {
        let path = self.root.join(&item.identifier);
        format!("file://{}", path.display())
    }
}
