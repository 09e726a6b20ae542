//! Directory-backed media listing.
//!
//! Walks a directory with walkdir, keeps files with a known image or video
//! extension and orders them by file name. Aspect ratios come from the file name
//! convention first and, when enabled, from the image header.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task;
use tracing::{debug, info, trace};
use walkdir::WalkDir;

use super::metadata::probe_dimensions;
use super::{ListingError, MediaSource};
use crate::models::{MediaItem, MediaKind};

/// Configuration for the directory scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to scan directories recursively.
    pub recursive: bool,
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
    /// Read image headers for files whose name carries no dimensions.
    pub probe_dimensions: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 0, // unlimited
            follow_symlinks: false,
            probe_dimensions: false,
        }
    }
}

/// Lists media files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    config: ScanConfig,
}

impl DirectorySource {
    /// Creates a source with default configuration.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, ScanConfig::default())
    }

    /// Creates a source with custom configuration.
    pub fn with_config(root: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs the scan on the blocking pool.
    pub async fn fetch_async(self: Arc<Self>) -> Result<Vec<MediaItem>, ListingError> {
        task::spawn_blocking(move || self.fetch_media_list())
            .await
            .map_err(|e| ListingError::Task(e.to_string()))?
    }

    fn scan(&self) -> Result<Vec<MediaItem>, ListingError> {
        if !self.root.exists() {
            return Err(ListingError::NotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ListingError::NotADirectory(self.root.clone()));
        }

        info!("Starting scan of {:?}", self.root);

        let mut walker = WalkDir::new(&self.root).follow_links(self.config.follow_symlinks);
        if !self.config.recursive {
            walker = walker.max_depth(1);
        } else if self.config.max_depth > 0 {
            walker = walker.max_depth(self.config.max_depth);
        }

        let mut items = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| ListingError::Walk {
                path: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let size = entry.metadata().ok().map(|m| m.len());
            if let Some(item) = self.item_for(entry.path(), size) {
                items.push(item);
            }
        }

        // Stable listing order: case-insensitive name, then exact identifier.
        items.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.identifier.cmp(&b.identifier))
        });

        info!("Discovered {} media files", items.len());
        Ok(items)
    }

    fn item_for(&self, path: &Path, size: Option<u64>) -> Option<MediaItem> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let identifier = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let Some(item) = MediaItem::from_identifier(identifier) else {
            trace!("Skipping non-media file {:?}", path);
            return None;
        };
        let mut item = item.with_size(size.unwrap_or(0));

        if item.aspect_ratio.is_none() && self.config.probe_dimensions {
            if let Some((width, height)) = probe_dimensions(path, item.kind) {
                item = item.with_dimensions(width, height);
            }
        }
        if item.aspect_ratio.is_none() {
            debug!(
                identifier = %item.identifier,
                video = item.kind == MediaKind::Video,
                "No dimensions for item"
            );
        }
        Some(item)
    }
}

impl MediaSource for DirectorySource {
    fn fetch_media_list(&self) -> Result<Vec<MediaItem>, ListingError> {
        self.scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2-200x100-beta.jpg"), b"x").unwrap();
        fs::write(dir.path().join("1-100x300-Alpha.png"), b"xx").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        fs::write(dir.path().join("clip.mp4"), b"").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("3-50x50-gamma.webp"), b"").unwrap();
        dir
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = create_test_dir();
        let source = DirectorySource::new(dir.path());
        let items = source.fetch_media_list().unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "1-100x300-Alpha.png",
                "2-200x100-beta.jpg",
                "nested/3-50x50-gamma.webp",
                "clip.mp4",
            ]
        );
        assert_eq!(items[0].aspect_ratio, Some(3.0));
        assert_eq!(items[0].size, 2);
        assert_eq!(items[3].aspect_ratio, None);
    }

    #[test]
    fn test_non_recursive_scan() {
        let dir = create_test_dir();
        let config = ScanConfig {
            recursive: false,
            ..ScanConfig::default()
        };
        let items = DirectorySource::with_config(dir.path(), config)
            .fetch_media_list()
            .unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| !i.identifier.contains('/')));
    }

    #[test]
    fn test_max_depth_limits_descent() {
        let dir = create_test_dir();
        let deep = dir.path().join("nested").join("deeper");
        fs::create_dir(&deep).unwrap();
        fs::write(deep.join("4-10x10-delta.png"), b"").unwrap();

        let scan = |max_depth| {
            let config = ScanConfig {
                max_depth,
                ..ScanConfig::default()
            };
            DirectorySource::with_config(dir.path(), config)
                .fetch_media_list()
                .unwrap()
        };

        // Depth 1 is the root's own entries.
        assert_eq!(scan(1).len(), 3);
        assert_eq!(scan(2).len(), 4);
        let all = scan(0);
        assert_eq!(all.len(), 5);
        assert!(all.iter().any(|i| i.identifier == "nested/deeper/4-10x10-delta.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_follow_config() {
        let dir = create_test_dir();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("5-20x10-linked.jpg"), b"").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

        let items = DirectorySource::new(dir.path()).fetch_media_list().unwrap();
        assert_eq!(items.len(), 4);

        let config = ScanConfig {
            follow_symlinks: true,
            ..ScanConfig::default()
        };
        let items = DirectorySource::with_config(dir.path(), config)
            .fetch_media_list()
            .unwrap();
        assert_eq!(items.len(), 5);
        let linked = items
            .iter()
            .find(|i| i.identifier == "linked/5-20x10-linked.jpg")
            .unwrap();
        assert_eq!(linked.aspect_ratio, Some(0.5));
    }

    #[test]
    fn test_missing_directory() {
        let source = DirectorySource::new("/nonexistent/waterfall/gallery");
        assert!(matches!(
            source.fetch_media_list(),
            Err(ListingError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = create_test_dir();
        let source = DirectorySource::new(dir.path().join("notes.txt"));
        assert!(matches!(
            source.fetch_media_list(),
            Err(ListingError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_probe_fills_missing_ratio() {
        let dir = TempDir::new().unwrap();
        image::RgbImage::new(80, 20)
            .save(dir.path().join("wide.png"))
            .unwrap();
        let config = ScanConfig {
            probe_dimensions: true,
            ..ScanConfig::default()
        };
        let items = DirectorySource::with_config(dir.path(), config)
            .fetch_media_list()
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].aspect_ratio, Some(0.25));
    }

    #[tokio::test]
    async fn test_fetch_async() {
        let dir = create_test_dir();
        let source = Arc::new(DirectorySource::new(dir.path()));
        let items = source.fetch_async().await.unwrap();
        assert_eq!(items.len(), 4);
    }
}
