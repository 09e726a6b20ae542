//! Media listing providers.
//!
//! A provider returns the complete, ordered gallery listing or an error. The
//! layout engine never computes anything against a failed listing.

pub mod file_scanner;
pub mod metadata;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::MediaItem;

pub use file_scanner::{DirectorySource, ScanConfig};

/// Why a media listing could not be produced.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("media directory does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("media path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("listing task failed: {0}")]
    Task(String),
    #[error("media listing unavailable: {0}")]
    Unavailable(String),
}

/// Source of the gallery listing.
pub trait MediaSource: Send + Sync {
    /// Returns every item in display order.
    fn fetch_media_list(&self) -> Result<Vec<MediaItem>, ListingError>;
}

/// A listing held in memory, for hosts that fetch items themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: Vec<MediaItem>,
}

impl StaticSource {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self { items }
    }

    /// Builds a listing from identifiers, skipping non-media names.
    pub fn from_identifiers<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: identifiers
                .into_iter()
                .filter_map(MediaItem::from_identifier)
                .collect(),
        }
    }
}

impl MediaSource for StaticSource {
    fn fetch_media_list(&self) -> Result<Vec<MediaItem>, ListingError> {
        Ok(self.items.clone())
    }
}
