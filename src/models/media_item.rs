use crate::layout::aspect::aspect_ratio_from_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif" | "svg" | "avif"
            | "heic" | "heif" => Some(Self::Image),
            "mp4" | "webm" | "mkv" | "avi" | "mov" => Some(Self::Video),
            _ => None,
        }
    }

    /// Classifies a file name by its extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// One gallery entry.
///
/// Items are built once per listing fetch and never patched afterwards; a new
/// listing replaces the whole list.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Unique key, usually the path relative to the listing root.
    pub identifier: String,
    pub display_name: String,
    pub kind: MediaKind,
    /// Height divided by width. `None` when the source carries no usable dimensions.
    pub aspect_ratio: Option<f64>,
    /// Size in bytes as reported by the listing (0 when unknown).
    pub size: u64,
}

impl MediaItem {
    /// Creates an item from its identifier, deriving the display name, kind and
    /// the aspect ratio encoded in the file name.
    ///
    /// Returns `None` when the extension is not a known image or video type.
    pub fn from_identifier(identifier: impl Into<String>) -> Option<Self> {
        let identifier = identifier.into();
        let display_name = identifier
            .rsplit('/')
            .next()
            .unwrap_or(identifier.as_str())
            .to_string();
        let kind = MediaKind::from_name(&display_name)?;
        let aspect_ratio = aspect_ratio_from_name(&identifier);
        Some(Self {
            identifier,
            display_name,
            kind,
            aspect_ratio,
            size: 0,
        })
    }

    /// Create an item with explicit fields, dropping unusable ratios.
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        kind: MediaKind,
        aspect_ratio: Option<f64>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            kind,
            aspect_ratio: aspect_ratio.filter(|r| r.is_finite() && *r > 0.0),
            size: 0,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Fills in the aspect ratio from pixel dimensions if none is known yet.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        if self.aspect_ratio.is_none() && width > 0 && height > 0 {
            self.aspect_ratio = Some(height as f64 / width as f64);
        }
        self
    }

    /// Check if this is a video file based on media kind
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}
