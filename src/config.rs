use std::time::Duration;

use anyhow::{Context, Result};

use crate::layout::{WaterfallLayout, DEFAULT_BUFFER_COUNT};

/// Default delay before a resize triggers a relayout.
pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default minimum spacing between window recomputations (~60fps).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Configuration for a gallery view.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    pub layout: WaterfallLayout,
    /// Tiles mounted beyond each edge of the viewport (default: 5)
    pub buffer_count: usize,
    /// Trailing delay applied to resize notifications (default: 100ms)
    pub resize_debounce: Duration,
    /// Minimum time between scroll-driven window updates (default: 16ms)
    pub frame_interval: Duration,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            layout: WaterfallLayout::default(),
            buffer_count: DEFAULT_BUFFER_COUNT,
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

impl GalleryConfig {
    /// Builds a config from defaults plus `WATERFALL_*` environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("WATERFALL_MIN_COLUMN_WIDTH") {
            config.layout.min_column_width = parse_positive(&value)
                .context("Failed to parse WATERFALL_MIN_COLUMN_WIDTH as a positive number")?;
        }
        if let Some(value) = lookup("WATERFALL_GAP") {
            config.layout.gap = parse_non_negative(&value)
                .context("Failed to parse WATERFALL_GAP as a non-negative number")?;
        }
        if let Some(value) = lookup("WATERFALL_BUFFER") {
            config.buffer_count = value
                .trim()
                .parse::<usize>()
                .context("Failed to parse WATERFALL_BUFFER as a non-negative integer")?;
        }
        if let Some(value) = lookup("WATERFALL_RESIZE_DEBOUNCE_MS") {
            let ms = value
                .trim()
                .parse::<u64>()
                .context("Failed to parse WATERFALL_RESIZE_DEBOUNCE_MS as milliseconds")?;
            config.resize_debounce = Duration::from_millis(ms);
        }
        if let Some(value) = lookup("WATERFALL_FRAME_MS") {
            let ms = value
                .trim()
                .parse::<u64>()
                .context("Failed to parse WATERFALL_FRAME_MS as milliseconds")?;
            config.frame_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

pub(crate) fn parse_positive(value: &str) -> Result<f64> {
    let parsed = value.trim().parse::<f64>()?;
    if !parsed.is_finite() || parsed <= 0.0 {
        anyhow::bail!("{value} is not a positive number");
    }
    Ok(parsed)
}

pub(crate) fn parse_non_negative(value: &str) -> Result<f64> {
    let parsed = value.trim().parse::<f64>()?;
    if !parsed.is_finite() || parsed < 0.0 {
        anyhow::bail!("{value} is not a non-negative number");
    }
    Ok(parsed)
}
