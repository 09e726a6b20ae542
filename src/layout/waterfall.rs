use tracing::{debug, trace};

use crate::models::{LayoutPosition, MediaItem};

/// Aspect ratio used for items whose dimensions are unknown: a square tile.
pub const FALLBACK_ASPECT_RATIO: f64 = 1.0;

/// Widest layout accepted. Container widths that would need more columns are
/// treated like an unusable width.
pub const MAX_COLUMNS: usize = 512;

/// Configuration for the waterfall (masonry) layout algorithm.
///
/// Columns share one width; each item goes to the currently shortest column.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallLayout {
    /// Narrowest allowed column in pixels (default: 300)
    pub min_column_width: f64,
    /// Horizontal and vertical gap between tiles in pixels (default: 20)
    pub gap: f64,
    /// Height/width ratio for items without usable dimensions (default: 1.0)
    pub fallback_aspect_ratio: f64,
}

impl Default for WaterfallLayout {
    fn default() -> Self {
        Self {
            min_column_width: 300.0,
            gap: 20.0,
            fallback_aspect_ratio: FALLBACK_ASPECT_RATIO,
        }
    }
}

/// Column count and shared column width for one container width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnGeometry {
    pub columns: usize,
    pub item_width: f64,
}

/// Bottom edge of one column while packing.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnState {
    next_top: f64,
}

/// Result of one packing pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedLayout {
    /// `None` when the container width was unusable.
    pub geometry: Option<ColumnGeometry>,
    /// One entry per input item, same order.
    pub positions: Vec<LayoutPosition>,
    pub total_height: f64,
    /// Number of items that were sized with the fallback ratio.
    pub fallback_count: usize,
}

impl PackedLayout {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl WaterfallLayout {
    pub fn new(min_column_width: f64, gap: f64) -> Self {
        Self {
            min_column_width,
            gap,
            ..Self::default()
        }
    }

    fn min_width(&self) -> f64 {
        if self.min_column_width.is_finite() {
            self.min_column_width.max(1.0)
        } else {
            1.0
        }
    }

    fn gap(&self) -> f64 {
        if self.gap.is_finite() {
            self.gap.max(0.0)
        } else {
            0.0
        }
    }

    fn fallback_ratio(&self) -> f64 {
        if self.fallback_aspect_ratio.is_finite() && self.fallback_aspect_ratio > 0.0 {
            self.fallback_aspect_ratio
        } else {
            FALLBACK_ASPECT_RATIO
        }
    }

    /// Resolves the column count and column width for a container width.
    ///
    /// Starts from `floor(width / min_column_width)` columns and drops columns
    /// until every column is at least `min_column_width` wide, except when only
    /// one column is left. Returns `None` for widths that are not positive and
    /// finite, or that would need more than [`MAX_COLUMNS`] columns.
    pub fn geometry(&self, container_width: f64) -> Option<ColumnGeometry> {
        if !container_width.is_finite() || container_width <= 0.0 {
            return None;
        }

        let min_width = self.min_width();
        let gap = self.gap();
        let raw_columns = (container_width / min_width).floor();
        if raw_columns > MAX_COLUMNS as f64 {
            debug!(container_width, raw_columns, "Container too wide for column limit");
            return None;
        }
        let mut columns = (raw_columns as usize).max(1);
        let width_for = |columns: usize| {
            (container_width - (columns as f64 - 1.0) * gap) / columns as f64
        };

        let mut item_width = width_for(columns);
        while item_width < min_width && columns > 1 {
            columns -= 1;
            item_width = width_for(columns);
        }

        Some(ColumnGeometry {
            columns,
            item_width,
        })
    }

    /// Packs items into columns for the given container width.
    ///
    /// # Algorithm
    /// 1. Resolve the column geometry.
    /// 2. Walk items in source order; each one gets `floor(item_width * ratio)`
    ///    height and lands in the column with the smallest bottom edge (lowest
    ///    index on ties).
    /// 3. Total height is the tallest column, trailing gap included.
    ///
    /// Unusable widths and empty lists produce an empty layout.
    pub fn compute(&self, items: &[MediaItem], container_width: f64) -> PackedLayout {
        let Some(geometry) = self.geometry(container_width) else {
            return PackedLayout::default();
        };
        if items.is_empty() {
            return PackedLayout {
                geometry: Some(geometry),
                ..PackedLayout::default()
            };
        }
        self.pack(items, geometry)
    }

    /// Packs items against an already resolved geometry.
    pub fn pack(&self, items: &[MediaItem], geometry: ColumnGeometry) -> PackedLayout {
        let gap = self.gap();
        let fallback = self.fallback_ratio();
        let ColumnGeometry {
            columns,
            item_width,
        } = geometry;

        let mut state = vec![ColumnState::default(); columns.clamp(1, MAX_COLUMNS)];
        let mut positions = Vec::with_capacity(items.len());
        let mut fallback_count = 0usize;

        for item in items {
            let ratio = match item.aspect_ratio {
                Some(ratio) if ratio.is_finite() && ratio > 0.0 => ratio,
                _ => {
                    trace!(identifier = %item.identifier, "No aspect ratio, using fallback");
                    fallback_count += 1;
                    fallback
                }
            };
            let height = (item_width * ratio).floor().max(0.0);

            let column = shortest_column(&state);
            let top = state[column].next_top;
            positions.push(LayoutPosition {
                top,
                left: column as f64 * (item_width + gap),
                width: item_width,
                height,
            });
            state[column].next_top = top + height + gap;
        }

        let total_height = state.iter().map(|c| c.next_top).fold(0.0, f64::max);
        if fallback_count > 0 {
            debug!(
                fallback_count,
                total = items.len(),
                "Items sized with fallback aspect ratio"
            );
        }

        PackedLayout {
            geometry: Some(geometry),
            positions,
            total_height,
            fallback_count,
        }
    }
}

/// Index of the column with the smallest bottom edge; the first one wins ties.
fn shortest_column(state: &[ColumnState]) -> usize {
    let mut best = 0;
    for (index, column) in state.iter().enumerate().skip(1) {
        if column.next_top < state[best].next_top {
            best = index;
        }
    }
    best
}
