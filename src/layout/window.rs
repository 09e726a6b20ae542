use crate::models::{LayoutPosition, VisibleRange};

/// Number of tiles mounted beyond each edge of the visible area.
pub const DEFAULT_BUFFER_COUNT: usize = 5;

/// Selects the contiguous index range that should be mounted for a scroll state.
///
/// `start` is the first tile whose bottom edge is below `scroll_top`; `end` is the
/// first tile whose top edge is below the viewport bottom. Both are then widened
/// by `buffer_count` and clamped to the list.
///
/// Positions are only sorted by `top` within a column, not across columns, so
/// this is a linear scan rather than a binary search.
///
/// Returns `None` for an empty list, meaning nothing to render.
pub fn select_window(
    positions: &[LayoutPosition],
    scroll_top: f64,
    viewport_height: f64,
    buffer_count: usize,
) -> Option<VisibleRange> {
    let last = positions.len().checked_sub(1)?;
    let scroll_top = if scroll_top.is_finite() { scroll_top } else { 0.0 };
    let viewport_height = if viewport_height.is_finite() {
        viewport_height.max(0.0)
    } else {
        0.0
    };
    let visible_bottom = scroll_top + viewport_height;

    let start = positions
        .iter()
        .position(|p| p.top + p.height > scroll_top)
        .unwrap_or(0);
    let end = positions
        .iter()
        .position(|p| p.top > visible_bottom)
        .unwrap_or(last);

    Some(VisibleRange {
        start: start.saturating_sub(buffer_count),
        end: end.saturating_add(buffer_count).min(last),
    })
}
