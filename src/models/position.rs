/// Absolute placement of one tile, index-aligned with the item list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPosition {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutPosition {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Inclusive index bounds into a position list.
///
/// An empty list has no range at all, so callers hold `Option<VisibleRange>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}
