pub mod aspect;
pub mod layout_cache;
pub mod waterfall;
pub mod window;

pub use layout_cache::{CachedLayoutComputer, LayoutCache};
pub use waterfall::{
    ColumnGeometry, PackedLayout, WaterfallLayout, FALLBACK_ASPECT_RATIO, MAX_COLUMNS,
};
pub use window::{select_window, DEFAULT_BUFFER_COUNT};
