//! Masonry (waterfall) layout and viewport windowing for media galleries.
//!
//! Items are packed into equal-width columns, shortest column first, and only
//! the tiles near the viewport are handed to the renderer.

pub mod assets;
pub mod bench;
pub mod cli;
pub mod config;
pub mod controller;
pub mod layout;
pub mod models;
pub mod scanner;

pub use config::GalleryConfig;
pub use controller::{spawn_driver, GalleryController, GalleryHandle, RenderState};
pub use layout::{select_window, WaterfallLayout};
pub use models::{LayoutPosition, MediaItem, MediaKind, VisibleRange};
