pub mod media_item;
pub mod position;

pub use media_item::*;
pub use position::*;
