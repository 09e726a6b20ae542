pub mod driver;
pub mod lifecycle;

pub use driver::{spawn_driver, GalleryHandle, HostEvent};
pub use lifecycle::{
    ContainerMeasure, ContainerMetrics, GalleryController, LayoutPhase, RenderState,
    RenderableSubset, SubscriptionId, Unmeasured,
};
