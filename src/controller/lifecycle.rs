use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::config::GalleryConfig;
use crate::layout::{select_window, CachedLayoutComputer, PackedLayout};
use crate::models::{LayoutPosition, MediaItem, VisibleRange};
use crate::scanner::ListingError;

/// Size of the gallery container and of the viewport that scrolls it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerMetrics {
    pub width: f64,
    pub height: f64,
}

/// Measures the container on demand. Returns `None` while it is not mounted.
pub trait ContainerMeasure: Send {
    fn measure(&self) -> Option<ContainerMetrics>;
}

impl<F> ContainerMeasure for F
where
    F: Fn() -> Option<ContainerMetrics> + Send,
{
    fn measure(&self) -> Option<ContainerMetrics> {
        self()
    }
}

/// A container that is never measurable; widths arrive through resize events only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unmeasured;

impl ContainerMeasure for Unmeasured {
    fn measure(&self) -> Option<ContainerMetrics> {
        None
    }
}

/// Where the controller is in its layout cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPhase {
    /// No usable layout: listing pending, width unknown, or a relayout in progress.
    Uninitialized,
    /// Positions are published but no window has been selected yet.
    LayoutComputed,
    /// Positions and a window are published.
    WindowComputed,
    /// The listing failed; nothing is laid out until a new listing arrives.
    Unavailable,
}

/// What the presentation layer should mount.
#[derive(Debug, Clone)]
pub struct RenderableSubset {
    /// Indices to mount; `None` means nothing to render.
    pub range: Option<VisibleRange>,
    pub items: Arc<[MediaItem]>,
    pub layout: Arc<PackedLayout>,
}

impl RenderableSubset {
    pub fn positions(&self) -> &[LayoutPosition] {
        &self.layout.positions
    }

    /// Height of the scroll spacer.
    pub fn total_height(&self) -> f64 {
        self.layout.total_height
    }

    /// Mounted tiles with their index and placement.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &MediaItem, &LayoutPosition)> + '_ {
        self.range
            .into_iter()
            .flat_map(|range| range.indices())
            .filter_map(move |i| Some((i, self.items.get(i)?, self.layout.positions.get(i)?)))
    }
}

/// Published snapshot of the gallery.
#[derive(Debug, Clone)]
pub enum RenderState {
    /// Listing or container measurement still pending.
    Loading,
    /// The listing succeeded but holds no media.
    Empty,
    /// The listing failed; the message is user-facing.
    Unavailable(String),
    Ready(RenderableSubset),
}

impl RenderState {
    pub fn subset(&self) -> Option<&RenderableSubset> {
        match self {
            Self::Ready(subset) => Some(subset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

type Subscriber = Box<dyn Fn(&RenderState) + Send>;

#[derive(Debug, Clone)]
enum Listing {
    Pending,
    Unavailable(String),
    Loaded(Arc<[MediaItem]>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    scroll_top: f64,
    height: f64,
}

/// Drives layout and windowing from host signals and publishes snapshots.
///
/// Layout runs on listing replacement and on container width changes; scroll
/// signals only reselect the window. Every update is computed into locals and
/// published as one immutable snapshot.
pub struct GalleryController {
    config: GalleryConfig,
    computer: CachedLayoutComputer,
    measure: Box<dyn ContainerMeasure>,
    listing: Listing,
    container_width: Option<f64>,
    viewport: Option<Viewport>,
    layout: Option<Arc<PackedLayout>>,
    range: Option<VisibleRange>,
    phase: LayoutPhase,
    snapshot: Arc<RenderState>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    layout_passes: u64,
    window_passes: u64,
}

impl GalleryController {
    /// Creates a controller whose width arrives only through [`Self::on_resize`].
    pub fn new(config: GalleryConfig) -> Self {
        Self::with_measure(config, Unmeasured)
    }

    pub fn with_measure(config: GalleryConfig, measure: impl ContainerMeasure + 'static) -> Self {
        let computer = CachedLayoutComputer::with_layout(config.layout.clone());
        Self {
            config,
            computer,
            measure: Box::new(measure),
            listing: Listing::Pending,
            container_width: None,
            viewport: None,
            layout: None,
            range: None,
            phase: LayoutPhase::Uninitialized,
            snapshot: Arc::new(RenderState::Loading),
            subscribers: Vec::new(),
            next_subscription: 0,
            layout_passes: 0,
            window_passes: 0,
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    pub fn container_width(&self) -> Option<f64> {
        self.container_width
    }

    /// Number of layout passes run so far, cache hits included.
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes
    }

    /// Number of window selections run so far.
    pub fn window_passes(&self) -> u64 {
        self.window_passes
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<RenderState> {
        Arc::clone(&self.snapshot)
    }

    /// The mountable subset, or `None` while loading, empty or unavailable.
    pub fn renderable_subset(&self) -> Option<RenderableSubset> {
        self.snapshot.subset().cloned()
    }

    /// Registers a callback invoked with every published snapshot.
    ///
    /// Callbacks run inside the triggering call. When the controller is shared
    /// behind a driver's lock, use [`GalleryHandle::subscribe`] instead, which
    /// notifies after the lock is released.
    ///
    /// [`GalleryHandle::subscribe`]: super::GalleryHandle::subscribe
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&RenderState) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Replaces the whole item list and relayouts against the live container width.
    pub fn on_items_changed(&mut self, items: Vec<MediaItem>) {
        debug!(count = items.len(), "Media list replaced");
        self.listing = Listing::Loaded(items.into());
        let width = self.measure_width();
        self.relayout(width);
    }

    /// Applies a listing result; errors are published instead of a layout.
    pub fn apply_listing(&mut self, result: Result<Vec<MediaItem>, ListingError>) {
        match result {
            Ok(items) => self.on_items_changed(items),
            Err(e) => {
                warn!("Media listing unavailable: {}", e);
                self.listing = Listing::Unavailable(e.to_string());
                self.layout = None;
                self.range = None;
                self.phase = LayoutPhase::Unavailable;
                self.publish();
            }
        }
    }

    /// Container width changed.
    ///
    /// Widths that resolve to the current column geometry keep the existing
    /// layout, since packing depends only on the items and the geometry.
    pub fn on_resize(&mut self, width: f64) {
        if let (Some(layout), Some(geometry)) =
            (&self.layout, self.config.layout.geometry(width))
        {
            if layout.geometry == Some(geometry) {
                trace!(width, columns = geometry.columns, "Resize keeps column geometry");
                self.container_width = Some(width);
                return;
            }
        }
        self.relayout(Some(width));
    }

    /// Scroll offset or viewport height changed. Never relayouts.
    pub fn on_scroll(&mut self, scroll_top: f64, viewport_height: f64) {
        self.viewport = Some(Viewport {
            scroll_top,
            height: viewport_height,
        });

        match self.phase {
            LayoutPhase::LayoutComputed | LayoutPhase::WindowComputed => {
                let previous = (self.phase, self.range);
                self.reselect_window();
                if (self.phase, self.range) != previous {
                    self.publish();
                }
            }
            // No window is valid without a complete layout.
            LayoutPhase::Uninitialized | LayoutPhase::Unavailable => {
                trace!(scroll_top, "Scroll before layout, window deferred");
            }
        }
    }

    fn measure_width(&mut self) -> Option<f64> {
        match self.measure.measure() {
            Some(metrics) => {
                if self.viewport.is_none() {
                    self.viewport = Some(Viewport {
                        scroll_top: 0.0,
                        height: metrics.height,
                    });
                }
                Some(metrics.width)
            }
            None => self.container_width,
        }
    }

    fn relayout(&mut self, width: Option<f64>) {
        self.phase = LayoutPhase::Uninitialized;
        self.layout = None;
        self.range = None;
        self.container_width = width;

        let items = match &self.listing {
            Listing::Loaded(items) => Arc::clone(items),
            Listing::Pending => {
                self.publish();
                return;
            }
            Listing::Unavailable(_) => {
                self.phase = LayoutPhase::Unavailable;
                self.publish();
                return;
            }
        };

        let Some(width) = width else {
            debug!("Container not measurable yet, layout deferred");
            self.publish();
            return;
        };

        let start = Instant::now();
        let layout = self.computer.compute(&items, width);
        if layout.geometry.is_none() {
            debug!(width, "Unusable container width, layout deferred");
            self.publish();
            return;
        }

        self.layout_passes += 1;
        debug!(
            width,
            items = items.len(),
            columns = layout.geometry.map(|g| g.columns).unwrap_or(0),
            total_height = layout.total_height,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Layout computed"
        );
        self.layout = Some(layout);
        self.phase = LayoutPhase::LayoutComputed;

        if self.viewport.is_some() {
            self.reselect_window();
        }
        self.publish();
    }

    fn reselect_window(&mut self) {
        let (Some(layout), Some(viewport)) = (&self.layout, self.viewport) else {
            return;
        };
        self.range = select_window(
            &layout.positions,
            viewport.scroll_top,
            viewport.height,
            self.config.buffer_count,
        );
        self.window_passes += 1;
        self.phase = LayoutPhase::WindowComputed;
        trace!(
            scroll_top = viewport.scroll_top,
            range = ?self.range,
            "Window selected"
        );
    }

    fn build_snapshot(&self) -> RenderState {
        match &self.listing {
            Listing::Pending => RenderState::Loading,
            Listing::Unavailable(message) => RenderState::Unavailable(message.clone()),
            Listing::Loaded(items) if items.is_empty() => RenderState::Empty,
            Listing::Loaded(items) => match &self.layout {
                Some(layout) if layout.positions.len() == items.len() => {
                    RenderState::Ready(RenderableSubset {
                        range: self.range,
                        items: Arc::clone(items),
                        layout: Arc::clone(layout),
                    })
                }
                _ => RenderState::Loading,
            },
        }
    }

    fn publish(&mut self) {
        self.snapshot = Arc::new(self.build_snapshot());
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::WaterfallLayout;
    use crate::models::MediaKind;
    use parking_lot::Mutex;
    use std::path::PathBuf;

    fn square_items(count: usize) -> Vec<MediaItem> {
        (0..count)
            .map(|i| {
                let name = format!("{i}.jpg");
                MediaItem::new(name.clone(), name, MediaKind::Image, Some(1.0))
            })
            .collect()
    }

    fn config() -> GalleryConfig {
        GalleryConfig {
            layout: WaterfallLayout::new(300.0, 20.0),
            ..GalleryConfig::default()
        }
    }

    #[test]
    fn test_starts_loading() {
        let controller = GalleryController::new(config());
        assert_eq!(controller.phase(), LayoutPhase::Uninitialized);
        assert!(matches!(*controller.snapshot(), RenderState::Loading));
        assert!(controller.renderable_subset().is_none());
    }

    #[test]
    fn test_items_without_width_stay_uninitialized() {
        let mut controller = GalleryController::new(config());
        controller.on_items_changed(square_items(6));
        assert_eq!(controller.phase(), LayoutPhase::Uninitialized);
        assert!(matches!(*controller.snapshot(), RenderState::Loading));

        controller.on_resize(930.0);
        assert_eq!(controller.phase(), LayoutPhase::LayoutComputed);
        let subset = controller.renderable_subset().unwrap();
        assert_eq!(subset.range, None);
        assert_eq!(subset.positions().len(), 6);
        assert_eq!(subset.total_height(), 1425.0);
    }

    #[test]
    fn test_scroll_selects_window_without_relayout() {
        let mut controller = GalleryController::new(config());
        controller.on_items_changed(square_items(40));
        controller.on_resize(930.0);
        assert_eq!(controller.layout_passes(), 1);

        for step in 0..20 {
            controller.on_scroll(step as f64 * 300.0, 800.0);
        }
        assert_eq!(controller.phase(), LayoutPhase::WindowComputed);
        assert_eq!(controller.layout_passes(), 1);
        assert_eq!(controller.window_passes(), 20);

        let subset = controller.renderable_subset().unwrap();
        let range = subset.range.unwrap();
        assert!(range.end < 40);
        assert_eq!(subset.visible().count(), range.len());
    }

    #[test]
    fn test_scroll_before_layout_is_applied_after() {
        let mut controller = GalleryController::new(config());
        controller.on_scroll(0.0, 900.0);
        assert_eq!(controller.phase(), LayoutPhase::Uninitialized);
        assert_eq!(controller.window_passes(), 0);

        controller.on_items_changed(square_items(20));
        controller.on_resize(930.0);
        assert_eq!(controller.phase(), LayoutPhase::WindowComputed);
        // Rows are 475px apart: rows 0 and 1 are visible, row 2 (top 950)
        // is the first below the fold, index 4. Buffer of 5 widens to 9.
        let range = controller.renderable_subset().unwrap().range.unwrap();
        assert_eq!(range, VisibleRange { start: 0, end: 9 });
    }

    #[test]
    fn test_measured_container() {
        let measure = || {
            Some(ContainerMetrics {
                width: 930.0,
                height: 600.0,
            })
        };
        let mut controller = GalleryController::with_measure(config(), measure);
        controller.on_items_changed(square_items(6));
        assert_eq!(controller.phase(), LayoutPhase::WindowComputed);
        assert_eq!(controller.container_width(), Some(930.0));
        assert!(controller.renderable_subset().unwrap().range.is_some());
    }

    #[test]
    fn test_measurement_reads_live_state() {
        let width = Arc::new(Mutex::new(None::<f64>));
        let reading = Arc::clone(&width);
        let measure = move || {
            let current = *reading.lock();
            current.map(|w| ContainerMetrics {
                width: w,
                height: 500.0,
            })
        };
        let mut controller = GalleryController::with_measure(config(), measure);

        controller.on_items_changed(square_items(4));
        assert_eq!(controller.phase(), LayoutPhase::Uninitialized);

        *width.lock() = Some(1300.0);
        controller.on_items_changed(square_items(4));
        assert_eq!(controller.phase(), LayoutPhase::WindowComputed);
        let geometry = controller.renderable_subset().unwrap().layout.geometry.unwrap();
        assert_eq!(geometry.columns, 4);
    }

    #[test]
    fn test_resize_with_same_geometry_keeps_layout() {
        let mut controller = GalleryController::new(GalleryConfig {
            layout: WaterfallLayout::new(300.0, 0.0),
            ..GalleryConfig::default()
        });
        controller.on_items_changed(square_items(10));
        controller.on_resize(900.0);
        let before = controller.renderable_subset().unwrap();

        // 900px and 901px both resolve to 3 columns but of different widths.
        controller.on_resize(901.0);
        assert_eq!(controller.layout_passes(), 2);

        controller.on_resize(901.0);
        assert_eq!(controller.layout_passes(), 2);
        assert_eq!(controller.container_width(), Some(901.0));

        controller.on_resize(900.0);
        let after = controller.renderable_subset().unwrap();
        assert_eq!(controller.layout_passes(), 3);
        // Served from the layout cache.
        assert!(Arc::ptr_eq(&before.layout, &after.layout));
    }

    #[test]
    fn test_resize_changes_columns() {
        let mut controller = GalleryController::new(config());
        controller.on_items_changed(square_items(12));
        controller.on_resize(930.0);
        assert_eq!(
            controller.renderable_subset().unwrap().layout.geometry.unwrap().columns,
            2
        );
        controller.on_resize(1600.0);
        assert_eq!(
            controller.renderable_subset().unwrap().layout.geometry.unwrap().columns,
            5
        );
    }

    #[test]
    fn test_degenerate_width_is_loading() {
        let mut controller = GalleryController::new(config());
        controller.on_items_changed(square_items(3));
        for width in [0.0, f64::MAX, 1e12] {
            controller.on_resize(width);
            assert_eq!(controller.phase(), LayoutPhase::Uninitialized);
            assert!(matches!(*controller.snapshot(), RenderState::Loading));
        }
        assert_eq!(controller.layout_passes(), 0);

        // A later usable width still lays out.
        controller.on_resize(930.0);
        assert_eq!(controller.phase(), LayoutPhase::LayoutComputed);
    }

    #[test]
    fn test_empty_listing() {
        let mut controller = GalleryController::new(config());
        controller.on_resize(1200.0);
        controller.apply_listing(Ok(Vec::new()));
        assert!(matches!(*controller.snapshot(), RenderState::Empty));
        controller.on_scroll(0.0, 800.0);
        assert!(controller.renderable_subset().is_none());
    }

    #[test]
    fn test_listing_error_then_recovery() {
        let mut controller = GalleryController::new(config());
        controller.on_resize(930.0);
        controller.apply_listing(Err(ListingError::NotFound(PathBuf::from("/missing"))));
        assert_eq!(controller.phase(), LayoutPhase::Unavailable);
        match &*controller.snapshot() {
            RenderState::Unavailable(message) => assert!(message.contains("/missing")),
            other => panic!("unexpected state {other:?}"),
        }

        // Resizes and scrolls do not lay out an unavailable listing.
        controller.on_resize(1600.0);
        controller.on_scroll(100.0, 800.0);
        assert_eq!(controller.phase(), LayoutPhase::Unavailable);
        assert_eq!(controller.layout_passes(), 0);

        controller.apply_listing(Ok(square_items(5)));
        assert_eq!(controller.phase(), LayoutPhase::WindowComputed);
        assert_eq!(controller.renderable_subset().unwrap().items.len(), 5);
    }

    #[test]
    fn test_items_and_positions_stay_aligned() {
        let mut controller = GalleryController::new(config());
        controller.on_resize(1280.0);
        controller.on_scroll(0.0, 720.0);
        for count in [3, 30, 0, 7] {
            controller.on_items_changed(square_items(count));
            if let Some(subset) = controller.renderable_subset() {
                assert_eq!(subset.items.len(), subset.positions().len());
                assert_eq!(subset.items.len(), count);
            } else {
                assert_eq!(count, 0);
            }
        }
    }

    #[test]
    fn test_scroll_to_bottom_mounts_last_item() {
        let mut controller = GalleryController::new(config());
        controller.on_items_changed(square_items(50));
        controller.on_resize(1280.0);
        let total = controller.renderable_subset().unwrap().total_height();
        controller.on_scroll(total, 900.0);
        let range = controller.renderable_subset().unwrap().range.unwrap();
        assert_eq!(range.end, 49);
    }

    #[test]
    fn test_subscribers_receive_snapshots() {
        let mut controller = GalleryController::new(config());
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&seen);
        let id = controller.subscribe(move |state| {
            let label = match state {
                RenderState::Loading => "loading",
                RenderState::Empty => "empty",
                RenderState::Unavailable(_) => "unavailable",
                RenderState::Ready(_) => "ready",
            };
            sink.lock().push(label.to_string());
        });

        controller.on_items_changed(square_items(4));
        controller.on_resize(930.0);
        controller.on_scroll(0.0, 500.0);
        // Same range again: nothing new to publish.
        controller.on_scroll(1.0, 500.0);
        assert_eq!(*seen.lock(), vec!["loading", "ready", "ready"]);

        assert!(controller.unsubscribe(id));
        assert!(!controller.unsubscribe(id));
        controller.on_resize(1600.0);
        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn test_unconventional_names_use_fallback() {
        let mut controller = GalleryController::new(config());
        let items = vec![
            MediaItem::from_identifier("gallery/1-300x150-a.jpg").unwrap(),
            MediaItem::from_identifier("gallery/holiday.jpg").unwrap(),
        ];
        controller.on_items_changed(items);
        controller.on_resize(930.0);
        let subset = controller.renderable_subset().unwrap();
        assert_eq!(subset.layout.fallback_count, 1);
        assert_eq!(subset.positions()[0].height, 227.0);
        assert_eq!(subset.positions()[1].height, 455.0);
    }
}
