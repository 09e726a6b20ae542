//! Async host driver for a [`GalleryController`].
//!
//! - Resize notifications are debounced (trailing edge, latest width wins)
//! - Scroll notifications run at most once per frame interval (latest offset wins)
//! - Listing replacements apply immediately
//! - Pending work stores only the signal values and runs against the
//!   controller's live items when it fires
//! - Handle subscribers are notified after the controller lock is released

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

use super::lifecycle::{GalleryController, RenderState, SubscriptionId};
use crate::models::MediaItem;
use crate::scanner::ListingError;

/// A signal from the host environment.
#[derive(Debug)]
pub enum HostEvent {
    Resize(f64),
    Scroll {
        scroll_top: f64,
        viewport_height: f64,
    },
    ReplaceItems(Vec<MediaItem>),
    Listing(Result<Vec<MediaItem>, ListingError>),
}

type Listener = Arc<dyn Fn(&RenderState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    entries: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

/// Sending side of a running driver.
///
/// The driver stops once every handle clone is dropped, after flushing any
/// pending resize or scroll. A listener that owns a handle clone keeps the
/// driver alive.
#[derive(Clone)]
pub struct GalleryHandle {
    tx: Sender<HostEvent>,
    controller: Arc<Mutex<GalleryController>>,
    listeners: Arc<Mutex<Listeners>>,
}

impl GalleryHandle {
    /// Returns false if the driver has stopped.
    pub fn resize(&self, width: f64) -> bool {
        self.send(HostEvent::Resize(width))
    }

    pub fn scroll(&self, scroll_top: f64, viewport_height: f64) -> bool {
        self.send(HostEvent::Scroll {
            scroll_top,
            viewport_height,
        })
    }

    pub fn replace_items(&self, items: Vec<MediaItem>) -> bool {
        self.send(HostEvent::ReplaceItems(items))
    }

    pub fn apply_listing(&self, result: Result<Vec<MediaItem>, ListingError>) -> bool {
        self.send(HostEvent::Listing(result))
    }

    pub fn send(&self, event: HostEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<RenderState> {
        self.controller.lock().snapshot()
    }

    /// Registers a callback for every snapshot the driver publishes.
    ///
    /// Callbacks run on the driver task with no lock held, so they may read
    /// the controller or subscribe further. Several publishes inside one
    /// event collapse into a single call with the latest snapshot.
    pub fn subscribe(
        &self,
        callback: impl Fn(&RenderState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut listeners = self.listeners.lock();
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(callback)));
        id
    }

    /// Removes a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|(sid, _)| *sid != id);
        listeners.entries.len() != before
    }

    /// Runs a closure against the controller while holding its lock.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut GalleryController) -> R) -> R {
        f(&mut self.controller.lock())
    }

    /// Shared controller, usable after the handle is dropped.
    pub fn controller(&self) -> Arc<Mutex<GalleryController>> {
        Arc::clone(&self.controller)
    }
}

#[derive(Debug, Clone, Copy)]
struct Timing {
    resize_debounce: Duration,
    frame_interval: Duration,
}

/// Spawns the driver task on the current tokio runtime.
pub fn spawn_driver(controller: GalleryController) -> (GalleryHandle, JoinHandle<()>) {
    let timing = Timing {
        resize_debounce: controller.config().resize_debounce,
        frame_interval: controller.config().frame_interval,
    };
    let controller = Arc::new(Mutex::new(controller));
    let listeners = Arc::new(Mutex::new(Listeners::default()));
    let (tx, rx) = flume::unbounded();

    let publisher = Publisher {
        controller: Arc::clone(&controller),
        listeners: Arc::clone(&listeners),
        last: controller.lock().snapshot(),
    };
    let task = tokio::spawn(run(publisher, rx, timing));
    (
        GalleryHandle {
            tx,
            controller,
            listeners,
        },
        task,
    )
}

/// Applies updates to the shared controller and fans out new snapshots.
struct Publisher {
    controller: Arc<Mutex<GalleryController>>,
    listeners: Arc<Mutex<Listeners>>,
    last: Arc<RenderState>,
}

impl Publisher {
    fn apply(&mut self, update: impl FnOnce(&mut GalleryController)) {
        let snapshot = {
            let mut controller = self.controller.lock();
            update(&mut controller);
            controller.snapshot()
        };
        if Arc::ptr_eq(&snapshot, &self.last) {
            return;
        }
        self.last = Arc::clone(&snapshot);

        let listeners: Vec<Listener> = {
            let listeners = self.listeners.lock();
            listeners.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

async fn run(mut publisher: Publisher, rx: Receiver<HostEvent>, timing: Timing) {
    let mut pending_resize: Option<f64> = None;
    let mut resize_deadline: Option<Instant> = None;
    let mut pending_scroll: Option<(f64, f64)> = None;
    let mut next_frame = Instant::now();

    debug!(?timing, "Gallery driver started");

    loop {
        let resize_due = resize_deadline;
        let resize_timer = async move {
            match resize_due {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        let frame_due = pending_scroll.map(|_| next_frame);
        let frame_timer = async move {
            match frame_due {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            _ = resize_timer => {
                resize_deadline = None;
                if let Some(width) = pending_resize.take() {
                    trace!(width, "Debounced resize fired");
                    publisher.apply(|c| c.on_resize(width));
                }
            }
            _ = frame_timer => {
                if let Some((scroll_top, viewport_height)) = pending_scroll.take() {
                    publisher.apply(|c| c.on_scroll(scroll_top, viewport_height));
                }
                next_frame = Instant::now() + timing.frame_interval;
            }
            event = rx.recv_async() => {
                match event {
                    Ok(HostEvent::Resize(width)) => {
                        pending_resize = Some(width);
                        resize_deadline = Some(Instant::now() + timing.resize_debounce);
                    }
                    Ok(HostEvent::Scroll { scroll_top, viewport_height }) => {
                        pending_scroll = Some((scroll_top, viewport_height));
                    }
                    Ok(HostEvent::ReplaceItems(items)) => {
                        publisher.apply(|c| c.on_items_changed(items));
                    }
                    Ok(HostEvent::Listing(result)) => {
                        publisher.apply(|c| c.apply_listing(result));
                    }
                    Err(_) => break,
                }
            }
        }
    }

    if let Some(width) = pending_resize {
        publisher.apply(|c| c.on_resize(width));
    }
    if let Some((scroll_top, viewport_height)) = pending_scroll {
        publisher.apply(|c| c.on_scroll(scroll_top, viewport_height));
    }
    debug!("Gallery driver stopped");
}
