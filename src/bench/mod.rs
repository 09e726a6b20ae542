//! Scroll simulation for measuring window selection cost.
//!
//! Lays out a listing once, then sweeps the scroll offset from top to bottom
//! in quarter-viewport steps and times every window update.

use std::time::Instant;

use tracing::info;

use crate::config::GalleryConfig;
use crate::controller::GalleryController;
use crate::models::MediaItem;

/// Summary of one scroll sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollReport {
    pub items: usize,
    pub columns: usize,
    pub total_height: f64,
    pub layout_ms: f64,
    pub frames: usize,
    pub frame_p50_ms: f64,
    pub frame_p95_ms: f64,
    pub frames_over_16ms: usize,
    /// Largest number of tiles mounted at any offset.
    pub peak_mounted: usize,
}

/// Runs a full sweep against a fresh controller.
pub fn simulate_scroll(
    items: Vec<MediaItem>,
    config: GalleryConfig,
    width: f64,
    viewport_height: f64,
) -> ScrollReport {
    let item_count = items.len();
    let mut controller = GalleryController::new(config);

    let layout_start = Instant::now();
    controller.on_items_changed(items);
    controller.on_resize(width);
    let layout_ms = layout_start.elapsed().as_secs_f64() * 1000.0;

    let Some(subset) = controller.renderable_subset() else {
        return ScrollReport {
            items: item_count,
            columns: 0,
            total_height: 0.0,
            layout_ms,
            frames: 0,
            frame_p50_ms: 0.0,
            frame_p95_ms: 0.0,
            frames_over_16ms: 0,
            peak_mounted: 0,
        };
    };
    let total_height = subset.total_height();
    let columns = subset.layout.geometry.map(|g| g.columns).unwrap_or(0);

    let step = (viewport_height / 4.0).max(1.0);
    let max_scroll = (total_height - viewport_height).max(0.0);
    let mut frame_times_ms = Vec::new();
    let mut peak_mounted = 0usize;

    let mut scroll_top = 0.0;
    loop {
        let frame_start = Instant::now();
        controller.on_scroll(scroll_top, viewport_height);
        frame_times_ms.push(frame_start.elapsed().as_secs_f64() * 1000.0);

        let mounted = controller
            .renderable_subset()
            .and_then(|s| s.range)
            .map(|r| r.len())
            .unwrap_or(0);
        peak_mounted = peak_mounted.max(mounted);

        if scroll_top >= max_scroll {
            break;
        }
        scroll_top = (scroll_top + step).min(max_scroll);
    }

    let report = ScrollReport {
        items: item_count,
        columns,
        total_height,
        layout_ms,
        frames: frame_times_ms.len(),
        frame_p50_ms: percentile_ms(&frame_times_ms, 0.50),
        frame_p95_ms: percentile_ms(&frame_times_ms, 0.95),
        frames_over_16ms: frame_times_ms.iter().filter(|t| **t > 16.67).count(),
        peak_mounted,
    };
    info!(
        frames = report.frames,
        p95_ms = report.frame_p95_ms,
        peak_mounted = report.peak_mounted,
        "Scroll simulation finished"
    );
    report
}

pub fn print_report(report: &ScrollReport) {
    println!(
        "items={} columns={} total_height={:.0} layout_ms={:.3}",
        report.items, report.columns, report.total_height, report.layout_ms
    );
    println!(
        "frames={} p50_ms={:.4} p95_ms={:.4} over_16ms={} peak_mounted={}",
        report.frames,
        report.frame_p50_ms,
        report.frame_p95_ms,
        report.frames_over_16ms,
        report.peak_mounted
    );
}

fn percentile_ms(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let clamped = p.clamp(0.0, 1.0);
    let idx = ((sorted.len() - 1) as f64 * clamped).round() as usize;
    sorted[idx]
}
