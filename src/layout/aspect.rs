//! Aspect ratios encoded in gallery file names.
//!
//! Uploaded files are named `<timestamp>-<width>x<height>-<name>` so the layout
//! can size tiles before any pixel data is fetched.

/// Extracts `height / width` from a `<timestamp>-<W>x<H>-<name>` file name.
///
/// Any directory prefix is ignored. Returns `None` when the dimension segment is
/// missing, non-numeric or zero, so `NaN` and infinities never reach the layout.
pub fn aspect_ratio_from_name(name: &str) -> Option<f64> {
    let (width, height) = dimensions_from_name(name)?;
    Some(height as f64 / width as f64)
}

/// Parses the `<W>x<H>` segment of a conventional file name.
pub fn dimensions_from_name(name: &str) -> Option<(u32, u32)> {
    let file_name = name.rsplit('/').next()?;
    let segment = file_name.split('-').nth(1)?;
    let (width, height) = segment.split_once('x')?;
    let width = width.trim().parse::<u32>().ok()?;
    let height = height.trim().parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

/// Builds the conventional file name that [`aspect_ratio_from_name`] reads back.
pub fn dimensioned_file_name(timestamp_ms: u64, width: u32, height: u32, name: &str) -> String {
    format!("{timestamp_ms}-{width}x{height}-{name}")
}
