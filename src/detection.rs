use std::collections::BTreeMap;

use image::{GrayImage, Luma, RgbaImage};
use serde::Serialize;

/// Column and row offsets flagged as likely tile boundaries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLines {
    /// Flagged column indices, ascending
    pub vertical: Vec<u32>,
    /// Flagged row indices, ascending
    pub horizontal: Vec<u32>,
}

/// Gaps between consecutive flagged offsets along one axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpacingStats {
    pub spacings: Vec<u32>,
    /// Most frequent gap; ties go to the smallest gap
    pub most_common: u32,
}

/// Convert to single-channel intensity (ITU-R 601 luma, alpha ignored)
pub fn to_intensity(img: &RgbaImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let luma = 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

/// Mean absolute difference between each column and the column to its right
fn adjacent_column_diffs(gray: &GrayImage) -> Vec<f64> {
    let (width, height) = gray.dimensions();
    if height == 0 {
        return Vec::new();
    }

    (0..width.saturating_sub(1))
        .map(|x| {
            let total: u64 = (0..height)
                .map(|y| gray.get_pixel(x, y)[0].abs_diff(gray.get_pixel(x + 1, y)[0]) as u64)
                .sum();
            total as f64 / height as f64
        })
        .collect()
}

/// Mean absolute difference between each row and the row below it
fn adjacent_row_diffs(gray: &GrayImage) -> Vec<f64> {
    let (width, height) = gray.dimensions();
    if width == 0 {
        return Vec::new();
    }

    (0..height.saturating_sub(1))
        .map(|y| {
            let total: u64 = (0..width)
                .map(|x| gray.get_pixel(x, y)[0].abs_diff(gray.get_pixel(x, y + 1)[0]) as u64)
                .sum();
            total as f64 / width as f64
        })
        .collect()
}

/// Flag interior lines whose difference to either neighbour exceeds `threshold`.
///
/// `diffs[i]` is the difference between line `i` and line `i + 1`, so the
/// interior lines are `1..diffs.len()`.
fn flag_interior(diffs: &[f64], threshold: f64) -> Vec<u32> {
    (1..diffs.len())
        .filter(|&i| diffs[i - 1] > threshold || diffs[i] > threshold)
        .map(|i| i as u32)
        .collect()
}

/// Detect potential grid lines by looking for contrast discontinuities
/// between neighbouring columns and rows.
pub fn detect_grid_lines(gray: &GrayImage, threshold: f64) -> GridLines {
    GridLines {
        vertical: flag_interior(&adjacent_column_diffs(gray), threshold),
        horizontal: flag_interior(&adjacent_row_diffs(gray), threshold),
    }
}

/// Consecutive gaps of a flagged-offset sequence and their most common value.
///
/// Returns `None` when fewer than two offsets were flagged.
pub fn dominant_spacing(lines: &[u32]) -> Option<SpacingStats> {
    if lines.len() < 2 {
        return None;
    }

    let spacings: Vec<u32> = lines.windows(2).map(|w| w[1] - w[0]).collect();

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for &gap in &spacings {
        *counts.entry(gap).or_insert(0) += 1;
    }

    // BTreeMap iterates ascending, strict comparison keeps the smallest gap on ties
    let mut best: Option<(u32, usize)> = None;
    for (&gap, &count) in &counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((gap, count));
        }
    }

    best.map(|(most_common, _)| SpacingStats {
        spacings,
        most_common,
    })
}
