use std::fmt;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat};
use serde::Serialize;
use tracing::debug;

use crate::detection::{detect_grid_lines, dominant_spacing, to_intensity, GridLines, SpacingStats};
use crate::error::Result;
use crate::grid::{tile_coordinates, TileCoord};

/// Candidate tile sizes checked against the image dimensions
pub const DEFAULT_COMMON_SIZES: [u32; 8] = [8, 16, 24, 32, 48, 64, 96, 128];

/// Order in which divisor matches are preferred when the grid spacing is inconclusive
pub const DEFAULT_PREFERRED_ORDER: [u32; 8] = [32, 16, 64, 48, 24, 96, 128, 8];

/// Mean intensity difference (0-255) above which a column or row is flagged
pub const DEFAULT_THRESHOLD: f64 = 10.0;

/// Number of flagged offsets per axis kept in the report
const REPORTED_POSITIONS: usize = 10;

/// Largest dimension still considered a medium-sized tileset by the fallback rule
const MEDIUM_TILESET_LIMIT: u32 = 512;

/// Tunables of the tile-size heuristic
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub threshold: f64,
    pub common_sizes: Vec<u32>,
    pub preferred_order: Vec<u32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            common_sizes: DEFAULT_COMMON_SIZES.to_vec(),
            preferred_order: DEFAULT_PREFERRED_ORDER.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(label)
    }
}

/// Best guess at the tile size of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub most_likely_tile_size: u32,
    pub confidence: Confidence,
    pub reasoning: Vec<String>,
}

/// Dominant spacing per axis; an axis with fewer than two flagged lines has none
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GridAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_spacing: Option<SpacingStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_spacing: Option<SpacingStats>,
}

impl GridAnalysis {
    pub fn from_lines(lines: &GridLines) -> Self {
        Self {
            vertical_spacing: dominant_spacing(&lines.vertical),
            horizontal_spacing: dominant_spacing(&lines.horizontal),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub filename: String,
    pub dimensions: String,
    pub width: u32,
    pub height: u32,
    /// Pixel layout, named like PIL modes ("RGBA", "L", ...)
    pub mode: String,
    /// Container format in upper case ("PNG", "JPEG", ...)
    pub format: Option<String>,
}

fn mode_name(color: ColorType) -> String {
    let name = match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        other => return format!("{:?}", other),
    };
    name.to_string()
}

impl ImageInfo {
    pub fn new(path: &Path, img: &DynamicImage, format: Option<ImageFormat>) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            filename,
            dimensions: format!("{}x{}", img.width(), img.height()),
            width: img.width(),
            height: img.height(),
            mode: mode_name(img.color()),
            format: format.map(|f| format!("{:?}", f).to_uppercase()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectedGridLines {
    pub vertical_count: usize,
    pub horizontal_count: usize,
    pub vertical_positions: Vec<u32>,
    pub horizontal_positions: Vec<u32>,
}

impl From<&GridLines> for DetectedGridLines {
    fn from(lines: &GridLines) -> Self {
        Self {
            vertical_count: lines.vertical.len(),
            horizontal_count: lines.horizontal.len(),
            vertical_positions: lines.vertical.iter().copied().take(REPORTED_POSITIONS).collect(),
            horizontal_positions: lines
                .horizontal
                .iter()
                .copied()
                .take(REPORTED_POSITIONS)
                .collect(),
        }
    }
}

/// Complete result of analysing one tileset image
#[derive(Debug, Clone, Serialize)]
pub struct TilesetAnalysis {
    pub image_info: ImageInfo,
    pub possible_tile_sizes: Vec<u32>,
    pub detected_grid_lines: DetectedGridLines,
    pub grid_analysis: GridAnalysis,
    pub recommendations: Recommendation,
    pub tile_coordinates: Vec<TileCoord>,
}

/// Catalog sizes that divide both dimensions evenly, in catalog order
pub fn possible_tile_sizes(width: u32, height: u32, catalog: &[u32]) -> Vec<u32> {
    catalog
        .iter()
        .copied()
        .filter(|&size| size > 0 && width % size == 0 && height % size == 0)
        .collect()
}

/// Apply the recommendation rules; the first one that matches wins.
///
/// 1. Agreeing vertical and horizontal spacing that is also a divisor: high.
/// 2. Any divisor, picked by `preferred_order`: medium.
/// 3. 32 for images up to 512x512, 64 otherwise: low.
pub fn recommend(
    width: u32,
    height: u32,
    possible_sizes: &[u32],
    grid: &GridAnalysis,
    preferred_order: &[u32],
) -> Recommendation {
    if let (Some(v), Some(h)) = (&grid.vertical_spacing, &grid.horizontal_spacing) {
        let spacing = v.most_common;
        if spacing == h.most_common && possible_sizes.contains(&spacing) {
            return Recommendation {
                most_likely_tile_size: spacing,
                confidence: Confidence::High,
                reasoning: vec![format!(
                    "Grid analysis shows consistent {}x{} spacing",
                    spacing, spacing
                )],
            };
        }
        debug!(
            vertical = v.most_common,
            horizontal = h.most_common,
            "grid spacing inconclusive"
        );
    }

    let preferred = preferred_order
        .iter()
        .copied()
        .find(|size| possible_sizes.contains(size))
        .or_else(|| possible_sizes.first().copied());

    if let Some(size) = preferred {
        return Recommendation {
            most_likely_tile_size: size,
            confidence: Confidence::Medium,
            reasoning: vec![format!(
                "{}x{} is a common tile size and divides evenly into image dimensions",
                size, size
            )],
        };
    }

    let (size, reason) = if width <= MEDIUM_TILESET_LIMIT && height <= MEDIUM_TILESET_LIMIT {
        (32, "Default guess for medium-sized tilesets")
    } else {
        (64, "Default guess for large tilesets")
    };

    Recommendation {
        most_likely_tile_size: size,
        confidence: Confidence::Low,
        reasoning: vec![reason.to_string()],
    }
}

/// Run the whole heuristic on an image: divisor filter, edge pass,
/// spacing analysis, recommendation and tile coordinates.
pub fn analyze_tileset(
    img: &DynamicImage,
    image_info: ImageInfo,
    config: &AnalyzerConfig,
) -> Result<TilesetAnalysis> {
    let (width, height) = (img.width(), img.height());

    let possible = possible_tile_sizes(width, height, &config.common_sizes);
    debug!(?possible, "divisor filter");

    let gray = to_intensity(&img.to_rgba8());
    let lines = detect_grid_lines(&gray, config.threshold);
    debug!(
        vertical = lines.vertical.len(),
        horizontal = lines.horizontal.len(),
        threshold = config.threshold,
        "edge detection"
    );

    let grid_analysis = GridAnalysis::from_lines(&lines);
    let recommendations = recommend(
        width,
        height,
        &possible,
        &grid_analysis,
        &config.preferred_order,
    );
    let tiles = tile_coordinates(width, height, recommendations.most_likely_tile_size)?;

    Ok(TilesetAnalysis {
        image_info,
        possible_tile_sizes: possible,
        detected_grid_lines: DetectedGridLines::from(&lines),
        grid_analysis,
        recommendations,
        tile_coordinates: tiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn analyze(img: RgbaImage, config: &AnalyzerConfig) -> TilesetAnalysis {
        let img = DynamicImage::ImageRgba8(img);
        let info = ImageInfo::new(Path::new("test.png"), &img, Some(ImageFormat::Png));
        analyze_tileset(&img, info, config).unwrap()
    }

    fn spacing(most_common: u32) -> Option<SpacingStats> {
        Some(SpacingStats {
            spacings: vec![most_common; 3],
            most_common,
        })
    }

    /// Two-tone pattern that flips colour after each listed offset on both axes
    fn banded(size: u32, flips: &[u32]) -> RgbaImage {
        let band = |v: u32| flips.iter().filter(|&&f| f < v).count() % 2;
        RgbaImage::from_fn(size, size, |x, y| {
            if band(x) ^ band(y) == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_divisor_filter() {
        let catalog = DEFAULT_COMMON_SIZES;
        let sizes = possible_tile_sizes(1488, 528, &catalog);
        assert_eq!(sizes, vec![8, 16, 24, 48]);

        for &(w, h) in &[(256, 256), (600, 600), (602, 602), (96, 192)] {
            for size in catalog {
                let kept = possible_tile_sizes(w, h, &catalog).contains(&size);
                assert_eq!(kept, w % size == 0 && h % size == 0);
            }
        }
    }

    #[test]
    fn test_divisor_filter_ignores_zero() {
        assert_eq!(possible_tile_sizes(64, 64, &[0, 32]), vec![32]);
    }

    #[test]
    fn test_agreeing_spacing_is_high_confidence() {
        let grid = GridAnalysis {
            vertical_spacing: spacing(32),
            horizontal_spacing: spacing(32),
        };
        let rec = recommend(256, 256, &[8, 16, 32, 64], &grid, &DEFAULT_PREFERRED_ORDER);
        assert_eq!(rec.most_likely_tile_size, 32);
        assert_eq!(rec.confidence, Confidence::High);
    }

    #[test]
    fn test_disagreeing_spacing_falls_back_to_preference() {
        let grid = GridAnalysis {
            vertical_spacing: spacing(16),
            horizontal_spacing: spacing(32),
        };
        let rec = recommend(256, 256, &[8, 16, 32, 64], &grid, &DEFAULT_PREFERRED_ORDER);
        assert_eq!(rec.most_likely_tile_size, 32);
        assert_eq!(rec.confidence, Confidence::Medium);
    }

    #[test]
    fn test_spacing_outside_divisors_is_ignored() {
        let grid = GridAnalysis {
            vertical_spacing: spacing(24),
            horizontal_spacing: spacing(24),
        };
        let rec = recommend(128, 128, &[8, 16, 32, 64, 128], &grid, &DEFAULT_PREFERRED_ORDER);
        assert_eq!(rec.most_likely_tile_size, 32);
        assert_eq!(rec.confidence, Confidence::Medium);
    }

    #[test]
    fn test_preference_order() {
        let grid = GridAnalysis::default();
        let rec = recommend(1488, 528, &[8, 16, 24, 48], &grid, &DEFAULT_PREFERRED_ORDER);
        assert_eq!(rec.most_likely_tile_size, 16);

        // Custom catalog entry missing from the preference order
        let rec = recommend(120, 120, &[40], &grid, &DEFAULT_PREFERRED_ORDER);
        assert_eq!(rec.most_likely_tile_size, 40);
        assert_eq!(rec.confidence, Confidence::Medium);
    }

    #[test]
    fn test_fallback_depends_on_size() {
        let grid = GridAnalysis::default();
        let small = recommend(500, 300, &[], &grid, &DEFAULT_PREFERRED_ORDER);
        assert_eq!(small.most_likely_tile_size, 32);
        assert_eq!(small.confidence, Confidence::Low);

        let large = recommend(513, 100, &[], &grid, &DEFAULT_PREFERRED_ORDER);
        assert_eq!(large.most_likely_tile_size, 64);
        assert_eq!(large.reasoning, vec!["Default guess for large tilesets"]);
    }

    #[test]
    fn test_banded_image_detects_32px_grid() {
        // Flips after column 0, after every 33rd column and before the last column,
        // which leaves the flagged columns 32 apart more often than 1 apart
        let mut flips = vec![0];
        flips.extend((1..=29).map(|j| 33 * j));
        flips.push(990);
        let analysis = analyze(banded(992, &flips), &AnalyzerConfig::default());

        let vertical = analysis.grid_analysis.vertical_spacing.as_ref().unwrap();
        assert_eq!(vertical.most_common, 32);
        assert_eq!(analysis.possible_tile_sizes, vec![8, 16, 32]);
        assert_eq!(analysis.recommendations.most_likely_tile_size, 32);
        assert_eq!(analysis.recommendations.confidence, Confidence::High);
        assert_eq!(analysis.tile_coordinates.len(), 31 * 31);
    }

    #[test]
    fn test_uniform_image_without_divisor_is_low_confidence() {
        let img = RgbaImage::from_pixel(602, 602, Rgba([40, 40, 40, 255]));
        let analysis = analyze(img, &AnalyzerConfig::default());

        assert!(analysis.possible_tile_sizes.is_empty());
        assert_eq!(analysis.detected_grid_lines.vertical_count, 0);
        assert!(analysis.grid_analysis.vertical_spacing.is_none());
        assert_eq!(analysis.recommendations.most_likely_tile_size, 64);
        assert_eq!(analysis.recommendations.confidence, Confidence::Low);
    }

    #[test]
    fn test_uniform_600px_image() {
        let img = RgbaImage::from_pixel(600, 600, Rgba([40, 40, 40, 255]));

        // 600 is a multiple of 8 and 24 in the default catalog
        let analysis = analyze(img.clone(), &AnalyzerConfig::default());
        assert_eq!(analysis.possible_tile_sizes, vec![8, 24]);
        assert_eq!(analysis.recommendations.most_likely_tile_size, 24);
        assert_eq!(analysis.recommendations.confidence, Confidence::Medium);

        let config = AnalyzerConfig {
            common_sizes: vec![16, 32, 64, 128],
            ..AnalyzerConfig::default()
        };
        let analysis = analyze(img, &config);
        assert_eq!(analysis.recommendations.most_likely_tile_size, 64);
        assert_eq!(analysis.recommendations.confidence, Confidence::Low);
    }

    #[test]
    fn test_report_truncates_positions() {
        let img = RgbaImage::from_fn(64, 8, |x, _| {
            if x % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let analysis = analyze(img, &AnalyzerConfig::default());
        assert_eq!(analysis.detected_grid_lines.vertical_count, 62);
        assert_eq!(analysis.detected_grid_lines.vertical_positions.len(), 10);
        assert_eq!(analysis.detected_grid_lines.horizontal_count, 0);
    }

    #[test]
    fn test_image_info_uses_pil_names() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::new(4, 4));
        let info = ImageInfo::new(Path::new("dir/tiles.jpg"), &gray, Some(ImageFormat::Jpeg));
        assert_eq!(info.filename, "tiles.jpg");
        assert_eq!(info.mode, "L");
        assert_eq!(info.format.as_deref(), Some("JPEG"));

        let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));
        let info = ImageInfo::new(Path::new("tiles"), &rgb, None);
        assert_eq!(info.mode, "RGB");
        assert_eq!(info.format, None);
    }

    #[test]
    fn test_analysis_serializes_like_report() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
        let analysis = analyze(img, &AnalyzerConfig::default());
        let json = serde_json::to_value(&analysis).unwrap();

        assert_eq!(json["image_info"]["dimensions"], "64x64");
        assert_eq!(json["image_info"]["mode"], "RGBA");
        assert_eq!(json["image_info"]["format"], "PNG");
        assert!(json["image_info"].get("color").is_none());
        assert_eq!(json["recommendations"]["confidence"], "medium");
        assert_eq!(json["recommendations"]["most_likely_tile_size"], 32);
        assert_eq!(json["tile_coordinates"][0]["id"], "tile_000");
        assert!(json["grid_analysis"].as_object().unwrap().is_empty());
    }
}
