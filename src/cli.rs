use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::analysis::{DEFAULT_COMMON_SIZES, DEFAULT_THRESHOLD};

#[derive(Parser, Debug)]
#[command(name = "tilekit")]
#[command(version, about = "Tools for tile-based image assets")]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Draw a grid overlay on an image
    Grid(GridArgs),
    /// Remove pixels from the borders of an image
    Crop(CropArgs),
    /// Stretch an image to exact dimensions
    Resize(ResizeArgs),
    /// Guess the tile size of a tileset
    Analyze(AnalyzeArgs),
    /// Pack the travel flags into a tile sheet with JSON and TypeScript metadata
    Flags(FlagsArgs),
    /// Show how candidate tile sizes fit an image
    Survey(SurveyArgs),
}

#[derive(Args, Debug)]
pub struct GridArgs {
    /// Image file (e.g. tileset.png)
    pub image: PathBuf,

    /// Size of each tile in pixels
    pub tile_size: u32,

    /// Output path [default: <image>_grid_<tile_size>px.png]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl GridArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            sibling_path(&self.image, &format!("_grid_{}px", self.tile_size), "png")
        })
    }
}

#[derive(Args, Debug)]
pub struct CropArgs {
    /// Original image
    pub input: PathBuf,

    /// Cropped image [default: <input>_cropped.png]
    pub output: Option<PathBuf>,

    /// Pixels to remove on the left
    #[arg(long, default_value_t = 0)]
    pub crop_left: u32,

    /// Pixels to remove on the top
    #[arg(long, default_value_t = 0)]
    pub crop_top: u32,

    /// Pixels to remove on the right
    #[arg(long, default_value_t = 0)]
    pub crop_right: u32,

    /// Pixels to remove on the bottom
    #[arg(long, default_value_t = 0)]
    pub crop_bottom: u32,
}

impl CropArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| sibling_path(&self.input, "_cropped", "png"))
    }
}

#[derive(Args, Debug)]
pub struct ResizeArgs {
    /// Image file
    pub image: PathBuf,

    /// Target width in pixels
    pub width: u32,

    /// Target height in pixels
    pub height: u32,

    /// Output path [default: <image>_resized.<ext>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ResizeArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let ext = self
                .image
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "png".to_string());
            sibling_path(&self.image, "_resized", &ext)
        })
    }
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Tileset image
    pub image: PathBuf,

    /// Mean intensity difference (0-255) that marks a column or row as an edge
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Candidate tile sizes, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_COMMON_SIZES)]
    pub sizes: Vec<u32>,

    /// Skip the grid overlay for the recommended size
    #[arg(long)]
    pub no_overlay: bool,

    /// Also draw an overlay for every size that divides the image
    #[arg(long)]
    pub all_overlays: bool,

    /// Analysis JSON path [default: <image>_analysis.json]
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Do not write the analysis JSON
    #[arg(long, conflicts_with = "json")]
    pub no_json: bool,
}

impl AnalyzeArgs {
    pub fn json_path(&self) -> Option<PathBuf> {
        if self.no_json {
            return None;
        }
        Some(
            self.json
                .clone()
                .unwrap_or_else(|| sibling_path(&self.image, "_analysis", "json")),
        )
    }

    pub fn overlay_path(&self, tile_size: u32) -> PathBuf {
        sibling_path(&self.image, &format!("_grid_overlay_{}px", tile_size), "png")
    }
}

#[derive(Args, Debug)]
pub struct FlagsArgs {
    /// Asset directory holding a `flags/` folder of <code>.png files
    #[arg(long, default_value = "All_Assets")]
    pub assets: PathBuf,

    /// Directory for the sheet, metadata and TypeScript files
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Flags per row
    #[arg(long, default_value_t = 8)]
    pub columns: u32,

    /// Width of each flag cell
    #[arg(long, default_value_t = 15)]
    pub flag_width: u32,

    /// Height of each flag cell
    #[arg(long, default_value_t = 10)]
    pub flag_height: u32,
}

#[derive(Args, Debug)]
pub struct SurveyArgs {
    /// Tileset image
    pub image: PathBuf,

    /// Tile sizes to test, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_COMMON_SIZES)]
    pub sizes: Vec<u32>,

    /// Write a TypeScript tile mapping for this tile size
    #[arg(long)]
    pub mapping: Option<u32>,

    /// Mapping output path [default: <image>_mapping_<size>px.ts]
    #[arg(long, requires = "mapping")]
    pub mapping_output: Option<PathBuf>,
}

impl SurveyArgs {
    pub fn mapping_path(&self, tile_size: u32) -> PathBuf {
        self.mapping_output.clone().unwrap_or_else(|| {
            sibling_path(&self.image, &format!("_mapping_{}px", tile_size), "ts")
        })
    }
}

/// `<dir>/<stem><suffix>.<ext>` next to `input`
fn sibling_path(input: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}{}.{}", stem, suffix, ext))
}
