pub mod analysis;
pub mod cli;
pub mod detection;
pub mod error;
pub mod grid;
pub mod overlay;
pub mod sheet;
pub mod transform;

pub use analysis::{
    analyze_tileset, AnalyzerConfig, Confidence, ImageInfo, Recommendation, TilesetAnalysis,
};
pub use cli::{Cli, Command};
pub use detection::{detect_grid_lines, dominant_spacing, GridLines};
pub use error::TileError;
pub use grid::{mapping_typescript, survey, tile_coordinates, GridFit, TileCoord};
pub use overlay::{draw_grid_overlay, DEFAULT_GRID_COLOR};
pub use sheet::{SheetLayout, SheetMetadata, TRAVEL_FLAGS};
pub use transform::{crop_borders, resize_exact, Margins};
