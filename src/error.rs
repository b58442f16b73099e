use thiserror::Error;

pub type Result<T> = std::result::Result<T, TileError>;

/// Parameter validation failures, raised before anything is written to disk
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileError {
    #[error(
        "crop margins (left={left}, top={top}, right={right}, bottom={bottom}) \
         are too large for a {width}x{height} image"
    )]
    InvalidCrop {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
        width: u32,
        height: u32,
    },

    #[error("target dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("tile size must be greater than 0")]
    ZeroTileSize,

    #[error("sheet column count must be greater than 0")]
    ZeroColumns,

    #[error(
        "a sheet of {count} items at {item_width}x{item_height} in {columns} columns \
         exceeds the maximum image size"
    )]
    SheetTooLarge {
        count: usize,
        columns: u32,
        item_width: u32,
        item_height: u32,
    },
}
