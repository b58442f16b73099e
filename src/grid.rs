use serde::Serialize;

use crate::error::{Result, TileError};

/// One complete cell of a regular tile grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileCoord {
    pub id: String,
    pub grid_x: u32,
    pub grid_y: u32,
    pub pixel_x: u32,
    pub pixel_y: u32,
    pub width: u32,
    pub height: u32,
}

/// How a single tile size partitions an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridFit {
    pub tile_size: u32,
    pub columns: u32,
    pub rows: u32,
    pub total_tiles: u64,
    pub remainder_x: u32,
    pub remainder_y: u32,
}

impl GridFit {
    pub fn new(width: u32, height: u32, tile_size: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(TileError::ZeroTileSize);
        }

        let columns = width / tile_size;
        let rows = height / tile_size;
        Ok(Self {
            tile_size,
            columns,
            rows,
            total_tiles: u64::from(columns) * u64::from(rows),
            remainder_x: width % tile_size,
            remainder_y: height % tile_size,
        })
    }

    /// True when the tile size divides both dimensions exactly
    pub fn perfect_fit(&self) -> bool {
        self.remainder_x == 0 && self.remainder_y == 0
    }
}

/// Enumerate every complete `tile_size` cell in row-major order.
///
/// Cells that would extend past the right or bottom edge are skipped.
pub fn tile_coordinates(width: u32, height: u32, tile_size: u32) -> Result<Vec<TileCoord>> {
    let fit = GridFit::new(width, height, tile_size)?;
    let mut tiles = Vec::with_capacity(fit.total_tiles as usize);

    for grid_y in 0..fit.rows {
        for grid_x in 0..fit.columns {
            tiles.push(TileCoord {
                id: format!("tile_{:03}", tiles.len()),
                grid_x,
                grid_y,
                pixel_x: grid_x * tile_size,
                pixel_y: grid_y * tile_size,
                width: tile_size,
                height: tile_size,
            });
        }
    }

    Ok(tiles)
}

/// Grid fit for every candidate size, in the order given
pub fn survey(width: u32, height: u32, sizes: &[u32]) -> Result<Vec<GridFit>> {
    sizes
        .iter()
        .map(|&size| GridFit::new(width, height, size))
        .collect()
}

/// TypeScript table listing every complete tile, one comment per grid row
pub fn mapping_typescript(width: u32, height: u32, tile_size: u32) -> Result<String> {
    let tiles = tile_coordinates(width, height, tile_size)?;
    let fit = GridFit::new(width, height, tile_size)?;

    let mut out = format!(
        "// Tile mapping ({size}x{size} tiles, {cols}x{rows} grid)
// Auto-generated by tilekit survey

export const TILE_SIZE = {size};

export const TILE_MAPPING = [",
        size = tile_size,
        cols = fit.columns,
        rows = fit.rows
    );

    let mut current_row = None;
    for tile in &tiles {
        if current_row != Some(tile.grid_y) {
            if current_row.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("\n  // Row {}", tile.grid_y));
            current_row = Some(tile.grid_y);
        }
        out.push_str(&format!(
            "\n  {{ id: '{}', x: {}, y: {}, w: {}, h: {} }},",
            tile.id, tile.pixel_x, tile.pixel_y, tile.width, tile.height
        ));
    }

    out.push_str("\n];\n");
    Ok(out)
}
