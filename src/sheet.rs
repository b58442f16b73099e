//! Sprite-sheet compositor for the travel flag catalog.
//!
//! Packs each flag image into a fixed-size cell of a single sheet and emits
//! JSON metadata plus a TypeScript interface describing where each flag lives.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::TileError;

/// Fill colour for flags that could not be loaded
pub const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

pub const SHEET_FILE: &str = "travel_flags_tilesheet.png";
pub const METADATA_FILE: &str = "travel_flags_metadata.json";
pub const TYPESCRIPT_FILE: &str = "travel_flags.ts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagEntry {
    pub name: &'static str,
    pub code: &'static str,
}

const fn flag(name: &'static str, code: &'static str) -> FlagEntry {
    FlagEntry { name, code }
}

/// Flags packed into the sheet, in placement order
pub const TRAVEL_FLAGS: [FlagEntry; 14] = [
    flag("Australia", "au"),
    flag("United States", "us"),
    flag("Japan", "jp"),
    flag("Vietnam", "vn"),
    flag("Maldives", "mv"),
    // Europe
    flag("Italy", "it"),
    flag("France", "fr"),
    flag("Germany", "de"),
    flag("Spain", "es"),
    flag("United Kingdom", "gb"),
    flag("Netherlands", "nl"),
    flag("Switzerland", "ch"),
    // North Africa
    flag("Morocco", "ma"),
    flag("Egypt", "eg"),
];

/// Cell size and column count of the sheet grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub item_width: u32,
    pub item_height: u32,
    pub columns: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            item_width: 15,
            item_height: 10,
            columns: 8,
        }
    }
}

impl SheetLayout {
    /// Layout for a sheet holding `item_count` items; the sheet size must fit in `u32`
    pub fn new(
        item_width: u32,
        item_height: u32,
        columns: u32,
        item_count: usize,
    ) -> crate::error::Result<Self> {
        if item_width == 0 || item_height == 0 {
            return Err(TileError::ZeroDimension {
                width: item_width,
                height: item_height,
            });
        }
        if columns == 0 {
            return Err(TileError::ZeroColumns);
        }

        let layout = Self {
            item_width,
            item_height,
            columns,
        };
        layout.dimensions(item_count)?;
        Ok(layout)
    }

    /// Sheet size needed to hold `count` items
    pub fn dimensions(&self, count: usize) -> crate::error::Result<(u32, u32)> {
        let too_large = || TileError::SheetTooLarge {
            count,
            columns: self.columns,
            item_width: self.item_width,
            item_height: self.item_height,
        };

        let rows =
            u32::try_from(count.div_ceil(self.columns as usize)).map_err(|_| too_large())?;
        let width = self.columns.checked_mul(self.item_width).ok_or_else(too_large)?;
        let height = rows.checked_mul(self.item_height).ok_or_else(too_large)?;
        Ok((width, height))
    }

    /// Grid cell (row, column) of the item at `index`
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let columns = self.columns as usize;
        ((index / columns) as u32, (index % columns) as u32)
    }

    /// Pixel offset of the item at `index`, which must lie within a count
    /// accepted by [`SheetLayout::dimensions`]
    pub fn position(&self, index: usize) -> (u32, u32) {
        let (row, col) = self.cell(index);
        (col * self.item_width, row * self.item_height)
    }

    pub fn placements(&self, catalog: &[FlagEntry]) -> Vec<FlagPlacement> {
        catalog
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let (x, y) = self.position(i);
                FlagPlacement {
                    name: entry.name.to_string(),
                    code: entry.code.to_string(),
                    x,
                    y,
                    width: self.item_width,
                    height: self.item_height,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagPlacement {
    pub name: String,
    pub code: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    pub width: u32,
    pub height: u32,
    pub flag_width: u32,
    pub flag_height: u32,
    pub columns: u32,
}

/// JSON description of the sheet and every placed flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMetadata {
    pub tilesheet: SheetInfo,
    pub flags: Vec<FlagPlacement>,
}

impl SheetMetadata {
    pub fn new(layout: &SheetLayout, catalog: &[FlagEntry]) -> crate::error::Result<Self> {
        let (width, height) = layout.dimensions(catalog.len())?;
        Ok(Self {
            tilesheet: SheetInfo {
                width,
                height,
                flag_width: layout.item_width,
                flag_height: layout.item_height,
                columns: layout.columns,
            },
            flags: layout.placements(catalog),
        })
    }
}

/// Paths of the files written by [`generate`]
#[derive(Debug, Clone)]
pub struct SheetArtifacts {
    pub sheet: PathBuf,
    pub metadata: PathBuf,
    pub typescript: PathBuf,
    pub width: u32,
    pub height: u32,
}

fn placeholder(layout: &SheetLayout) -> RgbaImage {
    RgbaImage::from_pixel(layout.item_width, layout.item_height, PLACEHOLDER_COLOR)
}

/// Load `<dir>/<code>.png` at the layout's cell size.
///
/// Missing or undecodable files become a solid placeholder; images of the
/// wrong size are resized with nearest-neighbour sampling.
pub fn load_flag_image(dir: &Path, code: &str, layout: &SheetLayout) -> RgbaImage {
    let path = dir.join(format!("{}.png", code));

    if !path.exists() {
        warn!("Flag {} not found at {}, using placeholder", code, path.display());
        return placeholder(layout);
    }

    let img = match image::open(&path) {
        Ok(img) => img,
        Err(e) => {
            warn!("Error loading {}: {}, using placeholder", code, e);
            return placeholder(layout);
        }
    };

    if (img.width(), img.height()) != (layout.item_width, layout.item_height) {
        info!(
            "Resizing {} from {}x{} to {}x{}",
            code,
            img.width(),
            img.height(),
            layout.item_width,
            layout.item_height
        );
        return img
            .resize_exact(layout.item_width, layout.item_height, FilterType::Nearest)
            .to_rgba8();
    }

    img.to_rgba8()
}

/// Paste every catalog flag into its cell of a transparent canvas
pub fn compose_sheet(
    flags_dir: &Path,
    catalog: &[FlagEntry],
    layout: &SheetLayout,
) -> crate::error::Result<RgbaImage> {
    let (width, height) = layout.dimensions(catalog.len())?;
    info!("Creating tile sheet: {}x{} pixels", width, height);

    let mut sheet = RgbaImage::new(width, height);

    for (i, entry) in catalog.iter().enumerate() {
        let flag = load_flag_image(flags_dir, entry.code, layout);
        let (x, y) = layout.position(i);
        imageops::replace(&mut sheet, &flag, x as i64, y as i64);
        info!("Added {} ({}) at ({}, {})", entry.name, entry.code, x, y);
    }

    Ok(sheet)
}

/// Quote a value as a single-quoted TypeScript string literal
fn ts_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// TypeScript module exposing the sheet layout as typed constants with
/// lookups by code and by case-insensitive name
pub fn typescript_interface(metadata: &SheetMetadata) -> String {
    let sheet = &metadata.tilesheet;

    let mut out = format!(
        "// Generated Flag Tile Sheet Interface
// Auto-generated by tilekit flags

export interface FlagData {{
  name: string;
  code: string;
  x: number;
  y: number;
  width: number;
  height: number;
}}

export class TravelFlags {{
  public static readonly TILESHEET_WIDTH = {};
  public static readonly TILESHEET_HEIGHT = {};
  public static readonly FLAG_WIDTH = {};
  public static readonly FLAG_HEIGHT = {};

  public static readonly FLAGS: FlagData[] = [
",
        sheet.width, sheet.height, sheet.flag_width, sheet.flag_height
    );

    for flag in &metadata.flags {
        out.push_str(&format!(
            "    {{ name: {}, code: {}, x: {}, y: {}, width: {}, height: {} }},\n",
            ts_string(&flag.name),
            ts_string(&flag.code),
            flag.x,
            flag.y,
            flag.width,
            flag.height
        ));
    }

    out.push_str(
        "  ];

  public static getFlagByCode(code: string): FlagData | undefined {
    return this.FLAGS.find(flag => flag.code === code);
  }

  public static getFlagByName(name: string): FlagData | undefined {
    return this.FLAGS.find(flag => flag.name.toLowerCase() === name.toLowerCase());
  }
}
",
    );

    out
}

/// Build the sheet from `<assets_dir>/flags` and write the PNG, JSON and
/// TypeScript artifacts into `output_dir`
pub fn generate(
    assets_dir: &Path,
    output_dir: &Path,
    catalog: &[FlagEntry],
    layout: &SheetLayout,
) -> Result<SheetArtifacts> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let sheet = compose_sheet(&assets_dir.join("flags"), catalog, layout)?;
    let sheet_path = output_dir.join(SHEET_FILE);
    sheet
        .save(&sheet_path)
        .with_context(|| format!("Failed to save tile sheet: {:?}", sheet_path))?;
    info!("Tile sheet saved as: {}", sheet_path.display());

    let metadata = SheetMetadata::new(layout, catalog)?;
    let metadata_path = output_dir.join(METADATA_FILE);
    let json = serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    fs::write(&metadata_path, json)
        .with_context(|| format!("Failed to write metadata: {:?}", metadata_path))?;
    info!("Metadata saved as: {}", metadata_path.display());

    let typescript_path = output_dir.join(TYPESCRIPT_FILE);
    fs::write(&typescript_path, typescript_interface(&metadata))
        .with_context(|| format!("Failed to write TypeScript interface: {:?}", typescript_path))?;
    info!("TypeScript interface saved as: {}", typescript_path.display());

    Ok(SheetArtifacts {
        sheet: sheet_path,
        metadata: metadata_path,
        typescript: typescript_path,
        width: sheet.width(),
        height: sheet.height(),
    })
}
