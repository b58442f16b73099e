use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{Result, TileError};

/// Pixels to remove from each edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Margins {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Region (x, y, width, height) left after removing the margins,
    /// or `None` if nothing would remain
    pub fn remaining(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let new_width = width.checked_sub(self.left)?.checked_sub(self.right)?;
        let new_height = height.checked_sub(self.top)?.checked_sub(self.bottom)?;

        if new_width == 0 || new_height == 0 {
            return None;
        }

        Some((self.left, self.top, new_width, new_height))
    }
}

/// Remove `margins` from the borders of an image
pub fn crop_borders(img: &DynamicImage, margins: Margins) -> Result<DynamicImage> {
    let (width, height) = (img.width(), img.height());

    let (x, y, new_width, new_height) =
        margins
            .remaining(width, height)
            .ok_or(TileError::InvalidCrop {
                left: margins.left,
                top: margins.top,
                right: margins.right,
                bottom: margins.bottom,
                width,
                height,
            })?;

    Ok(img.crop_imm(x, y, new_width, new_height))
}

/// Stretch an image to exactly `width` x `height`, ignoring aspect ratio.
/// Uses Lanczos3 filtering.
pub fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(TileError::ZeroDimension { width, height });
    }

    Ok(img.resize_exact(width, height, FilterType::Lanczos3))
}
