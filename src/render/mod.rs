//! CPU rasterization of surfaces and isolated layers.

pub(crate) mod cpu;
pub(crate) mod target;

use std::io::Cursor;

use anyhow::Context as _;

use crate::assets::decode::unpremultiply_rgba8_in_place;
use crate::foundation::error::{StudioError, StudioResult};

/// Raster output of one render, RGBA8 row-major.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let mut px = [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ];
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut px);
        }
        Some(px)
    }

    /// Encode as PNG (straight alpha).
    pub fn to_png(&self) -> StudioResult<Vec<u8>> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| StudioError::render("frame buffer does not match its dimensions"))?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .context("encode frame as png")?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
