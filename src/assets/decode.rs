use std::fmt;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{StudioError, StudioResult};

/// Decoded raster image, ready to be painted by the CPU rasterizer.
///
/// Pixels are shared behind an `Arc`, so cloning a layer that holds one never copies pixel data.
#[derive(Clone)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    pub(crate) pixmap: Arc<vello_cpu::Pixmap>,
}

impl fmt::Debug for PreparedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PreparedImage {
    /// Build from already premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(width: u32, height: u32, bytes: &[u8]) -> StudioResult<Self> {
        let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
        Ok(Self {
            width,
            height,
            pixmap: Arc::new(pixmap),
        })
    }

    /// Build a uniformly colored image (straight alpha input).
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> StudioResult<Self> {
        let mut px = rgba;
        premultiply_rgba8_in_place(&mut px);
        let n = (width as usize).saturating_mul(height as usize);
        let mut bytes = Vec::with_capacity(n.saturating_mul(4));
        for _ in 0..n {
            bytes.extend_from_slice(&px);
        }
        Self::from_premul_rgba8(width, height, &bytes)
    }
}

/// Decode PNG/JPEG/... bytes into a [`PreparedImage`].
pub fn decode_image(bytes: &[u8]) -> StudioResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(StudioError::asset("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    PreparedImage::from_premul_rgba8(width, height, &rgba8_premul)
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StudioResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StudioError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StudioError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(StudioError::render("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
