use crate::assets::fonts::TextLayoutEngine;
use crate::foundation::core::{Affine, Rgba8, Size};
use crate::foundation::error::{StudioError, StudioResult};
use crate::layer::model::{Layer, LayerKind};
use crate::render::FrameRGBA;
use crate::render::target::{OffscreenTarget, TargetTracker};

/// Thickness of the selection border, in surface units.
const CHROME_STROKE: f64 = 1.5;
/// Side length of the selection corner handles, in surface units.
const CHROME_HANDLE: f64 = 8.0;

/// Everything one raster pass needs, borrowed from the owning surface.
pub(crate) struct Scene<'a> {
    /// Logical surface size; the target is this times the output multiplier.
    pub(crate) size: Size,
    /// Opaque fill drawn under everything; `None` leaves the target transparent.
    pub(crate) clear: Option<Rgba8>,
    pub(crate) background: Option<&'a Layer>,
    /// Layers in ascending z-order.
    pub(crate) layers: Vec<&'a Layer>,
    /// View transform (zoom about the center); identity for isolated exports.
    pub(crate) view: Affine,
    pub(crate) selection: Option<&'a Layer>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RasterOptions {
    /// Output pixels per surface unit.
    pub(crate) multiplier: f64,
    /// Interactive preview: draws selection chrome and ignores taint.
    pub(crate) preview: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            preview: false,
        }
    }
}

/// Pixel size of the target for `size` at `multiplier`: rounded up, never below 1.
pub(crate) fn target_size(size: Size, multiplier: f64) -> (u32, u32) {
    let px = |v: f64| -> u32 {
        let scaled = (v * multiplier).ceil();
        if scaled.is_finite() && scaled >= 1.0 {
            scaled.min(f64::from(u16::MAX)) as u32
        } else {
            1
        }
    };
    (px(size.width), px(size.height))
}

/// Rasterize `scene` into a fresh offscreen target.
///
/// Exports refuse to read back pixels when any drawn image is tainted.
pub(crate) fn rasterize(
    scene: &Scene<'_>,
    opts: RasterOptions,
    text: &mut TextLayoutEngine,
    tracker: &TargetTracker,
) -> StudioResult<FrameRGBA> {
    if !opts.multiplier.is_finite() || opts.multiplier <= 0.0 {
        return Err(StudioError::validation("output multiplier must be finite and > 0"));
    }
    if !opts.preview {
        let tainted = scene.background.is_some_and(|bg| bg.is_tainted())
            || scene.layers.iter().any(|l| l.is_tainted());
        if tainted {
            return Err(StudioError::Tainted);
        }
    }

    let (w, h) = target_size(scene.size, opts.multiplier);
    let mut target = OffscreenTarget::acquire(w, h, tracker)?;
    let root = Affine::scale(opts.multiplier) * scene.view;

    target.render(|ctx| {
        if let Some(c) = scene.clear {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));
        }
        if let Some(bg) = scene.background {
            draw_layer(ctx, bg, root, text)?;
        }
        for layer in &scene.layers {
            draw_layer(ctx, layer, root, text)?;
        }
        if opts.preview
            && let Some(sel) = scene.selection
        {
            draw_chrome(ctx, sel, root);
        }
        Ok(())
    })
}

fn draw_layer(
    ctx: &mut vello_cpu::RenderContext,
    layer: &Layer,
    root: Affine,
    text: &mut TextLayoutEngine,
) -> StudioResult<()> {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(root * layer.transform()));

    match &layer.kind {
        LayerKind::Image(img) => {
            let opacity = img.opacity.clamp(0.0, 1.0) as f32;
            ctx.set_paint(vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(img.image.pixmap.clone()),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            });
            if opacity < 1.0 {
                ctx.push_opacity_layer(opacity);
            }
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(img.image.width),
                f64::from(img.image.height),
            ));
            if opacity < 1.0 {
                ctx.pop_layer();
            }
            Ok(())
        }
        LayerKind::Text(style) => {
            let shaped = text.shape(
                &style.content,
                &style.font_family,
                style.font_size as f32,
                style.fill,
            )?;
            let Some(font) = shaped.font else {
                tracing::warn!(
                    family = %style.font_family,
                    content = %style.content,
                    "no font face available; text layer not painted"
                );
                return Ok(());
            };

            for line in shaped.layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };

                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));

                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
            Ok(())
        }
    }
}

/// Border and corner handles around the selected layer, in its decoration color.
fn draw_chrome(ctx: &mut vello_cpu::RenderContext, layer: &Layer, root: Affine) {
    let c = layer.decoration;
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));

    // Chrome is drawn in scaled layer space so its thickness does not follow the layer scale.
    let g = layer.geometry;
    let size = layer.scaled_size();
    let center = crate::foundation::core::Point::new(size.width / 2.0, size.height / 2.0);
    let frame = root
        * Affine::translate((g.x, g.y))
        * Affine::rotate_about(g.angle.to_radians(), center);
    ctx.set_transform(affine_to_cpu(frame));

    let (w, h, t) = (size.width, size.height, CHROME_STROKE);
    for (x0, y0, x1, y1) in [
        (0.0, 0.0, w, t),
        (0.0, h - t, w, h),
        (0.0, 0.0, t, h),
        (w - t, 0.0, w, h),
    ] {
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x0, y0, x1, y1));
    }

    let half = CHROME_HANDLE / 2.0;
    for (cx, cy) in [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)] {
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            cx - half,
            cy - half,
            cx + half,
            cy + half,
        ));
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
