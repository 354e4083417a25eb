use std::time::Duration;

use rayon::prelude::*;

use crate::assets::fonts::{FontBook, TextLayoutEngine};
use crate::foundation::core::{Affine, Side, Size};
use crate::foundation::error::StudioResult;
use crate::layer::model::Layer;
use crate::render::cpu::{RasterOptions, Scene, rasterize};
use crate::render::target::TargetTracker;
use crate::surface::Surface;
use crate::view::side_manager::SideManager;

/// Which layers an export batch picks up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportCategory {
    Text,
    /// Every non-text layer.
    Design,
}

impl ExportCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Design => "design",
        }
    }

    pub fn matches(self, layer: &Layer) -> bool {
        match self {
            Self::Text => layer.is_text(),
            Self::Design => !layer.is_text(),
        }
    }
}

/// A produced PNG file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    pub const MIME: &'static str = "image/png";
}

/// Shared inputs of every per-layer export.
#[derive(Clone, Debug)]
pub struct ExportContext {
    /// File-name prefix, see [`identity_slug`](crate::identity_slug).
    pub slug: String,
    pub fonts: FontBook,
    pub tracker: TargetTracker,
    /// Output pixels per surface unit.
    pub multiplier: f64,
}

/// Per-layer exports of both sides, one list per side and category.
#[derive(Clone, Debug, Default)]
pub struct ExportBatches {
    pub front_text: Vec<ExportedFile>,
    pub front_design: Vec<ExportedFile>,
    pub back_text: Vec<ExportedFile>,
    pub back_design: Vec<ExportedFile>,
}

impl ExportBatches {
    pub fn text_files(&self) -> impl Iterator<Item = &ExportedFile> {
        self.front_text.iter().chain(&self.back_text)
    }

    pub fn design_files(&self) -> impl Iterator<Item = &ExportedFile> {
        self.front_design.iter().chain(&self.back_design)
    }

    pub fn len(&self) -> usize {
        self.front_text.len() + self.front_design.len() + self.back_text.len() + self.back_design.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `<slug>-<category>-<side>-<n>.png`, `n` counting from 1.
pub fn layer_file_name(slug: &str, category: ExportCategory, side: Side, index: usize) -> String {
    format!("{slug}-{}-{side}-{}.png", category.as_str(), index + 1)
}

/// `<slug>-<side>.png`.
pub fn side_file_name(slug: &str, side: Side) -> String {
    format!("{slug}-{side}.png")
}

/// Render every layer of `category` into its own PNG.
///
/// Each layer is drawn alone at the origin into a transparent target sized to its scaled
/// bounds. Layers render in parallel; a layer that fails is logged and left out while the
/// numbering of the others is kept.
#[tracing::instrument(skip(layers, ctx), fields(layers = layers.len()))]
pub fn export_layers(
    layers: &[Layer],
    side: Side,
    category: ExportCategory,
    ctx: &ExportContext,
) -> Vec<ExportedFile> {
    let targets: Vec<&Layer> = layers.iter().filter(|l| category.matches(l)).collect();

    let rendered: Vec<Option<ExportedFile>> = targets
        .par_iter()
        .enumerate()
        .map_init(
            || TextLayoutEngine::new(&ctx.fonts),
            |engine, (i, layer)| {
                let name = layer_file_name(&ctx.slug, category, side, i);
                match render_isolated(layer, engine, ctx) {
                    Ok(bytes) => Some(ExportedFile { name, bytes }),
                    Err(e) => {
                        tracing::warn!(file = %name, error = %e, "layer export failed");
                        None
                    }
                }
            },
        )
        .collect();

    rendered.into_iter().flatten().collect()
}

fn render_isolated(
    layer: &Layer,
    engine: &mut TextLayoutEngine,
    ctx: &ExportContext,
) -> StudioResult<Vec<u8>> {
    let placed = layer.clone_at_origin();
    let scaled = placed.scaled_size();
    let bounds = Size::new(scaled.width.ceil().max(1.0), scaled.height.ceil().max(1.0));
    let scene = Scene {
        size: bounds,
        clear: None,
        background: None,
        layers: vec![&placed],
        view: Affine::IDENTITY,
        selection: None,
    };
    let opts = RasterOptions {
        multiplier: ctx.multiplier,
        preview: false,
    };
    rasterize(&scene, opts, engine, &ctx.tracker)?.to_png()
}

/// Run the four per-layer batches (front/back × text/design) concurrently.
#[tracing::instrument(skip_all, fields(front = front.len(), back = back.len()))]
pub fn export_batches(front: &[Layer], back: &[Layer], ctx: &ExportContext) -> ExportBatches {
    let ((front_text, front_design), (back_text, back_design)) = rayon::join(
        || {
            rayon::join(
                || export_layers(front, Side::Front, ExportCategory::Text, ctx),
                || export_layers(front, Side::Front, ExportCategory::Design, ctx),
            )
        },
        || {
            rayon::join(
                || export_layers(back, Side::Back, ExportCategory::Text, ctx),
                || export_layers(back, Side::Back, ExportCategory::Design, ctx),
            )
        },
    );
    ExportBatches {
        front_text,
        front_design,
        back_text,
        back_design,
    }
}

/// Composite snapshot of one whole side, as shown on the surface.
///
/// Switches the surface to `side` when needed, gives the background up to `timeout` to
/// arrive, yields one scheduler tick, rasterizes at 1x and switches back to the original
/// side on every path. Returns `None` when the snapshot cannot be produced.
#[tracing::instrument(skip(surface, sides, slug))]
pub async fn capture_full_side(
    surface: &mut Surface,
    sides: &mut SideManager,
    side: Side,
    slug: &str,
    timeout: Duration,
) -> Option<ExportedFile> {
    let original = surface.active_side();
    if side != original {
        sides.switch_side(surface, side);
    }
    if surface.background_pending() {
        surface.settle_background(timeout).await;
    }
    tokio::task::yield_now().await;
    surface.poll_background();

    let result = surface.rasterize(1.0).and_then(|frame| frame.to_png());

    if side != original {
        sides.switch_side(surface, original);
    }

    match result {
        Ok(bytes) => Some(ExportedFile {
            name: side_file_name(slug, side),
            bytes,
        }),
        Err(e) if e.is_soft() => {
            tracing::warn!(%side, error = %e, "full-side capture skipped");
            None
        }
        Err(e) => {
            tracing::error!(%side, error = %e, "full-side capture failed");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
