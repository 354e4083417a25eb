//! The live drawing surface: layer arena, z-order, selection, background slot and viewport.

pub(crate) mod background;
pub(crate) mod viewport;

use std::sync::Arc;
use std::time::Duration;

use slotmap::SlotMap;

use crate::assets::fetch::{ImageFetcher, LoadedImage};
use crate::assets::fonts::{FontBook, TextLayoutEngine};
use crate::foundation::config::StudioConfig;
use crate::foundation::core::{Affine, Point, Rgba8, Side, SidePair, Size, Vec2};
use crate::foundation::error::StudioResult;
use crate::layer::model::{Geometry, ImageStyle, Layer, LayerKey, TextStyle};
use crate::render::FrameRGBA;
use crate::render::cpu::{RasterOptions, Scene, rasterize};
use crate::render::target::TargetTracker;

use self::background::{BackgroundLoader, CompletedBackground, place_background};
use self::viewport::Viewport;

pub const TEXT_ANCHOR: (f64, f64) = (180.0, 200.0);
pub const TEXT_FONT_SIZE: f64 = 22.0;
pub const TEXT_DECORATION: Rgba8 = Rgba8::rgb(0x53, 0xe9, 0xff);

/// Where and how large a new image layer lands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePlacement {
    pub left: f64,
    pub top: f64,
    /// Target rendered width; the height follows the aspect ratio.
    pub width: f64,
    pub decoration: Rgba8,
}

impl ImagePlacement {
    /// Placement of a rendered design.
    pub const DESIGN: ImagePlacement = ImagePlacement {
        left: 140.0,
        top: 120.0,
        width: 240.0,
        decoration: Rgba8::rgb(0xb6, 0x6b, 0xff),
    };
}

/// Single live drawing surface of an editor.
///
/// Layers live in an arena; `objects` holds the keys currently attached, bottom to top. The
/// background sits in its own slot and is never part of `objects`.
pub struct Surface {
    size: Size,
    initialized: bool,
    arena: SlotMap<LayerKey, Layer>,
    objects: Vec<LayerKey>,
    selection: Option<LayerKey>,
    viewport: Viewport,
    active_side: Side,
    background: Option<Layer>,
    backdrops: SidePair<Option<String>>,
    loader: BackgroundLoader,
    fetcher: Arc<dyn ImageFetcher>,
    fonts: FontBook,
    text: TextLayoutEngine,
    tracker: TargetTracker,
    clear: Rgba8,
    render_requests: u64,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("size", &self.size)
            .field("active_side", &self.active_side)
            .field("objects", &self.objects.len())
            .field("zoom", &self.viewport.zoom())
            .field("has_background", &self.background.is_some())
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Surface at the configured default size, front side active, nothing loaded.
    pub fn new(config: &StudioConfig, fetcher: Arc<dyn ImageFetcher>, fonts: FontBook) -> Self {
        let size = Size::new(
            f64::from(config.default_width),
            f64::from(config.surface_height),
        );
        Self {
            size,
            initialized: false,
            arena: SlotMap::with_key(),
            objects: Vec::new(),
            selection: None,
            viewport: Viewport::new(size),
            active_side: Side::Front,
            background: None,
            backdrops: SidePair::default(),
            loader: BackgroundLoader::default(),
            fetcher,
            text: TextLayoutEngine::new(&fonts),
            fonts,
            tracker: TargetTracker::new(),
            clear: config.clear_rgba(),
            render_requests: 0,
        }
    }

    /// Size the surface to its container. Only the first call has an effect.
    ///
    /// A zero container width keeps the configured default width.
    pub fn initialize(&mut self, container_width: u32, fixed_height: u32) -> bool {
        if self.initialized {
            tracing::debug!("surface already initialized");
            return false;
        }
        let width = if container_width == 0 {
            self.size.width
        } else {
            f64::from(container_width)
        };
        let height = if fixed_height == 0 {
            self.size.height
        } else {
            f64::from(fixed_height)
        };
        self.size = Size::new(width, height);
        self.viewport.recenter(self.size);
        self.initialized = true;
        tracing::debug!(width, height, "surface initialized");
        true
    }

    /// `true` once [`Surface::initialize`] has sized the surface.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Surface size in surface units.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Side whose layers are currently attached.
    pub fn active_side(&self) -> Side {
        self.active_side
    }

    pub(crate) fn set_active_side(&mut self, side: Side) {
        self.active_side = side;
    }

    /// Fonts used to shape text layers.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Offscreen render targets created by this surface.
    pub fn tracker(&self) -> &TargetTracker {
        &self.tracker
    }

    /// Number of redraws requested so far.
    pub fn render_requests(&self) -> u64 {
        self.render_requests
    }

    pub fn request_render(&mut self) {
        self.render_requests += 1;
    }

    // ---------------------------------------------------------------------------------------
    // Background

    /// Background image URLs per side. Blank URLs mean "no background".
    pub fn set_backdrops(&mut self, front: Option<String>, back: Option<String>) {
        let clean = |u: Option<String>| u.filter(|s| !s.trim().is_empty());
        self.backdrops = SidePair::new(clean(front), clean(back));
    }

    /// Background image URL configured for `side`.
    pub fn backdrop(&self, side: Side) -> Option<&str> {
        self.backdrops.get(side).as_deref()
    }

    /// Background layer currently shown, if loaded.
    pub fn background(&self) -> Option<&Layer> {
        self.background.as_ref()
    }

    /// `true` while a background load is in flight.
    pub fn background_pending(&self) -> bool {
        self.loader.is_pending()
    }

    /// Generation of the latest background request. Every request bumps it, even for sides
    /// without a background.
    pub fn background_generation(&self) -> u64 {
        self.loader.generation()
    }

    /// Replace the background with the active side's image, loaded in the background.
    ///
    /// The slot is emptied immediately; the new image appears once a poll picks it up.
    pub fn request_background(&mut self) -> u64 {
        self.set_background_for_side(self.active_side)
    }

    /// Start loading `side`'s background. The result is only applied while `side` is active.
    pub fn set_background_for_side(&mut self, side: Side) -> u64 {
        self.background = None;
        let source = self.backdrops.get(side).clone().unwrap_or_default();
        self.loader.request(self.fetcher.clone(), side, &source)
    }

    /// Apply a finished background load, if any, without waiting.
    pub fn poll_background(&mut self) -> bool {
        match self.loader.poll() {
            Some(done) => self.apply_background(done),
            None => false,
        }
    }

    /// Wait at most `timeout` for the pending background, then apply it.
    pub async fn settle_background(&mut self, timeout: Duration) -> bool {
        match self.loader.settle(timeout).await {
            Some(done) => self.apply_background(done),
            None => false,
        }
    }

    fn apply_background(&mut self, done: CompletedBackground) -> bool {
        if done.generation != self.loader.generation() || done.side != self.active_side {
            tracing::debug!(side = %done.side, "discarding stale background");
            return false;
        }
        match done.result {
            Ok(loaded) => {
                self.background = Some(place_background(loaded, done.source, self.size, done.side));
                self.request_render();
                true
            }
            Err(e) => {
                tracing::warn!(side = %done.side, source = %done.source, error = %e, "background load failed");
                false
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Layers

    /// Attached layers, bottom to top.
    pub fn objects(&self) -> &[LayerKey] {
        &self.objects
    }

    /// Look up a live layer, attached or cached.
    pub fn layer(&self, key: LayerKey) -> Option<&Layer> {
        self.arena.get(key)
    }

    /// Number of live layers, attached or cached.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// `true` while `key` has not been deleted.
    pub fn is_live(&self, key: LayerKey) -> bool {
        self.arena.contains_key(key)
    }

    /// Add a text layer at the default anchor and select it.
    pub fn add_text(&mut self, content: &str, font_family: &str, fill: Rgba8) -> StudioResult<LayerKey> {
        let shaped = self
            .text
            .shape(content, font_family, TEXT_FONT_SIZE as f32, fill)?;
        let layer = Layer::text(
            TextStyle {
                content: content.to_owned(),
                font_family: font_family.to_owned(),
                font_size: TEXT_FONT_SIZE,
                fill,
            },
            shaped.size,
            Geometry::at(TEXT_ANCHOR.0, TEXT_ANCHOR.1),
            self.active_side,
        )
        .with_decoration(TEXT_DECORATION);
        let key = self.insert(layer);
        tracing::debug!(?key, side = %self.active_side, "text layer added");
        Ok(key)
    }

    /// Add a loaded image scaled to the placement width and select it.
    pub fn add_image(&mut self, source: &str, loaded: LoadedImage, placement: ImagePlacement) -> LayerKey {
        let w = f64::from(loaded.image.width.max(1));
        let scale = placement.width / w;
        let layer = Layer::image(
            ImageStyle {
                source: source.to_owned(),
                opacity: 1.0,
                cross_origin: true,
                tainted: loaded.tainted,
                image: loaded.image,
            },
            Geometry::at(placement.left, placement.top).with_scale(scale),
            self.active_side,
        )
        .with_decoration(placement.decoration);
        let key = self.insert(layer);
        tracing::debug!(?key, side = %self.active_side, source, "image layer added");
        key
    }

    fn insert(&mut self, layer: Layer) -> LayerKey {
        let key = self.arena.insert(layer);
        self.objects.push(key);
        self.selection = Some(key);
        self.request_render();
        key
    }

    /// Remove every attached image layer from the surface and the arena.
    pub fn remove_images(&mut self) -> usize {
        let arena = &mut self.arena;
        let before = self.objects.len();
        self.objects.retain(|k| {
            let is_image = arena.get(*k).is_some_and(Layer::is_image);
            if is_image {
                arena.remove(*k);
            }
            !is_image
        });
        if self.selection.is_some_and(|k| !self.arena.contains_key(k)) {
            self.selection = None;
        }
        before - self.objects.len()
    }

    // ---------------------------------------------------------------------------------------
    // Selection and transforms

    pub fn selection(&self) -> Option<LayerKey> {
        self.selection
    }

    /// Select an attached layer. Keys that are not on the surface are ignored.
    pub fn select(&mut self, key: LayerKey) -> bool {
        if !self.objects.contains(&key) {
            return false;
        }
        self.selection = Some(key);
        self.request_render();
        true
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.request_render();
        }
    }

    /// Hit-test a point in view coordinates, topmost layer first.
    ///
    /// A miss clears the selection. The background is never hit.
    pub fn select_at(&mut self, view_point: Point) -> Option<LayerKey> {
        let p = self.viewport.to_surface(view_point);
        let hit = self
            .objects
            .iter()
            .rev()
            .copied()
            .find(|k| self.arena.get(*k).is_some_and(|l| l.contains(p)));
        self.selection = hit;
        self.request_render();
        hit
    }

    pub fn rotate_selection(&mut self, delta_deg: f64) -> bool {
        let Some(layer) = self.selection.and_then(|k| self.arena.get_mut(k)) else {
            return false;
        };
        layer.geometry.rotate_by(delta_deg);
        self.request_render();
        true
    }

    /// Drag the selected layer by a delta in surface units.
    pub fn move_selection(&mut self, dx: f64, dy: f64) -> bool {
        let Some(layer) = self.selection.and_then(|k| self.arena.get_mut(k)) else {
            return false;
        };
        layer.geometry.translate(Vec2::new(dx, dy));
        self.request_render();
        true
    }

    /// Remove the selected layer from the surface and the arena.
    pub fn delete_selection(&mut self) -> bool {
        let Some(key) = self.selection.take() else {
            return false;
        };
        self.objects.retain(|k| *k != key);
        self.arena.remove(key);
        tracing::debug!(?key, "layer deleted");
        self.request_render();
        true
    }

    // ---------------------------------------------------------------------------------------
    // View

    /// Current zoom factor.
    pub fn zoom(&self) -> f64 {
        self.viewport.zoom()
    }

    pub fn view_transform(&self) -> Affine {
        self.viewport.transform()
    }

    /// Zoom about the surface center. Returns the clamped factor.
    pub fn zoom_to_center(&mut self, factor: f64) -> f64 {
        let z = self.viewport.zoom_to_center(factor);
        self.request_render();
        z
    }

    /// Drop every attached layer and the background, then request the active side's
    /// background again. Layers cached for the other side are not touched.
    pub fn reset_view(&mut self) {
        for key in self.objects.drain(..) {
            self.arena.remove(key);
        }
        self.selection = None;
        self.request_background();
        self.request_render();
        tracing::debug!(side = %self.active_side, "view reset");
    }

    // ---------------------------------------------------------------------------------------
    // Relocation

    /// Detach every attached layer, returning their keys in z-order. Layers stay in the arena.
    pub(crate) fn detach_all(&mut self) -> Vec<LayerKey> {
        self.selection = None;
        std::mem::take(&mut self.objects)
    }

    /// Attach keys on top of the current stack, assigning them to the active side.
    pub(crate) fn attach(&mut self, keys: Vec<LayerKey>) {
        for key in keys {
            let Some(layer) = self.arena.get_mut(key) else {
                tracing::warn!(?key, "skipping attach of a deleted layer");
                continue;
            };
            if self.objects.contains(&key) {
                continue;
            }
            layer.side = self.active_side;
            self.objects.push(key);
        }
    }

    // ---------------------------------------------------------------------------------------
    // Raster

    fn raster(&mut self, opts: RasterOptions) -> StudioResult<FrameRGBA> {
        let Self {
            size,
            clear,
            background,
            arena,
            objects,
            viewport,
            selection,
            text,
            tracker,
            ..
        } = self;
        let scene = Scene {
            size: *size,
            clear: Some(*clear),
            background: background.as_ref(),
            layers: objects.iter().filter_map(|k| arena.get(*k)).collect(),
            view: viewport.transform(),
            selection: if opts.preview {
                (*selection).and_then(|k| arena.get(k))
            } else {
                None
            },
        };
        rasterize(&scene, opts, text, tracker)
    }

    /// Composite snapshot of the surface at `multiplier`.
    ///
    /// Fails with `StudioError::Tainted` when a drawn image lacks cross-origin permission.
    pub fn rasterize(&mut self, multiplier: f64) -> StudioResult<FrameRGBA> {
        self.raster(RasterOptions {
            multiplier,
            preview: false,
        })
    }

    /// Interactive view at 1x with selection chrome.
    pub fn render_preview(&mut self) -> StudioResult<FrameRGBA> {
        self.raster(RasterOptions {
            multiplier: 1.0,
            preview: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/surface.rs"]
mod tests;
