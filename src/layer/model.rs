use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, Point, Rect, Rgba8, Side, Size, Vec2, normalize_degrees};

slotmap::new_key_type! {
    /// Stable identity of a layer inside a surface's arena.
    ///
    /// Keys survive side switches: relocating a layer moves its key, never the layer value.
    pub struct LayerKey;
}

/// Placement of a layer: top-left position, uniform scale, rotation about the scaled center.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    /// Left edge in surface units.
    pub x: f64,
    /// Top edge in surface units.
    pub y: f64,
    /// Uniform scale applied to the intrinsic size.
    pub scale: f64,
    /// Rotation in degrees, kept in `[0, 360)`.
    pub angle: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            angle: 0.0,
        }
    }
}

impl Geometry {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn rotate_by(&mut self, delta_deg: f64) {
        self.angle = normalize_degrees(self.angle + delta_deg);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Local-to-surface transform for content laid out in `[0, intrinsic]`.
    pub fn transform(&self, intrinsic: Size) -> Affine {
        let scaled = self.scaled(intrinsic);
        let center = Point::new(scaled.width / 2.0, scaled.height / 2.0);
        Affine::translate(Vec2::new(self.x, self.y))
            * Affine::rotate_about(self.angle.to_radians(), center)
            * Affine::scale(self.scale)
    }

    pub fn scaled(&self, intrinsic: Size) -> Size {
        Size::new(intrinsic.width * self.scale, intrinsic.height * self.scale)
    }
}

/// Text content and paint.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub fill: Rgba8,
}

/// Image source and paint.
#[derive(Clone, Debug)]
pub struct ImageStyle {
    /// URL or path the pixels were loaded from.
    pub source: String,
    pub opacity: f64,
    /// The image was requested with anonymous cross-origin mode.
    pub cross_origin: bool,
    /// Pixels arrived without CORS permission; drawing them taints exports.
    pub tainted: bool,
    pub image: PreparedImage,
}

/// What a layer draws.
#[derive(Clone, Debug)]
pub enum LayerKind {
    Image(ImageStyle),
    Text(TextStyle),
}

/// A user-placed visual element.
#[derive(Clone, Debug)]
pub struct Layer {
    pub kind: LayerKind,
    pub geometry: Geometry,
    /// Face the layer belongs to.
    pub side: Side,
    /// Border and corner color of the selection chrome.
    pub decoration: Rgba8,
    /// Unscaled content size (image pixels, or shaped text extent).
    pub intrinsic: Size,
}

impl Layer {
    pub fn text(style: TextStyle, intrinsic: Size, geometry: Geometry, side: Side) -> Self {
        Self {
            kind: LayerKind::Text(style),
            geometry,
            side,
            decoration: Rgba8::WHITE,
            intrinsic,
        }
    }

    pub fn image(style: ImageStyle, geometry: Geometry, side: Side) -> Self {
        let intrinsic = Size::new(f64::from(style.image.width), f64::from(style.image.height));
        Self {
            kind: LayerKind::Image(style),
            geometry,
            side,
            decoration: Rgba8::WHITE,
            intrinsic,
        }
    }

    pub fn with_decoration(mut self, color: Rgba8) -> Self {
        self.decoration = color;
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, LayerKind::Text(_))
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, LayerKind::Image(_))
    }

    /// `true` when drawing this layer taints the target.
    pub fn is_tainted(&self) -> bool {
        match &self.kind {
            LayerKind::Image(img) => img.tainted,
            LayerKind::Text(_) => false,
        }
    }

    /// Rendered (scaled, unrotated) size.
    pub fn scaled_size(&self) -> Size {
        self.geometry.scaled(self.intrinsic)
    }

    pub fn transform(&self) -> Affine {
        self.geometry.transform(self.intrinsic)
    }

    /// Axis-aligned bounds of the rotated box in surface units.
    pub fn bounds(&self) -> Rect {
        self.transform()
            .transform_rect_bbox(Rect::from_origin_size(Point::ORIGIN, self.intrinsic))
    }

    /// Hit test against the rotated box.
    pub fn contains(&self, p: Point) -> bool {
        let local = self.transform().inverse() * p;
        Rect::from_origin_size(Point::ORIGIN, self.intrinsic).contains(local)
    }

    /// Copy of this layer positioned at the origin, used for isolated exports.
    pub fn clone_at_origin(&self) -> Self {
        let mut out = self.clone();
        out.geometry.x = 0.0;
        out.geometry.y = 0.0;
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/model.rs"]
mod tests;
