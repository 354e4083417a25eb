use crate::foundation::core::{Affine, Point, Size, Vec2};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;

/// View transform of the live surface: a uniform zoom about the surface center.
///
/// Layer geometry is never touched by zooming; only the mapping from surface units to view
/// pixels changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    zoom: f64,
    center: Point,
}

impl Viewport {
    pub fn new(size: Size) -> Self {
        Self {
            zoom: 1.0,
            center: Point::new(size.width / 2.0, size.height / 2.0),
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`. Returns the applied value.
    pub fn zoom_to_center(&mut self, factor: f64) -> f64 {
        self.zoom = clamp_zoom(factor);
        self.zoom
    }

    pub(crate) fn recenter(&mut self, size: Size) {
        self.center = Point::new(size.width / 2.0, size.height / 2.0);
    }

    /// Surface-to-view transform.
    pub fn transform(&self) -> Affine {
        let c = self.center.to_vec2();
        Affine::translate(c) * Affine::scale(self.zoom) * Affine::translate(-c)
    }

    /// Map a point in view coordinates back to surface units.
    pub fn to_surface(&self, view_point: Point) -> Point {
        let c = self.center.to_vec2();
        let p = view_point.to_vec2() - c;
        (c + Vec2::new(p.x / self.zoom, p.y / self.zoom)).to_point()
    }
}

pub fn clamp_zoom(factor: f64) -> f64 {
    if factor.is_nan() {
        return 1.0;
    }
    factor.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[cfg(test)]
#[path = "../../tests/unit/surface/viewport.rs"]
mod tests;
