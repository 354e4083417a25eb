use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::{Rgba8, Size};
use crate::foundation::error::{StudioError, StudioResult};

/// Average glyph advance relative to font size, used when no font can shape the text.
const FALLBACK_ADVANCE_EM: f64 = 0.6;
/// Line height relative to font size.
const LINE_HEIGHT_EM: f64 = 1.16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    /// Red channel.
    pub(crate) r: u8,
    /// Green channel.
    pub(crate) g: u8,
    /// Blue channel.
    pub(crate) b: u8,
    /// Alpha channel.
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

#[derive(Clone)]
struct FontFace {
    family: String,
    bytes: Arc<Vec<u8>>,
    data: vello_cpu::peniko::FontData,
}

impl FontFace {
    fn new(family: String, bytes: Vec<u8>, index: u32) -> Self {
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.clone()),
            index,
        );
        Self {
            family,
            bytes: Arc::new(bytes),
            data,
        }
    }
}

/// Registered font faces, shared between the live surface and export workers.
///
/// Lookups try the registered faces first and then, when enabled, the fonts installed on the
/// system. Cloning is cheap; every clone refers to the same font bytes and database.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: Arc<Vec<FontFace>>,
    system: Option<Arc<fontdb::Database>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.faces.iter().map(|face| &face.family).collect::<Vec<_>>())
            .field("system_faces", &self.system_face_count())
            .finish()
    }
}

impl FontBook {
    /// Empty book: text is measured with a fixed-advance estimate and draws no glyphs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Book backed only by the fonts installed on this machine.
    pub fn system() -> Self {
        Self::empty().with_system_fallback()
    }

    /// Load every `.ttf`, `.otf` and `.ttc` file directly inside `dir`.
    ///
    /// Unreadable or unparsable files are skipped with a warning.
    pub fn load_dir(dir: impl AsRef<Path>) -> StudioResult<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("read fonts dir '{}'", dir.display()))?
        {
            let p = entry.context("read fonts dir entry")?.path();
            let is_font = p
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"));
            if is_font {
                paths.push(p);
            }
        }
        paths.sort();

        let mut fonts = Vec::with_capacity(paths.len());
        for p in paths {
            match std::fs::read(&p) {
                Ok(bytes) => fonts.push(bytes),
                Err(e) => tracing::warn!(path = %p.display(), error = %e, "skipping unreadable font"),
            }
        }
        Ok(Self::from_fonts(fonts))
    }

    /// Register in-memory font files.
    pub fn from_fonts(fonts: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let mut ctx = parley::FontContext::default();
        let mut faces = Vec::new();
        for bytes in fonts {
            let families = ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
            let Some(family) = families
                .first()
                .and_then(|(id, _)| ctx.collection.family_name(*id))
                .map(str::to_owned)
            else {
                tracing::warn!("skipping font bytes without a family name");
                continue;
            };
            faces.push(FontFace::new(family, bytes, 0));
        }
        Self {
            faces: Arc::new(faces),
            system: None,
        }
    }

    /// Fall back to the fonts installed on this machine when no registered face matches.
    pub fn with_system_fallback(self) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "system fonts loaded");
        self.with_database(db)
    }

    pub(crate) fn with_database(mut self, db: fontdb::Database) -> Self {
        self.system = Some(Arc::new(db));
        self
    }

    /// `true` when no face at all can paint text, registered or system.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.system_face_count() == 0
    }

    /// Family names of the registered faces, in registration order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().map(|f| f.family.as_str())
    }

    /// Number of faces available through the system fallback.
    pub fn system_face_count(&self) -> usize {
        self.system.as_ref().map_or(0, |db| db.len())
    }

    /// Resolve a family name.
    ///
    /// Order: registered face of that family, system face of that family, first registered
    /// face, any generic or installed system face.
    fn resolve(&self, family: &str) -> Option<FontFace> {
        if let Some(f) = self.faces.iter().find(|f| f.family.eq_ignore_ascii_case(family)) {
            return Some(f.clone());
        }
        if let Some(f) = self.system_face(&[fontdb::Family::Name(family)]) {
            return Some(f);
        }
        if let Some(f) = self.faces.first() {
            return Some(f.clone());
        }
        self.system_face(&[
            fontdb::Family::SansSerif,
            fontdb::Family::Serif,
            fontdb::Family::Monospace,
        ])
        .or_else(|| {
            let db = self.system.as_ref()?;
            let id = db.faces().next()?.id;
            self.load_system_face(db, id)
        })
    }

    fn system_face(&self, families: &[fontdb::Family<'_>]) -> Option<FontFace> {
        let db = self.system.as_ref()?;
        let id = db.query(&fontdb::Query {
            families,
            weight: fontdb::Weight::NORMAL,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        })?;
        self.load_system_face(db, id)
    }

    fn load_system_face(&self, db: &fontdb::Database, id: fontdb::ID) -> Option<FontFace> {
        let family = db.face(id)?.families.first().map(|(name, _)| name.clone())?;
        let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
        Some(FontFace::new(family, bytes, index))
    }
}

/// A shaped text block plus the font used to paint its glyph runs.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) font: Option<vello_cpu::peniko::FontData>,
    pub(crate) size: Size,
}

/// Stateful helper for building Parley text layouts from a [`FontBook`].
///
/// Each raster target owns its own engine, so export workers never share layout contexts.
pub(crate) struct TextLayoutEngine {
    book: FontBook,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    /// Requested family -> face it resolved to.
    resolved: HashMap<String, Option<FontFace>>,
    /// Families already registered in `font_ctx`.
    registered: HashSet<String>,
}

impl TextLayoutEngine {
    pub(crate) fn new(book: &FontBook) -> Self {
        let mut font_ctx = parley::FontContext::default();
        let mut registered = HashSet::new();
        for face in book.faces.iter() {
            font_ctx.collection.register_fonts(
                parley::fontique::Blob::from(face.bytes.as_ref().clone()),
                None,
            );
            registered.insert(face.family.clone());
        }
        Self {
            book: book.clone(),
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            resolved: HashMap::new(),
            registered,
        }
    }

    fn face_for(&mut self, family: &str) -> Option<FontFace> {
        if let Some(hit) = self.resolved.get(family) {
            return hit.clone();
        }
        let mut face = self.book.resolve(family);
        match face.as_mut() {
            Some(f) if !self.registered.contains(&f.family) => {
                self.registered.insert(f.family.clone());
                let families = self.font_ctx.collection.register_fonts(
                    parley::fontique::Blob::from(f.bytes.as_ref().clone()),
                    None,
                );
                // Shape with the name the layout collection knows the face by.
                if let Some(name) = families
                    .first()
                    .and_then(|(id, _)| self.font_ctx.collection.family_name(*id))
                {
                    f.family = name.to_owned();
                }
                self.registered.insert(f.family.clone());
                tracing::debug!(requested = family, family = %f.family, "system font registered");
            }
            Some(_) => {}
            None => tracing::debug!(requested = family, "no font face; metrics are estimated"),
        }
        self.resolved.insert(family.to_owned(), face.clone());
        face
    }

    /// Shape single-paragraph text without wrapping.
    pub(crate) fn shape(
        &mut self,
        text: &str,
        family: &str,
        size_px: f32,
        fill: Rgba8,
    ) -> StudioResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(StudioError::validation(
                "text size must be finite and > 0",
            ));
        }

        let face = self.face_for(family);
        let family_name = face
            .as_ref()
            .map(|f| f.family.clone())
            .unwrap_or_else(|| family.to_owned());

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::from(fill)));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        let size = measured_or_estimated(
            f64::from(layout.width()),
            f64::from(layout.height()),
            text,
            f64::from(size_px),
        );
        Ok(ShapedText {
            layout,
            font: face.map(|f| f.data),
            size,
        })
    }
}

/// Prefer shaped metrics; estimate from character count when nothing could be shaped.
pub(crate) fn measured_or_estimated(width: f64, height: f64, text: &str, size_px: f64) -> Size {
    if width > 0.0 && height > 0.0 {
        return Size::new(width, height);
    }
    let lines = text.lines().count().max(1);
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    Size::new(
        longest as f64 * size_px * FALLBACK_ADVANCE_EM,
        lines as f64 * size_px * LINE_HEIGHT_EM,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
