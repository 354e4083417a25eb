use super::*;

#[test]
fn empty_book_estimates_metrics() {
    let book = FontBook::empty();
    assert!(book.is_empty());
    let mut engine = TextLayoutEngine::new(&book);
    let shaped = engine.shape("Hello", "Inter", 22.0, Rgba8::WHITE).unwrap();
    assert!(shaped.font.is_none());
    assert!((shaped.size.width - 5.0 * 22.0 * 0.6).abs() < 1e-9);
    assert!((shaped.size.height - 22.0 * 1.16).abs() < 1e-9);
}

#[test]
fn shape_rejects_non_positive_size() {
    let mut engine = TextLayoutEngine::new(&FontBook::empty());
    assert!(engine.shape("x", "Inter", 0.0, Rgba8::WHITE).is_err());
    assert!(engine.shape("x", "Inter", f32::NAN, Rgba8::WHITE).is_err());
}

#[test]
fn estimate_uses_longest_line() {
    let s = measured_or_estimated(0.0, 0.0, "ab\nabcd", 10.0);
    assert!((s.width - 24.0).abs() < 1e-9);
    assert!((s.height - 23.2).abs() < 1e-9);

    let s = measured_or_estimated(12.0, 8.0, "ignored", 10.0);
    assert_eq!(s, Size::new(12.0, 8.0));
}

#[test]
fn garbage_font_bytes_are_skipped() {
    let book = FontBook::from_fonts([b"definitely not a font".to_vec()]);
    assert!(book.is_empty());
    assert_eq!(book.families().count(), 0);
}

#[test]
fn load_dir_ignores_non_font_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("readme.txt"), "hi").unwrap();
    let book = FontBook::load_dir(dir.path()).unwrap();
    assert!(book.is_empty());
    assert!(FontBook::load_dir(dir.path().join("missing")).is_err());
}

const DEJAVU_MONO: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/data/fonts/DejaVuSansMono.ttf"
);

fn dejavu() -> Vec<u8> {
    std::fs::read(DEJAVU_MONO).unwrap()
}

fn glyph_count(shaped: &ShapedText) -> usize {
    shaped
        .layout
        .lines()
        .flat_map(|line| line.items())
        .map(|item| match item {
            parley::layout::PositionedLayoutItem::GlyphRun(run) => run.glyphs().count(),
            _ => 0,
        })
        .sum()
}

#[test]
fn font_file_reports_its_family() {
    let book = FontBook::from_fonts([dejavu()]);
    assert!(!book.is_empty());
    assert_eq!(book.families().collect::<Vec<_>>(), ["DejaVu Sans Mono"]);
    assert_eq!(book.system_face_count(), 0);
}

#[test]
fn load_dir_registers_bundled_font() {
    let dir = std::path::Path::new(DEJAVU_MONO).parent().unwrap();
    let book = FontBook::load_dir(dir).unwrap();
    assert_eq!(book.families().collect::<Vec<_>>(), ["DejaVu Sans Mono"]);
}

#[test]
fn registered_font_shapes_measured_glyphs() {
    let mut engine = TextLayoutEngine::new(&FontBook::from_fonts([dejavu()]));
    let shaped = engine
        .shape("Hello", "dejavu sans mono", 22.0, Rgba8::WHITE)
        .unwrap();
    assert!(shaped.font.is_some());
    assert_eq!(glyph_count(&shaped), 5);
    // Monospace advance is about 0.6 em.
    assert!(shaped.size.width > 60.0 && shaped.size.width < 72.0, "{:?}", shaped.size);
    assert!(shaped.size.height > 22.0);
}

#[test]
fn unknown_family_uses_first_registered_face() {
    let mut engine = TextLayoutEngine::new(&FontBook::from_fonts([dejavu()]));
    let shaped = engine.shape("Hi", "Space Grotesk", 22.0, Rgba8::WHITE).unwrap();
    assert!(shaped.font.is_some());
    assert_eq!(glyph_count(&shaped), 2);
}

#[test]
fn system_database_backs_an_empty_book() {
    let mut db = fontdb::Database::new();
    db.load_font_data(dejavu());
    let book = FontBook::empty().with_database(db);
    assert!(!book.is_empty());
    assert_eq!(book.families().count(), 0);
    assert_eq!(book.system_face_count(), 1);

    assert_eq!(book.resolve("DejaVu Sans Mono").unwrap().family, "DejaVu Sans Mono");
    // No generic family maps to it; the only installed face still answers.
    assert_eq!(book.resolve("Inter").unwrap().family, "DejaVu Sans Mono");

    let mut engine = TextLayoutEngine::new(&book);
    let shaped = engine.shape("Hi", "Inter", 22.0, Rgba8::WHITE).unwrap();
    assert!(shaped.font.is_some());
    assert_eq!(glyph_count(&shaped), 2);
}

#[test]
fn registered_face_wins_over_system_face() {
    let mut db = fontdb::Database::new();
    db.load_font_data(dejavu());
    let book = FontBook::from_fonts([dejavu()]).with_database(db);
    assert_eq!(book.resolve("dejavu sans mono").unwrap().family, "DejaVu Sans Mono");
    assert!(Arc::ptr_eq(
        &book.resolve("Roboto").unwrap().bytes,
        &book.faces[0].bytes
    ));
}
