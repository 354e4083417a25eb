use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::fonts::FontBook;
use crate::foundation::core::Side;
use crate::layer::model::{Geometry, ImageStyle, TextStyle};

fn image_layer(x: f64, y: f64, rgba: [u8; 4], tainted: bool) -> Layer {
    Layer::image(
        ImageStyle {
            source: "mem://px".to_owned(),
            opacity: 1.0,
            cross_origin: true,
            tainted,
            image: PreparedImage::solid(10, 10, rgba).unwrap(),
        },
        Geometry::at(x, y),
        Side::Front,
    )
}

fn scene<'a>(layers: Vec<&'a Layer>) -> Scene<'a> {
    Scene {
        size: Size::new(40.0, 20.0),
        clear: None,
        background: None,
        layers,
        view: Affine::IDENTITY,
        selection: None,
    }
}

#[test]
fn target_size_rounds_up_with_minimum() {
    assert_eq!(target_size(Size::new(10.2, 3.0), 2.0), (21, 6));
    assert_eq!(target_size(Size::new(0.0, 0.1), 2.0), (1, 1));
}

#[test]
fn clear_color_fills_target() {
    let mut engine = TextLayoutEngine::new(&FontBook::empty());
    let tracker = TargetTracker::new();
    let mut s = scene(vec![]);
    s.clear = Some(Rgba8::rgb(0x0b, 0x0d, 0x17));
    let frame = rasterize(&s, RasterOptions::default(), &mut engine, &tracker).unwrap();
    assert_eq!((frame.width, frame.height), (40, 20));
    let px = frame.pixel(5, 5).unwrap();
    assert_eq!(px[3], 255);
    for (got, want) in px.iter().zip([0x0b, 0x0d, 0x17]) {
        assert!((i32::from(*got) - want).abs() <= 1);
    }
    assert_eq!(tracker.live(), 0);
}

#[test]
fn multiplier_scales_output_and_content() {
    let mut engine = TextLayoutEngine::new(&FontBook::empty());
    let tracker = TargetTracker::new();
    let red = image_layer(0.0, 0.0, [255, 0, 0, 255], false);
    let s = scene(vec![&red]);
    let opts = RasterOptions {
        multiplier: 2.0,
        preview: false,
    };
    let frame = rasterize(&s, opts, &mut engine, &tracker).unwrap();
    assert_eq!((frame.width, frame.height), (80, 40));
    assert_eq!(frame.pixel(15, 15), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(30, 30).map(|p| p[3]), Some(0));
}

#[test]
fn later_layers_draw_on_top() {
    let mut engine = TextLayoutEngine::new(&FontBook::empty());
    let tracker = TargetTracker::new();
    let red = image_layer(0.0, 0.0, [255, 0, 0, 255], false);
    let blue = image_layer(5.0, 0.0, [0, 0, 255, 255], false);
    let s = scene(vec![&red, &blue]);
    let frame = rasterize(&s, RasterOptions::default(), &mut engine, &tracker).unwrap();
    assert_eq!(frame.pixel(2, 5), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(7, 5), Some([0, 0, 255, 255]));
}

#[test]
fn tainted_layer_refuses_export_but_not_preview() {
    let mut engine = TextLayoutEngine::new(&FontBook::empty());
    let tracker = TargetTracker::new();
    let foreign = image_layer(0.0, 0.0, [0, 255, 0, 255], true);
    let s = scene(vec![&foreign]);

    let err = rasterize(&s, RasterOptions::default(), &mut engine, &tracker).unwrap_err();
    assert!(matches!(err, StudioError::Tainted));

    let preview = RasterOptions {
        multiplier: 1.0,
        preview: true,
    };
    assert!(rasterize(&s, preview, &mut engine, &tracker).is_ok());
    assert_eq!(tracker.live(), 0);
}

#[test]
fn tainted_background_refuses_export() {
    let mut engine = TextLayoutEngine::new(&FontBook::empty());
    let tracker = TargetTracker::new();
    let bg = image_layer(0.0, 0.0, [0, 255, 0, 255], true);
    let mut s = scene(vec![]);
    s.background = Some(&bg);
    assert!(rasterize(&s, RasterOptions::default(), &mut engine, &tracker).is_err());
}

#[test]
fn selection_chrome_only_in_preview() {
    let mut engine = TextLayoutEngine::new(&FontBook::empty());
    let tracker = TargetTracker::new();
    let text = Layer::text(
        TextStyle {
            content: "Hi".to_owned(),
            font_family: "Inter".to_owned(),
            font_size: 10.0,
            fill: Rgba8::WHITE,
        },
        Size::new(20.0, 10.0),
        Geometry::at(10.0, 5.0),
        Side::Front,
    )
    .with_decoration(Rgba8::rgb(0x53, 0xe9, 0xff));
    let mut s = scene(vec![&text]);
    s.selection = Some(&text);

    let plain = rasterize(&s, RasterOptions::default(), &mut engine, &tracker).unwrap();
    assert_eq!(plain.pixel(10, 5).map(|p| p[3]), Some(0));

    let preview = RasterOptions {
        multiplier: 1.0,
        preview: true,
    };
    let framed = rasterize(&s, preview, &mut engine, &tracker).unwrap();
    let px = framed.pixel(10, 5).unwrap();
    assert_eq!(px[3], 255);
    assert!((i32::from(px[1]) - 0xe9).abs() <= 1);
}

#[test]
fn invalid_multiplier_is_rejected() {
    let mut engine = TextLayoutEngine::new(&FontBook::empty());
    let tracker = TargetTracker::new();
    let opts = RasterOptions {
        multiplier: 0.0,
        preview: false,
    };
    assert!(rasterize(&scene(vec![]), opts, &mut engine, &tracker).is_err());
    assert_eq!(tracker.acquired(), 0);
}

fn text_layer(fill: Rgba8) -> Layer {
    Layer::text(
        TextStyle {
            content: "HH".to_owned(),
            font_family: "DejaVu Sans Mono".to_owned(),
            font_size: 16.0,
            fill,
        },
        Size::new(20.0, 19.0),
        Geometry::at(2.0, 0.0),
        Side::Front,
    )
}

fn inked(frame: &FrameRGBA) -> usize {
    (0..frame.height)
        .flat_map(|y| (0..frame.width).map(move |x| (x, y)))
        .filter(|&(x, y)| frame.pixel(x, y).is_some_and(|px| px[3] > 0))
        .count()
}

#[test]
fn text_layer_paints_glyphs_with_a_font() {
    let bytes = std::fs::read(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/fonts/DejaVuSansMono.ttf"
    ))
    .unwrap();
    let tracker = TargetTracker::new();
    let layer = text_layer(Rgba8::rgb(255, 0, 0));

    let mut engine = TextLayoutEngine::new(&FontBook::from_fonts([bytes]));
    let frame = rasterize(&scene(vec![&layer]), RasterOptions::default(), &mut engine, &tracker).unwrap();
    assert!(inked(&frame) > 20, "only {} inked pixels", inked(&frame));
    let reddest = (0..frame.height)
        .flat_map(|y| (0..frame.width).map(move |x| (x, y)))
        .filter_map(|(x, y)| frame.pixel(x, y))
        .max_by_key(|px| px[3])
        .unwrap();
    assert!(reddest[0] > 200 && reddest[1] < 40, "{reddest:?}");

    let mut bare = TextLayoutEngine::new(&FontBook::empty());
    let frame = rasterize(&scene(vec![&layer]), RasterOptions::default(), &mut bare, &tracker).unwrap();
    assert_eq!(inked(&frame), 0);
}
