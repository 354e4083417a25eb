use super::*;

fn text_layer(x: f64, y: f64) -> Layer {
    Layer::text(
        TextStyle {
            content: "Hi".to_owned(),
            font_family: "Inter".to_owned(),
            font_size: 22.0,
            fill: Rgba8::WHITE,
        },
        Size::new(100.0, 20.0),
        Geometry::at(x, y),
        Side::Front,
    )
}

#[test]
fn rotate_normalizes_angle() {
    let mut g = Geometry::default();
    for _ in 0..25 {
        g.rotate_by(15.0);
    }
    assert!((g.angle - 15.0).abs() < 1e-9);
    g.rotate_by(-30.0);
    assert!((g.angle - 345.0).abs() < 1e-9);
}

#[test]
fn unrotated_transform_is_translate_scale() {
    let g = Geometry::at(10.0, 20.0).with_scale(2.0);
    let p = g.transform(Size::new(5.0, 5.0)) * Point::new(1.0, 1.0);
    assert!((p.x - 12.0).abs() < 1e-9);
    assert!((p.y - 22.0).abs() < 1e-9);
}

#[test]
fn rotation_is_about_the_scaled_center() {
    let mut g = Geometry::at(0.0, 0.0);
    g.rotate_by(180.0);
    let t = g.transform(Size::new(10.0, 4.0));
    let p = t * Point::new(0.0, 0.0);
    assert!((p.x - 10.0).abs() < 1e-9);
    assert!((p.y - 4.0).abs() < 1e-9);
}

#[test]
fn hit_test_respects_position() {
    let l = text_layer(50.0, 50.0);
    assert!(l.contains(Point::new(60.0, 60.0)));
    assert!(!l.contains(Point::new(10.0, 10.0)));
    assert!(!l.contains(Point::new(151.0, 60.0)));
}

#[test]
fn clone_at_origin_keeps_transform_state() {
    let mut l = text_layer(180.0, 200.0);
    l.geometry.rotate_by(15.0);
    l.geometry.scale = 1.5;
    let c = l.clone_at_origin();
    assert_eq!((c.geometry.x, c.geometry.y), (0.0, 0.0));
    assert_eq!(c.geometry.angle, l.geometry.angle);
    assert_eq!(c.scaled_size(), Size::new(150.0, 30.0));
    assert!(c.is_text());
    assert!(!c.is_tainted());
}

#[test]
fn bounds_grow_under_rotation() {
    let mut l = text_layer(0.0, 0.0);
    let flat = l.bounds();
    l.geometry.rotate_by(45.0);
    let rotated = l.bounds();
    assert!(rotated.height() > flat.height());
}
