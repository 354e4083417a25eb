use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions() {
    let prepared = decode_image(&png_bytes(3, 2, [100, 50, 200, 128])).unwrap();
    assert_eq!(prepared.width, 3);
    assert_eq!(prepared.height, 2);
    assert_eq!(prepared.pixmap.width(), 3);
    assert_eq!(prepared.pixmap.height(), 2);
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn premultiply_then_unpremultiply_is_close() {
    let mut px = [100u8, 50, 200, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(
        px,
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );
    unpremultiply_rgba8_in_place(&mut px);
    for (got, want) in px.iter().zip([100u8, 50, 200, 128]) {
        assert!((*got as i16 - want as i16).abs() <= 2, "{got} vs {want}");
    }
}

#[test]
fn pixmap_len_mismatch_is_an_error() {
    assert!(pixmap_from_premul_bytes(&[0u8; 7], 1, 2).is_err());
    assert!(pixmap_from_premul_bytes(&[0u8; 4], 70_000, 1).is_err());
}

#[test]
fn solid_image_has_requested_size() {
    let img = PreparedImage::solid(4, 5, [255, 0, 0, 255]).unwrap();
    assert_eq!((img.width, img.height), (4, 5));
}
