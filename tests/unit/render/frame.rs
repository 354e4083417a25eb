use super::*;

#[test]
fn pixel_unpremultiplies() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![255, 0, 0, 255, 64, 0, 0, 128],
        premultiplied: true,
    };
    assert_eq!(frame.pixel(0, 0), Some([255, 0, 0, 255]));
    let px = frame.pixel(1, 0).unwrap();
    assert_eq!(px[3], 128);
    assert!((i32::from(px[0]) - 128).abs() <= 1);
    assert_eq!(frame.pixel(2, 0), None);
}

#[test]
fn to_png_decodes_back_to_same_size() {
    let frame = FrameRGBA {
        width: 4,
        height: 3,
        data: vec![10; 4 * 3 * 4],
        premultiplied: false,
    };
    let png = frame.to_png().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    let img = image::load_from_memory(&png).unwrap();
    assert_eq!((img.width(), img.height()), (4, 3));
}

#[test]
fn to_png_rejects_short_buffer() {
    let frame = FrameRGBA {
        width: 4,
        height: 4,
        data: vec![0; 8],
        premultiplied: true,
    };
    assert!(frame.to_png().is_err());
}
