use std::io::Cursor;

use super::*;

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[tokio::test]
async fn memory_fetcher_serves_and_counts() {
    let f = MemoryImageFetcher::new()
        .with_image("https://cdn/front.png", png_bytes())
        .with_tainted_image("https://other/x.png", png_bytes());

    let ok = load_image(&f, "https://cdn/front.png").await.unwrap();
    assert_eq!((ok.image.width, ok.image.height), (2, 2));
    assert!(!ok.tainted);

    let tainted = load_image(&f, "https://other/x.png").await.unwrap();
    assert!(tainted.tainted);

    assert!(load_image(&f, "https://cdn/missing.png").await.is_err());
    assert_eq!(f.fetch_count(), 3);
}

#[tokio::test]
async fn empty_url_is_soft_error_without_fetching() {
    let f = MemoryImageFetcher::new();
    let err = load_image(&f, "  ").await.unwrap_err();
    assert!(err.is_soft());
    assert_eq!(f.fetch_count(), 0);
}

#[tokio::test]
async fn local_fetcher_reads_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("mock")).unwrap();
    std::fs::write(dir.path().join("mock/shirt.png"), png_bytes()).unwrap();

    let f = LocalImageFetcher::new(dir.path());
    let img = load_image(&f, "file://mock/shirt.png").await.unwrap();
    assert!(!img.tainted);
    assert!(f.fetch("../etc/passwd").await.is_err());
}

#[test]
fn http_fetcher_same_origin_check() {
    let f = HttpImageFetcher::new(reqwest::Client::new(), "https://api.cre8.local");
    assert!(f.same_origin(&reqwest::Url::parse("https://api.cre8.local/img/a.png").unwrap()));
    assert!(!f.same_origin(&reqwest::Url::parse("https://cdn.example.com/a.png").unwrap()));
}
