use super::*;

#[test]
fn side_parse_display_and_other() {
    assert_eq!("front".parse::<Side>().unwrap(), Side::Front);
    assert_eq!(" BACK ".parse::<Side>().unwrap(), Side::Back);
    assert!("left".parse::<Side>().is_err());
    assert_eq!(Side::Front.to_string(), "front");
    assert_eq!(Side::Front.other(), Side::Back);
    assert_eq!(Side::Back.other(), Side::Front);
}

#[test]
fn side_pair_indexing() {
    let mut p = SidePair::new(1, 2);
    assert_eq!(*p.get(Side::Front), 1);
    *p.get_mut(Side::Back) += 40;
    assert_eq!(p.back, 42);
}

#[test]
fn parses_hex_rgb_and_rgba() {
    assert_eq!(Rgba8::parse_hex("#ff0000").unwrap(), Rgba8::rgb(255, 0, 0));
    assert_eq!(Rgba8::parse_hex("53E9FF").unwrap(), Rgba8::rgb(0x53, 0xe9, 0xff));
    let c = Rgba8::parse_hex("#0000ff80").unwrap();
    assert_eq!(c.a, 128);
    assert!(Rgba8::parse_hex("#fff").is_err());
    assert!(Rgba8::parse_hex("#gg0000").is_err());
    assert_eq!(Rgba8::parse_or("nope", Rgba8::WHITE), Rgba8::WHITE);
}

#[test]
fn hex_roundtrip_and_premul() {
    assert_eq!(Rgba8::rgb(0xb6, 0x6b, 0xff).to_hex(), "#b66bff");
    let half = Rgba8 {
        r: 200,
        g: 100,
        b: 0,
        a: 128,
    };
    assert_eq!(half.to_premul(), [100, 50, 0, 128]);
}

#[test]
fn degrees_normalize_into_range() {
    assert_eq!(normalize_degrees(15.0), 15.0);
    assert_eq!(normalize_degrees(360.0), 0.0);
    assert_eq!(normalize_degrees(375.0), 15.0);
    assert_eq!(normalize_degrees(-15.0), 345.0);
    assert_eq!(normalize_degrees(f64::NAN), 0.0);
}
