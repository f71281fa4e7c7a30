use super::*;

#[test]
fn fmt_num_trims_trailing_zeros() {
    assert_eq!(fmt_num(4.0), "4");
    assert_eq!(fmt_num(0.5), "0.5");
    assert_eq!(fmt_num(1.0 / 3.0), "0.333");
    assert_eq!(fmt_num(-0.0001), "0");
    assert_eq!(fmt_num(12.25), "12.25");
}

#[test]
fn secs_to_millis_rounds_and_clamps() {
    assert_eq!(secs_to_millis(2.0), 2000);
    assert_eq!(secs_to_millis(0.0015), 2);
    assert_eq!(secs_to_millis(-1.0), 0);
}

#[test]
fn colour_parses_hex_and_names() {
    assert_eq!(Color::parse("#ff3366").unwrap(), Color::Rgba([255, 51, 102, 255]));
    assert_eq!(Color::parse("#00000080").unwrap(), Color::Rgba([0, 0, 0, 128]));
    assert_eq!(Color::parse("Black").unwrap(), Color::Named("black".to_string()));
    assert!(Color::parse("#12345").is_err());
    assert!(Color::parse("red; drop").is_err());
    assert!(Color::parse("").is_err());
}

#[test]
fn colour_renders_filter_arg() {
    assert_eq!(Color::parse("#ff3366").unwrap().to_filter_arg(), "0xff3366");
    assert_eq!(
        Color::Rgba([0, 0, 0, 0]).to_filter_arg(),
        "0x000000@0"
    );
    assert_eq!(Color::parse("white").unwrap().to_filter_arg(), "white");
}

#[test]
fn colour_serde_roundtrips_through_string() {
    let c: Color = serde_json::from_str("\"#102030\"").unwrap();
    assert_eq!(c, Color::Rgba([16, 32, 48, 255]));
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"#102030\"");
    assert!(serde_json::from_str::<Color>("\"#zz0000\"").is_err());
}

#[test]
fn size_filter_arg() {
    assert_eq!(Size::new(1920, 1080).to_filter_arg(), "1920x1080");
}
