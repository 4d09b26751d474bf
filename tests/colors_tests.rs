//! Integration tests for colors module

use palette::Srgb;
use ws28xx_dma::colors;

fn close(a: Srgb<u8>, b: Srgb<u8>) -> bool {
    a.red.abs_diff(b.red) <= 1 && a.green.abs_diff(b.green) <= 1 && a.blue.abs_diff(b.blue) <= 1
}

#[test]
fn hsv_creates_primary_colors() {
    assert_eq!(colors::hsv(0.0, 1.0, 1.0), colors::RED);
    assert_eq!(colors::hsv(120.0, 1.0, 1.0), colors::GREEN);
    assert_eq!(colors::hsv(240.0, 1.0, 1.0), colors::BLUE);
}

#[test]
fn hsv_handles_saturation() {
    assert_eq!(colors::hsv(0.0, 1.0, 1.0), colors::RED);

    // Zero saturation (gray)
    let gray = colors::hsv(0.0, 0.0, 0.5);
    assert!(close(gray, Srgb::new(128, 128, 128)));
}

#[test]
fn hsv_handles_value() {
    let dim = colors::hsv(0.0, 1.0, 0.5);
    assert!(close(dim, Srgb::new(128, 0, 0)));

    assert_eq!(colors::hsv(0.0, 1.0, 0.0), colors::OFF);
}

#[test]
fn hue_creates_fully_saturated_colors() {
    assert_eq!(colors::hue(0.0), colors::RED);
    assert_eq!(colors::hue(180.0), Srgb::new(0, 255, 255));
    assert_eq!(colors::hue(60.0), Srgb::new(255, 255, 0));
}

#[test]
fn hue_wraps_around_360() {
    assert!(close(colors::hue(0.0), colors::hue(360.0)));
}

#[test]
fn to_u8_scales_to_eight_bits() {
    assert_eq!(colors::to_u8(Srgb::new(1.0, 1.0, 1.0)), colors::WHITE);
    assert_eq!(colors::to_u8(Srgb::new(0.0, 0.0, 0.0)), colors::OFF);
    assert!(close(colors::to_u8(Srgb::new(0.5, 0.25, 0.0)), Srgb::new(128, 64, 0)));
}

#[test]
fn to_u8_clamps_out_of_range() {
    assert_eq!(colors::to_u8(Srgb::new(1.5, -0.2, 2.0)), Srgb::new(255, 0, 255));
}

#[test]
fn helpers_feed_the_encoder() {
    let color = colors::hue(240.0);
    let symbols = ws28xx_dma::encode(color);
    assert_eq!(ws28xx_dma::decode(&symbols), Some(colors::BLUE));
}
