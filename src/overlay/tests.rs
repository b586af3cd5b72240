use super::*;
use crate::config::OverlayConfig;
use std::time::{Duration, Instant};

fn bitmap_with(color: [u8; 4]) -> Bitmap {
    let mut bitmap = Bitmap::new(4, 4);
    bitmap.fill_rect(0, 0, 4, 4, color);
    bitmap
}

#[test]
fn test_throttler_rejects_within_interval() {
    let mut throttler = OverlayThrottler::new(Duration::from_secs(3));
    let t0 = Instant::now();
    let first = bitmap_with([255, 0, 0, 255]);

    assert!(throttler.try_update(first.clone(), t0));
    assert!(!throttler.try_update(bitmap_with([0, 255, 0, 255]), t0 + Duration::from_secs(1)));

    assert_eq!(throttler.displayed(), Some(&first));
    assert_eq!(throttler.last_applied_at(), Some(t0));
}

#[test]
fn test_throttler_applies_after_interval() {
    let mut throttler = OverlayThrottler::new(Duration::from_secs(3));
    let t0 = Instant::now();
    let second = bitmap_with([0, 255, 0, 255]);

    assert!(throttler.try_update(bitmap_with([255, 0, 0, 255]), t0));
    assert!(throttler.try_update(second.clone(), t0 + Duration::from_millis(3500)));
    assert_eq!(throttler.displayed(), Some(&second));
}

#[test]
fn test_throttler_interval_is_inclusive() {
    let mut throttler = OverlayThrottler::from_config(&OverlayConfig::default());
    let t0 = Instant::now();

    assert!(throttler.try_update(Bitmap::new(1, 1), t0));
    assert!(!throttler.is_due(t0 + Duration::from_millis(2999)));
    assert!(throttler.try_update(Bitmap::new(1, 1), t0 + Duration::from_secs(3)));
}

#[test]
fn test_throttler_rejection_does_not_reset_clock() {
    let mut throttler = OverlayThrottler::new(Duration::from_secs(3));
    let t0 = Instant::now();

    assert!(throttler.try_update(Bitmap::new(1, 1), t0));
    assert!(!throttler.try_update(Bitmap::new(1, 1), t0 + Duration::from_secs(2)));
    assert!(throttler.try_update(Bitmap::new(1, 1), t0 + Duration::from_secs(3)));
}

#[test]
fn test_indicator_flash_expires_once() {
    let mut flash = IndicatorFlash::new(Duration::from_millis(250));
    let t0 = Instant::now();

    assert!(!flash.take_expired(t0));
    flash.start(t0);
    assert!(flash.is_visible());
    assert!(!flash.take_expired(t0 + Duration::from_millis(100)));
    assert!(flash.take_expired(t0 + Duration::from_millis(260)));
    assert!(!flash.is_visible());
    assert!(!flash.take_expired(t0 + Duration::from_millis(400)));
}

#[test]
fn test_indicator_flash_restart_extends() {
    let mut flash = IndicatorFlash::new(Duration::from_millis(250));
    let t0 = Instant::now();

    flash.start(t0);
    flash.start(t0 + Duration::from_millis(200));
    assert!(!flash.take_expired(t0 + Duration::from_millis(300)));
    assert!(flash.take_expired(t0 + Duration::from_millis(450)));
}

#[test]
fn test_bitmap_rejects_wrong_size() {
    assert!(Bitmap::from_rgba(2, 2, vec![0; 15]).is_err());
    assert!(Bitmap::from_rgba(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn test_bitmap_fill_rect_clips() {
    let mut bitmap = Bitmap::new(4, 4);
    bitmap.fill_rect(2, 2, 10, 10, [1, 2, 3, 4]);

    assert_eq!(bitmap.pixel(3, 3), [1, 2, 3, 4]);
    assert_eq!(bitmap.pixel(1, 1), [0, 0, 0, 0]);
    assert_eq!(bitmap.pixel(9, 9), [0, 0, 0, 0]);
}

#[test]
fn test_frame_has_ring_and_bar() {
    let renderer = StatusRenderer::without_text(&OverlayConfig::default(), (640, 480));
    let frame = renderer.frame();

    // Bottom bar
    assert_eq!(frame.pixel(0, 479), [0, 0, 0, 100]);
    assert_eq!(frame.pixel(639, 420), [0, 0, 0, 100]);
    assert_eq!(frame.pixel(0, 419), [0, 0, 0, 0]);

    // Ring outline, hollow center
    assert_eq!(frame.pixel(320 + 50, 240), [255, 255, 255, 50]);
    assert_eq!(frame.pixel(320, 240), [0, 0, 0, 0]);
}

#[test]
fn test_indicator_is_emphasized_ring() {
    let renderer = StatusRenderer::without_text(&OverlayConfig::default(), (640, 480));
    let indicator = renderer.indicator();

    assert_eq!(indicator.pixel(320, 240 - 48), [255, 255, 255, 255]);
    assert_eq!(indicator.pixel(320, 240), [0, 0, 0, 0]);
    assert_eq!(indicator.pixel(0, 479), [0, 0, 0, 0]);
}

#[test]
fn test_status_without_font_is_blank() {
    let renderer = StatusRenderer::without_text(&OverlayConfig::default(), (64, 48));
    let status = renderer
        .status(&StatusContent {
            exposure: "627 ms".to_string(),
            free_space: "1.5 GB".to_string(),
        })
        .unwrap();

    assert_eq!(renderer.size(), (64, 48));
    assert_eq!((status.width(), status.height()), (64, 48));
    assert!(status.is_blank());
}

#[test]
fn test_missing_font_falls_back() {
    let config = OverlayConfig {
        font_path: "/nonexistent/font.ttf".to_string(),
        ..OverlayConfig::default()
    };
    let renderer = StatusRenderer::load_or_fallback(&config, (32, 32));
    assert_eq!(renderer.size(), (32, 32));
}

#[test]
fn test_overlay_stats_apply_rate() {
    let mut stats = OverlayStats::default();
    assert_eq!(stats.apply_rate(), 0.0);

    stats.record_status_applied();
    stats.record_status_throttled();
    stats.record_status_throttled();
    stats.record_status_throttled();
    assert!((stats.apply_rate() - 0.25).abs() < 1e-12);
    assert!(stats.last_applied_time.is_some());
}
