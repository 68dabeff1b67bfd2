//! Transport control tests: seek, skip, rate, volume, shadowing delay

mod helpers;

use std::time::Duration;

use esl_common::EslEvent;
use esl_player::{ControllerConfig, MediaPlayer, SegmentController};

use helpers::{assert_close, standard_segments, wait_ms, Fixture};

fn volume_events(events: &[EslEvent]) -> Vec<(f64, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            EslEvent::VolumeChanged { volume, muted, .. } => Some((*volume, *muted)),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_seek_clamps_to_media() {
    let fx = Fixture::standard().await;

    fx.controller.seek(7.25).await;
    assert_close(fx.position(), 7.25, 1e-9);

    fx.controller.seek(-3.0).await;
    assert_close(fx.position(), 0.0, 1e-9);

    fx.controller.seek(500.0).await;
    assert_close(fx.position(), 20.0, 1e-9);

    fx.controller.seek(f64::NAN).await;
    assert_close(fx.position(), 20.0, 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_skip_is_relative() {
    let fx = Fixture::standard().await;
    fx.controller.seek(5.0).await;

    fx.controller.skip(2.5).await;
    assert_close(fx.position(), 7.5, 1e-9);

    fx.controller.skip(-10.0).await;
    assert_close(fx.position(), 0.0, 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_seek_drives_segment_inference() {
    let fx = Fixture::standard().await;
    fx.controller.seek(10.5).await;
    wait_ms(400).await;
    assert_eq!(fx.controller.current_segment().await, Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_playback_rate_is_clamped() {
    let mut fx = Fixture::standard().await;

    fx.controller.set_playback_rate(10.0).await;
    assert_eq!(fx.player.playback_rate(), 4.0);
    assert_eq!(fx.controller.snapshot().playback_rate, 4.0);

    fx.controller.set_playback_rate(0.1).await;
    assert_eq!(fx.player.playback_rate(), 0.25);

    // Unchanged rate publishes nothing
    fx.drain();
    fx.controller.set_playback_rate(0.2).await;
    assert!(fx.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_playback_rate_scales_segment_playback() {
    let fx = Fixture::standard().await;
    fx.controller.set_playback_rate(2.0).await;
    fx.controller.play_segment(0).await;

    // 2.45 s of media at double speed
    wait_ms(1000).await;
    assert!(!fx.player_paused());
    wait_ms(400).await;
    assert!(fx.player_paused());
    assert_close(fx.position(), 3.3, 1e-6);
}

#[tokio::test(start_paused = true)]
async fn test_volume_and_mute() {
    let mut fx = Fixture::standard().await;

    fx.controller.set_volume(0.6).await;
    fx.controller.toggle_mute().await;
    assert_eq!(fx.player.volume(), 0.0);
    assert!(fx.controller.snapshot().muted);

    fx.controller.toggle_mute().await;
    assert_eq!(fx.player.volume(), 0.6);
    assert!(!fx.controller.snapshot().muted);

    fx.controller.set_volume(3.0).await;
    assert_eq!(fx.player.volume(), 1.0);

    assert_eq!(
        volume_events(&fx.drain()),
        vec![(0.6, false), (0.0, true), (0.6, false), (1.0, false)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_set_volume_while_muted_unmutes() {
    let fx = Fixture::standard().await;
    fx.controller.toggle_mute().await;
    fx.controller.set_volume(0.3).await;

    assert!(!fx.controller.snapshot().muted);
    assert_eq!(fx.player.volume(), 0.3);
}

#[tokio::test(start_paused = true)]
async fn test_unmute_from_zero_uses_fallback() {
    let fx = Fixture::standard().await;
    fx.controller.set_volume(0.0).await;

    fx.controller.toggle_mute().await;
    assert!(fx.controller.snapshot().muted);
    fx.controller.toggle_mute().await;

    assert!(!fx.controller.snapshot().muted);
    assert_eq!(fx.player.volume(), 0.5);
}

#[tokio::test(start_paused = true)]
async fn test_shadowing_delay_steps_and_clamps() {
    let mut fx = Fixture::standard().await;
    assert_eq!(fx.controller.shadowing_delay().await, Duration::from_secs(2));

    fx.controller.adjust_shadowing_delay(1).await;
    assert_eq!(
        fx.controller.shadowing_delay().await,
        Duration::from_millis(2500)
    );
    assert_eq!(fx.controller.snapshot().shadowing_delay_secs, 2.5);

    fx.controller.adjust_shadowing_delay(100).await;
    assert_eq!(fx.controller.shadowing_delay().await, Duration::from_secs(10));

    fx.controller.adjust_shadowing_delay(-100).await;
    assert_eq!(
        fx.controller.shadowing_delay().await,
        Duration::from_millis(500)
    );

    fx.controller.set_shadowing_delay(Duration::from_secs(60)).await;
    assert_eq!(fx.controller.shadowing_delay().await, Duration::from_secs(10));

    let delays: Vec<u64> = fx
        .drain()
        .iter()
        .filter_map(|e| match e {
            EslEvent::ShadowingDelayChanged { delay_ms, .. } => Some(*delay_ms),
            _ => None,
        })
        .collect();
    assert_eq!(delays, vec![2500, 10_000, 500, 10_000]);
}

#[tokio::test(start_paused = true)]
async fn test_shadowing_delay_needs_no_player() {
    let controller = SegmentController::new(standard_segments(), ControllerConfig::default());
    controller.set_shadowing_delay(Duration::from_secs(4)).await;
    assert_eq!(controller.shadowing_delay().await, Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_transport_without_player_is_noop() {
    let controller = SegmentController::new(standard_segments(), ControllerConfig::default());
    let mut events = controller.subscribe();

    controller.seek(5.0).await;
    controller.skip(1.0).await;
    controller.set_playback_rate(2.0).await;
    controller.set_volume(0.2).await;
    controller.toggle_mute().await;
    controller.toggle_play_pause().await;

    assert!(helpers::drain(&mut events).is_empty());
    let snapshot = controller.snapshot();
    assert!(!snapshot.muted);
    assert!(!snapshot.is_playing);
}
