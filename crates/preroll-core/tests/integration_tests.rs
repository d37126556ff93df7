//! Integration tests for Preroll Core

use preroll_core::{
    AdConfig, AdController, AdEvent, AttemptOutcome, AudioIndicator, Layer, Lifecycle,
    MediaElement, MediaError, PlayPrompt, PlaybackPhase, ScriptedMedia, Strategy,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio_test::{assert_err, assert_ok};

/// Let spawned tasks observe the current (paused) time
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

async fn advance_secs(secs: u64) {
    time::advance(Duration::from_secs(secs)).await;
    settle().await;
}

fn controller_with(media: Arc<ScriptedMedia>) -> (Arc<AdController>, Arc<AtomicUsize>) {
    let closes = Arc::new(AtomicUsize::new(0));
    let counter = closes.clone();
    let controller = AdController::new(AdConfig::default(), media, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    (Arc::new(controller), closes)
}

// =============================================================================
// Mandatory-View Gate
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_tracks_elapsed_seconds() {
    let (controller, _) = controller_with(Arc::new(ScriptedMedia::new()));
    controller.mount().unwrap();
    settle().await;

    for second in 0..15u32 {
        let p = controller.presentation();
        assert!(!controller.gate().is_open(), "opened early at {}s", second);
        assert!(!p.skip_affordance);
        assert_eq!(p.countdown.map(|c| c.remaining_seconds), Some(15 - second));

        // Mid-second still shows the same value
        time::advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(
            controller.presentation().countdown.map(|c| c.remaining_seconds),
            Some(15 - second)
        );
        time::advance(Duration::from_millis(500)).await;
        settle().await;
    }

    let p = controller.presentation();
    assert!(controller.gate().is_open());
    assert!(p.skip_affordance);
    assert!(p.countdown.is_none());

    // Stays open
    advance_secs(60).await;
    assert!(controller.gate().is_open());
    assert_eq!(controller.gate().elapsed_seconds(), 15);
}

#[tokio::test(start_paused = true)]
async fn test_skip_and_countdown_exclusive_over_time() {
    let (controller, _) = controller_with(Arc::new(ScriptedMedia::new()));
    controller.mount().unwrap();

    for _ in 0..20 {
        let p = controller.presentation();
        assert_ne!(p.skip_affordance, p.countdown.is_some());
        advance_secs(1).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_skip_before_gate_does_not_close() {
    let (controller, closes) = controller_with(Arc::new(ScriptedMedia::new()));
    controller.mount().unwrap();
    advance_secs(14).await;

    let err = assert_err!(controller.skip());
    assert!(err.is_recoverable());
    assert_eq!(err.to_string(), "Skip not permitted yet: 1s of mandatory view remaining");
    assert_eq!(closes.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_full_view_then_skip() {
    let (controller, closes) = controller_with(Arc::new(ScriptedMedia::new()));
    controller.mount().unwrap();

    advance_secs(15).await;

    let p = controller.presentation();
    assert!(controller.gate().is_open());
    assert!(p.countdown.is_none());
    assert!(p.skip_affordance);

    assert_ok!(controller.skip());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_skip_closes_each_time() {
    let (controller, closes) = controller_with(Arc::new(ScriptedMedia::new()));
    controller.mount().unwrap();
    advance_secs(15).await;

    assert_ok!(controller.skip());
    assert_ok!(controller.skip());
    assert_eq!(closes.load(Ordering::SeqCst), 2);
    assert!(controller.presentation().skip_affordance);
}

#[tokio::test(start_paused = true)]
async fn test_gate_runs_without_playback() {
    let media = Arc::new(ScriptedMedia::new().fallback_play(Err(MediaError::NotAllowed)));
    let (controller, closes) = controller_with(media);
    controller.mount().unwrap();

    advance_secs(15).await;
    assert_eq!(controller.playback().phase(), PlaybackPhase::NotStarted);
    assert_ok!(controller.skip());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_custom_view_length() {
    let config = AdConfig::from_json_str(r#"{ "mandatory_view_seconds": 5 }"#).unwrap();
    let controller =
        AdController::new(config, Arc::new(ScriptedMedia::new()), || {}).unwrap();
    controller.mount().unwrap();

    advance_secs(4).await;
    assert!(!controller.gate().is_open());
    advance_secs(1).await;
    assert!(controller.gate().is_open());
}

// =============================================================================
// Playback Attempts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_autoplay_with_sound() {
    let media = Arc::new(ScriptedMedia::new());
    let (controller, _) = controller_with(media.clone());
    controller.mount().unwrap();
    settle().await;

    let playback = controller.playback();
    assert_eq!(playback.phase(), PlaybackPhase::PlayingWithSound);
    assert!(playback.audio_enabled());

    let p = controller.presentation();
    assert_eq!(p.play_affordance, None);
    assert_eq!(p.audio_indicator, AudioIndicator::Audible);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_autoplay_shows_play_affordance() {
    let media = Arc::new(ScriptedMedia::new().then_play(Err(MediaError::NotAllowed)));
    let (controller, _) = controller_with(media.clone());
    controller.mount().unwrap();
    settle().await;

    assert_ne!(controller.playback().phase(), PlaybackPhase::PlayingWithSound);
    assert_eq!(controller.presentation().play_affordance, Some(PlayPrompt::Play));
    assert!(media.is_muted());
    assert_eq!(media.play_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_gesture_direct_success() {
    let media = Arc::new(ScriptedMedia::new().then_play(Err(MediaError::NotAllowed)));
    let (controller, _) = controller_with(media.clone());
    controller.mount().unwrap();
    settle().await;

    let outcome = controller.handle_user_play().await.unwrap();
    assert_eq!(outcome, AttemptOutcome::Playing { audio_enabled: true });
    assert!(controller.playback().audio_enabled());
    assert_eq!(controller.presentation().play_affordance, None);
}

#[tokio::test(start_paused = true)]
async fn test_muted_fallback_matches_direct_success() {
    let direct = Arc::new(ScriptedMedia::new().then_play(Err(MediaError::NotAllowed)));
    let fallback = Arc::new(
        ScriptedMedia::new()
            .then_play(Err(MediaError::NotAllowed))
            .then_play(Err(MediaError::NotAllowed)),
    );

    let (direct_ctl, _) = controller_with(direct);
    let (fallback_ctl, _) = controller_with(fallback.clone());
    direct_ctl.mount().unwrap();
    fallback_ctl.mount().unwrap();
    settle().await;

    direct_ctl.handle_user_play().await.unwrap();
    fallback_ctl.handle_user_play().await.unwrap();

    // Autoplay unmuted, gesture unmuted, gesture muted
    assert_eq!(fallback.play_calls(), vec![false, false, true]);
    assert_eq!(direct_ctl.playback(), fallback_ctl.playback());
    assert_eq!(direct_ctl.presentation(), fallback_ctl.presentation());
    assert!(fallback_ctl.playback().audio_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_failed_gesture_is_retryable() {
    let media = Arc::new(
        ScriptedMedia::new()
            .then_play(Err(MediaError::NotAllowed))
            .then_play(Err(MediaError::NotAllowed))
            .then_play(Err(MediaError::Decode("corrupt".into()))),
    );
    let (controller, _) = controller_with(media);
    controller.mount().unwrap();
    settle().await;

    let outcome = controller.handle_user_play().await.unwrap();
    assert_eq!(outcome, AttemptOutcome::NeedsGesture);
    assert_eq!(controller.playback().phase(), PlaybackPhase::Failed);
    assert_eq!(controller.presentation().play_affordance, Some(PlayPrompt::Retry));

    let outcome = controller.handle_user_play().await.unwrap();
    assert_eq!(outcome, AttemptOutcome::Playing { audio_enabled: true });
    assert_eq!(controller.presentation().play_affordance, None);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_gesture_is_ignored() {
    let media = Arc::new(
        ScriptedMedia::new()
            .then_play(Err(MediaError::NotAllowed))
            .with_latency(Duration::from_millis(200)),
    );
    let (controller, _) = controller_with(media.clone());
    controller.mount().unwrap();
    settle().await;
    time::advance(Duration::from_millis(250)).await;
    settle().await;
    assert_eq!(controller.presentation().play_affordance, Some(PlayPrompt::Play));

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.handle_user_play().await })
    };
    settle().await;

    assert_eq!(
        controller.handle_user_play().await.unwrap(),
        AttemptOutcome::Busy
    );

    time::advance(Duration::from_millis(250)).await;
    settle().await;
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome, AttemptOutcome::Playing { audio_enabled: true });
    assert_eq!(media.play_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_tap_during_pending_autoplay_is_honoured() {
    let media = Arc::new(
        ScriptedMedia::new()
            .then_play(Err(MediaError::NotAllowed))
            .with_latency(Duration::from_millis(150)),
    );
    let (controller, _) = controller_with(media.clone());
    controller.mount().unwrap();
    settle().await;
    assert_eq!(controller.presentation().play_affordance, Some(PlayPrompt::Play));

    // Autoplay still in flight; the tap runs once it is rejected
    let outcome = controller.handle_user_play().await.unwrap();
    assert_eq!(outcome, AttemptOutcome::Playing { audio_enabled: true });
    assert_eq!(media.play_calls(), vec![false, false]);
    assert_eq!(controller.playback().phase(), PlaybackPhase::PlayingWithSound);
    assert_eq!(controller.presentation().play_affordance, None);
}

#[tokio::test(start_paused = true)]
async fn test_refused_unmute_then_audio_gesture() {
    let media = Arc::new(
        ScriptedMedia::new()
            .then_play(Err(MediaError::NotAllowed))
            .then_play(Err(MediaError::NotAllowed))
            .then_unmute(Err(MediaError::NotAllowed)),
    );
    let (controller, _) = controller_with(media.clone());
    controller.mount().unwrap();
    settle().await;

    controller.handle_user_play().await.unwrap();
    assert_eq!(controller.playback().phase(), PlaybackPhase::PlayingMuted);
    assert_eq!(controller.presentation().audio_indicator, AudioIndicator::Muted);
    assert_eq!(controller.presentation().play_affordance, None);

    assert!(controller.enable_audio().unwrap());
    assert_eq!(controller.presentation().audio_indicator, AudioIndicator::Audible);
    assert!(!media.is_muted());
}

// =============================================================================
// Teardown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_unmount_stops_countdown() {
    let (controller, _) = controller_with(Arc::new(ScriptedMedia::new()));
    let mut presentation = controller.subscribe_presentation();
    controller.mount().unwrap();

    advance_secs(6).await;
    controller.unmount();
    presentation.mark_unchanged();
    let frozen = controller.gate();

    advance_secs(30).await;
    assert_eq!(controller.gate(), frozen);
    assert_eq!(frozen.elapsed_seconds(), 6);
    assert!(!controller.gate().is_open());
    assert!(!presentation.has_changed().unwrap());
    assert_eq!(controller.lifecycle(), Lifecycle::Unmounted);
}

#[tokio::test(start_paused = true)]
async fn test_play_completion_after_unmount_is_discarded() {
    let media = Arc::new(ScriptedMedia::new().with_latency(Duration::from_secs(2)));
    let (controller, _) = controller_with(media.clone());
    controller.mount().unwrap();
    settle().await;

    // Autoplay still pending
    controller.unmount();
    advance_secs(3).await;

    assert_eq!(controller.playback().phase(), PlaybackPhase::NotStarted);
    assert!(!media.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_unmount_during_muted_fallback() {
    let media = Arc::new(
        ScriptedMedia::new()
            .then_play(Err(MediaError::NotAllowed))
            .then_play(Err(MediaError::NotAllowed))
            .with_latency(Duration::from_millis(200)),
    );
    let (controller, _) = controller_with(media.clone());
    controller.mount().unwrap();
    settle().await;
    time::advance(Duration::from_millis(250)).await;
    settle().await;

    let gesture = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.handle_user_play().await })
    };
    settle().await;

    // Unmuted request rejected, muted request pending
    time::advance(Duration::from_millis(250)).await;
    settle().await;
    assert_eq!(media.play_calls(), vec![false, false, true]);
    controller.unmount();

    time::advance(Duration::from_millis(500)).await;
    settle().await;
    assert_eq!(gesture.await.unwrap().unwrap(), AttemptOutcome::Abandoned);
    assert_eq!(controller.playback().phase(), PlaybackPhase::NotStarted);
    assert!(!media.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_skip_after_unmount_rejected() {
    let (controller, closes) = controller_with(Arc::new(ScriptedMedia::new()));
    controller.mount().unwrap();
    advance_secs(15).await;
    controller.unmount();

    assert_err!(controller.skip());
    assert_eq!(closes.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Events and Rendering
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_event_sequence() {
    let media = Arc::new(ScriptedMedia::new().then_play(Err(MediaError::NotAllowed)));
    let (controller, _) = controller_with(media);
    let mut events = controller.subscribe_events();
    controller.mount().unwrap();
    settle().await;
    advance_secs(15).await;
    controller.skip().unwrap();

    let mut received = Vec::new();
    while let Ok(record) = events.try_recv() {
        received.push(record.event);
    }

    assert_eq!(received[0], AdEvent::Mounted { mandatory_view_seconds: 15 });
    assert!(received.iter().any(|e| matches!(
        e,
        AdEvent::PlayRejected { strategy: Strategy::Unmuted, .. }
    )));
    let ticks = received
        .iter()
        .filter(|e| matches!(e, AdEvent::Tick { .. }))
        .count();
    assert_eq!(ticks, 15);
    let opened = received
        .iter()
        .filter(|e| matches!(e, AdEvent::GateOpened { .. }))
        .count();
    assert_eq!(opened, 1);
    assert_eq!(received.last(), Some(&AdEvent::Closed));
}

#[tokio::test(start_paused = true)]
async fn test_layers_before_and_after_gate() {
    let media = Arc::new(ScriptedMedia::new().then_play(Err(MediaError::NotAllowed)));
    let (controller, _) = controller_with(media);
    controller.mount().unwrap();
    settle().await;

    let layers = controller.layers();
    assert!(matches!(layers[0], Layer::Video { .. }));
    assert!(layers.contains(&Layer::PlayButton { prompt: PlayPrompt::Play }));
    assert!(layers.contains(&Layer::Countdown {
        text: "You can skip this ad in 15 seconds".into()
    }));
    assert!(!layers.contains(&Layer::SkipButton));

    advance_secs(15).await;
    let layers = controller.layers();
    assert!(layers.contains(&Layer::SkipButton));
    assert!(!layers.iter().any(|l| matches!(l, Layer::Countdown { .. })));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ad.json");
    std::fs::write(
        &path,
        r#"{ "mandatory_view_seconds": 30, "asset": { "src": "/video/promo.mp4", "mime_type": "video/mp4" } }"#,
    )
    .unwrap();

    let config = AdConfig::from_json_file(&path).unwrap();
    assert_eq!(config.mandatory_view_seconds, 30);
    assert_eq!(config.asset.src, "/video/promo.mp4");
}

#[test]
fn test_config_missing_file() {
    let err = AdConfig::from_json_file("/nonexistent/ad.json").unwrap_err();
    assert_eq!(err.error_code(), "IO");
}
