use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{timeout, Duration};
use vitalstream::config::CaptureConfig;
use vitalstream::engine::{CaptureController, CaptureState, ChannelTransport, NullTransport};
use vitalstream::hal::mock::{SimulatedHeartbeatSource, UnavailableAudioSource};
use vitalstream::BiometricError;

fn test_config() -> CaptureConfig {
    CaptureConfig {
        queue_capacity: 128,
        ..CaptureConfig::default()
    }
}

#[tokio::test]
async fn test_simulated_capture_end_to_end() {
    let (transport, mut frames) = ChannelTransport::new();
    let mut controller = CaptureController::new(test_config(), Arc::new(transport));
    let mut state_rx = controller.watch_state();
    let heart_rate_rx = controller.watch_heart_rate();

    // 10 ms chunks, 5 s of stream at 60 bpm
    let source = SimulatedHeartbeatSource::new(60.0)
        .with_chunk_len(40)
        .with_duration_secs(5.0);
    controller.start_capture("consult-42", Box::new(source)).await.unwrap();
    assert!(controller.is_capturing());

    let ended = timeout(
        Duration::from_secs(10),
        state_rx.wait_for(|s| matches!(s, CaptureState::Failed { .. })),
    )
    .await
    .map(|r| r.is_ok())
    .unwrap_or(false);
    assert!(ended, "capture loop never finished");

    // the failed session no longer reports a rate
    assert_eq!(*heart_rate_rx.borrow(), 0);

    controller.stop_capture().await;
    assert_eq!(controller.state(), CaptureState::Idle);
    assert_eq!(*heart_rate_rx.borrow(), 0);

    let mut received = Vec::new();
    while let Ok(outbound) = frames.try_recv() {
        assert_eq!(outbound.consultation_id, "consult-42");
        received.push(outbound.frame);
    }

    // ~10 frames per second of audio
    assert!((49..=51).contains(&received.len()), "got {} frames", received.len());
    assert!(received.windows(2).all(|w| w[1].timestamp() - w[0].timestamp() >= 100));
    assert!(received.iter().all(|f| f.waveform().len() == 128));
    let heart_rate = received.last().map(|f| f.heart_rate()).unwrap_or_default();
    assert!((55..=65).contains(&heart_rate), "heart rate {}", heart_rate);

    let metrics = controller.metrics().snapshot();
    assert_eq!(metrics.frames_sent, received.len() as u64);
    assert_eq!(metrics.frames_dropped, 0);
    assert_eq!(metrics.frames_analyzed, 500);
}

#[tokio::test]
async fn test_source_end_marks_failed() {
    let mut controller = CaptureController::new(test_config(), Arc::new(NullTransport));
    let mut state_rx = controller.watch_state();
    let source = SimulatedHeartbeatSource::new(72.0).with_duration_secs(0.5);
    controller.start_capture("c", Box::new(source)).await.unwrap();

    let state = timeout(
        Duration::from_secs(5),
        state_rx.wait_for(|s| matches!(s, CaptureState::Failed { .. })),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(
        state,
        CaptureState::Failed {
            error_msg: "audio source disconnected".to_string()
        }
    );
}

#[tokio::test]
async fn test_second_start_rejected_while_running() {
    let mut controller = CaptureController::new(test_config(), Arc::new(NullTransport));
    let live = SimulatedHeartbeatSource::new(60.0).paced(true);
    controller.start_capture("first", Box::new(live)).await.unwrap();

    let other = SimulatedHeartbeatSource::new(90.0).paced(true);
    let err = controller.start_capture("second", Box::new(other)).await.unwrap_err();
    assert!(matches!(err, BiometricError::DeviceUnavailable(_)));

    match controller.state() {
        CaptureState::Capturing { consultation_id, sample_rate } => {
            assert_eq!(consultation_id, "first");
            assert_eq!(sample_rate, 4000);
        }
        other => panic!("unexpected state {:?}", other),
    }

    controller.stop_capture().await;
    assert_eq!(controller.state(), CaptureState::Idle);
}

#[tokio::test]
async fn test_permission_denied_leaves_failed() {
    let mut controller = CaptureController::new(test_config(), Arc::new(NullTransport));
    let err = controller
        .start_capture("c", Box::new(UnavailableAudioSource::permission_denied()))
        .await
        .unwrap_err();

    assert!(matches!(err, BiometricError::PermissionDenied(_)));
    assert!(matches!(controller.state(), CaptureState::Failed { .. }));
    assert!(!controller.is_capturing());

    controller.stop_capture().await;
    assert_eq!(controller.state(), CaptureState::Idle);
}

#[tokio::test]
async fn test_restart_after_failure() {
    let mut controller = CaptureController::new(test_config(), Arc::new(NullTransport));
    let _ = controller
        .start_capture("c", Box::new(UnavailableAudioSource::no_device()))
        .await;

    let source = SimulatedHeartbeatSource::new(60.0).paced(true);
    controller.start_capture("c", Box::new(source)).await.unwrap();
    assert!(controller.is_capturing());
    controller.stop_capture().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut controller = CaptureController::new(test_config(), Arc::new(NullTransport));
    controller.stop_capture().await;
    assert_eq!(controller.state(), CaptureState::Idle);

    let source = SimulatedHeartbeatSource::new(60.0).paced(true);
    controller.start_capture("c", Box::new(source)).await.unwrap();
    controller.stop_capture().await;
    controller.stop_capture().await;
    assert_eq!(controller.state(), CaptureState::Idle);
}

#[tokio::test]
async fn test_preview_sees_every_tick() {
    let mut controller = CaptureController::new(test_config(), Arc::new(NullTransport));
    let mut preview = controller.subscribe_preview();

    let source = SimulatedHeartbeatSource::new(60.0).paced(true);
    controller.start_capture("c", Box::new(source)).await.unwrap();

    let first = timeout(Duration::from_secs(2), preview.recv()).await.unwrap().unwrap();
    let second = timeout(Duration::from_secs(2), preview.recv()).await.unwrap().unwrap();
    assert_eq!(first.waveform().len(), 128);
    // one 64-sample chunk apart, not rate limited
    assert_eq!(second.timestamp() - first.timestamp(), 16);

    controller.stop_capture().await;
}

#[tokio::test]
async fn test_source_end_clears_heart_rate() {
    let mut controller = CaptureController::new(test_config(), Arc::new(NullTransport));
    let mut state_rx = controller.watch_state();
    let mut heart_rate_rx = controller.watch_heart_rate();
    let mut preview = controller.subscribe_preview();

    let source = SimulatedHeartbeatSource::new(60.0)
        .with_chunk_len(40)
        .with_duration_secs(3.0);
    controller.start_capture("c", Box::new(source)).await.unwrap();

    let ended = timeout(
        Duration::from_secs(10),
        state_rx.wait_for(|s| matches!(s, CaptureState::Failed { .. })),
    )
    .await
    .map(|r| r.is_ok())
    .unwrap_or(false);
    assert!(ended);

    // a rate was measured while running
    let mut peak_rate = 0;
    loop {
        match preview.try_recv() {
            Ok(frame) => peak_rate = peak_rate.max(frame.heart_rate()),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    assert!(peak_rate > 0);

    assert_eq!(*heart_rate_rx.borrow_and_update(), 0);
    assert!(matches!(controller.state(), CaptureState::Failed { .. }));
}

#[tokio::test]
async fn test_empty_consultation_rejected() {
    let (transport, mut frames) = ChannelTransport::new();
    let mut controller = CaptureController::new(test_config(), Arc::new(transport));

    let source = SimulatedHeartbeatSource::new(60.0).with_duration_secs(1.0);
    let err = controller.start_capture("", Box::new(source)).await.unwrap_err();
    assert!(matches!(err, BiometricError::InvalidConfig(_)));
    assert_eq!(controller.state(), CaptureState::Idle);

    let blank = SimulatedHeartbeatSource::new(60.0).with_duration_secs(1.0);
    assert!(controller.start_capture("  ", Box::new(blank)).await.is_err());

    controller.stop_capture().await;
    drop(controller);
    assert!(frames.recv().await.is_none());
}
