use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use vitalstream::ble::{gatt, BleMonitor, MonitorEvent};
use vitalstream::config::BiometricsConfig;
use vitalstream::engine::{CaptureController, ChannelTransport};
use vitalstream::hal::mock::{ScriptedNotificationSource, SimulatedHeartbeatSource};
use vitalstream::hal::{list_microphones, AudioSource, BleEvent, MicrophoneSource, Notification};
use vitalstream::observability::{init_tracing, CaptureMetrics};

const CAPTURE_SECS: u64 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_mic = args.iter().any(|a| a == "--mic");

    let mut config = match args.iter().position(|a| a == "--config") {
        Some(idx) => match args.get(idx + 1) {
            Some(path) => BiometricsConfig::load(path)?,
            None => anyhow::bail!("--config needs a path"),
        },
        None => BiometricsConfig::default(),
    };
    // Keep stdout for JSON frames.
    config.log.stderr = true;
    init_tracing(&config.log);

    let source: Box<dyn AudioSource> = if use_mic {
        for mic in list_microphones().await? {
            tracing::info!(id = %mic.id, name = %mic.name, default = mic.is_default, "input device");
        }
        Box::new(MicrophoneSource::default_device())
    } else {
        Box::new(SimulatedHeartbeatSource::new(72.0).paced(true))
    };

    let (transport, mut frames) = ChannelTransport::new();
    let mut controller = CaptureController::new(config.capture.clone(), Arc::new(transport));
    controller.start_capture("demo-consultation", source).await?;

    let printer = tokio::spawn(async move {
        while let Some(outbound) = frames.recv().await {
            match outbound.frame.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!(error = %e, "cannot serialize frame"),
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(CAPTURE_SECS)).await;
    let heart_rate = *controller.watch_heart_rate().borrow();
    let metrics = controller.metrics().snapshot();
    controller.stop_capture().await;
    drop(controller);
    printer.await?;

    tracing::info!(
        heart_rate,
        analyzed = metrics.frames_analyzed,
        sent = metrics.frames_sent,
        "capture finished"
    );

    replay_ble_scenarios(&config).await;
    Ok(())
}

/// Feed a scale and a blood-pressure cuff script through the monitor.
async fn replay_ble_scenarios(config: &BiometricsConfig) {
    let scale_payload = vec![0x00, 0x20, 200, 0, 50, 0];
    let events = vec![
        BleEvent::Subscribed {
            device_id: "scale".to_string(),
            characteristic: gatt::BODY_COMPOSITION_MEASUREMENT,
            at_ms: 0,
        },
        notification("scale", gatt::BODY_COMPOSITION_MEASUREMENT, scale_payload.clone(), 200),
        notification("scale", gatt::BODY_COMPOSITION_MEASUREMENT, scale_payload.clone(), 5_000),
        notification("scale", gatt::BODY_COMPOSITION_MEASUREMENT, scale_payload, 16_000),
        notification(
            "cuff",
            gatt::BLOOD_PRESSURE_MEASUREMENT,
            vec![0x04, 120, 0, 80, 0, 93, 0, 72, 0],
            17_000,
        ),
        BleEvent::Disconnected {
            device_id: "scale".to_string(),
        },
    ];

    let metrics = Arc::new(CaptureMetrics::new());
    let monitor = BleMonitor::new(config.scale.clone(), metrics);
    let (tx, mut rx) = mpsc::channel(16);
    let handle = tokio::spawn(monitor.run(ScriptedNotificationSource::new(events), tx));

    while let Some(event) = rx.recv().await {
        match event {
            MonitorEvent::Reading { device_id, reading } => {
                tracing::info!(device_id = %device_id, ?reading, "reading accepted")
            }
            other => tracing::info!(?other, "monitor event"),
        }
    }
    match handle.await {
        Ok(exit) => tracing::info!(?exit, "BLE replay finished"),
        Err(e) => tracing::warn!(error = %e, "BLE replay task failed"),
    }
}

fn notification(device_id: &str, characteristic: uuid::Uuid, payload: Vec<u8>, at_ms: u64) -> BleEvent {
    BleEvent::Notification(Notification {
        device_id: device_id.to_string(),
        characteristic,
        payload,
        received_at_ms: at_ms,
    })
}
