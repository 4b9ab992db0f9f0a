use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::blood_pressure::decode_blood_pressure;
use super::gatt::CharacteristicKind;
use super::weight::{decode_weight, ScaleGate, ScaleVerdict};
use crate::config::ScaleConfig;
use crate::core::{DeviceReading, WeightReading};
use crate::error::BiometricError;
use crate::hal::{BleEvent, Notification, NotificationSource};
use crate::observability::CaptureMetrics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    CachedSample,
    Settling { remaining_secs: u64 },
    LowImpedance,
    Unstable,
}

/// What the monitor reports to its caller for each relevant BLE event.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Reading {
        device_id: String,
        reading: DeviceReading,
    },
    Rejected {
        device_id: String,
        reason: RejectReason,
        /// Decoded value, absent while settling
        reading: Option<WeightReading>,
    },
    Malformed {
        device_id: String,
        error: BiometricError,
    },
    Disconnected {
        device_id: String,
    },
}

/// Why [`BleMonitor::run`] returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorExit {
    Disconnected { device_id: String },
    SourceExhausted,
    ReceiverClosed,
}

/// Decodes and gates notifications from one connected peripheral.
///
/// Decoders are pure; the only state is the scale gate, and it is only
/// touched from this monitor's event loop.
pub struct BleMonitor {
    scale_config: ScaleConfig,
    scale_gate: Option<ScaleGate>,
    metrics: Arc<CaptureMetrics>,
}

impl BleMonitor {
    pub fn new(scale_config: ScaleConfig, metrics: Arc<CaptureMetrics>) -> Self {
        Self {
            scale_config,
            scale_gate: None,
            metrics,
        }
    }

    /// Apply one event. Returns `None` for events with nothing to report
    /// (subscriptions, unknown characteristics).
    pub fn handle_event(&mut self, event: BleEvent) -> Option<MonitorEvent> {
        match event {
            BleEvent::Subscribed {
                device_id,
                characteristic,
                at_ms,
            } => {
                if CharacteristicKind::from_uuid(&characteristic)
                    == Some(CharacteristicKind::BodyComposition)
                {
                    debug!(device_id = %device_id, "scale subscribed, settle window starts");
                    self.scale_gate = Some(ScaleGate::new(self.scale_config.clone(), at_ms));
                }
                None
            }
            BleEvent::Notification(notification) => self.handle_notification(notification),
            BleEvent::Disconnected { device_id } => {
                warn!(device_id = %device_id, "BLE device disconnected");
                self.scale_gate = None;
                Some(MonitorEvent::Disconnected { device_id })
            }
        }
    }

    fn handle_notification(&mut self, notification: Notification) -> Option<MonitorEvent> {
        let Notification {
            device_id,
            characteristic,
            payload,
            received_at_ms,
        } = notification;

        let Some(kind) = CharacteristicKind::from_uuid(&characteristic) else {
            debug!(device_id = %device_id, %characteristic, "ignoring unsupported characteristic");
            return None;
        };
        debug!(device_id = %device_id, ?kind, bytes = ?payload, "notification received");

        match kind {
            CharacteristicKind::BloodPressure => match decode_blood_pressure(&payload) {
                Ok(reading) => {
                    self.metrics.record_reading_accepted();
                    Some(MonitorEvent::Reading {
                        device_id,
                        reading: DeviceReading::BloodPressure(reading),
                    })
                }
                Err(error) => Some(self.malformed(device_id, error)),
            },
            CharacteristicKind::BodyComposition => {
                let reading = match decode_weight(&payload) {
                    Ok(reading) => reading,
                    Err(error) => return Some(self.malformed(device_id, error)),
                };

                let config = &self.scale_config;
                let gate = self.scale_gate.get_or_insert_with(|| {
                    debug!("scale notification without subscription, starting settle window now");
                    ScaleGate::new(config.clone(), received_at_ms)
                });

                let (reason, rejected) = match gate.evaluate(reading, received_at_ms) {
                    ScaleVerdict::Accepted(reading) => {
                        self.metrics.record_reading_accepted();
                        return Some(MonitorEvent::Reading {
                            device_id,
                            reading: DeviceReading::Weight(reading),
                        });
                    }
                    ScaleVerdict::CachedSample(r) => (RejectReason::CachedSample, Some(r)),
                    ScaleVerdict::Settling { remaining_secs } => {
                        (RejectReason::Settling { remaining_secs }, None)
                    }
                    ScaleVerdict::LowImpedance(r) => (RejectReason::LowImpedance, Some(r)),
                    ScaleVerdict::Unstable(r) => (RejectReason::Unstable, Some(r)),
                };

                self.metrics.record_reading_rejected();
                Some(MonitorEvent::Rejected {
                    device_id,
                    reason,
                    reading: rejected,
                })
            }
        }
    }

    fn malformed(&self, device_id: String, error: BiometricError) -> MonitorEvent {
        self.metrics.record_payload_malformed();
        warn!(device_id = %device_id, error = %error, "dropping malformed payload");
        MonitorEvent::Malformed { device_id, error }
    }

    /// Pump `source` until it disconnects or runs dry, forwarding every
    /// report to `tx`. A disconnect is always forwarded before returning.
    pub async fn run<S>(mut self, mut source: S, tx: mpsc::Sender<MonitorEvent>) -> MonitorExit
    where
        S: NotificationSource,
    {
        while let Some(event) = source.next_event().await {
            let Some(report) = self.handle_event(event) else {
                continue;
            };
            let disconnected = match &report {
                MonitorEvent::Disconnected { device_id } => Some(device_id.clone()),
                _ => None,
            };
            if tx.send(report).await.is_err() {
                debug!("monitor receiver dropped");
                return MonitorExit::ReceiverClosed;
            }
            if let Some(device_id) = disconnected {
                return MonitorExit::Disconnected { device_id };
            }
        }
        MonitorExit::SourceExhausted
    }
}
