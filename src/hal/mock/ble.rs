use async_trait::async_trait;
use std::collections::VecDeque;

use crate::hal::{BleEvent, NotificationSource};

/// Replays a fixed list of BLE events, then reports exhaustion.
pub struct ScriptedNotificationSource {
    events: VecDeque<BleEvent>,
}

impl ScriptedNotificationSource {
    pub fn new(events: impl IntoIterator<Item = BleEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl NotificationSource for ScriptedNotificationSource {
    async fn next_event(&mut self) -> Option<BleEvent> {
        self.events.pop_front()
    }
}

/// No Bluetooth on this host.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotificationSource;

#[async_trait]
impl NotificationSource for NullNotificationSource {
    async fn next_event(&mut self) -> Option<BleEvent> {
        None
    }
}
