// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device-wide dispatch of group changes and button presses.

use tokio::sync::broadcast;

use super::DeviceEvent;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out of [`DeviceEvent`]s from one or more devices.
///
/// A device built with a bus publishes a `GroupChanged` whenever one of its
/// group values changes and a `Button` for every press it sees, whether the
/// press came in as an all-link broadcast or was sent from here. Receivers
/// tell events apart by [`DeviceEvent::address`] and dispatch on
/// [`DeviceEvent::key`], the `(group, event name)` pair.
///
/// Events go out on a tokio broadcast channel of 256 events unless another
/// capacity is given. A receiver that falls further behind than that gets
/// `RecvError::Lagged` and skips ahead.
///
/// # Examples
///
/// ```
/// use insteon_lib::event::{ButtonEvent, DeviceEvent, EventBus};
/// use insteon_lib::types::Address;
///
/// let bus = EventBus::new();
/// let mut events = bus.subscribe();
///
/// bus.publish(DeviceEvent::Button {
///     address: Address::new([1, 2, 3]),
///     group: 3,
///     event: ButtonEvent::On,
///     level: 0xFF,
/// });
///
/// let event = events.try_recv().unwrap();
/// assert_eq!(event.key(), (3, "on_event"));
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    /// Creates a bus holding up to 256 unread events per receiver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus holding up to `capacity` unread events per receiver.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends an event to every receiver.
    ///
    /// Returns how many receivers got it; an event nobody listens to is
    /// dropped.
    pub fn publish(&self, event: DeviceEvent) -> usize {
        let (group, name) = event.key();
        let address = event.address();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!(%address, group, event = name, "No event receivers");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ButtonEvent;
    use crate::group::Value;
    use crate::types::Address;

    fn button(group: u8) -> DeviceEvent {
        DeviceEvent::Button {
            address: Address::new([0xAA, 0xBB, 0xCC]),
            group,
            event: ButtonEvent::On,
            level: 0xFF,
        }
    }

    #[test]
    fn new_bus_has_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscribe_and_drop_track_count() {
        let bus = EventBus::new();

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn publish_delivers_to_every_subscriber() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(button(3));

        assert_eq!(rx1.recv().await.unwrap().key(), (3, "on_event"));
        assert_eq!(rx2.recv().await.unwrap().key(), (3, "on_event"));
    }

    #[test]
    fn publish_reports_receiver_count() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(button(1)), 0);

        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        let event = DeviceEvent::GroupChanged {
            address: Address::new([1, 2, 3]),
            group: 1,
            name: "on_off_switch".to_string(),
            value: Value::OnOff(true),
        };
        assert_eq!(bus.publish(event), 2);
    }

    #[test]
    fn clone_shares_same_channel() {
        let bus1 = EventBus::with_capacity(16);
        let bus2 = bus1.clone();

        let _rx = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
