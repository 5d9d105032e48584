// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observable value of one device group.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ValueError;
use crate::event::{DeviceEvent, EventBus};
use crate::subscription::{CallbackRegistry, SubscriptionId};
use crate::types::Address;

use super::{GroupKind, Value};

type GroupCallback = dyn Fn(&Value) + Send + Sync;

/// A named, typed, observable slot for one control surface of a device.
///
/// Values only change through [`set_value`](Self::set_value), which the
/// device calls when a response or report is decoded. Subscribers are
/// notified only when the value actually changes.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use insteon_lib::group::{GroupKind, GroupValue, Value};
/// use insteon_lib::types::Address;
///
/// let group = GroupValue::new("cool_set_point", Address::new([1, 2, 3]), 14, GroupKind::SetPoint)
///     .with_default(Value::SetPoint(65));
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
/// group.subscribe(move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert!(!group.set_value(Value::SetPoint(65)).unwrap());
/// assert!(group.set_value(Value::SetPoint(70)).unwrap());
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct GroupValue {
    name: String,
    address: Address,
    group: u8,
    kind: GroupKind,
    status_type: Option<u8>,
    default: Option<Value>,
    value: RwLock<Option<Value>>,
    subscribers: CallbackRegistry<GroupCallback>,
    event_bus: Option<EventBus>,
}

impl GroupValue {
    /// Creates a group with no value.
    #[must_use]
    pub fn new(name: impl Into<String>, address: Address, group: u8, kind: GroupKind) -> Self {
        Self {
            name: name.into(),
            address,
            group,
            kind,
            status_type: None,
            default: None,
            value: RwLock::new(None),
            subscribers: CallbackRegistry::new(),
            event_bus: None,
        }
    }

    /// Sets the default value, which is also the initial value.
    ///
    /// A default of the wrong kind is ignored.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        if let Ok(default) = self.kind.coerce(self.group, default) {
            self.default = Some(default);
            *self.value.get_mut() = Some(default);
        }
        self
    }

    /// Sets the status report type that carries this group's value.
    #[must_use]
    pub fn with_status_type(mut self, status_type: u8) -> Self {
        self.status_type = Some(status_type);
        self
    }

    /// Publishes changes on an event bus.
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    // ========== Accessors ==========

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the group identifier.
    #[must_use]
    pub const fn group(&self) -> u8 {
        self.group
    }

    /// Returns the kind of value the group holds.
    #[must_use]
    pub const fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Returns the status report type discriminator, if any.
    #[must_use]
    pub const fn status_type(&self) -> Option<u8> {
        self.status_type
    }

    /// Returns the default value.
    #[must_use]
    pub const fn default_value(&self) -> Option<Value> {
        self.default
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        *self.value.read()
    }

    /// Returns `true` if the current value is on or a non-zero level.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.value().is_some_and(|value| value.is_on())
    }

    // ========== Updates ==========

    /// Stores a new value.
    ///
    /// The value is first converted to the group's kind. If it equals the
    /// current value nothing happens; otherwise every subscriber is called
    /// once, in subscription order, and a [`DeviceEvent::GroupChanged`] is
    /// published.
    ///
    /// Returns `true` if the value changed.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::KindMismatch` if the value cannot be converted.
    pub fn set_value(&self, value: Value) -> Result<bool, ValueError> {
        let value = self.kind.coerce(self.group, value)?;
        {
            let mut current = self.value.write();
            if *current == Some(value) {
                return Ok(false);
            }
            *current = Some(value);
        }

        tracing::trace!(
            address = %self.address,
            group = self.group,
            name = %self.name,
            value = %value,
            "Group value changed"
        );
        for callback in self.subscribers.snapshot() {
            callback(&value);
        }
        if let Some(bus) = &self.event_bus {
            bus.publish(DeviceEvent::GroupChanged {
                address: self.address,
                group: self.group,
                name: self.name.clone(),
                value,
            });
        }
        Ok(true)
    }

    // ========== Subscriptions ==========

    /// Subscribes to value changes.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribers.insert(Arc::new(callback))
    }

    /// Subscribes to value changes with the group name passed along.
    pub fn subscribe_named<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let name = self.name.clone();
        self.subscribe(move |value| callback(&name, value))
    }

    /// Removes a subscription.
    ///
    /// Returns `false` if the subscription did not exist; removing it again
    /// is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Returns the number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupValue")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("group", &self.group)
            .field("kind", &self.kind)
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn switch() -> GroupValue {
        GroupValue::new(
            "on_off_switch",
            Address::new([0x01, 0x02, 0x03]),
            1,
            GroupKind::OnOff,
        )
    }

    fn counter(group: &GroupValue) -> (Arc<AtomicUsize>, SubscriptionId) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let id = group.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        (calls, id)
    }

    #[test]
    fn unchanged_value_does_not_notify() {
        let group = switch();
        let (calls, _) = counter(&group);

        assert!(group.set_value(Value::OnOff(true)).unwrap());
        assert!(!group.set_value(Value::OnOff(true)).unwrap());
        // A level that coerces to the same value is also unchanged.
        assert!(!group.set_value(Value::Level(0x40)).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn changed_value_notifies_every_subscriber_once() {
        let group = switch();
        let (first, _) = counter(&group);
        let (second, _) = counter(&group);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        group.subscribe(move |value| seen_clone.lock().push(*value));

        group.set_value(Value::OnOff(true)).unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock(), vec![Value::OnOff(true)]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let group = switch();
        let (calls, id) = counter(&group);

        assert!(group.unsubscribe(id));
        assert!(!group.unsubscribe(id));
        group.set_value(Value::OnOff(true)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(group.subscriber_count(), 0);
    }

    #[test]
    fn kind_mismatch_leaves_value_untouched() {
        let group = switch();
        let (calls, _) = counter(&group);

        assert!(group.set_value(Value::Temperature(20.0)).is_err());
        assert_eq!(group.value(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn default_is_initial_value() {
        let group = GroupValue::new(
            "heat_set_point",
            Address::new([1, 1, 1]),
            15,
            GroupKind::SetPoint,
        )
        .with_default(Value::SetPoint(95))
        .with_status_type(0);

        assert_eq!(group.value(), Some(Value::SetPoint(95)));
        assert_eq!(group.default_value(), Some(Value::SetPoint(95)));
        assert_eq!(group.status_type(), Some(0));
    }

    #[test]
    fn named_subscriber_receives_name() {
        let group = switch();
        let names = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let names_clone = Arc::clone(&names);
        group.subscribe_named(move |name, _| names_clone.lock().push(name.to_string()));

        group.set_value(Value::OnOff(false)).unwrap();
        assert_eq!(*names.lock(), vec!["on_off_switch".to_string()]);
    }

    #[tokio::test]
    async fn change_is_published_on_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let group = switch().with_event_bus(bus);

        group.set_value(Value::OnOff(true)).unwrap();
        group.set_value(Value::OnOff(true)).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            DeviceEvent::GroupChanged {
                address: Address::new([0x01, 0x02, 0x03]),
                group: 1,
                name: "on_off_switch".to_string(),
                value: Value::OnOff(true),
            }
        );
        assert!(rx.try_recv().is_err());
    }
}
