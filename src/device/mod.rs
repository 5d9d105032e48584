// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level device abstraction.
//!
//! A [`Device`] is built from a [`DeviceDescriptor`] and a
//! [`Transport`]. It owns the device's configuration properties, its group
//! values, the command handlers that talk to it and its status manager.
//! Every state change goes through those components, and only after the
//! device confirmed the exchange that caused it.
//!
//! Operations that only some devices support (thermostat controls, keypad
//! buttons) check the descriptor's profile and fail with
//! [`DeviceError::UnsupportedCapability`] before anything is sent.

mod builder;
mod descriptor;
mod keypad;
mod thermostat;
mod wake;

pub use builder::DeviceBuilder;
pub use descriptor::{DeviceDescriptor, DeviceProfile, GroupDef, StatusTypeDef};

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::command::{
    Command, CommandHandler, ExtendedGet, ExtendedSet, OnOffCommand, SetLedsCommand,
};
use crate::config::{PropertyRegistry, UnloadedBytePolicy, WriteOutcome, bit_is_set};
use crate::error::{DeviceError, Error, ValueError};
use crate::event::{ButtonEvent, DeviceEvent, EventBus};
use crate::group::{GroupValue, Groups, Value};
use crate::protocol::{Frame, Transport, UserData};
use crate::status::{StatusManager, StatusReport};
use crate::types::{Address, ResponseStatus};

use thermostat::ThermostatHandlers;
use wake::WakeGate;

/// Command handlers shared by every device.
pub(crate) struct Handlers {
    property_read: Arc<CommandHandler<(u8, UserData)>>,
    property_write: Arc<CommandHandler<u8>>,
    on_off: Arc<CommandHandler<(u8, u8)>>,
    set_leds: Arc<CommandHandler<u8>>,
    thermostat: Option<ThermostatHandlers>,
}

impl Handlers {
    fn new(address: Address, profile: DeviceProfile) -> Self {
        Self {
            property_read: Arc::new(CommandHandler::new("property_read", address, |_, response| {
                response.and_then(ExtendedGet::parse_block)
            })),
            property_write: Arc::new(CommandHandler::new(
                "property_write",
                address,
                |_, response| response.and_then(|r| r.data(3)),
            )),
            on_off: Arc::new(CommandHandler::new("on_off", address, |request, _| {
                OnOffCommand::parse(request)
            })),
            set_leds: Arc::new(CommandHandler::new("set_leds", address, |request, _| {
                SetLedsCommand::parse(request)
            })),
            thermostat: (profile == DeviceProfile::Thermostat)
                .then(|| ThermostatHandlers::new(address)),
        }
    }
}

struct DeviceInner<T> {
    address: Address,
    descriptor: DeviceDescriptor,
    transport: Arc<T>,
    properties: Arc<PropertyRegistry>,
    groups: Arc<Groups>,
    status: Arc<StatusManager>,
    handlers: Handlers,
    event_bus: Option<EventBus>,
    unloaded_byte_policy: UnloadedBytePolicy,
    wake: Option<WakeGate>,
    config_lock: tokio::sync::Mutex<()>,
    led_lock: Arc<tokio::sync::Mutex<()>>,
}

/// One device on the network.
///
/// `Device` is a cheap handle: clones share the same state.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use insteon_lib::catalog;
/// use insteon_lib::device::Device;
/// use insteon_lib::protocol::{Frame, Reply, Transport};
/// use insteon_lib::types::{Address, ResponseStatus};
///
/// struct EchoTransport;
///
/// impl Transport for EchoTransport {
///     async fn send(&self, frame: Frame) -> Reply {
///         Reply::success(frame)
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> insteon_lib::Result<()> {
/// let device = Device::builder(
///     Address::new([0x1A, 0x2B, 0x3C]),
///     catalog::switch_linc(),
///     Arc::new(EchoTransport),
/// )
/// .build()?;
///
/// assert_eq!(device.on(1).await?, ResponseStatus::Success);
/// assert!(device.groups().is_on(1));
/// # Ok(())
/// # }
/// ```
pub struct Device<T: Transport> {
    inner: Arc<DeviceInner<T>>,
}

impl<T: Transport> Clone for Device<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Device<T> {
    /// Starts building a device.
    #[must_use]
    pub fn builder(
        address: Address,
        descriptor: DeviceDescriptor,
        transport: Arc<T>,
    ) -> DeviceBuilder<T> {
        DeviceBuilder::new(address, descriptor, transport)
    }

    // ========== Accessors ==========

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.inner.address
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.descriptor.model
    }

    /// Returns the behavior family.
    #[must_use]
    pub fn profile(&self) -> DeviceProfile {
        self.inner.descriptor.profile
    }

    /// Returns the descriptor the device was built from.
    #[must_use]
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.inner.descriptor
    }

    /// Returns `true` for sleeping devices whose operations wait for a wake.
    #[must_use]
    pub fn is_battery(&self) -> bool {
        self.inner.wake.is_some()
    }

    /// Returns the configuration properties.
    #[must_use]
    pub fn properties(&self) -> &PropertyRegistry {
        &self.inner.properties
    }

    /// Returns all groups.
    #[must_use]
    pub fn groups(&self) -> &Groups {
        &self.inner.groups
    }

    /// Returns one group.
    #[must_use]
    pub fn group(&self, group: u8) -> Option<&GroupValue> {
        self.inner.groups.get(group)
    }

    /// Returns the status manager.
    #[must_use]
    pub fn status_manager(&self) -> &StatusManager {
        &self.inner.status
    }

    /// Returns the event bus, if one was attached.
    #[must_use]
    pub fn event_bus(&self) -> Option<&EventBus> {
        self.inner.event_bus.as_ref()
    }

    // ========== Status ==========

    /// Requests every registered status type and applies the answers.
    ///
    /// Status requests are never queued behind a wake.
    pub async fn status(&self) -> ResponseStatus {
        tracing::debug!(address = %self.inner.address, "Requesting status");
        self.inner.status.async_status(&self.inner.transport).await
    }

    // ========== Configuration ==========

    /// Reads every property block from the device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::ChannelClosed` if a queued read of a sleeping
    /// device was dropped before it ran.
    pub async fn read_config(&self) -> Result<ResponseStatus, Error> {
        let device = self.clone();
        self.gated(async move {
            let groups = device.inner.properties.groups();
            Ok(device.read_groups(groups).await)
        })
        .await
    }

    /// Stages a new value for a property.
    ///
    /// Nothing is sent until [`write_config`](Self::write_config).
    ///
    /// # Errors
    ///
    /// Returns a `ValueError` if the property is unknown, read-only or the
    /// value does not fit.
    pub fn set_property(&self, name: &str, value: u8) -> Result<(), Error> {
        self.inner.properties.set_pending(name, value)?;
        Ok(())
    }

    /// Discards the staged value of a property.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownProperty` if no such property exists.
    pub fn revert_property(&self, name: &str) -> Result<(), Error> {
        self.inner.properties.revert(name)?;
        Ok(())
    }

    /// Writes every staged property change to the device.
    ///
    /// Bytes holding a property that was never read are read first unless
    /// the device was built with [`UnloadedBytePolicy::AssumeZero`]; if that
    /// read fails nothing is written. The write runs on its own task: if the
    /// caller stops waiting, confirmed bytes are still committed.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::ChannelClosed` if a queued write of a
    /// sleeping device was dropped before it ran.
    pub async fn write_config(&self) -> Result<ResponseStatus, Error> {
        let device = self.clone();
        self.gated(async move {
            let writer = device.clone();
            Ok(device.detached(async move { writer.write_properties().await }).await)
        })
        .await
    }

    async fn read_groups(&self, groups: Vec<u8>) -> ResponseStatus {
        let mut statuses = Vec::with_capacity(groups.len());
        for group in groups {
            let exchange = self
                .inner
                .handlers
                .property_read
                .request(&self.inner.transport, &ExtendedGet::new(group))
                .await;
            if exchange.status.is_success() && exchange.decoded.is_none() {
                tracing::debug!(
                    address = %self.inner.address,
                    group,
                    "Read acknowledged without a property block"
                );
            }
            statuses.push(exchange.status);
        }
        ResponseStatus::combine(statuses)
    }

    async fn write_properties(&self) -> ResponseStatus {
        let _config = self.inner.config_lock.lock().await;

        if self.inner.unloaded_byte_policy == UnloadedBytePolicy::ReadFirst {
            let unloaded = self.inner.properties.unloaded_dirty_groups();
            if !unloaded.is_empty() {
                let status = self.read_groups(unloaded).await;
                if !status.is_success() {
                    tracing::warn!(
                        address = %self.inner.address,
                        status = %status,
                        "Reading unloaded bytes failed, nothing written"
                    );
                    return status;
                }
            }
        }

        let handler = Arc::clone(&self.inner.handlers.property_write);
        let transport = Arc::clone(&self.inner.transport);
        let pre_nak = Arc::new(AtomicBool::new(false));
        let status = self
            .inner
            .properties
            .flush(|write| {
                let handler = Arc::clone(&handler);
                let transport = Arc::clone(&transport);
                let pre_nak = Arc::clone(&pre_nak);
                async move {
                    let command = ExtendedSet::new(write.location.group, write.command)
                        .with_data(3, write.value);
                    let exchange = handler.request(&transport, &command).await;
                    if exchange.status == ResponseStatus::DirectNakPreNak {
                        pre_nak.store(true, Ordering::Release);
                    }
                    WriteOutcome {
                        status: exchange.status,
                        confirmed: exchange.decoded,
                    }
                }
            })
            .await;

        // The combined status only keeps the first failure.
        if pre_nak.load(Ordering::Acquire) {
            self.refresh_after_nak().await;
        }
        status
    }

    // ========== On/Off ==========

    /// Turns a group on.
    ///
    /// Group 0 addresses the main load. On a keypad, groups above 1 switch
    /// the button LED.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownGroup` if the device has no such group.
    pub async fn on(&self, group: u8) -> Result<ResponseStatus, Error> {
        self.switch(group, true).await
    }

    /// Turns a group off.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownGroup` if the device has no such group.
    pub async fn off(&self, group: u8) -> Result<ResponseStatus, Error> {
        self.switch(group, false).await
    }

    async fn switch(&self, group: u8, on: bool) -> Result<ResponseStatus, Error> {
        if group != 0 && !self.inner.groups.contains(group) {
            return Err(ValueError::UnknownGroup(group).into());
        }
        let device = self.clone();
        self.gated(async move { Ok(device.send_on_off(group, on).await) })
            .await
    }

    async fn send_on_off(&self, group: u8, on: bool) -> ResponseStatus {
        let keypad = self.profile() == DeviceProfile::Keypad;
        if keypad && group > 1 {
            return self.toggle_led(group, on).await;
        }

        let command = if on {
            OnOffCommand::on(group)
        } else {
            OnOffCommand::off(group)
        };
        tracing::debug!(address = %self.inner.address, command = command.name(), group, "Sending command");
        let leds = keypad.then(|| self.clone());
        let exchange = self
            .inner
            .handlers
            .on_off
            .exchange(
                &self.inner.transport,
                command.to_frame(self.inner.address),
                move |status, _| {
                    if let (true, Some(device)) = (status.is_success(), leds) {
                        device.update_leds(group, on);
                    }
                },
            )
            .await;
        self.refresh_on_nak(exchange.status).await
    }

    // ========== Inbound ==========

    /// Handles an unsolicited frame from the device.
    ///
    /// All-link broadcasts update their group and publish a
    /// [`DeviceEvent::Button`]; direct reports go to the handler that
    /// accepts them. A frame from a sleeping device also runs its queued
    /// operations. Returns `true` if the frame was consumed.
    pub fn handle_inbound(&self, frame: &Frame) -> bool {
        if frame.address != self.inner.address {
            return false;
        }
        if self.inner.wake.is_some() {
            self.spawn_wake();
        }

        let handled = match frame.group {
            Some(group) => self.handle_broadcast(group, frame),
            None => self
                .inner
                .handlers
                .thermostat
                .as_ref()
                .is_some_and(|handlers| handlers.receive(frame)),
        };
        if !handled {
            tracing::trace!(address = %self.inner.address, %frame, "Inbound frame ignored");
        }
        handled
    }

    fn handle_broadcast(&self, group: u8, frame: &Frame) -> bool {
        let Some(event) = ButtonEvent::from_cmd1(frame.cmd1) else {
            return false;
        };
        if !self.inner.groups.contains(group) {
            tracing::debug!(address = %self.inner.address, group, "Broadcast for unknown group");
            return false;
        }

        let level = if event.is_on() { 0xFF } else { 0x00 };
        self.inner.groups.update(group, Value::Level(level));
        self.publish_button(group, event, level);
        if self.profile() == DeviceProfile::Keypad {
            self.led_follow(group, level);
        }
        true
    }

    fn publish_button(&self, group: u8, event: ButtonEvent, level: u8) {
        if let Some(bus) = &self.inner.event_bus {
            bus.publish(DeviceEvent::Button {
                address: self.inner.address,
                group,
                event,
                level,
            });
        }
    }

    // ========== Wake ==========

    /// Runs every operation queued while the device was asleep, in call
    /// order. Returns the number of operations run.
    ///
    /// Does nothing for devices that do not sleep.
    pub async fn wake(&self) -> usize {
        match &self.inner.wake {
            Some(gate) => gate.wake().await,
            None => 0,
        }
    }

    /// Returns the number of operations waiting for the device to wake.
    #[must_use]
    pub fn pending_wake_operations(&self) -> usize {
        self.inner.wake.as_ref().map_or(0, WakeGate::pending)
    }

    fn spawn_wake(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(address = %self.inner.address, "No runtime to drain the wake queue");
            return;
        };
        let device = self.clone();
        handle.spawn(async move {
            device.wake().await;
        });
    }

    // ========== Helpers ==========

    /// Runs `op` now, or on the next wake for sleeping devices.
    async fn gated<R, F>(&self, op: F) -> Result<R, Error>
    where
        R: Send + 'static,
        F: Future<Output = Result<R, Error>> + Send + 'static,
    {
        match &self.inner.wake {
            Some(gate) => gate.run_on_wake(op).await?,
            None => op.await,
        }
    }

    /// Sends a command through `handler`, gated like every mutating operation.
    async fn send_gated<D, C>(
        &self,
        handler: Arc<CommandHandler<D>>,
        command: C,
    ) -> Result<ResponseStatus, Error>
    where
        D: Clone + Send + Sync + 'static,
        C: Command + Send + Sync + 'static,
    {
        let device = self.clone();
        self.gated(async move {
            let status = handler.send(&device.inner.transport, &command).await;
            Ok(device.refresh_on_nak(status).await)
        })
        .await
    }

    /// Refreshes the device status after a pre-NAK and returns `status`
    /// unchanged.
    async fn refresh_on_nak(&self, status: ResponseStatus) -> ResponseStatus {
        if status == ResponseStatus::DirectNakPreNak {
            self.refresh_after_nak().await;
        }
        status
    }

    async fn refresh_after_nak(&self) {
        tracing::debug!(address = %self.inner.address, "Device sent a pre-NAK, refreshing status");
        self.inner.status.async_status(&self.inner.transport).await;
    }

    /// Runs `op` on its own task so it finishes even if the caller stops
    /// waiting.
    async fn detached<F>(&self, op: F) -> ResponseStatus
    where
        F: Future<Output = ResponseStatus> + Send + 'static,
    {
        match tokio::spawn(op).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(address = %self.inner.address, error = %e, "Device task did not complete");
                ResponseStatus::Failure
            }
        }
    }

    fn check_capability(&self, capability: &str, supported: bool) -> Result<(), Error> {
        if supported {
            Ok(())
        } else {
            Err(Error::Device(DeviceError::UnsupportedCapability {
                capability: capability.to_string(),
            }))
        }
    }
}

/// Maps a level status report onto the groups.
pub(crate) fn apply_level_status(
    groups: &Groups,
    profile: DeviceProfile,
    status_type: u8,
    status: u8,
) {
    match (profile, status_type) {
        (DeviceProfile::Keypad, 1) => {
            for group in 2..=8u8 {
                groups.update(group, Value::OnOff(bit_is_set(status, group - 1)));
            }
        }
        (DeviceProfile::Keypad, _) => {
            groups.update(1, Value::Level(status));
        }
        (DeviceProfile::Outlet, 1) => {
            groups.update(1, Value::OnOff(bit_is_set(status, 0)));
            groups.update(2, Value::OnOff(bit_is_set(status, 1)));
        }
        _ => {
            let targets: Vec<u8> = groups
                .iter()
                .filter(|g| g.status_type() == Some(status_type))
                .map(GroupValue::group)
                .collect();
            if targets.is_empty() {
                groups.update(1, Value::Level(status));
            }
            for group in targets {
                groups.update(group, Value::Level(status));
            }
        }
    }
}

/// Maps any status report onto the groups.
pub(crate) fn apply_status_report(groups: &Groups, profile: DeviceProfile, report: &StatusReport) {
    match report {
        StatusReport::Level {
            status_type,
            status,
            ..
        } => apply_level_status(groups, profile, *status_type, *status),
        StatusReport::Thermostat(status) => thermostat::apply_status(groups, status),
        StatusReport::SetPoints(set_points) => thermostat::apply_set_points(groups, set_points),
    }
}

impl<T: Transport> fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("address", &self.inner.address)
            .field("model", &self.inner.descriptor.model)
            .field("profile", &self.inner.descriptor.profile)
            .field("groups", &self.inner.groups.ids())
            .field("wake", &self.inner.wake)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::group::GroupKind;
    use crate::protocol::Reply;
    use parking_lot::Mutex;

    struct Recording {
        status: ResponseStatus,
        sent: Mutex<Vec<Frame>>,
    }

    impl Recording {
        fn new(status: ResponseStatus) -> Arc<Self> {
            Arc::new(Self {
                status,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for Recording {
        async fn send(&self, frame: Frame) -> Reply {
            self.sent.lock().push(frame.clone());
            if self.status.is_success() {
                Reply::success(frame)
            } else {
                Reply::status(self.status)
            }
        }
    }

    fn address() -> Address {
        Address::new([0x1A, 0x2B, 0x3C])
    }

    #[tokio::test]
    async fn on_updates_group_after_ack() {
        let transport = Recording::new(ResponseStatus::Success);
        let device = Device::builder(address(), catalog::switch_linc(), Arc::clone(&transport))
            .build()
            .unwrap();

        assert_eq!(device.on(0).await.unwrap(), ResponseStatus::Success);
        assert_eq!(device.groups().value(1), Some(Value::OnOff(true)));
        assert_eq!(transport.sent.lock()[0].cmd1, 0x11);
    }

    #[tokio::test]
    async fn failed_on_leaves_group_alone() {
        let transport = Recording::new(ResponseStatus::Timeout);
        let device = Device::builder(address(), catalog::switch_linc(), transport)
            .build()
            .unwrap();

        assert_eq!(device.on(1).await.unwrap(), ResponseStatus::Timeout);
        assert_eq!(device.groups().value(1), None);
    }

    #[tokio::test]
    async fn pre_nak_refreshes_status() {
        let transport = Recording::new(ResponseStatus::DirectNakPreNak);
        let device = Device::builder(address(), catalog::switch_linc(), Arc::clone(&transport))
            .build()
            .unwrap();

        assert_eq!(device.off(1).await.unwrap(), ResponseStatus::DirectNakPreNak);
        let sent = transport.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].cmd1, 0x19);
    }

    #[tokio::test]
    async fn unknown_group_is_rejected_before_sending() {
        let transport = Recording::new(ResponseStatus::Success);
        let device = Device::builder(address(), catalog::switch_linc(), Arc::clone(&transport))
            .build()
            .unwrap();

        let err = device.on(5).await.unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::UnknownGroup(5))));
        assert!(transport.sent.lock().is_empty());
    }

    #[test]
    fn outlet_level_status_splits_bits() {
        let mut groups = Groups::new();
        groups.insert(GroupValue::new("top", address(), 1, GroupKind::OnOff));
        groups.insert(GroupValue::new("bottom", address(), 2, GroupKind::OnOff));

        apply_level_status(&groups, DeviceProfile::Outlet, 1, 0b10);
        assert!(!groups.is_on(1));
        assert!(groups.is_on(2));
    }

    #[test]
    fn inbound_from_other_address_is_ignored() {
        let transport = Recording::new(ResponseStatus::Success);
        let device = Device::builder(address(), catalog::switch_linc(), transport)
            .build()
            .unwrap();

        let frame = Frame::broadcast(Address::new([9, 9, 9]), 1, 0x11, 0xFF);
        assert!(!device.handle_inbound(&frame));
        assert_eq!(device.groups().value(1), None);
    }
}
