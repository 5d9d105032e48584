// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device builder.

use std::sync::Arc;

use crate::config::{PropertyRegistry, UnloadedBytePolicy};
use crate::error::Error;
use crate::event::EventBus;
use crate::group::{GroupValue, Groups, Value};
use crate::protocol::Transport;
use crate::status::{StatusCategory, StatusManager};
use crate::types::Address;

use super::thermostat;
use super::wake::WakeGate;
use super::{Device, DeviceDescriptor, DeviceInner, DeviceProfile, Handlers, apply_status_report};

/// Builder for [`Device`].
///
/// Created with [`Device::builder`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use insteon_lib::catalog;
/// use insteon_lib::config::UnloadedBytePolicy;
/// use insteon_lib::device::Device;
/// use insteon_lib::event::EventBus;
/// use insteon_lib::protocol::{Frame, Reply, Transport};
/// use insteon_lib::types::Address;
///
/// struct EchoTransport;
///
/// impl Transport for EchoTransport {
///     async fn send(&self, frame: Frame) -> Reply {
///         Reply::success(frame)
///     }
/// }
///
/// let bus = EventBus::new();
/// let device = Device::builder(
///     Address::new([0x0A, 0x0B, 0x0C]),
///     catalog::keypad_linc_8(),
///     Arc::new(EchoTransport),
/// )
/// .with_event_bus(bus.clone())
/// .with_unloaded_byte_policy(UnloadedBytePolicy::AssumeZero)
/// .build()
/// .unwrap();
///
/// assert_eq!(device.groups().len(), 8);
/// ```
pub struct DeviceBuilder<T: Transport> {
    address: Address,
    descriptor: DeviceDescriptor,
    transport: Arc<T>,
    event_bus: Option<EventBus>,
    unloaded_byte_policy: UnloadedBytePolicy,
}

impl<T: Transport> DeviceBuilder<T> {
    pub(crate) fn new(address: Address, descriptor: DeviceDescriptor, transport: Arc<T>) -> Self {
        Self {
            address,
            descriptor,
            transport,
            event_bus: None,
            unloaded_byte_policy: UnloadedBytePolicy::default(),
        }
    }

    /// Publishes group changes and button events to `bus`.
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Sets how a configuration write treats bytes that were never read.
    #[must_use]
    pub fn with_unloaded_byte_policy(mut self, policy: UnloadedBytePolicy) -> Self {
        self.unloaded_byte_policy = policy;
        self
    }

    /// Builds the device.
    ///
    /// Nothing is sent to the device.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::InvalidConfiguration` if the descriptor fails
    /// validation or declares conflicting properties.
    pub fn build(self) -> Result<Device<T>, Error> {
        let Self {
            address,
            descriptor,
            transport,
            event_bus,
            unloaded_byte_policy,
        } = self;
        descriptor.validate()?;
        let profile = descriptor.profile;

        let properties = Arc::new(PropertyRegistry::from_defs(address, &descriptor.properties)?);

        let mut groups = Groups::new();
        for def in &descriptor.groups {
            let mut group = GroupValue::new(def.name.as_str(), address, def.id, def.kind);
            if let Some(default) = def.default {
                group = group.with_default(default);
            }
            if let Some(status_type) = def.status_type {
                group = group.with_status_type(status_type);
            }
            if let Some(bus) = &event_bus {
                group = group.with_event_bus(bus.clone());
            }
            groups.insert(group);
        }
        let groups = Arc::new(groups);

        let mut status = StatusManager::new(address);
        if profile == DeviceProfile::Thermostat {
            status = status.with_unit_source(thermostat::unit_source(&properties));
        }
        for status_type in &descriptor.status_types {
            status.add_status_type(status_type.discriminator, status_type.decoder);
        }
        let status = Arc::new(status);

        let handlers = Handlers::new(address, profile);
        wire(&handlers, &status, &properties, &groups, profile);

        let wake = descriptor.battery.then(WakeGate::new);
        let device = Device {
            inner: Arc::new(DeviceInner {
                address,
                descriptor,
                transport,
                properties,
                groups,
                status,
                handlers,
                event_bus,
                unloaded_byte_policy,
                wake,
                config_lock: tokio::sync::Mutex::new(()),
                led_lock: Arc::new(tokio::sync::Mutex::new(())),
            }),
        };
        if profile == DeviceProfile::Thermostat {
            device.watch_celsius();
        }

        tracing::debug!(
            address = %address,
            model = %device.model(),
            profile = profile.name(),
            battery = device.is_battery(),
            "Device built"
        );
        Ok(device)
    }
}

/// Connects handler and status results to the registry and the groups.
fn wire(
    handlers: &Handlers,
    status: &StatusManager,
    properties: &Arc<PropertyRegistry>,
    groups: &Arc<Groups>,
    profile: DeviceProfile,
) {
    let registry = Arc::clone(properties);
    handlers.property_read.subscribe(move |(group, data)| {
        registry.load_group(*group, data);
    });

    let targets = Arc::clone(groups);
    handlers.on_off.subscribe(move |(group, level)| {
        targets.update(*group, Value::Level(*level));
    });

    for category in [StatusCategory::Status, StatusCategory::SetPoint] {
        let targets = Arc::clone(groups);
        status.subscribe(category, move |report| {
            apply_status_report(&targets, profile, report);
        });
    }

    if let Some(thermostat) = &handlers.thermostat {
        thermostat.wire(groups);
    }
}

impl<T: Transport> std::fmt::Debug for DeviceBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuilder")
            .field("address", &self.address)
            .field("model", &self.descriptor.model)
            .field("unloaded_byte_policy", &self.unloaded_byte_policy)
            .finish_non_exhaustive()
    }
}
