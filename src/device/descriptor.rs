// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declarative device descriptors.

use std::collections::BTreeSet;

use crate::config::PropertyDef;
use crate::error::DeviceError;
use crate::group::{GroupKind, Value};
use crate::status::StatusDecoder;

/// Behavior family of a device.
///
/// The profile selects which operations a device supports and how status
/// reports map onto its groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceProfile {
    /// On/off responder with one load.
    Switch,
    /// Keypad with a main load and button LEDs.
    Keypad,
    /// Dual outlet with independent top and bottom loads.
    Outlet,
    /// Climate control.
    Thermostat,
}

impl DeviceProfile {
    /// Returns the groups a descriptor of this profile must declare.
    #[must_use]
    pub const fn required_groups(&self) -> &'static [u8] {
        match self {
            Self::Switch | Self::Keypad => &[1],
            Self::Outlet => &[1, 2],
            Self::Thermostat => &[1, 2, 3, 4, 10, 11, 12, 13, 14, 15, 16, 17],
        }
    }

    /// Returns the profile name used in messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Keypad => "keypad",
            Self::Outlet => "outlet",
            Self::Thermostat => "thermostat",
        }
    }
}

/// Declaration of one group.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupDef {
    /// Group identifier, unique per device.
    pub id: u8,
    /// Group name.
    pub name: String,
    /// Kind of value the group holds.
    pub kind: GroupKind,
    /// Initial value.
    #[serde(default)]
    pub default: Option<Value>,
    /// Status type whose report carries the group's value.
    #[serde(default)]
    pub status_type: Option<u8>,
}

impl GroupDef {
    /// Declares a group.
    #[must_use]
    pub fn new(id: u8, name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            default: None,
            status_type: None,
        }
    }

    /// Sets the initial value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the status type.
    #[must_use]
    pub fn with_status_type(mut self, status_type: u8) -> Self {
        self.status_type = Some(status_type);
        self
    }
}

/// A status type requested by the device's status cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StatusTypeDef {
    /// Discriminator of the status type.
    pub discriminator: u8,
    /// Decoder for its responses.
    pub decoder: StatusDecoder,
}

/// Everything that distinguishes one device model from another.
///
/// A descriptor lists the model's groups, configuration properties and
/// status types. Descriptors compose: the `with_*` methods replace an entry
/// with the same key, and [`extend`](Self::extend) lays one descriptor over
/// another. The [`catalog`](crate::catalog) module has built-in
/// descriptors; others can be loaded from JSON.
///
/// # Examples
///
/// ```
/// use insteon_lib::catalog;
/// use insteon_lib::config::PropertyDef;
/// use insteon_lib::device::DeviceDescriptor;
///
/// // A switch with an extra read-only byte.
/// let descriptor = catalog::switch_linc()
///     .with_property(PropertyDef::new("ramp_rate", 0, 7));
/// assert_eq!(descriptor.properties.len(), 3);
///
/// let json = r#"{
///     "model": "2477S",
///     "profile": "switch",
///     "groups": [{ "id": 1, "name": "on_off_switch", "kind": "on_off", "status_type": 0 }],
///     "status_types": [{ "discriminator": 0, "decoder": "level" }]
/// }"#;
/// let descriptor = DeviceDescriptor::from_json(json).unwrap();
/// assert!(descriptor.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeviceDescriptor {
    /// Model name.
    pub model: String,
    /// Behavior family.
    pub profile: DeviceProfile,
    /// The device sleeps and only listens after waking.
    #[serde(default)]
    pub battery: bool,
    /// Configuration properties.
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    /// Groups.
    #[serde(default)]
    pub groups: Vec<GroupDef>,
    /// Status types, in request order.
    #[serde(default)]
    pub status_types: Vec<StatusTypeDef>,
}

impl DeviceDescriptor {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new(model: impl Into<String>, profile: DeviceProfile) -> Self {
        Self {
            model: model.into(),
            profile,
            battery: false,
            properties: Vec::new(),
            groups: Vec::new(),
            status_types: Vec::new(),
        }
    }

    /// Parses a descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::InvalidConfiguration` if the JSON does not
    /// describe a descriptor.
    pub fn from_json(json: &str) -> Result<Self, DeviceError> {
        serde_json::from_str(json)
            .map_err(|e| DeviceError::InvalidConfiguration(format!("descriptor: {e}")))
    }

    /// Renames the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Marks the device as battery powered.
    #[must_use]
    pub fn with_battery(mut self, battery: bool) -> Self {
        self.battery = battery;
        self
    }

    /// Adds a property, replacing one with the same name.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
        self
    }

    /// Adds a group, replacing one with the same identifier.
    #[must_use]
    pub fn with_group(mut self, group: GroupDef) -> Self {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
        self
    }

    /// Adds a status type, replacing the decoder of an existing one.
    #[must_use]
    pub fn with_status_type(mut self, discriminator: u8, decoder: StatusDecoder) -> Self {
        match self
            .status_types
            .iter_mut()
            .find(|s| s.discriminator == discriminator)
        {
            Some(existing) => existing.decoder = decoder,
            None => self.status_types.push(StatusTypeDef {
                discriminator,
                decoder,
            }),
        }
        self
    }

    /// Removes a status type. Removing a missing one is a no-op.
    #[must_use]
    pub fn without_status_type(mut self, discriminator: u8) -> Self {
        self.status_types.retain(|s| s.discriminator != discriminator);
        self
    }

    /// Lays `other` over this descriptor.
    ///
    /// The model, profile and battery flag are taken from `other`; its
    /// properties, groups and status types replace entries with the same key
    /// and add the rest.
    #[must_use]
    pub fn extend(self, other: Self) -> Self {
        let mut merged = self
            .with_model(other.model)
            .with_battery(other.battery);
        merged.profile = other.profile;
        for property in other.properties {
            merged = merged.with_property(property);
        }
        for group in other.groups {
            merged = merged.with_group(group);
        }
        for status in other.status_types {
            merged = merged.with_status_type(status.discriminator, status.decoder);
        }
        merged
    }

    /// Returns the group identifiers that are keypad buttons.
    #[must_use]
    pub fn buttons(&self) -> Vec<u8> {
        let buttons: BTreeSet<u8> = self
            .groups
            .iter()
            .filter(|g| (1..=8).contains(&g.id) && g.kind == GroupKind::OnOff)
            .map(|g| g.id)
            .collect();
        buttons.into_iter().collect()
    }

    /// Checks the descriptor.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::InvalidConfiguration` if:
    /// - a group identifier is declared twice
    /// - a group required by the profile is missing
    /// - a status type is declared twice
    pub fn validate(&self) -> Result<(), DeviceError> {
        let mut ids = BTreeSet::new();
        for group in &self.groups {
            if !ids.insert(group.id) {
                return Err(DeviceError::InvalidConfiguration(format!(
                    "{}: duplicate group {}",
                    self.model, group.id
                )));
            }
        }
        if let Some(missing) = self
            .profile
            .required_groups()
            .iter()
            .find(|id| !ids.contains(id))
        {
            return Err(DeviceError::InvalidConfiguration(format!(
                "{}: {} profile requires group {missing}",
                self.model,
                self.profile.name()
            )));
        }

        let mut discriminators = BTreeSet::new();
        for status in &self.status_types {
            if !discriminators.insert(status.discriminator) {
                return Err(DeviceError::InvalidConfiguration(format!(
                    "{}: duplicate status type {}",
                    self.model, status.discriminator
                )));
            }
        }
        Ok(())
    }
}
