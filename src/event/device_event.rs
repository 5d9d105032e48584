// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::group::Value;
use crate::types::Address;

/// Button press reported by a device or caused by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonEvent {
    /// Turned on.
    On,
    /// Turned off.
    Off,
    /// Double-tapped on.
    FastOn,
    /// Double-tapped off.
    FastOff,
}

impl ButtonEvent {
    /// Decodes the `cmd1` of an all-link broadcast.
    #[must_use]
    pub const fn from_cmd1(cmd1: u8) -> Option<Self> {
        match cmd1 {
            0x11 => Some(Self::On),
            0x12 => Some(Self::FastOn),
            0x13 => Some(Self::Off),
            0x14 => Some(Self::FastOff),
            _ => None,
        }
    }

    /// Returns `true` for the two "on" events.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On | Self::FastOn)
    }

    /// Returns the event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::On => "on_event",
            Self::Off => "off_event",
            Self::FastOn => "on_fast_event",
            Self::FastOff => "off_fast_event",
        }
    }
}

/// Events published on a device's [`EventBus`](super::EventBus).
///
/// Every event is keyed by a group identifier and an event name, see
/// [`key`](Self::key).
///
/// # Examples
///
/// ```
/// use insteon_lib::event::{ButtonEvent, DeviceEvent};
/// use insteon_lib::types::Address;
///
/// let event = DeviceEvent::Button {
///     address: Address::new([1, 2, 3]),
///     group: 3,
///     event: ButtonEvent::On,
///     level: 0xFF,
/// };
/// assert_eq!(event.key(), (3, "on_event"));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DeviceEvent {
    /// A group value changed.
    GroupChanged {
        /// Device address.
        address: Address,
        /// Group identifier.
        group: u8,
        /// Group name.
        name: String,
        /// New value.
        value: Value,
    },

    /// A button was pressed, or a button LED was switched by a command.
    Button {
        /// Device address.
        address: Address,
        /// Group identifier of the button.
        group: u8,
        /// What happened.
        event: ButtonEvent,
        /// Level sent with the event.
        level: u8,
    },
}

impl DeviceEvent {
    /// Returns the address of the device the event belongs to.
    #[must_use]
    pub const fn address(&self) -> Address {
        match self {
            Self::GroupChanged { address, .. } | Self::Button { address, .. } => *address,
        }
    }

    /// Returns the dispatch key: group identifier and event name.
    #[must_use]
    pub const fn key(&self) -> (u8, &'static str) {
        match self {
            Self::GroupChanged { group, .. } => (*group, "value_changed"),
            Self::Button { group, event, .. } => (*group, event.name()),
        }
    }
}
