// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device-wide event dispatch.
//!
//! Group values notify their own subscribers first. When a device is built
//! with an [`EventBus`], every change is then also published as a
//! [`DeviceEvent`], keyed by group identifier and event name.
//!
//! # Examples
//!
//! ```
//! use insteon_lib::event::{DeviceEvent, EventBus};
//! use insteon_lib::group::{GroupKind, GroupValue, Value};
//! use insteon_lib::types::Address;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let group = GroupValue::new("on_off_switch", Address::new([1, 2, 3]), 1, GroupKind::OnOff)
//!     .with_event_bus(bus.clone());
//! group.set_value(Value::OnOff(true)).unwrap();
//!
//! let event = rx.try_recv().unwrap();
//! assert_eq!(event.key(), (1, "value_changed"));
//! ```

mod device_event;
mod event_bus;

pub use device_event::{ButtonEvent, DeviceEvent};
pub use event_bus::EventBus;
