// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Insteon` Lib - A Rust library modelling Insteon devices.
//!
//! This library keeps a local model of each device in sync with the device
//! itself. It does not talk to a modem: frames go through a [`Transport`]
//! you provide.
//!
//! # Supported Features
//!
//! - **Configuration properties**: named bit fields packed into memory bytes,
//!   staged locally and written back with one command per byte
//! - **Groups**: typed, observable values for each load, button LED or
//!   sensor reading
//! - **Commands**: on/off, LED masks, thermostat set points, modes and clock
//! - **Status**: status requests decoded by type and mapped onto groups
//! - **Sleeping devices**: operations queued until the device wakes
//!
//! # Supported Devices
//!
//! The [`catalog`] has descriptors for `SwitchLinc`, `ToggleLinc`,
//! `InLineLinc`, `OutletLinc`, `DinRail`, `ApplianceLinc`, `KeypadLinc` (6
//! and 8 buttons), the On/Off outlet and the wired and wireless thermostats.
//! Other devices are described with a [`DeviceDescriptor`].
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use insteon_lib::protocol::{Frame, Reply, Transport};
//! use insteon_lib::{Address, Device, ResponseStatus, catalog};
//!
//! struct EchoTransport;
//!
//! impl Transport for EchoTransport {
//!     async fn send(&self, frame: Frame) -> Reply {
//!         Reply::success(frame)
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> insteon_lib::Result<()> {
//!     let device = Device::builder(
//!         Address::new([0x1A, 0x2B, 0x3C]),
//!         catalog::thermostat(),
//!         Arc::new(EchoTransport),
//!     )
//!     .build()?;
//!
//!     // Out-of-range set points are clamped before they are sent.
//!     assert_eq!(device.set_cool_set_point(150).await?, ResponseStatus::Success);
//!
//!     // Configuration changes are staged, then written.
//!     device.set_property("backlight", 30)?;
//!     device.write_config().await?;
//!     assert_eq!(device.properties().value("backlight"), Some(30));
//!     Ok(())
//! }
//! ```
//!
//! ## Events
//!
//! Group changes and button presses can be published on an [`EventBus`]:
//!
//! ```
//! use std::sync::Arc;
//!
//! use insteon_lib::event::{DeviceEvent, EventBus};
//! use insteon_lib::protocol::{Frame, Reply, Transport};
//! use insteon_lib::{Address, Device, catalog};
//!
//! # struct EchoTransport;
//! # impl Transport for EchoTransport {
//! #     async fn send(&self, frame: Frame) -> Reply {
//! #         Reply::success(frame)
//! #     }
//! # }
//! let address = Address::new([0x1A, 0x2B, 0x3C]);
//! let bus = EventBus::new();
//! let mut events = bus.subscribe();
//! let device = Device::builder(address, catalog::keypad_linc_6(), Arc::new(EchoTransport))
//!     .with_event_bus(bus)
//!     .build()
//!     .unwrap();
//!
//! // Button A pressed.
//! device.handle_inbound(&Frame::broadcast(address, 3, 0x11, 0xFF));
//! assert!(matches!(
//!     events.try_recv(),
//!     Ok(DeviceEvent::GroupChanged { group: 3, .. })
//! ));
//! ```

pub mod catalog;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod group;
pub mod protocol;
pub mod status;
pub mod subscription;
pub mod types;

pub use command::{Command, CommandHandler};
pub use config::{PropertyDef, PropertyRegistry, UnloadedBytePolicy};
pub use device::{Device, DeviceBuilder, DeviceDescriptor, DeviceProfile, GroupDef};
pub use error::{DeviceError, Error, ProtocolError, Result, ValueError};
pub use event::{ButtonEvent, DeviceEvent, EventBus};
pub use group::{GroupKind, GroupValue, Groups, Value};
pub use protocol::{Frame, Reply, Transport, UserData};
pub use status::{StatusManager, StatusReport, TemperatureUnit};
pub use subscription::{CallbackRegistry, SubscriptionId};
pub use types::{Address, FanMode, ResponseStatus, SystemMode, ThermostatMode, ToggleMode};
