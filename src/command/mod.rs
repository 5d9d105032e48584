// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command definitions.
//!
//! This module provides typed representations of the commands sent to
//! devices, and the [`CommandHandler`] that runs one command/response
//! exchange and publishes its decoded result.
//!
//! # Available Commands
//!
//! | Command Type | Frame | Purpose |
//! |-------------|-------|---------|
//! | [`ExtendedGet`] | `2E/00`, d1=group | Read a property block |
//! | [`ExtendedSet`] | `2E/xx`, d1=group, d2=sub-command | Write a memory byte or setting |
//! | [`StatusRequest`] | `19/type` | Query a status byte |
//! | [`ThermostatStatusRequest`] | `2E/02` | Query the full thermostat status |
//! | [`ThermostatSetPointRequest`] | `2E/00`, d3=01 | Query thermostat set points |
//! | [`SetPointCommand`] | `6C`/`6D` | Set the cool or heat set point |
//! | [`ThermostatModeCommand`] | `6B` | Set the thermostat mode |
//! | [`SetDayTimeCommand`] | `2E/02`, d1=02 | Set the thermostat clock |
//! | [`OnOffCommand`] | `11`/`13` | Switch a group on or off |
//! | [`SetLedsCommand`] | `2E/00`, d2=09 | Set every keypad button LED |
//!
//! # Examples
//!
//! ```
//! use insteon_lib::command::{Command, SetPointCommand};
//! use insteon_lib::types::Address;
//!
//! let cmd = SetPointCommand::Cool(72);
//! let frame = cmd.to_frame(Address::new([1, 2, 3]));
//!
//! assert_eq!(cmd.name(), "cool_set_point");
//! assert_eq!((frame.cmd1, frame.cmd2), (0x6C, 72));
//! ```

mod extended;
mod handler;
mod light;
mod status;
mod thermostat;

pub use extended::{ExtendedGet, ExtendedSet};
pub use handler::{CommandHandler, Decoder, Exchange, HandlerState};
pub use light::{OnOffCommand, SetLedsCommand};
pub use status::{StatusRequest, ThermostatSetPointRequest, ThermostatStatusRequest};
pub use thermostat::{SetDayTimeCommand, SetPointCommand, ThermostatModeCommand};

pub(crate) use handler::spawn_exchange;

use crate::protocol::Frame;
use crate::types::Address;

/// `cmd1` of an extended get/set.
pub const EXTENDED_GET_SET: u8 = 0x2E;

/// A command that can be sent to a device.
pub trait Command {
    /// Returns a short name for logging.
    fn name(&self) -> &'static str;

    /// Builds the frame sent to the device at `address`.
    fn to_frame(&self, address: Address) -> Frame;
}
