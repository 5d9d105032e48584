// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! - [`Address`] - Three-byte device address
//! - [`ResponseStatus`] - Outcome of a command/response exchange
//! - [`ThermostatMode`], [`SystemMode`], [`FanMode`] - Climate control modes
//! - [`ToggleMode`] - Keypad button press behavior

mod address;
mod response_status;
mod thermostat;
mod toggle;

pub use address::Address;
pub use response_status::ResponseStatus;
pub use thermostat::{FanMode, SystemMode, ThermostatMode};
pub use toggle::ToggleMode;
