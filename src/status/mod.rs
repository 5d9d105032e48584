// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status reports and the status request cycle.
//!
//! A device asks for its status with one request per registered status
//! type. The answer to each request is decoded by the [`StatusDecoder`]
//! registered for its discriminator into a [`StatusReport`], which the
//! [`StatusManager`] hands to the subscribers of the report's category.
//! The device subscribes and maps the reports onto its groups.
//!
//! | Decoder | Request | Report |
//! |---------|---------|--------|
//! | [`StatusDecoder::Level`] | `19/type` | [`StatusReport::Level`] |
//! | [`StatusDecoder::ThermostatStatus`] | `2E/02` | [`ThermostatStatus`] |
//! | [`StatusDecoder::ThermostatSetPoints`] | `2E/00`, d3=01 | [`ThermostatSetPoints`] |

mod manager;
mod report;

pub use manager::{StatusManager, UnitSource};
pub use report::{
    StatusCategory, StatusDecoder, StatusReport, TemperatureUnit, ThermostatSetPoints,
    ThermostatStatus, to_fahrenheit,
};
