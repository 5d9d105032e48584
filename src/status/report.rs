// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded status reports.

use crate::command::{Command, StatusRequest, ThermostatSetPointRequest, ThermostatStatusRequest};
use crate::protocol::Frame;
use crate::types::{Address, FanMode, SystemMode};

/// Unit temperatures are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    /// Degrees Fahrenheit.
    #[default]
    Fahrenheit,
    /// Degrees Celsius; the device's native unit.
    Celsius,
}

/// Converts Celsius to Fahrenheit, rounded to one decimal.
///
/// # Examples
///
/// ```
/// use insteon_lib::status::to_fahrenheit;
///
/// assert_eq!(to_fahrenheit(200.0), 392.0);
/// assert_eq!(to_fahrenheit(21.5), 70.7);
/// ```
#[must_use]
pub fn to_fahrenheit(celsius: f32) -> f32 {
    ((celsius * 9.0 / 5.0 + 32.0) * 10.0).round() / 10.0
}

/// Which subscribers a report goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// Full status: levels, LED bits, thermostat status.
    Status,
    /// Thermostat set points only.
    SetPoint,
}

/// Decode function selected by a status type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDecoder {
    /// Standard status request; the discriminator is the status type.
    Level,
    /// Full thermostat status.
    ThermostatStatus,
    /// Thermostat set points.
    ThermostatSetPoints,
}

impl StatusDecoder {
    /// Builds the request frame for this decoder.
    #[must_use]
    pub fn request(self, discriminator: u8, address: Address) -> Frame {
        match self {
            Self::Level => StatusRequest::new(discriminator).to_frame(address),
            Self::ThermostatStatus => ThermostatStatusRequest.to_frame(address),
            Self::ThermostatSetPoints => ThermostatSetPointRequest.to_frame(address),
        }
    }

    /// Decodes a response frame.
    ///
    /// Returns `None` if the frame does not have the expected shape.
    #[must_use]
    pub fn decode(self, discriminator: u8, frame: &Frame, unit: TemperatureUnit) -> Option<StatusReport> {
        match self {
            Self::Level => Some(StatusReport::Level {
                status_type: discriminator,
                db_version: frame.cmd1,
                status: frame.cmd2,
            }),
            Self::ThermostatStatus => ThermostatStatus::decode(frame, unit).map(StatusReport::Thermostat),
            Self::ThermostatSetPoints => {
                ThermostatSetPoints::decode(frame).map(StatusReport::SetPoints)
            }
        }
    }
}

/// A decoded status response.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusReport {
    /// Answer to a standard status request.
    Level {
        /// Discriminator the request was sent with.
        status_type: u8,
        /// Link database version (`cmd1`).
        db_version: u8,
        /// Status byte (`cmd2`).
        status: u8,
    },
    /// Full thermostat status.
    Thermostat(ThermostatStatus),
    /// Thermostat set points.
    SetPoints(ThermostatSetPoints),
}

impl StatusReport {
    /// Returns the subscriber category of the report.
    #[must_use]
    pub const fn category(&self) -> StatusCategory {
        match self {
            Self::Level { .. } | Self::Thermostat(_) => StatusCategory::Status,
            Self::SetPoints(_) => StatusCategory::SetPoint,
        }
    }
}

/// Full thermostat status.
///
/// Fields are listed in report order, see [`FIELDS`](Self::FIELDS).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThermostatStatus {
    /// Day of week, Sunday is 0.
    pub day: u8,
    /// Hour.
    pub hour: u8,
    /// Minute.
    pub minute: u8,
    /// Second.
    pub second: u8,
    /// System mode; `None` for an unknown code.
    pub system_mode: Option<SystemMode>,
    /// Fan mode.
    pub fan_mode: FanMode,
    /// Cool set point.
    pub cool_set_point: u8,
    /// Relative humidity.
    pub humidity: u8,
    /// Temperature, in the unit selected at decode time.
    pub temperature: f32,
    /// Cooling is running.
    pub cooling: bool,
    /// Heating is running.
    pub heating: bool,
    /// The device displays Celsius.
    pub celsius: bool,
    /// Heat set point.
    pub heat_set_point: u8,
}

impl ThermostatStatus {
    /// Field names in report order.
    pub const FIELDS: [&'static str; 13] = [
        "day",
        "hour",
        "minute",
        "second",
        "system_mode",
        "fan_mode",
        "cool_set_point",
        "humidity",
        "temperature",
        "cooling",
        "heating",
        "celsius",
        "heat_set_point",
    ];

    /// Decodes a `2E/02` status response.
    ///
    /// The raw temperature is tenths of a degree Celsius in `data8..data9`;
    /// it is converted once, here, to `unit`.
    #[must_use]
    pub fn decode(frame: &Frame, unit: TemperatureUnit) -> Option<Self> {
        let data = frame.user_data?;
        if frame.cmd2 != ThermostatStatusRequest::CMD2 {
            return None;
        }
        let d = |field| data.get(field).unwrap_or_default();

        let raw = (u16::from(d(8)) << 8) | u16::from(d(9));
        let celsius = f32::from(raw) / 10.0;
        let temperature = match unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => to_fahrenheit(celsius),
        };
        let flags = d(10);

        Some(Self {
            day: d(1),
            hour: d(2),
            minute: d(3),
            second: d(4),
            system_mode: SystemMode::from_nibble(d(5) >> 4),
            fan_mode: FanMode::from_nibble(d(5)),
            cool_set_point: d(6),
            humidity: d(7),
            temperature,
            cooling: flags & 0x01 != 0,
            heating: flags & 0x02 != 0,
            celsius: flags & 0x08 != 0,
            heat_set_point: d(11),
        })
    }
}

/// Thermostat set points.
///
/// Fields are listed in report order, see [`FIELDS`](Self::FIELDS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ThermostatSetPoints {
    /// Dehumidify above this humidity.
    pub humidity_high: u8,
    /// Humidify below this humidity.
    pub humidity_low: u8,
    /// Firmware version.
    pub firmware: u8,
    /// Cool set point.
    pub cool_set_point: u8,
    /// Heat set point.
    pub heat_set_point: u8,
    /// RF offset.
    pub rf_offset: u8,
}

impl ThermostatSetPoints {
    /// Field names in report order.
    pub const FIELDS: [&'static str; 6] = [
        "humidity_high",
        "humidity_low",
        "firmware",
        "cool_set_point",
        "heat_set_point",
        "rf_offset",
    ];

    /// Decodes a set point response (`data2` and `data3` both `0x01`).
    #[must_use]
    pub fn decode(frame: &Frame) -> Option<Self> {
        let data = frame.user_data?;
        if data.get(2) != Some(0x01) || data.get(3) != Some(ThermostatSetPointRequest::MARKER) {
            return None;
        }
        let d = |field| data.get(field).unwrap_or_default();
        Some(Self {
            humidity_high: d(4),
            humidity_low: d(5),
            firmware: d(6),
            cool_set_point: d(7),
            heat_set_point: d(8),
            rf_offset: d(9),
        })
    }
}
