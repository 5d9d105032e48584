// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;

use crate::command::{
    CommandHandler, ExtendedSet, SetDayTimeCommand, SetPointCommand, ThermostatModeCommand,
};
use crate::config::{PropertyRegistry, names};
use crate::error::{DeviceError, Error};
use crate::group::{Groups, Value};
use crate::protocol::{Frame, Transport};
use crate::status::{TemperatureUnit, ThermostatSetPoints, ThermostatStatus, UnitSource};
use crate::types::{Address, FanMode, ResponseStatus, SystemMode, ThermostatMode};

use super::Device;

/// Thermostat group identifiers.
mod ids {
    pub(super) const COOLING: u8 = 1;
    pub(super) const HEATING: u8 = 2;
    pub(super) const TEMPERATURE: u8 = 10;
    pub(super) const HUMIDITY: u8 = 11;
    pub(super) const SYSTEM_MODE: u8 = 12;
    pub(super) const FAN_MODE: u8 = 13;
    pub(super) const COOL_SET_POINT: u8 = 14;
    pub(super) const HEAT_SET_POINT: u8 = 15;
    pub(super) const HUMIDITY_HIGH: u8 = 16;
    pub(super) const HUMIDITY_LOW: u8 = 17;
}

const SET_NOTIFY_CHANGES: u8 = 0x08;
const SET_MASTER: u8 = 0x09;
const SET_HUMIDITY_HIGH: u8 = 0x0B;
const SET_HUMIDITY_LOW: u8 = 0x0C;

const TEMPERATURE_REPORT: u8 = 0x6E;
const HUMIDITY_REPORT: u8 = 0x6F;
const MODE_REPORT: u8 = 0x70;
const COOL_SET_POINT_REPORT: u8 = 0x71;
const HEAT_SET_POINT_REPORT: u8 = 0x72;

fn acknowledged_cmd2(request: &Frame, response: Option<&Frame>) -> Option<u8> {
    Some(response.unwrap_or(request).cmd2)
}

pub(crate) struct ThermostatHandlers {
    cool_set_point: Arc<CommandHandler<u8>>,
    heat_set_point: Arc<CommandHandler<u8>>,
    humidity_set_point: Arc<CommandHandler<(u8, u8)>>,
    mode: Arc<CommandHandler<ThermostatMode>>,
    extended_set: Arc<CommandHandler<()>>,
    temperature_report: CommandHandler<f32>,
    humidity_report: CommandHandler<u8>,
    mode_report: CommandHandler<(Option<SystemMode>, FanMode)>,
    cool_set_point_report: CommandHandler<u8>,
    heat_set_point_report: CommandHandler<u8>,
}

impl ThermostatHandlers {
    pub(crate) fn new(address: Address) -> Self {
        Self {
            cool_set_point: Arc::new(CommandHandler::new(
                "cool_set_point",
                address,
                acknowledged_cmd2,
            )),
            heat_set_point: Arc::new(CommandHandler::new(
                "heat_set_point",
                address,
                acknowledged_cmd2,
            )),
            humidity_set_point: Arc::new(CommandHandler::new(
                "humidity_set_point",
                address,
                |request, _| Some((request.data(2)?, request.data(3)?)),
            )),
            mode: Arc::new(CommandHandler::new("thermostat_mode", address, |request, _| {
                ThermostatMode::from_command_code(request.cmd2)
            })),
            extended_set: Arc::new(CommandHandler::new("extended_set", address, |_, _| {
                Some(())
            })),
            temperature_report: CommandHandler::new("temperature_report", address, |frame, _| {
                Some(f32::from(frame.cmd2) * 0.5)
            })
            .with_inbound(TEMPERATURE_REPORT),
            humidity_report: CommandHandler::new("humidity_report", address, |frame, _| {
                Some(frame.cmd2)
            })
            .with_inbound(HUMIDITY_REPORT),
            mode_report: CommandHandler::new("mode_report", address, |frame, _| {
                Some((
                    SystemMode::from_nibble(frame.cmd2 & 0x0F),
                    FanMode::from_nibble(frame.cmd2 >> 4),
                ))
            })
            .with_inbound(MODE_REPORT),
            cool_set_point_report: CommandHandler::new(
                "cool_set_point_report",
                address,
                acknowledged_cmd2,
            )
            .with_inbound(COOL_SET_POINT_REPORT),
            heat_set_point_report: CommandHandler::new(
                "heat_set_point_report",
                address,
                acknowledged_cmd2,
            )
            .with_inbound(HEAT_SET_POINT_REPORT),
        }
    }

    /// Routes decoded results to the groups.
    pub(crate) fn wire(&self, groups: &Arc<Groups>) {
        for (handler, group) in [
            (&self.cool_set_point, ids::COOL_SET_POINT),
            (&self.heat_set_point, ids::HEAT_SET_POINT),
        ] {
            let targets = Arc::clone(groups);
            handler.subscribe(move |value| {
                targets.update(group, Value::SetPoint(*value));
            });
        }
        for (handler, group) in [
            (&self.cool_set_point_report, ids::COOL_SET_POINT),
            (&self.heat_set_point_report, ids::HEAT_SET_POINT),
        ] {
            let targets = Arc::clone(groups);
            handler.subscribe(move |value| {
                targets.update(group, Value::SetPoint(*value));
            });
        }

        let targets = Arc::clone(groups);
        self.humidity_set_point.subscribe(move |(sub_command, humidity)| {
            let group = match *sub_command {
                SET_HUMIDITY_HIGH => ids::HUMIDITY_HIGH,
                SET_HUMIDITY_LOW => ids::HUMIDITY_LOW,
                _ => return,
            };
            targets.update(group, Value::Humidity(*humidity));
        });

        let targets = Arc::clone(groups);
        self.mode.subscribe(move |mode| {
            if let Some(fan) = FanMode::from_mode(*mode) {
                targets.update(ids::FAN_MODE, Value::FanMode(fan));
            } else if let Some(system) = SystemMode::from_mode(*mode) {
                targets.update(ids::SYSTEM_MODE, Value::SystemMode(system));
            }
        });

        let targets = Arc::clone(groups);
        self.temperature_report.subscribe(move |temperature| {
            targets.update(ids::TEMPERATURE, Value::Temperature(*temperature));
        });

        let targets = Arc::clone(groups);
        self.humidity_report.subscribe(move |humidity| {
            targets.update(ids::HUMIDITY, Value::Humidity(*humidity));
        });

        let targets = Arc::clone(groups);
        self.mode_report.subscribe(move |(system, fan)| {
            if let Some(system) = system {
                targets.update(ids::SYSTEM_MODE, Value::SystemMode(*system));
            }
            targets.update(ids::FAN_MODE, Value::FanMode(*fan));
        });
    }

    /// Hands an unsolicited direct report to the handler that accepts it.
    pub(crate) fn receive(&self, frame: &Frame) -> bool {
        if self.temperature_report.matches(frame) {
            self.temperature_report.receive(frame)
        } else if self.humidity_report.matches(frame) {
            self.humidity_report.receive(frame)
        } else if self.mode_report.matches(frame) {
            self.mode_report.receive(frame)
        } else if self.cool_set_point_report.matches(frame) {
            self.cool_set_point_report.receive(frame)
        } else if self.heat_set_point_report.matches(frame) {
            self.heat_set_point_report.receive(frame)
        } else {
            false
        }
    }
}

/// Reads the temperature unit from the `celsius` flag.
pub(crate) fn unit_source(properties: &Arc<PropertyRegistry>) -> UnitSource {
    let properties = Arc::clone(properties);
    Arc::new(move || {
        if properties.value(names::CELSIUS) == Some(1) {
            TemperatureUnit::Celsius
        } else {
            TemperatureUnit::Fahrenheit
        }
    })
}

pub(crate) fn apply_status(targets: &Groups, status: &ThermostatStatus) {
    targets.update(ids::COOLING, Value::OnOff(status.cooling));
    targets.update(ids::HEATING, Value::OnOff(status.heating));
    if let Some(system) = status.system_mode {
        targets.update(ids::SYSTEM_MODE, Value::SystemMode(system));
    }
    targets.update(ids::FAN_MODE, Value::FanMode(status.fan_mode));
    targets.update(ids::COOL_SET_POINT, Value::SetPoint(status.cool_set_point));
    targets.update(ids::HEAT_SET_POINT, Value::SetPoint(status.heat_set_point));
    targets.update(ids::TEMPERATURE, Value::Temperature(status.temperature));
    targets.update(ids::HUMIDITY, Value::Humidity(status.humidity));
}

pub(crate) fn apply_set_points(targets: &Groups, set_points: &ThermostatSetPoints) {
    targets.update(ids::COOL_SET_POINT, Value::SetPoint(set_points.cool_set_point));
    targets.update(ids::HEAT_SET_POINT, Value::SetPoint(set_points.heat_set_point));
    targets.update(ids::HUMIDITY_HIGH, Value::Humidity(set_points.humidity_high));
    targets.update(ids::HUMIDITY_LOW, Value::Humidity(set_points.humidity_low));
}

impl<T: Transport> Device<T> {
    // ========== Thermostat ==========

    /// Sets the cool set point, clamped to the device range.
    ///
    /// The `cool_set_point` group takes the value the device acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_cool_set_point(&self, value: u8) -> Result<ResponseStatus, Error> {
        let handler = Arc::clone(&self.thermostat()?.cool_set_point);
        self.send_gated(handler, SetPointCommand::cool(value)).await
    }

    /// Sets the heat set point, clamped to the device range.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_heat_set_point(&self, value: u8) -> Result<ResponseStatus, Error> {
        let handler = Arc::clone(&self.thermostat()?.heat_set_point);
        self.send_gated(handler, SetPointCommand::heat(value)).await
    }

    /// Sets the humidity high set point, capped at 99 %.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_humidity_high_set_point(&self, humidity: u8) -> Result<ResponseStatus, Error> {
        let handler = Arc::clone(&self.thermostat()?.humidity_set_point);
        let command = ExtendedSet::new(0, SET_HUMIDITY_HIGH).with_data(3, humidity.min(99));
        self.send_gated(handler, command).await
    }

    /// Sets the humidity low set point, at least 1 %.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_humidity_low_set_point(&self, humidity: u8) -> Result<ResponseStatus, Error> {
        let handler = Arc::clone(&self.thermostat()?.humidity_set_point);
        let command = ExtendedSet::new(0, SET_HUMIDITY_LOW).with_data(3, humidity.max(1));
        self.send_gated(handler, command).await
    }

    /// Sets the system or fan mode.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_mode(&self, mode: ThermostatMode) -> Result<ResponseStatus, Error> {
        let handler = Arc::clone(&self.thermostat()?.mode);
        self.send_gated(handler, ThermostatModeCommand(mode)).await
    }

    /// Sets the master thermostat.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_master(&self, master: u8) -> Result<ResponseStatus, Error> {
        let handler = Arc::clone(&self.thermostat()?.extended_set);
        self.send_gated(handler, ExtendedSet::new(0, SET_MASTER).with_data(3, master))
            .await
    }

    /// Asks the thermostat to report its changes.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_notify_changes(&self) -> Result<ResponseStatus, Error> {
        let handler = Arc::clone(&self.thermostat()?.extended_set);
        self.send_gated(handler, ExtendedSet::new(0, SET_NOTIFY_CHANGES))
            .await
    }

    /// Sets the thermostat clock to the local time.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_day_time(&self) -> Result<ResponseStatus, Error> {
        self.set_day_time_at(chrono::Local::now().naive_local())
            .await
    }

    /// Sets the thermostat clock.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// thermostat.
    pub async fn set_day_time_at(&self, at: NaiveDateTime) -> Result<ResponseStatus, Error> {
        let handler = Arc::clone(&self.thermostat()?.extended_set);
        self.send_gated(handler, SetDayTimeCommand::at(at)).await
    }

    fn thermostat(&self) -> Result<&ThermostatHandlers, Error> {
        self.inner.handlers.thermostat.as_ref().ok_or_else(|| {
            Error::Device(DeviceError::UnsupportedCapability {
                capability: "thermostat control".to_string(),
            })
        })
    }

    /// Refreshes the status when the `celsius` flag changes, so temperatures
    /// are decoded again in the new unit. The first value is the initial
    /// load and is skipped.
    pub(super) fn watch_celsius(&self) {
        let device = Arc::downgrade(&self.inner);
        let loaded = AtomicBool::new(false);
        self.inner.properties.subscribe(names::CELSIUS, move |_, celsius| {
            if !loaded.swap(true, Ordering::AcqRel) {
                return;
            }
            let Some(inner) = device.upgrade() else {
                return;
            };
            let Ok(handle) = tokio::runtime::Handle::try_current() else {
                tracing::debug!(address = %inner.address, "No runtime to refresh status");
                return;
            };
            tracing::debug!(address = %inner.address, celsius, "Temperature unit changed, refreshing status");
            let device: Device<T> = Device { inner };
            handle.spawn(async move {
                device.status().await;
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteLocation, PropertyDef};
    use crate::group::{GroupKind, GroupValue};

    fn handlers() -> (ThermostatHandlers, Arc<Groups>) {
        let address = Address::new([1, 2, 3]);
        let mut groups = Groups::new();
        for (id, name, kind) in [
            (10, "temperature", GroupKind::Temperature),
            (11, "humidity", GroupKind::Humidity),
            (12, "system_mode", GroupKind::SystemMode),
            (13, "fan_mode", GroupKind::FanMode),
            (14, "cool_set_point", GroupKind::SetPoint),
        ] {
            groups.insert(GroupValue::new(name, address, id, kind));
        }
        let groups = Arc::new(groups);
        let handlers = ThermostatHandlers::new(address);
        handlers.wire(&groups);
        (handlers, groups)
    }

    #[test]
    fn temperature_report_is_halved() {
        let (handlers, groups) = handlers();
        let frame = Frame::standard(Address::new([1, 2, 3]), TEMPERATURE_REPORT, 141);
        assert!(handlers.receive(&frame));
        assert_eq!(groups.value(10), Some(Value::Temperature(70.5)));
    }

    #[test]
    fn mode_report_splits_nibbles() {
        let (handlers, groups) = handlers();
        let frame = Frame::standard(Address::new([1, 2, 3]), MODE_REPORT, 0x12);
        assert!(handlers.receive(&frame));
        assert_eq!(groups.value(12), Some(Value::SystemMode(SystemMode::Cool)));
        assert_eq!(groups.value(13), Some(Value::FanMode(FanMode::AlwaysOn)));
    }

    #[test]
    fn unrelated_direct_frame_is_not_consumed() {
        let (handlers, groups) = handlers();
        let frame = Frame::standard(Address::new([1, 2, 3]), 0x19, 0x00);
        assert!(!handlers.receive(&frame));
        assert_eq!(groups.value(14), None);
    }

    #[test]
    fn unit_follows_celsius_flag() {
        let address = Address::new([1, 2, 3]);
        let properties = Arc::new(
            PropertyRegistry::from_defs(
                address,
                &[PropertyDef::new(names::CELSIUS, 0, 13).with_bit(3)],
            )
            .unwrap(),
        );
        let unit = unit_source(&properties);
        assert_eq!(unit(), TemperatureUnit::Fahrenheit);

        properties.load_byte(ByteLocation::new(0, 13), 0b1000);
        assert_eq!(unit(), TemperatureUnit::Celsius);
    }
}
