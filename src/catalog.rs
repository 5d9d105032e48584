// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in device descriptors.
//!
//! Each function returns the descriptor of one model family. Variants are
//! built from a base descriptor by overriding entries, the same way an
//! application can derive its own models:
//!
//! ```
//! use insteon_lib::catalog;
//! use insteon_lib::config::{PropertyDef, names};
//!
//! let custom = catalog::switch_linc()
//!     .with_model("SwitchLinc Custom")
//!     .with_property(PropertyDef::new(names::LED_DIMMING, 0, 9).with_write_command(0x07));
//! assert_eq!(custom.properties.len(), 3);
//! ```
//!
//! | Function | Profile | Groups |
//! |----------|---------|--------|
//! | [`switch_linc`], [`switch_linc_01`], [`switch_linc_02`], [`toggle_linc`] | Switch | 1 |
//! | [`in_line_linc_01`], [`in_line_linc_02`], [`outlet_linc`], [`din_rail`], [`appliance_linc`] | Switch | 1 |
//! | [`keypad_linc_6`], [`keypad_linc_8`] | Keypad | 1, 3-6 or 1-8 |
//! | [`on_off_outlet`] | Outlet | 1, 2 |
//! | [`thermostat`], [`wireless_thermostat`] | Thermostat | 1-4, 10-17 |

use crate::config::{PropertyDef, PropertyType, button_property, names};
use crate::device::{DeviceDescriptor, DeviceProfile, GroupDef};
use crate::group::{GroupKind, Value};
use crate::status::StatusDecoder;
use crate::types::FanMode;

/// Thermostat status type carrying the full status.
pub const THERMOSTAT_STATUS: u8 = 0x02;
/// Thermostat status type carrying the set points.
pub const THERMOSTAT_SET_POINTS: u8 = 0x01;

fn x10(group: u8, button: u8) -> [PropertyDef; 2] {
    [
        PropertyDef::new(button_property(names::X10_HOUSE, button), group, 5),
        PropertyDef::new(button_property(names::X10_UNIT, button), group, 6),
    ]
}

fn on_off_switch(model: &str) -> DeviceDescriptor {
    DeviceDescriptor::new(model, DeviceProfile::Switch)
        .with_group(GroupDef::new(1, "on_off_switch", GroupKind::OnOff).with_status_type(0))
        .with_status_type(0, StatusDecoder::Level)
}

// ========== On/Off Switches ==========

/// SwitchLinc relay.
#[must_use]
pub fn switch_linc() -> DeviceDescriptor {
    let [house, unit] = x10(0, 1);
    on_off_switch("SwitchLinc")
        .with_property(house)
        .with_property(unit)
}

/// SwitchLinc relay with LED dimming in `data3`.
#[must_use]
pub fn switch_linc_01() -> DeviceDescriptor {
    switch_linc()
        .with_model("SwitchLinc 01")
        .with_property(PropertyDef::new(names::LED_DIMMING, 0, 3).with_write_command(0x03))
}

/// SwitchLinc relay with LED dimming in `data9`.
#[must_use]
pub fn switch_linc_02() -> DeviceDescriptor {
    switch_linc()
        .with_model("SwitchLinc 02")
        .with_property(PropertyDef::new(names::LED_DIMMING, 0, 9).with_write_command(0x07))
}

/// ToggleLinc relay.
#[must_use]
pub fn toggle_linc() -> DeviceDescriptor {
    switch_linc_01().with_model("ToggleLinc")
}

/// InLineLinc relay, first generation.
#[must_use]
pub fn in_line_linc_01() -> DeviceDescriptor {
    switch_linc_01().with_model("InLineLinc 01")
}

/// InLineLinc relay, second generation.
#[must_use]
pub fn in_line_linc_02() -> DeviceDescriptor {
    switch_linc_02().with_model("InLineLinc 02")
}

/// OutletLinc.
#[must_use]
pub fn outlet_linc() -> DeviceDescriptor {
    switch_linc().with_model("OutletLinc")
}

/// DIN rail relay.
#[must_use]
pub fn din_rail() -> DeviceDescriptor {
    switch_linc_02().with_model("DIN Rail On/Off")
}

/// ApplianceLinc; no configuration properties.
#[must_use]
pub fn appliance_linc() -> DeviceDescriptor {
    on_off_switch("ApplianceLinc")
}

// ========== Keypads ==========

fn keypad(model: &str, buttons: &[(u8, &str)]) -> DeviceDescriptor {
    let mut descriptor = DeviceDescriptor::new(model, DeviceProfile::Keypad)
        .with_status_type(2, StatusDecoder::Level)
        .with_status_type(1, StatusDecoder::Level);

    for &(button, name) in buttons {
        let status_type = u8::from(button != 1);
        descriptor = descriptor.with_group(
            GroupDef::new(button, name, GroupKind::OnOff).with_status_type(status_type),
        );

        let [house, unit] = x10(button, button);
        descriptor = descriptor
            .with_property(
                PropertyDef::new(button_property(names::ON_MASK, button), button, 3)
                    .with_write_command(0x02),
            )
            .with_property(
                PropertyDef::new(button_property(names::OFF_MASK, button), button, 4)
                    .with_write_command(0x03),
            )
            .with_property(house)
            .with_property(unit);
    }

    descriptor
        .with_property(PropertyDef::new(names::LED_DIMMING, 1, 9).with_write_command(0x07))
        .with_property(PropertyDef::new(names::NON_TOGGLE_MASK, 1, 10).with_write_command(0x08))
        .with_property(
            PropertyDef::new(names::NON_TOGGLE_ON_OFF_MASK, 1, 13).with_write_command(0x0B),
        )
        .with_property(PropertyDef::new(names::TRIGGER_GROUP_MASK, 1, 14).with_write_command(0x0C))
}

/// KeypadLinc with a main button and buttons A-D.
#[must_use]
pub fn keypad_linc_6() -> DeviceDescriptor {
    keypad(
        "KeypadLinc 6",
        &[
            (1, "on_off_switch_main"),
            (3, "on_off_switch_a"),
            (4, "on_off_switch_b"),
            (5, "on_off_switch_c"),
            (6, "on_off_switch_d"),
        ],
    )
}

/// KeypadLinc with a main button and buttons B-H.
#[must_use]
pub fn keypad_linc_8() -> DeviceDescriptor {
    keypad(
        "KeypadLinc 8",
        &[
            (1, "on_off_switch_main"),
            (2, "on_off_switch_b"),
            (3, "on_off_switch_c"),
            (4, "on_off_switch_d"),
            (5, "on_off_switch_e"),
            (6, "on_off_switch_f"),
            (7, "on_off_switch_g"),
            (8, "on_off_switch_h"),
        ],
    )
}

// ========== Outlets ==========

/// On/Off outlet with independent top and bottom receptacles.
///
/// One status request (type 1) reports both outlets as bits 0 and 1.
#[must_use]
pub fn on_off_outlet() -> DeviceDescriptor {
    DeviceDescriptor::new("On/Off Outlet", DeviceProfile::Outlet)
        .with_group(GroupDef::new(1, "on_off_switch_top", GroupKind::OnOff).with_status_type(1))
        .with_group(GroupDef::new(2, "on_off_switch_bottom", GroupKind::OnOff).with_status_type(1))
        .with_status_type(1, StatusDecoder::Level)
}

// ========== Climate Control ==========

/// Thermostat.
#[must_use]
pub fn thermostat() -> DeviceDescriptor {
    let flag = |name: &str, bit: u8| {
        PropertyDef::new(name, 0, 13)
            .with_write_command(0x04)
            .with_bit(bit)
    };

    DeviceDescriptor::new("Thermostat", DeviceProfile::Thermostat)
        .with_group(GroupDef::new(1, "cooling", GroupKind::OnOff))
        .with_group(GroupDef::new(2, "heating", GroupKind::OnOff))
        .with_group(GroupDef::new(3, "dehumidifying", GroupKind::OnOff))
        .with_group(GroupDef::new(4, "humidifying", GroupKind::OnOff))
        .with_group(
            GroupDef::new(10, "temperature", GroupKind::Temperature)
                .with_default(Value::Temperature(0.0)),
        )
        .with_group(GroupDef::new(11, "humidity", GroupKind::Humidity).with_default(Value::Humidity(0)))
        .with_group(GroupDef::new(12, "system_mode", GroupKind::SystemMode))
        .with_group(
            GroupDef::new(13, "fan_mode", GroupKind::FanMode).with_default(Value::FanMode(FanMode::Auto)),
        )
        .with_group(
            GroupDef::new(14, "cool_set_point", GroupKind::SetPoint)
                .with_default(Value::SetPoint(65)),
        )
        .with_group(
            GroupDef::new(15, "heat_set_point", GroupKind::SetPoint)
                .with_default(Value::SetPoint(95)),
        )
        .with_group(
            GroupDef::new(16, "humidity_high", GroupKind::Humidity).with_default(Value::Humidity(0)),
        )
        .with_group(
            GroupDef::new(17, "humidity_low", GroupKind::Humidity).with_default(Value::Humidity(0)),
        )
        .with_property(
            PropertyDef::new(names::TEMP_OFFSET, 0, 6)
                .with_write_command(0x02)
                .with_type(PropertyType::Advanced),
        )
        .with_property(
            PropertyDef::new(names::HUMIDITY_OFFSET, 0, 7)
                .with_write_command(0x03)
                .with_type(PropertyType::Advanced),
        )
        .with_property(PropertyDef::new(names::BACKLIGHT, 0, 10).with_write_command(0x05))
        .with_property(PropertyDef::new(names::CHANGE_DELAY, 0, 11).with_write_command(0x06))
        .with_property(flag(names::PROGRAM_LOCK_ON, 0))
        .with_property(flag(names::KEY_BEEP_ON, 1))
        .with_property(flag(names::BUTTON_LOCK_ON, 2))
        .with_property(flag(names::CELSIUS, 3))
        .with_property(flag(names::TIME_24_HOUR_FORMAT, 4))
        .with_property(flag(names::LED_ON, 6))
        .with_status_type(THERMOSTAT_STATUS, StatusDecoder::ThermostatStatus)
        .with_status_type(THERMOSTAT_SET_POINTS, StatusDecoder::ThermostatSetPoints)
}

/// Battery-powered wireless thermostat.
#[must_use]
pub fn wireless_thermostat() -> DeviceDescriptor {
    thermostat()
        .with_model("Wireless Thermostat")
        .with_battery(true)
}

/// Looks up a built-in descriptor by model name, ignoring case.
///
/// # Examples
///
/// ```
/// use insteon_lib::catalog;
///
/// assert!(catalog::by_model("keypadlinc 8").is_some());
/// assert!(catalog::by_model("Dimmer").is_none());
/// ```
#[must_use]
pub fn by_model(model: &str) -> Option<DeviceDescriptor> {
    [
        switch_linc,
        switch_linc_01,
        switch_linc_02,
        toggle_linc,
        in_line_linc_01,
        in_line_linc_02,
        outlet_linc,
        din_rail,
        appliance_linc,
        keypad_linc_6,
        keypad_linc_8,
        on_off_outlet,
        thermostat,
        wireless_thermostat,
    ]
    .into_iter()
    .map(|build| build())
    .find(|descriptor| descriptor.model.eq_ignore_ascii_case(model))
}
