// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed group values.

use std::fmt;

use crate::error::ValueError;
use crate::types::{FanMode, SystemMode};

/// Current value of a group.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// On or off.
    OnOff(bool),
    /// Level from 0 (off) to 255 (fully on).
    Level(u8),
    /// Temperature in the display unit.
    Temperature(f32),
    /// Relative humidity in percent.
    Humidity(u8),
    /// Temperature set point in device units.
    SetPoint(u8),
    /// Heating/cooling mode.
    SystemMode(SystemMode),
    /// Fan mode.
    FanMode(FanMode),
}

impl Value {
    /// Returns the kind of group this value naturally belongs to.
    #[must_use]
    pub const fn kind(&self) -> GroupKind {
        match self {
            Self::OnOff(_) => GroupKind::OnOff,
            Self::Level(_) => GroupKind::Level,
            Self::Temperature(_) => GroupKind::Temperature,
            Self::Humidity(_) => GroupKind::Humidity,
            Self::SetPoint(_) => GroupKind::SetPoint,
            Self::SystemMode(_) => GroupKind::SystemMode,
            Self::FanMode(_) => GroupKind::FanMode,
        }
    }

    /// Returns `true` for an on value or a non-zero level.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        match self {
            Self::OnOff(on) => *on,
            Self::Level(level) => *level != 0,
            _ => false,
        }
    }

    /// Returns the value as a byte, for the integer kinds.
    #[must_use]
    pub const fn as_u8(&self) -> Option<u8> {
        match self {
            Self::OnOff(on) => Some(if *on { 0xFF } else { 0x00 }),
            Self::Level(value) | Self::Humidity(value) | Self::SetPoint(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOff(true) => f.write_str("on"),
            Self::OnOff(false) => f.write_str("off"),
            Self::Level(level) => write!(f, "{level}"),
            Self::Temperature(degrees) => write!(f, "{degrees:.1}"),
            Self::Humidity(percent) => write!(f, "{percent}%"),
            Self::SetPoint(degrees) => write!(f, "{degrees}"),
            Self::SystemMode(mode) => write!(f, "{mode:?}"),
            Self::FanMode(mode) => write!(f, "{mode:?}"),
        }
    }
}

/// Kind of value a group holds; fixed for the group's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// [`Value::OnOff`].
    OnOff,
    /// [`Value::Level`].
    Level,
    /// [`Value::Temperature`].
    Temperature,
    /// [`Value::Humidity`].
    Humidity,
    /// [`Value::SetPoint`].
    SetPoint,
    /// [`Value::SystemMode`].
    SystemMode,
    /// [`Value::FanMode`].
    FanMode,
}

impl GroupKind {
    /// Returns the kind name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OnOff => "on_off",
            Self::Level => "level",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::SetPoint => "set_point",
            Self::SystemMode => "system_mode",
            Self::FanMode => "fan_mode",
        }
    }

    /// Converts a value to this kind.
    ///
    /// On/off groups accept levels (any non-zero level is on), level groups
    /// accept on/off (0 or 255), and humidity is clamped to 100.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::KindMismatch` for any other combination.
    ///
    /// # Examples
    ///
    /// ```
    /// use insteon_lib::group::{GroupKind, Value};
    ///
    /// assert_eq!(GroupKind::OnOff.coerce(1, Value::Level(0x80)), Ok(Value::OnOff(true)));
    /// assert_eq!(GroupKind::Level.coerce(1, Value::OnOff(true)), Ok(Value::Level(0xFF)));
    /// assert_eq!(GroupKind::Humidity.coerce(11, Value::Humidity(140)), Ok(Value::Humidity(100)));
    /// assert!(GroupKind::SetPoint.coerce(14, Value::OnOff(true)).is_err());
    /// ```
    pub fn coerce(self, group: u8, value: Value) -> Result<Value, ValueError> {
        match (self, value) {
            (Self::OnOff, Value::OnOff(_))
            | (Self::Level, Value::Level(_))
            | (Self::Temperature, Value::Temperature(_))
            | (Self::SetPoint, Value::SetPoint(_))
            | (Self::SystemMode, Value::SystemMode(_))
            | (Self::FanMode, Value::FanMode(_)) => Ok(value),
            (Self::OnOff, Value::Level(level)) => Ok(Value::OnOff(level != 0)),
            (Self::Level, Value::OnOff(on)) => Ok(Value::Level(if on { 0xFF } else { 0x00 })),
            (Self::Humidity, Value::Humidity(percent) | Value::Level(percent)) => {
                Ok(Value::Humidity(percent.min(100)))
            }
            _ => Err(ValueError::KindMismatch {
                group,
                expected: self.name(),
                actual: value.kind().name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_off_from_level() {
        assert_eq!(
            GroupKind::OnOff.coerce(3, Value::Level(0)),
            Ok(Value::OnOff(false))
        );
        assert_eq!(
            GroupKind::OnOff.coerce(3, Value::Level(1)),
            Ok(Value::OnOff(true))
        );
    }

    #[test]
    fn mismatch_reports_kinds() {
        assert_eq!(
            GroupKind::Temperature.coerce(10, Value::Humidity(50)),
            Err(ValueError::KindMismatch {
                group: 10,
                expected: "temperature",
                actual: "humidity",
            })
        );
    }

    #[test]
    fn is_on() {
        assert!(Value::OnOff(true).is_on());
        assert!(Value::Level(3).is_on());
        assert!(!Value::Level(0).is_on());
        assert!(!Value::SetPoint(70).is_on());
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&Value::SetPoint(65)).unwrap();
        assert_eq!(json, r#"{"set_point":65}"#);
        let value: Value = serde_json::from_str(r#"{"fan_mode":"Auto"}"#).unwrap();
        assert_eq!(value, Value::FanMode(FanMode::Auto));
    }
}
