// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat mode types.
//!
//! [`ThermostatMode`] is what callers send with
//! [`Device::set_mode`](crate::Device::set_mode). The device reports its
//! state back split in two: a [`SystemMode`] and a [`FanMode`].

use std::fmt;

use crate::error::ValueError;

/// Mode requested through the set-mode command.
///
/// # Examples
///
/// ```
/// use insteon_lib::types::ThermostatMode;
///
/// let mode = ThermostatMode::try_from(0x02).unwrap();
/// assert_eq!(mode, ThermostatMode::Cool);
/// assert_eq!(mode.command_code(), 0x05);
/// assert!(ThermostatMode::try_from(0x06).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ThermostatMode {
    /// System off.
    Off,
    /// Heating.
    Heat,
    /// Cooling.
    Cool,
    /// Automatic heat/cool.
    Auto,
    /// Fan runs only when heating or cooling.
    FanAuto,
    /// Run the stored schedule.
    Program,
    /// Fan runs continuously.
    FanAlwaysOn,
}

impl ThermostatMode {
    /// Returns the mode code.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Off => 0x00,
            Self::Heat => 0x01,
            Self::Cool => 0x02,
            Self::Auto => 0x03,
            Self::FanAuto => 0x04,
            Self::Program => 0x05,
            Self::FanAlwaysOn => 0x08,
        }
    }

    /// Returns the `cmd2` value of the set-mode command for this mode.
    #[must_use]
    pub const fn command_code(&self) -> u8 {
        match self {
            Self::Heat => 0x04,
            Self::Cool => 0x05,
            Self::Auto => 0x06,
            Self::FanAlwaysOn => 0x07,
            Self::FanAuto => 0x08,
            Self::Off => 0x09,
            Self::Program => 0x0A,
        }
    }

    /// Decodes the `cmd2` value of a set-mode command.
    #[must_use]
    pub const fn from_command_code(code: u8) -> Option<Self> {
        match code {
            0x04 => Some(Self::Heat),
            0x05 => Some(Self::Cool),
            0x06 => Some(Self::Auto),
            0x07 => Some(Self::FanAlwaysOn),
            0x08 => Some(Self::FanAuto),
            0x09 => Some(Self::Off),
            0x0A => Some(Self::Program),
            _ => None,
        }
    }

    /// Returns `true` for the two fan modes.
    #[must_use]
    pub const fn is_fan_mode(&self) -> bool {
        matches!(self, Self::FanAuto | Self::FanAlwaysOn)
    }
}

impl TryFrom<u8> for ThermostatMode {
    type Error = ValueError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(Self::Off),
            0x01 => Ok(Self::Heat),
            0x02 => Ok(Self::Cool),
            0x03 => Ok(Self::Auto),
            0x04 => Ok(Self::FanAuto),
            0x05 => Ok(Self::Program),
            0x08 => Ok(Self::FanAlwaysOn),
            _ => Err(ValueError::InvalidMode(code)),
        }
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::Auto => "auto",
            Self::FanAuto => "fan_auto",
            Self::Program => "program",
            Self::FanAlwaysOn => "fan_always_on",
        };
        f.write_str(name)
    }
}

/// Heating/cooling mode reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SystemMode {
    /// System off.
    Off,
    /// Heating.
    Heat,
    /// Cooling.
    Cool,
    /// Automatic heat/cool.
    Auto,
    /// Following the stored schedule.
    Program,
}

impl SystemMode {
    /// Decodes the 4-bit system mode field of a report.
    ///
    /// Unknown codes are reported as `None`.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble & 0x0F {
            0 => Some(Self::Off),
            1 => Some(Self::Heat),
            2 => Some(Self::Cool),
            3 => Some(Self::Auto),
            4 => Some(Self::Program),
            _ => None,
        }
    }

    /// Converts a set-mode request into the system mode it selects.
    ///
    /// Returns `None` for the fan modes.
    #[must_use]
    pub const fn from_mode(mode: ThermostatMode) -> Option<Self> {
        match mode {
            ThermostatMode::Off => Some(Self::Off),
            ThermostatMode::Heat => Some(Self::Heat),
            ThermostatMode::Cool => Some(Self::Cool),
            ThermostatMode::Auto => Some(Self::Auto),
            ThermostatMode::Program => Some(Self::Program),
            ThermostatMode::FanAuto | ThermostatMode::FanAlwaysOn => None,
        }
    }
}

/// Fan mode reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FanMode {
    /// Fan runs only when heating or cooling.
    Auto,
    /// Fan runs continuously.
    AlwaysOn,
}

impl FanMode {
    /// Decodes the 4-bit fan mode field of a report; any non-zero value is
    /// "always on".
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Self {
        if nibble & 0x0F == 0 {
            Self::Auto
        } else {
            Self::AlwaysOn
        }
    }

    /// Converts a set-mode request into the fan mode it selects.
    ///
    /// Returns `None` for the system modes.
    #[must_use]
    pub const fn from_mode(mode: ThermostatMode) -> Option<Self> {
        match mode {
            ThermostatMode::FanAuto => Some(Self::Auto),
            ThermostatMode::FanAlwaysOn => Some(Self::AlwaysOn),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_codes_round_trip() {
        for mode in [
            ThermostatMode::Off,
            ThermostatMode::Heat,
            ThermostatMode::Cool,
            ThermostatMode::Auto,
            ThermostatMode::FanAuto,
            ThermostatMode::Program,
            ThermostatMode::FanAlwaysOn,
        ] {
            assert_eq!(ThermostatMode::try_from(mode.code()).unwrap(), mode);
        }
    }

    #[test]
    fn command_codes_decode() {
        assert_eq!(
            ThermostatMode::from_command_code(ThermostatMode::Program.command_code()),
            Some(ThermostatMode::Program)
        );
        assert_eq!(ThermostatMode::from_command_code(0x01), None);
    }

    #[test]
    fn invalid_mode_code() {
        assert_eq!(
            ThermostatMode::try_from(0x07),
            Err(ValueError::InvalidMode(0x07))
        );
    }

    #[test]
    fn fan_modes_split_from_system_modes() {
        assert!(ThermostatMode::FanAuto.is_fan_mode());
        assert_eq!(SystemMode::from_mode(ThermostatMode::FanAuto), None);
        assert_eq!(
            FanMode::from_mode(ThermostatMode::FanAlwaysOn),
            Some(FanMode::AlwaysOn)
        );
        assert_eq!(
            SystemMode::from_mode(ThermostatMode::Heat),
            Some(SystemMode::Heat)
        );
    }

    #[test]
    fn nibbles() {
        assert_eq!(SystemMode::from_nibble(0x02), Some(SystemMode::Cool));
        assert_eq!(SystemMode::from_nibble(0x09), None);
        assert_eq!(FanMode::from_nibble(0), FanMode::Auto);
        assert_eq!(FanMode::from_nibble(1), FanMode::AlwaysOn);
    }
}
