// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat commands.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::protocol::{Frame, UserData};
use crate::types::{Address, ThermostatMode};

use super::{Command, EXTENDED_GET_SET};

/// Sets the cool or heat set point.
///
/// The value is sent as-is in `cmd2`; callers clamp it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPointCommand {
    /// Cool set point.
    Cool(u8),
    /// Heat set point.
    Heat(u8),
}

impl SetPointCommand {
    /// `cmd1` of the cool set point command.
    pub const COOL: u8 = 0x6C;
    /// `cmd1` of the heat set point command.
    pub const HEAT: u8 = 0x6D;

    /// Lowest accepted set point.
    pub const MIN: u8 = 1;
    /// Highest accepted set point.
    pub const MAX: u8 = 127;

    /// Creates a cool set point command with the value clamped to
    /// [`MIN`](Self::MIN)..=[`MAX`](Self::MAX).
    #[must_use]
    pub fn cool(value: u8) -> Self {
        Self::Cool(value.clamp(Self::MIN, Self::MAX))
    }

    /// Creates a heat set point command with the value clamped to
    /// [`MIN`](Self::MIN)..=[`MAX`](Self::MAX).
    #[must_use]
    pub fn heat(value: u8) -> Self {
        Self::Heat(value.clamp(Self::MIN, Self::MAX))
    }

    /// Returns the set point value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        match self {
            Self::Cool(value) | Self::Heat(value) => *value,
        }
    }
}

impl Command for SetPointCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Cool(_) => "cool_set_point",
            Self::Heat(_) => "heat_set_point",
        }
    }

    fn to_frame(&self, address: Address) -> Frame {
        let cmd1 = match self {
            Self::Cool(_) => Self::COOL,
            Self::Heat(_) => Self::HEAT,
        };
        Frame::standard(address, cmd1, self.value())
    }
}

/// Sets the thermostat mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermostatModeCommand(pub ThermostatMode);

impl ThermostatModeCommand {
    /// `cmd1` of the set-mode command.
    pub const CMD1: u8 = 0x6B;
}

impl Command for ThermostatModeCommand {
    fn name(&self) -> &'static str {
        "thermostat_mode"
    }

    fn to_frame(&self, address: Address) -> Frame {
        Frame::standard(address, Self::CMD1, self.0.command_code())
    }
}

/// Sets the thermostat's day of week and time of day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use insteon_lib::command::{Command, SetDayTimeCommand};
/// use insteon_lib::types::Address;
///
/// // 2024-03-04 was a Monday.
/// let at = NaiveDate::from_ymd_opt(2024, 3, 4)
///     .unwrap()
///     .and_hms_opt(13, 45, 10)
///     .unwrap();
/// let frame = SetDayTimeCommand::at(at).to_frame(Address::new([1, 2, 3]));
///
/// assert_eq!(frame.data(2), Some(1));
/// assert_eq!(frame.data(3), Some(13));
/// assert_eq!(frame.data(4), Some(45));
/// assert_eq!(frame.data(5), Some(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetDayTimeCommand {
    /// Day of week, Sunday is 0.
    pub day: u8,
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute.
    pub minute: u8,
    /// Second.
    pub second: u8,
}

impl SetDayTimeCommand {
    /// Builds the command for a local date and time.
    #[must_use]
    pub fn at(at: NaiveDateTime) -> Self {
        let to_u8 = |value: u32| u8::try_from(value).unwrap_or_default();
        Self {
            day: to_u8(at.weekday().num_days_from_sunday()),
            hour: to_u8(at.hour()),
            minute: to_u8(at.minute()),
            second: to_u8(at.second()),
        }
    }
}

impl Command for SetDayTimeCommand {
    fn name(&self) -> &'static str {
        "set_day_time"
    }

    fn to_frame(&self, address: Address) -> Frame {
        let mut data = UserData::new();
        data.set(1, 0x02);
        data.set(2, self.day);
        data.set(3, self.hour);
        data.set(4, self.minute);
        data.set(5, self.second);
        data.set_checksum(EXTENDED_GET_SET, 0x02);
        Frame::extended(address, EXTENDED_GET_SET, 0x02, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn set_point_clamps() {
        assert_eq!(SetPointCommand::cool(150), SetPointCommand::Cool(127));
        assert_eq!(SetPointCommand::heat(0), SetPointCommand::Heat(1));
        assert_eq!(SetPointCommand::heat(70).value(), 70);
    }

    #[test]
    fn set_point_frames() {
        let address = Address::new([1, 2, 3]);
        let frame = SetPointCommand::cool(150).to_frame(address);
        assert_eq!((frame.cmd1, frame.cmd2), (0x6C, 127));
        let frame = SetPointCommand::heat(68).to_frame(address);
        assert_eq!((frame.cmd1, frame.cmd2), (0x6D, 68));
    }

    #[test]
    fn mode_frame() {
        let frame = ThermostatModeCommand(ThermostatMode::Off).to_frame(Address::new([1, 2, 3]));
        assert_eq!((frame.cmd1, frame.cmd2), (0x6B, 0x09));
    }

    #[test]
    fn sunday_is_day_zero() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(SetDayTimeCommand::at(at).day, 0);
    }
}
