// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On/off and LED commands.

use crate::protocol::{Frame, UserData};
use crate::types::Address;

use super::{Command, EXTENDED_GET_SET};

/// `cmd1` of a direct on command.
pub(crate) const ON: u8 = 0x11;
/// `cmd1` of a direct off command.
pub(crate) const OFF: u8 = 0x13;

/// Switches a group on or off.
///
/// Groups 0 and 1 use a standard frame. Other groups (e.g. the bottom
/// outlet) use an extended frame with the group in `data1`.
///
/// # Examples
///
/// ```
/// use insteon_lib::command::{Command, OnOffCommand};
/// use insteon_lib::types::Address;
///
/// let frame = OnOffCommand::on(1).to_frame(Address::new([1, 2, 3]));
/// assert_eq!((frame.cmd1, frame.cmd2), (0x11, 0xFF));
/// assert!(!frame.is_extended());
///
/// let frame = OnOffCommand::off(2).to_frame(Address::new([1, 2, 3]));
/// assert_eq!((frame.cmd1, frame.cmd2), (0x13, 0x00));
/// assert_eq!(frame.data(1), Some(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnOffCommand {
    /// Target group.
    pub group: u8,
    /// On level; zero turns the group off.
    pub level: u8,
}

impl OnOffCommand {
    /// Turns a group fully on.
    #[must_use]
    pub const fn on(group: u8) -> Self {
        Self { group, level: 0xFF }
    }

    /// Turns a group off.
    #[must_use]
    pub const fn off(group: u8) -> Self {
        Self { group, level: 0 }
    }

    /// Returns the target group and level of an on/off frame.
    ///
    /// Standard frames address group 1.
    #[must_use]
    pub fn parse(frame: &Frame) -> Option<(u8, u8)> {
        if frame.cmd1 != ON && frame.cmd1 != OFF {
            return None;
        }
        let group = match frame.data(1) {
            Some(group) if group > 1 => group,
            _ => 1,
        };
        let level = if frame.cmd1 == ON { frame.cmd2 } else { 0 };
        Some((group, level))
    }
}

impl Command for OnOffCommand {
    fn name(&self) -> &'static str {
        if self.level == 0 { "off" } else { "on" }
    }

    fn to_frame(&self, address: Address) -> Frame {
        let cmd1 = if self.level == 0 { OFF } else { ON };
        if self.group <= 1 {
            return Frame::standard(address, cmd1, self.level);
        }
        let mut data = UserData::new();
        data.set(1, self.group);
        data.set_checksum(cmd1, self.level);
        Frame::extended(address, cmd1, self.level, data)
    }
}

/// Sets all eight button LEDs of a keypad at once.
///
/// Bit `n` of the mask is the LED of group `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLedsCommand {
    /// LED bitmask.
    pub mask: u8,
}

impl SetLedsCommand {
    /// Sub-command (`data2`) of the extended set.
    pub const SUB_COMMAND: u8 = 0x09;

    /// Builds the mask from eight LED states, group 1 first.
    #[must_use]
    pub fn from_states(states: [bool; 8]) -> Self {
        let mask = states
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u8, |mask, (bit, _)| mask | (1 << bit));
        Self { mask }
    }

    /// Returns the mask of a set-LEDs frame.
    #[must_use]
    pub fn parse(frame: &Frame) -> Option<u8> {
        (frame.cmd1 == EXTENDED_GET_SET && frame.data(2) == Some(Self::SUB_COMMAND))
            .then(|| frame.data(3))
            .flatten()
    }
}

impl Command for SetLedsCommand {
    fn name(&self) -> &'static str {
        "set_leds"
    }

    fn to_frame(&self, address: Address) -> Frame {
        let mut data = UserData::new();
        data.set(1, 0x01);
        data.set(2, Self::SUB_COMMAND);
        data.set(3, self.mask);
        data.set_checksum(EXTENDED_GET_SET, 0x00);
        Frame::extended(address, EXTENDED_GET_SET, 0x00, data)
    }
}
