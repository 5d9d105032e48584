// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extended get/set commands.

use crate::protocol::{Frame, UserData};
use crate::types::Address;

use super::{Command, EXTENDED_GET_SET};

/// Requests the property block of a group.
///
/// The device answers with an extended frame where `data1` is the group,
/// `data2` is `0x01`, and the remaining fields hold the block's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedGet {
    /// Group whose block is requested.
    pub group: u8,
}

impl ExtendedGet {
    /// `data2` marking a property block response.
    pub const RESPONSE_MARKER: u8 = 0x01;

    /// Creates a request for a group's property block.
    #[must_use]
    pub const fn new(group: u8) -> Self {
        Self { group }
    }

    /// Returns the group and user data of a property block response.
    #[must_use]
    pub fn parse_block(frame: &Frame) -> Option<(u8, UserData)> {
        let data = frame.user_data?;
        (frame.cmd1 == EXTENDED_GET_SET
            && frame.cmd2 == 0x00
            && data.get(2) == Some(Self::RESPONSE_MARKER))
        .then(|| (data.get(1).unwrap_or_default(), data))
    }
}

impl Command for ExtendedGet {
    fn name(&self) -> &'static str {
        "extended_get"
    }

    fn to_frame(&self, address: Address) -> Frame {
        let mut data = UserData::new();
        data.set(1, self.group);
        data.set_checksum(EXTENDED_GET_SET, 0x00);
        Frame::extended(address, EXTENDED_GET_SET, 0x00, data)
    }
}

/// Writes a setting with an extended set.
///
/// `data1` is the group and `data2` the sub-command selecting what is
/// written; the value follows from `data3`.
///
/// # Examples
///
/// ```
/// use insteon_lib::command::{Command, ExtendedSet};
/// use insteon_lib::types::Address;
///
/// // Write 0x30 to the byte set by sub-command 0x05.
/// let frame = ExtendedSet::new(0x00, 0x05)
///     .with_data(3, 0x30)
///     .to_frame(Address::new([1, 2, 3]));
///
/// assert_eq!(frame.data(2), Some(0x05));
/// assert_eq!(frame.data(3), Some(0x30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedSet {
    cmd2: u8,
    data: UserData,
}

impl ExtendedSet {
    /// Creates an extended set for `group` with sub-command `data2`.
    #[must_use]
    pub fn new(group: u8, data2: u8) -> Self {
        let mut data = UserData::new();
        data.set(1, group);
        data.set(2, data2);
        Self { cmd2: 0x00, data }
    }

    /// Uses a different `cmd2`.
    #[must_use]
    pub const fn with_cmd2(mut self, cmd2: u8) -> Self {
        self.cmd2 = cmd2;
        self
    }

    /// Sets `dataN`.
    #[must_use]
    pub fn with_data(mut self, field: u8, value: u8) -> Self {
        self.data.set(field, value);
        self
    }

    /// Returns the sub-command (`data2`).
    #[must_use]
    pub fn sub_command(&self) -> u8 {
        self.data.get(2).unwrap_or_default()
    }
}

impl Command for ExtendedSet {
    fn name(&self) -> &'static str {
        "extended_set"
    }

    fn to_frame(&self, address: Address) -> Frame {
        let mut data = self.data;
        data.set_checksum(EXTENDED_GET_SET, self.cmd2);
        Frame::extended(address, EXTENDED_GET_SET, self.cmd2, data)
    }
}
