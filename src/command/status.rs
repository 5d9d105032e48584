// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status request commands.

use crate::protocol::{Frame, UserData};
use crate::types::Address;

use super::{Command, EXTENDED_GET_SET};

/// Requests a status byte.
///
/// `cmd2` selects what the device reports; the answer carries the link
/// database version in `cmd1` and the status in `cmd2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequest {
    /// Status type.
    pub status_type: u8,
}

impl StatusRequest {
    /// `cmd1` of a status request.
    pub const CMD1: u8 = 0x19;

    /// Creates a request for a status type.
    #[must_use]
    pub const fn new(status_type: u8) -> Self {
        Self { status_type }
    }
}

impl Command for StatusRequest {
    fn name(&self) -> &'static str {
        "status_request"
    }

    fn to_frame(&self, address: Address) -> Frame {
        Frame::standard(address, Self::CMD1, self.status_type)
    }
}

/// Requests the full thermostat status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThermostatStatusRequest;

impl ThermostatStatusRequest {
    /// `cmd2` of the request and of its response.
    pub const CMD2: u8 = 0x02;
}

impl Command for ThermostatStatusRequest {
    fn name(&self) -> &'static str {
        "thermostat_status_request"
    }

    fn to_frame(&self, address: Address) -> Frame {
        let mut data = UserData::new();
        data.set_checksum(EXTENDED_GET_SET, Self::CMD2);
        Frame::extended(address, EXTENDED_GET_SET, Self::CMD2, data)
    }
}

/// Requests the thermostat set points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThermostatSetPointRequest;

impl ThermostatSetPointRequest {
    /// `data3` of the request; the response echoes it.
    pub const MARKER: u8 = 0x01;
}

impl Command for ThermostatSetPointRequest {
    fn name(&self) -> &'static str {
        "thermostat_set_point_request"
    }

    fn to_frame(&self, address: Address) -> Frame {
        let mut data = UserData::new();
        data.set(3, Self::MARKER);
        data.set_checksum(EXTENDED_GET_SET, 0x00);
        Frame::extended(address, EXTENDED_GET_SET, 0x00, data)
    }
}
