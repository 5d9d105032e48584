// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Framed messages exchanged with a device.
//!
//! A standard frame carries two command bytes (`cmd1`, `cmd2`). An extended
//! frame additionally carries fourteen bytes of user data, `data1` to
//! `data14`, where `data14` holds the checksum.

use std::fmt;

use crate::error::ProtocolError;
use crate::types::Address;

/// Number of user data bytes in an extended frame.
pub const USER_DATA_LEN: usize = 14;

/// The fourteen user data bytes of an extended frame.
///
/// Bytes are addressed 1-based, matching the `dataN` naming used by device
/// documentation and property declarations.
///
/// # Examples
///
/// ```
/// use insteon_lib::protocol::UserData;
///
/// let mut data = UserData::new();
/// data.set(1, 0x01);
/// data.set(3, 0x7F);
/// assert_eq!(data.get(3), Some(0x7F));
/// assert_eq!(data.get(15), None);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct UserData([u8; USER_DATA_LEN]);

impl UserData {
    /// Creates user data with every byte zeroed.
    #[must_use]
    pub const fn new() -> Self {
        Self([0; USER_DATA_LEN])
    }

    /// Creates user data from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; USER_DATA_LEN]) -> Self {
        Self(bytes)
    }

    /// Creates user data from a slice of at most fourteen leading bytes.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::MalformedFrame` if the slice is too long.
    pub fn from_slice(leading: &[u8]) -> Result<Self, ProtocolError> {
        if leading.len() > USER_DATA_LEN {
            return Err(ProtocolError::MalformedFrame(format!(
                "{} user data bytes, at most {USER_DATA_LEN} allowed",
                leading.len()
            )));
        }
        let mut bytes = [0; USER_DATA_LEN];
        bytes[..leading.len()].copy_from_slice(leading);
        Ok(Self(bytes))
    }

    /// Returns `dataN` for `N` in `1..=14`.
    #[must_use]
    pub fn get(&self, field: u8) -> Option<u8> {
        let index = usize::from(field).checked_sub(1)?;
        self.0.get(index).copied()
    }

    /// Sets `dataN` for `N` in `1..=14`; other field numbers are ignored.
    pub fn set(&mut self, field: u8, value: u8) {
        if let Some(slot) = usize::from(field)
            .checked_sub(1)
            .and_then(|index| self.0.get_mut(index))
        {
            *slot = value;
        }
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn bytes(&self) -> &[u8; USER_DATA_LEN] {
        &self.0
    }

    /// Computes the extended-frame checksum over the command bytes and
    /// `data1..=data13`.
    #[must_use]
    pub fn checksum(&self, cmd1: u8, cmd2: u8) -> u8 {
        let sum = self.0[..USER_DATA_LEN - 1]
            .iter()
            .fold(cmd1.wrapping_add(cmd2), |acc, byte| acc.wrapping_add(*byte));
        sum.wrapping_neg()
    }

    /// Stores the checksum in `data14`.
    pub fn set_checksum(&mut self, cmd1: u8, cmd2: u8) {
        self.0[USER_DATA_LEN - 1] = self.checksum(cmd1, cmd2);
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserData(")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        f.write_str(")")
    }
}

/// One message to or from a device.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    /// Device the frame is addressed to (outbound) or came from (inbound).
    pub address: Address,
    /// All-link group for broadcast frames; `None` for direct messages.
    pub group: Option<u8>,
    /// First command byte.
    pub cmd1: u8,
    /// Second command byte.
    pub cmd2: u8,
    /// User data, present only on extended frames.
    pub user_data: Option<UserData>,
}

impl Frame {
    /// Creates a standard direct frame.
    #[must_use]
    pub const fn standard(address: Address, cmd1: u8, cmd2: u8) -> Self {
        Self {
            address,
            group: None,
            cmd1,
            cmd2,
            user_data: None,
        }
    }

    /// Creates an extended direct frame.
    #[must_use]
    pub const fn extended(address: Address, cmd1: u8, cmd2: u8, user_data: UserData) -> Self {
        Self {
            address,
            group: None,
            cmd1,
            cmd2,
            user_data: Some(user_data),
        }
    }

    /// Creates an all-link broadcast frame sent by a device for a group.
    #[must_use]
    pub const fn broadcast(address: Address, group: u8, cmd1: u8, cmd2: u8) -> Self {
        Self {
            address,
            group: Some(group),
            cmd1,
            cmd2,
            user_data: None,
        }
    }

    /// Returns `true` if the frame carries user data.
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        self.user_data.is_some()
    }

    /// Returns `dataN` of an extended frame.
    #[must_use]
    pub fn data(&self, field: u8) -> Option<u8> {
        self.user_data.as_ref().and_then(|data| data.get(field))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02X}/{:02X}", self.address, self.cmd1, self.cmd2)?;
        if let Some(group) = self.group {
            write!(f, " group {group}")?;
        }
        if let Some(data) = &self.user_data {
            write!(f, " {data:?}")?;
        }
        Ok(())
    }
}
