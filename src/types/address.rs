// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device address type.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Three-byte address of a device on the network.
///
/// # Examples
///
/// ```
/// use insteon_lib::types::Address;
///
/// let addr: Address = "1a.2b.3c".parse().unwrap();
/// assert_eq!(addr.to_string(), "1A.2B.3C");
/// assert_eq!(addr, Address::new([0x1A, 0x2B, 0x3C]));
///
/// assert!("1a.2b".parse::<Address>().is_err());
/// ```
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Address([u8; 3]);

impl Address {
    /// Creates an address from its three bytes, high byte first.
    #[must_use]
    pub const fn new(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; 3] {
        self.0
    }

    /// Returns the high byte.
    #[must_use]
    pub const fn high(&self) -> u8 {
        self.0[0]
    }

    /// Returns the middle byte.
    #[must_use]
    pub const fn middle(&self) -> u8 {
        self.0[1]
    }

    /// Returns the low byte.
    #[must_use]
    pub const fn low(&self) -> u8 {
        self.0[2]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}.{:02X}.{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = ValueError;

    /// Accepts `1A.2B.3C`, `1a2b3c` and `1A 2B 3C`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s
            .chars()
            .filter(|c| !matches!(c, '.' | ' ' | ':'))
            .collect();
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ValueError::InvalidAddress(s.to_string()));
        }

        let mut bytes = [0u8; 3];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| ValueError::InvalidAddress(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; 3]> for Address {
    fn from(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }
}
