// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Keypad button toggle behavior.

use crate::error::ValueError;

/// How a keypad button reacts to presses.
///
/// # Examples
///
/// ```
/// use insteon_lib::types::ToggleMode;
///
/// assert_eq!(ToggleMode::try_from(1).unwrap(), ToggleMode::OnOnly);
/// assert!(ToggleMode::try_from(3).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ToggleMode {
    /// Each press alternates on and off.
    Toggle,
    /// Every press sends on.
    OnOnly,
    /// Every press sends off.
    OffOnly,
}

impl TryFrom<u8> for ToggleMode {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Toggle),
            1 => Ok(Self::OnOnly),
            2 => Ok(Self::OffOnly),
            _ => Err(ValueError::InvalidToggleMode(value)),
        }
    }
}

impl From<ToggleMode> for u8 {
    fn from(mode: ToggleMode) -> Self {
        match mode {
            ToggleMode::Toggle => 0,
            ToggleMode::OnOnly => 1,
            ToggleMode::OffOnly => 2,
        }
    }
}
