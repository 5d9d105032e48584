// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outcome of a command/response exchange.

use std::fmt;

/// Result status reported by the transport for one exchange.
///
/// # Examples
///
/// ```
/// use insteon_lib::types::ResponseStatus;
///
/// let overall = ResponseStatus::combine([
///     ResponseStatus::Success,
///     ResponseStatus::Timeout,
///     ResponseStatus::Failure,
/// ]);
/// assert_eq!(overall, ResponseStatus::Timeout);
/// assert!(ResponseStatus::combine([]).is_success());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ResponseStatus {
    /// The device acknowledged the command.
    Success,
    /// The device rejected the command or the exchange failed.
    Failure,
    /// The device sent a NAK indicating its state differs from what the
    /// command assumed; local state should be refreshed.
    DirectNakPreNak,
    /// No response arrived in time.
    Timeout,
}

impl ResponseStatus {
    /// Returns `true` for [`ResponseStatus::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Folds the statuses of a multi-step operation into one.
    ///
    /// All successes (or no steps at all) give `Success`; otherwise the first
    /// non-success status is returned.
    #[must_use]
    pub fn combine(statuses: impl IntoIterator<Item = Self>) -> Self {
        statuses
            .into_iter()
            .find(|status| !status.is_success())
            .unwrap_or(Self::Success)
    }

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::DirectNakPreNak => "direct_nak_pre_nak",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
