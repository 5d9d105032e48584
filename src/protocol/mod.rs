// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The link-layer boundary.
//!
//! The library never talks to a modem directly. Everything it sends goes
//! through a [`Transport`] supplied by the application, and everything the
//! network delivers unprompted is handed back through
//! [`Device::handle_inbound`](crate::Device::handle_inbound).
//!
//! A transport reports the outcome of one exchange as a
//! [`ResponseStatus`]. Timeouts, NAKs and link failures are statuses, not
//! errors, so that a device operation can decide what to do with each of
//! them.

mod frame;

pub use frame::{Frame, USER_DATA_LEN, UserData};

use std::future::Future;

use crate::types::ResponseStatus;

/// Outcome of one command/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Status reported by the transport.
    pub status: ResponseStatus,
    /// Response frame, if the device sent one.
    pub response: Option<Frame>,
}

impl Reply {
    /// Creates a successful reply carrying a response frame.
    #[must_use]
    pub const fn success(response: Frame) -> Self {
        Self {
            status: ResponseStatus::Success,
            response: Some(response),
        }
    }

    /// Creates a successful reply with no response frame.
    #[must_use]
    pub const fn acknowledged() -> Self {
        Self {
            status: ResponseStatus::Success,
            response: None,
        }
    }

    /// Creates a reply with the given status and no response frame.
    #[must_use]
    pub const fn status(status: ResponseStatus) -> Self {
        Self {
            status,
            response: None,
        }
    }
}

impl From<ResponseStatus> for Reply {
    fn from(status: ResponseStatus) -> Self {
        Self::status(status)
    }
}

/// Sends frames to devices and returns their responses.
///
/// Implementations serialize frames to one device and apply their own
/// timeouts; a frame that gets no answer completes with
/// [`ResponseStatus::Timeout`]. The library does not retry.
///
/// The returned future must be `Send` because exchanges run on spawned
/// tasks, so that a response arriving after the caller stopped waiting is
/// still applied to the device state.
///
/// # Examples
///
/// ```
/// use insteon_lib::protocol::{Frame, Reply, Transport};
///
/// struct EchoTransport;
///
/// impl Transport for EchoTransport {
///     async fn send(&self, frame: Frame) -> Reply {
///         Reply::success(Frame::standard(frame.address, frame.cmd1, frame.cmd2))
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Sends a frame and waits for the device's response.
    fn send(&self, frame: Frame) -> impl Future<Output = Reply> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    #[test]
    fn reply_constructors() {
        let frame = Frame::standard(Address::new([1, 2, 3]), 0x11, 0xFF);
        let reply = Reply::success(frame.clone());
        assert!(reply.status.is_success());
        assert_eq!(reply.response, Some(frame));

        let reply = Reply::from(ResponseStatus::Timeout);
        assert_eq!(reply.status, ResponseStatus::Timeout);
        assert!(reply.response.is_none());
    }
}
