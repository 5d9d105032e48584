// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command/response exchanges.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::protocol::{Frame, Reply, Transport};
use crate::subscription::{CallbackRegistry, SubscriptionId};
use crate::types::{Address, ResponseStatus};

use super::Command;

/// Decodes a confirmed exchange or an inbound frame.
///
/// For an exchange the first argument is the request and the second the
/// device's response, if it sent one. For an inbound frame the first
/// argument is the frame and the second is `None`. Returning `None` means
/// the frame carries nothing for this handler.
pub type Decoder<D> = fn(&Frame, Option<&Frame>) -> Option<D>;

type HandlerCallback<D> = dyn Fn(&D) + Send + Sync;

/// Whether a handler has an exchange in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerState {
    /// No exchange is running.
    Idle,
    /// At least one request was sent and its response is pending.
    AwaitingResponse,
}

/// Result of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange<D> {
    /// Status reported by the transport.
    pub status: ResponseStatus,
    /// Decoded result; only present on success.
    pub decoded: Option<D>,
}

/// Runs a frame through the transport on its own task.
///
/// `process` receives the request and the reply and runs on the same task,
/// so it still runs when the caller stops waiting. Returns `None` if the
/// task panicked or was cancelled.
pub(crate) async fn spawn_exchange<T, R, F>(transport: &Arc<T>, frame: Frame, process: F) -> Option<R>
where
    T: Transport,
    R: Send + 'static,
    F: FnOnce(Frame, Reply) -> R + Send + 'static,
{
    let transport = Arc::clone(transport);
    let task = tokio::spawn(async move {
        let reply = transport.send(frame.clone()).await;
        process(frame, reply)
    });
    match task.await {
        Ok(result) => Some(result),
        Err(e) => {
            tracing::warn!(error = %e, "Exchange task did not complete");
            None
        }
    }
}

/// One command/response exchange pattern of a device.
///
/// A handler sends a command, waits for the transport's verdict and, on
/// success only, decodes the exchange and publishes the result to its
/// subscribers. Failures, timeouts and NAKs mutate nothing; the status is
/// returned to the caller, which decides what to do with it.
///
/// Handlers that also accept unsolicited frames are created with
/// [`with_inbound`](Self::with_inbound); the device routes matching frames
/// to [`receive`](Self::receive).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use insteon_lib::command::{CommandHandler, SetPointCommand};
/// use insteon_lib::protocol::{Frame, Reply, Transport};
/// use insteon_lib::types::{Address, ResponseStatus};
///
/// struct Ack;
///
/// impl Transport for Ack {
///     async fn send(&self, frame: Frame) -> Reply {
///         Reply::success(frame)
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let address = Address::new([1, 2, 3]);
/// let handler = Arc::new(CommandHandler::new(
///     "cool_set_point",
///     address,
///     |request: &Frame, response: Option<&Frame>| Some(response.unwrap_or(request).cmd2),
/// ));
/// handler.subscribe(|value| println!("cool set point is now {value}"));
///
/// let exchange = handler
///     .request(&Arc::new(Ack), &SetPointCommand::cool(150))
///     .await;
/// assert_eq!(exchange.status, ResponseStatus::Success);
/// assert_eq!(exchange.decoded, Some(127));
/// # }
/// ```
pub struct CommandHandler<D> {
    name: &'static str,
    address: Address,
    inbound_cmd1: Option<u8>,
    decoder: Decoder<D>,
    subscribers: CallbackRegistry<HandlerCallback<D>>,
    in_flight: AtomicUsize,
    last_status: Mutex<Option<ResponseStatus>>,
}

impl<D> CommandHandler<D>
where
    D: Clone + Send + Sync + 'static,
{
    /// Creates a handler.
    #[must_use]
    pub fn new(name: &'static str, address: Address, decoder: Decoder<D>) -> Self {
        Self {
            name,
            address,
            inbound_cmd1: None,
            decoder,
            subscribers: CallbackRegistry::new(),
            in_flight: AtomicUsize::new(0),
            last_status: Mutex::new(None),
        }
    }

    /// Also accepts unsolicited direct frames with this `cmd1`.
    #[must_use]
    pub fn with_inbound(mut self, cmd1: u8) -> Self {
        self.inbound_cmd1 = Some(cmd1);
        self
    }

    /// Returns the handler name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> HandlerState {
        if self.in_flight.load(Ordering::Acquire) == 0 {
            HandlerState::Idle
        } else {
            HandlerState::AwaitingResponse
        }
    }

    /// Returns the status of the last completed exchange.
    #[must_use]
    pub fn last_status(&self) -> Option<ResponseStatus> {
        *self.last_status.lock()
    }

    // ========== Exchanges ==========

    /// Sends a command and returns the transport's status.
    pub async fn send<T, C>(self: &Arc<Self>, transport: &Arc<T>, command: &C) -> ResponseStatus
    where
        T: Transport,
        C: Command + ?Sized,
    {
        self.request(transport, command).await.status
    }

    /// Sends a command and returns the status with the decoded result.
    pub async fn request<T, C>(self: &Arc<Self>, transport: &Arc<T>, command: &C) -> Exchange<D>
    where
        T: Transport,
        C: Command + ?Sized,
    {
        tracing::debug!(address = %self.address, command = command.name(), "Sending command");
        self.exchange(transport, command.to_frame(self.address), |_, _| {})
            .await
    }

    /// Sends a frame, then runs `apply` with the status and decoded result.
    ///
    /// Decoding, publishing and `apply` run on the exchange task; they
    /// complete even if the returned future is dropped.
    pub async fn exchange<T, F>(
        self: &Arc<Self>,
        transport: &Arc<T>,
        frame: Frame,
        apply: F,
    ) -> Exchange<D>
    where
        T: Transport,
        F: FnOnce(ResponseStatus, Option<&D>) + Send + 'static,
    {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let handler = Arc::clone(self);
        let exchange = spawn_exchange(transport, frame, move |request, reply| {
            let exchange = handler.complete(&request, reply);
            apply(exchange.status, exchange.decoded.as_ref());
            handler.in_flight.fetch_sub(1, Ordering::AcqRel);
            exchange
        })
        .await;

        exchange.unwrap_or_else(|| {
            // The task never reached `complete`.
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            *self.last_status.lock() = Some(ResponseStatus::Failure);
            Exchange {
                status: ResponseStatus::Failure,
                decoded: None,
            }
        })
    }

    fn complete(&self, request: &Frame, reply: Reply) -> Exchange<D> {
        *self.last_status.lock() = Some(reply.status);
        tracing::debug!(
            address = %self.address,
            handler = self.name,
            status = %reply.status,
            "Exchange complete"
        );
        if !reply.status.is_success() {
            return Exchange {
                status: reply.status,
                decoded: None,
            };
        }

        let decoded = (self.decoder)(request, reply.response.as_ref());
        if let Some(decoded) = &decoded {
            self.publish(decoded);
        }
        Exchange {
            status: reply.status,
            decoded,
        }
    }

    // ========== Inbound ==========

    /// Returns `true` if an unsolicited frame belongs to this handler.
    #[must_use]
    pub fn matches(&self, frame: &Frame) -> bool {
        frame.group.is_none() && self.inbound_cmd1 == Some(frame.cmd1)
    }

    /// Decodes an unsolicited frame and publishes the result.
    ///
    /// Returns `false` if the frame carried nothing for this handler.
    pub fn receive(&self, frame: &Frame) -> bool {
        match (self.decoder)(frame, None) {
            Some(decoded) => {
                self.publish(&decoded);
                true
            }
            None => {
                tracing::trace!(address = %self.address, handler = self.name, %frame, "Frame not decoded");
                false
            }
        }
    }

    fn publish(&self, decoded: &D) {
        for callback in self.subscribers.snapshot() {
            callback(decoded);
        }
    }

    // ========== Subscriptions ==========

    /// Subscribes to decoded results.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&D) + Send + Sync + 'static,
    {
        self.subscribers.insert(Arc::new(callback))
    }

    /// Removes a subscription. Returns `false` if it did not exist.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }
}

impl<D> fmt::Debug for CommandHandler<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandler")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("inbound_cmd1", &self.inbound_cmd1)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SetPointCommand;
    use tokio::sync::Notify;

    struct Fixed(ResponseStatus);

    impl Transport for Fixed {
        async fn send(&self, frame: Frame) -> Reply {
            if self.0.is_success() {
                Reply::success(frame)
            } else {
                Reply::status(self.0)
            }
        }
    }

    struct Gated {
        release: Arc<Notify>,
    }

    impl Transport for Gated {
        async fn send(&self, frame: Frame) -> Reply {
            self.release.notified().await;
            Reply::success(frame)
        }
    }

    fn echo_cmd2(request: &Frame, response: Option<&Frame>) -> Option<u8> {
        Some(response.unwrap_or(request).cmd2)
    }

    fn handler() -> Arc<CommandHandler<u8>> {
        Arc::new(
            CommandHandler::new("cool_set_point", Address::new([1, 2, 3]), echo_cmd2)
                .with_inbound(0x71),
        )
    }

    fn counter(handler: &CommandHandler<u8>) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        handler.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        calls
    }

    #[tokio::test]
    async fn success_decodes_and_publishes() {
        let handler = handler();
        let calls = counter(&handler);

        let exchange = handler
            .request(&Arc::new(Fixed(ResponseStatus::Success)), &SetPointCommand::cool(70))
            .await;

        assert_eq!(exchange.decoded, Some(70));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.last_status(), Some(ResponseStatus::Success));
        assert_eq!(handler.state(), HandlerState::Idle);
    }

    #[tokio::test]
    async fn failure_publishes_nothing() {
        let handler = handler();
        let calls = counter(&handler);

        for status in [
            ResponseStatus::Failure,
            ResponseStatus::Timeout,
            ResponseStatus::DirectNakPreNak,
        ] {
            let result = handler
                .send(&Arc::new(Fixed(status)), &SetPointCommand::cool(70))
                .await;
            assert_eq!(result, status);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropped_caller_still_applies_late_response() {
        let handler = handler();
        let calls = counter(&handler);
        let release = Arc::new(Notify::new());
        let transport = Arc::new(Gated {
            release: Arc::clone(&release),
        });

        let pending = tokio::spawn({
            let handler = Arc::clone(&handler);
            async move { handler.send(&transport, &SetPointCommand::heat(60)).await }
        });
        tokio::task::yield_now().await;
        while handler.state() == HandlerState::Idle {
            tokio::task::yield_now().await;
        }
        pending.abort();

        release.notify_one();
        while handler.state() == HandlerState::AwaitingResponse {
            tokio::task::yield_now().await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inbound_matching() {
        let handler = handler();
        let address = Address::new([1, 2, 3]);
        let calls = counter(&handler);

        assert!(handler.matches(&Frame::standard(address, 0x71, 68)));
        assert!(!handler.matches(&Frame::standard(address, 0x72, 68)));
        assert!(!handler.matches(&Frame::broadcast(address, 1, 0x71, 68)));

        assert!(handler.receive(&Frame::standard(address, 0x71, 68)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_publishing() {
        let handler = handler();
        let id = handler.subscribe(|_| panic!("unsubscribed callback called"));
        assert!(handler.unsubscribe(id));
        assert!(!handler.unsubscribe(id));
        handler.receive(&Frame::standard(Address::new([1, 2, 3]), 0x71, 1));
    }
}
