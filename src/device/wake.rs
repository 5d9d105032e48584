// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deferred execution for sleeping devices.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{Error, ProtocolError};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Holds operations until a battery device wakes up.
///
/// Each call to [`run_on_wake`](Self::run_on_wake) queues one job and
/// waits for its result. [`wake`](Self::wake) runs the queued jobs one at a
/// time, in call order.
#[derive(Default)]
pub(crate) struct WakeGate {
    queue: Mutex<VecDeque<Job>>,
    drain: tokio::sync::Mutex<()>,
}

impl WakeGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues `op` and waits until a wake runs it.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::ChannelClosed` if the job was dropped before
    /// it ran.
    pub(crate) async fn run_on_wake<R, F>(&self, op: F) -> Result<R, Error>
    where
        R: Send + 'static,
        F: Future<Output = R> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let queued = {
            let mut queue = self.queue.lock();
            queue.push_back(Box::pin(async move {
                // The caller may have stopped waiting.
                let _ = tx.send(op.await);
            }));
            queue.len()
        };
        tracing::debug!(queued, "Operation queued until the device wakes");

        rx.await.map_err(|_| {
            Error::Protocol(ProtocolError::ChannelClosed(
                "wake queue dropped the operation".to_string(),
            ))
        })
    }

    /// Returns the number of queued jobs.
    pub(crate) fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Runs queued jobs in order until the queue is empty.
    ///
    /// Concurrent wakes run one after the other. Returns the number of jobs
    /// this call ran.
    pub(crate) async fn wake(&self) -> usize {
        let _drain = self.drain.lock().await;
        let mut ran = 0;
        loop {
            let Some(job) = self.queue.lock().pop_front() else {
                break;
            };
            job.await;
            ran += 1;
        }
        if ran > 0 {
            tracing::debug!(ran, "Drained wake queue");
        }
        ran
    }
}

impl fmt::Debug for WakeGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeGate")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn jobs_run_in_call_order_on_wake() {
        let gate = Arc::new(WakeGate::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut callers = Vec::new();
        for label in ["a", "b"] {
            let gate_ref = Arc::clone(&gate);
            let order = Arc::clone(&order);
            callers.push(tokio::spawn(async move {
                gate_ref
                    .run_on_wake(async move {
                        order.lock().push(label);
                        label.len()
                    })
                    .await
            }));
            while gate.pending() < callers.len() {
                tokio::task::yield_now().await;
            }
        }
        assert!(order.lock().is_empty());

        assert_eq!(gate.wake().await, 2);
        for caller in callers {
            assert_eq!(caller.await.unwrap().unwrap(), 1);
        }
        assert_eq!(*order.lock(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn dropped_gate_closes_the_channel() {
        let gate = WakeGate::new();
        let waiting = gate.run_on_wake(async { 1 });
        tokio::pin!(waiting);

        // Poll once so the job is queued, then drop the queue.
        assert!(futures_poll_once(waiting.as_mut()).await.is_none());
        gate.queue.lock().clear();

        let err = waiting.await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ChannelClosed(_))
        ));
    }

    async fn futures_poll_once<F: Future + Unpin>(fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            output = fut => Some(output),
            () = tokio::task::yield_now() => None,
        }
    }
}
