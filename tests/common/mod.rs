// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use insteon_lib::protocol::{Frame, Reply, Transport, UserData};
use insteon_lib::types::Address;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

type Responder = Box<dyn Fn(&Frame) -> Option<Reply> + Send + Sync>;

/// Transport that records every frame and answers from a script.
///
/// Queued replies are used first, then the responder; anything else is
/// echoed back as a successful response.
pub struct ScriptedTransport {
    sent: Mutex<Vec<Frame>>,
    replies: Mutex<VecDeque<Reply>>,
    responder: Mutex<Option<Responder>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            responder: Mutex::new(None),
            gate: None,
        })
    }

    /// A transport that holds each reply until a permit is added to the
    /// returned semaphore.
    pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            responder: Mutex::new(None),
            gate: Some(Arc::clone(&gate)),
        });
        (transport, gate)
    }

    pub fn push_reply(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    pub fn respond_with<F>(&self, responder: F)
    where
        F: Fn(&Frame) -> Option<Reply> + Send + Sync + 'static,
    {
        *self.responder.lock() = Some(Box::new(responder));
    }

    pub fn sent(&self) -> Vec<Frame> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, frame: Frame) -> Reply {
        self.sent.lock().push(frame.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        if let Some(reply) = self.replies.lock().pop_front() {
            return reply;
        }
        let scripted = self
            .responder
            .lock()
            .as_ref()
            .and_then(|responder| responder(&frame));
        scripted.unwrap_or_else(|| Reply::success(frame))
    }
}

pub fn address() -> Address {
    Address::new([0x1A, 0x2B, 0x3C])
}

/// A property block as returned by an extended get of `group`.
pub fn property_block(group: u8, fields: &[(u8, u8)]) -> Frame {
    let mut data = UserData::new();
    data.set(1, group);
    data.set(2, 0x01);
    for &(field, value) in fields {
        data.set(field, value);
    }
    data.set_checksum(0x2E, 0x00);
    Frame::extended(address(), 0x2E, 0x00, data)
}

/// Returns `true` for an extended get request.
pub fn is_extended_get(frame: &Frame) -> bool {
    frame.cmd1 == 0x2E && frame.cmd2 == 0x00 && frame.data(2) == Some(0x00)
}

/// Returns `true` for an extended set writing a configuration byte.
pub fn is_extended_set(frame: &Frame, command: u8) -> bool {
    frame.cmd1 == 0x2E && frame.cmd2 == 0x00 && frame.data(2) == Some(command)
}

/// Yields until `done` holds, failing the test after a while.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
