// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for battery devices that only listen when awake.

mod common;

use std::sync::Arc;

use common::{ScriptedTransport, address, wait_until};
use insteon_lib::protocol::{Frame, Reply};
use insteon_lib::{Device, ResponseStatus, Value, catalog};

fn wireless_thermostat(transport: &Arc<ScriptedTransport>) -> Device<ScriptedTransport> {
    Device::builder(address(), catalog::wireless_thermostat(), Arc::clone(transport))
        .build()
        .unwrap()
}

// ============================================================================
// Wake Queue
// ============================================================================

mod wake_queue {
    use super::*;

    #[tokio::test]
    async fn operations_wait_for_wake_and_run_in_order() {
        let transport = ScriptedTransport::new();
        let device = wireless_thermostat(&transport);
        assert!(device.is_battery());

        let cool = tokio::spawn({
            let device = device.clone();
            async move { device.set_cool_set_point(70).await }
        });
        wait_until(|| device.pending_wake_operations() == 1).await;
        let heat = tokio::spawn({
            let device = device.clone();
            async move { device.set_heat_set_point(68).await }
        });
        wait_until(|| device.pending_wake_operations() == 2).await;
        assert_eq!(transport.sent_count(), 0);

        transport.push_reply(Reply::acknowledged());
        transport.push_reply(Reply::status(ResponseStatus::Timeout));
        assert_eq!(device.wake().await, 2);

        assert_eq!(cool.await.unwrap().unwrap(), ResponseStatus::Success);
        assert_eq!(heat.await.unwrap().unwrap(), ResponseStatus::Timeout);
        let sent = transport.sent();
        assert_eq!(sent[0].cmd1, 0x6C);
        assert_eq!(sent[1].cmd1, 0x6D);
        assert_eq!(device.groups().value(14), Some(Value::SetPoint(70)));
        assert_eq!(device.groups().value(15), Some(Value::SetPoint(95)));
        assert_eq!(device.pending_wake_operations(), 0);
    }

    #[tokio::test]
    async fn inbound_message_wakes_the_device() {
        let transport = ScriptedTransport::new();
        let device = wireless_thermostat(&transport);

        let queued = tokio::spawn({
            let device = device.clone();
            async move { device.set_mode(insteon_lib::ThermostatMode::Heat).await }
        });
        wait_until(|| device.pending_wake_operations() == 1).await;

        assert!(device.handle_inbound(&Frame::standard(address(), 0x6E, 140)));

        assert_eq!(queued.await.unwrap().unwrap(), ResponseStatus::Success);
        assert_eq!(transport.sent_count(), 1);
        assert_eq!(device.groups().value(10), Some(Value::Temperature(70.0)));
    }

    #[tokio::test]
    async fn wake_with_empty_queue_does_nothing() {
        let transport = ScriptedTransport::new();
        let device = wireless_thermostat(&transport);

        assert_eq!(device.wake().await, 0);
        assert_eq!(transport.sent_count(), 0);
    }
}

// ============================================================================
// Ungated Operations
// ============================================================================

mod ungated {
    use super::*;

    #[tokio::test]
    async fn status_is_sent_immediately() {
        let transport = ScriptedTransport::new();
        let device = wireless_thermostat(&transport);

        assert_eq!(device.status().await, ResponseStatus::Success);

        assert_eq!(transport.sent_count(), 2);
        assert_eq!(device.pending_wake_operations(), 0);
    }

    #[tokio::test]
    async fn mains_powered_device_never_queues() {
        let transport = ScriptedTransport::new();
        let device = Device::builder(address(), catalog::thermostat(), Arc::clone(&transport))
            .build()
            .unwrap();

        device.set_cool_set_point(72).await.unwrap();

        assert_eq!(transport.sent_count(), 1);
        assert_eq!(device.wake().await, 0);
    }
}
