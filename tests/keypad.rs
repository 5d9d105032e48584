// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for keypad buttons, LEDs and masks.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedTransport, address, is_extended_get, property_block, wait_until};
use insteon_lib::config::names;
use insteon_lib::event::{ButtonEvent, DeviceEvent, EventBus};
use insteon_lib::protocol::{Frame, Reply};
use insteon_lib::{
    Device, DeviceError, Error, ResponseStatus, ToggleMode, ValueError, Value, catalog,
};

fn keypad(transport: &Arc<ScriptedTransport>) -> Device<ScriptedTransport> {
    Device::builder(address(), catalog::keypad_linc_8(), Arc::clone(transport))
        .build()
        .unwrap()
}

/// Answers config reads with the given fields for each button group.
fn serve_blocks(transport: &ScriptedTransport, blocks: Vec<(u8, Vec<(u8, u8)>)>) {
    transport.respond_with(move |frame| {
        if !is_extended_get(frame) {
            return None;
        }
        let group = frame.data(1)?;
        let fields = blocks
            .iter()
            .find(|(block, _)| *block == group)
            .map_or(&[][..], |(_, fields)| fields.as_slice());
        Some(Reply::success(property_block(group, fields)))
    });
}

// ============================================================================
// LEDs
// ============================================================================

mod leds {
    use super::*;

    #[tokio::test]
    async fn concurrent_toggles_see_each_other() {
        let (transport, gate) = ScriptedTransport::gated();
        let device = keypad(&transport);

        let (first, second, ()) = tokio::join!(device.on(3), device.on(5), async {
            wait_until(|| transport.sent_count() == 1).await;
            gate.add_permits(1);
            wait_until(|| transport.sent_count() == 2).await;
            gate.add_permits(1);
        });

        assert_eq!(first.unwrap(), ResponseStatus::Success);
        assert_eq!(second.unwrap(), ResponseStatus::Success);
        let sent = transport.sent();
        assert_eq!(sent[0].data(2), Some(0x09));
        assert_eq!(sent[0].data(3), Some(0b0000_0100));
        assert_eq!(sent[1].data(3), Some(0b0001_0100));
        assert!(device.groups().is_on(3));
        assert!(device.groups().is_on(5));
    }

    #[tokio::test]
    async fn abandoned_toggle_still_holds_the_led_lock() {
        let (transport, gate) = ScriptedTransport::gated();
        let device = keypad(&transport);

        let first = tokio::time::timeout(Duration::from_millis(20), device.on(3)).await;
        assert!(first.is_err());
        let second = tokio::spawn({
            let device = device.clone();
            async move { device.on(5).await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.sent_count(), 1);

        gate.add_permits(1);
        wait_until(|| transport.sent_count() == 2).await;
        gate.add_permits(1);

        assert_eq!(second.await.unwrap().unwrap(), ResponseStatus::Success);
        let sent = transport.sent();
        assert_eq!(sent[0].data(3), Some(0b0000_0100));
        assert_eq!(sent[1].data(3), Some(0b0001_0100));
        assert!(device.groups().is_on(3));
        assert!(device.groups().is_on(5));
    }

    #[tokio::test]
    async fn off_clears_the_led_bit() {
        let transport = ScriptedTransport::new();
        let device = keypad(&transport);
        device.on(4).await.unwrap();
        device.on(6).await.unwrap();

        device.off(4).await.unwrap();

        assert_eq!(transport.sent()[2].data(3), Some(0b0010_0000));
        assert!(!device.groups().is_on(4));
        assert!(device.groups().is_on(6));
    }

    #[tokio::test]
    async fn failed_toggle_keeps_led_state() {
        let transport = ScriptedTransport::new();
        transport.push_reply(Reply::status(ResponseStatus::Failure));
        let device = keypad(&transport);

        assert_eq!(device.on(3).await.unwrap(), ResponseStatus::Failure);
        assert!(!device.groups().is_on(3));
    }

    #[tokio::test]
    async fn non_toggle_button_ends_off_but_reports_press() {
        let transport = ScriptedTransport::new();
        serve_blocks(&transport, vec![(1, vec![(10, 0b0000_0100)])]);
        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let device = Device::builder(address(), catalog::keypad_linc_8(), Arc::clone(&transport))
            .with_event_bus(bus)
            .build()
            .unwrap();
        device.read_config().await.unwrap();

        device.on(3).await.unwrap();

        assert_eq!(device.groups().value(3), Some(Value::OnOff(false)));
        let mut pressed = false;
        while let Ok(event) = events.try_recv() {
            if let DeviceEvent::Button { group: 3, event, level, .. } = event {
                assert_eq!(event, ButtonEvent::On);
                assert_eq!(level, 0xFF);
                pressed = true;
            }
        }
        assert!(pressed);
    }

    #[tokio::test]
    async fn main_button_uses_on_off_command() {
        let transport = ScriptedTransport::new();
        let device = keypad(&transport);

        device.on(1).await.unwrap();

        let frame = &transport.sent()[0];
        assert_eq!(frame.cmd1, 0x11);
        assert!(device.groups().is_on(1));
    }

    #[tokio::test]
    async fn unknown_group_is_rejected() {
        let transport = ScriptedTransport::new();
        let device = Device::builder(address(), catalog::keypad_linc_6(), Arc::clone(&transport))
            .build()
            .unwrap();

        let err = device.on(2).await.unwrap_err();

        assert!(matches!(err, Error::Value(ValueError::UnknownGroup(2))));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn linked_leds_follow_a_press() {
        let transport = ScriptedTransport::new();
        serve_blocks(
            &transport,
            vec![
                (4, vec![(3, 0b0000_0100), (4, 0b0000_0100)]),
                (5, vec![(3, 0b0000_0100), (4, 0)]),
            ],
        );
        let device = keypad(&transport);
        device.read_config().await.unwrap();

        assert!(device.handle_inbound(&Frame::broadcast(address(), 3, 0x11, 0xFF)));

        let groups = device.groups();
        assert!(groups.is_on(3));
        assert_eq!(groups.value(4), Some(Value::OnOff(false)));
        assert!(groups.is_on(5));
        assert_eq!(groups.value(6), None);
    }

    #[test]
    fn followers_wait_for_loaded_masks() {
        let device = keypad(&ScriptedTransport::new());

        device.handle_inbound(&Frame::broadcast(address(), 3, 0x11, 0xFF));

        assert!(device.groups().is_on(3));
        assert_eq!(device.groups().value(4), None);
    }
}

// ============================================================================
// Radio Buttons
// ============================================================================

mod radio_buttons {
    use super::*;

    #[test]
    fn set_links_every_member() {
        let device = keypad(&ScriptedTransport::new());

        device.set_radio_buttons(&[3, 4, 5]).unwrap();

        let properties = device.properties();
        assert_eq!(properties.pending("on_mask_3"), Some(0b0001_1000));
        assert_eq!(properties.pending("off_mask_3"), Some(0b0001_1000));
        assert_eq!(properties.pending("on_mask_4"), Some(0b0001_0100));
        assert_eq!(properties.pending("on_mask_5"), Some(0b0000_1100));
        assert_eq!(device.radio_button_groups().unwrap(), vec![vec![3, 4, 5]]);
    }

    #[test]
    fn clear_unlinks_remaining_members() {
        let device = keypad(&ScriptedTransport::new());
        device.set_radio_buttons(&[3, 4, 5]).unwrap();

        device.clear_radio_buttons(&[3]).unwrap();

        let properties = device.properties();
        assert_eq!(properties.pending("on_mask_3"), Some(0));
        assert_eq!(properties.pending("on_mask_4"), Some(0b0001_0000));
        assert_eq!(properties.pending("off_mask_4"), Some(0b0001_0000));
        assert_eq!(properties.pending("on_mask_5"), Some(0b0000_1000));
        assert_eq!(device.radio_button_groups().unwrap(), vec![vec![4, 5]]);
    }

    #[test]
    fn single_button_is_rejected() {
        let device = keypad(&ScriptedTransport::new());
        let err = device.set_radio_buttons(&[3]).unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::TooFewButtons(1))));
    }

    #[test]
    fn unknown_button_is_rejected() {
        let device = Device::builder(address(), catalog::keypad_linc_6(), ScriptedTransport::new())
            .build()
            .unwrap();
        let err = device.set_radio_buttons(&[3, 8]).unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::UnknownButton(8))));
    }

    #[tokio::test]
    async fn masks_are_written_per_button() {
        let transport = ScriptedTransport::new();
        serve_blocks(&transport, Vec::new());
        let device = keypad(&transport);
        device.read_config().await.unwrap();
        transport.clear();

        device.set_radio_buttons(&[3, 4]).unwrap();
        device.write_config().await.unwrap();

        let writes: Vec<(u8, u8, u8)> = transport
            .sent()
            .iter()
            .filter_map(|frame| Some((frame.data(1)?, frame.data(2)?, frame.data(3)?)))
            .collect();
        assert_eq!(
            writes,
            vec![
                (3, 0x02, 0b1000),
                (3, 0x03, 0b1000),
                (4, 0x02, 0b0100),
                (4, 0x03, 0b0100),
            ]
        );
    }
}

// ============================================================================
// Toggle Modes
// ============================================================================

mod toggle_modes {
    use super::*;

    #[test]
    fn modes_round_trip_through_masks() {
        let device = keypad(&ScriptedTransport::new());
        assert_eq!(device.toggle_mode(5).unwrap(), ToggleMode::Toggle);

        device.set_toggle_mode(5, ToggleMode::OnOnly).unwrap();
        assert_eq!(device.toggle_mode(5).unwrap(), ToggleMode::OnOnly);
        assert_eq!(device.properties().pending(names::NON_TOGGLE_MASK), Some(0b1_0000));
        assert_eq!(
            device.properties().pending(names::NON_TOGGLE_ON_OFF_MASK),
            Some(0b1_0000)
        );

        device.set_toggle_mode(5, ToggleMode::OffOnly).unwrap();
        assert_eq!(device.toggle_mode(5).unwrap(), ToggleMode::OffOnly);
        assert_eq!(device.properties().pending(names::NON_TOGGLE_ON_OFF_MASK), Some(0));

        device.set_toggle_mode(5, ToggleMode::Toggle).unwrap();
        assert_eq!(device.toggle_mode(5).unwrap(), ToggleMode::Toggle);
    }

    #[test]
    fn other_buttons_keep_their_mode() {
        let device = keypad(&ScriptedTransport::new());
        device.set_toggle_mode(2, ToggleMode::OffOnly).unwrap();
        device.set_toggle_mode(7, ToggleMode::OnOnly).unwrap();

        assert_eq!(device.toggle_mode(2).unwrap(), ToggleMode::OffOnly);
        assert_eq!(device.toggle_mode(7).unwrap(), ToggleMode::OnOnly);
        assert_eq!(
            device.properties().pending(names::NON_TOGGLE_MASK),
            Some(0b0100_0010)
        );
    }

    #[test]
    fn switch_has_no_buttons() {
        let device = Device::builder(address(), catalog::switch_linc(), ScriptedTransport::new())
            .build()
            .unwrap();
        let err = device.set_toggle_mode(1, ToggleMode::OnOnly).unwrap_err();
        assert!(matches!(
            err,
            Error::Device(DeviceError::UnsupportedCapability { .. })
        ));
    }
}

// ============================================================================
// Status
// ============================================================================

mod status {
    use super::*;

    #[tokio::test]
    async fn status_maps_main_level_and_led_bits() {
        let transport = ScriptedTransport::new();
        transport.respond_with(|frame| match (frame.cmd1, frame.cmd2) {
            (0x19, 0x02) => Some(Reply::success(Frame::standard(address(), 0x01, 0x80))),
            (0x19, 0x01) => Some(Reply::success(Frame::standard(address(), 0x01, 0b0001_0100))),
            _ => None,
        });
        let device = keypad(&transport);

        assert_eq!(device.status().await, ResponseStatus::Success);

        let groups = device.groups();
        assert!(groups.is_on(1));
        assert!(groups.is_on(3));
        assert!(!groups.is_on(4));
        assert!(groups.is_on(5));
        assert!(!groups.is_on(8));
    }
}
