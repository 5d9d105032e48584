// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Keypad buttons and LEDs.
//!
//! Bit `n - 1` of a button mask stands for button `n`. A button's
//! `on_mask` lists the buttons whose LED follows it, and its `off_mask`
//! those among them that turn off instead. Two buttons that list each other
//! in both masks behave as radio buttons.

use std::sync::Arc;

use crate::command::{Command, SetLedsCommand};
use crate::config::{PropertyEditor, bit_is_set, button_property, names, set_bit};
use crate::error::{Error, ValueError};
use crate::event::ButtonEvent;
use crate::group::Value;
use crate::protocol::Transport;
use crate::types::{ResponseStatus, ToggleMode};

use super::{Device, DeviceProfile};

fn mask_names(button: u8) -> (String, String) {
    (
        button_property(names::ON_MASK, button),
        button_property(names::OFF_MASK, button),
    )
}

/// Gives both masks a zero value if either was never read.
fn assume_unloaded(editor: &mut PropertyEditor<'_>, first: &str, second: &str) -> Result<(), ValueError> {
    if !editor.is_loaded(first)? || !editor.is_loaded(second)? {
        editor.assume(first, 0)?;
        editor.assume(second, 0)?;
    }
    Ok(())
}

/// The staged value if the property is dirty, otherwise the committed one.
fn effective(editor: &PropertyEditor<'_>, name: &str) -> Result<u8, ValueError> {
    let value = if editor.is_dirty(name)? {
        editor.pending(name)?
    } else {
        editor.value(name)?
    };
    Ok(value.unwrap_or(0))
}

impl<T: Transport> Device<T> {
    // ========== Keypad ==========

    /// Returns the keypad button groups.
    #[must_use]
    pub fn buttons(&self) -> Vec<u8> {
        self.inner.descriptor.buttons()
    }

    /// Makes `buttons` radio buttons: pressing one turns the others off.
    ///
    /// The mask changes are staged; call
    /// [`write_config`](Self::write_config) to send them.
    ///
    /// # Errors
    ///
    /// - `DeviceError::UnsupportedCapability` if the device is not a keypad
    /// - `ValueError::TooFewButtons` for fewer than two buttons
    /// - `ValueError::UnknownButton` for a button the keypad does not have
    pub fn set_radio_buttons(&self, buttons: &[u8]) -> Result<(), Error> {
        self.check_keypad()?;
        if buttons.len() < 2 {
            return Err(ValueError::TooFewButtons(buttons.len()).into());
        }
        self.check_buttons(buttons)?;

        self.inner.properties.edit(|editor| {
            for &button in buttons {
                let (on_name, off_name) = mask_names(button);
                assume_unloaded(editor, &on_name, &off_name)?;
                let on_mask = editor.value(&on_name)?.unwrap_or(0);
                let off_mask = editor.value(&off_name)?.unwrap_or(0);

                let mut new_on = 0;
                let mut new_off = 0;
                for bit in 0..8u8 {
                    let (on_bit, off_bit) = if buttons.contains(&(bit + 1)) {
                        let linked = bit != button - 1;
                        (linked, linked)
                    } else {
                        (bit_is_set(on_mask, bit), bit_is_set(off_mask, bit))
                    };
                    new_on = set_bit(new_on, bit, on_bit);
                    new_off = set_bit(new_off, bit, off_bit);
                }
                editor.stage(&on_name, new_on)?;
                editor.stage(&off_name, new_off)?;
            }
            Ok::<(), ValueError>(())
        })?;

        tracing::debug!(address = %self.inner.address, ?buttons, "Radio buttons staged");
        Ok(())
    }

    /// Removes `buttons` from their radio button groups.
    ///
    /// The masks of the buttons are cleared, and every other button linked
    /// to one of them drops the link.
    ///
    /// # Errors
    ///
    /// - `DeviceError::UnsupportedCapability` if the device is not a keypad
    /// - `ValueError::UnknownButton` for a button the keypad does not have
    pub fn clear_radio_buttons(&self, buttons: &[u8]) -> Result<(), Error> {
        self.check_keypad()?;
        self.check_buttons(buttons)?;
        let others: Vec<u8> = self
            .buttons()
            .into_iter()
            .filter(|button| *button != 1 && !buttons.contains(button))
            .collect();

        self.inner.properties.edit(|editor| {
            let mut linked = Vec::new();
            for &other in &others {
                let (on_name, off_name) = mask_names(other);
                assume_unloaded(editor, &on_name, &off_name)?;
                for &button in buttons {
                    let on_set = bit_is_set(effective(editor, &on_name)?, button - 1);
                    let off_set = bit_is_set(effective(editor, &off_name)?, button - 1);
                    if on_set || (off_set && !linked.contains(&other)) {
                        linked.push(other);
                    }
                }
            }

            for &button in buttons {
                let (on_name, off_name) = mask_names(button);
                editor.stage(&on_name, 0)?;
                editor.stage(&off_name, 0)?;
            }

            for &other in &linked {
                let (on_name, off_name) = mask_names(other);
                for &button in buttons {
                    let on_mask = effective(editor, &on_name)?;
                    editor.stage(&on_name, set_bit(on_mask, button - 1, false))?;
                    let off_mask = effective(editor, &off_name)?;
                    editor.stage(&off_name, set_bit(off_mask, button - 1, false))?;
                }
            }
            Ok::<(), ValueError>(())
        })?;

        tracing::debug!(address = %self.inner.address, ?buttons, "Radio buttons cleared");
        Ok(())
    }

    /// Sets whether a button toggles or always sends on or off.
    ///
    /// # Errors
    ///
    /// - `DeviceError::UnsupportedCapability` if the device is not a keypad
    /// - `ValueError::UnknownButton` for a button the keypad does not have
    pub fn set_toggle_mode(&self, button: u8, mode: ToggleMode) -> Result<(), Error> {
        self.check_keypad()?;
        self.check_buttons(&[button])?;

        let (non_toggle, on_only) = match mode {
            ToggleMode::Toggle => (false, false),
            ToggleMode::OnOnly => (true, true),
            ToggleMode::OffOnly => (true, false),
        };
        self.inner.properties.edit(|editor| {
            assume_unloaded(editor, names::NON_TOGGLE_MASK, names::NON_TOGGLE_ON_OFF_MASK)?;
            let toggle_mask = editor
                .pending(names::NON_TOGGLE_MASK)?
                .or(editor.value(names::NON_TOGGLE_MASK)?)
                .unwrap_or(0);
            let on_off_mask = editor
                .pending(names::NON_TOGGLE_ON_OFF_MASK)?
                .or(editor.value(names::NON_TOGGLE_ON_OFF_MASK)?)
                .unwrap_or(0);
            editor.stage(names::NON_TOGGLE_MASK, set_bit(toggle_mask, button - 1, non_toggle))?;
            editor.stage(
                names::NON_TOGGLE_ON_OFF_MASK,
                set_bit(on_off_mask, button - 1, on_only),
            )
        })?;
        Ok(())
    }

    /// Returns the radio button groups described by the masks, counting
    /// staged changes.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the device is not a
    /// keypad.
    pub fn radio_button_groups(&self) -> Result<Vec<Vec<u8>>, Error> {
        self.check_keypad()?;
        let buttons = self.buttons();

        let groups = self.inner.properties.edit(|editor| {
            let mut groups: Vec<Vec<u8>> = Vec::new();
            for &button in &buttons {
                let (on_name, off_name) = mask_names(button);
                let on_mask = effective(editor, &on_name)?;
                let off_mask = effective(editor, &off_name)?;

                let mut group = vec![button];
                group.extend(buttons.iter().copied().filter(|other| {
                    *other != button
                        && bit_is_set(on_mask, other - 1)
                        && bit_is_set(off_mask, other - 1)
                }));
                group.sort_unstable();
                if group.len() > 1 && !groups.contains(&group) {
                    groups.push(group);
                }
            }
            Ok::<_, ValueError>(groups)
        })?;
        Ok(groups)
    }

    /// Returns the toggle mode of a button, counting staged changes.
    ///
    /// # Errors
    ///
    /// - `DeviceError::UnsupportedCapability` if the device is not a keypad
    /// - `ValueError::UnknownButton` for a button the keypad does not have
    pub fn toggle_mode(&self, button: u8) -> Result<ToggleMode, Error> {
        self.check_keypad()?;
        self.check_buttons(&[button])?;

        let properties = &self.inner.properties;
        let mask = |name: &str| properties.pending(name).or(properties.value(name)).unwrap_or(0);
        let bit = button - 1;
        let mode = if !bit_is_set(mask(names::NON_TOGGLE_MASK), bit) {
            ToggleMode::Toggle
        } else if bit_is_set(mask(names::NON_TOGGLE_ON_OFF_MASK), bit) {
            ToggleMode::OnOnly
        } else {
            ToggleMode::OffOnly
        };
        Ok(mode)
    }

    // ========== LEDs ==========

    /// Switches one button LED, sending the whole LED mask.
    ///
    /// The LED lock is taken before the mask is computed and released on the
    /// exchange task once the result is applied, so concurrent toggles see
    /// each other's results even when a caller stops waiting.
    pub(super) async fn toggle_led(&self, group: u8, on: bool) -> ResponseStatus {
        let leds = Arc::clone(&self.inner.led_lock).lock_owned().await;
        let mut states = [false; 8];
        for (state, led) in states.iter_mut().zip(1u8..) {
            *state = if led == group {
                on
            } else {
                self.inner.groups.is_on(led)
            };
        }
        let command = SetLedsCommand::from_states(states);
        tracing::debug!(
            address = %self.inner.address,
            command = command.name(),
            group,
            mask = command.mask,
            "Sending command"
        );

        let device = self.clone();
        let status = self
            .inner
            .handlers
            .set_leds
            .exchange(
                &self.inner.transport,
                command.to_frame(self.inner.address),
                move |status, _| {
                    if status.is_success() {
                        device.update_leds(group, on);
                    }
                    drop(leds);
                },
            )
            .await
            .status;
        self.refresh_on_nak(status).await
    }

    /// Applies a confirmed LED switch. A non-toggle button always ends off.
    pub(super) fn update_leds(&self, group: u8, on: bool) {
        if !self.inner.groups.contains(group) {
            return;
        }
        let level = if on { 0xFF } else { 0x00 };
        // Button n is bit n - 1, the same numbering the radio and toggle masks use.
        let non_toggle = group
            .checked_sub(1)
            .zip(self.inner.properties.value(names::NON_TOGGLE_MASK))
            .is_some_and(|(bit, mask)| bit_is_set(mask, bit));
        let value = if non_toggle { 0x00 } else { level };

        self.inner.groups.update(group, Value::Level(value));
        let event = if on { ButtonEvent::On } else { ButtonEvent::Off };
        self.publish_button(group, event, level);
    }

    /// Updates the LEDs that follow `group` after its level changed.
    pub(super) fn led_follow(&self, group: u8, level: u8) {
        // Button n is bit n - 1 in the followers' masks.
        let Some(bit) = group.checked_sub(1) else {
            return;
        };
        for button in self.buttons() {
            if button == group {
                continue;
            }
            let (on_name, off_name) = mask_names(button);
            let (Some(on_mask), Some(off_mask)) = (
                self.inner.properties.value(&on_name),
                self.inner.properties.value(&off_name),
            ) else {
                continue;
            };
            if !bit_is_set(on_mask, bit) {
                continue;
            }
            let value = if bit_is_set(off_mask, bit) { 0x00 } else { level };
            self.inner.groups.update(button, Value::Level(value));
        }
    }

    fn check_keypad(&self) -> Result<(), Error> {
        self.check_capability("keypad buttons", self.profile() == DeviceProfile::Keypad)
    }

    fn check_buttons(&self, buttons: &[u8]) -> Result<(), Error> {
        let known = self.buttons();
        match buttons.iter().find(|button| !known.contains(button)) {
            Some(&unknown) => Err(ValueError::UnknownButton(unknown).into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PropertyDef, PropertyRegistry};
    use crate::types::Address;

    fn registry() -> PropertyRegistry {
        let defs = [
            PropertyDef::new(names::ON_MASK, 1, 3).with_write_command(0x02),
            PropertyDef::new(names::OFF_MASK, 1, 4).with_write_command(0x03),
        ];
        PropertyRegistry::from_defs(Address::new([1, 2, 3]), &defs).unwrap()
    }

    #[test]
    fn unloaded_masks_are_assumed_zero() {
        let registry = registry();
        registry
            .edit(|editor| assume_unloaded(editor, names::ON_MASK, names::OFF_MASK))
            .unwrap();
        assert_eq!(registry.value(names::ON_MASK), Some(0));
        assert_eq!(registry.value(names::OFF_MASK), Some(0));
    }

    #[test]
    fn effective_prefers_staged_value() {
        let registry = registry();
        registry
            .edit(|editor| {
                editor.assume(names::ON_MASK, 0b0001)?;
                editor.stage(names::ON_MASK, 0b0110)
            })
            .unwrap();
        let value = registry.edit(|editor| effective(editor, names::ON_MASK)).unwrap();
        assert_eq!(value, 0b0110);
        let value = registry.edit(|editor| effective(editor, names::OFF_MASK)).unwrap();
        assert_eq!(value, 0);
    }

    #[test]
    fn mask_names_follow_button_suffix() {
        assert_eq!(
            mask_names(1),
            ("on_mask".to_string(), "off_mask".to_string())
        );
        assert_eq!(mask_names(4).0, "on_mask_4");
    }
}
