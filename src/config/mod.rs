// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration properties.
//!
//! Configuration values live in device memory, packed into bytes that are
//! read with an extended get (one property block per group) and written one
//! byte at a time with an extended set. A byte may hold a single value or
//! several bit fields.
//!
//! - [`BitFieldProperty`] - One value inside a memory byte, with committed
//!   and pending state
//! - [`PropertyRegistry`] - All properties of a device, grouped by byte
//! - [`PropertyDef`] - Declaration of a property in a device descriptor

mod bit_field;
mod registry;

pub use bit_field::BitFieldProperty;
pub use registry::{ByteWrite, PropertyEditor, PropertyRegistry, WriteOutcome};

use crate::error::ValueError;

/// Properties shared by several device types.
pub mod names {
    /// Buttons whose LED turns on with this button (keypads).
    pub const ON_MASK: &str = "on_mask";
    /// Buttons whose LED turns off with this button (keypads).
    pub const OFF_MASK: &str = "off_mask";
    /// X10 house code.
    pub const X10_HOUSE: &str = "x10_house";
    /// X10 unit code.
    pub const X10_UNIT: &str = "x10_unit";
    /// LED brightness.
    pub const LED_DIMMING: &str = "led_dimming";
    /// Buttons that do not toggle (keypads).
    pub const NON_TOGGLE_MASK: &str = "non_toggle_mask";
    /// For non-toggle buttons, whether they send on (bit set) or off.
    pub const NON_TOGGLE_ON_OFF_MASK: &str = "non_toggle_on_off_mask";
    /// Buttons that trigger their group when pressed.
    pub const TRIGGER_GROUP_MASK: &str = "trigger_group_mask";
    /// Temperature calibration offset (thermostats).
    pub const TEMP_OFFSET: &str = "temp_offset";
    /// Humidity calibration offset (thermostats).
    pub const HUMIDITY_OFFSET: &str = "humidity_offset";
    /// Backlight duration (thermostats).
    pub const BACKLIGHT: &str = "backlight";
    /// Compressor change delay (thermostats).
    pub const CHANGE_DELAY: &str = "change_delay";
    /// Local programming is locked.
    pub const PROGRAM_LOCK_ON: &str = "program_lock_on";
    /// Keys beep when pressed.
    pub const KEY_BEEP_ON: &str = "key_beep_on";
    /// Buttons are locked.
    pub const BUTTON_LOCK_ON: &str = "button_lock_on";
    /// Temperatures are reported in Celsius.
    pub const CELSIUS: &str = "celsius";
    /// The clock uses 24-hour format.
    pub const TIME_24_HOUR_FORMAT: &str = "time_24_hour_format";
    /// Status LED is on.
    pub const LED_ON: &str = "led_on";
}

/// Returns the name of a per-button property.
///
/// Button 1 uses the bare name; other buttons get a `_N` suffix.
///
/// # Examples
///
/// ```
/// use insteon_lib::config::{button_property, names};
///
/// assert_eq!(button_property(names::ON_MASK, 1), "on_mask");
/// assert_eq!(button_property(names::ON_MASK, 3), "on_mask_3");
/// ```
#[must_use]
pub fn button_property(base: &str, button: u8) -> String {
    if button == 1 {
        base.to_string()
    } else {
        format!("{base}_{button}")
    }
}

/// Returns `true` if bit `bit` of `value` is set.
#[must_use]
pub const fn bit_is_set(value: u8, bit: u8) -> bool {
    bit < 8 && value & (1 << bit) != 0
}

/// Returns `value` with bit `bit` set or cleared.
#[must_use]
pub const fn set_bit(value: u8, bit: u8, on: bool) -> u8 {
    if bit >= 8 {
        value
    } else if on {
        value | (1 << bit)
    } else {
        value & !(1 << bit)
    }
}

/// How prominently a property is presented to users.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// Commonly changed setting.
    #[default]
    Standard,
    /// Setting for experienced users.
    Advanced,
    /// Internal setting not shown to users.
    Hidden,
}

/// What a write does with bits of a byte that was never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnloadedBytePolicy {
    /// Read the byte's property block from the device before writing.
    #[default]
    ReadFirst,
    /// Treat unread bits as zero.
    AssumeZero,
}

/// Position of a memory byte: the property block (group) it is read with
/// and its `dataN` field within the block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ByteLocation {
    /// Property block group.
    pub group: u8,
    /// User data field, 1-based.
    pub data_field: u8,
}

impl ByteLocation {
    /// Creates a byte location.
    #[must_use]
    pub const fn new(group: u8, data_field: u8) -> Self {
        Self { group, data_field }
    }
}

/// Bits of a byte occupied by a field.
///
/// # Examples
///
/// ```
/// use insteon_lib::config::BitSpan;
///
/// let span = BitSpan::new(2, 3).unwrap();
/// assert_eq!(span.mask(), 0b0001_1100);
/// assert_eq!(span.extract(0b1111_0100), 0b101);
/// assert_eq!(span.insert(0b1111_1111, 0), 0b1110_0011);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BitSpan {
    /// Lowest bit of the field.
    pub offset: u8,
    /// Number of bits.
    pub width: u8,
}

impl BitSpan {
    /// Creates a span of `width` bits starting at bit `offset`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the span does not fit in a byte.
    pub fn new(offset: u8, width: u8) -> Result<Self, ValueError> {
        let span = Self { offset, width };
        span.validate()?;
        Ok(span)
    }

    /// Creates a single-bit span.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `bit` is greater than 7.
    pub fn bit(bit: u8) -> Result<Self, ValueError> {
        Self::new(bit, 1)
    }

    pub(crate) fn validate(&self) -> Result<(), ValueError> {
        let end = u16::from(self.offset) + u16::from(self.width);
        if self.width == 0 || end > 8 {
            return Err(ValueError::OutOfRange {
                min: 1,
                max: 8,
                actual: end,
            });
        }
        Ok(())
    }

    /// Returns the largest value the field can hold.
    #[must_use]
    pub const fn max_value(&self) -> u8 {
        if self.width >= 8 {
            u8::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Returns the bits of the field within the byte.
    #[must_use]
    pub const fn mask(&self) -> u8 {
        self.max_value() << self.offset
    }

    /// Reads the field from a byte.
    #[must_use]
    pub const fn extract(&self, byte: u8) -> u8 {
        (byte & self.mask()) >> self.offset
    }

    /// Returns `byte` with the field replaced by `value`.
    #[must_use]
    pub const fn insert(&self, byte: u8, value: u8) -> u8 {
        (byte & !self.mask()) | ((value << self.offset) & self.mask())
    }
}

/// Declaration of one configuration property.
///
/// # Examples
///
/// ```
/// use insteon_lib::config::{PropertyDef, PropertyType};
///
/// let flags = PropertyDef::new("celsius", 0, 13)
///     .with_write_command(0x04)
///     .with_bit(3)
///     .with_type(PropertyType::Advanced);
/// assert!(flags.bits.is_some());
///
/// let x10 = PropertyDef::new("x10_house", 0, 5);
/// assert!(x10.write_command.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PropertyDef {
    /// Property name, unique per device.
    pub name: String,
    /// Property block group the byte belongs to.
    pub group: u8,
    /// User data field holding the byte.
    pub data_field: u8,
    /// Bits of the byte used by the property; `None` for the whole byte.
    #[serde(default)]
    pub bits: Option<BitSpan>,
    /// Extended set command (`data2`) that writes the byte; `None` if the
    /// byte is read-only.
    #[serde(default)]
    pub write_command: Option<u8>,
    /// Presentation class.
    #[serde(default)]
    pub property_type: PropertyType,
}

impl PropertyDef {
    /// Declares a read-only whole-byte property.
    #[must_use]
    pub fn new(name: impl Into<String>, group: u8, data_field: u8) -> Self {
        Self {
            name: name.into(),
            group,
            data_field,
            bits: None,
            write_command: None,
            property_type: PropertyType::Standard,
        }
    }

    /// Sets the command that writes the property's byte.
    #[must_use]
    pub fn with_write_command(mut self, command: u8) -> Self {
        self.write_command = Some(command);
        self
    }

    /// Restricts the property to a single bit.
    #[must_use]
    pub fn with_bit(mut self, bit: u8) -> Self {
        self.bits = Some(BitSpan {
            offset: bit,
            width: 1,
        });
        self
    }

    /// Restricts the property to a span of bits.
    #[must_use]
    pub fn with_bits(mut self, bits: BitSpan) -> Self {
        self.bits = Some(bits);
        self
    }

    /// Sets the presentation class.
    #[must_use]
    pub fn with_type(mut self, property_type: PropertyType) -> Self {
        self.property_type = property_type;
        self
    }

    /// Returns the location of the property's byte.
    #[must_use]
    pub const fn location(&self) -> ByteLocation {
        ByteLocation::new(self.group, self.data_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_helpers() {
        assert!(bit_is_set(0b0000_0100, 2));
        assert!(!bit_is_set(0b0000_0100, 1));
        assert!(!bit_is_set(0xFF, 8));
        assert_eq!(set_bit(0, 7, true), 0x80);
        assert_eq!(set_bit(0xFF, 0, false), 0xFE);
        assert_eq!(set_bit(0x12, 9, true), 0x12);
    }

    #[test]
    fn whole_byte_span() {
        let span = BitSpan::new(0, 8).unwrap();
        assert_eq!(span.mask(), 0xFF);
        assert_eq!(span.max_value(), 0xFF);
        assert_eq!(span.insert(0x12, 0x34), 0x34);
    }

    #[test]
    fn span_must_fit_in_byte() {
        assert!(BitSpan::new(6, 3).is_err());
        assert!(BitSpan::new(0, 0).is_err());
        assert!(BitSpan::bit(8).is_err());
        assert!(BitSpan::bit(7).is_ok());
    }

    #[test]
    fn byte_locations_order_by_group_then_field() {
        let mut locations = vec![
            ByteLocation::new(1, 3),
            ByteLocation::new(0, 13),
            ByteLocation::new(0, 6),
        ];
        locations.sort();
        assert_eq!(
            locations,
            vec![
                ByteLocation::new(0, 6),
                ByteLocation::new(0, 13),
                ByteLocation::new(1, 3),
            ]
        );
    }

    #[test]
    fn property_def_deserializes_with_defaults() {
        let def: PropertyDef =
            serde_json::from_str(r#"{"name":"backlight","group":0,"data_field":10}"#).unwrap();
        assert_eq!(def.property_type, PropertyType::Standard);
        assert!(def.bits.is_none());
        assert!(def.write_command.is_none());
    }
}
