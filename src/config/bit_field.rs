// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A single configuration value packed in a memory byte.

use crate::error::ValueError;
use crate::types::Address;

use super::{BitSpan, ByteLocation, PropertyDef, PropertyType};

/// One configuration value of a device.
///
/// A property tracks two values: the committed value, last read from or
/// confirmed by the device, and a pending value staged locally but not yet
/// written.
///
/// # Examples
///
/// ```
/// use insteon_lib::config::{BitFieldProperty, PropertyDef};
/// use insteon_lib::types::Address;
///
/// let def = PropertyDef::new("key_beep_on", 0, 13)
///     .with_write_command(0x04)
///     .with_bit(1);
/// let mut prop = BitFieldProperty::new(Address::new([1, 2, 3]), &def);
/// assert!(!prop.is_loaded());
///
/// prop.read(0b0000_0010);
/// assert_eq!(prop.value(), Some(1));
///
/// prop.set_pending(0).unwrap();
/// assert!(prop.is_dirty());
///
/// prop.commit(0b0000_0000);
/// assert!(!prop.is_dirty());
/// assert_eq!(prop.value(), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFieldProperty {
    name: String,
    address: Address,
    location: ByteLocation,
    bits: Option<BitSpan>,
    property_type: PropertyType,
    writable: bool,
    value: Option<u8>,
    pending: Option<u8>,
}

impl BitFieldProperty {
    /// Creates a property from its declaration.
    #[must_use]
    pub fn new(address: Address, def: &PropertyDef) -> Self {
        Self {
            name: def.name.clone(),
            address,
            location: def.location(),
            bits: def.bits,
            property_type: def.property_type,
            writable: def.write_command.is_some(),
            value: None,
            pending: None,
        }
    }

    // ========== Accessors ==========

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the address of the owning device.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the location of the property's byte.
    #[must_use]
    pub const fn location(&self) -> ByteLocation {
        self.location
    }

    /// Returns the bits used within the byte; `None` for the whole byte.
    #[must_use]
    pub const fn bits(&self) -> Option<BitSpan> {
        self.bits
    }

    /// Returns the presentation class.
    #[must_use]
    pub const fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Returns `true` if the property's byte has a write command.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns the committed value.
    #[must_use]
    pub const fn value(&self) -> Option<u8> {
        self.value
    }

    /// Returns the pending value.
    #[must_use]
    pub const fn pending(&self) -> Option<u8> {
        self.pending
    }

    /// Returns `true` once a value was read or committed.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// Returns `true` if a pending value differs from the committed value.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.pending.is_some_and(|pending| Some(pending) != self.value)
    }

    /// Returns the largest value the property can hold.
    #[must_use]
    pub fn max_value(&self) -> u8 {
        self.bits.map_or(u8::MAX, |bits| bits.max_value())
    }

    // ========== Byte Conversion ==========

    /// Reads this property's bits from a memory byte.
    #[must_use]
    pub fn decode(&self, byte: u8) -> u8 {
        self.bits.map_or(byte, |bits| bits.extract(byte))
    }

    /// Returns `byte` with this property's bits replaced by `value`.
    #[must_use]
    pub fn encode(&self, byte: u8, value: u8) -> u8 {
        self.bits.map_or(value, |bits| bits.insert(byte, value))
    }

    // ========== State Changes ==========

    /// Loads the committed value from a byte read from the device.
    ///
    /// Returns `true` if the committed value changed. A pending edit is kept.
    pub fn read(&mut self, byte: u8) -> bool {
        let decoded = self.decode(byte);
        let changed = self.value != Some(decoded);
        self.value = Some(decoded);
        changed
    }

    /// Stages a value to be written on the next flush.
    ///
    /// # Errors
    ///
    /// - `ValueError::ReadOnly` if the property's byte cannot be written
    /// - `ValueError::OutOfRange` if the value does not fit the field's bits
    pub fn set_pending(&mut self, value: u8) -> Result<(), ValueError> {
        if !self.writable {
            return Err(ValueError::ReadOnly(self.name.clone()));
        }
        let max = self.max_value();
        if value > max {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: u16::from(max),
                actual: u16::from(value),
            });
        }
        self.pending = Some(value);
        Ok(())
    }

    /// Adopts the byte the device confirmed after a write and clears the
    /// pending value.
    ///
    /// Returns `true` if the committed value changed.
    pub fn commit(&mut self, byte: u8) -> bool {
        self.pending = None;
        self.read(byte)
    }

    /// Like [`commit`](Self::commit), but keeps a pending value staged after
    /// `written` was snapshotted for the write.
    pub(crate) fn commit_written(&mut self, byte: u8, written: Option<u8>) -> bool {
        let newer = self.pending.filter(|pending| Some(*pending) != written);
        let changed = self.commit(byte);
        self.pending = newer;
        changed
    }

    /// Sets the committed value of a property that was never loaded.
    ///
    /// Does nothing if a value is already known.
    pub fn assume(&mut self, value: u8) {
        if self.value.is_none() {
            self.value = Some(value & self.max_value());
        }
    }

    /// Discards the pending value.
    pub fn revert(&mut self) {
        self.pending = None;
    }
}
