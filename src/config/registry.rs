// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device registry of configuration properties.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DeviceError, ValueError};
use crate::protocol::UserData;
use crate::subscription::{CallbackRegistry, SubscriptionId};
use crate::types::{Address, ResponseStatus};

use super::{BitFieldProperty, ByteLocation, PropertyDef};

/// One byte write produced by a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWrite {
    /// Location of the byte.
    pub location: ByteLocation,
    /// Extended set command that writes the byte.
    pub command: u8,
    /// Full byte value to write.
    pub value: u8,
}

/// Result of one byte write, as reported back to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Exchange status.
    pub status: ResponseStatus,
    /// Byte the device reported after the write, when it reports one.
    /// The written byte is committed otherwise.
    pub confirmed: Option<u8>,
}

struct ConfigSubscriber {
    name: Option<String>,
    callback: Box<dyn Fn(&str, u8) + Send + Sync>,
}

#[derive(Debug, Default)]
struct ByteSlot {
    write_command: Option<u8>,
    raw: Option<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    properties: Vec<BitFieldProperty>,
    index: HashMap<String, usize>,
    bytes: BTreeMap<ByteLocation, ByteSlot>,
}

impl Inner {
    fn position(&self, name: &str) -> Result<usize, ValueError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ValueError::UnknownProperty(name.to_string()))
    }

    fn get(&self, name: &str) -> Result<&BitFieldProperty, ValueError> {
        let position = self.position(name)?;
        Ok(&self.properties[position])
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut BitFieldProperty, ValueError> {
        let position = self.position(name)?;
        Ok(&mut self.properties[position])
    }

    /// Applies a byte to its slot and every property in it.
    ///
    /// `staged` lists the properties whose pending value was written, with
    /// that value.
    fn apply_byte(
        &mut self,
        location: ByteLocation,
        byte: u8,
        staged: &[(usize, Option<u8>)],
    ) -> Vec<(String, u8)> {
        self.bytes.entry(location).or_default().raw = Some(byte);

        let mut changes = Vec::new();
        for (position, prop) in self.properties.iter_mut().enumerate() {
            if prop.location() != location {
                continue;
            }
            let changed = match staged.iter().find(|(staged_at, _)| *staged_at == position) {
                Some((_, written)) => prop.commit_written(byte, *written),
                None => prop.read(byte),
            };
            if changed && let Some(value) = prop.value() {
                changes.push((prop.name().to_string(), value));
            }
        }
        changes
    }
}

struct PlannedWrite {
    write: ByteWrite,
    staged: Vec<(usize, Option<u8>)>,
}

/// All configuration properties of one device.
///
/// Properties are grouped by the memory byte they live in. Reads load every
/// property of a byte at once, and a flush writes each byte exactly once
/// with all of its pending fields merged, so sibling bits are never lost.
///
/// # Examples
///
/// ```
/// use insteon_lib::config::{PropertyDef, PropertyRegistry};
/// use insteon_lib::types::Address;
///
/// let registry = PropertyRegistry::new(Address::new([1, 2, 3]));
/// registry
///     .register(&PropertyDef::new("key_beep_on", 0, 13).with_write_command(0x04).with_bit(1))
///     .unwrap();
/// registry
///     .register(&PropertyDef::new("celsius", 0, 13).with_write_command(0x04).with_bit(3))
///     .unwrap();
///
/// registry.load_byte(insteon_lib::config::ByteLocation::new(0, 13), 0b0000_1000);
/// assert_eq!(registry.value("celsius"), Some(1));
/// assert_eq!(registry.value("key_beep_on"), Some(0));
/// ```
pub struct PropertyRegistry {
    address: Address,
    inner: Mutex<Inner>,
    subscribers: CallbackRegistry<ConfigSubscriber>,
}

impl PropertyRegistry {
    /// Creates an empty registry for a device.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            inner: Mutex::new(Inner::default()),
            subscribers: CallbackRegistry::new(),
        }
    }

    /// Creates a registry holding the declared properties.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`register`](Self::register).
    pub fn from_defs<'a>(
        address: Address,
        defs: impl IntoIterator<Item = &'a PropertyDef>,
    ) -> Result<Self, DeviceError> {
        let registry = Self::new(address);
        for def in defs {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Registers a property.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::InvalidConfiguration` if:
    /// - the name is already registered
    /// - the data field is outside `1..=14`
    /// - the bit span does not fit in a byte
    /// - another property declares a different write command for the byte
    pub fn register(&self, def: &PropertyDef) -> Result<(), DeviceError> {
        if !(1..=14).contains(&def.data_field) {
            return Err(DeviceError::InvalidConfiguration(format!(
                "property {} uses data field {}",
                def.name, def.data_field
            )));
        }
        if let Some(bits) = def.bits {
            bits.validate().map_err(|e| {
                DeviceError::InvalidConfiguration(format!("property {}: {e}", def.name))
            })?;
        }

        let mut inner = self.inner.lock();
        if inner.index.contains_key(&def.name) {
            return Err(DeviceError::InvalidConfiguration(format!(
                "duplicate property {}",
                def.name
            )));
        }

        let location = def.location();
        let existing = inner.bytes.get(&location).map(|slot| slot.write_command);
        match existing {
            Some(command) if command != def.write_command => {
                return Err(DeviceError::InvalidConfiguration(format!(
                    "property {} disagrees on the write command of group {} data{}",
                    def.name, location.group, location.data_field
                )));
            }
            Some(_) => {}
            None => {
                inner.bytes.insert(
                    location,
                    ByteSlot {
                        write_command: def.write_command,
                        raw: None,
                    },
                );
            }
        }

        let position = inner.properties.len();
        inner.properties.push(BitFieldProperty::new(self.address, def));
        inner.index.insert(def.name.clone(), position);
        Ok(())
    }

    // ========== Queries ==========

    /// Returns the address of the owning device.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the number of registered properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().properties.len()
    }

    /// Returns `true` if no property is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().properties.is_empty()
    }

    /// Returns `true` if a property with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().index.contains_key(name)
    }

    /// Returns the property names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner
            .lock()
            .properties
            .iter()
            .map(|prop| prop.name().to_string())
            .collect()
    }

    /// Returns a copy of a property's current state.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<BitFieldProperty> {
        self.inner.lock().get(name).ok().cloned()
    }

    /// Returns the committed value of a property.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<u8> {
        self.inner.lock().get(name).ok().and_then(BitFieldProperty::value)
    }

    /// Returns the pending value of a property.
    #[must_use]
    pub fn pending(&self, name: &str) -> Option<u8> {
        self.inner.lock().get(name).ok().and_then(BitFieldProperty::pending)
    }

    /// Returns `true` if the property has a committed value.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.inner
            .lock()
            .get(name)
            .is_ok_and(BitFieldProperty::is_loaded)
    }

    /// Returns `true` if the property has an unwritten edit.
    #[must_use]
    pub fn is_dirty(&self, name: &str) -> bool {
        self.inner
            .lock()
            .get(name)
            .is_ok_and(BitFieldProperty::is_dirty)
    }

    /// Returns `true` if any property has an unwritten edit.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.inner
            .lock()
            .properties
            .iter()
            .any(BitFieldProperty::is_dirty)
    }

    /// Returns the distinct property block groups, in ascending order.
    #[must_use]
    pub fn groups(&self) -> Vec<u8> {
        let inner = self.inner.lock();
        let groups: BTreeSet<u8> = inner.bytes.keys().map(|location| location.group).collect();
        groups.into_iter().collect()
    }

    /// Returns the groups holding a dirty property whose byte was never read.
    #[must_use]
    pub fn unloaded_dirty_groups(&self) -> Vec<u8> {
        let inner = self.inner.lock();
        let groups: BTreeSet<u8> = inner
            .properties
            .iter()
            .filter(|prop| prop.is_dirty())
            .map(BitFieldProperty::location)
            .filter(|location| {
                inner
                    .bytes
                    .get(location)
                    .is_none_or(|slot| slot.raw.is_none())
            })
            .map(|location| location.group)
            .collect();
        groups.into_iter().collect()
    }

    // ========== Local Edits ==========

    /// Stages a value for a property.
    ///
    /// # Errors
    ///
    /// - `ValueError::UnknownProperty` if no such property is registered
    /// - `ValueError::ReadOnly` if the property cannot be written
    /// - `ValueError::OutOfRange` if the value does not fit its bits
    pub fn set_pending(&self, name: &str, value: u8) -> Result<(), ValueError> {
        self.inner.lock().get_mut(name)?.set_pending(value)
    }

    /// Discards the pending value of a property.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownProperty` if no such property is registered.
    pub fn revert(&self, name: &str) -> Result<(), ValueError> {
        self.inner.lock().get_mut(name)?.revert();
        Ok(())
    }

    /// Discards every pending value.
    pub fn revert_all(&self) {
        for prop in &mut self.inner.lock().properties {
            prop.revert();
        }
    }

    /// Runs several edits under one lock.
    pub fn edit<R>(&self, edit: impl FnOnce(&mut PropertyEditor<'_>) -> R) -> R {
        let mut inner = self.inner.lock();
        let mut editor = PropertyEditor { inner: &mut *inner };
        edit(&mut editor)
    }

    // ========== Device Reads ==========

    /// Loads every registered byte of a property block.
    ///
    /// Returns the number of properties whose committed value changed.
    pub fn load_group(&self, group: u8, data: &UserData) -> usize {
        let changes = {
            let mut inner = self.inner.lock();
            let locations: Vec<ByteLocation> = inner
                .bytes
                .keys()
                .filter(|location| location.group == group)
                .copied()
                .collect();
            let mut changes = Vec::new();
            for location in locations {
                if let Some(byte) = data.get(location.data_field) {
                    changes.extend(inner.apply_byte(location, byte, &[]));
                }
            }
            changes
        };
        tracing::debug!(
            address = %self.address,
            group,
            changed = changes.len(),
            "Loaded property block"
        );
        self.notify(&changes);
        changes.len()
    }

    /// Loads one byte.
    ///
    /// Returns `true` if any property's committed value changed.
    pub fn load_byte(&self, location: ByteLocation, byte: u8) -> bool {
        let changes = self.inner.lock().apply_byte(location, byte, &[]);
        self.notify(&changes);
        !changes.is_empty()
    }

    // ========== Device Writes ==========

    fn plan_writes(&self) -> Vec<PlannedWrite> {
        let inner = self.inner.lock();
        inner
            .bytes
            .iter()
            .filter_map(|(location, slot)| {
                let command = slot.write_command?;
                let members: Vec<(usize, &BitFieldProperty)> = inner
                    .properties
                    .iter()
                    .enumerate()
                    .filter(|(_, prop)| prop.location() == *location)
                    .collect();
                if !members.iter().any(|(_, prop)| prop.is_dirty()) {
                    return None;
                }

                let mut value = slot.raw.unwrap_or(0);
                for (_, prop) in &members {
                    if let Some(committed) = prop.value() {
                        value = prop.encode(value, committed);
                    }
                }
                let mut staged = Vec::new();
                for (position, prop) in &members {
                    if let (true, Some(pending)) = (prop.is_dirty(), prop.pending()) {
                        value = prop.encode(value, pending);
                        staged.push((*position, Some(pending)));
                    }
                }

                Some(PlannedWrite {
                    write: ByteWrite {
                        location: *location,
                        command,
                        value,
                    },
                    staged,
                })
            })
            .collect()
    }

    /// Writes every byte holding a dirty property.
    ///
    /// Each byte is computed from its last known value with the pending
    /// fields overlaid, and written with one call to `write`. Bytes that were
    /// never read start from zero. On success every property of the byte is
    /// committed to the confirmed value; on failure the byte's properties
    /// stay dirty. Nothing is retried.
    ///
    /// Returns the combined status of all writes.
    pub async fn flush<W, Fut>(&self, mut write: W) -> ResponseStatus
    where
        W: FnMut(ByteWrite) -> Fut,
        Fut: Future<Output = WriteOutcome>,
    {
        let plan = self.plan_writes();
        let mut statuses = Vec::with_capacity(plan.len());

        for PlannedWrite { write: request, staged } in plan {
            tracing::debug!(
                address = %self.address,
                group = request.location.group,
                data_field = request.location.data_field,
                value = request.value,
                "Writing configuration byte"
            );
            let outcome = write(request).await;
            if outcome.status.is_success() {
                let byte = outcome.confirmed.unwrap_or(request.value);
                let changes = self
                    .inner
                    .lock()
                    .apply_byte(request.location, byte, &staged);
                self.notify(&changes);
            } else {
                tracing::warn!(
                    address = %self.address,
                    group = request.location.group,
                    data_field = request.location.data_field,
                    status = %outcome.status,
                    "Configuration write failed, properties left dirty"
                );
            }
            statuses.push(outcome.status);
        }

        ResponseStatus::combine(statuses)
    }

    // ========== Subscriptions ==========

    /// Subscribes to committed value changes of one property.
    ///
    /// The callback receives the property name and its new value.
    pub fn subscribe<F>(&self, name: &str, callback: F) -> SubscriptionId
    where
        F: Fn(&str, u8) + Send + Sync + 'static,
    {
        self.subscribers.insert(Arc::new(ConfigSubscriber {
            name: Some(name.to_string()),
            callback: Box::new(callback),
        }))
    }

    /// Subscribes to committed value changes of every property.
    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&str, u8) + Send + Sync + 'static,
    {
        self.subscribers.insert(Arc::new(ConfigSubscriber {
            name: None,
            callback: Box::new(callback),
        }))
    }

    /// Removes a subscription. Returns `false` if it did not exist.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn notify(&self, changes: &[(String, u8)]) {
        if changes.is_empty() || self.subscribers.is_empty() {
            return;
        }
        let subscribers = self.subscribers.snapshot();
        for (name, value) in changes {
            for subscriber in &subscribers {
                if subscriber.name.as_deref().is_none_or(|wanted| wanted == name) {
                    (subscriber.callback)(name, *value);
                }
            }
        }
    }
}

impl fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("address", &self.address)
            .field("properties", &self.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Access to several properties under one lock.
///
/// Obtained from [`PropertyRegistry::edit`].
pub struct PropertyEditor<'a> {
    inner: &'a mut Inner,
}

impl PropertyEditor<'_> {
    /// Returns the committed value of a property.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownProperty` if no such property is registered.
    pub fn value(&self, name: &str) -> Result<Option<u8>, ValueError> {
        Ok(self.inner.get(name)?.value())
    }

    /// Returns the pending value of a property.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownProperty` if no such property is registered.
    pub fn pending(&self, name: &str) -> Result<Option<u8>, ValueError> {
        Ok(self.inner.get(name)?.pending())
    }

    /// Returns `true` if the property has a committed value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownProperty` if no such property is registered.
    pub fn is_loaded(&self, name: &str) -> Result<bool, ValueError> {
        Ok(self.inner.get(name)?.is_loaded())
    }

    /// Returns `true` if the property has an unwritten edit.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownProperty` if no such property is registered.
    pub fn is_dirty(&self, name: &str) -> Result<bool, ValueError> {
        Ok(self.inner.get(name)?.is_dirty())
    }

    /// Sets the committed value of a property that was never loaded.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownProperty` if no such property is registered.
    pub fn assume(&mut self, name: &str, value: u8) -> Result<(), ValueError> {
        self.inner.get_mut(name)?.assume(value);
        Ok(())
    }

    /// Stages a value for a property.
    ///
    /// # Errors
    ///
    /// See [`PropertyRegistry::set_pending`].
    pub fn stage(&mut self, name: &str, value: u8) -> Result<(), ValueError> {
        self.inner.get_mut(name)?.set_pending(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BitSpan, names};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn address() -> Address {
        Address::new([0x11, 0x22, 0x33])
    }

    fn flags_registry() -> PropertyRegistry {
        let defs = [
            PropertyDef::new(names::PROGRAM_LOCK_ON, 0, 13)
                .with_write_command(0x04)
                .with_bit(0),
            PropertyDef::new(names::KEY_BEEP_ON, 0, 13)
                .with_write_command(0x04)
                .with_bit(1),
            PropertyDef::new(names::CELSIUS, 0, 13)
                .with_write_command(0x04)
                .with_bit(3),
            PropertyDef::new(names::BACKLIGHT, 0, 10).with_write_command(0x05),
            PropertyDef::new(names::X10_HOUSE, 0, 5),
        ];
        PropertyRegistry::from_defs(address(), &defs).unwrap()
    }

    fn ok(confirmed: Option<u8>) -> WriteOutcome {
        WriteOutcome {
            status: ResponseStatus::Success,
            confirmed,
        }
    }

    #[test]
    fn duplicate_name_rejected() {
        let registry = flags_registry();
        let err = registry
            .register(&PropertyDef::new(names::BACKLIGHT, 1, 3).with_write_command(0x02))
            .unwrap_err();
        assert!(matches!(err, DeviceError::InvalidConfiguration(_)));
    }

    #[test]
    fn conflicting_write_command_rejected() {
        let registry = flags_registry();
        let err = registry
            .register(
                &PropertyDef::new("led_on", 0, 13)
                    .with_write_command(0x05)
                    .with_bit(6),
            )
            .unwrap_err();
        assert!(matches!(err, DeviceError::InvalidConfiguration(_)));
    }

    #[test]
    fn invalid_layout_rejected() {
        let registry = PropertyRegistry::new(address());
        assert!(registry.register(&PropertyDef::new("a", 0, 0)).is_err());
        assert!(registry.register(&PropertyDef::new("b", 0, 15)).is_err());
        let wide = PropertyDef::new("c", 0, 3).with_bits(BitSpan {
            offset: 6,
            width: 4,
        });
        assert!(registry.register(&wide).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn load_group_decodes_every_field() {
        let registry = flags_registry();
        let mut data = UserData::new();
        data.set(5, 0x0C);
        data.set(10, 0x30);
        data.set(13, 0b0000_1010);

        assert_eq!(registry.load_group(0, &data), 5);
        assert_eq!(registry.value(names::PROGRAM_LOCK_ON), Some(0));
        assert_eq!(registry.value(names::KEY_BEEP_ON), Some(1));
        assert_eq!(registry.value(names::CELSIUS), Some(1));
        assert_eq!(registry.value(names::BACKLIGHT), Some(0x30));
        assert_eq!(registry.value(names::X10_HOUSE), Some(0x0C));

        // Same data again changes nothing.
        assert_eq!(registry.load_group(0, &data), 0);
        // Other groups are ignored.
        assert_eq!(registry.load_group(1, &data), 0);
    }

    #[test]
    fn unknown_and_read_only_properties() {
        let registry = flags_registry();
        assert_eq!(
            registry.set_pending("nope", 1),
            Err(ValueError::UnknownProperty("nope".to_string()))
        );
        assert_eq!(
            registry.set_pending(names::X10_HOUSE, 1),
            Err(ValueError::ReadOnly(names::X10_HOUSE.to_string()))
        );
    }

    #[tokio::test]
    async fn fields_sharing_a_byte_flush_in_one_write() {
        let registry = flags_registry();
        registry.load_byte(ByteLocation::new(0, 13), 0b1000_0000);

        registry.set_pending(names::KEY_BEEP_ON, 1).unwrap();
        registry.set_pending(names::CELSIUS, 1).unwrap();

        let mut writes = Vec::new();
        let status = registry
            .flush(|write| {
                writes.push(write);
                async { ok(None) }
            })
            .await;

        assert_eq!(status, ResponseStatus::Success);
        assert_eq!(
            writes,
            vec![ByteWrite {
                location: ByteLocation::new(0, 13),
                command: 0x04,
                value: 0b1000_1010,
            }]
        );
        assert!(!registry.has_pending_changes());
        assert_eq!(registry.value(names::KEY_BEEP_ON), Some(1));
        assert_eq!(registry.value(names::CELSIUS), Some(1));
        assert_eq!(registry.value(names::PROGRAM_LOCK_ON), Some(0));
    }

    #[tokio::test]
    async fn unloaded_byte_assumes_zero() {
        let registry = flags_registry();
        registry.set_pending(names::CELSIUS, 1).unwrap();
        assert_eq!(registry.unloaded_dirty_groups(), vec![0]);

        let mut written = None;
        registry
            .flush(|write| {
                written = Some(write.value);
                async { ok(None) }
            })
            .await;

        assert_eq!(written, Some(0b0000_1000));
        assert!(registry.unloaded_dirty_groups().is_empty());
        assert_eq!(registry.value(names::PROGRAM_LOCK_ON), Some(0));
    }

    #[tokio::test]
    async fn failed_write_leaves_fields_dirty() {
        let registry = flags_registry();
        registry.load_byte(ByteLocation::new(0, 10), 0x10);
        registry.set_pending(names::BACKLIGHT, 0x20).unwrap();

        let status = registry
            .flush(|_| async {
                WriteOutcome {
                    status: ResponseStatus::Timeout,
                    confirmed: None,
                }
            })
            .await;

        assert_eq!(status, ResponseStatus::Timeout);
        assert!(registry.is_dirty(names::BACKLIGHT));
        assert_eq!(registry.value(names::BACKLIGHT), Some(0x10));
    }

    #[tokio::test]
    async fn confirmed_byte_wins_over_requested() {
        let registry = flags_registry();
        registry.load_byte(ByteLocation::new(0, 10), 0x10);
        registry.set_pending(names::BACKLIGHT, 0xFF).unwrap();

        registry.flush(|_| async { ok(Some(0x7F)) }).await;

        assert_eq!(registry.value(names::BACKLIGHT), Some(0x7F));
        assert!(!registry.is_dirty(names::BACKLIGHT));
    }

    #[tokio::test]
    async fn clean_registry_writes_nothing() {
        let registry = flags_registry();
        let mut calls = 0;
        let status = registry
            .flush(|_| {
                calls += 1;
                async { ok(None) }
            })
            .await;
        assert_eq!(status, ResponseStatus::Success);
        assert_eq!(calls, 0);
    }

    #[test]
    fn subscribers_see_committed_changes() {
        let registry = flags_registry();
        let celsius_calls = Arc::new(AtomicUsize::new(0));
        let all_calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&celsius_calls);
        let id = registry.subscribe(names::CELSIUS, move |name, value| {
            assert_eq!(name, names::CELSIUS);
            assert_eq!(value, 1);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&all_calls);
        registry.subscribe_all(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.load_byte(ByteLocation::new(0, 13), 0b0000_1000);
        assert_eq!(celsius_calls.load(Ordering::SeqCst), 1);
        assert_eq!(all_calls.load(Ordering::SeqCst), 3);

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.load_byte(ByteLocation::new(0, 13), 0);
        assert_eq!(celsius_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn editor_assumes_and_stages() {
        let registry = flags_registry();
        registry
            .edit(|editor| {
                editor.assume(names::BACKLIGHT, 0)?;
                editor.stage(names::BACKLIGHT, 9)?;
                editor.is_dirty(names::BACKLIGHT)
            })
            .map(|dirty| assert!(dirty))
            .unwrap();
        assert_eq!(registry.value(names::BACKLIGHT), Some(0));
        assert_eq!(registry.pending(names::BACKLIGHT), Some(9));

        registry.revert(names::BACKLIGHT).unwrap();
        assert!(!registry.has_pending_changes());
    }

    #[test]
    fn groups_are_distinct_and_sorted() {
        let registry = flags_registry();
        registry
            .register(&PropertyDef::new(names::ON_MASK, 1, 3).with_write_command(0x02))
            .unwrap();
        assert_eq!(registry.groups(), vec![0, 1]);
        assert_eq!(registry.names().len(), 6);
    }
}
