// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Group values: the observable state of a device.
//!
//! Each control surface of a device (a relay, a keypad button LED, a
//! thermostat set point) is a group with a fixed identifier and a
//! [`GroupKind`]. The device updates groups after confirmed commands and
//! decoded reports; applications observe them through subscriptions.

mod group_value;
mod value;

pub use group_value::GroupValue;
pub use value::{GroupKind, Value};

use std::collections::BTreeMap;

/// The groups of one device, keyed by group identifier.
#[derive(Debug, Default)]
pub struct Groups {
    groups: BTreeMap<u8, GroupValue>,
}

impl Groups {
    /// Creates an empty set of groups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group, returning the group it replaced.
    pub fn insert(&mut self, group: GroupValue) -> Option<GroupValue> {
        self.groups.insert(group.group(), group)
    }

    /// Returns a group.
    #[must_use]
    pub fn get(&self, group: u8) -> Option<&GroupValue> {
        self.groups.get(&group)
    }

    /// Returns `true` if the group exists.
    #[must_use]
    pub fn contains(&self, group: u8) -> bool {
        self.groups.contains_key(&group)
    }

    /// Returns the group identifiers in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<u8> {
        self.groups.keys().copied().collect()
    }

    /// Iterates over the groups in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupValue> {
        self.groups.values()
    }

    /// Returns the number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the current value of a group.
    #[must_use]
    pub fn value(&self, group: u8) -> Option<Value> {
        self.get(group).and_then(GroupValue::value)
    }

    /// Returns `true` if the group exists and is on.
    #[must_use]
    pub fn is_on(&self, group: u8) -> bool {
        self.get(group).is_some_and(GroupValue::is_on)
    }

    /// Updates a group from a decoded device message.
    ///
    /// Missing groups and values of the wrong kind are logged and dropped.
    /// Returns `true` if the value changed.
    pub fn update(&self, group: u8, value: Value) -> bool {
        let Some(target) = self.get(group) else {
            tracing::debug!(group, value = %value, "Update for unknown group ignored");
            return false;
        };
        match target.set_value(value) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::debug!(
                    address = %target.address(),
                    group,
                    error = %e,
                    "Update rejected"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    fn groups() -> Groups {
        let address = Address::new([9, 9, 9]);
        let mut groups = Groups::new();
        groups.insert(GroupValue::new("main", address, 1, GroupKind::OnOff));
        groups.insert(GroupValue::new("b", address, 2, GroupKind::OnOff));
        groups
    }

    #[test]
    fn update_routes_by_group() {
        let groups = groups();
        assert!(groups.update(2, Value::OnOff(true)));
        assert!(groups.is_on(2));
        assert!(!groups.is_on(1));
        assert_eq!(groups.ids(), vec![1, 2]);
    }

    #[test]
    fn update_ignores_unknown_group_and_bad_kind() {
        let groups = groups();
        assert!(!groups.update(7, Value::OnOff(true)));
        assert!(!groups.update(1, Value::SetPoint(3)));
        assert_eq!(groups.value(1), None);
    }
}
