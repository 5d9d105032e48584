// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for observable values.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Ordered registry for storing and dispatching callbacks

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a subscription.
///
/// This ID is returned when creating a subscription and can be used to
/// unsubscribe later. IDs are unique for the lifetime of the process and
/// increase monotonically, so they also record subscription order.
///
/// # Examples
///
/// ```
/// use insteon_lib::group::{GroupKind, GroupValue, Value};
/// use insteon_lib::types::Address;
///
/// let group = GroupValue::new("on_off_switch", Address::new([1, 2, 3]), 1, GroupKind::OnOff);
/// let sub_id = group.subscribe(|value| println!("now {value:?}"));
///
/// // Later, unsubscribe
/// assert!(group.unsubscribe(sub_id));
/// assert!(!group.unsubscribe(sub_id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Ordered registry of callbacks of one kind.
///
/// `C` is usually a `dyn Fn(..) + Send + Sync` type. Callbacks are kept in
/// subscription order and are invoked in that order.
///
/// # Thread Safety
///
/// The registry is fully thread-safe. Callbacks are wrapped in `Arc` so a
/// dispatcher can take a [`snapshot`](Self::snapshot) and invoke them after
/// the lock is released; a callback may therefore subscribe or unsubscribe
/// without deadlocking.
pub struct CallbackRegistry<C: ?Sized> {
    callbacks: RwLock<BTreeMap<SubscriptionId, Arc<C>>>,
}

impl<C: ?Sized> CallbackRegistry<C> {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds a callback and returns its subscription ID.
    pub fn insert(&self, callback: Arc<C>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.callbacks.write().insert(id, callback);
        id
    }

    /// Removes a callback.
    ///
    /// Returns `true` if the subscription existed. Removing an unknown or
    /// already removed subscription is a no-op.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        self.callbacks.write().remove(&id).is_some()
    }

    /// Returns the registered callbacks in subscription order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<C>> {
        self.callbacks.read().values().cloned().collect()
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Returns `true` if no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }

    /// Removes all callbacks.
    pub fn clear(&self) {
        self.callbacks.write().clear();
    }
}

impl<C: ?Sized> Default for CallbackRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> fmt::Debug for CallbackRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &self.len())
            .finish()
    }
}
