// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for value changes.
//!
//! Every observable piece of device state (group values, configuration
//! properties, command handlers, status categories) keeps its subscribers in
//! a [`CallbackRegistry`] and hands out a [`SubscriptionId`] per callback.
//!
//! # Usage
//!
//! ```
//! use insteon_lib::group::{GroupKind, GroupValue, Value};
//! use insteon_lib::types::Address;
//!
//! let group = GroupValue::new("on_off_switch", Address::new([1, 2, 3]), 1, GroupKind::OnOff);
//!
//! let sub_id = group.subscribe(|value| {
//!     println!("Group changed to {value:?}");
//! });
//!
//! group.set_value(Value::OnOff(true)).unwrap();
//!
//! // Later, unsubscribe
//! group.unsubscribe(sub_id);
//! ```

mod callback;

pub use callback::{CallbackRegistry, SubscriptionId};
