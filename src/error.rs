// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the library.
//!
//! Errors are raised synchronously, before anything reaches the transport:
//! argument validation, device descriptor problems and unsupported
//! operations. The outcome of an exchange with a device is not an error; it
//! is reported as a [`ResponseStatus`](crate::types::ResponseStatus).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied value was rejected.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error in the protocol plumbing around a device.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error related to the device itself or its descriptor.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// No property with this name is registered on the device.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// The property's memory byte has no write command.
    #[error("property {0} is read-only")]
    ReadOnly(String),

    /// The button is not part of the device's button list.
    #[error("button {0} not in button list")]
    UnknownButton(u8),

    /// The device has no group with this identifier.
    #[error("unknown group: {0}")]
    UnknownGroup(u8),

    /// Radio button groups need at least two buttons.
    #[error("at least two buttons required, got {0}")]
    TooFewButtons(usize),

    /// An invalid thermostat mode code was provided.
    #[error("invalid thermostat mode: {0:#04x}")]
    InvalidMode(u8),

    /// An invalid toggle mode was provided.
    #[error("toggle mode {0} invalid, valid modes are [0, 1, 2]")]
    InvalidToggleMode(u8),

    /// A value of the wrong kind was stored in a group.
    #[error("group {group} holds {expected} values, got {actual}")]
    KindMismatch {
        /// Group identifier.
        group: u8,
        /// Kind declared for the group.
        expected: &'static str,
        /// Kind of the rejected value.
        actual: &'static str,
    },

    /// A device address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors raised by the protocol plumbing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Internal channel was closed before a result was delivered.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// A frame does not have the expected shape.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

/// Errors related to device operations and declarations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Device does not support the requested capability.
    #[error("device does not support {capability}")]
    UnsupportedCapability {
        /// The capability that is not supported.
        capability: String,
    },

    /// Device descriptor is invalid.
    #[error("invalid device configuration: {0}")]
    InvalidConfiguration(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
