// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status request/response coordination.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::command::spawn_exchange;
use crate::protocol::{Frame, Transport};
use crate::subscription::{CallbackRegistry, SubscriptionId};
use crate::types::{Address, ResponseStatus};

use super::{StatusCategory, StatusDecoder, StatusReport, TemperatureUnit};

type ReportCallback = dyn Fn(&StatusReport) + Send + Sync;

/// Returns the unit temperatures are decoded to.
pub type UnitSource = Arc<dyn Fn() -> TemperatureUnit + Send + Sync>;

/// Coordinates the status cycle of one device.
///
/// The manager keeps an ordered map from status type discriminator to a
/// [`StatusDecoder`]. [`async_status`](Self::async_status) sends one request
/// per registered type, decodes each answer with the decoder registered for
/// its discriminator and hands the report to the subscribers of its
/// [`StatusCategory`].
///
/// # Examples
///
/// ```
/// use insteon_lib::protocol::Frame;
/// use insteon_lib::status::{StatusCategory, StatusDecoder, StatusManager, StatusReport};
/// use insteon_lib::types::Address;
///
/// let address = Address::new([1, 2, 3]);
/// let manager = StatusManager::new(address);
/// manager.add_status_type(0, StatusDecoder::Level);
///
/// manager.subscribe(StatusCategory::Status, |report| {
///     if let StatusReport::Level { status, .. } = report {
///         println!("level is {status}");
///     }
/// });
///
/// assert!(manager.dispatch(0, &Frame::standard(address, 0x01, 0xFF)));
/// // Nothing is registered for type 7.
/// assert!(!manager.dispatch(7, &Frame::standard(address, 0x01, 0xFF)));
/// ```
pub struct StatusManager {
    address: Address,
    decoders: RwLock<Vec<(u8, StatusDecoder)>>,
    status_subscribers: CallbackRegistry<ReportCallback>,
    set_point_subscribers: CallbackRegistry<ReportCallback>,
    unit_source: Option<UnitSource>,
}

impl StatusManager {
    /// Creates a manager with no status types.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            decoders: RwLock::new(Vec::new()),
            status_subscribers: CallbackRegistry::new(),
            set_point_subscribers: CallbackRegistry::new(),
            unit_source: None,
        }
    }

    /// Reads the temperature unit from `source` at each decode.
    ///
    /// Without a source temperatures are decoded to Fahrenheit.
    #[must_use]
    pub fn with_unit_source(mut self, source: UnitSource) -> Self {
        self.unit_source = Some(source);
        self
    }

    /// Returns the device address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    // ========== Status Types ==========

    /// Registers a decoder for a discriminator.
    ///
    /// A discriminator that is already registered keeps its position and
    /// gets the new decoder.
    pub fn add_status_type(&self, discriminator: u8, decoder: StatusDecoder) {
        let mut decoders = self.decoders.write();
        match decoders.iter_mut().find(|(existing, _)| *existing == discriminator) {
            Some(entry) => entry.1 = decoder,
            None => decoders.push((discriminator, decoder)),
        }
    }

    /// Removes a discriminator.
    ///
    /// Returns `false` if it was not registered; removing it again is a
    /// no-op.
    pub fn remove_status_type(&self, discriminator: u8) -> bool {
        let mut decoders = self.decoders.write();
        let before = decoders.len();
        decoders.retain(|(existing, _)| *existing != discriminator);
        decoders.len() != before
    }

    /// Returns the registered discriminators in request order.
    #[must_use]
    pub fn status_types(&self) -> Vec<u8> {
        self.decoders.read().iter().map(|(discriminator, _)| *discriminator).collect()
    }

    /// Returns the decoder registered for a discriminator.
    #[must_use]
    pub fn decoder(&self, discriminator: u8) -> Option<StatusDecoder> {
        self.decoders
            .read()
            .iter()
            .find(|(existing, _)| *existing == discriminator)
            .map(|(_, decoder)| *decoder)
    }

    fn unit(&self) -> TemperatureUnit {
        self.unit_source
            .as_ref()
            .map_or(TemperatureUnit::Fahrenheit, |source| source())
    }

    // ========== Status Cycle ==========

    /// Requests every registered status type, in registration order.
    ///
    /// Each answer is dispatched on the exchange task, so it is applied even
    /// if the caller stops waiting. Returns the combined status.
    pub async fn async_status<T: Transport>(self: &Arc<Self>, transport: &Arc<T>) -> ResponseStatus {
        let requests: Vec<(u8, Frame)> = self
            .decoders
            .read()
            .iter()
            .map(|(discriminator, decoder)| (*discriminator, decoder.request(*discriminator, self.address)))
            .collect();

        let mut statuses = Vec::with_capacity(requests.len());
        for (discriminator, frame) in requests {
            let manager = Arc::clone(self);
            let status = spawn_exchange(transport, frame, move |_, reply| {
                match (&reply.status, &reply.response) {
                    (ResponseStatus::Success, Some(response)) => {
                        manager.dispatch(discriminator, response);
                    }
                    (ResponseStatus::Success, None) => {
                        tracing::debug!(
                            address = %manager.address,
                            discriminator,
                            "Status acknowledged without a response frame"
                        );
                    }
                    _ => {}
                }
                reply.status
            })
            .await
            .unwrap_or(ResponseStatus::Failure);
            statuses.push(status);
        }

        ResponseStatus::combine(statuses)
    }

    /// Decodes a status response and notifies the subscribers of its
    /// category.
    ///
    /// An unregistered discriminator or a frame the decoder rejects changes
    /// nothing. Returns `true` if a report was dispatched.
    pub fn dispatch(&self, discriminator: u8, frame: &Frame) -> bool {
        let Some(decoder) = self.decoder(discriminator) else {
            tracing::debug!(
                address = %self.address,
                discriminator,
                "No decoder for status type"
            );
            return false;
        };
        let Some(report) = decoder.decode(discriminator, frame, self.unit()) else {
            tracing::debug!(
                address = %self.address,
                discriminator,
                %frame,
                "Status response not decoded"
            );
            return false;
        };

        tracing::debug!(
            address = %self.address,
            discriminator,
            category = ?report.category(),
            "Dispatching status report"
        );
        for callback in self.registry(report.category()).snapshot() {
            callback(&report);
        }
        true
    }

    // ========== Subscriptions ==========

    fn registry(&self, category: StatusCategory) -> &CallbackRegistry<ReportCallback> {
        match category {
            StatusCategory::Status => &self.status_subscribers,
            StatusCategory::SetPoint => &self.set_point_subscribers,
        }
    }

    /// Subscribes to the reports of one category.
    pub fn subscribe<F>(&self, category: StatusCategory, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusReport) + Send + Sync + 'static,
    {
        self.registry(category).insert(Arc::new(callback))
    }

    /// Removes a subscription from whichever category holds it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.status_subscribers.remove(id) || self.set_point_subscribers.remove(id)
    }
}

impl fmt::Debug for StatusManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusManager")
            .field("address", &self.address)
            .field("decoders", &*self.decoders.read())
            .finish_non_exhaustive()
    }
}
