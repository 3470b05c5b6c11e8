// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the measurement transport: subscriptions, latest-value cells and listener threads.
//!
//! Every measurement channel keeps only its most recent sample. Older samples which were not
//! consumed yet are dropped, never queued.
mod channel;
mod latest_value;
mod listener;
pub mod message;
mod udp;

use crate::AdmittanceResult;
use std::time::Duration;

pub use channel::{latest_channel, ChannelSubscription, LatestPublisher};
pub use latest_value::LatestValue;
pub use listener::{spawn_listener, ListenerConfig, MeasurementListeners};
pub use message::MeasurementMessage;
pub use udp::UdpSubscription;

/// A subscription to a single measurement channel with a queue depth of one.
pub trait Subscription: Send {
    /// Name of the channel, e.g. `FT`.
    fn channel(&self) -> &str;

    /// Waits at most `timeout` for a payload.
    ///
    /// # Return
    /// * `Ok(Some(payload))` - the most recent payload which has not been received yet.
    /// * `Ok(None)` - if no payload arrived within `timeout`.
    /// # Errors
    /// * TransportException if the channel is closed or broken.
    fn receive_timeout(&mut self, timeout: Duration) -> AdmittanceResult<Option<Vec<u8>>>;
}
