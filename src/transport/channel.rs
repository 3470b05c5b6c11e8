// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains an in-process measurement channel with a queue depth of one.
use crate::exception::AdmittanceException;
use crate::transport::message::{encode_message, MeasurementMessage};
use crate::transport::Subscription;
use crate::AdmittanceResult;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;

/// Creates a channel which keeps only the most recent undelivered payload.
pub fn latest_channel(channel: &str) -> (LatestPublisher, ChannelSubscription) {
    let (sender, receiver) = bounded(1);
    (
        LatestPublisher {
            channel: channel.to_string(),
            sender,
            stale: receiver.clone(),
        },
        ChannelSubscription {
            channel: channel.to_string(),
            receiver,
        },
    )
}

/// Sending half of [`latest_channel`]. Dropping it closes the channel.
#[derive(Debug)]
pub struct LatestPublisher {
    channel: String,
    sender: Sender<Vec<u8>>,
    stale: Receiver<Vec<u8>>,
}

impl LatestPublisher {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Publishes a payload and drops a previous one which has not been received yet.
    pub fn publish(&self, payload: Vec<u8>) -> AdmittanceResult<()> {
        let mut payload = payload;
        loop {
            match self.sender.try_send(payload) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.stale.try_recv();
                    payload = rejected;
                }
                Err(TrySendError::Disconnected(_)) => {
                    return Err(AdmittanceException::TransportException {
                        message: format!("{}: channel closed", self.channel),
                    })
                }
            }
        }
    }

    /// Encodes and publishes a measurement message.
    pub fn publish_message(&self, message: &MeasurementMessage) -> AdmittanceResult<()> {
        self.publish(encode_message(message)?)
    }
}

/// Receiving half of [`latest_channel`].
#[derive(Debug)]
pub struct ChannelSubscription {
    channel: String,
    receiver: Receiver<Vec<u8>>,
}

impl Subscription for ChannelSubscription {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn receive_timeout(&mut self, timeout: Duration) -> AdmittanceResult<Option<Vec<u8>>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(payload) => Ok(Some(payload)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(AdmittanceException::TransportException {
                message: format!("{}: channel closed", self.channel),
            }),
        }
    }
}
