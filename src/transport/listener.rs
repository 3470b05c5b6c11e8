// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the listener threads which keep the measurement cells up to date.
use crate::exception::{create_configuration_exception, AdmittanceException};
use crate::plan::measurements::Measurements;
use crate::transport::message::{decode_pose, decode_twist, decode_wrench};
use crate::transport::{LatestValue, Subscription};
use crate::AdmittanceResult;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// Poll timeout and channel names of the measurement listeners.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Time a listener waits for a payload before it checks whether it should stop.
    pub poll_timeout_ms: u64,
    pub wrench_channel: String,
    pub twist_channel: String,
    pub pose_channel: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        ListenerConfig {
            poll_timeout_ms: 10,
            wrench_channel: "FT".to_string(),
            twist_channel: "RELATIVE_VELOCITY".to_string(),
            pose_channel: "RELATIVE_POSE".to_string(),
        }
    }
}

impl ListenerConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn validate(&self) -> AdmittanceResult<()> {
        if self.poll_timeout_ms == 0 {
            return Err(create_configuration_exception(
                "poll_timeout_ms must be greater than zero",
            ));
        }
        let channels = [&self.wrench_channel, &self.twist_channel, &self.pose_channel];
        if channels.iter().any(|channel| channel.is_empty()) {
            return Err(create_configuration_exception(
                "channel names must not be empty",
            ));
        }
        Ok(())
    }

    /// Checks that each subscription listens on the channel configured for its measurement.
    /// # Errors
    /// * ConfigurationException naming the expected and the actual channel on a mismatch.
    pub fn check_subscriptions(
        &self,
        wrench: &dyn Subscription,
        twist: &dyn Subscription,
        pose: &dyn Subscription,
    ) -> AdmittanceResult<()> {
        let pairs = [
            (&self.wrench_channel, wrench, "wrench"),
            (&self.twist_channel, twist, "twist"),
            (&self.pose_channel, pose, "pose"),
        ];
        for (expected, subscription, measurement) in pairs.iter() {
            if subscription.channel() != expected.as_str() {
                return Err(create_configuration_exception(&format!(
                    "{} subscription listens on {} but {} is configured",
                    measurement,
                    subscription.channel(),
                    expected
                )));
            }
        }
        Ok(())
    }

    pub fn from_toml_str(document: &str) -> AdmittanceResult<ListenerConfig> {
        let config: ListenerConfig =
            toml::from_str(document).map_err(|e| create_configuration_exception(&e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Spawns a thread which decodes every payload of `subscription` into `target`.
///
/// The thread checks `running` after every poll and exits once it is false or the
/// subscription fails. Payloads which cannot be decoded are logged and skipped, the previous
/// value stays in `target`.
pub fn spawn_listener<S, T, D>(
    mut subscription: S,
    decoder: D,
    target: LatestValue<T>,
    running: Arc<AtomicBool>,
    poll_timeout: Duration,
) -> AdmittanceResult<JoinHandle<()>>
where
    S: Subscription + 'static,
    T: Send + Sync + 'static,
    D: Fn(&str, &[u8]) -> AdmittanceResult<T> + Send + 'static,
{
    let name = format!("listener-{}", subscription.channel());
    thread::Builder::new()
        .name(name)
        .spawn(move || {
            let channel = subscription.channel().to_string();
            debug!(channel = %channel, "listener started");
            while running.load(Ordering::Acquire) {
                match subscription.receive_timeout(poll_timeout) {
                    Ok(Some(payload)) => match decoder(&channel, &payload) {
                        Ok(value) => {
                            target.store(value);
                            trace!(channel = %channel, "measurement updated");
                        }
                        Err(e) => warn!(channel = %channel, "dropping payload: {}", e),
                    },
                    Ok(None) => {}
                    Err(e) => {
                        warn!(channel = %channel, "listener stops: {}", e);
                        break;
                    }
                }
            }
            debug!(channel = %channel, "listener stopped");
        })
        .map_err(|e| AdmittanceException::TransportException {
            message: e.to_string(),
        })
}

/// The three listener threads of a plan.
///
/// Dropping it stops and joins all threads.
pub struct MeasurementListeners {
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl MeasurementListeners {
    /// Starts one listener per measurement channel writing into `measurements`.
    pub fn start<W, V, P>(
        measurements: &Measurements,
        wrench: W,
        twist: V,
        pose: P,
        poll_timeout: Duration,
    ) -> AdmittanceResult<MeasurementListeners>
    where
        W: Subscription + 'static,
        V: Subscription + 'static,
        P: Subscription + 'static,
    {
        let mut listeners = MeasurementListeners {
            running: Arc::new(AtomicBool::new(true)),
            threads: Vec::with_capacity(3),
        };
        listeners.threads.push(spawn_listener(
            wrench,
            decode_wrench,
            measurements.wrench.clone(),
            listeners.running.clone(),
            poll_timeout,
        )?);
        listeners.threads.push(spawn_listener(
            twist,
            decode_twist,
            measurements.twist.clone(),
            listeners.running.clone(),
            poll_timeout,
        )?);
        listeners.threads.push(spawn_listener(
            pose,
            decode_pose,
            measurements.relative_pose.clone(),
            listeners.running.clone(),
            poll_timeout,
        )?);
        Ok(listeners)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops all listeners and waits for them to exit.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("measurement listener panicked");
            }
        }
    }
}

impl Drop for MeasurementListeners {
    fn drop(&mut self) {
        self.shutdown();
    }
}
