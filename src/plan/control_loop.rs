// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains a fixed-rate driver for the tick of a plan.
use crate::exception::{create_configuration_exception, AdmittanceException};
use crate::plan::control_tools::{
    has_realtime_kernel, set_current_thread_to_highest_scheduler_priority,
};
use crate::AdmittanceResult;
use serde::{Deserialize, Serialize};
use spin_sleep::SpinSleeper;
use std::time::{Duration, Instant};
use tracing::trace;

/// Default tick period of 5 ms (200 Hz).
pub static DEFAULT_PERIOD: Duration = Duration::from_millis(5);

/// Used to decide whether to enforce realtime mode for the control loop thread.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum RealtimeConfig {
    Enforce,
    Ignore,
}

/// Calls a tick closure at a fixed period until it reports that it is finished.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlLoop {
    period: Duration,
    realtime_config: RealtimeConfig,
}

impl Default for ControlLoop {
    fn default() -> Self {
        ControlLoop {
            period: DEFAULT_PERIOD,
            realtime_config: RealtimeConfig::Ignore,
        }
    }
}

impl ControlLoop {
    /// # Errors
    /// * ConfigurationException if `period` is zero.
    pub fn new(period: Duration, realtime_config: RealtimeConfig) -> AdmittanceResult<Self> {
        if period == Duration::from_secs(0) {
            return Err(create_configuration_exception(
                "control loop period has to be greater than zero",
            ));
        }
        Ok(ControlLoop {
            period,
            realtime_config,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs the loop on the current thread.
    ///
    /// `tick` is called with the nominal time since start in \[s\] and the period. The loop stops
    /// after the call which returns `true`. Deadlines are absolute, so an overrunning tick
    /// shortens the following sleep instead of shifting all later ticks.
    /// # Return
    /// Number of ticks which were executed.
    /// # Errors
    /// * RealTimeException if realtime is enforced but cannot be set up.
    pub fn run<F>(&self, mut tick: F) -> AdmittanceResult<u64>
    where
        F: FnMut(f64, &Duration) -> bool,
    {
        if self.realtime_config == RealtimeConfig::Enforce {
            if has_realtime_kernel() {
                set_current_thread_to_highest_scheduler_priority()?;
            } else {
                return Err(AdmittanceException::RealTimeException {
                    message: "Running kernel does not have realtime capabilities.".to_string(),
                });
            }
        }
        let sleeper = SpinSleeper::default();
        let start = Instant::now();
        let mut deadline = start;
        let mut ticks: u64 = 0;
        loop {
            let time = (deadline - start).as_secs_f64();
            let finished = tick(time, &self.period);
            ticks += 1;
            if finished {
                return Ok(ticks);
            }
            deadline += self.period;
            let now = Instant::now();
            if deadline > now {
                sleeper.sleep(deadline - now);
            } else {
                trace!(tick = ticks, "tick overran its period");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::plan::control_loop::{ControlLoop, RealtimeConfig};
    use std::time::{Duration, Instant};

    #[test]
    fn runs_until_finished() {
        let control_loop =
            ControlLoop::new(Duration::from_millis(2), RealtimeConfig::Ignore).unwrap();
        let mut times = Vec::new();
        let start = Instant::now();
        let ticks = control_loop
            .run(|time, period| {
                assert_eq!(*period, Duration::from_millis(2));
                times.push(time);
                times.len() == 5
            })
            .unwrap();
        assert_eq!(ticks, 5u64);
        assert!(start.elapsed() >= Duration::from_millis(8));
        for (i, time) in times.iter().enumerate() {
            assert!((time - 0.002 * i as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn nominal_time_does_not_wrap_past_u32_ticks() {
        // 2^32 + 1 ticks of 1 ms, accumulated the same way as the loop does
        let period = Duration::from_millis(1);
        let ticks: u64 = u64::from(u32::MAX) + 1;
        let start = Instant::now();
        let deadline = start + Duration::from_millis(ticks);
        let time = (deadline - start).as_secs_f64();
        assert!((time - ticks as f64 * period.as_secs_f64()).abs() < 1e-6);
        assert!(time > 4.2e6);
    }

    #[test]
    fn rejects_zero_period() {
        assert!(ControlLoop::new(Duration::from_secs(0), RealtimeConfig::Ignore).is_err());
        assert_eq!(
            ControlLoop::default().period(),
            Duration::from_millis(5)
        );
    }
}
