// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains exception and Result definitions
use thiserror::Error;

/// Represents all kind of errors which can occur while configuring or running an admittance plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdmittanceException {
    /// ConfigurationException is returned if a plan is constructed with invalid gains or offsets
    /// or a tick is called with an invalid control period.
    #[error("invalid configuration: {message}")]
    ConfigurationException { message: String },

    /// KinematicsException is returned if the kinematic model cannot evaluate a pose or Jacobian.
    #[error("kinematics: {message}")]
    KinematicsException { message: String },

    /// DimensionMismatch is returned if a vector or matrix does not match the robot's degrees of freedom.
    #[error("dimension mismatch: expected {expected} but got {actual}")]
    DimensionMismatch {
        /// Expected number of elements.
        expected: usize,
        /// Number of elements that were supplied.
        actual: usize,
    },

    /// NoIkSolution is reported when the velocity-level IK solver did not find joint velocities.
    #[error("differential inverse kinematics failed to find a solution")]
    NoIkSolution,

    /// DecodeException is returned if a measurement payload has the wrong size or is malformed.
    #[error("{channel}: {message}")]
    DecodeException { channel: String, message: String },

    /// TransportException is returned if a subscription is closed or its socket fails.
    #[error("{message}")]
    TransportException { message: String },

    /// RealTimeException is returned if the real-time priority cannot be set
    #[error("{message}")]
    RealTimeException { message: String },
}

/// creates a ConfigurationException from a string slice
pub(crate) fn create_configuration_exception(message: &str) -> AdmittanceException {
    AdmittanceException::ConfigurationException {
        message: message.to_string(),
    }
}

/// Result type which can have AdmittanceException as Error
pub type AdmittanceResult<T> = Result<T, AdmittanceException>;

#[cfg(test)]
mod tests {
    use crate::exception::{create_configuration_exception, AdmittanceException};

    #[test]
    fn messages_are_displayed_without_quotes() {
        let closed = AdmittanceException::TransportException {
            message: "FT: channel closed".to_string(),
        };
        assert_eq!(closed.to_string(), "FT: channel closed");
        let realtime = AdmittanceException::RealTimeException {
            message: "unable to lock memory".to_string(),
        };
        assert_eq!(realtime.to_string(), "unable to lock memory");
        assert_eq!(
            create_configuration_exception("bad gain").to_string(),
            "invalid configuration: bad gain"
        );
    }
}
