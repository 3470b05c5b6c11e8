// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the measurement message and the decoders of wrench, twist and pose payloads.
use crate::exception::{AdmittanceException, AdmittanceResult};
use crate::plan::measurements::{Twist, Wrench};
use crate::utils::normalized_quaternion;
use nalgebra::{Isometry3, Translation3, Vector6};
use serde::{Deserialize, Serialize};

/// Number of values of a wrench payload: `[torque(3), force(3)]`.
pub const WRENCH_PAYLOAD_SIZE: usize = 6;
/// Number of values of a twist payload: `[rpy rates(3), linear velocity(3)]`.
pub const TWIST_PAYLOAD_SIZE: usize = 6;
/// Number of values of a pose payload: `[qw, qx, qy, qz, x, y, z]`.
pub const POSE_PAYLOAD_SIZE: usize = 7;

/// A timestamped list of values as it is sent on every measurement channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MeasurementMessage {
    /// Timestamp in \[µs\].
    pub utime: i64,
    pub values: Vec<f32>,
}

impl MeasurementMessage {
    pub fn new(utime: i64, values: Vec<f32>) -> Self {
        MeasurementMessage { utime, values }
    }
}

/// Encodes a message into its wire representation.
pub fn encode_message(message: &MeasurementMessage) -> AdmittanceResult<Vec<u8>> {
    bincode::serialize(message).map_err(|e| AdmittanceException::TransportException {
        message: e.to_string(),
    })
}

/// Decodes a message from its wire representation.
pub fn decode_message(channel: &str, bytes: &[u8]) -> AdmittanceResult<MeasurementMessage> {
    bincode::deserialize(bytes).map_err(|e| AdmittanceException::DecodeException {
        channel: channel.to_string(),
        message: e.to_string(),
    })
}

fn decode_values(channel: &str, bytes: &[u8], size: usize) -> AdmittanceResult<Vec<f64>> {
    let message = decode_message(channel, bytes)?;
    if message.values.len() != size {
        return Err(AdmittanceException::DecodeException {
            channel: channel.to_string(),
            message: format!(
                "payload has {} values but it should have {} values",
                message.values.len(),
                size
            ),
        });
    }
    if message.values.iter().any(|x| !x.is_finite()) {
        return Err(AdmittanceException::DecodeException {
            channel: channel.to_string(),
            message: "payload contains values which are not finite".to_string(),
        });
    }
    Ok(message.values.iter().map(|&x| f64::from(x)).collect())
}

/// Decodes a wrench payload.
pub fn decode_wrench(channel: &str, bytes: &[u8]) -> AdmittanceResult<Wrench> {
    let values = decode_values(channel, bytes, WRENCH_PAYLOAD_SIZE)?;
    Ok(Wrench::new(Vector6::from_column_slice(&values)))
}

/// Decodes a twist payload.
pub fn decode_twist(channel: &str, bytes: &[u8]) -> AdmittanceResult<Twist> {
    let values = decode_values(channel, bytes, TWIST_PAYLOAD_SIZE)?;
    Ok(Twist::new(Vector6::from_column_slice(&values)))
}

/// Decodes a pose payload. The quaternion does not need to be normalized.
pub fn decode_pose(channel: &str, bytes: &[u8]) -> AdmittanceResult<Isometry3<f64>> {
    let values = decode_values(channel, bytes, POSE_PAYLOAD_SIZE)?;
    let rotation = normalized_quaternion(values[0], values[1], values[2], values[3]).ok_or_else(
        || AdmittanceException::DecodeException {
            channel: channel.to_string(),
            message: "pose quaternion has zero norm".to_string(),
        },
    )?;
    Ok(Isometry3::from_parts(
        Translation3::new(values[4], values[5], values[6]),
        rotation,
    ))
}

#[cfg(test)]
mod tests {
    use crate::exception::AdmittanceException;
    use crate::transport::message::{
        decode_message, decode_pose, decode_twist, decode_wrench, encode_message,
        MeasurementMessage,
    };
    use nalgebra::{Vector3, Vector6};

    fn encoded(values: Vec<f32>) -> Vec<u8> {
        encode_message(&MeasurementMessage::new(42, values)).unwrap()
    }

    #[test]
    fn message_survives_the_wire() {
        let message = MeasurementMessage::new(1234, vec![1.5, -2.5]);
        let bytes = encode_message(&message).unwrap();
        assert_eq!(decode_message("FT", &bytes).unwrap(), message);
    }

    #[test]
    fn decodes_wrench_and_twist() {
        let wrench = decode_wrench("FT", &encoded(vec![1., 2., 3., 4., 5., 6.])).unwrap();
        assert_eq!(wrench.0, Vector6::new(1., 2., 3., 4., 5., 6.));
        let twist = decode_twist("RELATIVE_VELOCITY", &encoded(vec![0.5; 6])).unwrap();
        assert_eq!(twist.0, Vector6::repeat(0.5));
    }

    #[test]
    fn pose_quaternion_is_normalized() {
        let pose = decode_pose("RELATIVE_POSE", &encoded(vec![2., 0., 0., 0., 0.1, 0.2, 0.3]))
            .unwrap();
        assert!(pose.rotation.angle() < 1e-12);
        assert!((pose.rotation.quaternion().norm() - 1.).abs() < 1e-12);
        assert!(
            (pose.translation.vector - Vector3::new(0.1, 0.2, 0.3)).norm() < 1e-6
        );
    }

    #[test]
    fn rejects_wrong_payload_size() {
        match decode_wrench("FT", &encoded(vec![1.; 7])) {
            Err(AdmittanceException::DecodeException { channel, .. }) => assert_eq!(channel, "FT"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(decode_pose("RELATIVE_POSE", &encoded(vec![1.; 6])).is_err());
        assert!(decode_pose("RELATIVE_POSE", &encoded(vec![0.; 7])).is_err());
        assert!(decode_twist("RELATIVE_VELOCITY", &[1, 2, 3]).is_err());
    }
}
