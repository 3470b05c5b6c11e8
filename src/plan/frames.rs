// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains functions for re-expressing measured wrenches and twists in the reference frame.
//!
//! Roll-pitch-yaw angles follow the fixed-axis X-Y-Z convention `R = Rz(yaw) Ry(pitch) Rx(roll)`,
//! which is what [`UnitQuaternion::euler_angles`] returns.
use crate::plan::measurements::{Twist, Wrench};
use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use std::f64::consts::FRAC_PI_2;

/// Distance in \[rad\] to ±90° pitch below which pitch is clamped before building the
/// roll-pitch-yaw rate conversion matrices.
pub static GIMBAL_LOCK_MARGIN: f64 = 1e-3;

/// Roll, pitch and yaw angles of a rotation.
pub fn roll_pitch_yaw(rotation: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (roll, pitch, yaw) = rotation.euler_angles();
    Vector3::new(roll, pitch, yaw)
}

/// Determines whether the pitch of `rpy` is close enough to ±90° to be clamped.
pub fn is_near_gimbal_lock(rpy: &Vector3<f64>) -> bool {
    rpy[1].abs() > FRAC_PI_2 - GIMBAL_LOCK_MARGIN
}

fn clamp_pitch(pitch: f64) -> f64 {
    let limit = FRAC_PI_2 - GIMBAL_LOCK_MARGIN;
    pitch.max(-limit).min(limit)
}

/// Matrix mapping roll-pitch-yaw rates to the angular velocity expressed in the parent frame.
///
/// Pitch is clamped to `±(π/2 - GIMBAL_LOCK_MARGIN)`.
pub fn rpy_rates_to_angular_velocity(rpy: &Vector3<f64>) -> Matrix3<f64> {
    let pitch = clamp_pitch(rpy[1]);
    let yaw = rpy[2];
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();
    Matrix3::new(
        cp * cy, -sy, 0., //
        cp * sy, cy, 0., //
        -sp, 0., 1.,
    )
}

/// Matrix mapping an angular velocity expressed in the parent frame to roll-pitch-yaw rates.
///
/// This is the inverse of [`rpy_rates_to_angular_velocity`] and becomes singular at ±90° pitch,
/// therefore pitch is clamped to `±(π/2 - GIMBAL_LOCK_MARGIN)`.
pub fn angular_velocity_to_rpy_rates(rpy: &Vector3<f64>) -> Matrix3<f64> {
    let pitch = clamp_pitch(rpy[1]);
    let yaw = rpy[2];
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();
    let tp = sp / cp;
    Matrix3::new(
        cy / cp, sy / cp, 0., //
        -sy, cy, 0., //
        cy * tp, sy * tp, 1.,
    )
}

/// Wrench and twist of the contact frame expressed relative to the reference frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReferenceMeasurement {
    /// Torque in \[Nm\].
    pub torque: Vector3<f64>,
    /// Force in \[N\].
    pub force: Vector3<f64>,
    /// Roll-pitch-yaw rates in \[rad/s\].
    pub rpy_rates: Vector3<f64>,
    /// Linear velocity in \[m/s\].
    pub linear_velocity: Vector3<f64>,
    /// True if one of the rate conversions had its pitch clamped.
    pub gimbal_clamped: bool,
}

/// Re-expresses the measured wrench and twist of the contact frame C, observed from the tool
/// frame T, relative to the reference frame Tr.
///
/// Torque, force and linear velocity are rotated by `rotation_ref_tool`. No lever arm is
/// applied, the tool and reference frames are assumed to coincide in translation.
///
/// The angular part of the twist is given as roll-pitch-yaw rates of `rotation_tool_contact`.
/// It is converted to an angular velocity at that orientation, rotated, and converted back to
/// roll-pitch-yaw rates at the rotated orientation `rotation_ref_tool * rotation_tool_contact`.
///
/// # Arguments
/// * `rotation_ref_tool` - Orientation of the tool frame in the reference frame.
/// * `rotation_tool_contact` - Measured orientation of the contact frame in the tool frame.
/// * `wrench` - Measured wrench.
/// * `twist` - Measured twist.
pub fn express_in_reference(
    rotation_ref_tool: &UnitQuaternion<f64>,
    rotation_tool_contact: &UnitQuaternion<f64>,
    wrench: &Wrench,
    twist: &Twist,
) -> ReferenceMeasurement {
    let torque = rotation_ref_tool * wrench.torque();
    let force = rotation_ref_tool * wrench.force();
    let linear_velocity = rotation_ref_tool * twist.linear();

    let rpy_tool_contact = roll_pitch_yaw(rotation_tool_contact);
    let omega_tool_contact = rpy_rates_to_angular_velocity(&rpy_tool_contact) * twist.angular();
    let omega_ref_contact = rotation_ref_tool * omega_tool_contact;

    let rpy_ref_contact = roll_pitch_yaw(&(rotation_ref_tool * rotation_tool_contact));
    let rpy_rates = angular_velocity_to_rpy_rates(&rpy_ref_contact) * omega_ref_contact;

    ReferenceMeasurement {
        torque,
        force,
        rpy_rates,
        linear_velocity,
        gimbal_clamped: is_near_gimbal_lock(&rpy_tool_contact)
            || is_near_gimbal_lock(&rpy_ref_contact),
    }
}

#[cfg(test)]
mod tests {
    use crate::plan::frames::{
        angular_velocity_to_rpy_rates, express_in_reference, is_near_gimbal_lock,
        roll_pitch_yaw, rpy_rates_to_angular_velocity, GIMBAL_LOCK_MARGIN,
    };
    use crate::plan::measurements::{Twist, Wrench};
    use nalgebra::{Matrix3, UnitQuaternion, Vector3, Vector6};
    use std::f64::consts::FRAC_PI_2;

    fn vector_compare(a: &Vector3<f64>, b: &Vector3<f64>, thresh: f64) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < thresh, "{} != {}", a, b);
        }
    }

    #[test]
    fn rpy_rate_round_trip() {
        let orientations = [
            Vector3::new(0., 0., 0.),
            Vector3::new(0.3, -0.7, 1.2),
            Vector3::new(-2.5, 1.2, -3.0),
            Vector3::new(1.0, FRAC_PI_2 - 10. * GIMBAL_LOCK_MARGIN, 0.4),
        ];
        let omega = Vector3::new(0.4, -1.1, 0.25);
        for rpy in orientations.iter() {
            let rates = angular_velocity_to_rpy_rates(rpy) * omega;
            let recovered = rpy_rates_to_angular_velocity(rpy) * rates;
            vector_compare(&recovered, &omega, 1e-9);
        }
    }

    #[test]
    fn rates_of_a_pure_yaw_rotation() {
        let rpy = Vector3::new(0.2, 0.1, 0.7);
        let omega = Vector3::new(0., 0., 0.5);
        let rates = angular_velocity_to_rpy_rates(&rpy) * omega;
        vector_compare(&rates, &Vector3::new(0., 0., 0.5), 1e-12);
    }

    #[test]
    fn conversion_stays_bounded_at_gimbal_lock() {
        let mut epsilon = 1e-2;
        let bound = 2. / GIMBAL_LOCK_MARGIN.sin();
        while epsilon > 1e-12 {
            for &sign in [1., -1.].iter() {
                let rpy = Vector3::new(0.3, sign * (FRAC_PI_2 - epsilon), -0.8);
                let matrices: [Matrix3<f64>; 2] = [
                    angular_velocity_to_rpy_rates(&rpy),
                    rpy_rates_to_angular_velocity(&rpy),
                ];
                for matrix in matrices.iter() {
                    assert!(matrix.iter().all(|x| x.is_finite() && x.abs() < bound));
                }
            }
            epsilon /= 10.;
        }
        let rpy = Vector3::new(0., FRAC_PI_2, 0.);
        assert!(is_near_gimbal_lock(&rpy));
        assert!(angular_velocity_to_rpy_rates(&rpy)
            .iter()
            .all(|x| x.is_finite()));
    }

    #[test]
    fn roll_pitch_yaw_matches_fixed_axis_convention() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.4)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -0.3)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.2);
        vector_compare(&roll_pitch_yaw(&rotation), &Vector3::new(0.2, -0.3, 0.4), 1e-12);
    }

    #[test]
    fn identity_rotation_keeps_measurements() {
        let wrench = Wrench::new(Vector6::new(1., 2., 3., 4., 5., 6.));
        let twist = Twist::new(Vector6::new(0.1, 0.2, 0.3, 0.4, 0.5, 0.6));
        let measurement = express_in_reference(
            &UnitQuaternion::identity(),
            &UnitQuaternion::identity(),
            &wrench,
            &twist,
        );
        vector_compare(&measurement.torque, &Vector3::new(1., 2., 3.), 1e-15);
        vector_compare(&measurement.force, &Vector3::new(4., 5., 6.), 1e-15);
        vector_compare(&measurement.rpy_rates, &Vector3::new(0.1, 0.2, 0.3), 1e-12);
        vector_compare(&measurement.linear_velocity, &Vector3::new(0.4, 0.5, 0.6), 1e-15);
        assert!(!measurement.gimbal_clamped);
    }

    #[test]
    fn measurements_are_rotated_into_reference() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let wrench = Wrench::new(Vector6::new(1., 0., 0., 0., 2., 0.));
        let twist = Twist::new(Vector6::new(0., 0., 0.5, 1., 0., 0.));
        let measurement =
            express_in_reference(&rotation, &UnitQuaternion::identity(), &wrench, &twist);
        vector_compare(&measurement.torque, &Vector3::new(0., 1., 0.), 1e-12);
        vector_compare(&measurement.force, &Vector3::new(-2., 0., 0.), 1e-12);
        vector_compare(&measurement.linear_velocity, &Vector3::new(0., 1., 0.), 1e-12);
        // A yaw rate is invariant under a rotation about z.
        vector_compare(&measurement.rpy_rates, &Vector3::new(0., 0., 0.5), 1e-12);
    }
}
