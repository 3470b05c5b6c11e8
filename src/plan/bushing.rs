// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the inversion of the translational and rotational spring-damper (bushing) models.
//!
//! A bushing produces a wrench from a displacement and its rate. Inverting it yields the
//! displacement at which the bushing would produce the measured wrench.
use nalgebra::Vector3;

/// Computes the translational displacement `(f - D * v) / K` per axis.
///
/// # Arguments
/// * `force` - Measured force in \[N\].
/// * `velocity` - Measured linear velocity in \[m/s\].
/// * `stiffness` - Stiffness in \[N/m\], all entries non-zero.
/// * `damping` - Damping in \[Ns/m\].
pub fn invert_translational_bushing(
    force: &Vector3<f64>,
    velocity: &Vector3<f64>,
    stiffness: &[f64; 3],
    damping: &[f64; 3],
) -> Vector3<f64> {
    Vector3::from_fn(|i, _| (force[i] - damping[i] * velocity[i]) / stiffness[i])
}

/// Computes the roll-pitch-yaw displacement of the rotational bushing.
///
/// The angles are solved one after the other, yaw first, then pitch using yaw, then roll using
/// pitch and yaw:
/// ```text
/// yaw   = (τy - Dy ẏ) / Ky
/// pitch = (τp cos(yaw) - τr sin(yaw) - Dp ṗ) / Kp
/// roll  = (cos(pitch) (τr cos(yaw) + τp sin(yaw)) - τy sin(pitch) - Dr ṙ) / Kr
/// ```
/// # Arguments
/// * `torque` - Measured torque `[roll, pitch, yaw]` in \[Nm\].
/// * `rpy_rates` - Measured roll-pitch-yaw rates in \[rad/s\].
/// * `stiffness` - Stiffness `[roll, pitch, yaw]` in \[Nm/rad\], all entries non-zero.
/// * `damping` - Damping `[roll, pitch, yaw]` in \[Nms/rad\].
/// # Return
/// `[roll, pitch, yaw]` in \[rad\].
pub fn invert_rotational_bushing(
    torque: &Vector3<f64>,
    rpy_rates: &Vector3<f64>,
    stiffness: &[f64; 3],
    damping: &[f64; 3],
) -> Vector3<f64> {
    let (tau_roll, tau_pitch, tau_yaw) = (torque[0], torque[1], torque[2]);

    let yaw = (tau_yaw - damping[2] * rpy_rates[2]) / stiffness[2];
    let (sin_yaw, cos_yaw) = yaw.sin_cos();

    let pitch =
        (tau_pitch * cos_yaw - tau_roll * sin_yaw - damping[1] * rpy_rates[1]) / stiffness[1];
    let (sin_pitch, cos_pitch) = pitch.sin_cos();

    let roll = (cos_pitch * (tau_roll * cos_yaw + tau_pitch * sin_yaw)
        - tau_yaw * sin_pitch
        - damping[0] * rpy_rates[0])
        / stiffness[0];

    Vector3::new(roll, pitch, yaw)
}
