// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! contains useful type definitions and conversion functions.
use nalgebra::{Isometry3, Matrix4, Rotation3, UnitQuaternion, Vector3, Vector6};

/// converts a 4x4 column-major homogenous matrix to an Isometry
pub fn array_to_isometry(array: &[f64; 16]) -> Isometry3<f64> {
    let rot = Rotation3::from_matrix(
        &Matrix4::from_column_slice(array)
            .remove_column(3)
            .remove_row(3),
    );
    Isometry3::from_parts(
        Vector3::new(array[12], array[13], array[14]).into(),
        rot.into(),
    )
}

/// converts an Isometry to a 4x4 column-major homogenous matrix
pub fn isometry_to_array(isometry: &Isometry3<f64>) -> [f64; 16] {
    let mut out = [0.; 16];
    for (i, &x) in isometry.to_homogeneous().iter().enumerate() {
        out[i] = x;
    }
    out
}

/// The identity pose as 4x4 column-major homogenous matrix.
pub const IDENTITY_POSE: [f64; 16] = [
    1., 0., 0., 0., 0., 1., 0., 0., 0., 0., 1., 0., 0., 0., 0., 1.,
];

/// Computes the difference between two poses which are expressed in the same frame.
///
/// # Return
/// A 6-vector `[angular; linear]` where the angular part is the axis-angle (scaled axis)
/// of `pose1.rotation * pose0.rotation^T` and the linear part is `pose1.p - pose0.p`.
pub fn pose_diff_in_common_frame(pose0: &Isometry3<f64>, pose1: &Isometry3<f64>) -> Vector6<f64> {
    let rotation_error: UnitQuaternion<f64> = pose1.rotation * pose0.rotation.inverse();
    let angular = rotation_error.scaled_axis();
    let linear = pose1.translation.vector - pose0.translation.vector;
    Vector6::new(
        angular.x, angular.y, angular.z, linear.x, linear.y, linear.z,
    )
}

/// Builds a unit quaternion from `[w, x, y, z]` components which are not necessarily normalized.
///
/// # Return
/// `None` if the norm of the components is zero or not finite.
pub fn normalized_quaternion(w: f64, x: f64, y: f64, z: f64) -> Option<UnitQuaternion<f64>> {
    let quaternion = nalgebra::Quaternion::new(w, x, y, z);
    let norm = quaternion.norm();
    if !norm.is_finite() || norm < f64::EPSILON {
        return None;
    }
    Some(UnitQuaternion::new_normalize(quaternion))
}
