// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
#![allow(non_upper_case_globals)]

use crate::exception::AdmittanceException;
use crate::AdmittanceResult;
use nalgebra::Matrix3;
use std::path::Path;

/// Determines whether the current OS kernel is a realtime kernel.
///
/// On Linux, this checks for the existence of `/sys/kernel/realtime`.
pub fn has_realtime_kernel() -> bool {
    Path::new("/sys/kernel/realtime").exists()
}

/// Sets the current thread to the highest possible scheduler priority minus one and locks
/// the process memory.
///
/// # Errors
/// * RealTimeException if realtime priority cannot be set for the current thread.
///
/// If the method returns an Error please check your /etc/security/limits.conf file
/// There should be a line like this:
/// ```text
///marco            -       rtprio          99
/// ```
pub fn set_current_thread_to_highest_scheduler_priority() -> AdmittanceResult<()> {
    unsafe {
        let max_priority = libc::sched_get_priority_max(libc::SCHED_FIFO);
        if max_priority == -1 {
            return Err(AdmittanceException::RealTimeException {
                message: "unable to get maximum possible thread priority".to_string(),
            });
        }
        let thread_param = libc::sched_param {
            sched_priority: max_priority - 1,
        };
        if libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &thread_param) != 0 {
            return Err(AdmittanceException::RealTimeException {
                message: "unable to set realtime scheduling".to_string(),
            });
        }
        if libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) != 0 {
            return Err(AdmittanceException::RealTimeException {
                message: "unable to lock memory".to_string(),
            });
        }
    }
    Ok(())
}

/// Determines whether the given array represents a valid homogeneous transformation matrix
/// with a proper rotation (no reflection).
/// transform is represented as a 4x4 matrix in column-major format
#[allow(clippy::float_cmp)]
pub fn is_homogeneous_transformation(transform: &[f64; 16]) -> bool {
    const kOrthonormalThreshold: f64 = 1e-5;
    if transform.iter().any(|x| !x.is_finite()) {
        return false;
    }
    if transform[3] != 0.0 || transform[7] != 0.0 || transform[11] != 0.0 || transform[15] != 1.0 {
        return false;
    }
    let column_norm = |j: usize| {
        (transform[j * 4].powi(2) + transform[j * 4 + 1].powi(2) + transform[j * 4 + 2].powi(2))
            .sqrt()
    };
    let row_norm = |i: usize| {
        (transform[i].powi(2) + transform[4 + i].powi(2) + transform[8 + i].powi(2)).sqrt()
    };
    let orthonormal = (0..3).all(|k| {
        (column_norm(k) - 1.).abs() <= kOrthonormalThreshold
            && (row_norm(k) - 1.).abs() <= kOrthonormalThreshold
    });
    orthonormal && Matrix3::from_fn(|i, j| transform[j * 4 + i]).determinant() > 0.
}

#[cfg(test)]
mod tests {
    use crate::plan::control_tools::is_homogeneous_transformation;
    use crate::utils::IDENTITY_POSE;

    #[test]
    fn accepts_rigid_transforms() {
        assert!(is_homogeneous_transformation(&IDENTITY_POSE));
        let mut rotated_z = IDENTITY_POSE;
        rotated_z[0] = 0.;
        rotated_z[1] = 1.;
        rotated_z[4] = -1.;
        rotated_z[5] = 0.;
        rotated_z[12] = 0.3;
        rotated_z[14] = -0.1;
        assert!(is_homogeneous_transformation(&rotated_z));
    }

    #[test]
    fn rejects_invalid_transforms() {
        let mut scaled = IDENTITY_POSE;
        scaled[0] = 2.;
        assert!(!is_homogeneous_transformation(&scaled));
        let mut projective = IDENTITY_POSE;
        projective[3] = 0.5;
        assert!(!is_homogeneous_transformation(&projective));
        let mut not_finite = IDENTITY_POSE;
        not_finite[13] = f64::NAN;
        assert!(!is_homogeneous_transformation(&not_finite));
    }

    #[test]
    fn rejects_reflections() {
        let mut mirrored_z = IDENTITY_POSE;
        mirrored_z[10] = -1.;
        assert!(!is_homogeneous_transformation(&mirrored_z));
        let mut rotated_x = IDENTITY_POSE;
        rotated_x[5] = -1.;
        rotated_x[10] = -1.;
        assert!(is_homogeneous_transformation(&rotated_x));
    }
}
