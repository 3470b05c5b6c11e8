// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the reference trajectory interface and simple piecewise implementations.
use crate::exception::create_configuration_exception;
use crate::AdmittanceResult;
use nalgebra::{Isometry3, UnitQuaternion, Vector3};

/// Yields the desired pose of the reference frame in world frame at time `t` in \[s\].
pub trait ReferenceTrajectory {
    /// Desired orientation at time `t`.
    fn orientation(&self, t: f64) -> UnitQuaternion<f64>;
    /// Desired position at time `t`.
    fn position(&self, t: f64) -> Vector3<f64>;

    /// Desired pose at time `t`.
    fn pose(&self, t: f64) -> Isometry3<f64> {
        Isometry3::from_parts(self.position(t).into(), self.orientation(t))
    }
}

/// A reference which does not move.
#[derive(Debug, Copy, Clone)]
pub struct ConstantPose {
    pose: Isometry3<f64>,
}

impl ConstantPose {
    pub fn new(pose: Isometry3<f64>) -> Self {
        ConstantPose { pose }
    }
}

impl ReferenceTrajectory for ConstantPose {
    fn orientation(&self, _t: f64) -> UnitQuaternion<f64> {
        self.pose.rotation
    }
    fn position(&self, _t: f64) -> Vector3<f64> {
        self.pose.translation.vector
    }
}

/// Piecewise trajectory through pose knots.
///
/// Orientation is interpolated with spherical linear interpolation, position linearly.
/// Before the first and after the last knot the trajectory holds the boundary pose.
#[derive(Debug, Clone)]
pub struct PiecewisePose {
    times: Vec<f64>,
    poses: Vec<Isometry3<f64>>,
}

impl PiecewisePose {
    /// Creates a new PiecewisePose instance.
    /// # Arguments
    /// * `times` - Strictly increasing knot times in \[s\].
    /// * `poses` - Pose at each knot.
    /// # Errors
    /// * ConfigurationException if there are no knots, the number of times and poses differ
    /// or the times are not strictly increasing.
    pub fn new(times: Vec<f64>, poses: Vec<Isometry3<f64>>) -> AdmittanceResult<Self> {
        if times.is_empty() || times.len() != poses.len() {
            return Err(create_configuration_exception(
                "a piecewise trajectory needs one pose per knot and at least one knot",
            ));
        }
        if times.iter().any(|t| !t.is_finite()) || times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(create_configuration_exception(
                "knot times have to be finite and strictly increasing",
            ));
        }
        Ok(PiecewisePose { times, poses })
    }

    /// Start and end time of the trajectory.
    pub fn time_span(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// Index of the segment containing `t` and the interpolation factor in \[0, 1\].
    fn segment(&self, t: f64) -> (usize, f64) {
        let last = self.times.len() - 1;
        if last == 0 || t.is_nan() || t <= self.times[0] {
            return (0, 0.);
        }
        if t >= self.times[last] {
            return (last - 1, 1.);
        }
        let index = match self
            .times
            .binary_search_by(|knot| knot.partial_cmp(&t).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(i) => usize::min(i, last - 1),
            Err(i) => i - 1,
        };
        let s = (t - self.times[index]) / (self.times[index + 1] - self.times[index]);
        (index, s)
    }
}

impl ReferenceTrajectory for PiecewisePose {
    fn orientation(&self, t: f64) -> UnitQuaternion<f64> {
        if self.poses.len() == 1 {
            return self.poses[0].rotation;
        }
        let (index, s) = self.segment(t);
        self.poses[index]
            .rotation
            .slerp(&self.poses[index + 1].rotation, s)
    }
    fn position(&self, t: f64) -> Vector3<f64> {
        if self.poses.len() == 1 {
            return self.poses[0].translation.vector;
        }
        let (index, s) = self.segment(t);
        self.poses[index]
            .translation
            .vector
            .lerp(&self.poses[index + 1].translation.vector, s)
    }
}

#[cfg(test)]
mod tests {
    use crate::trajectory::{ConstantPose, PiecewisePose, ReferenceTrajectory};
    use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
    use std::f64::consts::FRAC_PI_2;

    fn knots() -> PiecewisePose {
        PiecewisePose::new(
            vec![0., 1., 3.],
            vec![
                Isometry3::identity(),
                Isometry3::from_parts(
                    Translation3::new(1., 0., 0.),
                    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
                ),
                Isometry3::from_parts(
                    Translation3::new(1., 2., 0.),
                    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn constant_pose_does_not_move() {
        let pose = Isometry3::from_parts(
            Translation3::new(0.5, 0., 0.4),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let trajectory = ConstantPose::new(pose);
        for &t in [0., 1., 100.].iter() {
            assert!((trajectory.position(t) - pose.translation.vector).norm() < 1e-15);
            assert!(trajectory.orientation(t).angle_to(&pose.rotation) < 1e-12);
        }
    }

    #[test]
    fn interpolates_between_knots() {
        let trajectory = knots();
        let position = trajectory.position(0.5);
        assert!((position - Vector3::new(0.5, 0., 0.)).norm() < 1e-12);
        let orientation = trajectory.orientation(0.5);
        assert!((orientation.angle() - FRAC_PI_2 / 2.).abs() < 1e-12);
        let position = trajectory.position(2.);
        assert!((position - Vector3::new(1., 1., 0.)).norm() < 1e-12);
        let position = trajectory.position(1.);
        assert!((position - Vector3::new(1., 0., 0.)).norm() < 1e-12);
    }

    #[test]
    fn holds_boundary_poses() {
        let trajectory = knots();
        assert!(trajectory.position(-1.).norm() < 1e-15);
        assert!((trajectory.position(10.) - Vector3::new(1., 2., 0.)).norm() < 1e-12);
        assert!((trajectory.orientation(10.).angle() - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(trajectory.time_span(), (0., 3.));
    }

    #[test]
    fn nan_time_holds_first_pose() {
        let trajectory = knots();
        assert!(trajectory.position(f64::NAN).norm() < 1e-15);
        assert!(trajectory.orientation(f64::NAN).angle() < 1e-12);
    }

    #[test]
    fn rejects_invalid_knots() {
        assert!(PiecewisePose::new(vec![], vec![]).is_err());
        assert!(PiecewisePose::new(vec![0., 0.], vec![Isometry3::identity(); 2]).is_err());
        assert!(PiecewisePose::new(vec![0.], vec![Isometry3::identity(); 2]).is_err());
    }
}
