// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the measured wrench, twist and relative pose of the contact frame.
use crate::transport::LatestValue;
use nalgebra::{Isometry3, Vector3, Vector6};

/// Generalized force `[torque; force]` in \[Nm\] and \[N\].
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Wrench(pub Vector6<f64>);

impl Wrench {
    pub fn new(vector: Vector6<f64>) -> Self {
        Wrench(vector)
    }
    pub fn zero() -> Self {
        Wrench(Vector6::zeros())
    }
    pub fn torque(&self) -> Vector3<f64> {
        self.0.fixed_rows::<3>(0).into_owned()
    }
    pub fn force(&self) -> Vector3<f64> {
        self.0.fixed_rows::<3>(3).into_owned()
    }
}

/// Generalized velocity `[angular; linear]`.
///
/// The angular part of a measured twist holds roll-pitch-yaw rates in \[rad/s\],
/// the linear part a velocity in \[m/s\].
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Twist(pub Vector6<f64>);

impl Twist {
    pub fn new(vector: Vector6<f64>) -> Self {
        Twist(vector)
    }
    pub fn zero() -> Self {
        Twist(Vector6::zeros())
    }
    pub fn angular(&self) -> Vector3<f64> {
        self.0.fixed_rows::<3>(0).into_owned()
    }
    pub fn linear(&self) -> Vector3<f64> {
        self.0.fixed_rows::<3>(3).into_owned()
    }
}

/// A consistent copy of the three measurements taken at the start of a tick.
///
/// Each value is complete on its own, but the three values may stem from different
/// wall-clock times as their channels are not synchronized.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeasurementSnapshot {
    /// Wrench of the contact frame C observed from the tool frame T.
    pub wrench: Wrench,
    /// Twist of the contact frame C observed from the tool frame T.
    pub twist: Twist,
    /// Pose of the contact frame C in the tool frame T.
    pub relative_pose: Isometry3<f64>,
}

/// Shared storage of the latest wrench, twist and relative pose.
///
/// Cloning is cheap and yields handles to the same cells, so listener threads can write while
/// the control thread reads.
#[derive(Debug, Clone)]
pub struct Measurements {
    pub wrench: LatestValue<Wrench>,
    pub twist: LatestValue<Twist>,
    pub relative_pose: LatestValue<Isometry3<f64>>,
}

impl Measurements {
    /// Creates new cells holding a zero wrench, a zero twist and the given relative pose.
    pub fn new(initial_relative_pose: Isometry3<f64>) -> Self {
        Measurements {
            wrench: LatestValue::new(Wrench::zero()),
            twist: LatestValue::new(Twist::zero()),
            relative_pose: LatestValue::new(initial_relative_pose),
        }
    }

    /// Reads each cell once.
    pub fn snapshot(&self) -> MeasurementSnapshot {
        MeasurementSnapshot {
            wrench: self.wrench.get(),
            twist: self.twist.get(),
            relative_pose: self.relative_pose.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::plan::measurements::{Measurements, Twist, Wrench};
    use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3, Vector6};

    #[test]
    fn halves_of_wrench_and_twist() {
        let wrench = Wrench::new(Vector6::new(1., 2., 3., 4., 5., 6.));
        assert_eq!(wrench.torque(), Vector3::new(1., 2., 3.));
        assert_eq!(wrench.force(), Vector3::new(4., 5., 6.));
        let twist = Twist::new(Vector6::new(-1., -2., -3., -4., -5., -6.));
        assert_eq!(twist.angular(), Vector3::new(-1., -2., -3.));
        assert_eq!(twist.linear(), Vector3::new(-4., -5., -6.));
    }

    #[test]
    fn snapshot_reflects_latest_values() {
        let initial = Isometry3::from_parts(
            Translation3::new(0., 0., 0.1),
            UnitQuaternion::identity(),
        );
        let measurements = Measurements::new(initial);
        let snapshot = measurements.snapshot();
        assert_eq!(snapshot.wrench, Wrench::zero());
        assert_eq!(snapshot.twist, Twist::zero());
        assert_eq!(snapshot.relative_pose, initial);

        let writer = measurements.clone();
        writer.wrench.store(Wrench::new(Vector6::repeat(2.)));
        assert_eq!(measurements.snapshot().wrench, Wrench::new(Vector6::repeat(2.)));
    }
}
