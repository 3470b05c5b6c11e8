// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the kinematic model interface consumed by the admittance plan.
use crate::AdmittanceResult;
use nalgebra::{DMatrix, DVector, Isometry3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
use mockall::automock;

/// Names a coordinate frame of the kinematic model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Frame {
    /// The world frame, all poses of the plan are expressed in it.
    World,
    /// A body frame of the model, e.g. `iiwa_link_7`.
    Body(String),
}

impl Frame {
    /// Creates a body frame from its name.
    pub fn body<S: Into<String>>(name: S) -> Self {
        Frame::Body(name.into())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Frame::World => {
                write!(f, "World")
            }
            Frame::Body(name) => {
                write!(f, "{}", name)
            }
        }
    }
}

/// Provides forward kinematics and velocity Jacobians of a robot.
///
/// The model is stateful: [`set_configuration`](`Self::set_configuration`) has to be called
/// before poses or Jacobians are queried for that configuration.
#[cfg_attr(test, automock)]
pub trait KinematicModel {
    /// Number of generalized positions (degrees of freedom) of the model.
    fn num_positions(&self) -> usize;

    /// Sets the joint configuration used by subsequent queries.
    /// # Errors
    /// * DimensionMismatch if `q` does not have [`num_positions`](`Self::num_positions`) entries.
    fn set_configuration(&mut self, q: &DVector<f64>) -> AdmittanceResult<()>;

    /// Pose of `frame_b` measured and expressed in `frame_a`.
    fn relative_transform(&self, frame_a: &Frame, frame_b: &Frame)
        -> AdmittanceResult<Isometry3<f64>>;

    /// Jacobian mapping joint velocities to the spatial velocity `[angular; linear]` of a point
    /// fixed in `frame`, measured and expressed in `reference`.
    ///
    /// # Arguments
    /// * `frame` - Frame the point is fixed to.
    /// * `point_in_frame` - Position of the point in `frame`.
    /// * `reference` - Frame in which the velocity is measured and expressed.
    /// # Return
    /// 6 x [`num_positions`](`Self::num_positions`) matrix.
    fn spatial_velocity_jacobian(
        &self,
        frame: &Frame,
        point_in_frame: &Vector3<f64>,
        reference: &Frame,
    ) -> AdmittanceResult<DMatrix<f64>>;
}
