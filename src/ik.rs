// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the velocity-level inverse kinematics interface and a damped least-squares solver.
use crate::exception::create_configuration_exception;
use crate::AdmittanceResult;
use nalgebra::{DMatrix, DVector, Isometry3, Vector6};
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

/// Outcome of a velocity-level IK solve.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum IkStatus {
    SolutionFound,
    NoSolution,
}

/// Result of [`VelocityIkSolver::solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct IkResult {
    pub status: IkStatus,
    /// Joint velocities in \[rad/s\], only present if a solution was found.
    pub joint_velocities: Option<DVector<f64>>,
}

impl IkResult {
    /// Creates a successful result.
    pub fn solution(joint_velocities: DVector<f64>) -> Self {
        IkResult {
            status: IkStatus::SolutionFound,
            joint_velocities: Some(joint_velocities),
        }
    }
    /// Creates a result which indicates that no solution was found.
    pub fn no_solution() -> Self {
        IkResult {
            status: IkStatus::NoSolution,
            joint_velocities: None,
        }
    }
}

/// Parameters of a velocity-level IK solve.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DifferentialIkParameters {
    /// Timestep in \[s\] the desired spatial velocity is computed for.
    pub timestep: f64,
    /// Per-axis gain applied to the desired spatial velocity `[angular; linear]`.
    pub end_effector_velocity_gain: [f64; 6],
    /// Damping factor of the least-squares solve. Higher is more robust near singularities.
    pub damping: f64,
    /// Optional symmetric joint velocity limits in \[rad/s\].
    pub joint_velocity_limits: Option<Vec<f64>>,
}

impl Default for DifferentialIkParameters {
    fn default() -> Self {
        DifferentialIkParameters {
            timestep: 0.005,
            end_effector_velocity_gain: [1.; 6],
            damping: 1e-3,
            joint_velocity_limits: None,
        }
    }
}

impl DifferentialIkParameters {
    /// Parses and validates parameters from a TOML document.
    pub fn from_toml_str(document: &str) -> AdmittanceResult<Self> {
        let parameters: DifferentialIkParameters = toml::from_str(document)
            .map_err(|e| create_configuration_exception(&e.to_string()))?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks the timestep, damping and velocity limits.
    /// # Errors
    /// * ConfigurationException if one of the values is not usable.
    pub fn validate(&self) -> AdmittanceResult<()> {
        if !(self.timestep.is_finite() && self.timestep > 0.) {
            return Err(create_configuration_exception(
                "IK timestep has to be positive and finite",
            ));
        }
        if !(self.damping.is_finite() && self.damping >= 0.) {
            return Err(create_configuration_exception(
                "IK damping has to be non-negative and finite",
            ));
        }
        if self.end_effector_velocity_gain.iter().any(|x| !x.is_finite()) {
            return Err(create_configuration_exception(
                "end effector velocity gain has to be finite",
            ));
        }
        if let Some(limits) = &self.joint_velocity_limits {
            if limits.iter().any(|x| !(x.is_finite() && *x >= 0.)) {
                return Err(create_configuration_exception(
                    "joint velocity limits have to be non-negative and finite",
                ));
            }
        }
        Ok(())
    }
}

/// Turns a desired spatial velocity of a frame into joint velocities.
#[cfg_attr(test, automock)]
pub trait VelocityIkSolver {
    /// Solves for joint velocities.
    ///
    /// # Arguments
    /// * `q` - Current joint positions.
    /// * `v` - Current joint velocities.
    /// * `pose` - Current pose of the controlled frame in world frame.
    /// * `jacobian` - 6 x DOF Jacobian of the controlled frame's spatial velocity.
    /// * `desired_velocity` - Desired spatial velocity `[angular; linear]`.
    /// * `parameters` - Solver parameters.
    fn solve(
        &self,
        q: &DVector<f64>,
        v: &DVector<f64>,
        pose: &Isometry3<f64>,
        jacobian: &DMatrix<f64>,
        desired_velocity: &Vector6<f64>,
        parameters: &DifferentialIkParameters,
    ) -> IkResult;
}

/// Velocity IK through the damped pseudoinverse `J^T (J J^T + λ² I)^-1`.
///
/// If joint velocity limits are given, the solution is scaled down uniformly so that the
/// direction of motion is preserved.
#[derive(Debug, Default, Copy, Clone)]
pub struct DampedLeastSquaresSolver;

impl DampedLeastSquaresSolver {
    pub fn new() -> Self {
        DampedLeastSquaresSolver
    }
}

impl VelocityIkSolver for DampedLeastSquaresSolver {
    fn solve(
        &self,
        q: &DVector<f64>,
        _v: &DVector<f64>,
        _pose: &Isometry3<f64>,
        jacobian: &DMatrix<f64>,
        desired_velocity: &Vector6<f64>,
        parameters: &DifferentialIkParameters,
    ) -> IkResult {
        let dof = q.len();
        if jacobian.nrows() != 6 || jacobian.ncols() != dof {
            return IkResult::no_solution();
        }
        let gain = Vector6::from_column_slice(&parameters.end_effector_velocity_gain);
        let target = DVector::from_column_slice(desired_velocity.component_mul(&gain).as_slice());

        let jjt = jacobian * jacobian.transpose();
        let damped = jjt + DMatrix::identity(6, 6) * parameters.damping.powi(2);
        let damped_inverse = match damped.try_inverse() {
            Some(inverse) => inverse,
            None => return IkResult::no_solution(),
        };
        let mut joint_velocities: DVector<f64> = jacobian.transpose() * damped_inverse * target;
        if joint_velocities.iter().any(|x| !x.is_finite()) {
            return IkResult::no_solution();
        }

        if let Some(limits) = &parameters.joint_velocity_limits {
            if limits.len() != dof {
                return IkResult::no_solution();
            }
            let mut scale: f64 = 1.;
            for (velocity, limit) in joint_velocities.iter().zip(limits.iter()) {
                if velocity.abs() > *limit {
                    scale = scale.min(limit / velocity.abs());
                }
            }
            joint_velocities *= scale;
        }
        IkResult::solution(joint_velocities)
    }
}
