// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the admittance trajectory plan.
//!
//! Frames used throughout this module:
//! * W - world frame.
//! * E - end effector frame of the kinematic model.
//! * T - tool frame, fixed in E.
//! * Tr - reference frame, the desired pose of T given by the reference trajectory.
//! * C - contact frame, measured relative to T.
//!
//! `X_AB` is the pose of frame B in frame A.
#![allow(non_snake_case)]

use crate::exception::{create_configuration_exception, AdmittanceException};
use crate::ik::{DifferentialIkParameters, IkStatus, VelocityIkSolver};
use crate::model::{Frame, KinematicModel};
use crate::plan::bushing::{invert_rotational_bushing, invert_translational_bushing};
use crate::plan::command::{Command, JointState, PlanOutcome};
use crate::plan::frames::express_in_reference;
use crate::plan::measurements::Measurements;
use crate::plan::parameters::AdmittanceParameters;
use crate::trajectory::ReferenceTrajectory;
use crate::transport::{ListenerConfig, MeasurementListeners, Subscription};
use crate::utils::pose_diff_in_common_frame;
use crate::AdmittanceResult;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3, Vector6};
use tracing::warn;

/// Intermediate results of the admittance correction of one tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Correction {
    /// Pose of the reference frame in world frame (`X_WTr`).
    pub reference_pose: Isometry3<f64>,
    /// Current pose of the tool frame in world frame (`X_WT`).
    pub tool_pose: Isometry3<f64>,
    /// Displacement `[roll, pitch, yaw]` of the rotational bushing in \[rad\].
    pub rotational_displacement: Vector3<f64>,
    /// Displacement of the translational bushing in \[m\].
    pub translational_displacement: Vector3<f64>,
    /// Tool pose which yields to the measured wrench.
    pub corrected_tool_pose: Isometry3<f64>,
    /// Spatial velocity `[angular; linear]` of the tool frame handed to the IK solver.
    pub desired_velocity: Vector6<f64>,
    /// True if a roll-pitch-yaw rate conversion clamped pitch near ±90°.
    pub gimbal_clamped: bool,
}

/// Tracks a reference trajectory while yielding to measured contact wrenches.
///
/// Each tick the measured wrench and twist are re-expressed in the reference frame, the
/// spring-damper model of the contact is inverted to get the displacement it explains, and the
/// tool is commanded towards the reference pose shifted by that displacement.
pub struct AdmittanceTrajectoryPlan<M, S, T>
where
    M: KinematicModel,
    S: VelocityIkSolver,
    T: ReferenceTrajectory,
{
    parameters: AdmittanceParameters,
    ik_parameters: DifferentialIkParameters,
    model: M,
    solver: S,
    trajectory: T,
    X_ET: Isometry3<f64>,
    measurements: Measurements,
}

impl<M, S, T> AdmittanceTrajectoryPlan<M, S, T>
where
    M: KinematicModel,
    S: VelocityIkSolver,
    T: ReferenceTrajectory,
{
    /// Creates a new plan.
    ///
    /// The measured relative pose starts at the nominal tool to contact offset, wrench and twist
    /// start at zero.
    /// # Errors
    /// * ConfigurationException if one of the parameters is invalid or the model has no joints.
    pub fn new(
        parameters: AdmittanceParameters,
        ik_parameters: DifferentialIkParameters,
        model: M,
        solver: S,
        trajectory: T,
    ) -> AdmittanceResult<Self> {
        parameters.validate()?;
        ik_parameters.validate()?;
        if model.num_positions() == 0 {
            return Err(create_configuration_exception(
                "kinematic model has no positions",
            ));
        }
        let X_ET = parameters.end_effector_to_tool_pose();
        let measurements = Measurements::new(parameters.tool_to_contact_pose());
        Ok(AdmittanceTrajectoryPlan {
            parameters,
            ik_parameters,
            model,
            solver,
            trajectory,
            X_ET,
            measurements,
        })
    }

    pub fn parameters(&self) -> &AdmittanceParameters {
        &self.parameters
    }

    pub fn ik_parameters(&self) -> &DifferentialIkParameters {
        &self.ik_parameters
    }

    pub fn num_positions(&self) -> usize {
        self.model.num_positions()
    }

    /// Shared measurement cells. Clone them to publish measurements from other threads.
    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    /// Starts listener threads which write the three measurement channels into the cells of
    /// this plan. The threads stop when the returned handle is dropped.
    pub fn start_listeners<W, V, P>(
        &self,
        wrench: W,
        twist: V,
        pose: P,
        config: &ListenerConfig,
    ) -> AdmittanceResult<MeasurementListeners>
    where
        W: Subscription + 'static,
        V: Subscription + 'static,
        P: Subscription + 'static,
    {
        config.validate()?;
        config.check_subscriptions(&wrench, &twist, &pose)?;
        MeasurementListeners::start(&self.measurements, wrench, twist, pose, config.poll_timeout())
    }

    fn check_dimensions(&self, state: &JointState) -> AdmittanceResult<()> {
        let dof = self.model.num_positions();
        for actual in [state.q.len(), state.v.len()].iter() {
            if *actual != dof {
                return Err(AdmittanceException::DimensionMismatch {
                    expected: dof,
                    actual: *actual,
                });
            }
        }
        Ok(())
    }

    /// Computes the corrected tool pose and the desired tool velocity at time `t`.
    ///
    /// # Errors
    /// * ConfigurationException if `t` is not finite.
    /// * DimensionMismatch if `state` does not match the model.
    /// * KinematicsException if the model cannot evaluate the tool pose.
    pub fn correct(&mut self, state: &JointState, t: f64) -> AdmittanceResult<Correction> {
        if !t.is_finite() {
            return Err(create_configuration_exception(
                "trajectory time has to be finite",
            ));
        }
        self.check_dimensions(state)?;
        self.model.set_configuration(&state.q)?;
        let X_WE = self
            .model
            .relative_transform(&Frame::World, &self.parameters.end_effector_frame)?;
        let X_WT = X_WE * self.X_ET;
        let X_WTr = self.trajectory.pose(t);
        let R_TrT = (X_WTr.inverse() * X_WT).rotation;

        let snapshot = self.measurements.snapshot();
        let X_TC = snapshot.relative_pose;
        let measurement =
            express_in_reference(&R_TrT, &X_TC.rotation, &snapshot.wrench, &snapshot.twist);
        if measurement.gimbal_clamped {
            warn!(t, "roll-pitch-yaw rates near gimbal lock, pitch was clamped");
        }

        let rotational_displacement = invert_rotational_bushing(
            &measurement.torque,
            &measurement.rpy_rates,
            &self.parameters.rotational_stiffness,
            &self.parameters.rotational_damping,
        );
        let translational_displacement = invert_translational_bushing(
            &measurement.force,
            &measurement.linear_velocity,
            &self.parameters.translational_stiffness,
            &self.parameters.translational_damping,
        );
        let X_TrC_desired = Isometry3::from_parts(
            Translation3::from(translational_displacement),
            UnitQuaternion::from_euler_angles(
                rotational_displacement[0],
                rotational_displacement[1],
                rotational_displacement[2],
            ),
        );
        let X_WT_corrected = X_WTr * X_TrC_desired * X_TC.inverse();
        let desired_velocity = pose_diff_in_common_frame(&X_WT, &X_WT_corrected)
            * (self.parameters.pose_update_attenuation / self.ik_parameters.timestep);

        Ok(Correction {
            reference_pose: X_WTr,
            tool_pose: X_WT,
            rotational_displacement,
            translational_displacement,
            corrected_tool_pose: X_WT_corrected,
            desired_velocity,
            gimbal_clamped: measurement.gimbal_clamped,
        })
    }

    /// Computes the joint command of one tick.
    ///
    /// On success the command is `q + control_period * v_ik` with zero torque. If no command
    /// can be computed the outcome is a failure carrying the NaN sentinel command.
    ///
    /// # Arguments
    /// * `state` - Current joint positions and velocities.
    /// * `control_period` - Time in \[s\] until the next tick.
    /// * `t` - Time in \[s\] at which the reference trajectory is evaluated.
    pub fn step(&mut self, state: &JointState, control_period: f64, t: f64) -> PlanOutcome {
        let dof = self.model.num_positions();
        if !(control_period.is_finite() && control_period > 0.) {
            let reason = create_configuration_exception("control period has to be positive");
            warn!(t, control_period, "{}", reason);
            return PlanOutcome::failure(reason, dof);
        }
        match self.command(state, control_period, t) {
            Ok(command) => PlanOutcome::Success(command),
            Err(reason) => {
                warn!(t, "no valid joint command, commanding NaN: {}", reason);
                PlanOutcome::failure(reason, dof)
            }
        }
    }

    fn command(
        &mut self,
        state: &JointState,
        control_period: f64,
        t: f64,
    ) -> AdmittanceResult<Command> {
        let correction = self.correct(state, t)?;
        let J_WT = self.model.spatial_velocity_jacobian(
            &self.parameters.end_effector_frame,
            &self.X_ET.translation.vector,
            &Frame::World,
        )?;
        let result = self.solver.solve(
            &state.q,
            &state.v,
            &correction.tool_pose,
            &J_WT,
            &correction.desired_velocity,
            &self.ik_parameters,
        );
        match (result.status, result.joint_velocities) {
            (IkStatus::SolutionFound, Some(v_ik)) => {
                if v_ik.len() != state.q.len() {
                    return Err(AdmittanceException::DimensionMismatch {
                        expected: state.q.len(),
                        actual: v_ik.len(),
                    });
                }
                Ok(Command::position(&state.q + v_ik * control_period))
            }
            _ => Err(AdmittanceException::NoIkSolution),
        }
    }
}
