// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! # admittance-rs
//! admittance-rs computes compliant joint position commands for robot arms. Once per control
//! tick it blends a Cartesian reference trajectory with the measured contact wrench, twist and
//! relative pose, so that the arm yields under load instead of rigidly tracking the reference.
//!
//! ## Design
//! The library is divided into these modules:
//! * [plan](`crate::plan`) - the admittance plan: frame algebra, spring-damper inversion,
//!   pose correction and the joint command.
//! * [model](`crate::model`) - the [`KinematicModel`] interface the plan queries for poses and
//!   Jacobians.
//! * [ik](`crate::ik`) - the [`VelocityIkSolver`] interface and a damped least-squares solver.
//! * [trajectory](`crate::trajectory`) - reference trajectories.
//! * [transport](`crate::transport`) - measurement channels which only keep their latest
//!   sample and the listener threads feeding the plan.
//!
//! # Example:
//!```no_run
//! use admittance::{
//!     AdmittanceParameters, AdmittanceResult, AdmittanceTrajectoryPlan, ConstantPose,
//!     DampedLeastSquaresSolver, DifferentialIkParameters, Frame, JointState, KinematicModel,
//! };
//! use nalgebra::{DMatrix, DVector, Isometry3, Vector3};
//!
//! struct CartesianRobot {
//!     q: DVector<f64>,
//! }
//!
//! impl KinematicModel for CartesianRobot {
//!     fn num_positions(&self) -> usize {
//!         6
//!     }
//!     fn set_configuration(&mut self, q: &DVector<f64>) -> AdmittanceResult<()> {
//!         self.q = q.clone();
//!         Ok(())
//!     }
//!     fn relative_transform(&self, _: &Frame, _: &Frame) -> AdmittanceResult<Isometry3<f64>> {
//!         Ok(Isometry3::translation(self.q[3], self.q[4], self.q[5]))
//!     }
//!     fn spatial_velocity_jacobian(
//!         &self,
//!         _: &Frame,
//!         _: &Vector3<f64>,
//!         _: &Frame,
//!     ) -> AdmittanceResult<DMatrix<f64>> {
//!         Ok(DMatrix::identity(6, 6))
//!     }
//! }
//!
//! fn main() -> AdmittanceResult<()> {
//!     let parameters = AdmittanceParameters::new(
//!         [1000.; 3],
//!         [50.; 3],
//!         [100.; 3],
//!         [5.; 3],
//!         Frame::body("tool0"),
//!     );
//!     let mut plan = AdmittanceTrajectoryPlan::new(
//!         parameters,
//!         DifferentialIkParameters::default(),
//!         CartesianRobot { q: DVector::zeros(6) },
//!         DampedLeastSquaresSolver::new(),
//!         ConstantPose::new(Isometry3::translation(0.1, 0., 0.3)),
//!     )?;
//!     let state = JointState::new(DVector::zeros(6), DVector::zeros(6));
//!     let outcome = plan.step(&state, 0.005, 0.);
//!     println!("{:?}", outcome.command().q_cmd);
//!     Ok(())
//! }
//!   ```
//!
//! [`step`](`AdmittanceTrajectoryPlan::step`) never panics and never returns an error. If no
//! command can be computed it returns [`PlanOutcome::Failure`], which still carries a command
//! whose joint positions are all NaN, so a supervisor downstream can reject it.
//!
//! Measurements are written into the shared cells returned by
//! [`measurements`](`AdmittanceTrajectoryPlan::measurements`), either directly or by listener
//! threads:
//! ```no_run
//! # use admittance::{AdmittanceResult, ListenerConfig, UdpSubscription};
//! # fn listen<M, S, T>(plan: &admittance::AdmittanceTrajectoryPlan<M, S, T>) -> AdmittanceResult<()>
//! # where M: admittance::KinematicModel, S: admittance::VelocityIkSolver, T: admittance::ReferenceTrajectory {
//! let config = ListenerConfig::default();
//! let _listeners = plan.start_listeners(
//!     UdpSubscription::bind(&config.wrench_channel, "0.0.0.0:7701".parse().unwrap())?,
//!     UdpSubscription::bind(&config.twist_channel, "0.0.0.0:7702".parse().unwrap())?,
//!     UdpSubscription::bind(&config.pose_channel, "0.0.0.0:7703".parse().unwrap())?,
//!     &config,
//! )?;
//! # Ok(())
//! # }
//! ```
//! The listeners stop and are joined when `_listeners` is dropped.
pub mod exception;
pub mod ik;
pub mod model;
pub mod plan;
pub mod trajectory;
pub mod transport;
pub mod utils;

pub use exception::{AdmittanceException, AdmittanceResult};
pub use ik::{
    DampedLeastSquaresSolver, DifferentialIkParameters, IkResult, IkStatus, VelocityIkSolver,
};
pub use model::{Frame, KinematicModel};
pub use plan::admittance_plan::{AdmittanceTrajectoryPlan, Correction};
pub use plan::command::{Command, JointState, PlanOutcome};
pub use plan::control_loop::{ControlLoop, RealtimeConfig};
pub use plan::measurements::{MeasurementSnapshot, Measurements, Twist, Wrench};
pub use plan::parameters::AdmittanceParameters;
pub use trajectory::{ConstantPose, PiecewisePose, ReferenceTrajectory};
pub use transport::{
    latest_channel, ChannelSubscription, LatestPublisher, LatestValue, ListenerConfig,
    MeasurementListeners, MeasurementMessage, Subscription, UdpSubscription,
};
pub use utils::*;
