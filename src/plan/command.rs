// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the joint state consumed and the command produced by a tick.
use crate::exception::AdmittanceException;
use nalgebra::DVector;

/// Measured joint positions and velocities of the robot.
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    /// Joint positions in \[rad\].
    pub q: DVector<f64>,
    /// Joint velocities in \[rad/s\].
    pub v: DVector<f64>,
}

impl JointState {
    pub fn new(q: DVector<f64>, v: DVector<f64>) -> Self {
        JointState { q, v }
    }

    pub fn from_slices(q: &[f64], v: &[f64]) -> Self {
        JointState {
            q: DVector::from_column_slice(q),
            v: DVector::from_column_slice(v),
        }
    }
}

/// Joint position and joint torque command for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Commanded joint positions in \[rad\].
    pub q_cmd: DVector<f64>,
    /// Commanded joint torques in \[Nm\].
    pub tau_cmd: DVector<f64>,
}

impl Command {
    /// Creates a position command with zero torque.
    pub fn position(q_cmd: DVector<f64>) -> Self {
        let dof = q_cmd.len();
        Command {
            q_cmd,
            tau_cmd: DVector::zeros(dof),
        }
    }

    /// The "no valid command" sentinel: all positions NaN and zero torque.
    pub fn invalid(dof: usize) -> Self {
        Command {
            q_cmd: DVector::from_element(dof, f64::NAN),
            tau_cmd: DVector::zeros(dof),
        }
    }

    /// Determines whether this is the [`invalid`](`Self::invalid`) sentinel.
    pub fn is_invalid(&self) -> bool {
        self.q_cmd.iter().any(|x| x.is_nan())
    }
}

/// Result of a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// A valid joint command.
    Success(Command),
    /// No valid command could be computed. `command` is the NaN sentinel.
    Failure {
        reason: AdmittanceException,
        command: Command,
    },
}

impl PlanOutcome {
    pub fn failure(reason: AdmittanceException, dof: usize) -> Self {
        PlanOutcome::Failure {
            reason,
            command: Command::invalid(dof),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PlanOutcome::Success(_))
    }

    pub fn command(&self) -> &Command {
        match self {
            PlanOutcome::Success(command) => command,
            PlanOutcome::Failure { command, .. } => command,
        }
    }

    pub fn into_command(self) -> Command {
        match self {
            PlanOutcome::Success(command) => command,
            PlanOutcome::Failure { command, .. } => command,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::exception::AdmittanceException;
    use crate::plan::command::{Command, PlanOutcome};
    use nalgebra::DVector;

    #[test]
    fn invalid_command_has_nan_positions_and_zero_torque() {
        let command = Command::invalid(7);
        assert_eq!(command.q_cmd.len(), 7);
        assert!(command.q_cmd.iter().all(|x| x.is_nan()));
        assert_eq!(command.tau_cmd, DVector::zeros(7));
        assert!(command.is_invalid());
        assert!(!Command::position(DVector::zeros(7)).is_invalid());
    }

    #[test]
    fn failure_carries_sentinel() {
        let outcome = PlanOutcome::failure(AdmittanceException::NoIkSolution, 3);
        assert!(!outcome.is_success());
        assert!(outcome.command().is_invalid());
        let success = PlanOutcome::Success(Command::position(DVector::from_element(3, 0.5)));
        assert!(success.is_success());
        assert_eq!(success.into_command().q_cmd, DVector::from_element(3, 0.5));
    }
}
