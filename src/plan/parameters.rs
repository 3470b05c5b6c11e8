// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the gains and fixed offsets of an admittance plan.
use crate::exception::create_configuration_exception;
use crate::model::Frame;
use crate::plan::control_tools::is_homogeneous_transformation;
use crate::utils::{array_to_isometry, IDENTITY_POSE};
use crate::AdmittanceResult;
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};

/// Default attenuation of the pose correction velocity.
pub static DEFAULT_POSE_UPDATE_ATTENUATION: f64 = 0.1;

/// Stiffness, damping and frame offsets of the admittance law.
///
/// Per-axis rotational values are ordered `[roll, pitch, yaw]`. Offsets are column-major 4x4
/// homogeneous transformations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdmittanceParameters {
    /// Translational stiffness in \[N/m\].
    pub translational_stiffness: [f64; 3],
    /// Translational damping in \[Ns/m\].
    pub translational_damping: [f64; 3],
    /// Rotational stiffness in \[Nm/rad\].
    pub rotational_stiffness: [f64; 3],
    /// Rotational damping in \[Nms/rad\].
    pub rotational_damping: [f64; 3],
    /// Frame of the model the tool is mounted to.
    pub end_effector_frame: Frame,
    /// Pose of the tool frame T in the end effector frame E.
    pub end_effector_to_tool: [f64; 16],
    /// Nominal pose of the contact frame C in the tool frame T.
    pub tool_to_contact: [f64; 16],
    /// Fraction of the pose error which is commanded per IK timestep, in (0, 1].
    #[serde(default = "default_pose_update_attenuation")]
    pub pose_update_attenuation: f64,
}

fn default_pose_update_attenuation() -> f64 {
    DEFAULT_POSE_UPDATE_ATTENUATION
}

impl AdmittanceParameters {
    /// Creates parameters with identity offsets and the default attenuation.
    pub fn new(
        translational_stiffness: [f64; 3],
        translational_damping: [f64; 3],
        rotational_stiffness: [f64; 3],
        rotational_damping: [f64; 3],
        end_effector_frame: Frame,
    ) -> Self {
        AdmittanceParameters {
            translational_stiffness,
            translational_damping,
            rotational_stiffness,
            rotational_damping,
            end_effector_frame,
            end_effector_to_tool: IDENTITY_POSE,
            tool_to_contact: IDENTITY_POSE,
            pose_update_attenuation: DEFAULT_POSE_UPDATE_ATTENUATION,
        }
    }

    /// Parses and validates parameters from a TOML document.
    pub fn from_toml_str(document: &str) -> AdmittanceResult<Self> {
        let parameters: AdmittanceParameters = toml::from_str(document)
            .map_err(|e| create_configuration_exception(&e.to_string()))?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Derives the attenuation from the rates of the pose channel and the command channel.
    ///
    /// A pose update is held for `command_rate_hz / pose_rate_hz` ticks, so only that fraction
    /// of the pose error is commanded per tick.
    /// # Errors
    /// * ConfigurationException if a rate is not positive and finite.
    pub fn with_rate_ratio(mut self, command_rate_hz: f64, pose_rate_hz: f64) -> AdmittanceResult<Self> {
        let valid = |rate: f64| rate.is_finite() && rate > 0.;
        if !(valid(command_rate_hz) && valid(pose_rate_hz)) {
            return Err(create_configuration_exception(
                "channel rates have to be positive and finite",
            ));
        }
        self.pose_update_attenuation = (pose_rate_hz / command_rate_hz).min(1.);
        Ok(self)
    }

    /// Checks gains, offsets and attenuation.
    /// # Errors
    /// * ConfigurationException if one of the values is not usable.
    pub fn validate(&self) -> AdmittanceResult<()> {
        let stiffness = self
            .translational_stiffness
            .iter()
            .chain(self.rotational_stiffness.iter());
        for &value in stiffness {
            if !(value.is_finite() && value > 0.) {
                return Err(create_configuration_exception(&format!(
                    "stiffness has to be positive and finite but is {}",
                    value
                )));
            }
        }
        let damping = self
            .translational_damping
            .iter()
            .chain(self.rotational_damping.iter());
        for &value in damping {
            if !(value.is_finite() && value >= 0.) {
                return Err(create_configuration_exception(&format!(
                    "damping has to be non-negative and finite but is {}",
                    value
                )));
            }
        }
        if !is_homogeneous_transformation(&self.end_effector_to_tool) {
            return Err(create_configuration_exception(
                "end_effector_to_tool is not a homogeneous transformation",
            ));
        }
        if !is_homogeneous_transformation(&self.tool_to_contact) {
            return Err(create_configuration_exception(
                "tool_to_contact is not a homogeneous transformation",
            ));
        }
        let attenuation = self.pose_update_attenuation;
        if !(attenuation.is_finite() && attenuation > 0. && attenuation <= 1.) {
            return Err(create_configuration_exception(
                "pose_update_attenuation has to be in (0, 1]",
            ));
        }
        Ok(())
    }

    pub fn end_effector_to_tool_pose(&self) -> Isometry3<f64> {
        array_to_isometry(&self.end_effector_to_tool)
    }

    pub fn tool_to_contact_pose(&self) -> Isometry3<f64> {
        array_to_isometry(&self.tool_to_contact)
    }
}

#[cfg(test)]
mod tests {
    use crate::exception::AdmittanceException;
    use crate::model::Frame;
    use crate::plan::parameters::AdmittanceParameters;

    fn parameters() -> AdmittanceParameters {
        AdmittanceParameters::new(
            [1000.; 3],
            [50.; 3],
            [100.; 3],
            [5.; 3],
            Frame::body("iiwa_link_7"),
        )
    }

    #[test]
    fn default_parameters_are_valid() {
        let parameters = parameters();
        assert!(parameters.validate().is_ok());
        assert_eq!(parameters.pose_update_attenuation, 0.1);
    }

    #[test]
    fn rejects_zero_stiffness() {
        let mut zero_rotational = parameters();
        zero_rotational.rotational_stiffness[1] = 0.;
        match zero_rotational.validate() {
            Err(AdmittanceException::ConfigurationException { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        let mut negative_translational = parameters();
        negative_translational.translational_stiffness[2] = -1.;
        assert!(negative_translational.validate().is_err());
        let mut negative_damping = parameters();
        negative_damping.rotational_damping[0] = -0.5;
        assert!(negative_damping.validate().is_err());
    }

    #[test]
    fn rejects_invalid_offsets_and_attenuation() {
        let mut offset = parameters();
        offset.tool_to_contact[0] = 3.;
        assert!(offset.validate().is_err());
        let mut mirrored = parameters();
        mirrored.end_effector_to_tool[10] = -1.;
        assert!(mirrored.validate().is_err());
        let mut attenuation = parameters();
        attenuation.pose_update_attenuation = 1.5;
        assert!(attenuation.validate().is_err());
        attenuation.pose_update_attenuation = 0.;
        assert!(attenuation.validate().is_err());
    }

    #[test]
    fn attenuation_from_rate_ratio() {
        let parameters = parameters().with_rate_ratio(200., 20.).unwrap();
        assert!((parameters.pose_update_attenuation - 0.1).abs() < 1e-15);
        let saturated = self::parameters().with_rate_ratio(100., 400.).unwrap();
        assert_eq!(saturated.pose_update_attenuation, 1.);
        assert!(self::parameters().with_rate_ratio(0., 20.).is_err());
    }

    #[test]
    fn parses_toml() {
        let document = r#"
            translational_stiffness = [1000.0, 1000.0, 500.0]
            translational_damping = [50.0, 50.0, 25.0]
            rotational_stiffness = [100.0, 100.0, 100.0]
            rotational_damping = [5.0, 5.0, 5.0]
            end_effector_frame = { Body = "iiwa_link_7" }
            end_effector_to_tool = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
                                    0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.1, 1.0]
            tool_to_contact = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
                               0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        "#;
        let parameters = AdmittanceParameters::from_toml_str(document).unwrap();
        assert_eq!(parameters.end_effector_frame, Frame::body("iiwa_link_7"));
        assert_eq!(parameters.pose_update_attenuation, 0.1);
        assert!(
            (parameters.end_effector_to_tool_pose().translation.vector.z - 0.1).abs() < 1e-15
        );
        assert!(AdmittanceParameters::from_toml_str(
            &document.replace("[1000.0, 1000.0, 500.0]", "[0.0, 1000.0, 500.0]")
        )
        .is_err());
    }
}
