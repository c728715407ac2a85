//! Serialization boundary of the motor model: plain data structs keyed by the
//! motor's field names, with TOML round-trip helpers. This is the contract
//! the rest of the simulation and any persistence layer depend on.

use serde::{Deserialize, Serialize};

use super::genericmotor::{ChamberGeometry, GenericMotor};
use super::motor::{Motor, MotorSpec};
use super::thrustcurve::{BurnTime, ThrustSource};
use super::{CoordinateOrientation, InertiaTensor, MotorError};
use crate::math::func::ScalarFunction;
use crate::math::interp::InterpMethod;

/// Motor configuration fields, plus optionally the derived outputs sampled on
/// the thrust grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorData {
    /// Processed thrust curve samples.
    pub thrust_source: Vec<(f64, f64)>,
    pub dry_mass: f64,
    pub dry_inertia: InertiaTensor,
    pub center_of_dry_mass_position: f64,
    pub nozzle_radius: f64,
    pub nozzle_position: f64,
    pub coordinate_system_orientation: CoordinateOrientation,
    pub burn_time: (f64, f64),
    pub interpolation_method: InterpMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_impulse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_thrust: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_thrust_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_thrust: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_mass_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhaust_velocity: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_mass_flow_rate: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propellant_mass: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_mass: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_of_propellant_mass: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_of_mass: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i_11: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i_22: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i_33: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i_12: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i_13: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i_23: Option<Vec<(f64, f64)>>,
}

impl MotorData {
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// [`MotorData`] extended with the generic motor's chamber fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericMotorData {
    #[serde(flatten)]
    pub motor: MotorData,
    pub chamber_radius: f64,
    pub chamber_height: f64,
    pub chamber_position: f64,
    pub propellant_initial_mass: f64,
}

impl GenericMotorData {
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

fn sample_pairs(f: &ScalarFunction, grid: &ScalarFunction) -> Vec<(f64, f64)> {
    let resampled;
    let f = if f.is_sampled() {
        f
    } else {
        resampled = f.resample_like(grid);
        &resampled
    };

    match f.samples() {
        Some((x, y)) => x.iter().copied().zip(y.iter().copied()).collect(),
        None => Vec::new(),
    }
}

impl Motor {
    /// Snapshot of the motor configuration, optionally including every
    /// derived output sampled on the thrust grid.
    pub fn to_data(&self, include_outputs: bool) -> MotorData {
        let mut data = MotorData {
            thrust_source: sample_pairs(self.thrust(), self.thrust()),
            dry_mass: self.dry_mass(),
            dry_inertia: self.dry_inertia(),
            center_of_dry_mass_position: self.center_of_dry_mass_position(),
            nozzle_radius: self.nozzle_radius(),
            nozzle_position: self.nozzle_position(),
            coordinate_system_orientation: self.coordinate_system_orientation(),
            burn_time: self.burn_time(),
            interpolation_method: self.interpolation_method(),
            total_impulse: None,
            max_thrust: None,
            max_thrust_time: None,
            average_thrust: None,
            structural_mass_ratio: None,
            exhaust_velocity: None,
            total_mass_flow_rate: None,
            propellant_mass: None,
            total_mass: None,
            center_of_propellant_mass: None,
            center_of_mass: None,
            i_11: None,
            i_22: None,
            i_33: None,
            i_12: None,
            i_13: None,
            i_23: None,
        };

        if include_outputs {
            let grid = self.thrust();
            data.total_impulse = Some(self.total_impulse());
            data.max_thrust = Some(self.max_thrust());
            data.max_thrust_time = Some(self.max_thrust_time());
            data.average_thrust = Some(self.average_thrust());
            data.structural_mass_ratio = self.structural_mass_ratio().ok();
            data.exhaust_velocity = Some(sample_pairs(self.exhaust_velocity(), grid));
            data.total_mass_flow_rate = Some(sample_pairs(self.total_mass_flow_rate(), grid));
            data.propellant_mass = Some(sample_pairs(self.propellant_mass(), grid));
            data.total_mass = Some(sample_pairs(self.total_mass(), grid));
            data.center_of_propellant_mass =
                Some(sample_pairs(self.center_of_propellant_mass(), grid));
            data.center_of_mass = Some(sample_pairs(self.center_of_mass(), grid));
            data.i_11 = Some(sample_pairs(self.i_11(), grid));
            data.i_22 = Some(sample_pairs(self.i_22(), grid));
            data.i_33 = Some(sample_pairs(self.i_33(), grid));
            data.i_12 = Some(sample_pairs(self.i_12(), grid));
            data.i_13 = Some(sample_pairs(self.i_13(), grid));
            data.i_23 = Some(sample_pairs(self.i_23(), grid));
        }

        data
    }

    /// As [`Motor::to_data`], with the propellant model's chamber fields.
    /// `None` when the model carries no chamber geometry.
    pub fn to_generic_data(&self, include_outputs: bool) -> Option<GenericMotorData> {
        let chamber = self.model().chamber()?;

        Some(GenericMotorData {
            motor: self.to_data(include_outputs),
            chamber_radius: chamber.radius,
            chamber_height: chamber.height,
            chamber_position: chamber.position,
            propellant_initial_mass: self.propellant_initial_mass(),
        })
    }
}

impl GenericMotor {
    /// Rebuilds a generic motor from exported data.
    pub fn from_data(data: &GenericMotorData) -> Result<Motor, MotorError> {
        let motor = &data.motor;
        let spec = MotorSpec {
            thrust_source: ThrustSource::Samples(motor.thrust_source.clone()),
            dry_mass: Some(motor.dry_mass),
            dry_inertia: motor.dry_inertia,
            center_of_dry_mass_position: Some(motor.center_of_dry_mass_position),
            nozzle_radius: motor.nozzle_radius,
            nozzle_position: motor.nozzle_position,
            burn_time: Some(BurnTime::Window(motor.burn_time.0, motor.burn_time.1)),
            reshape: None,
            interpolation_method: motor.interpolation_method,
            coordinate_system_orientation: motor.coordinate_system_orientation,
        };

        let chamber = ChamberGeometry {
            radius: data.chamber_radius,
            height: data.chamber_height,
            position: data.chamber_position,
        };

        GenericMotor::new(chamber, data.propellant_initial_mass).motor(spec)
    }
}
