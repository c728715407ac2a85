//! Generic motor: a rough propellant model for when only the thrust curve is
//! known. The propellant is approximated as a solid cylinder of fixed
//! geometry with a constant effective exhaust velocity; for detailed grain or
//! tank behaviour a dedicated motor variant is needed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::eng;
use super::motor::{Motor, MotorSpec, PropellantModel, ReshapeSpec};
use super::thrustcurve::{BurnTime, ThrustSource};
use super::{CoordinateOrientation, FormatError, InertiaTensor, MotorError};
use crate::math::func::ScalarFunction;
use crate::math::interp::InterpMethod;

/// Cylindrical envelope of the propellant chamber. `position` is the axial
/// position of the cylinder centroid (half height) in the motor frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChamberGeometry {
    pub radius: f64,
    pub height: f64,
    pub position: f64,
}

/// Propellant model approximating the propellant as a cylinder fixed at the
/// chamber position. The propellant center of mass does not move over time,
/// a deliberate simplification of this variant.
#[derive(Debug, Clone)]
pub struct GenericMotor {
    pub chamber: ChamberGeometry,
    pub propellant_initial_mass: f64,
}

impl GenericMotor {
    pub fn new(chamber: ChamberGeometry, propellant_initial_mass: f64) -> Self {
        GenericMotor {
            chamber,
            propellant_initial_mass,
        }
    }

    /// Builds the motor. The center of dry mass defaults to the chamber
    /// position when the spec leaves it out.
    pub fn motor(self, mut spec: MotorSpec) -> Result<Motor, MotorError> {
        spec.center_of_dry_mass_position
            .get_or_insert(self.chamber.position);
        Motor::new(spec, Box::new(self))
    }

    /// Loads a generic motor from an `.eng` file, sourcing every parameter
    /// not given in `options` from the file's description line.
    pub fn from_eng_file(
        path: impl AsRef<Path>,
        options: EngMotorOptions,
    ) -> Result<Motor, MotorError> {
        let path = path.as_ref();
        if !eng::has_eng_extension(path) {
            return Err(FormatError::UnsupportedExtension(path.to_path_buf()).into());
        }

        let eng = eng::import(path)?;
        let description = &eng.description;

        let chamber_radius = match options.chamber_radius {
            Some(radius) => radius,
            None => description.diameter_mm()? / 1000.0,
        };
        let chamber_height = match options.chamber_height {
            Some(height) => height,
            None => description.length_mm()? / 1000.0,
        };
        let propellant_initial_mass = match options.propellant_initial_mass {
            Some(mass) => mass,
            None => description.propellant_mass()?,
        };
        let dry_mass = match options.dry_mass {
            Some(mass) => mass,
            None => description.total_mass()? - propellant_initial_mass,
        };
        let nozzle_radius = options.nozzle_radius.unwrap_or(0.85 * chamber_radius);

        let spec = MotorSpec {
            thrust_source: ThrustSource::Samples(eng.points),
            dry_mass: Some(dry_mass),
            dry_inertia: options.dry_inertia,
            center_of_dry_mass_position: options.center_of_dry_mass_position,
            nozzle_radius,
            nozzle_position: options.nozzle_position,
            burn_time: options.burn_time,
            reshape: options.reshape,
            interpolation_method: options.interpolation_method,
            coordinate_system_orientation: options.coordinate_system_orientation,
        };

        let chamber = ChamberGeometry {
            radius: chamber_radius,
            height: chamber_height,
            position: options.chamber_position,
        };

        GenericMotor::new(chamber, propellant_initial_mass).motor(spec)
    }
}

/// Optional overrides for [`GenericMotor::from_eng_file`]. Anything left at
/// `None` is sourced from the `.eng` description.
#[derive(Debug, Clone, Default)]
pub struct EngMotorOptions {
    pub nozzle_radius: Option<f64>,
    pub chamber_radius: Option<f64>,
    pub chamber_height: Option<f64>,
    pub chamber_position: f64,
    pub propellant_initial_mass: Option<f64>,
    pub dry_mass: Option<f64>,
    pub burn_time: Option<BurnTime>,
    pub center_of_dry_mass_position: Option<f64>,
    pub dry_inertia: InertiaTensor,
    pub nozzle_position: f64,
    pub reshape: Option<ReshapeSpec>,
    pub interpolation_method: InterpMethod,
    pub coordinate_system_orientation: CoordinateOrientation,
}

impl PropellantModel for GenericMotor {
    /// Constant exhaust velocity, total impulse over propellant initial mass,
    /// discretized onto the thrust curve's own sample grid.
    fn exhaust_velocity(&self, motor: &Motor) -> ScalarFunction {
        ScalarFunction::constant(motor.total_impulse() / self.propellant_initial_mass)
            .resample_like(motor.thrust())
    }

    fn propellant_initial_mass(&self) -> f64 {
        self.propellant_initial_mass
    }

    fn center_of_propellant_mass(&self, _motor: &Motor) -> ScalarFunction {
        ScalarFunction::constant(self.chamber.position)
    }

    /// Solid cylinder about its own center: m (3r² + h²) / 12.
    fn propellant_i_11(&self, motor: &Motor) -> ScalarFunction {
        let r = self.chamber.radius;
        let h = self.chamber.height;
        motor.propellant_mass() * ((3.0 * r * r + h * h) / 12.0)
    }

    fn propellant_i_22(&self, motor: &Motor) -> ScalarFunction {
        self.propellant_i_11(motor)
    }

    /// Solid cylinder about its axis: m r² / 2.
    fn propellant_i_33(&self, motor: &Motor) -> ScalarFunction {
        motor.propellant_mass() * (self.chamber.radius * self.chamber.radius / 2.0)
    }

    fn propellant_i_12(&self, _motor: &Motor) -> ScalarFunction {
        ScalarFunction::constant(0.0)
    }

    fn propellant_i_13(&self, _motor: &Motor) -> ScalarFunction {
        ScalarFunction::constant(0.0)
    }

    fn propellant_i_23(&self, _motor: &Motor) -> ScalarFunction {
        ScalarFunction::constant(0.0)
    }

    fn chamber(&self) -> Option<ChamberGeometry> {
        Some(self.chamber)
    }
}
