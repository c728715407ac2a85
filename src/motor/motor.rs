//! Abstract motor model: combines a thrust curve, a dry structure and a
//! propellant model into every time-varying mass, center-of-mass and
//! inertia-tensor quantity of the motor.

use std::path::Path;

use log::warn;
use nalgebra::Matrix3;
use once_cell::sync::OnceCell;

use super::eng::{self, EngDescription, EngExport};
use super::genericmotor::ChamberGeometry;
use super::thrustcurve::{self, BurnTime, ThrustSource, THRUST_UNITS};
use super::{CoordinateOrientation, InertiaTensor, MotorError};
use crate::math::func::{FuncError, ScalarFunction};
use crate::math::interp::{Extrapolation, InterpMethod};

/// Points a constant or closed-form thrust source is discretized onto across
/// the burn window, so that reshape/clip can operate on samples.
const DISCRETIZATION_POINTS: usize = 50;

/// Propellant capability a concrete motor variant supplies. All positions are
/// axial: the propellant center of mass may only move along the motor's axis
/// of symmetry (the parallel-axis composition of the combined inertia relies
/// on this).
///
/// Hooks receive the owning [`Motor`] so they can be built from the processed
/// thrust curve and the quantities the abstract model derives (total impulse,
/// propellant mass, ...).
pub trait PropellantModel: Send + Sync {
    /// Effective exhaust velocity of the ejected gases, in m/s.
    fn exhaust_velocity(&self, motor: &Motor) -> ScalarFunction;

    /// Propellant mass before ignition, in kg, all phases included.
    fn propellant_initial_mass(&self) -> f64;

    /// Axial position of the propellant center of mass, in m.
    fn center_of_propellant_mass(&self, motor: &Motor) -> ScalarFunction;

    /// Propellant inertia about its own center of mass, e_1 direction.
    fn propellant_i_11(&self, motor: &Motor) -> ScalarFunction;

    /// Propellant inertia about its own center of mass, e_2 direction.
    fn propellant_i_22(&self, motor: &Motor) -> ScalarFunction;

    /// Propellant inertia about the symmetry axis.
    fn propellant_i_33(&self, motor: &Motor) -> ScalarFunction;

    fn propellant_i_12(&self, motor: &Motor) -> ScalarFunction;
    fn propellant_i_13(&self, motor: &Motor) -> ScalarFunction;
    fn propellant_i_23(&self, motor: &Motor) -> ScalarFunction;

    /// Overall propellant chamber envelope, when the model has one. Used by
    /// the `.eng` writer and the data layer.
    fn chamber(&self) -> Option<ChamberGeometry> {
        None
    }
}

/// Immutable motor configuration. Fields not known at construction stay at
/// their defaults through struct update syntax.
#[derive(Debug, Clone)]
pub struct MotorSpec {
    pub thrust_source: ThrustSource,
    /// Structural mass excluding propellant, kg. When absent it is derived
    /// from the `.eng` description as `total - propellant`.
    pub dry_mass: Option<f64>,
    /// Dry inertia about `center_of_dry_mass_position`.
    pub dry_inertia: InertiaTensor,
    pub center_of_dry_mass_position: Option<f64>,
    pub nozzle_radius: f64,
    pub nozzle_position: f64,
    /// Defaults to the thrust curve sample range for tabulated sources.
    pub burn_time: Option<BurnTime>,
    pub reshape: Option<ReshapeSpec>,
    pub interpolation_method: InterpMethod,
    pub coordinate_system_orientation: CoordinateOrientation,
}

impl MotorSpec {
    pub fn new(thrust_source: impl Into<ThrustSource>) -> Self {
        MotorSpec {
            thrust_source: thrust_source.into(),
            dry_mass: None,
            dry_inertia: InertiaTensor::default(),
            center_of_dry_mass_position: None,
            nozzle_radius: 0.0,
            nozzle_position: 0.0,
            burn_time: None,
            reshape: None,
            interpolation_method: InterpMethod::default(),
            coordinate_system_orientation: CoordinateOrientation::default(),
        }
    }
}

/// Request to rescale the thrust curve to a new burn window and total
/// impulse while preserving its shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReshapeSpec {
    pub burn_time: BurnTime,
    pub total_impulse: f64,
}

#[derive(Default)]
struct DerivedCache {
    exhaust_velocity: OnceCell<ScalarFunction>,
    total_mass_flow_rate: OnceCell<ScalarFunction>,
    propellant_mass: OnceCell<ScalarFunction>,
    total_mass: OnceCell<ScalarFunction>,
    center_of_propellant_mass: OnceCell<ScalarFunction>,
    center_of_mass: OnceCell<ScalarFunction>,
    i_11: OnceCell<ScalarFunction>,
    i_33: OnceCell<ScalarFunction>,
    i_12: OnceCell<ScalarFunction>,
    i_13: OnceCell<ScalarFunction>,
    i_23: OnceCell<ScalarFunction>,
    propellant_i_11: OnceCell<ScalarFunction>,
    propellant_i_22: OnceCell<ScalarFunction>,
    propellant_i_33: OnceCell<ScalarFunction>,
    propellant_i_12: OnceCell<ScalarFunction>,
    propellant_i_13: OnceCell<ScalarFunction>,
    propellant_i_23: OnceCell<ScalarFunction>,
}

/// A motor with a processed thrust curve and a propellant model. Immutable
/// after construction; every derived quantity is computed on first access and
/// memoized for the lifetime of the motor.
pub struct Motor {
    model: Box<dyn PropellantModel>,
    thrust: ScalarFunction,
    burn_time: (f64, f64),
    dry_mass: f64,
    dry_inertia: InertiaTensor,
    center_of_dry_mass_position: f64,
    nozzle_radius: f64,
    nozzle_position: f64,
    orientation: CoordinateOrientation,
    axis_sign: f64,
    interpolation_method: InterpMethod,
    total_impulse: f64,
    max_thrust: f64,
    max_thrust_time: f64,
    average_thrust: f64,
    eng_description: Option<EngDescription>,
    cache: DerivedCache,
}

impl Motor {
    pub fn new(spec: MotorSpec, model: Box<dyn PropellantModel>) -> Result<Self, MotorError> {
        let orientation = spec.coordinate_system_orientation;
        let axis_sign = orientation.axis_sign();

        let loaded = thrustcurve::load(&spec.thrust_source, spec.interpolation_method)?;
        let mut thrust = loaded.curve;

        let dry_mass = match spec.dry_mass {
            Some(mass) if mass.is_finite() => mass,
            Some(mass) => return Err(MotorError::DryMassNotFinite(mass)),
            None => match &loaded.description {
                Some(description) => description.total_mass()? - description.propellant_mass()?,
                None => return Err(MotorError::DryMassMissing),
            },
        };

        let center_of_dry_mass_position = spec
            .center_of_dry_mass_position
            .ok_or(MotorError::CenterOfDryMassMissing)?;

        let mut burn_time = thrustcurve::resolve_burn_window(spec.burn_time, &thrust)?;

        // Reshape and clip operate on discrete samples
        if !thrust.is_sampled() {
            thrust = thrust
                .discretize(
                    burn_time.0,
                    burn_time.1,
                    DISCRETIZATION_POINTS,
                    spec.interpolation_method,
                    Extrapolation::Zero,
                )?
                .with_units(THRUST_UNITS.0, THRUST_UNITS.1);
        }

        if let Some(reshape) = spec.reshape {
            thrust =
                thrustcurve::reshape_thrust_curve(&thrust, reshape.burn_time, reshape.total_impulse)?;
            burn_time = reshape.burn_time.window();
        }

        let (thrust, burn_time) = thrustcurve::clip_thrust(&thrust, burn_time)?;

        let total_impulse = thrust.integral(burn_time.0, burn_time.1);
        let (max_thrust_time, max_thrust) = thrust.max_sample().ok_or(FuncError::NotSampled)?;
        let average_thrust = total_impulse / (burn_time.1 - burn_time.0);

        Ok(Motor {
            model,
            thrust,
            burn_time,
            dry_mass,
            dry_inertia: spec.dry_inertia,
            center_of_dry_mass_position,
            nozzle_radius: spec.nozzle_radius,
            nozzle_position: spec.nozzle_position,
            orientation,
            axis_sign,
            interpolation_method: spec.interpolation_method,
            total_impulse,
            max_thrust,
            max_thrust_time,
            average_thrust,
            eng_description: loaded.description,
            cache: DerivedCache::default(),
        })
    }

    /// Thrust force in N over the burn window, zero outside it.
    pub fn thrust(&self) -> &ScalarFunction {
        &self.thrust
    }

    pub fn burn_time(&self) -> (f64, f64) {
        self.burn_time
    }

    pub fn burn_start_time(&self) -> f64 {
        self.burn_time.0
    }

    pub fn burn_out_time(&self) -> f64 {
        self.burn_time.1
    }

    pub fn burn_duration(&self) -> f64 {
        self.burn_time.1 - self.burn_time.0
    }

    pub fn dry_mass(&self) -> f64 {
        self.dry_mass
    }

    pub fn dry_inertia(&self) -> InertiaTensor {
        self.dry_inertia
    }

    pub fn center_of_dry_mass_position(&self) -> f64 {
        self.center_of_dry_mass_position
    }

    pub fn nozzle_radius(&self) -> f64 {
        self.nozzle_radius
    }

    pub fn nozzle_position(&self) -> f64 {
        self.nozzle_position
    }

    pub fn coordinate_system_orientation(&self) -> CoordinateOrientation {
        self.orientation
    }

    /// Signed direction of the coordinate axis along the symmetry axis,
    /// resolved once at construction.
    pub fn axis_sign(&self) -> f64 {
        self.axis_sign
    }

    pub fn interpolation_method(&self) -> InterpMethod {
        self.interpolation_method
    }

    pub fn total_impulse(&self) -> f64 {
        self.total_impulse
    }

    pub fn max_thrust(&self) -> f64 {
        self.max_thrust
    }

    pub fn max_thrust_time(&self) -> f64 {
        self.max_thrust_time
    }

    pub fn average_thrust(&self) -> f64 {
        self.average_thrust
    }

    pub fn model(&self) -> &dyn PropellantModel {
        self.model.as_ref()
    }

    /// Description fields of the `.eng` file the thrust source came from.
    pub fn eng_description(&self) -> Option<&EngDescription> {
        self.eng_description.as_ref()
    }

    pub fn propellant_initial_mass(&self) -> f64 {
        self.model.propellant_initial_mass()
    }

    /// Exhaust velocity of the propulsion gases in m/s.
    pub fn exhaust_velocity(&self) -> &ScalarFunction {
        self.cache.exhaust_velocity.get_or_init(|| {
            self.model
                .exhaust_velocity(self)
                .with_units("Time (s)", "Exhaust velocity (m/s)")
        })
    }

    /// Time derivative of the propellant mass in kg/s, obtained from the
    /// thrust curve and the average exhaust velocity. Nonpositive wherever
    /// thrust is nonnegative.
    pub fn total_mass_flow_rate(&self) -> &ScalarFunction {
        self.cache.total_mass_flow_rate.get_or_init(|| {
            let average_exhaust_velocity =
                self.total_impulse / self.model.propellant_initial_mass();
            (&self.thrust / -average_exhaust_velocity)
                .with_units("Time (s)", "Mass flow rate (kg/s)")
        })
    }

    /// Propellant mass in kg as a function of time, monotonically
    /// non-increasing from the initial mass.
    pub fn propellant_mass(&self) -> &ScalarFunction {
        self.cache.propellant_mass.get_or_init(|| {
            let consumed = self
                .total_mass_flow_rate()
                .integral_function()
                .expect("mass flow rate is sampled");
            (&consumed + self.model.propellant_initial_mass())
                .with_units("Time (s)", "Propellant mass (kg)")
        })
    }

    /// Total motor mass: propellant mass plus dry mass.
    pub fn total_mass(&self) -> &ScalarFunction {
        self.cache.total_mass.get_or_init(|| {
            (self.propellant_mass() + self.dry_mass).with_units("Time (s)", "Total mass (kg)")
        })
    }

    /// Initial dry over total mass ratio. Fails when the motor has neither
    /// dry nor propellant mass.
    pub fn structural_mass_ratio(&self) -> Result<f64, MotorError> {
        let initial_total_mass = self.dry_mass + self.model.propellant_initial_mass();
        if initial_total_mass == 0.0 {
            return Err(MotorError::ZeroTotalMass);
        }
        Ok(self.dry_mass / initial_total_mass)
    }

    /// Axial position of the propellant center of mass, in the motor frame.
    pub fn center_of_propellant_mass(&self) -> &ScalarFunction {
        self.cache.center_of_propellant_mass.get_or_init(|| {
            self.model
                .center_of_propellant_mass(self)
                .with_units("Time (s)", "Center of propellant mass (m)")
        })
    }

    /// Axial position of the motor center of mass: the mass-weighted average
    /// of the propellant and dry structure centers. Always lies between the
    /// two while both masses are non-negative.
    pub fn center_of_mass(&self) -> &ScalarFunction {
        self.cache.center_of_mass.get_or_init(|| {
            let balance = &(self.center_of_propellant_mass() * self.propellant_mass())
                + self.dry_mass * self.center_of_dry_mass_position;
            (&balance / self.total_mass()).with_units("Time (s)", "Center of mass (m)")
        })
    }

    /// Inertia about e_1 through the instantaneous center of mass. The
    /// propellant and dry terms are each shifted from their own center to the
    /// common one before summing.
    pub fn i_11(&self) -> &ScalarFunction {
        self.cache.i_11.get_or_init(|| {
            let center_of_mass = self.center_of_mass();
            let prop_offset = self.center_of_propellant_mass() - center_of_mass;
            let dry_offset = self.center_of_dry_mass_position - center_of_mass;

            let prop = parallel_axis(
                self.propellant_i_11(),
                self.propellant_mass(),
                &prop_offset,
            );
            let dry = parallel_axis(
                &ScalarFunction::constant(self.dry_inertia.i11),
                &ScalarFunction::constant(self.dry_mass),
                &dry_offset,
            );

            (&prop + &dry).with_units("Time (s)", "Inertia I_11 (kg m²)")
        })
    }

    /// Inertia about e_2 through the instantaneous center of mass. Equal to
    /// [`Motor::i_11`] by axial symmetry.
    pub fn i_22(&self) -> &ScalarFunction {
        self.i_11()
    }

    /// Inertia about the symmetry axis through the instantaneous center of
    /// mass. Both terms are already taken about that axis (the component
    /// centers are offset only along it), so no Steiner correction applies.
    pub fn i_33(&self) -> &ScalarFunction {
        self.cache.i_33.get_or_init(|| {
            (self.propellant_i_33() + self.dry_inertia.i33)
                .with_units("Time (s)", "Inertia I_33 (kg m²)")
        })
    }

    /// Product of inertia about e_1/e_2. The centers only move along e_3, so
    /// the parallel-axis correction vanishes.
    pub fn i_12(&self) -> &ScalarFunction {
        self.cache.i_12.get_or_init(|| {
            (self.propellant_i_12() + self.dry_inertia.i12)
                .with_units("Time (s)", "Inertia I_12 (kg m²)")
        })
    }

    /// Product of inertia about e_1/e_3; no correction, as for I_12.
    pub fn i_13(&self) -> &ScalarFunction {
        self.cache.i_13.get_or_init(|| {
            (self.propellant_i_13() + self.dry_inertia.i13)
                .with_units("Time (s)", "Inertia I_13 (kg m²)")
        })
    }

    /// Product of inertia about e_2/e_3; no correction, as for I_12.
    pub fn i_23(&self) -> &ScalarFunction {
        self.cache.i_23.get_or_init(|| {
            (self.propellant_i_23() + self.dry_inertia.i23)
                .with_units("Time (s)", "Inertia I_23 (kg m²)")
        })
    }

    pub fn propellant_i_11(&self) -> &ScalarFunction {
        self.cache
            .propellant_i_11
            .get_or_init(|| self.model.propellant_i_11(self))
    }

    pub fn propellant_i_22(&self) -> &ScalarFunction {
        self.cache
            .propellant_i_22
            .get_or_init(|| self.model.propellant_i_22(self))
    }

    pub fn propellant_i_33(&self) -> &ScalarFunction {
        self.cache
            .propellant_i_33
            .get_or_init(|| self.model.propellant_i_33(self))
    }

    pub fn propellant_i_12(&self) -> &ScalarFunction {
        self.cache
            .propellant_i_12
            .get_or_init(|| self.model.propellant_i_12(self))
    }

    pub fn propellant_i_13(&self) -> &ScalarFunction {
        self.cache
            .propellant_i_13
            .get_or_init(|| self.model.propellant_i_13(self))
    }

    pub fn propellant_i_23(&self) -> &ScalarFunction {
        self.cache
            .propellant_i_23
            .get_or_init(|| self.model.propellant_i_23(self))
    }

    /// Full inertia tensor at time `t`, about the instantaneous center of
    /// mass, in kg·m².
    pub fn inertia_tensor(&self, t: f64) -> Matrix3<f64> {
        let i11 = self.i_11().value(t);
        let i22 = self.i_22().value(t);
        let i33 = self.i_33().value(t);
        let i12 = self.i_12().value(t);
        let i13 = self.i_13().value(t);
        let i23 = self.i_23().value(t);

        Matrix3::new(
            i11, i12, i13, //
            i12, i22, i23, //
            i13, i23, i33,
        )
    }

    /// Writes the processed thrust curve and motor description to an `.eng`
    /// file. A propellant model without chamber geometry gets zeros in the
    /// geometry fields, with a warning.
    pub fn export_eng(&self, path: impl AsRef<Path>, motor_name: &str) -> Result<(), MotorError> {
        let path = path.as_ref();

        let (diameter_mm, length_mm) = match self.model.chamber() {
            Some(chamber) => (2000.0 * chamber.radius, 1000.0 * chamber.height),
            None => {
                warn!(
                    "the propellant model has no chamber geometry; \
                     writing zeros to '{}'",
                    path.display()
                );
                (0.0, 0.0)
            }
        };

        let propellant_mass = self.model.propellant_initial_mass();
        let (x, y) = self.thrust.samples().ok_or(FuncError::NotSampled)?;

        eng::export(
            path,
            &EngExport {
                name: motor_name,
                manufacturer: "motorsim",
                diameter_mm,
                length_mm,
                delay_s: 0.0,
                propellant_mass,
                total_mass: self.dry_mass + propellant_mass,
                samples: (x, y),
            },
        )?;

        Ok(())
    }
}

/// Parallel-axis (Steiner) shift of a moment of inertia known about a body's
/// own center of mass to a parallel axis at `offset`.
pub fn parallel_axis(
    inertia: &ScalarFunction,
    mass: &ScalarFunction,
    offset: &ScalarFunction,
) -> ScalarFunction {
    inertia + &(mass * &(offset * offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Minimal propellant model: fixed center, constant inertia components.
    struct SlugModel {
        initial_mass: f64,
        center: f64,
        i11: f64,
        i33: f64,
    }

    impl PropellantModel for SlugModel {
        fn exhaust_velocity(&self, motor: &Motor) -> ScalarFunction {
            ScalarFunction::constant(motor.total_impulse() / self.initial_mass)
                .resample_like(motor.thrust())
        }

        fn propellant_initial_mass(&self) -> f64 {
            self.initial_mass
        }

        fn center_of_propellant_mass(&self, _motor: &Motor) -> ScalarFunction {
            ScalarFunction::constant(self.center)
        }

        fn propellant_i_11(&self, _motor: &Motor) -> ScalarFunction {
            ScalarFunction::constant(self.i11)
        }

        fn propellant_i_22(&self, motor: &Motor) -> ScalarFunction {
            self.propellant_i_11(motor)
        }

        fn propellant_i_33(&self, _motor: &Motor) -> ScalarFunction {
            ScalarFunction::constant(self.i33)
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
    }

    fn test_motor() -> Motor {
        let spec = MotorSpec {
            dry_mass: Some(1.0),
            dry_inertia: (1.0, 1.0, 0.1).into(),
            center_of_dry_mass_position: Some(0.0),
            nozzle_radius: 0.05,
            burn_time: Some(BurnTime::Window(0.0, 2.0)),
            ..MotorSpec::new(100.0)
        };
        let model = SlugModel {
            initial_mass: 0.5,
            center: 0.3,
            i11: 0.02,
            i33: 0.05,
        };
        Motor::new(spec, Box::new(model)).unwrap()
    }

    #[test]
    fn test_thrust_metrics() {
        let motor = test_motor();

        assert_relative_eq!(motor.total_impulse(), 200.0, epsilon = 1e-9);
        assert_relative_eq!(motor.average_thrust(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(motor.max_thrust(), 100.0);
        assert_relative_eq!(motor.max_thrust_time(), 0.0);
        assert_eq!(motor.burn_time(), (0.0, 2.0));
        assert_relative_eq!(motor.burn_duration(), 2.0);
    }

    #[test]
    fn test_constant_source_is_discretized() {
        let motor = test_motor();

        let (x, y) = motor.thrust().samples().unwrap();
        assert_eq!(x.len(), DISCRETIZATION_POINTS);
        assert_relative_eq!(x[0], 0.0);
        assert_relative_eq!(x[x.len() - 1], 2.0);
        assert!(y.iter().all(|&v| v == 100.0));
    }

    #[test]
    fn test_total_mass_identity() {
        let motor = test_motor();

        for t in [0.0, 0.3, 1.0, 1.7, 2.0] {
            assert_relative_eq!(
                motor.total_mass().value(t),
                motor.propellant_mass().value(t) + motor.dry_mass(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_propellant_mass_boundaries() {
        let motor = test_motor();

        assert_relative_eq!(motor.propellant_mass().value(0.0), 0.5, epsilon = 1e-9);
        assert_relative_eq!(motor.propellant_mass().value(2.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mass_flow_rate_is_nonpositive() {
        let motor = test_motor();

        let (_, y) = motor.total_mass_flow_rate().samples().unwrap();
        assert!(y.iter().all(|&v| v <= 0.0));
        assert_relative_eq!(motor.total_mass_flow_rate().value(1.0), -0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_center_of_mass() {
        let motor = test_motor();

        // (0.3 * 0.5 + 1.0 * 0.0) / 1.5
        assert_relative_eq!(motor.center_of_mass().value(0.0), 0.1, epsilon = 1e-9);
        // All propellant burned: center of mass returns to the dry center
        assert_relative_eq!(motor.center_of_mass().value(2.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_center_of_mass_between_components() {
        let motor = test_motor();

        for t in [0.0, 0.5, 1.0, 1.5, 2.0] {
            let com = motor.center_of_mass().value(t);
            assert!((0.0..=0.3).contains(&com));
        }
    }

    #[test]
    fn test_i11_parallel_axis_composition() {
        let motor = test_motor();

        // At ignition: com = 0.1, propellant term 0.02 + 0.5 * 0.2^2,
        // dry term 1.0 + 1.0 * 0.1^2
        let expected = (0.02 + 0.5 * 0.04) + (1.0 + 1.0 * 0.01);
        assert_relative_eq!(motor.i_11().value(0.0), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_i22_equals_i11() {
        let motor = test_motor();

        for t in [0.0, 0.7, 1.4, 2.0] {
            assert_eq!(motor.i_22().value(t), motor.i_11().value(t));
        }
    }

    #[test]
    fn test_i33_is_plain_sum() {
        let motor = test_motor();

        assert_relative_eq!(motor.i_33().value(0.0), 0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_products_of_inertia_stay_zero() {
        let motor = test_motor();

        for t in [0.0, 1.0, 2.0] {
            assert_eq!(motor.i_12().value(t), 0.0);
            assert_eq!(motor.i_13().value(t), 0.0);
            assert_eq!(motor.i_23().value(t), 0.0);
        }
    }

    #[test]
    fn test_inertia_tensor_assembly() {
        let motor = test_motor();
        let tensor = motor.inertia_tensor(0.0);

        assert_eq!(tensor, tensor.transpose());
        assert_relative_eq!(tensor[(0, 0)], motor.i_11().value(0.0));
        assert_relative_eq!(tensor[(2, 2)], motor.i_33().value(0.0));
    }

    #[test]
    fn test_structural_mass_ratio() {
        let motor = test_motor();

        assert_relative_eq!(motor.structural_mass_ratio().unwrap(), 1.0 / 1.5);
    }

    #[test]
    fn test_structural_mass_ratio_zero_total() {
        let spec = MotorSpec {
            dry_mass: Some(0.0),
            center_of_dry_mass_position: Some(0.0),
            burn_time: Some(BurnTime::Duration(2.0)),
            ..MotorSpec::new(100.0)
        };
        let model = SlugModel {
            initial_mass: 0.0,
            center: 0.0,
            i11: 0.0,
            i33: 0.0,
        };
        let motor = Motor::new(spec, Box::new(model)).unwrap();

        assert!(matches!(
            motor.structural_mass_ratio(),
            Err(MotorError::ZeroTotalMass)
        ));
    }

    #[test]
    fn test_missing_dry_mass() {
        let spec = MotorSpec {
            center_of_dry_mass_position: Some(0.0),
            burn_time: Some(BurnTime::Duration(2.0)),
            ..MotorSpec::new(100.0)
        };
        let model = SlugModel {
            initial_mass: 0.5,
            center: 0.0,
            i11: 0.0,
            i33: 0.0,
        };

        assert!(matches!(
            Motor::new(spec, Box::new(model)),
            Err(MotorError::DryMassMissing)
        ));
    }

    #[test]
    fn test_non_finite_dry_mass() {
        let spec = MotorSpec {
            dry_mass: Some(f64::NAN),
            center_of_dry_mass_position: Some(0.0),
            burn_time: Some(BurnTime::Duration(2.0)),
            ..MotorSpec::new(100.0)
        };
        let model = SlugModel {
            initial_mass: 0.5,
            center: 0.0,
            i11: 0.0,
            i33: 0.0,
        };

        assert!(matches!(
            Motor::new(spec, Box::new(model)),
            Err(MotorError::DryMassNotFinite(_))
        ));
    }

    #[test]
    fn test_burn_time_required_for_constant_source() {
        let spec = MotorSpec {
            dry_mass: Some(1.0),
            center_of_dry_mass_position: Some(0.0),
            ..MotorSpec::new(100.0)
        };
        let model = SlugModel {
            initial_mass: 0.5,
            center: 0.0,
            i11: 0.0,
            i33: 0.0,
        };

        assert!(matches!(
            Motor::new(spec, Box::new(model)),
            Err(MotorError::BurnTimeRequired)
        ));
    }

    #[test]
    fn test_callable_source() {
        let spec = MotorSpec {
            dry_mass: Some(1.0),
            center_of_dry_mass_position: Some(0.0),
            burn_time: Some(BurnTime::Window(0.0, 1.0)),
            ..MotorSpec::new(ThrustSource::Function(std::sync::Arc::new(|t: f64| {
                100.0 * (1.0 - t)
            })))
        };
        let model = SlugModel {
            initial_mass: 0.5,
            center: 0.0,
            i11: 0.0,
            i33: 0.0,
        };
        let motor = Motor::new(spec, Box::new(model)).unwrap();

        assert!(motor.thrust().is_sampled());
        assert_relative_eq!(motor.total_impulse(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(motor.max_thrust(), 100.0);
    }

    #[test]
    fn test_reshape_spec_applied() {
        let spec = MotorSpec {
            dry_mass: Some(1.0),
            center_of_dry_mass_position: Some(0.0),
            burn_time: Some(BurnTime::Window(0.0, 2.0)),
            reshape: Some(ReshapeSpec {
                burn_time: BurnTime::Window(0.0, 4.0),
                total_impulse: 1000.0,
            }),
            ..MotorSpec::new(100.0)
        };
        let model = SlugModel {
            initial_mass: 0.5,
            center: 0.0,
            i11: 0.0,
            i33: 0.0,
        };
        let motor = Motor::new(spec, Box::new(model)).unwrap();

        assert_eq!(motor.burn_time(), (0.0, 4.0));
        assert_relative_eq!(motor.total_impulse(), 1000.0, epsilon = 1e-9);
        assert_relative_eq!(motor.average_thrust(), 250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_exhaust_velocity_on_thrust_grid() {
        let motor = test_motor();
        let ve = motor.exhaust_velocity();

        let (x, y) = ve.samples().unwrap();
        assert_eq!(x.len(), DISCRETIZATION_POINTS);
        // total_impulse / propellant_initial_mass = 200 / 0.5
        assert!(y.iter().all(|&v| (v - 400.0).abs() < 1e-9));
    }
}
