pub mod data;
pub mod eng;
pub mod genericmotor;
pub mod motor;
pub mod thrustcurve;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use nalgebra::Matrix3;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::func::FuncError;

pub use data::{GenericMotorData, MotorData};
pub use genericmotor::{ChamberGeometry, EngMotorOptions, GenericMotor};
pub use motor::{Motor, MotorSpec, PropellantModel, ReshapeSpec};
pub use thrustcurve::{BurnTime, ThrustSource};

/// Fatal motor file / thrust source format errors.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unsupported thrust file extension for '{0}', expected .eng or .csv")]
    UnsupportedExtension(PathBuf),

    #[error("failed to read motor file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("motor file '{0}' has no description line")]
    MissingDescription(PathBuf),

    #[error("motor description has {found} fields, expected at least {expected}")]
    TooFewDescriptionFields { expected: usize, found: usize },

    #[error("motor description field '{field}' is not a number: '{value}'")]
    BadDescriptionField { field: &'static str, value: String },

    #[error("malformed thrust sample line '{line}'")]
    MalformedSample { line: String },

    #[error("error reading thrust csv '{path}'")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Fatal motor configuration errors. Construction either fully succeeds or
/// fails with one of these before any derived quantity is computed.
#[derive(Debug, Error)]
pub enum MotorError {
    #[error(
        "invalid coordinate system orientation '{0}': options are \
         'nozzle_to_combustion_chamber' and 'combustion_chamber_to_nozzle'"
    )]
    InvalidOrientation(String),

    #[error("dry mass must be specified or derivable from the motor file description")]
    DryMassMissing,

    #[error("dry mass must be a finite number, got {0}")]
    DryMassNotFinite(f64),

    #[error("center of dry mass position must be specified")]
    CenterOfDryMassMissing,

    #[error("burn time must be specified when the thrust source is not tabulated")]
    BurnTimeRequired,

    #[error("burn time start ({start} s) must come before burn out ({end} s)")]
    InvalidBurnWindow { start: f64, end: f64 },

    #[error("total motor mass (dry + propellant) cannot be zero")]
    ZeroTotalMass,

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Func(#[from] FuncError),
}

/// Direction of the motor's coordinate axis along its axis of symmetry. The
/// resolved sign is applied whenever a spatial offset must be read as a signed
/// displacement along the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateOrientation {
    #[default]
    NozzleToCombustionChamber,
    CombustionChamberToNozzle,
}

impl CoordinateOrientation {
    pub fn axis_sign(self) -> f64 {
        match self {
            CoordinateOrientation::NozzleToCombustionChamber => 1.0,
            CoordinateOrientation::CombustionChamberToNozzle => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoordinateOrientation::NozzleToCombustionChamber => "nozzle_to_combustion_chamber",
            CoordinateOrientation::CombustionChamberToNozzle => "combustion_chamber_to_nozzle",
        }
    }
}

impl fmt::Display for CoordinateOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoordinateOrientation {
    type Err = MotorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nozzle_to_combustion_chamber" => Ok(CoordinateOrientation::NozzleToCombustionChamber),
            "combustion_chamber_to_nozzle" => Ok(CoordinateOrientation::CombustionChamberToNozzle),
            other => Err(MotorError::InvalidOrientation(other.to_string())),
        }
    }
}

/// Inertia tensor components about a fixed reference point, with e_3 along
/// the axis of symmetry. Products of inertia follow the sign convention that
/// stores them with the leading minus already applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InertiaTensor {
    pub i11: f64,
    pub i22: f64,
    pub i33: f64,
    pub i12: f64,
    pub i13: f64,
    pub i23: f64,
}

impl InertiaTensor {
    pub fn new(i11: f64, i22: f64, i33: f64, i12: f64, i13: f64, i23: f64) -> Self {
        InertiaTensor {
            i11,
            i22,
            i33,
            i12,
            i13,
            i23,
        }
    }

    /// Principal components only; products of inertia are zero.
    pub fn diagonal(i11: f64, i22: f64, i33: f64) -> Self {
        InertiaTensor::new(i11, i22, i33, 0.0, 0.0, 0.0)
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.i11, self.i12, self.i13, //
            self.i12, self.i22, self.i23, //
            self.i13, self.i23, self.i33,
        )
    }
}

impl From<(f64, f64, f64)> for InertiaTensor {
    fn from((i11, i22, i33): (f64, f64, f64)) -> Self {
        InertiaTensor::diagonal(i11, i22, i33)
    }
}

impl From<(f64, f64, f64, f64, f64, f64)> for InertiaTensor {
    fn from((i11, i22, i33, i12, i13, i23): (f64, f64, f64, f64, f64, f64)) -> Self {
        InertiaTensor::new(i11, i22, i33, i12, i13, i23)
    }
}

// Serialized as the 6-component sequence (I11, I22, I33, I12, I13, I23); a
// 3-component sequence is accepted with the products defaulting to zero.
impl Serialize for InertiaTensor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(6))?;
        for v in [self.i11, self.i22, self.i33, self.i12, self.i13, self.i23] {
            seq.serialize_element(&v)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for InertiaTensor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InertiaVisitor;

        impl<'de> Visitor<'de> for InertiaVisitor {
            type Value = InertiaTensor;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a sequence of 3 or 6 inertia components")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut components = Vec::with_capacity(6);
                while let Some(v) = seq.next_element::<f64>()? {
                    components.push(v);
                }

                match components.as_slice() {
                    &[i11, i22, i33] => Ok(InertiaTensor::diagonal(i11, i22, i33)),
                    &[i11, i22, i33, i12, i13, i23] => {
                        Ok(InertiaTensor::new(i11, i22, i33, i12, i13, i23))
                    }
                    other => Err(de::Error::invalid_length(other.len(), &self)),
                }
            }
        }

        deserializer.deserialize_seq(InertiaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_round_trip() {
        for orientation in [
            CoordinateOrientation::NozzleToCombustionChamber,
            CoordinateOrientation::CombustionChamberToNozzle,
        ] {
            assert_eq!(
                orientation.as_str().parse::<CoordinateOrientation>().unwrap(),
                orientation
            );
        }

        assert!(matches!(
            "sideways".parse::<CoordinateOrientation>(),
            Err(MotorError::InvalidOrientation(_))
        ));
    }

    #[test]
    fn test_axis_sign() {
        assert_eq!(
            CoordinateOrientation::NozzleToCombustionChamber.axis_sign(),
            1.0
        );
        assert_eq!(
            CoordinateOrientation::CombustionChamberToNozzle.axis_sign(),
            -1.0
        );
    }

    #[test]
    fn test_inertia_from_triple_zeroes_products() {
        let inertia: InertiaTensor = (1.0, 2.0, 3.0).into();

        assert_eq!(inertia.i12, 0.0);
        assert_eq!(inertia.i13, 0.0);
        assert_eq!(inertia.i23, 0.0);
        assert_eq!(inertia.i33, 3.0);
    }

    #[test]
    fn test_inertia_serde_three_and_six() {
        let three: InertiaTensor = toml::from_str::<toml::Value>("v = [1.0, 1.0, 0.1]")
            .unwrap()
            .get("v")
            .unwrap()
            .clone()
            .try_into()
            .unwrap();
        assert_eq!(three, InertiaTensor::diagonal(1.0, 1.0, 0.1));

        let six: InertiaTensor =
            toml::from_str::<toml::Value>("v = [1.0, 1.0, 0.1, 0.01, 0.02, 0.03]")
                .unwrap()
                .get("v")
                .unwrap()
                .clone()
                .try_into()
                .unwrap();
        assert_eq!(six.i23, 0.03);
    }

    #[test]
    fn test_inertia_matrix_is_symmetric() {
        let inertia = InertiaTensor::new(1.0, 1.0, 0.5, 0.1, 0.2, 0.3);
        let m = inertia.matrix();

        assert_eq!(m, m.transpose());
        assert_eq!(m[(0, 1)], 0.1);
        assert_eq!(m[(2, 2)], 0.5);
    }
}
