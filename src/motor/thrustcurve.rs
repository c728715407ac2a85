//! Thrust curve loading and conditioning: raw source to tabulated curve,
//! burn-window resolution, shape-preserving reshape and window clipping.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;

use super::eng::{self, EngDescription};
use super::{FormatError, MotorError};
use crate::math::func::{FuncError, ScalarFunction};
use crate::math::interp::{Extrapolation, InterpMethod};

pub const THRUST_UNITS: (&str, &str) = ("Time (s)", "Thrust (N)");

/// Raw thrust input of a motor.
#[derive(Clone)]
pub enum ThrustSource {
    /// Constant thrust in Newtons.
    Constant(f64),
    /// Closed-form thrust as a function of time.
    Function(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
    /// Tabulated `(time, thrust)` samples.
    Samples(Vec<(f64, f64)>),
    /// Path to an `.eng` or `.csv` thrust file.
    File(PathBuf),
}

impl fmt::Debug for ThrustSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrustSource::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ThrustSource::Function(_) => f.write_str("Function"),
            ThrustSource::Samples(s) => f.debug_tuple("Samples").field(&s.len()).finish(),
            ThrustSource::File(p) => f.debug_tuple("File").field(p).finish(),
        }
    }
}

impl From<f64> for ThrustSource {
    fn from(value: f64) -> Self {
        ThrustSource::Constant(value)
    }
}

impl From<Vec<(f64, f64)>> for ThrustSource {
    fn from(samples: Vec<(f64, f64)>) -> Self {
        ThrustSource::Samples(samples)
    }
}

impl From<PathBuf> for ThrustSource {
    fn from(path: PathBuf) -> Self {
        ThrustSource::File(path)
    }
}

impl From<&Path> for ThrustSource {
    fn from(path: &Path) -> Self {
        ThrustSource::File(path.to_path_buf())
    }
}

/// Motor burn window input. A bare duration means ignition at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurnTime {
    Duration(f64),
    Window(f64, f64),
}

impl BurnTime {
    pub fn window(self) -> (f64, f64) {
        match self {
            BurnTime::Duration(d) => (0.0, d),
            BurnTime::Window(start, end) => (start, end),
        }
    }
}

impl From<f64> for BurnTime {
    fn from(duration: f64) -> Self {
        BurnTime::Duration(duration)
    }
}

impl From<(f64, f64)> for BurnTime {
    fn from((start, end): (f64, f64)) -> Self {
        BurnTime::Window(start, end)
    }
}

pub(crate) struct LoadedThrust {
    pub curve: ScalarFunction,
    /// Description fields when the source was an `.eng` file.
    pub description: Option<EngDescription>,
}

/// Builds the thrust curve from a raw source. File sources are dispatched on
/// their extension; tabulated sources get zero extrapolation outside their
/// sample range.
pub(crate) fn load(
    source: &ThrustSource,
    method: InterpMethod,
) -> Result<LoadedThrust, MotorError> {
    let (curve, description) = match source {
        ThrustSource::Constant(value) => (ScalarFunction::constant(*value), None),
        ThrustSource::Function(f) => {
            let f = f.clone();
            (ScalarFunction::from_fn(move |t| f(t)), None)
        }
        ThrustSource::Samples(pairs) => (
            ScalarFunction::from_pairs(pairs, method, Extrapolation::Zero)?,
            None,
        ),
        ThrustSource::File(path) => {
            if eng::has_eng_extension(path) {
                let eng = eng::import(path)?;
                (
                    ScalarFunction::from_pairs(&eng.points, method, Extrapolation::Zero)?,
                    Some(eng.description),
                )
            } else if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")) {
                let pairs = read_csv_thrust(path)?;
                (
                    ScalarFunction::from_pairs(&pairs, method, Extrapolation::Zero)?,
                    None,
                )
            } else {
                return Err(FormatError::UnsupportedExtension(path.to_path_buf()).into());
            }
        }
    };

    Ok(LoadedThrust {
        curve: curve.with_units(THRUST_UNITS.0, THRUST_UNITS.1),
        description,
    })
}

/// Two-column `time, thrust` CSV, tolerating a single header line.
fn read_csv_thrust(path: &Path) -> Result<Vec<(f64, f64)>, FormatError> {
    let csv_err = |source| FormatError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut pairs = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let time = record.get(0).and_then(|v| v.parse::<f64>().ok());
        let thrust = record.get(1).and_then(|v| v.parse::<f64>().ok());
        match (time, thrust) {
            (Some(time), Some(thrust)) => pairs.push((time, thrust)),
            // A single non-numeric leading line is a header
            _ if i == 0 => continue,
            _ => {
                return Err(FormatError::MalformedSample {
                    line: record.iter().collect::<Vec<_>>().join(","),
                })
            }
        }
    }

    Ok(pairs)
}

/// Resolves the burn window from an optional explicit input, falling back to
/// the thrust curve's sample range. Constant and closed-form sources have no
/// natural window and require an explicit one.
pub(crate) fn resolve_burn_window(
    burn_time: Option<BurnTime>,
    thrust: &ScalarFunction,
) -> Result<(f64, f64), MotorError> {
    let (start, end) = match burn_time {
        Some(burn_time) => burn_time.window(),
        None => thrust.domain().ok_or(MotorError::BurnTimeRequired)?,
    };

    if start >= end {
        return Err(MotorError::InvalidBurnWindow { start, end });
    }
    Ok((start, end))
}

/// Rescales a thrust curve to a new burn window and total impulse while
/// preserving its shape. Pure: the input curve is left untouched.
///
/// The sample time axis is remapped affinely so that its first and last
/// samples land exactly on the new window, then all thrust magnitudes are
/// scaled uniformly so the integral over the new window matches
/// `total_impulse`.
pub fn reshape_thrust_curve(
    thrust: &ScalarFunction,
    new_burn_time: impl Into<BurnTime>,
    total_impulse: f64,
) -> Result<ScalarFunction, MotorError> {
    let (x, y) = thrust.samples().ok_or(FuncError::NotSampled)?;
    if x.len() < 2 {
        return Err(FuncError::TooFewPoints.into());
    }

    let (start, end) = new_burn_time.into().window();
    let method = thrust.method().unwrap_or_default();
    let extrapolation = thrust.extrapolation().unwrap_or_default();

    // Adjust scale, then origin; the first and last samples land exactly on
    // the new window
    let scale = (end - start) / (x[x.len() - 1] - x[0]);
    let mut new_x: Vec<f64> = x.iter().map(|&t| t * scale).collect();
    let shift = start - new_x[0];
    for t in &mut new_x {
        *t += shift;
    }
    new_x[0] = start;
    let len = new_x.len();
    new_x[len - 1] = end;

    let remapped =
        ScalarFunction::from_samples(new_x.clone(), y.to_vec(), method, extrapolation)?;
    let old_impulse = remapped.integral(start, end);

    let rescale = total_impulse / old_impulse;
    let new_y: Vec<f64> = y.iter().map(|&v| v * rescale).collect();

    Ok(
        ScalarFunction::from_samples(new_x, new_y, method, extrapolation)?
            .with_units(THRUST_UNITS.0, THRUST_UNITS.1),
    )
}

/// Clips a thrust curve to a burn window, clamping the window to the sample
/// domain when it reaches beyond it (with a warning; this is a recoverable
/// correction). Exact boundary samples are inserted by evaluating the curve
/// at the window edges, so the returned curve's domain equals the returned
/// window even when no original sample fell there.
pub fn clip_thrust(
    thrust: &ScalarFunction,
    burn_time: (f64, f64),
) -> Result<(ScalarFunction, (f64, f64)), MotorError> {
    let (x, y) = thrust.samples().ok_or(FuncError::NotSampled)?;
    let method = thrust.method().unwrap_or_default();
    let extrapolation = thrust.extrapolation().unwrap_or_default();

    let domain = (x[0], x[x.len() - 1]);
    let used = (burn_time.0.max(domain.0), burn_time.1.min(domain.1));

    if used != burn_time {
        warn!(
            "burn time ({}, {}) s is out of the thrust source time range; \
             using ({}, {}) s instead",
            burn_time.0, burn_time.1, used.0, used.1
        );
    }

    let mut pairs = Vec::with_capacity(x.len() + 2);
    pairs.push((used.0, thrust.value(used.0)));
    pairs.extend(
        x.iter()
            .zip(y)
            .filter(|(&t, _)| t > used.0 && t < used.1)
            .map(|(&t, &v)| (t, v)),
    );
    pairs.push((used.1, thrust.value(used.1)));

    let clipped = ScalarFunction::from_pairs(&pairs, method, extrapolation)?
        .with_units(THRUST_UNITS.0, THRUST_UNITS.1);

    Ok((clipped, used))
}
