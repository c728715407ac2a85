use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use thiserror::Error;

use super::interp::{self, Cubic, Extrapolation, InterpMethod};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FuncError {
    #[error("sample arrays must be nonempty and of equal length")]
    BadSampleLength,

    #[error("sample abscissae must be strictly increasing")]
    NonIncreasingAbscissae,

    #[error("at least two points are required to discretize a function")]
    TooFewPoints,

    #[error("operation requires a sampled function")]
    NotSampled,
}

/// A scalar function of one real variable, built from discrete samples, a
/// closed-form callable or a constant.
///
/// Sampled functions carry an interpolation method for points inside their
/// domain and an extrapolation policy outside it. Algebraic composition
/// produces new functions of the same kind: operations between a sampled
/// function and a constant, or between two functions sampled on the same
/// grid, stay sampled (the left operand's method and extrapolation win);
/// anything else composes lazily as a callable.
#[derive(Clone)]
pub struct ScalarFunction {
    source: Source,
    units: Option<(&'static str, &'static str)>,
}

#[derive(Clone)]
enum Source {
    Constant(f64),
    Closure(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
    Sampled(Sampled),
}

#[derive(Debug, Clone)]
struct Sampled {
    x: Vec<f64>,
    y: Vec<f64>,
    method: InterpMethod,
    extrapolation: Extrapolation,
    coeffs: Vec<Cubic>,
}

/// Subdivisions used for numeric integration of closure sources.
const CLOSURE_INTEGRAL_STEPS: usize = 256;

impl Sampled {
    fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        method: InterpMethod,
        extrapolation: Extrapolation,
    ) -> Result<Self, FuncError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(FuncError::BadSampleLength);
        }
        if x.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FuncError::NonIncreasingAbscissae);
        }

        let coeffs = interp::coefficients(method, &x, &y);
        Ok(Sampled {
            x,
            y,
            method,
            extrapolation,
            coeffs,
        })
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let y: Vec<f64> = self.y.iter().map(|&y| f(y)).collect();
        let coeffs = interp::coefficients(self.method, &self.x, &y);
        Sampled {
            x: self.x.clone(),
            y,
            method: self.method,
            extrapolation: self.extrapolation,
            coeffs,
        }
    }

    fn value(&self, xp: f64) -> f64 {
        let n = self.x.len();
        if n == 1 {
            return if xp == self.x[0] {
                self.y[0]
            } else {
                match self.extrapolation {
                    Extrapolation::Zero => 0.0,
                    _ => self.y[0],
                }
            };
        }

        if xp < self.x[0] {
            match self.extrapolation {
                Extrapolation::Zero => 0.0,
                Extrapolation::Hold => self.y[0],
                Extrapolation::Natural => interp::eval(&self.coeffs[0], xp - self.x[0]),
            }
        } else if xp > self.x[n - 1] {
            match self.extrapolation {
                Extrapolation::Zero => 0.0,
                Extrapolation::Hold => self.y[n - 1],
                Extrapolation::Natural => {
                    interp::eval(&self.coeffs[n - 2], xp - self.x[n - 2])
                }
            }
        } else {
            let i = interp::interval_index(&self.x, xp);
            interp::eval(&self.coeffs[i], xp - self.x[i])
        }
    }

    fn derivative(&self, xp: f64) -> f64 {
        let n = self.x.len();
        if n == 1 {
            return 0.0;
        }

        if xp < self.x[0] || xp > self.x[n - 1] {
            match self.extrapolation {
                Extrapolation::Zero | Extrapolation::Hold => 0.0,
                Extrapolation::Natural => {
                    let i = interp::interval_index(&self.x, xp);
                    interp::eval_derivative(&self.coeffs[i], xp - self.x[i])
                }
            }
        } else {
            let i = interp::interval_index(&self.x, xp);
            interp::eval_derivative(&self.coeffs[i], xp - self.x[i])
        }
    }

    /// Integral over `[lo, hi]` with both bounds inside the sample domain.
    fn integral_inside(&self, lo: f64, hi: f64) -> f64 {
        let i0 = interp::interval_index(&self.x, lo);
        let i1 = interp::interval_index(&self.x, hi);

        if i0 == i1 {
            return interp::eval_antiderivative(&self.coeffs[i0], hi - self.x[i0])
                - interp::eval_antiderivative(&self.coeffs[i0], lo - self.x[i0]);
        }

        let mut total = interp::eval_antiderivative(&self.coeffs[i0], self.x[i0 + 1] - self.x[i0])
            - interp::eval_antiderivative(&self.coeffs[i0], lo - self.x[i0]);
        for i in i0 + 1..i1 {
            total += interp::eval_antiderivative(&self.coeffs[i], self.x[i + 1] - self.x[i]);
        }
        total + interp::eval_antiderivative(&self.coeffs[i1], hi - self.x[i1])
    }

    /// Integral contribution of an out-of-domain interval `[lo, hi]` lying
    /// entirely on one side of the domain; `edge` is the nearest interval.
    fn integral_outside(&self, lo: f64, hi: f64, edge: usize) -> f64 {
        match self.extrapolation {
            Extrapolation::Zero => 0.0,
            Extrapolation::Hold => {
                let y = if edge == 0 {
                    self.y[0]
                } else {
                    self.y[self.y.len() - 1]
                };
                y * (hi - lo)
            }
            Extrapolation::Natural => {
                let x0 = self.x[edge];
                interp::eval_antiderivative(&self.coeffs[edge], hi - x0)
                    - interp::eval_antiderivative(&self.coeffs[edge], lo - x0)
            }
        }
    }

    fn integral(&self, lower: f64, upper: f64) -> f64 {
        let n = self.x.len();
        if n == 1 {
            return match self.extrapolation {
                Extrapolation::Zero => 0.0,
                _ => self.y[0] * (upper - lower),
            };
        }

        let (a, b, sign) = if lower <= upper {
            (lower, upper, 1.0)
        } else {
            (upper, lower, -1.0)
        };

        let first = self.x[0];
        let last = self.x[n - 1];
        let mut total = 0.0;

        if a < first {
            total += self.integral_outside(a, b.min(first), 0);
        }
        if b > first && a < last {
            total += self.integral_inside(a.max(first), b.min(last));
        }
        if b > last {
            total += self.integral_outside(a.max(last), b, n - 2);
        }

        sign * total
    }
}

impl ScalarFunction {
    pub fn constant(value: f64) -> Self {
        ScalarFunction {
            source: Source::Constant(value),
            units: None,
        }
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        ScalarFunction {
            source: Source::Closure(Arc::new(f)),
            units: None,
        }
    }

    pub fn from_samples(
        x: Vec<f64>,
        y: Vec<f64>,
        method: InterpMethod,
        extrapolation: Extrapolation,
    ) -> Result<Self, FuncError> {
        Ok(ScalarFunction {
            source: Source::Sampled(Sampled::new(x, y, method, extrapolation)?),
            units: None,
        })
    }

    pub fn from_pairs(
        pairs: &[(f64, f64)],
        method: InterpMethod,
        extrapolation: Extrapolation,
    ) -> Result<Self, FuncError> {
        let (x, y) = pairs.iter().copied().unzip();
        Self::from_samples(x, y, method, extrapolation)
    }

    pub fn with_units(mut self, x: &'static str, y: &'static str) -> Self {
        self.units = Some((x, y));
        self
    }

    pub fn units(&self) -> Option<(&'static str, &'static str)> {
        self.units
    }

    pub fn is_sampled(&self) -> bool {
        matches!(self.source, Source::Sampled(_))
    }

    /// Sample arrays `(x, y)` of a tabulated function.
    pub fn samples(&self) -> Option<(&[f64], &[f64])> {
        match &self.source {
            Source::Sampled(s) => Some((&s.x, &s.y)),
            _ => None,
        }
    }

    pub fn method(&self) -> Option<InterpMethod> {
        match &self.source {
            Source::Sampled(s) => Some(s.method),
            _ => None,
        }
    }

    pub fn extrapolation(&self) -> Option<Extrapolation> {
        match &self.source {
            Source::Sampled(s) => Some(s.extrapolation),
            _ => None,
        }
    }

    /// First and last sample abscissae of a tabulated function.
    pub fn domain(&self) -> Option<(f64, f64)> {
        let (x, _) = self.samples()?;
        Some((x[0], x[x.len() - 1]))
    }

    /// Sample point `(x, y)` of the largest sample value; the earliest one
    /// wins on ties.
    pub fn max_sample(&self) -> Option<(f64, f64)> {
        let (x, y) = self.samples()?;
        let mut imax = 0;
        for (i, &v) in y.iter().enumerate() {
            if v > y[imax] {
                imax = i;
            }
        }
        Some((x[imax], y[imax]))
    }

    pub fn value(&self, x: f64) -> f64 {
        match &self.source {
            Source::Constant(c) => *c,
            Source::Closure(f) => f(x),
            Source::Sampled(s) => s.value(x),
        }
    }

    pub fn derivative(&self, x: f64) -> f64 {
        match &self.source {
            Source::Constant(_) => 0.0,
            Source::Closure(f) => {
                let h = 1e-6;
                (f(x + h) - f(x - h)) / (2.0 * h)
            }
            Source::Sampled(s) => s.derivative(x),
        }
    }

    /// Definite integral over `[lower, upper]`. Sampled sources integrate
    /// their interval polynomials exactly; closures fall back to composite
    /// Simpson quadrature.
    pub fn integral(&self, lower: f64, upper: f64) -> f64 {
        match &self.source {
            Source::Constant(c) => c * (upper - lower),
            Source::Closure(f) => simpson(f.as_ref(), lower, upper, CLOSURE_INTEGRAL_STEPS),
            Source::Sampled(s) => s.integral(lower, upper),
        }
    }

    /// Cumulative integral from the first sample, evaluated on the sample
    /// grid. The result holds its edge values outside the domain.
    pub fn integral_function(&self) -> Result<Self, FuncError> {
        let Source::Sampled(s) = &self.source else {
            return Err(FuncError::NotSampled);
        };

        let n = s.x.len();
        let mut acc = vec![0.0; n];
        for i in 0..n.saturating_sub(1) {
            let width = s.x[i + 1] - s.x[i];
            acc[i + 1] = acc[i] + interp::eval_antiderivative(&s.coeffs[i], width);
        }

        Self::from_samples(s.x.clone(), acc, s.method, Extrapolation::Hold)
    }

    /// Derivative evaluated on the sample grid.
    pub fn derivative_function(&self) -> Result<Self, FuncError> {
        let Source::Sampled(s) = &self.source else {
            return Err(FuncError::NotSampled);
        };

        let n = s.x.len();
        let y: Vec<f64> = (0..n)
            .map(|i| {
                if i < n - 1 {
                    interp::eval_derivative(&s.coeffs[i], 0.0)
                } else {
                    interp::eval_derivative(&s.coeffs[n - 2], s.x[n - 1] - s.x[n - 2])
                }
            })
            .collect();

        Self::from_samples(s.x.clone(), y, s.method, s.extrapolation)
    }

    /// Resample onto `points` evenly spaced abscissae over `[lower, upper]`.
    pub fn discretize(
        &self,
        lower: f64,
        upper: f64,
        points: usize,
        method: InterpMethod,
        extrapolation: Extrapolation,
    ) -> Result<Self, FuncError> {
        if points < 2 {
            return Err(FuncError::TooFewPoints);
        }

        let step = (upper - lower) / (points - 1) as f64;
        let x: Vec<f64> = (0..points)
            .map(|i| {
                // The last point lands exactly on the bound
                if i == points - 1 {
                    upper
                } else {
                    lower + step * i as f64
                }
            })
            .collect();
        let y: Vec<f64> = x.iter().map(|&x| self.value(x)).collect();

        Self::from_samples(x, y, method, extrapolation)
    }

    /// Resample onto another tabulated function's exact grid, inheriting its
    /// interpolation method and extrapolation policy. A model without samples
    /// leaves the function unchanged.
    pub fn resample_like(&self, model: &ScalarFunction) -> Self {
        let Source::Sampled(m) = &model.source else {
            return self.clone();
        };

        let y: Vec<f64> = m.x.iter().map(|&x| self.value(x)).collect();
        let sampled = Sampled::new(m.x.clone(), y, m.method, m.extrapolation)
            .expect("model grid is already validated");

        ScalarFunction {
            source: Source::Sampled(sampled),
            units: self.units,
        }
    }

    fn combine(&self, rhs: &ScalarFunction, op: fn(f64, f64) -> f64) -> ScalarFunction {
        let source = match (&self.source, &rhs.source) {
            (Source::Constant(a), Source::Constant(b)) => Source::Constant(op(*a, *b)),
            (Source::Sampled(s), Source::Constant(c)) => {
                let c = *c;
                Source::Sampled(s.map(|y| op(y, c)))
            }
            (Source::Constant(c), Source::Sampled(s)) => {
                let c = *c;
                Source::Sampled(s.map(|y| op(c, y)))
            }
            (Source::Sampled(a), Source::Sampled(b)) if a.x == b.x => {
                let y: Vec<f64> = a.y.iter().zip(&b.y).map(|(&l, &r)| op(l, r)).collect();
                let coeffs = interp::coefficients(a.method, &a.x, &y);
                Source::Sampled(Sampled {
                    x: a.x.clone(),
                    y,
                    method: a.method,
                    extrapolation: a.extrapolation,
                    coeffs,
                })
            }
            _ => {
                let l = self.clone();
                let r = rhs.clone();
                Source::Closure(Arc::new(move |t| op(l.value(t), r.value(t))))
            }
        };

        ScalarFunction {
            source,
            units: None,
        }
    }
}

fn simpson(f: &(dyn Fn(f64) -> f64 + Send + Sync), lower: f64, upper: f64, steps: usize) -> f64 {
    debug_assert!(steps % 2 == 0);
    if lower == upper {
        return 0.0;
    }

    let h = (upper - lower) / steps as f64;
    let mut total = f(lower) + f(upper);
    for i in 1..steps {
        let w = if i % 2 == 0 { 2.0 } else { 4.0 };
        total += w * f(lower + h * i as f64);
    }
    total * h / 3.0
}

impl fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Constant(c) => f.debug_tuple("Constant").field(c).finish(),
            Source::Closure(_) => f.write_str("Closure"),
            Source::Sampled(s) => f
                .debug_struct("Sampled")
                .field("points", &s.x.len())
                .field("method", &s.method)
                .field("extrapolation", &s.extrapolation)
                .finish(),
        }
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $fn:ident, $op:expr) => {
        impl $trait<&ScalarFunction> for &ScalarFunction {
            type Output = ScalarFunction;

            fn $fn(self, rhs: &ScalarFunction) -> ScalarFunction {
                self.combine(rhs, $op)
            }
        }

        impl $trait<f64> for &ScalarFunction {
            type Output = ScalarFunction;

            fn $fn(self, rhs: f64) -> ScalarFunction {
                self.combine(&ScalarFunction::constant(rhs), $op)
            }
        }

        impl $trait<&ScalarFunction> for f64 {
            type Output = ScalarFunction;

            fn $fn(self, rhs: &ScalarFunction) -> ScalarFunction {
                ScalarFunction::constant(self).combine(rhs, $op)
            }
        }
    };
}

impl_binary_op!(Add, add, |a, b| a + b);
impl_binary_op!(Sub, sub, |a, b| a - b);
impl_binary_op!(Mul, mul, |a, b| a * b);
impl_binary_op!(Div, div, |a, b| a / b);

impl Neg for &ScalarFunction {
    type Output = ScalarFunction;

    fn neg(self) -> ScalarFunction {
        self * -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear(pairs: &[(f64, f64)]) -> ScalarFunction {
        ScalarFunction::from_pairs(pairs, InterpMethod::Linear, Extrapolation::Zero).unwrap()
    }

    #[test]
    fn test_from_samples_validation() {
        assert_eq!(
            ScalarFunction::from_samples(vec![], vec![], InterpMethod::Linear, Extrapolation::Zero)
                .unwrap_err(),
            FuncError::BadSampleLength
        );
        assert_eq!(
            ScalarFunction::from_samples(
                vec![0.0, 1.0],
                vec![1.0],
                InterpMethod::Linear,
                Extrapolation::Zero
            )
            .unwrap_err(),
            FuncError::BadSampleLength
        );
        assert_eq!(
            ScalarFunction::from_samples(
                vec![0.0, 0.0, 1.0],
                vec![1.0, 2.0, 3.0],
                InterpMethod::Linear,
                Extrapolation::Zero
            )
            .unwrap_err(),
            FuncError::NonIncreasingAbscissae
        );
    }

    #[test]
    fn test_value_and_extrapolation() {
        let f = linear(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);

        assert_relative_eq!(f.value(0.5), 1.0);
        assert_relative_eq!(f.value(1.5), 1.0);
        assert_relative_eq!(f.value(-1.0), 0.0);
        assert_relative_eq!(f.value(3.0), 0.0);

        let f = ScalarFunction::from_pairs(
            &[(0.0, 1.0), (1.0, 3.0)],
            InterpMethod::Linear,
            Extrapolation::Hold,
        )
        .unwrap();
        assert_relative_eq!(f.value(-2.0), 1.0);
        assert_relative_eq!(f.value(5.0), 3.0);

        let f = ScalarFunction::from_pairs(
            &[(0.0, 1.0), (1.0, 3.0)],
            InterpMethod::Linear,
            Extrapolation::Natural,
        )
        .unwrap();
        assert_relative_eq!(f.value(2.0), 5.0);
        assert_relative_eq!(f.value(-1.0), -1.0);
    }

    #[test]
    fn test_integral_linear() {
        let f = linear(&[(0.0, 0.0), (2.0, 2.0)]);

        assert_relative_eq!(f.integral(0.0, 2.0), 2.0);
        assert_relative_eq!(f.integral(0.0, 1.0), 0.5);
        assert_relative_eq!(f.integral(2.0, 0.0), -2.0);
        // Zero extrapolation contributes nothing outside the domain
        assert_relative_eq!(f.integral(-1.0, 3.0), 2.0);
    }

    #[test]
    fn test_integral_hold_extrapolation() {
        let f = ScalarFunction::from_pairs(
            &[(0.0, 1.0), (1.0, 1.0)],
            InterpMethod::Linear,
            Extrapolation::Hold,
        )
        .unwrap();

        assert_relative_eq!(f.integral(-1.0, 2.0), 3.0);
    }

    #[test]
    fn test_integral_spline_of_parabola() {
        // Spline through y = x^2 integrates close to 1/3 on [0, 1]
        let x: Vec<f64> = (0..21).map(|i| i as f64 / 20.0).collect();
        let y: Vec<f64> = x.iter().map(|&x| x * x).collect();
        let f =
            ScalarFunction::from_samples(x, y, InterpMethod::Spline, Extrapolation::Zero).unwrap();

        assert_relative_eq!(f.integral(0.0, 1.0), 1.0 / 3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_integral_function() {
        let f = linear(&[(0.0, 1.0), (1.0, 1.0), (3.0, 3.0)]);
        let cumulative = f.integral_function().unwrap();

        assert_relative_eq!(cumulative.value(0.0), 0.0);
        assert_relative_eq!(cumulative.value(1.0), 1.0);
        assert_relative_eq!(cumulative.value(3.0), 5.0);
        // Holds edge values outside the domain
        assert_relative_eq!(cumulative.value(10.0), 5.0);
        assert_relative_eq!(cumulative.value(-1.0), 0.0);
    }

    #[test]
    fn test_derivative_function() {
        let f = linear(&[(0.0, 0.0), (1.0, 2.0), (2.0, 2.0)]);
        let d = f.derivative_function().unwrap();

        assert_relative_eq!(d.value(0.0), 2.0);
        assert_relative_eq!(d.value(0.5), 1.0); // linear interp of slopes 2 and 0
        assert_relative_eq!(d.value(1.0), 0.0);
        assert_relative_eq!(d.value(2.0), 0.0);
    }

    #[test]
    fn test_closure_integral() {
        let f = ScalarFunction::from_fn(|t| t.sin());

        assert_relative_eq!(
            f.integral(0.0, std::f64::consts::PI),
            2.0,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_algebra_sampled_and_constant() {
        let f = linear(&[(0.0, 1.0), (1.0, 3.0)]);
        let g = &f * 2.0;

        assert!(g.is_sampled());
        assert_relative_eq!(g.value(0.5), 4.0);

        let h = &g + 1.0;
        assert_relative_eq!(h.value(1.0), 7.0);

        let neg = -&f;
        assert_relative_eq!(neg.value(1.0), -3.0);

        let swapped = 10.0 - &f;
        assert_relative_eq!(swapped.value(0.0), 9.0);
    }

    #[test]
    fn test_algebra_same_grid() {
        let f = linear(&[(0.0, 1.0), (1.0, 2.0)]);
        let g = linear(&[(0.0, 3.0), (1.0, 4.0)]);
        let sum = &f + &g;

        assert!(sum.is_sampled());
        assert_relative_eq!(sum.value(0.0), 4.0);
        assert_relative_eq!(sum.value(1.0), 6.0);
    }

    #[test]
    fn test_algebra_mismatched_grids_composes() {
        let f = linear(&[(0.0, 1.0), (1.0, 2.0)]);
        let g = linear(&[(0.0, 3.0), (0.5, 4.0), (1.0, 4.0)]);
        let sum = &f + &g;

        assert!(!sum.is_sampled());
        assert_relative_eq!(sum.value(0.5), 1.5 + 4.0);
    }

    #[test]
    fn test_discretize() {
        let f = ScalarFunction::constant(5.0);
        let d = f
            .discretize(0.0, 2.0, 5, InterpMethod::Linear, Extrapolation::Zero)
            .unwrap();

        let (x, y) = d.samples().unwrap();
        assert_eq!(x.len(), 5);
        assert_relative_eq!(x[0], 0.0);
        assert_relative_eq!(x[4], 2.0);
        assert!(y.iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_resample_like() {
        let model = linear(&[(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)]);
        let f = ScalarFunction::constant(3.0).resample_like(&model);

        let (x, y) = f.samples().unwrap();
        assert_eq!(x, model.samples().unwrap().0);
        assert!(y.iter().all(|&v| v == 3.0));
    }

    #[test]
    fn test_max_sample() {
        let f = linear(&[(0.0, 1.0), (1.0, 5.0), (2.0, 5.0), (3.0, 2.0)]);

        assert_eq!(f.max_sample(), Some((1.0, 5.0)));
    }
}
