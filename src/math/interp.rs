use itertools::{izip, Itertools};
use num_traits::Num;
use serde::{Deserialize, Serialize};

/// Interpolation scheme used between the samples of a tabulated function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpMethod {
    #[default]
    Linear,
    /// Natural cubic spline.
    Spline,
    /// Shape-preserving piecewise cubic (Akima).
    Akima,
}

/// Behaviour of a tabulated function outside its sample domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Clamp to zero outside the sample domain.
    #[default]
    Zero,
    /// Hold the first/last sample value.
    Hold,
    /// Extend the polynomial of the edge interval.
    Natural,
}

/// Cubic coefficients on one sample interval, in powers of `x - x[i]`.
pub type Cubic = [f64; 4];

#[inline]
pub fn deltas<T>(p: &[T]) -> Vec<T>
where
    T: Num + Copy,
{
    p.iter().tuple_windows().map(|(&p1, &p2)| p2 - p1).collect()
}

#[inline]
pub fn slopes<T>(dx: &[T], dy: &[T]) -> Vec<T>
where
    T: Num + Copy,
{
    izip!(dx, dy).map(|(&dx, &dy)| dy / dx).collect()
}

#[inline]
pub(crate) fn eval(c: &Cubic, u: f64) -> f64 {
    ((c[3] * u + c[2]) * u + c[1]) * u + c[0]
}

#[inline]
pub(crate) fn eval_derivative(c: &Cubic, u: f64) -> f64 {
    (3.0 * c[3] * u + 2.0 * c[2]) * u + c[1]
}

/// Antiderivative of the interval cubic at `u`, zero at `u = 0`.
#[inline]
pub(crate) fn eval_antiderivative(c: &Cubic, u: f64) -> f64 {
    (((c[3] / 4.0 * u + c[2] / 3.0) * u + c[1] / 2.0) * u + c[0]) * u
}

/// Index of the interval containing `xp`, clamped to the valid range so that
/// out-of-domain points map to the edge intervals.
pub(crate) fn interval_index(x: &[f64], xp: f64) -> usize {
    debug_assert!(x.len() >= 2);
    x.partition_point(|&v| v <= xp)
        .saturating_sub(1)
        .min(x.len() - 2)
}

/// Interval cubics for strictly increasing abscissae. Methods needing more
/// context than available (fewer than 3 samples) degrade to linear.
pub(crate) fn coefficients(method: InterpMethod, x: &[f64], y: &[f64]) -> Vec<Cubic> {
    if x.len() < 2 {
        return Vec::new();
    }

    match method {
        InterpMethod::Linear => linear_coefficients(x, y),
        InterpMethod::Spline if x.len() >= 3 => spline_coefficients(x, y),
        InterpMethod::Akima if x.len() >= 3 => akima_coefficients(x, y),
        _ => linear_coefficients(x, y),
    }
}

fn linear_coefficients(x: &[f64], y: &[f64]) -> Vec<Cubic> {
    let m = slopes(&deltas(x), &deltas(y));

    izip!(y, &m).map(|(&y, &m)| [y, m, 0.0, 0.0]).collect()
}

fn spline_coefficients(x: &[f64], y: &[f64]) -> Vec<Cubic> {
    let n = x.len();
    let h = deltas(x);
    let m = slopes(&h, &deltas(y));

    // Second derivatives at the nodes from the natural-spline tridiagonal
    // system, solved with the Thomas algorithm (boundary rows are zero).
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    for i in 1..n - 1 {
        let w = 2.0 * (h[i - 1] + h[i]) - h[i - 1] * c_prime[i - 1];
        c_prime[i] = h[i] / w;
        d_prime[i] = (6.0 * (m[i] - m[i - 1]) - h[i - 1] * d_prime[i - 1]) / w;
    }

    let mut d2 = vec![0.0; n];
    for i in (1..n - 1).rev() {
        d2[i] = d_prime[i] - c_prime[i] * d2[i + 1];
    }

    (0..n - 1)
        .map(|i| {
            [
                y[i],
                m[i] - h[i] * (2.0 * d2[i] + d2[i + 1]) / 6.0,
                d2[i] / 2.0,
                (d2[i + 1] - d2[i]) / (6.0 * h[i]),
            ]
        })
        .collect()
}

fn akima_coefficients(x: &[f64], y: &[f64]) -> Vec<Cubic> {
    let n = x.len();
    let h = deltas(x);
    let m = slopes(&h, &deltas(y));
    let k = m.len();

    // Segment slopes extended by two virtual segments on each side, so every
    // node sees four neighbouring slopes.
    let mut ext = Vec::with_capacity(k + 4);
    ext.push(3.0 * m[0] - 2.0 * m[1]);
    ext.push(2.0 * m[0] - m[1]);
    ext.extend_from_slice(&m);
    ext.push(2.0 * m[k - 1] - m[k - 2]);
    ext.push(3.0 * m[k - 1] - 2.0 * m[k - 2]);

    let t: Vec<f64> = (0..n)
        .map(|i| {
            let w1 = (ext[i + 3] - ext[i + 2]).abs();
            let w2 = (ext[i + 1] - ext[i]).abs();
            if w1 + w2 == 0.0 {
                0.5 * (ext[i + 1] + ext[i + 2])
            } else {
                (w1 * ext[i + 1] + w2 * ext[i + 2]) / (w1 + w2)
            }
        })
        .collect();

    (0..n - 1)
        .map(|i| {
            [
                y[i],
                t[i],
                (3.0 * m[i] - 2.0 * t[i] - t[i + 1]) / h[i],
                (t[i] + t[i + 1] - 2.0 * m[i]) / (h[i] * h[i]),
            ]
        })
        .collect()
}
