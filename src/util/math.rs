use num::Float;

/// Linearly interpolates a value `t` between two points `(x1, y1)` and `(x2, y2)`.
/// `t` is clamped to `[x1, x2]`, so the result never extrapolates.
///
/// # Arguments
/// - `x1`, `x2`: The x-coordinates of the two points, `x1 < x2`.
/// - `y1`, `y2`: The y-coordinates of the two points.
/// - `t`: The x-coordinate for which the interpolated y-value is to be calculated.
pub fn interpolate<T: Float>(x1: T, x2: T, y1: T, y2: T, t: T) -> T {
    let r_t = t.max(x1).min(x2);
    y1 + (r_t - x1) * (y2 - y1) / (x2 - x1)
}

/// Evaluates a piecewise-linear curve given as `(x, y)` knots sorted by ascending `x`.
/// Values left of the first knot or right of the last knot are held constant.
///
/// # Returns
/// `None` if `knots` is empty.
pub fn piecewise_linear<T: Float>(knots: &[(T, T)], t: T) -> Option<T> {
    let (first, last) = (knots.first()?, knots.last()?);
    if t <= first.0 {
        return Some(first.1);
    }
    if t >= last.0 {
        return Some(last.1);
    }
    knots
        .windows(2)
        .find(|w| t >= w[0].0 && t <= w[1].0)
        .map(|w| interpolate(w[0].0, w[1].0, w[0].1, w[1].1, t))
}

/// Min/max normalisation of `value` into `[0, 1]` relative to `(min, max)`.
///
/// # Returns
/// `None` if `min` and `max` are effectively the same (to prevent division by zero).
pub fn normalize<T: Float>(value: T, min: T, max: T) -> Option<T> {
    if (max - min).abs() <= T::epsilon() {
        None
    } else {
        Some((value - min) / (max - min))
    }
}

/// Logistic sigmoid, mapping logits to probabilities.
pub fn sigmoid(x: f32) -> f32 { 1.0 / (1.0 + (-x).exp()) }
