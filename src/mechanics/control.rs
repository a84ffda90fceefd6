/// Control mechanics: proportional updates and rubber-band error.

/// First-order lag toward `target` with gain `rate * dt` (saturates at 1).
#[inline]
pub fn lag(x: f64, target: f64, rate: f64, dt: f64) -> f64 {
    let k = (rate * dt).clamp(0.0, 1.0);
    x + k * (target - x)
}

/// Linear interpolation `a + (b - a) * t` with `t` limited to [0, 1].
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

#[inline]
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Move `x` by `step`, with `|step|` limited to `max_step`, then clamp.
#[inline]
pub fn bounded_step(x: f64, step: f64, max_step: f64, lo: f64, hi: f64) -> f64 {
    let m = max_step.abs();
    (x + step.clamp(-m, m)).clamp(lo, hi)
}

/// Rubber-band error Δp = (1 - skill) * (ideal - actual) / max(ideal, 0.1),
/// limited to [-1, 1]. Positive when the player is slower than the ideal.
#[inline]
pub fn rubber_band_error(skill: f64, ideal_speed: f64, actual_speed: f64) -> f64 {
    let k = clamp01(skill);
    let dp = (1.0 - k) * ((ideal_speed - actual_speed) / ideal_speed.max(0.1));
    if dp.is_finite() { dp.clamp(-1.0, 1.0) } else { 0.0 }
}
