/// Vehicle physics mechanics: friction-limited cornering and braking envelopes.
/// Speeds are km/h at the API edge and m/s inside braking math.

pub const KMH_PER_MS: f64 = 3.6;

/// Maximum cornering speed (km/h) on an inclined surface with an obstacle
/// narrowing the road, clamped to `[min_kmh, max_kmh]`.
///
/// `base = sqrt(((tanA + mu) / max(1 - mu*tanA, 0.001)) * r * g)`,
/// scaled by `clamp01(1 - obstacle_width / road_width)`.
#[inline]
pub fn safe_speed_kmh(
    incline_deg: f64,
    friction: f64,
    radius: f64,
    road_width: f64,
    obstacle_width: f64,
    gravity: f64,
    min_kmh: f64,
    max_kmh: f64,
) -> f64 {
    let r = radius.max(0.1);
    let w = road_width.max(0.1);
    let mu = friction.max(0.01);
    let tan_a = incline_deg.to_radians().tan();

    let mut denom = 1.0 - mu * tan_a;
    if !denom.is_finite() || denom <= 0.001 {
        denom = 0.001;
    }
    let lateral = ((tan_a + mu) / denom * r * gravity).max(0.0);
    let base = lateral.sqrt();
    let obstacle_factor = (1.0 - obstacle_width / w).clamp(0.0, 1.0);

    let v = base * obstacle_factor * KMH_PER_MS;
    if v.is_finite() { v.clamp(min_kmh, max_kmh) } else { min_kmh }
}

/// Time-target multiplier for a segment's difficulty, clamped to `[lo, hi]`.
#[inline]
pub fn time_multiplier(
    radius: f64,
    incline_deg: f64,
    friction: f64,
    obstacle_percent: f64,
    lo: f64,
    hi: f64,
) -> f64 {
    let mut m = 1.0;
    if radius < 50.0 {
        m *= 1.8;
    } else if radius < 100.0 {
        m *= 1.5;
    } else if radius < 200.0 {
        m *= 1.2;
    }
    m *= 1.0 + (incline_deg.abs() / 45.0) * 0.4;
    m *= 1.0 + (0.8 - friction).clamp(0.0, 1.0) * 0.6;
    m *= 1.0 + obstacle_percent.max(0.0) / 100.0 * 0.4;
    m.clamp(lo, hi)
}

/// Braking deceleration (m/s²) adjusted by slope: uphill helps, downhill hurts.
#[inline]
pub fn incline_deceleration(base: f64, incline_deg: f64, gravity: f64, effect: f64) -> f64 {
    let slope = gravity * incline_deg.to_radians().sin() * effect;
    (base + slope).max(0.1)
}

/// Highest entry speed (m/s) from which braking at `decel` over `length`
/// still reaches `target` (m/s), capped at `ceiling`.
#[inline]
pub fn feasible_entry_speed(target: f64, length: f64, decel: f64, ceiling: f64) -> f64 {
    if length <= 0.1 {
        return target;
    }
    let v = (target * target + 2.0 * decel * length).max(0.0).sqrt();
    v.min(ceiling)
}
