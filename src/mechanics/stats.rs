//! Time-series statistics for behavioural correlation.

/// Z-score normalisation (mean 0, unit sample variance).
/// Series shorter than 2 are returned as-is; near-constant series become all zeros.
pub fn zscore(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return data.to_vec();
    }
    let mean = data.iter().sum::<f64>() / n as f64;
    let ss: f64 = data.iter().map(|v| (v - mean) * (v - mean)).sum();
    let sd = (ss / (n - 1) as f64).sqrt();
    if !(sd >= 1e-4) {
        return vec![0.0; n];
    }
    data.iter().map(|v| (v - mean) / sd).collect()
}

/// Best shifted Pearson correlation of two equal-length series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShiftedCorrelation {
    pub value: f64,
    pub shift: i32,
}

/// Scans every integer shift in `[-max_shift, max_shift]`, scoring
/// `sum(x[i] * y[i + shift]) / max(valid - 1, 1)` over overlapping indices of
/// the z-scored series, and keeps the highest score (first wins on ties).
/// Empty or mismatched inputs give zero.
pub fn best_shifted_correlation(x: &[f64], y: &[f64], max_shift: usize) -> ShiftedCorrelation {
    let n = x.len();
    if n == 0 || n != y.len() {
        return ShiftedCorrelation::default();
    }
    let xn = zscore(x);
    let yn = zscore(y);
    let max_shift = max_shift.min(i32::MAX as usize) as i32;

    let mut best: Option<ShiftedCorrelation> = None;
    for shift in -max_shift..=max_shift {
        let mut sum = 0.0;
        let mut valid = 0usize;
        for (i, xv) in xn.iter().enumerate() {
            let j = i as i64 + shift as i64;
            if j >= 0 && (j as usize) < n {
                sum += xv * yn[j as usize];
                valid += 1;
            }
        }
        if valid == 0 {
            continue;
        }
        let corr = sum / (valid.saturating_sub(1).max(1)) as f64;
        if best.is_none_or(|b| corr > b.value) {
            best = Some(ShiftedCorrelation { value: corr, shift });
        }
    }

    let best = best.unwrap_or_default();
    let value = if best.value.is_finite() { best.value.clamp(-1.0, 1.0) } else { 0.0 };
    ShiftedCorrelation { value, shift: best.shift }
}

/// Sum of absolute successive differences over the last `span` values.
pub fn recent_abs_delta_sum(history: &[f64], span: usize) -> f64 {
    let start = history.len().saturating_sub(span);
    history[start..].windows(2).map(|w| (w[1] - w[0]).abs()).sum()
}

#[inline]
pub fn mean(data: &[f64]) -> Option<f64> {
    (!data.is_empty()).then(|| data.iter().sum::<f64>() / data.len() as f64)
}
