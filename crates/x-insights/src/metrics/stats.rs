//! Small descriptive statistics over `f64` slices.

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Arithmetic mean, 0 for empty input.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the mean of the two middle values for even lengths. 0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

/// Nearest-rank percentile: index `floor((n - 1) * q)` of the ascending
/// sort, clamped to the slice. 0 for empty input.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let last = sorted.len() - 1;
    let rank = ((last as f64) * q).floor();
    let index = if rank.is_nan() || rank < 0.0 {
        0
    } else {
        (rank as usize).min(last)
    };
    sorted[index]
}

/// Pearson correlation coefficient.
///
/// `None` when the slices differ in length, hold fewer than three points, or
/// either variable is constant.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 3 {
        return None;
    }

    let x_mean = average(xs);
    let y_mean = average(ys);

    let mut numerator = 0.0;
    let mut x_variance = 0.0;
    let mut y_variance = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        numerator += dx * dy;
        x_variance += dx * dx;
        y_variance += dy * dy;
    }

    let denominator = (x_variance * y_variance).sqrt();
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Relative change in percent. `None` when `previous` is zero.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}
