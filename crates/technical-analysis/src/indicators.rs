/// Simple Moving Average series; one value per full window.
pub fn sma_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Latest Simple Moving Average, `None` with fewer than `period` points.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    Some(data[data.len() - period..].iter().sum::<f64>() / period as f64)
}

/// Exponential Moving Average series.
///
/// Seeded with the simple average of the first `period` points, then
/// smoothed with `k = 2 / (period + 1)`. The first value lines up with
/// `data[period - 1]`.
pub fn ema_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(data.len() - period + 1);
    result.push(seed);
    for &price in &data[period..] {
        let prev = result[result.len() - 1];
        result.push((price - prev) * k + prev);
    }
    result
}

/// Latest Exponential Moving Average, `None` with fewer than `period` points.
pub fn ema(data: &[f64], period: usize) -> Option<f64> {
    ema_series(data, period).last().copied()
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Relative Strength Index series with Wilder's smoothing.
///
/// The first value uses plain averages of the first `period` deltas; each
/// later delta updates the running averages as `(avg * (period - 1) + x) / period`.
pub fn rsi_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut rsi_values = Vec::with_capacity(gains.len() - period + 1);
    rsi_values.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        rsi_values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    rsi_values
}

/// Latest RSI, `None` with fewer than `period + 1` points.
pub fn rsi(data: &[f64], period: usize) -> Option<f64> {
    rsi_series(data, period).last().copied()
}
