//! Support and resistance: floor-trader pivots and histogram price zones.

use serde::{Deserialize, Serialize};
use valuation_core::Bar;

/// Classic floor-trader pivot levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotPoints {
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl PivotPoints {
    pub fn from_hlc(high: f64, low: f64, close: f64) -> Self {
        let pivot = (high + low + close) / 3.0;
        Self {
            high,
            low,
            close,
            pivot,
            r1: 2.0 * pivot - low,
            s1: 2.0 * pivot - high,
            r2: pivot + (high - low),
            s2: pivot - (high - low),
            r3: high + 2.0 * (pivot - low),
            s3: low - 2.0 * (high - pivot),
        }
    }
}

/// Pivots from the highest high, lowest low and last close of the most
/// recent `lookback` bars (all bars when fewer are available).
pub fn pivot_points(bars: &[Bar], lookback: usize) -> Option<PivotPoints> {
    if bars.is_empty() || lookback == 0 {
        return None;
    }
    let recent = &bars[bars.len().saturating_sub(lookback)..];
    let high = recent.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = recent.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let close = recent[recent.len() - 1].close;
    Some(PivotPoints::from_hlc(high, low, close))
}

pub const ZONE_BUCKETS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Support,
    Resistance,
}

/// A price band where highs, lows and closes cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceZone {
    pub low: f64,
    pub high: f64,
    pub mid: f64,
    pub touches: usize,
    pub kind: ZoneKind,
}

/// Bucket every high, low and close across `bars` into 100 equal-width bins
/// spanning the min-max range and return the `top` most visited bins,
/// busiest first. Zones below the last close are support, the rest resistance.
pub fn price_zones(bars: &[Bar], top: usize) -> Vec<PriceZone> {
    if bars.is_empty() || top == 0 {
        return vec![];
    }

    let values: Vec<f64> = bars.iter().flat_map(|b| [b.high, b.low, b.close]).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let last_close = bars[bars.len() - 1].close;

    let kind_for = |mid: f64| if mid < last_close { ZoneKind::Support } else { ZoneKind::Resistance };

    if max <= min {
        return vec![PriceZone { low: min, high: max, mid: min, touches: values.len(), kind: kind_for(min) }];
    }

    let width = (max - min) / ZONE_BUCKETS as f64;
    let mut counts = vec![0usize; ZONE_BUCKETS];
    for v in &values {
        let idx = (((v - min) / width).floor() as usize).min(ZONE_BUCKETS - 1);
        counts[idx] += 1;
    }

    let mut ranked: Vec<(usize, usize)> = counts.into_iter().enumerate().filter(|(_, c)| *c > 0).collect();
    // stable: equal counts keep ascending price order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(top)
        .map(|(idx, touches)| {
            let low = min + idx as f64 * width;
            let high = low + width;
            let mid = (low + high) / 2.0;
            PriceZone { low, high, mid, touches, kind: kind_for(mid) }
        })
        .collect()
}
