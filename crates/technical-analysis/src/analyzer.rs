use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use valuation_core::{stats::round_to, AnalysisError, Bar, Verdict};

use crate::indicators::*;
use crate::levels::*;

pub const MIN_BARS: usize = 20;
const NEAR_LEVEL_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalOptions {
    pub pivot_lookback: usize,
    pub zone_count: usize,
}

impl Default for TechnicalOptions {
    fn default() -> Self {
        Self { pivot_lookback: 20, zone_count: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub weight: i32,
    pub bullish: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub last_close: f64,
    pub bars_analyzed: usize,
    pub moving_averages: MovingAverages,
    pub rsi: Option<f64>,
    pub pivots: Option<PivotPoints>,
    pub zones: Vec<PriceZone>,
    pub signals: Vec<Signal>,
    /// Net signal score in [-100, 100]
    pub score: f64,
    pub bias: Verdict,
    pub reason: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TechnicalAnalysisEngine;

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Indicators, levels and a weighted directional bias from oldest-first bars.
    pub fn analyze(
        &self,
        symbol: &str,
        bars: &[Bar],
        options: &TechnicalOptions,
    ) -> Result<TechnicalSnapshot, AnalysisError> {
        if bars.len() < MIN_BARS {
            return Err(AnalysisError::InsufficientData(format!(
                "Need at least {} bars for technical analysis, got {}",
                MIN_BARS,
                bars.len()
            )));
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let last_close = closes[closes.len() - 1];

        let moving_averages = MovingAverages {
            sma_20: sma(&closes, 20),
            sma_50: sma(&closes, 50),
            sma_200: sma(&closes, 200),
            ema_12: ema(&closes, 12),
            ema_26: ema(&closes, 26),
        };
        let rsi_value = rsi(&closes, 14);
        let pivots = pivot_points(bars, options.pivot_lookback);
        let zones = price_zones(bars, options.zone_count);

        let mut signals: Vec<(&'static str, i32, bool)> = Vec::new();

        if let (Some(s20), Some(s50)) = (moving_averages.sma_20, moving_averages.sma_50) {
            if last_close > s20 && last_close > s50 {
                signals.push(("Price Above MAs", 2, true));
            } else if last_close < s20 && last_close < s50 {
                signals.push(("Price Below MAs", 2, false));
            }
        } else if let Some(s20) = moving_averages.sma_20 {
            if last_close > s20 {
                signals.push(("Price Above SMA 20", 1, true));
            } else if last_close < s20 {
                signals.push(("Price Below SMA 20", 1, false));
            }
        }

        if let (Some(s50), Some(s200)) = (moving_averages.sma_50, moving_averages.sma_200) {
            if s50 > s200 {
                signals.push(("Golden Cross", 4, true));
            } else if s50 < s200 {
                signals.push(("Death Cross", 4, false));
            }
        }

        if let (Some(e12), Some(e26)) = (moving_averages.ema_12, moving_averages.ema_26) {
            if e12 > e26 {
                signals.push(("EMA 12 Above EMA 26", 2, true));
            } else if e12 < e26 {
                signals.push(("EMA 12 Below EMA 26", 2, false));
            }
        }

        if let Some(r) = rsi_value {
            if r < 30.0 {
                signals.push(("RSI Oversold", 2, true));
            } else if r > 70.0 {
                signals.push(("RSI Overbought", 2, false));
            }
        }

        if let Some(p) = pivots {
            if last_close > 0.0 {
                if ((last_close - p.s1) / last_close * 100.0).abs() < NEAR_LEVEL_PCT {
                    signals.push(("Near Pivot Support", 2, true));
                }
                if ((p.r1 - last_close) / last_close * 100.0).abs() < NEAR_LEVEL_PCT {
                    signals.push(("Near Pivot Resistance", 2, false));
                }
            }
        }

        let mut total_score = 0;
        let mut total_weight = 0;
        for (_, weight, bullish) in &signals {
            total_weight += weight;
            total_score += if *bullish { *weight } else { -weight };
        }

        let score = if total_weight > 0 {
            total_score as f64 / total_weight as f64 * 100.0
        } else {
            0.0
        };

        let reason = if signals.is_empty() {
            "no directional signals".to_string()
        } else {
            signals
                .iter()
                .map(|(name, _, bullish)| format!("{} {}", if *bullish { "+" } else { "-" }, name))
                .collect::<Vec<_>>()
                .join(", ")
        };

        Ok(TechnicalSnapshot {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            last_close,
            bars_analyzed: bars.len(),
            moving_averages,
            rsi: rsi_value.map(|r| round_to(r, 2)),
            pivots,
            zones,
            signals: signals
                .into_iter()
                .map(|(name, weight, bullish)| Signal { name: name.to_string(), weight, bullish })
                .collect(),
            score: round_to(score, 1),
            bias: Verdict::from_score(score),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = Utc::now() - Duration::days(closes.len() as i64);
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: c,
                high: c * 1.01,
                low: c * 0.99,
                close: c,
                volume: 1_000_000.0,
            })
            .collect()
    }

    #[test]
    fn test_rejects_short_history() {
        let bars = bars_from_closes(&[100.0; 10]);
        let err = TechnicalAnalysisEngine::new()
            .analyze("ACME", &bars, &TechnicalOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_uptrend_is_bullish() {
        let closes: Vec<f64> = (0..250).map(|i| 50.0 + i as f64 * 0.5).collect();
        let snap = TechnicalAnalysisEngine::new()
            .analyze("UP", &bars_from_closes(&closes), &TechnicalOptions::default())
            .unwrap();

        assert!(snap.moving_averages.sma_200.is_some());
        assert!(snap.signals.iter().any(|s| s.name == "Golden Cross"));
        assert_eq!(snap.rsi, Some(100.0));
        assert!(snap.score > 0.0);
        assert!(matches!(snap.bias, Verdict::Buy | Verdict::StrongBuy));
        assert_eq!(snap.zones.len(), 5);
    }

    #[test]
    fn test_downtrend_is_bearish() {
        let closes: Vec<f64> = (0..250).map(|i| 300.0 - i as f64 * 0.5).collect();
        let snap = TechnicalAnalysisEngine::new()
            .analyze("DOWN", &bars_from_closes(&closes), &TechnicalOptions::default())
            .unwrap();

        assert!(snap.signals.iter().any(|s| s.name == "Death Cross"));
        assert!(snap.score < 0.0);
        assert!(matches!(snap.bias, Verdict::Sell | Verdict::StrongSell));
    }

    #[test]
    fn test_short_history_omits_long_averages() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 3) as f64).collect();
        let snap = TechnicalAnalysisEngine::new()
            .analyze("SHORT", &bars_from_closes(&closes), &TechnicalOptions { pivot_lookback: 10, zone_count: 3 })
            .unwrap();

        assert!(snap.moving_averages.sma_20.is_some());
        assert!(snap.moving_averages.sma_50.is_none());
        assert!(snap.moving_averages.sma_200.is_none());
        assert!(snap.pivots.is_some());
        assert!(snap.zones.len() <= 3);
        assert!((-100.0..=100.0).contains(&snap.score));
    }
}
