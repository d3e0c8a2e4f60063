#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    #[test]
    fn test_sma_series_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma_series(&data, 3);

        assert_eq!(result.len(), 3);
        assert_relative_eq!(result[0], 2.0); // (1+2+3)/3
        assert_relative_eq!(result[1], 3.0);
        assert_relative_eq!(result[2], 4.0);
    }

    #[test]
    fn test_sma_latest_matches_series() {
        let prices = sample_prices();
        let series = sma_series(&prices, 5);
        assert_eq!(series.len(), prices.len() - 4);
        assert_relative_eq!(sma(&prices, 5).unwrap(), *series.last().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(sma(&[1.0, 2.0], 5).is_none());
        assert!(sma_series(&[1.0, 2.0], 5).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_none());
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let data = vec![2.0, 4.0, 6.0, 8.0];
        let result = ema_series(&data, 3);

        assert_eq!(result.len(), 2);
        assert_relative_eq!(result[0], 4.0);
        // k = 0.5: (8 - 4) * 0.5 + 4
        assert_relative_eq!(result[1], 6.0);
    }

    #[test]
    fn test_ema_insufficient_data() {
        assert!(ema(&[], 10).is_none());
        assert!(ema(&[1.0, 2.0, 3.0], 4).is_none());
    }

    #[test]
    fn test_ema_increases_with_uptrend() {
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let result = ema_series(&data, 3);

        for pair in result.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_rsi_reference_series() {
        let prices = sample_prices();
        let result = rsi_series(&prices, 14);

        assert_eq!(result.len(), prices.len() - 14);
        for value in &result {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
        // first value over 14 deltas: avg gain 0.2386, avg loss 0.1000
        assert_relative_eq!(result[0], 70.46, epsilon = 0.05);
        // later values carry Wilder smoothing: avg = (prev * 13 + current) / 14.
        // A plain 14-delta window would give 59.81 here.
        assert_relative_eq!(result[1], 66.250, epsilon = 0.01);
        assert_relative_eq!(result[5], 57.915, epsilon = 0.01);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let data: Vec<f64> = (0..14).map(|x| x as f64).collect();
        assert!(rsi(&data, 14).is_none());
    }

    #[test]
    fn test_rsi_extremes() {
        let up: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        assert_relative_eq!(rsi(&up, 14).unwrap(), 100.0);

        let down: Vec<f64> = (1..=20).rev().map(|x| x as f64).collect();
        assert_relative_eq!(rsi(&down, 14).unwrap(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_rsi_bounded(closes in prop::collection::vec(1.0f64..1000.0, 15..120)) {
            for value in rsi_series(&closes, 14) {
                prop_assert!((0.0..=100.0).contains(&value));
            }
        }

        #[test]
        fn prop_rsi_hundred_without_losses(start in 1.0f64..500.0, steps in prop::collection::vec(0.0f64..5.0, 14..60)) {
            let mut closes = vec![start];
            for step in steps {
                let last = closes[closes.len() - 1];
                closes.push(last + step);
            }
            prop_assert_eq!(rsi(&closes, 14), Some(100.0));
        }

        #[test]
        fn prop_averages_need_full_window(closes in prop::collection::vec(1.0f64..1000.0, 0..20), period in 1usize..30) {
            if closes.len() < period {
                prop_assert!(sma(&closes, period).is_none());
                prop_assert!(ema(&closes, period).is_none());
            } else {
                prop_assert!(sma(&closes, period).is_some());
                prop_assert!(ema(&closes, period).is_some());
            }
        }
    }
}
