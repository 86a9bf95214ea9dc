//! Statistics Calculator Module
//! Summary statistics over a (parameter, year) slice and a value's position in that range.

use serde::{Deserialize, Serialize};

/// Summary of the valid values in one slice. Every field is `None` only for an empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub median: Option<f64>,
}

/// Handles the statistical calculations behind the map and summary panel.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute min, max, mean and median.
    ///
    /// The median of an even-length set is the mean of the two central values.
    pub fn compute_statistics(values: &[f64]) -> Statistics {
        let n = values.len();
        if n == 0 {
            return Statistics::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let avg = sorted.iter().sum::<f64>() / n as f64;
        let middle = n / 2;
        let median = if n % 2 == 0 {
            (sorted[middle - 1] + sorted[middle]) / 2.0
        } else {
            sorted[middle]
        };

        Statistics {
            min: Some(sorted[0]),
            max: Some(sorted[n - 1]),
            avg: Some(avg),
            median: Some(median),
        }
    }

    /// Statistics over the present values of an optional series.
    pub fn compute_statistics_present(values: impl IntoIterator<Item = Option<f64>>) -> Statistics {
        let valid: Vec<f64> = values.into_iter().flatten().collect();
        Self::compute_statistics(&valid)
    }

    /// Where `value` sits between the slice minimum and maximum, in percent.
    ///
    /// Returns 50 for a degenerate range and 0 when the value or the range is missing.
    pub fn position_in_range(value: Option<f64>, stats: &Statistics) -> f64 {
        let (Some(value), Some(min), Some(max)) = (value, stats.min, stats.max) else {
            return 0.0;
        };
        if max == min {
            return 50.0;
        }
        ((value - min) / (max - min)) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_count() {
        let stats = StatsCalculator::compute_statistics(&[30.0, 10.0, 20.0]);
        assert_eq!(
            stats,
            Statistics {
                min: Some(10.0),
                max: Some(30.0),
                avg: Some(20.0),
                median: Some(20.0),
            }
        );
    }

    #[test]
    fn test_even_count_median_averages_center() {
        let stats = StatsCalculator::compute_statistics(&[10.0, 40.0, 20.0, 30.0]);
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(40.0));
        assert_eq!(stats.avg, Some(25.0));
        assert_eq!(stats.median, Some(25.0));
    }

    #[test]
    fn test_empty_set_is_all_none() {
        assert_eq!(StatsCalculator::compute_statistics(&[]), Statistics::default());
        assert_eq!(
            StatsCalculator::compute_statistics_present([None, None]),
            Statistics::default()
        );
    }

    #[test]
    fn test_single_value() {
        let stats = StatsCalculator::compute_statistics(&[7.5]);
        assert_eq!(stats.min, Some(7.5));
        assert_eq!(stats.max, Some(7.5));
        assert_eq!(stats.median, Some(7.5));
    }

    #[test]
    fn test_ordering_holds_for_assorted_sets() {
        let sets: [&[f64]; 5] = [
            &[1.0],
            &[5.0, -3.0, 2.5],
            &[100.0, 100.0, 100.0, 1.0],
            &[0.1, 0.2, 0.3, 1e6, -1e6, 42.0],
            &[3.0, 3.0],
        ];
        for values in sets {
            let s = StatsCalculator::compute_statistics(values);
            let (min, max) = (s.min.unwrap(), s.max.unwrap());
            assert!(min <= s.avg.unwrap() && s.avg.unwrap() <= max, "{values:?}");
            assert!(min <= s.median.unwrap() && s.median.unwrap() <= max, "{values:?}");
        }
    }

    #[test]
    fn test_present_values_skip_missing() {
        let stats = StatsCalculator::compute_statistics_present([Some(4.0), None, Some(2.0)]);
        assert_eq!(stats.median, Some(3.0));
    }

    #[test]
    fn test_position_in_range() {
        let stats = StatsCalculator::compute_statistics(&[10.0, 20.0]);
        assert_eq!(StatsCalculator::position_in_range(Some(15.0), &stats), 50.0);
        assert_eq!(StatsCalculator::position_in_range(Some(20.0), &stats), 100.0);
        assert_eq!(StatsCalculator::position_in_range(None, &stats), 0.0);

        let flat = StatsCalculator::compute_statistics(&[5.0]);
        assert_eq!(StatsCalculator::position_in_range(Some(5.0), &flat), 50.0);
        assert_eq!(
            StatsCalculator::position_in_range(Some(5.0), &Statistics::default()),
            0.0
        );
    }
}
