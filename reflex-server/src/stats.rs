use reflex_core::normal_cdf;

/// Mean, population standard deviation and sample count of a set of times.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub mean: f64,
    pub stdev: f64,
    pub count: u64,
}

pub fn summarize(values: &[f64]) -> Summary {
    if values.is_empty() {
        return Summary::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let stdev = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt()
    } else {
        0.0
    };
    Summary {
        mean,
        stdev,
        count: values.len() as u64,
    }
}

/// Where `user_mean` falls in the population, in percent. With no spread in
/// the population every participant sits at the median.
pub fn percentile(user_mean: f64, global_mean: f64, global_stdev: f64) -> f64 {
    if global_stdev == 0.0 || !global_stdev.is_finite() {
        return 50.0;
    }
    normal_cdf(user_mean, global_mean, global_stdev) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_population_stdev() {
        let s = summarize(&[200.0, 300.0, 400.0]);
        assert_eq!(s.count, 3);
        assert!((s.mean - 300.0).abs() < 1e-9);
        assert!((s.stdev - (20_000.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn single_value_and_empty_sets_have_zero_spread() {
        assert_eq!(
            summarize(&[350.0]),
            Summary {
                mean: 350.0,
                stdev: 0.0,
                count: 1
            }
        );
        assert_eq!(summarize(&[]), Summary::default());
    }

    #[test]
    fn percentile_follows_normal_cdf() {
        assert!((percentile(300.0, 300.0, 50.0) - 50.0).abs() < 1e-9);
        assert!((percentile(350.0, 300.0, 50.0) - 84.134_474_6).abs() < 1e-6);
        assert!(percentile(200.0, 300.0, 50.0) < 5.0);
    }

    #[test]
    fn zero_spread_population_gives_median() {
        assert_eq!(percentile(123.0, 300.0, 0.0), 50.0);
        assert_eq!(percentile(123.0, 300.0, f64::NAN), 50.0);
    }
}
