//! Normal-distribution helpers and the truncated Gaussian curve used by the
//! distribution charts. Reaction times cannot be negative, so the density is
//! cut at zero and renormalized by the mass that remains above it.

use std::f64::consts::{PI, SQRT_2};

/// Number of uniform steps between 0 and `mean + 4 * stdev`.
pub const CURVE_STEPS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

/// Standard deviation used for plotting. Missing, zero, negative or
/// non-finite values collapse to 1.
pub fn effective_stdev(stdev: Option<f64>) -> f64 {
    match stdev {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => 1.0,
    }
}

pub fn normal_pdf(x: f64, mean: f64, stdev: f64) -> f64 {
    let z = (x - mean) / stdev;
    (-0.5 * z * z).exp() / (stdev * (2.0 * PI).sqrt())
}

pub fn normal_cdf(x: f64, mean: f64, stdev: f64) -> f64 {
    0.5 * libm::erfc(-(x - mean) / (stdev * SQRT_2))
}

/// `1 - cdf(x)`, computed without cancellation in the far tail.
fn upper_tail(x: f64, mean: f64, stdev: f64) -> f64 {
    0.5 * libm::erfc((x - mean) / (stdev * SQRT_2))
}

/// Samples the Gaussian density truncated at zero on `[0, mean + 4 * stdev]`.
///
/// Always returns `CURVE_STEPS + 1` points with non-decreasing `x`, the first
/// at 0 and the last exactly at the upper bound.
pub fn distribution_curve(mean: f64, stdev: f64) -> Vec<CurvePoint> {
    let stdev = effective_stdev(Some(stdev));
    let mean = if mean.is_finite() { mean } else { 0.0 };

    let mut end = mean + 4.0 * stdev;
    if !(end > 0.0) {
        end = 4.0 * stdev;
    }
    // huge inputs overflow the bound
    let end = end.min(f64::MAX);
    let step = end / CURVE_STEPS as f64;

    let mass = upper_tail(0.0, mean, stdev);
    let norm = if mass > f64::MIN_POSITIVE { mass } else { 1.0 };

    (0..=CURVE_STEPS)
        .map(|i| {
            let x = match i {
                0 => 0.0,
                CURVE_STEPS => end,
                _ => i as f64 * step,
            };
            CurvePoint {
                x,
                y: normal_pdf(x, mean, stdev) / norm,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trapezoid(points: &[CurvePoint]) -> f64 {
        points
            .windows(2)
            .map(|w| (w[1].x - w[0].x) * (w[0].y + w[1].y) * 0.5)
            .sum()
    }

    #[test]
    fn cdf_is_half_at_mean() {
        assert!((normal_cdf(300.0, 300.0, 50.0) - 0.5).abs() < 1e-12);
        assert!(normal_cdf(150.0, 300.0, 50.0) < 0.01);
        assert!(normal_cdf(450.0, 300.0, 50.0) > 0.99);
    }

    #[test]
    fn pdf_peaks_at_mean() {
        let peak = normal_pdf(300.0, 300.0, 50.0);
        assert!(peak > normal_pdf(299.0, 300.0, 50.0));
        assert!(peak > normal_pdf(301.0, 300.0, 50.0));
        assert!((peak - 1.0 / (50.0 * (2.0 * PI).sqrt())).abs() < 1e-15);
    }

    #[test]
    fn typical_curve_has_51_points_ending_at_four_sigma() {
        let curve = distribution_curve(300.0, 50.0);
        assert_eq!(curve.len(), 51);
        assert_eq!(curve[0].x, 0.0);
        assert!((curve[50].x - 500.0).abs() < 1e-9);
        assert!(curve.iter().all(|p| p.y.is_finite()));
        let total: f64 = curve.iter().map(|p| p.y).sum();
        assert!(total.is_finite() && total > 0.0);
    }

    #[test]
    fn curve_integrates_to_about_one() {
        let curve = distribution_curve(300.0, 50.0);
        assert!((trapezoid(&curve) - 1.0).abs() < 0.01);
    }

    #[test]
    fn curve_shape_holds_for_valid_inputs() {
        for &mean in &[1.0, 50.0, 180.0, 300.0, 750.0, 4000.0] {
            for &stdev in &[0.5, 1.0, 25.0, 90.0, 400.0] {
                let curve = distribution_curve(mean, stdev);
                assert_eq!(curve.len(), CURVE_STEPS + 1);
                assert_eq!(curve[0].x, 0.0, "mean={mean} stdev={stdev}");
                assert!(curve.windows(2).all(|w| w[0].x <= w[1].x));
                assert!(curve.iter().all(|p| p.y >= 0.0 && p.y.is_finite()));
            }
        }

        // mean + 4 * stdev overflows here
        for (mean, stdev) in [(1e308, 1e308), (f64::MAX, 1.0), (1.0, 1e308)] {
            let curve = distribution_curve(mean, stdev);
            assert_eq!(curve.len(), CURVE_STEPS + 1);
            assert_eq!(curve[0].x, 0.0, "mean={mean} stdev={stdev}");
            assert!(curve.iter().all(|p| p.x.is_finite()));
            assert!(curve.windows(2).all(|w| w[0].x <= w[1].x));
            assert!(curve.iter().all(|p| p.y >= 0.0 && p.y.is_finite()));
        }
    }

    #[test]
    fn truncation_lifts_density_when_mass_is_cut() {
        // Half the mass sits below zero when the mean is zero.
        let curve = distribution_curve(0.0, 10.0);
        let untruncated = normal_pdf(0.0, 0.0, 10.0);
        assert!((curve[0].y - 2.0 * untruncated).abs() < 1e-12);
    }

    #[test]
    fn degenerate_stdev_is_treated_as_one() {
        for stdev in [0.0, -3.0, f64::NAN] {
            let curve = distribution_curve(10.0, stdev);
            assert!((curve[50].x - 14.0).abs() < 1e-9);
            assert!(curve.iter().all(|p| p.y.is_finite()));
        }
    }

    #[test]
    fn negative_upper_bound_falls_back_to_four_sigma() {
        let curve = distribution_curve(-500.0, 10.0);
        assert_eq!(curve[0].x, 0.0);
        assert!((curve[50].x - 40.0).abs() < 1e-9);
        assert!(curve.iter().all(|p| p.y.is_finite() && p.y >= 0.0));
    }

    #[test]
    fn effective_stdev_defaults_missing_values() {
        assert_eq!(effective_stdev(None), 1.0);
        assert_eq!(effective_stdev(Some(0.0)), 1.0);
        assert_eq!(effective_stdev(Some(f64::INFINITY)), 1.0);
        assert_eq!(effective_stdev(Some(42.5)), 42.5);
    }
}
