//! Correlation between per-label training frequency and per-label metrics.
//!
//! With the F-score as the metric, the Spearman coefficient computed here is
//! the Prediction Bias Coefficient: strongly positive values mean that rare
//! labels are systematically harder for the classifier. The trend line's
//! value at zero frequency is reported as the asymptotic metric value, the
//! expected score of an arbitrarily rare label.

use crate::core::constants::*;
use crate::core::error::{PredictionBiasError, Result};
use crate::core::traits::Plotter;
use crate::core::types::{nan_from_null, Label};
use crate::metrics::utils;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Number of points used to draw a fitted trend line.
const TREND_LINE_POINTS: usize = 50;

/// Least squares polynomial trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFit {
    /// Polynomial degree (1, 2 or 3)
    pub degree: usize,
    /// Coefficients in ascending power: `c0 + c1 x + c2 x^2 + ...`
    pub coefficients: Vec<f64>,
    /// Coefficient of determination of the fit
    pub r_squared: f64,
}

fn validate_degree(degree: usize) -> Result<()> {
    if degree == 0 || degree > MAX_FIT_DEGREE {
        return Err(PredictionBiasError::invalid_parameter(
            "degree",
            degree.to_string(),
            format!("must be between 1 and {}", MAX_FIT_DEGREE),
        ));
    }
    Ok(())
}

impl PolynomialFit {
    /// Fit a polynomial of the given degree to `(x, y)`.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        validate_degree(degree)?;
        check_lengths(x, y)?;
        if x.len() <= degree {
            return Err(PredictionBiasError::insufficient_data(degree + 1, x.len()));
        }

        // x is mapped onto [-1, 1] so the normal equations stay well conditioned
        // for clustered frequencies; coefficients are mapped back afterwards
        let (min_x, max_x) = x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let center = 0.5 * (min_x + max_x);
        let half_range = 0.5 * (max_x - min_x);
        if !(half_range > 0.0) {
            return Err(PredictionBiasError::numerical(
                "least squares system is singular; all x values are equal",
            ));
        }
        let t: Vec<f64> = x.iter().map(|&v| (v - center) / half_range).collect();

        // Normal equations A^T A c = A^T y over the Vandermonde matrix A of t
        let terms = degree + 1;
        let mut gram = Array2::<f64>::zeros((terms, terms));
        let mut rhs = Array1::<f64>::zeros(terms);
        for (&ti, &yi) in t.iter().zip(y) {
            let powers: Vec<f64> = (0..2 * terms - 1).map(|p| ti.powi(p as i32)).collect();
            for row in 0..terms {
                for col in 0..terms {
                    gram[[row, col]] += powers[row + col];
                }
                rhs[row] += powers[row] * yi;
            }
        }

        let scaled = solve_linear_system(gram, rhs)?;
        let coefficients = unscale_coefficients(&scaled, center, half_range);

        let mean_y = utils::mean(y);
        let total: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
        let residual: f64 = t
            .iter()
            .zip(y)
            .map(|(&ti, &yi)| (yi - evaluate_polynomial(&scaled, ti)).powi(2))
            .sum();
        let r_squared = if total > 0.0 { 1.0 - residual / total } else { 1.0 };

        Ok(PolynomialFit {
            degree,
            coefficients,
            r_squared,
        })
    }

    /// Value of the fitted polynomial at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        evaluate_polynomial(&self.coefficients, x)
    }

    /// Value of the fitted polynomial at zero frequency.
    pub fn value_at_zero(&self) -> f64 {
        self.coefficients.first().copied().unwrap_or(0.0)
    }
}

fn evaluate_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Expand `sum a_k ((x - center) / half_range)^k` into powers of `x`.
fn unscale_coefficients(scaled: &[f64], center: f64, half_range: f64) -> Vec<f64> {
    let mut coefficients = vec![0.0; scaled.len()];
    for (k, &a) in scaled.iter().enumerate() {
        let factor = a / half_range.powi(k as i32);
        // binomial = C(k, j)
        let mut binomial = 1.0;
        for (j, coefficient) in coefficients.iter_mut().enumerate().take(k + 1) {
            *coefficient += factor * binomial * (-center).powi((k - j) as i32);
            binomial *= (k - j) as f64 / (j + 1) as f64;
        }
    }
    coefficients
}

/// Gaussian elimination with partial pivoting.
fn solve_linear_system(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    let scale = a.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let tolerance = SINGULAR_PIVOT_EPSILON * scale;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);

        if a[[pivot, col]].abs() <= tolerance {
            return Err(PredictionBiasError::numerical(
                "least squares system is singular; too few distinct x values for this degree",
            ));
        }

        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(solution)
}

fn check_lengths(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(PredictionBiasError::dimension_mismatch(
            format!("{} y values to match the x values", x.len()),
            format!("{} y values", y.len()),
        ));
    }
    Ok(())
}

/// Spearman rank correlation coefficient.
///
/// Pearson correlation of the average ranks of `x` and `y`. The coefficient
/// is undefined, and `NaN` is returned, for fewer than two points or when
/// either input is constant.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    check_lengths(x, y)?;

    if x.len() < 2 {
        log::warn!("Spearman correlation is undefined for {} points", x.len());
        return Ok(f64::NAN);
    }

    let rx = utils::average_ranks(x);
    let ry = utils::average_ranks(y);
    let mx = utils::mean(&rx);
    let my = utils::mean(&ry);

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in rx.iter().zip(&ry) {
        covariance += (a - mx) * (b - my);
        var_x += (a - mx).powi(2);
        var_y += (b - my).powi(2);
    }

    if var_x < CONSTANT_INPUT_EPSILON || var_y < CONSTANT_INPUT_EPSILON {
        log::warn!("Spearman correlation is undefined for a constant input");
        return Ok(f64::NAN);
    }

    Ok((covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Axis titles of a frequency-versus-metric plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTitles {
    /// Horizontal axis (frequency)
    pub x: String,
    /// Vertical axis (metric)
    pub y: String,
}

impl AxisTitles {
    /// Create axis titles.
    pub fn new<X: Into<String>, Y: Into<String>>(x: X, y: Y) -> Self {
        AxisTitles { x: x.into(), y: y.into() }
    }
}

/// Everything a plotter needs to draw the scatter and its trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPlot {
    /// Title, including the correlation coefficient
    pub title: String,
    /// Axis titles
    pub axes: AxisTitles,
    /// Scatter x values
    pub x: Vec<f64>,
    /// Scatter y values
    pub y: Vec<f64>,
    /// Point annotations, one per point
    pub labels: Vec<Label>,
    /// Sampled `(x, fitted y)` points of the selected trend line
    pub trend_line: Vec<(f64, f64)>,
    /// Spearman coefficient shown in the title
    #[serde(deserialize_with = "nan_from_null")]
    pub correlation: f64,
}

/// Result of one correlation analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Spearman rank correlation between x and y
    #[serde(deserialize_with = "nan_from_null")]
    pub correlation: f64,
    /// Selected trend line evaluated at x = 0
    #[serde(deserialize_with = "nan_from_null")]
    pub asymptotic_value: f64,
    /// Degree of the trend line the asymptotic value comes from
    pub degree: usize,
    /// Trend lines of every degree the data supports
    pub fits: Vec<PolynomialFit>,
}

impl CorrelationResult {
    /// Fit of the selected degree.
    pub fn selected_fit(&self) -> Option<&PolynomialFit> {
        self.fits.iter().find(|f| f.degree == self.degree)
    }
}

/// Correlate a metric with label frequency.
///
/// Trend lines of degree 1 to 3 are fitted where the point count allows;
/// the fit of `degree` must succeed and provides the asymptotic value. When
/// a plotter is given it receives the annotated scatter.
pub fn analyze(
    x: &[f64],
    y: &[f64],
    labels: Option<&[Label]>,
    degree: usize,
    axes: &AxisTitles,
    plotter: Option<&mut dyn Plotter>,
) -> Result<CorrelationResult> {
    validate_degree(degree)?;
    check_lengths(x, y)?;
    if let Some(labels) = labels {
        if labels.len() != x.len() {
            return Err(PredictionBiasError::dimension_mismatch(
                format!("{} labels", x.len()),
                format!("{} labels", labels.len()),
            ));
        }
    }

    let mut fits = Vec::with_capacity(MAX_FIT_DEGREE);
    let mut selected = None;
    for d in 1..=MAX_FIT_DEGREE {
        match PolynomialFit::fit(x, y, d) {
            Ok(fit) => {
                if d == degree {
                    selected = Some(fit.value_at_zero());
                }
                fits.push(fit);
            }
            Err(err) if d == degree => return Err(err),
            Err(err) => log::debug!("Skipping degree {} trend line: {}", d, err),
        }
    }
    let asymptotic_value = selected.ok_or_else(|| {
        PredictionBiasError::numerical(format!("no trend line of degree {} was fitted", degree))
    })?;

    let correlation = spearman(x, y)?;
    let result = CorrelationResult {
        correlation,
        asymptotic_value,
        degree,
        fits,
    };

    if let Some(plotter) = plotter {
        plotter.plot(&trend_plot(x, y, labels, axes, &result));
    }

    Ok(result)
}

fn trend_plot(
    x: &[f64],
    y: &[f64],
    labels: Option<&[Label]>,
    axes: &AxisTitles,
    result: &CorrelationResult,
) -> TrendPlot {
    let max_x = x.iter().copied().fold(0.0, f64::max);
    let trend_line = match result.selected_fit() {
        Some(fit) => (0..TREND_LINE_POINTS)
            .map(|i| {
                let xi = max_x * i as f64 / (TREND_LINE_POINTS - 1) as f64;
                (xi, fit.evaluate(xi))
            })
            .collect(),
        None => Vec::new(),
    };

    TrendPlot {
        title: format!(
            "{} vs {} (Spearman {:.3})",
            axes.y, axes.x, result.correlation
        ),
        axes: axes.clone(),
        x: x.to_vec(),
        y: y.to_vec(),
        labels: labels.map(<[Label]>::to_vec).unwrap_or_default(),
        trend_line,
        correlation: result.correlation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::RecordingPlotter;
    use approx::assert_abs_diff_eq;

    fn axes() -> AxisTitles {
        AxisTitles::new("Training frequency", "F-score")
    }

    #[test]
    fn test_linear_fit_recovers_line() {
        let x = [0.1, 0.2, 0.4, 0.8];
        let y: Vec<f64> = x.iter().map(|v| 0.3 + 0.5 * v).collect();
        let fit = PolynomialFit::fit(&x, &y, 1).unwrap();
        assert_abs_diff_eq!(fit.coefficients[0], 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.coefficients[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.value_at_zero(), 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cubic_fit_recovers_polynomial() {
        let x = [0.0, 0.25, 0.5, 0.75, 1.0];
        let y: Vec<f64> = x.iter().map(|v| 0.1 - v + 2.0 * v * v + 0.5 * v * v * v).collect();
        let fit = PolynomialFit::fit(&x, &y, 3).unwrap();
        for (expected, actual) in [0.1, -1.0, 2.0, 0.5].iter().zip(&fit.coefficients) {
            assert_abs_diff_eq!(*expected, *actual, epsilon = 1e-7);
        }
        assert_abs_diff_eq!(fit.evaluate(0.5), y[2], epsilon = 1e-9);
    }

    #[test]
    fn test_least_squares_line_through_noisy_points() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.0, 2.0, 4.0];
        let fit = PolynomialFit::fit(&x, &y, 1).unwrap();
        // slope 1.5, intercept 5/6
        assert_abs_diff_eq!(fit.coefficients[1], 1.5, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.coefficients[0], 5.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_degrees() {
        let x = [0.1, 0.2, 0.3, 0.4, 0.5];
        for degree in [0, 4, 7] {
            assert!(matches!(
                PolynomialFit::fit(&x, &x, degree),
                Err(PredictionBiasError::InvalidParameter { .. })
            ));
            assert!(matches!(
                analyze(&x, &x, None, degree, &axes(), None),
                Err(PredictionBiasError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_fit_needs_enough_points() {
        let result = PolynomialFit::fit(&[0.1, 0.2], &[0.5, 0.6], 2);
        assert!(matches!(
            result,
            Err(PredictionBiasError::InsufficientData { required: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_fit_rejects_repeated_x() {
        let result = PolynomialFit::fit(&[0.2, 0.2, 0.2], &[0.1, 0.5, 0.9], 1);
        assert!(matches!(result, Err(PredictionBiasError::Numerical { .. })));
    }

    #[test]
    fn test_fit_on_clustered_rare_frequencies() {
        let x: Vec<f64> = (1..=20).map(|i| i as f64 * 0.001).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.2 + 10.0 * v).collect();

        for degree in 1..=MAX_FIT_DEGREE {
            let fit = PolynomialFit::fit(&x, &y, degree).unwrap();
            assert_abs_diff_eq!(fit.value_at_zero(), 0.2, epsilon = 1e-9);
            assert_abs_diff_eq!(fit.coefficients[1], 10.0, epsilon = 1e-5);
            assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-9);
            assert_abs_diff_eq!(fit.evaluate(0.0105), y[9] + 0.005, epsilon = 1e-9);
        }

        let result = analyze(&x, &y, None, 3, &axes(), None).unwrap();
        assert_abs_diff_eq!(result.asymptotic_value, 0.2, epsilon = 1e-9);
        assert_eq!(result.fits.len(), 3);
    }

    #[test]
    fn test_quadratic_fit_on_rare_frequencies() {
        let x: Vec<f64> = (1..=12).map(|i| 0.002 + i as f64 * 0.0015).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.1 + 5.0 * v - 50.0 * v * v).collect();

        let fit = PolynomialFit::fit(&x, &y, 2).unwrap();
        for (expected, actual) in [0.1, 5.0, -50.0].iter().zip(&fit.coefficients) {
            assert_abs_diff_eq!(*expected, *actual, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fit_rejects_rank_deficient_x() {
        // two distinct frequencies cannot determine a parabola
        let result = PolynomialFit::fit(&[0.1, 0.1, 0.2, 0.2], &[0.3, 0.4, 0.5, 0.6], 2);
        assert!(matches!(result, Err(PredictionBiasError::Numerical { .. })));

        let line = PolynomialFit::fit(&[0.1, 0.1, 0.2, 0.2], &[0.3, 0.4, 0.5, 0.6], 1).unwrap();
        assert_abs_diff_eq!(line.value_at_zero(), 0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_length_mismatch_names_both_sides() {
        let err = PolynomialFit::fit(&[0.1, 0.2, 0.3], &[0.1, 0.2], 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected 3 y values to match the x values, got 2 y values"
        );
    }

    #[test]
    fn test_spearman_perfect_monotonic() {
        let rho = spearman(&[0.1, 0.3, 0.6], &[0.2, 0.5, 0.9]).unwrap();
        assert_abs_diff_eq!(rho, 1.0, epsilon = 1e-12);

        let rho = spearman(&[0.1, 0.3, 0.6], &[0.9, 0.5, 0.2]).unwrap();
        assert_abs_diff_eq!(rho, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spearman_with_ties() {
        // ranks x: 1, 2.5, 2.5, 4; ranks y: 1, 2, 3, 4
        let rho = spearman(&[1.0, 2.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let expected = 4.5 / (4.5f64.sqrt() * 5.0f64.sqrt());
        assert_abs_diff_eq!(rho, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_spearman_undefined_cases() {
        assert!(spearman(&[0.5], &[0.5]).unwrap().is_nan());
        assert!(spearman(&[0.1, 0.2, 0.3], &[0.4, 0.4, 0.4]).unwrap().is_nan());
        assert!(spearman(&[0.1, 0.2], &[0.4]).is_err());
    }

    #[test]
    fn test_analyze_reports_asymptotic_value_of_selected_degree() {
        let x = [0.1, 0.3, 0.6];
        let y = [0.2, 0.5, 0.9];
        let result = analyze(&x, &y, None, 1, &axes(), None).unwrap();

        assert_abs_diff_eq!(result.correlation, 1.0, epsilon = 1e-12);
        let line = PolynomialFit::fit(&x, &y, 1).unwrap();
        assert_abs_diff_eq!(result.asymptotic_value, line.value_at_zero(), epsilon = 1e-12);
        // three points support degrees 1 and 2 only
        assert_eq!(result.fits.len(), 2);
        assert_eq!(result.selected_fit().map(|f| f.degree), Some(1));
    }

    #[test]
    fn test_analyze_selected_degree_must_fit() {
        let result = analyze(&[0.1, 0.3, 0.6], &[0.2, 0.5, 0.9], None, 3, &axes(), None);
        assert!(matches!(result, Err(PredictionBiasError::InsufficientData { .. })));
    }

    #[test]
    fn test_analyze_sends_plot() {
        let x = [0.1, 0.3, 0.6, 0.8];
        let y = [0.2, 0.5, 0.9, 0.95];
        let labels: Vec<Label> = ["cocoa", "grain", "acq", "earn"].iter().map(|s| s.to_string()).collect();
        let mut plotter = RecordingPlotter::default();

        analyze(
            &x,
            &y,
            Some(labels.as_slice()),
            1,
            &axes(),
            Some(&mut plotter as &mut dyn Plotter),
        ).unwrap();

        assert_eq!(plotter.plots.len(), 1);
        let plot = &plotter.plots[0];
        assert_eq!(plot.labels, labels);
        assert_eq!(plot.trend_line.len(), TREND_LINE_POINTS);
        assert_abs_diff_eq!(plot.trend_line[0].0, 0.0);
        assert!(plot.title.contains("Spearman 1.000"));
    }

    #[test]
    fn test_analyze_rejects_label_count_mismatch() {
        let labels: Vec<Label> = vec!["a".into()];
        let result = analyze(&[0.1, 0.2], &[0.3, 0.4], Some(labels.as_slice()), 1, &axes(), None);
        assert!(matches!(result, Err(PredictionBiasError::DimensionMismatch { .. })));
    }
}
