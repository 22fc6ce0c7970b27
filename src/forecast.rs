// 📈 Forecaster - daily pending volume, additive trend + weekly seasonality
//
// Pipeline: Pending invoices → per-day totals (gaps kept) → fit → predict
// every historical date plus a fixed horizon of future days.
//
// The fitting algorithm sits behind the `Forecaster` trait so it can be swapped
// without touching the dashboard.

use crate::error::{ForecastError, InvalidDateError};
use crate::invoice::InvoiceTable;
use chrono::{Datelike, Duration, NaiveDate};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Days predicted past the last historical date
pub const FORECAST_HORIZON_DAYS: u32 = 30;

/// Default coverage of the uncertainty band
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.8;

/// Weekly seasonality is only fitted once the history spans two weeks
const MIN_SPAN_FOR_WEEKLY_DAYS: i64 = 14;

/// Singular values below this fraction of the largest count as zero
const RANK_TOLERANCE: f64 = 1e-10;

// ============================================================================
// DAILY SERIES
// ============================================================================

/// Summed amounts per calendar day, ascending, one entry per distinct date.
/// Days without data are absent, not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DailySeries {
    /// Build from arbitrary (date, amount) pairs; same-day amounts are summed
    pub fn from_observations(observations: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (date, amount) in observations {
            *by_day.entry(date).or_insert(0.0) += amount;
        }
        Self {
            points: by_day.into_iter().collect(),
        }
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }
}

/// Pending invoices grouped by `Invoice_Date`
pub fn daily_pending_series(table: &InvoiceTable) -> Result<DailySeries, InvalidDateError> {
    let observations = table
        .pending()
        .map(|(row, invoice)| Ok((invoice.parse_invoice_date(row)?, invoice.amount)))
        .collect::<Result<Vec<_>, InvalidDateError>>()?;

    Ok(DailySeries::from_observations(observations))
}

// ============================================================================
// FORECAST SERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,

    /// Observed value, present only for historical dates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
}

/// Predictions for the fitted history followed by the horizon, dates strictly ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
    history_len: usize,
}

impl ForecastSeries {
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rows for dates that were in the fitted history
    pub fn history(&self) -> &[ForecastPoint] {
        &self.points[..self.history_len]
    }

    /// Rows past the last historical date
    pub fn future(&self) -> &[ForecastPoint] {
        &self.points[self.history_len..]
    }
}

// ============================================================================
// FORECASTER INTERFACE
// ============================================================================

pub trait Forecaster {
    type Model;

    fn fit(&self, series: &DailySeries) -> Result<Self::Model, ForecastError>;

    fn predict(&self, model: &Self::Model, horizon_days: u32) -> Result<ForecastSeries, ForecastError>;
}

// ============================================================================
// ADDITIVE MODEL
// ============================================================================

/// y(t) = intercept + slope·t + weekly[weekday(t)] + ε
///
/// Trend and weekday effects come from one least-squares solve over the design
/// `[1, t, weekday indicators]`, so uneven weekday coverage cannot leak into the slope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdditiveModel {
    pub history: DailySeries,
    pub origin: NaiveDate,

    /// Level averaged over the observed weekdays
    pub intercept: f64,
    pub slope: f64,

    /// Additive effect per weekday (Monday = 0), centred on observed weekdays
    pub weekly: Option<[f64; 7]>,

    /// Residual standard deviation
    pub sigma: f64,

    /// Two-sided normal quantile for the interval width
    pub z: f64,

    /// Weekdays seen in the history when weekly effects are fitted; the first is the baseline
    observed_days: Vec<u32>,

    #[serde(skip)]
    coefficients: DVector<f64>,

    /// (XᵀX)⁻¹ of the fitted design
    #[serde(skip)]
    unscaled_covariance: DMatrix<f64>,
}

impl AdditiveModel {
    /// Point prediction at `date`
    pub fn predict_at(&self, date: NaiveDate) -> f64 {
        design_row(date, self.origin, &self.observed_days).dot(&self.coefficients)
    }

    /// Half-width of the prediction band at `date`; widens away from the fitted span
    pub fn band_at(&self, date: NaiveDate) -> f64 {
        let row = design_row(date, self.origin, &self.observed_days);
        let leverage = row.dot(&(&self.unscaled_covariance * &row));
        self.z * self.sigma * (1.0 + leverage.max(0.0)).sqrt()
    }
}

/// One row of the design matrix. Weekdays never seen in the history get the
/// average of the observed effects.
fn design_row(date: NaiveDate, origin: NaiveDate, observed_days: &[u32]) -> DVector<f64> {
    let seasonal_days = observed_days.get(1..).unwrap_or(&[]);
    let mut row = DVector::zeros(2 + seasonal_days.len());
    row[0] = 1.0;
    row[1] = (date - origin).num_days() as f64;

    let weekday = date.weekday().num_days_from_monday();
    if observed_days.contains(&weekday) {
        if let Some(col) = seasonal_days.iter().position(|d| *d == weekday) {
            row[2 + col] = 1.0;
        }
    } else if !observed_days.is_empty() {
        let share = 1.0 / observed_days.len() as f64;
        row.rows_mut(2, seasonal_days.len()).fill(share);
    }

    row
}

struct LeastSquares {
    coefficients: DVector<f64>,
    unscaled_covariance: DMatrix<f64>,
    sse: f64,
    dof: usize,
}

/// `None` when the design is rank deficient
fn solve_least_squares(series: &DailySeries, origin: NaiveDate, observed_days: &[u32]) -> Option<LeastSquares> {
    let rows: Vec<DVector<f64>> = series
        .points()
        .iter()
        .map(|(date, _)| design_row(*date, origin, observed_days))
        .collect();
    let n = rows.len();
    let p = 2 + observed_days.len().saturating_sub(1);

    let design = DMatrix::from_fn(n, p, |i, j| rows[i][j]);
    let ys = DVector::from_iterator(n, series.points().iter().map(|(_, y)| *y));

    let svd = design.clone().svd(true, true);
    let eps = svd.singular_values.max() * RANK_TOLERANCE;
    if svd.rank(eps) < p {
        return None;
    }

    let coefficients = svd.solve(&ys, eps).ok()?;
    let unscaled_covariance = (design.transpose() * &design).try_inverse()?;
    let residuals = &ys - &design * &coefficients;

    Some(LeastSquares {
        coefficients,
        unscaled_covariance,
        sse: residuals.norm_squared(),
        dof: n.saturating_sub(p),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdditiveForecaster {
    interval_width: f64,
}

impl AdditiveForecaster {
    pub fn new() -> Self {
        Self::with_interval_width(DEFAULT_INTERVAL_WIDTH)
    }

    /// `interval_width` must lie in (0, 1); anything else fails at fit time
    pub fn with_interval_width(interval_width: f64) -> Self {
        Self { interval_width }
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }
}

impl Default for AdditiveForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AdditiveForecaster {
    type Model = AdditiveModel;

    fn fit(&self, series: &DailySeries) -> Result<AdditiveModel, ForecastError> {
        let (origin, last) = match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) if series.len() >= 2 => (first, last),
            _ => {
                return Err(ForecastError::InsufficientData {
                    distinct_dates: series.len(),
                })
            }
        };

        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::Fitting(format!(
                "interval width must be in (0, 1), got {}",
                self.interval_width
            )));
        }

        if series.points().iter().any(|(_, y)| !y.is_finite()) {
            return Err(ForecastError::Fitting("series contains non-finite amounts".to_string()));
        }

        // Weekday columns need a two-week span and must leave a residual degree of freedom
        let mut weekdays: Vec<u32> = series
            .points()
            .iter()
            .map(|(date, _)| date.weekday().num_days_from_monday())
            .collect();
        weekdays.sort_unstable();
        weekdays.dedup();

        let weekly_fit = if (last - origin).num_days() >= MIN_SPAN_FOR_WEEKLY_DAYS
            && weekdays.len() > 1
            && series.len() > weekdays.len() + 1
        {
            solve_least_squares(series, origin, &weekdays).map(|fit| (weekdays, fit))
        } else {
            None
        };

        let (observed_days, fit) = match weekly_fit {
            Some(found) => found,
            None => {
                let fit = solve_least_squares(series, origin, &[])
                    .ok_or_else(|| ForecastError::Fitting("degenerate time axis".to_string()))?;
                (Vec::new(), fit)
            }
        };

        // Baseline weekday has effect 0; report effects centred on their mean
        let effects: Vec<f64> = std::iter::once(0.0)
            .chain(fit.coefficients.iter().skip(2).copied())
            .take(observed_days.len())
            .collect();
        let centre = if effects.is_empty() {
            0.0
        } else {
            effects.iter().sum::<f64>() / effects.len() as f64
        };
        let weekly = (!observed_days.is_empty()).then(|| {
            let mut weekly = [0.0; 7];
            for (day, effect) in observed_days.iter().zip(&effects) {
                weekly[*day as usize] = effect - centre;
            }
            weekly
        });

        let sigma = if fit.dof > 0 {
            (fit.sse / fit.dof as f64).sqrt()
        } else {
            0.0
        };

        let model = AdditiveModel {
            history: series.clone(),
            origin,
            intercept: fit.coefficients[0] + centre,
            slope: fit.coefficients[1],
            weekly,
            sigma,
            z: normal_quantile(0.5 + self.interval_width / 2.0),
            observed_days,
            coefficients: fit.coefficients,
            unscaled_covariance: fit.unscaled_covariance,
        };

        let estimates = [model.intercept, model.slope, model.sigma, model.z];
        if estimates.iter().chain(model.coefficients.iter()).any(|v| !v.is_finite()) {
            return Err(ForecastError::Fitting(format!(
                "non-finite estimate (intercept={}, slope={}, sigma={}, z={})",
                model.intercept, model.slope, model.sigma, model.z
            )));
        }

        debug!(
            intercept = model.intercept,
            slope = model.slope,
            sigma = model.sigma,
            weekly = model.weekly.is_some(),
            "Fitted additive model"
        );

        Ok(model)
    }

    fn predict(&self, model: &AdditiveModel, horizon_days: u32) -> Result<ForecastSeries, ForecastError> {
        let last = model
            .history
            .last_date()
            .ok_or(ForecastError::InsufficientData { distinct_dates: 0 })?;

        let future = (1..=i64::from(horizon_days))
            .map(|d| {
                last.checked_add_signed(Duration::days(d)).ok_or_else(|| {
                    ForecastError::Fitting(format!(
                        "forecast horizon runs past the last representable date after {}",
                        last
                    ))
                })
            })
            .collect::<Result<Vec<_>, ForecastError>>()?;

        let history = model.history.points().iter().map(|(date, y)| (*date, Some(*y)));

        let points: Vec<ForecastPoint> = history
            .chain(future.into_iter().map(|date| (date, None)))
            .map(|(date, actual)| {
                let predicted = model.predict_at(date);
                let band = model.band_at(date);
                ForecastPoint {
                    date,
                    predicted,
                    lower: predicted - band,
                    upper: predicted + band,
                    actual,
                }
            })
            .collect();

        Ok(ForecastSeries {
            points,
            history_len: model.history.len(),
        })
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Fit with `forecaster` and predict the standard horizon; returns the model for plotting
pub fn forecast_with<F: Forecaster>(
    forecaster: &F,
    table: &InvoiceTable,
) -> Result<(F::Model, ForecastSeries), ForecastError> {
    let series = daily_pending_series(table)?;
    let model = forecaster.fit(&series)?;
    let prediction = forecaster.predict(&model, FORECAST_HORIZON_DAYS)?;

    info!(
        history_days = series.len(),
        rows = prediction.len(),
        "Forecast complete"
    );

    Ok((model, prediction))
}

/// Forecast pending volume with the default additive model
pub fn forecast(table: &InvoiceTable) -> Result<ForecastSeries, ForecastError> {
    forecast_with(&AdditiveForecaster::new(), table).map(|(_, series)| series)
}

// ============================================================================
// NORMAL DISTRIBUTION
// ============================================================================

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    let tail = 0.5 * erfc(x.abs() / std::f64::consts::SQRT_2);
    if x >= 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Complementary error function for `x >= 0`, relative error around 1e-12
fn erfc(x: f64) -> f64 {
    let frac_2_sqrt_pi = std::f64::consts::FRAC_2_SQRT_PI;

    if x < 2.5 {
        // erf(x) = 2/√π · e^(-x²) · Σ (2x²)ⁿ x / (1·3·…·(2n+1)), all terms positive
        let mut term = x;
        let mut sum = x;
        for n in 1..200 {
            term *= 2.0 * x * x / (2 * n + 1) as f64;
            sum += term;
            if term <= sum * 1e-17 {
                break;
            }
        }
        1.0 - frac_2_sqrt_pi * (-x * x).exp() * sum
    } else {
        // Continued fraction, evaluated from the tail
        let mut f = x;
        for k in (1..=60).rev() {
            f = x + (k as f64 / 2.0) / f;
        }
        frac_2_sqrt_pi / 2.0 * (-x * x).exp() / f
    }
}

/// Inverse standard normal CDF, |error| < 1e-9.
/// Acklam's rational approximation followed by one Halley step against `normal_cdf`.
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155922734e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let x = if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    };

    let e = normal_cdf(x) - p;
    let u = e * (2.0 * std::f64::consts::PI).sqrt() * (x * x / 2.0).exp();
    x - u / (1.0 + x * u / 2.0)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceRecord, InvoiceStatus};
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_invoice(invoice_date: NaiveDate, amount: f64, status: InvoiceStatus) -> InvoiceRecord {
        InvoiceRecord {
            invoice_id: format!("INV-{}", invoice_date),
            supplier_name: "Supplier".to_string(),
            invoice_date: invoice_date.format("%Y-%m-%d").to_string(),
            due_date: (invoice_date + Duration::days(30)).format("%Y-%m-%d").to_string(),
            amount,
            status,
        }
    }

    fn linear_table(days: i64) -> InvoiceTable {
        let start = date(2024, 1, 1);
        InvoiceTable::new(
            (0..days)
                .map(|d| {
                    create_test_invoice(
                        start + Duration::days(d),
                        100.0 + 10.0 * d as f64,
                        InvoiceStatus::Pending,
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_daily_series_groups_and_keeps_gaps() {
        let table = InvoiceTable::new(vec![
            create_test_invoice(date(2024, 1, 10), 5.0, InvoiceStatus::Pending),
            create_test_invoice(date(2024, 1, 1), 10.0, InvoiceStatus::Pending),
            create_test_invoice(date(2024, 1, 1), 15.0, InvoiceStatus::Pending),
            create_test_invoice(date(2024, 1, 3), 99.0, InvoiceStatus::Paid),
            create_test_invoice(date(2024, 1, 3), 7.0, InvoiceStatus::Pending),
        ]);

        let series = daily_pending_series(&table).unwrap();

        assert_eq!(
            series.points(),
            &[
                (date(2024, 1, 1), 25.0),
                (date(2024, 1, 3), 7.0),
                (date(2024, 1, 10), 5.0),
            ]
        );
    }

    #[test]
    fn test_single_date_is_insufficient() {
        let table = InvoiceTable::new(vec![
            create_test_invoice(date(2024, 1, 1), 10.0, InvoiceStatus::Pending),
            create_test_invoice(date(2024, 1, 1), 20.0, InvoiceStatus::Pending),
            create_test_invoice(date(2024, 1, 2), 20.0, InvoiceStatus::Paid),
        ]);

        match forecast(&table) {
            Err(ForecastError::InsufficientData { distinct_dates }) => assert_eq!(distinct_dates, 1),
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_table_is_insufficient() {
        assert!(matches!(
            forecast(&InvoiceTable::default()),
            Err(ForecastError::InsufficientData { distinct_dates: 0 })
        ));
    }

    #[test]
    fn test_row_count_and_strictly_ascending_dates() {
        let table = InvoiceTable::new(vec![
            create_test_invoice(date(2024, 1, 1), 10.0, InvoiceStatus::Pending),
            create_test_invoice(date(2024, 1, 3), 30.0, InvoiceStatus::Pending),
            create_test_invoice(date(2024, 1, 3), 5.0, InvoiceStatus::Pending),
            create_test_invoice(date(2024, 1, 9), 12.0, InvoiceStatus::Pending),
        ]);

        let series = forecast(&table).unwrap();

        assert_eq!(series.len(), 3 + FORECAST_HORIZON_DAYS as usize);
        assert_eq!(series.history().len(), 3);
        assert_eq!(series.future().len(), 30);
        assert!(series.points().windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(series.future()[0].date, date(2024, 1, 10));
        assert_eq!(series.future()[29].date, date(2024, 2, 8));
    }

    #[test]
    fn test_linear_history_extrapolates_exactly() {
        let table = linear_table(5);

        let series = forecast(&table).unwrap();

        // Day offset 5 is the first future day
        let first_future = &series.future()[0];
        assert!((first_future.predicted - 150.0).abs() < 1e-6);
        assert!((first_future.upper - first_future.lower).abs() < 1e-6);

        for point in series.history() {
            let actual = point.actual.unwrap();
            assert!((point.predicted - actual).abs() < 1e-6);
        }
        assert!(series.future().iter().all(|p| p.actual.is_none()));
    }

    #[test]
    fn test_bounds_contain_prediction_and_widen() {
        let start = date(2024, 1, 1);
        let noise = [3.0, -5.0, 4.0, -2.0, 6.0, -4.0, 1.0, -3.0];
        let table = InvoiceTable::new(
            noise
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    create_test_invoice(
                        start + Duration::days(i as i64),
                        200.0 + e,
                        InvoiceStatus::Pending,
                    )
                })
                .collect(),
        );

        let series = forecast(&table).unwrap();

        for point in series.points() {
            assert!(point.lower < point.predicted);
            assert!(point.predicted < point.upper);
        }

        let future = series.future();
        let first_width = future[0].upper - future[0].lower;
        let last_width = future[29].upper - future[29].lower;
        assert!(last_width > first_width);
    }

    #[test]
    fn test_weekly_seasonality_detected() {
        // 2024-01-01 is a Monday; weekends carry an extra 50
        let start = date(2024, 1, 1);
        let table = InvoiceTable::new(
            (0..28)
                .map(|d| {
                    let day = start + Duration::days(d);
                    let weekend = day.weekday().num_days_from_monday() >= 5;
                    let amount = if weekend { 150.0 } else { 100.0 };
                    create_test_invoice(day, amount, InvoiceStatus::Pending)
                })
                .collect(),
        );

        let (model, series) = forecast_with(&AdditiveForecaster::new(), &table).unwrap();

        assert!(model.weekly.is_some());

        let monday = series.future().iter().find(|p| p.date == date(2024, 1, 29)).unwrap();
        let saturday = series.future().iter().find(|p| p.date == date(2024, 2, 3)).unwrap();
        assert!(saturday.predicted - monday.predicted > 40.0);
    }

    #[test]
    fn test_short_history_skips_weekly() {
        let (model, _) = forecast_with(&AdditiveForecaster::new(), &linear_table(7)).unwrap();
        assert!(model.weekly.is_none());
    }

    #[test]
    fn test_invalid_interval_width_is_fitting_error() {
        let forecaster = AdditiveForecaster::with_interval_width(1.0);
        assert!(matches!(
            forecast_with(&forecaster, &linear_table(4)),
            Err(ForecastError::Fitting(_))
        ));
    }

    #[test]
    fn test_invalid_invoice_date_on_pending_row() {
        let mut bad = create_test_invoice(date(2024, 1, 2), 10.0, InvoiceStatus::Pending);
        bad.invoice_date = "2024/01/02".to_string();
        let table = InvoiceTable::new(vec![
            create_test_invoice(date(2024, 1, 1), 10.0, InvoiceStatus::Pending),
            bad,
        ]);

        match forecast(&table) {
            Err(ForecastError::InvalidDate(err)) => {
                assert_eq!(err.row, 1);
                assert_eq!(err.field, "Invoice_Date");
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_trend_and_weekly_fitted_jointly() {
        // y = 100 + 2t + 60 on Saturdays; the first two Saturdays are missing
        let start = date(2024, 1, 1);
        let table = InvoiceTable::new(
            (0..21)
                .map(|t| (t, start + Duration::days(t)))
                .filter(|(t, day)| day.weekday() != Weekday::Sat || *t >= 14)
                .map(|(t, day)| {
                    let saturday = if day.weekday() == Weekday::Sat { 60.0 } else { 0.0 };
                    create_test_invoice(day, 100.0 + 2.0 * t as f64 + saturday, InvoiceStatus::Pending)
                })
                .collect(),
        );

        let (model, series) = forecast_with(&AdditiveForecaster::new(), &table).unwrap();

        assert!((model.slope - 2.0).abs() < 1e-6);
        assert!(model.sigma < 1e-6);
        let weekly = model.weekly.unwrap();
        assert!((weekly[5] - weekly[0] - 60.0).abs() < 1e-6);
        for point in series.history() {
            assert!((point.predicted - point.actual.unwrap()).abs() < 1e-6);
        }

        let monday = series.future().iter().find(|p| p.date == date(2024, 1, 22)).unwrap();
        let saturday = series.future().iter().find(|p| p.date == date(2024, 1, 27)).unwrap();
        assert!((saturday.predicted - monday.predicted - 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_horizon_past_last_representable_date_is_fitting_error() {
        let mut first = create_test_invoice(date(2024, 1, 1), 10.0, InvoiceStatus::Pending);
        first.invoice_date = "262142-12-01".to_string();
        let mut second = create_test_invoice(date(2024, 1, 1), 20.0, InvoiceStatus::Pending);
        second.invoice_date = "262142-12-20".to_string();
        let table = InvoiceTable::new(vec![first, second]);

        match forecast(&table) {
            Err(ForecastError::Fitting(message)) => assert!(message.contains("horizon")),
            other => panic!("expected Fitting, got {:?}", other),
        }
    }

    #[test]
    fn test_normal_quantile() {
        assert!((normal_quantile(0.9) - 1.2815515655446004).abs() < 1e-9);
        assert!((normal_quantile(0.975) - 1.9599639845400540).abs() < 1e-9);
        assert!(normal_quantile(0.5).abs() < 1e-12);
        assert!((normal_quantile(0.01) + 2.3263478740408408).abs() < 1e-9);
        assert!((normal_quantile(1e-6) + 4.7534243088228989).abs() < 1e-9);
        assert!(normal_quantile(1.0).is_nan());
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-15);
        assert!((normal_cdf(1.959963984540054) - 0.975).abs() < 1e-12);
        assert!((normal_cdf(-3.0) - 0.0013498980316300946).abs() < 1e-15);
        assert!((normal_cdf(-6.0) - 9.865876450376981e-10).abs() < 1e-18);
    }
}
