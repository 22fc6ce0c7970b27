// 🖥️ Dashboard orchestration
// Runs each component against the session's table and turns component failures
// into inline warnings. Only a load failure stops the dashboard. The forecast is
// computed only when asked for.

use crate::anomaly::{detect_anomalies, AnomalyFinding};
use crate::cash_flow::{summarize_cash_flow_risk, CashFlowRisk};
use crate::error::DataLoadError;
use crate::forecast::{forecast_with, AdditiveForecaster, AdditiveModel, ForecastSeries};
use crate::invoice::{InvoiceRecord, InvoiceTable};
use crate::loader::Session;
use crate::priority::{prioritize, PrioritizedView};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

/// Rows shown in the data preview
pub const PREVIEW_ROWS: usize = 5;

// ============================================================================
// PANEL
// ============================================================================

/// One rendered section: a value, or the message to show in its place
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready { value: T },
    Failed { message: String },
}

impl<T> Panel<T> {
    fn from_result<E: Display>(name: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Panel::Ready { value },
            Err(e) => {
                warn!(panel = name, error = %e, "Panel failed");
                Panel::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Panel::Ready { value } => Some(value),
            Panel::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Panel::Ready { .. } => None,
            Panel::Failed { message } => Some(message),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastOutcome {
    #[serde(skip)]
    pub model: AdditiveModel,
    pub series: ForecastSeries,
}

type EagerPanels = (Panel<PrioritizedView>, Vec<AnomalyFinding>, Panel<CashFlowRisk>);

fn render_eager(table: &InvoiceTable, today: NaiveDate) -> EagerPanels {
    let priorities = Panel::from_result("priorities", prioritize(table, today));
    let anomalies = detect_anomalies(table);
    let cash_flow = Panel::from_result("cash_flow", summarize_cash_flow_risk(table, today));

    info!(
        invoices = table.len(),
        anomalies = anomalies.len(),
        today = %today,
        "Dashboard rendered"
    );

    (priorities, anomalies, cash_flow)
}

// ============================================================================
// DASHBOARD
// ============================================================================

#[derive(Debug)]
pub struct Dashboard {
    table: Arc<InvoiceTable>,
    today: NaiveDate,
    forecaster: AdditiveForecaster,

    pub priorities: Panel<PrioritizedView>,
    pub anomalies: Vec<AnomalyFinding>,
    pub cash_flow: Panel<CashFlowRisk>,

    /// `None` until the forecast has been requested
    pub forecast: Option<Panel<ForecastOutcome>>,
}

impl Dashboard {
    /// Load the session's table and render the eager panels
    pub fn open(
        session: &Session,
        today: NaiveDate,
        forecaster: AdditiveForecaster,
    ) -> Result<Self, DataLoadError> {
        let table = session.load()?;
        Ok(Self::from_table(table, today, forecaster))
    }

    pub fn from_table(table: Arc<InvoiceTable>, today: NaiveDate, forecaster: AdditiveForecaster) -> Self {
        let (priorities, anomalies, cash_flow) = render_eager(&table, today);
        Dashboard {
            table,
            today,
            forecaster,
            priorities,
            anomalies,
            cash_flow,
            forecast: None,
        }
    }

    /// Recompute prioritization, anomalies and cash-flow risk against `today`.
    /// The table stays cached; a previous forecast is kept since it does not depend on the date.
    pub fn refresh(&mut self, today: NaiveDate) {
        let (priorities, anomalies, cash_flow) = render_eager(&self.table, today);
        self.today = today;
        self.priorities = priorities;
        self.anomalies = anomalies;
        self.cash_flow = cash_flow;
    }

    /// The one expensive step, triggered by the user
    pub fn run_forecast(&mut self) -> &Panel<ForecastOutcome> {
        let result = forecast_with(&self.forecaster, &self.table)
            .map(|(model, series)| ForecastOutcome { model, series });
        self.forecast.insert(Panel::from_result("forecast", result))
    }

    pub fn table(&self) -> &InvoiceTable {
        &self.table
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Coverage of the forecast band, e.g. 0.8 for 80%
    pub fn interval_width(&self) -> f64 {
        self.forecaster.interval_width()
    }

    pub fn preview(&self) -> &[InvoiceRecord] {
        self.table.preview(PREVIEW_ROWS)
    }

    pub fn report(&self) -> DashboardReport<'_> {
        DashboardReport {
            today: self.today,
            invoice_count: self.table.len(),
            preview: self.preview(),
            priorities: &self.priorities,
            anomalies: &self.anomalies,
            cash_flow: &self.cash_flow,
            forecast: self.forecast.as_ref(),
        }
    }
}

/// Everything the dashboard currently shows, for headless output
#[derive(Debug, Serialize)]
pub struct DashboardReport<'a> {
    pub today: NaiveDate,
    pub invoice_count: usize,
    pub preview: &'a [InvoiceRecord],
    pub priorities: &'a Panel<PrioritizedView>,
    pub anomalies: &'a [AnomalyFinding],
    pub cash_flow: &'a Panel<CashFlowRisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<&'a Panel<ForecastOutcome>>,
}

// ============================================================================
// TESTS
// ============================================================================
