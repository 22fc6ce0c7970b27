// Invoice Insight - Core Library
// Analytical core shared by the terminal dashboard, the headless report, and tests

pub mod error;
pub mod invoice;
pub mod loader;
pub mod priority;
pub mod anomaly;
pub mod cash_flow;
pub mod forecast;
pub mod dashboard;
pub mod config;

// Re-export commonly used types
pub use error::{DataLoadError, ForecastError, InvalidDateError};
pub use invoice::{
    InvoiceRecord, InvoiceStatus, InvoiceTable,
    parse_date, DATE_FORMAT, REQUIRED_COLUMNS,
};
pub use loader::{load_csv, load_from_reader, Session, TableCache};
pub use priority::{prioritize, PrioritizedInvoice, PrioritizedView, Priority};
pub use anomaly::{detect_anomalies, percentile, AnomalyFinding, HIGH_AMOUNT_QUANTILE};
pub use cash_flow::{summarize_cash_flow_risk, CashFlowRisk, RiskLevel};
pub use forecast::{
    forecast, forecast_with, daily_pending_series,
    AdditiveForecaster, AdditiveModel, DailySeries, ForecastPoint, ForecastSeries, Forecaster,
    FORECAST_HORIZON_DAYS,
};
pub use dashboard::{Dashboard, DashboardReport, ForecastOutcome, Panel};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
