// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::Local;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use invoice_insight::{AdditiveForecaster, Config, Dashboard, Panel, Session};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let config = Config::load().context("Failed to load configuration")?;

    if args.len() > 1 && args[1] == "report" {
        // Headless mode
        init_tracing(&config.logging.filter);
        let json = args.iter().skip(2).any(|a| a == "--json");
        run_report(&config, json)?;
    } else {
        // UI mode (default); keep logs quiet so they don't tear the alternate screen
        init_tracing("warn");
        run_ui_mode(&config)?;
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_dashboard(config: &Config) -> Result<Dashboard> {
    let session = Session::new(&config.source.path);
    let today = Local::now().date_naive();
    let forecaster = AdditiveForecaster::with_interval_width(config.forecast.interval_width);

    tracing::info!(source = %session.source().display(), %today, "Opening dashboard");

    Dashboard::open(&session, today, forecaster)
        .with_context(|| format!("Failed to load invoices from {}", config.source.path.display()))
}

fn run_report(config: &Config, json: bool) -> Result<()> {
    let mut dashboard = open_dashboard(config)?;
    dashboard.run_forecast();

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard.report())?);
        return Ok(());
    }

    println!("📊 AI-Powered Invoice Analysis");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n### Invoice Data Preview ({} invoices)", dashboard.table().len());
    for invoice in dashboard.preview() {
        println!(
            "  {:<12} {:<24} {}  {}  {:>12.2}  {}",
            invoice.invoice_id,
            invoice.supplier_name,
            invoice.invoice_date,
            invoice.due_date,
            invoice.amount,
            invoice.status
        );
    }

    println!("\n### Payment Prioritization");
    match &dashboard.priorities {
        Panel::Ready { value } => {
            for row in &value.rows {
                println!(
                    "  {:<12} {:<24} {}  {:>12.2}  {}",
                    row.invoice.invoice_id,
                    row.invoice.supplier_name,
                    row.invoice.due_date,
                    row.invoice.amount,
                    row.priority
                );
            }
        }
        Panel::Failed { message } => println!("  ⚠ {}", message),
    }

    println!("\n### Anomaly Detection");
    if dashboard.anomalies.is_empty() {
        println!("  ✓ No anomalies detected.");
    }
    for finding in &dashboard.anomalies {
        println!("  ⚠ {}", finding);
    }

    println!("\n### Cash Flow Risk Forecast");
    match &dashboard.cash_flow {
        Panel::Ready { value } => {
            println!("  Total Pending Amount: {:.2}", value.total_pending);
            println!("  Amount Due Soon (within 10 days): {:.2}", value.amount_due_soon);
            println!("  Risk Level: {}", value.risk_level);
        }
        Panel::Failed { message } => println!("  ⚠ {}", message),
    }

    println!("\n### Future Payment Forecasting");
    match &dashboard.forecast {
        Some(Panel::Ready { value }) => {
            println!("  Forecasted Daily Payments for the Next 30 Days:");
            for point in value.series.future() {
                println!(
                    "  {}  {:>12.2}  [{:>12.2}, {:>12.2}]",
                    point.date, point.predicted, point.lower, point.upper
                );
            }
        }
        Some(Panel::Failed { message }) => println!("  ⚠ {}", message),
        None => {}
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let dashboard = open_dashboard(config)?;

    let mut app = ui::App::new(dashboard);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print a report: cargo run -- report");
    std::process::exit(1);
}
