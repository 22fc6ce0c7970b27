// 🔍 Anomaly Detector - duplicate invoice ids + unusually high amounts
// Two independent checks, each producing at most one finding.

use crate::invoice::InvoiceTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Amounts strictly above this quantile of the table are flagged
pub const HIGH_AMOUNT_QUANTILE: f64 = 0.95;

// ============================================================================
// FINDING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "invoice_ids")]
pub enum AnomalyFinding {
    /// Every occurrence of every repeated id, in source order
    DuplicateInvoice(Vec<String>),

    /// Ids whose amount exceeds the high-amount threshold, in source order
    HighAmount(Vec<String>),
}

impl AnomalyFinding {
    pub fn invoice_ids(&self) -> &[String] {
        match self {
            AnomalyFinding::DuplicateInvoice(ids) | AnomalyFinding::HighAmount(ids) => ids,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AnomalyFinding::DuplicateInvoice(_) => "Duplicate invoices",
            AnomalyFinding::HighAmount(_) => "Unusually high amounts",
        }
    }
}

impl fmt::Display for AnomalyFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyFinding::DuplicateInvoice(ids) => {
                write!(f, "Duplicate invoices detected: {}", ids.join(", "))
            }
            AnomalyFinding::HighAmount(ids) => {
                write!(
                    f,
                    "Unusually high amounts detected in invoices: {}",
                    ids.join(", ")
                )
            }
        }
    }
}

// ============================================================================
// PERCENTILE
// ============================================================================

/// Quantile `q` in [0, 1] by linear interpolation between closest ranks
/// (Hyndman & Fan type 7, the numpy/pandas default):
/// `h = (n - 1) * q`, result = `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
/// Returns `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = h - lower as f64;

    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

// ============================================================================
// DETECTOR
// ============================================================================

/// Findings in fixed order: duplicates first, then high amounts.
/// An empty list means the table is clean.
pub fn detect_anomalies(table: &InvoiceTable) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();

    if let Some(duplicates) = check_duplicates(table) {
        findings.push(duplicates);
    }

    if let Some(high_amounts) = check_high_amounts(table) {
        findings.push(high_amounts);
    }

    debug!(findings = findings.len(), "Anomaly scan complete");

    findings
}

fn check_duplicates(table: &InvoiceTable) -> Option<AnomalyFinding> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for invoice in table.iter() {
        *counts.entry(invoice.invoice_id.as_str()).or_insert(0) += 1;
    }

    let duplicated: Vec<String> = table
        .iter()
        .filter(|invoice| counts[invoice.invoice_id.as_str()] >= 2)
        .map(|invoice| invoice.invoice_id.clone())
        .collect();

    if duplicated.is_empty() {
        None
    } else {
        Some(AnomalyFinding::DuplicateInvoice(duplicated))
    }
}

fn check_high_amounts(table: &InvoiceTable) -> Option<AnomalyFinding> {
    let amounts: Vec<f64> = table.iter().map(|invoice| invoice.amount).collect();
    let threshold = percentile(&amounts, HIGH_AMOUNT_QUANTILE)?;

    debug!(threshold, "High-amount threshold");

    let flagged: Vec<String> = table
        .iter()
        .filter(|invoice| invoice.amount > threshold)
        .map(|invoice| invoice.invoice_id.clone())
        .collect();

    if flagged.is_empty() {
        None
    } else {
        Some(AnomalyFinding::HighAmount(flagged))
    }
}

// ============================================================================
// TESTS
// ============================================================================
