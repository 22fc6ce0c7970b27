// 💰 Cash-Flow Risk Summarizer
// Totals pending invoices and flags risk when most of the pending money is due soon.

use crate::error::InvalidDateError;
use crate::invoice::InvoiceTable;
use crate::priority::MEDIUM_PRIORITY_DAYS;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Pending invoices due in fewer days than this count as "due soon"
pub const DUE_SOON_DAYS: i64 = MEDIUM_PRIORITY_DAYS;

/// Share of the pending total that, once exceeded by the due-soon amount, means High risk
pub const RISK_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    /// `due_soon > share * total`. At a zero total this is `due_soon > 0`.
    pub fn classify(total_pending: f64, amount_due_soon: f64) -> Self {
        if amount_due_soon > RISK_SHARE * total_pending {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Low => "Low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRisk {
    pub total_pending: f64,
    pub amount_due_soon: f64,
    pub risk_level: RiskLevel,
}

/// Only Pending invoices have their due dates parsed; a malformed one fails the summary.
pub fn summarize_cash_flow_risk(
    table: &InvoiceTable,
    today: NaiveDate,
) -> Result<CashFlowRisk, InvalidDateError> {
    let mut total_pending = 0.0;
    let mut amount_due_soon = 0.0;

    for (row, invoice) in table.pending() {
        total_pending += invoice.amount;

        if invoice.due_in_days(row, today)? < DUE_SOON_DAYS {
            amount_due_soon += invoice.amount;
        }
    }

    let risk = CashFlowRisk {
        total_pending,
        amount_due_soon,
        risk_level: RiskLevel::classify(total_pending, amount_due_soon),
    };

    debug!(
        total_pending,
        amount_due_soon,
        risk_level = %risk.risk_level,
        "Cash-flow risk summarized"
    );

    Ok(risk)
}

// ============================================================================
// TESTS
// ============================================================================
