// 🚦 Payment Prioritizer
// Tiers by days-until-due, then sorts so the most urgent invoices come first.

use crate::error::InvalidDateError;
use crate::invoice::{InvoiceRecord, InvoiceTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Invoices due in fewer days than this are High priority
pub const HIGH_PRIORITY_DAYS: i64 = 5;

/// Invoices due in fewer days than this (and not High) are Medium priority
pub const MEDIUM_PRIORITY_DAYS: i64 = 10;

// ============================================================================
// PRIORITY
// ============================================================================

/// Declaration order is rank order: High sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_due_in_days(due_in_days: i64) -> Self {
        if due_in_days < HIGH_PRIORITY_DAYS {
            Priority::High
        } else if due_in_days < MEDIUM_PRIORITY_DAYS {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PRIORITIZED VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrioritizedInvoice {
    #[serde(flatten)]
    pub invoice: InvoiceRecord,

    /// Position of this invoice in the loaded table
    pub source_row: usize,

    pub due_in_days: i64,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrioritizedView {
    pub rows: Vec<PrioritizedInvoice>,
}

impl PrioritizedView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, priority: Priority) -> usize {
        self.rows.iter().filter(|r| r.priority == priority).count()
    }
}

/// Annotate a copy of every invoice with its tier and sort by
/// (priority, due_in_days). The sort is stable, so ties keep source order.
/// Any unparsable due date fails the whole view.
pub fn prioritize(table: &InvoiceTable, today: NaiveDate) -> Result<PrioritizedView, InvalidDateError> {
    let mut rows = table
        .iter()
        .enumerate()
        .map(|(row, invoice)| {
            let due_in_days = invoice.due_in_days(row, today)?;
            Ok(PrioritizedInvoice {
                invoice: invoice.clone(),
                source_row: row,
                due_in_days,
                priority: Priority::from_due_in_days(due_in_days),
            })
        })
        .collect::<Result<Vec<_>, InvalidDateError>>()?;

    rows.sort_by_key(|r| (r.priority, r.due_in_days));

    let view = PrioritizedView { rows };
    debug!(
        high = view.count(Priority::High),
        medium = view.count(Priority::Medium),
        low = view.count(Priority::Low),
        "Prioritized invoices"
    );

    Ok(view)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn create_test_invoice(id: &str, due_in: i64) -> InvoiceRecord {
        let due = today() + chrono::Duration::days(due_in);
        InvoiceRecord {
            invoice_id: id.to_string(),
            supplier_name: "Supplier".to_string(),
            invoice_date: "2024-05-01".to_string(),
            due_date: due.format("%Y-%m-%d").to_string(),
            amount: 100.0,
            status: InvoiceStatus::Pending,
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Priority::from_due_in_days(-3), Priority::High);
        assert_eq!(Priority::from_due_in_days(4), Priority::High);
        assert_eq!(Priority::from_due_in_days(5), Priority::Medium);
        assert_eq!(Priority::from_due_in_days(9), Priority::Medium);
        assert_eq!(Priority::from_due_in_days(10), Priority::Low);
    }

    #[test]
    fn test_sorted_by_rank_then_due_days() {
        let table = InvoiceTable::new(vec![
            create_test_invoice("LOW-20", 20),
            create_test_invoice("MED-7", 7),
            create_test_invoice("HIGH-2", 2),
            create_test_invoice("LOW-10", 10),
            create_test_invoice("HIGH-OVERDUE", -4),
            create_test_invoice("MED-5", 5),
        ]);

        let view = prioritize(&table, today()).unwrap();
        let ids: Vec<&str> = view.rows.iter().map(|r| r.invoice.invoice_id.as_str()).collect();

        assert_eq!(
            ids,
            vec!["HIGH-OVERDUE", "HIGH-2", "MED-5", "MED-7", "LOW-10", "LOW-20"]
        );
        assert_eq!(view.rows[0].due_in_days, -4);
        assert_eq!(view.rows[2].priority, Priority::Medium);
    }

    #[test]
    fn test_ties_preserve_source_order() {
        let table = InvoiceTable::new(vec![
            create_test_invoice("B", 3),
            create_test_invoice("A", 3),
            create_test_invoice("C", 3),
        ]);

        let view = prioritize(&table, today()).unwrap();
        let rows: Vec<usize> = view.rows.iter().map(|r| r.source_row).collect();

        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn test_view_is_permutation_and_table_untouched() {
        let table = InvoiceTable::new(vec![
            create_test_invoice("A", 12),
            create_test_invoice("B", 1),
            create_test_invoice("C", 6),
            create_test_invoice("A", 1),
        ]);
        let snapshot = table.clone();

        let view = prioritize(&table, today()).unwrap();

        assert_eq!(table, snapshot);
        assert_eq!(view.len(), table.len());
        let mut rows: Vec<usize> = view.rows.iter().map(|r| r.source_row).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_invalid_due_date_fails_view() {
        let mut bad = create_test_invoice("BAD-1", 3);
        bad.due_date = "next tuesday".to_string();
        let table = InvoiceTable::new(vec![create_test_invoice("OK", 3), bad]);

        let err = prioritize(&table, today()).unwrap_err();

        assert_eq!(err.invoice_id, "BAD-1");
        assert_eq!(err.row, 1);
    }

    #[test]
    fn test_prioritize_is_idempotent() {
        let table = InvoiceTable::new(vec![
            create_test_invoice("A", 8),
            create_test_invoice("B", 2),
        ]);

        assert_eq!(
            prioritize(&table, today()).unwrap(),
            prioritize(&table, today()).unwrap()
        );
    }

    #[test]
    fn test_empty_table() {
        let view = prioritize(&InvoiceTable::default(), today()).unwrap();
        assert!(view.is_empty());
    }
}
