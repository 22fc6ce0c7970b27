// 🧾 Invoice model
// One row per invoice, kept in source order. Dates stay as source text and are
// parsed by the components that need them.

use crate::error::InvalidDateError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The one date format the source is written in
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Header columns the source must carry
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Invoice_ID",
    "Supplier_Name",
    "Invoice_Date",
    "Due_Date",
    "Amount",
    "Status",
];

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    /// Any other status text, kept verbatim
    Other(String),
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_pending(&self) -> bool {
        *self == InvoiceStatus::Pending
    }
}

impl From<String> for InvoiceStatus {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("pending") {
            InvoiceStatus::Pending
        } else if trimmed.eq_ignore_ascii_case("paid") {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Other(trimmed.to_string())
        }
    }
}

impl From<InvoiceStatus> for String {
    fn from(status: InvoiceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(rename = "Invoice_ID")]
    pub invoice_id: String,

    #[serde(rename = "Supplier_Name")]
    pub supplier_name: String,

    #[serde(rename = "Invoice_Date")]
    pub invoice_date: String,

    #[serde(rename = "Due_Date")]
    pub due_date: String,

    #[serde(rename = "Amount")]
    pub amount: f64,

    #[serde(rename = "Status")]
    pub status: InvoiceStatus,
}

impl InvoiceRecord {
    /// Parse `Due_Date`; `row` is this record's position in its table
    pub fn parse_due_date(&self, row: usize) -> Result<NaiveDate, InvalidDateError> {
        self.parse_field("Due_Date", &self.due_date, row)
    }

    /// Parse `Invoice_Date`; `row` is this record's position in its table
    pub fn parse_invoice_date(&self, row: usize) -> Result<NaiveDate, InvalidDateError> {
        self.parse_field("Invoice_Date", &self.invoice_date, row)
    }

    /// Signed days from `today` until the due date (negative = overdue)
    pub fn due_in_days(&self, row: usize, today: NaiveDate) -> Result<i64, InvalidDateError> {
        Ok((self.parse_due_date(row)? - today).num_days())
    }

    fn parse_field(
        &self,
        field: &'static str,
        value: &str,
        row: usize,
    ) -> Result<NaiveDate, InvalidDateError> {
        parse_date(value).ok_or_else(|| InvalidDateError {
            invoice_id: self.invoice_id.clone(),
            row,
            field,
            value: value.to_string(),
        })
    }
}

/// Parse a source date (YYYY-MM-DD, surrounding whitespace ignored)
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT).ok()
}

// ============================================================================
// TABLE
// ============================================================================

/// Invoices in source order. Never mutated after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvoiceTable {
    records: Vec<InvoiceRecord>,
}

impl InvoiceTable {
    pub fn new(records: Vec<InvoiceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[InvoiceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InvoiceRecord> {
        self.records.iter()
    }

    /// First `n` rows, for the data preview panel
    pub fn preview(&self, n: usize) -> &[InvoiceRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Pending rows with their table positions
    pub fn pending(&self) -> impl Iterator<Item = (usize, &InvoiceRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.status.is_pending())
    }
}

impl From<Vec<InvoiceRecord>> for InvoiceTable {
    fn from(records: Vec<InvoiceRecord>) -> Self {
        Self::new(records)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_invoice(id: &str, due_date: &str, status: InvoiceStatus) -> InvoiceRecord {
        InvoiceRecord {
            invoice_id: id.to_string(),
            supplier_name: "Acme Supplies".to_string(),
            invoice_date: "2024-03-01".to_string(),
            due_date: due_date.to_string(),
            amount: 250.0,
            status,
        }
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!(InvoiceStatus::from("pending".to_string()), InvoiceStatus::Pending);
        assert_eq!(InvoiceStatus::from(" PAID ".to_string()), InvoiceStatus::Paid);
        assert_eq!(
            InvoiceStatus::from("Disputed".to_string()),
            InvoiceStatus::Other("Disputed".to_string())
        );
    }

    #[test]
    fn test_due_in_days_signed() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let future = create_test_invoice("INV-1", "2024-03-15", InvoiceStatus::Pending);
        let overdue = create_test_invoice("INV-2", "2024-03-07", InvoiceStatus::Pending);

        assert_eq!(future.due_in_days(0, today).unwrap(), 5);
        assert_eq!(overdue.due_in_days(1, today).unwrap(), -3);
    }

    #[test]
    fn test_invalid_due_date_names_record() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let invoice = create_test_invoice("INV-9", "03/15/2024", InvoiceStatus::Pending);

        let err = invoice.due_in_days(4, today).unwrap_err();

        assert_eq!(err.invoice_id, "INV-9");
        assert_eq!(err.row, 4);
        assert_eq!(err.field, "Due_Date");
        assert!(err.to_string().contains("03/15/2024"));
    }

    #[test]
    fn test_preview_and_pending() {
        let table = InvoiceTable::new(vec![
            create_test_invoice("INV-1", "2024-03-15", InvoiceStatus::Pending),
            create_test_invoice("INV-2", "2024-03-16", InvoiceStatus::Paid),
            create_test_invoice("INV-3", "2024-03-17", InvoiceStatus::Pending),
        ]);

        assert_eq!(table.preview(2).len(), 2);
        assert_eq!(table.preview(10).len(), 3);

        let pending: Vec<usize> = table.pending().map(|(row, _)| row).collect();
        assert_eq!(pending, vec![0, 2]);
    }
}
