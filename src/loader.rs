// 📂 Data Loader - CSV → InvoiceTable, read once per session
//
// The session owns a cache keyed on the canonical source path, so repeated
// dashboard interactions reuse the same snapshot and tests never share state.

use crate::error::DataLoadError;
use crate::invoice::{InvoiceRecord, InvoiceTable, REQUIRED_COLUMNS};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// ============================================================================
// PARSING
// ============================================================================

/// Load an invoice table from a CSV file
pub fn load_csv(csv_path: &Path) -> Result<InvoiceTable, DataLoadError> {
    if !csv_path.exists() {
        return Err(DataLoadError::SourceNotFound(csv_path.to_path_buf()));
    }

    let file = File::open(csv_path)?;
    let table = load_from_reader(file)?;

    info!(
        source = %csv_path.display(),
        invoices = table.len(),
        "Loaded invoice table"
    );

    Ok(table)
}

/// Load an invoice table from any CSV byte stream
pub fn load_from_reader<R: Read>(reader: R) -> Result<InvoiceTable, DataLoadError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    check_headers(&headers)?;

    let mut records = Vec::new();
    let mut raw = StringRecord::new();

    while rdr.read_record(&mut raw)? {
        let line = raw.position().map(|p| p.line()).unwrap_or(0);

        let invoice: InvoiceRecord =
            raw.deserialize(Some(&headers))
                .map_err(|e| DataLoadError::MalformedRow {
                    line,
                    reason: e.to_string(),
                })?;

        if !invoice.amount.is_finite() || invoice.amount < 0.0 {
            return Err(DataLoadError::MalformedRow {
                line,
                reason: format!(
                    "Amount must be a non-negative number, got {}",
                    invoice.amount
                ),
            });
        }

        records.push(invoice);
    }

    debug!(rows = records.len(), "Parsed invoice rows");

    Ok(InvoiceTable::new(records))
}

fn check_headers(headers: &StringRecord) -> Result<(), DataLoadError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataLoadError::MissingColumns(missing))
    }
}

// ============================================================================
// SESSION CACHE
// ============================================================================

/// Loaded tables keyed on canonical source path
#[derive(Debug, Default)]
pub struct TableCache {
    tables: Mutex<HashMap<PathBuf, Arc<InvoiceTable>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on first use.
    /// The lock is held across the load so a source is read at most once.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<InvoiceTable>, DataLoadError> {
        let key = path
            .canonicalize()
            .map_err(|_| DataLoadError::SourceNotFound(path.to_path_buf()))?;

        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(table) = tables.get(&key) {
            debug!(source = %key.display(), "Invoice table served from session cache");
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_csv(&key)?);
        tables.insert(key, Arc::clone(&table));

        Ok(table)
    }

    pub fn contains(&self, path: &Path) -> bool {
        let Ok(key) = path.canonicalize() else {
            return false;
        };
        self.tables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&key)
    }
}

/// One dashboard session bound to a fixed invoice source
#[derive(Debug)]
pub struct Session {
    source: PathBuf,
    cache: TableCache,
}

impl Session {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            cache: TableCache::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Load the session's table (memoized)
    pub fn load(&self) -> Result<Arc<InvoiceTable>, DataLoadError> {
        self.cache.get_or_load(&self.source)
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.contains(&self.source)
    }
}

// ============================================================================
// TESTS
// ============================================================================
