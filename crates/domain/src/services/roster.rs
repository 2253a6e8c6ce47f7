//! Roster import and lookup.

use std::sync::Arc;
use tracing::{info, warn};

use super::store::{StoreError, TicketingStore};
use crate::models::roster::RosterSummary;
use crate::models::{RosterEntry, RosterImportSummary, RosterRecord};
use shared::validation::normalize_email;

/// Minimum (and default) number of error messages kept in an import summary.
pub const DEFAULT_MAX_ERROR_DETAILS: usize = 10;

/// JSON records are numbered from 1 in error messages.
const FIRST_RECORD: usize = 1;

#[derive(Clone)]
pub struct RosterService {
    store: Arc<dyn TicketingStore>,
    max_error_details: usize,
}

impl RosterService {
    pub fn new(store: Arc<dyn TicketingStore>) -> Self {
        Self {
            store,
            max_error_details: DEFAULT_MAX_ERROR_DETAILS,
        }
    }

    /// Raises the number of reported error messages; never below the default.
    pub fn with_max_error_details(mut self, max_error_details: usize) -> Self {
        self.max_error_details = max_error_details.max(DEFAULT_MAX_ERROR_DETAILS);
        self
    }

    /// Imports already-decoded records.
    pub async fn import_batch(
        &self,
        records: Vec<RosterRecord>,
    ) -> Result<RosterImportSummary, StoreError> {
        self.import_rows(records.into_iter().map(Ok).collect(), FIRST_RECORD)
            .await
    }

    /// Imports rows from a source that may fail to decode individual rows.
    /// `first_row` is the number reported for the first row in error messages.
    ///
    /// Row failures are counted and reported; they never abort the batch.
    /// A store failure does.
    pub async fn import_rows(
        &self,
        rows: Vec<Result<RosterRecord, String>>,
        first_row: usize,
    ) -> Result<RosterImportSummary, StoreError> {
        let mut summary = RosterImportSummary {
            total: rows.len(),
            ..Default::default()
        };

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + first_row;
            let entry = match row.and_then(|record| record.into_entry().map_err(|e| e.to_string()))
            {
                Ok(entry) => entry,
                Err(message) => {
                    self.record_error(&mut summary, row_number, message);
                    continue;
                }
            };

            match self.store.insert_roster_entry(&entry).await {
                Ok(Some(_)) => summary.imported += 1,
                Ok(None) => summary.duplicate += 1,
                Err(e) => {
                    warn!(row = row_number, error = %e, "Roster import aborted");
                    return Err(e);
                }
            }
        }

        info!(
            total = summary.total,
            imported = summary.imported,
            duplicate = summary.duplicate,
            errors = summary.errors,
            "Roster import finished"
        );

        Ok(summary)
    }

    fn record_error(&self, summary: &mut RosterImportSummary, row: usize, message: String) {
        summary.errors += 1;
        if summary.error_details.len() < self.max_error_details {
            summary.error_details.push(format!("Row {}: {}", row, message));
        }
    }

    pub async fn exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.get(email).await?.is_some())
    }

    pub async fn get(&self, email: &str) -> Result<Option<RosterEntry>, StoreError> {
        self.store.find_roster_entry(&normalize_email(email)).await
    }

    pub async fn list(&self) -> Result<Vec<RosterEntry>, StoreError> {
        self.store.list_roster().await
    }

    pub async fn summary(&self) -> Result<RosterSummary, StoreError> {
        self.store.roster_summary().await
    }

    pub async fn clear(&self) -> Result<u64, StoreError> {
        let deleted = self.store.clear_roster().await?;
        warn!(deleted, "Roster cleared");
        Ok(deleted)
    }
}
