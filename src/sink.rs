use std::path::Path;

use anyhow::Result;
use log::{error, info, warn};

use crate::db::DocumentStore;
use crate::models::MatchReport;
use crate::utils::write_json_pretty;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SinkOutcome {
    pub backup_written: bool,
    /// `None` when the store was skipped or failed.
    pub stored: Option<usize>,
}

/// Writes the JSON backup, then inserts into the document store.
///
/// The two writes are independent: either may fail without affecting the
/// other, and neither failure is returned to the caller. `store` is `None`
/// when the document store is switched off, otherwise the result of opening it.
pub fn persist_reports<D: DocumentStore>(
    backup_path: &Path,
    reports: &[MatchReport],
    store: Option<Result<D>>,
) -> SinkOutcome {
    let mut outcome = SinkOutcome::default();

    match write_json_pretty(backup_path, reports) {
        Ok(()) => {
            outcome.backup_written = true;
            info!("Backup of {} reports written to {}", reports.len(), backup_path.display());
        }
        Err(e) => error!("Could not write backup {}: {:#}", backup_path.display(), e),
    }

    match store {
        None => info!("Document store disabled, skipping insert"),
        Some(Err(e)) => warn!("Document store connection failed: {:#}", e),
        Some(Ok(mut db)) => match db.insert_many(reports) {
            Ok(n) => {
                outcome.stored = Some(n);
                info!("Inserted {} documents into the store", n);
            }
            Err(e) => warn!("Document store insert failed: {:#}", e),
        },
    }

    outcome
}
