//! Generation log recorder. One immutable row per attempt.

use log::{info, warn};

use crate::data::{GenerationResult, GenerationStatus, NewGenerationLog, ScheduleGenerationLog, UserId};
use crate::error::StoreResult;
use crate::store::GenerationLogStore;

impl NewGenerationLog {
    pub fn from_result(generated_by: Option<UserId>, result: &GenerationResult) -> Self {
        Self {
            generated_by,
            status: result.status,
            courses_scheduled: result.courses_scheduled,
            conflicts_found: result.conflicts_found,
            conflicts_resolved: result.conflicts_resolved,
            // Only failed runs carry an error message.
            error_message: match result.status {
                GenerationStatus::Failed => result.error_message.clone(),
                _ => None,
            },
        }
    }
}

pub fn record<S: GenerationLogStore + ?Sized>(
    store: &S,
    generated_by: Option<UserId>,
    result: &GenerationResult,
) -> StoreResult<ScheduleGenerationLog> {
    let log = store.append_log(NewGenerationLog::from_result(generated_by, result))?;
    match &log.error_message {
        Some(error) => warn!("Recorded generation log #{} ({}): {}", log.id, log.status, error),
        None => info!(
            "Recorded generation log #{} ({}, {} courses scheduled).",
            log.id, log.status, log.courses_scheduled
        ),
    }
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn result(status: GenerationStatus, error_message: Option<&str>) -> GenerationResult {
        GenerationResult {
            status,
            courses_scheduled: 3,
            conflicts_found: 2,
            conflicts_resolved: 3,
            entries: Vec::new(),
            error_message: error_message.map(str::to_string),
        }
    }

    #[test]
    fn records_outcome_counts() {
        let store = MemoryStore::new();

        let log = record(&store, Some(9), &result(GenerationStatus::Partial, None)).unwrap();

        assert_eq!(log.generated_by, Some(9));
        assert_eq!(log.status, GenerationStatus::Partial);
        assert_eq!(log.courses_scheduled, 3);
        assert_eq!(log.conflicts_found, 2);
        assert_eq!(log.conflicts_resolved, 3);
        assert_eq!(log.error_message, None);
        assert_eq!(store.logs().unwrap(), vec![log]);
    }

    #[test]
    fn error_message_only_kept_for_failed_runs() {
        let store = MemoryStore::new();

        let ok = record(&store, None, &result(GenerationStatus::Success, Some("ignored"))).unwrap();
        let failed = record(&store, None, &result(GenerationStatus::Failed, Some("disk gone"))).unwrap();

        assert_eq!(ok.error_message, None);
        assert_eq!(failed.error_message.as_deref(), Some("disk gone"));
    }

    #[test]
    fn every_attempt_appends_a_row() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            record(&store, Some(1), &result(GenerationStatus::Success, None)).unwrap();
        }
        assert_eq!(store.logs().unwrap().len(), 3);
    }
}
