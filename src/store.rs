// =============================================================================
// store.rs — THE CASE-LINKING UPSERT
// =============================================================================
//
// The only module with side effects. Everything upstream is pure
// computation; this is where derived deadlines leave the building.
//
// The persistence collaborator is an injected async interface with three
// methods — upsert a deadline, upsert a case file, read a case file. The
// engine treats all three as fallible black boxes: errors propagate to the
// caller unretried (retry/backoff policy belongs to the persistence layer
// or the caller, not here), and NO transactionality is assumed across
// calls.
//
// Known design gap, on purpose: the case-file update is a read-modify-write
// with no optimistic-concurrency check. Two concurrent derivation runs
// against the same case can race on `deadline_ids`. The store contract
// offers no version token to build a CAS loop on, and inventing locking
// here would change observable behavior under contention — so the race is
// documented instead of "fixed".
// =============================================================================

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{CaseDeadline, CaseFile};

/// Errors surfaced by the persistence seam. Backends wrap whatever they
/// actually failed with into `Backend`; the engine adds nothing on top.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// The persistence collaborator, as seen from this engine. Implemented by
/// the product's graph store in production and by an in-memory mock in
/// tests.
#[async_trait]
pub trait CaseAssistantStore: Send + Sync {
    /// Persist (or overwrite, keyed by id) a single deadline.
    async fn upsert_deadline(&self, deadline: CaseDeadline) -> Result<CaseDeadline, StoreError>;

    /// Persist (or overwrite, keyed by id) a case file.
    async fn upsert_case_file(&self, case_file: CaseFile) -> Result<CaseFile, StoreError>;

    /// Read a case file; `None` when the case does not exist.
    async fn get_case_file(&self, case_id: &str) -> Result<Option<CaseFile>, StoreError>;
}

/// Persist derived deadlines and link their ids into the case file.
///
/// Deadlines are upserted sequentially, in input order. When at least one
/// deadline was derived and the case exists, the case file's `deadline_ids`
/// becomes the order-preserving, duplicate-free union of its previous ids
/// followed by the new ids. A missing case is not an error — the deadlines
/// are still persisted standalone and linking is silently skipped.
///
/// Returns the number of deadlines processed. "Processed", not "newly
/// added": upserts are idempotent, so re-running over unchanged input
/// reports the same count without creating anything.
pub async fn upsert_auto_deadlines<S: CaseAssistantStore + ?Sized>(
    store: &S,
    case_id: &str,
    deadlines: Vec<CaseDeadline>,
) -> Result<usize, StoreError> {
    let count = deadlines.len();
    let mut new_ids: Vec<String> = Vec::with_capacity(count);

    for deadline in deadlines {
        debug!(deadline_id = %deadline.id, "Upserting deadline");
        let persisted = store.upsert_deadline(deadline).await?;
        new_ids.push(persisted.id);
    }

    if !new_ids.is_empty() {
        match store.get_case_file(case_id).await? {
            Some(mut case_file) => {
                case_file.deadline_ids = union_preserving_order(case_file.deadline_ids, new_ids);
                store.upsert_case_file(case_file).await?;
                debug!(case_id = %case_id, "Case file deadline ids updated");
            }
            None => {
                // Deadlines exist standalone; nothing to link them to.
                debug!(case_id = %case_id, "Case not found, skipping linking");
            }
        }
    }

    info!(case_id = %case_id, deadlines = count, "Auto-deadline upsert complete");
    Ok(count)
}

/// Existing ids first in their original order, then new ids in input
/// order, duplicates dropped on first sight.
fn union_preserving_order(existing: Vec<String>, new_ids: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(existing.len() + new_ids.len());
    existing
        .into_iter()
        .chain(new_ids)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
