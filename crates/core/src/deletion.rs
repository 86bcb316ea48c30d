//! Guarded bulk delete of the selected solutions.
//!
//! One invocation walks `Idle -> Validating -> {NothingSelected | Cancelled | Deleting ->
//! Completed}`; nothing carries over between invocations.

use tracing::{debug, info, warn};

use crate::error::RemoteError;
use crate::model::{Snapshot, Solution};
use crate::selection::SelectionModel;
use crate::service::DataService;
use crate::util::new_ulid;

/// Shown when a delete is requested with nothing selected.
pub const NOTHING_SELECTED_MESSAGE: &str = "Please select at least one solution to delete";

/// Confirmation question for a batch of `count` solutions.
pub fn confirmation_message(count: usize) -> String {
    let noun = if count == 1 { "solution" } else { "solutions" };
    format!("Are you sure you want to delete {count} {noun}?")
}

/// Concrete solutions a confirmed delete will touch, in snapshot order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletionBatch {
    pub solutions: Vec<Solution>,
}

impl DeletionBatch {
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}

/// Per-item results of a batch. Failures never stop the remaining items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub deleted: Vec<Solution>,
    pub failed: Vec<(Solution, RemoteError)>,
}

impl DeletionReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// True once at least one solution is gone, so the inventory is stale.
    pub fn refresh_required(&self) -> bool {
        !self.deleted.is_empty()
    }
}

/// Result of one [`DeletionWorkflow::execute`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No live solution selected. Surface [`NOTHING_SELECTED_MESSAGE`] to the operator.
    NothingSelected,
    /// The operator declined the confirmation.
    Cancelled,
    Completed(DeletionReport),
}

impl Outcome {
    pub fn refresh_required(&self) -> bool {
        match self {
            Self::Completed(report) => report.refresh_required(),
            Self::NothingSelected | Self::Cancelled => false,
        }
    }
}

/// Validates a selection, asks for confirmation, and deletes best-effort.
pub struct DeletionWorkflow;

impl DeletionWorkflow {
    /// Resolves the selection against `snapshot`. Selected ids missing from the snapshot are
    /// dropped. Returns `None` when nothing remains.
    pub fn plan(snapshot: &Snapshot, selection: &SelectionModel) -> Option<DeletionBatch> {
        let solutions: Vec<Solution> = snapshot
            .iter()
            .filter(|s| selection.is_selected(&s.solution_id))
            .cloned()
            .collect();
        let stale = selection.len().saturating_sub(solutions.len());
        if stale > 0 {
            debug!(stale, "dropping selected ids no longer in the snapshot");
        }
        (!solutions.is_empty()).then_some(DeletionBatch { solutions })
    }

    /// Deletes every solution in `batch`, one remote call each, collecting failures.
    ///
    /// Not-found errors are reported like any other failure and never retried.
    pub async fn run_batch(batch: DeletionBatch, service: &dyn DataService) -> DeletionReport {
        let run_id = new_ulid();
        info!(%run_id, count = batch.len(), "deleting solutions");

        let mut report = DeletionReport::default();
        for solution in batch.solutions {
            match service
                .delete(&solution.entity_kind, &solution.solution_id)
                .await
            {
                Ok(()) => {
                    info!(%run_id, unique_name = %solution.unique_name, "solution deleted");
                    report.deleted.push(solution);
                }
                Err(error) => {
                    warn!(%run_id, unique_name = %solution.unique_name, %error, "solution delete failed");
                    report.failed.push((solution, error));
                }
            }
        }

        info!(
            %run_id,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "delete batch finished"
        );
        report
    }

    /// Full workflow: plan, confirm once with the batch size, then delete.
    pub async fn execute<C>(
        snapshot: &Snapshot,
        selection: &SelectionModel,
        confirm: C,
        service: &dyn DataService,
    ) -> Outcome
    where
        C: FnOnce(usize) -> bool,
    {
        debug!(phase = "validating");
        let Some(batch) = Self::plan(snapshot, selection) else {
            debug!(phase = "nothing_selected");
            return Outcome::NothingSelected;
        };

        if !confirm(batch.len()) {
            debug!(phase = "cancelled", count = batch.len());
            return Outcome::Cancelled;
        }

        debug!(phase = "deleting", count = batch.len());
        Outcome::Completed(Self::run_batch(batch, service).await)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::inventory::SolutionInventory;
    use crate::memory::InMemoryDataService;
    use crate::model::SolutionId;

    async fn loaded(svc: &InMemoryDataService) -> (SolutionInventory, SelectionModel) {
        let mut inv = SolutionInventory::new();
        let mut sel = SelectionModel::new();
        inv.refresh(svc, &mut sel).await.unwrap();
        (inv, sel)
    }

    #[test]
    fn confirmation_message_counts() {
        assert_eq!(
            confirmation_message(1),
            "Are you sure you want to delete 1 solution?"
        );
        assert_eq!(
            confirmation_message(3),
            "Are you sure you want to delete 3 solutions?"
        );
    }

    #[tokio::test]
    async fn empty_selection_is_nothing_selected() {
        let svc = InMemoryDataService::new();
        svc.add_solution("sol1", "Alpha", false);
        let (inv, sel) = loaded(&svc).await;

        let asked = Cell::new(false);
        let outcome = DeletionWorkflow::execute(
            &inv.current(),
            &sel,
            |_| {
                asked.set(true);
                true
            },
            &svc,
        )
        .await;

        assert_eq!(outcome, Outcome::NothingSelected);
        assert!(!asked.get());
        assert!(svc.delete_calls().is_empty());
        assert!(!outcome.refresh_required());
    }

    #[tokio::test]
    async fn declined_confirmation_deletes_nothing() {
        let svc = InMemoryDataService::new();
        let a = svc.add_solution("sol1", "Alpha", false);
        let b = svc.add_solution("sol2", "Beta", false);
        let (inv, mut sel) = loaded(&svc).await;
        sel.set(&a, true);
        sel.set(&b, true);

        let mut seen = 0;
        let outcome = DeletionWorkflow::execute(
            &inv.current(),
            &sel,
            |count| {
                seen = count;
                false
            },
            &svc,
        )
        .await;

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(seen, 2);
        assert!(svc.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn partial_failure_is_reported_per_item() {
        let svc = InMemoryDataService::new();
        let a = svc.add_solution("sol1", "Alpha", false);
        let b = svc.add_solution("sol2", "Beta", false);
        let (inv, mut sel) = loaded(&svc).await;
        sel.set(&a, true);
        sel.set(&b, true);

        let locked = RemoteError::Status {
            status: 400,
            message: "solution is locked".into(),
        };
        svc.fail_delete(a, locked.clone());

        let outcome = DeletionWorkflow::execute(&inv.current(), &sel, |_| true, &svc).await;
        let Outcome::Completed(report) = &outcome else {
            panic!("expected Completed, got {outcome:?}");
        };

        assert_eq!(report.deleted_count(), 1);
        assert_eq!(report.deleted[0].solution_id, b);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.solution_id, a);
        assert_eq!(report.failed[0].1, locked);
        assert!(outcome.refresh_required());
        assert_eq!(svc.delete_calls().len(), 2);
    }

    #[tokio::test]
    async fn all_failures_do_not_require_refresh() {
        let svc = InMemoryDataService::new();
        let a = svc.add_solution("sol1", "Alpha", false);
        let (inv, mut sel) = loaded(&svc).await;
        sel.set(&a, true);
        svc.fail_delete(a, RemoteError::Transport("timeout".into()));

        let outcome = DeletionWorkflow::execute(&inv.current(), &sel, |_| true, &svc).await;
        assert!(matches!(&outcome, Outcome::Completed(r) if r.failed.len() == 1));
        assert!(!outcome.refresh_required());
    }

    #[tokio::test]
    async fn already_deleted_is_reported_not_retried() {
        let svc = InMemoryDataService::new();
        let a = svc.add_solution("sol1", "Alpha", false);
        let (inv, mut sel) = loaded(&svc).await;
        sel.set(&a, true);

        // removed behind our back
        svc.delete(&crate::model::EntityKind::solution(), &a).await.unwrap();

        let outcome = DeletionWorkflow::execute(&inv.current(), &sel, |_| true, &svc).await;
        let Outcome::Completed(report) = outcome else {
            panic!("expected Completed");
        };
        assert!(matches!(report.failed[0].1, RemoteError::NotFound { .. }));
        assert_eq!(svc.delete_calls().len(), 2);
    }

    #[test]
    fn plan_drops_stale_ids() {
        let snap = Snapshot::default();
        let mut sel = SelectionModel::new();
        // a selection bound to an older snapshot
        let old = Snapshot::new(
            1,
            vec![Solution {
                entity_kind: crate::model::EntityKind::solution(),
                solution_id: SolutionId::new(),
                friendly_name: "Gone".into(),
                unique_name: "gone".into(),
                version: "1.0".into(),
                description: None,
                installed_on: None,
            }],
        );
        sel.reset(&old);
        sel.select_all();

        assert_eq!(DeletionWorkflow::plan(&snap, &sel), None);
        assert!(DeletionWorkflow::plan(&old, &sel).is_some());
    }
}
