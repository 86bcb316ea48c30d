use anyhow::{anyhow, bail, Result};
use tracing::info;

use solman_core::{
    confirmation_message, DeleteRequest, DeletionReport, SessionEvent, Solution, SolutionManager,
    SortDirection, SortKey, NOTHING_SELECTED_MESSAGE,
};

use crate::{prompt, table};

/// Drives the session until the pending load finishes.
pub async fn wait_loaded(mgr: &mut SolutionManager) -> Result<usize> {
    if let Some(progress) = mgr.progress() {
        eprintln!("{progress}");
    }
    match mgr.next_event().await {
        SessionEvent::Loaded { count } => Ok(count),
        SessionEvent::LoadFailed(e) => Err(anyhow!(e).context("load solutions")),
        SessionEvent::JobFailed(e) => Err(anyhow!(e).context("load solutions")),
        SessionEvent::Deleted { .. } => bail!("unexpected delete result while loading"),
    }
}

pub async fn list(
    mgr: &mut SolutionManager,
    sort: Option<SortKey>,
    desc: bool,
    filter: Option<String>,
    json: bool,
) -> Result<()> {
    wait_loaded(mgr).await?;

    let key = sort.unwrap_or(mgr.settings().default_sort);
    let direction = if desc || (sort.is_none() && mgr.settings().descending) {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let rows = mgr.inventory().view(key, direction, filter.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", table::render(&rows, mgr.selection(), table::terminal_width()));
        println!("{} solution(s)", rows.len());
    }
    Ok(())
}

pub async fn delete(mgr: &mut SolutionManager, unique_names: &[String], yes: bool) -> Result<()> {
    wait_loaded(mgr).await?;

    let snapshot = mgr.snapshot();
    let mut missing = Vec::new();
    for name in unique_names {
        match snapshot.by_unique_name(name) {
            Some(solution) => mgr.selection_mut().set(&solution.solution_id, true),
            None => missing.push(name.as_str()),
        }
    }
    if !missing.is_empty() {
        bail!("no unmanaged solution named {}", missing.join(", "));
    }

    let count = mgr.deletable_count();
    if count == 0 {
        bail!(NOTHING_SELECTED_MESSAGE);
    }
    let confirmed = yes || prompt::confirm_off_runtime(confirmation_message(count)).await;

    let request = mgr.request_delete(|n| confirmed && n == count)?;
    match request {
        DeleteRequest::NothingSelected => bail!(NOTHING_SELECTED_MESSAGE),
        DeleteRequest::Cancelled => {
            println!("cancelled");
            return Ok(());
        }
        DeleteRequest::Started { count } => info!(count, "delete started"),
    }

    if let Some(progress) = mgr.progress() {
        eprintln!("{progress}");
    }
    let (report, reloading) = match mgr.next_event().await {
        SessionEvent::Deleted { report, reloading } => (report, reloading),
        SessionEvent::JobFailed(e) => return Err(anyhow!(e).context("delete solutions")),
        other => bail!("unexpected session event {other:?}"),
    };
    print_report(&report);
    if reloading {
        wait_loaded(mgr).await?;
    }

    if !report.failed.is_empty() {
        bail!("{} of {} deletes failed", report.failed.len(), report.deleted_count() + report.failed.len());
    }
    Ok(())
}

/// One line per item, failures with the remote reason.
pub fn print_report(report: &DeletionReport) {
    for solution in &report.deleted {
        println!("deleted  {}", label(solution));
    }
    for (solution, error) in &report.failed {
        println!("FAILED   {}: {error}", label(solution));
    }
}

fn label(solution: &Solution) -> String {
    format!("{} ({})", solution.friendly_name, solution.unique_name)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use solman_core::{InMemoryDataService, RemoteError, Settings};

    fn manager(svc: &Arc<InMemoryDataService>) -> SolutionManager {
        let mut mgr = SolutionManager::new(Settings::default());
        mgr.connect(svc.clone(), "https://contoso.crm.dynamics.com")
            .unwrap();
        mgr
    }

    #[tokio::test]
    async fn delete_by_unique_name_reloads() {
        let svc = Arc::new(InMemoryDataService::new());
        svc.add_solution("sol1", "Alpha", false);
        svc.add_solution("sol2", "Beta", false);
        let mut mgr = manager(&svc);

        delete(&mut mgr, &["sol2".to_string()], true).await.unwrap();

        assert_eq!(svc.delete_calls().len(), 1);
        assert!(!mgr.is_busy());
        assert_eq!(mgr.snapshot().len(), 1);
        assert!(mgr.snapshot().by_unique_name("sol2").is_none());
    }

    #[tokio::test]
    async fn unknown_unique_name_deletes_nothing() {
        let svc = Arc::new(InMemoryDataService::new());
        svc.add_solution("sol1", "Alpha", false);
        let mut mgr = manager(&svc);

        let err = delete(&mut mgr, &["sol1".into(), "nope".into()], true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
        assert!(svc.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn empty_selection_is_an_error() {
        let svc = Arc::new(InMemoryDataService::new());
        svc.add_solution("sol1", "Alpha", false);
        let mut mgr = manager(&svc);

        let err = delete(&mut mgr, &[], true).await.unwrap_err();
        assert_eq!(err.to_string(), NOTHING_SELECTED_MESSAGE);
        assert!(svc.delete_calls().is_empty());
        assert!(!mgr.is_busy());
    }

    #[tokio::test]
    async fn partial_failure_is_an_error() {
        let svc = Arc::new(InMemoryDataService::new());
        let a = svc.add_solution("sol1", "Alpha", false);
        svc.add_solution("sol2", "Beta", false);
        svc.fail_delete(a, RemoteError::Transport("reset".into()));
        let mut mgr = manager(&svc);

        let err = delete(&mut mgr, &["sol1".into(), "sol2".into()], true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert_eq!(mgr.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn list_surfaces_load_failure() {
        let svc = Arc::new(InMemoryDataService::new());
        svc.fail_queries(RemoteError::Status {
            status: 503,
            message: "unavailable".into(),
        });
        let mut mgr = manager(&svc);
        assert!(list(&mut mgr, None, false, None, true).await.is_err());
    }
}
