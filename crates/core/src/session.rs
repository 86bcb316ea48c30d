use std::sync::Arc;

use tracing::{info, warn};

use crate::deletion::{DeletionReport, DeletionWorkflow};
use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, RefreshError, SessionError, SettingsError};
use crate::inventory::SolutionInventory;
use crate::model::Snapshot;
use crate::selection::SelectionModel;
use crate::service::DataService;
use crate::settings::{PluginIdentity, Settings, SettingsStore};

/// Progress label while a load is running.
pub const LOADING_MESSAGE: &str = "Loading solutions...";
/// Progress label while a delete batch is running.
pub const DELETING_MESSAGE: &str = "Deleting solutions...";

/// Result of a background job, applied by [`SolutionManager::next_event`].
#[derive(Debug)]
pub enum JobResult {
    Loaded(Result<Snapshot, RefreshError>),
    Deleted(DeletionReport),
}

/// What happened when a background job finished.
#[derive(Debug)]
pub enum SessionEvent {
    Loaded { count: usize },
    /// The previous snapshot and selection are untouched.
    LoadFailed(RefreshError),
    /// `reloading` is set when a follow-up load was started.
    Deleted {
        report: DeletionReport,
        reloading: bool,
    },
    JobFailed(DispatchError),
}

/// Immediate answer to [`SolutionManager::request_delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRequest {
    NothingSelected,
    Cancelled,
    /// The batch is running; its report arrives as [`SessionEvent::Deleted`].
    Started { count: usize },
}

/// Front-end facing state: connection, inventory, selection and settings.
///
/// All mutation happens on the owner's task; remote work runs through a single-flight
/// [`Dispatcher`], so a load and a delete never overlap.
pub struct SolutionManager {
    service: Option<Arc<dyn DataService>>,
    inventory: SolutionInventory,
    selection: SelectionModel,
    settings: Settings,
    dispatcher: Dispatcher<JobResult>,
}

impl SolutionManager {
    pub fn new(settings: Settings) -> Self {
        Self {
            service: None,
            inventory: SolutionInventory::new(),
            selection: SelectionModel::new(),
            settings,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Switches to a new organization and starts loading its solutions.
    ///
    /// Rows from the previous organization are dropped right away.
    pub fn connect(
        &mut self,
        service: Arc<dyn DataService>,
        org_url: impl Into<String>,
    ) -> Result<(), SessionError> {
        if let Some(running) = self.dispatcher.running() {
            return Err(DispatchError::Busy { running }.into());
        }
        let org_url = org_url.into();
        info!(%org_url, "connection changed");
        self.settings.last_used_org_url = Some(org_url);
        self.service = Some(service);
        self.inventory = SolutionInventory::new();
        self.selection.reset(&self.inventory.current());
        self.request_refresh()
    }

    pub fn is_connected(&self) -> bool {
        self.service.is_some()
    }

    fn service(&self) -> Result<Arc<dyn DataService>, SessionError> {
        self.service.clone().ok_or(SessionError::NotConnected)
    }

    /// Starts a background load of the inventory.
    pub fn request_refresh(&mut self) -> Result<(), SessionError> {
        let service = self.service()?;
        self.dispatcher.submit(LOADING_MESSAGE, async move {
            JobResult::Loaded(SolutionInventory::fetch(service.as_ref()).await)
        })?;
        Ok(())
    }

    /// Validates the selection, asks `confirm` once, and starts the delete batch.
    pub fn request_delete<C>(&mut self, confirm: C) -> Result<DeleteRequest, SessionError>
    where
        C: FnOnce(usize) -> bool,
    {
        let service = self.service()?;
        if let Some(running) = self.dispatcher.running() {
            return Err(DispatchError::Busy { running }.into());
        }

        let Some(batch) = DeletionWorkflow::plan(&self.inventory.current(), &self.selection) else {
            return Ok(DeleteRequest::NothingSelected);
        };
        let count = batch.len();
        if !confirm(count) {
            return Ok(DeleteRequest::Cancelled);
        }

        self.dispatcher.submit(DELETING_MESSAGE, async move {
            JobResult::Deleted(DeletionWorkflow::run_batch(batch, service.as_ref()).await)
        })?;
        Ok(DeleteRequest::Started { count })
    }

    /// Number of selected solutions still present in the snapshot.
    pub fn deletable_count(&self) -> usize {
        DeletionWorkflow::plan(&self.inventory.current(), &self.selection).map_or(0, |b| b.len())
    }

    /// Waits for the running job and applies its result. Pends forever when idle.
    ///
    /// Cancel safe, so it can sit in a `tokio::select!` next to user input.
    pub async fn next_event(&mut self) -> SessionEvent {
        let result = match self.dispatcher.completion().await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "background job failed");
                return SessionEvent::JobFailed(e);
            }
        };

        match result {
            JobResult::Loaded(Ok(snapshot)) => {
                let snapshot = self.inventory.install(snapshot, &mut self.selection);
                SessionEvent::Loaded {
                    count: snapshot.len(),
                }
            }
            JobResult::Loaded(Err(e)) => {
                warn!(error = %e, "loading solutions failed");
                SessionEvent::LoadFailed(e)
            }
            JobResult::Deleted(report) => {
                // An attempted batch consumes the selection, even if the reload later fails.
                self.selection.clear();
                let reloading = report.refresh_required() && self.request_refresh().is_ok();
                SessionEvent::Deleted { report, reloading }
            }
        }
    }

    /// Progress label of the running job.
    pub fn progress(&self) -> Option<&'static str> {
        self.dispatcher.running()
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn inventory(&self) -> &SolutionInventory {
        &self.inventory
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inventory.current()
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionModel {
        &mut self.selection
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Writes the settings back; call on shutdown.
    pub fn save_settings(
        &self,
        store: &dyn SettingsStore,
        identity: &PluginIdentity,
    ) -> Result<(), SettingsError> {
        store.save(identity, &self.settings)
    }
}
