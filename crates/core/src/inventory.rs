use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RefreshError;
use crate::mapper::SolutionRecordMapper;
use crate::model::{compare_names, Snapshot, Solution, SolutionId};
use crate::query::{QueryExpression, SortDirection};
use crate::selection::SelectionModel;
use crate::service::DataService;
use crate::util::now_ms;

/// Column a display view can be sorted by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    FriendlyName,
    UniqueName,
    Version,
    InstalledOn,
}

impl SortKey {
    pub fn compare(self, a: &Solution, b: &Solution) -> Ordering {
        match self {
            Self::FriendlyName => compare_names(&a.friendly_name, &b.friendly_name),
            Self::UniqueName => compare_names(&a.unique_name, &b.unique_name),
            Self::Version => compare_versions(&a.version, &b.version),
            Self::InstalledOn => a.installed_on.cmp(&b.installed_on),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FriendlyName => "friendly-name",
            Self::UniqueName => "unique-name",
            Self::Version => "version",
            Self::InstalledOn => "installed-on",
        })
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "friendly-name" | "name" => Ok(Self::FriendlyName),
            "unique-name" | "unique" => Ok(Self::UniqueName),
            "version" => Ok(Self::Version),
            "installed-on" | "installed" => Ok(Self::InstalledOn),
            other => Err(format!("unknown sort key `{other}`")),
        }
    }
}

// Dotted numeric versions compare segment by segment ("1.10" > "1.9").
fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Owns the current [`Snapshot`] of unmanaged solutions.
///
/// The snapshot is shared read-only through `Arc`; holders of an old snapshot keep it alive
/// after a refresh replaces it.
#[derive(Debug, Default)]
pub struct SolutionInventory {
    current: Arc<Snapshot>,
}

impl SolutionInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last successfully loaded snapshot, or an empty one before the first load.
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// Queries and maps all unmanaged solutions without touching any local state.
    ///
    /// One malformed record fails the whole fetch.
    pub async fn fetch(service: &dyn DataService) -> Result<Snapshot, RefreshError> {
        let query = QueryExpression::unmanaged_solutions();
        let records = service.query(&query).await?;
        debug!(count = records.len(), "solution records received");

        let solutions = SolutionRecordMapper
            .map_all(&records)
            .map_err(|(index, source)| RefreshError::Mapping { index, source })?;
        Ok(Snapshot::new(now_ms(), solutions))
    }

    /// Replaces the snapshot and resets the selection against it.
    pub fn install(&mut self, snapshot: Snapshot, selection: &mut SelectionModel) -> Arc<Snapshot> {
        info!(count = snapshot.len(), "solutions loaded");
        self.current = Arc::new(snapshot);
        selection.reset(&self.current);
        self.current()
    }

    /// [`Self::fetch`] followed by [`Self::install`]. On error nothing changes.
    pub async fn refresh(
        &mut self,
        service: &dyn DataService,
        selection: &mut SelectionModel,
    ) -> Result<Arc<Snapshot>, RefreshError> {
        let snapshot = Self::fetch(service).await?;
        Ok(self.install(snapshot, selection))
    }

    pub fn find(&self, id: &SolutionId) -> Option<&Solution> {
        self.current.get(id)
    }

    pub fn find_by_unique_name(&self, unique_name: &str) -> Option<&Solution> {
        self.current.by_unique_name(unique_name)
    }

    /// Sorted, optionally filtered view for display.
    ///
    /// The filter is a case-insensitive substring match over friendly name, unique name and
    /// description. Ties keep snapshot order.
    pub fn view(&self, key: SortKey, direction: SortDirection, filter: Option<&str>) -> Vec<&Solution> {
        let needle = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);

        let mut rows: Vec<&Solution> = self
            .current
            .iter()
            .filter(|s| match &needle {
                None => true,
                Some(n) => {
                    s.friendly_name.to_lowercase().contains(n)
                        || s.unique_name.to_lowercase().contains(n)
                        || s
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(n))
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            let ord = key.compare(a, b);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        rows
    }
}
