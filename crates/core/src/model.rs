use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Logical name of a remote entity type, e.g. `solution`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(pub String);

impl EntityKind {
    /// The entity kind every [`Solution`] belongs to.
    pub const SOLUTION: &'static str = "solution";

    /// Kind for solution records.
    pub fn solution() -> Self {
        Self(Self::SOLUTION.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote primary key of a solution (a GUID).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolutionId(pub Uuid);

impl SolutionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SolutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SolutionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim_matches(|c| c == '{' || c == '}')).map(Self)
    }
}

/// An unmanaged solution as loaded from the remote platform.
///
/// Solutions are never edited locally; they are only read or deleted remotely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Always `solution`; kept so delete calls do not need to guess the entity type.
    pub entity_kind: EntityKind,
    pub solution_id: SolutionId,
    pub friendly_name: String,
    /// Unique, immutable name assigned by the remote system.
    pub unique_name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub installed_on: Option<OffsetDateTime>,
}

/// Name ordering used by the remote platform: case-insensitive, raw text as tiebreak.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Replacement-style view of the currently loaded solutions.
///
/// Ordered by friendly name ascending. A refresh swaps the whole snapshot; it is never
/// patched in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Load time (unix ms); zero for the empty startup snapshot.
    pub loaded_at_ms: i64,
    pub solutions: Vec<Solution>,
}

impl Snapshot {
    /// Builds a snapshot, enforcing the friendly-name ordering.
    pub fn new(loaded_at_ms: i64, mut solutions: Vec<Solution>) -> Self {
        solutions.sort_by(|a, b| compare_names(&a.friendly_name, &b.friendly_name));
        Self {
            loaded_at_ms,
            solutions,
        }
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Solution> {
        self.solutions.iter()
    }

    pub fn get(&self, id: &SolutionId) -> Option<&Solution> {
        self.solutions.iter().find(|s| &s.solution_id == id)
    }

    pub fn by_unique_name(&self, unique_name: &str) -> Option<&Solution> {
        self.solutions.iter().find(|s| s.unique_name == unique_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(unique: &str, friendly: &str) -> Solution {
        Solution {
            entity_kind: EntityKind::solution(),
            solution_id: SolutionId::new(),
            friendly_name: friendly.into(),
            unique_name: unique.into(),
            version: "1.0.0.0".into(),
            description: None,
            installed_on: None,
        }
    }

    #[test]
    fn snapshot_sorts_by_friendly_name() {
        let snap = Snapshot::new(1, vec![solution("b", "Beta"), solution("a", "Alpha")]);
        let names: Vec<_> = snap.iter().map(|s| s.friendly_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn snapshot_order_ignores_case() {
        let snap = Snapshot::new(
            1,
            vec![
                solution("z", "Zulu"),
                solution("a", "alpha"),
                solution("b", "Beta"),
                solution("a2", "Alpha"),
            ],
        );
        let names: Vec<_> = snap.iter().map(|s| s.friendly_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "Beta", "Zulu"]);
    }

    #[test]
    fn solution_id_accepts_braced_guid() {
        let id: SolutionId = "{fd140aaf-4df4-11dd-bd17-0019b9312238}".parse().unwrap();
        assert_eq!(id.to_string(), "fd140aaf-4df4-11dd-bd17-0019b9312238");
        assert!("not-a-guid".parse::<SolutionId>().is_err());
    }

    #[test]
    fn lookup_by_unique_name() {
        let snap = Snapshot::new(1, vec![solution("sol1", "Alpha")]);
        assert!(snap.by_unique_name("sol1").is_some());
        assert!(snap.by_unique_name("sol2").is_none());
    }
}
