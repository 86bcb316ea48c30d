use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteError;
use crate::model::{EntityKind, SolutionId};
use crate::query::{attr, QueryExpression};
use crate::record::RawRecord;
use crate::service::DataService;

/// In-memory data service for tests and demos. Not durable.
///
/// Evaluates conditions, ordering and column sets the way the remote platform does, records
/// every call, and can be told to fail specific operations.
#[derive(Default)]
pub struct InMemoryDataService {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: Vec<(EntityKind, SolutionId, RawRecord)>,
    query_failure: Option<RemoteError>,
    delete_failures: HashMap<SolutionId, RemoteError>,
    queries: Vec<QueryExpression>,
    deletes: Vec<(EntityKind, SolutionId)>,
}

impl InMemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a raw record as-is. The primary id attribute is added if missing.
    pub fn insert_record(&self, entity: EntityKind, id: SolutionId, mut record: RawRecord) {
        let key = primary_key(&entity);
        if record.get(&key).is_none() {
            record.insert(&key, id.to_string());
        }
        self.lock().records.push((entity, id, record));
    }

    /// Convenience: adds a well-formed solution and returns its id.
    pub fn add_solution(&self, unique_name: &str, friendly_name: &str, managed: bool) -> SolutionId {
        let id = SolutionId::new();
        let record = RawRecord::new()
            .with(attr::UNIQUE_NAME, unique_name)
            .with(attr::FRIENDLY_NAME, friendly_name)
            .with(attr::VERSION, "1.0.0.0")
            .with(attr::IS_MANAGED, managed)
            .with(attr::DESCRIPTION, Value::Null)
            .with(attr::INSTALLED_ON, "2024-01-15T08:30:00Z");
        self.insert_record(EntityKind::solution(), id, record);
        id
    }

    /// Makes every following query fail with `err`.
    pub fn fail_queries(&self, err: RemoteError) {
        self.lock().query_failure = Some(err);
    }

    /// Makes deleting `id` fail with `err` (the record is kept).
    pub fn fail_delete(&self, id: SolutionId, err: RemoteError) {
        self.lock().delete_failures.insert(id, err);
    }

    /// Every query received so far.
    pub fn queries(&self) -> Vec<QueryExpression> {
        self.lock().queries.clone()
    }

    /// Every delete attempted so far, including failed ones.
    pub fn delete_calls(&self) -> Vec<(EntityKind, SolutionId)> {
        self.lock().deletes.clone()
    }

    pub fn contains(&self, id: &SolutionId) -> bool {
        self.lock().records.iter().any(|(_, rid, _)| rid == id)
    }
}

fn primary_key(entity: &EntityKind) -> String {
    format!("{}id", entity.as_str())
}

#[async_trait]
impl DataService for InMemoryDataService {
    async fn query(&self, query: &QueryExpression) -> Result<Vec<RawRecord>, RemoteError> {
        let mut inner = self.lock();
        inner.queries.push(query.clone());
        if let Some(err) = inner.query_failure.clone() {
            return Err(err);
        }

        let mut columns = query.columns.clone();
        columns.push(primary_key(&query.entity));

        let mut rows: Vec<RawRecord> = inner
            .records
            .iter()
            .filter(|(kind, _, rec)| kind == &query.entity && query.matches(rec))
            .map(|(_, _, rec)| rec.clone())
            .collect();
        rows.sort_by(|a, b| query.compare(a, b));

        // Empty column set means "all columns".
        if query.columns.is_empty() {
            return Ok(rows);
        }
        Ok(rows.iter().map(|r| r.project(&columns)).collect())
    }

    async fn delete(&self, entity: &EntityKind, id: &SolutionId) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.deletes.push((entity.clone(), *id));
        if let Some(err) = inner.delete_failures.get(id).cloned() {
            return Err(err);
        }
        let before = inner.records.len();
        inner.records.retain(|(kind, rid, _)| !(kind == entity && rid == id));
        if inner.records.len() == before {
            return Err(RemoteError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
