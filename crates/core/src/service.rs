use async_trait::async_trait;

use crate::error::RemoteError;
use crate::model::{EntityKind, SolutionId};
use crate::query::QueryExpression;
use crate::record::RawRecord;

/// Remote data service the inventory reads from and the deletion workflow deletes through.
///
/// Authentication, transport and retries belong to the implementation.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Returns every record matching `query`, in the query's order.
    async fn query(&self, query: &QueryExpression) -> Result<Vec<RawRecord>, RemoteError>;

    /// Deletes one record. A record that no longer exists yields [`RemoteError::NotFound`].
    async fn delete(&self, entity: &EntityKind, id: &SolutionId) -> Result<(), RemoteError>;
}
