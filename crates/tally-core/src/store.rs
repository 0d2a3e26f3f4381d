//! Persistence abstraction for visit records.

use crate::visit::{NewVisit, VisitRecord};

/// The single writer and source of truth for visit rows.
///
/// Handlers receive an `Arc<dyn VisitStore>` through application state, so
/// tests can swap in a substitute store.
#[async_trait::async_trait]
pub trait VisitStore: Send + Sync + 'static {
    /// Persist one visit and return its newly assigned id.
    async fn insert_visit(&self, visit: &NewVisit) -> anyhow::Result<i64>;

    /// Return up to `limit` rows, newest first.
    async fn recent_visits(&self, limit: usize) -> anyhow::Result<Vec<VisitRecord>>;

    /// Trivial round-trip used by the health check.
    async fn ping(&self) -> anyhow::Result<()>;
}
