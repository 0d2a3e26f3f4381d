use async_trait::async_trait;
use tally_core::{
    store::VisitStore,
    visit::{NewVisit, VisitRecord},
};

use crate::DuckDbBackend;

#[async_trait]
impl VisitStore for DuckDbBackend {
    async fn insert_visit(&self, visit: &NewVisit) -> anyhow::Result<i64> {
        DuckDbBackend::insert_visit(self, visit).await
    }

    async fn recent_visits(&self, limit: usize) -> anyhow::Result<Vec<VisitRecord>> {
        DuckDbBackend::recent_visits(self, limit).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbBackend::ping(self).await
    }
}
