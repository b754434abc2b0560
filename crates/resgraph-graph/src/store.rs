use crate::query::GraphQuery;
use async_trait::async_trait;
use resgraph_core::{Record, Result};

/// A connection-managing graph backend that hands out transactions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// One open transaction. It must be finished with exactly one of
/// [`commit`](GraphTransaction::commit) or [`rollback`](GraphTransaction::rollback).
#[async_trait]
pub trait GraphTransaction: Send {
    async fn execute(&mut self, query: &GraphQuery) -> Result<Vec<Record>>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
