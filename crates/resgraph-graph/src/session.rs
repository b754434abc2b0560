use crate::store::{GraphStore, GraphTransaction};
use futures::future::BoxFuture;
use resgraph_core::Result;
use std::sync::Arc;
use tracing::warn;

/// Scopes units of work to transactions on an injected [`GraphStore`].
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn GraphStore>,
}

impl Session {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Run `work` in a fresh transaction. Commits when `work` succeeds and
    /// rolls back when it fails; the transaction never outlives this call.
    ///
    /// ```ignore
    /// let records = session
    ///     .run(move |tx| Box::pin(async move { query::get_node(tx, RESOURCE_LABEL, id).await }))
    ///     .await?;
    /// ```
    pub async fn run<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn GraphTransaction) -> BoxFuture<'t, Result<T>> + Send,
    {
        let mut tx = self.store.begin().await?;
        let outcome = work(tx.as_mut()).await;
        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        backend = self.store.backend_name(),
                        error = %rollback_err,
                        "rollback failed after query error"
                    );
                }
                Err(err)
            }
        }
    }
}
