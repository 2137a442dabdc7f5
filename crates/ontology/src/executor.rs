use crate::backend::RawMatch;
use crate::error::{BackendError, OntologyError, Result};
use crate::resolver::BackendHandle;
use oak_protocol::TermDetails;
use std::future::Future;
use std::time::Duration;

/// Runs backend calls under the handle's in-flight limit and a per-call timeout.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Search `handle` for `term`, returning at most `limit` raw matches.
    pub async fn execute(
        &self,
        handle: &BackendHandle,
        term: &str,
        limit: usize,
    ) -> Result<Vec<RawMatch>> {
        let mut matches = self
            .bounded(handle, handle.session().search(term, limit))
            .await?;
        if matches.len() > limit {
            log::debug!(
                "{} returned {} matches for limit {limit}; truncating",
                handle.reference(),
                matches.len()
            );
            matches.truncate(limit);
        }
        Ok(matches)
    }

    pub async fn details(
        &self,
        handle: &BackendHandle,
        term_id: &str,
    ) -> Result<Option<TermDetails>> {
        self.bounded(handle, handle.session().term_details(term_id))
            .await
    }

    async fn bounded<T>(
        &self,
        handle: &BackendHandle,
        call: impl Future<Output = std::result::Result<T, BackendError>>,
    ) -> Result<T> {
        let guarded = async {
            let _permit = handle
                .permits()
                .acquire()
                .await
                .map_err(|err| BackendError::Internal(format!("backend handle closed: {err}")))?;
            call.await
        };

        let outcome = match tokio::time::timeout(self.timeout, guarded).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        };
        outcome.map_err(|cause| OntologyError::QueryFailed {
            backend: handle.reference().to_string(),
            cause,
        })
    }
}
