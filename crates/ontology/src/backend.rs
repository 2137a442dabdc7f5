//! Capability interface every ontology backend implements.
//!
//! A [`OntologySource`] knows how to open one ontology of its family; the resulting
//! [`OntologyHandle`] answers searches and term lookups for that ontology only.

use crate::error::BackendError;
use crate::sources::ols::OlsDoc;
use crate::sources::semsql::SemSqlRow;
use async_trait::async_trait;
use oak_protocol::TermDetails;
use std::sync::Arc;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[async_trait]
pub trait OntologySource: Send + Sync {
    /// Open the ontology named by `code` (already normalized by reference parsing).
    async fn open(&self, code: &str) -> BackendResult<Arc<dyn OntologyHandle>>;
}

#[async_trait]
pub trait OntologyHandle: Send + Sync {
    /// How many searches this handle tolerates in flight at once.
    fn max_in_flight(&self) -> usize {
        1
    }

    async fn search(&self, term: &str, limit: usize) -> BackendResult<Vec<RawMatch>>;

    async fn term_details(&self, term_id: &str) -> BackendResult<Option<TermDetails>>;
}

/// One search hit in the shape its backend produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMatch {
    Ols(OlsDoc),
    SemSql(SemSqlRow),
}
