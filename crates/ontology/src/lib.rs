//! Ontology search core for OAK MCP.
//!
//! Turns an agent's `(term, ontology, n)` request into ranked ontology terms:
//! the [`BackendResolver`] maps a reference such as `ols:mondo` to a cached backend handle,
//! the [`QueryExecutor`] runs the backend search under a timeout, [`normalize`] converts the
//! backend records into [`OntologyTerm`]s and [`rank_and_limit`] orders and truncates them.
//! [`OntologySearch`] wires the stages together per call.

mod backend;
mod config;
mod dispatcher;
mod error;
mod executor;
mod normalize;
mod rank;
mod reference;
mod resolver;
pub mod sources;

pub use backend::{BackendResult, OntologyHandle, OntologySource, RawMatch};
pub use config::{OakConfig, DEFAULT_OLS_URL};
pub use dispatcher::OntologySearch;
pub use error::{BackendError, OntologyError, Result, SearchFailure};
pub use executor::QueryExecutor;
pub use normalize::normalize;
pub use oak_protocol::{OntologyTerm, SearchResponse, TermDetails};
pub use rank::rank_and_limit;
pub use reference::{curie_prefix, OntologyReference, SourceKind, ALL_ONTOLOGIES};
pub use resolver::{BackendCache, BackendHandle, BackendResolver};
