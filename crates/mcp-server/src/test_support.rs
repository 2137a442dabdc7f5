use crate::OakMcpService;
use async_trait::async_trait;
use oak_ontology::sources::OlsDoc;
use oak_ontology::{
    BackendCache, BackendError, BackendResolver, BackendResult, OakConfig, OntologyHandle,
    OntologySearch, OntologySource, RawMatch, SourceKind, TermDetails,
};
use std::sync::Arc;

/// In-memory OLS stand-in: every ontology except `doesnotexist` serves the same documents.
pub(crate) struct StaticSource {
    docs: Vec<OlsDoc>,
}

struct StaticHandle {
    ontology: String,
    docs: Vec<OlsDoc>,
}

#[async_trait]
impl OntologySource for StaticSource {
    async fn open(&self, code: &str) -> BackendResult<Arc<dyn OntologyHandle>> {
        if code == "doesnotexist" {
            return Err(BackendError::UnknownOntology(code.to_string()));
        }
        Ok(Arc::new(StaticHandle {
            ontology: code.to_string(),
            docs: self.docs.clone(),
        }))
    }
}

#[async_trait]
impl OntologyHandle for StaticHandle {
    async fn search(&self, _term: &str, limit: usize) -> BackendResult<Vec<RawMatch>> {
        Ok(self
            .docs
            .iter()
            .take(limit)
            .cloned()
            .map(RawMatch::Ols)
            .collect())
    }

    async fn term_details(&self, term_id: &str) -> BackendResult<Option<TermDetails>> {
        Ok(self
            .docs
            .iter()
            .find(|doc| doc.obo_id.as_deref() == Some(term_id))
            .map(|doc| TermDetails {
                id: term_id.to_string(),
                label: doc.label.clone().unwrap_or_default(),
                definition: doc.description.first().cloned(),
                synonyms: vec!["malignant tumor".to_string()],
                ontology: self.ontology.clone(),
                iri: doc.iri.clone(),
            }))
    }
}

pub(crate) fn mondo_doc(id: &str, label: &str, score: f64) -> OlsDoc {
    OlsDoc {
        obo_id: Some(id.to_string()),
        label: Some(label.to_string()),
        description: vec![format!("Definition of {label}.")],
        ontology_name: Some("mondo".to_string()),
        score: Some(score),
        ..OlsDoc::default()
    }
}

pub(crate) fn service_with_docs(docs: Vec<OlsDoc>) -> OakMcpService {
    let config = OakConfig::default();
    let resolver = BackendResolver::new(
        SourceKind::Ols,
        config.open_timeout(),
        Arc::new(BackendCache::new()),
    )
    .with_source(SourceKind::Ols, Arc::new(StaticSource { docs }));
    OakMcpService::new(OntologySearch::new(config, resolver))
}
