//! EBI Ontology Lookup Service (OLS4) backend.

use crate::backend::{BackendResult, OntologyHandle, OntologySource, RawMatch};
use crate::error::BackendError;
use crate::reference::ALL_ONTOLOGIES;
use async_trait::async_trait;
use oak_protocol::TermDetails;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const SEARCH_FIELDS: &str =
    "iri,obo_id,short_form,label,description,ontology_name,ontology_prefix,score";
const MAX_IN_FLIGHT: usize = 8;

/// A document from the OLS `/api/search` endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct OlsDoc {
    pub iri: Option<String>,
    pub obo_id: Option<String>,
    pub short_form: Option<String>,
    pub label: Option<String>,
    pub description: Vec<String>,
    pub ontology_name: Option<String>,
    pub ontology_prefix: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    docs: Vec<OlsDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TermsPage {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedTerms>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmbeddedTerms {
    terms: Vec<OlsTerm>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OlsTerm {
    iri: Option<String>,
    obo_id: Option<String>,
    label: Option<String>,
    description: Vec<String>,
    synonyms: Vec<String>,
    ontology_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OntologyInfo {
    #[serde(rename = "ontologyId")]
    ontology_id: Option<String>,
    status: Option<String>,
}

pub fn parse_search_page(bytes: &[u8]) -> BackendResult<Vec<OlsDoc>> {
    let page: SearchPage = serde_json::from_slice(bytes)
        .map_err(|err| BackendError::Malformed(format!("OLS search page: {err}")))?;
    Ok(page.response.docs)
}

pub fn parse_terms_page(bytes: &[u8]) -> BackendResult<Option<TermDetails>> {
    let page: TermsPage = serde_json::from_slice(bytes)
        .map_err(|err| BackendError::Malformed(format!("OLS terms page: {err}")))?;
    let Some(term) = page.embedded.and_then(|e| e.terms.into_iter().next()) else {
        return Ok(None);
    };
    let Some(id) = term.obo_id.clone().or_else(|| term.iri.clone()) else {
        return Ok(None);
    };
    Ok(Some(TermDetails {
        label: term.label.unwrap_or_else(|| id.clone()),
        definition: term
            .description
            .into_iter()
            .map(|d| d.trim().to_string())
            .find(|d| !d.is_empty()),
        synonyms: term.synonyms,
        ontology: term.ontology_name.unwrap_or_default(),
        iri: term.iri,
        id,
    }))
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Transport(format!("request timed out: {err}"))
        } else if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

pub struct OlsSource {
    client: Client,
    base_url: String,
}

impl OlsSource {
    pub fn new(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("oak-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl OntologySource for OlsSource {
    async fn open(&self, code: &str) -> BackendResult<Arc<dyn OntologyHandle>> {
        if code == ALL_ONTOLOGIES {
            return Ok(Arc::new(OlsOntology {
                client: self.client.clone(),
                base_url: self.base_url.clone(),
                code: None,
            }));
        }

        let url = format!("{}/api/ontologies/{code}", self.base_url);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::UnknownOntology(code.to_string()));
        }
        if !response.status().is_success() {
            return Err(BackendError::Transport(format!(
                "GET {url} returned HTTP {}",
                response.status()
            )));
        }
        let bytes = response.bytes().await?;
        let info: OntologyInfo = serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::Malformed(format!("OLS ontology record: {err}")))?;
        if info.ontology_id.is_none() {
            return Err(BackendError::UnknownOntology(code.to_string()));
        }
        log::debug!(
            "OLS ontology {code} opened (status={})",
            info.status.as_deref().unwrap_or("unknown")
        );

        Ok(Arc::new(OlsOntology {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            code: Some(code.to_string()),
        }))
    }
}

/// One OLS ontology, or every hosted ontology when `code` is `None`.
struct OlsOntology {
    client: Client,
    base_url: String,
    code: Option<String>,
}

impl OlsOntology {
    fn search_query(&self, term: &str, limit: usize) -> Vec<(&'static str, String)> {
        let mut query = vec![("q", term.to_string())];
        if let Some(code) = &self.code {
            query.push(("ontology", code.clone()));
        }
        query.push(("rows", limit.to_string()));
        query.push(("fieldList", SEARCH_FIELDS.to_string()));
        query
    }

    fn terms_url(&self) -> String {
        match &self.code {
            Some(code) => format!("{}/api/ontologies/{code}/terms", self.base_url),
            None => format!("{}/api/terms", self.base_url),
        }
    }

    async fn get_bytes(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> BackendResult<Option<Vec<u8>>> {
        let response = self.client.get(url).query(query).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BackendError::Transport(format!(
                "GET {url} returned HTTP {}",
                response.status()
            )));
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }
}

#[async_trait]
impl OntologyHandle for OlsOntology {
    fn max_in_flight(&self) -> usize {
        MAX_IN_FLIGHT
    }

    async fn search(&self, term: &str, limit: usize) -> BackendResult<Vec<RawMatch>> {
        let url = format!("{}/api/search", self.base_url);
        let query = self.search_query(term, limit);
        let bytes = self
            .get_bytes(&url, &query)
            .await?
            .ok_or_else(|| BackendError::Malformed(format!("GET {url} returned HTTP 404")))?;
        let docs = parse_search_page(&bytes)?;
        Ok(docs.into_iter().map(RawMatch::Ols).collect())
    }

    async fn term_details(&self, term_id: &str) -> BackendResult<Option<TermDetails>> {
        let url = self.terms_url();
        let Some(bytes) = self
            .get_bytes(&url, &[("obo_id", term_id.to_string())])
            .await?
        else {
            return Ok(None);
        };
        let details = parse_terms_page(&bytes)?;
        Ok(details.map(|mut details| {
            if details.ontology.is_empty() {
                if let Some(code) = &self.code {
                    details.ontology = code.clone();
                }
            }
            details
        }))
    }
}
