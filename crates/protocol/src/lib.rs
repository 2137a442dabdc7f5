use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const RESPONSE_SCHEMA_VERSION: u32 = 1;

/// One ontology term in the uniform shape returned to agents, whichever backend produced it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct OntologyTerm {
    /// Term identifier, usually a CURIE such as `MONDO:0004992`.
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ontology the term was found in (e.g. `mondo`).
    pub ontology: String,
    /// Relevance score; only comparable between results of the same call.
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct SearchResponse {
    pub schema_version: u32,
    /// Normalized ontology reference that served the call (e.g. `ols:mondo`, `ols:*` for a
    /// search across every OLS ontology).
    pub ontology: String,
    pub term: String,
    pub results: Vec<OntologyTerm>,
    /// Candidates fetched and ranked before truncation to the requested count. Backends are
    /// asked for a bounded candidate pool, so this is a lower bound on the matches that exist,
    /// not the backend's full hit count.
    pub total: usize,
    pub truncated: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct TermDetails {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub ontology: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iri: Option<String>,
}

/// Pipeline stage that produced a failure.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Validate,
    Resolve,
    Query,
    Normalize,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Resolve => "resolve",
            Self::Query => "query",
            Self::Normalize => "normalize",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ToolNextAction {
    pub tool: String,
    pub args: serde_json::Value,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub stage: FailureStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub retryable: bool,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
    #[serde(default)]
    pub next_actions: Vec<ToolNextAction>,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
