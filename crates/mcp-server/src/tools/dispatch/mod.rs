//! MCP tool dispatch for OAK
//!
//! Provides ontology term search capabilities to AI agents via MCP protocol.

use super::schemas::search::SearchOntologyRequest;
use super::schemas::term_details::TermDetailsRequest;
use anyhow::Result;
use oak_ontology::{OakConfig, OntologySearch};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::sync::Arc;

mod router;

const INSTRUCTIONS: &str = "OAK MCP searches biomedical ontologies. Use 'search_ontology_with_oak' with an ontology reference such as 'ols:mondo' (diseases), 'ols:hp' (phenotypes), 'ols:go', 'ols:chebi', 'ols:uberon', 'ols:cl' or 'sqlite:obo:hgnc' (gene symbols) to find term ids, then 'get_term_details' for a definition and synonyms. Omit the ontology to search across every OLS ontology. Prefer 'ols:' references for non-exact matches; for composite concepts search the parts separately.";

/// OAK MCP Service
#[derive(Clone)]
pub struct OakMcpService {
    /// Search core (backend cache is shared by every clone)
    search: Arc<OntologySearch>,
    /// Tool router
    tool_router: ToolRouter<Self>,
}

impl OakMcpService {
    pub fn new(search: OntologySearch) -> Self {
        Self {
            search: Arc::new(search),
            tool_router: Self::tool_router(),
        }
    }

    pub fn from_config(config: OakConfig) -> Result<Self> {
        Ok(Self::new(OntologySearch::from_config(config)?))
    }
}

#[tool_handler]
impl ServerHandler for OakMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl OakMcpService {
    /// Search an ontology for a term
    #[tool(
        description = "Search an OBO ontology for a term and return ranked matches (id, label, description, score). Synonyms are searched but may be incomplete, so retry with related or broader terms, case variations, or the parts of a composite term when nothing fits."
    )]
    pub async fn search_ontology_with_oak(
        &self,
        Parameters(request): Parameters<SearchOntologyRequest>,
    ) -> Result<CallToolResult, McpError> {
        router::search::search(self, request).await
    }

    /// Term details by id
    #[tool(
        description = "Get the label, definition and synonyms of one ontology term by CURIE (e.g. 'MONDO:0005015'). Use after search_ontology_with_oak to confirm a term."
    )]
    pub async fn get_term_details(
        &self,
        Parameters(request): Parameters<TermDetailsRequest>,
    ) -> Result<CallToolResult, McpError> {
        router::term_details::term_details(self, request).await
    }
}
