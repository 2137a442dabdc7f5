//! OAK MCP Server
//!
//! Provides ontology term search to AI agents via the MCP protocol.
//!
//! ## Tools
//!
//! - `search_ontology_with_oak` - Search an ontology (`ols:mondo`, `sqlite:obo:hgnc`, ...) for a term
//! - `get_term_details` - Label, definition and synonyms for one term id
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "oak": {
//!       "command": "oak-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use oak_ontology::OakConfig;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

#[cfg(test)]
mod test_support;
mod tools;

pub use tools::OakMcpService;

pub async fn main_entry() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .filter_module("hyper", log::LevelFilter::Warn)
        .filter_module("reqwest", log::LevelFilter::Warn)
        .filter_module("sqlx", log::LevelFilter::Warn)
        .init();

    let config = OakConfig::load().context("Invalid OAK MCP configuration")?;
    log::info!(
        "Starting OAK MCP server (default source {}, OLS at {})",
        config.default_source,
        config.ols_base_url
    );

    let service = OakMcpService::from_config(config)?;
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("OAK MCP server stopped");
    Ok(())
}
