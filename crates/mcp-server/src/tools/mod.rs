//! OAK MCP tool surface.
//!
//! Schemas, dispatch and text rendering live in separate submodules; the ontology work itself
//! happens in `oak-ontology`.

mod context_doc;
mod dispatch;
mod schemas;

pub use dispatch::OakMcpService;
