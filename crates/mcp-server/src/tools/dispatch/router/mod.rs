// Per-tool dispatch functions used by the MCP tool router.

pub(super) mod error;
pub(super) mod search;
pub(super) mod term_details;
