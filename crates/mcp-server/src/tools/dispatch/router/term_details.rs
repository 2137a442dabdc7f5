use super::super::{CallToolResult, Content, McpError, OakMcpService, TermDetailsRequest};
use crate::tools::context_doc::ContextDocBuilder;
use oak_protocol::TermDetails;

use super::error::{attach_structured_content, tool_failure};

fn render(details: &TermDetails) -> String {
    let mut doc = ContextDocBuilder::new();
    doc.push_answer(&format!("{} ({})", details.id, details.ontology));
    doc.push_ref(&details.id, &details.label, None);
    if let Some(definition) = details.definition.as_deref() {
        doc.push_block_smart(definition);
    }
    if !details.synonyms.is_empty() {
        doc.push_note(&format!("synonyms: {}", details.synonyms.join("; ")));
    }
    if let Some(iri) = details.iri.as_deref() {
        doc.push_note(&format!("iri: {iri}"));
    }
    doc.finish()
}

/// Label, definition and synonyms for one CURIE.
pub(in crate::tools::dispatch) async fn term_details(
    service: &OakMcpService,
    request: TermDetailsRequest,
) -> Result<CallToolResult, McpError> {
    let details = match service
        .search
        .term_details(&request.term_id, request.ontology.as_deref())
        .await
    {
        Ok(details) => details,
        Err(failure) => return Ok(tool_failure(&failure)),
    };

    let result = CallToolResult::success(vec![Content::text(render(&details))]);
    Ok(attach_structured_content(result, &details, "get_term_details"))
}
