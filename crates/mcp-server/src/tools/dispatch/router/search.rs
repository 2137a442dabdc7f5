use super::super::{CallToolResult, Content, McpError, OakMcpService, SearchOntologyRequest};
use crate::tools::context_doc::ContextDocBuilder;
use oak_protocol::SearchResponse;

use super::error::{attach_structured_content, tool_failure};

const MAX_DESCRIPTION_CHARS: usize = 240;

fn clip(text: &str, max_chars: usize) -> String {
    let mut out = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some((idx, _)) = out.char_indices().nth(max_chars) {
        out.truncate(idx);
        out.push('…');
    }
    out
}

fn render(response: &SearchResponse) -> String {
    let mut doc = ContextDocBuilder::new();
    doc.push_answer(&format!(
        "{} result(s) for '{}' in {}",
        response.results.len(),
        response.term,
        response.ontology
    ));
    for term in &response.results {
        doc.push_ref(&term.id, &term.label, Some(term.score));
        if let Some(description) = term.description.as_deref() {
            doc.push_block_smart(&clip(description, MAX_DESCRIPTION_CHARS));
        }
    }
    if response.results.is_empty() {
        doc.push_note("no matches; try a broader term, a synonym or another ontology");
    } else if response.truncated {
        doc.push_note(&format!(
            "showing {} of {} fetched candidates; raise n for more",
            response.results.len(),
            response.total
        ));
    }
    doc.finish()
}

/// Ranked term search within one ontology, or across OLS when none is given.
pub(in crate::tools::dispatch) async fn search(
    service: &OakMcpService,
    request: SearchOntologyRequest,
) -> Result<CallToolResult, McpError> {
    let n = request
        .n
        .unwrap_or_else(|| i64::try_from(service.search.config().default_limit).unwrap_or(10));

    let response = match service
        .search
        .search(&request.term, request.ontology.as_deref(), n)
        .await
    {
        Ok(response) => response,
        Err(failure) => {
            log::warn!(
                "search_ontology_with_oak failed for '{}' in '{}': {failure}",
                request.term,
                request.ontology.as_deref().unwrap_or("all OLS ontologies")
            );
            return Ok(tool_failure(&failure));
        }
    };

    let result = CallToolResult::success(vec![Content::text(render(&response))]);
    Ok(attach_structured_content(
        result,
        &response,
        "search_ontology_with_oak",
    ))
}
