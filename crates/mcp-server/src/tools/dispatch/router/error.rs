use super::super::{CallToolResult, Content};
use crate::tools::context_doc::ContextDocBuilder;
use oak_ontology::{BackendError, OntologyError, SearchFailure};
use oak_protocol::{ErrorEnvelope, FailureStage, ToolNextAction};
use serde::Serialize;
use serde_json::json;

const SEARCH_TOOL: &str = "search_ontology_with_oak";

fn hint_for(error: &OntologyError) -> Option<String> {
    match error {
        OntologyError::InvalidArgument(_) => None,
        OntologyError::InvalidReference { .. } => Some(
            "Use '<source>:<code>' such as 'ols:mondo', 'ols:hp' or 'sqlite:obo:hgnc'; a bare code like 'mondo' uses the default source."
                .to_string(),
        ),
        OntologyError::BackendUnavailable {
            cause: BackendError::UnknownOntology(_),
            ..
        } => Some("Check the ontology code; common ones are mondo, hp, go, chebi, uberon, cl.".to_string()),
        OntologyError::BackendUnavailable { .. } | OntologyError::QueryFailed { .. } => {
            Some("The backend may be temporarily unreachable; retry later.".to_string())
        }
        OntologyError::TermNotFound { .. } => {
            Some("Search for the term by label to find its current id.".to_string())
        }
    }
}

fn details_for(error: &OntologyError) -> Option<serde_json::Value> {
    match error {
        OntologyError::InvalidArgument(_) => None,
        OntologyError::InvalidReference { reference, reason } => {
            Some(json!({ "reference": reference, "reason": reason }))
        }
        OntologyError::BackendUnavailable { cause, .. } | OntologyError::QueryFailed { cause, .. } => {
            Some(json!({ "cause": cause.to_string() }))
        }
        OntologyError::TermNotFound { term_id, .. } => Some(json!({ "term_id": term_id })),
    }
}

fn next_actions_for(error: &OntologyError) -> Vec<ToolNextAction> {
    match error {
        OntologyError::TermNotFound { term_id, backend } => vec![ToolNextAction {
            tool: SEARCH_TOOL.to_string(),
            args: json!({ "term": term_id, "ontology": backend }),
            reason: "Look the term up by text instead of id.".to_string(),
        }],
        _ => Vec::new(),
    }
}

/// Map a pipeline failure onto the wire envelope.
pub(in crate::tools::dispatch) fn failure_envelope(failure: &SearchFailure) -> ErrorEnvelope {
    let error = &failure.error;
    ErrorEnvelope {
        code: error.code().to_string(),
        message: error.to_string(),
        stage: failure.stage,
        backend: error.backend().map(str::to_string),
        retryable: error.retryable(),
        details: details_for(error),
        hint: hint_for(error),
        next_actions: next_actions_for(error),
    }
}

pub(in crate::tools::dispatch) fn tool_failure(failure: &SearchFailure) -> CallToolResult {
    tool_error_envelope(failure_envelope(failure))
}

pub(in crate::tools::dispatch) fn tool_error_envelope(error: ErrorEnvelope) -> CallToolResult {
    let mut doc = ContextDocBuilder::new();
    doc.push_answer(&format!("error: {}", error.code));
    doc.push_note(&error.message);
    doc.push_note(&format!(
        "stage={} retryable={}",
        error.stage.as_str(),
        error.retryable
    ));
    if let Some(hint) = error.hint.as_deref() {
        if !hint.trim().is_empty() {
            doc.push_note(&format!("hint: {hint}"));
        }
    }
    for action in &error.next_actions {
        doc.push_note(&format!("next: {} ({})", action.tool, action.reason));
    }

    let mut result = CallToolResult::error(vec![Content::text(doc.finish())]);
    result.structured_content = Some(json!({ "error": error }));
    result
}

pub(in crate::tools::dispatch) fn internal_error(
    stage: FailureStage,
    message: impl Into<String>,
) -> CallToolResult {
    tool_error_envelope(ErrorEnvelope {
        code: "internal".to_string(),
        message: message.into(),
        stage,
        backend: None,
        retryable: false,
        details: None,
        hint: None,
        next_actions: Vec::new(),
    })
}

pub(in crate::tools::dispatch) fn attach_structured_content<T: Serialize>(
    mut result: CallToolResult,
    payload: &T,
    tool: &'static str,
) -> CallToolResult {
    match serde_json::to_value(payload) {
        Ok(value) => {
            result.structured_content = Some(value);
            result
        }
        Err(err) => internal_error(
            FailureStage::Normalize,
            format!("failed to serialize {tool} structured_content ({err})"),
        ),
    }
}
