//! Backend-specific match records → uniform [`OntologyTerm`]s.

use crate::backend::RawMatch;
use crate::sources::{OlsDoc, SemSqlRow};
use oak_protocol::OntologyTerm;

/// Fields every backend can contribute, before gaps are filled.
#[derive(Debug, Default)]
struct Candidate {
    id: Option<String>,
    label: Option<String>,
    description: Option<String>,
    ontology: Option<String>,
    score: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn from_ols(doc: OlsDoc) -> Candidate {
    let id = non_empty(doc.obo_id)
        .or_else(|| non_empty(doc.short_form).map(|s| s.replacen('_', ":", 1)))
        .or_else(|| non_empty(doc.iri));
    Candidate {
        id,
        label: non_empty(doc.label),
        description: doc
            .description
            .into_iter()
            .find_map(|d| non_empty(Some(d))),
        ontology: non_empty(doc.ontology_name)
            .or_else(|| non_empty(doc.ontology_prefix).map(|p| p.to_ascii_lowercase())),
        score: doc.score.filter(|s| s.is_finite()),
    }
}

fn from_semsql(row: SemSqlRow) -> Candidate {
    Candidate {
        id: non_empty(Some(row.subject)),
        label: non_empty(row.label),
        description: non_empty(row.definition),
        ontology: None,
        score: None,
    }
}

/// Map backend matches into the uniform schema, preserving input order.
///
/// Matches with neither identifier nor label are dropped. Backend scores are kept only when
/// every surviving match has one; otherwise all results get a rank-derived score so that
/// scores within one call stay comparable.
pub fn normalize(matches: Vec<RawMatch>, source_ontology: &str) -> Vec<OntologyTerm> {
    let kept: Vec<(String, String, Candidate)> = matches
        .into_iter()
        .map(|raw| match raw {
            RawMatch::Ols(doc) => from_ols(doc),
            RawMatch::SemSql(row) => from_semsql(row),
        })
        .filter_map(|mut candidate| {
            let (id, label) = match (candidate.id.take(), candidate.label.take()) {
                (Some(id), Some(label)) => (id, label),
                (Some(id), None) => (id.clone(), id),
                (None, Some(label)) => (label.clone(), label),
                (None, None) => {
                    log::debug!("Skipping {source_ontology} match without identifier or label");
                    return None;
                }
            };
            Some((id, label, candidate))
        })
        .collect();

    let native_scores = !kept.is_empty() && kept.iter().all(|(_, _, c)| c.score.is_some());
    let len = kept.len();

    kept.into_iter()
        .enumerate()
        .map(|(idx, (id, label, candidate))| {
            let score = match candidate.score {
                Some(score) if native_scores => score,
                _ => (len - idx) as f64 / len as f64,
            };
            OntologyTerm {
                id,
                label,
                description: candidate.description,
                ontology: candidate
                    .ontology
                    .unwrap_or_else(|| source_ontology.to_string()),
                score,
            }
        })
        .collect()
}
