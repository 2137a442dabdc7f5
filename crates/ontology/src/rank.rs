use oak_protocol::OntologyTerm;
use std::cmp::Ordering;

fn compare(a: &OntologyTerm, b: &OntologyTerm) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.id.cmp(&b.id))
}

/// Order by score descending (ties by identifier ascending), then keep the first `limit`.
pub fn rank_and_limit(mut results: Vec<OntologyTerm>, limit: usize) -> Vec<OntologyTerm> {
    results.sort_by(compare);
    results.truncate(limit);
    results
}
