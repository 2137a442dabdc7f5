use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TermDetailsRequest {
    /// Term identifier (CURIE)
    #[schemars(description = "Term identifier as a CURIE, e.g. 'MONDO:0005015' or 'HP:0001627'")]
    pub term_id: String,

    /// Optional ontology reference
    #[schemars(
        description = "Ontology reference to look the term up in (e.g. 'ols:mondo', 'sqlite:obo:hgnc'). Defaults to the ontology named by the CURIE prefix."
    )]
    pub ontology: Option<String>,
}
