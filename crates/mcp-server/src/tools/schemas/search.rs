use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchOntologyRequest {
    /// Term to search for
    #[schemars(
        description = "The term to search for. Synonyms are searched too, but may be incomplete: if nothing fits, retry with related or broader terms and case variations."
    )]
    pub term: String,

    /// Ontology reference
    #[schemars(
        description = "Ontology to search, as '<source>:<ontology>'. Prefer 'ols:' (EBI Ontology Lookup Service), e.g. 'ols:mondo' (diseases), 'ols:hp' (phenotypes), 'ols:go' (functions, processes, components), 'ols:chebi' (chemicals), 'ols:uberon' (anatomy), 'ols:cl' (cell types), 'ols:so' (sequence features), 'ols:pr' (proteins), 'ols:ncit' (clinical research), 'ols:snomed' (clinical concepts incl. LOINC). Local Semantic-SQL databases use 'sqlite:obo:<name>', e.g. 'sqlite:obo:hgnc' for human gene symbols. A bare name like 'mondo' uses the default source. Omit to search across every OLS ontology."
    )]
    #[serde(default)]
    pub ontology: Option<String>,

    /// Maximum results (default: 10)
    #[schemars(description = "Maximum number of results to return (default 10, max 50)")]
    pub n: Option<i64>,
}
