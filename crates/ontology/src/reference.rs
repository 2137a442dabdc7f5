use crate::error::{OntologyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend family an ontology reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// EBI Ontology Lookup Service.
    Ols,
    /// Local Semantic-SQL database.
    Sqlite,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Ols, SourceKind::Sqlite];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Ols => "ols",
            Self::Sqlite => "sqlite",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// OLS code that searches every ontology the service hosts.
pub const ALL_ONTOLOGIES: &str = "*";

/// Parsed `<source>:<code>` reference. The normalized form doubles as the backend cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OntologyReference {
    source: SourceKind,
    code: String,
    normalized: String,
}

impl OntologyReference {
    /// Parse a raw reference. A reference without a source tag uses `default_source`; under a
    /// sqlite default a bare name such as `hgnc` means `obo:hgnc`.
    pub fn parse(raw: &str, default_source: SourceKind) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OntologyError::invalid_reference(raw, "reference is empty"));
        }

        let parsed = match trimmed.split_once(':') {
            None => match default_source {
                SourceKind::Ols => normalize_ols_code(trimmed),
                SourceKind::Sqlite if is_bare_obo_name(trimmed) => {
                    normalize_sqlite_code(&format!("obo:{trimmed}"))
                }
                SourceKind::Sqlite => normalize_sqlite_code(trimmed),
            }
            .map(|code| (default_source, code)),
            Some((tag, rest)) => {
                let source = SourceKind::from_tag(tag).ok_or_else(|| {
                    OntologyError::invalid_reference(raw, format!("unknown source '{tag}'"))
                })?;
                match source {
                    SourceKind::Ols => normalize_ols_code(rest),
                    SourceKind::Sqlite => normalize_sqlite_code(rest),
                }
                .map(|code| (source, code))
            }
        };
        let (source, code) =
            parsed.map_err(|reason| OntologyError::invalid_reference(raw, reason))?;

        Ok(Self {
            normalized: format!("{}:{code}", source.tag()),
            source,
            code,
        })
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// True for `ols:*`, the reference that searches across all hosted ontologies.
    pub fn is_all_ontologies(&self) -> bool {
        self.source == SourceKind::Ols && self.code == ALL_ONTOLOGIES
    }

    /// Short ontology name used to label results (`mondo`, `hgnc`, file stem for paths).
    pub fn ontology_name(&self) -> &str {
        match self.source {
            SourceKind::Ols => &self.code,
            SourceKind::Sqlite => {
                let name = self.code.strip_prefix("obo:").unwrap_or(&self.code);
                let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
                file.strip_suffix(".db").unwrap_or(file)
            }
        }
    }
}

impl fmt::Display for OntologyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

fn is_ontology_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_bare_obo_name(code: &str) -> bool {
    is_ontology_code(code) && !code.ends_with(".db")
}

fn normalize_ols_code(rest: &str) -> std::result::Result<String, String> {
    let code = rest.trim();
    if code.is_empty() {
        return Err("ontology code is empty".to_string());
    }
    if code == ALL_ONTOLOGIES {
        return Ok(code.to_string());
    }
    if !is_ontology_code(code) {
        return Err(format!("malformed OLS ontology code '{code}'"));
    }
    Ok(code.to_ascii_lowercase())
}

fn normalize_sqlite_code(rest: &str) -> std::result::Result<String, String> {
    let code = rest.trim();
    if code.is_empty() {
        return Err("ontology code is empty".to_string());
    }
    if let Some(name) = code.strip_prefix("obo:") {
        if !is_ontology_code(name) {
            return Err(format!("malformed OBO ontology name '{name}'"));
        }
        return Ok(format!("obo:{}", name.to_ascii_lowercase()));
    }
    if code.ends_with(".db") && !code.chars().any(char::is_whitespace) {
        return Ok(code.to_string());
    }
    Err(format!(
        "expected 'obo:<name>' or a path to a .db file, got '{code}'"
    ))
}

/// Ontology prefix of a CURIE (`MONDO:0005015` -> `mondo`), when the id is a CURIE.
pub fn curie_prefix(term_id: &str) -> Option<String> {
    let (prefix, local) = term_id.trim().split_once(':')?;
    if local.is_empty() || !is_ontology_code(prefix) {
        return None;
    }
    Some(prefix.to_ascii_lowercase())
}
