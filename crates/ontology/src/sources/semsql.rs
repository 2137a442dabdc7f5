//! Local Semantic-SQL (SQLite) backend.
//!
//! Reads the `statements` table of a semsql build: labels are `rdfs:label`, textual
//! definitions `IAO:0000115`, exact synonyms `oio:hasExactSynonym`. Search matches labels and
//! exact synonyms. Databases are never
//! downloaded here; a missing file means the ontology is unavailable.

use crate::backend::{BackendResult, OntologyHandle, OntologySource, RawMatch};
use crate::error::BackendError;
use async_trait::async_trait;
use oak_protocol::TermDetails;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const POOL_SIZE: u32 = 4;

const LABEL: &str = "rdfs:label";
const DEFINITION: &str = "IAO:0000115";
const EXACT_SYNONYM: &str = "oio:hasExactSynonym";

// Label hits outrank synonym hits of the same class (exact, prefix, substring).
const SEARCH_SQL: &str = r"
SELECT m.subject AS subject,
       (SELECT l.value FROM statements l
         WHERE l.subject = m.subject AND l.predicate = 'rdfs:label'
         LIMIT 1) AS label,
       (SELECT d.value FROM statements d
         WHERE d.subject = m.subject AND d.predicate = 'IAO:0000115'
         LIMIT 1) AS definition,
       MIN(CASE WHEN lower(m.value) = lower(?) THEN 0
                WHEN lower(m.value) LIKE lower(?) || '%' ESCAPE '\' THEN 2
                ELSE 4 END
           + CASE WHEN m.predicate = 'rdfs:label' THEN 0 ELSE 1 END) AS match_rank
  FROM statements m
 WHERE m.predicate IN ('rdfs:label', 'oio:hasExactSynonym')
   AND lower(m.value) LIKE '%' || lower(?) || '%' ESCAPE '\'
 GROUP BY m.subject
 ORDER BY match_rank, length(COALESCE(label, subject)), subject
 LIMIT ?";

const DETAILS_SQL: &str = r"
SELECT predicate, value
  FROM statements
 WHERE subject = ?
   AND predicate IN ('rdfs:label', 'IAO:0000115', 'oio:hasExactSynonym')
 ORDER BY predicate, value";

/// A row from the label search query. Rows arrive best match first; there is no numeric score.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SemSqlRow {
    pub subject: String,
    pub label: Option<String>,
    pub definition: Option<String>,
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => BackendError::Malformed(err.to_string()),
            sqlx::Error::PoolTimedOut => BackendError::Transport(err.to_string()),
            other => BackendError::Internal(other.to_string()),
        }
    }
}

pub struct SemSqlSource {
    data_dir: PathBuf,
}

impl SemSqlSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `obo:<name>` maps into the data directory; anything else is a path to a `.db` file.
    pub fn database_path(&self, code: &str) -> PathBuf {
        match code.strip_prefix("obo:") {
            Some(name) => self.data_dir.join(format!("{name}.db")),
            None => PathBuf::from(code),
        }
    }
}

#[async_trait]
impl OntologySource for SemSqlSource {
    async fn open(&self, code: &str) -> BackendResult<Arc<dyn OntologyHandle>> {
        let path = self.database_path(code);
        if !path.is_file() {
            return Err(BackendError::UnknownOntology(format!(
                "{code} (no database at {})",
                path.display()
            )));
        }
        let pool = connect_read_only(&path).await?;
        sqlx::query("SELECT subject FROM statements LIMIT 1")
            .fetch_optional(&pool)
            .await
            .map_err(|err| {
                BackendError::Malformed(format!(
                    "{} is not a semsql database: {err}",
                    path.display()
                ))
            })?;
        log::debug!("opened semsql database {}", path.display());
        Ok(Arc::new(SemSqlOntology { pool }))
    }
}

async fn connect_read_only(path: &Path) -> BackendResult<SqlitePool> {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(POOL_SIZE)
        .connect_with(options)
        .await?;
    Ok(pool)
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

struct SemSqlOntology {
    pool: SqlitePool,
}

#[async_trait]
impl OntologyHandle for SemSqlOntology {
    fn max_in_flight(&self) -> usize {
        POOL_SIZE as usize
    }

    async fn search(&self, term: &str, limit: usize) -> BackendResult<Vec<RawMatch>> {
        let escaped = escape_like(term);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(SEARCH_SQL)
            .bind(term)
            .bind(&escaped)
            .bind(&escaped)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(RawMatch::SemSql(SemSqlRow {
                subject: row.try_get("subject")?,
                label: row.try_get("label")?,
                definition: row.try_get("definition")?,
            }));
        }
        Ok(out)
    }

    async fn term_details(&self, term_id: &str) -> BackendResult<Option<TermDetails>> {
        let rows = sqlx::query(DETAILS_SQL)
            .bind(term_id)
            .fetch_all(&self.pool)
            .await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut label = None;
        let mut definition = None;
        let mut synonyms = Vec::new();
        for row in rows {
            let predicate: String = row.try_get("predicate")?;
            let Some(value) = row.try_get::<Option<String>, _>("value")? else {
                continue;
            };
            match predicate.as_str() {
                LABEL if label.is_none() => label = Some(value),
                DEFINITION if definition.is_none() => definition = Some(value),
                EXACT_SYNONYM => synonyms.push(value),
                _ => {}
            }
        }

        Ok(Some(TermDetails {
            id: term_id.to_string(),
            label: label.unwrap_or_else(|| term_id.to_string()),
            definition,
            synonyms,
            ontology: crate::reference::curie_prefix(term_id).unwrap_or_default(),
            iri: None,
        }))
    }
}
