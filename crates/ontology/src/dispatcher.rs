//! Per-call orchestration: validate → resolve → query → normalize → rank.

use crate::config::OakConfig;
use crate::error::{OntologyError, SearchFailure};
use crate::executor::QueryExecutor;
use crate::normalize::normalize;
use crate::rank::rank_and_limit;
use crate::reference::{curie_prefix, SourceKind};
use crate::resolver::{BackendCache, BackendResolver};
use crate::sources::{OlsSource, SemSqlSource};
use oak_protocol::{FailureStage, SearchResponse, TermDetails, RESPONSE_SCHEMA_VERSION};
use std::sync::Arc;
use std::time::Instant;

const ALL_OLS_ONTOLOGIES: &str = "ols:*";

type CallResult<T> = std::result::Result<T, SearchFailure>;

fn at(stage: FailureStage) -> impl FnOnce(OntologyError) -> SearchFailure {
    move |error| SearchFailure::new(stage, error)
}

pub struct OntologySearch {
    config: OakConfig,
    resolver: BackendResolver,
    executor: QueryExecutor,
}

impl OntologySearch {
    pub fn new(config: OakConfig, resolver: BackendResolver) -> Self {
        let executor = QueryExecutor::new(config.query_timeout());
        Self {
            config,
            resolver,
            executor,
        }
    }

    /// Build a dispatcher with the OLS and Semantic-SQL backends registered.
    pub fn from_config(config: OakConfig) -> anyhow::Result<Self> {
        let ols = OlsSource::new(&config.ols_base_url, config.query_timeout())?;
        let semsql = SemSqlSource::new(config.semsql_dir.clone());
        let resolver = BackendResolver::new(
            config.default_source,
            config.open_timeout(),
            Arc::new(BackendCache::new()),
        )
        .with_source(SourceKind::Ols, Arc::new(ols))
        .with_source(SourceKind::Sqlite, Arc::new(semsql));
        Ok(Self::new(config, resolver))
    }

    pub fn config(&self) -> &OakConfig {
        &self.config
    }

    pub fn resolver(&self) -> &BackendResolver {
        &self.resolver
    }

    fn validate(&self, term: &str, n: i64) -> std::result::Result<usize, OntologyError> {
        if term.trim().is_empty() {
            return Err(OntologyError::InvalidArgument(
                "term must not be empty".to_string(),
            ));
        }
        let max = self.config.max_limit;
        match usize::try_from(n) {
            Ok(limit) if (1..=max).contains(&limit) => Ok(limit),
            _ => Err(OntologyError::InvalidArgument(format!(
                "n must be between 1 and {max} (got {n})"
            ))),
        }
    }

    /// Search `ontology` for `term`, returning at most `n` ranked results. Without an ontology
    /// the search runs across every ontology OLS hosts (`ols:*`).
    pub async fn search(
        &self,
        term: &str,
        ontology: Option<&str>,
        n: i64,
    ) -> CallResult<SearchResponse> {
        let started = Instant::now();
        let limit = self.validate(term, n).map_err(at(FailureStage::Validate))?;
        let ontology = ontology
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(ALL_OLS_ONTOLOGIES);
        let reference = self
            .resolver
            .parse(ontology)
            .map_err(at(FailureStage::Resolve))?;
        let handle = self
            .resolver
            .resolve(&reference)
            .await
            .map_err(at(FailureStage::Resolve))?;

        let matches = self
            .executor
            .execute(&handle, term, self.config.fetch_limit(limit))
            .await
            .map_err(at(FailureStage::Query))?;

        let normalized = normalize(matches, reference.ontology_name());
        let total = normalized.len();
        let results = rank_and_limit(normalized, limit);

        log::info!(
            "Searched '{term}' in {reference}: {} of {total} results in {} ms",
            results.len(),
            started.elapsed().as_millis()
        );

        Ok(SearchResponse {
            schema_version: RESPONSE_SCHEMA_VERSION,
            ontology: reference.to_string(),
            term: term.to_string(),
            truncated: total > results.len(),
            results,
            total,
        })
    }

    /// Look up a single term. Without `ontology`, the CURIE prefix picks the ontology.
    pub async fn term_details(
        &self,
        term_id: &str,
        ontology: Option<&str>,
    ) -> CallResult<TermDetails> {
        let term_id = term_id.trim();
        let Some(prefix) = curie_prefix(term_id) else {
            return Err(SearchFailure::new(
                FailureStage::Validate,
                OntologyError::InvalidArgument(format!(
                    "term_id must be a CURIE like MONDO:0005015 (got '{term_id}')"
                )),
            ));
        };
        let ontology = ontology
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .unwrap_or(prefix);

        let handle = self
            .resolver
            .resolve_str(&ontology)
            .await
            .map_err(at(FailureStage::Resolve))?;
        let details = self
            .executor
            .details(&handle, term_id)
            .await
            .map_err(at(FailureStage::Query))?;

        details.ok_or_else(|| {
            SearchFailure::new(
                FailureStage::Query,
                OntologyError::TermNotFound {
                    term_id: term_id.to_string(),
                    backend: handle.reference().to_string(),
                },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendResult, OntologyHandle, OntologySource, RawMatch};
    use crate::error::BackendError;
    use crate::sources::OlsDoc;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        opens: AtomicUsize,
        searches: AtomicUsize,
        opened_codes: std::sync::Mutex<Vec<String>>,
    }

    impl Counters {
        fn opened_codes(&self) -> Vec<String> {
            self.opened_codes.lock().expect("codes lock").clone()
        }
    }

    struct FakeSource {
        counters: Arc<Counters>,
        docs: Vec<OlsDoc>,
        search_delay: Duration,
    }

    struct FakeHandle {
        counters: Arc<Counters>,
        docs: Vec<OlsDoc>,
        search_delay: Duration,
    }

    #[async_trait]
    impl OntologySource for FakeSource {
        async fn open(&self, code: &str) -> BackendResult<Arc<dyn OntologyHandle>> {
            self.counters.opens.fetch_add(1, Ordering::SeqCst);
            self.counters
                .opened_codes
                .lock()
                .expect("codes lock")
                .push(code.to_string());
            if code == "doesnotexist" {
                return Err(BackendError::UnknownOntology(code.to_string()));
            }
            Ok(Arc::new(FakeHandle {
                counters: self.counters.clone(),
                docs: self.docs.clone(),
                search_delay: self.search_delay,
            }))
        }
    }

    #[async_trait]
    impl OntologyHandle for FakeHandle {
        async fn search(&self, _term: &str, limit: usize) -> BackendResult<Vec<RawMatch>> {
            self.counters.searches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.search_delay).await;
            Ok(self
                .docs
                .iter()
                .take(limit)
                .cloned()
                .map(RawMatch::Ols)
                .collect())
        }

        async fn term_details(&self, term_id: &str) -> BackendResult<Option<TermDetails>> {
            Ok(self
                .docs
                .iter()
                .find(|d| d.obo_id.as_deref() == Some(term_id))
                .map(|d| TermDetails {
                    id: term_id.to_string(),
                    label: d.label.clone().unwrap_or_default(),
                    definition: d.description.first().cloned(),
                    synonyms: Vec::new(),
                    ontology: "mondo".to_string(),
                    iri: d.iri.clone(),
                }))
        }
    }

    fn doc(id: &str, label: &str, score: f64) -> OlsDoc {
        OlsDoc {
            obo_id: Some(id.to_string()),
            label: Some(label.to_string()),
            ontology_name: Some("mondo".to_string()),
            score: Some(score),
            ..OlsDoc::default()
        }
    }

    fn cancer_docs() -> Vec<OlsDoc> {
        vec![
            doc("MONDO:0005070", "neoplasm", 7.5),
            doc("MONDO:0004992", "cancer", 9.0),
            doc("MONDO:0002691", "liver cancer", 7.5),
            doc("MONDO:0007254", "breast cancer", 6.0),
        ]
    }

    fn dispatcher(docs: Vec<OlsDoc>, config: OakConfig) -> (OntologySearch, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let source = FakeSource {
            counters: counters.clone(),
            docs,
            search_delay: Duration::ZERO,
        };
        let resolver = BackendResolver::new(
            SourceKind::Ols,
            config.open_timeout(),
            Arc::new(BackendCache::new()),
        )
        .with_source(SourceKind::Ols, Arc::new(source));
        (OntologySearch::new(config, resolver), counters)
    }

    #[tokio::test]
    async fn ranks_and_limits_results() {
        let (search, _) = dispatcher(cancer_docs(), OakConfig::default());
        let response = search
            .search("cancer", Some("ols:mondo"), 2)
            .await
            .expect("search");

        assert_eq!(response.ontology, "ols:mondo");
        assert_eq!(response.total, 4);
        assert!(response.truncated);
        let ids: Vec<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["MONDO:0004992", "MONDO:0002691"]);
        assert!(response
            .results
            .iter()
            .all(|r| !r.id.is_empty() && !r.label.is_empty()));
    }

    #[tokio::test]
    async fn missing_ontology_searches_across_ols() {
        let docs = vec![
            OlsDoc {
                ontology_name: Some("uberon".to_string()),
                ..doc("UBERON:0000955", "brain", 12.0)
            },
            doc("MONDO:0005560", "brain disease", 8.0),
            OlsDoc {
                ontology_name: None,
                ontology_prefix: Some("NCIT".to_string()),
                ..doc("NCIT:C12439", "Brain", 7.0)
            },
        ];
        let (search, counters) = dispatcher(docs, OakConfig::default());

        let response = search.search("brain", None, 5).await.expect("search");
        assert_eq!(response.ontology, "ols:*");
        let ontologies: Vec<&str> = response
            .results
            .iter()
            .map(|r| r.ontology.as_str())
            .collect();
        assert_eq!(ontologies, vec!["uberon", "mondo", "ncit"]);

        let blank = search
            .search("brain", Some("  "), 5)
            .await
            .expect("blank ontology");
        assert_eq!(blank.ontology, "ols:*");
        assert_eq!(counters.opened_codes(), vec!["*".to_string()]);
    }

    #[tokio::test]
    async fn total_counts_only_the_fetched_candidate_pool() {
        let config = OakConfig {
            candidate_pool: 3,
            ..OakConfig::default()
        };
        let (search, _) = dispatcher(cancer_docs(), config);

        let response = search
            .search("cancer", Some("mondo"), 2)
            .await
            .expect("search");
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.total, 3);
        assert!(response.truncated);
    }

    #[tokio::test]
    async fn invalid_arguments_never_touch_backends() {
        let (search, counters) = dispatcher(cancer_docs(), OakConfig::default());
        for (term, n) in [("", 3), ("   ", 3), ("cancer", 0), ("cancer", -4), ("cancer", 51)] {
            let failure = search
                .search(term, Some("ols:mondo"), n)
                .await
                .expect_err("invalid input");
            assert_eq!(failure.stage, FailureStage::Validate);
            assert_eq!(failure.error.code(), "invalid_argument");
        }
        assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bogus_reference_never_queries() {
        let (search, counters) = dispatcher(cancer_docs(), OakConfig::default());

        let failure = search
            .search("test", Some("bogus:doesnotexist"), 1)
            .await
            .expect_err("unknown source");
        assert_eq!(failure.error.code(), "invalid_reference");

        let failure = search
            .search("test", Some("ols:doesnotexist"), 1)
            .await
            .expect_err("unknown ontology");
        assert_eq!(failure.stage, FailureStage::Resolve);
        assert_eq!(failure.error.code(), "backend_unavailable");
        assert!(failure.error.retryable());

        assert_eq!(counters.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_backend_fails_query_without_results() {
        let counters = Arc::new(Counters::default());
        let source = FakeSource {
            counters: counters.clone(),
            docs: cancer_docs(),
            search_delay: Duration::from_secs(5),
        };
        let config = OakConfig {
            query_timeout_ms: 25,
            ..OakConfig::default()
        };
        let resolver = BackendResolver::new(
            SourceKind::Ols,
            config.open_timeout(),
            Arc::new(BackendCache::new()),
        )
        .with_source(SourceKind::Ols, Arc::new(source));
        let search = OntologySearch::new(config, resolver);

        let failure = search
            .search("cancer", Some("mondo"), 3)
            .await
            .expect_err("must time out");
        assert_eq!(failure.stage, FailureStage::Query);
        assert!(matches!(
            failure.error,
            OntologyError::QueryFailed {
                cause: BackendError::Timeout(25),
                ..
            }
        ));
        assert_eq!(failure.error.backend(), Some("ols:mondo"));
    }

    #[tokio::test]
    async fn concurrent_identical_calls_agree() {
        let docs = vec![
            doc("MONDO:0005015", "diabetes mellitus", 5.0),
            doc("MONDO:0005147", "type 1 diabetes mellitus", 5.0),
            doc("MONDO:0005148", "type 2 diabetes mellitus", 5.0),
            doc("MONDO:0011027", "diabetes insipidus", 2.0),
        ];
        let (search, counters) = dispatcher(docs, OakConfig::default());
        let search = Arc::new(search);

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let search = search.clone();
                tokio::spawn(
                    async move { search.search("diabetes", Some("mondo"), 3).await },
                )
            })
            .collect();
        let mut responses = Vec::new();
        for task in tasks {
            responses.push(task.await.expect("join").expect("search"));
        }

        assert_eq!(responses[0], responses[1]);
        assert_eq!(responses[0].results.len(), 3);
        assert_eq!(responses[0].results[0].id, "MONDO:0005015");
        assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn term_details_infers_ontology_from_curie() {
        let mut docs = cancer_docs();
        docs[1].description = vec!["A malignant neoplasm.".to_string()];
        let (search, _) = dispatcher(docs, OakConfig::default());

        let details = search
            .term_details("MONDO:0004992", None)
            .await
            .expect("details");
        assert_eq!(details.label, "cancer");
        assert_eq!(details.definition.as_deref(), Some("A malignant neoplasm."));

        let failure = search
            .term_details("MONDO:9999999", Some("ols:mondo"))
            .await
            .expect_err("unknown term");
        assert_eq!(failure.error.code(), "term_not_found");

        let failure = search
            .term_details("not-a-curie", None)
            .await
            .expect_err("not a curie");
        assert_eq!(failure.error.code(), "invalid_argument");
    }
}
