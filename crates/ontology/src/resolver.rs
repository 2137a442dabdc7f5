//! Reference → backend handle resolution with a process-lifetime cache.
//!
//! Every normalized reference owns a slot guarded by an async mutex. The first caller opens the
//! backend while holding the slot; concurrent callers for the same reference wait and then share
//! the stored handle. A failed open leaves the slot empty so the next caller tries again.

use crate::backend::{OntologyHandle, OntologySource};
use crate::error::{BackendError, OntologyError, Result};
use crate::reference::{OntologyReference, SourceKind};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};

/// A ready backend session bound to one reference.
pub struct BackendHandle {
    reference: OntologyReference,
    session: Arc<dyn OntologyHandle>,
    permits: Semaphore,
}

impl BackendHandle {
    pub(crate) fn new(reference: OntologyReference, session: Arc<dyn OntologyHandle>) -> Self {
        let permits = Semaphore::new(session.max_in_flight().max(1));
        Self {
            reference,
            session,
            permits,
        }
    }

    pub fn reference(&self) -> &OntologyReference {
        &self.reference
    }

    pub(crate) fn session(&self) -> &dyn OntologyHandle {
        self.session.as_ref()
    }

    pub(crate) fn permits(&self) -> &Semaphore {
        &self.permits
    }
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("reference", &self.reference.as_str())
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

type SlotHandle = Arc<Mutex<BackendSlot>>;

#[derive(Default)]
struct BackendSlot {
    handle: Option<Arc<BackendHandle>>,
}

/// Handle cache keyed by normalized reference. Entries live until the cache is dropped.
#[derive(Default)]
pub struct BackendCache {
    slots: Mutex<HashMap<String, SlotHandle>>,
}

impl BackendCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, key: &str) -> SlotHandle {
        let mut slots = self.slots.lock().await;
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Drop `key` after a failed open unless another caller is already waiting on its slot.
    async fn forget_failed(&self, key: &str, slot: &SlotHandle) {
        let mut slots = self.slots.lock().await;
        let Some(current) = slots.get(key) else {
            return;
        };
        // One reference held by the map, one by the caller that failed.
        if Arc::ptr_eq(current, slot) && Arc::strong_count(slot) <= 2 {
            slots.remove(key);
        }
    }

    /// References with a successfully opened handle, sorted.
    pub async fn cached_references(&self) -> Vec<String> {
        let slots: Vec<(String, SlotHandle)> = {
            let guard = self.slots.lock().await;
            guard.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        let mut out = Vec::new();
        for (key, slot) in slots {
            if slot.lock().await.handle.is_some() {
                out.push(key);
            }
        }
        out.sort();
        out
    }
}

pub struct BackendResolver {
    sources: HashMap<SourceKind, Arc<dyn OntologySource>>,
    cache: Arc<BackendCache>,
    default_source: SourceKind,
    open_timeout: Duration,
}

impl BackendResolver {
    pub fn new(
        default_source: SourceKind,
        open_timeout: Duration,
        cache: Arc<BackendCache>,
    ) -> Self {
        Self {
            sources: HashMap::new(),
            cache,
            default_source,
            open_timeout,
        }
    }

    #[must_use]
    pub fn with_source(mut self, kind: SourceKind, source: Arc<dyn OntologySource>) -> Self {
        self.sources.insert(kind, source);
        self
    }

    pub fn default_source(&self) -> SourceKind {
        self.default_source
    }

    pub fn cache(&self) -> &Arc<BackendCache> {
        &self.cache
    }

    pub fn parse(&self, raw: &str) -> Result<OntologyReference> {
        let reference = OntologyReference::parse(raw, self.default_source)?;
        if !self.sources.contains_key(&reference.source()) {
            return Err(OntologyError::invalid_reference(
                raw,
                format!("source '{}' is not configured", reference.source()),
            ));
        }
        Ok(reference)
    }

    pub async fn resolve(&self, reference: &OntologyReference) -> Result<Arc<BackendHandle>> {
        let Some(source) = self.sources.get(&reference.source()).cloned() else {
            return Err(OntologyError::invalid_reference(
                reference.as_str(),
                format!("source '{}' is not configured", reference.source()),
            ));
        };

        let slot_handle = self.cache.slot(reference.as_str()).await;
        let mut slot = slot_handle.lock().await;
        if let Some(handle) = slot.handle.as_ref() {
            return Ok(handle.clone());
        }

        let timeout_ms = u64::try_from(self.open_timeout.as_millis()).unwrap_or(u64::MAX);
        let opened = match tokio::time::timeout(self.open_timeout, source.open(reference.code()))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(timeout_ms)),
        };
        let session = match opened {
            Ok(session) => session,
            Err(cause) => {
                log::warn!("Failed to open ontology backend {reference}: {cause}");
                drop(slot);
                self.cache
                    .forget_failed(reference.as_str(), &slot_handle)
                    .await;
                return Err(OntologyError::BackendUnavailable {
                    backend: reference.to_string(),
                    cause,
                });
            }
        };

        let handle = Arc::new(BackendHandle::new(reference.clone(), session));
        slot.handle = Some(handle.clone());
        log::info!("Opened ontology backend {reference}");
        Ok(handle)
    }

    pub async fn resolve_str(&self, raw: &str) -> Result<Arc<BackendHandle>> {
        let reference = self.parse(raw)?;
        self.resolve(&reference).await
    }
}
