//! Source-document loading for the rendering surface.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, warn};

use crate::catalog::FALLBACK_DOCUMENT_ID;

use super::generation::Generation;

/// A decoded document held by the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedDocument {
    pub document_id: String,
    pub page_count: u32,
}

/// Rendering-surface capability: open a document and give it back.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn open(&self, document_id: &str) -> Result<OpenedDocument>;
    async fn release(&self, document: OpenedDocument);
}

/// Clamp a page to `1..=page_count`, or just `>= 1` while the count is unknown.
pub fn clamp_page(page: u32, page_count: Option<u32>) -> u32 {
    let page = page.max(1);
    match page_count {
        Some(count) if count > 0 => page.min(count),
        _ => page,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerState {
    pub document: Option<OpenedDocument>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ViewerState {
    pub fn page_count(&self) -> Option<u32> {
        self.document.as_ref().map(|d| d.page_count)
    }

    pub fn display_page(&self, requested: u32) -> u32 {
        clamp_page(requested, self.page_count())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(OpenedDocument),
    /// Placeholder document, nothing to show.
    Cleared,
    Failed(String),
    /// A newer load started before this one finished.
    Superseded,
}

pub struct DocumentViewer {
    source: Arc<dyn DocumentSource>,
    loads: Generation,
    /// Fired whenever a load starts, so older fetches can stop early.
    superseded: Notify,
    state: RwLock<ViewerState>,
}

impl DocumentViewer {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            loads: Generation::new(),
            superseded: Notify::new(),
            state: RwLock::new(ViewerState::default()),
        }
    }

    pub async fn state(&self) -> ViewerState {
        self.state.read().await.clone()
    }

    /// Switch the viewer to `document_id`.
    ///
    /// The document shown so far is released up front. Starting a load
    /// cancels any older fetch still in flight; an older fetch that finished
    /// regardless releases what it opened and leaves the viewer state alone.
    pub async fn load(&self, document_id: &str) -> LoadOutcome {
        let ticket = self.loads.advance();
        self.superseded.notify_waiters();
        let placeholder = document_id.is_empty() || document_id == FALLBACK_DOCUMENT_ID;

        let previous = {
            let mut state = self.state.write().await;
            if !self.loads.is_current(ticket) {
                return LoadOutcome::Superseded;
            }
            state.error = None;
            state.loading = !placeholder;
            state.document.take()
        };
        if let Some(previous) = previous {
            self.source.release(previous).await;
        }
        if placeholder {
            return LoadOutcome::Cleared;
        }
        if !self.loads.is_current(ticket) {
            return LoadOutcome::Superseded;
        }

        let open = self.source.open(document_id);
        tokio::pin!(open);
        let opened = loop {
            tokio::select! {
                opened = &mut open => break opened,
                () = self.superseded.notified() => {
                    if !self.loads.is_current(ticket) {
                        debug!(document_id, load = ticket.seq(), "cancelled superseded document fetch");
                        return LoadOutcome::Superseded;
                    }
                }
            }
        };

        let mut state = self.state.write().await;
        if !self.loads.is_current(ticket) {
            drop(state);
            debug!(document_id, load = ticket.seq(), "discarding superseded document load");
            if let Ok(document) = opened {
                self.source.release(document).await;
            }
            return LoadOutcome::Superseded;
        }

        state.loading = false;
        match opened {
            Ok(document) => {
                debug!(document_id, pages = document.page_count, "document loaded");
                state.document = Some(document.clone());
                LoadOutcome::Loaded(document)
            }
            Err(e) => {
                warn!(document_id, error = %e, "document load failed");
                let message = "Unable to load PDF document.".to_string();
                state.error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    struct GatedSource {
        pages: HashMap<String, u32>,
        gates: HashMap<String, Arc<Notify>>,
        released: Mutex<Vec<String>>,
        /// Fetches started and not yet finished or dropped.
        in_flight: Arc<AtomicUsize>,
    }

    /// Counts a fetch as in flight until it is dropped.
    struct FetchGuard(Arc<AtomicUsize>);

    impl FetchGuard {
        fn start(counter: &Arc<AtomicUsize>) -> Self {
            counter.fetch_add(1, Ordering::SeqCst);
            Self(counter.clone())
        }
    }

    impl Drop for FetchGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DocumentSource for GatedSource {
        async fn open(&self, document_id: &str) -> Result<OpenedDocument> {
            let _fetch = FetchGuard::start(&self.in_flight);
            if let Some(gate) = self.gates.get(document_id) {
                gate.notified().await;
            }
            let page_count = *self
                .pages
                .get(document_id)
                .ok_or_else(|| anyhow::anyhow!("no such document: {}", document_id))?;
            Ok(OpenedDocument {
                document_id: document_id.to_string(),
                page_count,
            })
        }

        async fn release(&self, document: OpenedDocument) {
            self.released.lock().unwrap().push(document.document_id);
        }
    }

    fn source(gate: Option<(&str, Arc<Notify>)>) -> Arc<GatedSource> {
        let mut source = GatedSource::default();
        source.pages.insert("DOC-A".to_string(), 40);
        source.pages.insert("DOC-B".to_string(), 9);
        if let Some((id, gate)) = gate {
            source.gates.insert(id.to_string(), gate);
        }
        Arc::new(source)
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, None), 1);
        assert_eq!(clamp_page(57, None), 57);
        assert_eq!(clamp_page(57, Some(0)), 57);
        assert_eq!(clamp_page(57, Some(12)), 12);
        assert_eq!(clamp_page(3, Some(12)), 3);
    }

    #[tokio::test]
    async fn test_load_and_switch_releases_previous() {
        let source = source(None);
        let viewer = DocumentViewer::new(source.clone());
        assert!(matches!(viewer.load("DOC-A").await, LoadOutcome::Loaded(_)));
        assert_eq!(viewer.state().await.display_page(90), 40);

        assert!(matches!(viewer.load("DOC-B").await, LoadOutcome::Loaded(_)));
        assert_eq!(*source.released.lock().unwrap(), vec!["DOC-A".to_string()]);
        assert_eq!(viewer.state().await.page_count(), Some(9));

        assert_eq!(viewer.load("unknown").await, LoadOutcome::Cleared);
        assert!(viewer.state().await.document.is_none());
        assert_eq!(source.released.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_newer_load_cancels_pending_fetch() {
        // DOC-A's gate is never opened: only cancellation lets its load finish.
        let gate = Arc::new(Notify::new());
        let source = source(Some(("DOC-A", gate)));
        let viewer = DocumentViewer::new(source.clone());

        let loads = async {
            tokio::join!(viewer.load("DOC-A"), async {
                tokio::task::yield_now().await;
                assert_eq!(source.in_flight.load(Ordering::SeqCst), 1);
                viewer.load("DOC-B").await
            })
        };
        let (stale, fresh) = tokio::time::timeout(Duration::from_secs(5), loads)
            .await
            .expect("superseded fetch was not cancelled");

        assert_eq!(stale, LoadOutcome::Superseded);
        assert!(matches!(fresh, LoadOutcome::Loaded(ref d) if d.document_id == "DOC-B"));
        assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
        let state = viewer.state().await;
        assert_eq!(state.page_count(), Some(9));
        assert!(!state.loading);
        assert!(source.released.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_sets_error() {
        let viewer = DocumentViewer::new(source(None));
        let outcome = viewer.load("DOC-Q").await;
        assert_eq!(outcome, LoadOutcome::Failed("Unable to load PDF document.".to_string()));
        let state = viewer.state().await;
        assert_eq!(state.error.as_deref(), Some("Unable to load PDF document."));
        assert!(!state.loading);
    }
}
