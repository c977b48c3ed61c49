//! The evidence workspace: which finding is focused and where its evidence is.

pub mod generation;
pub mod viewer;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::catalog::load::LoadedReport;
use crate::catalog::types::{BBox, DocumentReference, Finding, MatchStatus, TemplateCatalog};
use crate::catalog::{fallback_document, DocumentLookup};
use crate::evidence::clause::estimate_page;
use crate::evidence::normalize::normalize_quote;
use crate::evidence::references::{reference_items, ActiveSelection, EvidenceReference};
use crate::evidence::split::split_evidence;
use crate::resolve::{AnchorResolver, AnchorService, FocusRequest, ResolvedCandidate, RoundPlan};

use generation::{Generation, Ticket};

/// What the workspace displays for the focused finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionOutcome {
    pub item_id: String,
    pub document_id: String,
    pub file_name: String,
    pub display_name: String,
    /// Always >= 1.
    pub page: u32,
    pub quote: String,
    pub regions: Vec<BBox>,
    /// `resolved_approximate` for placeholder states.
    pub match_status: MatchStatus,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Round that produced this outcome.
    pub round: u64,
    pub updated_at: i64,
}

impl ResolutionOutcome {
    fn idle() -> Self {
        let document = fallback_document();
        Self {
            item_id: "N/A".to_string(),
            document_id: document.document_id,
            file_name: document.file_name,
            display_name: document.display_name,
            page: 1,
            quote: "Pick a card to focus evidence in the workspace.".to_string(),
            regions: Vec::new(),
            match_status: MatchStatus::ResolvedApproximate,
            loading: false,
            error: None,
            round: 0,
            updated_at: Utc::now().timestamp(),
        }
    }

    /// Placeholder shown before resolution settles and after it fails.
    fn approximate(finding: &Finding, document: &DocumentReference, evidence: &str, round: u64) -> Self {
        Self {
            item_id: finding.item_id.clone(),
            document_id: document.document_id.clone(),
            file_name: document.file_name.clone(),
            display_name: document.display_name.clone(),
            page: estimate_page(&finding.evidence),
            quote: normalize_quote(evidence),
            regions: Vec::new(),
            match_status: MatchStatus::ResolvedApproximate,
            loading: false,
            error: None,
            round,
            updated_at: Utc::now().timestamp(),
        }
    }

    fn resolved(finding: &Finding, document: &DocumentReference, best: ResolvedCandidate, round: u64) -> Self {
        let file_name = if best.file_name.is_empty() {
            document.file_name.clone()
        } else {
            best.file_name
        };
        let quote = if best.anchor.quote.is_empty() {
            normalize_quote(&best.evidence_text)
        } else {
            best.anchor.quote.clone()
        };
        Self {
            item_id: finding.item_id.clone(),
            document_id: document.document_id.clone(),
            file_name,
            display_name: document.display_name.clone(),
            page: best.anchor.page.max(1),
            quote,
            regions: best.anchor.regions(),
            match_status: best.anchor.status,
            loading: false,
            error: None,
            round,
            updated_at: Utc::now().timestamp(),
        }
    }
}

/// Result of one focus call.
#[derive(Debug, Clone, PartialEq)]
pub enum FocusOutcome {
    /// This round's outcome is now displayed.
    Applied(ResolutionOutcome),
    /// A newer round started first; nothing was changed.
    Superseded,
}

#[derive(Debug, Clone)]
struct FocusState {
    outcome: ResolutionOutcome,
    active_item_id: Option<String>,
    active_reference_id: Option<String>,
    /// Candidate documents of the focused finding, for the document switcher.
    documents: Vec<DocumentReference>,
}

/// One user's workspace: loaded report, document catalog and the single
/// active Resolution Outcome.
pub struct WorkspaceSession {
    resolver: AnchorResolver,
    lookup: RwLock<Arc<DocumentLookup>>,
    report: RwLock<Option<Arc<LoadedReport>>>,
    rounds: Generation,
    state: RwLock<FocusState>,
}

impl WorkspaceSession {
    pub fn new(service: Arc<dyn AnchorService>) -> Self {
        Self {
            resolver: AnchorResolver::new(service),
            lookup: RwLock::new(Arc::new(DocumentLookup::default())),
            report: RwLock::new(None),
            rounds: Generation::new(),
            state: RwLock::new(FocusState {
                outcome: ResolutionOutcome::idle(),
                active_item_id: None,
                active_reference_id: None,
                documents: vec![fallback_document()],
            }),
        }
    }

    /// Replace the document lookup table. Rounds already in flight keep the
    /// table they started with.
    pub async fn set_catalog(&self, catalog: Option<&TemplateCatalog>) {
        let lookup = Arc::new(DocumentLookup::from_catalog(catalog));
        info!(documents = lookup.len(), "document lookup rebuilt");
        *self.lookup.write().await = lookup;
    }

    /// Replace the report without focusing anything.
    ///
    /// Rounds still in flight for the previous report are superseded and the
    /// workspace goes back to its idle outcome.
    pub async fn replace_report(&self, report: LoadedReport) {
        info!(
            report_id = %report.report_id,
            items = report.items.len(),
            invalid = report.invalid_items,
            loaded_at = %report.loaded_at,
            "report replaced"
        );
        let mut state = self.state.write().await;
        *self.report.write().await = Some(Arc::new(report));
        let ticket = self.rounds.advance();
        *state = FocusState {
            outcome: ResolutionOutcome {
                round: ticket.seq(),
                ..ResolutionOutcome::idle()
            },
            active_item_id: None,
            active_reference_id: None,
            documents: vec![fallback_document()],
        };
    }

    /// Replace the report and focus `item_id`, or its first finding when no
    /// item is given.
    pub async fn load_report(&self, report: LoadedReport, item_id: Option<&str>) -> Result<Option<FocusOutcome>> {
        let target = match item_id {
            Some(id) => Some(id.to_string()),
            None => report.items.first().map(|item| item.item_id.clone()),
        };
        self.replace_report(report).await;
        match target {
            Some(item_id) => Ok(Some(self.focus(&item_id, FocusRequest::default()).await?)),
            None => Ok(None),
        }
    }

    pub async fn outcome(&self) -> ResolutionOutcome {
        self.state.read().await.outcome.clone()
    }

    /// Candidate documents of the focused finding.
    pub async fn documents(&self) -> Vec<DocumentReference> {
        self.state.read().await.documents.clone()
    }

    /// Reference list of a finding, flagged against the current focus.
    pub async fn references(&self, item_id: &str) -> Result<Vec<EvidenceReference>> {
        let finding = self.finding(item_id).await?;
        let lookup = self.lookup.read().await.clone();
        let split = split_evidence(&finding.evidence, &finding.document_references);
        let state = self.state.read().await;
        let active = if state.active_item_id.as_deref() == Some(item_id) {
            ActiveSelection {
                document_id: Some(state.outcome.document_id.clone()),
                reference_id: state.active_reference_id.clone(),
            }
        } else {
            ActiveSelection::default()
        };
        Ok(reference_items(&finding, &split, &lookup, &active))
    }

    /// Focus a finding through one entry of its reference list.
    pub async fn select_reference(&self, item_id: &str, reference: &EvidenceReference) -> Result<FocusOutcome> {
        let request = FocusRequest {
            forced_document_id: Some(reference.document_id.clone()),
            evidence_override: Some(reference.evidence_text.clone()),
            reference_id: Some(reference.id.clone()),
        };
        self.focus(item_id, request).await
    }

    /// Re-focus the active finding on another of its documents.
    pub async fn switch_document(&self, document_id: &str) -> Result<FocusOutcome> {
        let item_id = self
            .state
            .read()
            .await
            .active_item_id
            .clone()
            .ok_or_else(|| anyhow!("no finding is focused"))?;
        let request = FocusRequest {
            forced_document_id: Some(document_id.to_string()),
            ..Default::default()
        };
        self.focus(&item_id, request).await
    }

    /// Run one resolution round for a finding.
    ///
    /// The approximate placeholder is published right away; the ranked
    /// anchor (or the placeholder with an error) replaces it once every
    /// request has settled, unless a newer round started in the meantime.
    pub async fn focus(&self, item_id: &str, request: FocusRequest) -> Result<FocusOutcome> {
        let lookup = self.lookup.read().await.clone();
        let report = self.report.read().await.clone();
        let finding = report
            .as_ref()
            .and_then(|r| r.find(item_id))
            .cloned()
            .ok_or_else(|| anyhow!("unknown report item: {}", item_id))?;
        let report_id = report
            .map(|r| r.report_id.clone())
            .filter(|id| !id.is_empty());
        // A failed lookup above must not supersede the round on display.
        let ticket = self.rounds.advance();

        let split = split_evidence(&finding.evidence, &finding.document_references);
        let candidate_ids = lookup.candidate_ids(&finding);
        let plan = RoundPlan::build(&finding, &split, candidate_ids, &request);
        let preferred = lookup.reference_for(&plan.preferred_id);
        let base = ResolutionOutcome::approximate(&finding, &preferred, &plan.preferred_evidence, ticket.seq());

        let published = self
            .publish(ticket, |state| {
                state.active_item_id = Some(finding.item_id.clone());
                state.active_reference_id = request.reference_id.clone();
                state.documents = plan.candidate_ids.iter().map(|id| lookup.reference_for(id)).collect();
                state.outcome = ResolutionOutcome {
                    loading: report_id.is_some(),
                    ..base.clone()
                };
            })
            .await;
        if !published {
            return Ok(FocusOutcome::Superseded);
        }

        let Some(report_id) = report_id else {
            debug!(item_id, "no report loaded, keeping approximate state");
            return Ok(FocusOutcome::Applied(base));
        };

        let outcome = match self.resolver.resolve(&report_id, item_id, &plan.targets).await {
            Ok(best) => {
                let document = lookup.reference_for(&best.document_id);
                ResolutionOutcome::resolved(&finding, &document, best, ticket.seq())
            }
            Err(e) => {
                warn!(item_id, error = %e, "falling back to estimated page");
                ResolutionOutcome {
                    error: Some(e.to_string()),
                    ..base
                }
            }
        };

        let published = self
            .publish(ticket, |state| state.outcome = outcome.clone())
            .await;
        if published {
            Ok(FocusOutcome::Applied(outcome))
        } else {
            Ok(FocusOutcome::Superseded)
        }
    }

    async fn finding(&self, item_id: &str) -> Result<Finding> {
        let report = self.report.read().await;
        report
            .as_ref()
            .and_then(|r| r.find(item_id))
            .cloned()
            .ok_or_else(|| anyhow!("unknown report item: {}", item_id))
    }

    /// Apply `update` only while `ticket` is the latest round.
    async fn publish(&self, ticket: Ticket, update: impl FnOnce(&mut FocusState)) -> bool {
        let mut state = self.state.write().await;
        if !self.rounds.is_current(ticket) {
            debug!(round = ticket.seq(), latest = self.rounds.current(), "discarding stale round");
            return false;
        }
        update(&mut state);
        true
    }
}
