pub mod rank;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::catalog::types::{
    DocumentId, EvidenceAnchor, Finding, ResolveHints, ResolveRequest, ResolveResponse,
};
use crate::error::ResolveError;
use crate::evidence::clause::clause_keyword;
use crate::evidence::split::EvidenceSplit;

/// The external anchor-resolution service.
#[async_trait]
pub trait AnchorService: Send + Sync {
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse, ResolveError>;
}

/// How the caller wants a finding focused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusRequest {
    /// Pin resolution to this document (reference list or document switcher).
    pub forced_document_id: Option<String>,
    /// Evidence to send for the pinned document instead of the extracted text.
    pub evidence_override: Option<String>,
    /// Reference list entry that triggered the focus.
    pub reference_id: Option<String>,
}

/// One request of a round: a document, the text to locate in it, and its
/// position in the candidate ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTarget {
    pub order: usize,
    pub document_id: DocumentId,
    pub evidence_text: String,
    pub clause_keyword: Option<String>,
}

/// Everything a round needs, computed before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPlan {
    pub candidate_ids: Vec<DocumentId>,
    /// Document shown while the round is in flight and on total failure.
    pub preferred_id: DocumentId,
    pub preferred_evidence: String,
    pub targets: Vec<RoundTarget>,
}

impl RoundPlan {
    /// `candidate_ids` must be non-empty and de-duplicated.
    pub fn build(
        finding: &Finding,
        split: &EvidenceSplit,
        candidate_ids: Vec<DocumentId>,
        request: &FocusRequest,
    ) -> Self {
        let forced = request
            .forced_document_id
            .as_deref()
            .filter(|id| candidate_ids.iter().any(|c| c == id));
        let preferred_id = forced
            .map(str::to_string)
            .or_else(|| candidate_ids.first().cloned())
            .unwrap_or_default();
        let preferred_evidence = request
            .evidence_override
            .clone()
            .or_else(|| split.evidence_text(&preferred_id))
            .unwrap_or_else(|| finding.evidence.clone());

        let target_ids: Vec<DocumentId> = if request.forced_document_id.is_some() {
            vec![preferred_id.clone()]
        } else {
            candidate_ids.clone()
        };
        let pinned_override = request
            .evidence_override
            .as_ref()
            .filter(|_| request.forced_document_id.is_some());

        let targets = target_ids
            .into_iter()
            .enumerate()
            .map(|(order, document_id)| {
                let evidence_text = match pinned_override {
                    Some(text) if document_id == preferred_id => text.clone(),
                    _ => split
                        .evidence_text(&document_id)
                        .unwrap_or_else(|| finding.evidence.clone()),
                };
                let clause_keyword =
                    clause_keyword(&evidence_text).or_else(|| clause_keyword(&finding.evidence));
                RoundTarget {
                    order,
                    document_id,
                    evidence_text,
                    clause_keyword,
                }
            })
            .collect();

        Self {
            candidate_ids,
            preferred_id,
            preferred_evidence,
            targets,
        }
    }
}

/// A document whose request produced an anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCandidate {
    pub order: usize,
    pub document_id: DocumentId,
    pub evidence_text: String,
    /// File name reported by the service, may be empty.
    pub file_name: String,
    pub anchor: EvidenceAnchor,
}

/// Fans a round out to the anchor service, one request per target.
#[derive(Clone)]
pub struct AnchorResolver {
    service: Arc<dyn AnchorService>,
}

impl AnchorResolver {
    pub fn new(service: Arc<dyn AnchorService>) -> Self {
        Self { service }
    }

    /// Resolve every target concurrently and rank the successes.
    ///
    /// Requests are independent: a failure is logged and skipped. The round
    /// fails only when no target produced an anchor. Ranking uses each
    /// target's `order`, never completion order.
    pub async fn resolve(
        &self,
        report_id: &str,
        item_id: &str,
        targets: &[RoundTarget],
    ) -> Result<ResolvedCandidate, ResolveError> {
        let attempts = targets
            .iter()
            .map(|target| self.resolve_target(report_id, item_id, target));
        let settled = join_all(attempts).await;

        let mut resolved = Vec::with_capacity(settled.len());
        for outcome in settled {
            match outcome {
                Ok(candidate) => resolved.push(candidate),
                Err(e) => warn!(
                    item_id,
                    document_id = e.document_id().unwrap_or_default(),
                    error = %e,
                    "document resolution failed"
                ),
            }
        }

        let succeeded = resolved.len();
        let best = rank::pick_best(resolved).ok_or(ResolveError::AllFailed {
            attempted: targets.len(),
        })?;
        info!(
            item_id,
            attempted = targets.len(),
            succeeded,
            document_id = %best.document_id,
            page = best.anchor.page,
            status = ?best.anchor.status,
            "evidence resolved"
        );
        Ok(best)
    }

    async fn resolve_target(
        &self,
        report_id: &str,
        item_id: &str,
        target: &RoundTarget,
    ) -> Result<ResolvedCandidate, ResolveError> {
        let request = ResolveRequest {
            report_id: report_id.to_string(),
            item_id: item_id.to_string(),
            document_id: target.document_id.clone(),
            evidence_text: target.evidence_text.clone(),
            hints: Some(ResolveHints {
                clause_keyword: target.clause_keyword.clone(),
            }),
        };
        debug!(
            item_id,
            document_id = %target.document_id,
            order = target.order,
            hint = ?target.clause_keyword,
            "resolving evidence"
        );

        let response = self.service.resolve(&request).await?;
        let anchor = response
            .anchors
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::EmptyAnchors {
                document_id: target.document_id.clone(),
            })?;

        Ok(ResolvedCandidate {
            order: target.order,
            document_id: target.document_id.clone(),
            evidence_text: target.evidence_text.clone(),
            file_name: response.file_name,
            anchor,
        })
    }
}
