//! Cross-document ranking of resolved anchors.

use std::cmp::Ordering;

use crate::catalog::types::MatchStatus;

use super::ResolvedCandidate;

pub fn status_priority(status: MatchStatus) -> u8 {
    match status {
        MatchStatus::ResolvedExact => 3,
        MatchStatus::ResolvedApproximate => 2,
        MatchStatus::Unresolved => 1,
        MatchStatus::Unknown => 0,
    }
}

/// `Greater` means `a` is the better candidate.
///
/// Status, then score, then region count, then the earlier candidate order.
pub fn compare(a: &ResolvedCandidate, b: &ResolvedCandidate) -> Ordering {
    status_priority(a.anchor.status)
        .cmp(&status_priority(b.anchor.status))
        .then_with(|| a.anchor.match_score.total_cmp(&b.anchor.match_score))
        .then_with(|| a.anchor.region_count().cmp(&b.anchor.region_count()))
        .then_with(|| b.order.cmp(&a.order))
}

/// Pick the single best candidate. Independent of the input order.
pub fn pick_best(candidates: Vec<ResolvedCandidate>) -> Option<ResolvedCandidate> {
    candidates.into_iter().reduce(|best, candidate| {
        if compare(&candidate, &best) == Ordering::Greater {
            candidate
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{BBox, EvidenceAnchor, MatchMethod};

    fn candidate(doc: &str, status: MatchStatus, score: f64, boxes: usize, order: usize) -> ResolvedCandidate {
        let bbox = BBox {
            x0: 0.0,
            y0: 0.0,
            x1: 10.0,
            y1: 10.0,
            unit: "pt".to_string(),
            origin: "top-left".to_string(),
        };
        ResolvedCandidate {
            order,
            document_id: doc.to_string(),
            evidence_text: format!("evidence for {}", doc),
            file_name: format!("{}.pdf", doc),
            anchor: EvidenceAnchor {
                anchor_id: format!("anc_{}", doc),
                document_id: doc.to_string(),
                page: 4,
                quote: String::new(),
                bbox: None,
                bboxes: (boxes > 0).then(|| vec![bbox; boxes]),
                match_method: MatchMethod::Fuzzy,
                match_score: score,
                status,
            },
        }
    }

    fn winner(candidates: Vec<ResolvedCandidate>) -> String {
        pick_best(candidates).unwrap().document_id
    }

    #[test]
    fn test_status_dominates_score() {
        let a = candidate("A", MatchStatus::ResolvedApproximate, 0.7, 0, 0);
        let b = candidate("B", MatchStatus::ResolvedExact, 0.5, 0, 1);
        assert_eq!(winner(vec![a.clone(), b.clone()]), "B");
        assert_eq!(winner(vec![b, a]), "B");
    }

    #[test]
    fn test_score_then_regions_then_order() {
        let low = candidate("A", MatchStatus::Unresolved, 0.2, 3, 0);
        let high = candidate("B", MatchStatus::Unresolved, 0.3, 0, 1);
        assert_eq!(winner(vec![low, high]), "B");

        let bare = candidate("A", MatchStatus::ResolvedExact, 0.9, 0, 0);
        let boxed = candidate("B", MatchStatus::ResolvedExact, 0.9, 2, 1);
        assert_eq!(winner(vec![bare, boxed]), "B");

        let first = candidate("A", MatchStatus::ResolvedExact, 0.9, 1, 0);
        let second = candidate("B", MatchStatus::ResolvedExact, 0.9, 1, 1);
        assert_eq!(winner(vec![second.clone(), first.clone()]), "A");
        assert_eq!(winner(vec![first, second]), "A");
    }

    #[test]
    fn test_unknown_status_ranks_last() {
        let unknown = candidate("A", MatchStatus::Unknown, 1.0, 4, 0);
        let unresolved = candidate("B", MatchStatus::Unresolved, 0.0, 0, 1);
        assert_eq!(winner(vec![unknown, unresolved]), "B");
    }

    #[test]
    fn test_every_permutation_agrees() {
        let pool = vec![
            candidate("A", MatchStatus::ResolvedApproximate, 0.8, 1, 0),
            candidate("B", MatchStatus::ResolvedApproximate, 0.8, 1, 1),
            candidate("C", MatchStatus::ResolvedApproximate, 0.8, 0, 2),
            candidate("D", MatchStatus::Unresolved, 0.99, 5, 3),
        ];
        let orders = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1], [1, 0, 2, 3]];
        for order in orders {
            let shuffled: Vec<_> = order.iter().map(|&i| pool[i].clone()).collect();
            assert_eq!(winner(shuffled), "A");
        }
    }

    #[test]
    fn test_empty_pool() {
        assert!(pick_best(vec![]).is_none());
    }
}
