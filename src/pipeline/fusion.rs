//! Fusion: deduplicating union of two ranked retrieval sets

use std::collections::HashSet;

use crate::models::RetrievalSet;

/// Merge two retrieval sets, keyed by document id.
///
/// All hits of `a` are kept in order, then hits of `b` whose id has not
/// been seen. A document retrieved by both queries keeps its score and
/// rank from `a` (the rewritten-question retrieval), never from `b` (the
/// HyDE retrieval). This asymmetric tie-break decides which score value
/// survives into reranking input, so it must hold exactly. No score
/// normalization happens here.
pub fn merge_retrieval_sets(a: &RetrievalSet, b: &RetrievalSet) -> RetrievalSet {
    let mut seen: HashSet<&str> = HashSet::with_capacity(a.len() + b.len());
    let mut hits = Vec::with_capacity(a.len() + b.len());

    for hit in a.hits.iter().chain(b.hits.iter()) {
        if seen.insert(hit.id.as_str()) {
            hits.push(hit.clone());
        }
    }

    RetrievalSet::new(hits)
}
