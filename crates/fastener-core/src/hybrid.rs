//! Hybrid reranking of vector-search candidates
//!
//! Vector similarity alone cannot tell `DIN 933` from `DIN 931`: the chunks
//! read almost the same. The [`HybridRanker`] folds the structured reading of
//! the query back into the ranking:
//!
//! - **Exact-standard queries**: candidates carrying the requested code get
//!   `exact_match_boost`, candidates carrying a declared equivalent get
//!   `equivalent_match_boost`. Both boosts are at least 1.0, so any exact
//!   result outranks any non-exact one.
//! - **Other queries**: small boosts for a matching thread and material.
//!
//! The ranker is synchronous, holds no mutable state and never fails; the
//! equivalence table is shared read-only behind an `Arc`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fastener_core::{classify_query, HybridRanker, SearchCandidate, StandardTable};
//!
//! let ranker = HybridRanker::new(Arc::new(StandardTable::builtin()));
//! let analysis = classify_query("DIN 933 M8");
//!
//! let ranked = ranker.rerank_results(
//!     vec![
//!         SearchCandidate::new("c1", 0.4, "Hex screw ISO 4017 M8x30"),
//!         SearchCandidate::new("c2", 0.3, "Hex screw DIN 933 M8x30"),
//!     ],
//!     &analysis,
//! );
//! assert_eq!(ranked[0].id, "c2");
//! assert!(ranked[1].exact_standard_match);
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::classifier::{Material, ProductType, QueryAnalysis, ThreadSpec};
use crate::standards::{format_standard_for_display, StandardCode, StandardRecord, StandardTable};
use crate::types::{RankedResult, SearchCandidate, StandardMatch};

/// Score boosts applied during reranking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Candidate carries the requested standard code
    pub exact_match_boost: f32,
    /// Candidate carries an equivalent of the requested code
    pub equivalent_match_boost: f32,
    /// Thread agrees with the query (non-exact queries)
    pub thread_match_boost: f32,
    /// Material agrees with the query (non-exact queries)
    pub material_match_boost: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            exact_match_boost: 2.0,
            equivalent_match_boost: 1.0,
            thread_match_boost: 0.05,
            material_match_boost: 0.05,
        }
    }
}

/// Thresholds and exact-match policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPolicy {
    /// Similarity threshold when the caller gives none
    pub default_threshold: f32,
    /// Upper bound on the threshold for exact-standard queries
    pub exact_match_threshold: f32,
    /// Exact results needed before non-exact ones are dropped
    pub min_exact_matches: usize,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            default_threshold: 0.5,
            exact_match_threshold: 0.25,
            min_exact_matches: 3,
        }
    }
}

/// Equality constraints for the vector index.
///
/// Absent fields impose no constraint. The standard constraint is satisfied
/// by the code itself or any of `standard_equivalents`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadSpec>,
    /// Display form of the requested code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    /// Display forms of its declared equivalents
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub standard_equivalents: Vec<String>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.product_type.is_none()
            && self.material.is_none()
            && self.thread.is_none()
            && self.standard.is_none()
    }

    /// Standard display forms accepted by this filter
    pub fn accepted_standards(&self) -> Vec<String> {
        self.standard
            .iter()
            .chain(self.standard_equivalents.iter())
            .cloned()
            .collect()
    }

    /// Thread size key ("M8") accepted by this filter
    pub fn thread_size(&self) -> Option<String> {
        self.thread.map(|t| ThreadSpec::new(t.diameter).to_string())
    }

    /// Whether a candidate passes every constraint.
    ///
    /// Mirrors the payload filter built by the vector index, so in-memory
    /// indexes and tests see the same semantics. A constrained field the
    /// candidate cannot provide fails the constraint.
    pub fn accepts(&self, candidate: &SearchCandidate) -> bool {
        if let Some(product_type) = self.product_type {
            if candidate.product_type() != Some(product_type) {
                return false;
            }
        }

        if let Some(material) = self.material {
            match candidate.material() {
                Some(found) if material.matches(&found) => {}
                _ => return false,
            }
        }

        if let Some(thread) = self.thread {
            match candidate.thread() {
                Some(found) if (found.diameter - thread.diameter).abs() < 0.01 => {}
                _ => return false,
            }
        }

        if self.standard.is_some() {
            let accepted = self.accepted_standards();
            let carries = candidate
                .standard_codes()
                .iter()
                .any(|code| accepted.contains(&format_standard_for_display(code)));
            if !carries {
                return false;
            }
        }

        true
    }
}

/// What the service knows about a standard code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardSuggestion {
    pub code: StandardCode,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<StandardRecord>,
    pub equivalents: Vec<String>,
}

/// Query-aware reranker over vector-search candidates
#[derive(Debug, Clone)]
pub struct HybridRanker {
    table: Arc<StandardTable>,
    scoring: ScoringConfig,
    policy: SearchPolicy,
}

impl HybridRanker {
    /// Ranker with default scoring and policy
    pub fn new(table: Arc<StandardTable>) -> Self {
        Self {
            table,
            scoring: ScoringConfig::default(),
            policy: SearchPolicy::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn table(&self) -> &StandardTable {
        &self.table
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Payload constraints for the vector index
    pub fn build_search_filters(&self, analysis: &QueryAnalysis) -> FilterSpec {
        let (standard, standard_equivalents) = match analysis.standard_code() {
            Some(code) => (
                Some(format_standard_for_display(code)),
                self.table
                    .get_equivalents_fast(code)
                    .iter()
                    .map(format_standard_for_display)
                    .collect(),
            ),
            None => (None, Vec::new()),
        };

        FilterSpec {
            product_type: analysis.product_type,
            material: analysis.material,
            thread: analysis.thread,
            standard,
            standard_equivalents,
        }
    }

    pub fn should_use_exact_match(&self, analysis: &QueryAnalysis) -> bool {
        analysis.requires_exact_match
    }

    pub fn should_use_vector_search(&self, analysis: &QueryAnalysis) -> bool {
        analysis.has_text()
    }

    /// Similarity threshold for this query.
    ///
    /// Exact-standard queries loosen the threshold so equivalents with weak
    /// vector similarity still reach the reranker.
    pub fn similarity_threshold(&self, analysis: &QueryAnalysis, requested: Option<f32>) -> f32 {
        let base = requested.unwrap_or(self.policy.default_threshold);
        if analysis.requires_exact_match {
            base.min(self.policy.exact_match_threshold)
        } else {
            base
        }
    }

    /// Relation between a candidate and the requested standard
    pub fn standard_match(
        &self,
        candidate: &SearchCandidate,
        analysis: &QueryAnalysis,
    ) -> StandardMatch {
        let Some(requested) = analysis.standard_code() else {
            return StandardMatch::None;
        };

        let codes = candidate.standard_codes();
        if codes.contains(requested) {
            StandardMatch::Direct
        } else if codes.iter().any(|code| self.table.are_equivalent(requested, code)) {
            StandardMatch::Equivalent
        } else {
            StandardMatch::None
        }
    }

    fn score(
        &self,
        candidate: &SearchCandidate,
        analysis: &QueryAnalysis,
        matched: StandardMatch,
    ) -> f32 {
        let vector = if candidate.score.is_nan() {
            0.0
        } else {
            candidate.score.clamp(0.0, 1.0)
        };

        if analysis.requires_exact_match {
            return match matched {
                StandardMatch::Direct => vector + self.scoring.exact_match_boost,
                StandardMatch::Equivalent => vector + self.scoring.equivalent_match_boost,
                StandardMatch::None => vector,
            };
        }

        let mut score = vector;
        if let Some(thread) = analysis.thread {
            if candidate.thread().is_some_and(|found| thread.matches(&found)) {
                score += self.scoring.thread_match_boost;
            }
        }
        if let Some(material) = analysis.material {
            if candidate.material().is_some_and(|found| material.matches(&found)) {
                score += self.scoring.material_match_boost;
            }
        }
        score
    }

    /// Score and order candidates.
    ///
    /// For exact-standard queries, exact matches come first. Within that,
    /// results are ordered by hybrid score, then vector score, then input
    /// order.
    pub fn rerank_results(
        &self,
        candidates: Vec<SearchCandidate>,
        analysis: &QueryAnalysis,
    ) -> Vec<RankedResult> {
        let mut ranked: Vec<RankedResult> = candidates
            .into_iter()
            .map(|candidate| {
                let standard_match = self.standard_match(&candidate, analysis);
                let hybrid_score = self.score(&candidate, analysis, standard_match);
                RankedResult {
                    id: candidate.id,
                    content: candidate.content,
                    metadata: candidate.metadata,
                    vector_score: candidate.score,
                    hybrid_score,
                    exact_standard_match: standard_match.is_exact(),
                    standard_match,
                }
            })
            .collect();

        // Exact-standard queries rank every exact result above every other
        // one, whatever the configured boosts and vector scores.
        let exact_tier = analysis.requires_exact_match;
        ranked.sort_by(|a, b| {
            let tier = if exact_tier {
                b.exact_standard_match.cmp(&a.exact_standard_match)
            } else {
                Ordering::Equal
            };
            tier.then_with(|| b.hybrid_score.total_cmp(&a.hybrid_score))
                .then_with(|| tie_break(b.vector_score).total_cmp(&tie_break(a.vector_score)))
        });

        debug!(
            "Reranked {} candidates ({} exact)",
            ranked.len(),
            ranked.iter().filter(|r| r.exact_standard_match).count()
        );
        ranked
    }

    /// Keep only exact results, once there are enough of them.
    ///
    /// Below `min_exact_matches` exact results the list is returned as is;
    /// the boosts already put the exact ones first.
    pub fn filter_by_exact_standard(
        &self,
        ranked: Vec<RankedResult>,
        analysis: &QueryAnalysis,
    ) -> Vec<RankedResult> {
        if !analysis.requires_exact_match {
            return ranked;
        }

        let exact = ranked.iter().filter(|r| r.exact_standard_match).count();
        if exact == 0 || exact < self.policy.min_exact_matches.max(1) {
            return ranked;
        }

        debug!("Keeping {} exact matches of {}", exact, ranked.len());
        ranked.into_iter().filter(|r| r.exact_standard_match).collect()
    }

    /// Drop repeated ids, keeping the first (best ranked) occurrence
    pub fn dedupe_results(&self, ranked: Vec<RankedResult>) -> Vec<RankedResult> {
        let mut seen = HashSet::new();
        ranked.into_iter().filter(|r| seen.insert(r.id.clone())).collect()
    }

    /// Display form, record and equivalents for a code
    pub fn get_standard_suggestions(&self, code: &StandardCode) -> StandardSuggestion {
        StandardSuggestion {
            code: *code,
            display: format_standard_for_display(code),
            record: self.table.find_standard(code).cloned(),
            equivalents: self
                .table
                .get_equivalents_fast(code)
                .iter()
                .map(format_standard_for_display)
                .collect(),
        }
    }

    /// Highest hybrid score a candidate can reach for this query
    pub fn max_hybrid_score(&self, analysis: &QueryAnalysis) -> f32 {
        if analysis.requires_exact_match {
            1.0 + self
                .scoring
                .exact_match_boost
                .max(self.scoring.equivalent_match_boost)
        } else {
            1.0 + self.scoring.thread_match_boost + self.scoring.material_match_boost
        }
    }
}

/// NaN similarities sort below every real one
fn tie_break(vector_score: f32) -> f32 {
    if vector_score.is_nan() {
        f32::NEG_INFINITY
    } else {
        vector_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify_query;
    use crate::types::CandidateMetadata;
    use pretty_assertions::assert_eq;

    fn ranker() -> HybridRanker {
        HybridRanker::new(Arc::new(StandardTable::builtin()))
    }

    fn tagged(id: &str, score: f32, standard: &str) -> SearchCandidate {
        SearchCandidate::new(id, score, format!("Hex product {}", standard)).with_metadata(
            CandidateMetadata {
                standard: Some(standard.to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_build_filters_for_exact_query() {
        let filters = ranker().build_search_filters(&classify_query("DIN 934 M10 A2 nut"));
        assert_eq!(filters.standard.as_deref(), Some("DIN 934"));
        assert_eq!(filters.standard_equivalents, vec!["ISO 4032", "EN 24032", "GB 6170"]);
        assert_eq!(filters.product_type, Some(ProductType::Nut));
        assert_eq!(filters.material, Some(Material::A2));
        assert_eq!(filters.thread_size().as_deref(), Some("M10"));
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_build_filters_for_plain_text() {
        let filters = ranker().build_search_filters(&classify_query("something shiny"));
        assert!(filters.is_empty());
        assert!(filters.accepted_standards().is_empty());
    }

    #[test]
    fn test_unknown_code_filters_without_equivalents() {
        let filters = ranker().build_search_filters(&classify_query("DIN 99999"));
        assert_eq!(filters.standard.as_deref(), Some("DIN 99999"));
        assert!(filters.standard_equivalents.is_empty());
    }

    #[test]
    fn test_filter_accepts_equivalents() {
        let filters = ranker().build_search_filters(&classify_query("DIN 933"));
        assert!(filters.accepts(&tagged("a", 0.5, "ISO 4017")));
        assert!(filters.accepts(&tagged("b", 0.5, "DIN 933")));
        assert!(!filters.accepts(&tagged("c", 0.5, "DIN 931")));
        assert!(!filters.accepts(&SearchCandidate::new("d", 0.5, "no code here")));
    }

    #[test]
    fn test_filter_material_and_thread() {
        let filters = FilterSpec {
            material: Some(Material::A2),
            thread: Some(ThreadSpec::new(8.0).with_length(30.0)),
            ..Default::default()
        };
        assert!(filters.accepts(&SearchCandidate::new("a", 0.5, "AISI 304 bolt M8x50")));
        assert!(!filters.accepts(&SearchCandidate::new("b", 0.5, "A4 bolt M8x50")));
        assert!(!filters.accepts(&SearchCandidate::new("c", 0.5, "A2 bolt M10")));
    }

    #[test]
    fn test_material_filter_ignores_standard_numbers() {
        let filters = ranker().build_search_filters(&classify_query("A4 screw M8"));
        assert_eq!(filters.material, Some(Material::A4));
        let wing = SearchCandidate::new("w", 0.5, "Wing screw DIN 316 M8 zinc plated");
        assert!(!filters.accepts(&wing));
        let screw = SearchCandidate::new("s", 0.5, "Hex head screw DIN 933 M8x20 A4-70");
        assert!(filters.accepts(&screw));
    }

    #[test]
    fn test_policy_predicates() {
        let ranker = ranker();
        let exact = classify_query("ISO 4017");
        let plain = classify_query("galvanized bolt");
        let blank = classify_query("   ");

        assert!(ranker.should_use_exact_match(&exact));
        assert!(!ranker.should_use_exact_match(&plain));
        assert!(ranker.should_use_vector_search(&plain));
        assert!(!ranker.should_use_vector_search(&blank));

        assert_eq!(ranker.similarity_threshold(&exact, None), 0.25);
        assert_eq!(ranker.similarity_threshold(&exact, Some(0.1)), 0.1);
        assert_eq!(ranker.similarity_threshold(&exact, Some(0.7)), 0.25);
        assert_eq!(ranker.similarity_threshold(&plain, None), 0.5);
        assert_eq!(ranker.similarity_threshold(&plain, Some(0.7)), 0.7);
    }

    #[test]
    fn test_rerank_direct_beats_equivalent() {
        let analysis = classify_query("DIN 933 M8");
        let ranked = ranker().rerank_results(
            vec![tagged("c1", 0.4, "ISO 4017"), tagged("c2", 0.3, "DIN 933")],
            &analysis,
        );

        assert_eq!(ranked[0].id, "c2");
        assert_eq!(ranked[0].standard_match, StandardMatch::Direct);
        assert!((ranked[0].hybrid_score - 2.3).abs() < 1e-6);
        assert_eq!(ranked[1].id, "c1");
        assert_eq!(ranked[1].standard_match, StandardMatch::Equivalent);
        assert!(ranked[1].exact_standard_match);
        assert_eq!(ranked[1].vector_score, 0.4);
    }

    #[test]
    fn test_rerank_equivalent_at_zero_beats_non_exact_at_one() {
        let analysis = classify_query("DIN 933");
        let ranked = ranker().rerank_results(
            vec![
                tagged("nonexact", 1.0, "DIN 931"),
                tagged("equiv", 0.0, "ISO 4017"),
                tagged("nan", f32::NAN, "GB 5783"),
            ],
            &analysis,
        );
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["equiv", "nan", "nonexact"]);
        assert_eq!(ranked[0].hybrid_score, ranked[2].hybrid_score);
    }

    #[test]
    fn test_rerank_exact_tier_holds_for_small_boosts() {
        let analysis = classify_query("DIN 933");
        let ranker = ranker().with_scoring(ScoringConfig {
            exact_match_boost: 0.2,
            equivalent_match_boost: 0.1,
            ..Default::default()
        });
        let ranked = ranker.rerank_results(
            vec![
                tagged("nonexact", 0.95, "DIN 931"),
                tagged("equiv", 0.1, "ISO 4017"),
                tagged("direct", 0.05, "DIN 933"),
            ],
            &analysis,
        );
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["direct", "equiv", "nonexact"]);
    }

    #[test]
    fn test_rerank_metadata_tag_wins_over_content() {
        let analysis = classify_query("DIN 933");
        let candidate =
            SearchCandidate::new("x", 0.9, "Replaces DIN 933").with_metadata(CandidateMetadata {
                standard: Some("DIN 931".to_string()),
                ..Default::default()
            });
        let ranked = ranker().rerank_results(vec![candidate], &analysis);
        assert_eq!(ranked[0].standard_match, StandardMatch::None);
        assert_eq!(ranked[0].hybrid_score, 0.9);
    }

    #[test]
    fn test_rerank_non_exact_boosts() {
        let analysis = classify_query("M8x30 A2 bolt");
        let ranked = ranker().rerank_results(
            vec![
                SearchCandidate::new("plain", 0.62, "Carriage bolt, galvanized"),
                SearchCandidate::new("thread", 0.6, "Hex bolt M8x30 galvanized"),
                SearchCandidate::new("both", 0.58, "Hex bolt M8x30 A2-70"),
            ],
            &analysis,
        );
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["both", "thread", "plain"]);
        assert!(ranked.iter().all(|r| !r.exact_standard_match));
    }

    #[test]
    fn test_rerank_clamps_vector_score() {
        let analysis = classify_query("hex bolt");
        let ranked = ranker().rerank_results(
            vec![
                SearchCandidate::new("hi", 1.7, "x"),
                SearchCandidate::new("lo", -0.3, "y"),
                SearchCandidate::new("nan", f32::NAN, "z"),
            ],
            &analysis,
        );
        assert_eq!(ranked[0].hybrid_score, 1.0);
        assert_eq!(ranked[0].vector_score, 1.7);
        assert!(ranked[1..].iter().all(|r| r.hybrid_score == 0.0));
    }

    #[test]
    fn test_rerank_empty() {
        assert!(ranker().rerank_results(Vec::new(), &classify_query("DIN 933")).is_empty());
    }

    #[test]
    fn test_filter_by_exact_standard_threshold() {
        let ranker = ranker();
        let analysis = classify_query("DIN 933");

        let two_exact = ranker.rerank_results(
            vec![
                tagged("a", 0.9, "DIN 931"),
                tagged("b", 0.5, "DIN 933"),
                tagged("c", 0.4, "ISO 4017"),
            ],
            &analysis,
        );
        assert_eq!(ranker.filter_by_exact_standard(two_exact, &analysis).len(), 3);

        let three_exact = ranker.rerank_results(
            vec![
                tagged("a", 0.9, "DIN 931"),
                tagged("b", 0.5, "DIN 933"),
                tagged("c", 0.4, "ISO 4017"),
                tagged("d", 0.3, "EN 24017"),
            ],
            &analysis,
        );
        let filtered = ranker.filter_by_exact_standard(three_exact, &analysis);
        let ids: Vec<&str> = filtered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_filter_by_exact_standard_floor_of_one() {
        let ranker = ranker().with_policy(SearchPolicy {
            min_exact_matches: 0,
            ..Default::default()
        });
        let analysis = classify_query("DIN 933");
        let ranked = ranker.rerank_results(
            vec![tagged("a", 0.9, "DIN 931"), tagged("b", 0.2, "DIN 933")],
            &analysis,
        );
        let filtered = ranker.filter_by_exact_standard(ranked, &analysis);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "b");
    }

    #[test]
    fn test_filter_by_exact_standard_ignores_descriptive() {
        let ranker = ranker();
        let analysis = classify_query("hex bolt");
        let ranked = ranker.rerank_results(vec![tagged("a", 0.9, "DIN 933")], &analysis);
        assert_eq!(ranker.filter_by_exact_standard(ranked.clone(), &analysis), ranked);
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let ranker = ranker();
        let analysis = classify_query("DIN 933");
        let ranked = ranker.rerank_results(
            vec![
                tagged("a", 0.2, "DIN 931"),
                tagged("a", 0.3, "DIN 933"),
                tagged("b", 0.1, "DIN 931"),
            ],
            &analysis,
        );
        let deduped = ranker.dedupe_results(ranked);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "a");
        assert_eq!(deduped[0].standard_match, StandardMatch::Direct);
    }

    #[test]
    fn test_standard_suggestions() {
        let ranker = ranker();
        let code = crate::standards::normalize_standard_code("din 933").unwrap();
        let suggestion = ranker.get_standard_suggestions(&code);
        assert_eq!(suggestion.display, "DIN 933");
        assert_eq!(suggestion.record.as_ref().map(|r| r.category.as_str()), Some("screw"));
        assert!(suggestion.equivalents.contains(&"ISO 4017".to_string()));
        assert!(!suggestion.equivalents.contains(&"DIN 933".to_string()));

        let unknown = crate::standards::normalize_standard_code("DIN 99999").unwrap();
        let suggestion = ranker.get_standard_suggestions(&unknown);
        assert!(suggestion.record.is_none());
        assert!(suggestion.equivalents.is_empty());
    }

    #[test]
    fn test_max_hybrid_score() {
        let ranker = ranker();
        assert_eq!(ranker.max_hybrid_score(&classify_query("DIN 933")), 3.0);
        assert!((ranker.max_hybrid_score(&classify_query("hex bolt")) - 1.1).abs() < 1e-6);
    }
}
