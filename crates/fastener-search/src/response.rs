//! JSON response shapes returned by the searcher

use serde::Serialize;

use fastener_core::{
    find_standard_codes, format_standard_for_display, HybridRanker, QueryAnalysis, RankedResult,
    SearchCandidate, StandardCode, StandardMatch, StandardSuggestion,
};

/// Target snippet length in characters
pub const SNIPPET_CHARS: usize = 200;

const ELLIPSIS: &str = "...";

/// Source document of a result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

/// One formatted result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub id: String,
    pub content: String,
    pub snippet: String,
    /// Hybrid score on a 0-100 scale, one decimal
    pub score: f32,
    pub vector_score: f32,
    pub exact_match: bool,
    pub standard_match: StandardMatch,
    pub document: DocumentRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub analysis: QueryAnalysis,
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<StandardSuggestion>,
    pub took_ms: u64,
}

impl SearchResponse {
    /// Response with no results, used for blank queries
    pub fn empty(analysis: QueryAnalysis) -> Self {
        Self {
            query: analysis.query.clone(),
            analysis,
            results: Vec::new(),
            total: 0,
            suggestions: None,
            took_ms: 0,
        }
    }

    /// Format ranked results.
    ///
    /// Suggestions are attached only when the requested code is in the
    /// equivalence table.
    pub fn build(
        ranker: &HybridRanker,
        analysis: QueryAnalysis,
        ranked: Vec<RankedResult>,
        took_ms: u64,
    ) -> Self {
        let max_score = ranker.max_hybrid_score(&analysis);
        let highlight: Vec<StandardCode> = match analysis.standard_code() {
            Some(code) => std::iter::once(*code)
                .chain(ranker.table().get_equivalents_fast(code).iter().copied())
                .collect(),
            None => Vec::new(),
        };

        let results: Vec<SearchResultItem> = ranked
            .into_iter()
            .map(|result| format_result(result, max_score, &highlight))
            .collect();

        let suggestions = analysis
            .standard_code()
            .filter(|code| ranker.table().find_standard(code).is_some())
            .map(|code| ranker.get_standard_suggestions(code));

        Self {
            query: analysis.query.clone(),
            total: results.len(),
            analysis,
            results,
            suggestions,
            took_ms,
        }
    }
}

fn format_result(
    result: RankedResult,
    max_score: f32,
    highlight: &[StandardCode],
) -> SearchResultItem {
    let candidate = SearchCandidate::new(result.id, result.vector_score, result.content)
        .with_metadata(result.metadata);

    let standard = candidate.metadata.standard.clone().or_else(|| {
        candidate
            .standard_codes()
            .first()
            .map(format_standard_for_display)
    });

    SearchResultItem {
        snippet: snippet(&candidate.content, highlight),
        score: display_score(result.hybrid_score, max_score),
        vector_score: result.vector_score,
        exact_match: result.exact_standard_match,
        standard_match: result.standard_match,
        document: DocumentRef {
            id: candidate.metadata.document_id.clone(),
            filename: candidate.metadata.filename.clone(),
            supplier: candidate.metadata.supplier.clone(),
        },
        product_type: candidate.product_type().map(|p| p.as_str().to_string()),
        material: candidate.material().map(|m| m.as_str().to_string()),
        thread_type: candidate.thread().map(|t| t.to_string()),
        standard,
        id: candidate.id,
        content: candidate.content,
    }
}

/// Scale a hybrid score to 0-100 against the best attainable score
pub fn display_score(hybrid_score: f32, max_score: f32) -> f32 {
    if max_score.is_nan() || max_score <= 0.0 || hybrid_score.is_nan() {
        return 0.0;
    }
    let scaled = (hybrid_score / max_score * 100.0).clamp(0.0, 100.0);
    (scaled * 10.0).round() / 10.0
}

/// Whitespace-collapsed excerpt of about [`SNIPPET_CHARS`] characters.
///
/// The window is centred on the first occurrence of any `highlight` code;
/// without one it starts at the beginning. Cut ends are marked with `...`.
pub fn snippet(content: &str, highlight: &[StandardCode]) -> String {
    let text = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    if chars.len() <= SNIPPET_CHARS {
        return text;
    }

    let focus = find_standard_codes(&text)
        .into_iter()
        .find(|occurrence| highlight.contains(&occurrence.code));

    let start = match focus {
        Some(occurrence) => {
            let first = chars.partition_point(|(byte, _)| *byte < occurrence.start);
            let last = chars.partition_point(|(byte, _)| *byte < occurrence.end);
            let centre = (first + last) / 2;
            centre
                .saturating_sub(SNIPPET_CHARS / 2)
                .min(chars.len() - SNIPPET_CHARS)
        }
        None => 0,
    };
    let end = start + SNIPPET_CHARS;

    let from = chars[start].0;
    let to = chars.get(end).map(|(byte, _)| *byte).unwrap_or(text.len());

    let mut out = String::with_capacity(SNIPPET_CHARS + 2 * ELLIPSIS.len());
    if start > 0 {
        out.push_str(ELLIPSIS);
    }
    out.push_str(text[from..to].trim());
    if end < chars.len() {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastener_core::{classify_query, normalize_standard_code, CandidateMetadata, StandardTable};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn code(raw: &str) -> StandardCode {
        normalize_standard_code(raw).unwrap()
    }

    #[test]
    fn test_display_score() {
        assert_eq!(display_score(3.0, 3.0), 100.0);
        assert_eq!(display_score(1.5, 3.0), 50.0);
        assert_eq!(display_score(0.123, 1.0), 12.3);
        assert_eq!(display_score(5.0, 3.0), 100.0);
        assert_eq!(display_score(-1.0, 3.0), 0.0);
        assert_eq!(display_score(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_short_snippet_collapses_whitespace() {
        assert_eq!(snippet("Hex  nut\n\tDIN 934 ", &[]), "Hex nut DIN 934");
    }

    #[test]
    fn test_long_snippet_without_code_starts_at_beginning() {
        let content = "word ".repeat(100);
        let result = snippet(&content, &[]);
        assert!(result.starts_with("word"));
        assert!(result.ends_with(ELLIPSIS));
        assert!(result.chars().count() <= SNIPPET_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn test_long_snippet_centres_on_code() {
        let content = format!(
            "{} Hex nut ISO 4032 M10 {}",
            "lorem ".repeat(80),
            "ipsum ".repeat(80)
        );
        let result = snippet(&content, &[code("DIN 934"), code("ISO 4032")]);

        assert!(result.starts_with(ELLIPSIS));
        assert!(result.ends_with(ELLIPSIS));
        assert!(result.contains("ISO 4032"));
        let position = result.find("ISO 4032").unwrap();
        assert!(position > 60 && position < 140, "code at {}", position);
    }

    #[test]
    fn test_snippet_ignores_unrelated_codes() {
        let content = format!("DIN 125 {} ISO 4032 {}", "lorem ".repeat(80), "ipsum ".repeat(10));
        let result = snippet(&content, &[code("ISO 4032")]);
        assert!(result.contains("ISO 4032"));
        assert!(!result.contains("DIN 125"));
    }

    #[test]
    fn test_snippet_handles_multibyte_text() {
        let content = format!(
            "{} Sechskantmutter DIN 934 {}",
            "Größe ".repeat(60),
            "Maß ".repeat(60)
        );
        let result = snippet(&content, &[code("DIN 934")]);
        assert!(result.contains("DIN 934"));
    }

    #[test]
    fn test_build_response() {
        let ranker = HybridRanker::new(Arc::new(StandardTable::builtin()));
        let analysis = classify_query("DIN 934 M10");
        let candidate = SearchCandidate::new("c1", 0.6, "Hex nut ISO 4032 M10 A2-70")
            .with_metadata(CandidateMetadata {
                document_id: Some("doc-1".into()),
                supplier: Some("Acme".into()),
                ..Default::default()
            });
        let ranked = ranker.rerank_results(vec![candidate], &analysis);

        let response = SearchResponse::build(&ranker, analysis, ranked, 12);

        assert_eq!(response.total, 1);
        assert_eq!(response.took_ms, 12);
        let item = &response.results[0];
        assert!(item.exact_match);
        assert_eq!(item.standard_match, StandardMatch::Equivalent);
        assert_eq!(item.standard.as_deref(), Some("ISO 4032"));
        assert_eq!(item.material.as_deref(), Some("A2"));
        assert_eq!(item.product_type.as_deref(), Some("nut"));
        assert_eq!(item.thread_type.as_deref(), Some("M10"));
        assert_eq!(item.document.supplier.as_deref(), Some("Acme"));
        // 0.6 + 1.0 out of a possible 3.0
        assert_eq!(item.score, 53.3);

        let suggestions = response.suggestions.as_ref().unwrap();
        assert_eq!(suggestions.display, "DIN 934");
        assert!(suggestions.equivalents.contains(&"ISO 4032".to_string()));
    }

    #[test]
    fn test_response_json_shape() {
        let ranker = HybridRanker::new(Arc::new(StandardTable::builtin()));
        let analysis = classify_query("DIN 99999");
        let response = SearchResponse::build(&ranker, analysis, Vec::new(), 3);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["tookMs"], 3);
        assert_eq!(json["total"], 0);
        assert!(json.get("suggestions").is_none());
        assert_eq!(json["analysis"]["queryType"], "exact_standard");
    }
}
