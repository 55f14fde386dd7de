use crate::error::{Error, Result};
use crate::index::IndexGeneration;
use crate::similarity::{Measure, MeasureScores};
use crate::RowId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub id: String,
    pub display_name: String,
    #[serde(skip)]
    pub row: RowId,
    /// Score under the measure used for ranking.
    pub score: f64,
    pub scores: MeasureScores,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub measure: Measure,
    pub total_matches: usize,
    /// Normalized query terms, including ones outside the vocabulary.
    pub query_terms: Vec<String>,
    pub results: Vec<SimilarityResult>,
}

/// Score every listing in `generation` against `query` and keep the best `top_k`.
///
/// Listings scoring exactly 0 are not matches. Ties keep catalog order, so
/// repeating a query against the same generation returns the same list.
pub fn rank(generation: &IndexGeneration, query: &str, measure: Measure, top_k: usize) -> Result<SearchResults> {
    if top_k == 0 {
        return Err(Error::InvalidTopK);
    }
    let qv = generation.vectorize(query);
    let mut out = SearchResults { measure, query_terms: qv.tokens.clone(), ..Default::default() };
    if qv.is_empty() {
        return Ok(out);
    }

    let matrix = generation.matrix();
    let mut dots = vec![0.0f64; matrix.num_rows()];
    for &(term, q_w) in &qv.weights {
        for &(row, d_w) in matrix.postings(term) {
            dots[row as usize] += q_w * d_w;
        }
    }

    let mut scored: Vec<(RowId, MeasureScores)> = Vec::new();
    for (row, dot) in dots.into_iter().enumerate() {
        if dot <= 0.0 {
            continue;
        }
        let row = row as RowId;
        let d_sq = matrix.row(row).map(|r| r.sq_norm).unwrap_or(0.0);
        let scores = MeasureScores::from_components(dot, qv.sq_norm, d_sq);
        if scores.get(measure) > 0.0 {
            scored.push((row, scores));
        }
    }

    scored.sort_unstable_by(|a, b| b.1.get(measure).total_cmp(&a.1.get(measure)).then(a.0.cmp(&b.0)));
    out.total_matches = scored.len();
    scored.truncate(top_k);

    let catalog = generation.catalog();
    out.results = scored
        .into_iter()
        .map(|(row, scores)| SimilarityResult {
            id: catalog.id(row).unwrap_or_default().to_string(),
            display_name: catalog.display_name(row).unwrap_or_default().to_string(),
            row,
            score: scores.get(measure),
            scores,
        })
        .collect();
    tracing::debug!(query, %measure, total_matches = out.total_matches, returned = out.results.len(), "ranked");
    Ok(out)
}
