use crate::catalog::{CatalogEntry, CatalogIndex};
use crate::tokenizer::{Normalizer, NormalizerConfig};
use crate::{RowId, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Inverse document frequency formula. Both variants stay finite and
/// strictly positive for any term seen in at least one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdfScheme {
    /// ln((1 + n) / (1 + df)) + 1
    #[default]
    Smooth,
    /// ln(1 + n / df)
    Log,
}

impl IdfScheme {
    pub fn idf(self, num_docs: usize, df: u32) -> f64 {
        let n = num_docs as f64;
        let df = df.max(1) as f64;
        match self {
            IdfScheme::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
            IdfScheme::Log => (1.0 + n / df).ln(),
        }
    }
}

impl FromStr for IdfScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smooth" => Ok(IdfScheme::Smooth),
            "log" => Ok(IdfScheme::Log),
            other => Err(format!("unknown idf scheme: {other} (expected smooth or log)")),
        }
    }
}

impl fmt::Display for IdfScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdfScheme::Smooth => "smooth",
            IdfScheme::Log => "log",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub normalizer: NormalizerConfig,
    pub idf: IdfScheme,
}

/// Terms observed at build time, each with a fixed position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    #[serde(skip)]
    lookup: HashMap<String, TermId>,
}

impl Vocabulary {
    fn intern(&mut self, term: String) -> TermId {
        if let Some(&id) = self.lookup.get(&term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.lookup.insert(term.clone(), id);
        self.terms.push(term);
        id
    }

    pub fn get(&self, term: &str) -> Option<TermId> {
        self.lookup.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn reindex(&mut self) {
        self.lookup = self.terms.iter().enumerate().map(|(i, t)| (t.clone(), i as TermId)).collect();
    }
}

/// Sparse TF-IDF row: (term, weight) pairs sorted by term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRow {
    pub weights: Vec<(TermId, f64)>,
    pub sq_norm: f64,
}

impl DocumentRow {
    fn from_weights(mut weights: Vec<(TermId, f64)>) -> Self {
        weights.sort_unstable_by_key(|(t, _)| *t);
        let sq_norm = weights.iter().map(|(_, w)| w * w).sum();
        Self { weights, sq_norm }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfIdfMatrix {
    rows: Vec<DocumentRow>,
    idf: Vec<f64>,
    /// term -> (row, weight), rows ascending
    #[serde(skip)]
    postings: Vec<Vec<(RowId, f64)>>,
}

impl TfIdfMatrix {
    pub fn row(&self, row: RowId) -> Option<&DocumentRow> {
        self.rows.get(row as usize)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn idf(&self, term: TermId) -> f64 {
        self.idf.get(term as usize).copied().unwrap_or(0.0)
    }

    pub(crate) fn postings(&self, term: TermId) -> &[(RowId, f64)] {
        self.postings.get(term as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    fn reindex(&mut self) {
        let mut postings: Vec<Vec<(RowId, f64)>> = vec![Vec::new(); self.idf.len()];
        for (row, doc) in self.rows.iter().enumerate() {
            for &(term, weight) in &doc.weights {
                if let Some(list) = postings.get_mut(term as usize) {
                    list.push((row as RowId, weight));
                }
            }
        }
        self.postings = postings;
    }
}

/// A query projected onto a generation's vocabulary and IDF weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryVector {
    /// Normalized query tokens, in order.
    pub tokens: Vec<String>,
    /// Tokens with no vocabulary entry; they carry no weight.
    pub dropped: Vec<String>,
    pub weights: Vec<(TermId, f64)>,
    pub sq_norm: f64,
}

impl QueryVector {
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// One immutable snapshot of catalog, vocabulary and TF-IDF matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexGeneration {
    pub(crate) number: u64,
    pub(crate) built_at: String,
    pub(crate) skipped: usize,
    pub(crate) idf_scheme: IdfScheme,
    pub(crate) normalizer: Normalizer,
    pub(crate) catalog: CatalogIndex,
    pub(crate) vocabulary: Vocabulary,
    pub(crate) matrix: TfIdfMatrix,
}

/// Summary of the active generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationInfo {
    pub generation: u64,
    pub built_at: String,
    pub num_docs: usize,
    pub vocabulary_size: usize,
    pub skipped: usize,
}

/// Build a generation from a corpus. Entries whose text normalizes to nothing
/// are left out of the catalog; duplicate ids keep their first occurrence.
pub fn build<I>(corpus: I, config: &IndexConfig) -> IndexGeneration
where
    I: IntoIterator<Item = CatalogEntry>,
{
    let normalizer = Normalizer::new(config.normalizer.clone());
    let mut catalog = CatalogIndex::new();
    let mut vocabulary = Vocabulary::default();
    let mut df: Vec<u32> = Vec::new();
    let mut counts: Vec<Vec<(TermId, u32)>> = Vec::new();
    let mut skipped = 0usize;
    let mut ingested = 0usize;

    for entry in corpus {
        ingested += 1;
        if catalog.contains(&entry.id) {
            tracing::warn!(id = %entry.id, "duplicate listing id, keeping first occurrence");
            skipped += 1;
            continue;
        }
        let tokens = normalizer.normalize(entry.raw_text.as_deref());
        if tokens.is_empty() {
            tracing::debug!(id = %entry.id, "listing has no indexable terms");
            skipped += 1;
            continue;
        }

        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        let mut seen_in_doc: HashSet<TermId> = HashSet::new();
        for term in tokens {
            let tid = vocabulary.intern(term);
            if df.len() <= tid as usize {
                df.resize(tid as usize + 1, 0);
            }
            *tf_counts.entry(tid).or_insert(0) += 1;
            if seen_in_doc.insert(tid) {
                df[tid as usize] += 1;
            }
        }
        catalog.push(entry.id, entry.display_name);
        counts.push(tf_counts.into_iter().collect());
    }

    let num_docs = catalog.len();
    let idf: Vec<f64> = df.iter().map(|&d| config.idf.idf(num_docs, d)).collect();
    let rows = counts
        .into_iter()
        .map(|tf| {
            DocumentRow::from_weights(tf.into_iter().map(|(tid, tf)| (tid, tf as f64 * idf[tid as usize])).collect())
        })
        .collect();

    let mut matrix = TfIdfMatrix { rows, idf, postings: Vec::new() };
    matrix.reindex();
    tracing::info!(ingested, skipped, num_docs, vocabulary_size = vocabulary.len(), "built tf-idf matrix");

    IndexGeneration {
        number: 0,
        built_at: now_rfc3339(),
        skipped,
        idf_scheme: config.idf,
        normalizer,
        catalog,
        vocabulary,
        matrix,
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

impl IndexGeneration {
    /// A generation with no documents.
    pub fn empty(config: &IndexConfig) -> Self {
        build(std::iter::empty::<CatalogEntry>(), config)
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub(crate) fn with_number(mut self, number: u64) -> Self {
        self.number = number;
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn matrix(&self) -> &TfIdfMatrix {
        &self.matrix
    }

    pub fn config(&self) -> IndexConfig {
        IndexConfig { normalizer: self.normalizer.config().clone(), idf: self.idf_scheme }
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn info(&self) -> GenerationInfo {
        GenerationInfo {
            generation: self.number,
            built_at: self.built_at.clone(),
            num_docs: self.catalog.len(),
            vocabulary_size: self.vocabulary.len(),
            skipped: self.skipped,
        }
    }

    /// Normalize a query with this generation's normalizer and weight it with
    /// this generation's IDF. Out-of-vocabulary terms are dropped.
    pub fn vectorize(&self, query: &str) -> QueryVector {
        let tokens = self.normalizer.normalize(query);
        let mut tf: HashMap<TermId, u32> = HashMap::new();
        let mut dropped = Vec::new();
        for token in &tokens {
            match self.vocabulary.get(token) {
                Some(tid) => *tf.entry(tid).or_insert(0) += 1,
                None => dropped.push(token.clone()),
            }
        }
        let mut weights: Vec<(TermId, f64)> =
            tf.into_iter().map(|(tid, count)| (tid, count as f64 * self.matrix.idf(tid))).collect();
        weights.sort_unstable_by_key(|(t, _)| *t);
        let sq_norm = weights.iter().map(|(_, w)| w * w).sum();
        QueryVector { tokens, dropped, weights, sq_norm }
    }

    /// Non-zero TF-IDF weights of one listing, heaviest first.
    pub fn term_weights(&self, row: RowId) -> Vec<(&str, f64)> {
        let Some(doc) = self.matrix.row(row) else {
            return Vec::new();
        };
        let mut out: Vec<(&str, f64)> = doc
            .weights
            .iter()
            .filter_map(|&(tid, w)| self.vocabulary.term(tid).map(|t| (t, w)))
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out
    }

    /// Rebuild derived lookup tables after deserialization.
    pub(crate) fn restore(&mut self) {
        self.catalog.reindex();
        self.vocabulary.reindex();
        self.matrix.reindex();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::named("1", "Cozy seaside apartment with sea view"),
            CatalogEntry::named("2", "Modern city loft"),
            CatalogEntry::named("3", "Seaside villa with private pool"),
        ]
    }

    #[test]
    fn idf_is_finite_and_positive_when_term_is_everywhere() {
        for scheme in [IdfScheme::Smooth, IdfScheme::Log] {
            let w = scheme.idf(3, 3);
            assert!(w.is_finite() && w > 0.0);
            assert!(scheme.idf(3, 1) > scheme.idf(3, 2));
        }
        assert!((IdfScheme::Smooth.idf(3, 3) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_documents_are_not_indexed() {
        let docs = vec![
            CatalogEntry::new("a", "blank", None),
            CatalogEntry::named("b", "the and of"),
            CatalogEntry::named("c", "Garden flat"),
        ];
        let g = build(docs, &IndexConfig::default());
        assert_eq!(g.len(), 1);
        assert_eq!(g.catalog().id(0), Some("c"));
        assert_eq!(g.info().skipped, 2);
    }

    #[test]
    fn weights_are_raw_tf_times_idf() {
        let docs = vec![CatalogEntry::named("1", "pool pool garden"), CatalogEntry::named("2", "garden")];
        let g = build(docs, &IndexConfig::default());
        let pool = g.vocabulary().get("pool").unwrap();
        let garden = g.vocabulary().get("garden").unwrap();
        let row = g.matrix().row(0).unwrap();
        let w = |t| row.weights.iter().find(|(id, _)| *id == t).map(|(_, w)| *w).unwrap();
        assert!((w(pool) - 2.0 * IdfScheme::Smooth.idf(2, 1)).abs() < 1e-12);
        assert!((w(garden) - IdfScheme::Smooth.idf(2, 2)).abs() < 1e-12);
        assert!((row.sq_norm - (w(pool).powi(2) + w(garden).powi(2))).abs() < 1e-12);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let docs = vec![CatalogEntry::named("1", "loft"), CatalogEntry::named("1", "villa")];
        let g = build(docs, &IndexConfig::default());
        assert_eq!(g.len(), 1);
        assert!(g.vocabulary().get("villa").is_none());
    }

    #[test]
    fn vectorize_drops_unknown_terms() {
        let g = build(corpus(), &IndexConfig::default());
        let q = g.vectorize("seaside xyzzy");
        assert_eq!(q.tokens, vec!["seaside", "xyzzy"]);
        assert_eq!(q.dropped, vec!["xyzzy"]);
        assert_eq!(q.weights.len(), 1);
        assert!(g.vectorize("xyzzy plugh").is_empty());
    }

    #[test]
    fn term_weights_rank_rare_terms_first() {
        let g = build(corpus(), &IndexConfig::default());
        let terms = g.term_weights(0);
        assert_eq!(terms.len(), 5);
        // "seaside" occurs in two listings, every other term in one
        assert_eq!(terms.last().map(|(t, _)| *t), Some("seaside"));
        assert!(g.term_weights(99).is_empty());
    }

    #[test]
    fn empty_corpus_builds() {
        let g = IndexGeneration::empty(&IndexConfig::default());
        assert!(g.is_empty());
        assert!(g.vocabulary().is_empty());
        assert!(g.vectorize("seaside").is_empty());
    }
}
