use staysearch_core::tokenizer::{normalize, Morphology, Normalizer, NormalizerConfig};

#[test]
fn it_normalizes_and_lemmatizes() {
    let words = normalize("Beautiful Houses with Gardens");
    assert_eq!(words, vec!["beautiful", "house", "garden"]);
    let words = normalize("Modern Apartments near Beach!");
    assert_eq!(words, vec!["modern", "apartment", "near", "beach"]);
}

#[test]
fn it_filters_stopwords() {
    let words = normalize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn it_splits_contractions_and_hyphens() {
    let words = normalize("It's a sea-view flat, don't miss it");
    assert_eq!(words, vec!["sea", "view", "flat", "miss"]);
}

#[test]
fn it_folds_accents_by_default() {
    assert_eq!(normalize("Città Vecchia"), vec!["citta", "vecchia"]);
    let keep = Normalizer::new(NormalizerConfig { fold_accents: false, ..Default::default() });
    assert_eq!(keep.normalize("Città"), vec!["città"]);
}

#[test]
fn it_stems_when_configured() {
    let stem = Normalizer::new(NormalizerConfig { morphology: Morphology::Stem, ..Default::default() });
    let words = stem.normalize("Running Runners RUN");
    assert_eq!(words, vec!["run", "runner", "run"]);
}

#[test]
fn same_normalizer_for_query_and_document() {
    let n = Normalizer::default();
    assert_eq!(n.normalize("SWIMMING pools"), n.normalize("swimming Pools"));
}
