use crate::lemma;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","couldn",
            "d","did","didn","do","does","doesn","doing","don","down","during",
            "each","few","for","from","further",
            "had","hadn","has","hasn","have","haven","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","it","its","itself",
            "just","ll","m","ma","me","mightn","more","most","mustn","my","myself",
            "needn","no","nor","not","now","o","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","s","same","shan","she","should","shouldn","so","some","such",
            "t","than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","we","were","weren","what","when","where","which","while","who","whom","why","will","with","won","wouldn",
            "y","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref DEFAULT: Normalizer = Normalizer::default();
}

/// How surviving tokens are reduced to index terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Morphology {
    /// Part-of-speech aware dictionary form (houses -> house, swimming -> swim).
    #[default]
    Lemma,
    /// Snowball English stem.
    Stem,
}

impl FromStr for Morphology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lemma" => Ok(Morphology::Lemma),
            "stem" => Ok(Morphology::Stem),
            other => Err(format!("unknown morphology: {other} (expected lemma or stem)")),
        }
    }
}

impl fmt::Display for Morphology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Morphology::Lemma => "lemma",
            Morphology::Stem => "stem",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Domain noise words removed on top of the English stopword list.
    pub extra_stopwords: Vec<String>,
    pub morphology: Morphology,
    /// Strip diacritics so "città" and "citta" map to the same term.
    pub fold_accents: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { extra_stopwords: Vec::new(), morphology: Morphology::Lemma, fold_accents: true }
    }
}

/// The one text pipeline shared by corpus documents and queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "NormalizerConfig", into = "NormalizerConfig")]
pub struct Normalizer {
    config: NormalizerConfig,
    extra: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl From<NormalizerConfig> for Normalizer {
    fn from(config: NormalizerConfig) -> Self {
        Self::new(config)
    }
}

impl From<Normalizer> for NormalizerConfig {
    fn from(normalizer: Normalizer) -> Self {
        normalizer.config
    }
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let extra = config.extra_stopwords.iter().map(|w| w.trim().to_lowercase()).filter(|w| !w.is_empty()).collect();
        Self { config, extra }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    fn is_stopword(&self, token: &str) -> bool {
        STOPWORDS.contains(token) || self.extra.contains(token)
    }

    /// Lowercase, tokenize, drop stopwords and reduce each token to its index term.
    /// Absent or empty text yields no tokens.
    pub fn normalize<'a>(&self, text: impl Into<Option<&'a str>>) -> Vec<String> {
        let text = match text.into() {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Vec::new(),
        };
        let composed = text.nfkc().collect::<String>();
        let folded = if self.config.fold_accents {
            composed.nfd().filter(|c| !is_combining_mark(*c)).collect::<String>()
        } else {
            composed
        };
        let lowered = folded.to_lowercase();
        let mut tokens = Vec::new();
        for mat in RE.find_iter(&lowered) {
            let token = mat.as_str();
            if self.is_stopword(token) {
                continue;
            }
            let term = match self.config.morphology {
                Morphology::Lemma => lemma::lemmatize(token),
                Morphology::Stem => STEMMER.stem(token).to_string(),
            };
            if !term.is_empty() {
                tokens.push(term);
            }
        }
        tokens
    }
}

/// Normalize with the default configuration.
pub fn normalize(text: &str) -> Vec<String> {
    DEFAULT.normalize(text)
}
