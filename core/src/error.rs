use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown similarity measure: {0} (expected cosine, jaccard or dice)")]
    UnknownMeasure(String),

    #[error("top_k must be a positive integer")]
    InvalidTopK,

    #[error("corpus source failed: {0:#}")]
    Source(anyhow::Error),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by bad caller input rather than index state.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::UnknownMeasure(_) | Error::InvalidTopK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_caller_errors() {
        assert!(Error::UnknownMeasure("bm25".into()).is_invalid_argument());
        assert!(Error::InvalidTopK.is_invalid_argument());
        assert!(!Error::Source(anyhow::anyhow!("gone")).is_invalid_argument());
    }

    #[test]
    fn source_error_keeps_context() {
        let err = Error::Source(anyhow::anyhow!("disk").context("reading listings.jsonl"));
        assert_eq!(err.to_string(), "corpus source failed: reading listings.jsonl: disk");
    }
}
