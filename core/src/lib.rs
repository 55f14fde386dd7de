pub mod catalog;
pub mod error;
pub mod handle;
pub mod index;
pub mod lemma;
pub mod persist;
pub mod rank;
pub mod similarity;
pub mod source;
pub mod tokenizer;

pub type TermId = u32;
pub type RowId = u32;

pub use catalog::{CatalogEntry, CatalogIndex};
pub use error::{Error, Result};
pub use handle::SearchIndex;
pub use index::{build, GenerationInfo, IdfScheme, IndexConfig, IndexGeneration, QueryVector};
pub use rank::{rank, SearchResults, SimilarityResult};
pub use similarity::{Measure, MeasureScores};
pub use source::{CorpusSource, JsonCorpus};
pub use tokenizer::{Morphology, Normalizer, NormalizerConfig};
