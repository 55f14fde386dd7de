use crate::error::{Error, Result};
use crate::index::{build, GenerationInfo, IndexConfig, IndexGeneration};
use crate::rank::{rank, SearchResults};
use crate::similarity::Measure;
use crate::source::CorpusSource;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The active index generation behind an atomically swapped handle.
///
/// Searches take a snapshot of the current generation and run against it
/// without holding the lock; a rebuild constructs the next generation out of
/// place and only takes the write lock to swap the pointer.
pub struct SearchIndex {
    active: RwLock<Arc<IndexGeneration>>,
    config: IndexConfig,
    next_generation: AtomicU64,
    rebuild_lock: Mutex<()>,
}

impl SearchIndex {
    pub fn empty(config: IndexConfig) -> Self {
        let generation = IndexGeneration::empty(&config).with_number(0);
        Self::from_generation(generation, config)
    }

    /// Build the first generation from `source`.
    pub fn build(source: &dyn CorpusSource, config: IndexConfig) -> Result<Self> {
        let corpus = source.load().map_err(Error::Source)?;
        let generation = build(corpus, &config).with_number(1);
        Ok(Self::from_generation(generation, config))
    }

    /// Serve a prebuilt generation, e.g. one loaded from a snapshot. Rebuilds
    /// reuse the generation's own configuration.
    pub fn from_snapshot(generation: IndexGeneration) -> Self {
        let config = generation.config();
        Self::from_generation(generation, config)
    }

    fn from_generation(generation: IndexGeneration, config: IndexConfig) -> Self {
        let next = generation.number() + 1;
        Self {
            active: RwLock::new(Arc::new(generation)),
            config,
            next_generation: AtomicU64::new(next),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The current generation; stays valid across later swaps.
    pub fn snapshot(&self) -> Arc<IndexGeneration> {
        self.active.read().clone()
    }

    pub fn info(&self) -> GenerationInfo {
        self.snapshot().info()
    }

    pub fn search(&self, query: &str, measure: Measure, top_k: usize) -> Result<SearchResults> {
        rank(&self.snapshot(), query, measure, top_k)
    }

    /// Like [`search`](Self::search), validating the measure name before any scoring.
    pub fn search_named(&self, query: &str, measure: &str, top_k: usize) -> Result<SearchResults> {
        let measure: Measure = measure.parse()?;
        self.search(query, measure, top_k)
    }

    /// Re-pull the corpus and swap in a fresh generation. On failure the
    /// current generation keeps serving.
    pub fn rebuild(&self, source: &dyn CorpusSource) -> Result<GenerationInfo> {
        let _guard = self.rebuild_lock.lock();
        let corpus = match source.load() {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(source = %source.describe(), error = %format!("{err:#}"), "rebuild failed, keeping current generation");
                return Err(Error::Source(err));
            }
        };
        let generation = build(corpus, &self.config);
        Ok(self.replace(generation))
    }

    /// Swap in a prebuilt generation, numbering it after the current one.
    pub fn replace(&self, generation: IndexGeneration) -> GenerationInfo {
        let mut active = self.active.write();
        let number = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let generation = Arc::new(generation.with_number(number));
        let info = generation.info();
        *active = generation;
        drop(active);
        tracing::info!(generation = info.generation, num_docs = info.num_docs, vocabulary_size = info.vocabulary_size, "swapped in new index generation");
        info
    }
}
