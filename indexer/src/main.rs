use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use staysearch_core::persist::{load_generation, save_generation, IndexPaths};
use staysearch_core::{build, CorpusSource, IdfScheme, IndexConfig, IndexGeneration, JsonCorpus, Measure, Morphology, Normalizer, SearchResults};
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect TF-IDF listing indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index snapshot from JSON/JSONL listings (file or directory)
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// JSON file with an index configuration; flags below override it
        #[arg(long)]
        config: Option<String>,
        /// IDF formula: smooth = ln((1+N)/(1+df)) + 1, log = ln(1 + N/df)
        #[arg(long)]
        idf: Option<IdfScheme>,
        /// Term reduction: lemma or stem
        #[arg(long)]
        morphology: Option<Morphology>,
        /// Extra stopwords, comma separated
        #[arg(long, value_delimiter = ',')]
        stopwords: Vec<String>,
    },
    /// Print the TF-IDF term weights of the first listings in a snapshot
    Inspect {
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Run a ranked search against a snapshot
    Query {
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long)]
        q: String,
        /// cosine, jaccard or dice
        #[arg(long, default_value = "cosine")]
        measure: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Show how a piece of text is normalized
    Normalize {
        text: String,
        #[arg(long)]
        morphology: Option<Morphology>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, config, idf, morphology, stopwords } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(idf) = idf {
                config.idf = idf;
            }
            if let Some(m) = morphology {
                config.normalizer.morphology = m;
            }
            config.normalizer.extra_stopwords.extend(stopwords);
            build_index(&input, &output, &config)
        }
        Commands::Inspect { index, limit } => inspect(&index, limit),
        Commands::Query { index, q, measure, k } => query(&index, &q, &measure, k),
        Commands::Normalize { text, morphology } => {
            let mut config = staysearch_core::NormalizerConfig::default();
            if let Some(m) = morphology {
                config.morphology = m;
            }
            println!("{:?}", Normalizer::new(config).normalize(text.as_str()));
            Ok(())
        }
    }
}

fn load_config(path: Option<&str>) -> Result<IndexConfig> {
    match path {
        Some(p) => {
            let raw = fs::read_to_string(p).with_context(|| format!("reading config {p}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {p}"))
        }
        None => Ok(IndexConfig::default()),
    }
}

fn build_index(input: &str, output: &str, config: &IndexConfig) -> Result<()> {
    let source = JsonCorpus::new(Path::new(input));
    let corpus = source.load()?;
    let generation = build(corpus, config);
    let info = generation.info();
    save_generation(&IndexPaths::new(output), &generation)?;
    tracing::info!(output, num_docs = info.num_docs, vocabulary_size = info.vocabulary_size, skipped = info.skipped, "index build complete");
    Ok(())
}

fn inspect(index: &str, limit: usize) -> Result<()> {
    let generation = load_generation(&IndexPaths::new(index))?;
    let catalog = generation.catalog();
    for (row, id, name) in catalog.iter().take(limit) {
        println!("\nListing ID: {id}");
        println!("Name: {name}");
        println!("Term weights:");
        for (term, weight) in generation.term_weights(row) {
            println!("  {term}: {weight:.4}");
        }
    }
    Ok(())
}

fn query(index: &str, q: &str, measure: &str, k: usize) -> Result<()> {
    let generation = load_generation(&IndexPaths::new(index))?;
    let results = ranked(&generation, q, measure, k)?;
    let measure = results.measure;
    println!("Query terms: {:?}", results.query_terms);
    println!("{} matching listings ({measure})", results.total_matches);
    for (i, hit) in results.results.iter().enumerate() {
        println!(
            "{:>3}. [{}] {}  score={:.4}  cosine={:.4} jaccard={:.4} dice={:.4}",
            i + 1,
            hit.id,
            hit.display_name,
            hit.score,
            hit.scores.cosine,
            hit.scores.jaccard,
            hit.scores.dice
        );
    }
    Ok(())
}

fn ranked(generation: &IndexGeneration, q: &str, measure: &str, k: usize) -> Result<SearchResults> {
    let measure: Measure = measure.parse()?;
    Ok(staysearch_core::rank(generation, q, measure, k)?)
}
