use crate::catalog::{id_from_string_or_number, CatalogEntry};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supplies the full listing corpus on demand.
pub trait CorpusSource: Send + Sync {
    fn load(&self) -> Result<Vec<CatalogEntry>>;

    fn describe(&self) -> String {
        "corpus".to_string()
    }
}

impl CorpusSource for Vec<CatalogEntry> {
    fn load(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory corpus ({} listings)", self.len())
    }
}

/// One listing record in JSON/JSONL input. `text` overrides `name` as the
/// indexed text when present.
#[derive(Debug, Deserialize)]
struct ListingRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl From<ListingRecord> for CatalogEntry {
    fn from(r: ListingRecord) -> Self {
        let raw_text = r.text.or_else(|| r.name.clone());
        CatalogEntry { id: r.id, display_name: r.name.unwrap_or_default(), raw_text }
    }
}

/// Listings read from a `.json`/`.jsonl` file or a directory of them.
#[derive(Debug, Clone)]
pub struct JsonCorpus {
    path: PathBuf,
}

impl JsonCorpus {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = Vec::new();
        if self.path.is_dir() {
            for entry in WalkDir::new(&self.path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                    files.push(p.to_path_buf());
                }
            }
        } else if self.path.is_file() {
            files.push(self.path.clone());
        } else {
            return Err(anyhow!("corpus path not found: {}", self.path.display()));
        }
        Ok(files)
    }
}

impl CorpusSource for JsonCorpus {
    fn load(&self) -> Result<Vec<CatalogEntry>> {
        let mut entries = Vec::new();
        for file in self.files()? {
            if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                read_jsonl(&file, &mut entries)?;
            } else {
                read_json(&file, &mut entries)?;
            }
        }
        tracing::info!(path = %self.path.display(), listings = entries.len(), "loaded corpus");
        Ok(entries)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn read_jsonl(file: &Path, out: &mut Vec<CatalogEntry>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", file.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ListingRecord>(&line) {
            Ok(record) => out.push(record.into()),
            Err(err) => tracing::warn!(file = %file.display(), line = lineno + 1, %err, "skipping malformed listing"),
        }
    }
    Ok(())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn read_json(file: &Path, out: &mut Vec<CatalogEntry>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: serde_json::Value =
        serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parsing {}", file.display()))?;
    let values = match json {
        serde_json::Value::Array(arr) => arr,
        obj @ serde_json::Value::Object(_) => vec![obj],
        other => {
            tracing::warn!(file = %file.display(), kind = json_kind(&other), "skipping json file without listing records");
            return Ok(());
        }
    };
    for v in values {
        match serde_json::from_value::<ListingRecord>(v) {
            Ok(record) => out.push(record.into()),
            Err(err) => tracing::warn!(file = %file.display(), %err, "skipping malformed listing"),
        }
    }
    Ok(())
}
