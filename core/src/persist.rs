use crate::error::{Error, Result};
use crate::index::IndexGeneration;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub vocabulary_size: usize,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn generation(&self) -> PathBuf { self.root.join("generation.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn snapshot_err(e: impl std::fmt::Display) -> Error {
    Error::Snapshot(e.to_string())
}

/// Write a generation as `generation.bin` plus a human-readable `meta.json`.
pub fn save_generation(paths: &IndexPaths, generation: &IndexGeneration) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = BufWriter::new(File::create(paths.generation())?);
    bincode::serialize_into(&mut f, generation).map_err(snapshot_err)?;
    f.flush()?;

    let info = generation.info();
    let meta = MetaFile {
        num_docs: info.num_docs,
        vocabulary_size: info.vocabulary_size,
        created_at: info.built_at,
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta).map_err(snapshot_err)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    serde_json::from_str(&buf).map_err(snapshot_err)
}

/// Load a generation saved by [`save_generation`] and rebuild its lookup tables.
pub fn load_generation(paths: &IndexPaths) -> Result<IndexGeneration> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        return Err(Error::Snapshot(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            meta.version
        )));
    }
    let f = BufReader::new(File::open(paths.generation())?);
    let mut generation: IndexGeneration = bincode::deserialize_from(f).map_err(snapshot_err)?;
    generation.restore();
    if generation.len() != meta.num_docs {
        return Err(Error::Snapshot(format!(
            "meta.json lists {} listings but generation.bin has {}",
            meta.num_docs,
            generation.len()
        )));
    }
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "loaded index snapshot");
    Ok(generation)
}
