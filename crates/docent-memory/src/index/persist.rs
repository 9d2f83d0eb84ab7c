use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::flat::FlatIndex;
use crate::document::Chunk;
use crate::error::MemoryError;

pub const INDEX_FILE: &str = "index.json";
pub const CHUNKS_FILE: &str = "chunks.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    dimension: usize,
    vectors: Vec<f32>,
}

fn staging_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.tmp"))
}

/// Both files are staged as `.tmp` siblings and only renamed into place once both are
/// written, so a failed write leaves the previous pair intact. `index.json` is renamed
/// last because its presence marks a stored index.
pub(crate) async fn write(dir: &Path, flat: &FlatIndex, chunks: &[Chunk]) -> Result<(), MemoryError> {
    tokio::fs::create_dir_all(dir).await?;

    let index = PersistedIndex {
        version: FORMAT_VERSION,
        dimension: flat.dimension(),
        vectors: flat.data().to_vec(),
    };
    let index_tmp = staging_path(dir, INDEX_FILE);
    let chunks_tmp = staging_path(dir, CHUNKS_FILE);

    let staged = async {
        tokio::fs::write(&index_tmp, serde_json::to_vec(&index)?).await?;
        tokio::fs::write(&chunks_tmp, serde_json::to_vec(chunks)?).await?;
        Ok::<_, MemoryError>(())
    }
    .await;
    if let Err(e) = staged {
        for tmp in [&index_tmp, &chunks_tmp] {
            let _ = tokio::fs::remove_file(tmp).await;
        }
        return Err(e);
    }

    tokio::fs::rename(&chunks_tmp, dir.join(CHUNKS_FILE)).await?;
    tokio::fs::rename(&index_tmp, dir.join(INDEX_FILE)).await?;
    Ok(())
}

/// `Ok(None)` when no index file exists under `dir`.
pub(crate) async fn read(dir: &Path) -> Result<Option<(FlatIndex, Vec<Chunk>)>, MemoryError> {
    let index_bytes = match tokio::fs::read(dir.join(INDEX_FILE)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let chunks_bytes = match tokio::fs::read(dir.join(CHUNKS_FILE)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MemoryError::CorruptIndex(format!(
                "{INDEX_FILE} present without {CHUNKS_FILE}"
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let index: PersistedIndex = serde_json::from_slice(&index_bytes)
        .map_err(|e| MemoryError::CorruptIndex(format!("{INDEX_FILE}: {e}")))?;
    if index.version != FORMAT_VERSION {
        return Err(MemoryError::CorruptIndex(format!(
            "unsupported format version {}",
            index.version
        )));
    }
    let chunks: Vec<Chunk> = serde_json::from_slice(&chunks_bytes)
        .map_err(|e| MemoryError::CorruptIndex(format!("{CHUNKS_FILE}: {e}")))?;

    let flat = FlatIndex::from_raw(index.dimension, index.vectors)?;
    if flat.len() != chunks.len() {
        return Err(MemoryError::CorruptIndex(format!(
            "{} vectors but {} chunks",
            flat.len(),
            chunks.len()
        )));
    }

    Ok(Some((flat, chunks)))
}

/// Delete both files; missing files are not an error.
pub(crate) async fn remove(dir: &Path) -> Result<(), MemoryError> {
    for name in [INDEX_FILE, CHUNKS_FILE] {
        match tokio::fs::remove_file(dir.join(name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
