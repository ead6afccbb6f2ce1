use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SearchError;
use crate::index::{Collection, InMemoryIndex};

/// Bump when the snapshot layout changes shape.
const SNAPSHOT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    snapshot_version: u32,
    collections: Vec<&'a Collection>,
}

#[derive(Deserialize)]
struct Snapshot {
    snapshot_version: u32,
    collections: Vec<Collection>,
}

/// Write every published collection to a zstd-compressed JSON snapshot.
///
/// The snapshot is written to a sibling temp file and renamed into place, so
/// a reader never sees a half-written file.
pub fn save_snapshot(index: &InMemoryIndex, path: &Path) -> Result<(), SearchError> {
    let collections = index.collections()?;
    info!(path = %path.display(), collections = collections.len(), "writing index snapshot");

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let file = BufWriter::new(File::create(&tmp_path)?);
        let mut encoder = zstd::Encoder::new(file, ZSTD_LEVEL)?;
        let snapshot = SnapshotRef {
            snapshot_version: SNAPSHOT_VERSION,
            collections: collections.iter().map(|c| c.as_ref()).collect(),
        };
        serde_json::to_writer(&mut encoder, &snapshot)?;
        encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
    }
    std::fs::rename(&tmp_path, path)?;

    info!(path = %path.display(), "index snapshot written");
    Ok(())
}

/// Load a snapshot into a fresh [`InMemoryIndex`].
///
/// Every collection is re-validated (dimensions, duplicate ids) on the way in.
pub fn load_snapshot(path: &Path) -> Result<InMemoryIndex, SearchError> {
    let file = BufReader::new(File::open(path)?);
    let decoder = zstd::Decoder::new(file)?;
    let snapshot: Snapshot = serde_json::from_reader(decoder)?;

    if snapshot.snapshot_version != SNAPSHOT_VERSION {
        return Err(SearchError::SnapshotCorrupted(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            snapshot.snapshot_version
        )));
    }

    let mut collections = Vec::with_capacity(snapshot.collections.len());
    for stored in snapshot.collections {
        let name = stored.info.name.clone();
        let meta = crate::index::CollectionMeta {
            generation: stored.info.generation,
            embedding_model: stored.info.embedding_model,
            built_at: stored.info.built_at,
        };
        let collection = Collection::new(&name, stored.records, meta)?;
        info!(
            collection = %name,
            generation = %collection.info.generation,
            count = collection.info.len,
            "collection restored from snapshot"
        );
        collections.push(collection);
    }

    Ok(InMemoryIndex::from_collections(collections))
}
