use std::fs::File;
use std::path::Path;

use tracing::info;

use ctcae_reference::catalog::ReferenceCatalog;
use ctcae_reference::error::ExtractionError;
use ctcae_reference::extract::{TermBlock, extract};
use ctcae_reference::table::ReferenceTable;
use ctcae_reference::wide::extract_wide;
use ctcae_search::build::{BuildReport, IndexTarget, Indexer};
use ctcae_search::flush::save_snapshot;
use ctcae_search::index::InMemoryIndex;

use crate::error::ReindexError;

/// Layout of the reference CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// One row per (term, grade) pair, with section header rows.
    Long,
    /// One row per term with `Grade 1` … `Grade 5` columns.
    Wide,
}

/// Extract term blocks from a reference CSV on disk.
pub fn load_blocks(path: &Path, format: SourceFormat) -> Result<Vec<TermBlock>, ReindexError> {
    let blocks = match format {
        SourceFormat::Long => extract(&ReferenceTable::from_csv_path(path)?)?,
        SourceFormat::Wide => {
            let file = File::open(path).map_err(ExtractionError::from)?;
            extract_wide(file)?
        }
    };
    Ok(blocks)
}

/// Full rebuild from a reference CSV.
///
/// Extraction runs to completion before the indexer is called, so malformed
/// reference data never touches the published collections.
pub async fn reindex_from_csv(
    path: &Path,
    format: SourceFormat,
    indexer: &Indexer,
    target: &IndexTarget,
) -> Result<BuildReport, ReindexError> {
    info!(path = %path.display(), ?format, "reindex started");
    let blocks = load_blocks(path, format)?;
    let report = indexer.build_index(&blocks, target).await?;
    info!(generation = %report.generation, "reindex complete");
    Ok(report)
}

/// Rebuild, then persist the index snapshot and the processed catalog.
pub async fn reindex_and_persist(
    path: &Path,
    format: SourceFormat,
    indexer: &Indexer,
    index: &InMemoryIndex,
    target: &IndexTarget,
    snapshot_path: &Path,
    catalog: Option<(&str, &Path)>,
) -> Result<BuildReport, ReindexError> {
    let blocks = load_blocks(path, format)?;
    let report = indexer.build_index(&blocks, target).await?;
    save_snapshot(index, snapshot_path)?;

    if let Some((version, catalog_path)) = catalog {
        ReferenceCatalog::from_blocks(version, blocks).save(catalog_path)?;
    }
    Ok(report)
}
