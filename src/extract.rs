use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::aggregate::{MappingAggregator, SourceFileMapping};
use crate::archive::{ArchiveScan, ArchiveStatus, EntryOrder, scan_archive};
use crate::error::{ErrorScope, ScanError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractConfig {
    pub order: EntryOrder,
    /// Scan archives on the rayon pool. Results are still folded in input
    /// order, so the outcome matches a sequential run.
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractStats {
    pub archives_requested: usize,
    pub blank_paths: usize,
    pub archives_missing: usize,
    pub archives_scanned: usize,
    pub archives_failed: usize,
    pub classes_parsed: usize,
    pub classes_with_source: usize,
    pub entries_failed: usize,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub mappings: Vec<SourceFileMapping>,
    pub diagnostics: Vec<ScanError>,
    pub stats: ExtractStats,
}

impl Extraction {
    /// Fails with the first diagnostic if any archive or entry was skipped.
    pub fn into_strict(self) -> Result<Vec<SourceFileMapping>, ScanError> {
        match self.diagnostics.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.mappings),
        }
    }
}

/// Builds source-file mappings from a list of archive paths.
///
/// Blank paths are dropped and missing archives skipped silently. Archive
/// and entry failures land in [`Extraction::diagnostics`] and never abort
/// the batch.
pub fn extract_mappings<S: AsRef<str>>(paths: &[S], config: &ExtractConfig) -> Extraction {
    let mut stats = ExtractStats {
        archives_requested: paths.len(),
        ..ExtractStats::default()
    };
    let archives: Vec<&Path> = paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.trim().is_empty())
        .map(Path::new)
        .collect();
    stats.blank_paths = paths.len() - archives.len();

    let mut aggregator = MappingAggregator::new();
    let mut diagnostics = Vec::new();
    let mut fold = |scan: ArchiveScan| {
        match scan.status {
            ArchiveStatus::Missing => stats.archives_missing += 1,
            ArchiveStatus::Failed => stats.archives_failed += 1,
            ArchiveStatus::Scanned => stats.archives_scanned += 1,
        }
        stats.classes_parsed += scan.headers.len();
        for header in &scan.headers {
            if aggregator.add(header) {
                stats.classes_with_source += 1;
            }
        }
        stats.entries_failed += scan
            .diagnostics
            .iter()
            .filter(|d| d.scope() == ErrorScope::Entry)
            .count();
        diagnostics.extend(scan.diagnostics);
    };

    if config.parallel {
        let scans: Vec<ArchiveScan> = archives
            .par_iter()
            .map(|path| scan_archive(path, config.order))
            .collect();
        scans.into_iter().for_each(&mut fold);
    } else {
        for path in archives {
            fold(scan_archive(path, config.order));
        }
    }

    info!(
        "extracted {} source mappings from {} archives ({} diagnostics)",
        aggregator.len(),
        stats.archives_scanned,
        diagnostics.len()
    );
    let mappings = aggregator.finish();
    Extraction {
        mappings,
        diagnostics,
        stats,
    }
}
