use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::classfile::{ParsedClassHeader, parse_class_header};
use crate::error::ScanError;

pub const CLASS_SUFFIX: &str = ".class";

/// Order in which class entries of one archive are visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryOrder {
    /// Central-directory order, as written by whatever produced the archive.
    Native,
    /// Sorted by entry name, so repeated scans fold classes identically.
    #[default]
    Canonical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveStatus {
    #[default]
    Missing,
    Failed,
    Scanned,
}

/// Everything one archive contributed: decoded headers plus the diagnostics
/// for entries (or the whole archive) that could not be read.
#[derive(Debug, Default)]
pub struct ArchiveScan {
    pub path: PathBuf,
    pub status: ArchiveStatus,
    pub class_entries: usize,
    pub headers: Vec<ParsedClassHeader>,
    pub diagnostics: Vec<ScanError>,
}

impl ArchiveScan {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    fn record(&mut self, err: ScanError) {
        warn!("{err}");
        self.diagnostics.push(err);
    }
}

/// Scans one archive. A missing archive is a silent skip; an archive that
/// cannot be opened yields a single archive-scoped diagnostic; a bad entry
/// is recorded and the remaining entries are still visited.
pub fn scan_archive(path: &Path, order: EntryOrder) -> ArchiveScan {
    let mut scan = ArchiveScan::new(path);
    if !path.exists() {
        debug!("skipping missing archive {}", path.display());
        return scan;
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(source) => {
            scan.status = ArchiveStatus::Failed;
            scan.record(ScanError::Open {
                path: path.to_path_buf(),
                source,
            });
            return scan;
        }
    };
    // SAFETY: The file is opened read-only and outlives the mapping, which is
    // dropped at the end of this function.
    let mmap = match unsafe { Mmap::map(&file) } {
        Ok(mmap) => mmap,
        Err(source) => {
            scan.status = ArchiveStatus::Failed;
            scan.record(ScanError::Open {
                path: path.to_path_buf(),
                source,
            });
            return scan;
        }
    };
    let mut archive = match ZipArchive::new(Cursor::new(&mmap[..])) {
        Ok(archive) => archive,
        Err(source) => {
            scan.status = ArchiveStatus::Failed;
            scan.record(ScanError::Archive {
                path: path.to_path_buf(),
                source,
            });
            return scan;
        }
    };
    scan.status = ArchiveStatus::Scanned;

    // Raw access reads only the headers, so entries with an unsupported
    // compression method or encryption are filtered by name before any
    // decoder is built.
    let mut entries = Vec::new();
    for idx in 0..archive.len() {
        match archive.by_index_raw(idx) {
            Ok(entry) => {
                if entry.is_file() && entry.name().ends_with(CLASS_SUFFIX) {
                    entries.push((idx, entry.name().to_string()));
                }
            }
            // The local header is unreadable, so the name is not known.
            Err(source) => scan.record(ScanError::EntryRead {
                path: path.to_path_buf(),
                entry: format!("#{idx}"),
                source: io::Error::from(source),
            }),
        }
    }
    if order == EntryOrder::Canonical {
        entries.sort_by(|a, b| a.1.cmp(&b.1));
    }
    scan.class_entries = entries.len();

    let mut buffer = Vec::new();
    for (idx, name) in entries {
        buffer.clear();
        let read = archive
            .by_index(idx)
            .map_err(io::Error::from)
            .and_then(|mut entry| entry.read_to_end(&mut buffer));
        if let Err(source) = read {
            scan.record(ScanError::EntryRead {
                path: path.to_path_buf(),
                entry: name,
                source,
            });
            continue;
        }

        match parse_class_header(&buffer) {
            Ok(header) => scan.headers.push(header),
            Err(source) => scan.record(ScanError::Decode {
                path: path.to_path_buf(),
                entry: name,
                source,
            }),
        }
    }

    debug!(
        "scanned {}: {} class entries, {} decoded",
        path.display(),
        scan.class_entries,
        scan.headers.len()
    );
    scan
}
