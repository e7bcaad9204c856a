use std::collections::HashSet;
use std::path::{Path, PathBuf};

use catalog::{CatalogError, CatalogStore, NewTrack};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "ogg", "wav"];

const UNKNOWN_ARTIST: &str = "Unknown";
const UNKNOWN_TITLE: &str = "Unknown Track";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug)]
pub enum SyncError {
    Io(std::io::Error),
    Catalog(CatalogError),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Io(err) => write!(f, "io error: {}", err),
            SyncError::Catalog(err) => write!(f, "catalog error: {}", err),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err)
    }
}

impl From<CatalogError> for SyncError {
    fn from(err: CatalogError) -> Self {
        SyncError::Catalog(err)
    }
}

/// Reconciles the catalog against the music root: new audio files are
/// inspected and inserted, entries whose file vanished are deleted. Files
/// the inspector cannot read are logged and skipped; they never abort the
/// pass.
pub fn sync_library(catalog: &CatalogStore, root: &Path) -> Result<SyncReport, SyncError> {
    let root = root.canonicalize()?;
    let files = collect_audio_files(&root);
    info!("Found {} audio files under {:?}", files.len(), root);

    let known: HashSet<String> = catalog
        .list()?
        .into_iter()
        .map(|track| track.file_path)
        .collect();

    let mut report = SyncReport::default();
    let mut on_disk: HashSet<String> = HashSet::with_capacity(files.len());

    for file in files {
        let file_path = file.to_string_lossy().to_string();
        on_disk.insert(file_path.clone());
        if known.contains(&file_path) {
            continue;
        }

        let metadata = match inspector::inspect(&file) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("Skipping {:?}: unreadable metadata ({})", file, err);
                continue;
            }
        };

        let title = metadata
            .title
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let artist = metadata
            .artist
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        debug!("Adding {} - {}", artist, title);

        catalog.insert(NewTrack {
            title,
            artist,
            file_path,
            duration_secs: metadata.duration_secs,
        })?;
        report.added += 1;
    }

    for file_path in known {
        if on_disk.contains(&file_path) {
            continue;
        }
        if catalog.remove_by_path(&file_path)? {
            debug!("Removing vanished file {}", file_path);
            report.removed += 1;
        }
    }

    info!(
        "Sync complete: {} added, {} removed",
        report.added, report.removed
    );
    Ok(report)
}

fn collect_audio_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if is_audio_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    files
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
