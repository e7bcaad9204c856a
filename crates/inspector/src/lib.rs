use std::path::Path;

use lofty::error::LoftyError;
use lofty::prelude::{AudioFile, ItemKey, TaggedFileExt};

/// What the inspector could derive for one audio file. Either field may be
/// missing; callers decide the fallback display values.
#[derive(Debug, Default, Clone)]
pub struct TrackInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration_secs: Option<u64>,
}

#[derive(Debug)]
pub enum InspectorError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for InspectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectorError::Io(err) => write!(f, "io error: {}", err),
            InspectorError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for InspectorError {}

impl From<std::io::Error> for InspectorError {
    fn from(err: std::io::Error) -> Self {
        InspectorError::Io(err)
    }
}

impl From<LoftyError> for InspectorError {
    fn from(err: LoftyError) -> Self {
        InspectorError::Lofty(err)
    }
}

/// Reads tags and audio properties for `path`. Untagged files fall back to
/// the file stem, honouring the common `Artist - Title` naming scheme.
pub fn inspect(path: &Path) -> Result<TrackInfo, InspectorError> {
    let tagged_file = lofty::read_from_path(path)?;
    let properties = tagged_file.properties();

    let mut info = TrackInfo::default();

    let duration_secs = properties.duration().as_secs();
    if duration_secs > 0 {
        info.duration_secs = Some(duration_secs);
    }

    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        info.title = tag
            .get_string(&ItemKey::TrackTitle)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        info.artist = tag
            .get_string(&ItemKey::TrackArtist)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }

    if info.title.is_none() || info.artist.is_none() {
        let (stem_artist, stem_title) = split_stem(&file_stem(path));
        if info.title.is_none() {
            info.title = stem_title;
        }
        if info.artist.is_none() {
            info.artist = stem_artist;
        }
    }

    Ok(info)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Splits a file stem into `(artist, title)`. A single `-` separates artist
/// from title; stems without one are all title.
fn split_stem(stem: &str) -> (Option<String>, Option<String>) {
    let trimmed = stem.trim();
    if trimmed.is_empty() {
        return (None, None);
    }
    match trimmed.split_once('-') {
        Some((artist, title)) => {
            let artist = artist.trim();
            let title = title.trim();
            if artist.is_empty() || title.is_empty() {
                return (None, Some(trimmed.to_string()));
            }
            (Some(artist.to_string()), Some(title.to_string()))
        }
        None => (None, Some(trimmed.to_string())),
    }
}
