use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use redb::{
    CommitError, Database, DatabaseError, ReadableTable, StorageError, TableDefinition,
    TableError, TransactionError,
};
use serde::{Deserialize, Serialize};

const TRACKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tracks");
const PATHS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("track_paths");

pub const RATING_MIN: i32 = -10;
pub const RATING_MAX: i32 = 10;

/// A catalog entry. `file_path` is the natural key; `id` is derived from it
/// once at insertion and stays stable for the lifetime of the record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub file_path: String,
    pub duration_secs: Option<u64>,
    pub rating: i32,
    pub play_count: u64,
    pub last_played: Option<u64>,
    pub created_at: u64,
}

#[derive(Clone, Debug)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub file_path: String,
    pub duration_secs: Option<u64>,
}

pub fn stable_id(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

#[derive(Clone)]
pub struct CatalogStore {
    db: Arc<Database>,
}

impl CatalogStore {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let db = open_or_create_db(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    pub fn init_tables(&self) -> Result<(), CatalogError> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(TRACKS_TABLE)?;
            let _ = write_txn.open_table(PATHS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Inserts a new track keyed by its file path. If the path is already
    /// catalogued the stored record is returned unchanged, preserving its
    /// rating, play statistics and `created_at`.
    pub fn insert(&self, new: NewTrack) -> Result<Track, CatalogError> {
        let id = stable_id(&new.file_path);
        let write_txn = self.db.begin_write()?;
        let track = {
            let mut tracks = write_txn.open_table(TRACKS_TABLE)?;
            let mut paths = write_txn.open_table(PATHS_TABLE)?;

            if let Some(value) = tracks.get(id.as_str())? {
                let existing: Track = decode_value(value.value())?;
                return Ok(existing);
            }

            let track = Track {
                id: id.clone(),
                title: new.title,
                artist: new.artist,
                file_path: new.file_path,
                duration_secs: new.duration_secs,
                rating: 0,
                play_count: 0,
                last_played: None,
                created_at: now_secs(),
            };
            let bytes = encode_value(&track)?;
            tracks.insert(id.as_str(), bytes.as_slice())?;
            paths.insert(track.file_path.as_str(), id.as_bytes())?;
            track
        };
        write_txn.commit()?;
        Ok(track)
    }

    pub fn get(&self, track_id: &str) -> Result<Option<Track>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TRACKS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let track = match table.get(track_id)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(track)
    }

    pub fn list(&self) -> Result<Vec<Track>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TRACKS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut items = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let track: Track = decode_value(entry.1.value())?;
            items.push(track);
        }
        Ok(items)
    }

    pub fn count(&self) -> Result<u64, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TRACKS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        Ok(table.len()?)
    }

    pub fn contains_path(&self, file_path: &str) -> Result<bool, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(PATHS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        let found = table.get(file_path)?.is_some();
        Ok(found)
    }

    pub fn remove_by_path(&self, file_path: &str) -> Result<bool, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut tracks = write_txn.open_table(TRACKS_TABLE)?;
            let mut paths = write_txn.open_table(PATHS_TABLE)?;
            let removed = match paths.remove(file_path)? {
                Some(value) => {
                    let id = String::from_utf8_lossy(value.value()).to_string();
                    tracks.remove(id.as_str())?.is_some()
                }
                None => false,
            };
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Moves the rating by `delta`, clamped to `[RATING_MIN, RATING_MAX]`.
    /// A push past a bound leaves the rating at the bound.
    pub fn adjust_rating(&self, track_id: &str, delta: i32) -> Result<Option<Track>, CatalogError> {
        self.update(track_id, |track| {
            track.rating = (track.rating + delta).clamp(RATING_MIN, RATING_MAX);
        })
    }

    /// Records one play: bumps `play_count` and stamps `last_played`. The
    /// read-modify-write happens inside a single write transaction so
    /// concurrent selections never lose an increment.
    pub fn record_play(&self, track_id: &str, played_at: u64) -> Result<Option<Track>, CatalogError> {
        self.update(track_id, |track| {
            track.play_count += 1;
            track.last_played = Some(played_at);
        })
    }

    fn update<F>(&self, track_id: &str, mutate: F) -> Result<Option<Track>, CatalogError>
    where
        F: FnOnce(&mut Track),
    {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut tracks = match write_txn.open_table(TRACKS_TABLE) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(err) => return Err(err.into()),
            };
            let mut track: Track = match tracks.get(track_id)? {
                Some(value) => decode_value(value.value())?,
                None => return Ok(None),
            };
            mutate(&mut track);
            let bytes = encode_value(&track)?;
            tracks.insert(track_id, bytes.as_slice())?;
            track
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, CatalogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, CatalogError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, CatalogError> {
    Ok(bincode::deserialize(bytes)?)
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Redb(redb::Error),
    Database(DatabaseError),
    Table(TableError),
    Transaction(TransactionError),
    Storage(StorageError),
    Commit(CommitError),
    Bincode(Box<bincode::ErrorKind>),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "io error: {}", err),
            CatalogError::Redb(err) => write!(f, "redb error: {}", err),
            CatalogError::Database(err) => write!(f, "redb database error: {}", err),
            CatalogError::Table(err) => write!(f, "redb table error: {}", err),
            CatalogError::Transaction(err) => write!(f, "redb transaction error: {}", err),
            CatalogError::Storage(err) => write!(f, "redb storage error: {}", err),
            CatalogError::Commit(err) => write!(f, "redb commit error: {}", err),
            CatalogError::Bincode(err) => write!(f, "bincode error: {}", err),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Redb(err) => Some(err),
            CatalogError::Database(err) => Some(err),
            CatalogError::Table(err) => Some(err),
            CatalogError::Transaction(err) => Some(err),
            CatalogError::Storage(err) => Some(err),
            CatalogError::Commit(err) => Some(err),
            CatalogError::Bincode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<redb::Error> for CatalogError {
    fn from(err: redb::Error) -> Self {
        CatalogError::Redb(err)
    }
}

impl From<DatabaseError> for CatalogError {
    fn from(err: DatabaseError) -> Self {
        CatalogError::Database(err)
    }
}

impl From<TableError> for CatalogError {
    fn from(err: TableError) -> Self {
        CatalogError::Table(err)
    }
}

impl From<TransactionError> for CatalogError {
    fn from(err: TransactionError) -> Self {
        CatalogError::Transaction(err)
    }
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        CatalogError::Storage(err)
    }
}

impl From<CommitError> for CatalogError {
    fn from(err: CommitError) -> Self {
        CatalogError::Commit(err)
    }
}

impl From<Box<bincode::ErrorKind>> for CatalogError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        CatalogError::Bincode(err)
    }
}
