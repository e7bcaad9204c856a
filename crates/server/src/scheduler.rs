use std::time::{Duration, SystemTime, UNIX_EPOCH};

use catalog::{CatalogError, CatalogStore, Track};
use parking_lot::Mutex;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

/// Every Nth selection favours tracks that have never been played.
pub const DISCOVERY_INTERVAL: u64 = 8;

/// Smallest weight a track can carry; keeps heavily disliked tracks
/// selectable.
pub const WEIGHT_FLOOR: f64 = 0.1;

/// Picks the next track to play and records the play. The call counter is
/// the only state; it sits behind a mutex so concurrent selections agree on
/// which tick gets the discovery pass.
pub struct Scheduler {
    counter: Mutex<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_counter(0)
    }

    pub fn with_counter(value: u64) -> Self {
        Self {
            counter: Mutex::new(value),
        }
    }

    pub fn select_next(&self, catalog: &CatalogStore) -> Result<Track, SchedulerError> {
        let mut rng = rand::rng();
        self.select_next_with(catalog, &mut rng, now_secs())
    }

    /// Selection with an injected randomness source and clock.
    pub fn select_next_with<R: Rng>(
        &self,
        catalog: &CatalogStore,
        rng: &mut R,
        now: u64,
    ) -> Result<Track, SchedulerError> {
        let tick = {
            let mut counter = self.counter.lock();
            *counter += 1;
            *counter
        };

        let tracks = catalog.list()?;
        if tracks.is_empty() {
            return Err(SchedulerError::EmptyCatalog);
        }

        let chosen_id = choose(&tracks, tick, rng)?.id.clone();
        match catalog.record_play(&chosen_id, now)? {
            Some(track) => Ok(track),
            None => Err(SchedulerError::TrackVanished),
        }
    }
}

/// The pure selection rule: candidate pool for this tick, least-recently
/// played first, the most recent candidate dropped, then one weighted draw.
pub fn choose<'a, R: Rng>(
    tracks: &'a [Track],
    tick: u64,
    rng: &mut R,
) -> Result<&'a Track, SchedulerError> {
    let mut pool = candidate_pool(tracks, tick);
    if pool.len() == 1 {
        return Ok(pool[0]);
    }

    pool.sort_by(|a, b| {
        (a.last_played, a.id.as_str()).cmp(&(b.last_played, b.id.as_str()))
    });
    pool.pop();

    let weights = weights(&pool);
    let dist = WeightedIndex::new(&weights)
        .map_err(|err| SchedulerError::Weighting(err.to_string()))?;
    Ok(pool[dist.sample(rng)])
}

/// On discovery ticks the pool narrows to never-played tracks, when any
/// exist; otherwise it is the whole catalog.
pub fn candidate_pool(tracks: &[Track], tick: u64) -> Vec<&Track> {
    if tick % DISCOVERY_INTERVAL == 0 {
        let unplayed: Vec<&Track> = tracks
            .iter()
            .filter(|track| track.last_played.is_none())
            .collect();
        if !unplayed.is_empty() {
            return unplayed;
        }
    }
    tracks.iter().collect()
}

/// `1 + rating/10`, floored to `WEIGHT_FLOOR` so no track drops to zero
/// probability.
pub fn weights(pool: &[&Track]) -> Vec<f64> {
    pool.iter()
        .map(|track| {
            let weight = 1.0 + f64::from(track.rating) / 10.0;
            if weight <= 0.0 {
                WEIGHT_FLOOR
            } else {
                weight
            }
        })
        .collect()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}

#[derive(Debug)]
pub enum SchedulerError {
    EmptyCatalog,
    TrackVanished,
    Weighting(String),
    Catalog(CatalogError),
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::EmptyCatalog => write!(f, "catalog contains no tracks"),
            SchedulerError::TrackVanished => {
                write!(f, "selected track was removed before the play was recorded")
            }
            SchedulerError::Weighting(err) => write!(f, "weighted draw failed: {}", err),
            SchedulerError::Catalog(err) => write!(f, "catalog error: {}", err),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<CatalogError> for SchedulerError {
    fn from(err: CatalogError) -> Self {
        SchedulerError::Catalog(err)
    }
}

#[cfg(test)]
mod tests {
    use super::{candidate_pool, choose, weights, Scheduler, SchedulerError};
    use catalog::{CatalogStore, NewTrack, Track};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_track(id: &str, rating: i32, last_played: Option<u64>) -> Track {
        Track {
            id: id.to_string(),
            title: id.to_string(),
            artist: "Band".to_string(),
            file_path: format!("/music/{}.mp3", id),
            duration_secs: Some(180),
            rating,
            play_count: u64::from(last_played.is_some()),
            last_played,
            created_at: 0,
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> CatalogStore {
        CatalogStore::open(&dir.path().join("catalog.redb")).unwrap()
    }

    fn insert(store: &CatalogStore, name: &str) -> Track {
        store
            .insert(NewTrack {
                title: name.to_string(),
                artist: "Band".to_string(),
                file_path: format!("/music/{}.mp3", name),
                duration_secs: Some(180),
            })
            .unwrap()
    }

    #[test]
    fn single_candidate_is_deterministic() {
        let tracks = vec![make_track("a", 0, None)];
        let mut rng = StdRng::seed_from_u64(1);
        let chosen = choose(&tracks, 1, &mut rng).unwrap();
        assert_eq!(chosen.id, "a");
    }

    #[test]
    fn most_recent_candidate_is_never_drawn() {
        let tracks = vec![
            make_track("a", 0, Some(10)),
            make_track("b", 10, Some(20)),
        ];
        let mut rng = StdRng::seed_from_u64(2);
        for tick in 1..200 {
            let chosen = choose(&tracks, tick, &mut rng).unwrap();
            assert_eq!(chosen.id, "a");
        }
    }

    #[test]
    fn discovery_tick_narrows_to_unplayed() {
        let tracks = vec![
            make_track("a", 0, Some(10)),
            make_track("b", 0, Some(20)),
            make_track("c", -10, None),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let chosen = choose(&tracks, 8, &mut rng).unwrap();
        assert_eq!(chosen.id, "c");
    }

    #[test]
    fn discovery_tick_falls_back_to_whole_catalog() {
        let tracks = vec![
            make_track("a", 0, Some(10)),
            make_track("b", 0, Some(20)),
            make_track("c", 0, Some(30)),
        ];
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let chosen = choose(&tracks, 8, &mut rng).unwrap();
            assert_ne!(chosen.id, "c");
        }
    }

    #[test]
    fn regular_tick_keeps_played_tracks_eligible() {
        let tracks = vec![
            make_track("a", 0, None),
            make_track("b", 0, Some(10)),
            make_track("c", 0, Some(20)),
        ];
        let pool = candidate_pool(&tracks, 7);
        assert_eq!(pool.len(), 3);

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let chosen = choose(&tracks, 7, &mut rng).unwrap();
            assert_ne!(chosen.id, "c");
        }
    }

    #[test]
    fn never_played_sorts_before_any_timestamp() {
        let tracks = vec![
            make_track("b", 0, Some(0)),
            make_track("a", 0, None),
        ];
        let pool = candidate_pool(&tracks, 1);
        let mut sorted: Vec<&Track> = pool;
        sorted.sort_by(|x, y| {
            (x.last_played, x.id.as_str()).cmp(&(y.last_played, y.id.as_str()))
        });
        assert_eq!(sorted[0].id, "a");
        assert_eq!(sorted[1].id, "b");
    }

    #[test]
    fn weights_follow_rating_with_floor() {
        let liked = make_track("a", 10, None);
        let neutral = make_track("b", 0, None);
        let disliked = make_track("c", -10, None);
        let pool = vec![&liked, &neutral, &disliked];
        assert_eq!(weights(&pool), vec![2.0, 1.0, 0.1]);
    }

    #[test]
    fn weighted_draw_approximates_rating_ratio() {
        // After the recency drop only "a" (weight 2.0) and "b" (0.1) remain;
        // selection frequency should approach 20:1.
        let tracks = vec![
            make_track("a", 10, Some(1)),
            make_track("b", -10, Some(2)),
            make_track("c", 0, Some(3)),
        ];
        let mut rng = StdRng::seed_from_u64(6);
        let mut hits_a = 0u32;
        let mut hits_b = 0u32;
        for _ in 0..50_000 {
            match choose(&tracks, 1, &mut rng).unwrap().id.as_str() {
                "a" => hits_a += 1,
                "b" => hits_b += 1,
                other => panic!("unexpected selection {}", other),
            }
        }
        let ratio = f64::from(hits_a) / f64::from(hits_b);
        assert!(ratio > 15.0 && ratio < 26.0, "ratio was {}", ratio);
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let scheduler = Scheduler::new();
        let mut rng = StdRng::seed_from_u64(7);
        match scheduler.select_next_with(&store, &mut rng, 100) {
            Err(SchedulerError::EmptyCatalog) => {}
            other => panic!("expected EmptyCatalog, got {:?}", other.map(|t| t.id)),
        }
    }

    #[test]
    fn selection_records_play_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let track = insert(&store, "only");
        let scheduler = Scheduler::new();
        let mut rng = StdRng::seed_from_u64(8);

        let selected = scheduler.select_next_with(&store, &mut rng, 500).unwrap();
        assert_eq!(selected.id, track.id);
        assert_eq!(selected.play_count, 1);
        assert_eq!(selected.last_played, Some(500));

        let stored = store.get(&track.id).unwrap().unwrap();
        assert_eq!(stored.play_count, 1);
        assert_eq!(stored.last_played, Some(500));
    }

    #[test]
    fn consecutive_selections_never_repeat() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        insert(&store, "a");
        insert(&store, "b");
        insert(&store, "c");
        let scheduler = Scheduler::new();
        let mut rng = StdRng::seed_from_u64(9);

        let mut previous: Option<String> = None;
        for call in 0..30u64 {
            let selected = scheduler
                .select_next_with(&store, &mut rng, 1_000 + call)
                .unwrap();
            if let Some(previous) = &previous {
                assert_ne!(&selected.id, previous);
            }
            previous = Some(selected.id);
        }
    }

    #[test]
    fn unplayed_track_is_reached_within_eight_calls() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        for name in ["a", "b", "c"] {
            let track = insert(&store, name);
            store.record_play(&track.id, 10).unwrap();
        }
        let fresh = insert(&store, "fresh");

        let scheduler = Scheduler::new();
        let mut rng = StdRng::seed_from_u64(10);
        for call in 0..8u64 {
            scheduler
                .select_next_with(&store, &mut rng, 2_000 + call)
                .unwrap();
        }

        let stored = store.get(&fresh.id).unwrap().unwrap();
        assert!(stored.play_count >= 1);
    }
}
