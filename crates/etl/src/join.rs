//! Inner join of song plays against the song catalog.
//!
//! Join key: (song title, duration, artist name). Durations compare with
//! plain `f64` equality and no tolerance window, so a play whose length
//! differs from the catalog duration by a rounding error is dropped, same
//! as a play with a null key part.

use std::collections::HashMap;

use sparkify_core::{ActivityRecord, SongRecord};

/// Hashable form of an exact-equality `f64` key. `-0.0` folds into `0.0`
/// (they compare equal); NaN never produces a key since it equals nothing.
fn float_key(value: f64) -> Option<u64> {
    if value.is_nan() {
        None
    } else if value == 0.0 {
        Some(0.0f64.to_bits())
    } else {
        Some(value.to_bits())
    }
}

type JoinKey = (String, u64, String);

fn join_key(title: Option<&str>, duration: Option<f64>, artist: Option<&str>) -> Option<JoinKey> {
    Some((
        title?.to_string(),
        float_key(duration?)?,
        artist?.to_string(),
    ))
}

fn catalog_key(song: &SongRecord) -> Option<JoinKey> {
    join_key(song.title.as_deref(), song.duration, song.artist_name.as_deref())
}

fn play_key(play: &ActivityRecord) -> Option<JoinKey> {
    join_key(play.song.as_deref(), play.length, play.artist.as_deref())
}

/// Hash index over the catalog, probed once per play.
pub struct CatalogIndex<'a> {
    by_key: HashMap<JoinKey, Vec<&'a SongRecord>>,
}

impl<'a> CatalogIndex<'a> {
    pub fn build(catalog: &'a [SongRecord]) -> Self {
        let mut by_key: HashMap<JoinKey, Vec<&'a SongRecord>> = HashMap::new();
        for song in catalog {
            if let Some(key) = catalog_key(song) {
                by_key.entry(key).or_default().push(song);
            }
        }
        Self { by_key }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Catalog rows matching `play`, in catalog order. Duplicate catalog
    /// entries each produce a match, as in a relational inner join.
    pub fn matches(&self, play: &ActivityRecord) -> &[&'a SongRecord] {
        play_key(play)
            .and_then(|key| self.by_key.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
