use std::collections::HashMap;

use crate::models::Track;

/// Build the fallback match key: lowercased, trimmed, internal whitespace
/// runs collapsed to a single space, joined as `title|artist`.
pub fn normalized_key(title: &str, artist: &str) -> String {
    format!("{}|{}", normalize(title), normalize(artist))
}

fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    lower.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check whether two tracks carry the same non-empty ISRC.
///
/// ISRC comparison is exact and case-sensitive; the code is a global
/// recording identifier, not free text.
pub fn isrc_match(a: &Track, b: &Track) -> bool {
    match (&a.isrc, &b.isrc) {
        (Some(a_isrc), Some(b_isrc)) => !a_isrc.is_empty() && a_isrc == b_isrc,
        _ => false,
    }
}

/// Decide whether `candidate` matches `source`. ISRC wins when both sides
/// carry one; otherwise fall back to the normalized text key. Tracks
/// without usable title and artist text never match by key.
pub fn tracks_match(source: &Track, candidate: &Track) -> bool {
    if isrc_match(source, candidate) {
        return true;
    }

    if normalize(&source.title).is_empty() || normalize(&source.artist).is_empty() {
        return false;
    }

    normalized_key(&source.title, &source.artist)
        == normalized_key(&candidate.title, &candidate.artist)
}

/// Batch lookup structure over a candidate pool, used for diff-style
/// comparisons: one ISRC index and one normalized-key index.
///
/// Duplicates in the pool collapse (last write wins) — acceptable because
/// we report presence, not multiplicity.
pub struct TrackIndex {
    by_isrc: HashMap<String, Track>,
    by_key: HashMap<String, Track>,
}

impl TrackIndex {
    pub fn build(pool: &[Track]) -> Self {
        let mut by_isrc = HashMap::new();
        let mut by_key = HashMap::new();

        for track in pool {
            if let Some(isrc) = &track.isrc {
                if !isrc.is_empty() {
                    by_isrc.insert(isrc.clone(), track.clone());
                }
            }

            if !normalize(&track.title).is_empty() && !normalize(&track.artist).is_empty() {
                by_key.insert(normalized_key(&track.title, &track.artist), track.clone());
            }
        }

        Self { by_isrc, by_key }
    }

    /// Probe for a match: ISRC index first, normalized-key index second.
    pub fn lookup(&self, track: &Track) -> Option<&Track> {
        if let Some(isrc) = &track.isrc {
            if !isrc.is_empty() {
                if let Some(found) = self.by_isrc.get(isrc) {
                    return Some(found);
                }
            }
        }

        if normalize(&track.title).is_empty() || normalize(&track.artist).is_empty() {
            return None;
        }

        self.by_key.get(&normalized_key(&track.title, &track.artist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_key_collapses_whitespace() {
        assert_eq!(
            normalized_key("  Don't  Stop\tMe Now ", " QUEEN "),
            "don't stop me now|queen"
        );
    }

    #[test]
    fn test_normalized_key_idempotent() {
        let key = normalized_key("Bohemian   Rhapsody", "Queen");
        let (title, artist) = key.split_once('|').unwrap();
        assert_eq!(normalized_key(title, artist), key);
    }

    #[test]
    fn test_isrc_match_exact() {
        let a = Track::mock_with_isrc("Bohemian Rhapsody", "Queen", "GBUM71029604");
        let b = Track::mock_with_isrc("Bohemian Rhapsody (Remaster)", "Queen", "GBUM71029604");

        assert!(isrc_match(&a, &b));
        assert!(isrc_match(&b, &a));
        assert!(tracks_match(&a, &b));
    }

    #[test]
    fn test_isrc_mismatch_falls_back_to_key() {
        let a = Track::mock_with_isrc("Don't Stop Me Now", "Queen", "GBUM71029111");
        let b = Track::mock_with_isrc("don't stop me  now", "queen", "USUM70900222");

        assert!(!isrc_match(&a, &b));
        assert!(tracks_match(&a, &b));
    }

    #[test]
    fn test_empty_isrc_never_matches() {
        let a = Track {
            isrc: Some(String::new()),
            ..Track::mock("Song A", "Artist A")
        };
        let b = Track {
            isrc: Some(String::new()),
            ..Track::mock("Song B", "Artist B")
        };

        assert!(!isrc_match(&a, &b));
        assert!(!tracks_match(&a, &b));
    }

    #[test]
    fn test_degenerate_text_never_matches() {
        let a = Track::mock("", "");
        let b = Track::mock("  ", " ");

        assert!(!tracks_match(&a, &b));
    }

    #[test]
    fn test_index_probes_isrc_before_key() {
        let by_text = Track::mock("Starman", "David Bowie");
        let by_code = Track::mock_with_isrc("Starman (2012 Remaster)", "David Bowie", "GBALB1200123");
        let index = TrackIndex::build(&[by_text.clone(), by_code.clone()]);

        let probe = Track::mock_with_isrc("Starman", "David Bowie", "GBALB1200123");
        let found = index.lookup(&probe).unwrap();
        assert_eq!(found.id, by_code.id);
    }

    #[test]
    fn test_index_duplicates_collapse_last_write_wins() {
        let first = Track {
            id: "first".to_string(),
            ..Track::mock("Heroes", "David Bowie")
        };
        let second = Track {
            id: "second".to_string(),
            ..Track::mock("Heroes", "David Bowie")
        };
        let index = TrackIndex::build(&[first, second]);

        let probe = Track::mock("heroes", "david bowie");
        assert_eq!(index.lookup(&probe).unwrap().id, "second");
    }

    #[test]
    fn test_index_miss() {
        let index = TrackIndex::build(&[Track::mock("Heroes", "David Bowie")]);
        assert!(index.lookup(&Track::mock("Ashes to Ashes", "David Bowie")).is_none());
    }
}
