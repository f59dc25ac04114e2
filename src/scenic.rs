//! Scenic-spot scoring along a route.
//!
//! Samples seven points along the route's path and fans out one nearby
//! search per point per keyword. This is the dominant cost of planning:
//! up to 7 x 6 = 42 remote calls per route, all memoized by the client.
//!
//! A raw place record is accepted iff it has at least one photo, a rating
//! strictly above 4.0, and a type tag from the allow-list. Accepted records
//! are deduplicated by place identifier; the first sighting of a place wins
//! and keeps its name and photo reference.

use std::collections::HashSet;

use log::{debug, warn};

use crate::maps::{MapsClient, PlaceRecord};
use crate::{polyline, sample, ScenicSpot};

/// Search keywords fanned out at every sampled point.
pub const SEARCH_KEYWORDS: [&str; 6] = [
    "scenic lookout",
    "waterfall",
    "historic landmark",
    "temple",
    "beach",
    "hiking area",
];

/// Place-type tags that qualify a record as scenic.
pub const ALLOWED_TYPES: [&str; 7] = [
    "tourist_attraction",
    "park",
    "museum",
    "natural_feature",
    "zoo",
    "art_gallery",
    "landmark",
];

const SAMPLE_POINTS: usize = 7;
const SEARCH_RADIUS_M: u32 = 10_000;
const MIN_RATING: f64 = 4.0;

/// The scenic filter: photo present, rating strictly above the threshold,
/// and at least one allow-listed type tag.
pub fn is_scenic(place: &PlaceRecord) -> bool {
    !place.photos.is_empty()
        && place.rating.map_or(false, |r| r > MIN_RATING)
        && place
            .types
            .iter()
            .any(|t| ALLOWED_TYPES.contains(&t.as_str()))
}

/// Append `place` to `spots` unless its place identifier was already seen.
/// First-seen wins: duplicates never replace an earlier name or photo.
pub fn merge_spot(spots: &mut Vec<ScenicSpot>, seen: &mut HashSet<String>, place: &PlaceRecord) {
    if !seen.insert(place.place_id.clone()) {
        return;
    }
    spots.push(ScenicSpot {
        place_id: place.place_id.clone(),
        name: place.name.clone(),
        photo_reference: place
            .photos
            .first()
            .map(|p| p.photo_reference.clone())
            .unwrap_or_default(),
    });
}

/// Collect the scenic spots along a route's encoded path.
///
/// A polyline that fails to decode yields an empty spot list; individual
/// search failures already degrade to empty inside the client.
pub async fn collect_scenic_spots(maps: &MapsClient, encoded_polyline: &str) -> Vec<ScenicSpot> {
    let path = match polyline::decode(encoded_polyline) {
        Ok(path) => path,
        Err(e) => {
            warn!("scenic scoring skipped, polyline undecodable: {e}");
            return Vec::new();
        }
    };

    let mut spots = Vec::new();
    let mut seen = HashSet::new();

    for index in sample::sample_indices(path.len(), SAMPLE_POINTS) {
        let point = path[index];
        for keyword in SEARCH_KEYWORDS {
            let records = maps
                .nearby_search(point, SEARCH_RADIUS_M, Some(keyword), None)
                .await;
            for record in records.iter().filter(|r| is_scenic(r)) {
                merge_spot(&mut spots, &mut seen, record);
            }
        }
    }

    debug!("{} scenic spots along path of {} points", spots.len(), path.len());
    spots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::PhotoRef;

    fn place(place_id: &str, rating: Option<f64>, types: &[&str], photos: &[&str]) -> PlaceRecord {
        PlaceRecord {
            place_id: place_id.into(),
            name: format!("Place {place_id}"),
            rating,
            user_ratings_total: 10,
            types: types.iter().map(|t| t.to_string()).collect(),
            photos: photos
                .iter()
                .map(|p| PhotoRef {
                    photo_reference: p.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_accepts_qualifying_place() {
        let p = place("a", Some(4.5), &["park", "establishment"], &["ph1"]);
        assert!(is_scenic(&p));
    }

    #[test]
    fn test_rating_threshold_is_strict() {
        // Exactly 4.0 is excluded.
        let p = place("a", Some(4.0), &["park"], &["ph1"]);
        assert!(!is_scenic(&p));
    }

    #[test]
    fn test_missing_rating_excluded() {
        let p = place("a", None, &["park"], &["ph1"]);
        assert!(!is_scenic(&p));
    }

    #[test]
    fn test_photo_required() {
        let p = place("a", Some(4.1), &["park"], &[]);
        assert!(!is_scenic(&p));
    }

    #[test]
    fn test_type_allow_list() {
        let restaurant_only = place("a", Some(4.1), &["restaurant"], &["ph1"]);
        assert!(!is_scenic(&restaurant_only));

        let mixed = place("b", Some(4.1), &["restaurant", "tourist_attraction"], &["ph1"]);
        assert!(is_scenic(&mixed));
    }

    #[test]
    fn test_dedup_first_seen_wins() {
        let mut spots = Vec::new();
        let mut seen = HashSet::new();

        merge_spot(&mut spots, &mut seen, &place("dup", Some(4.5), &["park"], &["first"]));
        merge_spot(&mut spots, &mut seen, &place("dup", Some(4.9), &["park"], &["second"]));

        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].photo_reference, "first");
    }

    #[test]
    fn test_merge_preserves_insertion_order() {
        let mut spots = Vec::new();
        let mut seen = HashSet::new();

        for id in ["c", "a", "b"] {
            merge_spot(&mut spots, &mut seen, &place(id, Some(4.5), &["park"], &["ph"]));
        }

        let ids: Vec<&str> = spots.iter().map(|s| s.place_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
