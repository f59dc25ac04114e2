//! Pit-stop ranking near the route midpoint.
//!
//! One nearby search for food-service places at the path's midpoint, sorted
//! by rating descending and truncated to a fixed count. A missing rating
//! sorts as zero but is reported as unknown, not as 0.0.

use std::cmp::Ordering;

use log::warn;

use crate::maps::{MapsClient, PlaceRecord};
use crate::{polyline, sample, PitStop};

const SEARCH_RADIUS_M: u32 = 10_000;
const SEARCH_KEYWORD: &str = "cafe OR restaurant";
const PLACE_TYPE: &str = "restaurant";
const MAX_PIT_STOPS: usize = 5;

/// Sort records by rating, descending and stable, and keep the top five.
pub fn rank_pit_stops(records: Vec<PlaceRecord>) -> Vec<PitStop> {
    let mut stops: Vec<PitStop> = records
        .into_iter()
        .map(|r| PitStop {
            name: r.name,
            rating: r.rating,
            total_ratings: r.user_ratings_total,
        })
        .collect();

    stops.sort_by(|a, b| {
        let ra = a.rating.unwrap_or(0.0);
        let rb = b.rating.unwrap_or(0.0);
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal)
    });
    stops.truncate(MAX_PIT_STOPS);
    stops
}

/// Find the top-rated pit stops near the midpoint of an encoded path.
pub async fn find_pit_stops(maps: &MapsClient, encoded_polyline: &str) -> Vec<PitStop> {
    let path = match polyline::decode(encoded_polyline) {
        Ok(path) => path,
        Err(e) => {
            warn!("pit-stop search skipped, polyline undecodable: {e}");
            return Vec::new();
        }
    };
    let Some(midpoint) = sample::midpoint(&path) else {
        return Vec::new();
    };

    let records = maps
        .nearby_search(midpoint, SEARCH_RADIUS_M, Some(SEARCH_KEYWORD), Some(PLACE_TYPE))
        .await;
    rank_pit_stops(records)
}
