//! HTTP client for the mapping provider's routing, places, and imagery APIs.
//!
//! Five remote operations (autocomplete, directions, nearby search,
//! street-view metadata, image fetch) plus pure URL builders for assets the
//! report embeds by reference. Every remote operation fails open: transport
//! errors, non-2xx statuses, and malformed payloads are converted to an
//! empty/`None` value at this boundary, with the cause logged. A bad
//! sub-request must never abort a whole planning run.
//!
//! Each operation is memoized by its exact arguments for the lifetime of
//! the client, so repeated calls within and across runs skip the network.
//! The caches are the only shared mutable state in the pipeline; runs are
//! serialized by the caller, so a plain mutex per cache suffices.

use std::collections::HashMap;
use std::time::Duration;

use log::{info, warn};
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::{GeoPoint, Route};

const API_BASE: &str = "https://maps.googleapis.com/maps/api";

// Per-request bounds on worst-case latency; a timed-out call degrades like
// any other transport failure.
const DIRECTIONS_TIMEOUT: Duration = Duration::from_secs(15);
const NEARBY_TIMEOUT: Duration = Duration::from_secs(10);
const SHORT_TIMEOUT: Duration = Duration::from_secs(5);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// A raw place record from nearby search, before any filtering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceRecord {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: u32,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}

/// Photo reference token attached to a place record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoRef {
    pub photo_reference: String,
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    description: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    legs: Vec<WireLeg>,
    overview_polyline: WirePolyline,
}

#[derive(Debug, Deserialize)]
struct WireLeg {
    distance: WireText,
    duration: WireText,
}

#[derive(Debug, Deserialize)]
struct WireText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WirePolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    #[serde(default)]
    results: Vec<PlaceRecord>,
}

#[derive(Debug, Deserialize)]
struct StreetViewMetadata {
    #[serde(default)]
    status: String,
}

// ============================================================================
// Client
// ============================================================================

/// Memoizing client for the mapping provider.
pub struct MapsClient {
    client: Client,
    api_key: String,
    region: String,
    autocomplete_cache: Mutex<HashMap<String, Vec<String>>>,
    directions_cache: Mutex<HashMap<(String, String), Option<Vec<Route>>>>,
    nearby_cache: Mutex<HashMap<String, Vec<PlaceRecord>>>,
    street_view_cache: Mutex<HashMap<String, bool>>,
}

impl MapsClient {
    /// Create a client with the given API key and region hint.
    ///
    /// An empty key is allowed: every call will then degrade to its
    /// fail-open value when the provider rejects it.
    pub fn new(
        api_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            warn!("mapping provider key is empty; provider calls will degrade to empty results");
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            region: region.into(),
            autocomplete_cache: Mutex::new(HashMap::new()),
            directions_cache: Mutex::new(HashMap::new()),
            nearby_cache: Mutex::new(HashMap::new()),
            street_view_cache: Mutex::new(HashMap::new()),
        })
    }

    // ------------------------------------------------------------------
    // Autocomplete
    // ------------------------------------------------------------------

    /// Location suggestions for a partial search text.
    ///
    /// Empty input yields an empty result without a network call; any
    /// failure also yields an empty result.
    pub async fn autocomplete(&self, input: &str) -> Vec<String> {
        if input.trim().is_empty() {
            return Vec::new();
        }
        if let Some(hit) = self.autocomplete_cache.lock().await.get(input) {
            return hit.clone();
        }

        let suggestions = match self.fetch_autocomplete(input).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!("autocomplete for {input:?} degraded to empty: {e}");
                Vec::new()
            }
        };

        self.autocomplete_cache
            .lock()
            .await
            .insert(input.to_string(), suggestions.clone());
        suggestions
    }

    async fn fetch_autocomplete(&self, input: &str) -> Result<Vec<String>, FetchError> {
        let components = format!("country:{}", self.region);
        let resp = self
            .client
            .get(format!("{API_BASE}/place/autocomplete/json"))
            .query(&[
                ("input", input),
                ("components", components.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .timeout(SHORT_TIMEOUT)
            .send()
            .await?;

        let payload: AutocompleteResponse = read_json(resp).await?;
        Ok(payload
            .predictions
            .into_iter()
            .map(|p| p.description)
            .collect())
    }

    // ------------------------------------------------------------------
    // Directions
    // ------------------------------------------------------------------

    /// Route alternatives between two free-text locations.
    ///
    /// `None` when the provider reports zero routes or the request fails.
    /// Each route carries a synthetic 1-based "Route N" label.
    pub async fn directions(&self, origin: &str, destination: &str) -> Option<Vec<Route>> {
        let key = (origin.to_string(), destination.to_string());
        if let Some(hit) = self.directions_cache.lock().await.get(&key) {
            return hit.clone();
        }

        let routes = match self.fetch_directions(origin, destination).await {
            Ok(routes) => {
                info!(
                    "directions {origin:?} -> {destination:?}: {} alternatives",
                    routes.len()
                );
                Some(routes)
            }
            Err(FetchError::ZeroResults) => {
                info!("directions {origin:?} -> {destination:?}: no routes");
                None
            }
            Err(e) => {
                warn!("directions {origin:?} -> {destination:?} degraded to none: {e}");
                None
            }
        };

        self.directions_cache
            .lock()
            .await
            .insert(key, routes.clone());
        routes
    }

    async fn fetch_directions(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Vec<Route>, FetchError> {
        let resp = self
            .client
            .get(format!("{API_BASE}/directions/json"))
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("alternatives", "true"),
                ("region", self.region.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .timeout(DIRECTIONS_TIMEOUT)
            .send()
            .await?;

        let payload: DirectionsResponse = read_json(resp).await?;
        if payload.routes.is_empty() {
            return Err(FetchError::ZeroResults);
        }
        Ok(build_routes(payload))
    }

    // ------------------------------------------------------------------
    // Nearby search
    // ------------------------------------------------------------------

    /// Raw place records around a point. Failure yields an empty sequence.
    pub async fn nearby_search(
        &self,
        point: GeoPoint,
        radius_m: u32,
        keyword: Option<&str>,
        place_type: Option<&str>,
    ) -> Vec<PlaceRecord> {
        let cache_key = format!(
            "{:.6},{:.6}|{}|{}|{}",
            point.lat,
            point.lng,
            radius_m,
            keyword.unwrap_or(""),
            place_type.unwrap_or("")
        );
        if let Some(hit) = self.nearby_cache.lock().await.get(&cache_key) {
            return hit.clone();
        }

        let records = match self
            .fetch_nearby(point, radius_m, keyword, place_type)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!("nearby search at {:.4},{:.4} degraded to empty: {e}", point.lat, point.lng);
                Vec::new()
            }
        };

        self.nearby_cache
            .lock()
            .await
            .insert(cache_key, records.clone());
        records
    }

    async fn fetch_nearby(
        &self,
        point: GeoPoint,
        radius_m: u32,
        keyword: Option<&str>,
        place_type: Option<&str>,
    ) -> Result<Vec<PlaceRecord>, FetchError> {
        let mut params = vec![
            ("location", format!("{},{}", point.lat, point.lng)),
            ("radius", radius_m.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(keyword) = keyword {
            params.push(("keyword", keyword.to_string()));
        }
        if let Some(place_type) = place_type {
            params.push(("type", place_type.to_string()));
        }

        let resp = self
            .client
            .get(format!("{API_BASE}/place/nearbysearch/json"))
            .query(&params)
            .timeout(NEARBY_TIMEOUT)
            .send()
            .await?;

        let payload: NearbyResponse = read_json(resp).await?;
        Ok(payload.results)
    }

    // ------------------------------------------------------------------
    // Street imagery
    // ------------------------------------------------------------------

    /// Whether the provider confirms street imagery at a coordinate.
    /// Any failure is treated as unavailable.
    pub async fn street_view_available(&self, point: GeoPoint) -> bool {
        let cache_key = format!("{:.6},{:.6}", point.lat, point.lng);
        if let Some(&hit) = self.street_view_cache.lock().await.get(&cache_key) {
            return hit;
        }

        let available = match self.fetch_street_view_metadata(point).await {
            Ok(status) => status == "OK",
            Err(e) => {
                warn!(
                    "street view metadata at {:.4},{:.4} degraded to unavailable: {e}",
                    point.lat, point.lng
                );
                false
            }
        };

        self.street_view_cache
            .lock()
            .await
            .insert(cache_key, available);
        available
    }

    async fn fetch_street_view_metadata(&self, point: GeoPoint) -> Result<String, FetchError> {
        let location = format!("{},{}", point.lat, point.lng);
        let resp = self
            .client
            .get(format!("{API_BASE}/streetview/metadata"))
            .query(&[
                ("location", location.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .timeout(SHORT_TIMEOUT)
            .send()
            .await?;

        let payload: StreetViewMetadata = read_json(resp).await?;
        Ok(payload.status)
    }

    /// Fetch raw image bytes by URL. `None` on any failure.
    pub async fn fetch_image(&self, url: &str) -> Option<Vec<u8>> {
        match self.fetch_image_inner(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("image fetch degraded to none: {e}");
                None
            }
        }
    }

    async fn fetch_image_inner(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).timeout(IMAGE_TIMEOUT).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(resp.bytes().await?.to_vec())
    }

    // ------------------------------------------------------------------
    // URL builders (no network)
    // ------------------------------------------------------------------

    /// Static-map URL showing the route polyline with start/end markers.
    pub fn static_map_url(&self, encoded_polyline: &str, origin: &str, destination: &str) -> String {
        let path = format!("weight:4|color:0x0000ff|enc:{encoded_polyline}");
        let start_marker = format!("color:green|label:A|{origin}");
        let end_marker = format!("color:red|label:B|{destination}");
        build_url(
            &format!("{API_BASE}/staticmap"),
            &[
                ("size", "600x400"),
                ("path", path.as_str()),
                ("markers", start_marker.as_str()),
                ("markers", end_marker.as_str()),
                ("key", self.api_key.as_str()),
            ],
        )
    }

    /// Place-photo URL for a photo reference token.
    pub fn photo_url(&self, photo_reference: &str) -> String {
        build_url(
            &format!("{API_BASE}/place/photo"),
            &[
                ("maxwidth", "400"),
                ("photoreference", photo_reference),
                ("key", self.api_key.as_str()),
            ],
        )
    }

    /// Street-view image URL for a sampled route point.
    pub fn street_view_image_url(&self, point: GeoPoint) -> String {
        let location = format!("{},{}", point.lat, point.lng);
        build_url(
            &format!("{API_BASE}/streetview"),
            &[
                ("size", "400x300"),
                ("location", location.as_str()),
                ("fov", "90"),
                ("heading", "235"),
                ("pitch", "10"),
                ("key", self.api_key.as_str()),
            ],
        )
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert provider route payloads into `Route` values, labeling each by its
/// 1-based result position. Routes without a leg are skipped; their position
/// still counts toward later labels.
fn build_routes(payload: DirectionsResponse) -> Vec<Route> {
    payload
        .routes
        .into_iter()
        .enumerate()
        .filter_map(|(i, r)| {
            let leg = r.legs.into_iter().next()?;
            Some(Route {
                id: format!("Route {}", i + 1),
                summary: r.summary,
                distance_text: leg.distance.text,
                duration_text: leg.duration.text,
                polyline: r.overview_polyline.points,
                scenic_spots: Vec::new(),
            })
        })
        .collect()
}

async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, FetchError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn build_url(base: &str, params: &[(&str, &str)]) -> String {
    Url::parse_with_params(base, params)
        .expect("provider base URL is valid")
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MapsClient {
        MapsClient::new("test-key", "IN").unwrap()
    }

    #[test]
    fn test_build_routes_from_payload() {
        let payload: DirectionsResponse = serde_json::from_str(
            r#"{
                "routes": [
                    {
                        "summary": "NH 48",
                        "legs": [{"distance": {"text": "148 km"}, "duration": {"text": "2 hours 50 mins"}}],
                        "overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC"}
                    },
                    {
                        "summary": "NH 60",
                        "legs": [{"distance": {"text": "163 km"}, "duration": {"text": "3 hours 5 mins"}}],
                        "overview_polyline": {"points": "_mqNvxq`@"}
                    }
                ]
            }"#,
        )
        .unwrap();

        let routes = build_routes(payload);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].id, "Route 1");
        assert_eq!(routes[0].summary, "NH 48");
        assert_eq!(routes[0].distance_text, "148 km");
        assert_eq!(routes[0].duration_text, "2 hours 50 mins");
        assert_eq!(routes[1].id, "Route 2");
        assert!(routes.iter().all(|r| r.scenic_spots.is_empty()));
    }

    #[test]
    fn test_build_routes_skips_route_without_legs() {
        let payload: DirectionsResponse = serde_json::from_str(
            r#"{
                "routes": [
                    {"summary": "broken", "legs": [], "overview_polyline": {"points": "abc"}},
                    {
                        "summary": "NH 48",
                        "legs": [{"distance": {"text": "10 km"}, "duration": {"text": "20 mins"}}],
                        "overview_polyline": {"points": "def"}
                    }
                ]
            }"#,
        )
        .unwrap();

        let routes = build_routes(payload);
        assert_eq!(routes.len(), 1);
        // Position-stable labeling: the surviving route keeps its slot.
        assert_eq!(routes[0].id, "Route 2");
    }

    #[test]
    fn test_place_record_defaults() {
        let payload: NearbyResponse = serde_json::from_str(
            r#"{"results": [{"place_id": "p1", "name": "Lonely Cafe"}]}"#,
        )
        .unwrap();
        let record = &payload.results[0];
        assert_eq!(record.rating, None);
        assert_eq!(record.user_ratings_total, 0);
        assert!(record.types.is_empty());
        assert!(record.photos.is_empty());
    }

    #[tokio::test]
    async fn test_autocomplete_empty_input_skips_network() {
        // Blank input must resolve locally; no request is ever issued.
        let suggestions = client().autocomplete("   ").await;
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_static_map_url_contains_route_and_markers() {
        let url = client().static_map_url("enc123", "Mumbai", "Pune");
        assert!(url.starts_with("https://maps.googleapis.com/maps/api/staticmap?"));
        assert!(url.contains("enc%3Aenc123") || url.contains("enc:enc123"));
        assert!(url.contains("Mumbai"));
        assert!(url.contains("Pune"));
        assert!(url.contains("key=test-key"));
    }

    #[test]
    fn test_photo_url_carries_reference() {
        let url = client().photo_url("ref-42");
        assert!(url.contains("photoreference=ref-42"));
        assert!(url.contains("maxwidth=400"));
    }

    #[test]
    fn test_street_view_image_url_parameters() {
        let url = client().street_view_image_url(GeoPoint::new(18.52, 73.85));
        assert!(url.contains("size=400x300"));
        assert!(url.contains("fov=90"));
        assert!(url.contains("heading=235"));
        assert!(url.contains("pitch=10"));
        assert!(url.contains("18.52"));
    }
}
