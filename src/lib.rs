//! # Drive Planner
//!
//! Scenic driving-route planning built on a mapping provider's routing and
//! places data, with a generative-AI route choice and narrative.
//!
//! This library provides:
//! - Route alternatives fetching with scenic-spot enrichment
//! - Street-imagery drive previews (animated GIF + vista grid)
//! - A self-contained, archivable HTML report per planning run
//!
//! ## Pipeline
//!
//! A planning run is a fixed sequence: directions → per-route scenic
//! enrichment → route selection → preview/pit-stop/narrative enrichment →
//! report composition. Every remote call fails open: transport errors,
//! timeouts, and malformed payloads degrade to empty results at the client
//! boundary, so only "no routes at all" aborts a run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drive_planner::{MapsClient, Planner};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let maps = MapsClient::new("maps-api-key", "IN")?;
//! let planner = Planner::new(maps, None, "archive");
//!
//! let drive = planner.plan("Mumbai", "Pune").await?;
//! println!("{} / {}", drive.report.route.distance_text, drive.report.route.duration_text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod maps;
pub mod narrative;
pub mod pitstops;
pub mod planner;
pub mod polyline;
pub mod preview;
pub mod report;
pub mod sample;
pub mod scenic;

pub use config::PlannerConfig;
pub use error::{AiError, ConfigError, DecodeError, FetchError, PlanError};
pub use maps::{MapsClient, PlaceRecord};
pub use narrative::NarrativeClient;
pub use planner::{PlannedDrive, Planner};

// ============================================================================
// Core Types
// ============================================================================

/// A coordinate pair with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new coordinate pair.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One route alternative from the directions provider.
///
/// Distance and duration text are carried verbatim from the provider
/// response. Scenic spots are attached in a later pipeline stage; the route
/// is otherwise immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Synthetic 1-based label ("Route 1", "Route 2", …), stable per result
    /// position and distinct from any provider-assigned identifier.
    pub id: String,
    /// Road summary as reported by the provider (may be empty).
    pub summary: String,
    pub distance_text: String,
    pub duration_text: String,
    /// Encoded overview polyline for the whole route.
    pub polyline: String,
    /// Scenic spots found along the route, deduplicated by place identifier.
    pub scenic_spots: Vec<ScenicSpot>,
}

/// A point of interest that passed the scenic filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenicSpot {
    /// Provider-assigned place identifier; unique within a route's spot set.
    pub place_id: String,
    pub name: String,
    /// Token for the place-photo endpoint.
    pub photo_reference: String,
}

/// A food-service stop near the route midpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PitStop {
    pub name: String,
    /// `None` when the provider reported no rating; sorts as 0.0 and is
    /// displayed as "N/A".
    pub rating: Option<f64>,
    pub total_ratings: u32,
}

impl PitStop {
    /// Rating for display: the numeric value, or "N/A" when unknown.
    pub fn rating_display(&self) -> String {
        match self.rating {
            Some(r) => format!("{r}"),
            None => "N/A".to_string(),
        }
    }
}

/// Street-imagery assets for the chosen route.
///
/// Absent entirely when no imagery was found along the route; there is no
/// empty animation.
#[derive(Debug, Clone, PartialEq)]
pub struct DrivePreview {
    /// Animated GIF bytes; frames are the first points of the vista grid.
    pub gif: Vec<u8>,
    /// Street-view image URLs in route order, at most twelve.
    pub grid_urls: Vec<String>,
}

/// Everything a completed planning run produced, as one immutable value.
///
/// Assembled once per run and returned to the caller; a new run builds a
/// fresh `ReportData` rather than updating a previous one.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub origin: String,
    pub destination: String,
    /// The chosen route, always one of the fetched alternatives.
    pub route: Route,
    pub narrative: String,
    /// Static-map image URL for the chosen route.
    pub map_url: String,
    pub preview: Option<DrivePreview>,
    pub pit_stops: Vec<PitStop>,
    /// User-visible messages from degraded stages.
    pub notices: Vec<String>,
}
