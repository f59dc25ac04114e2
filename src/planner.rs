//! The session orchestrator: one fixed control flow per planning run.
//!
//! Stages run to completion in order: directions, per-route scenic
//! enrichment, route choice, chosen-route enrichment (preview, pit stops,
//! narrative), report composition and archiving. Only two conditions abort
//! a run: no routes at all, and (guarded, logically unreachable) no route
//! selectable. Every other failure degrades and leaves a user-visible
//! notice on the result.

use std::path::PathBuf;

use futures::StreamExt;
use log::{debug, info, warn};

use crate::error::PlanError;
use crate::maps::MapsClient;
use crate::narrative::NarrativeClient;
use crate::{pitstops, preview, report, scenic, ReportData, Route};

/// Degraded-narrative text, also shown in the report body.
const NARRATIVE_UNAVAILABLE: &str = "The AI narrative could not be generated.";

/// Result of one completed planning run.
#[derive(Debug)]
pub struct PlannedDrive {
    /// The immutable report value; a new run replaces it wholesale.
    pub report: ReportData,
    /// The composed standalone document.
    pub html: String,
    /// Where the report was archived, if the write succeeded.
    pub archived_to: Option<PathBuf>,
}

/// Orchestrates planning runs against shared, memoizing clients.
pub struct Planner {
    maps: MapsClient,
    narrative: Option<NarrativeClient>,
    archive_dir: PathBuf,
}

impl Planner {
    /// `narrative` is `None` when the AI credential was absent at startup;
    /// the run then uses the scenic-count fallback and a degraded narrative.
    pub fn new(
        maps: MapsClient,
        narrative: Option<NarrativeClient>,
        archive_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            maps,
            narrative,
            archive_dir: archive_dir.into(),
        }
    }

    /// Run the whole pipeline for one origin/destination pair.
    pub async fn plan(&self, origin: &str, destination: &str) -> Result<PlannedDrive, PlanError> {
        let mut notices = Vec::new();

        info!("1/4: fetching all possible routes");
        let mut routes = self
            .maps
            .directions(origin, destination)
            .await
            .ok_or(PlanError::NoRoutes)?;
        if routes.is_empty() {
            return Err(PlanError::NoRoutes);
        }

        info!("2/4: searching for scenic spots along {} routes", routes.len());
        for route in &mut routes {
            route.scenic_spots = scenic::collect_scenic_spots(&self.maps, &route.polyline).await;
            debug!("{}: {} scenic spots", route.id, route.scenic_spots.len());
        }

        info!("3/4: asking the model to choose the best route");
        let ai_choice = match &self.narrative {
            Some(ai) => ai.choose_route(&routes).await,
            None => None,
        };
        let chosen_index = match ai_choice {
            Some(number) => number - 1,
            None => {
                warn!("AI choice inconclusive, defaulting to the route with most scenic spots");
                notices.push(
                    "AI choice inconclusive, defaulting to route with most scenic spots."
                        .to_string(),
                );
                most_scenic_index(&routes).ok_or(PlanError::NoRouteChosen)?
            }
        };
        if chosen_index >= routes.len() {
            return Err(PlanError::NoRouteChosen);
        }
        let chosen = routes.swap_remove(chosen_index);
        info!("chose {} via {:?}", chosen.id, chosen.summary);

        info!("4/4: generating preview, pit stops, and narrative");
        let (preview, pit_stops, narrative) = tokio::join!(
            preview::build_drive_preview(&self.maps, &chosen.polyline),
            pitstops::find_pit_stops(&self.maps, &chosen.polyline),
            self.generate_narrative(&chosen),
        );

        if preview.is_none() {
            notices.push("Animated preview not available.".to_string());
        }
        if chosen.scenic_spots.is_empty() {
            notices.push("This route is more direct.".to_string());
        }
        if pit_stops.is_empty() {
            notices.push("No high-rated pit stops were found near the midpoint.".to_string());
        }
        let narrative = match narrative {
            Some(text) => text,
            None => {
                notices.push(NARRATIVE_UNAVAILABLE.to_string());
                NARRATIVE_UNAVAILABLE.to_string()
            }
        };

        let map_url = self
            .maps
            .static_map_url(&chosen.polyline, origin, destination);
        let report = ReportData {
            origin: origin.to_string(),
            destination: destination.to_string(),
            route: chosen,
            narrative,
            map_url,
            preview,
            pit_stops,
            notices,
        };

        let html = report::compose_html(&report, &self.maps);
        let archived_to = match report::save_report(&html, &self.archive_dir) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("report could not be archived: {e}");
                None
            }
        };

        Ok(PlannedDrive {
            report,
            html,
            archived_to,
        })
    }

    /// Concatenate the streamed narrative; `None` when the call failed or
    /// produced nothing, so the caller can substitute the degraded text.
    async fn generate_narrative(&self, route: &Route) -> Option<String> {
        let ai = self.narrative.as_ref()?;
        match ai.narrative_stream(route).await {
            Ok(stream) => {
                let text: String = stream.collect().await;
                if text.trim().is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                warn!("narrative generation failed: {e}");
                None
            }
        }
    }
}

/// Index of the route with the most scenic spots; ties go to the
/// first-encountered route. `None` only for an empty slice.
fn most_scenic_index(routes: &[Route]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, route) in routes.iter().enumerate() {
        let is_better = match best {
            Some(b) => route.scenic_spots.len() > routes[b].scenic_spots.len(),
            None => true,
        };
        if is_better {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScenicSpot;

    fn route_with_spots(id: &str, count: usize) -> Route {
        Route {
            id: id.into(),
            summary: String::new(),
            distance_text: String::new(),
            duration_text: String::new(),
            polyline: String::new(),
            scenic_spots: (0..count)
                .map(|i| ScenicSpot {
                    place_id: format!("{id}-{i}"),
                    name: format!("Spot {i}"),
                    photo_reference: "ph".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_fallback_picks_most_scenic() {
        let routes = vec![
            route_with_spots("Route 1", 2),
            route_with_spots("Route 2", 5),
            route_with_spots("Route 3", 1),
        ];
        assert_eq!(most_scenic_index(&routes), Some(1));
    }

    #[test]
    fn test_fallback_tie_goes_to_first() {
        let routes = vec![
            route_with_spots("Route 1", 3),
            route_with_spots("Route 2", 3),
        ];
        assert_eq!(most_scenic_index(&routes), Some(0));
    }

    #[test]
    fn test_fallback_empty_routes() {
        assert_eq!(most_scenic_index(&[]), None);
    }
}
