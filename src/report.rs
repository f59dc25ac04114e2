//! Report composition and archive persistence.
//!
//! Folds a completed run into one self-contained HTML document: inline
//! styling, the animated preview embedded as a base64 data URI, and remote
//! URLs for all other imagery. Composition is deterministic; identical
//! input yields byte-identical output. Only the archive file name carries a
//! timestamp.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::Local;
use log::info;

use crate::maps::MapsClient;
use crate::{DrivePreview, ReportData};

/// Scenic spots rendered in the report (and the dashboard), at most.
pub const MAX_REPORT_SPOTS: usize = 8;

const STYLE: &str = r#"body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 0; background-color: #f0f2f6; }
.container { max-width: 900px; margin: 20px auto; background: #fff; padding: 30px; border-radius: 8px; box-shadow: 0 4px 12px rgba(0,0,0,0.1); }
h1, h2 { color: #1a1a1a; border-bottom: 2px solid #007bff; padding-bottom: 10px; } h1 { font-size: 2.5em; text-align: center; border: none; }
h2 { font-size: 1.8em; margin-top: 40px; } p, li { color: #333; line-height: 1.6; } .header { text-align: center; margin-bottom: 30px; }
.header p { font-size: 1.2em; color: #555; } .map img, .gif-preview img { max-width: 100%; border-radius: 8px; }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 10px; margin-top: 15px; }
.grid img { width: 100%; border-radius: 8px; } .grid div { text-align: center; } ul { padding-left: 20px; }"#;

/// Build the standalone HTML report for a planning run.
///
/// `maps` is only used for its pure URL builders (place photos); no network
/// call happens here.
pub fn compose_html(data: &ReportData, maps: &MapsClient) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    html.push_str("<title>Scenic Drive Report</title><style>");
    html.push_str(STYLE);
    html.push_str("</style></head><body><div class=\"container\">");

    // Header
    html.push_str(&format!(
        "<div class=\"header\"><h1>Scenic Drive Report</h1>\
         <p>From <strong>{}</strong> to <strong>{}</strong></p><p>{} / {}</p></div>",
        escape(&data.origin),
        escape(&data.destination),
        escape(&data.route.distance_text),
        escape(&data.route.duration_text),
    ));

    // Route map
    html.push_str(&format!(
        "<div class=\"map\"><img src=\"{}\" alt=\"Route Map\"></div>",
        escape(&data.map_url)
    ));

    // Narrative
    html.push_str(&format!(
        "<h2>💡 AI Route Analysis</h2><p>{}</p>",
        escape(&data.narrative).replace('\n', "<br>")
    ));

    // Preview sections are only rendered when imagery was found.
    if let Some(preview) = &data.preview {
        html.push_str(&animated_section(preview));
        html.push_str(&grid_section(&preview.grid_urls));
    }

    // Scenic spots
    html.push_str("<h2>🏞️ Sights to See</h2><div class=\"grid\">");
    for spot in data.route.scenic_spots.iter().take(MAX_REPORT_SPOTS) {
        html.push_str(&format!(
            "<div><img src=\"{}\" alt=\"{}\"><b>{}</b></div>",
            escape(&maps.photo_url(&spot.photo_reference)),
            escape(&spot.name),
            escape(&spot.name),
        ));
    }
    html.push_str("</div>");

    // Pit stops
    html.push_str("<h2>☕ Recommended Pit Stops</h2><ul>");
    for stop in &data.pit_stops {
        html.push_str(&format!(
            "<li><b>{}</b> - ⭐ {} ({} ratings)</li>",
            escape(&stop.name),
            stop.rating_display(),
            stop.total_ratings,
        ));
    }
    html.push_str("</ul></div></body></html>");

    html
}

fn animated_section(preview: &DrivePreview) -> String {
    let gif_base64 = base64::engine::general_purpose::STANDARD.encode(&preview.gif);
    format!(
        "<h2>🛣️ Animated Drive Preview</h2><div class=\"gif-preview\">\
         <img src=\"data:image/gif;base64,{gif_base64}\" alt=\"Animated Drive Preview\"></div>"
    )
}

fn grid_section(urls: &[String]) -> String {
    let mut section = String::from("<h2>Key Vistas</h2><div class=\"grid\">");
    for url in urls {
        section.push_str(&format!(
            "<img src=\"{}\" alt=\"Drive Preview\">",
            escape(url)
        ));
    }
    section.push_str("</div>");
    section
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Persist a composed report under a timestamp-derived name.
///
/// The directory is created if absent. The write is scoped: the file handle
/// is closed before this returns. Concurrent runs produce distinct
/// timestamped names and do not collide.
pub fn save_report(html: &str, archive_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(archive_dir)?;
    let name = format!(
        "scenic_route_{}.html",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = archive_dir.join(name);
    fs::write(&path, html)?;
    info!("report archived to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PitStop, Route, ScenicSpot};

    fn sample_report(preview: Option<DrivePreview>) -> ReportData {
        ReportData {
            origin: "Mumbai".into(),
            destination: "Pune".into(),
            route: Route {
                id: "Route 1".into(),
                summary: "NH 48".into(),
                distance_text: "148 km".into(),
                duration_text: "2 hours 50 mins".into(),
                polyline: "abc".into(),
                scenic_spots: vec![ScenicSpot {
                    place_id: "p1".into(),
                    name: "Lonavala <Lookout>".into(),
                    photo_reference: "ph1".into(),
                }],
            },
            narrative: "First paragraph.\nSecond paragraph.".into(),
            map_url: "https://example.test/map".into(),
            preview,
            pit_stops: vec![PitStop {
                name: "Highway Dhaba".into(),
                rating: Some(4.8),
                total_ratings: 210,
            }],
            notices: Vec::new(),
        }
    }

    fn maps() -> MapsClient {
        MapsClient::new("test-key", "IN").unwrap()
    }

    #[test]
    fn test_compose_is_deterministic() {
        let data = sample_report(Some(DrivePreview {
            gif: vec![1, 2, 3],
            grid_urls: vec!["https://example.test/sv1".into()],
        }));
        let maps = maps();
        assert_eq!(compose_html(&data, &maps), compose_html(&data, &maps));
    }

    #[test]
    fn test_compose_carries_run_data() {
        let html = compose_html(&sample_report(None), &maps());
        assert!(html.contains("From <strong>Mumbai</strong> to <strong>Pune</strong>"));
        assert!(html.contains("148 km / 2 hours 50 mins"));
        assert!(html.contains("First paragraph.<br>Second paragraph."));
        assert!(html.contains("Highway Dhaba"));
        assert!(html.contains("⭐ 4.8 (210 ratings)"));
    }

    #[test]
    fn test_compose_escapes_provider_text() {
        let html = compose_html(&sample_report(None), &maps());
        assert!(html.contains("Lonavala &lt;Lookout&gt;"));
        assert!(!html.contains("Lonavala <Lookout>"));
    }

    #[test]
    fn test_preview_sections_omitted_when_absent() {
        let html = compose_html(&sample_report(None), &maps());
        assert!(!html.contains("Animated Drive Preview"));
        assert!(!html.contains("Key Vistas"));
    }

    #[test]
    fn test_preview_embedded_as_data_uri() {
        let data = sample_report(Some(DrivePreview {
            gif: b"GIF89a-fake".to_vec(),
            grid_urls: vec!["https://example.test/sv1".into(), "https://example.test/sv2".into()],
        }));
        let html = compose_html(&data, &maps());
        assert!(html.contains("data:image/gif;base64,"));
        assert!(html.contains("Key Vistas"));
        assert!(html.contains("https://example.test/sv1"));
        assert!(html.contains("https://example.test/sv2"));
    }

    #[test]
    fn test_spot_grid_capped_at_eight() {
        let mut data = sample_report(None);
        data.route.scenic_spots = (0..10)
            .map(|i| ScenicSpot {
                place_id: format!("p{i}"),
                name: format!("Spot {i}"),
                photo_reference: format!("ph{i}"),
            })
            .collect();
        let html = compose_html(&data, &maps());
        assert!(html.contains("Spot 7"));
        assert!(!html.contains("Spot 8"));
    }

    #[test]
    fn test_save_report_creates_directory_and_file() {
        let dir = std::env::temp_dir().join("drive-planner-test-archive");
        let _ = fs::remove_dir_all(&dir);

        let path = save_report("<html></html>", &dir).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("scenic_route_"));
        assert!(name.ends_with(".html"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");

        let _ = fs::remove_dir_all(&dir);
    }
}
