//! CLI for the scenic drive planner.
//!
//! `plan` runs the whole pipeline and prints the dashboard; `suggest`
//! prints location suggestions for a partial search text. Credentials come
//! from the environment (a `.env` file is honored). A missing AI credential
//! is surfaced once at startup and the run continues without AI features.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use drive_planner::report::MAX_REPORT_SPOTS;
use drive_planner::{MapsClient, NarrativeClient, PlannedDrive, Planner, PlannerConfig};

#[derive(Parser)]
#[command(name = "drive-planner", version, about = "Plan a scenic drive between two places")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a scenic drive and archive the HTML report
    Plan {
        /// Start location (free text)
        origin: String,
        /// End location (free text)
        destination: String,
        /// Region hint passed to the mapping provider
        #[arg(long, default_value = "IN")]
        region: String,
        /// Directory where reports are archived
        #[arg(long, default_value = "archive")]
        archive_dir: PathBuf,
    },
    /// Print location suggestions for a partial search text
    Suggest {
        /// Partial location text
        text: String,
        /// Region hint passed to the mapping provider
        #[arg(long, default_value = "IN")]
        region: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = PlannerConfig::from_env();

    match cli.command {
        Command::Plan {
            origin,
            destination,
            region,
            archive_dir,
        } => run_plan(&config, &origin, &destination, &region, archive_dir).await,
        Command::Suggest { text, region } => run_suggest(&config, &text, &region).await,
    }
}

async fn run_plan(
    config: &PlannerConfig,
    origin: &str,
    destination: &str,
    region: &str,
    archive_dir: PathBuf,
) -> ExitCode {
    let Some(maps) = build_maps_client(config, region) else {
        return ExitCode::from(2);
    };

    // An invalid AI credential is a visible configuration error, not a
    // crash: the pipeline still runs with its fallback behaviors.
    let narrative = match NarrativeClient::new(config.gemini_api_key.clone()) {
        Ok(client) => Some(client),
        Err(e) => {
            error!("AI features disabled: {e}");
            None
        }
    };

    let planner = Planner::new(maps, narrative, archive_dir);
    println!("Crafting your scenic drive from {origin} to {destination}...");

    match planner.plan(origin, destination).await {
        Ok(drive) => {
            print_dashboard(&drive);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_suggest(config: &PlannerConfig, text: &str, region: &str) -> ExitCode {
    let Some(maps) = build_maps_client(config, region) else {
        return ExitCode::from(2);
    };

    let suggestions = maps.autocomplete(text).await;
    if suggestions.is_empty() {
        println!("No suggestions for {text:?}.");
    } else {
        for suggestion in suggestions {
            println!("{suggestion}");
        }
    }
    ExitCode::SUCCESS
}

fn build_maps_client(config: &PlannerConfig, region: &str) -> Option<MapsClient> {
    let key = config.maps_api_key.clone().unwrap_or_default();
    match MapsClient::new(key, region) {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("error: could not initialise the HTTP client: {e}");
            None
        }
    }
}

fn print_dashboard(drive: &PlannedDrive) {
    let data = &drive.report;

    println!();
    println!("🎉 Your scenic route is ready!");
    println!();
    println!("  Distance:  {}", data.route.distance_text);
    println!("  Duration:  {}", data.route.duration_text);
    println!("  Route:     {} via {}", data.route.id, data.route.summary);
    println!("  Map:       {}", data.map_url);

    println!();
    println!("💡 Your Expert Guide's Analysis");
    println!("{}", data.narrative);

    println!();
    println!("🛣️ Drive Preview");
    match &data.preview {
        Some(preview) => println!(
            "  Animated preview ({} KB) and {} vista images.",
            preview.gif.len() / 1024,
            preview.grid_urls.len()
        ),
        None => println!("  Animated preview not available."),
    }

    println!();
    println!("🏞️ Sights to See");
    if data.route.scenic_spots.is_empty() {
        println!("  This route is more direct.");
    } else {
        for spot in data.route.scenic_spots.iter().take(MAX_REPORT_SPOTS) {
            println!("  - {}", spot.name);
        }
    }

    println!();
    println!("☕ Recommended Pit Stops");
    if data.pit_stops.is_empty() {
        println!("  No high-rated pit stops were found near the midpoint.");
    } else {
        for stop in &data.pit_stops {
            println!(
                "  - {} ⭐ {} ({} ratings)",
                stop.name,
                stop.rating_display(),
                stop.total_ratings
            );
        }
    }

    if !data.notices.is_empty() {
        println!();
        for notice in &data.notices {
            println!("note: {notice}");
        }
    }

    println!();
    match &drive.archived_to {
        Some(path) => println!("Report saved to {}.", path.display()),
        None => println!("Report could not be archived; see the log for details."),
    }
}
