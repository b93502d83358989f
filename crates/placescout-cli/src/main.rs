mod search;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use placescout_core::{load_profile, SearchProfile};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "placescout")]
#[command(about = "Search nearby places around a point and list them with saved status")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one search session and print the result cards
    Search {
        #[command(flatten)]
        center: CenterArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        saved: SavedArgs,
        /// Select this place after the results arrive (as a marker click)
        #[arg(long)]
        select: Option<String>,
        /// Save this place for `--user` after the results arrive
        #[arg(long, requires = "user")]
        save: Option<String>,
    },
    /// Focus a saved place: search around it and select it
    Focus {
        /// Id of the saved place
        place_id: String,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        saved: SavedArgs,
    },
    /// Resolve a zip code or address to coordinates
    Geocode {
        /// Zip code or free-form address
        query: String,
    },
}

/// Where to search. Falls back to the profile's default center.
#[derive(Debug, Args)]
struct CenterArgs {
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,
    /// Zip code or address to geocode first
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    address: Option<String>,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Radius in miles (must be one of the profile's radius choices)
    #[arg(long)]
    radius: Option<f64>,
    /// Only run these profile terms (repeatable)
    #[arg(long = "term")]
    terms: Vec<String>,
}

#[derive(Debug, Args)]
struct SavedArgs {
    /// User whose saved places drive status filtering
    #[arg(long)]
    user: Option<String>,
    /// JSON file of saved places keyed by place id
    #[arg(long, requires = "user")]
    saved: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = placescout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let profile = match &config.profile_path {
        Some(path) => load_profile(path)?,
        None => SearchProfile::default(),
    };
    tracing::debug!(env = %config.env, terms = profile.terms.len(), "configuration loaded");

    match cli.command {
        Some(Commands::Search {
            center,
            filters,
            saved,
            select,
            save,
        }) => {
            search::run_search(&config, &profile, center, &filters, saved, select, save).await?;
        }
        Some(Commands::Focus {
            place_id,
            filters,
            saved,
        }) => {
            search::run_focus(&config, &profile, place_id, &filters, saved).await?;
        }
        Some(Commands::Geocode { query }) => search::run_geocode(&config, &query).await?,
        None => println!("placescout: try `placescout search --help`"),
    }

    Ok(())
}
