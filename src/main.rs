use std::{
    fs::write,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use _model::LatLng;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Text};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    autocomplete::PlaceAutocomplete,
    config::Config,
    error::SearchError,
    maps::{GoogleMaps, MapsService},
    repository::{DatabaseArgs, MemoryRepository, PostgisRepository, Radius, StoreRepository},
    server::AppState,
    session::Session,
    stores::{HttpStores, StoreSource},
};

mod autocomplete;
mod config;
mod error;
mod map;
mod maps;
mod panel;
mod repository;
mod server;
mod session;
mod stores;

#[derive(Debug, Parser)]
#[command(about = "Find recycling drop-off locations by driving distance")]
struct Cli {
    /// YAML file overriding map, search and style defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve `/data/dropoffs`
    Serve {
        #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
        listen: SocketAddr,
        /// GeoJSON export used when no database is configured
        #[arg(long, default_value = "dropoffs.geojson")]
        data: PathBuf,
        #[arg(long)]
        table: Option<String>,
        #[command(flatten)]
        database: DatabaseArgs,
    },
    /// Print the drop-offs near a point, as the server would return them
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value = "dropoffs.geojson")]
        data: PathBuf,
    },
    /// Search an address and list drop-offs by driving distance
    Search {
        /// Search once instead of prompting
        #[arg(long)]
        address: Option<String>,
        /// Server to fetch drop-offs from
        #[arg(long)]
        endpoint: Option<String>,
        /// Write map overlays as GeoJSON after every search
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Print the results panel as HTML
        #[arg(long)]
        html: bool,
        #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
        api_key: String,
        #[arg(long, env = "GOOGLE_MAPS_BASE_URL")]
        maps_url: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Command::Serve {
            listen,
            data,
            table,
            database,
        } => {
            let table = table.unwrap_or_else(|| config.search.table.clone());
            let radius = Radius::from(&config.search);
            Runtime::new()?.block_on(async {
                let repository: Arc<dyn StoreRepository> = if database.is_configured() {
                    Arc::new(PostgisRepository::connect(&database, &table, radius).await?)
                } else {
                    Arc::new(MemoryRepository::load(&data, radius)?)
                };
                server::serve(listen, AppState { repository }).await
            })
        }
        Command::Nearby { lat, lng, data } => {
            let repository = MemoryRepository::load(&data, Radius::from(&config.search))?;
            let stores = repository.query(LatLng::new(lat, lng));
            println!("{}", serde_json::to_string_pretty(&stores)?);
            Ok(())
        }
        Command::Search {
            address,
            endpoint,
            overlay,
            html,
            api_key,
            maps_url,
        } => {
            let endpoint = endpoint.unwrap_or_else(|| config.search.endpoint.clone());
            let mut maps = GoogleMaps::new(&api_key, &config.search.country);
            if let Some(x) = maps_url {
                maps = maps.with_base_url(&x);
            }
            let mut session = Session::initialize(HttpStores::new(&endpoint), maps, config)?;
            let output = Output { overlay, html };
            output.write_overlay(&session)?;

            match address {
                Some(address) => {
                    let place = session.maps().geocode(&address)?;
                    session.place_changed(&place)?;
                    output.show(&session)
                }
                None => prompt(&mut session, &output),
            }
        }
    }
}

struct Output {
    overlay: Option<PathBuf>,
    html: bool,
}

impl Output {
    fn show<S: StoreSource, M: MapsService>(&self, session: &Session<S, M>) -> Result<()> {
        if self.html {
            print!("{}", session.panel.to_html());
        } else {
            print!("{}", session.panel);
        }
        self.write_overlay(session)
    }

    fn write_overlay<S: StoreSource, M: MapsService>(
        &self,
        session: &Session<S, M>,
    ) -> Result<()> {
        if let Some(path) = &self.overlay {
            write_json(path, &session.overlays())?;
        }
        Ok(())
    }
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    let mut contents = serde_json::to_string_pretty(value)?;
    contents.push('\n');
    write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

// Prompts for addresses until the user cancels.
fn prompt<S: StoreSource>(session: &mut Session<S, GoogleMaps>, output: &Output) -> Result<()> {
    loop {
        let autocomplete = PlaceAutocomplete::new(session.maps().clone(), session.bias());
        let input = match Text::new("Address")
            .with_autocomplete(autocomplete.clone())
            .prompt()
        {
            Ok(x) => x,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(())
            }
            Err(err) => return Err(err.into()),
        };

        let place = autocomplete.resolve(&input)?;
        match session.place_changed(&place) {
            Ok(()) => output.show(session)?,
            Err(err) => match err.downcast_ref::<SearchError>() {
                Some(x) => eprintln!("{x}"),
                None => return Err(err),
            },
        }
    }
}
