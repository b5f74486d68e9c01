//! TripScout: live travel-inventory aggregation
//!
//! Scrapes flights, hotels, points of interest and travel articles for a
//! trip and prints the results as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tripscout::{
    Config, EndpointRef, SearchEngine, SearchRequest, TripType,
};

#[derive(Parser)]
#[command(name = "tripscout")]
#[command(about = "Live travel-inventory aggregation over headless-browser extraction")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search flights
    Flights {
        /// Origin IATA code
        #[arg(long)]
        from: String,

        /// Destination IATA code
        #[arg(long)]
        to: String,

        /// Departure date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Return date for a round trip (YYYY-MM-DD)
        #[arg(long)]
        return_date: Option<String>,
    },

    /// Search hotels
    Hotels {
        /// Destination city
        #[arg(long)]
        city: String,

        /// Check-in date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// Search points of interest
    Todo {
        /// Destination city
        #[arg(long)]
        city: String,
    },

    /// Search travel articles
    Articles {
        /// Destination city
        #[arg(long)]
        city: String,
    },

    /// Run all four sources concurrently
    All {
        /// Origin IATA code
        #[arg(long)]
        from: String,

        /// Destination IATA code
        #[arg(long)]
        to: String,

        /// Destination city
        #[arg(long)]
        city: String,

        /// Departure date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Return date for a round trip (YYYY-MM-DD)
        #[arg(long)]
        return_date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    let engine = SearchEngine::new(&config);

    match cli.command {
        Commands::Flights {
            from,
            to,
            date,
            return_date,
        } => {
            let request = flight_request(from, to, None, date, return_date);
            print_json(&engine.search_transportation(&request).await?)
        }
        Commands::Hotels { city, date } => {
            let request = destination_request(city, Some(date));
            print_json(&engine.search_hotels(&request).await?)
        }
        Commands::Todo { city } => {
            let request = destination_request(city, None);
            print_json(&engine.search_points_of_interest(&request).await?)
        }
        Commands::Articles { city } => {
            let request = destination_request(city, None);
            print_json(&engine.search_articles(&request).await?)
        }
        Commands::All {
            from,
            to,
            city,
            date,
            return_date,
        } => {
            let request = flight_request(from, to, Some(city), date, return_date);
            print_json(&engine.search(&request).await)
        }
    }
}

fn flight_request(
    from: String,
    to: String,
    city: Option<String>,
    date: String,
    return_date: Option<String>,
) -> SearchRequest {
    let trip_type = if return_date.is_some() {
        TripType::RoundTrip
    } else {
        TripType::OneWay
    };
    SearchRequest {
        from: Some(EndpointRef {
            iata_code: Some(from),
            city: None,
        }),
        to: Some(EndpointRef {
            iata_code: Some(to),
            city,
        }),
        date: Some(date),
        return_date,
        trip_type: Some(trip_type),
    }
}

fn destination_request(city: String, date: Option<String>) -> SearchRequest {
    SearchRequest {
        from: None,
        to: Some(EndpointRef {
            iata_code: None,
            city: Some(city),
        }),
        date,
        return_date: None,
        trip_type: None,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
