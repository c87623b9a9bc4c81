use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use log::{info, warn};

use crate::{
    fetch::{OsmApi, OSM_API},
    inputs::UserInputs,
    project::{Projector, RouteTypeTable},
    retrieve::Retriever,
    store::RecordStore,
};

mod data;
mod departures;
mod error;
mod fetch;
mod gtfs;
mod inputs;
mod project;
mod retrieve;
mod serialize;
mod shape;
mod store;

/// Converts OSM public transport route masters into a GTFS-like feed.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relation ids of the route masters to convert
    #[arg(required = true)]
    route_masters: Vec<u64>,

    /// JSON file with agency and calendar inputs
    #[arg(short, long)]
    inputs: Option<PathBuf>,

    /// Directory the feed files are written to
    #[arg(short, long, default_value = "gtfs")]
    output: PathBuf,

    #[arg(long, default_value = OSM_API)]
    api_url: String,

    /// Seconds to wait for a single element before leaving it unresolved
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, default_value_t = 8)]
    max_in_flight: usize,

    /// Additional route types as MODE=TYPE, e.g. bus=3
    #[arg(long = "route-type", value_parser = parse_route_type)]
    route_types: Vec<(String, u16)>,
}

fn parse_route_type(value: &str) -> Result<(String, u16), String> {
    let (mode, route_type) = value
        .split_once('=')
        .ok_or_else(|| format!("{value:?} is not MODE=TYPE"))?;
    let route_type = route_type
        .parse()
        .map_err(|_| format!("{route_type:?} is not a route type"))?;
    Ok((mode.to_owned(), route_type))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let inputs = match &args.inputs {
        Some(path) => UserInputs::from_path(path)?,
        None => UserInputs::default(),
    };

    let route_types = args
        .route_types
        .iter()
        .fold(RouteTypeTable::default(), |table, (mode, route_type)| {
            table.with(mode.as_str(), *route_type)
        });

    let store = RecordStore::new();
    let retriever = Retriever::new(
        Arc::new(OsmApi::new(args.api_url.as_str())),
        Duration::from_secs(args.timeout_secs),
        args.max_in_flight,
    );

    info!("Fetching {} route masters", args.route_masters.len());
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(retriever.load_all(&store, &args.route_masters));

    if store.is_empty() {
        warn!("No route master could be loaded; the feed will be empty");
    }

    let diagnostics = store.diagnostics();
    info!("Resolved {}", diagnostics);
    if !diagnostics.is_complete() {
        warn!("Some references could not be fetched; the feed will have gaps");
    }

    let projection = Projector::new(route_types).project(&store, &inputs);
    for (service_id, err) in &projection.rejected_departures {
        warn!("{}: {}", service_id, err);
    }

    serialize::write_feed(&args.output, &projection.feed)?;
    info!("Wrote feed to {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_line() {
        let args = Args::try_parse_from([
            "osm2gtfs",
            "2679",
            "2680",
            "--route-type",
            "bus=3",
            "--timeout-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(args.route_masters, vec![2679, 2680]);
        assert_eq!(args.route_types, vec![("bus".to_owned(), 3)]);
        assert_eq!(args.timeout_secs, 5);
        assert_eq!(args.output, PathBuf::from("gtfs"));
        assert_eq!(args.api_url, OSM_API);
    }

    #[test]
    fn route_master_is_required() {
        assert!(Args::try_parse_from(["osm2gtfs"]).is_err());
        assert!(parse_route_type("bus").is_err());
        assert!(parse_route_type("bus=x").is_err());
    }
}
