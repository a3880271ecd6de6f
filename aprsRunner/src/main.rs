use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use aprsrunner::cli::cli::Args;
use aprsrunner::config::runner_config::load_config;
use aprsrunner::core::cancellation::CancellationToken;
use aprsrunner::core::runner::BeaconRunner;
use aprsrunner::data::state_store::{JsonStateStore, NullStateStore};
use aprsrunner::geo::route::Route;
use aprsrunner::transport::aprs_is::AprsIsTransport;
use aprsrunner::transport::dry_run::DryRunTransport;
use aprsrunner::utils::logging;
use aprsrunner::utils::traits::{StateStore, Transport};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.verbose())?;

    // Configuration and route problems end the process before any traffic
    let config = match load_config(args.config()) {
        Ok(config) => config,
        Err(e) => {
            error!("Config error: {}", e);
            std::process::exit(1);
        }
    };
    let route = match Route::new(config.waypoints.clone()) {
        Ok(route) => route,
        Err(e) => {
            error!("Route error: {}", e);
            std::process::exit(1);
        }
    };

    let cancellation = CancellationToken::new();
    cancellation
        .cancel_on_signals()
        .context("Failed to install signal handlers")?;

    let transport: Box<dyn Transport> = if args.dry_run() {
        Box::new(DryRunTransport::stdout())
    } else {
        Box::new(AprsIsTransport::new(config.aprs_is.clone()))
    };

    let store: Box<dyn StateStore> = match args.state_file() {
        Some(path) => Box::new(JsonStateStore::new(path)),
        None => Box::new(NullStateStore),
    };

    let rng = match args.seed() {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut runner = BeaconRunner::new(
        route,
        config.identity(),
        config.beacon_settings(),
        transport,
        store,
        rng,
    )
    .with_cancellation(cancellation);

    let result = runner.run();
    logging::print_timing_report();

    let summary = result.context("Beacon run failed")?;
    info!(
        "{} beacons sent, {} laps, stopped at {:.2} km{}",
        summary.beacons_sent,
        summary.laps_completed,
        runner.current_distance(),
        if summary.cancelled { " (signaled)" } else { "" }
    );

    Ok(())
}
