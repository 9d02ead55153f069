use rand::rngs::SmallRng;
use rand::SeedableRng;
use signal_coordinator::config::SimulationConfig;
use signal_coordinator::control_system::traffic_store::{run_drift_loop, TrafficStore};
use signal_coordinator::coordinator::seed::{create_intersections, load_seed_file};
use signal_coordinator::monitoring::traffic_monitoring_system::run_cli;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("Dashboard error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = SimulationConfig::from_env()?;
    let intersections = match &config.seed_path {
        Some(path) => load_seed_file(path)?,
        None => create_intersections(),
    };
    let store = TrafficStore::new(intersections, config.aggregate_policy)?.into_shared();
    let rng = match config.rng_seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    // The drift loop runs until the officer leaves the console.
    let drift = tokio::spawn(run_drift_loop(store.clone(), rng, config));
    let console_store = store.clone();
    tokio::task::spawn_blocking(move || run_cli(console_store)).await?;
    drift.abort();
    Ok(())
}
