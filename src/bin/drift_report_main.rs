// drift_report_main.rs
use rand::rngs::SmallRng;
use rand::SeedableRng;
use signal_coordinator::config::SimulationConfig;
use signal_coordinator::control_system::ai_controller::AiController;
use signal_coordinator::control_system::traffic_store::{lock_store, run_tick, TrafficStore};
use signal_coordinator::coordinator::seed::{create_intersections, load_seed_file};
use signal_coordinator::monitoring::traffic_monitoring_system::{
    chart_path, render_vehicle_chart, write_csv,
};
use signal_coordinator::shared_data::{current_timestamp, AiAction, LaneSample};

// Used when the config does not fix a seed, so reports are comparable run to run.
const DEFAULT_REPORT_SEED: u64 = 42;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Report error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = SimulationConfig::from_env()?;
    let intersections = match &config.seed_path {
        Some(path) => load_seed_file(path)?,
        None => create_intersections(),
    };
    let store = TrafficStore::new(intersections, config.aggregate_policy)?.into_shared();
    let mut rng = SmallRng::seed_from_u64(config.rng_seed.unwrap_or(DEFAULT_REPORT_SEED));
    let controller = AiController::new(config.ai_cycle_ticks, config.auto_control);

    let initial = lock_store(&store).snapshot();
    let mut samples = LaneSample::from_snapshot(current_timestamp(), 0, &initial);
    let mut actions: Vec<AiAction> = Vec::new();
    for _ in 0..config.report_ticks {
        let (tick_samples, tick_actions) = run_tick(&store, &mut rng, &controller);
        samples.extend(tick_samples);
        actions.extend(tick_actions);
    }
    log::info!(
        "Ran {} ticks: {} lane samples, {} AI actions",
        config.report_ticks,
        samples.len(),
        actions.len()
    );

    std::fs::create_dir_all(&config.output_dir)?;
    write_csv(&config.output_dir.join("report_lane_samples.csv"), &samples)?;
    write_csv(&config.output_dir.join("report_ai_actions.csv"), &actions)?;

    let ids: Vec<String> = lock_store(&store)
        .intersections()
        .iter()
        .map(|i| i.id.to_string())
        .collect();
    for id in ids {
        render_vehicle_chart(&samples, &id, &chart_path(&config.output_dir, &id))?;
    }
    println!("Report written to {}", config.output_dir.display());
    Ok(())
}
