use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::global_variables::{
    AI_CYCLE_TICKS, CONFIG_ENV_VAR, OUTPUT_DIR, REPORT_TICKS, TICK_INTERVAL_SECS,
};

/// How the display aggregates (`total_vehicles`, `estimated_wait_minutes`) evolve on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregatePolicy {
    /// The total drifts on its own and the wait estimate keeps its seed value.
    Drifted,
    /// Both are recomputed from the lanes after every tick.
    LaneSum,
}

/// Runtime settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_secs: u64,
    /// Fixed seed for the drift generator; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
    pub aggregate_policy: AggregatePolicy,
    /// The AI controller acts once every this many ticks.
    pub ai_cycle_ticks: u64,
    /// Whether ai-auto intersections get their signals switched by the AI controller.
    pub auto_control: bool,
    /// JSON seed file replacing the built-in intersections.
    pub seed_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub report_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: TICK_INTERVAL_SECS,
            rng_seed: None,
            aggregate_policy: AggregatePolicy::Drifted,
            ai_cycle_ticks: AI_CYCLE_TICKS,
            auto_control: true,
            seed_path: None,
            output_dir: PathBuf::from(OUTPUT_DIR),
            report_ticks: REPORT_TICKS,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        let config: SimulationConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the file named by `TRAFFIC_CONFIG`, or falls back to defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                log::info!("Loading config from {:?}", path);
                Self::load(Path::new(&path))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 {
            bail!("tick_interval_secs must be positive");
        }
        if self.ai_cycle_ticks == 0 {
            bail!("ai_cycle_ticks must be positive");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}
