// Scheduler
pub const TICK_INTERVAL_SECS: u64 = 3;
pub const AI_CYCLE_TICKS: u64 = 5;
pub const REPORT_TICKS: u64 = 100;

// Drift bounds (inclusive)
pub const VEHICLE_DRIFT_MIN: i64 = -2;
pub const VEHICLE_DRIFT_MAX: i64 = 2;
pub const WAIT_DRIFT_MIN: i64 = -5;
pub const WAIT_DRIFT_MAX: i64 = 4;
pub const TOTAL_DRIFT_MIN: i64 = -5;
pub const TOTAL_DRIFT_MAX: i64 = 4;
pub const MIN_TOTAL_VEHICLES: u32 = 10;

// AI activity log
pub const AI_LOG_CAPACITY: usize = 10;
pub const AI_QUEUE_THRESHOLD: u32 = 15;
pub const AI_WAIT_THRESHOLD_SECS: u32 = 90;

// Display thresholds
pub const LIGHT_TRAFFIC_MAX_WAIT_MINUTES: u32 = 2;
pub const MODERATE_TRAFFIC_MAX_WAIT_MINUTES: u32 = 5;
pub const ALTERNATE_ROUTE_WAIT_MINUTES: u32 = 4;
pub const CONGESTION_FULL_VEHICLES: f64 = 80.0;

// Environment / output
pub const CONFIG_ENV_VAR: &str = "TRAFFIC_CONFIG";
pub const OUTPUT_DIR: &str = "output";
pub const LANE_SAMPLES_CSV: &str = "lane_samples.csv";
pub const AI_ACTIONS_CSV: &str = "ai_actions.csv";
