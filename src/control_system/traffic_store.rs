use anyhow::{anyhow, Result};
use rand::Rng;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task;
use tokio::time::sleep;

use crate::config::{AggregatePolicy, SimulationConfig};
use crate::control_system::ai_controller::{AiActivityLog, AiController};
use crate::coordinator::seed::validate_seed;
use crate::coordinator::{
    apply_periodic_drift, recommend, set_lane_state, set_mode, ControlMode, Direction,
    Intersection, IntersectionId, SignalState,
};
use crate::flow_analyzer::resync_aggregates;
use crate::monitoring::traffic_monitoring_system::{log_ai_action, log_lane_samples};
use crate::shared_data::{current_timestamp, AiAction, LaneSample};

/// Owns the intersection table. Every operation swaps in a fresh snapshot for the
/// intersection it touches, so readers holding a clone never see partial updates.
#[derive(Debug, Clone)]
pub struct TrafficStore {
    intersections: Vec<Intersection>,
    selected: Option<IntersectionId>,
    policy: AggregatePolicy,
    tick: u64,
    ai_log: AiActivityLog,
}

pub type SharedStore = Arc<Mutex<TrafficStore>>;

impl TrafficStore {
    pub fn new(intersections: Vec<Intersection>, policy: AggregatePolicy) -> Result<Self> {
        validate_seed(&intersections)?;
        let intersections: Vec<Intersection> = intersections
            .iter()
            .map(|i| resync_aggregates(i, policy))
            .collect();
        Ok(Self {
            intersections,
            selected: None,
            policy,
            tick: 0,
            ai_log: AiActivityLog::default(),
        })
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn snapshot(&self) -> Vec<Intersection> {
        self.intersections.clone()
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    pub fn get(&self, id: &IntersectionId) -> Option<&Intersection> {
        self.intersections.iter().find(|i| &i.id == id)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn policy(&self) -> AggregatePolicy {
        self.policy
    }

    fn position(&self, id: &IntersectionId) -> Result<usize> {
        self.intersections
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(|| anyhow!("Unknown intersection {}", id))
    }

    fn replace(&mut self, index: usize, next: Intersection) -> Intersection {
        self.intersections[index] = next.clone();
        next
    }

    // The selected id is a presentation pointer; it never affects the coordinator.
    pub fn select(&mut self, id: &IntersectionId) -> Result<()> {
        self.position(id)?;
        self.selected = Some(id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Intersection> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Applies a signal command. Mode is not checked here.
    pub fn set_lane_state(
        &mut self,
        id: &IntersectionId,
        direction: Direction,
        state: SignalState,
    ) -> Result<Intersection> {
        let index = self.position(id)?;
        let current = &self.intersections[index];
        log::info!(
            "Intersection {} ({}): {} -> {}",
            id,
            current.mode,
            direction,
            state
        );
        let next = resync_aggregates(&set_lane_state(current, direction, state), self.policy);
        Ok(self.replace(index, next))
    }

    pub fn set_mode(&mut self, id: &IntersectionId, mode: ControlMode) -> Result<Intersection> {
        let index = self.position(id)?;
        log::info!(
            "Intersection {}: mode {} -> {}",
            id,
            self.intersections[index].mode,
            mode
        );
        let next = set_mode(&self.intersections[index], mode);
        Ok(self.replace(index, next))
    }

    pub fn recommend(&self, id: &IntersectionId) -> Result<Direction> {
        let index = self.position(id)?;
        Ok(recommend(&self.intersections[index]))
    }

    /// Drifts every intersection once and returns the new tick number.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u64 {
        let policy = self.policy;
        self.intersections = self
            .intersections
            .iter()
            .map(|i| resync_aggregates(&apply_periodic_drift(i, &mut *rng), policy))
            .collect();
        self.tick += 1;
        log::debug!("Tick {} applied to {} intersections", self.tick, self.intersections.len());
        self.tick
    }

    pub fn record_ai_action(&mut self, action: AiAction) {
        self.ai_log.record(action);
    }

    pub fn ai_log(&self) -> &AiActivityLog {
        &self.ai_log
    }
}

/// Locks the store, recovering the data if a previous holder panicked.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, TrafficStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One scheduler step: drift, then give the AI controller its turn if due.
/// Returns the lane samples for this tick and any AI actions taken.
pub fn run_tick<R: Rng + ?Sized>(
    store: &SharedStore,
    rng: &mut R,
    controller: &AiController,
) -> (Vec<LaneSample>, Vec<AiAction>) {
    let mut guard = lock_store(store);
    let tick = guard.tick(rng);
    let actions = if controller.is_due(tick) {
        controller.run_cycle(&mut guard, tick)
    } else {
        Vec::new()
    };
    let samples = LaneSample::from_snapshot(current_timestamp(), tick, guard.intersections());
    (samples, actions)
}

/// Appends one tick's samples and AI actions to the CSV logs. Failures are logged.
pub fn write_tick_output(output_dir: &Path, samples: &[LaneSample], actions: &[AiAction]) {
    if let Err(e) = log_lane_samples(output_dir, samples) {
        log::error!("Error logging lane samples: {}", e);
    }
    for action in actions {
        if let Err(e) = log_ai_action(output_dir, action) {
            log::error!("Error logging AI action: {}", e);
        }
    }
}

/// Runs the periodic drift forever. Output is written outside the lock, on the
/// blocking pool.
pub async fn run_drift_loop<R: Rng + Send + 'static>(
    store: SharedStore,
    mut rng: R,
    config: SimulationConfig,
) {
    let controller = AiController::new(config.ai_cycle_ticks, config.auto_control);
    let interval = config.tick_interval();
    log::info!("Drift loop started, ticking every {:?}", interval);
    loop {
        sleep(interval).await;
        let (samples, actions) = run_tick(&store, &mut rng, &controller);
        let output_dir = config.output_dir.clone();
        let written = task::spawn_blocking(move || {
            write_tick_output(&output_dir, &samples, &actions);
        })
        .await;
        if let Err(e) = written {
            log::error!("CSV output task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::seed::create_intersections;
    use crate::global_variables::{AI_ACTIONS_CSV, LANE_SAMPLES_CSV};
    use crate::monitoring::traffic_monitoring_system::read_csv;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn store() -> TrafficStore {
        TrafficStore::new(create_intersections(), AggregatePolicy::Drifted).unwrap()
    }

    #[test]
    fn commands_replace_only_their_intersection() {
        let mut store = store();
        let before = store.snapshot();
        let id = IntersectionId::new("int-001");
        let after = store
            .set_lane_state(&id, Direction::North, SignalState::Green)
            .unwrap();
        assert_eq!(after.lanes.green_direction(), Some(Direction::North));
        assert_eq!(store.get(&id), Some(&after));
        assert_eq!(&store.snapshot()[1..], &before[1..]);
        // Earlier snapshot is unaffected.
        assert_eq!(before[0].lanes.green_direction(), Some(Direction::East));
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut store = store();
        let id = IntersectionId::new("int-404");
        assert!(store.set_mode(&id, ControlMode::FullManual).is_err());
        assert!(store.recommend(&id).is_err());
        assert!(store.select(&id).is_err());
        assert!(store.selected().is_none());
    }

    #[test]
    fn manual_commands_are_not_gated_by_mode() {
        let mut store = store();
        let id = IntersectionId::new("int-003");
        assert_eq!(store.get(&id).unwrap().mode, ControlMode::AiAuto);
        let after = store
            .set_lane_state(&id, Direction::South, SignalState::Green)
            .unwrap();
        assert_eq!(after.lanes.green_direction(), Some(Direction::South));
    }

    #[test]
    fn selection_tracks_latest_snapshot() {
        let mut store = store();
        let id = IntersectionId::new("int-002");
        store.select(&id).unwrap();
        store.set_mode(&id, ControlMode::FullManual).unwrap();
        assert_eq!(store.selected().unwrap().mode, ControlMode::FullManual);
        store.clear_selection();
        assert!(store.selected().is_none());
    }

    #[test]
    fn lane_sum_store_keeps_totals_in_sync() {
        let mut store =
            TrafficStore::new(create_intersections(), AggregatePolicy::LaneSum).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            store.tick(&mut rng);
        }
        for i in store.intersections() {
            let sum: u32 = i.lanes.iter().map(|l| l.vehicle_count).sum();
            assert_eq!(i.total_vehicles, sum);
        }
        assert_eq!(store.tick_count(), 20);
    }

    #[test]
    fn run_tick_samples_every_lane() {
        let shared = store().into_shared();
        let controller = AiController::new(1, true);
        let mut rng = SmallRng::seed_from_u64(5);
        let (samples, actions) = run_tick(&shared, &mut rng, &controller);
        assert_eq!(samples.len(), 16);
        assert!(samples.iter().all(|s| s.tick == 1));
        assert_eq!(lock_store(&shared).ai_log().len(), actions.len());
    }

    #[test]
    fn tick_output_appends_both_logs() {
        let dir = std::env::temp_dir().join(format!("signal_tick_{}", std::process::id()));
        let shared = store().into_shared();
        let controller = AiController::new(1, true);
        let mut rng = SmallRng::seed_from_u64(8);
        let (samples, actions) = run_tick(&shared, &mut rng, &controller);
        assert!(!actions.is_empty());

        write_tick_output(&dir, &samples, &actions);
        let written: Vec<LaneSample> = read_csv(&dir.join(LANE_SAMPLES_CSV)).unwrap();
        assert_eq!(written.len(), samples.len());
        let logged: Vec<AiAction> = read_csv(&dir.join(AI_ACTIONS_CSV)).unwrap();
        assert_eq!(logged.len(), actions.len());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
