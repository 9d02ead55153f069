use std::collections::VecDeque;

use crate::control_system::traffic_store::TrafficStore;
use crate::coordinator::{recommend, ControlMode, Direction, Intersection, Lane, SignalState};
use crate::global_variables::{AI_LOG_CAPACITY, AI_QUEUE_THRESHOLD, AI_WAIT_THRESHOLD_SECS};
use crate::shared_data::{current_timestamp, AiAction, AiReason};

/// Most recent AI actions, newest first, bounded in size.
#[derive(Debug, Clone)]
pub struct AiActivityLog {
    capacity: usize,
    entries: VecDeque<AiAction>,
}

impl AiActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, action: AiAction) {
        self.entries.push_front(action);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &AiAction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AiActivityLog {
    fn default() -> Self {
        Self::new(AI_LOG_CAPACITY)
    }
}

pub fn reason_for(lane: &Lane) -> AiReason {
    if lane.vehicle_count > AI_QUEUE_THRESHOLD {
        AiReason::QueueOverThreshold
    } else if lane.wait_time_seconds > AI_WAIT_THRESHOLD_SECS {
        AiReason::WaitOverThreshold
    } else {
        AiReason::RhythmAdjustment
    }
}

/// What the AI would switch at this intersection right now, if anything.
/// Only ai-auto intersections are driven; a recommendation that is already green is a no-op.
pub fn decide(intersection: &Intersection) -> Option<(Direction, AiReason)> {
    if intersection.mode != ControlMode::AiAuto {
        return None;
    }
    let direction = recommend(intersection);
    let lane = intersection.lanes.get(direction);
    if lane.is_green() {
        return None;
    }
    Some((direction, reason_for(lane)))
}

/// Grants green to the recommended lane of every ai-auto intersection, once every
/// `cycle_ticks` ticks.
#[derive(Debug, Clone, Copy)]
pub struct AiController {
    cycle_ticks: u64,
    enabled: bool,
}

impl AiController {
    pub fn new(cycle_ticks: u64, enabled: bool) -> Self {
        Self {
            cycle_ticks: cycle_ticks.max(1),
            enabled,
        }
    }

    pub fn is_due(&self, tick: u64) -> bool {
        self.enabled && tick > 0 && tick % self.cycle_ticks == 0
    }

    pub fn run_cycle(&self, store: &mut TrafficStore, tick: u64) -> Vec<AiAction> {
        let decisions: Vec<_> = store
            .intersections()
            .iter()
            .filter_map(|i| decide(i).map(|(direction, reason)| (i.id.clone(), direction, reason)))
            .collect();

        let mut actions = Vec::new();
        for (id, direction, reason) in decisions {
            if let Err(e) = store.set_lane_state(&id, direction, SignalState::Green) {
                log::warn!("AI could not switch {}: {}", id, e);
                continue;
            }
            let action = AiAction {
                timestamp: current_timestamp(),
                tick,
                intersection_id: id.to_string(),
                direction,
                reason,
            };
            log::info!(
                "AI opened green for {} at {} ({})",
                direction,
                id,
                reason.describe()
            );
            store.record_ai_action(action.clone());
            actions.push(action);
        }
        actions
    }
}
