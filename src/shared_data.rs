// src/shared_data.rs

use crate::coordinator::{Direction, Intersection, SignalState};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One lane's values at one tick (a row of `lane_samples.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneSample {
    pub timestamp: u64,
    pub tick: u64,
    pub intersection_id: String,
    pub direction: Direction,
    pub state: SignalState,
    pub vehicle_count: u32,
    pub wait_time_seconds: u32,
    pub total_vehicles: u32,
}

impl LaneSample {
    /// Four samples per intersection, in direction order.
    pub fn from_snapshot(timestamp: u64, tick: u64, intersections: &[Intersection]) -> Vec<Self> {
        intersections
            .iter()
            .flat_map(|intersection| {
                intersection.lanes.iter().map(move |lane| LaneSample {
                    timestamp,
                    tick,
                    intersection_id: intersection.id.to_string(),
                    direction: lane.direction,
                    state: lane.state,
                    vehicle_count: lane.vehicle_count,
                    wait_time_seconds: lane.wait_time_seconds,
                    total_vehicles: intersection.total_vehicles,
                })
            })
            .collect()
    }
}

/// Why the AI controller granted green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiReason {
    QueueOverThreshold,
    WaitOverThreshold,
    RhythmAdjustment,
}

impl AiReason {
    pub fn describe(&self) -> &'static str {
        match self {
            AiReason::QueueOverThreshold => "queue exceeds 15 vehicles",
            AiReason::WaitOverThreshold => "wait exceeds 90 seconds",
            AiReason::RhythmAdjustment => "cycle adjusted to traffic rhythm",
        }
    }
}

/// An entry of the AI activity log (and a row of `ai_actions.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAction {
    pub timestamp: u64,
    pub tick: u64,
    pub intersection_id: String,
    pub direction: Direction,
    pub reason: AiReason,
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
