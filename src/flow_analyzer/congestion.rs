// congestion.rs
//
// Display metrics derived from an intersection snapshot.

use serde::{Deserialize, Serialize};

use crate::config::AggregatePolicy;
use crate::coordinator::{recommend, Direction, Intersection, SignalState};
use crate::global_variables::{
    ALTERNATE_ROUTE_WAIT_MINUTES, CONGESTION_FULL_VEHICLES, LIGHT_TRAFFIC_MAX_WAIT_MINUTES,
    MODERATE_TRAFFIC_MAX_WAIT_MINUTES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficLevel {
    Light,
    Moderate,
    Heavy,
}

impl TrafficLevel {
    pub fn from_wait_minutes(minutes: u32) -> Self {
        if minutes <= LIGHT_TRAFFIC_MAX_WAIT_MINUTES {
            TrafficLevel::Light
        } else if minutes <= MODERATE_TRAFFIC_MAX_WAIT_MINUTES {
            TrafficLevel::Moderate
        } else {
            TrafficLevel::Heavy
        }
    }

    /// Map marker color.
    pub fn color(&self) -> &'static str {
        match self {
            TrafficLevel::Light => "#22c55e",
            TrafficLevel::Moderate => "#facc15",
            TrafficLevel::Heavy => "#ef4444",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrafficLevel::Light => "flowing",
            TrafficLevel::Moderate => "moderately dense",
            TrafficLevel::Heavy => "very dense",
        }
    }
}

pub fn traffic_level(intersection: &Intersection) -> TrafficLevel {
    TrafficLevel::from_wait_minutes(intersection.estimated_wait_minutes)
}

/// Share of a nominal full load (80 vehicles), capped at 100.
pub fn congestion_percent(intersection: &Intersection) -> f64 {
    (intersection.total_vehicles as f64 / CONGESTION_FULL_VEHICLES * 100.0).min(100.0)
}

pub fn suggests_alternate_route(intersection: &Intersection) -> bool {
    intersection.estimated_wait_minutes > ALTERNATE_ROUTE_WAIT_MINUTES
}

/// Sum of lane counts, saturating at u32::MAX.
pub fn lane_vehicle_sum(intersection: &Intersection) -> u32 {
    intersection
        .lanes
        .iter()
        .fold(0u32, |sum, lane| sum.saturating_add(lane.vehicle_count))
}

/// Mean wait of the red lanes, rounded up to whole minutes. 0 when nothing is red.
pub fn red_lane_wait_minutes(intersection: &Intersection) -> u32 {
    let waits: Vec<u64> = intersection
        .lanes
        .iter()
        .filter(|lane| lane.state == SignalState::Red)
        .map(|lane| u64::from(lane.wait_time_seconds))
        .collect();
    if waits.is_empty() {
        return 0;
    }
    let mean = waits.iter().sum::<u64>() as f64 / waits.len() as f64;
    (mean / 60.0).ceil() as u32
}

/// Recomputes the display aggregates from the lanes when the policy asks for it.
pub fn resync_aggregates(intersection: &Intersection, policy: AggregatePolicy) -> Intersection {
    match policy {
        AggregatePolicy::Drifted => intersection.clone(),
        AggregatePolicy::LaneSum => Intersection {
            total_vehicles: lane_vehicle_sum(intersection),
            estimated_wait_minutes: red_lane_wait_minutes(intersection),
            ..intersection.clone()
        },
    }
}

/// The lane the console should highlight as the AI's suggestion, if any.
pub fn ai_hint(intersection: &Intersection) -> Option<Direction> {
    if !intersection.mode.shows_ai_hints() {
        return None;
    }
    let direction = recommend(intersection);
    if intersection.lanes.get(direction).is_green() {
        None
    } else {
        Some(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::seed::create_intersections;
    use crate::coordinator::ControlMode;

    #[test]
    fn traffic_levels_follow_wait_thresholds() {
        assert_eq!(TrafficLevel::from_wait_minutes(0), TrafficLevel::Light);
        assert_eq!(TrafficLevel::from_wait_minutes(2), TrafficLevel::Light);
        assert_eq!(TrafficLevel::from_wait_minutes(3), TrafficLevel::Moderate);
        assert_eq!(TrafficLevel::from_wait_minutes(5), TrafficLevel::Moderate);
        assert_eq!(TrafficLevel::from_wait_minutes(6), TrafficLevel::Heavy);
        assert_eq!(TrafficLevel::Heavy.color(), "#ef4444");
    }

    #[test]
    fn congestion_is_capped() {
        let mut i = create_intersections().remove(0);
        i.total_vehicles = 40;
        assert!((congestion_percent(&i) - 50.0).abs() < 1e-9);
        i.total_vehicles = 200;
        assert_eq!(congestion_percent(&i), 100.0);
    }

    #[test]
    fn lane_sum_policy_recomputes_aggregates() {
        // int-001: 12 + 8 + 5 + 15 vehicles; red waits 45, 45, 30.
        let i = create_intersections().remove(0);
        let synced = resync_aggregates(&i, AggregatePolicy::LaneSum);
        assert_eq!(synced.total_vehicles, 40);
        assert_eq!(synced.estimated_wait_minutes, 1);
        assert_eq!(resync_aggregates(&i, AggregatePolicy::Drifted), i);
    }

    #[test]
    fn lane_sum_policy_saturates_huge_counts() {
        let mut i = create_intersections().remove(0);
        i.lanes.north.vehicle_count = u32::MAX;
        i.lanes.west.vehicle_count = u32::MAX;
        i.lanes.north.wait_time_seconds = u32::MAX;
        i.lanes.south.wait_time_seconds = u32::MAX;
        let synced = resync_aggregates(&i, AggregatePolicy::LaneSum);
        assert_eq!(synced.total_vehicles, u32::MAX);
        assert_eq!(lane_vehicle_sum(&i), u32::MAX);
        // (2 * u32::MAX + 30) / 3 seconds, in minutes.
        let expected = ((2.0 * u32::MAX as f64 + 30.0) / 3.0 / 60.0).ceil() as u32;
        assert_eq!(synced.estimated_wait_minutes, expected);
    }

    #[test]
    fn hint_only_in_assisted_mode() {
        // int-002 is manual-with-ai; the busiest red lane is east (18).
        let assisted = create_intersections().remove(1);
        assert_eq!(ai_hint(&assisted), Some(Direction::East));

        let manual = Intersection {
            mode: ControlMode::FullManual,
            ..assisted
        };
        assert_eq!(ai_hint(&manual), None);
    }

    #[test]
    fn alternate_route_over_four_minutes() {
        let seed = create_intersections();
        assert!(!suggests_alternate_route(&seed[1]));
        assert!(suggests_alternate_route(&seed[2]));
    }
}
