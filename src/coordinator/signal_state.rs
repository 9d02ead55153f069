use rand::Rng;

use crate::coordinator::types::{ControlMode, Direction, Intersection, SignalState};
use crate::global_variables::{
    MIN_TOTAL_VEHICLES, TOTAL_DRIFT_MAX, TOTAL_DRIFT_MIN, VEHICLE_DRIFT_MAX, VEHICLE_DRIFT_MIN,
    WAIT_DRIFT_MAX, WAIT_DRIFT_MIN,
};

// Saturates at u32::MAX rather than wrapping.
fn offset(value: u32, delta: i64, floor: u32) -> u32 {
    let shifted = (i64::from(value) + delta).max(i64::from(floor));
    u32::try_from(shifted).unwrap_or(u32::MAX)
}

/// Perturbs lane counts, wait times and the total vehicle aggregate.
/// Signal states are never touched, and green lanes always come out with zero wait.
pub fn apply_periodic_drift<R: Rng + ?Sized>(
    intersection: &Intersection,
    rng: &mut R,
) -> Intersection {
    let mut next = intersection.clone();
    for direction in Direction::ALL {
        let lane = next.lanes.get_mut(direction);
        let delta = rng.random_range(VEHICLE_DRIFT_MIN..=VEHICLE_DRIFT_MAX);
        lane.vehicle_count = offset(lane.vehicle_count, delta, 0);
        // Always draw, so the random stream does not depend on signal states.
        let wait_delta = rng.random_range(WAIT_DRIFT_MIN..=WAIT_DRIFT_MAX);
        lane.wait_time_seconds = if lane.is_green() {
            0
        } else {
            offset(lane.wait_time_seconds, wait_delta, 0)
        };
    }
    let total_delta = rng.random_range(TOTAL_DRIFT_MIN..=TOTAL_DRIFT_MAX);
    next.total_vehicles = offset(next.total_vehicles, total_delta, MIN_TOTAL_VEHICLES);
    next
}

/// Switches one lane's signal. Granting green first forces every other lane to red,
/// so at most one lane is green once this returns.
pub fn set_lane_state(
    intersection: &Intersection,
    direction: Direction,
    new_state: SignalState,
) -> Intersection {
    let mut next = intersection.clone();
    if new_state == SignalState::Green {
        for other in Direction::ALL.into_iter().filter(|d| *d != direction) {
            next.lanes.get_mut(other).state = SignalState::Red;
        }
    }
    let lane = next.lanes.get_mut(direction);
    lane.state = new_state;
    if new_state == SignalState::Green {
        lane.wait_time_seconds = 0;
    }
    next
}

pub fn set_mode(intersection: &Intersection, mode: ControlMode) -> Intersection {
    Intersection {
        mode,
        ..intersection.clone()
    }
}

/// The red lane with the most queued vehicles. Falls back to north when no red lane
/// has a positive count; ties keep the earlier direction.
pub fn recommend(intersection: &Intersection) -> Direction {
    let (direction, _) = intersection.lanes.iter().fold(
        (Direction::North, 0),
        |(best_dir, best_count), lane| {
            if lane.state == SignalState::Red && lane.vehicle_count > best_count {
                (lane.direction, lane.vehicle_count)
            } else {
                (best_dir, best_count)
            }
        },
    );
    direction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::types::{
        IntersectionId, IntersectionStatus, Lane, Lanes, Location,
    };
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn intersection(states: [(SignalState, u32, u32); 4]) -> Intersection {
        let lane = |i: usize| Lane::new(Direction::ALL[i], states[i].0, states[i].1, states[i].2);
        Intersection {
            id: IntersectionId::new("int-test"),
            name: "Test".to_string(),
            location: Location { lat: 0.0, lng: 0.0 },
            lanes: Lanes {
                north: lane(0),
                south: lane(1),
                east: lane(2),
                west: lane(3),
            },
            mode: ControlMode::FullManual,
            status: IntersectionStatus::Online,
            total_vehicles: 40,
            estimated_wait_minutes: 3,
        }
    }

    use SignalState::{Green, Red, Yellow};

    #[test]
    fn granting_green_turns_every_other_lane_red() {
        let before = intersection([(Red, 12, 45), (Yellow, 8, 45), (Green, 5, 0), (Red, 15, 30)]);
        let after = set_lane_state(&before, Direction::West, Green);

        assert_eq!(after.lanes.west.state, Green);
        assert_eq!(after.lanes.west.wait_time_seconds, 0);
        assert_eq!(after.lanes.south.state, Red);
        assert_eq!(after.lanes.east.state, Red);
        assert_eq!(after.lanes.green_count(), 1);
        // Input snapshot is untouched.
        assert_eq!(before.lanes.east.state, Green);
        assert_eq!(before.lanes.south.state, Yellow);
    }

    #[test]
    fn non_green_assignment_keeps_wait_and_other_lanes() {
        let before = intersection([(Red, 12, 45), (Red, 8, 45), (Green, 5, 0), (Red, 15, 30)]);
        let after = set_lane_state(&before, Direction::North, Yellow);

        assert_eq!(after.lanes.north.state, Yellow);
        assert_eq!(after.lanes.north.wait_time_seconds, 45);
        assert_eq!(after.lanes.east.state, Green);

        let after = set_lane_state(&after, Direction::East, Red);
        assert_eq!(after.lanes.east.wait_time_seconds, 0);
        assert_eq!(after.lanes.green_count(), 0);
    }

    #[test]
    fn set_mode_only_replaces_mode() {
        let before = intersection([(Red, 1, 1), (Red, 2, 2), (Green, 3, 0), (Red, 4, 4)]);
        let after = set_mode(&before, ControlMode::AiAuto);
        assert_eq!(after.mode, ControlMode::AiAuto);
        assert_eq!(after.lanes, before.lanes);
        assert_eq!(after.total_vehicles, before.total_vehicles);
    }

    #[test]
    fn recommends_busiest_red_lane() {
        let i = intersection([(Red, 10, 0), (Red, 25, 0), (Green, 5, 0), (Red, 8, 0)]);
        assert_eq!(recommend(&i), Direction::South);
    }

    #[test]
    fn recommendation_ignores_green_and_yellow_lanes() {
        let i = intersection([(Red, 3, 0), (Yellow, 50, 0), (Green, 40, 0), (Red, 4, 0)]);
        assert_eq!(recommend(&i), Direction::West);
    }

    #[test]
    fn recommendation_ties_keep_enumeration_order() {
        let i = intersection([(Green, 9, 0), (Red, 7, 0), (Red, 7, 0), (Red, 7, 0)]);
        assert_eq!(recommend(&i), Direction::South);
    }

    #[test]
    fn recommendation_falls_back_to_north() {
        let all_red_empty = intersection([(Red, 0, 0), (Red, 0, 0), (Red, 0, 0), (Red, 0, 0)]);
        assert_eq!(recommend(&all_red_empty), Direction::North);

        let no_red = intersection([(Yellow, 5, 0), (Green, 6, 0), (Yellow, 7, 0), (Yellow, 8, 0)]);
        assert_eq!(recommend(&no_red), Direction::North);
    }

    #[test]
    fn drift_never_changes_signal_states() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut current = intersection([(Red, 0, 0), (Yellow, 1, 3), (Green, 2, 0), (Red, 0, 1)]);
        for _ in 0..50 {
            let next = apply_periodic_drift(&current, &mut rng);
            for direction in Direction::ALL {
                assert_eq!(next.lanes.get(direction).state, current.lanes.get(direction).state);
            }
            assert_eq!(next.lanes.east.wait_time_seconds, 0);
            assert!(next.total_vehicles >= MIN_TOTAL_VEHICLES);
            current = next;
        }
    }

    #[test]
    fn drift_moves_counts_within_bounds() {
        let mut rng = SmallRng::seed_from_u64(11);
        let before = intersection([(Red, 20, 60), (Red, 20, 60), (Green, 20, 0), (Red, 20, 60)]);
        let after = apply_periodic_drift(&before, &mut rng);
        for direction in Direction::ALL {
            let (old, new) = (before.lanes.get(direction), after.lanes.get(direction));
            let diff = new.vehicle_count as i64 - old.vehicle_count as i64;
            assert!((VEHICLE_DRIFT_MIN..=VEHICLE_DRIFT_MAX).contains(&diff));
            if !new.is_green() {
                let diff = new.wait_time_seconds as i64 - old.wait_time_seconds as i64;
                assert!((WAIT_DRIFT_MIN..=WAIT_DRIFT_MAX).contains(&diff));
            }
        }
    }

    #[test]
    fn drift_saturates_at_the_count_ceiling() {
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut before = intersection([(Red, 0, 0), (Red, 0, 0), (Green, 0, 0), (Red, 0, 0)]);
            before.lanes.north.vehicle_count = u32::MAX;
            before.lanes.west.wait_time_seconds = u32::MAX;
            before.total_vehicles = u32::MAX;
            let after = apply_periodic_drift(&before, &mut rng);
            assert!(after.lanes.north.vehicle_count >= u32::MAX - 2);
            assert!(after.lanes.west.wait_time_seconds >= u32::MAX - 5);
            assert!(after.total_vehicles >= u32::MAX - 5);
        }
    }
}
