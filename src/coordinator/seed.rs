use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::coordinator::types::{
    ControlMode, Direction, Intersection, IntersectionId, IntersectionStatus, Lane, Lanes,
    Location, SignalState,
};

// (state, vehicle count, wait seconds)
type LaneSeed = (SignalState, u32, u32);

fn lanes(north: LaneSeed, south: LaneSeed, east: LaneSeed, west: LaneSeed) -> Lanes {
    Lanes {
        north: Lane::new(Direction::North, north.0, north.1, north.2),
        south: Lane::new(Direction::South, south.0, south.1, south.2),
        east: Lane::new(Direction::East, east.0, east.1, east.2),
        west: Lane::new(Direction::West, west.0, west.1, west.2),
    }
}

/// The built-in demo intersections around central Bangkok.
pub fn create_intersections() -> Vec<Intersection> {
    use SignalState::{Green, Red};

    vec![
        Intersection {
            id: IntersectionId::new("int-001"),
            name: "แยกอโศก".to_string(),
            location: Location { lat: 13.7380, lng: 100.5603 },
            lanes: lanes((Red, 12, 45), (Red, 8, 45), (Green, 5, 0), (Red, 15, 30)),
            mode: ControlMode::AiAuto,
            status: IntersectionStatus::Online,
            total_vehicles: 40,
            estimated_wait_minutes: 3,
        },
        Intersection {
            id: IntersectionId::new("int-002"),
            name: "แยกสยาม".to_string(),
            location: Location { lat: 13.7461, lng: 100.5347 },
            lanes: lanes((Green, 20, 0), (Red, 10, 60), (Red, 18, 45), (Red, 7, 45)),
            mode: ControlMode::ManualWithAi,
            status: IntersectionStatus::Online,
            total_vehicles: 55,
            estimated_wait_minutes: 4,
        },
        Intersection {
            id: IntersectionId::new("int-003"),
            name: "แยกราชประสงค์".to_string(),
            location: Location { lat: 13.7468, lng: 100.5399 },
            lanes: lanes((Red, 25, 90), (Red, 22, 90), (Green, 8, 0), (Red, 12, 60)),
            mode: ControlMode::AiAuto,
            status: IntersectionStatus::Warning,
            total_vehicles: 67,
            estimated_wait_minutes: 6,
        },
        Intersection {
            id: IntersectionId::new("int-004"),
            name: "แยกพร้อมพงษ์".to_string(),
            location: Location { lat: 13.7308, lng: 100.5695 },
            lanes: lanes((Red, 5, 30), (Green, 3, 0), (Red, 8, 45), (Red, 6, 45)),
            mode: ControlMode::AiAuto,
            status: IntersectionStatus::Online,
            total_vehicles: 22,
            estimated_wait_minutes: 2,
        },
    ]
}

/// Checks the seed contract: unique ids, each lane filed under its own direction,
/// exactly one green lane per intersection and zero wait on it.
pub fn validate_seed(intersections: &[Intersection]) -> Result<()> {
    let mut seen = HashSet::new();
    for intersection in intersections {
        if !seen.insert(&intersection.id) {
            bail!("Duplicate intersection id {}", intersection.id);
        }
        for direction in Direction::ALL {
            let lane = intersection.lanes.get(direction);
            if lane.direction != direction {
                bail!(
                    "Intersection {} lists a {} lane under {}",
                    intersection.id,
                    lane.direction,
                    direction
                );
            }
        }
        let greens = intersection.lanes.green_count();
        if greens != 1 {
            bail!(
                "Intersection {} must start with exactly one green lane, found {}",
                intersection.id,
                greens
            );
        }
        for lane in intersection.lanes.iter().filter(|l| l.is_green()) {
            if lane.wait_time_seconds != 0 {
                bail!(
                    "Intersection {}: green {} lane has wait {}s, expected 0",
                    intersection.id,
                    lane.direction,
                    lane.wait_time_seconds
                );
            }
        }
    }
    Ok(())
}

/// Loads a JSON seed file (same shape as the built-in set) and validates it.
pub fn load_seed_file(path: &Path) -> Result<Vec<Intersection>> {
    let file = File::open(path).with_context(|| format!("opening seed file {}", path.display()))?;
    let intersections: Vec<Intersection> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing seed file {}", path.display()))?;
    validate_seed(&intersections)
        .with_context(|| format!("invalid seed file {}", path.display()))?;
    Ok(intersections)
}
