pub mod congestion;

pub use congestion::{
    ai_hint, congestion_percent, lane_vehicle_sum, resync_aggregates, suggests_alternate_route,
    traffic_level, TrafficLevel,
};
