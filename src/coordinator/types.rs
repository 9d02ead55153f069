use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique, stable identifier for an intersection (e.g. "int-001").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntersectionId(pub String);

impl IntersectionId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the four approaches to an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Enumeration order. Recommendation ties are broken by this order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            "west" | "w" => Ok(Direction::West),
            other => anyhow::bail!("unknown direction '{}'", other),
        }
    }
}

/// Possible states of a lane's signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Red,
    Yellow,
    Green,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::Red => "red",
            SignalState::Yellow => "yellow",
            SignalState::Green => "green",
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SignalState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(SignalState::Red),
            "yellow" | "y" => Ok(SignalState::Yellow),
            "green" | "g" => Ok(SignalState::Green),
            other => anyhow::bail!("unknown signal state '{}'", other),
        }
    }
}

/// Operating policy of an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlMode {
    /// The AI controller switches signals on its own.
    AiAuto,
    /// The officer switches signals; the AI recommendation is shown as a hint.
    ManualWithAi,
    /// The officer switches signals with no hints.
    FullManual,
}

impl ControlMode {
    pub const ALL: [ControlMode; 3] = [
        ControlMode::AiAuto,
        ControlMode::ManualWithAi,
        ControlMode::FullManual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::AiAuto => "ai-auto",
            ControlMode::ManualWithAi => "manual-with-ai",
            ControlMode::FullManual => "full-manual",
        }
    }

    /// Whether the console offers manual signal buttons in this mode.
    pub fn allows_manual_control(&self) -> bool {
        matches!(self, ControlMode::ManualWithAi | ControlMode::FullManual)
    }

    pub fn shows_ai_hints(&self) -> bool {
        *self == ControlMode::ManualWithAi
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ControlMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai-auto" | "auto" => Ok(ControlMode::AiAuto),
            "manual-with-ai" | "assisted" => Ok(ControlMode::ManualWithAi),
            "full-manual" | "manual" => Ok(ControlMode::FullManual),
            other => anyhow::bail!("unknown control mode '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntersectionStatus {
    Online,
    Offline,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// One directional approach to an intersection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lane {
    pub direction: Direction,
    pub state: SignalState,
    /// Vehicles currently queued on this approach.
    pub vehicle_count: u32,
    /// Seconds the queue has been waiting. Always 0 while green.
    #[serde(rename = "waitTime")]
    pub wait_time_seconds: u32,
}

impl Lane {
    pub fn new(direction: Direction, state: SignalState, vehicle_count: u32, wait: u32) -> Self {
        Self {
            direction,
            state,
            vehicle_count,
            wait_time_seconds: wait,
        }
    }

    pub fn is_green(&self) -> bool {
        self.state == SignalState::Green
    }
}

/// Exactly one lane per direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lanes {
    pub north: Lane,
    pub south: Lane,
    pub east: Lane,
    pub west: Lane,
}

impl Lanes {
    pub fn get(&self, direction: Direction) -> &Lane {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
            Direction::East => &self.east,
            Direction::West => &self.west,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut Lane {
        match direction {
            Direction::North => &mut self.north,
            Direction::South => &mut self.south,
            Direction::East => &mut self.east,
            Direction::West => &mut self.west,
        }
    }

    /// Lanes in enumeration order (north, south, east, west).
    pub fn iter(&self) -> impl Iterator<Item = &Lane> {
        Direction::ALL.into_iter().map(move |d| self.get(d))
    }

    pub fn green_count(&self) -> usize {
        self.iter().filter(|lane| lane.is_green()).count()
    }

    pub fn green_direction(&self) -> Option<Direction> {
        self.iter().find(|lane| lane.is_green()).map(|lane| lane.direction)
    }
}

/// A signalised intersection with its four lanes and display aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intersection {
    pub id: IntersectionId,
    pub name: String,
    pub location: Location,
    pub lanes: Lanes,
    pub mode: ControlMode,
    pub status: IntersectionStatus,
    /// Display aggregate. Not necessarily the sum of lane counts.
    pub total_vehicles: u32,
    pub estimated_wait_minutes: u32,
}
