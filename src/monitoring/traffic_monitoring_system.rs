use anyhow::{Context, Result};
use plotters::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::control_system::traffic_store::{lock_store, SharedStore};
use crate::coordinator::{ControlMode, Direction, IntersectionId, SignalState};
use crate::flow_analyzer::{
    ai_hint, congestion_percent, lane_vehicle_sum, suggests_alternate_route, traffic_level,
};
use crate::global_variables::{AI_ACTIONS_CSV, LANE_SAMPLES_CSV};
use crate::shared_data::{AiAction, LaneSample};

// Generic helper to append records to a CSV file, writing headers only for a new file.
fn log_to_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_exists = path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn log_lane_samples(output_dir: &Path, samples: &[LaneSample]) -> Result<()> {
    log_to_csv(&output_dir.join(LANE_SAMPLES_CSV), samples)
        .with_context(|| format!("writing {}", LANE_SAMPLES_CSV))
}

pub fn log_ai_action(output_dir: &Path, action: &AiAction) -> Result<()> {
    log_to_csv(&output_dir.join(AI_ACTIONS_CSV), std::slice::from_ref(action))
        .with_context(|| format!("writing {}", AI_ACTIONS_CSV))
}

/// Overwrites `path` with the given records.
pub fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    log_to_csv(path, records)
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

fn direction_color(direction: Direction) -> RGBColor {
    match direction {
        Direction::North => BLUE,
        Direction::South => RED,
        Direction::East => GREEN,
        Direction::West => MAGENTA,
    }
}

/// Line chart of each lane's vehicle count over the ticks of one intersection.
pub fn render_vehicle_chart(
    samples: &[LaneSample],
    intersection_id: &str,
    path: &Path,
) -> Result<()> {
    let samples: Vec<&LaneSample> = samples
        .iter()
        .filter(|s| s.intersection_id == intersection_id)
        .collect();
    let max_tick = samples.iter().map(|s| s.tick).max().unwrap_or(1).max(1);
    let max_count = samples.iter().map(|s| s.vehicle_count).max().unwrap_or(0) + 5;

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Vehicles per lane at {}", intersection_id),
            ("sans-serif", 20),
        )
        .margin(40)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..max_tick, 0..max_count)?;

    chart
        .configure_mesh()
        .x_desc("tick")
        .y_desc("vehicles")
        .draw()?;

    for direction in Direction::ALL {
        let color = direction_color(direction);
        let points: Vec<(u64, u32)> = samples
            .iter()
            .filter(|s| s.direction == direction)
            .map(|s| (s.tick, s.vehicle_count))
            .collect();
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(direction.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    log::info!("Vehicle chart for {} saved to {}", intersection_id, path.display());
    Ok(())
}

pub fn chart_path(output_dir: &Path, intersection_id: &str) -> PathBuf {
    output_dir.join(format!("vehicles_{}.png", intersection_id))
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    text: &str,
) -> io::Result<Option<String>> {
    write!(out, "{}", text)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn list_intersections<W: Write>(store: &SharedStore, out: &mut W) -> io::Result<()> {
    let snapshot = lock_store(store).snapshot();
    writeln!(out, "Intersections:")?;
    for i in &snapshot {
        let level = traffic_level(i);
        writeln!(
            out,
            "  {} {} [{}] {} vehicles, ~{} min wait, {} ({})",
            i.id,
            i.name,
            i.mode,
            i.total_vehicles,
            i.estimated_wait_minutes,
            level.label(),
            level.color()
        )?;
    }
    Ok(())
}

fn show_selected<W: Write>(store: &SharedStore, out: &mut W) -> io::Result<()> {
    // Clone under the lock so the whole view comes from one snapshot.
    let selected = lock_store(store).selected().cloned();
    let Some(i) = selected else {
        writeln!(out, "No intersection selected.")?;
        return Ok(());
    };
    let hint = ai_hint(&i);
    writeln!(out, "{} {} ({:?}, mode {})", i.id, i.name, i.status, i.mode)?;
    for lane in i.lanes.iter() {
        let marker = if hint == Some(lane.direction) { "  <- AI suggests" } else { "" };
        writeln!(
            out,
            "  {:<5} {:<6} {:>3} vehicles, waiting {}s{}",
            lane.direction, lane.state, lane.vehicle_count, lane.wait_time_seconds, marker
        )?;
    }
    writeln!(
        out,
        "  total {} (lanes {}), congestion {:.0}%, ~{} min wait",
        i.total_vehicles,
        lane_vehicle_sum(&i),
        congestion_percent(&i),
        i.estimated_wait_minutes
    )?;
    if suggests_alternate_route(&i) {
        writeln!(out, "  Consider an alternate route.")?;
    }
    Ok(())
}

fn selected_id(store: &SharedStore) -> Option<(IntersectionId, ControlMode)> {
    lock_store(store).selected().map(|i| (i.id.clone(), i.mode))
}

fn set_signal<R: BufRead, W: Write>(
    store: &SharedStore,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    let Some((id, mode)) = selected_id(store) else {
        writeln!(out, "Select an intersection first.")?;
        return Ok(());
    };
    if !mode.allows_manual_control() {
        writeln!(out, "{} is in {} mode; switch to a manual mode first.", id, mode)?;
        return Ok(());
    }
    let Some(direction) = prompt(input, out, "Direction (north/south/east/west): ")? else {
        return Ok(());
    };
    let direction = match direction.parse::<Direction>() {
        Ok(d) => d,
        Err(e) => return writeln!(out, "{}", e),
    };
    let state = prompt(input, out, "State (green/yellow/red) [green]: ")?.unwrap_or_default();
    let state = if state.is_empty() {
        SignalState::Green
    } else {
        match state.parse::<SignalState>() {
            Ok(s) => s,
            Err(e) => return writeln!(out, "{}", e),
        }
    };
    let result = lock_store(store).set_lane_state(&id, direction, state);
    match result {
        Ok(_) => writeln!(out, "{} {} set to {}.", id, direction, state),
        Err(e) => writeln!(out, "Error: {}", e),
    }
}

fn change_mode<R: BufRead, W: Write>(
    store: &SharedStore,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    let Some((id, _)) = selected_id(store) else {
        writeln!(out, "Select an intersection first.")?;
        return Ok(());
    };
    for (n, mode) in ControlMode::ALL.iter().enumerate() {
        writeln!(out, "{}. {}", n + 1, mode)?;
    }
    let Some(choice) = prompt(input, out, "Mode: ")? else {
        return Ok(());
    };
    let mode = match choice.parse::<usize>() {
        Ok(n) if (1..=ControlMode::ALL.len()).contains(&n) => ControlMode::ALL[n - 1],
        _ => match choice.parse::<ControlMode>() {
            Ok(m) => m,
            Err(e) => return writeln!(out, "{}", e),
        },
    };
    let result = lock_store(store).set_mode(&id, mode);
    match result {
        Ok(_) => writeln!(out, "{} now in {} mode.", id, mode),
        Err(e) => writeln!(out, "Error: {}", e),
    }
}

fn show_ai_log<W: Write>(store: &SharedStore, out: &mut W) -> io::Result<()> {
    let entries: Vec<AiAction> = lock_store(store).ai_log().entries().cloned().collect();
    if entries.is_empty() {
        return writeln!(out, "No AI activity yet.");
    }
    writeln!(out, "AI activity ({} entries):", entries.len())?;
    for action in entries {
        writeln!(
            out,
            "  [tick {}] {}: green for {} ({})",
            action.tick,
            action.intersection_id,
            action.direction,
            action.reason.describe()
        )?;
    }
    Ok(())
}

/// The officer console. Reads menu choices from `input` until exit or end of input.
pub fn run_console<R: BufRead, W: Write>(
    store: &SharedStore,
    mut input: R,
    mut out: W,
) -> io::Result<()> {
    loop {
        writeln!(out, "\nTraffic Signal Officer Console")?;
        writeln!(out, "1. List Intersections")?;
        writeln!(out, "2. Select Intersection")?;
        writeln!(out, "3. Show Selected Intersection")?;
        writeln!(out, "4. Set Lane Signal")?;
        writeln!(out, "5. Change Control Mode")?;
        writeln!(out, "6. Show AI Activity Log")?;
        writeln!(out, "7. Exit")?;
        let Some(choice) = prompt(&mut input, &mut out, "Enter your choice: ")? else {
            return Ok(());
        };
        match choice.parse::<u32>().unwrap_or(0) {
            1 => list_intersections(store, &mut out)?,
            2 => {
                let Some(id) = prompt(&mut input, &mut out, "Intersection id: ")? else {
                    return Ok(());
                };
                let result = lock_store(store).select(&IntersectionId::new(&id));
                match result {
                    Ok(()) => writeln!(out, "Selected {}.", id)?,
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
            }
            3 => show_selected(store, &mut out)?,
            4 => set_signal(store, &mut input, &mut out)?,
            5 => change_mode(store, &mut input, &mut out)?,
            6 => show_ai_log(store, &mut out)?,
            7 => {
                writeln!(out, "Exiting console.")?;
                return Ok(());
            }
            _ => writeln!(out, "Invalid choice. Try again.")?,
        }
    }
}

pub fn run_cli(store: SharedStore) {
    let stdin = io::stdin();
    if let Err(e) = run_console(&store, stdin.lock(), io::stdout()) {
        log::error!("Console error: {}", e);
    }
}
