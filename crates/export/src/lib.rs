//! Export helpers for mission results: a flat CSV table with one row per
//! control point and a JSON summary sidecar.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub mod results {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    use serde::{Deserialize, Serialize};
    use uav_core::units::rad_to_deg;
    use uav_mission::{ControlPointState, Results};

    use crate::ExportError;

    /// Create a writer for the target path, handling stdout (`-`) by convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    /// CSV row for one control point. Propeller and motor columns describe the
    /// first propulsor group.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Record {
        pub segment: String,
        pub time_s: f64,
        pub distance_m: f64,
        pub altitude_m: f64,
        pub air_speed_m_s: f64,
        pub mach: f64,
        pub density_kg_m3: f64,
        pub pressure_pa: f64,
        pub temperature_k: f64,
        pub speed_of_sound_m_s: f64,
        pub gravity_m_s2: f64,
        pub angle_of_attack_deg: f64,
        pub lift_coefficient: f64,
        pub drag_coefficient: f64,
        pub parasite_drag_coefficient: f64,
        pub induced_drag_coefficient: f64,
        pub drag_increment: f64,
        pub lift_to_drag: f64,
        pub lift_n: f64,
        pub drag_n: f64,
        pub thrust_n: f64,
        pub throttle: f64,
        pub battery_energy_j: f64,
        pub state_of_charge: f64,
        pub voltage_open_circuit_v: f64,
        pub voltage_under_load_v: f64,
        pub battery_current_a: f64,
        pub battery_power_w: f64,
        pub cell_voltage_v: f64,
        pub cell_current_a: f64,
        pub cell_charge_ah: f64,
        pub propeller_rpm: f64,
        pub propeller_thrust_n: f64,
        pub propeller_torque_nm: f64,
        pub propeller_thrust_coefficient: f64,
        pub propeller_power_coefficient: f64,
        pub propeller_tip_mach: f64,
        pub propeller_efficiency: f64,
        pub motor_torque_nm: f64,
        pub motor_current_a: f64,
        pub motor_efficiency: f64,
        pub residual_norm: f64,
        pub iterations: usize,
    }

    impl Record {
        pub fn from_point(segment: &str, point: &ControlPointState) -> Self {
            let group = point.propulsors.first();
            let prop = group.map(|g| g.propeller).unwrap_or_default();
            let motor = group.map(|g| g.motor).unwrap_or_default();
            let atmo = &point.atmosphere;
            let battery = &point.battery;
            Self {
                segment: segment.to_string(),
                time_s: point.time,
                distance_m: point.distance,
                altitude_m: point.altitude,
                air_speed_m_s: point.air_speed,
                mach: point.mach,
                density_kg_m3: atmo.density,
                pressure_pa: atmo.pressure,
                temperature_k: atmo.temperature,
                speed_of_sound_m_s: atmo.speed_of_sound,
                gravity_m_s2: atmo.gravity,
                angle_of_attack_deg: rad_to_deg(point.angle_of_attack),
                lift_coefficient: point.lift_coefficient,
                drag_coefficient: point.drag.total,
                parasite_drag_coefficient: point.drag.parasite_total,
                induced_drag_coefficient: point.drag.induced,
                drag_increment: point.drag.increment,
                lift_to_drag: point.lift_to_drag(),
                lift_n: point.lift,
                drag_n: point.drag_force,
                thrust_n: point.thrust,
                throttle: point.throttle,
                battery_energy_j: battery.energy,
                state_of_charge: battery.state_of_charge,
                voltage_open_circuit_v: battery.voltage_open_circuit,
                voltage_under_load_v: battery.voltage_under_load,
                battery_current_a: battery.current,
                battery_power_w: battery.power_draw,
                cell_voltage_v: battery.cell_voltage,
                cell_current_a: battery.cell_current,
                cell_charge_ah: battery.cell_charge_throughput,
                propeller_rpm: prop.rpm,
                propeller_thrust_n: prop.thrust,
                propeller_torque_nm: prop.torque,
                propeller_thrust_coefficient: prop.thrust_coefficient,
                propeller_power_coefficient: prop.power_coefficient,
                propeller_tip_mach: prop.tip_mach,
                propeller_efficiency: prop.efficiency,
                motor_torque_nm: motor.torque,
                motor_current_a: motor.current,
                motor_efficiency: motor.efficiency,
                residual_norm: point.residual_norm,
                iterations: point.iterations,
            }
        }
    }

    /// Flatten every control point of `results` in flight order.
    pub fn records(results: &Results) -> Vec<Record> {
        results
            .segments
            .iter()
            .flat_map(|s| s.points.iter().map(move |p| Record::from_point(&s.tag, p)))
            .collect()
    }

    /// Write a header row followed by `records`.
    pub fn write_records(writer: &mut dyn Write, records: &[Record]) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        for record in records {
            csv.serialize(record)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn write_csv(path: &Path, results: &Results) -> Result<usize, ExportError> {
        let rows = records(results);
        let mut writer = writer_for_path(path)?;
        write_records(&mut writer, &rows)?;
        Ok(rows.len())
    }

    pub fn read_records(path: &Path) -> Result<Vec<Record>, ExportError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut out = Vec::new();
        for row in reader.deserialize() {
            out.push(row?);
        }
        Ok(out)
    }
}

pub mod summary {
    use std::fs::{self, File};
    use std::path::{Path, PathBuf};

    use chrono::NaiveDateTime;
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use uav_core::units::j_to_wh;
    use uav_mission::{Results, SegmentResults};

    use crate::ExportError;

    #[derive(Debug, Clone, Serialize)]
    pub struct SegmentSummary {
        pub tag: String,
        pub start_time: NaiveDateTime,
        pub control_points: usize,
        pub duration_s: f64,
        pub distance_m: f64,
        pub energy_start_j: f64,
        pub energy_end_j: f64,
        pub energy_used_wh: f64,
        pub final_state_of_charge: f64,
        pub max_throttle: f64,
        pub max_power_w: f64,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct MissionSummary {
        pub mission: String,
        pub vehicle: String,
        pub control_points: usize,
        pub energy_used_wh: f64,
        pub final_state_of_charge: f64,
        pub segments: Vec<SegmentSummary>,
    }

    fn segment_summary(segment: &SegmentResults) -> SegmentSummary {
        let first = segment.points.first();
        let last = segment.points.last();
        let span = |f: fn(&uav_mission::ControlPointState) -> f64| {
            last.map(f).unwrap_or_default() - first.map(f).unwrap_or_default()
        };
        let energy_start_j = first.map_or(0.0, |p| p.battery.energy);
        let energy_end_j = last.map_or(0.0, |p| p.battery.energy);
        SegmentSummary {
            tag: segment.tag.clone(),
            start_time: segment.start_time,
            control_points: segment.points.len(),
            duration_s: span(|p| p.time),
            distance_m: span(|p| p.distance),
            energy_start_j,
            energy_end_j,
            energy_used_wh: j_to_wh(energy_start_j - energy_end_j),
            final_state_of_charge: last.map_or(0.0, |p| p.battery.state_of_charge),
            max_throttle: segment.points.iter().map(|p| p.throttle).fold(0.0, f64::max),
            max_power_w: segment
                .points
                .iter()
                .map(|p| p.battery.power_draw)
                .fold(0.0, f64::max),
        }
    }

    pub fn summarize(results: &Results, vehicle: &str) -> MissionSummary {
        let segments: Vec<SegmentSummary> = results.segments.iter().map(segment_summary).collect();
        MissionSummary {
            mission: results.mission.clone(),
            vehicle: vehicle.to_string(),
            control_points: results.control_point_count(),
            energy_used_wh: segments.iter().map(|s| s.energy_used_wh).sum(),
            final_state_of_charge: segments.last().map_or(0.0, |s| s.final_state_of_charge),
            segments,
        }
    }

    /// Write `<stem>_summary.json` next to the CSV at `output`.
    pub fn write_sidecar(output: &Path, summary: &MissionSummary) -> Result<PathBuf, ExportError> {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("results");
        let path = parent.join(format!("{stem}_summary.json"));
        to_writer_pretty(File::create(&path)?, summary)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::results::{read_records, records, write_csv};
    use super::summary::{summarize, write_sidecar};
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;
    use uav_analyses::DragBreakdown;
    use uav_mission::{BatteryState, ControlPointState, Results, SegmentResults};

    fn point(time: f64, energy: f64) -> ControlPointState {
        ControlPointState {
            time,
            distance: 12.0 * time,
            altitude: 120.0,
            air_speed: 12.0,
            mach: 0.035,
            atmosphere: Default::default(),
            angle_of_attack: 0.1,
            lift_coefficient: 0.6,
            drag: DragBreakdown {
                total: 0.03,
                ..Default::default()
            },
            lift: 30.0,
            drag_force: 1.2,
            thrust: 1.2,
            throttle: 0.4,
            battery: BatteryState {
                energy,
                state_of_charge: energy / 1_000.0,
                power_draw: 20.0,
                ..Default::default()
            },
            propulsors: Vec::new(),
            residual_norm: 1e-10,
            iterations: 4,
        }
    }

    fn results() -> Results {
        Results {
            mission: "survey".into(),
            segments: vec![SegmentResults {
                tag: "Cruise".into(),
                start_time: NaiveDateTime::default(),
                latitude: 0.0,
                longitude: 0.0,
                points: vec![point(0.0, 900.0), point(10.0, 700.0), point(20.0, 500.0)],
            }],
        }
    }

    #[test]
    fn csv_round_trips_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.csv");
        let written = write_csv(&path, &results()).unwrap();
        assert_eq!(written, 3);

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("segment,time_s,distance_m,"));

        let back = read_records(&path).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back, records(&results()));
        assert_relative_eq!(back[1].angle_of_attack_deg, 0.1_f64.to_degrees(), epsilon = 1e-9);
    }

    #[test]
    fn sidecar_summarizes_energy_use() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("results.csv");
        let summary = summarize(&results(), "manx");
        assert_eq!(summary.control_points, 3);
        assert_relative_eq!(summary.energy_used_wh, 400.0 / 3_600.0, epsilon = 1e-12);
        assert_relative_eq!(summary.segments[0].duration_s, 20.0);
        assert_relative_eq!(summary.final_state_of_charge, 0.5);

        let path = write_sidecar(&csv, &summary).unwrap();
        assert_eq!(path, dir.path().join("results_summary.json"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["vehicle"], "manx");
        assert_eq!(json["segments"][0]["control_points"], 3);
    }
}
