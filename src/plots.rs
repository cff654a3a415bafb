//! Standard result charts. Each chart stacks a few panels against mission
//! time and is drawn from the flat export records, so charts can be rendered
//! from a finished run or from a CSV exported earlier.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{debug, info};
use plotters::prelude::*;
use thiserror::Error;
use uav_export::results::{Record, records};
use uav_mission::Results;

const WIDTH: u32 = 1000;
const PANEL_HEIGHT: u32 = 260;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("nothing to plot: results have no control points")]
    NoData,
    #[error("failed to prepare output directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("drawing failed: {0}")]
    Drawing(String),
}

impl<E> From<DrawingAreaErrorKind<E>> for PlotError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Drawing(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    FlightConditions,
    AerodynamicCoefficients,
    DragComponents,
    AircraftVelocities,
    BatteryPack,
    BatteryCells,
    PropellerConditions,
    Efficiencies,
}

struct Panel {
    axis: &'static str,
    series: Vec<Series>,
}

type Series = (&'static str, fn(&Record) -> f64);

fn panel(axis: &'static str, series: Vec<Series>) -> Panel {
    Panel { axis, series }
}

fn series(name: &'static str, value: fn(&Record) -> f64) -> Series {
    (name, value)
}

impl Chart {
    pub const ALL: [Chart; 8] = [
        Chart::FlightConditions,
        Chart::AerodynamicCoefficients,
        Chart::DragComponents,
        Chart::AircraftVelocities,
        Chart::BatteryPack,
        Chart::BatteryCells,
        Chart::PropellerConditions,
        Chart::Efficiencies,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Chart::FlightConditions => "flight_conditions.png",
            Chart::AerodynamicCoefficients => "aerodynamic_coefficients.png",
            Chart::DragComponents => "drag_components.png",
            Chart::AircraftVelocities => "aircraft_velocities.png",
            Chart::BatteryPack => "battery_pack_conditions.png",
            Chart::BatteryCells => "battery_cell_conditions.png",
            Chart::PropellerConditions => "propeller_conditions.png",
            Chart::Efficiencies => "electric_efficiencies.png",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Chart::FlightConditions => "Flight Conditions",
            Chart::AerodynamicCoefficients => "Aerodynamic Coefficients",
            Chart::DragComponents => "Drag Components",
            Chart::AircraftVelocities => "Aircraft Velocities",
            Chart::BatteryPack => "Battery Pack Conditions",
            Chart::BatteryCells => "Battery Cell Conditions",
            Chart::PropellerConditions => "Propeller Conditions",
            Chart::Efficiencies => "Electric Motor and Propeller Efficiencies",
        }
    }

    fn panels(self) -> Vec<Panel> {
        match self {
            Chart::FlightConditions => vec![
                panel("Altitude (m)", vec![series("altitude", |r| r.altitude_m)]),
                panel("Air speed (m/s)", vec![series("air speed", |r| r.air_speed_m_s)]),
                panel("Distance (km)", vec![series("distance", |r| r.distance_m / 1_000.0)]),
                panel("Throttle", vec![series("throttle", |r| r.throttle)]),
            ],
            Chart::AerodynamicCoefficients => vec![
                panel("CL", vec![series("lift coefficient", |r| r.lift_coefficient)]),
                panel("CD", vec![series("drag coefficient", |r| r.drag_coefficient)]),
                panel("AoA (deg)", vec![series("angle of attack", |r| r.angle_of_attack_deg)]),
                panel("L/D", vec![series("lift to drag", |r| r.lift_to_drag)]),
            ],
            Chart::DragComponents => vec![panel(
                "CD",
                vec![
                    series("parasite", |r| r.parasite_drag_coefficient),
                    series("induced", |r| r.induced_drag_coefficient),
                    series("increment", |r| r.drag_increment),
                    series("total", |r| r.drag_coefficient),
                ],
            )],
            Chart::AircraftVelocities => vec![
                panel(
                    "Speed (m/s)",
                    vec![
                        series("true air speed", |r| r.air_speed_m_s),
                        series("equivalent air speed", equivalent_air_speed),
                    ],
                ),
                panel("Mach", vec![series("mach", |r| r.mach)]),
                panel("Dynamic pressure (Pa)", vec![series("q", |r| {
                    0.5 * r.density_kg_m3 * r.air_speed_m_s * r.air_speed_m_s
                })]),
            ],
            Chart::BatteryPack => vec![
                panel("Energy (Wh)", vec![series("energy", |r| r.battery_energy_j / 3_600.0)]),
                panel("State of charge", vec![series("SOC", |r| r.state_of_charge)]),
                panel(
                    "Voltage (V)",
                    vec![
                        series("open circuit", |r| r.voltage_open_circuit_v),
                        series("under load", |r| r.voltage_under_load_v),
                    ],
                ),
                panel("Current (A)", vec![series("current", |r| r.battery_current_a)]),
                panel("Power (W)", vec![series("power", |r| r.battery_power_w)]),
            ],
            Chart::BatteryCells => vec![
                panel("Cell voltage (V)", vec![series("voltage", |r| r.cell_voltage_v)]),
                panel("Cell current (A)", vec![series("current", |r| r.cell_current_a)]),
                panel("Charge throughput (Ah)", vec![series("charge", |r| r.cell_charge_ah)]),
            ],
            Chart::PropellerConditions => vec![
                panel("RPM", vec![series("rpm", |r| r.propeller_rpm)]),
                panel("Thrust (N)", vec![series("thrust", |r| r.propeller_thrust_n)]),
                panel("Torque (N·m)", vec![series("torque", |r| r.propeller_torque_nm)]),
                panel(
                    "Coefficient",
                    vec![
                        series("Ct", |r| r.propeller_thrust_coefficient),
                        series("Cp", |r| r.propeller_power_coefficient),
                    ],
                ),
                panel("Tip Mach", vec![series("tip mach", |r| r.propeller_tip_mach)]),
            ],
            Chart::Efficiencies => vec![
                panel(
                    "Propeller efficiency",
                    vec![series("propeller", |r| r.propeller_efficiency)],
                ),
                panel("Motor efficiency", vec![series("motor", |r| r.motor_efficiency)]),
            ],
        }
    }
}

fn equivalent_air_speed(r: &Record) -> f64 {
    r.air_speed_m_s * (r.density_kg_m3 / uav_core::constants::SEA_LEVEL_DENSITY).sqrt()
}

fn select_font_family() -> FontFamily<'static> {
    if cfg!(target_os = "macos") {
        FontFamily::Name("Helvetica")
    } else if cfg!(target_os = "windows") {
        FontFamily::Name("Arial")
    } else {
        FontFamily::Name("DejaVu Sans")
    }
}

/// Axis range covering `values`, padded so flat series stay visible.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi - lo > 1e-9 * hi.abs().max(1.0) {
        0.05 * (hi - lo)
    } else {
        0.05 * lo.abs().max(1.0)
    };
    (lo - pad)..(hi + pad)
}

/// Consecutive runs of records belonging to the same segment.
fn by_segment(rows: &[Record]) -> Vec<&[Record]> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        if i == rows.len() || rows[i].segment != rows[start].segment {
            out.push(&rows[start..i]);
            start = i;
        }
    }
    out
}

/// Draw `chart` from `rows` into `dir`, returning the PNG path.
pub fn render(chart: Chart, rows: &[Record], dir: &Path) -> Result<PathBuf, PlotError> {
    if rows.is_empty() {
        return Err(PlotError::NoData);
    }
    fs::create_dir_all(dir)?;
    let path = dir.join(chart.file_name());
    draw(chart, rows, &path)?;
    debug!("wrote {}", path.display());
    Ok(path)
}

fn draw(chart: Chart, rows: &[Record], path: &Path) -> Result<(), PlotError> {
    let panels = chart.panels();

    let font_family = select_font_family();
    let caption_font = FontDesc::new(font_family, 24.0, FontStyle::Bold);
    let label_font = FontDesc::new(font_family, 15.0, FontStyle::Normal);

    let height = PANEL_HEIGHT * panels.len() as u32 + 40;
    let root = BitMapBackend::new(path, (WIDTH, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(chart.title(), caption_font)?;
    let areas = root.split_evenly((panels.len(), 1));

    let first = rows[0].time_s / 60.0;
    let last = rows[rows.len() - 1].time_s / 60.0;
    let minutes = first..last.max(first + 1e-6);
    let segments = by_segment(rows);

    for (area, panel) in areas.iter().zip(&panels) {
        let values = panel
            .series
            .iter()
            .flat_map(|(_, value)| rows.iter().map(value));
        let mut plot = ChartBuilder::on(area)
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(minutes.clone(), padded_range(values))?;
        plot.configure_mesh()
            .x_desc("Time (min)")
            .y_desc(panel.axis)
            .label_style(label_font.clone())
            .axis_desc_style(label_font.clone())
            .x_labels(8)
            .y_labels(5)
            .draw()?;

        for (index, (name, value)) in panel.series.iter().enumerate() {
            let color = Palette99::pick(index).to_rgba();
            for (n, segment) in segments.iter().enumerate() {
                let line = segment.iter().map(|r| (r.time_s / 60.0, value(r)));
                let style = ShapeStyle::from(&color).stroke_width(2);
                let drawn = plot.draw_series(LineSeries::new(line, style))?;
                if n == 0 {
                    drawn.label(*name).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], ShapeStyle::from(&color))
                    });
                }
            }
        }
        if panel.series.len() > 1 {
            plot.configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font(label_font.clone())
                .draw()?;
        }
    }

    root.present()?;
    Ok(())
}

/// Draw every chart from exported records.
pub fn plot_records(rows: &[Record], dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    let paths = Chart::ALL
        .iter()
        .map(|chart| render(*chart, rows, dir))
        .collect::<Result<Vec<_>, _>>()?;
    info!("{} chart(s) written to {}", paths.len(), dir.display());
    Ok(paths)
}

pub fn plot_flight_conditions(results: &Results, dir: &Path) -> Result<PathBuf, PlotError> {
    render(Chart::FlightConditions, &records(results), dir)
}

pub fn plot_aerodynamic_coefficients(results: &Results, dir: &Path) -> Result<PathBuf, PlotError> {
    render(Chart::AerodynamicCoefficients, &records(results), dir)
}

pub fn plot_drag_components(results: &Results, dir: &Path) -> Result<PathBuf, PlotError> {
    render(Chart::DragComponents, &records(results), dir)
}

pub fn plot_aircraft_velocities(results: &Results, dir: &Path) -> Result<PathBuf, PlotError> {
    render(Chart::AircraftVelocities, &records(results), dir)
}

pub fn plot_battery_pack_conditions(results: &Results, dir: &Path) -> Result<PathBuf, PlotError> {
    render(Chart::BatteryPack, &records(results), dir)
}

pub fn plot_battery_cell_conditions(results: &Results, dir: &Path) -> Result<PathBuf, PlotError> {
    render(Chart::BatteryCells, &records(results), dir)
}

pub fn plot_propeller_conditions(results: &Results, dir: &Path) -> Result<PathBuf, PlotError> {
    render(Chart::PropellerConditions, &records(results), dir)
}

pub fn plot_electric_motor_and_propeller_efficiencies(
    results: &Results,
    dir: &Path,
) -> Result<PathBuf, PlotError> {
    render(Chart::Efficiencies, &records(results), dir)
}

/// All eight charts of one mission.
pub fn plot_mission(results: &Results, dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    plot_records(&records(results), dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(segment: &str, time_s: f64) -> Record {
        Record {
            segment: segment.to_string(),
            time_s,
            distance_m: 0.0,
            altitude_m: 120.0,
            air_speed_m_s: 12.0,
            mach: 0.035,
            density_kg_m3: 1.21,
            pressure_pa: 99_900.0,
            temperature_k: 287.4,
            speed_of_sound_m_s: 339.9,
            gravity_m_s2: 9.806,
            angle_of_attack_deg: 2.0,
            lift_coefficient: 0.6,
            drag_coefficient: 0.03,
            parasite_drag_coefficient: 0.02,
            induced_drag_coefficient: 0.01,
            drag_increment: 0.0,
            lift_to_drag: 20.0,
            lift_n: 31.7,
            drag_n: 1.6,
            thrust_n: 1.6,
            throttle: 0.4,
            battery_energy_j: 200_000.0,
            state_of_charge: 0.25,
            voltage_open_circuit_v: 10.8,
            voltage_under_load_v: 10.7,
            battery_current_a: 3.0,
            battery_power_w: 32.0,
            cell_voltage_v: 3.6,
            cell_current_a: 1.0,
            cell_charge_ah: 0.01,
            propeller_rpm: 5_000.0,
            propeller_thrust_n: 0.8,
            propeller_torque_nm: 0.02,
            propeller_thrust_coefficient: 0.08,
            propeller_power_coefficient: 0.05,
            propeller_tip_mach: 0.18,
            propeller_efficiency: 0.7,
            motor_torque_nm: 0.02,
            motor_current_a: 1.5,
            motor_efficiency: 0.8,
            residual_norm: 1e-10,
            iterations: 4,
        }
    }

    #[test]
    fn flat_series_get_a_visible_range() {
        let range = padded_range([5.0, 5.0].into_iter());
        assert!(range.start < 5.0 && range.end > 5.0);
        assert_eq!(padded_range(std::iter::empty::<f64>()), 0.0..1.0);
    }

    #[test]
    fn records_split_at_segment_changes() {
        let rows = vec![row("climb", 0.0), row("climb", 1.0), row("cruise", 2.0)];
        let runs = by_segment(&rows);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1][0].segment, "cruise");
    }

    #[test]
    fn empty_results_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = render(Chart::DragComponents, &[], dir.path()).unwrap_err();
        assert!(matches!(err, PlotError::NoData));
    }

    #[test]
    fn render_returns_the_written_chart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rows = vec![row("climb", 0.0), row("climb", 60.0), row("cruise", 120.0)];
        let path = render(Chart::BatteryPack, &rows, dir.path()).expect("render");
        assert_eq!(path, dir.path().join(Chart::BatteryPack.file_name()));
        assert!(fs::metadata(&path).expect("chart exists").len() > 0);
    }

    #[test]
    fn every_chart_has_a_distinct_file() {
        let mut names: Vec<_> = Chart::ALL.iter().map(|c| c.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 8);
    }
}
