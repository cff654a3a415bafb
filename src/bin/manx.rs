use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use uav_config::{load_mission_configs, load_vehicle_configs};
use uav_export::{results, summary};
use uav_mission_calculator::{Report, manx, plots, run_definitions, run_manx, run_mission};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fly the Manx (or a vehicle definition) through a mission and export the results"
)]
struct Cli {
    /// Vehicle definitions (YAML/TOML file or directory of TOML files)
    #[arg(long, requires = "mission")]
    vehicle: Option<PathBuf>,

    /// Vehicle name within the definitions (case-insensitive, defaults to the first)
    #[arg(long, requires = "vehicle")]
    vehicle_name: Option<String>,

    /// Mission definitions; without --vehicle the built-in Manx flies them
    #[arg(long)]
    mission: Option<PathBuf>,

    /// Mission name within the definitions (case-insensitive, defaults to the first)
    #[arg(long, requires = "mission")]
    mission_name: Option<String>,

    /// Directory receiving the CSV, the JSON summary and the charts
    #[arg(long, default_value = "artifacts")]
    output: PathBuf,

    /// Skip chart rendering
    #[arg(long)]
    no_plots: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .context("failed to install logger")?;

    let report = run(&cli)?;

    let csv_path = cli.output.join("results.csv");
    let rows = results::write_csv(&csv_path, &report.results)
        .with_context(|| format!("writing {}", csv_path.display()))?;
    let sidecar = summary::write_sidecar(
        &csv_path,
        &summary::summarize(&report.results, &report.vehicle),
    )?;
    info!(
        "wrote {} row(s) to {} and summary {}",
        rows,
        csv_path.display(),
        sidecar.display()
    );

    if !cli.no_plots {
        plots::plot_mission(&report.results, &cli.output).context("rendering charts")?;
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<Report> {
    let mission_configs = match &cli.mission {
        Some(path) => Some(
            load_mission_configs(path)
                .with_context(|| format!("loading missions from {}", path.display()))?,
        ),
        None => None,
    };
    let mission_config = match &mission_configs {
        Some(configs) => Some(uav_mission::missions::select(
            configs,
            cli.mission_name.as_deref(),
        )?),
        None => None,
    };

    let report = match (&cli.vehicle, mission_config) {
        (Some(path), Some(mission)) => {
            let vehicles = load_vehicle_configs(path)
                .with_context(|| format!("loading vehicles from {}", path.display()))?;
            let vehicle = uav_mission::vehicle::select(&vehicles, cli.vehicle_name.as_deref())?;
            run_definitions(vehicle, mission)?
        }
        (None, Some(mission)) => {
            let vehicle = manx::vehicle_setup()?;
            run_mission(&vehicle, &manx::CONFIGURATIONS, mission)?
        }
        _ => run_manx()?,
    };
    Ok(report)
}
