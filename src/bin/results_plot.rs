use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use uav_export::results::read_records;
use uav_mission_calculator::plots::{Chart, plot_records, render};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render mission charts from an exported results CSV")]
struct Cli {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "artifacts")]
    output: PathBuf,
    /// Render a single chart by file stem (e.g. `battery_pack_conditions`)
    #[arg(long)]
    chart: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let rows = read_records(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    if rows.is_empty() {
        return Err(anyhow::anyhow!(
            "No control points in {}",
            cli.input.display()
        ));
    }

    let written = match cli.chart.as_deref() {
        Some(stem) => {
            let chart = Chart::ALL
                .into_iter()
                .find(|c| c.file_name().trim_end_matches(".png") == stem)
                .ok_or_else(|| anyhow::anyhow!("Unknown chart '{}'", stem))?;
            vec![render(chart, &rows, &cli.output)?]
        }
        None => plot_records(&rows, &cli.output)?,
    };
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
