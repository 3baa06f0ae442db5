//! Offline harness for running the keyline analysis against a serialized
//! input document.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use keyline_core::AnalysisInput;

#[derive(Parser, Debug)]
#[command(name = "keyline-test", about = "Offline keyline analysis runner")]
struct Args {
    /// Path to an analysis input JSON file
    /// ({bounds, elevationGrid, resolution, rainfallContext?}).
    #[arg(short, long)]
    input: String,

    /// Print the full analysis result instead of the stats summary.
    #[arg(long)]
    full: bool,

    /// Print only the GeoJSON feature collection.
    #[arg(long, conflicts_with = "full")]
    features: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input))?;
    let input: AnalysisInput =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.input))?;

    let result = input
        .analyze()
        .with_context(|| format!("analyzing {}", args.input))?;

    let doc = if args.full {
        serde_json::to_string_pretty(&result)?
    } else if args.features {
        serde_json::to_string_pretty(&result.feature_collection)?
    } else {
        serde_json::to_string_pretty(&result.stats)?
    };
    println!("{doc}");

    Ok(())
}
