mod data;
mod report;
mod state;

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use report::Focus;
use state::SessionState;

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(about = "Render dashboard analytics for a cybersecurity incident dataset.")]
struct Args {
    /// Incident dataset (.csv, .json, or .parquet).
    data: PathBuf,

    /// Inclusive year range filter, e.g. `2018:2022`. Defaults to the
    /// dataset's full span.
    #[arg(long, value_parser = parse_year_range)]
    years: Option<(i32, i32)>,

    /// Restrict to one country (default: all countries).
    #[arg(long)]
    country: Option<String>,

    /// Restrict to these attack types (repeatable; default: no restriction).
    #[arg(long = "attack-type")]
    attack_types: Vec<String>,

    /// Attack type highlighted in the per-attack sections (default: most
    /// common in the current view).
    #[arg(long)]
    focus_attack: Option<String>,

    /// Target industry highlighted in the per-industry section.
    #[arg(long)]
    focus_industry: Option<String>,

    /// Attack source highlighted in the per-source sections.
    #[arg(long)]
    focus_source: Option<String>,

    /// Year for the per-year cross-tabs (default: first year in the dataset).
    #[arg(long)]
    focus_year: Option<i32>,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn parse_year_range(s: &str) -> Result<(i32, i32), String> {
    let (lo, hi) = s
        .split_once(':')
        .ok_or_else(|| format!("expected MIN:MAX, got '{s}'"))?;
    let lo: i32 = lo.trim().parse().map_err(|_| format!("bad year '{lo}'"))?;
    let hi: i32 = hi.trim().parse().map_err(|_| format!("bad year '{hi}'"))?;
    if lo > hi {
        return Err(format!("empty year range {lo}:{hi}"));
    }
    Ok((lo, hi))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dataset = data::loader::load_file(&args.data)
        .with_context(|| format!("loading {}", args.data.display()))?;
    if dataset.is_empty() {
        bail!("dataset contains no records");
    }
    log::info!(
        "Loaded {} incidents across {} countries, years {:?}",
        dataset.len(),
        dataset.countries.len(),
        dataset.year_span
    );

    if let Some(country) = &args.country {
        if !dataset.countries.contains(country) {
            log::warn!("country '{country}' does not occur in the dataset");
        }
    }
    for attack_type in &args.attack_types {
        if !dataset.attack_types.contains(attack_type) {
            log::warn!("attack type '{attack_type}' does not occur in the dataset");
        }
    }

    let mut state = SessionState::default();
    state.set_dataset(dataset);
    if let Some(years) = args.years {
        state.set_year_range(years);
    }
    if args.country.is_some() {
        state.set_country(args.country.clone());
    }
    if !args.attack_types.is_empty() {
        state.set_attack_types(args.attack_types.iter().cloned().collect::<BTreeSet<_>>());
    }

    let focus = Focus {
        attack_type: args.focus_attack,
        industry: args.focus_industry,
        source: args.focus_source,
        year: args.focus_year,
    };
    let dashboard = report::build(&state, &focus);

    match args.format {
        OutputFormat::Text => print!("{}", report::render_text(&dashboard)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
    }
    Ok(())
}
