//! Refugia CLI - Command-line driver for spatial resistance-evolution
//! simulations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use refugia::analysis::mean_allele_frequency;
use refugia::genotype::Genotype;
use refugia::simulation::{load_scenario, DemeDensities, Scenario, TwoDTorus};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Refugia - spatial resistance-evolution simulator
#[derive(Parser, Debug)]
#[command(name = "refugia")]
#[command(author, version, about = "Spatial resistance-evolution simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulation scenario
    Run {
        /// Path to the scenario JSON file
        scenario: PathBuf,

        /// Write the JSON report here instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the scenario's generation count
        #[arg(short, long)]
        generations: Option<usize>,
    },

    /// Load a scenario and report whether it is valid
    Validate {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },
}

/// Metapopulation state recorded at one generation.
#[derive(Debug, Serialize)]
struct Snapshot {
    /// Completed generations at the time of recording
    generation: usize,
    /// Summed density over the whole grid
    total_density: f64,
    /// Metapopulation-wide frequency per allele identifier
    /// (null for an extinct metapopulation)
    allele_frequencies: Vec<Option<f64>>,
    /// Per-deme coordinates and genotype densities
    demes: Vec<DemeDensities>,
}

/// Full report of one simulation run.
#[derive(Debug, Serialize)]
struct RunReport {
    /// Generations simulated
    generations: usize,
    /// Genotype table in slash notation ("0/1"), index-aligned with
    /// every density vector in the report
    genotypes: Vec<String>,
    /// Recorded snapshots, oldest first; always includes the final state
    snapshots: Vec<Snapshot>,
}

fn n_alleles(genotypes: &[Genotype]) -> usize {
    genotypes
        .iter()
        .map(|g| g.max_allele() as usize + 1)
        .max()
        .unwrap_or(0)
}

fn take_snapshot(torus: &TwoDTorus) -> Snapshot {
    let allele_frequencies = (0..n_alleles(torus.genotypes()))
        .map(|a| mean_allele_frequency(torus, a as u32))
        .collect();
    Snapshot {
        generation: torus.generation(),
        total_density: torus.total_density(),
        allele_frequencies,
        demes: torus.genotype_densities(),
    }
}

fn run_scenario(scenario: &Scenario, generations_override: Option<usize>) -> Result<RunReport> {
    let mut torus = scenario
        .build_torus()
        .context("Failed to build metapopulation from scenario")?;

    let generations = generations_override.unwrap_or(scenario.simulation.generations);
    let cadence = scenario.simulation.snapshot_every;

    let mut snapshots = vec![take_snapshot(&torus)];
    for g in 1..=generations {
        torus
            .step()
            .with_context(|| format!("Generation {g} failed"))?;
        let due = cadence.is_some_and(|every| every > 0 && g % every == 0);
        if due || g == generations {
            snapshots.push(take_snapshot(&torus));
        }
    }

    Ok(RunReport {
        generations,
        genotypes: torus.genotypes().iter().map(Genotype::to_string).collect(),
        snapshots,
    })
}

fn print_summary(report: &RunReport) {
    println!("Simulated {} generations", report.generations);
    println!("Genotypes: {}", report.genotypes.join(", "));
    for snapshot in &report.snapshots {
        let freqs: Vec<String> = snapshot
            .allele_frequencies
            .iter()
            .enumerate()
            .map(|(a, f)| match f {
                Some(f) => format!("p({a}) = {f:.4}"),
                None => format!("p({a}) = extinct"),
            })
            .collect();
        println!(
            "  generation {:>5}  total density {:.4}  {}",
            snapshot.generation,
            snapshot.total_density,
            freqs.join("  ")
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            output,
            generations,
        } => {
            let scenario = load_scenario(&scenario)
                .with_context(|| format!("Failed to load scenario {}", scenario.display()))?;
            let report = run_scenario(&scenario, generations)?;

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let mut writer = BufWriter::new(file);
                    serde_json::to_writer_pretty(&mut writer, &report)
                        .context("Failed to serialize report")?;
                    writer.flush()?;
                    println!(
                        "Wrote {} snapshots to {}",
                        report.snapshots.len(),
                        path.display()
                    );
                }
                None => print_summary(&report),
            }
        }

        Commands::Validate { scenario } => {
            let loaded = load_scenario(&scenario)
                .with_context(|| format!("Failed to load scenario {}", scenario.display()))?;
            loaded
                .build_torus()
                .context("Scenario failed validation")?;
            println!(
                "Scenario OK: {}x{} grid, {} genotypes, {} generations",
                loaded.landscape.xlen,
                loaded.landscape.ylen,
                loaded.genotypes.len(),
                loaded.simulation.generations
            );
        }
    }

    Ok(())
}
