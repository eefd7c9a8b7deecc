//! sim-runner: headless simulation runner for the FYNDR economy.
//!
//! Usage:
//!   sim-runner --seed 42 --days 365
//!   sim-runner --config economy.json --whales 20 --grinders 80 --casuals 300
//!   sim-runner --runs 10 --db runs.db --json results.json

mod store;

use anyhow::Result;
use chrono::Utc;
use fyndr_core::{DailySnapshot, InitialPopulation, SimConfig, SimEngine, SimSummary};
use serde::Serialize;
use std::env;
use std::fs::File;
use std::io::BufWriter;
use store::RunStore;

#[derive(Serialize)]
struct RunResult {
    run_id:    String,
    seed:      u64,
    summary:   SimSummary,
    snapshots: Vec<DailySnapshot>,
}

#[derive(Serialize)]
struct Export<'a> {
    config:     &'a SimConfig,
    population: InitialPopulation,
    days:       u64,
    runs:       &'a [RunResult],
    average:    Option<SimSummary>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 365u64);
    let runs = parse_arg(&args, "--runs", 1u64).max(1);
    let defaults = InitialPopulation::default();
    let population = InitialPopulation::new(
        parse_arg(&args, "--whales", defaults.whale),
        parse_arg(&args, "--grinders", defaults.grinder),
        parse_arg(&args, "--casuals", defaults.casual),
    );
    let config_path = string_arg(&args, "--config");
    let db = string_arg(&args, "--db");
    let json = string_arg(&args, "--json");

    let config = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    println!("FYNDR economy: sim-runner");
    println!("  seed:       {seed}");
    println!("  days:       {days}");
    println!("  runs:       {runs}");
    println!(
        "  population: {} whales, {} grinders, {} casuals",
        population.whale, population.grinder, population.casual
    );
    println!("  config:     {}", config_path.unwrap_or("(defaults)"));
    println!("  db:         {}", db.unwrap_or("(none)"));
    println!();

    let mut run_store = match db {
        Some(path) => {
            let store = RunStore::open(path)?;
            store.migrate()?;
            Some(store)
        }
        None => None,
    };

    let mut results = Vec::with_capacity(runs as usize);
    for i in 0..runs {
        let run_seed = seed.wrapping_add(i);
        let started_at = Utc::now();
        let run_id = format!("run-{run_seed}-{}", started_at.format("%Y%m%dT%H%M%S"));

        let mut engine = SimEngine::build(config.clone(), population, run_seed)?;
        let summary = engine.run(days)?;

        if let Some(store) = run_store.as_mut() {
            store.insert_run(&run_id, run_seed, days, &started_at.to_rfc3339(), engine.config())?;
            store.insert_snapshots(&run_id, engine.snapshots())?;
            store.insert_summary(&run_id, &summary)?;
        }
        log::info!("{run_id}: ${:.2} revenue, {} active", summary.total_revenue, summary.active_players);

        results.push(RunResult {
            run_id,
            seed: run_seed,
            summary,
            snapshots: engine.snapshots().to_vec(),
        });
    }

    let summaries: Vec<SimSummary> = results.iter().map(|r| r.summary.clone()).collect();
    let average = SimSummary::average(&summaries);

    if let Some(path) = json {
        let export = Export {
            config: &config,
            population,
            days,
            runs: &results,
            average: average.clone(),
        };
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &export)?;
        println!("Results written to {path}");
    }

    if let Some(summary) = &average {
        let label = if runs > 1 { format!("AVERAGE OF {runs} RUNS") } else { "RUN SUMMARY".into() };
        print_summary(&label, summary, &config);
    }
    Ok(())
}

fn print_summary(label: &str, s: &SimSummary, config: &SimConfig) {
    println!("=== {label} ===");
    println!("  days simulated:   {}", s.days_simulated);
    println!("  active players:   {} of {} ever", s.active_players, s.total_players_ever);
    println!("  player cap:       {}", config.max_possible_players());
    println!("  retention:        {:.1}%", s.retention_rate * 100.0);
    println!("  churn:            {:.1}%", s.churn_rate * 100.0);
    println!("  penetration:      {:.2}%", s.population_penetration * 100.0);
    println!("  active stickers:  {}", s.active_stickers);
    println!("  total scans:      {}", s.total_scans);
    println!("  points per scan:  {:.2}", s.avg_points_per_scan);
    println!("  points held:      {:.0}", s.total_points);
    println!("  average level:    {:.2}", s.average_level);

    println!();
    println!("=== REVENUE ===");
    println!("  total:            ${:.2}", s.total_revenue);
    println!("  per player:       ${:.2}", s.avg_revenue_per_player);
    println!("  whales:           ${:.2}", s.revenue_by_archetype.whale);
    println!("  grinders:         ${:.2}", s.revenue_by_archetype.grinder);
    println!("  casuals:          ${:.2}", s.revenue_by_archetype.casual);
    println!(
        "  purchases:        {} ({} cash, {} points)",
        s.total_purchases, s.cash_purchases, s.point_purchases
    );
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
