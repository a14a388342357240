// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use banditlb::metrics::analyzer;
use banditlb::prelude::*;
use banditlb::simulation;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::time::{Duration, Instant};
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

/// Overrides on top of the defaults (or a JSON config file).
#[derive(Args)]
struct ScenarioArgs {
    #[arg(long)]
    config: Option<String>,
    #[arg(short = 'S', long)]
    servers: Option<usize>,
    #[arg(short = 'n', long)]
    requests: Option<u64>,
    #[arg(long)]
    base: Option<f64>,
    #[arg(long)]
    step: Option<f64>,
    #[arg(short, long)]
    learning_rate: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    no_drift: bool,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(short, long)]
        temperature: Option<f64>,
        #[arg(short, long)]
        report_interval: Option<u64>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        no_progress: bool,
    },

    Sweep {
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(short, long, default_value = "1,5,15,50")]
        temperatures: String,
        #[arg(short, long, default_value_t = 3)]
        repetitions: u32,
        #[arg(short, long)]
        output: Option<String>,
    },

    ShowConfig,
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            temperature,
            report_interval,
            output,
            no_progress,
        } => {
            let mut config = build_config(&scenario)?;
            if let Some(t) = temperature {
                config.temperature = t;
            }
            if let Some(interval) = report_interval {
                config.report_interval = interval;
            }
            config.progress = !no_progress;

            run_single_simulation(config, output.as_deref())?;
        }

        Commands::Sweep {
            scenario,
            temperatures,
            repetitions,
            output,
        } => {
            let config = build_config(&scenario)?;
            let temperatures = parse_temperatures(&temperatures)?;
            run_sweep(config, &temperatures, repetitions, output.as_deref())?;
        }

        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&SimConfig::default())?);
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {}", format_time(total_time));

    Ok(())
}

fn build_config(args: &ScenarioArgs) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };

    if let Some(servers) = args.servers {
        config.server_count = servers;
    }
    if let Some(requests) = args.requests {
        config.total_requests = requests;
    }
    if let Some(base) = args.base {
        config.initial_latency_base = base;
    }
    if let Some(step) = args.step {
        config.initial_latency_step = step;
    }
    if let Some(lr) = args.learning_rate {
        config.learning_rate = lr;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.no_drift {
        config.latency_model = config.latency_model.without_drift();
    }

    config.validate()?;
    Ok(config)
}

fn parse_temperatures(list: &str) -> Result<Vec<f64>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| anyhow::anyhow!("Bad temperature '{}': {}", s, e))
        })
        .collect()
}

fn run_single_simulation(config: SimConfig, output: Option<&str>) -> Result<()> {
    info!("=== Softmax Load Balancer Simulation ===");

    let mut sim = Simulation::new(config)?;
    let summary = sim.run();

    info!("");
    info!("=== Simulation finished ===");
    info!("Average latency: {:.2} ms over {} requests", summary.avg_latency, summary.requests);
    for (i, (picks, (estimate, mean))) in summary
        .selections
        .iter()
        .zip(summary.estimated_latencies.iter().zip(&summary.true_means))
        .enumerate()
    {
        info!(
            "   S{}: picked {:>5}x | estimated {:>7.1} ms | true mean {:>7.1} ms",
            i, picks, estimate, mean
        );
    }

    if let Some(dir) = output {
        sim.save_results(dir)?;
    }

    Ok(())
}

fn run_sweep(
    config: SimConfig,
    temperatures: &[f64],
    repetitions: u32,
    output: Option<&str>,
) -> Result<()> {
    info!("=== Temperature Sweep ===");
    info!("Temperatures: {:?}", temperatures);
    info!("Repetitions: {}", repetitions);

    let reports = simulation::sweep(&config, temperatures, repetitions)?;
    analyzer::comparison_table(&reports);

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)?;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = format!("{}/sweep_{}.json", dir, timestamp);
        std::fs::write(&path, serde_json::to_string_pretty(&reports)?)?;
        info!("Sweep saved to: {}", path);
    }

    Ok(())
}

fn format_time(duration: Duration) -> String {
    let secs = duration.as_secs();
    let minutes = secs / 60;
    let seconds = secs % 60;
    let millis = duration.subsec_millis();

    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}
