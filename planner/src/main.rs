use anyhow::Context;
use bridge::{default_bind_address, PlannerBridge};
use budgetcore::engine::optimizer::DEFAULT_INCREMENT;
use budgetcore::prelude::PlanError;
use clap::Parser;
use log::warn;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::PlanConfig;
use workflow::session::PlanningSession;

mod bridge;
mod catalog;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Marketing budget planner")]
struct Args {
    /// Load channels, budget and objective from a YAML plan
    #[arg(long)]
    plan: Option<PathBuf>,
    /// Total budget to allocate (overrides the plan file)
    #[arg(long)]
    budget: Option<f64>,
    /// Objective: roi, incremental or efficiency (overrides the plan file)
    #[arg(long)]
    objective: Option<String>,
    /// Spend added per optimizer step (overrides the plan file)
    #[arg(long)]
    increment: Option<f64>,
    /// Channel ids to keep fixed during redistribution
    #[arg(long = "lock")]
    locked: Vec<String>,
    /// Split the budget evenly around locked channels instead of optimizing
    #[arg(long, default_value_t = false)]
    redistribute: bool,
    /// Append a one-line summary of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Write saved scenarios as JSON to this file
    #[arg(long)]
    scenarios: Option<PathBuf>,
    /// Keep the HTTP bridge alive for interactive planning
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn append_report(path: &PathBuf, line: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = &args.plan {
        PlanConfig::load(path)?
    } else {
        PlanConfig::from_args(
            args.budget.unwrap_or(900_000.0),
            args.objective.as_deref().unwrap_or("roi"),
            args.increment.unwrap_or(DEFAULT_INCREMENT),
            Vec::new(),
        )
    }
    .with_overrides(
        args.budget,
        args.objective.as_deref(),
        args.increment,
        &args.locked,
    );

    let objective = config.objective()?;
    let mut session = PlanningSession::new(&config)?;

    let line = if args.redistribute {
        let before = session.prediction().context("evaluating baseline")?;
        match session.redistribute(config.total_budget) {
            Ok(after) => {
                println!(
                    "Redistributed {:.0} across {} channel(s), {} locked: incremental {:.0} -> {:.0}, roi {:.3} -> {:.3}",
                    config.total_budget,
                    session.channels().len(),
                    session.locks().len(),
                    before.total_incremental,
                    after.total_incremental,
                    before.total_roi,
                    after.total_roi
                );
                format!(
                    "redistribute budget={:.0} locked={} spend={:.0} incremental={:.0}\n",
                    config.total_budget,
                    session.locks().len(),
                    after.total_spend,
                    after.total_incremental
                )
            }
            Err(PlanError::EmptyChannelSet { remainder }) => {
                warn!("every channel is locked, {:.0} left unplaced", remainder);
                format!("redistribute budget={:.0} unplaced={:.0}\n", config.total_budget, remainder)
            }
            Err(err) => return Err(err).context("redistributing budget"),
        }
    } else {
        let report = session.execute(objective)?;
        println!(
            "Optimized for {} -> spend {:.0}, incremental {:.0}, roi {:.3}, improvement {:.2}%",
            report.objective,
            report.optimized.total_spend,
            report.optimized.total_incremental,
            report.optimized.total_roi,
            report.improvement_percent
        );
        for row in &report.breakdown {
            let change = row
                .change_percent
                .map(|pct| format!("{pct:+.1}%"))
                .unwrap_or_else(|| "n/a".into());
            println!(
                "  {:<10} spend {:>10.0} ({:>7}) incremental {:>12.0} roi {:.3}",
                row.id, row.spend, change, row.incremental, row.roi
            );
        }
        format!(
            "objective={} budget={:.0} spend={:.0} incremental={:.0} roi={:.4} improvement={:.2}\n",
            report.objective,
            report.total_budget,
            report.optimized.total_spend,
            report.optimized.total_incremental,
            report.optimized.total_roi,
            report.improvement_percent
        )
    };

    if let Some(path) = &args.report {
        append_report(path, &line)?;
    }
    if let Some(path) = &args.scenarios {
        fs::write(path, session.export_scenarios()?)
            .with_context(|| format!("writing scenarios {}", path.display()))?;
    }

    if args.serve {
        let bridge = PlannerBridge::new(session, Duration::from_millis(config.optimize_delay_ms));
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for the HTTP bridge")?;
        runtime.block_on(bridge.serve_until_shutdown(args.bind.unwrap_or_else(default_bind_address)))?;
    }

    Ok(())
}
