use anyhow::{Context, Result};
use cad_config::{GeneratorSection, UnusedKeyPolicy};
use cad_portfolio::{AllocationReport, Allocator, PortfolioSession};
use cad_sim::{generate_counterparties, rng_for, GeneratorRanges};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{allocation_policy, format_currency, format_percentage, load_config};

pub struct SimulateArgs<'a> {
    pub config_paths: &'a [String],
    pub seed: Option<u64>,
    pub target_ratio: Option<f64>,
    pub apply: bool,
    pub json: bool,
    pub strict_config: bool,
}

/// One simulation run as printed with `--json`.
#[derive(Serialize)]
struct SimulationRun {
    run_id: Uuid,
    generated_at_utc: DateTime<Utc>,
    config_hash: String,
    seed: Option<u64>,
    initial_ratio: f64,
    applied: bool,
    phase: &'static str,
    /// Live ratio after `--apply`; equals the starting ratio otherwise.
    live_ratio: f64,
    report: AllocationReport,
}

fn ranges(g: &GeneratorSection) -> GeneratorRanges {
    GeneratorRanges {
        pd_min: g.pd_min,
        pd_max: g.pd_max,
        lgd_min: g.lgd_min,
        lgd_max: g.lgd_max,
        exposure_min: g.exposure_min,
        exposure_max: g.exposure_max,
    }
}

pub fn run(args: SimulateArgs<'_>) -> Result<()> {
    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let loaded = load_config(args.config_paths, policy)?;
    let cfg = loaded.simulation()?;

    let seed = args.seed.or(cfg.generator.seed);
    let target_ratio = args.target_ratio.unwrap_or(cfg.portfolio.target_cet1_ratio);

    let allocator = Allocator::new(allocation_policy(&cfg.allocation));
    let mut rng = rng_for(seed);
    let book = generate_counterparties(
        cfg.portfolio.counterparty_count,
        &ranges(&cfg.generator),
        &mut rng,
        allocator.formula(),
    )?;

    let mut session = PortfolioSession::initialize(
        allocator,
        book,
        cfg.portfolio.initial_cet1_ratio,
        target_ratio,
    )
    .context("session initialize failed")?;

    let outcome = session.optimize().context("optimize failed")?;
    let report = AllocationReport::from_outcome(session.cet1_capital(), target_ratio, &outcome);

    if args.apply {
        let n = session.apply_suggestions()?;
        info!(applied = n, "simulate: suggestions applied");
    }

    let run = SimulationRun {
        run_id: Uuid::new_v4(),
        generated_at_utc: Utc::now(),
        config_hash: loaded.config_hash,
        seed,
        initial_ratio: session.initial_ratio(),
        applied: args.apply,
        phase: session.phase().as_str(),
        live_ratio: session.current_ratio(),
        report,
    };

    if args.json {
        let out = serde_json::to_string_pretty(&run).context("serialize run failed")?;
        println!("{out}");
    } else {
        print_text(&run);
    }
    Ok(())
}

fn print_text(run: &SimulationRun) {
    let r = &run.report;
    println!("run_id={}", run.run_id);
    println!("generated_at_utc={}", run.generated_at_utc.to_rfc3339());
    println!("config_hash={}", run.config_hash);
    match run.seed {
        Some(s) => println!("seed={s}"),
        None => println!("seed=ENTROPY"),
    }
    println!("cet1_capital={}", format_currency(r.cet1_capital));
    println!("current_ratio={}", format_percentage(r.current_ratio));
    println!("target_ratio={}", format_percentage(r.target_ratio));
    println!("suggested_ratio={}", format_percentage(r.suggested_ratio));
    println!("target_met={}", r.target_met);
    if !r.target_met {
        println!("unmet_rwa={}", format_currency(r.unmet_rwa));
    }
    println!("phase={}", run.phase);
    if run.applied {
        println!("live_ratio={}", format_percentage(run.live_ratio));
    }
    println!();

    println!(
        "{:<6} {:<18} {:>8} {:>8} {:>16} {:>16} {:>16}",
        "id", "name", "pd", "lgd", "exposure", "suggested", "delta"
    );
    for d in &r.counterparties {
        let suggested = d
            .suggested_exposure
            .map(format_currency)
            .unwrap_or_else(|| "-".to_string());
        let delta = d
            .exposure_delta
            .map(format_currency)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<18} {:>8} {:>8} {:>16} {:>16} {:>16}",
            d.id,
            d.name,
            format_percentage(d.default_probability),
            format_percentage(d.loss_severity),
            format_currency(d.exposure),
            suggested,
            delta
        );
    }
}
