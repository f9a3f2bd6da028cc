//! BTCast CLI: forecast, risk and exit commands.
//!
//! Commands:
//! - `forecast`: run the full pipeline and export JSON/Markdown reports
//! - `risk`: risk metrics for a price history CSV
//! - `exit`: composite exit score for a price history CSV

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use btcast_core::domain::{closes, RegimeLabel};
use btcast_core::indicators::log_returns;
use btcast_core::risk::{rolling_risk_metrics, score_exit, RiskMetrics};
use btcast_runner::reporting::format_usd;
use btcast_runner::{
    export_json, load_history, load_model_outputs, run_from_files, run_synthetic, save_report,
    ConsoleSummary, ModelOutputs, PipelineConfig, RiskSummary,
};

#[derive(Parser)]
#[command(name = "btcast", about = "BTCast: BTC ensemble forecast blender and exit scorer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Blend model forecasts, score the exit signal and export a report.
    Forecast {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price history CSV (date, close).
        #[arg(long)]
        history: Option<PathBuf>,

        /// Model outputs JSON.
        #[arg(long)]
        outputs: Option<PathBuf>,

        /// Use a seeded synthetic price history instead of --history.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Report date (YYYY-MM-DD). Defaults to the config value or today.
        #[arg(long)]
        as_of: Option<String>,

        /// Output directory for reports. Overrides the config.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the summary only; write no files.
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Print the full report as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Sharpe, Sortino, max drawdown, Calmar and rolling metrics for a history.
    Risk {
        /// Price history CSV (date, close).
        #[arg(long)]
        history: PathBuf,

        /// Path to a TOML config file (risk section is used).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Composite exit score for a history.
    Exit {
        /// Price history CSV (date, close).
        #[arg(long)]
        history: PathBuf,

        /// Regime label: bull, bear, sideways. Anything else is neutral.
        #[arg(long, default_value = "unknown")]
        regime: String,

        /// Latest perpetual funding rate.
        #[arg(long, allow_hyphen_values = true)]
        funding: Option<f64>,

        /// Print the assessment as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            config,
            history,
            outputs,
            synthetic,
            as_of,
            output_dir,
            no_save,
            json,
        } => run_forecast_cmd(ForecastArgs {
            config,
            history,
            outputs,
            synthetic,
            as_of,
            output_dir,
            no_save,
            json,
        }),
        Commands::Risk { history, config } => run_risk_cmd(history, config),
        Commands::Exit {
            history,
            regime,
            funding,
            json,
        } => run_exit_cmd(history, &regime, funding, json),
    }
}

struct ForecastArgs {
    config: Option<PathBuf>,
    history: Option<PathBuf>,
    outputs: Option<PathBuf>,
    synthetic: bool,
    as_of: Option<String>,
    output_dir: Option<PathBuf>,
    no_save: bool,
    json: bool,
}

fn run_forecast_cmd(args: ForecastArgs) -> Result<()> {
    if args.synthetic && args.history.is_some() {
        bail!("--history and --synthetic are mutually exclusive");
    }
    if !args.synthetic && args.history.is_none() {
        bail!("one of --history or --synthetic is required");
    }

    let mut config = load_config(args.config.as_ref())?;
    if let Some(as_of) = args.as_of.as_deref() {
        config.pipeline.as_of = Some(parse_date(as_of)?);
    }
    if let Some(dir) = args.output_dir {
        config.report.output_dir = dir;
    }

    let report = match (args.history, args.outputs) {
        (Some(history), Some(outputs)) => run_from_files(&config, history, outputs)?,
        (Some(_), None) => bail!("--outputs is required with --history"),
        (None, outputs) => {
            let outputs = match outputs {
                Some(path) => load_model_outputs(path)?,
                None => ModelOutputs::default(),
            };
            run_synthetic(&config, outputs)?
        }
    };

    if args.json {
        println!("{}", export_json(&report)?);
    } else {
        print!("{}", ConsoleSummary.render(&report));
    }

    if !args.no_save {
        let paths = save_report(&report, &config.report)?;
        for path in [paths.json, paths.markdown].into_iter().flatten() {
            info!(path = %path.display(), "report saved");
        }
    }

    Ok(())
}

fn run_risk_cmd(history: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_ref())?;
    let history = load_history(history)?;
    let series = closes(&history);

    let metrics = RiskMetrics::from_prices(&series, config.risk.risk_free_rate);
    let summary = RiskSummary::from(metrics);

    if let Some(last) = history.last() {
        println!("Last price: {} ({})", format_usd(last.close), last.date);
    }
    println!("Observations: {}", series.len());
    println!();
    for (label, value) in summary.entries() {
        println!("{:<15}: {}", label, fmt_opt(value));
    }

    let window = config.risk.rolling_window;
    if let Some((vol, sharpe)) = rolling_risk_metrics(&log_returns(&series), window).latest() {
        println!(
            "{:<15}: {}",
            format!("Rolling {window}d vol"),
            fmt_opt(Some(vol).filter(|v| v.is_finite()))
        );
        println!(
            "{:<15}: {}",
            format!("Rolling {window}d Sharpe"),
            fmt_opt(Some(sharpe).filter(|v| v.is_finite()))
        );
    }

    Ok(())
}

fn run_exit_cmd(history: PathBuf, regime: &str, funding: Option<f64>, json: bool) -> Result<()> {
    let history = load_history(history)?;
    let regime = RegimeLabel::parse_lenient(regime);
    let assessment = score_exit(&closes(&history), regime, funding);

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    println!(
        "Signal: {} (score={:.2})",
        if assessment.signal { "EXIT" } else { "HOLD" },
        assessment.score
    );
    println!("Reasons: {}", assessment.explanation_line());
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    Ok(match path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    })
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => Ok(date),
        Err(_) => bail!("invalid date '{s}', expected YYYY-MM-DD"),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.4}"))
}
