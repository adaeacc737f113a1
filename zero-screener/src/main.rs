#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation
)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use zero_common::logging::{init_from_config, RunContext};
use zero_common::{Config, ValidationError};
use zero_screener::report::{render_banner, ScreeningStats};
use zero_screener::validation::{DEFAULT_MAX_WORKERS, DEFAULT_TOP_N};
use zero_screener::{
    export_results, format_results_table, run_screening, OutputPathPolicy, Preset, ScreenError,
    ScreeningParams, SnapshotScreener,
};

const SERVICE_NAME: &str = "zero-screener";

/// Batch A-share screener.
#[derive(Parser, Debug)]
#[command(name = "zero-screener")]
#[command(author = "theonlyhennygod")]
#[command(version = "0.1.0")]
#[command(about = "Batch A-share screener with preset strategies", long_about = None)]
#[command(after_help = presets_help())]
struct Cli {
    /// Screening preset
    #[arg(long)]
    preset: String,

    /// Number of stocks to return (1-1000)
    #[arg(long, default_value_t = DEFAULT_TOP_N, allow_negative_numbers = true)]
    top: i64,

    /// Minimum composite score (0-100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    min_score: f64,

    /// Export file (.csv, .xlsx or .xls)
    #[arg(short, long)]
    output: Option<String>,

    /// Score candidates sequentially
    #[arg(long)]
    no_parallel: bool,

    /// Maximum parallel workers (1-20)
    #[arg(long, default_value_t = DEFAULT_MAX_WORKERS, allow_negative_numbers = true)]
    max_workers: i64,

    /// Debug logging and full error chains
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to ~/.codecoder/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Universe snapshot to screen
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Comma-separated stock pool (e.g. 600519.SH,000001)
    #[arg(long, value_delimiter = ',')]
    pool: Option<Vec<String>>,
}

fn presets_help() -> String {
    let mut help = String::from("Presets:\n");
    for preset in Preset::ALL {
        help.push_str(&format!(
            "  {:<24}{} - {}\n",
            preset.name(),
            preset.label(),
            preset.description()
        ));
    }
    help
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version print to stdout and succeed
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    if cli.verbose {
        std::env::set_var("RUST_LIB_BACKTRACE", "1");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let label = if is_input_error(&err) {
                "参数错误"
            } else {
                "筛选失败"
            };
            error!(error = %err, "{label}");
            eprintln!("\n{label}: {err:#}");
            if cli.verbose {
                eprintln!("\n{err:?}");
            }
            ExitCode::FAILURE
        }
    }
}

fn is_input_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<ValidationError>().is_some()
            || cause
                .downcast_ref::<zero_common::Error>()
                .is_some_and(zero_common::Error::is_user_error)
            || cause
                .downcast_ref::<ScreenError>()
                .is_some_and(ScreenError::is_validation)
    })
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load_with_env(cli.config.as_deref())?;
    config.validate()?;

    let mut observability = config.observability.clone();
    if cli.verbose {
        observability.log_level = "debug".into();
    }
    init_from_config(&observability);

    let ctx = RunContext::new(SERVICE_NAME).with_baggage("preset", cli.preset.clone());

    let request = ScreeningParams {
        preset: cli.preset.clone(),
        top_n: cli.top,
        min_score: cli.min_score,
        stock_pool: cli.pool.clone(),
        parallel: !cli.no_parallel,
        max_workers: cli.max_workers,
    }
    .validate()?;

    let policy =
        OutputPathPolicy::from_environment().with_extra_dirs(config.screener.extra_output_dirs());
    if let Some(output) = &cli.output {
        policy.validate(output)?;
    }

    println!("{}", render_banner(&request, cli.output.as_deref()));
    println!();
    println!("开始筛选，请稍候...");
    println!("提示: 批量筛选可能需要较长时间，请耐心等待...\n");

    let snapshot = cli
        .snapshot
        .clone()
        .unwrap_or_else(|| config.screener.snapshot_path());
    info!(snapshot = %snapshot.display(), "Using universe snapshot");
    let screener =
        SnapshotScreener::from_path(snapshot).with_exclude_st(config.screener.exclude_st);

    let frame = run_screening(&screener, &request, &ctx)?;
    println!("{}", format_results_table(&frame)?);

    if let Some(output) = &cli.output {
        let written = export_results(&frame, output, &policy, &ctx)?;
        println!("\n结果已保存至: {}", written.display());
    }

    if let Some(stats) = ScreeningStats::from_frame(&frame) {
        println!("{}", stats.render());
    }

    println!("\n筛选完成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["zero-screener", "--preset", "strong_momentum"]).unwrap();
        assert_eq!(cli.top, 20);
        assert_eq!(cli.min_score, 0.0);
        assert_eq!(cli.max_workers, 5);
        assert!(!cli.no_parallel);
        assert!(cli.pool.is_none());
    }

    #[test]
    fn test_cli_requires_preset() {
        let err = Cli::try_parse_from(["zero-screener"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_cli_negative_values_reach_validation() {
        let cli = Cli::try_parse_from(["zero-screener", "--preset", "breakout", "--top", "-5"])
            .unwrap();
        assert_eq!(cli.top, -5);
    }

    #[test]
    fn test_cli_pool_is_comma_separated() {
        let cli = Cli::try_parse_from([
            "zero-screener",
            "--preset",
            "breakout",
            "--pool",
            "600519.SH,000001",
        ])
        .unwrap();
        assert_eq!(
            cli.pool,
            Some(vec!["600519.SH".to_string(), "000001".to_string()])
        );
    }

    #[test]
    fn test_input_error_classification() {
        let err: anyhow::Error = ValidationError::MissingField {
            field: "output".into(),
        }
        .into();
        assert!(is_input_error(&err));

        let err: anyhow::Error = ScreenError::MissingColumns {
            missing: vec!["name".into()],
            required: vec!["name".into()],
        }
        .into();
        assert!(is_input_error(&err));

        let err: anyhow::Error = ScreenError::screening(
            zero_screener::ScreenerError::Unavailable("offline".into()),
        )
        .into();
        assert!(!is_input_error(&err));
    }

    #[test]
    fn test_presets_help_lists_all() {
        let help = presets_help();
        for preset in Preset::ALL {
            assert!(help.contains(preset.name()));
        }
    }
}
