use std::path::{Path, PathBuf};

use accrue::report::{scenario_report, sweep_lines};
use accrue::{
    CsvSink, Inputs, Scenario, ScenarioPlan, Settings, init_logging, load_inputs, run_scenarios,
    synthetic_inputs,
};
use accrue_core::model::{ResultCurve, ResultSink};
use accrue_core::sweep::{recurring_grid, sweep_recurring};
use accrue_core::{CooldownConfig, LumpSumConfig, RecurringConfig};
use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::eyre::{WrapErr, bail};

const CONFIG_FILE_NAME: &str = "accrue.yaml";

#[derive(Parser, Debug)]
#[command(name = "accrue")]
#[command(about = "Backtest lump-sum and monthly contribution strategies over equity baskets")]
struct Args {
    /// Path to the data directory (default: ~/.accrue/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the configured scenarios over stored market data (default)
    Run(RunArgs),
    /// Run every scenario over a seeded synthetic market
    Demo(DemoArgs),
    /// Write a starter settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
        /// Settings file to create (default: <data-dir>/accrue.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct RunArgs {
    /// Settings file (default: <data-dir>/accrue.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenarios to run; all of them when omitted
    #[arg(short, long, value_enum)]
    scenario: Vec<Scenario>,

    /// Output directory, overriding the settings file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct DemoArgs {
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 8)]
    instruments: usize,

    #[arg(long, default_value_t = 10)]
    years: i32,

    /// Also sweep split counts and cooldown settings
    #[arg(long)]
    sweep: bool,

    /// Export month-end CSVs into this directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".accrue")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);

    init_logging(&data_dir, &args.log_level, args.verbose)?;

    match args.command.unwrap_or_else(|| Command::Run(RunArgs::default())) {
        Command::Run(run) => run_backtest(&data_dir, run)?,
        Command::Demo(demo) => run_demo(demo)?,
        Command::Init { force, config } => {
            let path = config.unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
            write_template(&path, force)?;
        }
    }

    tracing::info!("accrue finished");
    Ok(())
}

fn selected(scenarios: Vec<Scenario>) -> Vec<Scenario> {
    if scenarios.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        scenarios
    }
}

fn run_backtest(data_dir: &Path, args: RunArgs) -> color_eyre::Result<()> {
    let config_path = args
        .config
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
    let settings = Settings::load(&config_path)
        .wrap_err_with(|| format!("Failed to load settings from {}", config_path.display()))?;

    let inputs = load_inputs(&settings, data_dir);
    let curves = run_scenarios(
        &inputs,
        &ScenarioPlan::from_settings(&settings),
        &selected(args.scenario),
    )
    .wrap_err("Backtest failed")?;

    let output = args
        .output
        .unwrap_or_else(|| settings.output.directory.clone());
    let sink = CsvSink::new(output).file_names(
        &settings.output.lump_sum_file,
        &settings.output.monthly_file,
        &settings.output.mixed_file,
    );
    publish(&curves, Some(sink))
}

fn run_demo(args: DemoArgs) -> color_eyre::Result<()> {
    let end = jiff::Zoned::now().date();
    let inputs = synthetic_inputs(args.seed, args.instruments, args.years, end);
    let plan = ScenarioPlan {
        lump_sum: LumpSumConfig::new(1_000.0).real_rate_spread(0.06),
        monthly: RecurringConfig::new(1_000.0)
            .split_count(2)
            .cooldown(CooldownConfig::default())
            .real_rate_spread(0.06),
        mixed: RecurringConfig::mixed(1_000.0, 0.3).real_rate_spread(0.06),
    };

    let curves =
        run_scenarios(&inputs, &plan, &Scenario::ALL).wrap_err("Demo backtest failed")?;
    publish(&curves, args.output.map(CsvSink::new))?;

    if args.sweep {
        print_sweep(&inputs, &plan.monthly);
    }
    Ok(())
}

fn print_sweep(inputs: &Inputs, base: &RecurringConfig) {
    let grid = recurring_grid(
        base,
        &[1, 2, 3, 5],
        &[
            None,
            Some(CooldownConfig::default()),
            Some(CooldownConfig::new(6, 6, 6)),
        ],
    );
    let points = sweep_recurring(&inputs.panel, &inputs.benchmarks, &grid);
    println!("\n--- Parameter sweep ---");
    for line in sweep_lines(&points) {
        println!("{line}");
    }
}

fn publish(curves: &[ResultCurve], sink: Option<CsvSink>) -> color_eyre::Result<()> {
    for curve in curves {
        println!("{}\n", scenario_report(curve));
    }

    if let Some(mut sink) = sink {
        for curve in curves {
            sink.accept(curve).wrap_err("Failed to export results")?;
        }
        for path in sink.written() {
            println!("Saved {}", path.display());
        }
    }
    Ok(())
}

fn write_template(path: &Path, force: bool) -> color_eyre::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Settings::template()
        .save(path)
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
