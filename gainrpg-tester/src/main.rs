mod content;
mod reports;
mod simulation;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use gainrpg_game::{DailyEngine, EngineConfig, MemoryStore, Player};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use content::DirectoryContent;
use simulation::{SimulationPlan, SimulationReport, Strategy, run_simulation};

#[derive(Debug, Parser)]
#[command(name = "gainrpg-tester", version = "0.1.0")]
#[command(about = "Play the Gain RPG daily engine forward day by day and report what happened")]
struct Args {
    /// First day to play (defaults to today)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Number of consecutive days to play
    #[arg(long, default_value_t = 14)]
    days: u32,

    /// Theme pack key for the player
    #[arg(long)]
    theme: Option<String>,

    /// Directory holding `<theme>.json` bundles
    #[arg(long)]
    themes_dir: Option<PathBuf>,

    /// How fights are played
    #[arg(long, value_enum, default_value_t = Strategy::Auto)]
    strategy: Strategy,

    /// Grit pushed into each manual strike or guard
    #[arg(long, default_value_t = 0)]
    push: u32,

    /// Campfire tokens the player starts with
    #[arg(long, default_value_t = 2)]
    tokens: u32,

    /// Engine config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the simulated workouts and side quest choices
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let config = load_config(&args)?;
    let theme = args
        .theme
        .clone()
        .unwrap_or_else(|| config.default_theme.clone());
    let player = Player {
        theme_pack: theme.clone(),
        campfire_tokens: args.tokens,
        ..Player::default()
    };
    let engine = DailyEngine::with_config(
        DirectoryContent::new(args.themes_dir.clone()),
        MemoryStore::with_player(player),
        config,
    )?;

    let plan = SimulationPlan {
        start: args.start.unwrap_or_else(|| Local::now().date_naive()),
        days: args.days,
        strategy: args.strategy,
        push_budget: args.push,
        seed: args.seed,
    };
    println!(
        "{} {} days from {} ({:?})",
        "🗓️  Playing".bright_yellow().bold(),
        plan.days,
        plan.start,
        plan.strategy
    );
    let report = run_simulation(&engine, &theme, &plan)?;

    write_reports(&args, &report, start_time)
}

fn announce_banner() {
    println!("{}", "⚔️  Gain RPG Daily Tester".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let Some(path) = args.config.as_ref() else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    EngineConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn write_reports(args: &Args, report: &SimulationReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, report)?,
        "markdown" => reports::generate_markdown_report(&mut output_target, report)?,
        _ => {
            if report.days.is_empty() {
                writeln!(&mut output_target, "No days played.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    report,
                    start_time.elapsed(),
                    args.verbose,
                )?;
            }
        }
    }

    let duration = start_time.elapsed();
    writeln!(&mut output_target)?;
    writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
