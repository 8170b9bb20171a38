mod eval;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::{command, Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about)]
pub struct EvalArgs {
    #[command(subcommand)]
    mode: EvalMode,
}

#[derive(Subcommand)]
pub enum EvalMode {
    /// Let a policy play back a directory of recorded frames
    Watch(WatchArgs),
    /// Print the health read from one frame
    Inspect {
        frame: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Directory of PNG frames, played in file name order
    pub frames: PathBuf,

    /// JSON environment config
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(value_enum, long, default_value_t = PolicyArg::Random)]
    pub policy: PolicyArg,

    #[arg(value_enum, long)]
    pub round_policy: Option<RoundPolicyArg>,

    /// Rounds per episode with `--round-policy rounds`
    #[arg(long, default_value_t = 2)]
    pub rounds: u32,

    #[arg(value_enum, long)]
    pub action_source: Option<ActionSourceArg>,

    /// Target steps per second, 0 runs unthrottled
    #[arg(long, default_value_t = eval::DEFAULT_FPS)]
    pub fps: f64,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many steps
    #[arg(long)]
    pub max_steps: Option<u64>,

    /// Log to stderr instead of drawing the dashboard
    #[arg(long)]
    pub headless: bool,

    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Debug, Default)]
pub enum PolicyArg {
    #[default]
    Random,
    Idle,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum RoundPolicyArg {
    End,
    Loop,
    Rounds,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum ActionSourceArg {
    Caller,
    Random,
}

/// Logs go to stderr unless the dashboard owns the terminal, then to `log_file` or nowhere.
fn init_logging(log_file: Option<&PathBuf>, to_stderr: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("couldn't create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if to_stderr => builder.with_writer(std::io::stderr).init(),
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = EvalArgs::parse();
    match args.mode {
        EvalMode::Watch(watch_args) => {
            init_logging(watch_args.log_file.as_ref(), watch_args.headless)?;
            eval::watch(watch_args)
        }
        EvalMode::Inspect { frame, config } => {
            init_logging(None, true)?;
            eval::inspect(&frame, config.as_deref())
        }
    }
}
