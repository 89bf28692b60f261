mod cli;
mod console;
mod logging;

use anyhow::Context;
use autopilot_core::{SystemClock, config, tmux::CliTmuxProvider};
use clap::Parser;
use std::{
    io,
    path::PathBuf,
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

#[derive(Parser)]
#[command(
    version,
    about = "Keeps a terminal coding assistant working unattended inside tmux",
    after_help = "\
Examples:
  autopilot                                  # default auto-prompt
  autopilot -p \"Implement docs/features/\"    # send an initial instruction
  autopilot --interval 10 --prompt-interval 120
  autopilot --debug                          # trace every pattern match

Watch the assistant with `tmux attach -t claude-auto`, detach with Ctrl+B then D."
)]
struct Cli {
    /// Seconds between pane scans [default: 20]
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Seconds without automatic activity before the auto-prompt is sent [default: 60]
    #[arg(long, value_name = "SECS")]
    prompt_interval: Option<u64>,

    /// Print a trace of every pattern match and log at debug level
    #[arg(short, long)]
    debug: bool,

    /// Instruction to send once the assistant has started
    #[arg(short, long)]
    prompt: Option<String>,

    /// Override path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// tmux session name [default: claude-auto]
    #[arg(short, long)]
    session: Option<String>,

    /// Command that launches the assistant [default: claude]
    #[arg(long)]
    command: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = logging::setup_logging(logging::level_for(cli.debug)) {
        eprintln!("warning: file logging disabled: {error:#}");
    }

    let args = cli::RunArgs {
        interval: cli.interval,
        prompt_interval: cli.prompt_interval,
        prompt: cli.prompt,
        session: cli.session,
        command: cli.command,
        debug: cli.debug,
    };

    match run(cli.config.as_deref(), &args) {
        Ok(()) => ExitCode::from(0),
        Err(error) => {
            log::error!("{error}");
            cli::print_error(&error);
            let code: u8 = match error.code() {
                1 => 1,
                _ => 2,
            };
            ExitCode::from(code)
        }
    }
}

fn run(config_path: Option<&std::path::Path>, args: &cli::RunArgs) -> cli::CliResult<()> {
    let mut config = config::load_config(config_path).map_err(cli::CliError::from)?;
    cli::apply_overrides(&mut config, args);

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .context("failed to set ctrl-c handler")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::cmd_run(
        &config,
        &CliTmuxProvider,
        &SystemClock,
        args,
        &shutdown,
        &mut out,
    )
}
