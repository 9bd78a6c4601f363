// ImpLog - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading (config.toml, CLI overrides on top)
// 3. Logging initialisation (debug mode support)
// 4. Replaying a captured log stream through the stream pump to stdout

use clap::Parser;
use implog::app::console::ConsoleSink;
use implog::app::gate::StreamGate;
use implog::app::pump::{PumpHandle, StreamPump};
use implog::app::session;
use implog::platform::config::{self, ColourMode, PlatformPaths};
use implog::platform::fs;
use implog::util::constants;
use implog::util::error::{ConfigError, ImpLogError, Result};
use is_terminal::IsTerminal;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// ImpLog - interpreter for device and agent log streams.
///
/// Reads raw log stream lines from a file or stdin, classifies each record,
/// rewrites code references to real source locations and prints the result.
#[derive(Parser, Debug)]
#[command(name = "implog", version, about)]
struct Cli {
    /// Captured log stream to replay (stdin if omitted).
    input: Option<PathBuf>,

    /// Config file (defaults to config.toml in the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Source path substituted for `agent_code` references.
    #[arg(long = "agent-path")]
    agent_path: Option<PathBuf>,

    /// Source path substituted for `device_code` references.
    #[arg(long = "device-path")]
    device_path: Option<PathBuf>,

    /// Pre-processor line table (JSON) for the agent code.
    #[arg(long = "agent-map")]
    agent_map: Option<PathBuf>,

    /// Pre-processor line table (JSON) for the device code.
    #[arg(long = "device-map")]
    device_map: Option<PathBuf>,

    /// When to colour category tags.
    #[arg(long = "colour", value_enum)]
    colour: Option<ColourMode>,

    /// Print stream state messages.
    #[arg(long = "show-state")]
    show_state: bool,

    /// Write collected error reports as JSON to this file on exit.
    #[arg(long = "diagnostics-out")]
    diagnostics_out: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // An explicitly named config file must exist; the default one is optional.
    if let Some(ref path) = cli.config {
        if !path.is_file() {
            let e = ImpLogError::from(ConfigError::Io {
                path: path.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "config file not found"),
            });
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (mut app_config, config_warnings) = config::load_config(&config_path);

    implog::util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "ImpLog starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    // CLI flags override config values.
    if cli.agent_path.is_some() {
        app_config.agent_path = cli.agent_path.clone();
    }
    if cli.device_path.is_some() {
        app_config.device_path = cli.device_path.clone();
    }
    if cli.agent_map.is_some() {
        app_config.agent_map = cli.agent_map.clone();
    }
    if cli.device_map.is_some() {
        app_config.device_map = cli.device_map.clone();
    }
    if let Some(colour) = cli.colour {
        app_config.colour = colour;
    }
    if cli.show_state {
        app_config.show_state_messages = true;
    }

    if let Err(e) = run(&cli, &app_config) {
        tracing::error!(error = %e, "Replay failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, app_config: &config::AppConfig) -> Result<()> {
    let stdout = io::stdout();
    let interactive = stdout.is_terminal();
    let colour = app_config.colour.enabled(interactive);

    let setup = session::prepare(app_config, colour);
    for warning in &setup.warnings {
        eprintln!("Warning: {warning}");
    }

    let input_path = cli.input.clone().unwrap_or_else(|| PathBuf::from("-"));
    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|source| ImpLogError::Io {
                path: path.clone(),
                operation: "open input",
                source,
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut gate = StreamGate::new(
        setup.diagnostics,
        ConsoleSink::new(stdout, interactive),
        setup.policy,
    );
    gate.open(constants::REPLAY_STREAM_ID);

    let pump = StreamPump::start(gate, None);
    let fed = feed(reader, &pump.handle(), &input_path);

    // Lines already queued are rendered even when reading stopped early.
    let (gate, stats) = pump.shutdown()?;
    tracing::info!(
        received = stats.lines_received,
        emitted = stats.lines_emitted,
        errors = stats.errors_reported,
        resets = stats.diagnostic_resets,
        "Replay finished"
    );

    if let Some(ref out) = cli.diagnostics_out {
        fs::write_json(out, &gate.diagnostics().snapshot())?;
        tracing::info!(path = %out.display(), "Diagnostics written");
    }
    fed
}

/// Push every input line into the pump, framed by state messages.
fn feed(mut reader: Box<dyn BufRead>, pump: &PumpHandle, input_path: &Path) -> Result<()> {
    pump.push_state(format!("Log stream opened ({})", input_path.display()))?;

    let mut buf = Vec::new();
    loop {
        let line = fs::read_line_lossy(&mut reader, &mut buf).map_err(|source| ImpLogError::Io {
            path: input_path.to_path_buf(),
            operation: "read input",
            source,
        })?;
        match line {
            Some(line) => pump.push_line(line)?,
            None => break,
        }
    }

    pump.push_state("Log stream closed")?;
    Ok(())
}
