//! Command line split-time capture for the ALGE TIMY 3
//!
//! Captures splits into a JSON-lines file until Ctrl-C or until the device
//! is unplugged.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use timy_core::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "timy-capture", version, about = "Capture split times from an ALGE TIMY 3")]
struct Args {
    /// JSON capture configuration; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read timeout in milliseconds (also bounds stop latency)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// File receiving captured splits, one JSON object per line
    #[arg(long, default_value = "timy.jsonl")]
    output: PathBuf,

    /// File receiving the log; `-` logs to stderr
    #[arg(long, default_value = "timylog.txt")]
    log_file: PathBuf,

    /// Use the simulated device instead of USB hardware
    #[arg(long)]
    demo: bool,

    /// Seed for the simulated device
    #[arg(long, requires = "demo")]
    seed: Option<u64>,
}

/// Log destination selected on the command line
#[derive(Debug, PartialEq, Eq)]
enum LogSink<'a> {
    Stderr,
    File(&'a Path),
}

impl Args {
    fn log_sink(&self) -> LogSink<'_> {
        if self.log_file.as_os_str() == "-" {
            LogSink::Stderr
        } else {
            LogSink::File(&self.log_file)
        }
    }
}

fn init_logging(sink: LogSink<'_>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match sink {
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        LogSink::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<CaptureConfig> {
    let mut config = match &args.config {
        Some(path) => CaptureConfig::from_file(path)
            .with_context(|| format!("cannot load {}", path.display()))?,
        None => CaptureConfig::default(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        config.read_timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_sink())?;
    let config = load_config(&args)?;

    let store = JsonLinesStore::open(&args.output)
        .with_context(|| format!("cannot open {}", args.output.display()))?;

    let mut transport: Box<dyn Transport> = if args.demo {
        Box::new(match args.seed {
            Some(seed) => DemoTransport::with_seed(seed),
            None => DemoTransport::new(),
        })
    } else {
        Box::new(UsbTransport::new())
    };

    let timeout_ms = config.read_timeout_ms;
    let engine = CaptureEngine::connect(config, &mut transport, Box::new(store))?;
    let handle = engine.handle();
    let mut task = spawn_capture(engine);

    info!("Capturing to {} (Ctrl-C to stop)", args.output.display());
    let result = tokio::select! {
        result = &mut task => result,
        _ = tokio::signal::ctrl_c() => {
            handle.request_stop();
            info!("Stopping after the current read (up to {} ms)", timeout_ms);
            task.await
        }
    };

    let report = result.context("capture task panicked")??;
    println!("{}", report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_defaults_to_timylog() {
        let args = Args::try_parse_from(["timy-capture"]).unwrap();
        assert_eq!(args.log_sink(), LogSink::File(Path::new("timylog.txt")));
        assert_eq!(args.output, PathBuf::from("timy.jsonl"));
    }

    #[test]
    fn test_log_to_stderr() {
        let args = Args::try_parse_from(["timy-capture", "--log-file", "-"]).unwrap();
        assert_eq!(args.log_sink(), LogSink::Stderr);
    }

    #[test]
    fn test_seed_requires_demo() {
        assert!(Args::try_parse_from(["timy-capture", "--seed", "7"]).is_err());
        let args = Args::try_parse_from(["timy-capture", "--demo", "--seed", "7"]).unwrap();
        assert_eq!(args.seed, Some(7));
    }
}
