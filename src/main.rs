//! mindpulse CLI
//!
//! Replays or streams wearable readings through the analytics engine.

use clap::{Parser, Subcommand, ValueEnum};
use mindpulse::{
    config::Config,
    core::{AssessmentResult, Engine, EngineState, Finding, Ingest},
    source::{ReplaySource, SensorReading},
    transparency::{create_shared_log_with_persistence, IngestLog},
    DISCLAIMER, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How long `serve` waits for open connections after Ctrl+C.
#[cfg(feature = "server")]
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "mindpulse")]
#[command(version = VERSION)]
#[command(about = "Stress and wellbeing analytics for wearable readings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines recording and print the assessment
    Analyze {
        /// JSON-lines file with one reading per line
        #[arg(long, short)]
        input: PathBuf,

        /// Resume from and save to this state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Stream readings from stdin or a file until EOF or Ctrl+C
    Run {
        /// Input file, or "-" for stdin
        #[arg(long, short, default_value = "-")]
        input: String,

        /// Output format for the final assessment
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show ingestion statistics and the saved state
    Status,

    /// Delete the saved engine state
    Reset,

    /// Show configuration
    Config,

    /// Display the wellbeing notice
    Disclaimer,

    /// Serve the HTTP API for a device bridge
    #[cfg(feature = "server")]
    Serve {
        /// Port to bind to on 127.0.0.1
        #[arg(long, default_value = "8787")]
        port: u16,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            state,
            format,
        } => {
            cmd_analyze(&input, state.as_deref(), format);
        }
        Commands::Run { input, format } => {
            cmd_run(&input, format);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Reset => {
            cmd_reset();
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::Disclaimer => {
            cmd_disclaimer();
        }
        #[cfg(feature = "server")]
        Commands::Serve { port } => {
            cmd_serve(port);
        }
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config, using defaults: {e}");
        Config::default()
    })
}

/// Build an engine from the configuration, optionally resuming from a state file.
fn build_engine(config: &Config, state_path: Option<&Path>) -> Engine {
    let tz = match config.tz() {
        Ok(tz) => tz,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut engine = Engine::new(config.thresholds.clone(), tz);
    if let Some(path) = state_path.filter(|p| p.exists()) {
        match EngineState::load(path) {
            Ok(state) => {
                engine.import_state(state);
                eprintln!("Resumed state from {path:?}");
            }
            Err(e) => {
                eprintln!("Error loading state from {path:?}: {e}");
                std::process::exit(1);
            }
        }
    }

    engine
}

fn ingest(engine: &mut Engine, log: &IngestLog, reading: SensorReading) -> (bool, Ingest) {
    match reading {
        SensorReading::Cardiac(reading) => {
            let outcome = engine.add_cardiac_sample(reading);
            log.record_cardiac(&outcome);
            (true, outcome)
        }
        SensorReading::Thermal(reading) => {
            let outcome = engine.add_thermal_sample(reading);
            log.record_thermal(&outcome);
            (false, outcome)
        }
    }
}

fn save_state(engine: &Engine, path: &Path) {
    match engine.export_state().save(path) {
        Ok(()) => eprintln!("Saved state to {path:?}"),
        Err(e) => eprintln!("Error saving state: {e}"),
    }
}

fn cmd_analyze(input: &Path, state_path: Option<&Path>, format: OutputFormat) {
    let config = load_config();
    let mut engine = build_engine(&config, state_path);
    let log = IngestLog::new();

    let mut source = match ReplaySource::from_path(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = source.start() {
        eprintln!("Error starting replay: {e}");
        std::process::exit(1);
    }

    let receiver = source.receiver().clone();
    for reading in receiver.iter() {
        ingest(&mut engine, &log, reading);
    }
    source.stop();
    log.record_malformed(source.malformed_lines());

    let result = engine.full_analysis();
    log.record_analysis();
    print_assessment(&result, format);

    if let Some(path) = state_path {
        save_state(&engine, path);
    }

    eprintln!();
    eprintln!("{}", log.summary());
}

fn cmd_run(input: &str, format: OutputFormat) {
    eprintln!("mindpulse v{VERSION}");
    eprintln!();

    let config = load_config();
    let mut engine = build_engine(&config, Some(&config.state_path));
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let mut source = if input == "-" {
        ReplaySource::stdin()
    } else {
        match ReplaySource::from_path(Path::new(input)) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    };

    let log = create_shared_log_with_persistence(config.data_path.join("ingest.json"));
    eprintln!("Instance ID: {}", engine.instance_id());
    eprintln!("Timezone: {}", engine.timezone().name());
    eprintln!("Press Ctrl+C to stop");
    eprintln!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    if let Err(e) = source.start() {
        eprintln!("Error starting source: {e}");
        std::process::exit(1);
    }

    let receiver = source.receiver().clone();
    while running.load(Ordering::SeqCst) {
        let first = match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(reading) => reading,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        };

        // Drain whatever else is queued so one line is printed per batch.
        let mut cardiac = 0usize;
        let mut thermal = 0usize;
        let mut throttled = 0usize;
        let mut rejected = 0usize;
        for reading in std::iter::once(first).chain(receiver.try_iter()) {
            match ingest(&mut engine, &log, reading) {
                (true, Ingest::Accepted) => cardiac += 1,
                (false, Ingest::Accepted) => thermal += 1,
                (_, Ingest::Throttled) => throttled += 1,
                (_, Ingest::Rejected(_)) => rejected += 1,
            }
        }

        if cardiac + thermal > 0 {
            let latest = engine
                .reference_time()
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "--:--:--".to_string());
            eprintln!(
                "[{}] +{} cardiac, +{} thermal ({} throttled, {} rejected) | windows: {} cardiac, {} thermal",
                latest,
                cardiac,
                thermal,
                throttled,
                rejected,
                engine.cardiac_window().len(),
                engine.thermal_window().len()
            );
        }
    }

    eprintln!();
    eprintln!("Stopping...");
    source.stop();
    log.record_malformed(source.malformed_lines());

    let result = engine.full_analysis();
    log.record_analysis();
    print_assessment(&result, format);

    save_state(&engine, &config.state_path);
    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save ingestion stats: {e}");
    }

    eprintln!();
    eprintln!("{}", log.summary());
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("mindpulse Status");
    println!("================");
    println!();
    println!("Timezone: {}", config.timezone);
    println!("State file: {:?}", config.state_path);
    println!();

    if config.state_path.exists() {
        match EngineState::load(&config.state_path) {
            Ok(state) => {
                println!("Saved State:");
                println!("  Instance ID: {}", state.instance_id);
                println!("  Cardiac samples: {}", state.cardiac.len());
                println!("  Thermal entries: {}", state.thermal.len());
                println!("  Thermal span: {:.1} h", state.thermal.span_hours());
                match &state.last_analysis {
                    Some(result) => println!(
                        "  Last assessment: {} ({:?})",
                        result.overall_score, result.overall_level
                    ),
                    None => println!("  Last assessment: none"),
                }
            }
            Err(e) => eprintln!("Could not read saved state: {e}"),
        }
    } else {
        println!("No saved state found.");
    }
    println!();

    let stats_path = config.data_path.join("ingest.json");
    if stats_path.exists() {
        let log = IngestLog::with_persistence(stats_path);
        println!("{}", log.summary());
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_reset() {
    let config = Config::load().unwrap_or_default();
    if !config.state_path.exists() {
        println!("No saved state at {:?}", config.state_path);
        return;
    }
    match std::fs::remove_file(&config.state_path) {
        Ok(()) => println!("Deleted saved state {:?}", config.state_path),
        Err(e) => {
            eprintln!("Error deleting state: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_disclaimer() {
    println!("{DISCLAIMER}");
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16) {
    use mindpulse::server::{run, ServerConfig};

    let config = load_config();
    let engine = build_engine(&config, Some(&config.state_path));
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    let log = create_shared_log_with_persistence(config.data_path.join("ingest.json"));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };

    let state_path = config.state_path.clone();
    let server_config = ServerConfig::new(port, Some(state_path.clone()));
    let engine = engine.shared();
    let result = runtime.block_on(async {
        let (addr, shutdown_tx, task) = run(server_config, engine.clone(), log.clone()).await?;
        println!("Listening on http://{addr}");
        println!("Press Ctrl+C to stop");
        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(());

        // The server task persists state once open connections drain.
        if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
            tracing::warn!("server did not drain in time, saving state directly");
            let state = match engine.lock() {
                Ok(engine) => engine.export_state(),
                Err(_) => anyhow::bail!("engine lock poisoned"),
            };
            state.save(&state_path)?;
        }
        anyhow::Ok(())
    });

    if let Err(e) = result {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save ingestion stats: {e}");
    }
    println!("{}", log.summary());
}

/// Print the assessment as pretty JSON or a short report.
///
/// Only the assessment goes to stdout; status lines go to stderr so JSON
/// output can be piped.
fn print_assessment(result: &AssessmentResult, format: OutputFormat) {
    println!("{}", render_assessment(result, format));
}

fn render_assessment(result: &AssessmentResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => result.to_json(),
        OutputFormat::Text => render_report(result),
    }
}

fn finding_line<S, M>(name: &str, finding: &Finding<S, M>) -> String {
    format!("  {:<22} {}", name, finding.level)
}

fn render_report(result: &AssessmentResult) -> String {
    let mut lines = vec![String::new(), "Assessment".to_string(), "==========".to_string()];
    if let Some(ts) = result.timestamp {
        lines.push(format!("Based on data up to {}", ts.to_rfc3339()));
    }
    lines.push(String::new());
    lines.push(format!(
        "Overall score: {} ({:?})",
        result.overall_score, result.overall_level
    ));
    lines.push(format!("Mood stability: {:?}", result.mood_stability));
    lines.push(format!("Anxiety level: {:?}", result.anxiety_level));
    lines.push(format!("Stress resilience: {}", result.stress_resilience));
    lines.push(String::new());

    lines.push("Cardiac:".to_string());
    lines.push(finding_line("HRV", &result.cardiac.hrv));
    lines.push(finding_line("Cardiac stress", &result.cardiac.cardiac_stress));
    lines.push(finding_line("Depression risk", &result.cardiac.depression_risk));
    lines.push(finding_line("Resilience", &result.cardiac.resilience));
    lines.push(String::new());

    lines.push("Thermal:".to_string());
    lines.push(finding_line("Circadian rhythm", &result.thermal.circadian));
    lines.push(finding_line("Sleep quality", &result.thermal.sleep));
    lines.push(finding_line("Stress response", &result.thermal.stress));
    lines.push(finding_line("Adaptation", &result.thermal.adaptation));
    lines.push(String::new());

    if !result.issues.is_empty() {
        lines.push(format!("Issues: {}", result.issues.join(", ")));
    }
    lines.push("Recommendations:".to_string());
    for rec in &result.recommendations {
        lines.push(format!("  [{:?}] {}", rec.kind, rec.text));
    }
    lines.push(String::new());

    let quality = &result.data_quality;
    lines.push(format!(
        "Data: {} cardiac samples{}, {} thermal entries over {:.1} h{}",
        quality.cardiac_samples,
        if quality.cardiac_sufficient { "" } else { " (insufficient)" },
        quality.thermal_samples,
        quality.thermal_span_hours,
        if quality.thermal_sufficient { "" } else { " (insufficient)" },
    ));
    lines.join("\n")
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_output_is_pure_json() {
        let result = Engine::default().full_analysis();
        let rendered = render_assessment(&result, OutputFormat::Json);
        let parsed: AssessmentResult = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_text_report_lists_every_dimension() {
        let result = Engine::default().full_analysis();
        let report = render_assessment(&result, OutputFormat::Text);
        assert!(report.contains("Overall score: 100"));
        for name in ["HRV", "Cardiac stress", "Circadian rhythm", "Adaptation"] {
            assert!(report.contains(name));
        }
        assert!(!report.contains("Saved state"));
    }
}
