//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the Fractalis analyzer.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::adapters::export::{export_to_file, rows_from_memory, ExportRow};
use crate::adapters::price_csv::CsvPriceSource;
use crate::adapters::watchlist::Watchlist;
use crate::application::{AnalysisReport, AnalysisService, DecisionEngine};
use crate::config::{load_config, Config};
use crate::domain::{InstrumentRecord, JsonStateStore, StoreRecovery, TacticalMemory};
use crate::strategy::{EngineConfig, ForestDirectionPredictor, VolatilityRegimeClassifier};

/// Fractalis - Volatility regime gate with tactical signal memory
#[derive(Parser, Debug)]
#[command(
    name = "fractalis",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Volatility regime gate with a stateful per-ticker signal memory",
    long_about = "Fractalis classifies each instrument's recent volatility regime and, only in \
                  a stable regime, asks a random forest for the next-period direction. \
                  Recommendations are reconciled with a persisted tactical memory so an \
                  already-acted signal is not repeated."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze instruments and update the tactical memory
    Analyze(AnalyzeCmd),

    /// Show the stored tactical memory
    Memory(MemoryCmd),

    /// Export the stored tactical memory as CSV
    Export(ExportCmd),
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Analyze instruments
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// Tickers to analyze (e.g., WEGE3.SA); the watchlist is used when empty
    #[arg(value_name = "TICKER")]
    pub tickers: Vec<String>,

    /// Watchlist JSON whose operable entries are analyzed
    #[arg(short, long, value_name = "FILE")]
    pub watchlist: Option<PathBuf>,

    /// Directory of <TICKER>.csv price files
    #[arg(short, long, value_name = "DIR")]
    pub prices: Option<PathBuf>,

    /// Tactical memory file
    #[arg(short, long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Also write the round's results as CSV
    #[arg(short, long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Analysis date stamped on records (default: today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Show stored memory
#[derive(Parser, Debug)]
pub struct MemoryCmd {
    /// Show a single instrument
    #[arg(value_name = "TICKER")]
    pub ticker: Option<String>,

    /// Tactical memory file
    #[arg(short, long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Export stored memory
#[derive(Parser, Debug)]
pub struct ExportCmd {
    /// Destination CSV file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Tactical memory file
    #[arg(short, long, value_name = "FILE")]
    pub state: Option<PathBuf>,
}

/// Execute the CLI command
pub fn execute(app: CliApp) -> Result<()> {
    let config = match &app.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            let config = Config::default();
            config.validate()?;
            config
        }
    };

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Analyze(cmd) => analyze_command(cmd, &config),
        Command::Memory(cmd) => memory_command(cmd, &config),
        Command::Export(cmd) => export_command(cmd, &config),
    }
}

/// Initialize logging; RUST_LOG wins, then --debug, --verbose, the configured level
fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn state_path(explicit: Option<PathBuf>, config: &Config) -> PathBuf {
    explicit.unwrap_or_else(|| config.storage.get_state_file())
}

/// Instruments named on the command line, else the watchlist's operable ones
fn resolve_tickers(cmd: &AnalyzeCmd, config: &Config) -> Result<Vec<String>> {
    if !cmd.tickers.is_empty() {
        return Ok(cmd.tickers.clone());
    }

    let path = cmd
        .watchlist
        .clone()
        .unwrap_or_else(|| config.data.get_watchlist_file());
    let watchlist = Watchlist::load(&path)
        .with_context(|| format!("No tickers given and watchlist {} is unusable", path.display()))?;

    let tickers = watchlist.operable();
    if tickers.is_empty() {
        bail!("Watchlist {} has no operable instruments", path.display());
    }
    tracing::info!(
        "Analyzing {} of {} watchlist entries from {}",
        tickers.len(),
        watchlist.entries().len(),
        path.display()
    );
    Ok(tickers)
}

/// Handle analyze command
fn analyze_command(cmd: AnalyzeCmd, config: &Config) -> Result<()> {
    let tickers = resolve_tickers(&cmd, config)?;
    let prices_dir = cmd.prices.clone().unwrap_or_else(|| config.data.get_prices_dir());
    let state_file = state_path(cmd.state.clone(), config);
    let as_of = cmd.date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let engine_config = EngineConfig::from(config);
    let engine = DecisionEngine::new(
        VolatilityRegimeClassifier::new(engine_config.classifier),
        ForestDirectionPredictor::new(engine_config.predictor),
    );
    let service = AnalysisService::new(
        CsvPriceSource::new(&prices_dir),
        JsonStateStore::new(&state_file),
        engine,
    );

    let results = service.analyze_many(&tickers, as_of);

    let mut reports = Vec::new();
    let mut failures = 0usize;
    for (ticker, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                eprintln!("✗ {}: {}", ticker, e);
            }
        }
    }

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                println!("{}", render_report(report));
            }
            let actions = reports.iter().filter(|r| r.outcome.is_action()).count();
            println!(
                "\n{} analyzed, {} new recommendations, {} failed",
                reports.len(),
                actions,
                failures
            );
        }
    }

    if let Some(path) = &cmd.export {
        let rows: Vec<ExportRow> = reports.iter().map(ExportRow::from_report).collect();
        export_to_file(path, &rows)
            .with_context(|| format!("Failed to export results to {}", path.display()))?;
    }

    if reports.is_empty() && failures > 0 {
        bail!("No instrument could be analyzed ({} failed)", failures);
    }
    Ok(())
}

/// Human-readable block for one analysis
fn render_report(report: &AnalysisReport) -> String {
    let mut out = format!(
        "{} @ {} | price {:.2} | regime {}\n  {}",
        report.instrument, report.date, report.price, report.regime, report.outcome
    );
    out.push_str(&format!(
        "\n  position {} | last decision {}",
        report.position,
        report
            .last_decision
            .map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    ));
    if let Some(accuracy) = report.predictability {
        out.push_str(&format!(" | model accuracy {:.3}", accuracy));
    }
    if let Some(volume) = report.average_volume {
        out.push_str(&format!(" | avg volume {:.0}", volume));
    }
    out
}

fn render_record(instrument: &str, record: &InstrumentRecord) -> String {
    format!(
        "{:<12} {}  {:>10.2}  {:<10} {:<9} {}",
        instrument,
        record.last_date,
        record.last_price,
        record.last_regime.as_str(),
        record.decision_label(),
        record.position
    )
}

/// Load the memory, refusing to continue over a corrupted file
fn load_memory(path: &Path) -> Result<TacticalMemory> {
    match JsonStateStore::new(path).load_checked() {
        StoreRecovery::Empty => Ok(TacticalMemory::new()),
        StoreRecovery::Loaded(memory) => Ok(memory),
        StoreRecovery::Corrupted(reason) => {
            bail!("Tactical memory at {} is corrupted: {}", path.display(), reason)
        }
    }
}

/// Handle memory command
fn memory_command(cmd: MemoryCmd, config: &Config) -> Result<()> {
    let path = state_path(cmd.state, config);
    let memory = load_memory(&path)?;

    if let Some(ticker) = &cmd.ticker {
        let record = memory
            .get(ticker)
            .with_context(|| format!("No record for {} in {}", ticker, path.display()))?;
        match cmd.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
            OutputFormat::Text => println!("{}", render_record(ticker, record)),
        }
        return Ok(());
    }

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&memory)?),
        OutputFormat::Text => {
            if memory.is_empty() {
                println!("No tactical memory stored at {}", path.display());
            }
            for (instrument, record) in memory.iter() {
                println!("{}", render_record(instrument, record));
            }
        }
    }
    Ok(())
}

/// Handle export command
fn export_command(cmd: ExportCmd, config: &Config) -> Result<()> {
    let path = state_path(cmd.state, config);
    let memory = load_memory(&path)?;
    if memory.is_empty() {
        tracing::warn!("Tactical memory at {} is empty; exporting header only", path.display());
    }

    export_to_file(&cmd.output, &rows_from_memory(&memory))
        .with_context(|| format!("Failed to export to {}", cmd.output.display()))?;
    println!("✓ Exported {} instruments to {}", memory.len(), cmd.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RoundOutcome;
    use crate::domain::{Decision, Direction, PositionStatus, Regime};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cli_app_parse_analyze() {
        let args = vec!["fractalis", "analyze", "WEGE3.SA", "VALE3.SA", "--prices", "data"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Analyze(cmd) => {
                assert_eq!(cmd.tickers, vec!["WEGE3.SA", "VALE3.SA"]);
                assert_eq!(cmd.prices, Some(PathBuf::from("data")));
                assert_eq!(cmd.format, OutputFormat::Text);
                assert!(cmd.date.is_none());
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_cli_app_parse_analyze_options() {
        let args = vec![
            "fractalis", "--debug", "analyze", "--watchlist", "w.json", "--format", "json",
            "--date", "2024-06-03", "--export", "out.csv",
        ];
        let app = CliApp::try_parse_from(args).unwrap();
        assert!(app.debug);

        match app.command {
            Command::Analyze(cmd) => {
                assert!(cmd.tickers.is_empty());
                assert_eq!(cmd.watchlist, Some(PathBuf::from("w.json")));
                assert_eq!(cmd.format, OutputFormat::Json);
                assert_eq!(cmd.date, NaiveDate::from_ymd_opt(2024, 6, 3));
                assert_eq!(cmd.export, Some(PathBuf::from("out.csv")));
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_cli_app_parse_memory_and_export() {
        let app = CliApp::try_parse_from(["fractalis", "memory", "WEGE3.SA", "--state", "s.json"]).unwrap();
        match app.command {
            Command::Memory(cmd) => {
                assert_eq!(cmd.ticker.as_deref(), Some("WEGE3.SA"));
                assert_eq!(cmd.state, Some(PathBuf::from("s.json")));
            }
            _ => panic!("Expected Memory command"),
        }

        let app = CliApp::try_parse_from(["fractalis", "export", "--output", "o.csv", "-c", "f.toml"]).unwrap();
        assert_eq!(app.config, Some(PathBuf::from("f.toml")));
        assert!(matches!(app.command, Command::Export(_)));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(CliApp::try_parse_from(["fractalis", "memory", "--format", "xml"]).is_err());
        assert!(CliApp::try_parse_from(["fractalis", "export"]).is_err());
    }

    #[test]
    fn test_resolve_tickers_from_watchlist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        fs::write(
            &path,
            r#"[{"ticker": "A.SA", "status": "Operável"}, {"ticker": "B.SA", "status": "Ilíquido"}]"#,
        )
        .unwrap();

        let app = CliApp::try_parse_from(["fractalis", "analyze", "--watchlist", path.to_str().unwrap()]).unwrap();
        let Command::Analyze(cmd) = app.command else {
            panic!("Expected Analyze command");
        };
        assert_eq!(resolve_tickers(&cmd, &Config::default()).unwrap(), vec!["A.SA".to_string()]);
    }

    #[test]
    fn test_load_memory_reports_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("estado.json");
        assert!(load_memory(&path).unwrap().is_empty());

        fs::write(&path, "{ broken").unwrap();
        let err = load_memory(&path).unwrap_err();
        assert!(err.to_string().contains("corrupted"));
    }

    #[test]
    fn test_export_empty_memory_writes_header() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let cmd = ExportCmd {
            output: output.clone(),
            state: Some(dir.path().join("missing.json")),
        };

        export_command(cmd, &Config::default()).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Ativo,Data,Preço,Regime,Decisão,Posição\n"
        );
    }

    #[test]
    fn test_render_report() {
        let report = AnalysisReport {
            instrument: "WEGE3.SA".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            price: 36.4,
            regime: Regime::Stable,
            emitted: Some(Decision::Buy),
            last_decision: Some(Decision::Buy),
            position: PositionStatus::Open,
            position_changed: true,
            outcome: RoundOutcome::Entered(Direction::Buy),
            predictability: Some(0.6123),
            average_volume: None,
        };

        let text = render_report(&report);
        assert!(text.starts_with("WEGE3.SA @ 2024-06-03 | price 36.40 | regime Estável"));
        assert!(text.contains("new recommendation: BUY"));
        assert!(text.contains("position Aberta | last decision BUY | model accuracy 0.612"));
    }
}
