use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;
use tracing_subscriber::EnvFilter;

use metashare::{
    compare, default_archive_path, expand_classpath, payload_preview, read_archive,
    read_archive_header, resolve_chain, write_archive, ArchiveHeader, ArchiveLayer,
    ArchiveSpec, ClasspathEntry, ClasspathFingerprint, LayerId, LayerKind, ValidationVerdict,
};
use metashare::{
    format_classpath_diff, ArchiveLoader, ConsoleReporter, DiagCategory, DiagEvent,
    DiagnosticsReporter, LayerOutcome, LoadReport, LogSpec, PolicyConfig, PolicyDecision,
    PolicyEngine, ShareMode, ShareSettings,
};

#[derive(Parser)]
#[command(name = "metashare")]
#[command(about = "Layered shared-metadata archives: dump, validate, and share class metadata")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to settings file
    #[arg(short, long, env = "METASHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the classpath and write an archive
    Dump {
        /// Classpath entry to record (repeatable; `dir/*` expands to jars)
        #[arg(short = 'p', long = "classpath")]
        classpath: Vec<String>,

        /// Output archive path (defaults to the user cache directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base archive to layer on top of (produces a top archive)
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// File whose bytes become the metadata payload
        #[arg(long)]
        payload: Option<PathBuf>,
    },

    /// Validate archives against the live classpath and decide sharing
    Run {
        /// Archive path: `base.msa` or `base.msa:top.msa`
        #[arg(short, long)]
        archive: Option<String>,

        /// Share mode
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Classpath entry (repeatable)
        #[arg(short = 'p', long = "classpath")]
        classpath: Vec<String>,

        /// Log selector, e.g. paths=info (repeatable)
        #[arg(short, long)]
        log: Vec<String>,

        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },

    /// Show an archive's header and recorded classpath
    Inspect {
        /// Archive file
        archive: PathBuf,

        /// Include a base64 preview of the payload
        #[arg(long)]
        payload_preview: bool,

        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },

    /// Diff an archive's recorded classpath against the live one
    Diff {
        /// Archive file
        archive: PathBuf,

        /// Classpath entry (repeatable)
        #[arg(short = 'p', long = "classpath")]
        classpath: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Off,
    Auto,
    On,
}

impl From<ModeArg> for ShareMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Off => ShareMode::Off,
            ModeArg::Auto => ShareMode::Auto,
            ModeArg::On => ShareMode::On,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Yaml,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("metashare=debug,info")
    } else {
        EnvFilter::new("metashare=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(e);
            ExitCode::FAILURE
        }
    }
}

fn print_error(err: Box<dyn std::error::Error>) {
    eprintln!("\x1b[31m✗ Error:\x1b[0m {}", err);
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = ShareSettings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Dump { classpath, output, base, payload } => {
            cmd_dump(&settings, classpath, output, base, payload)
        }

        Commands::Run { archive, mode, classpath, log, output } => {
            cmd_run(&settings, archive, mode.map(Into::into), classpath, log, output)
        }

        Commands::Inspect { archive, payload_preview, output } => {
            cmd_inspect(&archive, payload_preview, output)
        }

        Commands::Diff { archive, classpath } => cmd_diff(&settings, &archive, classpath),
    }
}

fn cmd_dump(
    settings: &ShareSettings,
    classpath: Vec<String>,
    output: Option<PathBuf>,
    base: Option<PathBuf>,
    payload: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = if classpath.is_empty() {
        settings.classpath.clone()
    } else {
        classpath
    };
    if raw.is_empty() {
        return Err("Classpath required for dump (--classpath or settings file)".into());
    }

    let classpath = expand_classpath(&raw);
    info!("Capturing fingerprint of {} classpath entries", classpath.len());
    let fingerprint = ClasspathFingerprint::capture(&classpath)?;

    let payload = match payload {
        Some(p) => fs::read(&p)?,
        None => Vec::new(),
    };

    let output = output.unwrap_or_else(default_archive_path);

    match base {
        Some(base_path) => {
            let base_file = read_archive(&base_path)?;
            if base_file.header.kind != LayerKind::Base {
                return Err(format!("{} is not a base archive", base_path.display()).into());
            }
            let base_layer = base_file.into_layer();

            let top = ArchiveLayer::top(fingerprint, payload, &base_layer);
            write_archive(&output, &top, Some(&base_path))?;

            println!("✓ Dumped top archive to {}", output.display());
            println!("  Base: {}", base_path.display());
            println!("  {} classpath entries, {} payload bytes", top.entry_count(), top.payload.len());
        }
        None => {
            let layer = ArchiveLayer::base(fingerprint, payload);
            write_archive(&output, &layer, None)?;

            println!("✓ Dumped base archive to {}", output.display());
            println!("  {} classpath entries, {} payload bytes", layer.entry_count(), layer.payload.len());
        }
    }

    Ok(())
}

fn cmd_run(
    settings: &ShareSettings,
    archive: Option<String>,
    mode: Option<ShareMode>,
    classpath: Vec<String>,
    log: Vec<String>,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = mode.unwrap_or(settings.mode);
    let log_selectors = if log.is_empty() { settings.log.clone() } else { log };
    let log_spec = LogSpec::parse(&log_selectors)?;

    if mode == ShareMode::Off {
        info!("Sharing disabled; classes load without archives");
        println!("Sharing outcome: unshared (mode off)");
        return Ok(());
    }

    let archive_raw = archive
        .or_else(|| settings.archive.clone())
        .unwrap_or_else(|| default_archive_path().display().to_string());
    let spec = ArchiveSpec::parse(&archive_raw)?;

    let raw_classpath = if classpath.is_empty() {
        settings.classpath.clone()
    } else {
        classpath
    };
    let classpath = expand_classpath(&raw_classpath);

    let mut reporter = ConsoleReporter::new(log_spec.info_categories());

    let chain = match resolve_chain(&spec) {
        Ok(chain) => chain,
        Err(e) if mode == ShareMode::Auto => {
            reporter.report(&DiagEvent::warning(DiagCategory::Archive, e.to_string()));
            reporter.report(&DiagEvent::info(
                DiagCategory::General,
                "continuing with classes loaded without shared archives",
            ));
            println!("Sharing outcome: unshared");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let path_by_id: HashMap<LayerId, PathBuf> = chain
        .iter()
        .map(|f| (f.header.id, f.path.clone()))
        .collect();
    let layers: Vec<ArchiveLayer> = chain.into_iter().map(|f| f.into_layer()).collect();

    info!(
        "Validating {} archive layer(s) against {} classpath entries",
        layers.len(),
        classpath.len()
    );

    let live = ClasspathFingerprint::capture_live(&classpath);
    let mut loader = ArchiveLoader::new();
    let report = loader.load(&layers, || live.clone());

    let engine = PolicyEngine::new(
        PolicyConfig::new(mode).with_path_diag(log_spec.path_diag_enabled()),
    );
    let decision = engine.decide(&report);

    for event in &decision.events {
        reporter.report(event);
    }

    if log_spec.path_diag_enabled() {
        print_classpath_drift(&report, &layers, &live, &path_by_id);
    }

    match output {
        OutputFormat::Json => {
            let doc = run_document(mode, &decision, &report);
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Yaml => {
            let doc = run_document(mode, &decision, &report);
            println!("{}", serde_yaml::to_string(&doc)?);
        }
        OutputFormat::Table => {
            println!();
            let rows: Vec<LayerRow> = report
                .outcomes
                .iter()
                .map(|o| LayerRow::new(o, &layers, &path_by_id))
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);

            println!(
                "\nSharing outcome: {} ({} of {} layers accepted)",
                decision.outcome,
                report.accepted_count(),
                report.outcomes.len()
            );
        }
    }

    if decision.fatal {
        return Err("Archive validation failed and sharing is required (mode on)".into());
    }

    Ok(())
}

fn run_document(mode: ShareMode, decision: &PolicyDecision, report: &LoadReport) -> serde_json::Value {
    serde_json::json!({
        "mode": mode.as_str(),
        "outcome": decision.outcome.as_str(),
        "fatal": decision.fatal,
        "layers": report.outcomes,
        "events": decision.events,
    })
}

fn print_classpath_drift(
    report: &LoadReport,
    layers: &[ArchiveLayer],
    live: &ClasspathFingerprint,
    path_by_id: &HashMap<LayerId, PathBuf>,
) {
    for outcome in report.rejected() {
        if outcome.verdict == ValidationVerdict::BaseRejected {
            continue;
        }

        if let Some(layer) = layers.iter().find(|l| l.id == outcome.layer_id) {
            let shown = path_by_id
                .get(&outcome.layer_id)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| outcome.layer_id.to_string());

            println!("\nClasspath drift for {} ({} archive):", shown, outcome.kind);
            println!("{}", format_classpath_diff(&layer.fingerprint, live));
        }
    }
}

fn cmd_inspect(
    archive: &Path,
    show_payload: bool,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let header = read_archive_header(archive)?;

    match output {
        OutputFormat::Json => {
            let doc = inspect_document(archive, &header, show_payload)?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Yaml => {
            let doc = inspect_document(archive, &header, show_payload)?;
            println!("{}", serde_yaml::to_string(&doc)?);
        }
        OutputFormat::Table => {
            println!("Archive: {}", archive.display());
            println!("Layer: {} ({})", header.id, header.kind);

            if let Some(base_ref) = header.base_ref {
                println!("Base layer: {}", base_ref);
            }
            if let Some(base_path) = &header.base_path {
                println!("Base archive: {}", base_path);
            }

            println!("Created: {}", header.created_at.format("%Y-%m-%dT%H:%M:%SZ"));
            let digest: String = header.payload_sha256.chars().take(12).collect();
            println!("Payload: {} stored bytes (sha256 {}…)", header.payload_len, digest);

            println!("\nClasspath ({} entries):\n", header.entry_count());
            let rows: Vec<EntryRow> = header.fingerprint.entries.iter().map(EntryRow::from).collect();
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);

            if show_payload {
                let file = read_archive(archive)?;
                println!("\nPayload preview (base64): {}", payload_preview(&file.payload, 48));
            }
        }
    }

    Ok(())
}

fn inspect_document(
    archive: &Path,
    header: &ArchiveHeader,
    show_payload: bool,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let mut doc = serde_json::to_value(header)?;
    if show_payload {
        let file = read_archive(archive)?;
        doc["payload_preview"] = serde_json::Value::String(payload_preview(&file.payload, 48));
    }
    Ok(doc)
}

fn cmd_diff(
    settings: &ShareSettings,
    archive: &Path,
    classpath: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let header = read_archive_header(archive)?;

    let raw = if classpath.is_empty() {
        settings.classpath.clone()
    } else {
        classpath
    };
    let classpath = expand_classpath(&raw);
    let live = ClasspathFingerprint::capture_live(&classpath);

    let verdict = compare(&header.fingerprint, &live);
    if verdict.is_valid() {
        println!("✓ Classpath matches the archive ({} entries)", header.entry_count());
        return Ok(());
    }

    println!("✗ Verdict: {}", verdict);
    println!();
    println!("{}", format_classpath_diff(&header.fingerprint, &live));

    Ok(())
}

#[derive(Tabled)]
struct LayerRow {
    #[tabled(rename = "Layer")]
    layer: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Archive")]
    archive: String,
    #[tabled(rename = "Entries")]
    entries: String,
    #[tabled(rename = "Verdict")]
    verdict: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl LayerRow {
    fn new(
        outcome: &LayerOutcome,
        layers: &[ArchiveLayer],
        path_by_id: &HashMap<LayerId, PathBuf>,
    ) -> Self {
        let entries = layers
            .iter()
            .find(|l| l.id == outcome.layer_id)
            .map(|l| l.entry_count().to_string())
            .unwrap_or_else(|| "-".to_string());
        let archive = path_by_id
            .get(&outcome.layer_id)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());

        Self {
            layer: outcome.layer_id.short(),
            kind: outcome.kind.to_string(),
            archive,
            entries,
            verdict: outcome.verdict.to_string(),
            status: if outcome.accepted() { "✓" } else { "✗" }.to_string(),
        }
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Checksum")]
    checksum: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

impl From<&ClasspathEntry> for EntryRow {
    fn from(entry: &ClasspathEntry) -> Self {
        let kind = if entry.is_directory { "dir" } else { "jar" };
        let checksum = entry
            .checksum
            .as_ref()
            .map(|c| c.chars().take(12).collect())
            .unwrap_or_else(|| "-".to_string());
        let modified = entry
            .timestamp
            .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| "absent".to_string());

        Self {
            path: entry.path.clone(),
            kind: kind.to_string(),
            checksum,
            modified,
        }
    }
}
