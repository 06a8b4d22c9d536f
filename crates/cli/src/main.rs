// nadlan CLI - headless listing pipeline operations

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use nadlan_core::classify::{assign_canonical_names, classify_columns};
use nadlan_core::config::{ListingKind, Metric, OutputConfig, RunConfig, Source, DEFAULT_SAMPLE_ROWS};
use nadlan_core::display;
use nadlan_core::error::CoreError;
use nadlan_core::load::load_table;
use nadlan_core::model::{ListingCollection, Table};
use nadlan_core::pipeline;

use exit_codes::{core_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "nadlan")]
#[command(about = "Normalize and analyze real-estate listing exports")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// What to run on: a TOML config file, or the same knobs as flags.
#[derive(Args)]
struct Target {
    /// Path to a TOML run config
    #[arg(conflicts_with_all = ["file", "source", "kind", "metric", "sample_rows", "no_header"])]
    config: Option<PathBuf>,

    /// Data file for a config-less run
    #[arg(long, requires = "source", requires = "kind")]
    file: Option<PathBuf>,

    /// Listing site the export came from
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Sale or rental listings
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Comparison metric (defaults per kind)
    #[arg(long, value_enum)]
    metric: Option<MetricArg>,

    /// Rows sampled per column for classification and noise dropping
    #[arg(long)]
    sample_rows: Option<usize>,

    /// The data file has no leading header row
    #[arg(long)]
    no_header: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Madlan,
    Yad2,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Sale,
    Rental,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    Price,
    PricePerMeter,
}

impl Target {
    /// Resolve to a run config plus the directory data paths are
    /// relative to: the config file's directory, or the working
    /// directory in config-less mode.
    fn resolve(self) -> Result<(RunConfig, PathBuf), CliError> {
        if let Some(ref path) = self.config {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::usage(format!("cannot read config {}: {e}", path.display()))
            })?;
            let config = RunConfig::from_toml(&text).map_err(CliError::core)?;
            let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            return Ok((config, base_dir));
        }

        let file = self
            .file
            .ok_or_else(|| CliError::usage("either a config path or --file is required"))?;
        let source = match self.source {
            Some(SourceArg::Madlan) => Source::Madlan,
            Some(SourceArg::Yad2) => Source::Yad2,
            None => return Err(CliError::usage("--source is required with --file")),
        };
        let kind = match self.kind {
            Some(KindArg::Sale) => ListingKind::Sale,
            Some(KindArg::Rental) => ListingKind::Rental,
            None => return Err(CliError::usage("--kind is required with --file")),
        };
        let metric = self.metric.map(|m| match m {
            MetricArg::Price => Metric::Price,
            MetricArg::PricePerMeter => Metric::PricePerMeter,
        });

        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "run".to_string());
        let config = RunConfig {
            name,
            file: file.to_string_lossy().into_owned(),
            source,
            kind,
            metric,
            sample_rows: self.sample_rows.unwrap_or(DEFAULT_SAMPLE_ROWS),
            has_header: !self.no_header,
            output: OutputConfig::default(),
        };
        config.validate().map_err(CliError::core)?;
        Ok((config, PathBuf::from(".")))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and every analysis
    #[command(after_help = "\
Examples:
  nadlan run listings.toml
  nadlan run listings.toml --json
  nadlan run listings.toml --output report.json
  nadlan run --file listings.csv --source madlan --kind sale")]
    Run {
        #[command(flatten)]
        target: Target,

        /// Output the report as JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a run config without touching the data file
    Validate {
        #[command(flatten)]
        target: Target,
    },

    /// Normalize the input and print the canonical table as CSV
    #[command(after_help = "\
Examples:
  nadlan normalize listings.toml
  nadlan normalize listings.toml -o clean.csv
  nadlan normalize --file rentals.csv --source yad2 --kind rental --json")]
    Normalize {
        #[command(flatten)]
        target: Target,

        /// Write CSV output to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output rows as JSON objects keyed by canonical field name
        #[arg(long)]
        json: bool,
    },

    /// Show the per-column classification for the input
    Classify {
        #[command(flatten)]
        target: Target,
    },

    /// Rank listings priced strictly below the mean of the active metric
    Cheaper {
        #[command(flatten)]
        target: Target,

        /// Output JSON to stdout instead of a human table
        #[arg(long)]
        json: bool,
    },

    /// Group listings that share an address or a street
    #[command(after_help = "\
Examples:
  nadlan duplicates listings.toml --by address
  nadlan duplicates listings.toml --by street --json")]
    Duplicates {
        #[command(flatten)]
        target: Target,

        /// Grouping key
        #[arg(long, value_enum)]
        by: GroupBy,

        /// Output JSON to stdout instead of a human table
        #[arg(long)]
        json: bool,
    },

    /// Per-area aggregates of the active metric
    Areas {
        #[command(flatten)]
        target: Target,

        /// Output JSON to stdout instead of a human table
        #[arg(long)]
        json: bool,
    },

    /// Summary statistics for the input
    Stats {
        #[command(flatten)]
        target: Target,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupBy {
    Address,
    Street,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            target,
            json,
            output,
        } => cmd_run(target, json, output),
        Commands::Validate { target } => cmd_validate(target),
        Commands::Normalize {
            target,
            output,
            json,
        } => cmd_normalize(target, output, json),
        Commands::Classify { target } => cmd_classify(target),
        Commands::Cheaper { target, json } => cmd_cheaper(target, json),
        Commands::Duplicates { target, by, json } => cmd_duplicates(target, by, json),
        Commands::Areas { target, json } => cmd_areas(target, json),
        Commands::Stats { target, json } => cmd_stats(target, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
            eprintln!("error: {message}");
            if let Some(hint) = hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: msg.into(),
            hint: None,
        }
    }

    /// Map an engine error onto the exit-code registry.
    pub fn core(err: CoreError) -> Self {
        let hint = match &err {
            CoreError::UnrecognizedSchema { .. } => Some(
                "only known column-count layouts are supported; check source and kind"
                    .to_string(),
            ),
            _ => None,
        };
        Self {
            code: core_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}

fn load_collection(
    config: &RunConfig,
    base_dir: &Path,
) -> Result<ListingCollection, CliError> {
    pipeline::load_and_run(config, base_dir).map_err(CliError::core)
}

fn to_json(value: &impl serde::Serialize) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: exit_codes::EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn cmd_run(target: Target, json: bool, output: Option<PathBuf>) -> Result<(), CliError> {
    let (config, base_dir) = target.resolve()?;
    let collection = load_collection(&config, &base_dir)?;
    let report = pipeline::analyze(&config, &collection);

    let json_str = to_json(&report)?;

    if let Some(ref path) = output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::usage(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    // Config-driven exports, resolved like the data file.
    if let Some(ref csv_out) = config.output.csv {
        let fields = display::display_fields(&collection, config.source, config.kind);
        let headers: Vec<String> = fields.iter().map(|f| f.label.clone()).collect();
        let rows = display::project(&collection, &fields);
        let csv = display::to_csv(&headers, &rows).map_err(CliError::core)?;
        let path = base_dir.join(csv_out);
        std::fs::write(&path, csv)
            .map_err(|e| CliError::usage(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(ref json_out) = config.output.json {
        let path = base_dir.join(json_out);
        std::fs::write(&path, &json_str)
            .map_err(|e| CliError::usage(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &report.stats;
    eprintln!(
        "{}: {} {} listings from {}, {} with a price change",
        report.meta.name, s.listings, config.kind, config.source, s.price_changes,
    );
    if let Some(mean) = s.mean {
        eprintln!(
            "{}: mean {:.2}, {} below average",
            report.meta.metric,
            mean,
            report.below_average.rows.len(),
        );
    }
    eprintln!(
        "duplicates: {} same-address rows, {} same-street rows; {} areas",
        report.same_address.len(),
        report.same_street.len(),
        report.areas.len(),
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn cmd_validate(target: Target) -> Result<(), CliError> {
    let (config, _) = target.resolve()?;
    eprintln!(
        "ok: {} ({} {}, metric {})",
        config.name,
        config.source,
        config.kind,
        config.metric(),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

fn cmd_normalize(target: Target, output: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let (config, base_dir) = target.resolve()?;
    let collection = load_collection(&config, &base_dir)?;
    let fields = display::display_fields(&collection, config.source, config.kind);
    let rows = display::project(&collection, &fields);

    if json {
        let objects: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                fields
                    .iter()
                    .zip(row)
                    .map(|(f, v)| (f.name.clone(), serde_json::Value::String(v.clone())))
                    .collect::<serde_json::Map<_, _>>()
                    .into()
            })
            .collect();
        println!("{}", to_json(&objects)?);
        return Ok(());
    }

    let headers: Vec<String> = fields.iter().map(|f| f.label.clone()).collect();
    let csv = display::to_csv(&headers, &rows).map_err(CliError::core)?;

    if let Some(ref path) = output {
        std::fs::write(path, csv)
            .map_err(|e| CliError::usage(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    } else {
        print!("{csv}");
    }

    eprintln!("{} listings, {} fields", collection.len(), fields.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

fn cmd_classify(target: Target) -> Result<(), CliError> {
    let (config, base_dir) = target.resolve()?;
    let raw =
        load_table(&base_dir.join(&config.file), config.has_header).map_err(CliError::core)?;
    let table = Table::from_raw(&raw);

    let types = classify_columns(&table, config.source, config.sample_rows);
    let names = assign_canonical_names(&types);

    for (i, name) in names.iter().enumerate() {
        println!("{i}\t{name}");
    }
    eprintln!(
        "{} columns classified with the {} profile",
        names.len(),
        config.source,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// cheaper
// ---------------------------------------------------------------------------

fn cmd_cheaper(target: Target, json: bool) -> Result<(), CliError> {
    let (config, base_dir) = target.resolve()?;
    let collection = load_collection(&config, &base_dir)?;
    let report = nadlan_core::analyze::below_average(&collection, config.metric());

    if json {
        println!("{}", to_json(&report)?);
        return Ok(());
    }

    match report.mean {
        Some(mean) => eprintln!("mean {}: {:.2}", config.metric(), mean),
        None => eprintln!("no listing carries the {} metric", config.metric()),
    }
    for row in &report.rows {
        println!(
            "{}\t{:.2}\t{}\t{}\t{}",
            row.address.as_deref().unwrap_or("-"),
            row.value,
            row.difference,
            row.percentage,
            row.link.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// duplicates
// ---------------------------------------------------------------------------

fn cmd_duplicates(target: Target, by: GroupBy, json: bool) -> Result<(), CliError> {
    let (config, base_dir) = target.resolve()?;
    let collection = load_collection(&config, &base_dir)?;

    match by {
        GroupBy::Address => {
            let rows = nadlan_core::duplicates::find_same_address(&collection);
            if json {
                println!("{}", to_json(&rows)?);
                return Ok(());
            }
            for row in &rows {
                println!(
                    "{}\t{}\t{}",
                    row.address,
                    format_price(row.price),
                    row.link.as_deref().unwrap_or("-"),
                );
            }
            eprintln!("{} rows share an address with another listing", rows.len());
        }
        GroupBy::Street => {
            let mode = nadlan_core::duplicates::StreetNameMode::for_kind(config.kind);
            let rows = nadlan_core::duplicates::find_same_street(&collection, mode);
            if json {
                println!("{}", to_json(&rows)?);
                return Ok(());
            }
            for row in &rows {
                println!(
                    "{}\t{}\t{}\t{}",
                    row.street,
                    row.address,
                    format_price(row.price),
                    row.link.as_deref().unwrap_or("-"),
                );
            }
            eprintln!("{} rows share a street with another listing", rows.len());
        }
    }
    Ok(())
}

fn format_price(price: Option<i64>) -> String {
    match price {
        Some(p) => p.to_string(),
        None => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// areas
// ---------------------------------------------------------------------------

fn cmd_areas(target: Target, json: bool) -> Result<(), CliError> {
    let (config, base_dir) = target.resolve()?;
    let collection = load_collection(&config, &base_dir)?;
    let rows = nadlan_core::analyze::area_stats(&collection, config.metric());

    if json {
        println!("{}", to_json(&rows)?);
        return Ok(());
    }
    for row in &rows {
        println!(
            "{}\t{:.2}\t{:.2}\t{:.2}\t{}",
            row.area, row.mean, row.min, row.max, row.count,
        );
    }
    eprintln!("{} areas", rows.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

fn cmd_stats(target: Target, json: bool) -> Result<(), CliError> {
    let (config, base_dir) = target.resolve()?;
    let collection = load_collection(&config, &base_dir)?;
    let stats = nadlan_core::analyze::summary_stats(&collection, config.metric());

    if json {
        println!("{}", to_json(&stats)?);
        return Ok(());
    }

    println!("listings:      {}", stats.listings);
    println!("metric:        {}", config.metric());
    match (stats.min, stats.max, stats.mean) {
        (Some(min), Some(max), Some(mean)) => {
            println!("min:           {min:.2}");
            println!("max:           {max:.2}");
            println!("mean:          {mean:.2}");
        }
        _ => println!("no listing carries the active metric"),
    }
    println!("price changes: {}", stats.price_changes);
    Ok(())
}
