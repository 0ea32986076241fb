use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde_json::{Map, Value};
use tabwriter::TabWriter;

use collmerge_io::prelude::*;
use collmerge_io::version::REPORT_V;

/// Exit code for unreadable or malformed input.
const EXIT_INPUT: i32 = 1;
/// Exit code for configuration errors that abort a merge before any mutation.
const EXIT_MERGE: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "collmerge",
    version,
    about = "Reconcile hand-curated request collections with generated reference collections"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Warnings and errors only (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge reference collections into a working collection.
    Merge {
        /// Merge configuration (YAML)
        #[arg(long)]
        config: PathBuf,
        /// Working collection JSON
        #[arg(long)]
        working: PathBuf,
        /// Directory holding `<base>.postman_collection.json` references
        #[arg(long)]
        refdir: PathBuf,
        /// Output path for the merged collection
        #[arg(long)]
        out: PathBuf,
        /// Also write the machine-readable merge report here
        #[arg(long)]
        report_json: Option<PathBuf>,
    },
    /// Strip volatile ids and sort headers / query params for stable diffs.
    Tidy {
        input: PathBuf,
        /// Output path (defaults to rewriting the input)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Nest flat `a/b/c` top-level folders.
    Restructure {
        input: PathBuf,
        /// Output path (defaults to rewriting the input)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the endpoints of a collection with their identity keys.
    Inspect {
        input: PathBuf,
        /// Include endpoints under `_retired` folders
        #[arg(long)]
        include_retired: bool,
        /// Key endpoints by `operationId:` markers when present
        #[arg(long)]
        prefer_operation_id: bool,
        /// Only rows whose key or name contains this text
        #[arg(long)]
        grep: Option<String>,
    },
    /// Print the SHA-256 content fingerprint of a collection.
    Fingerprint { input: PathBuf },
}

/// A failure with the process exit code it maps to.
struct Failure {
    code: i32,
    err: anyhow::Error,
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self { code: EXIT_INPUT, err }
    }
}

fn fail(code: i32, err: impl Into<anyhow::Error>) -> Failure {
    Failure {
        code,
        err: err.into(),
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if let Err(f) = run(cli.cmd) {
        eprintln!("error: {:#}", f.err);
        process::exit(f.code);
    }
}

fn run(cmd: Command) -> Result<(), Failure> {
    match cmd {
        Command::Merge {
            config,
            working,
            refdir,
            out,
            report_json,
        } => merge(&config, &working, &refdir, &out, report_json.as_deref()),
        Command::Tidy { input, out } => {
            let text = read(&input)?;
            let mut value: Value = serde_json::from_str(&text)
                .map_err(|e| fail(EXIT_INPUT, CollectionJsonError::InvalidJson(e)))?;
            tidy_collection(&mut value);

            let out = out.unwrap_or(input);
            write_json(&out, &value)?;
            println!("Tidied {}", out.display());
            Ok(())
        }
        Command::Restructure { input, out } => {
            let mut collection = read_collection(&input)?;
            let nested = nest_flat_folders(&mut collection);

            let out = out.unwrap_or(input);
            write_json(&out, &collection)?;
            println!("Restructured {nested} folder(s): {}", out.display());
            Ok(())
        }
        Command::Inspect {
            input,
            include_retired,
            prefer_operation_id,
            grep,
        } => {
            let collection = read_collection(&input)?;
            inspect(&collection, include_retired, prefer_operation_id, grep.as_deref())
                .context("writing to stdout")?;
            Ok(())
        }
        Command::Fingerprint { input } => {
            let collection = read_collection(&input)?;
            let fp = hashing::collection_fingerprint(&collection).context("serializing collection")?;
            println!("{fp}");
            Ok(())
        }
    }
}

fn merge(
    config: &Path,
    working: &Path,
    refdir: &Path,
    out: &Path,
    report_json: Option<&Path>,
) -> Result<(), Failure> {
    let config = load_config(config).map_err(|e| match e {
        ConfigError::Invalid { .. } => fail(EXIT_MERGE, e),
        other => fail(EXIT_INPUT, other),
    })?;
    let mut collection = read_collection(working)?;
    let references = load_references(refdir, &config).map_err(|e| fail(EXIT_INPUT, e))?;

    let report = merge_collection(&mut collection, &references, &config)
        .map_err(|e| fail(EXIT_MERGE, e))?;

    let mut outputs = vec![(out, to_pretty_json(&collection).context("serializing output")?)];
    if let Some(path) = report_json {
        let text = to_pretty_json(&report_envelope(&report)?).context("serializing report")?;
        outputs.push((path, text));
    }
    write_all(&outputs)?;
    for skipped in report.skipped_services() {
        info!("skipped service '{}': no reference collection", skipped.name);
    }

    println!(
        "Updated: {}  Added: {}  Retired: {}",
        report.updated, report.added, report.retired
    );
    Ok(())
}

/// `{"v": REPORT_V, ...report}`.
fn report_envelope(report: &MergeReport) -> anyhow::Result<Value> {
    let mut env = Map::new();
    env.insert("v".to_string(), Value::from(REPORT_V));
    if let Value::Object(fields) = serde_json::to_value(report)? {
        env.extend(fields);
    }
    Ok(Value::Object(env))
}

fn inspect(
    collection: &Collection,
    include_retired: bool,
    prefer_operation_id: bool,
    grep: Option<&str>,
) -> io::Result<()> {
    let index = EndpointIndex::build(
        &collection.item,
        WalkOptions {
            include_retired,
            prefer_operation_id,
        },
    );

    let mut tw = TabWriter::new(io::stdout());
    writeln!(tw, "key\tname\tfolder")?;
    for entry in index.iter() {
        let key = entry.key.to_string();
        if let Some(needle) = grep {
            if !key.contains(needle) && !entry.name.contains(needle) {
                continue;
            }
        }
        writeln!(tw, "{key}\t{}\t{}", entry.name, entry.trail.join("/"))?;
    }
    tw.flush()
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn read_collection(path: &Path) -> anyhow::Result<Collection> {
    let text = read(path)?;
    parse_collection_json_str(&text).with_context(|| format!("{}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let text = to_pretty_json(value).context("serializing output")?;
    write_all(&[(path, text)])
}

/// Write every file or none: each is staged next to its target and only
/// renamed into place once all stages succeeded.
fn write_all(outputs: &[(&Path, String)]) -> anyhow::Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(outputs.len());
    for (path, text) in outputs {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Err(e) = fs::write(&tmp, text) {
            for (t, _) in &staged {
                let _ = fs::remove_file(t);
            }
            return Err(e).with_context(|| format!("cannot write {}", path.display()));
        }
        staged.push((tmp, *path));
    }
    for (tmp, path) in staged {
        fs::rename(&tmp, path).with_context(|| format!("cannot write {}", path.display()))?;
    }
    Ok(())
}
