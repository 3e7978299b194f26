mod data;
mod data_builtin;
mod data_dir;
mod error;
mod report;
pub mod util;

pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::util;
    pub use log::{debug, error, info, trace, warn};
    pub use serde::Deserialize;
    pub use std::fs::create_dir_all;
    pub use std::path::{Path, PathBuf};
}

use autoalgo::{
    ArtifactStore, CorrectnessChecker, CorrectnessConfig, Evaluator, Pipeline, ProfileConfig,
    Profiler, RandomGraph, Registry, RunMetadata, Weights,
};
use clap::{Args, Parser, Subcommand};
use data::DataSource;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use prelude::*;
use std::process::exit;

#[global_allocator]
static GLOBAL: autoalgo::TracingAllocator = autoalgo::TracingAllocator;

const DEFAULT_CONFIG: &str = "autoalgo.toml";

const DEFAULT_PROBLEM: &str = "Find the minimum-cost path between two nodes of a \
directed graph with real edge weights, some of which may be negative.";

#[derive(serde_with::DeserializeFromStr, Debug, Clone, Copy)]
struct LogLevel(log::LevelFilter);

impl std::str::FromStr for LogLevel {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "error" | "Error" => Self(log::LevelFilter::Error),
            "warn" | "Warn" => Self(log::LevelFilter::Warn),
            "info" | "Info" => Self(log::LevelFilter::Info),
            "debug" | "Debug" => Self(log::LevelFilter::Debug),
            "trace" | "Trace" => Self(log::LevelFilter::Trace),
            _ => return Err(Error::BadLogLevel(s.to_string())),
        })
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        l.0
    }
}

#[derive(Debug, Default, Args, Deserialize)]
struct Flags {
    #[clap(long, arg_enum)]
    data_source: Option<DataSource>,
    /// Directory of proposal files, for --data-source dir.
    #[clap(long, parse(from_os_str))]
    proposal_dir: Option<PathBuf>,
    /// Don't write the JSON report.
    #[clap(long)]
    #[serde(default)]
    dry: Option<bool>,
    /// Dump the log onto stderr.
    #[clap(long)]
    #[serde(default)]
    stderr: Option<bool>,
    /// Log level.
    #[clap(long)]
    log_level: Option<LogLevel>,
    /// Root of the per-candidate artifacts.
    #[clap(long, parse(from_os_str))]
    experiments_dir: Option<PathBuf>,
    /// Root of the reports and logs.
    #[clap(long, parse(from_os_str))]
    report_dir: Option<PathBuf>,
    /// Seed of the input generator, random if unset.
    #[clap(long)]
    seed: Option<u64>,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Id of the batch, a fresh one if omitted.
    batch_id: Option<String>,
    /// Override config file
    #[clap(long, parse(from_os_str))]
    etc: Option<PathBuf>,

    #[clap(flatten)]
    cfg: Flags,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate and rank a batch of candidates.
    Run(RunArgs),
    /// Run the reference correctness suite against a built-in solver.
    Check {
        /// Entry point name of the solver.
        entry: String,
    },
}

#[derive(Debug, Parser)]
#[clap(name = "autoalgo")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

fn solution_rs() -> String {
    "solution.rs".to_owned()
}

fn default_problem() -> String {
    DEFAULT_PROBLEM.to_owned()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    config: Flags,
    #[serde(default)]
    weights: Weights,
    #[serde(default)]
    correctness: CorrectnessConfig,
    #[serde(default)]
    profile: ProfileConfig,
    /// Persisted sources are saved into this file
    #[serde(default = "solution_rs")]
    src_name: String,
    /// Statement handed to the proposal source.
    #[serde(default = "default_problem")]
    problem: String,
}

impl ConfigFile {
    fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = util::load_file(path)?;
        toml::from_str(&content).map_err(Error::TOMLParseError)
    }

    /// An explicit `--etc` must exist.  Without it, a missing
    /// `autoalgo.toml` means the built-in defaults.
    fn locate(etc: Option<&PathBuf>) -> Result<Self> {
        match etc {
            Some(p) => Self::load(p),
            None if Path::new(DEFAULT_CONFIG).exists() => Self::load(DEFAULT_CONFIG),
            None => Ok(Self {
                src_name: solution_rs(),
                problem: default_problem(),
                ..Default::default()
            }),
        }
    }
}

/// Replace `%x` with the path of this executable, so the default test
/// command runs `autoalgo check` in a child process.
fn expand_self(cmd: &mut [String]) -> Result<()> {
    let exe = std::env::current_exe().map_err(Error::IOError)?;
    let exe = util::ensure_utf8_path(&exe)?;
    for x in cmd {
        *x = x.replace("%x", exe);
    }
    Ok(())
}

fn init_logging(args: &RunArgs, etc: &ConfigFile, log_dir: &Path) -> Result<()> {
    let log_level = args
        .cfg
        .log_level
        .or(etc.config.log_level)
        .map_or_else(|| log::LevelFilter::Info, LogLevel::into);

    let use_stderr = args.cfg.stderr.or(etc.config.stderr).unwrap_or(false);

    let stderr_level = if use_stderr {
        log_level
    } else {
        // Dump errors to stderr even if it's not enabled for normal log.
        log::LevelFilter::Error
    };

    let console_fmt = "{h({d(%Y-%m-%d %H:%M:%S)(utc)} - {l}: {m}{n})}";
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(console_fmt)))
        .build();

    let text_fmt = "{d(%Y-%m-%d %H:%M:%S)(utc)} - {l}: {m}{n}";
    let log_path = log_dir.join("autoalgo.log");
    let log_file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(text_fmt)))
        .append(false)
        .build(log_path)
        .map_err(Error::IOError)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(stderr_level)))
                .build("stderr", Box::new(stderr)),
        )
        .appender(Appender::builder().build("file", Box::new(log_file)))
        .build(
            Root::builder()
                .appenders(["stderr", "file"])
                .build(log_level),
        )
        .map_err(Error::LogConfigError)?;
    log4rs::init_config(config).map_err(Error::LoggerError)?;
    Ok(())
}

async fn run_batch(args: RunArgs) -> Result<()> {
    let mut etc = ConfigFile::locate(args.etc.as_ref())?;
    let cfg = &args.cfg;

    let batch_id = args
        .batch_id
        .clone()
        .unwrap_or_else(autoalgo::new_batch_id);
    let report_dir = cfg
        .report_dir
        .as_ref()
        .or(etc.config.report_dir.as_ref())
        .cloned()
        .unwrap_or_else(|| "reports".into())
        .join(&batch_id);
    let experiments_dir = cfg
        .experiments_dir
        .as_ref()
        .or(etc.config.experiments_dir.as_ref())
        .cloned()
        .unwrap_or_else(|| "experiments".into())
        .join(&batch_id);

    create_dir_all(&report_dir).map_err(Error::IOError)?;
    init_logging(&args, &etc, &report_dir)?;
    info!("batch {} started", batch_id);

    let w = etc.weights;
    if (w.sum() - 1.0).abs() > 1e-9 {
        warn!("weights {:?} sum to {}, not 1", w, w.sum());
    }

    if etc.correctness.command.is_empty() {
        etc.correctness.command = ["%x", "check", "%e"].map(String::from).to_vec();
    }
    expand_self(&mut etc.correctness.command)?;
    debug!("test command: {:?}", etc.correctness.command);

    etc.profile.validate()?;
    let seed = cfg.seed.or(etc.config.seed);
    let generator = match seed {
        Some(seed) => {
            info!("input generator seeded with {}", seed);
            RandomGraph::seeded(seed)
        }
        None => RandomGraph::from_entropy(),
    };

    let evaluator = Evaluator::new(
        Registry::builtin(),
        CorrectnessChecker::new(etc.correctness.clone()),
        Profiler::new(etc.profile.clone(), generator),
    );
    let store = ArtifactStore::new(&experiments_dir, &etc.src_name);
    let mut pipeline = Pipeline::new(evaluator, store, etc.weights);

    let ds = cfg
        .data_source
        .or(etc.config.data_source)
        .unwrap_or(DataSource::Builtin);
    let proposal_dir = cfg.proposal_dir.as_ref().or(etc.config.proposal_dir.as_ref());
    let mut source = ds.open(proposal_dir)?;

    let dry = cfg.dry.or(etc.config.dry) == Some(true);
    let mut sink = report::JsonReportSink::new(&report_dir, dry);

    let meta = RunMetadata::new(&etc.problem, seed);
    let r = pipeline.run(&batch_id, meta, &mut *source, &mut sink).await?;
    print!("{}", report::ranking_table(&r));
    Ok(())
}

fn check(entry: &str) -> Result<bool> {
    let registry = Registry::builtin();
    let solver = registry.get(entry).ok_or_else(|| {
        Error::UnknownEntry(entry.to_owned(), registry.entries().map(String::from).collect())
    })?;
    let r = autoalgo::suite::run_suite(solver);
    println!("{}", r);
    Ok(r.is_success())
}

#[async_std::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Command::Check { entry } => match check(&entry) {
            Ok(true) => 0,
            Ok(false) => 1,
            Err(e) => {
                eprintln!("error: {}", e);
                2
            }
        },
        Command::Run(args) => match run_batch(args).await {
            Ok(()) => 0,
            Err(e) => {
                // Logging may not be up yet.
                error!("error: {}", e);
                eprintln!("error: {}", e);
                1
            }
        },
    };
    exit(code);
}
