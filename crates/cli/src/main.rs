use anyhow::Context;
use blockfold_core::{
    format_file, format_output, render_file, FileConfig, FoldPolicy, FoldScanner, OutputFormat,
    Renderer, ScanConfig,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mta_rust_structuralcode_blockfold")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Foldable-region identifier for Rust source files")]
#[command(long_about = "Finds the collapsible blocks of Rust and C-family source text without \
    parsing it. Comments and string literals are tracked line by line so that braces and \
    keywords inside them never count. Reported regions:\n\n\
    - fn, struct, impl, enum, trait and mod bodies\n\
    - every use statement of a file, consolidated into one import block\n\n\
    Default fold state: fn, struct, enum and imports folded; impl, trait and mod expanded. \
    Override it with [fold] in blockfold.toml, --fold-all or --expand-all.")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project root directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Json)]
    pub format: OutputFormatArg,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Additional ignore patterns (glob style)
    #[arg(long, action = ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Ignore file path (defaults to .gitignore)
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// Include target/ and vendor/ in scan
    #[arg(long)]
    pub include_deps: bool,

    /// Parallel threads (0 = auto)
    #[arg(long)]
    pub threads: Option<usize>,

    /// File extensions to scan (repeatable, without the dot)
    #[arg(long = "ext", action = ArgAction::Append)]
    pub extensions: Vec<String>,

    /// Config file (defaults to blockfold.toml in the scanned directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report every region as folded
    #[arg(long, global = true, conflicts_with = "expand_all")]
    pub fold_all: bool,

    /// Report every region as expanded
    #[arg(long, global = true)]
    pub expand_all: bool,

    /// Disable ANSI colors in rendered output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all foldable regions in a file
    List {
        /// File to analyze
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Json)]
        format: OutputFormatArg,
    },

    /// Render a single file with folds applied
    Render {
        /// File to render
        file: PathBuf,

        /// Output with ANSI colors
        #[arg(long)]
        ansi: bool,

        /// Flip the region starting on LINE (0 = import block)
        #[arg(long, value_name = "LINE", action = ArgAction::Append)]
        toggle: Vec<usize>,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Summary,
    Ansi,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
            OutputFormatArg::Summary => OutputFormat::Summary,
            OutputFormatArg::Ansi => OutputFormat::Ansi,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match &args.command {
        Some(Commands::List { file, format }) => run_list(file, format.clone(), &args),
        Some(Commands::Render { file, ansi, toggle }) => run_render(file, *ansi, toggle, &args),
        None => run_scan(&args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Layer `blockfold.toml` (explicit `--config`, else discovered at `root`)
/// over the defaults, then the fold flags over both.
fn base_config(root: PathBuf, args: &Args) -> anyhow::Result<ScanConfig> {
    let file_config = match args.config {
        Some(ref path) => Some(FileConfig::load(path)?),
        None => FileConfig::discover(&root)?,
    };

    let mut config = ScanConfig::new(root);
    if let Some(file_config) = file_config {
        debug!("applying config file");
        config = file_config.apply(config);
    }

    if args.fold_all {
        config = config.with_fold_policy(FoldPolicy::all());
    } else if args.expand_all {
        config = config.with_fold_policy(FoldPolicy::none());
    }

    Ok(config)
}

fn run_scan(args: &Args) -> anyhow::Result<()> {
    let mut config = base_config(args.path.clone(), args)?;

    config.ignore_patterns.extend(args.ignore.iter().cloned());
    if let Some(ref ignore_file) = args.ignore_file {
        config = config.with_ignore_file(ignore_file.clone());
    }
    if args.include_deps {
        config = config.with_include_deps(true);
    }
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }
    if !args.extensions.is_empty() {
        config = config.with_extensions(
            args.extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
        );
    }

    // Show progress if verbose
    let spinner = if args.verbose > 0 {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning project...");
        Some(pb)
    } else {
        None
    };

    let scanner = FoldScanner::new(config)?;
    let result = scanner.scan()?;

    if let Some(ref pb) = spinner {
        pb.finish_with_message(format!(
            "Scanned {} files in {}ms",
            result.stats.total_files, result.metadata.scan_duration_ms
        ));
    }

    let output = format_output(&result, args.format.clone().into())?;
    write_output(&output, args.output.as_deref())
}

fn write_output(output: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "output written");
        }
        None => println!("{}", output),
    }
    Ok(())
}

/// Config for single-file commands: looked up next to the file
fn single_file_config(file: &Path, args: &Args) -> anyhow::Result<ScanConfig> {
    let root = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    base_config(root, args)
}

fn run_list(file: &Path, format: OutputFormatArg, args: &Args) -> anyhow::Result<()> {
    let config = single_file_config(file, args)?;
    let scanner = FoldScanner::new(config)?;
    let source_file = scanner
        .scan_file(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let output = format_file(&source_file, format.into())?;
    println!("{}", output);
    Ok(())
}

/// `--ansi` forces color; otherwise color follows the terminal unless
/// `--no-color` is given.
fn wants_color(ansi: bool, no_color: bool, stdout_is_tty: bool) -> bool {
    ansi || (stdout_is_tty && !no_color)
}

fn run_render(file: &Path, ansi: bool, toggles: &[usize], args: &Args) -> anyhow::Result<()> {
    let config = single_file_config(file, args)?;

    let renderer = if wants_color(ansi, args.no_color, atty::is(atty::Stream::Stdout)) {
        Renderer::ansi()
    } else {
        Renderer::new()
    };
    let rendered = render_file(file, &config, toggles, renderer)
        .with_context(|| format!("failed to read {}", file.display()))?;

    print!("{}", rendered.content);

    info!(
        regions = rendered.region_count,
        hidden = rendered.lines_hidden,
        "rendered {}",
        rendered.path.display()
    );

    Ok(())
}
