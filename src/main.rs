use anyhow::Context;
use clap::Parser;
use log::{debug, info, LevelFilter};
use std::path::PathBuf;

use fqsplit::pipeline::config::DEFAULT_QUEUE_CAPACITY;
use fqsplit::{open_input, ExecutionMode, InputFormat, SplitConfig, SplitPipeline, SplitStats};

#[derive(Parser)]
#[command(name = "fqsplit")]
#[command(about = "Split a FASTQ stream into one file per header-derived group (e.g. flow cell and lane)")]
#[command(version)]
struct Args {
    /// Input file; `.gz` files are decompressed (default: stdin).
    /// Lines must be UTF-8 text; any other byte sequence aborts the run
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Delimiter between header fields
    #[arg(short = 'd', long = "delimiter", default_value = ":")]
    delimiter: String,

    /// Comma separated 0-based header fields that form the group key
    #[arg(
        short = 'k',
        long = "keys",
        value_delimiter = ',',
        default_value = "2,3"
    )]
    keys: Vec<usize>,

    /// Separator placed between the selected fields in the group key
    #[arg(short = 'j', long = "join", default_value = ".")]
    join: String,

    /// Prefix for all output file names
    #[arg(long, default_value_t = String::new())]
    prefix: String,

    /// Suffix for all output file names
    #[arg(long, default_value = ".fastq")]
    suffix: String,

    /// Directory the output files are written to
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// First character of header lines
    #[arg(long, default_value = "@")]
    header_char: char,

    /// Read input on a separate thread
    #[arg(short = 'p', long)]
    parallel: bool,

    /// Lines buffered between the reader and router threads (with --parallel)
    #[arg(short = 'b', long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Buffer size for I/O
    #[arg(long, default_value = "65536")] // 64KB
    buffer_size: usize,

    /// How to decode the input
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    input_format: InputFormat,

    /// Log progress every N lines
    #[arg(long, value_name = "N")]
    progress: Option<usize>,

    /// Debug mode - show processing details
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn to_config(&self) -> SplitConfig {
        SplitConfig {
            header_char: self.header_char,
            delimiter: self.delimiter.clone(),
            field_indices: self.keys.clone(),
            join_separator: self.join.clone(),
            file_prefix: self.prefix.clone(),
            file_suffix: self.suffix.clone(),
            output_dir: self.output_dir.clone(),
            mode: if self.parallel {
                ExecutionMode::Pipelined {
                    queue_capacity: self.queue_capacity,
                }
            } else {
                ExecutionMode::Sequential
            },
            buffer_size: self.buffer_size,
            progress_interval: self.progress.unwrap_or(0),
        }
    }
}

fn init_logging(args: &Args) {
    // --progress is reported through info!, so it must not be filtered out
    let default_level = if args.debug {
        LevelFilter::Debug
    } else if args.progress.is_some() {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(&args) {
        eprintln!("fqsplit: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.to_config();
    config.validate().context("invalid configuration")?;

    match &args.input {
        Some(path) => info!("reading from {}", path.display()),
        None => info!("reading from stdin"),
    }
    debug!("configuration: {:?}", config);

    let input = open_input(args.input.as_deref(), args.input_format, config.buffer_size)?;
    let stats = SplitPipeline::new(config)
        .run(input)
        .context("split aborted")?;

    report(&stats, args.debug);
    Ok(())
}

fn report(stats: &SplitStats, debug: bool) {
    info!(
        "split {} lines ({} records) into {} files",
        stats.lines_read,
        stats.headers_seen,
        stats.group_count()
    );

    // Print final stats if debug mode
    if debug {
        eprintln!("Final statistics:");
        eprintln!("  Lines read: {}", stats.lines_read);
        eprintln!("  Header lines: {}", stats.headers_seen);
        eprintln!("  Output files: {}", stats.group_count());
        for group in &stats.groups {
            eprintln!(
                "    {} -> {} ({} lines)",
                group.key,
                group.path.display(),
                group.lines_written
            );
        }
        eprintln!("  Processing time: {:?}", stats.processing_time);
        if let Some(rate) = stats.lines_per_second() {
            eprintln!("  Processing rate: {:.0} lines/second", rate);
        }
    }
}
