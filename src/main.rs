use clap::Parser;
use dirdigest::{ChecksumOptions, LocalBackend, REPORT_FILE_NAME};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

/// Command-line interface for dirdigest
#[derive(Parser, Debug)]
#[command(
    name = "dirdigest",
    version,
    about = "Write a SHA-256 table of every file in a directory to SHA256.md"
)]
struct Cli {
    /// Target folder path
    #[arg(short, long, value_name = "PATH")]
    path: PathBuf,

    /// Number of worker threads, 0 for one per file
    #[arg(short, long, value_name = "THREADS", default_value_t = num_cpus::get())]
    threads: usize,

    /// Regex for file names to include
    #[arg(short, long, value_name = "INCLUDE")]
    include: Option<String>,

    /// Regex for file names to exclude
    #[arg(short, long, value_name = "EXCLUDE")]
    exclude: Option<String>,

    /// Print the table instead of writing it
    #[arg(long)]
    dry_run: bool,

    /// Print plain progress lines instead of a progress bar
    #[arg(long)]
    no_progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Sort rows by file name
    #[arg(long)]
    sort: bool,
}

fn compile(kind: &str, pattern: Option<&str>) -> Result<Option<regex::Regex>, ()> {
    match pattern {
        Some(p) => match regex::Regex::new(p) {
            Ok(re) => Ok(Some(re)),
            Err(e) => {
                eprintln!("Invalid {} regex: {}", kind, e);
                Err(())
            }
        },
        None => Ok(None),
    }
}

fn main() -> ExitCode {
    // Initialize logging using env_logger and DIRDIGEST_LOG
    env_logger::Builder::from_env(env_logger::Env::new().filter("DIRDIGEST_LOG")).init();

    let cli = Cli::parse();

    let Ok(include_re) = compile("include", cli.include.as_deref()) else {
        return ExitCode::FAILURE;
    };
    let Ok(exclude_re) = compile("exclude", cli.exclude.as_deref()) else {
        return ExitCode::FAILURE;
    };

    let options = ChecksumOptions {
        threads: cli.threads,
        include: include_re.as_ref(),
        exclude: exclude_re.as_ref(),
        dry_run: cli.dry_run,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
        sort: cli.sort,
    };

    let start = Instant::now();
    match dirdigest::run(Arc::new(LocalBackend::new()), &cli.path, &options) {
        Ok(summary) => {
            if cli.dry_run {
                print!("{}", summary.report.render());
            } else {
                println!(
                    "Table has been written to {} successfully.",
                    REPORT_FILE_NAME
                );
            }
            if summary.failed > 0 {
                println!("{} of {} files could not be hashed.", summary.failed, summary.total);
            }
            println!(
                "Total time elapsed: {}",
                indicatif::HumanDuration(start.elapsed())
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
