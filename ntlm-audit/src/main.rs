use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ntlm_audit::{Error, audit, read_candidates, write_report};
use ntlm_verifier::Dataset;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ntlm-audit")]
#[command(about = "Report users whose NTLM hash appears in the Pwned Passwords NTLM dataset")]
struct Args {
    /// Sorted NTLM dataset (pwned-passwords-ntlm-ordered-by-hash.txt)
    dataset: PathBuf,

    /// Candidate list with one `identifier:HASH` per line
    input: PathBuf,

    /// File to write matched identifiers to (overwritten)
    output: PathBuf,

    /// Number of concurrent lookup workers (default: available parallelism)
    #[arg(short = 'j', long)]
    jobs: Option<NonZeroUsize>,

    /// Log and skip malformed candidate lines instead of stopping
    #[arg(long)]
    skip_malformed: bool,

    /// Disable progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let stopwatch = Instant::now();

    // Fail before reading any input if the dataset can't be opened.
    Dataset::open(&args.dataset)
        .map_err(|source| Error::Dataset { path: args.dataset.clone(), source })?;

    let candidates =
        read_candidates(BufReader::new(File::open(&args.input)?), args.skip_malformed)?;
    let total = candidates.len() as u64;

    let jobs = args
        .jobs
        .or_else(|| std::thread::available_parallelism().ok())
        .map_or(1, NonZeroUsize::get);
    info!(candidates = total, jobs, dataset = %args.dataset.display(), "starting audit");

    // Set up progress bar
    let progress_bar = if !args.no_progress {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Spawn progress updater thread
    let progress_counter = Arc::new(AtomicU64::new(0));
    let finished = Arc::new(AtomicBool::new(false));
    let progress_thread = progress_bar.clone().map(|pb| {
        let counter = Arc::clone(&progress_counter);
        let finished = Arc::clone(&finished);
        std::thread::spawn(move || {
            while !finished.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(100));
                pb.set_position(counter.load(Ordering::Relaxed));
            }
        })
    });

    let result = audit(&args.dataset, &candidates, jobs, &progress_counter);

    // Clean up progress
    finished.store(true, Ordering::Relaxed);
    if let Some(handle) = progress_thread {
        let _ = handle.join();
    }
    if let Some(pb) = progress_bar {
        pb.set_position(progress_counter.load(Ordering::Relaxed));
        pb.finish_with_message(if result.is_ok() { "done" } else { "failed" });
    }

    let matched = result?;

    write_report(BufWriter::new(File::create(&args.output)?), &matched)?;
    write_report(std::io::stdout().lock(), &matched)?;

    println!("\nCompleted in: {} ms", stopwatch.elapsed().as_millis());
    println!("All pwned users output to {}", args.output.display());
    Ok(())
}
