//! Batch processing: directory traversal with progress and a run summary.

use std::time::{Duration, Instant};

use malice_core::pipeline::FileDiscovery;
use malice_core::{ImageProcessor, ProcessingStats};

use super::{write_reports, ProcessArgs};

/// Process every supported image under `args.input`, one after another.
///
/// A failing file is logged and counted; the batch carries on and reports
/// the failure count as an error once every file has been tried.
pub fn process_batch(processor: &ImageProcessor, args: &ProcessArgs) -> anyhow::Result<()> {
    let files = processor.discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s) to process ({:.1} MB)",
        files.len(),
        FileDiscovery::total_size(&files) as f64 / 1_000_000.0
    );

    let base_seed = processor.config().processing.seed;
    let progress = create_progress_bar(files.len() as u64);
    let start_time = Instant::now();

    let mut reports = Vec::with_capacity(files.len());
    let mut failed = 0usize;

    for (index, file) in files.iter().enumerate() {
        let output = processor.output_path_for(&file.path);
        let result = match base_seed {
            Some(seed) => processor.process_seeded(&file.path, &output, file_seed(seed, index)),
            None => processor.process(&file.path, &output),
        };

        match result {
            Ok(report) => {
                progress.println(format!("SUCCESS: {}", report.output.display()));
                reports.push(report);
            }
            Err(e) => {
                failed += 1;
                tracing::error!("Failed: {:?} - {}", file.path, e);
            }
        }

        progress.inc(1);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            progress.set_message(format!("{:.1} img/sec", (index + 1) as f64 / elapsed));
        }
    }

    progress.finish_and_clear();

    let stats = summarize(reports.len(), failed, start_time.elapsed());
    print_summary(&stats);

    if let Some(path) = &args.report {
        write_reports(path, args.report_format, processor.config(), &reports, true)?;
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} image(s) failed", files.len());
    }
    Ok(())
}

/// Seed for the `index`-th file of a seeded batch.
pub fn file_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

fn summarize(succeeded: usize, failed: usize, elapsed: Duration) -> ProcessingStats {
    let total_seconds = elapsed.as_secs_f64();
    let images_per_second = if total_seconds > 0.0 {
        succeeded as f64 / total_seconds
    } else {
        0.0
    };
    ProcessingStats {
        succeeded,
        failed,
        images_per_second,
        total_seconds,
    }
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

    let pb = ProgressBar::new(total);
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch processing.
fn print_summary(stats: &ProcessingStats) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.succeeded + stats.failed);
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.1} img/sec", stats.images_per_second);
    eprintln!("  ====================================");
}
