use anyhow::Result;
use clap::Parser;
use meal_segmenter::config::{Args, Config};
use meal_segmenter::pipeline;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    let args = Args::parse();
    let config = Config::from(args);

    let report = pipeline::run(&config)?;

    println!("\nProcessed {} patient files:", report.patients.len());
    for patient in &report.patients {
        println!(
            "  {} ({} rows, {} dropped, {} meal segments) -> {}",
            patient.patient_id,
            patient.rows_written,
            patient.rows_dropped,
            patient.segments.len(),
            patient.output.display()
        );
    }
    if !report.failed.is_empty() {
        println!("\nFailed to process {} files:", report.failed.len());
        for failed in &report.failed {
            println!("  {}: {}", failed.source.display(), failed.error);
        }
    }

    Ok(())
}
