//! Summarize command - Statistics over recorded telemetry

use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::{analysis::TelemetrySummary, cli::output};

#[derive(Parser, Debug)]
#[command(about = "Summarise telemetry CSV files")]
pub struct SummarizeArgs {
    /// Telemetry files, or directories whose CSV files are summarised
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Write the summary table as CSV
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                        && p.file_stem().is_none_or(|stem| stem != "summary")
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

pub fn execute(args: SummarizeArgs) -> Result<()> {
    let files = collect_files(&args.paths)?;
    if files.is_empty() {
        bail!("No telemetry files found");
    }

    let summaries = files
        .iter()
        .map(|path| {
            TelemetrySummary::from_csv(path)
                .with_context(|| format!("Failed to summarise {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    output::print_summary_table(&summaries);

    if let Some(path) = &args.output {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for summary in &summaries {
            writer.serialize(summary)?;
        }
        writer.flush()?;
        println!("\nSummary written to {}", path.display());
    }
    Ok(())
}
