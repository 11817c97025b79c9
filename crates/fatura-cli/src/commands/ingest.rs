//! Ingest command - extract and store a batch of invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use fatura_core::ingest::{BatchIngestor, BatchReport, IngestOutcome, SourceDocument};
use fatura_core::invoice::InvoiceFieldExtractor;
use fatura_core::reporting::document_path;
use fatura_core::MemoryStore;

use super::{is_pdf, is_supported, load_config, read_document_text};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Input directory or glob pattern
    #[arg(required = true)]
    input: String,

    /// Store snapshot file (default: from config)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Number of parallel workers (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Timeout for each store operation in milliseconds (default: from config)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Year for meter reading dates (default: current year)
    #[arg(long)]
    reading_year: Option<i32>,

    /// Copy ingested PDFs into the documents directory under their canonical name
    #[arg(long)]
    archive: bool,

    /// Documents directory (default: from config)
    #[arg(long)]
    documents_dir: Option<PathBuf>,

    /// Write a per-file summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// A file that could not be read before ingestion.
struct ReadFailure {
    path: PathBuf,
    error: String,
}

pub async fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = collect_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.input);
    }

    println!(
        "{} Found {} files to ingest",
        style("ℹ").blue(),
        files.len()
    );

    let progress = ProgressBar::new(files.len() as u64 * 2);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    // Reading is blocking and happens before any document is ingested.
    progress.set_message("reading");
    let mut documents = Vec::with_capacity(files.len());
    let mut sources = Vec::with_capacity(files.len());
    let mut read_failures = Vec::new();
    for path in files {
        match read_document_text(&path) {
            Ok(text) => {
                documents.push(SourceDocument::new(path.display().to_string(), text));
                sources.push(path);
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                read_failures.push(ReadFailure {
                    path,
                    error: e.to_string(),
                });
                progress.inc(1);
            }
        }
        progress.inc(1);
    }

    let store_path = args.store.unwrap_or(config.storage.store_path);
    let store = Arc::new(MemoryStore::open(&store_path)?);

    let mut extractor = InvoiceFieldExtractor::with_config(config.extraction);
    if let Some(year) = args.reading_year {
        extractor = extractor.with_reading_year(year);
    }

    let mut ingest_config = config.ingest;
    if let Some(jobs) = args.jobs {
        ingest_config.workers = jobs;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        ingest_config.persist_timeout_ms = timeout_ms;
    }
    debug!(
        workers = ingest_config.workers,
        timeout = ?Duration::from_millis(ingest_config.persist_timeout_ms),
        "ingestion settings"
    );

    let ingestor =
        BatchIngestor::with_extractor(Arc::clone(&store), extractor).with_config(&ingest_config);

    progress.set_message("ingesting");
    let report = ingestor
        .ingest_documents_with(documents, |_| progress.inc(1))
        .await;
    progress.finish_with_message("Complete");

    store.save(&store_path).await?;
    debug!("Store saved to {}", store_path.display());

    if args.archive {
        let documents_dir = args.documents_dir.unwrap_or(config.storage.documents_dir);
        let archived = archive_documents(&report, &sources, &documents_dir)?;
        println!(
            "{} Archived {} documents to {}",
            style("✓").green(),
            archived,
            documents_dir.display()
        );
    }

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &report, &read_failures)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_summary(&report, &read_failures, start.elapsed());
    Ok(())
}

/// Files under a directory, or matching a glob pattern.
fn collect_files(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let input_path = Path::new(input);
    let mut files: Vec<PathBuf> = if input_path.is_dir() {
        fs::read_dir(input_path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_supported(p))
            .collect()
    } else {
        glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| is_supported(p))
            .collect()
    };

    files.sort();
    Ok(files)
}

/// Copy the PDFs of newly created invoices to their canonical names.
fn archive_documents(
    report: &BatchReport,
    sources: &[PathBuf],
    documents_dir: &Path,
) -> anyhow::Result<usize> {
    fs::create_dir_all(documents_dir)?;

    let mut archived = 0;
    for (doc, source) in report.outcomes.iter().zip(sources) {
        let IngestOutcome::Created { key, .. } = &doc.outcome else {
            continue;
        };
        if !is_pdf(source) {
            continue;
        }
        let Some(target) = document_path(documents_dir, key) else {
            warn!(%key, "no canonical file name for invoice");
            continue;
        };

        fs::copy(source, &target)?;
        debug!("Archived {} as {}", source.display(), target.display());
        archived += 1;
    }

    Ok(archived)
}

fn write_summary(
    path: &Path,
    report: &BatchReport,
    read_failures: &[ReadFailure],
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "reference",
        "installation_number",
        "invoice_id",
        "new_client",
        "detail",
    ])?;

    for doc in &report.outcomes {
        let status = doc.outcome.status();
        match &doc.outcome {
            IngestOutcome::Created {
                invoice_id,
                key,
                new_client,
            } => wtr.write_record([
                doc.name.as_str(),
                status,
                &format!("{}/{}", key.reference_month, key.reference_year),
                &key.installation_number,
                &invoice_id.to_string(),
                &new_client.to_string(),
                "",
            ])?,
            IngestOutcome::Skipped(reason) => {
                wtr.write_record([doc.name.as_str(), status, "", "", "", "", &reason.to_string()])?
            }
            IngestOutcome::Failed(error) => {
                wtr.write_record([doc.name.as_str(), status, "", "", "", "", &error.to_string()])?
            }
        }
    }

    for failure in read_failures {
        wtr.write_record([
            &failure.path.display().to_string(),
            "unreadable",
            "",
            "",
            "",
            "",
            &failure.error,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn print_summary(report: &BatchReport, read_failures: &[ReadFailure], elapsed: Duration) {
    println!();
    println!(
        "{} Ingested {} files in {:?}",
        style("✓").green(),
        report.outcomes.len() + read_failures.len(),
        elapsed
    );
    println!(
        "   {} created, {} skipped, {} failed, {} unreadable",
        style(report.created).green(),
        style(report.skipped).yellow(),
        style(report.failed).red(),
        style(read_failures.len()).red()
    );

    let skipped: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|doc| match &doc.outcome {
            IngestOutcome::Skipped(reason) => Some((doc, reason)),
            _ => None,
        })
        .collect();
    if !skipped.is_empty() {
        println!();
        println!("{}", style("Skipped files:").yellow());
        for (doc, reason) in skipped {
            println!("  - {}: {}", doc.name, reason);
        }
    }

    let failed: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|doc| match &doc.outcome {
            IngestOutcome::Failed(error) => Some((doc.name.clone(), error.to_string())),
            _ => None,
        })
        .chain(
            read_failures
                .iter()
                .map(|f| (f.path.display().to_string(), f.error.clone())),
        )
        .collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (name, error) in failed {
            println!("  - {}: {}", name, error);
        }
    }
}
