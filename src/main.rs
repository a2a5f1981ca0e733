// Electoral roll extraction from the command line

use clap::Parser;
use log::{error, info};
use rollgrid::{
    models::PipelineResult,
    pipeline::{discover_documents, JsonLinesSink},
    processing::TesseractEngine,
    ExtractionError, PipelineConfig, PipelineScheduler,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rollgrid")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract voter records from scanned electoral roll pages", long_about = None)]
struct Args {
    /// Folder of page images, or a folder of such folders (one per document)
    input: PathBuf,

    /// Combined JSON output
    #[arg(short, long, default_value = "rollgrid.json")]
    output: PathBuf,

    /// Pipeline configuration in JSON; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also append every entry to this JSON-lines file as it is produced
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// Maximum number of pages processed at once
    #[arg(short, long)]
    workers: Option<usize>,

    /// Tesseract data directory
    #[arg(long, env = "TESSDATA_PREFIX")]
    tessdata: Option<String>,

    /// First page (1-based) holding a voter grid. Defaults to 3, so one- or
    /// two-page documents yield no entries unless this is lowered
    #[arg(long)]
    first_page: Option<u32>,

    /// Pages at the end of each document without a grid (default 1)
    #[arg(long)]
    trailing_pages: Option<u32>,

    /// Subtracted from every sequence number
    #[arg(long)]
    offset: Option<i64>,

    /// Also write one `<document>_result.json` per document into this folder
    #[arg(long)]
    per_document: Option<PathBuf>,

    /// Engine language set for printed text
    #[arg(long)]
    languages: Option<String>,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig, ExtractionError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(workers) = self.workers {
            config.scheduler.max_workers = workers;
        }
        if let Some(first_page) = self.first_page {
            config.scheduler.first_page = first_page;
            config.sequence.first_content_page = first_page;
        }
        if let Some(trailing) = self.trailing_pages {
            config.scheduler.trailing_pages_skipped = trailing;
        }
        if let Some(offset) = self.offset {
            config.sequence.offset = offset;
        }
        if let Some(languages) = &self.languages {
            config.recognition.text_languages = languages.clone();
        }
        if self.tessdata.is_some() {
            config.recognition.data_path = self.tessdata.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_summary(result: &PipelineResult) {
    println!("\n===============================================");
    println!("      ELECTORAL ROLL EXTRACTION SUMMARY");
    println!("===============================================\n");

    for summary in &result.documents {
        match &summary.load_error {
            Some(reason) => println!("  {}: SKIPPED ({})", summary.document_tag, reason),
            None => println!(
                "  {}: {} entries, {} pages ({} complete, {} early stop, {} failed, {} cancelled)",
                summary.document_tag,
                summary.entries,
                summary.pages_total,
                summary.pages_completed,
                summary.pages_early_stopped,
                summary.pages_failed,
                summary.pages_cancelled
            ),
        }
    }

    println!("\nTotal entries: {}", result.total_entries());
    if result.cancelled {
        println!("Run was cancelled; results are partial.");
    }
    println!(
        "Elapsed: {}s",
        (result.finished_at - result.started_at).num_seconds()
    );
}

fn write_per_document(result: &PipelineResult, dir: &Path) -> Result<(), ExtractionError> {
    fs::create_dir_all(dir)?;
    for summary in result.documents.iter().filter(|s| s.load_error.is_none()) {
        let path = dir.join(format!("{}_result.json", summary.document_tag));
        let written = result.write_document_json(&summary.document_tag, &path)?;
        info!("{} entries written to {}", written, path.display());
    }
    Ok(())
}

fn main() -> Result<(), ExtractionError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.pipeline_config()?;

    let documents = discover_documents(&args.input)?;
    info!("found {} document(s) under {}", documents.len(), args.input.display());

    let engine = Arc::new(TesseractEngine::new(config.recognition.data_path.clone()));
    let mut scheduler = PipelineScheduler::new(config, engine)?;
    if let Some(path) = &args.jsonl {
        scheduler = scheduler.with_sink(Arc::new(JsonLinesSink::create(path)?));
    }

    let result = scheduler.run(&documents);
    if let Err(e) = result.write_json(&args.output) {
        error!("failed to write {}: {}", args.output.display(), e);
        return Err(e);
    }

    if let Some(dir) = &args.per_document {
        write_per_document(&result, dir)?;
    }

    print_summary(&result);
    println!("Results saved to {}", args.output.display());
    Ok(())
}
