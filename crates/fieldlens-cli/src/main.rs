//! Command-line demo for the fieldlens library: validate a template and run
//! extraction against a recorded OCR pass.
//!
//! The real OCR engine is out of scope for this crate (see
//! [`fieldlens::ocr::OcrEngine`]), so `extract` takes recognized boxes from
//! a JSON file rather than decoding an image itself. This keeps the binary
//! a thin exercise of the library, not a document-intelligence CLI.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fieldlens::ocr::{Image, MockOcrEngine};
use fieldlens::orchestrator::{ImageInput, NeverCancelled, TemplateInput};
use fieldlens::{EngineConfig, Orchestrator};
use fieldlens::types::OcrBox;

#[derive(Parser)]
#[command(name = "fieldlens", version, about = "Template-driven hybrid OCR field extraction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a template JSON file and report whether it is well-formed.
    Validate { template: PathBuf },
    /// Run extraction for a template against a recorded OCR pass.
    Extract {
        template: PathBuf,
        /// JSON array of `{"text", "confidence", "polygon"}` recognized boxes.
        ocr_boxes: PathBuf,
        #[arg(long, default_value_t = 2163)]
        image_width: u32,
        #[arg(long, default_value_t = 1355)]
        image_height: u32,
    },
}

#[derive(serde::Deserialize)]
struct RecordedBox {
    text: String,
    confidence: f64,
    polygon: [(f64, f64); 4],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { template } => validate_command(template),
        Command::Extract { template, ocr_boxes, image_width, image_height } => {
            extract_command(template, ocr_boxes, image_width, image_height)
        }
    }
}

fn validate_command(template_path: PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(&template_path)
        .with_context(|| format!("failed to read template at {}", template_path.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("'{}' is not valid JSON", template_path.display()))?;

    match fieldlens::validator::validate(&raw) {
        Ok(template) => {
            println!("OK: {} ({} fields)", template.template_id, template.regions.len());
            Ok(())
        }
        Err(err) => {
            eprintln!("INVALID: {err}");
            std::process::exit(1);
        }
    }
}

fn extract_command(template_path: PathBuf, ocr_boxes_path: PathBuf, image_width: u32, image_height: u32) -> Result<()> {
    let template_contents = std::fs::read_to_string(&template_path)
        .with_context(|| format!("failed to read template at {}", template_path.display()))?;
    let template: serde_json::Value = serde_json::from_str(&template_contents)
        .with_context(|| format!("'{}' is not valid JSON", template_path.display()))?;

    let ocr_contents = std::fs::read_to_string(&ocr_boxes_path)
        .with_context(|| format!("failed to read OCR boxes at {}", ocr_boxes_path.display()))?;
    let recorded: Vec<RecordedBox> = serde_json::from_str(&ocr_contents)
        .with_context(|| format!("'{}' is not a valid OCR box list", ocr_boxes_path.display()))?;
    let boxes = recorded
        .into_iter()
        .map(|b| OcrBox::new(b.text, b.confidence, b.polygon))
        .collect::<Vec<_>>();

    let engine = Box::new(MockOcrEngine::new(boxes));
    let mut orchestrator = Orchestrator::new(engine, EngineConfig::default());
    orchestrator
        .load_template(TemplateInput::Parsed(template))
        .context("template failed validation")?;

    let image = Image::new(image_width, image_height, Vec::new());
    let result = orchestrator
        .process(ImageInput::Decoded(image), &NeverCancelled)
        .context("extraction failed")?;

    println!("{}", serde_json::to_string_pretty(&result).context("failed to serialize result")?);
    Ok(())
}
