//! Command-line interface for the deckforge pipeline.
//!
//! Each subcommand is one deterministic pipeline step; the orchestrating
//! agent chains them and reads their exit codes. Validation uses the
//! 0/1/2 convention (pass/fail/warnings); `classify` exits 2 when the
//! input file does not exist.

use clap::{Parser, Subcommand, ValueEnum};
use deckforge::builder::{DeckBuilder, DeckReview};
use deckforge::classify::{InputKind, classify};
use deckforge::images::ImageExtractor;
use deckforge::ir::{ContentDoc, MergePosition, StructureAnalysis, merge, reorder};
use deckforge::naming::Purpose;
use deckforge::prompts;
use deckforge::template::{TemplateAnalysis, TemplateCleaner, TemplateDiagnosis, TemplatePackage};
use deckforge::validate::Validator;
use deckforge::workflow::{read_trace, summarize};
use deckforge::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Deterministic toolkit for an agent-driven PPTX generation pipeline.
#[derive(Parser, Debug)]
#[command(name = "deckforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify an input file or URL and pick a processing route
    Classify {
        /// Input file path or URL
        input: String,

        /// Purpose of the presentation
        #[arg(short, long, default_value = "report")]
        purpose: String,

        /// Write the classification manifest to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze a template's layouts and slide-kind mapping
    Analyze {
        /// Template .pptx
        template: PathBuf,

        /// Write the analysis as JSON instead of text
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report layout issues instead of the mapping
        #[arg(long)]
        diagnose: bool,
    },

    /// Clean a template: drop decorations, fix placeholder geometry
    Clean {
        /// Source template .pptx
        template: PathBuf,

        /// Cleaned template output path
        output: PathBuf,

        /// Also remove non-placeholder background pictures
        #[arg(long)]
        remove_backgrounds: bool,

        /// Keep decorative shapes
        #[arg(long)]
        keep_decorations: bool,

        /// Keep placeholder positions as-is
        #[arg(long)]
        keep_positions: bool,
    },

    /// Validate a content document (exit 0 = pass, 1 = fail, 2 = warnings)
    Validate {
        /// Content document (JSON)
        content: PathBuf,

        /// Directory image paths are resolved against
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Print a deck's structure analysis for the Summarizer agent
    Summarize {
        /// Content document (JSON)
        content: PathBuf,

        /// Write the analysis as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reorder (and optionally duplicate) slides by an index sequence
    Reorder {
        /// Content document (JSON)
        content: PathBuf,

        /// Comma-separated 0-based slide indices, e.g. "0,2,2,1"
        sequence: String,

        /// Output content document
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Merge another document's slides into a base document
    Merge {
        /// Base content document
        base: PathBuf,

        /// Document whose slides are inserted
        other: PathBuf,

        /// Insert before this 0-based index (default: append)
        #[arg(long)]
        at: Option<usize>,

        /// Insert before the first slide
        #[arg(long, conflicts_with = "at")]
        start: bool,

        /// Output content document
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Build a .pptx from a content document
    Build {
        /// Content document (JSON)
        content: PathBuf,

        /// Output .pptx path
        output: PathBuf,

        /// Directory image paths are resolved against
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Keep overflowing text at its nominal size
        #[arg(long)]
        no_auto_shrink: bool,
    },

    /// Extract the main content image of each slide
    ExtractImages {
        /// Source .pptx
        pptx: PathBuf,

        /// Directory for slide_NN.ext files
        output_dir: PathBuf,

        /// Skip images the icon/logo heuristic flags
        #[arg(long)]
        skip_icons: bool,
    },

    /// Review a built deck for oversized text frames
    Review {
        /// Deck .pptx
        pptx: PathBuf,
    },

    /// Summarize a workflow trace and report the resume phase
    TraceSummary {
        /// Base name of the run, e.g. 20251214_branch_report
        base_name: String,

        /// Directory holding the trace file
        #[arg(long, default_value = "output_manifest")]
        manifest_dir: PathBuf,
    },

    /// Print the prompt for an agent role
    Prompt {
        /// Agent role
        role: Role,

        /// Content document the prompt wraps (summarizer/localizer/reviewer)
        #[arg(long)]
        content: Option<PathBuf>,

        /// Target slide count (extractor/summarizer)
        #[arg(long)]
        target_slides: Option<usize>,

        /// Source description for the extractor prompt
        #[arg(long)]
        source: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Role {
    Extractor,
    Summarizer,
    Localizer,
    Reviewer,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match run(cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        },
    }
}

fn run(command: Command) -> Result<u8> {
    match command {
        Command::Classify {
            input,
            purpose,
            output,
        } => {
            let purpose: Purpose = purpose.parse()?;
            let result = match classify(&input, purpose) {
                Ok(result) => result,
                Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                    eprintln!("error: {err}");
                    return Ok(2);
                },
                Err(err) => return Err(err),
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
            if let Some(path) = output {
                result.save(&path)?;
                log::info!("classification saved to {}", path.display());
            }
            Ok(if result.input_type == InputKind::Unknown {
                1
            } else {
                0
            })
        },

        Command::Analyze {
            template,
            output,
            diagnose,
        } => {
            if diagnose {
                let package = TemplatePackage::open(&template)?;
                let diagnosis = TemplateDiagnosis::of(&package)?;
                print!("{}", diagnosis.render_text());
                return Ok(0);
            }
            let analysis = TemplateAnalysis::analyze(&template)?;
            match output {
                Some(path) => {
                    write_json(&path, &analysis)?;
                    log::info!("analysis saved to {}", path.display());
                },
                None => print!("{}", analysis.render_text()),
            }
            Ok(0)
        },

        Command::Clean {
            template,
            output,
            remove_backgrounds,
            keep_decorations,
            keep_positions,
        } => {
            let report = TemplateCleaner::new()
                .with_remove_backgrounds(remove_backgrounds)
                .with_remove_decorations(!keep_decorations)
                .with_fix_positions(!keep_positions)
                .clean_file(&template, &output)?;
            for action in &report.actions {
                println!("  {action}");
            }
            println!(
                "cleaned {} -> {} (pictures: {}, decorations: {}, positions: {})",
                report.source,
                report.output,
                report.removed_pictures,
                report.removed_decorations,
                report.fixed_positions
            );
            Ok(0)
        },

        Command::Validate {
            content,
            images_dir,
            strict,
        } => {
            let mut validator = Validator::new();
            if let Some(dir) = images_dir {
                validator = validator.with_images_dir(dir);
            }
            let report = validator.validate_file(&content)?;
            print!("{}", report.render_text());
            Ok(report.exit_code(strict) as u8)
        },

        Command::Summarize { content, output } => {
            let doc = ContentDoc::open(&content)?;
            let analysis = StructureAnalysis::of(&doc);
            match output {
                Some(path) => write_json(&path, &analysis)?,
                None => println!("{}", serde_json::to_string_pretty(&analysis)?),
            }
            Ok(0)
        },

        Command::Reorder {
            content,
            sequence,
            output,
        } => {
            let doc = ContentDoc::open(&content)?;
            let indices = parse_sequence(&sequence)?;
            let reordered = reorder(&doc, &indices)?;
            reordered.save(&output)?;
            println!(
                "reordered {} slides into {}",
                reordered.slides.len(),
                output.display()
            );
            Ok(0)
        },

        Command::Merge {
            base,
            other,
            at,
            start,
            output,
        } => {
            let base_doc = ContentDoc::open(&base)?;
            let other_doc = ContentDoc::open(&other)?;
            let position = if start {
                MergePosition::Start
            } else {
                match at {
                    Some(index) => MergePosition::At(index),
                    None => MergePosition::End,
                }
            };
            let merged = merge(&base_doc, &other_doc, position)?;
            merged.save(&output)?;
            println!(
                "merged {} slides into {}",
                merged.slides.len(),
                output.display()
            );
            Ok(0)
        },

        Command::Build {
            content,
            output,
            images_dir,
            no_auto_shrink,
        } => {
            let doc = ContentDoc::open(&content)?;
            let mut builder = DeckBuilder::new().with_auto_shrink(!no_auto_shrink);
            if let Some(dir) = images_dir {
                builder = builder.with_images_dir(dir);
            }
            let report = builder.build(&doc, &output)?;
            println!(
                "built {} slides -> {} ({} auto-fixed)",
                report.slides,
                output.display(),
                report.auto_fixed
            );
            for warning in &report.warnings {
                println!("  warning: {warning}");
            }
            Ok(0)
        },

        Command::ExtractImages {
            pptx,
            output_dir,
            skip_icons,
        } => {
            let extracted = ImageExtractor::new()
                .with_skip_icons(skip_icons)
                .extract(&pptx, &output_dir)?;
            for image in &extracted {
                println!(
                    "  slide {:2}: {} ({}x{}px{})",
                    image.slide,
                    image.file_name,
                    image.width_px,
                    image.height_px,
                    if image.is_icon { ", icon" } else { "" }
                );
            }
            println!("extracted {} images to {}", extracted.len(), output_dir.display());
            Ok(0)
        },

        Command::Review { pptx } => {
            let review = DeckReview::of_file(&pptx)?;
            print!("{}", review.render_text());
            Ok(if review.passed() { 0 } else { 1 })
        },

        Command::TraceSummary {
            base_name,
            manifest_dir,
        } => {
            let trace_path = manifest_dir.join(format!("{base_name}_trace.jsonl"));
            let entries = read_trace(&trace_path)?;
            let summary = summarize(&entries);
            print!("{}", summary.render_text());
            Ok(0)
        },

        Command::Prompt {
            role,
            content,
            target_slides,
            source,
        } => {
            let prompt = build_prompt(role, content.as_deref(), target_slides, source.as_deref())?;
            println!("{prompt}");
            Ok(0)
        },
    }
}

fn build_prompt(
    role: Role,
    content: Option<&Path>,
    target_slides: Option<usize>,
    source: Option<&str>,
) -> Result<String> {
    let require_content = |content: Option<&Path>| -> Result<String> {
        let path = content.ok_or_else(|| {
            Error::Other("this role needs --content <content.json>".to_string())
        })?;
        Ok(std::fs::read_to_string(path)?)
    };

    match role {
        Role::Extractor => {
            let source = source.unwrap_or("the attached source material");
            Ok(format!(
                "{}\n{}",
                prompts::EXTRACTOR_SYSTEM_PROMPT,
                prompts::create_extraction_prompt(source, target_slides)
            ))
        },
        Role::Summarizer => {
            let json = require_content(content)?;
            let doc = ContentDoc::from_slice(json.as_bytes())?;
            let analysis = StructureAnalysis::of(&doc);
            let target = target_slides.unwrap_or_else(|| {
                analysis
                    .recommended_sizes
                    .get("standard_summary")
                    .copied()
                    .unwrap_or(25)
            });
            Ok(format!(
                "{}\n{}",
                prompts::SUMMARIZER_SYSTEM_PROMPT,
                prompts::create_summary_prompt(&analysis, target)
            ))
        },
        Role::Localizer => {
            let json = require_content(content)?;
            Ok(format!(
                "{}\n{}",
                prompts::LOCALIZER_SYSTEM_PROMPT,
                prompts::create_localization_prompt(&json)
            ))
        },
        Role::Reviewer => {
            let json = require_content(content)?;
            let doc = ContentDoc::from_slice(json.as_bytes())?;
            let report = Validator::new().validate(&doc);
            Ok(format!(
                "{}\n{}",
                prompts::REVIEWER_SYSTEM_PROMPT,
                prompts::create_review_prompt(&json, &report)
            ))
        },
    }
}

fn parse_sequence(sequence: &str) -> Result<Vec<usize>> {
    sequence
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| Error::Other(format!("invalid slide index: {part}")))
        })
        .collect()
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
