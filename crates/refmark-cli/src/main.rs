use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod output;

use output::ColorMode;
use refmark_core::{
    ExtractorConfig, LinkExtractor, MatcherConfig, PageAnnotations, ReferenceEntry,
    ReferenceMatcher,
};
use refmark_pdf_mupdf::MupdfBackend;

/// Extract in-text citation markers from academic PDFs and link them to
/// bibliography entries by spatial proximity
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract citation-marker annotations from a PDF as JSON
    Extract {
        /// Path to the PDF to read
        pdf_path: PathBuf,

        #[command(flatten)]
        extract_opts: ExtractOpts,

        #[command(flatten)]
        output_opts: OutputOpts,
    },

    /// Extract annotations and link them to bibliography entries
    Link {
        /// Path to the PDF to read
        pdf_path: PathBuf,

        /// Path to a JSON file with bibliography entries
        #[arg(short, long)]
        references: PathBuf,

        /// Maximum normalized distance for accepting a match
        #[arg(long)]
        distance_threshold: Option<f64>,

        /// Treat link targets as top-origin (disable the y-axis flip)
        #[arg(long)]
        target_top_origin: bool,

        #[command(flatten)]
        extract_opts: ExtractOpts,

        #[command(flatten)]
        output_opts: OutputOpts,
    },
}

#[derive(Args, Debug)]
struct ExtractOpts {
    /// Destination-name prefix that marks a citation link
    #[arg(long)]
    destination_prefix: Option<String>,

    /// Same-line tolerance for box merging (fraction of page height)
    #[arg(long)]
    line_tolerance: Option<f64>,

    /// Maximum horizontal gap for box merging (fraction of page width)
    #[arg(long)]
    horizontal_gap: Option<f64>,
}

#[derive(Args, Debug)]
struct OutputOpts {
    /// Write JSON to this path instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Extract { pdf_path, extract_opts, output_opts } => {
            let pages = extract(&pdf_path, &extract_opts)?;
            let color = ColorMode(!output_opts.no_color);
            output::print_extraction_summary(&mut std::io::stderr(), &pdf_path, &pages, color)?;
            emit(&pages, &output_opts)
        }
        Command::Link {
            pdf_path,
            references,
            distance_threshold,
            target_top_origin,
            extract_opts,
            output_opts,
        } => {
            let pages = extract(&pdf_path, &extract_opts)?;
            let entries = load_references(&references)?;

            let mut config = MatcherConfig::new().with_target_bottom_origin(!target_top_origin);
            if let Some(threshold) = distance_threshold {
                config = config.with_distance_threshold(threshold);
            }
            let matched = ReferenceMatcher::with_config(config).match_references(pages, &entries);

            let color = ColorMode(!output_opts.no_color);
            output::print_link_summary(
                &mut std::io::stderr(),
                &pdf_path,
                &matched,
                entries.len(),
                color,
            )?;
            emit(&matched, &output_opts)
        }
    }
}

fn extract(pdf_path: &PathBuf, opts: &ExtractOpts) -> anyhow::Result<Vec<PageAnnotations>> {
    let mut config = ExtractorConfig::new();
    if let Some(prefix) = &opts.destination_prefix {
        config = config.with_destination_prefix(prefix.clone());
    }
    if let Some(tolerance) = opts.line_tolerance {
        config = config.with_line_tolerance(tolerance);
    }
    if let Some(gap) = opts.horizontal_gap {
        config = config.with_horizontal_gap(gap);
    }

    LinkExtractor::with_config(config)
        .extract(pdf_path, &MupdfBackend::new())
        .with_context(|| format!("extracting annotations from {}", pdf_path.display()))
}

fn load_references(path: &PathBuf) -> anyhow::Result<Vec<ReferenceEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading references from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing references JSON in {}", path.display()))
}

fn emit(pages: &[PageAnnotations], opts: &OutputOpts) -> anyhow::Result<()> {
    let json = if opts.pretty {
        serde_json::to_string_pretty(pages)?
    } else {
        serde_json::to_string(pages)?
    };
    match &opts.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("writing output to {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
