//! filekit CLI - convert tabular documents and edit PDF files

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use filekit::pdf::{
    self, CompressionLevel, CompressionProgress, ImageInput, ImageReport, PageFilter,
    PageNumberOptions, PageRange, PageSelection, Position, WatermarkOptions,
};
use filekit::{ConvertOptions, ConverterRegistry, Format, ParseOptions, RenderOptions};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "filekit")]
#[command(version)]
#[command(about = "Convert tabular documents between formats and edit PDF files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one file to another format
    Convert {
        /// Input file (format taken from its extension)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target format (csv, tsv, xlsx, json, xml, yaml, html, md, txt, docx, ini, pdf)
        #[arg(short, long, value_name = "FMT")]
        to: Format,

        /// Keep only these columns, in this order (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Output file (defaults to the input name with the new extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Fail when a JSON/XML/YAML document has no array of rows
        #[arg(long)]
        strict: bool,

        /// Title of HTML, DOCX and PDF output
        #[arg(long, env = "FILEKIT_TITLE")]
        title: Option<String>,
    },

    /// Convert several files, one after another
    Batch {
        /// Input files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Target format
        #[arg(short, long, value_name = "FMT")]
        to: Format,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },

    /// List supported formats
    Formats,

    /// PDF tools
    #[command(subcommand)]
    Pdf(PdfCommands),
}

#[derive(Subcommand)]
enum PdfCommands {
    /// Concatenate documents in the order given
    Merge {
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long, value_name = "FILE", default_value = "merged.pdf")]
        output: PathBuf,
    },

    /// Split into single pages, or into named ranges
    Split {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Named range, e.g. `intro=1-3` (repeatable)
        #[arg(long = "range", value_name = "NAME=PAGES", value_parser = parse_named_range)]
        ranges: Vec<PageRange>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },

    /// Copy selected pages into a new document
    Extract {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Pages in output order, e.g. "1,3-4"
        #[arg(short, long)]
        pages: PageSelection,

        /// Fail on page numbers outside the document instead of dropping them
        #[arg(long)]
        strict: bool,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Rotate pages by a multiple of 90 degrees
    Rotate {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, allow_hyphen_values = true)]
        degrees: i32,

        /// Pages to rotate (default: all)
        #[arg(short, long)]
        pages: Option<PageSelection>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Stamp centred text on every page
    Watermark {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long)]
        text: String,

        #[arg(long, default_value_t = 50.0)]
        size: f32,

        #[arg(long, default_value_t = 0.3)]
        opacity: f32,

        #[arg(long, default_value_t = -45.0, allow_hyphen_values = true)]
        rotation: f32,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Add page numbers
    Number {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// top-left, top-center, top-right, bottom-left, bottom-center, bottom-right
        #[arg(long, default_value = "bottom-center")]
        position: Position,

        /// Label template with `{n}` and `{total}`
        #[arg(long, default_value = "Page {n} of {total}")]
        format: String,

        #[arg(long, default_value_t = 12.0)]
        size: f32,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Recompress embedded images
    Compress {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// low, medium or extreme
        #[arg(short, long, default_value = "medium", env = "FILEKIT_COMPRESSION")]
        level: CompressionLevel,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Build a PDF with one page per JPEG/PNG image
    ImagesToPdf {
        #[arg(value_name = "IMAGES", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long, value_name = "FILE", default_value = "images.pdf")]
        output: PathBuf,
    },

    /// Render every page to PNG
    ToImages {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, default_value_t = 2.0)]
        scale: f32,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },

    /// Show document metadata
    Info {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            to,
            columns,
            output,
            strict,
            title,
        } => cmd_convert(&input, to, columns, output.as_deref(), strict, title),
        Commands::Batch { inputs, to, output } => cmd_batch(&inputs, to, &output),
        Commands::Formats => {
            cmd_formats();
            Ok(())
        }
        Commands::Pdf(command) => run_pdf(command),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_pdf(command: PdfCommands) -> CliResult {
    match command {
        PdfCommands::Merge { inputs, output } => {
            let files = inputs.iter().map(fs::read).collect::<Result<Vec<_>, _>>()?;
            save(&output, &pdf::merge(&files)?)
        }
        PdfCommands::Split {
            input,
            ranges,
            output,
        } => cmd_split(&input, &ranges, &output),
        PdfCommands::Extract {
            input,
            pages,
            strict,
            output,
        } => {
            let bytes = fs::read(&input)?;
            let total = pdf::info(&bytes)?.page_count;
            let filter = if strict {
                PageFilter::Strict
            } else {
                PageFilter::Lenient
            };
            let out = pdf::extract_pages(&bytes, &pages.resolve(total), filter)?;
            save(&derived(&input, output, "extracted"), &out)
        }
        PdfCommands::Rotate {
            input,
            degrees,
            pages,
            output,
        } => {
            let bytes = fs::read(&input)?;
            let pages = match pages {
                Some(selection) => Some(selection.resolve(pdf::info(&bytes)?.page_count)),
                None => None,
            };
            let out = pdf::rotate(&bytes, degrees, pages.as_deref())?;
            save(&derived(&input, output, "rotated"), &out)
        }
        PdfCommands::Watermark {
            input,
            text,
            size,
            opacity,
            rotation,
            output,
        } => {
            let options = WatermarkOptions::new()
                .with_font_size(size)
                .with_opacity(opacity)
                .with_rotation(rotation);
            let out = pdf::watermark(&fs::read(&input)?, &text, &options)?;
            save(&derived(&input, output, "watermarked"), &out)
        }
        PdfCommands::Number {
            input,
            position,
            format,
            size,
            output,
        } => {
            let options = PageNumberOptions::new()
                .with_position(position)
                .with_format(format)
                .with_font_size(size);
            let out = pdf::add_page_numbers(&fs::read(&input)?, &options)?;
            save(&derived(&input, output, "numbered"), &out)
        }
        PdfCommands::Compress {
            input,
            level,
            output,
        } => cmd_compress(&input, level, output),
        PdfCommands::ImagesToPdf { inputs, output } => {
            let images = inputs
                .iter()
                .map(ImageInput::from_path)
                .collect::<filekit::Result<Vec<_>>>()?;
            save(&output, &pdf::images_to_pdf(&images)?)
        }
        PdfCommands::ToImages {
            input,
            scale,
            output,
        } => {
            fs::create_dir_all(&output)?;
            let pages = pdf::pdf_to_images(&fs::read(&input)?, scale)?;
            for page in &pages {
                fs::write(output.join(&page.name), &page.bytes)?;
            }
            println!(
                "{} {} pages to {}",
                "Rendered".green(),
                pages.len(),
                output.display()
            );
            Ok(())
        }
        PdfCommands::Info { input, json } => cmd_info(&input, json),
    }
}

fn cmd_convert(
    input: &Path,
    to: Format,
    columns: Vec<String>,
    output: Option<&Path>,
    strict: bool,
    title: Option<String>,
) -> CliResult {
    let mut options = ConvertOptions::new();
    if !columns.is_empty() {
        options = options.with_columns(columns);
    }
    if strict {
        options = options.with_parse_options(ParseOptions::new().strict());
    }
    if let Some(title) = title {
        options = options.with_render_options(
            RenderOptions::new()
                .with_html_title(title.clone())
                .with_document_title(title),
        );
    }

    let result = ConverterRegistry::with_defaults().convert_file(input, to, &options)?;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_file_name(&result.filename),
    };
    fs::write(&path, &result.bytes)?;

    println!(
        "{} {} ({} rows, {} columns, {} bytes)",
        "Saved to".green(),
        path.display(),
        result.row_count,
        result.column_count,
        result.size
    );
    Ok(())
}

fn cmd_batch(inputs: &[PathBuf], to: Format, output_dir: &Path) -> CliResult {
    fs::create_dir_all(output_dir)?;

    let mut files = Vec::with_capacity(inputs.len());
    for path in inputs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push((name, fs::read(path)?));
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let registry = ConverterRegistry::with_defaults();
    let report = registry.convert_batch_with(
        files.iter().map(|(name, bytes)| (name.as_str(), bytes.as_slice())),
        to,
        &ConvertOptions::default(),
        |item| {
            pb.set_message(item.name.clone());
            pb.inc(1);
        },
    );
    pb.finish_with_message("Done!");

    for (_, result) in report.succeeded() {
        fs::write(output_dir.join(&result.filename), &result.bytes)?;
    }

    println!("\n{}", "Results:".green().bold());
    for item in &report.items {
        match &item.outcome {
            Ok(result) => println!("  {} {} -> {}", "✓".green(), item.name, result.filename),
            Err(e) => println!("  {} {}: {}", "✗".red(), item.name, e),
        }
    }

    let failed = report.failure_count();
    if failed > 0 {
        return Err(format!("{failed} of {} files failed", report.items.len()).into());
    }
    Ok(())
}

fn cmd_formats() {
    println!("{}", "Supported formats".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for format in Format::ALL {
        let read = if format.is_readable() { "read".green() } else { "----".dimmed() };
        let write = if format.is_writable() { "write".green() } else { "-----".dimmed() };
        println!("  {:<6} {} {}  {}", format.extension(), read, write, format.mime_type().dimmed());
    }
}

fn cmd_split(input: &Path, ranges: &[PageRange], output_dir: &Path) -> CliResult {
    fs::create_dir_all(output_dir)?;
    let bytes = fs::read(input)?;

    let parts = if ranges.is_empty() {
        pdf::split(&bytes)?.pages
    } else {
        pdf::split_ranges(&bytes, ranges)?
    };
    for part in &parts {
        fs::write(output_dir.join(&part.name), &part.bytes)?;
    }

    println!(
        "{} {} documents to {}",
        "Wrote".green(),
        parts.len(),
        output_dir.display()
    );
    Ok(())
}

struct BarProgress(ProgressBar);

impl CompressionProgress for BarProgress {
    fn on_image(&self, index: usize, total: usize) {
        self.0.set_length(total as u64);
        self.0.set_message(format!("Optimizing image {index}/{total}..."));
    }

    fn on_image_done(&self, _report: &ImageReport) {
        self.0.inc(1);
    }
}

fn cmd_compress(input: &Path, level: CompressionLevel, output: Option<PathBuf>) -> CliResult {
    let bytes = fs::read(input)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );
    let progress = BarProgress(pb);
    let report = pdf::compress_with_progress(&bytes, level, &progress)?;
    progress.0.finish_with_message("Done!");

    let path = derived(input, output, "compressed");
    fs::write(&path, &report.bytes)?;

    println!("\n{}", "Compression".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Level".bold(), level.name());
    println!(
        "{}: {}/{}",
        "Images recompressed".bold(),
        report.compressed_count(),
        report.images.len()
    );
    println!(
        "{}: {} -> {} bytes ({:.0}% smaller)",
        "Size".bold(),
        report.original_size,
        report.new_size,
        report.reduction().round()
    );
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> CliResult {
    let info = pdf::info(&fs::read(input)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), info.version);
    println!("{}: {}", "Pages".bold(), info.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if info.encrypted { "Yes" } else { "No" }
    );

    for (label, value) in [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Subject", &info.subject),
        ("Keywords", &info.keywords),
        ("Creator", &info.creator),
        ("Producer", &info.producer),
    ] {
        if !value.is_empty() {
            println!("{}: {}", label.bold(), value);
        }
    }
    if let Some(created) = info.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(modified) = info.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    if let Some(first) = info.pages.first() {
        println!(
            "{}: {:.0} x {:.0} pt",
            "Page size".bold(),
            first.width,
            first.height
        );
    }
    Ok(())
}

fn save(path: &Path, bytes: &[u8]) -> CliResult {
    fs::write(path, bytes)?;
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

/// `report.pdf` -> `report_{suffix}.pdf` next to the input.
fn derived(input: &Path, output: Option<PathBuf>, suffix: &str) -> PathBuf {
    output.unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        input.with_file_name(format!("{stem}_{suffix}.pdf"))
    })
}

fn parse_named_range(s: &str) -> Result<PageRange, String> {
    let (name, pages) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PAGES, got '{s}'"))?;
    let pages = match PageSelection::parse(pages).map_err(|e| e.to_string())? {
        PageSelection::All => return Err(format!("range '{name}' needs explicit pages")),
        selection => selection.resolve(0),
    };
    Ok(PageRange::new(name.trim(), pages))
}
