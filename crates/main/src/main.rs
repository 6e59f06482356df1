use std::error::Error;
use std::path::PathBuf;

use chrono::Datelike;
use clap::Parser;
use log::LevelFilter;
use mdpdf::model::{DocumentMeta, Resource};
use mdpdf::{PdfBuilder, TocStyle};

/// Converts a Markdown file into a professionally formatted PDF.
///
/// Text metrics come from the Liberation Sans and Liberation Mono fonts. Put
/// them under `assets/fonts` next to the binary, point `MDPDF_FONTS_DIR` at
/// them, or install them system-wide.
#[derive(Parser)]
#[command(author)]
struct Cli {
    /// Path to the input Markdown file.
    #[arg(long)]
    input: PathBuf,

    /// Path for the output PDF file.
    #[arg(long)]
    output: PathBuf,

    /// Document title, shown on the cover page and in the running header.
    #[arg(long, default_value = "Document")]
    title: String,

    /// Subtitle shown on the cover page.
    #[arg(long, default_value = "")]
    subtitle: String,

    /// Author shown on the cover page.
    #[arg(long, default_value = "Author")]
    author: String,

    /// Document version shown on the cover page.
    #[arg(long = "version", default_value = "1.0")]
    doc_version: String,

    /// Year shown on the cover page; defaults to the current year.
    #[arg(long)]
    year: Option<String>,

    /// Entry for the trailing resources page, as `Name=Description`.
    #[arg(long = "resource", value_name = "NAME=DESCRIPTION", value_parser = parse_resource)]
    resources: Vec<Resource>,

    /// Print the first page of every section in the table of contents.
    #[arg(long)]
    toc_page_numbers: bool,

    /// Embed a PDF outline with one bookmark per section and its subsections.
    #[cfg(feature = "bookmarks")]
    #[arg(long)]
    bookmarks: bool,

    /// Increase log output (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_resource(value: &str) -> Result<Resource, String> {
    let (name, description) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=DESCRIPTION, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("resource name must not be empty".to_owned());
    }
    Ok(Resource::new(name, description.trim()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let year = cli
        .year
        .unwrap_or_else(|| chrono::Local::now().year().to_string());
    let meta = DocumentMeta::new(cli.title)
        .with_subtitle(cli.subtitle)
        .with_author(cli.author)
        .with_version(cli.doc_version)
        .with_year(year);
    let toc_style = if cli.toc_page_numbers {
        TocStyle::WithPageNumbers
    } else {
        TocStyle::TitlesOnly
    };

    let builder = PdfBuilder::new()
        .with_meta(meta)
        .with_resources(cli.resources)
        .with_toc_style(toc_style);
    #[cfg(feature = "bookmarks")]
    let builder = builder.with_bookmarks(cli.bookmarks);

    match builder.convert_file(&cli.input, &cli.output) {
        Ok(_) => println!("PDF generated successfully: {}", cli.output.display()),
        Err(err) => {
            eprintln!("Error: {}", err);
            print_error_sources(&err);
            std::process::exit(1);
        }
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
