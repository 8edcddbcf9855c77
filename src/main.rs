//! reqdoc – command-line response → PDF exporter.
//!
//! Usage:
//!   reqdoc <response.txt> [output.pdf] [--title T] [--author A] [--company C]
//!          [--options opts.json] [--metrics-font font.ttf] [--blocks]
//!
//! If `output.pdf` is omitted the PDF is written next to the input file,
//! named after the slugified document title.

use std::{env, fs, path::PathBuf, process};

use reqdoc::{normalize, DocumentMetadata, ExportOptions, ExportOrchestrator, ForgeEngine};

#[derive(Default)]
struct Args {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    title: Option<String>,
    author: Option<String>,
    company: Option<String>,
    options: Option<PathBuf>,
    metrics_font: Option<PathBuf>,
    blocks_only: bool,
}

fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let prog = argv.first().map(String::as_str).unwrap_or("reqdoc");
    let args = match parse_args(&argv[1..]) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage(prog);
            process::exit(0);
        }
        Err(msg) => {
            eprintln!("Error: {msg}");
            print_usage(prog);
            process::exit(1);
        }
    };

    if let Err(msg) = run(args) {
        eprintln!("Error: {msg}");
        process::exit(1);
    }
}

/// `Ok(None)` means help was requested.
fn parse_args(raw: &[String]) -> Result<Option<Args>, String> {
    let mut args = Args::default();
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--title" | "-t" => args.title = Some(value(arg.as_str())?),
            "--author" | "-a" => args.author = Some(value(arg.as_str())?),
            "--company" | "-c" => args.company = Some(value(arg.as_str())?),
            "--options" | "-o" => args.options = Some(PathBuf::from(value(arg.as_str())?)),
            "--metrics-font" => args.metrics_font = Some(PathBuf::from(value(arg.as_str())?)),
            "--blocks" => args.blocks_only = true,
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') => return Err(format!("Unknown flag: {other}")),
            path if args.input.is_none() => args.input = Some(PathBuf::from(path)),
            path if args.output.is_none() => args.output = Some(PathBuf::from(path)),
            path => return Err(format!("Unexpected argument: {path}")),
        }
    }
    if args.input.is_none() {
        return Err("no input file specified.".into());
    }
    Ok(Some(args))
}

fn run(args: Args) -> Result<(), String> {
    let input = args.input.ok_or("no input file specified.")?;
    let response = fs::read_to_string(&input)
        .map_err(|e| format!("reading '{}': {e}", input.display()))?;

    if args.blocks_only {
        let json = serde_json::to_string_pretty(&normalize(&response))
            .map_err(|e| format!("serialising blocks: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let options = match &args.options {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("reading '{}': {e}", path.display()))?;
            ExportOptions::from_json(&json)
                .map_err(|e| format!("parsing '{}': {e}", path.display()))?
        }
        None => ExportOptions::default(),
    };

    let mut engine = ForgeEngine::new();
    if let Some(path) = &args.metrics_font {
        let bytes =
            fs::read(path).map_err(|e| format!("reading '{}': {e}", path.display()))?;
        engine = engine.with_metrics_font(bytes).map_err(|e| e.to_string())?;
    }

    let mut metadata = DocumentMetadata::default();
    if let Some(title) = args.title {
        metadata = metadata.with_title(title);
    }
    if let Some(author) = args.author {
        metadata = metadata.with_author(author);
    }
    if let Some(company) = args.company {
        metadata = metadata.with_company(company);
    }

    let mut orchestrator = ExportOrchestrator::new(engine);
    let file = orchestrator
        .export_response(Some(&response), &metadata, &options)
        .map_err(|e| e.to_string())?;

    let output = args
        .output
        .unwrap_or_else(|| input.with_file_name(&file.file_name));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("creating output directory: {e}"))?;
        }
    }
    fs::write(&output, &file.bytes)
        .map_err(|e| format!("writing '{}': {e}", output.display()))?;

    for drift in &file.toc_drift {
        eprintln!(
            "Note: TOC lists '{}' on page {}, rendered on page {}",
            drift.label, drift.estimated, drift.actual
        );
    }
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        file.bytes.len(),
        file.total_pages,
        if file.total_pages == 1 { "" } else { "s" }
    );
    Ok(())
}

fn print_usage(prog: &str) {
    eprintln!("reqdoc – requirement response to PDF exporter");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <response.txt> [output.pdf] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <response.txt>       Response text from the processing service");
    eprintln!("  [output.pdf]         Output path (default: slugified title next to the input)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --title, -t T        Document title (default: \"Project Documentation\")");
    eprintln!("  --author, -a A       Author shown on the cover (default: \"Project Team\")");
    eprintln!("  --company, -c C      Company shown on the cover (default: \"Independent\")");
    eprintln!("  --options, -o FILE   JSON export options (page_size, orientation, margin_pt, ...)");
    eprintln!("  --metrics-font FILE  TTF used to measure text (Helvetica-compatible)");
    eprintln!("  --blocks             Print the normalized blocks as JSON and exit");
    eprintln!("  --help               Print this message");
}
