//! estate-forge – renders a sales document from a JSON context.
//!
//! Usage:
//!   estate-forge <kind> <context.json> [output] [--options opts.json]
//!                [--locale en|ar|bilingual] [--html] [--landscape] [--title T]
//!
//! If `output` is omitted the document is written next to the context file
//! with the same stem (e.g. `booking.json` → `booking.pdf`).

use std::{env, fs, path::Path, path::PathBuf, process};

use estate_forge::config::RenderOptions;
use estate_forge::context::DocumentContext;
use estate_forge::documents::{compose_html, DocumentKind};
use estate_forge::error::Result;
use estate_forge::locale::Locale;
use estate_forge::pipeline::generate_pdf;

#[derive(Debug, Default)]
struct Args {
    kind: Option<String>,
    context: Option<PathBuf>,
    output: Option<PathBuf>,
    options: Option<PathBuf>,
    locale: Option<String>,
    html: bool,
    landscape: bool,
    title: Option<String>,
}

fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let prog = argv.first().map(String::as_str).unwrap_or("estate-forge");

    let args = match parse_args(argv.get(1..).unwrap_or_default()) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("Error: {msg}");
            print_usage(prog);
            process::exit(1);
        }
    };

    let (Some(kind), Some(context)) = (args.kind.clone(), args.context.clone()) else {
        eprintln!("Error: a document kind and a context file are required.");
        print_usage(prog);
        process::exit(1);
    };

    if let Err(e) = run(&kind, &context, &args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn parse_args(raw: &[String]) -> std::result::Result<Args, String> {
    let mut args = Args::default();
    let mut positional = 0usize;
    let mut iter = raw.iter();

    let value = |flag: &str, v: Option<&String>| {
        v.cloned()
            .ok_or_else(|| format!("{flag} needs a value"))
    };

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => args.landscape = true,
            "--html" => args.html = true,
            "--title" | "-t" => args.title = Some(value(arg, iter.next())?),
            "--locale" => args.locale = Some(value(arg, iter.next())?),
            "--options" | "-o" => args.options = Some(PathBuf::from(value(arg, iter.next())?)),
            "--help" | "-h" => {
                print_usage("estate-forge");
                process::exit(0);
            }
            other if other.starts_with('-') => return Err(format!("unknown flag: {other}")),
            path => {
                match positional {
                    0 => args.kind = Some(path.to_string()),
                    1 => args.context = Some(PathBuf::from(path)),
                    2 => args.output = Some(PathBuf::from(path)),
                    _ => return Err(format!("unexpected argument: {path}")),
                }
                positional += 1;
            }
        }
    }
    Ok(args)
}

fn run(kind: &str, context_path: &Path, args: &Args) -> Result<()> {
    let kind: DocumentKind = kind.parse()?;

    let mut options = match &args.options {
        Some(path) => RenderOptions::from_json_file(path)?,
        None => RenderOptions::default(),
    };
    if let Some(locale) = &args.locale {
        options.locale = locale.parse::<Locale>()?;
    }
    if args.landscape {
        options.page.landscape = true;
    }

    let json = fs::read_to_string(context_path)?;
    let context = DocumentContext::from_json(kind, &json)?;
    let html = compose_html(kind, &context, &options)?;

    let output = args.output.clone().unwrap_or_else(|| {
        let mut o = context_path.to_path_buf();
        o.set_extension(if args.html { "html" } else { "pdf" });
        o
    });
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if args.html {
        fs::write(&output, &html)?;
        eprintln!("Wrote '{}' ({} bytes, HTML)", output.display(), html.len());
        return Ok(());
    }

    let mut config = options.pipeline_config(kind);
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    let (bytes, layout) = generate_pdf(&html, &config)?;
    fs::write(&output, &bytes)?;

    let pages = layout.page_count();
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        bytes.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
    Ok(())
}

fn print_usage(prog: &str) {
    eprintln!("estate-forge – real-estate sales documents to PDF");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <kind> <context.json> [output] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <kind>           broker-agreement | reservation-form | sales-offer | spa");
    eprintln!("  <context.json>   Document context");
    eprintln!("  [output]         Output path (default: context stem with .pdf or .html)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --options, -o    Render options JSON (locale, currency, developer, page, font_path)");
    eprintln!("  --locale         en | ar | bilingual (overrides the options file)");
    eprintln!("  --html           Write the composed HTML instead of a PDF");
    eprintln!("  --landscape      Landscape page orientation");
    eprintln!("  --title, -t      PDF metadata title (default: localized document title)");
    eprintln!("  --help           Print this message");
}
