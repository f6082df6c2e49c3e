//! Command-line interface for xsdtojson

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use xsdtojson::catalog::XmlCatalog;
#[cfg(feature = "cli")]
use xsdtojson::{
    convert, ConversionOptions, FileReader, Location, OutputMode, ResolverOptions,
};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsdtojson")]
#[command(author, version, about = "Translate XML Schema into JSON Schema Draft-07", long_about = None)]
struct Cli {
    /// Main XSD file, or a directory holding the schema set
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Main schema file name when INPUT is a directory
    #[arg(short, long, value_name = "FILE")]
    main: Option<String>,

    /// Output file ("-" for stdout; defaults to <main-stem>.json)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Pretty print the output
    #[arg(short, long)]
    pretty: bool,

    /// Expand every type in place instead of using definitions
    #[arg(long)]
    no_ref: bool,

    /// Extra directory searched for imported and included schemas
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// OASIS XML catalog used to resolve schema locations
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Prefix for attribute property names
    #[arg(long, value_name = "PREFIX", default_value = "")]
    attribute_prefix: String,

    /// Anchor patterns as whole-value matches
    #[arg(long)]
    anchor_patterns: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbose == 0 {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
    } else {
        tracing_subscriber::EnvFilter::new(default)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let main_path = main_schema(&cli.input, cli.main.as_deref())?;

    let mut resolver_options = ResolverOptions::default();
    for dir in &cli.include_dirs {
        resolver_options = resolver_options.with_search_path(dir);
    }
    if let Some(path) = &cli.catalog {
        let catalog = XmlCatalog::load(&Location::from(path.as_path()), &FileReader::new())?;
        resolver_options = resolver_options.with_catalog(catalog);
    }

    let mode = if cli.no_ref {
        OutputMode::Inline
    } else {
        OutputMode::Referenced
    };
    let options = ConversionOptions::default()
        .with_mode(mode)
        .with_attribute_prefix(cli.attribute_prefix)
        .with_anchor_patterns(cli.anchor_patterns);

    let document = convert(
        &Location::from(main_path.as_path()),
        FileReader::new(),
        resolver_options,
        &options,
    )?;

    let output = match cli.output {
        Some(path) => path,
        None => default_output(&main_path),
    };
    if output.as_os_str() == "-" {
        let stdout = io::stdout();
        document.write_to(stdout.lock(), cli.pretty)?;
        println!();
    } else {
        let mut text = if cli.pretty {
            document.to_string_pretty()?
        } else {
            document.to_json_string()?
        };
        text.push('\n');
        fs::write(&output, text)?;
        tracing::info!(output = %output.display(), "wrote JSON Schema");
    }
    Ok(())
}

/// The main schema path for an input file or directory
#[cfg(feature = "cli")]
fn main_schema(input: &Path, main: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if !input.is_dir() {
        if main.is_some() {
            tracing::warn!("--main is ignored when INPUT is a file");
        }
        return Ok(input.to_path_buf());
    }

    if let Some(name) = main {
        let path = input.join(name);
        if !path.is_file() {
            return Err(format!("main schema {} not found", path.display()).into());
        }
        return Ok(path);
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "xsd"))
        .collect();
    candidates.sort();
    match candidates.into_iter().next() {
        Some(path) => {
            tracing::info!(main = %path.display(), "detected main schema");
            Ok(path)
        }
        None => Err(format!("no .xsd file in {}; use --main", input.display()).into()),
    }
}

#[cfg(feature = "cli")]
fn default_output(main: &Path) -> PathBuf {
    let stem = main
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schema".to_string());
    PathBuf::from(format!("{}.json", stem))
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
