// ========================================================================================
//
//                         THE COMMAND-LINE FRONT END: RSID-GENES
//
// ========================================================================================
//
// Resolves the user's paths and lookup settings, then hands off to the pipeline.
// Paths that are not given on the command line are asked for interactively.

use clap::Parser;
use rsid_genes::config::LookupConfig;
use rsid_genes::lookup::MyVariantClient;
use rsid_genes::pipeline;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

// ========================================================================================
//                         COMMAND-LINE INTERFACE DEFINITION
// ========================================================================================

#[derive(Parser, Debug)]
#[clap(
    name = "rsid-genes",
    version,
    about = "Rewrites an RSID-labelled edge CSV into a gene-labelled edge CSV."
)]
struct Args {
    /// Input edge CSV with a `Label` column of comma-separated RSIDs. Prompted for if omitted.
    input_path: Option<PathBuf>,

    /// Output edge CSV. Prompted for if omitted.
    output_path: Option<PathBuf>,

    /// TOML file with lookup settings (endpoint, scopes, fields, batch_size, timeout_secs).
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the lookup endpoint URL.
    #[clap(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Override the identifier namespace sent to the lookup.
    #[clap(long)]
    scopes: Option<String>,

    /// Override the number of identifiers sent per request.
    #[clap(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Print the effective lookup configuration as TOML and exit.
    #[clap(long)]
    print_config: bool,
}

// ========================================================================================
//                           THE MAIN ORCHESTRATION LOGIC
// ========================================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let start_time = Instant::now();

    // --- Phase 1: Configuration ---
    let mut config = match &args.config {
        Some(path) => LookupConfig::load(path)?,
        None => LookupConfig::default(),
    };
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(scopes) = args.scopes {
        config.scopes = scopes;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    // --- Phase 2: Path Resolution ---
    let input_path = match args.input_path {
        Some(path) => path,
        None => prompt_path("Enter the name of the input graph file: ")?,
    };
    let output_path = match args.output_path {
        Some(path) => path,
        None => prompt_path("Enter the desired name of the output graph file: ")?,
    };

    // --- Phase 3: Pipeline ---
    let client = MyVariantClient::new(&config)?;
    let summary = pipeline::run(&input_path, &output_path, &client, &config.scopes)?;
    log::debug!("Run summary: {summary:?}");

    println!("Done! ({:.2?})", start_time.elapsed());
    Ok(())
}

// ========================================================================================
//                                  HELPER FUNCTIONS
// ========================================================================================

/// Asks for a path on stdin. Only the line terminator is removed; the rest of the
/// line is taken as typed.
fn prompt_path(message: &str) -> io::Result<PathBuf> {
    let mut stdout = io::stdout();
    write!(stdout, "{message}")?;
    stdout.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no path given on standard input",
        ));
    }
    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(PathBuf::from(trimmed))
}
