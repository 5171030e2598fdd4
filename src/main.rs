//! CLI entrypoint for `lsassy-writer`.
//!
//! Loads a record dump (credentials, Kerberos tickets, DPAPI masterkeys)
//! produced upstream, renders it in the requested format, prints it, appends
//! it to an output file when asked, and persists tickets and masterkeys.
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, error};
use lsassy_writer::{
    records::RecordSet,
    render::{DEFAULT_FORMAT, RendererRegistry},
    writer::{OutputWriter, WriteOptions},
};

#[derive(Parser, Debug)]
#[command(
    name = "lsassy-writer",
    version,
    about = "Render and persist lsassy dumps"
)]
struct Args {
    /// Path to the JSON record dump
    #[arg(short = 'i', long = "input", required_unless_present = "list_formats")]
    input: Option<PathBuf>,

    /// Display format
    #[arg(short = 'f', long = "format", default_value = DEFAULT_FORMAT)]
    format: String,

    /// Format of the output file content (defaults to the display format)
    #[arg(long = "file-format")]
    file_format: Option<String>,

    /// Append results to this file
    #[arg(short = 'o', long = "outfile")]
    outfile: Option<PathBuf>,

    /// Only show user accounts
    #[arg(long = "users")]
    users: bool,

    /// Include Kerberos tickets in the output
    #[arg(long = "tickets")]
    tickets: bool,

    /// Include DPAPI masterkeys in the output
    #[arg(long = "masterkeys")]
    masterkeys: bool,

    /// Directory where Kerberos tickets are saved
    #[arg(short = 'K', long = "kerberos-dir")]
    kerberos_dir: Option<PathBuf>,

    /// File where DPAPI masterkeys are appended
    #[arg(short = 'M', long = "masterkeys-file")]
    masterkeys_file: Option<PathBuf>,

    /// List available output formats and exit
    #[arg(long = "list-formats")]
    list_formats: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control color output (auto, always, never)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Do not print results to stdout
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn load_input(args: &Args) -> Result<RecordSet> {
    let Some(input) = &args.input else {
        bail!("no record dump provided (-i/--input)");
    };
    if !input.exists() {
        bail!("record dump not found: {}", input.display());
    }
    RecordSet::from_json_path(input)
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);
    match args.color {
        ColorChoice::Always => {
            colored::control::set_override(true);
        }
        ColorChoice::Never => {
            colored::control::set_override(false);
        }
        ColorChoice::Auto => {}
    }

    let registry = RendererRegistry::with_defaults();
    if args.list_formats {
        for format in registry.formats() {
            println!("{}", format);
        }
        return;
    }

    let records = match load_input(&args) {
        Ok(r) => r,
        Err(e) => {
            error!("failed to load input: {:#}", e);
            std::process::exit(2);
        }
    };
    log::info!(
        "loaded {} credentials, {} tickets, {} masterkeys",
        records.credentials.len(),
        records.tickets.len(),
        records.masterkeys.len()
    );

    let opts = WriteOptions {
        file_format: args.file_format,
        display_format: args.format,
        output_file: args.outfile,
        quiet: args.quiet,
        users_only: args.users,
        include_tickets: args.tickets,
        include_masterkeys: args.masterkeys,
        ticket_dir: args.kerberos_dir,
        masterkeys_file: args.masterkeys_file,
    };
    match OutputWriter::new(&records, &registry).write(&opts) {
        Ok(outcome) => {
            for (what, res) in [("tickets", &outcome.tickets), ("masterkeys", &outcome.masterkeys)] {
                match res {
                    Some(r) => debug!("{}: {:?}", what, r),
                    None => debug!("{}: persistence skipped", what),
                }
            }
        }
        Err(e) => {
            debug!("write failed: {}", e);
            std::process::exit(1);
        }
    }
}
