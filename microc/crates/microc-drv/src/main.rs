//! `microc` - command-line entry point.

use std::path::PathBuf;

use clap::Parser as ClapParser;
use clap::Subcommand;
use microc_drv::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(ClapParser, Debug)]
#[command(name = "microc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A small C-like to x86-64 compiler", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose diagnostic logging
    #[arg(short, long, global = true, env = "MICROC_VERBOSE")]
    verbose: bool,

    /// Disable colored terminal output
    #[arg(long, global = true, env = "MICROC_NO_COLOR")]
    no_color: bool,

    /// Path to a configuration file (defaults to the standard search path)
    #[arg(short, long, global = true, env = "MICROC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile one or more source files
    Compile(CompileArgs),
}

#[derive(ClapParser, Debug)]
struct CompileArgs {
    /// Source files to compile
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Directory assembly output is written to
    #[arg(long)]
    emit_asm: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.no_color)?;

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Compile(args) => run_compile(args, &config, cli.verbose),
    }
}

fn init_logging(verbose: bool, no_color: bool) -> anyhow::Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    let subscriber = fmt::layer().with_ansi(!no_color).with_target(false);
    tracing_subscriber::registry().with(filter).with(subscriber).try_init()?;
    Ok(())
}

fn run_compile(args: CompileArgs, config: &Config, verbose: bool) -> anyhow::Result<()> {
    let emit_dir = args.emit_asm.unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let mut total_errors = 0usize;

    for path in &args.input {
        if verbose {
            tracing::debug!(file = %path.display(), "compiling");
        }
        let outcome = microc_drv::compile_file(path, config)?;
        for line in &outcome.diagnostics {
            eprintln!("{line}");
        }
        total_errors += outcome.errors;

        if let Some(asm) = outcome.asm {
            std::fs::create_dir_all(&emit_dir)?;
            let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "out".to_string());
            let out_path = emit_dir.join(format!("{stem}.s"));
            std::fs::write(&out_path, asm)?;
            if verbose {
                tracing::info!(output = %out_path.display(), "wrote assembly");
            }
        }
    }

    if total_errors > 0 {
        anyhow::bail!("compilation failed with {total_errors} error(s)");
    }
    Ok(())
}
