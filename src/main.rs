use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jmmc::JasminBackend;
use jmmc::config::BackendConfig;
use jmmc::diagnostics::{CompileError, render_error};
use jmmc::parser::load_unit;

#[derive(Parser)]
#[command(name = "jmmc", version, about = "Jasmin backend for Java-- compilation units")]
struct Cli {
    /// Log compiler progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Jasmin assembly for a compilation unit
    Emit {
        /// Unit document (tree + symbol table, JSON)
        file: PathBuf,
        /// Output path. If omitted, prints to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Backend config (defaults to ./jmmc.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the stack and locals limits of every method
    Limits {
        /// Unit document (tree + symbol table, JSON)
        file: PathBuf,
        /// Backend config (defaults to ./jmmc.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<BackendConfig, CompileError> {
    match path {
        Some(path) => BackendConfig::load(path),
        None => BackendConfig::discover(Path::new(".")),
    }
}

fn backend_for(file: &Path, config: Option<&Path>) -> Result<JasminBackend, CompileError> {
    let config = load_config(config)?;
    let unit = load_unit(file)?;
    Ok(JasminBackend::new(unit, config))
}

fn emit(file: &Path, output: Option<&Path>, config: Option<&Path>) -> Result<(), CompileError> {
    let backend = backend_for(file, config)?;
    let text = backend.build()?;
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .map_err(|e| CompileError::emit(format!("failed to write {}: {e}", path.display())))?;
            info!(class = %backend.unit().table.class_name, output = %path.display(), "wrote jasmin");
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn limits(file: &Path, config: Option<&Path>) -> Result<(), CompileError> {
    let backend = backend_for(file, config)?;
    for m in backend.limits()? {
        println!("{} stack={} locals={}", m.name, m.max_stack, m.max_locals);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (file, result) = match &cli.command {
        Commands::Emit { file, output, config } => {
            (file, emit(file, output.as_deref(), config.as_deref()))
        }
        Commands::Limits { file, config } => (file, limits(file, config.as_deref())),
    };

    if let Err(err) = result {
        render_error(&file.to_string_lossy(), &err);
        std::process::exit(1);
    }
}
