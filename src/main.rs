//! glshim - legacy OpenGL shader tools
//!
//! Command line front end for the ARB translator and the precompiled shader
//! archive.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use gs_arb::header::detect_kind;
use gs_arb::{locate, ArbTranslator};
use gs_core::{ArbError, Config, Locator, ProgramKind};
use gs_psa::ShaderArchive;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "glshim", version, about = "ARB assembly to GLSL translation and shader archive tools")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate an ARB assembly program to GLSL
    Translate {
        /// Program source file
        file: PathBuf,

        /// Treat the input as a vertex program
        #[arg(long, conflicts_with = "fragment")]
        vertex: bool,

        /// Treat the input as a fragment program
        #[arg(long)]
        fragment: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the contents summary of a precompiled shader archive
    PsaInfo {
        /// Archive file (default: the configured archive, if enabled)
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    gs_core::logging::init(config.debug.log_level);

    match cli.command {
        Commands::Translate {
            file,
            vertex,
            fragment,
            output,
        } => {
            let kind = if vertex {
                Some(ProgramKind::Vertex)
            } else if fragment {
                Some(ProgramKind::Fragment)
            } else {
                None
            };
            run_translate(&config, &file, kind, output.as_deref())
        }
        Commands::PsaInfo { file } => {
            let path = match file {
                Some(path) => path,
                None => match config.cache.active_archive() {
                    Some(path) => path.to_path_buf(),
                    None => bail!("shader archive is disabled in the configuration"),
                },
            };
            run_psa_info(&path)
        }
    }
}

fn run_translate(
    config: &Config,
    file: &Path,
    kind: Option<ProgramKind>,
    output: Option<&Path>,
) -> Result<()> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let kind = match kind.or_else(|| detect_kind(&source)) {
        Some(kind) => kind,
        None => bail!("{}: no ARB program header found", file.display()),
    };
    tracing::info!("Translating {} as a {} program", file.display(), kind);

    let translator = ArbTranslator::new(config.translator.clone());
    let glsl = translator
        .translate(&source, kind)
        .map_err(|err| anyhow!("{}", describe(file, &source, &err)))?;

    if config.debug.dump_shaders {
        dump_shader(&config.debug.dump_path, file, kind, &glsl);
    }

    match output {
        Some(path) => fs::write(path, &glsl)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", glsl),
    }

    Ok(())
}

fn run_psa_info(path: &Path) -> Result<()> {
    let mut archive = ShaderArchive::new();
    if !archive.load(path) {
        bail!("{}: not a readable shader archive", path.display());
    }

    println!("{}: {} program binaries", path.display(), archive.len());
    Ok(())
}

/// Format a translation error as `file:line:col: message`
fn describe(file: &Path, source: &str, err: &ArbError) -> String {
    match err.locator() {
        Locator::Offset(offset) => {
            let (line, column) = locate(source, offset);
            format!("{}:{}:{}: {}", file.display(), line, column, err.diagnostic())
        }
        Locator::Phase(phase) => {
            format!("{}: {} ({})", file.display(), err.diagnostic(), phase)
        }
    }
}

/// Write the generated program under `dir`; failures are only logged
fn dump_shader(dir: &Path, file: &Path, kind: ProgramKind, glsl: &str) {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());
    let path = dir.join(format!("{}.{}.glsl", stem, kind));

    let result = fs::create_dir_all(dir).and_then(|_| fs::write(&path, glsl));
    match result {
        Ok(()) => tracing::debug!("Dumped shader to {}", path.display()),
        Err(e) => tracing::warn!("Failed to dump shader to {}: {}", path.display(), e),
    }
}
