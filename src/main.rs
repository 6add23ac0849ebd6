use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{ensure, Context};
use clap::Parser;
use pak::PakError;
use tracing::{error, info, warn, Level};

mod index;
mod pack;
mod pak;
mod sniff;
mod unpack;

#[derive(Debug, Parser)]
#[command(name = "pak", version, about = "Pack and unpack Chromium .pak resource files")]
struct Cli {
    /// Index file with -p, .pak file with -u
    pub input: PathBuf,
    /// .pak file with -p, destination directory with -u
    pub output: PathBuf,

    /// Re-pack a pak from a pak_index.ini
    #[arg(short)]
    pub pack: bool,

    /// Unpack a pak into a directory
    #[arg(short)]
    pub unpack: bool,

    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(long)]
    pub quiet: bool,
}

mod exit {
    pub const USAGE: u8 = 1;
    pub const BAD_INDEX: u8 = 2;
    pub const IO: u8 = 3;
    pub const OUT_OF_MEMORY: u8 = 4;
    pub const BAD_PAK: u8 = 5;
    pub const OTHER: u8 = 6;
}

fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            return if e.use_stderr() {
                ExitCode::from(exit::USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(args: &Cli) -> anyhow::Result<()> {
    ensure!(
        args.pack != args.unpack || !args.pack,
        "Must be specified only a single operation!"
    );
    ensure!(
        args.pack != args.unpack || args.pack,
        "Operation must be specified!"
    );

    if args.pack {
        pack_file(&args.input, &args.output)
    } else {
        unpack_file(&args.input, &args.output)
    }
}

fn exit_code(e: &anyhow::Error) -> u8 {
    let Some(e) = e.chain().find_map(|e| e.downcast_ref::<PakError>()) else {
        return exit::USAGE;
    };

    match e {
        PakError::BadIndex { .. }
        | PakError::TooManyResources { .. }
        | PakError::InvalidAlias { .. }
        | PakError::AliasShadowsResource(_)
        | PakError::ArchiveTooLarge { .. } => exit::BAD_INDEX,
        PakError::Io { .. } => exit::IO,
        PakError::OutOfMemory { .. } => exit::OUT_OF_MEMORY,
        PakError::UnsupportedVersion(_)
        | PakError::TruncatedHeader { .. }
        | PakError::TruncatedEntryTable { .. }
        | PakError::TruncatedAliasTable { .. }
        | PakError::MalformedArchive(_) => exit::BAD_PAK,
        PakError::NotFound(_) | PakError::BufferTooSmall { .. } => exit::OTHER,
    }
}

fn pack_file(index: &Path, output: &Path) -> anyhow::Result<()> {
    let buffer = pack::pack_index(index)
        .with_context(|| format!("Unable to pack {}", index.display()))?;

    std::fs::write(output, &buffer)
        .map_err(PakError::io(output))
        .inspect_err(|_| {
            std::fs::remove_file(output)
                .inspect_err(|e| warn!("Unable to remove {}: {e}", output.display()))
                .ok();
        })
        .context("Unable to write pak")?;

    info!("Packed {} to {}", index.display(), output.display());
    Ok(())
}

fn unpack_file(input: &Path, output: &Path) -> anyhow::Result<()> {
    let report = unpack::unpack_file(input, output)
        .with_context(|| format!("Unable to unpack {}", input.display()))?;

    info!(
        "Unpacked {} resources and {} aliases from {}, index written to {}",
        report.resource_count,
        report.alias_count,
        input.display(),
        report.index_path.display()
    );
    Ok(())
}
