use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use bale::error::{BaleError, FormatError, IoError};
use bale::reader::{BaleReader, Input};
use bale::record::MemberHeader;
use bale::writer::BaleWriter;

#[derive(Parser)]
#[command(name = "bale", about = "The .bale sequential archive CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack files into a .bale archive
    Build {
        /// Archive to write; standard output when omitted
        #[arg(short = 'f', long)]
        archive: Option<PathBuf>,
        /// Report each member as it is added
        #[arg(short, long)]
        verbose: bool,
        #[arg(required = true, num_args = 1..)]
        members: Vec<PathBuf>,
    },
    /// Extract every member of an archive
    Unpack {
        /// Archive to read; standard input when omitted
        #[arg(short = 'f', long)]
        archive: Option<PathBuf>,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        /// Report each member as it is extracted
        #[arg(short, long)]
        verbose: bool,
    },
    /// List archive members
    List {
        /// Archive to read; standard input when omitted
        #[arg(short = 'f', long)]
        archive: Option<PathBuf>,
        /// Show mode, owner, timestamp, and stored digests
        #[arg(short, long)]
        verbose: bool,
    },
    /// Recompute every digest and compare against the stored footers
    Verify {
        /// Archive to read; standard input when omitted
        #[arg(short = 'f', long)]
        archive: Option<PathBuf>,
        /// Report each member as it passes
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bale: {err}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(command: Commands) -> Result<(), BaleError> {
    match command {

        // ── Build ────────────────────────────────────────────────────────────
        Commands::Build { archive, verbose, members } => {
            // Progress goes to stderr so the archive itself can stream to
            // stdout when no output path is given.
            let sink: Box<dyn Write> = match &archive {
                Some(path) => Box::new(File::create(path).map_err(|source| IoError::Open {
                    path: path.clone(),
                    source,
                })?),
                None => Box::new(io::stdout()),
            };
            let mut writer = BaleWriter::new(sink)?;
            for path in &members {
                let header = writer.append_path(path)?;
                if verbose {
                    eprintln!("  added  {}", header.name);
                }
            }
            let count = writer.members();
            writer.finish()?;
            match &archive {
                Some(path) => eprintln!("wrote {count} member(s) to {}", path.display()),
                None       => eprintln!("wrote {count} member(s) to standard output"),
            }
        }

        // ── Unpack ───────────────────────────────────────────────────────────
        Commands::Unpack { archive, output_dir, verbose } => {
            let mut reader = open_archive(&archive)?;
            let mut progress = |h: &MemberHeader| eprintln!("  extracted  {}", h.name);
            let count = reader.unpack(&output_dir, verbose.then_some(&mut progress))?;
            println!("unpacked {count} member(s) to {}", output_dir.display());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { archive, verbose } => {
            let mut reader = open_archive(&archive)?;
            let mut out = io::stdout().lock();
            reader.list(verbose, &mut out)?;
        }

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify { archive, verbose } => {
            let mut reader = open_archive(&archive)?;
            let mut progress = |h: &MemberHeader| eprintln!("ok  {}", h.name);
            let count = reader.verify(verbose.then_some(&mut progress))?;
            println!("{count} member(s) ok");
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn open_archive(archive: &Option<PathBuf>) -> Result<BaleReader, BaleError> {
    match archive {
        Some(path) => BaleReader::open(path),
        None       => BaleReader::new(Input::Stream(Box::new(io::stdin()))),
    }
}

/// One exit code per error category, so scripts can tell a corrupt
/// archive from a failing disk. Usage errors exit with 2 via clap.
fn exit_code(err: &BaleError) -> u8 {
    match err {
        BaleError::Format(FormatError::BadTag) => 3,
        BaleError::Format(_)                   => 4,
        BaleError::Checksum(_)                 => 5,
        BaleError::Io(_)                       => 6,
    }
}
