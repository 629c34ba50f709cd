//! This is the main entry point for the FAT32 navigator.
//!
//! The program provides an interactive command-line interface for browsing FAT32 images.
//! Users can open an image, move through its directories, inspect entries and extract files.

use clap::Parser;
use fat_navigator::commands::Command;
use fat_navigator::{Session, SessionConfig, SessionError};
use log::error;
use std::{
    io::{self, Write},
    ops::ControlFlow,
    path::{Path, PathBuf},
    process,
};

/// Exit status when the image or the terminal can no longer be read.
const FATAL_EXIT: i32 = 2;

/// Read-only navigator for FAT32 volume images
#[derive(Parser, Debug)]
#[command(name = "mfs")]
struct Args {
    /// FAT32 image to open at startup
    image: Option<PathBuf>,

    /// Validate the boot sector against the FAT32 specification on open
    #[arg(long)]
    strict: bool,

    /// Maximum count of records scanned in one directory
    #[arg(long, default_value_t = SessionConfig::default().max_dir_entries)]
    max_dir_entries: usize,

    /// Maximum size in bytes of an extracted file
    #[arg(long, default_value_t = SessionConfig::default().max_file_size)]
    max_file_size: u64,

    /// Directory where `get` writes extracted files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(err) = stderrlog::new()
        .module(module_path!())
        .module("fat_navigator")
        .verbosity(1 + usize::from(args.verbose))
        .quiet(args.quiet)
        .init()
    {
        eprintln!("Failed to initialize logging: {err}");
    }

    let mut session = Session::new(SessionConfig {
        max_dir_entries: args.max_dir_entries,
        max_file_size: args.max_file_size,
        output_dir: args.output_dir,
        strict: args.strict,
    });

    if let Some(image) = &args.image {
        if let Err(err) = session.open(image) {
            report(err);
        }
    }

    loop {
        print!("mfs> ");
        if let Err(err) = io::stdout().flush() {
            error!("Failed to write the prompt: {err}");
            process::exit(FATAL_EXIT);
        }

        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                error!("Failed to read command: {err}");
                process::exit(FATAL_EXIT);
            }
        }

        match run(&mut session, Command::from_string(&s)) {
            Ok(ControlFlow::Break(())) => break,
            Ok(ControlFlow::Continue(())) => {}
            Err(err) => report(err),
        }
    }
}

/// Reports a failed command, ending the process on fatal errors.
fn report(err: SessionError) {
    error!("{err}");
    if err.is_fatal() {
        process::exit(FATAL_EXIT);
    }
}

/// Runs one command against the session and prints its output.
///
/// Returns `ControlFlow::Break` when the command ends the prompt loop.
fn run(session: &mut Session, cmd: Command) -> Result<ControlFlow<()>, SessionError> {
    match cmd {
        Command::Exit => return Ok(ControlFlow::Break(())),
        Command::Empty => {}
        Command::Unknown(s) => error!("Unknown command: {s:?}"),
        Command::Invalid(s) => return Err(SessionError::InvalidArguments(s)),
        Command::Open(path) => session.open(Path::new(&path))?,
        Command::Close => session.close()?,
        Command::Info => print!("{}", session.info()?),
        Command::Stat(name) => {
            let entry = session.stat(&name)?;
            println!("Filename:\t\t\"{entry}\"");
            println!(
                "Attribute:\t\t0x{:02X}\t{}",
                entry.attr().bits(),
                entry.attr()
            );
            println!("Starting cluster:\t{}", entry.first_cluster());
            println!("Size:\t\t\t{}", entry.file_size());
        }
        Command::Get(name) => {
            let path = session.get(&name)?;
            println!("Wrote {}", path.display());
        }
        Command::Read {
            name,
            position,
            length,
        } => {
            let data = session.read(&name, position, length)?;
            println!("{}", printable(&data));
        }
        Command::Cd(path) => session.cd(&path)?,
        Command::Ls(target) => {
            for entry in session.ls(target.as_deref())? {
                println!("{entry}");
            }
        }
        Command::Volume => println!("Volume: {}", session.volume()?),
    }

    Ok(ControlFlow::Continue(()))
}

/// Renders bytes as text, showing non-printable bytes as `.`.
fn printable(data: &[u8]) -> String {
    data.iter()
        .map(|b| match b {
            0x20..=0x7E | b'\n' | b'\t' => *b as char,
            _ => '.',
        })
        .collect()
}
