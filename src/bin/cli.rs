//! unz CLI - unpack or list archives
//!
//! # Examples
//!
//! ```bash
//! # Unpack; multi-member archives get their own folder
//! unz release.tar.gz notes.zip
//!
//! # Show what would be unpacked
//! unz --list --verbose release.tar.gz
//!
//! # Unpack somewhere else, dropping the archive's shared top folder
//! unz -d /tmp/out --flatten release.tar.xz
//!
//! # Generate shell completions
//! unz --completions bash > ~/.bash_completion.d/unz
//! ```

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use unz::{
    count_noun, Action, CollisionPolicy, Driver, Error, Extractor, Lister, Reporter,
};

#[derive(Parser)]
#[command(
    name = "unz",
    about = "Unpack or list zip and tar archives (.zip .tar .tgz .tar.gz .tar.bz2 .tar.xz)",
    version,
    after_help = "An archive with one member is unpacked in place; one with more members
is unpacked into a new folder named after the archive.

EXAMPLES:
    unz release.tar.gz
    unz --list --verbose a.zip b.tar.xz
    unz -d /tmp/out --on-collision reuse release.zip"
)]
struct Cli {
    /// Archives to process, in order
    #[arg(required_unless_present = "completions")]
    archives: Vec<PathBuf>,

    /// List members instead of unpacking
    #[arg(short, long)]
    list: bool,

    /// Show member counts and every path written
    #[arg(short, long)]
    verbose: bool,

    /// Directory to unpack under
    #[arg(short, long, default_value = ".")]
    dest: PathBuf,

    /// Create the --dest directory if it is missing
    #[arg(long)]
    create_dest: bool,

    /// What to do if an archive's folder already exists
    #[arg(long, value_enum, default_value_t = CollisionMode::Error)]
    on_collision: CollisionMode,

    /// Drop the top folder shared by every member of a multi-member archive
    #[arg(long)]
    flatten: bool,

    /// Never bold archive names
    #[arg(long)]
    no_style: bool,

    /// Generate shell completions for the specified shell
    #[arg(long, value_enum)]
    completions: Option<Shell>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CollisionMode {
    /// Skip the archive
    Error,
    /// Unpack into the existing folder
    Reuse,
}

/// Writes output to stdout and diagnostics to stderr.
struct ConsoleReporter {
    styled: bool,
}

impl Reporter for ConsoleReporter {
    fn line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn problem(&mut self, archive: &Path, error: &Error) {
        eprintln!("unz: {}: {}", archive.display(), error);
    }

    fn emphasize(&self, text: &str) -> String {
        if self.styled {
            // Plain text when stdout is not a terminal
            console::style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle completions generation
    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "unz", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    setup_logging();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("unz: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every archive was processed without an archive-level failure.
fn run(cli: Cli) -> Result<bool, Error> {
    let action = if cli.list {
        Action::List(Lister::new().verbose(cli.verbose))
    } else {
        let extractor = if cli.create_dest {
            Extractor::new_or_create(&cli.dest)?
        } else {
            Extractor::new(&cli.dest)?
        };
        let collision = match cli.on_collision {
            CollisionMode::Error => CollisionPolicy::Error,
            CollisionMode::Reuse => CollisionPolicy::Reuse,
        };
        Action::Extract(
            extractor
                .verbose(cli.verbose)
                .collision(collision)
                .flatten(cli.flatten),
        )
    };

    let mut reporter = ConsoleReporter {
        styled: !cli.no_style,
    };
    let summary = Driver::new(action).run(&cli.archives, &mut reporter);

    let failed = summary.failed();
    if failed > 0 && cli.archives.len() > 1 {
        eprintln!(
            "unz: {} of {} failed",
            failed,
            count_noun(cli.archives.len(), "archive")
        );
    }

    Ok(summary.success())
}
