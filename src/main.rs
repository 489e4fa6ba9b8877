use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lmsp::config::{DEFAULT_CONFIG_FILE, LmspConfig};
use lmsp::format::OutputFormat;

mod commands;

/// Copy My Blocks and scripts between LEGO Education EV3 Classroom projects
///
/// The EV3 Classroom app cannot share My Blocks, variables, lists or
/// broadcasts between projects. lmsp copies selected stacks from one
/// project into another, bringing along every procedure they call and
/// every symbol they use. Symbols already present in the target (same
/// name) are reused; procedures and named stacks already present are
/// replaced in place.
///
/// A plain stack is named by a comment on its first block containing
/// '{name}'. Procedures are named by their signature.
///
/// QUICK START:
///
///   lmsp list library.lmsp
///   lmsp copy library.lmsp robot.lmsp robot.lmsp 3 "drive %s"
///   lmsp sync library.lmsp robot.lmsp robot.lmsp
///
/// An existing output file is moved to '<output>.bak' before writing.
#[derive(Parser)]
#[command(name = "lmsp")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'lmsp <command> --help' for more information on a specific command.")]
struct Cli {
    /// Configuration file (missing file = defaults)
    #[arg(long, global = true, env = "LMSP_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the stacks of a project
    ///
    /// Shows each stack's index and name, its top-level blocks, and the
    /// procedures, broadcasts, variables and lists it uses.
    List {
        /// Project file (.lmsp or .json)
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print a project's JSON document
    Json {
        /// Project file (.lmsp or .json)
        file: PathBuf,
    },

    /// Print a project's icon SVG
    Svg {
        /// Project archive (.lmsp)
        file: PathBuf,
    },

    /// Copy selected stacks from one project into another
    ///
    /// Each stack id is a 1-based index from 'lmsp list' or a stack name.
    /// A name that is a unique prefix of one stack also works.
    Copy {
        /// Project to copy from (.lmsp or .json)
        source: PathBuf,
        /// Project to copy into (.lmsp)
        target: PathBuf,
        /// Where to write the result (.lmsp or .json)
        output: PathBuf,
        /// Stacks to copy (index or name)
        #[arg(required = true, num_args = 1..)]
        stacks: Vec<String>,
    },

    /// Update every stack the target shares with the source
    ///
    /// Copies each source procedure whose signature exists once in the
    /// target, then each named source stack whose name exists once among
    /// the target's stacks.
    Sync {
        /// Project to copy from (.lmsp or .json)
        source: PathBuf,
        /// Project to update (.lmsp)
        target: PathBuf,
        /// Where to write the result (.lmsp or .json)
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    lmsp::telemetry::init();
    let cli = Cli::parse();
    let config = LmspConfig::load(&cli.config)?;

    match cli.command {
        Commands::List { file, format } => commands::list::run(&file, format),
        Commands::Json { file } => commands::extract::json(&file),
        Commands::Svg { file } => commands::extract::svg(&file),
        Commands::Copy {
            source,
            target,
            output,
            stacks,
        } => commands::copy::run(&source, &target, &output, &stacks, &config),
        Commands::Sync {
            source,
            target,
            output,
        } => commands::sync::run(&source, &target, &output, &config),
    }
}
