use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "skillpack")]
#[command(version)]
#[command(about = "Package skill directories into deterministic .skill archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  skillpack package                         package every skill under ./skills into ./dist\n  \
  skillpack package --skill pdf --outdir out   package only skills/pdf into out/pdf.skill\n  \
  skillpack list -l dist/pdf.skill          show entries with sizes and checksums")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Only print errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Package skills into .skill archives
    Package(PackageArgs),

    /// List the entries of an archive
    List {
        /// Archive to list
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Show size, method and CRC-32 of each entry
        #[arg(short = 'l', long)]
        long: bool,
    },

    /// Check every entry of an archive against its CRC-32
    Verify {
        /// Archive to verify
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Directory containing one subdirectory per skill
    #[arg(long, value_name = "DIR", env = "SKILLPACK_SKILLS_DIR", default_value = "skills")]
    pub skills_dir: PathBuf,

    /// Package only this skill
    #[arg(long, value_name = "NAME")]
    pub skill: Option<String>,

    /// Where to write the .skill files
    #[arg(long, value_name = "DIR", env = "SKILLPACK_OUTDIR", default_value = "dist")]
    pub outdir: PathBuf,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
