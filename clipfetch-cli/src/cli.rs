use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "clipfetch",
    version,
    about = "Download shared clips without the watermark"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a single clip
    Fetch {
        /// Clip URL or bare content id
        url: String,

        /// Bearer token for the official API
        #[arg(long)]
        token: Option<String>,

        /// Cookie header for the official API
        #[arg(long)]
        cookies: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,

        /// Write the mp4 to this path instead of printing it
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Print the content id found in the input
    Id {
        input: String,
    },

    /// Fetch every clip listed in a file, one reference per line
    Batch {
        input: PathBuf,

        /// Directory receiving `<id>_HD.mp4` files
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        /// Clips downloaded at the same time
        #[arg(short = 'j', long)]
        max_concurrent: Option<usize>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,
    },

    /// Show or reset the configuration
    Config {
        #[arg(long)]
        show: bool,

        #[arg(long)]
        reset: bool,
    },
}

impl Commands {
    pub fn output_format(&self) -> Option<OutputFormat> {
        match self {
            Commands::Fetch { output, .. } | Commands::Batch { output, .. } => Some(*output),
            _ => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
    JsonCompact,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonCompact)
    }
}
